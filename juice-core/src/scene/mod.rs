//! # Scene 模块
//!
//! 宿主场景图的最小替身：节点树 + 每个节点的可动画视觉属性。
//!
//! - [`SceneGraph`]：节点表、层级关系、按名查找、坐标转换
//! - [`Node`]：位置 / 缩放 / 旋转 / 透明度 / 着色 / 填充色
//! - [`NodeId`]：永不复用的节点句柄

mod graph;
mod node;

pub use graph::SceneGraph;
pub use node::{Node, NodeId};
