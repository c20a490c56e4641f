//! 嵌套 JSON 树模型
//!
//! 将 JSON 对象递归构建为带类型的树节点列表，并通过可观察的 NodeStore 推送给视图层

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::node_store::{NodeStore, TreeError};
pub use model::tree_node::{build_tree, build_tree_from_value, LeafValue, NodeContent, NodeKind, TreeNode};
pub use vm::bridge::TreeDataSource;
pub use vm::observable::{Observable, SubscriptionId};
