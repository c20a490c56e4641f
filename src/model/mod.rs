pub mod node_store;
pub mod tree_node;
