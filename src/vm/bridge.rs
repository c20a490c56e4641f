//! VM桥接层：把 NodeStore 的节点列表交给外部视图
//!
//! 视图只需要三样东西：节点列表、取子节点的访问器、判断是否叶子的谓词。

use std::cell::RefCell;
use std::fmt::Write;
use std::rc::{Rc, Weak};

use crate::model::node_store::NodeStore;
use crate::model::tree_node::{LeafValue, TreeNode};
use crate::vm::observable::{Observable, SubscriptionId};

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADED: &str = "数据加载完成";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";
/// 文本渲染时每层缩进的空格数
pub const INDENT_WIDTH: usize = 2;
/// 文本渲染时叶子值预览的最大字符数
pub const PREVIEW_MAX_CHARS: usize = 32;

/// 视图数据源：跟随 NodeStore 自动刷新，drop 时自动取消订阅
pub struct TreeDataSource {
    data: Rc<RefCell<Rc<Vec<TreeNode>>>>,
    cell: Weak<Observable<Vec<TreeNode>>>,
    subscription: SubscriptionId,
}

impl TreeDataSource {
    /// 绑定到 store；订阅时立即拿到当前列表
    pub fn bind(store: &NodeStore) -> Self {
        let data = Rc::new(RefCell::new(Rc::new(Vec::new())));
        let sink = data.clone();
        let subscription = store.subscribe(move |nodes| {
            *sink.borrow_mut() = nodes.clone();
        });
        Self {
            data,
            cell: Rc::downgrade(store.cell()),
            subscription,
        }
    }

    pub fn nodes(&self) -> Rc<Vec<TreeNode>> {
        self.data.borrow().clone()
    }

    /// 取子节点；叶子节点返回 None
    pub fn children_of(node: &TreeNode) -> Option<&[TreeNode]> {
        node.children()
    }

    pub fn is_leaf(node: &TreeNode) -> bool {
        node.is_leaf()
    }

    /// 是否可展开
    pub fn has_nested_child(node: &TreeNode) -> bool {
        node.has_nested_child()
    }

    /// 渲染为缩进文本
    pub fn render_text(&self) -> String {
        render_text(&self.nodes())
    }
}

impl Drop for TreeDataSource {
    fn drop(&mut self) {
        // store 已先行释放时无需处理
        if let Some(cell) = self.cell.upgrade() {
            cell.unsubscribe(self.subscription);
            tracing::debug!("TreeDataSource: 已解除绑定 {:?}", self.subscription);
        }
    }
}

/// 叶子值的简短预览
pub fn preview_of(v: &LeafValue) -> String {
    match v {
        LeafValue::String(s) => {
            let s = s.trim();
            if s.chars().count() > PREVIEW_MAX_CHARS {
                let truncated: String = s.chars().take(PREVIEW_MAX_CHARS).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        LeafValue::Number(n) => n.to_string(),
        LeafValue::Bool(b) => b.to_string(),
        LeafValue::Null => "null".to_string(),
        LeafValue::Array(a) => format!("[..] ({} items)", a.len()),
    }
}

/// 将节点列表渲染为缩进文本：内部节点以 "▾ name" 显示，叶子以 "name: preview" 显示
pub fn render_text(nodes: &[TreeNode]) -> String {
    fn walk(out: &mut String, nodes: &[TreeNode], depth: usize) {
        for node in nodes {
            let indent = " ".repeat(depth * INDENT_WIDTH);
            match TreeDataSource::children_of(node) {
                Some(children) => {
                    let _ = writeln!(out, "{}▾ {}", indent, node.name);
                    walk(out, children, depth + 1);
                }
                None => {
                    let preview = node.value().map(preview_of).unwrap_or_default();
                    let _ = writeln!(out, "{}{}: {}", indent, node.name, preview);
                }
            }
        }
    }
    let mut out = String::new();
    walk(&mut out, nodes, 0);
    out
}
