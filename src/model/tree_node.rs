//! 嵌套树节点：把 JSON 对象递归转换为带类型的树节点列表
//!
//! 对象 => 内部节点（children），其余值（字符串/数字/布尔/数组/null）=> 叶子节点（value）

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::model::node_store::TreeError;

/// 叶子节点的值（JSON 叶子类型的有限集合）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LeafValue {
    String(String),
    Number(Number),
    Bool(bool),
    /// 数组不展开为子节点，整体作为叶子值
    Array(Vec<Value>),
    Null,
}

/// 节点内容：要么是子节点列表，要么是叶子值，二者必居其一
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeContent {
    Children(Vec<TreeNode>),
    Value(LeafValue),
}

/// 节点类型（与 UI 展示解耦）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    /// 节点在父对象中的键名
    pub name: String,
    #[serde(flatten)]
    pub content: NodeContent,
}

impl LeafValue {
    /// 将非对象的 JSON 值转换为叶子值；对象返回 None
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Array(a) => Some(Self::Array(a.clone())),
            Value::Null => Some(Self::Null),
            Value::Object(_) => None,
        }
    }

    /// 还原为 serde_json::Value
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Array(a) => Value::Array(a.clone()),
            Self::Null => Value::Null,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::String(_) => NodeKind::String,
            Self::Number(_) => NodeKind::Number,
            Self::Bool(_) => NodeKind::Bool,
            Self::Array(_) => NodeKind::Array,
            Self::Null => NodeKind::Null,
        }
    }
}

impl TreeNode {
    pub fn interior(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self { name: name.into(), content: NodeContent::Children(children) }
    }

    pub fn leaf(name: impl Into<String>, value: LeafValue) -> Self {
        Self { name: name.into(), content: NodeContent::Value(value) }
    }

    /// 子节点列表（仅内部节点有）
    pub fn children(&self) -> Option<&[TreeNode]> {
        match &self.content {
            NodeContent::Children(c) => Some(c),
            NodeContent::Value(_) => None,
        }
    }

    /// 叶子值（仅叶子节点有）
    pub fn value(&self) -> Option<&LeafValue> {
        match &self.content {
            NodeContent::Value(v) => Some(v),
            NodeContent::Children(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, NodeContent::Value(_))
    }

    /// 视图层判断“可展开”所用的谓词：没有叶子值即为内部节点
    pub fn has_nested_child(&self) -> bool {
        !self.is_leaf()
    }

    pub fn kind(&self) -> NodeKind {
        match &self.content {
            NodeContent::Children(_) => NodeKind::Object,
            NodeContent::Value(v) => v.kind(),
        }
    }

    /// 子树节点总数（含自身）
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map(|c| c.iter().map(TreeNode::node_count).sum())
            .unwrap_or(0)
    }
}

/// 按输入对象的键顺序构建节点列表；depth 仅用于诊断日志
pub fn build_tree(obj: &Map<String, Value>, depth: u32) -> Vec<TreeNode> {
    let mut out = Vec::with_capacity(obj.len());
    for (key, value) in obj {
        let node = match value {
            Value::Object(child) => TreeNode::interior(key.as_str(), build_tree(child, depth + 1)),
            other => {
                // from_json 只对对象返回 None，此分支已排除对象
                let leaf = LeafValue::from_json(other).unwrap_or(LeafValue::Null);
                TreeNode::leaf(key.as_str(), leaf)
            }
        };
        tracing::trace!(depth, name = %key, kind = ?node.kind(), "build_tree: 节点已构建");
        out.push(node);
    }
    out
}

/// 从任意 JSON 值构建节点列表；根必须是对象
pub fn build_tree_from_value(root: &Value) -> Result<Vec<TreeNode>, TreeError> {
    match root {
        Value::Object(map) => Ok(build_tree(map, 0)),
        other => Err(TreeError::Shape {
            expected: "object",
            got: json_type_name(other),
        }),
    }
}

/// JSON 值类型名，用于错误信息
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Null => "null",
    }
}
