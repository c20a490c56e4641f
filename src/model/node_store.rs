//! NodeStore：持有当前节点列表，并向视图层推送变更

use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::model::tree_node::{build_tree_from_value, json_type_name, TreeNode};
use crate::utils::fs::read_json_file;
use crate::vm::observable::{Observable, SubscriptionId};

/// 编译期内嵌的示例数据
pub const EMBEDDED_TREE_DATA: &str = include_str!("../../data/tree_data.json");

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("数据结构错误: 期望 {expected}，实际为 {got}")]
    Shape {
        expected: &'static str,
        got: &'static str,
    },
}

#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Rc<Observable<Vec<TreeNode>>>,
}

impl NodeStore {
    /// 解析 JSON 文本并构建节点列表
    pub fn new(json_text: &str) -> Result<Self, TreeError> {
        let store = Self::default();
        store.initialize(json_text)?;
        Ok(store)
    }

    /// 使用内嵌示例数据构建
    pub fn from_embedded() -> Result<Self, TreeError> {
        Self::new(EMBEDDED_TREE_DATA)
    }

    /// 从磁盘 JSON 文件构建
    pub fn from_path(p: &Path) -> Result<Self, TreeError> {
        let store = Self::default();
        read_json_file(p)
            .and_then(|dom| store.initialize_from_value(&dom))
            .map_err(|e| log_failure(&p.display().to_string(), e))?;
        tracing::info!("NodeStore: 已从文件加载 {}", p.display());
        Ok(store)
    }

    /// 当前节点列表（初始化前为空）
    pub fn current(&self) -> Rc<Vec<TreeNode>> {
        self.nodes.get()
    }

    /// 注册观察者；立即收到当前列表，之后每次变更都会收到
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Rc<Vec<TreeNode>>) + 'static,
    {
        let id = self.nodes.subscribe(observer);
        tracing::debug!("NodeStore: 新增订阅 {:?}，当前 {} 个订阅", id, self.observer_count());
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.nodes.unsubscribe(id);
        tracing::debug!("NodeStore: 取消订阅 {:?} -> {}", id, removed);
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.nodes.observer_count()
    }

    /// 已发布次数
    pub fn version(&self) -> u64 {
        self.nodes.version()
    }

    /// 底层可观察单元，供视图数据源持有弱引用
    pub(crate) fn cell(&self) -> &Rc<Observable<Vec<TreeNode>>> {
        &self.nodes
    }

    /// 解析 JSON 文本、选取根元素、构建并发布；失败时不发布任何内容
    pub fn initialize(&self, json_text: &str) -> Result<(), TreeError> {
        serde_json::from_str::<Value>(json_text)
            .map_err(TreeError::from)
            .and_then(|dom| self.initialize_from_value(&dom))
            .map_err(|e| log_failure("内嵌/文本数据", e))
    }

    fn initialize_from_value(&self, dom: &Value) -> Result<(), TreeError> {
        let start = Instant::now();
        let root = select_root(dom)?;
        let nodes = build_tree_from_value(root)?;
        let total: usize = nodes.iter().map(TreeNode::node_count).sum();
        tracing::info!(
            "NodeStore: 初始化完成，顶层 {} 个节点，共 {} 个节点，耗时: {:.2}ms",
            nodes.len(),
            total,
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.nodes.set(nodes);
        tracing::debug!("NodeStore: 已发布版本 {}", self.version());
        Ok(())
    }

    /// 整体替换节点列表并通知观察者
    pub fn replace(&self, nodes: Vec<TreeNode>) {
        tracing::info!("NodeStore: 替换节点列表，顶层 {} 个节点", nodes.len());
        self.nodes.set(nodes);
        tracing::debug!("NodeStore: 已发布版本 {}", self.version());
    }
}

/// 初始化失败统一记录日志后原样返回
fn log_failure(source: &str, e: TreeError) -> TreeError {
    tracing::error!("NodeStore: 初始化失败 ({}): {}", source, e);
    e
}

/// 根为数组时取第一个元素，根为对象时直接使用
fn select_root(dom: &Value) -> Result<&Value, TreeError> {
    let root = match dom {
        Value::Array(items) => items.first().ok_or(TreeError::Shape {
            expected: "non-empty array",
            got: "empty array",
        })?,
        other => other,
    };
    match root {
        Value::Object(_) => Ok(root),
        other => Err(TreeError::Shape {
            expected: "object",
            got: json_type_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree_node::LeafValue;
    use std::cell::RefCell;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;
    use tracing_subscriber::fmt::SubscriberBuilder;

    /// 收集日志输出的内存缓冲
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// 在局部日志订阅器下执行 f，返回期间输出的日志文本
    fn captured_logs(f: impl FnOnce()) -> String {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = SubscriberBuilder::default()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).expect("日志应为UTF-8")
    }

    /// 创建临时JSON文件用于测试
    fn create_test_json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    #[test]
    fn test_array_root_takes_first_element() {
        let store = NodeStore::new(r#"[{"x": {"y": 1}}, {"ignored": true}]"#).unwrap();
        let nodes = store.current();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "x");
        let children = nodes[0].children().expect("x 应该是内部节点");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "y");
        assert_eq!(children[0].value(), Some(&LeafValue::Number(1.into())));
    }

    #[test]
    fn test_object_root_used_directly() {
        let store = NodeStore::new(r#"{"a": 1, "b": {"c": 2}}"#).unwrap();
        let names: Vec<String> = store.current().iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_late_subscriber_receives_built_list() {
        let store = NodeStore::new(r#"[{"x": {"y": 1}}]"#).unwrap();
        let received = Rc::new(RefCell::new(None));
        let sink = received.clone();
        store.subscribe(move |nodes| *sink.borrow_mut() = Some(nodes.len()));

        assert_eq!(*received.borrow(), Some(1), "订阅后应立即收到完整列表");
    }

    #[test]
    fn test_subscribers_see_initialize_and_replace() {
        let store = NodeStore::default();
        assert!(store.current().is_empty(), "初始化前应为空列表");

        let lens = Rc::new(RefCell::new(Vec::new()));
        let sink = lens.clone();
        let id = store.subscribe(move |nodes| sink.borrow_mut().push(nodes.len()));

        store.initialize(r#"{"a": 1, "b": 2}"#).unwrap();
        store.replace(vec![TreeNode::leaf("only", LeafValue::Null)]);
        assert!(store.unsubscribe(id));
        store.replace(Vec::new());

        assert_eq!(*lens.borrow(), vec![0, 2, 1]);
        assert!(store.current().is_empty());
    }

    #[test]
    fn test_parse_error_is_fatal_and_not_published() {
        let store = NodeStore::default();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        let err = store.initialize("{not json").unwrap_err();
        assert!(matches!(err, TreeError::Parse(_)));
        assert_eq!(*calls.borrow(), 1, "失败时不应发布");
        assert!(NodeStore::new("").is_err());
    }

    #[test]
    fn test_shape_errors() {
        for (text, got) in [("[]", "empty array"), ("[1]", "number"), ("\"s\"", "string"), ("null", "null")] {
            match NodeStore::new(text) {
                Err(TreeError::Shape { got: actual, .. }) => assert_eq!(actual, got, "输入: {}", text),
                other => panic!("输入 {} 应返回结构错误，实际: {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_embedded_data_loads() {
        let store = NodeStore::from_embedded().expect("内嵌数据应可解析");
        let nodes = store.current();
        assert!(!nodes.is_empty());
        assert!(nodes.iter().all(|n| !n.name.is_empty()));
    }

    #[test]
    fn test_from_path() {
        let file = create_test_json_file(r#"[{"user": {"name": "张三", "tags": ["a", "b"]}}]"#);
        let store = NodeStore::from_path(file.path()).unwrap();
        let nodes = store.current();
        let user = nodes[0].children().unwrap();
        assert_eq!(user[0].value(), Some(&LeafValue::String("张三".into())));
        assert!(user[1].is_leaf(), "数组应作为叶子");
    }

    #[test]
    fn test_failures_are_logged_on_every_path() {
        let broken = create_test_json_file("{ broken");
        let logs = captured_logs(|| {
            assert!(matches!(NodeStore::from_path(broken.path()), Err(TreeError::Parse(_))));
            assert!(matches!(
                NodeStore::from_path(Path::new("/nonexistent/tree.json")),
                Err(TreeError::Io(_))
            ));
            assert!(matches!(NodeStore::new("[1]"), Err(TreeError::Shape { .. })));
        });

        assert!(logs.contains("JSON解析失败"), "文件解析失败应记录日志: {}", logs);
        assert!(logs.contains("IO失败"), "文件读取失败应记录日志: {}", logs);
        assert!(logs.contains("数据结构错误"), "结构错误应记录日志: {}", logs);
    }

    #[test]
    fn test_version_counts_publications() {
        let store = NodeStore::new(r#"{"a": 1}"#).unwrap();
        assert_eq!(store.version(), 1);
        store.replace(Vec::new());
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let err = NodeStore::from_path(Path::new("/nonexistent/tree.json")).unwrap_err();
        assert!(matches!(err, TreeError::Io(_)));
    }
}
