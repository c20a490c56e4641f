//! 单线程可观察值：同步推送 + 新订阅者立即收到最新值（replay-latest）

use std::cell::RefCell;
use std::rc::Rc;

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<T> = Rc<dyn Fn(&Rc<T>)>;

struct Inner<T> {
    value: Rc<T>,
    observers: Vec<(SubscriptionId, Observer<T>)>,
    next_id: u64,
    version: u64,
}

/// 可观察的值单元
///
/// 观察者按注册顺序被同步调用。通知前会释放内部借用，
/// 因此观察者内部可以再次调用 [`Observable::get`]。
pub struct Observable<T> {
    inner: RefCell<Inner<T>>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: RefCell::new(Inner {
                value: Rc::new(initial),
                observers: Vec::new(),
                next_id: 0,
                version: 0,
            }),
        }
    }

    /// 当前值
    pub fn get(&self) -> Rc<T> {
        self.inner.borrow().value.clone()
    }

    /// 已发布次数
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// 注册观察者，并立即以当前值调用一次
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Rc<T>) + 'static,
    {
        let observer: Observer<T> = Rc::new(observer);
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner.observers.push((id, observer.clone()));
            (id, inner.value.clone())
        };
        observer(&current);
        id
    }

    /// 取消订阅；句柄不存在时返回 false
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.observers.len();
        inner.observers.retain(|(sid, _)| *sid != id);
        inner.observers.len() != before
    }

    /// 整体替换当前值并通知所有观察者
    pub fn set(&self, value: T) {
        let (current, observers) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Rc::new(value);
            inner.version += 1;
            let observers: Vec<Observer<T>> =
                inner.observers.iter().map(|(_, o)| o.clone()).collect();
            (inner.value.clone(), observers)
        };
        for observer in observers {
            observer(&current);
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("observers", &inner.observers.len())
            .field("version", &inner.version)
            .finish()
    }
}
