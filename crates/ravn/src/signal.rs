//! # Signal — Push-Based Reactive Values
//!
//! A [`Signal`] is a value cell that tells its subscribers whenever it is set.
//! It also remembers every value it was given (its history) and can spawn
//! derived signals that map and filter what flows through:
//!
//! ```text
//! phases: Signal<Phase>                       set(Update) ──► subscribers
//!   └── when_update = phases.filter(== Update)     │
//!         └── ticks = when_update.derive(|_| 1)    ▼
//!                                            derived children, depth-first
//! ```
//!
//! ## Delivery
//!
//! `set` notifies synchronously, in subscription order. Asking for a history
//! replay on `subscribe` is *deferred*: the replay is queued and runs on the
//! next [`flush`](Signal::flush), after the current synchronous work. Every
//! signal in a derived tree shares one queue, so flushing any of them runs the
//! replays of the whole tree.
//!
//! ## Ownership
//!
//! A parent holds its derived children strongly; a child only holds weak
//! links back. Destroying a signal clears its subscribers, destroys its
//! children, and unsubscribes it from its own parent.
//!
//! ## Comparison
//!
//! - **RxJS `ReplaySubject`**: replays history synchronously on subscribe.
//! - **futures-signals `Mutable`**: pull-based, lossy, async.
//! - **ravn**: push-based, single-threaded, replays deferred to `flush`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

type Subscriber<T> = Rc<dyn Fn(&T)>;
type Task = Box<dyn FnOnce()>;

/// Deferred work shared by every signal in a derived tree.
#[derive(Default)]
struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    fn push(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }

    fn pop(&self) -> Option<Task> {
        self.tasks.borrow_mut().pop_front()
    }

    fn len(&self) -> usize {
        self.tasks.borrow().len()
    }
}

/// Type-erased view of a derived child, for destroying it.
trait Node {
    fn destroy(&self);
}

struct Inner<T> {
    value: RefCell<Option<T>>,
    history: RefCell<VecDeque<T>>,
    history_limit: Option<usize>,
    subscribers: RefCell<Vec<(u64, Subscriber<T>)>>,
    next_id: Cell<u64>,
    /// Children, keyed by the id of their subscription on this signal.
    derived: RefCell<Vec<(u64, Rc<dyn Node>)>>,
    /// Unsubscribes this signal from its parent.
    detach: RefCell<Option<Task>>,
    once: bool,
    tasks: Rc<TaskQueue>,
}

impl<T: Clone + 'static> Inner<T> {
    fn new(once: bool, history_limit: Option<usize>, tasks: Rc<TaskQueue>) -> Self {
        Self {
            value: RefCell::new(None),
            history: RefCell::new(VecDeque::new()),
            history_limit,
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            derived: RefCell::new(Vec::new()),
            detach: RefCell::new(None),
            once,
            tasks,
        }
    }

    fn store(&self, value: T) {
        *self.value.borrow_mut() = Some(value.clone());
        let mut history = self.history.borrow_mut();
        history.push_back(value);
        if let Some(limit) = self.history_limit {
            while history.len() > limit {
                history.pop_front();
            }
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.borrow().iter().any(|(sub, _)| *sub == id)
    }

    /// Drop subscription `id` and the derived child that owned it, if any.
    fn remove(&self, id: u64) {
        self.subscribers.borrow_mut().retain(|(sub, _)| *sub != id);
        self.derived.borrow_mut().retain(|(sub, _)| *sub != id);
    }
}

impl<T: Clone + 'static> Node for Inner<T> {
    fn destroy(&self) {
        self.subscribers.borrow_mut().clear();
        let children = std::mem::take(&mut *self.derived.borrow_mut());
        for (_, child) in children {
            child.destroy();
        }
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

/// A reactive value cell. Cloning gives another handle to the same signal.
pub struct Signal<T: Clone + 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// An empty signal with unbounded history.
    pub fn new() -> Self {
        Self::build(false, None, Rc::default())
    }

    /// A signal that starts out holding `value` (also its first history entry).
    pub fn with_value(value: T) -> Self {
        let signal = Self::new();
        signal.inner.store(value);
        signal
    }

    /// A signal that destroys itself right after its first notification.
    pub fn once() -> Self {
        Self::build(true, None, Rc::default())
    }

    /// A signal that keeps only the last `limit` values. Signals derived from
    /// it inherit the limit.
    pub fn with_history_limit(limit: usize) -> Self {
        Self::build(false, Some(limit), Rc::default())
    }

    fn build(once: bool, history_limit: Option<usize>, tasks: Rc<TaskQueue>) -> Self {
        Self {
            inner: Rc::new(Inner::new(once, history_limit, tasks)),
        }
    }

    /// Store `value`, append it to the history, and notify every subscriber.
    /// `None` is ignored.
    ///
    /// ```ignore
    /// signal.set(3);
    /// signal.set(None); // no-op
    /// ```
    pub fn set(&self, value: impl Into<Option<T>>) {
        let Some(value) = value.into() else {
            return;
        };
        self.inner.store(value.clone());

        let snapshot: Vec<(u64, Subscriber<T>)> = self.inner.subscribers.borrow().clone();
        for (id, subscriber) in snapshot {
            if self.inner.is_subscribed(id) {
                subscriber(&value);
            }
        }
        if self.inner.once {
            self.destroy();
        }
    }

    /// The most recent value.
    pub fn get(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }

    /// Every value set so far, oldest first (bounded by the history limit).
    pub fn history(&self) -> Vec<T> {
        self.inner.history.borrow().iter().cloned().collect()
    }

    /// Register `subscriber`. With `replay`, the history is delivered to it on
    /// the next [`flush`](Self::flush), provided it is still subscribed then.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + 'static, replay: bool) -> Subscription<T> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let subscriber: Subscriber<T> = Rc::new(subscriber);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&subscriber)));

        if replay {
            let weak = Rc::downgrade(&self.inner);
            self.inner.tasks.push(Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !inner.is_subscribed(id) {
                    return;
                }
                let history: Vec<T> = inner.history.borrow().iter().cloned().collect();
                for value in &history {
                    subscriber(value);
                }
            }));
        }

        Subscription {
            signal: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// A child signal that receives `map(value)` for every value of this one,
    /// history included.
    pub fn derive<E: Clone + 'static>(&self, map: impl Fn(&T) -> E + 'static) -> Signal<E> {
        self.derive_filtered(map, |_| true)
    }

    /// Like [`derive`](Self::derive), skipping values `filter` rejects.
    pub fn derive_filtered<E: Clone + 'static>(
        &self,
        map: impl Fn(&T) -> E + 'static,
        filter: impl Fn(&T) -> bool + 'static,
    ) -> Signal<E> {
        let child =
            Signal::<E>::build(false, self.inner.history_limit, Rc::clone(&self.inner.tasks));
        let weak_child = Rc::downgrade(&child.inner);
        let subscription = self.subscribe(
            move |value| {
                if !filter(value) {
                    return;
                }
                if let Some(inner) = weak_child.upgrade() {
                    Signal { inner }.set(map(value));
                }
            },
            true,
        );

        let id = subscription.id;
        *child.inner.detach.borrow_mut() = Some(Box::new(move || subscription.unsubscribe()));
        let node: Rc<dyn Node> = child.inner.clone();
        self.inner.derived.borrow_mut().push((id, node));
        child
    }

    /// Derived signal carrying the values for which `predicate` holds.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Signal<T> {
        self.derive_filtered(T::clone, predicate)
    }

    /// Clear the subscribers, destroy every derived signal, and unsubscribe
    /// from the parent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Run queued replays (and any they queue in turn). Returns how many ran.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.inner.tasks.pop() {
            task();
            ran += 1;
        }
        ran
    }

    /// Replays waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.tasks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    pub fn derived_count(&self) -> usize {
        self.inner.derived.borrow().len()
    }
}

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.subscriber_count())
            .field("derived", &self.derived_count())
            .finish()
    }
}

/// Handle returned by [`Signal::subscribe`]. Dropping it keeps the
/// subscription; call [`unsubscribe`](Self::unsubscribe) to end it.
pub struct Subscription<T: Clone + 'static> {
    signal: Weak<Inner<T>>,
    id: u64,
}

impl<T: Clone + 'static> Subscription<T> {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.signal
            .upgrade()
            .is_some_and(|inner| inner.is_subscribed(self.id))
    }
}
