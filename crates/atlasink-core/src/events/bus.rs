//! Event bus implementation.
//!
//! The bus is single-threaded: handlers run on the publishing thread and
//! may publish, subscribe or unsubscribe from inside a callback. Nested
//! publishes are queued and delivered after the current event, so every
//! subscriber sees events in publish order.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::{Rc, Weak};
use uuid::Uuid;

use super::events::{EditorEvent, Topic};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.simple().to_string()[..8])
    }
}

/// Filter to receive only specific topics
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events on any of these topics.
    Topics(Vec<Topic>),
}

impl EventFilter {
    pub fn matches(&self, event: &EditorEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Topics(topics) => topics.contains(&event.topic()),
        }
    }
}

type EventHandler = Box<dyn FnMut(&EditorEvent)>;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Whether to keep event history.
    pub enable_history: bool,
    /// Maximum number of events to retain in history.
    pub max_history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_history: false,
            max_history_size: 256,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: EventHandler,
}

type Queue = Rc<RefCell<VecDeque<EditorEvent>>>;

#[derive(Default)]
struct BusInner {
    handlers: Vec<Subscription>,
    live: HashSet<SubscriptionId>,
    pending: VecDeque<EditorEvent>,
    dispatching: bool,
    receivers: Vec<(Weak<RefCell<VecDeque<EditorEvent>>>, EventFilter)>,
    history: VecDeque<EditorEvent>,
    config: EventBusConfig,
}

/// Cloneable handle to one bus instance.
///
/// Every clone shares the same subscribers; separate `EventBus::new()`
/// calls are fully isolated.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &inner.live.len())
            .field("receivers", &inner.receivers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                config,
                ..BusInner::default()
            })),
        }
    }

    /// Publish an event to all receivers and handlers.
    pub fn publish(&self, event: EditorEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            log::trace!("publish {}", event.topic());

            if inner.config.enable_history {
                if inner.history.len() >= inner.config.max_history_size {
                    inner.history.pop_front();
                }
                inner.history.push_back(event.clone());
            }

            inner.receivers.retain(|(queue, filter)| match queue.upgrade() {
                Some(queue) => {
                    if filter.matches(&event) {
                        queue.borrow_mut().push_back(event.clone());
                    }
                    true
                }
                None => false,
            });

            if inner.handlers.is_empty() && !inner.dispatching {
                return;
            }
            inner.pending.push_back(event);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }
        self.dispatch();
    }

    fn dispatch(&self) {
        loop {
            let (event, mut handlers) = {
                let mut inner = self.inner.borrow_mut();
                let Some(event) = inner.pending.pop_front() else {
                    inner.dispatching = false;
                    return;
                };
                (event, std::mem::take(&mut inner.handlers))
            };

            for sub in handlers.iter_mut() {
                let live = self.inner.borrow().live.contains(&sub.id);
                if live && sub.filter.matches(&event) {
                    (sub.handler)(&event);
                }
            }

            let mut inner = self.inner.borrow_mut();
            let added = std::mem::take(&mut inner.handlers);
            handlers.extend(added);
            handlers.retain(|s| inner.live.contains(&s.id));
            inner.handlers = handlers;
        }
    }

    /// Subscribe with a synchronous handler.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        let id = SubscriptionId::new();
        let mut inner = self.inner.borrow_mut();
        inner.live.insert(id);
        inner.handlers.push(Subscription {
            id,
            filter,
            handler: Box::new(handler),
        });
        log::debug!("Subscription {} added", id);
        id
    }

    /// Unsubscribe a handler. Returns true if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.live.remove(&id);
        if removed {
            inner.handlers.retain(|s| s.id != id);
            log::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get a queue for polling events.
    ///
    /// The receiver only sees events published after it was created.
    pub fn receiver(&self, filter: EventFilter) -> EventReceiver {
        let queue: Queue = Rc::new(RefCell::new(VecDeque::new()));
        self.inner
            .borrow_mut()
            .receivers
            .push((Rc::downgrade(&queue), filter));
        EventReceiver { queue }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().live.len()
    }

    pub fn receiver_count(&self) -> usize {
        self.inner
            .borrow()
            .receivers
            .iter()
            .filter(|(q, _)| q.strong_count() > 0)
            .count()
    }

    /// Recorded events, oldest first. Empty unless history is enabled.
    pub fn history(&self) -> Vec<EditorEvent> {
        self.inner.borrow().history.iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.inner.borrow_mut().history.clear();
    }
}

/// Polled FIFO of events; dropping it detaches it from the bus.
#[derive(Debug)]
pub struct EventReceiver {
    queue: Queue,
}

impl EventReceiver {
    pub fn try_recv(&self) -> Option<EditorEvent> {
        self.queue.borrow_mut().pop_front()
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<EditorEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
