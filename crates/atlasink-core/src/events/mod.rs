//! Owner-scoped publish/subscribe channel between tools and the editor.

mod bus;
mod events;

pub use bus::{EventBus, EventBusConfig, EventFilter, EventReceiver, SubscriptionId};
pub use events::{EditorEvent, Topic, ViewportChange};
