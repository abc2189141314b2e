pub mod broadcast;
pub mod sink;

pub use broadcast::{BroadcastSink, LifecycleEvent, LifecyclePhase};
pub use sink::{Lifecycle, NoopSink, NotificationSink, PendingNotification, TracingSink};
