use crate::envelope::EventType;
use crate::error::DispatchError;
use crate::subscriber::SubscriberHandle;
use std::borrow::Cow;
use std::fmt;
use tracing::warn;

/// Record of one subscriber failing to handle one event.
///
/// `handle` identifies the failing instance: compare it with
/// [`SubscriberHandle::same_as`] or pass it to `Dispatcher::unsubscribe`.
/// Holding on to it keeps the subscriber alive.
#[derive(Debug)]
pub struct SubscriberFailure {
    pub subscriber: Cow<'static, str>,
    pub handle: SubscriberHandle,
    pub event_type: EventType,
    pub error: DispatchError,
}

impl fmt::Display for SubscriberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed on {}: {}", self.subscriber, self.event_type, self.error)
    }
}

/// Receives isolated subscriber failures, synchronously, from inside `publish`.
///
/// Closures taking `&SubscriberFailure` are sinks too.
pub trait FailureSink: Send + Sync {
    fn record(&self, failure: &SubscriberFailure);
}

impl<F> FailureSink for F
where
    F: Fn(&SubscriberFailure) + Send + Sync,
{
    fn record(&self, failure: &SubscriberFailure) {
        self(failure);
    }
}

/// Default sink: one `warn!` per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn record(&self, failure: &SubscriberFailure) {
        warn!(
            subscriber = %failure.subscriber,
            event_type = %failure.event_type,
            kind = failure.error.variant_name(),
            error = %failure.error,
            "Subscriber failed to handle event"
        );
    }
}
