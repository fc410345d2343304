use crate::envelope::{Envelope, EventType};
use crate::error::DispatchError;
use crate::registry::Registry;
use crate::sink::{FailureSink, SubscriberFailure, TracingSink};
use crate::subscriber::SubscriberHandle;
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace};

const UNNAMED_SUBSCRIBER: &str = "<unnamed subscriber>";

struct DispatcherInner {
    registry: Mutex<Registry>,
    delivery: ReentrantMutex<()>,
    serialize_publish: bool,
    sink: Arc<dyn FailureSink>,
}

/// Synchronous, in-process publish/subscribe dispatcher.
///
/// Cloning is cheap and clones share the same registry, so build one at the
/// composition root and hand clones to whoever publishes or subscribes.
///
/// # Locking
///
/// The registry lock is held only to mutate the registry, or to prune and snapshot
/// it at the start of a publish. Subscribers are invoked after it is released, so
/// a subscriber may call back into the same dispatcher (subscribe, unsubscribe,
/// count, or publish) without deadlocking.
///
/// With `serialize_publish` on (the default), publishes from different threads
/// are additionally serialized by a reentrant delivery lock: one publish finishes
/// every invocation before another thread's publish starts. A nested publish
/// from inside a subscriber is delivered inline, depth first.
///
/// The delivery lock is held while subscribers run. A subscriber that hands a
/// `publish` on this dispatcher to another thread and then waits for it (join,
/// channel reply, scoped thread) blocks forever: the other thread waits for the
/// delivery lock the subscriber's own publish holds. Subscribe, unsubscribe and
/// count never take the delivery lock and are safe from any thread. Build the
/// dispatcher with `serialize_publish(false)` when subscribers need to wait on
/// publishes made from other threads.
///
/// Membership is eventually consistent: a subscribe or unsubscribe racing an
/// in-flight publish affects the next snapshot, not the current one.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// A dispatcher with serialized publishes and a [`TracingSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use = "The builder must be configured before it can be used to build a dispatcher."]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Registers a weak interest of `subscriber` in `event_type`.
    ///
    /// Subscribing the same handle twice yields two registrations and two
    /// deliveries per event.
    pub fn subscribe(&self, event_type: impl Into<EventType>, subscriber: &SubscriberHandle) {
        let event_type = event_type.into();
        let order = self.inner.registry.lock().add(event_type.clone(), subscriber);
        debug!(event_type = %event_type, subscriber = %subscriber.name(), order, "Subscribed");
    }

    /// Removes the earliest live registration of `subscriber` for `event_type`.
    ///
    /// A no-op when there is none.
    pub fn unsubscribe(&self, event_type: impl Into<EventType>, subscriber: &SubscriberHandle) {
        let event_type = event_type.into();
        let removed = self.inner.registry.lock().remove(&event_type, subscriber);
        match removed {
            Some(order) => {
                debug!(
                    event_type = %event_type,
                    subscriber = %subscriber.name(),
                    order,
                    "Unsubscribed"
                );
            },
            None => {
                trace!(
                    event_type = %event_type,
                    subscriber = %subscriber.name(),
                    "Unsubscribe ignored: no live registration"
                );
            },
        }
    }

    /// Delivers `envelope` to every live subscriber of its event type, in
    /// registration order.
    ///
    /// Failures are reported to the failure sink and never reach the caller.
    pub fn publish(&self, envelope: &Envelope) {
        let _serial = self.inner.serialize_publish.then(|| self.inner.delivery.lock());
        let event_type = envelope.event_type();

        let snapshot = {
            let mut registry = self.inner.registry.lock();
            let pruned = registry.prune(event_type);
            if pruned > 0 {
                trace!(event_type = %event_type, pruned, "Pruned dropped subscribers");
            }
            registry.snapshot(event_type)
        };

        if snapshot.is_empty() {
            trace!(event_type = %event_type, "Event dropped: no live subscribers");
            return;
        }

        let mut failed = 0_usize;
        for subscriber in &snapshot {
            if let Err(error) = deliver(subscriber, envelope) {
                failed += 1;
                self.report(&SubscriberFailure {
                    subscriber: subscriber_name(subscriber),
                    handle: subscriber.clone(),
                    event_type: event_type.clone(),
                    error,
                });
            }
        }

        trace!(
            event_type = %event_type,
            delivered = snapshot.len() - failed,
            failed,
            "Event dispatched"
        );
    }

    /// Number of live registrations for `event_type`, after pruning.
    #[must_use]
    pub fn subscriber_count(&self, event_type: impl Into<EventType>) -> usize {
        self.inner.registry.lock().count(&event_type.into())
    }

    /// Event types with at least one registration not yet pruned, sorted.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.inner.registry.lock().event_types()
    }

    fn report(&self, failure: &SubscriberFailure) {
        let recorded = panic::catch_unwind(AssertUnwindSafe(|| self.inner.sink.record(failure)));
        if let Err(payload) = recorded {
            error!(
                subscriber = %failure.subscriber,
                event_type = %failure.event_type,
                panic = %panic_message(payload.as_ref()),
                "Failure sink panicked while recording a subscriber failure"
            );
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &*self.inner.registry.lock())
            .field("serialize_publish", &self.inner.serialize_publish)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    serialize_publish: bool,
    sink: Arc<dyn FailureSink>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self { serialize_publish: true, sink: Arc::new(TracingSink) }
    }
}

impl DispatcherBuilder {
    /// Whether publishes from different threads wait for each other. Defaults to `true`.
    ///
    /// While on, a subscriber must not block on a publish running on another
    /// thread; see [`Dispatcher`] for the deadlock this causes. Turning it off
    /// lets such publishes deliver in parallel with the one in progress.
    #[must_use = "The builder must be configured before it can be used to build a dispatcher."]
    pub const fn serialize_publish(mut self, enabled: bool) -> Self {
        self.serialize_publish = enabled;
        self
    }

    /// Where isolated subscriber failures go. Defaults to [`TracingSink`].
    #[must_use = "The builder must be configured before it can be used to build a dispatcher."]
    pub fn failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                registry: Mutex::new(Registry::default()),
                delivery: ReentrantMutex::new(()),
                serialize_publish: self.serialize_publish,
                sink: self.sink,
            }),
        }
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("serialize_publish", &self.serialize_publish)
            .finish_non_exhaustive()
    }
}

fn deliver(subscriber: &SubscriberHandle, envelope: &Envelope) -> Result<(), DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(|| subscriber.receive(envelope))).unwrap_or_else(
        |payload| {
            Err(DispatchError::Panicked {
                message: panic_message(payload.as_ref()).into(),
                context: None,
            })
        },
    )
}

/// The subscriber's name, or a placeholder when `name` itself panics.
fn subscriber_name(subscriber: &SubscriberHandle) -> Cow<'static, str> {
    panic::catch_unwind(AssertUnwindSafe(|| subscriber.name()))
        .unwrap_or(Cow::Borrowed(UNNAMED_SUBSCRIBER))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload = panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn builder_defaults_serialize_publishes() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.inner.serialize_publish);

        let dispatcher = Dispatcher::builder().serialize_publish(false).build();
        assert!(!dispatcher.inner.serialize_publish);
    }

    #[test]
    fn clones_share_the_registry() {
        let dispatcher = Dispatcher::new();
        let clone = dispatcher.clone();
        let handle = SubscriberHandle::from_fn("listener", |_| Ok(()));

        clone.subscribe("X", &handle);

        assert_eq!(dispatcher.subscriber_count("X"), 1);
        assert_eq!(dispatcher.event_types(), [EventType::from("X")]);
    }
}
