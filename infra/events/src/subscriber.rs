use crate::envelope::Envelope;
use crate::error::DispatchError;
use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};

/// Something that can be notified of published envelopes.
///
/// Returning an error (or panicking) marks the delivery as failed. The dispatcher
/// reports it to its failure sink and carries on with the next subscriber.
pub trait Subscriber: Send + Sync + 'static {
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError>;

    /// Identity used in failure reports and logs.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(type_name::<Self>())
    }
}

/// Owning handle to a subscriber.
///
/// The dispatcher only keeps weak references; a subscription lives exactly as
/// long as at least one clone of its handle does. Equality of handles is identity
/// of the underlying allocation, see [`SubscriberHandle::same_as`].
#[derive(Clone)]
pub struct SubscriberHandle {
    inner: Arc<dyn Subscriber>,
}

impl SubscriberHandle {
    #[must_use]
    pub fn new<S: Subscriber>(subscriber: S) -> Self {
        Self { inner: Arc::new(subscriber) }
    }

    /// Builds a handle from a closure, see [`FnSubscriber`].
    #[must_use]
    pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, receive: F) -> Self
    where
        F: Fn(&Envelope) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self::new(FnSubscriber::new(name, receive))
    }

    #[must_use]
    pub fn from_arc(inner: Arc<dyn Subscriber>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        self.inner.name()
    }

    /// Delivers directly, bypassing any dispatcher.
    ///
    /// # Errors
    /// Whatever the subscriber returns.
    pub fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        self.inner.receive(envelope)
    }

    /// `true` when both handles point at the same subscriber instance.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Subscriber> {
        Arc::downgrade(&self.inner)
    }

    /// Live, non-upgrading identity check used by the registry.
    pub(crate) fn is_referenced_by(&self, weak: &Weak<dyn Subscriber>) -> bool {
        weak.strong_count() > 0 && std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(&self.inner))
    }

    pub(crate) fn upgrade(weak: &Weak<dyn Subscriber>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl<S: Subscriber> From<Arc<S>> for SubscriberHandle {
    fn from(subscriber: Arc<S>) -> Self {
        Self { inner: subscriber }
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubscriberHandle").field(&self.name()).finish()
    }
}

/// Adapts a closure into a named [`Subscriber`].
pub struct FnSubscriber<F> {
    name: Cow<'static, str>,
    receive: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&Envelope) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, receive: F) -> Self {
        Self { name: name.into(), receive }
    }
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&Envelope) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        (self.receive)(envelope)
    }

    fn name(&self) -> Cow<'static, str> {
        self.name.clone()
    }
}

impl<F> fmt::Debug for FnSubscriber<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubscriber").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;

    impl Subscriber for Quiet {
        fn receive(&self, _envelope: &Envelope) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[test]
    fn default_name_is_the_type_name() {
        let handle = SubscriberHandle::new(Quiet);
        assert!(handle.name().ends_with("Quiet"));
    }

    #[test]
    fn closures_keep_their_name() {
        let handle = SubscriberHandle::from_fn("audit", |_| Ok(()));
        assert_eq!(handle.name(), "audit");
        assert!(handle.receive(&Envelope::tagged("Ping", ())).is_ok());
    }

    #[test]
    fn identity_follows_the_allocation() {
        let a = SubscriberHandle::new(Quiet);
        let b = SubscriberHandle::new(Quiet);

        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn weak_reference_does_not_keep_subscriber_alive() {
        let handle = SubscriberHandle::new(Quiet);
        let weak = handle.downgrade();
        assert!(handle.is_referenced_by(&weak));

        drop(handle);
        assert!(SubscriberHandle::upgrade(&weak).is_none());
    }

    #[test]
    fn shared_arcs_become_handles() {
        let shared = Arc::new(Quiet);
        let handle = SubscriberHandle::from(Arc::clone(&shared));
        let weak = handle.downgrade();

        drop(handle);
        assert!(SubscriberHandle::upgrade(&weak).is_some(), "the Arc still owns the subscriber");
    }
}
