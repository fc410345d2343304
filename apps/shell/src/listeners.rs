//! Subscribers used by the demonstration scenario.

use crate::events::UserLogin;
use herald_events::{
    DispatchError, Envelope, Event, EventType, FailureSink, Subscriber, SubscriberFailure,
    TracingSink,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Logs every envelope it receives.
#[derive(Debug, Default)]
pub struct AuditTrail {
    seen: AtomicU64,
}

impl AuditTrail {
    /// Envelopes received so far.
    #[must_use]
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

impl Subscriber for AuditTrail {
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            event_type = %envelope.event_type(),
            created_at = %envelope.created_at(),
            seen,
            "Audit: event received"
        );
        Ok(())
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("AuditTrail")
    }
}

/// Records user logins.
///
/// Envelopes of any other type are ignored. A `UserLogin`-tagged envelope with a
/// foreign payload is rejected with [`DispatchError::TypeMismatch`].
#[derive(Debug, Default)]
pub struct SecurityMonitor {
    logins: Mutex<Vec<String>>,
}

impl SecurityMonitor {
    /// Usernames in the order they were seen.
    #[must_use]
    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().clone()
    }
}

impl Subscriber for SecurityMonitor {
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        if envelope.event_type() != &UserLogin::EVENT_TYPE {
            return Ok(());
        }

        let login = envelope.event::<UserLogin>()?;
        info!(username = %login.username, at = %login.at, "Security: user login detected");
        self.logins.lock().push(login.username.clone());
        Ok(())
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("SecurityMonitor")
    }
}

/// Counts received envelopes per event type.
#[derive(Debug, Default)]
pub struct EventMetrics {
    counts: Mutex<BTreeMap<EventType, u64>>,
}

impl EventMetrics {
    /// Snapshot of the counters, ordered by event type.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<EventType, u64> {
        self.counts.lock().clone()
    }
}

impl Subscriber for EventMetrics {
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let count = {
            let mut counts = self.counts.lock();
            let slot = counts.entry(envelope.event_type().clone()).or_default();
            *slot += 1;
            *slot
        };
        info!(event_type = %envelope.event_type(), count, "Metrics: counter updated");
        Ok(())
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("EventMetrics")
    }
}

/// Failure sink that counts failures and forwards them to [`TracingSink`].
#[derive(Debug, Default)]
pub struct FailureTally {
    failures: AtomicU64,
}

impl FailureTally {
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl FailureSink for FailureTally {
    fn record(&self, failure: &SubscriberFailure) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        TracingSink.record(failure);
    }
}
