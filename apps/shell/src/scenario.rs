//! The login/upload walkthrough run by the `herald` binary.

use crate::config::DispatchSettings;
use crate::events::{FileUpload, UserLogin};
use crate::listeners::{AuditTrail, EventMetrics, FailureTally, SecurityMonitor};
use herald_events::{Dispatcher, Envelope, Event, EventType, SubscriberHandle};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const EARLY_LOGINS: [&str; 2] = ["alice", "bob"];
const UPLOAD_NAME: &str = "document.pdf";
const UPLOAD_SIZE: u64 = 1_024_000;

/// What one run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// `UserLogin` subscribers before the security monitor leaves.
    pub login_listeners: usize,
    pub upload_listeners: usize,
    /// `UserLogin` subscribers after the security monitor leaves.
    pub login_listeners_after_unsubscribe: usize,
    /// `UserLogin` subscribers once every listener has been dropped.
    pub login_listeners_after_drop: usize,
    pub audited: u64,
    pub logins: Vec<String>,
    pub metrics: BTreeMap<EventType, u64>,
    pub failures: u64,
}

/// Builds a dispatcher from `settings` and runs the scenario on it.
#[must_use]
pub fn run(settings: &DispatchSettings) -> Summary {
    let tally = Arc::new(FailureTally::default());
    let dispatcher = Dispatcher::builder()
        .serialize_publish(settings.serialize_publish)
        .failure_sink(tally.clone())
        .build();

    let mut summary = run_on(&dispatcher);
    summary.failures = tally.failures();
    summary
}

/// Runs the scenario on an existing dispatcher.
///
/// Listeners live only for the duration of the call, so the dispatcher holds
/// no live subscriptions for them afterwards. [`Summary::failures`] is left at
/// zero; failures go to the dispatcher's own sink.
#[must_use]
pub fn run_on(dispatcher: &Dispatcher) -> Summary {
    let audit = Arc::new(AuditTrail::default());
    let security = Arc::new(SecurityMonitor::default());
    let metrics = Arc::new(EventMetrics::default());

    let audit_handle = SubscriberHandle::from(Arc::clone(&audit));
    let security_handle = SubscriberHandle::from(Arc::clone(&security));
    let metrics_handle = SubscriberHandle::from(Arc::clone(&metrics));

    dispatcher.subscribe(UserLogin::EVENT_TYPE, &audit_handle);
    dispatcher.subscribe(UserLogin::EVENT_TYPE, &security_handle);
    dispatcher.subscribe(UserLogin::EVENT_TYPE, &metrics_handle);
    dispatcher.subscribe(FileUpload::EVENT_TYPE, &audit_handle);
    dispatcher.subscribe(FileUpload::EVENT_TYPE, &metrics_handle);

    for username in EARLY_LOGINS {
        dispatcher.publish(&Envelope::new(UserLogin::now(username)));
    }
    dispatcher.publish(&Envelope::new(FileUpload::new(UPLOAD_NAME, UPLOAD_SIZE)));
    dispatcher.publish(&Envelope::new(UserLogin::now("charlie")));

    let login_listeners = dispatcher.subscriber_count(UserLogin::EVENT_TYPE);
    let upload_listeners = dispatcher.subscriber_count(FileUpload::EVENT_TYPE);
    info!(login_listeners, upload_listeners, "Listener counts");

    dispatcher.unsubscribe(UserLogin::EVENT_TYPE, &security_handle);
    let login_listeners_after_unsubscribe = dispatcher.subscriber_count(UserLogin::EVENT_TYPE);
    info!(login_listeners = login_listeners_after_unsubscribe, "Security monitor unsubscribed");

    dispatcher.publish(&Envelope::new(UserLogin::now("dave")));

    let audited = audit.seen();
    let logins = security.logins();
    let metrics_snapshot = metrics.counts();

    drop((audit_handle, security_handle, metrics_handle));
    drop((audit, security, metrics));
    let login_listeners_after_drop = dispatcher.subscriber_count(UserLogin::EVENT_TYPE);

    Summary {
        login_listeners,
        upload_listeners,
        login_listeners_after_unsubscribe,
        login_listeners_after_drop,
        audited,
        logins,
        metrics: metrics_snapshot,
        failures: 0,
    }
}
