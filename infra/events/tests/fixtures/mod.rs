#![allow(dead_code)]

use herald_events::{
    DispatchError, Envelope, Event, EventType, FailureSink, Subscriber, SubscriberFailure,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub u64);

impl Event for TestEvent {
    const EVENT_TYPE: EventType = EventType::from_static("X");
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtherEvent(pub u64);

impl Event for OtherEvent {
    const EVENT_TYPE: EventType = EventType::from_static("Y");
}

/// Shared, ordered log of `subscriber:payload` entries.
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    Accept,
    Reject,
    Panic,
}

/// Records every delivery into a [`CallLog`], then behaves as configured.
#[derive(Debug)]
pub struct Recorder {
    pub name: &'static str,
    pub log: CallLog,
    pub behavior: Behavior,
}

impl Recorder {
    #[must_use]
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self { name, log: Arc::clone(log), behavior: Behavior::Accept }
    }

    #[must_use]
    pub const fn behaving(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }
}

impl Subscriber for Recorder {
    fn receive(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        let entry = envelope.payload::<TestEvent>().map_or_else(
            |_| format!("{}:{}", self.name, envelope.event_type()),
            |event| format!("{}:{}", self.name, event.0),
        );
        self.log.lock().push(entry);

        match self.behavior {
            Behavior::Accept => Ok(()),
            Behavior::Reject => Err(DispatchError::rejected(format!("{} refuses", self.name))),
            Behavior::Panic => panic!("{} exploded", self.name),
        }
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.name)
    }
}

/// Keeps `(subscriber, event_type, error kind)` for every reported failure.
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: Mutex<Vec<(String, String, &'static str)>>,
}

impl CollectingSink {
    #[must_use]
    pub fn failures(&self) -> Vec<(String, String, &'static str)> {
        self.failures.lock().clone()
    }
}

impl FailureSink for CollectingSink {
    fn record(&self, failure: &SubscriberFailure) {
        self.failures.lock().push((
            failure.subscriber.to_string(),
            failure.event_type.to_string(),
            failure.error.variant_name(),
        ));
    }
}

#[must_use]
pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().clone()
}
