use crate::envelope::EventType;
use crate::subscriber::{Subscriber, SubscriberHandle};
use fxhash::FxHashMap;
use std::sync::Weak;

#[derive(Debug)]
struct Subscription {
    subscriber: Weak<dyn Subscriber>,
    order: u64,
}

impl Subscription {
    fn is_live(&self) -> bool {
        self.subscriber.strong_count() > 0
    }
}

/// Per-event-type ordered store of weakly held subscribers.
///
/// Partitions are only appended to or filtered in place, so surviving entries
/// keep their registration order. A partition emptied by a filter is dropped and
/// recreated on the next `add`. Not synchronized; the dispatcher owns the lock.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    partitions: FxHashMap<EventType, Vec<Subscription>>,
    next_order: u64,
}

impl Registry {
    /// Appends a subscription and returns its insertion order. No uniqueness check.
    pub(crate) fn add(&mut self, event_type: EventType, subscriber: &SubscriberHandle) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        self.partitions
            .entry(event_type)
            .or_default()
            .push(Subscription { subscriber: subscriber.downgrade(), order });
        order
    }

    /// Removes the first live entry for `subscriber`, returning its insertion order.
    pub(crate) fn remove(
        &mut self,
        event_type: &EventType,
        subscriber: &SubscriberHandle,
    ) -> Option<u64> {
        let entries = self.partitions.get_mut(event_type)?;
        let index = entries.iter().position(|entry| subscriber.is_referenced_by(&entry.subscriber))?;
        let removed = entries.remove(index);
        if entries.is_empty() {
            self.partitions.remove(event_type);
        }
        Some(removed.order)
    }

    /// Drops entries whose subscriber no longer exists. Returns how many were dropped.
    pub(crate) fn prune(&mut self, event_type: &EventType) -> usize {
        let Some(entries) = self.partitions.get_mut(event_type) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(Subscription::is_live);
        let pruned = before - entries.len();
        if entries.is_empty() {
            self.partitions.remove(event_type);
        }
        pruned
    }

    /// Prunes, then returns strong handles to every live subscriber in registration order.
    pub(crate) fn snapshot(&mut self, event_type: &EventType) -> Vec<SubscriberHandle> {
        self.prune(event_type);
        self.partitions.get(event_type).map_or_else(Vec::new, |entries| {
            entries.iter().filter_map(|entry| SubscriberHandle::upgrade(&entry.subscriber)).collect()
        })
    }

    pub(crate) fn count(&mut self, event_type: &EventType) -> usize {
        self.prune(event_type);
        self.partitions.get(event_type).map_or(0, Vec::len)
    }

    /// Event types that currently hold at least one entry, live or not yet pruned.
    pub(crate) fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.partitions.keys().cloned().collect();
        types.sort_unstable();
        types
    }
}
