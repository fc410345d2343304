//! # Herald Events
//!
//! A synchronous, thread-safe publish/subscribe dispatcher for in-process events.
//!
//! ## Overview
//!
//! Subscribers register interest in an [`EventType`]; publishers wrap data in an
//! [`Envelope`] and hand it to [`Dispatcher::publish`], which calls every live
//! subscriber of that type, one at a time, in registration order.
//!
//! ## Features
//!
//! * **Weak registrations**: the dispatcher never keeps a subscriber alive. Drop the
//!   last [`SubscriberHandle`] and the subscription disappears on the next read.
//! * **Failure isolation**: an error or panic in one subscriber is reported to a
//!   [`FailureSink`] and does not affect the others or the publisher.
//! * **Deterministic order**: registration order within a publish, and serialized
//!   publishes across threads by default.
//! * **Reentrant-safe**: subscribers may use the dispatcher from inside `receive`
//!   on their own thread. With serialized publishing (the default) a subscriber
//!   must not wait on a publish running on another thread; see [`Dispatcher`].
//! * **Low overhead**: `FxHashMap` + `parking_lot` locks, no background threads.
//!
//! # Example
//!
//! ```rust
//! use herald_events::{Dispatcher, Envelope, Event, EventType, SubscriberHandle};
//!
//! struct UserCreated {
//!     id: u64,
//! }
//!
//! impl Event for UserCreated {
//!     const EVENT_TYPE: EventType = EventType::from_static("UserCreated");
//! }
//!
//! let dispatcher = Dispatcher::new();
//!
//! let welcome = SubscriberHandle::from_fn("welcome", |envelope| {
//!     let event = envelope.event::<UserCreated>()?;
//!     assert_eq!(event.id, 42);
//!     Ok(())
//! });
//! dispatcher.subscribe(UserCreated::EVENT_TYPE, &welcome);
//!
//! dispatcher.publish(&Envelope::new(UserCreated { id: 42 }));
//! assert_eq!(dispatcher.subscriber_count("UserCreated"), 1);
//!
//! drop(welcome);
//! assert_eq!(dispatcher.subscriber_count("UserCreated"), 0);
//! ```

mod dispatcher;
mod envelope;
mod error;
mod registry;
mod sink;
mod subscriber;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use envelope::{Envelope, Event, EventType};
pub use error::{DispatchError, DispatchErrorExt};
pub use sink::{FailureSink, SubscriberFailure, TracingSink};
pub use subscriber::{FnSubscriber, Subscriber, SubscriberHandle};
