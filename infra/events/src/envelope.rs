use crate::error::DispatchError;
use chrono::{DateTime, Utc};
use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Identifier that partitions subscriptions and tags envelopes.
///
/// Cheap to build from string literals (`"UserLogin".into()`) and usable in
/// constant position through [`EventType::from_static`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    #[must_use]
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventType {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl From<&Self> for EventType {
    fn from(tag: &Self) -> Self {
        tag.clone()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A payload type with a fixed event type tag.
///
/// Implementing this lets [`Envelope::new`] tag the envelope automatically and lets
/// [`Envelope::event`] check both the tag and the payload shape.
pub trait Event: Any + Send + Sync + 'static {
    const EVENT_TYPE: EventType;
}

/// An immutable unit of event data.
///
/// Cloning is cheap: clones share the same payload allocation.
#[derive(Clone)]
pub struct Envelope {
    event_type: EventType,
    payload: Arc<dyn Any + Send + Sync>,
    payload_type: &'static str,
    created_at: DateTime<Utc>,
}

impl Envelope {
    /// Wraps a typed event, tagging the envelope with [`Event::EVENT_TYPE`].
    #[must_use]
    pub fn new<E: Event>(event: E) -> Self {
        Self::tagged(E::EVENT_TYPE, event)
    }

    /// Wraps an arbitrary payload under an explicit event type tag.
    #[must_use]
    pub fn tagged<P>(event_type: impl Into<EventType>, payload: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self {
            event_type: event_type.into(),
            payload: Arc::new(payload),
            payload_type: type_name::<P>(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Wall-clock construction time. Informational only.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Rust type name of the payload, as recorded at construction.
    #[must_use]
    pub const fn payload_type(&self) -> &'static str {
        self.payload_type
    }

    /// Borrows the payload as `P`.
    ///
    /// # Errors
    /// Returns [`DispatchError::TypeMismatch`] if the payload is not a `P`.
    pub fn payload<P: Any>(&self) -> Result<&P, DispatchError> {
        self.payload.downcast_ref::<P>().ok_or_else(|| DispatchError::TypeMismatch {
            message: format!(
                "`{}` envelope carries `{}`, not `{}`",
                self.event_type,
                self.payload_type,
                type_name::<P>()
            )
            .into(),
            context: None,
        })
    }

    /// Borrows the payload as the typed event `E`.
    ///
    /// # Errors
    /// Returns [`DispatchError::TypeMismatch`] if the envelope is not tagged with
    /// `E::EVENT_TYPE` or its payload is not an `E`.
    pub fn event<E: Event>(&self) -> Result<&E, DispatchError> {
        if self.event_type != E::EVENT_TYPE {
            return Err(DispatchError::TypeMismatch {
                message: format!(
                    "expected a `{}` envelope, got `{}`",
                    E::EVENT_TYPE,
                    self.event_type
                )
                .into(),
                context: Some(type_name::<E>().into()),
            });
        }
        self.payload::<E>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("event_type", &self.event_type)
            .field("payload_type", &self.payload_type)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct UserLogin(&'static str);

    impl Event for UserLogin {
        const EVENT_TYPE: EventType = EventType::from_static("UserLogin");
    }

    #[derive(Debug, PartialEq)]
    struct FileUpload(u64);

    impl Event for FileUpload {
        const EVENT_TYPE: EventType = EventType::from_static("FileUpload");
    }

    #[test]
    fn typed_envelope_is_tagged_from_event() {
        let envelope = Envelope::new(UserLogin("alice"));

        assert_eq!(envelope.event_type().as_str(), "UserLogin");
        assert_eq!(envelope.event::<UserLogin>().unwrap(), &UserLogin("alice"));
        assert_eq!(envelope.payload::<UserLogin>().unwrap().0, "alice");
    }

    #[test]
    fn wrong_payload_type_is_a_mismatch() {
        let envelope = Envelope::new(UserLogin("alice"));

        let err = envelope.payload::<FileUpload>().unwrap_err();
        assert!(matches!(err, DispatchError::TypeMismatch { .. }));
        assert!(err.to_string().contains("UserLogin"));
    }

    #[test]
    fn tag_is_checked_before_payload() {
        // Right payload, wrong tag: still rejected by the typed accessor.
        let envelope = Envelope::tagged("FileUpload", UserLogin("mallory"));

        assert!(matches!(
            envelope.event::<UserLogin>(),
            Err(DispatchError::TypeMismatch { context: Some(_), .. })
        ));
        assert!(envelope.payload::<UserLogin>().is_ok());
    }

    #[test]
    fn tagged_envelopes_carry_plain_payloads() {
        let envelope = Envelope::tagged(String::from("Heartbeat"), 7_u32);

        assert_eq!(envelope.event_type(), &EventType::from("Heartbeat"));
        assert_eq!(*envelope.payload::<u32>().unwrap(), 7);
        assert_eq!(envelope.payload_type(), "u32");
    }

    #[test]
    fn clones_share_the_payload() {
        let envelope = Envelope::new(FileUpload(1024));
        let copy = envelope.clone();

        assert!(std::ptr::eq(
            envelope.event::<FileUpload>().unwrap(),
            copy.event::<FileUpload>().unwrap()
        ));
        assert_eq!(envelope.created_at(), copy.created_at());
    }

    #[test]
    fn event_types_compare_by_content() {
        let owned = EventType::from(String::from("UserLogin"));
        assert_eq!(owned, UserLogin::EVENT_TYPE);
        assert_eq!(owned.to_string(), "UserLogin");
    }
}
