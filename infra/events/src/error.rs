use std::borrow::Cow;

/// Errors produced while building, reading or delivering envelopes.
///
/// Only [`DispatchError::TypeMismatch`] ever reaches a publisher directly, from the
/// envelope accessors. Everything a subscriber returns or raises during delivery is
/// contained by the dispatcher and reported through its failure sink.
#[herald_derive::herald_error]
pub enum DispatchError {
    /// The payload was requested as a type the envelope does not carry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A subscriber reported that it could not handle an event.
    #[error("Subscriber rejected event{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A subscriber panicked while handling an event.
    #[error("Subscriber panicked{}: {message}", format_context(.context))]
    Panicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal dispatch error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DispatchError {
    /// Shorthand for a subscriber-side [`DispatchError::Rejected`].
    #[must_use]
    pub fn rejected(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Rejected { message: message.into(), context: None }
    }
}
