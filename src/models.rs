//! Building blocks of an error value: causes, identity tags and options.
//!
//! # Identity
//!
//! Downstream code often needs to tell "one of ours" apart from arbitrary
//! errors caught at a boundary. That distinction is the [`ErrorKind`] tag:
//! [`JpiError`] is always [`ErrorKind::Taxonomy`], everything else is
//! [`ErrorKind::Platform`].
//!
//! # Causes
//!
//! A cause is exclusively owned by the error it explains and is one of:
//!
//! - another [`JpiError`]
//! - a [`PlatformError`]: a generic error that may carry a code, data and
//!   its own cause, like errors produced by foreign layers
//! - any boxed `std::error::Error`; its `source()` chain is followed
//!
//! # Constructor Arguments
//!
//! [`ErrorOptions`] is the typed way to pass message, cause and data.
//! [`Arg`] supports call sites that pass a loose tail of arguments and rely
//! on type sniffing: text first, then an error, then anything as data.

use crate::chain::Link;
use crate::serialize::{self, SerializedError};
use crate::JpiError;
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

// ============================================================================
// Identity Tag
// ============================================================================

/// Whether an error belongs to this taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A [`JpiError`] with a registered code.
    Taxonomy,
    /// Any other error.
    Platform,
}

impl ErrorKind {
    /// Short label for logs.
    #[inline]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Taxonomy => "taxonomy",
            Self::Platform => "platform",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Cause
// ============================================================================

/// The underlying error that triggered another one.
#[derive(Debug)]
pub enum Cause {
    /// A taxonomy error.
    Jpi(Box<JpiError>),
    /// A generic error carrying optional code, data and cause.
    Platform(PlatformError),
    /// Any other error; its `source()` chain counts as its causes.
    Foreign(Box<dyn Error + Send + Sync>),
}

impl Cause {
    /// Wrap an arbitrary error.
    pub fn foreign(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Foreign(Box::new(err))
    }

    /// Borrowed view used by chain walking and serialization.
    pub fn link(&self) -> Link<'_> {
        match self {
            Self::Jpi(err) => Link::Taxonomy(err),
            Self::Platform(err) => Link::Platform(err),
            Self::Foreign(err) => Link::from_foreign(&**err),
        }
    }

    /// Identity tag of the wrapped error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.link().kind()
    }

    /// True if the wrapped error is a [`JpiError`].
    #[inline]
    pub fn is_jpi_error(&self) -> bool {
        self.kind() == ErrorKind::Taxonomy
    }

    /// The wrapped [`JpiError`], if any.
    pub fn as_jpi(&self) -> Option<&JpiError> {
        match self.link() {
            Link::Taxonomy(err) => Some(err),
            _ => None,
        }
    }

    /// Message of the wrapped error.
    #[inline]
    pub fn message(&self) -> Cow<'_, str> {
        self.link().message()
    }

    /// Code of the wrapped error, if it has one.
    #[inline]
    pub fn code(&self) -> Option<i32> {
        self.link().code()
    }

    /// Serialize this cause and everything below it.
    pub fn to_plain_object(&self, include_stacks: bool) -> SerializedError {
        serialize::to_plain_object(self.link(), include_stacks)
    }

    pub(crate) fn as_std(&self) -> &(dyn Error + 'static) {
        match self {
            Self::Jpi(err) => &**err,
            Self::Platform(err) => err,
            Self::Foreign(err) => &**err,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl From<JpiError> for Cause {
    fn from(err: JpiError) -> Self {
        Self::Jpi(Box::new(err))
    }
}

impl From<PlatformError> for Cause {
    fn from(err: PlatformError) -> Self {
        Self::Platform(err)
    }
}

impl From<Box<dyn Error + Send + Sync>> for Cause {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        Self::Foreign(err)
    }
}

// ============================================================================
// Platform Error
// ============================================================================

/// A generic error outside the taxonomy.
///
/// Unlike [`JpiError`], its code (if any) is not checked against a registry.
/// The stack is captured at creation.
///
/// ```rust
/// use jpi_errors::PlatformError;
/// use serde_json::json;
///
/// let err = PlatformError::new("omg bad error!")
///     .with_code(42)
///     .with_data(json!({ "foo": "bar" }))
///     .with_cause(PlatformError::new("how could this happen?"));
///
/// assert_eq!(
///     err.to_plain_object(false).into_value(),
///     json!({
///         "code": 42,
///         "message": "omg bad error!",
///         "data": { "foo": "bar", "cause": { "message": "how could this happen?" } },
///     })
/// );
/// ```
pub struct PlatformError {
    message: String,
    code: Option<i32>,
    data: Option<Value>,
    cause: Option<Box<Cause>>,
    stack: String,
}

impl PlatformError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = crate::capture_stack(format_args!("Error: {message}"));
        Self {
            message,
            code: None,
            data: None,
            cause: None,
            stack,
        }
    }

    /// Attach an unregistered numeric code.
    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach structured data. `Value::Null` clears it.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data).filter(|data| !data.is_null());
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unregistered numeric code.
    #[inline]
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// Structured data.
    #[inline]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Underlying cause.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_deref()
    }

    /// Stack captured at creation.
    #[inline]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Serialize this error and its cause chain.
    pub fn to_plain_object(&self, include_stacks: bool) -> SerializedError {
        serialize::to_plain_object(Link::Platform(self), include_stacks)
    }
}

impl fmt::Debug for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformError")
            .field("message", &self.message)
            .field("code", &self.code)
            .field("data", &self.data)
            .field("cause", &self.cause)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for PlatformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(Cause::as_std)
    }
}

// ============================================================================
// Constructor Options
// ============================================================================

/// Optional parts of a [`JpiError`].
///
/// ```rust
/// # use jpi_errors::{definitions, ErrorOptions, JpiError, NamespaceId, PlatformError, Registry};
/// # use serde_json::json;
/// let registry = Registry::new();
/// let err = JpiError::with_options(
///     &registry,
///     NamespaceId::BASE,
///     definitions::SERVER_ERROR,
///     ErrorOptions::new()
///         .with_message("omg bad error!")
///         .with_cause(PlatformError::new("There's your problem right there."))
///         .with_data(json!({ "foo": "bar" })),
/// )?;
/// assert_eq!(err.message(), "omg bad error!");
/// # Ok::<(), jpi_errors::TaxonomyViolation>(())
/// ```
#[derive(Debug, Default)]
pub struct ErrorOptions {
    /// Overrides the registered message.
    pub message: Option<String>,
    /// Underlying cause.
    pub cause: Option<Cause>,
    /// Structured data. `Value::Null` counts as absent.
    pub data: Option<Value>,
}

impl ErrorOptions {
    /// No message override, no cause, no data.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the registered message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Set structured data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sniff a loose argument tail into options.
    ///
    /// Leading [`Arg::Text`] becomes the message; the next [`Arg::Error`]
    /// becomes the cause; the next argument of any kind becomes data. The
    /// rest is ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        let mut args = args.into_iter().peekable();
        let mut options = Self::new();

        if let Some(Arg::Text(message)) = args.next_if(|arg| matches!(arg, Arg::Text(_))) {
            options.message = Some(message);
        }
        if let Some(Arg::Error(cause)) = args.next_if(|arg| matches!(arg, Arg::Error(_))) {
            options.cause = Some(cause);
        }
        options.data = args.next().map(Arg::into_data);
        options
    }
}

/// One argument of a sniffed constructor tail.
///
/// Only `Text` is ever taken as a message. To pass a string as data, wrap it
/// as `Arg::Value(Value::String(..))`.
#[derive(Debug)]
pub enum Arg {
    /// Message candidate.
    Text(String),
    /// Cause candidate.
    Error(Cause),
    /// Data.
    Value(Value),
}

impl Arg {
    fn into_data(self) -> Value {
        match self {
            Self::Text(text) => Value::String(text),
            Self::Value(value) => value,
            Self::Error(cause) => cause.to_plain_object(false).into_value(),
        }
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Cause> for Arg {
    fn from(cause: Cause) -> Self {
        Self::Error(cause)
    }
}

impl From<JpiError> for Arg {
    fn from(err: JpiError) -> Self {
        Self::Error(err.into())
    }
}

impl From<PlatformError> for Arg {
    fn from(err: PlatformError) -> Self {
        Self::Error(err.into())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{definitions, NamespaceId, Registry};
    use serde_json::json;

    fn sniff(args: Vec<Arg>) -> ErrorOptions {
        ErrorOptions::from_args(args)
    }

    #[test]
    fn sniffs_message_cause_and_data() {
        let options = sniff(vec![
            "omg error".into(),
            PlatformError::new("Cause of error").into(),
            json!({ "foo": "bar" }).into(),
        ]);

        assert_eq!(options.message.as_deref(), Some("omg error"));
        assert_eq!(options.cause.unwrap().message(), "Cause of error");
        assert_eq!(options.data, Some(json!({ "foo": "bar" })));
    }

    #[test]
    fn sniffs_without_data() {
        let options = sniff(vec!["omg error".into(), PlatformError::new("c").into()]);
        assert!(options.message.is_some());
        assert!(options.cause.is_some());
        assert!(options.data.is_none());
    }

    #[test]
    fn sniffs_without_cause() {
        let options = sniff(vec!["omg error".into(), json!({ "foo": "bar" }).into()]);
        assert!(options.message.is_some());
        assert!(options.cause.is_none());
        assert_eq!(options.data, Some(json!({ "foo": "bar" })));
    }

    #[test]
    fn sniffs_without_message() {
        let options = sniff(vec![PlatformError::new("c").into(), json!(1).into()]);
        assert!(options.message.is_none());
        assert!(options.cause.is_some());
        assert_eq!(options.data, Some(json!(1)));
    }

    #[test]
    fn sniffs_data_only() {
        let options = sniff(vec![json!({ "foo": "bar" }).into()]);
        assert!(options.message.is_none());
        assert!(options.cause.is_none());
        assert_eq!(options.data, Some(json!({ "foo": "bar" })));
    }

    #[test]
    fn second_text_becomes_data() {
        let options = sniff(vec!["message".into(), "payload".into(), "ignored".into()]);
        assert_eq!(options.message.as_deref(), Some("message"));
        assert_eq!(options.data, Some(json!("payload")));
    }

    #[test]
    fn json_string_is_never_a_message() {
        let options = sniff(vec![Arg::Value(json!("payload"))]);
        assert!(options.message.is_none());
        assert_eq!(options.data, Some(json!("payload")));
    }

    #[test]
    fn error_after_data_position_is_serialized_as_data() {
        let options = sniff(vec![
            PlatformError::new("cause").into(),
            PlatformError::new("as data").into(),
        ]);
        assert_eq!(options.cause.unwrap().message(), "cause");
        assert_eq!(options.data, Some(json!({ "message": "as data" })));
    }

    #[test]
    fn platform_error_chain_through_std_source() {
        let err = PlatformError::new("outer").with_cause(PlatformError::new("inner"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "inner");
        assert!(source.source().is_none());
    }

    #[test]
    fn platform_error_null_data_is_absent() {
        let err = PlatformError::new("x").with_data(Value::Null);
        assert!(err.data().is_none());
    }

    #[test]
    fn foreign_cause_is_platform_kind() {
        let cause = Cause::foreign(std::io::Error::other("disk on fire"));
        assert_eq!(cause.kind(), ErrorKind::Platform);
        assert!(!cause.is_jpi_error());
        assert_eq!(cause.message(), "disk on fire");
        assert_eq!(cause.code(), None);
    }

    #[test]
    fn as_jpi_only_for_taxonomy_causes() {
        let err = JpiError::new(&Registry::new(), NamespaceId::BASE, definitions::SERVER_ERROR)
            .unwrap();
        let cause = Cause::from(err);
        assert_eq!(cause.as_jpi().map(JpiError::code), Some(definitions::SERVER_ERROR));

        assert!(Cause::from(PlatformError::new("x")).as_jpi().is_none());
        assert!(Cause::foreign(std::io::Error::other("x")).as_jpi().is_none());
    }

    #[test]
    fn stack_starts_with_header() {
        let err = PlatformError::new("boom");
        assert!(err.stack().starts_with("Error: boom"));
    }
}
