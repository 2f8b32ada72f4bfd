//! # JPI Errors
//!
//! JSON-RPC error taxonomy with hierarchical code namespaces and cause-chain
//! serialization.
//!
//! ## Design Philosophy
//!
//! 1. **Codes are registered, not invented at the call site.** Every error is
//!    built from a code that resolves in a [`Registry`] namespace.
//! 2. **Namespaces inherit, never overwrite.** A derived namespace sees its
//!    ancestors' codes and cannot redefine them.
//! 3. **Registration mistakes fail fast.** Every rule violation comes back as
//!    a [`TaxonomyViolation`]; nothing falls back to a default.
//! 4. **Causes survive the trip to the wire.** [`JpiError::to_plain_object`]
//!    flattens the whole cause chain into one JSON-RPC error object.
//!
//! ## Quick Start
//!
//! ```rust
//! use jpi_errors::{definitions, ErrorOptions, JpiError, NamespaceId, PlatformError, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::new();
//!
//! let err = JpiError::with_options(
//!     &registry,
//!     NamespaceId::BASE,
//!     definitions::SERVER_ERROR,
//!     ErrorOptions::new()
//!         .with_cause(PlatformError::new("boom"))
//!         .with_data(json!({ "foo": "bar", "cause": "whatever" })),
//! )?;
//!
//! // The real cause wins over a `cause` key in the data.
//! assert_eq!(
//!     err.to_plain_object(false).into_value(),
//!     json!({
//!         "code": -32000,
//!         "message": "Server error",
//!         "data": { "foo": "bar", "cause": { "message": "boom" } },
//!     })
//! );
//! # Ok::<(), jpi_errors::TaxonomyViolation>(())
//! ```
//!
//! ## Extending the Taxonomy
//!
//! ```rust
//! use jpi_errors::{register_codes, JpiError, NamespaceId, Registry};
//!
//! let mut registry = Registry::new();
//! let storage = registry.derive("StorageError", NamespaceId::BASE)?;
//!
//! register_codes!(registry, storage => {
//!     DISK_FULL = (1001, "No space left on device"),
//!     diskCorrupted = 1002,
//! })?;
//!
//! let err = JpiError::new(&registry, storage, 1002)?;
//! assert_eq!(err.to_string(), "1002: Disk corrupted");
//!
//! // Codes registered on a derived namespace stay there.
//! assert!(JpiError::new(&registry, NamespaceId::BASE, 1002).is_err());
//! # Ok::<(), jpi_errors::TaxonomyViolation>(())
//! ```
//!
//! ## Features
//!
//! - `force_backtrace`: capture stacks even when `RUST_BACKTRACE` is unset
//! - `trusted_debug`: enable [`ErrorLog::format_for_trusted_debug`] (debug builds only)

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::result;

pub mod chain;
pub mod codes;
pub mod convenience;
pub mod definitions;
pub mod logging;
pub mod models;
pub mod serialize;

pub use chain::*;
pub use codes::*;
pub use convenience::*;
pub use definitions::*;
pub use logging::*;
pub use models::*;
pub use serialize::*;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, JpiError>;

// ============================================================================
// Stack Capture
// ============================================================================

/// Header line followed by the backtrace, when one is captured.
///
/// Capture follows `RUST_BACKTRACE` unless `force_backtrace` is enabled.
pub(crate) fn capture_stack(header: fmt::Arguments<'_>) -> String {
    #[cfg(feature = "force_backtrace")]
    let backtrace = Backtrace::force_capture();
    #[cfg(not(feature = "force_backtrace"))]
    let backtrace = Backtrace::capture();

    match backtrace.status() {
        BacktraceStatus::Captured => format!("{header}\n{backtrace}"),
        _ => header.to_string(),
    }
}

// ============================================================================
// Error Value
// ============================================================================

/// An error carrying a registered JSON-RPC code.
///
/// Built against a [`Registry`] namespace; the code must resolve in that
/// namespace's effective view. Immutable after construction.
///
/// - `message` defaults to the registered message for the code.
/// - `cause` is exclusively owned.
/// - `data` is any JSON value; `null` counts as absent.
/// - `stack` is captured at construction.
#[must_use = "errors should be handled or logged"]
pub struct JpiError {
    code: i32,
    name: Cow<'static, str>,
    namespace: NamespaceId,
    message: String,
    cause: Option<Box<Cause>>,
    data: Option<Value>,
    stack: String,
}

impl JpiError {
    /// Error with the registered message and no cause or data.
    ///
    /// # Errors
    ///
    /// See [`JpiError::with_options`].
    pub fn new(
        registry: &Registry,
        namespace: NamespaceId,
        code: i32,
    ) -> result::Result<Self, TaxonomyViolation> {
        Self::with_options(registry, namespace, code, ErrorOptions::new())
    }

    /// Error with an optional message override, cause and data.
    ///
    /// # Errors
    ///
    /// - [`TaxonomyViolation::UnknownNamespace`] if `namespace` is not in `registry`.
    /// - [`TaxonomyViolation::UnknownCode`] if `code` does not resolve in the
    ///   effective view of `namespace`.
    pub fn with_options(
        registry: &Registry,
        namespace: NamespaceId,
        code: i32,
        options: ErrorOptions,
    ) -> result::Result<Self, TaxonomyViolation> {
        if registry.namespace(namespace).is_none() {
            return Err(TaxonomyViolation::UnknownNamespace { id: namespace });
        }
        let info = registry
            .resolve_by_code(namespace, code)
            .ok_or(TaxonomyViolation::UnknownCode { code })?;

        let ErrorOptions {
            message,
            cause,
            data,
        } = options;
        let message = message.unwrap_or_else(|| info.message().to_owned());
        let stack = capture_stack(format_args!("{} ({code}): {message}", info.name()));

        Ok(Self {
            code,
            name: info.name.clone(),
            namespace,
            message,
            cause: cause.map(Box::new),
            data: data.filter(|data| !data.is_null()),
            stack,
        })
    }

    /// Error from a loosely typed code and argument tail.
    ///
    /// The code may come straight from decoded JSON. Arguments are sniffed
    /// with [`ErrorOptions::from_args`]. The [`jpi_error!`] macro wraps this.
    ///
    /// # Errors
    ///
    /// - [`TaxonomyViolation::InvalidCodeType`] if `code` is not an integer.
    /// - Anything [`JpiError::with_options`] reports.
    pub fn from_args<I>(
        registry: &Registry,
        namespace: NamespaceId,
        code: impl Into<Value>,
        args: I,
    ) -> result::Result<Self, TaxonomyViolation>
    where
        I: IntoIterator<Item = Arg>,
    {
        let code = codes::code_from_json(&code.into())?;
        Self::with_options(registry, namespace, code, ErrorOptions::from_args(args))
    }

    /// Error resolved against the process-wide registry ([`codes::global`]).
    ///
    /// # Errors
    ///
    /// See [`JpiError::with_options`].
    pub fn from_global(
        namespace: NamespaceId,
        code: i32,
        options: ErrorOptions,
    ) -> result::Result<Self, TaxonomyViolation> {
        Self::with_options(codes::global(), namespace, code, options)
    }

    /// Registered numeric code.
    #[inline]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Symbolic name the code was registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the error was built against.
    #[inline]
    pub const fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    /// Message: the override if one was given, else the registered one.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying cause.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_deref()
    }

    /// Structured data.
    #[inline]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Stack captured at construction.
    #[inline]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Always [`ErrorKind::Taxonomy`].
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Taxonomy
    }

    /// Always true; mirrors [`Cause::is_jpi_error`] for uniform checks.
    #[inline]
    pub const fn is_jpi_error(&self) -> bool {
        true
    }

    /// Borrowed view for chain walking.
    #[inline]
    pub fn link(&self) -> Link<'_> {
        Link::Taxonomy(self)
    }

    /// Causes below this error, nearest first.
    pub fn causes(&self) -> CauseChain<'_> {
        CauseChain::new(self.cause().map(Cause::link))
    }

    /// Deepest cause, if any.
    pub fn root_cause(&self) -> Option<Link<'_>> {
        self.causes().last()
    }

    /// Flatten this error and its causes into a JSON-RPC error object.
    ///
    /// Stacks expose internal layout. Only pass `include_stacks = true` for
    /// trusted consumers.
    pub fn to_plain_object(&self, include_stacks: bool) -> SerializedError {
        serialize::to_plain_object(self.link(), include_stacks)
    }

    /// Structured log entry borrowing from this error.
    ///
    /// ```rust
    /// # use jpi_errors::{definitions, JpiError, NamespaceId, Registry};
    /// # let registry = Registry::new();
    /// let err = JpiError::new(&registry, NamespaceId::BASE, definitions::PARSE_ERROR)?;
    /// err.log_entry().emit();
    /// # Ok::<(), jpi_errors::TaxonomyViolation>(())
    /// ```
    pub fn log_entry(&self) -> ErrorLog<'_> {
        ErrorLog {
            code: self.code,
            name: &self.name,
            namespace: self.namespace,
            message: &self.message,
            data: self.data.as_ref(),
            causes: self.causes().collect_links(),
            stack: &self.stack,
        }
    }

    /// Callback-style access to [`JpiError::log_entry`].
    #[inline]
    pub fn with_log<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ErrorLog<'_>) -> R,
    {
        let log = self.log_entry();
        f(&log)
    }
}

impl fmt::Debug for JpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JpiError")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("message", &self.message)
            .field("data", &self.data)
            .field("cause", &self.cause)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for JpiError {
    /// Format: `"{code}: {message}"`, e.g. `"-32601: Method not found"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for JpiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(Cause::as_std)
    }
}

impl From<JpiError> for SerializedError {
    fn from(err: JpiError) -> Self {
        err.to_plain_object(false)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use serde_json::json;

    fn base() -> Registry {
        Registry::new()
    }

    fn plain(err: &JpiError) -> Value {
        err.to_plain_object(false).into_value()
    }

    #[test]
    fn bare_code_uses_registered_message() {
        let err = JpiError::new(&base(), NamespaceId::BASE, definitions::METHOD_NOT_FOUND).unwrap();
        assert_eq!(err.message(), "Method not found");
        assert_eq!(err.name(), "METHOD_NOT_FOUND");
        assert_eq!(err.to_string(), "-32601: Method not found");
        assert!(err.cause().is_none());
        assert!(err.data().is_none());
        assert_eq!(plain(&err), json!({ "code": -32601, "message": "Method not found" }));
    }

    #[test]
    fn unknown_code_fails_fast() {
        let err = JpiError::new(&base(), NamespaceId::BASE, 42).unwrap_err();
        assert_eq!(err.to_string(), "Unknown error code: 42");
    }

    #[test]
    fn unknown_namespace_is_reported() {
        let registry = Registry::empty();
        assert!(matches!(
            JpiError::new(&registry, NamespaceId::BASE, definitions::PARSE_ERROR),
            Err(TaxonomyViolation::UnknownNamespace { .. })
        ));
    }

    #[test]
    fn custom_message_and_data() {
        let err = JpiError::with_options(
            &base(),
            NamespaceId::BASE,
            definitions::SERVER_ERROR,
            ErrorOptions::new()
                .with_message("omg bad error!")
                .with_data(json!({ "foo": "bar" })),
        )
        .unwrap();
        assert_eq!(
            plain(&err),
            json!({ "code": -32000, "message": "omg bad error!", "data": { "foo": "bar" } })
        );
    }

    #[test]
    fn null_data_is_absent() {
        let err = JpiError::with_options(
            &base(),
            NamespaceId::BASE,
            definitions::SERVER_ERROR,
            ErrorOptions::new().with_data(Value::Null),
        )
        .unwrap();
        assert!(err.data().is_none());
    }

    #[test]
    fn non_numeric_code_in_adapter() {
        let err = JpiError::from_args(&base(), NamespaceId::BASE, json!(null), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Error code must be a number, received null");
    }

    #[test]
    fn identity_tag() {
        let err = JpiError::new(&base(), NamespaceId::BASE, definitions::SERVER_ERROR).unwrap();
        assert!(err.is_jpi_error());
        assert_eq!(err.kind(), ErrorKind::Taxonomy);

        let as_cause = Cause::from(err);
        assert!(as_cause.is_jpi_error());
        assert!(!Cause::from(PlatformError::new("x")).is_jpi_error());
    }

    #[test]
    fn source_and_root_cause() {
        let registry = base();
        let inner = JpiError::new(&registry, NamespaceId::BASE, definitions::PARSE_ERROR).unwrap();
        let err = JpiError::with_options(
            &registry,
            NamespaceId::BASE,
            definitions::INVALID_REQUEST,
            ErrorOptions::new().with_cause(inner),
        )
        .unwrap();

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "-32700: Parse error");
        assert!(source.downcast_ref::<JpiError>().is_some());
        assert_eq!(err.root_cause().unwrap().code(), Some(definitions::PARSE_ERROR));
        assert_eq!(err.causes().count(), 1);
    }

    #[test]
    fn stack_header_names_the_code() {
        let err = JpiError::new(&base(), NamespaceId::BASE, definitions::NOT_FOUND).unwrap();
        assert!(err.stack().starts_with("NOT_FOUND (-32001): Not found"));
    }

    #[test]
    fn with_log_hands_out_entry() {
        let err = JpiError::new(&base(), NamespaceId::BASE, definitions::NOT_FOUND).unwrap();
        let code = err.with_log(|log| log.code);
        assert_eq!(code, definitions::NOT_FOUND);
    }

    #[test]
    fn converts_into_serialized_error() {
        let err = JpiError::new(&base(), NamespaceId::BASE, definitions::INVALID_PARAMS).unwrap();
        let serialized = SerializedError::from(err);
        assert_eq!(serialized.code, Some(definitions::INVALID_PARAMS));
        assert_eq!(serialized.message, "Invalid params");
    }
}
