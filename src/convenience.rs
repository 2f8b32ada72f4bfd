//! Convenience helpers: default message derivation and call-site macros.
//!
//! # Default Messages
//!
//! A code registered without a message gets one derived from its symbolic
//! name. Both naming styles in common use produce the same phrase:
//!
//! ```rust
//! # use jpi_errors::default_message;
//! assert_eq!(default_message("OMG_BAD_ERROR"), "Omg bad error");
//! assert_eq!(default_message("omgBadError"), "Omg bad error");
//! assert_eq!(default_message("XMLHttpFailure"), "Xml http failure");
//! ```
//!
//! # Macros
//!
//! - [`register_codes!`](crate::register_codes) registers a block of codes
//!   in one namespace, using the identifiers as names.
//! - [`jpi_error!`](crate::jpi_error) builds an error from a code followed by
//!   any of message, cause and data, sniffed by type (see [`crate::Arg`]).

/// Derive a human readable message from a symbolic code name.
///
/// Word boundaries are underscores, lowercase-to-uppercase transitions
/// (`badError`) and the last capital of an acronym (`XMLHttp`). The phrase is
/// lowercased and its first letter capitalized.
pub fn default_message(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let hump = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase() || n.is_ascii_digit());
            if hump || acronym_end {
                words.push('_');
            }
        }
        words.push(c);
    }

    capitalize(&words.to_lowercase().replace('_', " "))
}

fn capitalize(phrase: &str) -> String {
    let mut chars = phrase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Register a block of codes into one namespace.
///
/// Each entry is `NAME = spec` where `spec` is anything convertible into
/// [`CodeSpec`](crate::CodeSpec): a bare code or a `(code, message)` pair.
/// Expands to [`Registry::register_many`](crate::Registry::register_many)
/// and returns its result.
///
/// # Example
///
/// ```rust
/// # use jpi_errors::{register_codes, NamespaceId, Registry, TaxonomyViolation};
/// let mut registry = Registry::new();
/// let test = registry.derive("TestError", NamespaceId::BASE)?;
///
/// register_codes!(registry, test => {
///     FOO_ERROR = (42, "bad stuff happened, oh no"),
///     BAR_ERROR = 101,
///     bazError = 12345,
/// })?;
///
/// assert_eq!(registry.resolve_by_code(test, 12345).unwrap().message(), "Baz error");
/// # Ok::<(), TaxonomyViolation>(())
/// ```
#[macro_export]
macro_rules! register_codes {
    ($registry:expr, $namespace:expr => { $( $name:ident = $spec:expr ),+ $(,)? }) => {
        $registry.register_many(
            $namespace,
            [ $( (stringify!($name), $crate::CodeSpec::from($spec)) ),+ ],
        )
    };
}

/// Build a [`JpiError`](crate::JpiError) from a code and a loose argument
/// tail.
///
/// Arguments after the code are converted with [`Arg::from`](crate::Arg):
/// string slices and `String`s become text, errors become causes and
/// `serde_json::Value`s become data. The first text is the message, the
/// next error the cause, whatever follows is data.
///
/// # Example
///
/// ```rust
/// # use jpi_errors::{jpi_error, definitions, NamespaceId, PlatformError, Registry};
/// # use serde_json::json;
/// let registry = Registry::new();
/// let cause = PlatformError::new("boom");
///
/// let err = jpi_error!(&registry, NamespaceId::BASE, definitions::SERVER_ERROR,
///     cause, json!({ "foo": "bar" }))?;
///
/// assert_eq!(err.message(), "Server error");
/// assert_eq!(err.cause().unwrap().message(), "boom");
/// # Ok::<(), jpi_errors::TaxonomyViolation>(())
/// ```
#[macro_export]
macro_rules! jpi_error {
    ($registry:expr, $namespace:expr, $code:expr $(, $arg:expr)* $(,)?) => {{
        let args: ::std::vec::Vec<$crate::Arg> = ::std::vec![$($crate::Arg::from($arg)),*];
        $crate::JpiError::from_args($registry, $namespace, $code, args)
    }};
}

// ============================================================================
// Tests
// ============================================================================
