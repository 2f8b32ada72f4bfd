//! Structured log entry borrowed from a [`JpiError`](crate::JpiError).
//!
//! [`ErrorLog`] holds references into the error that produced it, so it
//! cannot outlive that error. It is meant to be consumed right away: written
//! to a formatter with [`ErrorLog::write_to`] or sent to `tracing` with
//! [`ErrorLog::emit`].
//!
//! Every field is clipped to [`MAX_FIELD_OUTPUT_LEN`] bytes on output, so a
//! pathological message or data payload cannot flood a log sink. Stacks are
//! never part of the regular output; see `format_for_trusted_debug`.

use crate::chain::{CauseChain, Link};
use crate::codes::NamespaceId;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Maximum length of any single field in formatted output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Appended to clipped fields.
pub const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Log view of an error and its causes.
///
/// # Example
///
/// ```rust
/// # use jpi_errors::{definitions, JpiError, NamespaceId, Registry};
/// let registry = Registry::new();
/// let err = JpiError::new(&registry, NamespaceId::BASE, definitions::NOT_FOUND)?;
///
/// let mut line = String::new();
/// err.log_entry().write_to(&mut line).unwrap();
/// assert_eq!(line, "[-32001 NOT_FOUND] message='Not found'");
/// # Ok::<(), jpi_errors::TaxonomyViolation>(())
/// ```
#[derive(Debug)]
pub struct ErrorLog<'a> {
    /// Registered code.
    pub code: i32,
    /// Symbolic name of the code.
    pub name: &'a str,
    /// Namespace the error was built against.
    pub namespace: NamespaceId,
    /// Error message.
    pub message: &'a str,
    /// Caller data, unmerged.
    pub data: Option<&'a Value>,
    /// Causes, nearest first.
    pub causes: SmallVec<[Link<'a>; 4]>,
    /// Never written by `write_to` or `emit`.
    pub stack: &'a str,
}

impl<'a> ErrorLog<'a> {
    /// Format including the captured stack, for local debugging.
    ///
    /// Only available with the `trusted_debug` feature in debug builds.
    /// Stacks expose internal layout; never route this to external sinks.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut output);
        output.push_str(" stack='");
        output.push_str(&clip(self.stack));
        output.push('\'');
        output
    }

    /// Write a single line: `[code NAME] message='..' data='..' cause[n]='..'`.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "[{} {}] message='{}'", self.code, self.name, clip(self.message))?;

        if let Some(data) = self.data {
            write!(f, " data='{}'", clip(&data.to_string()))?;
        }

        for (depth, cause) in self.causes.iter().enumerate() {
            write!(f, " cause[{}]='{}'", depth + 1, clip(&cause.to_string()))?;
        }

        Ok(())
    }

    /// Emit one `tracing` event at `ERROR` level.
    pub fn emit(&self) {
        let chain = CauseChain::new(self.causes.first().copied()).summary();
        tracing::error!(
            code = self.code,
            name = self.name,
            namespace = %self.namespace,
            depth = self.causes.len(),
            chain = %clip(&chain),
            "{}",
            clip(self.message)
        );
    }

    /// Number of causes below the error.
    #[inline]
    pub fn cause_depth(&self) -> usize {
        self.causes.len()
    }

    /// Deepest cause, if any.
    #[inline]
    pub fn root_cause(&self) -> Option<Link<'a>> {
        self.causes.last().copied()
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Clip `s` to [`MAX_FIELD_OUTPUT_LEN`] bytes on a char boundary.
///
/// Borrows when no clipping is needed.
pub fn clip(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let mut idx = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut clipped = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    clipped.push_str(&s[..idx]);
    clipped.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{definitions, ErrorOptions, JpiError, PlatformError, Registry};
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn server_error(options: ErrorOptions) -> JpiError {
        JpiError::with_options(
            &Registry::new(),
            NamespaceId::BASE,
            definitions::SERVER_ERROR,
            options,
        )
        .unwrap()
    }

    #[test]
    fn clip_ascii() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN + 10);
        let clipped = clip(&s);
        assert!(clipped.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(clipped.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn clip_borrows_under_limit() {
        let clipped = clip("short string");
        assert!(matches!(clipped, Cow::Borrowed(_)));
        assert_eq!(clipped, "short string");
    }

    #[test]
    fn clip_exactly_at_limit() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN);
        let clipped = clip(&s);
        assert!(matches!(clipped, Cow::Borrowed(_)));
        assert!(!clipped.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn clip_respects_utf8_boundaries() {
        let cyrillic = "й".repeat(MAX_FIELD_OUTPUT_LEN);
        let clipped = clip(&cyrillic);
        assert!(clipped.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(clipped.ends_with(TRUNCATION_INDICATOR));

        let emoji = "🔥".repeat(MAX_FIELD_OUTPUT_LEN);
        assert!(clip(&emoji).ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn writes_data_and_numbered_causes() {
        let err = server_error(
            ErrorOptions::new()
                .with_message("omg bad error!")
                .with_cause(PlatformError::new("outer").with_cause(PlatformError::new("inner")))
                .with_data(json!({ "foo": "bar" })),
        );

        let log = err.log_entry();
        assert_eq!(log.cause_depth(), 2);
        assert_eq!(log.root_cause().unwrap().message(), "inner");
        assert_eq!(
            log.to_string(),
            r#"[-32000 SERVER_ERROR] message='omg bad error!' data='{"foo":"bar"}' cause[1]='outer' cause[2]='inner'"#
        );
    }

    #[test]
    fn regular_output_has_no_stack() {
        let err = server_error(ErrorOptions::new());
        assert!(!err.log_entry().to_string().contains("stack"));
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emits_tracing_event() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let err = server_error(ErrorOptions::new().with_cause(PlatformError::new("boom")));
        tracing::subscriber::with_default(subscriber, || err.log_entry().emit());

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Server error"));
        assert!(output.contains("code=-32000"));
        assert!(output.contains("depth=1"));
        assert!(output.contains("boom"));
    }

    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    #[test]
    fn trusted_debug_includes_stack() {
        let err = server_error(ErrorOptions::new());
        let output = err.log_entry().format_for_trusted_debug();
        assert!(output.contains("stack='SERVER_ERROR (-32000): Server error"));
    }
}
