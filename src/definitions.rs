//! Pre-defined JSON-RPC error codes seeded into the base namespace.
//!
//! # Taxonomy
//!
//! JSON-RPC 2.0 reserves `-32768..=-32000` for protocol use:
//!
//! - `-32700`: invalid JSON was received
//! - `-32600..=-32603`: request, method, params and internal failures
//! - `-32099..=-32000`: implementation-defined server errors
//!
//! The base namespace (see [`crate::Registry::new`]) contains the codes in
//! [`JSON_RPC_CODES`]. Application codes belong outside the reserved range,
//! in namespaces derived from the base.
//!
//! # Governance
//!
//! The seed table is inserted without going through registration checks, so
//! the `tests` module at the bottom of this file enforces its invariants:
//! unique names, unique codes, codes inside the reserved range.

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// Generic implementation-defined server error.
pub const SERVER_ERROR: i32 = -32000;
/// The addressed resource does not exist (HTTP 404 analogue).
pub const NOT_FOUND: i32 = -32001;
/// The HTTP method is not allowed (HTTP 405 analogue).
pub const METHOD_NOT_ALLOWED: i32 = -32002;
/// The request body could not be read.
pub const FAILED_REQUEST: i32 = -32003;

/// Code range constants for the JSON-RPC reserved block.
pub mod ranges {
    /// Lowest code reserved by JSON-RPC.
    pub const RESERVED_START: i32 = -32768;
    /// Highest code reserved by JSON-RPC.
    pub const RESERVED_END: i32 = -32000;
    /// Lowest implementation-defined server error code.
    pub const SERVER_START: i32 = -32099;
    /// Highest implementation-defined server error code.
    pub const SERVER_END: i32 = -32000;
}

/// One row of the seed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeDefinition {
    /// Symbolic name.
    pub name: &'static str,
    /// Numeric code.
    pub code: i32,
    /// Explicit message; `None` derives one from `name`.
    pub message: Option<&'static str>,
}

impl CodeDefinition {
    const fn new(name: &'static str, code: i32) -> Self {
        Self {
            name,
            code,
            message: None,
        }
    }

    const fn with_message(name: &'static str, code: i32, message: &'static str) -> Self {
        Self {
            name,
            code,
            message: Some(message),
        }
    }
}

/// Codes registered into every base namespace, in registration order.
pub const JSON_RPC_CODES: &[CodeDefinition] = &[
    // Standard JSON-RPC errors.
    CodeDefinition::new("PARSE_ERROR", PARSE_ERROR),
    CodeDefinition::new("INVALID_REQUEST", INVALID_REQUEST),
    CodeDefinition::new("METHOD_NOT_FOUND", METHOD_NOT_FOUND),
    CodeDefinition::new("INVALID_PARAMS", INVALID_PARAMS),
    CodeDefinition::new("INTERNAL_ERROR", INTERNAL_ERROR),
    // Implementation-defined server errors.
    CodeDefinition::new("SERVER_ERROR", SERVER_ERROR),
    CodeDefinition::new("NOT_FOUND", NOT_FOUND),
    CodeDefinition::new("METHOD_NOT_ALLOWED", METHOD_NOT_ALLOWED),
    CodeDefinition::with_message("FAILED_REQUEST", FAILED_REQUEST, "Failed to read request body"),
];

/// True if `code` lies in the JSON-RPC reserved block.
#[inline]
pub const fn is_reserved(code: i32) -> bool {
    code >= ranges::RESERVED_START && code <= ranges::RESERVED_END
}

/// True if `code` lies in the implementation-defined server error block.
#[inline]
pub const fn is_server_error(code: i32) -> bool {
    code >= ranges::SERVER_START && code <= ranges::SERVER_END
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NamespaceId, Registry};
    use std::collections::HashSet;

    #[test]
    fn seed_names_and_codes_are_unique() {
        let names: HashSet<_> = JSON_RPC_CODES.iter().map(|d| d.name).collect();
        let codes: HashSet<_> = JSON_RPC_CODES.iter().map(|d| d.code).collect();

        assert_eq!(names.len(), JSON_RPC_CODES.len());
        assert_eq!(codes.len(), JSON_RPC_CODES.len());
    }

    #[test]
    fn seed_codes_are_reserved() {
        for def in JSON_RPC_CODES {
            assert!(is_reserved(def.code), "{} escapes the reserved block", def.name);
        }
    }

    #[test]
    fn server_block_boundaries() {
        assert!(is_server_error(SERVER_ERROR));
        assert!(is_server_error(FAILED_REQUEST));
        assert!(is_server_error(ranges::SERVER_START));
        assert!(!is_server_error(PARSE_ERROR));
        assert!(!is_reserved(-31999));
        assert!(!is_reserved(42));
    }

    #[test]
    fn seeded_default_messages() {
        let registry = Registry::new();
        let message = |code| {
            registry
                .resolve_by_code(NamespaceId::BASE, code)
                .map(|info| info.message().to_owned())
        };

        assert_eq!(message(PARSE_ERROR).as_deref(), Some("Parse error"));
        assert_eq!(message(INVALID_REQUEST).as_deref(), Some("Invalid request"));
        assert_eq!(message(METHOD_NOT_FOUND).as_deref(), Some("Method not found"));
        assert_eq!(message(INVALID_PARAMS).as_deref(), Some("Invalid params"));
        assert_eq!(message(INTERNAL_ERROR).as_deref(), Some("Internal error"));
        assert_eq!(message(SERVER_ERROR).as_deref(), Some("Server error"));
        assert_eq!(message(NOT_FOUND).as_deref(), Some("Not found"));
        assert_eq!(message(METHOD_NOT_ALLOWED).as_deref(), Some("Method not allowed"));
        assert_eq!(
            message(FAILED_REQUEST).as_deref(),
            Some("Failed to read request body")
        );
    }
}
