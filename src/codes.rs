//! Error code registry - hierarchical namespaces of code/name pairs.
//!
//! Every error "class" owns a namespace. A namespace maps symbolic names
//! (`SERVER_ERROR`) to numeric codes (`-32000`) and numeric codes back to a
//! [`CodeInfo`] record holding the name and the default message.
//!
//! # Namespace Structure
//!
//! Namespaces live in an arena owned by [`Registry`] and are addressed by
//! [`NamespaceId`]. A namespace may derive from exactly one parent:
//!
//! ```text
//! JpiError (base, JSON-RPC reserved codes)
//! ├── StorageError    - adds storage codes
//! │   └── CacheError  - adds cache codes, still sees storage + base
//! └── AuthError       - adds auth codes
//! ```
//!
//! - **Reads** walk up the parent chain until the code or name is found.
//! - **Writes** always land in the namespace being registered into, never in
//!   an ancestor.
//! - A name or code already visible through the chain (the *effective view*)
//!   is rejected, never shadowed.
//!
//! Two namespaces without a common ancestor may reuse a numeric code.
//!
//! # Lifecycle
//!
//! Registration is a startup activity. Build a [`Registry`], register codes,
//! then share it immutably (`&Registry` is `Send + Sync`). For code that prefers
//! ambient access, [`init_global`] freezes a registry into process-wide state
//! and [`global`] reads it back.
//!
//! # Example
//!
//! ```rust
//! use jpi_errors::{CodeSpec, NamespaceId, Registry, TaxonomyViolation, definitions};
//!
//! let mut registry = Registry::new();
//! let storage = registry.derive("StorageError", NamespaceId::BASE)?;
//!
//! registry.register_many(storage, [
//!     ("DISK_FULL", CodeSpec::with_message(1001, "No space left on device")),
//!     ("diskCorrupted", CodeSpec::new(1002)),
//! ])?;
//!
//! // The derived namespace sees its own codes and the base codes.
//! assert_eq!(registry.resolve_by_name(storage, "DISK_FULL"), Some(1001));
//! assert_eq!(
//!     registry.resolve_by_code(storage, definitions::SERVER_ERROR).unwrap().message(),
//!     "Server error",
//! );
//!
//! // The base namespace is untouched.
//! assert!(registry.resolve_by_code(NamespaceId::BASE, 1001).is_none());
//! # Ok::<(), TaxonomyViolation>(())
//! ```

use crate::convenience::default_message;
use crate::definitions;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Name given to the base namespace created by [`Registry::new`].
pub const BASE_NAMESPACE: &str = "JpiError";

// ============================================================================
// Violations
// ============================================================================

/// A registration or construction call broke a taxonomy rule.
///
/// These are programmer errors. They are returned to the caller immediately;
/// the registry never substitutes a fallback value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyViolation {
    /// A provided code is not an integer.
    #[error("Error code must be a number, received {received}")]
    InvalidCodeType {
        /// Rendering of the rejected value.
        received: String,
    },

    /// A code is numeric but not visible in the namespace's effective view.
    #[error("Unknown error code: {code}")]
    UnknownCode {
        /// The unresolved code.
        code: i32,
    },

    /// A registration name is empty or purely numeric.
    #[error("Error name must be a non-numeric string, received {received}")]
    InvalidNameType {
        /// Rendering of the rejected name.
        received: String,
    },

    /// A registration message is not a string.
    #[error("Error message must be a string, received {received}")]
    InvalidMessageType {
        /// Rendering of the rejected value.
        received: String,
    },

    /// The name already resolves in the effective view.
    #[error("Error name '{name}' is already in use.")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// The code already resolves in the effective view.
    #[error("Error code {code} is already in use.")]
    DuplicateCode {
        /// The colliding code.
        code: i32,
    },

    /// The namespace id does not belong to this registry.
    #[error("Unknown error namespace: {id}")]
    UnknownNamespace {
        /// The dangling id.
        id: NamespaceId,
    },

    /// The process-wide registry was already initialized.
    #[error("The global error registry is already initialized")]
    RegistryFrozen,
}

// ============================================================================
// Registry Records
// ============================================================================

/// Registry value for one numeric code: its symbolic name and message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeInfo {
    pub(crate) name: Cow<'static, str>,
    pub(crate) message: Cow<'static, str>,
}

impl CodeInfo {
    /// Symbolic name the code was registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message used when an error is constructed without one.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Registration input: a code plus an optional explicit message.
///
/// Bare codes convert via `From<i32>`, code/message pairs via
/// `From<(i32, &'static str)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpec {
    code: i32,
    message: Option<Cow<'static, str>>,
}

impl CodeSpec {
    /// A code whose message is derived from its name.
    #[inline]
    pub const fn new(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// A code with an explicit message.
    #[inline]
    pub fn with_message(code: i32, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Numeric code.
    #[inline]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Explicit message, if one was given.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Parse a JSON registration entry.
    ///
    /// Accepts a bare number or an object `{ "code": .., "message": .. }`.
    /// Other object fields are ignored.
    ///
    /// # Errors
    ///
    /// - [`TaxonomyViolation::InvalidCodeType`] if the code is missing or not
    ///   an integer that fits in `i32`.
    /// - [`TaxonomyViolation::InvalidMessageType`] if `message` is present but
    ///   not a string.
    pub fn from_json(value: &Value) -> Result<Self, TaxonomyViolation> {
        match value {
            Value::Number(_) => Ok(Self::new(code_from_json(value)?)),
            Value::Object(fields) => {
                let code = match fields.get("code") {
                    Some(code) => code_from_json(code)?,
                    None => {
                        return Err(TaxonomyViolation::InvalidCodeType {
                            received: "nothing".to_owned(),
                        });
                    }
                };
                let message = match fields.get("message") {
                    None => None,
                    Some(Value::String(message)) => Some(Cow::Owned(message.clone())),
                    Some(other) => {
                        return Err(TaxonomyViolation::InvalidMessageType {
                            received: describe(other),
                        });
                    }
                };
                Ok(Self { code, message })
            }
            other => Err(TaxonomyViolation::InvalidCodeType {
                received: describe(other),
            }),
        }
    }
}

impl From<i32> for CodeSpec {
    fn from(code: i32) -> Self {
        Self::new(code)
    }
}

impl From<(i32, &'static str)> for CodeSpec {
    fn from((code, message): (i32, &'static str)) -> Self {
        Self::with_message(code, message)
    }
}

impl From<(i32, String)> for CodeSpec {
    fn from((code, message): (i32, String)) -> Self {
        Self::with_message(code, message)
    }
}

/// Read a JSON value as an error code.
pub(crate) fn code_from_json(value: &Value) -> Result<i32, TaxonomyViolation> {
    value
        .as_i64()
        .and_then(|code| i32::try_from(code).ok())
        .ok_or_else(|| TaxonomyViolation::InvalidCodeType {
            received: describe(value),
        })
}

/// Strings render bare, everything else as compact JSON.
fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A name must contain at least one character that is not a digit or a dot.
fn validate_name(name: &str) -> Result<(), TaxonomyViolation> {
    if name.chars().any(|c| !(c.is_ascii_digit() || c == '.')) {
        Ok(())
    } else {
        Err(TaxonomyViolation::InvalidNameType {
            received: name.to_owned(),
        })
    }
}

// ============================================================================
// Namespaces
// ============================================================================

/// Handle to a namespace inside a [`Registry`].
///
/// Ids are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(usize);

impl NamespaceId {
    /// The base namespace created by [`Registry::new`].
    pub const BASE: Self = Self(0);

    /// Arena index of this namespace.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registry scope: local entries plus an optional parent.
#[derive(Debug, Clone)]
pub struct Namespace {
    name: Cow<'static, str>,
    parent: Option<NamespaceId>,
    codes: BTreeMap<i32, CodeInfo>,
    names: BTreeMap<Cow<'static, str>, i32>,
}

impl Namespace {
    fn new(name: Cow<'static, str>, parent: Option<NamespaceId>) -> Self {
        Self {
            name,
            parent,
            codes: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }

    /// Human readable namespace name (usually the error class name).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace this one derives from.
    #[inline]
    pub const fn parent(&self) -> Option<NamespaceId> {
        self.parent
    }

    /// Look up a code among this namespace's own entries only.
    #[inline]
    pub fn local_code(&self, code: i32) -> Option<&CodeInfo> {
        self.codes.get(&code)
    }

    /// Look up a name among this namespace's own entries only.
    #[inline]
    pub fn local_name(&self, name: &str) -> Option<i32> {
        self.names.get(name).copied()
    }

    /// Own entries, ordered by code.
    pub fn entries(&self) -> impl Iterator<Item = (i32, &CodeInfo)> {
        self.codes.iter().map(|(code, info)| (*code, info))
    }

    /// Number of own entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if nothing was registered locally.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Arena of namespaces with inherited code lookup.
///
/// Mutation takes `&mut self`; concurrent registration needs external
/// synchronization. Lookups take `&self` and may run from any thread.
#[derive(Debug, Clone)]
pub struct Registry {
    namespaces: Vec<Namespace>,
    message_fn: fn(&str) -> String,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry with a single base namespace ([`NamespaceId::BASE`]) seeded
    /// with the JSON-RPC reserved codes from [`definitions::JSON_RPC_CODES`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let base = registry.create_root(BASE_NAMESPACE);
        for def in definitions::JSON_RPC_CODES {
            let message = match def.message {
                Some(message) => Cow::Borrowed(message),
                None => Cow::Owned((registry.message_fn)(def.name)),
            };
            registry.insert_local(base, Cow::Borrowed(def.name), def.code, message);
        }
        registry
    }

    /// Registry without any namespace.
    pub fn empty() -> Self {
        Self {
            namespaces: Vec::new(),
            message_fn: default_message,
        }
    }

    /// Replace the function deriving a message from a name when a
    /// registration omits one. Applies to later registrations only.
    #[must_use]
    pub fn with_message_fn(mut self, message_fn: fn(&str) -> String) -> Self {
        self.message_fn = message_fn;
        self
    }

    /// Add a namespace with no parent.
    pub fn create_root(&mut self, name: impl Into<Cow<'static, str>>) -> NamespaceId {
        let id = NamespaceId(self.namespaces.len());
        self.namespaces.push(Namespace::new(name.into(), None));
        id
    }

    /// Add a namespace that inherits every entry visible from `parent`.
    ///
    /// # Errors
    ///
    /// [`TaxonomyViolation::UnknownNamespace`] if `parent` is not in this registry.
    pub fn derive(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        parent: NamespaceId,
    ) -> Result<NamespaceId, TaxonomyViolation> {
        if self.namespace(parent).is_none() {
            return Err(TaxonomyViolation::UnknownNamespace { id: parent });
        }
        let id = NamespaceId(self.namespaces.len());
        self.namespaces.push(Namespace::new(name.into(), Some(parent)));
        Ok(id)
    }

    /// Namespace record for `id`.
    #[inline]
    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(id.0)
    }

    /// Number of namespaces in the arena.
    #[inline]
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// `id` followed by its ancestors, nearest first.
    ///
    /// Empty if `id` is unknown.
    pub fn lineage(&self, id: NamespaceId) -> SmallVec<[NamespaceId; 4]> {
        let mut lineage = SmallVec::new();
        let mut current = self.namespace(id).map(|_| id);
        while let Some(next) = current {
            lineage.push(next);
            current = self.namespace(next).and_then(Namespace::parent);
        }
        lineage
    }

    /// Namespaces visible from `id`, nearest first.
    fn ancestry(&self, id: NamespaceId) -> impl Iterator<Item = &Namespace> {
        std::iter::successors(self.namespace(id), |ns| {
            ns.parent.and_then(|parent| self.namespace(parent))
        })
    }

    /// Resolve a code through the effective view of `namespace`.
    pub fn resolve_by_code(&self, namespace: NamespaceId, code: i32) -> Option<&CodeInfo> {
        self.ancestry(namespace).find_map(|ns| ns.codes.get(&code))
    }

    /// Resolve a name through the effective view of `namespace`.
    pub fn resolve_by_name(&self, namespace: NamespaceId, name: &str) -> Option<i32> {
        self.ancestry(namespace).find_map(|ns| ns.local_name(name))
    }

    /// Register one code under `name` in `namespace`.
    ///
    /// The message defaults to the registry's message function applied to
    /// `name`. Returns the registered code.
    ///
    /// # Errors
    ///
    /// Checked in this order; on failure nothing is written:
    ///
    /// - [`TaxonomyViolation::InvalidNameType`]: `name` is empty or numeric.
    /// - [`TaxonomyViolation::UnknownNamespace`]: `namespace` is not in this registry.
    /// - [`TaxonomyViolation::DuplicateName`]: `name` resolves in the effective view.
    /// - [`TaxonomyViolation::DuplicateCode`]: the code resolves in the effective view.
    pub fn register_one(
        &mut self,
        namespace: NamespaceId,
        name: impl Into<Cow<'static, str>>,
        spec: impl Into<CodeSpec>,
    ) -> Result<i32, TaxonomyViolation> {
        let name = name.into();
        let CodeSpec { code, message } = spec.into();

        validate_name(&name)?;
        if self.namespace(namespace).is_none() {
            return Err(TaxonomyViolation::UnknownNamespace { id: namespace });
        }
        let message = message.unwrap_or_else(|| Cow::Owned((self.message_fn)(&name)));

        if self.resolve_by_name(namespace, &name).is_some() {
            return Err(TaxonomyViolation::DuplicateName {
                name: name.into_owned(),
            });
        }
        if self.resolve_by_code(namespace, code).is_some() {
            return Err(TaxonomyViolation::DuplicateCode { code });
        }

        self.insert_local(namespace, name, code, message);
        Ok(code)
    }

    /// Register entries in iteration order.
    ///
    /// Stops at the first failure. Entries registered before it stay
    /// registered.
    ///
    /// # Errors
    ///
    /// The first violation reported by [`Registry::register_one`].
    pub fn register_many<I, N, S>(
        &mut self,
        namespace: NamespaceId,
        entries: I,
    ) -> Result<(), TaxonomyViolation>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<Cow<'static, str>>,
        S: Into<CodeSpec>,
    {
        for (name, spec) in entries {
            self.register_one(namespace, name, spec)?;
        }
        Ok(())
    }

    /// Register a JSON table such as
    /// `{ "FOO_ERROR": { "code": 42, "message": "..." }, "BAR_ERROR": 101 }`.
    ///
    /// Same fail-fast semantics as [`Registry::register_many`].
    ///
    /// # Errors
    ///
    /// Type violations from [`CodeSpec::from_json`], then anything
    /// [`Registry::register_one`] reports.
    pub fn register_json(
        &mut self,
        namespace: NamespaceId,
        entries: &Map<String, Value>,
    ) -> Result<(), TaxonomyViolation> {
        for (name, value) in entries {
            validate_name(name)?;
            let spec = CodeSpec::from_json(value)?;
            self.register_one(namespace, name.clone(), spec)?;
        }
        Ok(())
    }

    /// Caller has checked `namespace` exists and the entry is free.
    fn insert_local(
        &mut self,
        namespace: NamespaceId,
        name: Cow<'static, str>,
        code: i32,
        message: Cow<'static, str>,
    ) {
        let Some(ns) = self.namespaces.get_mut(namespace.0) else {
            return;
        };
        tracing::debug!(namespace = %ns.name, name = %name, code, "registered error code");
        ns.names.insert(name.clone(), code);
        ns.codes.insert(code, CodeInfo { name, message });
    }
}

// ============================================================================
// Process-wide Registry
// ============================================================================

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry.
///
/// Initialized on first use with [`Registry::new`] unless [`init_global`]
/// ran earlier.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

/// Build the process-wide registry once, at startup.
///
/// `configure` receives a freshly seeded [`Registry`] to derive namespaces
/// and register codes into. The result is frozen afterwards.
///
/// # Errors
///
/// - [`TaxonomyViolation::RegistryFrozen`] if the global registry was already
///   initialized, including implicitly through [`global`].
/// - Any violation returned by `configure`.
pub fn init_global<F>(configure: F) -> Result<&'static Registry, TaxonomyViolation>
where
    F: FnOnce(&mut Registry) -> Result<(), TaxonomyViolation>,
{
    if GLOBAL.get().is_some() {
        return Err(TaxonomyViolation::RegistryFrozen);
    }
    let mut registry = Registry::new();
    configure(&mut registry)?;
    GLOBAL
        .set(registry)
        .map_err(|_| TaxonomyViolation::RegistryFrozen)?;
    Ok(global())
}

// ============================================================================
// Tests
// ============================================================================
