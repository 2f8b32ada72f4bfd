//! Borrowed views over error-shaped values and their cause chains.
//!
//! [`Link`] lets the serializer and the logger treat a [`JpiError`], a
//! [`PlatformError`] and an arbitrary `std::error::Error` the same way:
//! each has a message, may have a code, data, a stack and a cause.
//!
//! Causes are owned boxes, so a chain built from this crate's types is
//! always finite. Foreign errors are trusted to have finite `source()`
//! chains.

use crate::models::{Cause, ErrorKind, PlatformError};
use crate::serialize::{self, SerializedError};
use crate::JpiError;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Separator used by [`CauseChain::summary`].
pub const CHAIN_SEPARATOR: &str = " → ";

/// One error-shaped value in a chain.
#[derive(Debug, Clone, Copy)]
pub enum Link<'a> {
    /// A taxonomy error.
    Taxonomy(&'a JpiError),
    /// A platform error from this crate.
    Platform(&'a PlatformError),
    /// Any other error.
    Foreign(&'a (dyn Error + 'static)),
}

impl<'a> Link<'a> {
    /// View an arbitrary error, recovering this crate's types when the
    /// concrete type is one of them.
    pub fn from_foreign(err: &'a (dyn Error + 'static)) -> Self {
        if let Some(jpi) = err.downcast_ref::<JpiError>() {
            Self::Taxonomy(jpi)
        } else if let Some(platform) = err.downcast_ref::<PlatformError>() {
            Self::Platform(platform)
        } else {
            Self::Foreign(err)
        }
    }

    /// Identity tag.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Taxonomy(_) => ErrorKind::Taxonomy,
            Self::Platform(_) | Self::Foreign(_) => ErrorKind::Platform,
        }
    }

    /// Message. Foreign errors render through `Display`.
    pub fn message(&self) -> Cow<'a, str> {
        match *self {
            Self::Taxonomy(err) => Cow::Borrowed(err.message()),
            Self::Platform(err) => Cow::Borrowed(err.message()),
            Self::Foreign(err) => Cow::Owned(err.to_string()),
        }
    }

    /// Numeric code, if the error carries one.
    pub fn code(&self) -> Option<i32> {
        match *self {
            Self::Taxonomy(err) => Some(err.code()),
            Self::Platform(err) => err.code(),
            Self::Foreign(_) => None,
        }
    }

    /// Structured data, if any.
    pub fn data(&self) -> Option<&'a Value> {
        match *self {
            Self::Taxonomy(err) => err.data(),
            Self::Platform(err) => err.data(),
            Self::Foreign(_) => None,
        }
    }

    /// Stack captured at creation. Foreign errors have none.
    pub fn stack(&self) -> Option<&'a str> {
        match *self {
            Self::Taxonomy(err) => Some(err.stack()),
            Self::Platform(err) => Some(err.stack()),
            Self::Foreign(_) => None,
        }
    }

    /// The next link down the chain.
    pub fn cause(&self) -> Option<Link<'a>> {
        match *self {
            Self::Taxonomy(err) => err.cause().map(Cause::link),
            Self::Platform(err) => err.cause().map(Cause::link),
            Self::Foreign(err) => err.source().map(Link::from_foreign),
        }
    }

    /// This link followed by every cause below it.
    #[inline]
    pub fn chain(self) -> CauseChain<'a> {
        CauseChain { next: Some(self) }
    }

    /// Serialize this link and everything below it.
    #[inline]
    pub fn to_plain_object(self, include_stacks: bool) -> SerializedError {
        serialize::to_plain_object(self, include_stacks)
    }
}

impl fmt::Display for Link<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{code}: {}", self.message()),
            None => f.write_str(&self.message()),
        }
    }
}

/// Iterator over a cause chain, nearest first.
#[derive(Debug, Clone)]
pub struct CauseChain<'a> {
    next: Option<Link<'a>>,
}

impl<'a> CauseChain<'a> {
    /// Chain starting at `first`; empty if `first` is `None`.
    #[inline]
    pub const fn new(first: Option<Link<'a>>) -> Self {
        Self { next: first }
    }

    /// Collect the remaining links. Short chains stay on the stack.
    pub fn collect_links(self) -> SmallVec<[Link<'a>; 4]> {
        self.collect()
    }

    /// One-line rendering of the remaining links, joined by
    /// [`CHAIN_SEPARATOR`].
    pub fn summary(self) -> String {
        let mut out = String::new();
        for (i, link) in self.enumerate() {
            if i > 0 {
                out.push_str(CHAIN_SEPARATOR);
            }
            out.push_str(&link.to_string());
        }
        out
    }
}

impl<'a> Iterator for CauseChain<'a> {
    type Item = Link<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.cause();
        Some(current)
    }
}

impl std::iter::FusedIterator for CauseChain<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{definitions, NamespaceId, Registry};

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("wrapped io failure")
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn walks_mixed_chain() {
        let registry = Registry::new();
        let inner = PlatformError::new("platform")
            .with_code(7)
            .with_cause(Cause::foreign(Wrapped(std::io::Error::other("disk"))));
        let err = JpiError::with_options(
            &registry,
            NamespaceId::BASE,
            definitions::INTERNAL_ERROR,
            crate::ErrorOptions::new().with_cause(inner),
        )
        .unwrap();

        let links = err.link().chain().collect_links();
        assert_eq!(links.len(), 4);
        assert_eq!(links[0].kind(), ErrorKind::Taxonomy);
        assert_eq!(links[1].code(), Some(7));
        assert_eq!(links[2].message(), "wrapped io failure");
        assert_eq!(links[3].message(), "disk");
        assert!(links[3].stack().is_none());
    }

    #[test]
    fn summary_renders_codes_when_present() {
        let err = PlatformError::new("outer")
            .with_code(42)
            .with_cause(PlatformError::new("inner"));
        assert_eq!(
            Link::Platform(&err).chain().summary(),
            "42: outer → inner"
        );
    }

    #[test]
    fn foreign_links_downcast_to_crate_types() {
        let platform = PlatformError::new("x");
        let as_dyn: &(dyn Error + 'static) = &platform;
        assert!(matches!(Link::from_foreign(as_dyn), Link::Platform(_)));

        let io = std::io::Error::other("y");
        let as_dyn: &(dyn Error + 'static) = &io;
        assert!(matches!(Link::from_foreign(as_dyn), Link::Foreign(_)));
    }

    #[test]
    fn empty_chain() {
        assert_eq!(CauseChain::new(None).count(), 0);
        assert_eq!(CauseChain::new(None).summary(), "");
    }
}
