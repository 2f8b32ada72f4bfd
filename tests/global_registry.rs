//! Process-wide registry initialization.
//!
//! Runs as its own test binary so the global state starts empty.

use jpi_errors::{
    codes, definitions, init_global, register_codes, ErrorOptions, JpiError, NamespaceId,
    TaxonomyViolation,
};

#[test]
fn init_once_then_frozen() {
    let mut auth = None;
    let registry = init_global(|registry| {
        let ns = registry.derive("AuthError", NamespaceId::BASE)?;
        register_codes!(registry, ns => {
            TOKEN_EXPIRED = (4011, "Token expired"),
            permissionDenied = 4030,
        })?;
        auth = Some(ns);
        Ok(())
    })
    .unwrap();
    let auth = auth.unwrap();

    assert_eq!(registry.resolve_by_name(auth, "TOKEN_EXPIRED"), Some(4011));
    assert!(std::ptr::eq(registry, codes::global()));

    let err = JpiError::from_global(auth, 4030, ErrorOptions::new()).unwrap();
    assert_eq!(err.to_string(), "4030: Permission denied");

    let base = JpiError::from_global(NamespaceId::BASE, definitions::PARSE_ERROR, ErrorOptions::new())
        .unwrap();
    assert_eq!(base.message(), "Parse error");

    assert_eq!(
        init_global(|_| Ok(())).unwrap_err(),
        TaxonomyViolation::RegistryFrozen
    );
}
