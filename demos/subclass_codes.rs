use jpi_errors::{
    definitions, jpi_error, register_codes, JpiError, NamespaceId, Registry, TaxonomyViolation,
};
use serde_json::json;

/// Storage layer codes live under their own namespace, derived from the base.
fn build_registry() -> Result<(Registry, NamespaceId, NamespaceId), TaxonomyViolation> {
    let mut registry = Registry::new();

    let storage = registry.derive("StorageError", NamespaceId::BASE)?;
    register_codes!(registry, storage => {
        DISK_FULL = (1001, "No space left on device"),
        diskCorrupted = 1002,
    })?;

    let cache = registry.derive("CacheError", storage)?;
    let table = json!({
        "CACHE_MISS": 2001,
        "CACHE_STALE": { "code": 2002, "message": "Cached entry is stale" },
    });
    if let Some(entries) = table.as_object() {
        registry.register_json(cache, entries)?;
    }

    Ok((registry, storage, cache))
}

fn main() -> Result<(), TaxonomyViolation> {
    println!("--- Subclass Codes Example ---\n");

    let (registry, storage, cache) = build_registry()?;

    for ns in [NamespaceId::BASE, storage, cache] {
        let lineage: Vec<_> = registry
            .lineage(ns)
            .iter()
            .filter_map(|id| registry.namespace(*id))
            .map(|n| n.name().to_owned())
            .collect();
        println!("{ns}: {}", lineage.join(" -> "));
    }

    // Cache sees its own codes, the storage codes and the base codes.
    let miss = jpi_error!(&registry, cache, 2001)?;
    let full = jpi_error!(&registry, cache, 1001, "volume /var is full", miss)?;
    let err = jpi_error!(
        &registry,
        cache,
        definitions::INTERNAL_ERROR,
        full,
        json!({ "key": "user:42" })
    )?;

    println!("\nChain: {}", err.link().chain().summary());
    println!("Wire:  {}", err.to_plain_object(false).into_value());

    // Shadowing an inherited code is rejected.
    match registry.clone().register_one(cache, "ALSO_FULL", 1001) {
        Err(violation) => println!("\nRejected: {violation}"),
        Ok(_) => println!("\nUnexpectedly accepted"),
    }

    // The base namespace never sees derived codes.
    match JpiError::new(&registry, NamespaceId::BASE, 2001) {
        Err(violation) => println!("Rejected: {violation}"),
        Ok(_) => println!("Unexpectedly resolved"),
    }

    Ok(())
}
