use jpi_errors::{
    definitions, ErrorOptions, JpiError, NamespaceId, PlatformError, Registry, Result,
};
use serde_json::json;

fn read_body(registry: &Registry, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| {
        JpiError::with_options(
            registry,
            NamespaceId::BASE,
            definitions::PARSE_ERROR,
            ErrorOptions::new()
                .with_cause(PlatformError::new(e.to_string()).with_code(400))
                .with_data(json!({ "bytes": raw.len() })),
        )
        // Seeded codes always resolve in the base namespace.
        .unwrap_or_else(|violation| panic!("{violation}"))
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("--- Basic Usage Example ---\n");

    let registry = Registry::new();

    match read_body(&registry, "{\"jsonrpc\": \"2.0\", \"method\": ") {
        Ok(_) => println!("Parsed!"),
        Err(err) => {
            // 1. What goes back over the wire.
            println!("1. [RESPONSE] error member:");
            let wire = err.to_plain_object(false).into_value();
            println!("   {wire}");

            // 2. What a trusted operator sees.
            println!("\n2. [DEBUG] error member with stacks:");
            let debug = err.to_plain_object(true).into_value();
            println!("   {debug:#}");

            // 3. One structured event for the log pipeline.
            println!("\n3. [LOG]");
            err.with_log(|log| {
                println!("   {log}");
                log.emit();
            });
        }
    }
}
