//! OpenAPI Specification Generator Binary
//!
//! Writes the LeadCache OpenAPI document as JSON to stdout.
//!
//! Usage:
//!   cargo run -p leadcache-api --bin generate-openapi --features openapi > openapi.json

use leadcache_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
