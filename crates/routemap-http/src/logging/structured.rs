//! Structured events emitted while building the mapping table

use crate::mapping::handler::HandlerMethod;
use crate::mapping::info::RequestMappingInfo;
use serde_json::json;
use std::time::Duration;

/// Log one registered mapping
pub fn log_mapping_registered(info: &RequestMappingInfo, handler: &HandlerMethod) {
    tracing::debug!(
        target: "routemap::mapping",
        handler = %handler,
        "Mapped {} onto {}",
        info,
        handler.qualified_name()
    );
}

/// Log the summary of a freshly built mapping table
pub fn log_registry_built(handler_types: usize, mappings: usize, elapsed: Duration) {
    let summary = json!({
        "event": "mapping_table_built",
        "handler_types": handler_types,
        "mappings": mappings,
        "elapsed_us": elapsed.as_micros() as u64,
    });
    tracing::info!(target: "routemap::mapping", "{} request mappings registered {}", mappings, summary);
}
