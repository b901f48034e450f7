//! JSON text and value wrappers around the graph codec.
//!
//! These combine `serde_json` parsing or printing with [`GraphDecoder`] and
//! [`GraphEncoder`], for callers that never need the [`Document`] in between.

use crate::decode::{Decoded, GraphDecoder};
use crate::document::Document;
use crate::encode::GraphEncoder;
use crate::error::Result;
use crate::graph::{Primary, ResourceGraph};
use crate::registry::TypeRegistry;

/// Decodes a JSON:API document from a JSON string.
///
/// # Examples
///
/// ```
/// use helios_jsonapi::{TypeRegistry, from_jsonapi_str};
///
/// let json = r#"{"data": {"type": "people", "id": "9", "attributes": {"name": "Dan"}}}"#;
/// let decoded = from_jsonapi_str(json, &TypeRegistry::generic())?;
/// let person = decoded.one().unwrap();
/// assert_eq!(decoded.graph[person].attribute("name"), Some(&serde_json::json!("Dan")));
/// # Ok::<(), helios_jsonapi::JsonApiError>(())
/// ```
pub fn from_jsonapi_str(s: &str, registry: &TypeRegistry) -> Result<Decoded> {
    let document: Document = serde_json::from_str(s)?;
    GraphDecoder::new(registry).decode(&document)
}

/// Decodes a JSON:API document from a JSON byte slice.
pub fn from_jsonapi_slice(v: &[u8], registry: &TypeRegistry) -> Result<Decoded> {
    let document: Document = serde_json::from_slice(v)?;
    GraphDecoder::new(registry).decode(&document)
}

/// Decodes a JSON:API document from a `serde_json::Value`.
pub fn from_jsonapi_value(value: serde_json::Value, registry: &TypeRegistry) -> Result<Decoded> {
    let document = Document::from_value(value)?;
    GraphDecoder::new(registry).decode(&document)
}

/// Decodes a document into generic nodes only, whatever its types.
pub fn from_jsonapi_generic(value: serde_json::Value) -> Result<Decoded> {
    from_jsonapi_value(value, &TypeRegistry::generic())
}

/// Encodes `primary` of `graph` into a JSON string.
///
/// # Examples
///
/// ```
/// use helios_jsonapi::{ResourceGraph, ResourceNode, to_jsonapi_string};
///
/// let mut graph = ResourceGraph::new();
/// let person = graph.insert(ResourceNode::new("people").with_id("9"));
/// let json = to_jsonapi_string(&graph, person)?;
/// assert_eq!(json, r#"{"data":{"type":"people","id":"9"}}"#);
/// # Ok::<(), helios_jsonapi::JsonApiError>(())
/// ```
pub fn to_jsonapi_string(graph: &ResourceGraph, primary: impl Into<Primary>) -> Result<String> {
    let document = GraphEncoder::new(graph).encode(&primary.into())?;
    Ok(serde_json::to_string(&document)?)
}

/// Encodes `primary` of `graph` into a pretty-printed JSON string.
pub fn to_jsonapi_string_pretty(
    graph: &ResourceGraph,
    primary: impl Into<Primary>,
) -> Result<String> {
    let document = GraphEncoder::new(graph).encode(&primary.into())?;
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Encodes `primary` of `graph` into a `serde_json::Value`.
pub fn to_jsonapi_value(
    graph: &ResourceGraph,
    primary: impl Into<Primary>,
) -> Result<serde_json::Value> {
    GraphEncoder::new(graph).encode(&primary.into())?.to_value()
}
