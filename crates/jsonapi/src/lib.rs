//! # Helios JSON:API
//!
//! Bidirectional codec between in-memory graphs of linked resources and
//! [JSON:API v1.1](https://jsonapi.org/format/1.1/) documents.
//!
//! ## Overview
//!
//! - **Model**: [`ResourceNode`]s live in a [`ResourceGraph`] arena and link to
//!   each other through [`NodeId`] handles, so graphs may share nodes and
//!   contain cycles.
//! - **Encoding**: [`GraphEncoder`] writes primary resources in full under
//!   `data` and every reachable related resource exactly once under
//!   `included`, also across a batch of primaries.
//! - **Decoding**: [`GraphDecoder`] pools `data` and `included`, caches each
//!   node before populating it, and therefore reproduces shared and cyclic
//!   structure with one node per identity.
//! - **Types**: a frozen [`TypeRegistry`] maps JSON:API `type` names to
//!   [`ResourceKind`]s, with an optional generic fallback.
//!
//! ## Example
//!
//! ```
//! use helios_jsonapi::{GraphEncoder, ResourceGraph, ResourceNode, TypeRegistry, decode};
//!
//! let mut graph = ResourceGraph::new();
//! let author = graph.insert(ResourceNode::new("people").with_id("9").with_attribute("name", "Dan"));
//! let article = graph.insert(ResourceNode::new("articles").with_id("1"));
//! graph.set_to_one(article, "author", Some(author));
//!
//! let document = GraphEncoder::new(&graph).encode_one(article)?;
//! assert_eq!(document.included.len(), 1);
//!
//! let decoded = decode(&document, &TypeRegistry::generic())?.into_clean()?;
//! assert!(graph.deep_eq(article, &decoded.graph, decoded.one().unwrap()));
//! # Ok::<(), helios_jsonapi::JsonApiError>(())
//! ```

pub mod config;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod graph;
pub mod identity;
pub mod json;
pub mod node;
pub mod registry;

pub use config::CodecConfig;
pub use decode::{DecodeOptions, Decoded, DuplicatePolicy, GraphDecoder, decode};
pub use document::{Document, Linkage, RelationshipObject, ResourceObject};
pub use encode::{GraphEncoder, encode};
pub use error::{JsonApiError, Result};
pub use graph::{NodeId, Primary, ResourceGraph};
pub use identity::ResourceIdentity;
pub use node::{Attributes, RelationshipValue, Relationships, ResourceNode};
pub use registry::{ResourceKind, TypeRegistry, TypeRegistryBuilder};

pub use json::{
    from_jsonapi_generic, from_jsonapi_slice, from_jsonapi_str, from_jsonapi_value,
    to_jsonapi_string, to_jsonapi_string_pretty, to_jsonapi_value,
};

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG`, when set,
/// takes precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_jsonapi={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
