//! Error types for the JSON:API codec.
//!
//! Every failure is a deterministic function of the input and carries enough
//! context (the offending resource identity and a JSON-pointer path into the
//! document) to be reported without re-walking the document.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::graph::NodeId;

/// The error type for all encode, decode and registry operations.
#[derive(Error, Debug)]
pub enum JsonApiError {
    /// Encode-time: a relationship target carries neither `id` nor `lid`.
    #[error("relationship target at {path} of type '{type_name}' has neither id nor lid")]
    MissingIdentity { type_name: String, path: String },

    /// Decode-time: a resource or linkage object is missing `type`, both `id` and `lid`,
    /// has one of them with the wrong JSON type, or carries members a linkage may not have.
    #[error("malformed linkage at {path}: {reason}")]
    MalformedLinkage { path: String, reason: String },

    /// Decode-time: no resource kind is registered for the type and generic nodes are disabled.
    #[error("no resource kind registered for type '{type_name}' (at {path})")]
    UnknownType { type_name: String, path: String },

    /// Decode-time: two resources in the document share an identity and the
    /// duplicate policy is [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject).
    #[error("duplicate resource {identity} at {path} (first seen at {first_path})")]
    DuplicateIdentity {
        identity: String,
        path: String,
        first_path: String,
    },

    /// Encode-time: the same member name is used by an attribute and a relationship.
    #[error("member names shared by attributes and relationships of {resource}: {}", .keys.join(", "))]
    ConflictingMembers { resource: String, keys: Vec<String> },

    /// Decode-time (strict includes): an included resource no relationship refers to.
    #[error("included resource {identity} at {path} is not referenced by any relationship")]
    OrphanedInclude { identity: String, path: String },

    /// Decode-time (strict includes): a `lid` linkage without a matching resource.
    #[error("relationship at {path} references lid '{lid}' of type '{type_name}' with no matching resource")]
    UnresolvedLocalId {
        type_name: String,
        lid: String,
        path: String,
    },

    /// A node handle that does not belong to the graph being encoded.
    #[error("node {0} does not belong to this resource graph")]
    DanglingNode(NodeId),

    /// Two resource kinds were registered under the same type name.
    #[error("more than one resource kind registered for type(s): {}", .0.join(", "))]
    DuplicateKind(Vec<String>),

    /// A registry with no kinds that also refuses generic nodes can decode nothing.
    #[error("resource kinds must be registered and/or generic nodes allowed")]
    EmptyRegistry,

    /// Per-resource issues collected during a lenient decode.
    #[error("document has {} invalid resource(s): {}", .0.len(), summarize(.0))]
    InvalidDocument(Vec<JsonApiError>),

    /// Configuration values that cannot be used.
    #[error("invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    /// JSON text could not be parsed or the document does not have JSON:API shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl JsonApiError {
    /// Returns the JSON-pointer path of the offending object, if the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            JsonApiError::MissingIdentity { path, .. }
            | JsonApiError::MalformedLinkage { path, .. }
            | JsonApiError::UnknownType { path, .. }
            | JsonApiError::DuplicateIdentity { path, .. }
            | JsonApiError::OrphanedInclude { path, .. }
            | JsonApiError::UnresolvedLocalId { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        JsonApiError::MalformedLinkage {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn summarize(errors: &[JsonApiError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, JsonApiError>;
