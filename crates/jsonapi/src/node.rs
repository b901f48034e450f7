//! A single typed resource and its relationship values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::graph::NodeId;
use crate::identity::ResourceIdentity;
use crate::registry::ResourceKind;

/// Attribute members, in declaration order. Values are plain JSON, never resources.
pub type Attributes = serde_json::Map<String, Value>;

/// Relationship members, in declaration order.
pub type Relationships = IndexMap<String, RelationshipValue>;

/// Value of a relationship member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipValue {
    /// A to-one relationship; `None` is an empty to-one (`"data": null`).
    ToOne(Option<NodeId>),
    /// A to-many relationship, in order.
    ToMany(Vec<NodeId>),
}

impl RelationshipValue {
    /// Returns the related nodes, in order.
    pub fn targets(&self) -> &[NodeId] {
        match self {
            RelationshipValue::ToOne(Some(target)) => std::slice::from_ref(target),
            RelationshipValue::ToOne(None) => &[],
            RelationshipValue::ToMany(targets) => targets,
        }
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationshipValue::ToMany(_))
    }
}

impl From<NodeId> for RelationshipValue {
    fn from(target: NodeId) -> Self {
        RelationshipValue::ToOne(Some(target))
    }
}

impl From<Option<NodeId>> for RelationshipValue {
    fn from(target: Option<NodeId>) -> Self {
        RelationshipValue::ToOne(target)
    }
}

impl From<Vec<NodeId>> for RelationshipValue {
    fn from(targets: Vec<NodeId>) -> Self {
        RelationshipValue::ToMany(targets)
    }
}

/// A typed resource: identity, attributes and relationships.
///
/// Nodes live in a [`ResourceGraph`](crate::ResourceGraph) and refer to each
/// other by [`NodeId`], so the same node may be the target of any number of
/// relationships, including its own.
///
/// `attributes` and `relationships` are independent maps. Nothing stops a name
/// from appearing in both, but such a node cannot be encoded.
#[derive(Clone)]
pub struct ResourceNode {
    type_name: String,
    /// Server assigned identifier.
    pub id: Option<String>,
    /// Client generated local identifier.
    pub lid: Option<String>,
    pub attributes: Attributes,
    pub relationships: Relationships,
    kind: Option<Arc<dyn ResourceKind>>,
}

impl ResourceNode {
    /// Creates an empty generic node of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
            lid: None,
            attributes: Attributes::new(),
            relationships: Relationships::new(),
            kind: None,
        }
    }

    pub(crate) fn with_kind(mut self, kind: Arc<dyn ResourceKind>) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_lid(mut self, lid: impl Into<String>) -> Self {
        self.lid = Some(lid.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_relationship(
        mut self,
        name: impl Into<String>,
        value: impl Into<RelationshipValue>,
    ) -> Self {
        self.relationships.insert(name.into(), value.into());
        self
    }

    /// The JSON:API `type`; it drives resource kind dispatch and cannot change.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the identity, or `None` if the node has neither `id` nor `lid`.
    pub fn identity(&self) -> Option<ResourceIdentity> {
        ResourceIdentity::new(self.type_name.clone(), self.id.clone(), self.lid.clone())
    }

    /// The resource kind that constructed this node, `None` for generic nodes.
    pub fn kind(&self) -> Option<&Arc<dyn ResourceKind>> {
        self.kind.as_ref()
    }

    /// Returns `true` if this node was constructed by a kind of type `K`.
    pub fn is_kind<K: ResourceKind>(&self) -> bool {
        self.kind_as::<K>().is_some()
    }

    /// Downcasts the constructing kind to `K`.
    pub fn kind_as<K: ResourceKind>(&self) -> Option<&K> {
        let kind: &dyn Any = self.kind.as_deref()?;
        kind.downcast_ref::<K>()
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipValue> {
        self.relationships.get(name)
    }

    /// Short label used in logs and error messages.
    pub(crate) fn label(&self) -> String {
        match self.identity() {
            Some(identity) => identity.to_string(),
            None => format!("{}/(no id)", self.type_name),
        }
    }
}

impl fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceNode")
            .field("type_name", &self.type_name)
            .field("id", &self.id)
            .field("lid", &self.lid)
            .field("attributes", &self.attributes)
            .field("relationships", &self.relationships)
            .field("generic", &self.kind.is_none())
            .finish()
    }
}
