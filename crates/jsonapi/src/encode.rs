//! Resource graph to JSON:API document.
//!
//! Primary nodes are written in full form under `data`. Every node reachable
//! from a primary through relationships is written once, in full form, under
//! `included`, in depth-first relationship-declaration order. Identities seen
//! once (primaries included) are only ever referenced by linkage afterwards,
//! which is what keeps the walk finite on cyclic graphs and what deduplicates
//! `included` across a whole batch of primaries.

use helios_jsonapi_serde_support::OneOrMany;
use indexmap::IndexMap;

use crate::document::{Document, Linkage, RelationshipObject, ResourceObject};
use crate::error::{JsonApiError, Result};
use crate::graph::{NodeId, Primary, ResourceGraph};
use crate::identity::IdentityIndex;
use crate::node::{RelationshipValue, ResourceNode};

/// Encodes nodes of one [`ResourceGraph`] into [`Document`]s.
///
/// Encoding never mutates the graph; each call keeps its own working set.
#[derive(Debug, Clone, Copy)]
pub struct GraphEncoder<'g> {
    graph: &'g ResourceGraph,
}

impl<'g> GraphEncoder<'g> {
    pub fn new(graph: &'g ResourceGraph) -> Self {
        Self { graph }
    }

    /// Encodes a single primary resource.
    pub fn encode_one(&self, primary: NodeId) -> Result<Document> {
        self.encode(&Primary::One(primary))
    }

    /// Encodes a list of primary resources; `included` is deduplicated across the whole list.
    pub fn encode_many(&self, primaries: &[NodeId]) -> Result<Document> {
        self.encode(&Primary::Many(primaries.to_vec()))
    }

    /// Encodes `primary`, preserving its shape in the `data` member.
    pub fn encode(&self, primary: &Primary) -> Result<Document> {
        let mut seen = IdentityIndex::new();
        for &id in primary.nodes() {
            if let Some(identity) = self.node(id)?.identity() {
                seen.insert(identity, ());
            }
        }

        let data = match primary {
            Primary::Null => OneOrMany::Null,
            Primary::One(id) => OneOrMany::One(self.full_form(*id)?),
            Primary::Many(ids) => OneOrMany::Many(
                ids.iter()
                    .map(|id| self.full_form(*id))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        let mut included = Vec::new();
        for &id in primary.nodes() {
            self.collect_included(id, &mut seen, &mut included)?;
        }

        tracing::debug!(
            primaries = primary.nodes().len(),
            included = included.len(),
            "encoded JSON:API document"
        );

        Ok(Document { data, included })
    }

    fn node(&self, id: NodeId) -> Result<&'g ResourceNode> {
        self.graph.get(id).ok_or(JsonApiError::DanglingNode(id))
    }

    /// Depth-first walk below `root`, appending every not yet seen target that
    /// has more than an identifier to `included`.
    fn collect_included(
        &self,
        root: NodeId,
        seen: &mut IdentityIndex<()>,
        included: &mut Vec<ResourceObject>,
    ) -> Result<()> {
        let mut stack = Vec::new();
        push_targets(&mut stack, self.node(root)?);

        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            // Targets without identity are reported by full_form of the referrer.
            let Some(identity) = node.identity() else {
                continue;
            };
            if seen.contains(&identity) {
                tracing::trace!(resource = %identity, "already encoded; linkage only");
                continue;
            }
            if node.lid.is_none() && node.attributes.is_empty() && node.relationships.is_empty() {
                // Identifier only: the linkage already says everything.
                continue;
            }

            seen.insert(identity, ());
            included.push(self.full_form(id)?);
            push_targets(&mut stack, node);
        }
        Ok(())
    }

    /// `type`, `id`, `lid`, attributes and relationship linkage of one node.
    fn full_form(&self, id: NodeId) -> Result<ResourceObject> {
        let node = self.node(id)?;
        let label = node.label();

        let mut shared: Vec<String> = node
            .attributes
            .keys()
            .filter(|name| node.relationships.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !shared.is_empty() {
            shared.sort();
            return Err(JsonApiError::ConflictingMembers {
                resource: label,
                keys: shared,
            });
        }

        let mut relationships = IndexMap::with_capacity(node.relationships.len());
        for (name, value) in &node.relationships {
            let path = format!("{label}/relationships/{name}");
            let object = match value {
                RelationshipValue::ToOne(None) => RelationshipObject::to_one(None),
                RelationshipValue::ToOne(Some(target)) => {
                    RelationshipObject::to_one(Some(self.linkage(*target, path)?))
                }
                RelationshipValue::ToMany(targets) => RelationshipObject::to_many(
                    targets
                        .iter()
                        .enumerate()
                        .map(|(index, target)| self.linkage(*target, format!("{path}/{index}")))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            relationships.insert(name.clone(), object);
        }

        Ok(ResourceObject {
            type_name: Some(node.type_name().to_string()),
            id: node.id.clone(),
            lid: node.lid.clone(),
            attributes: (!node.attributes.is_empty()).then(|| node.attributes.clone()),
            relationships: (!relationships.is_empty()).then_some(relationships),
            invalid: None,
        })
    }

    fn linkage(&self, target: NodeId, path: String) -> Result<Linkage> {
        let node = self.node(target)?;
        let identity = node.identity().ok_or_else(|| JsonApiError::MissingIdentity {
            type_name: node.type_name().to_string(),
            path,
        })?;
        Ok(Linkage::to(&identity))
    }
}

/// Pushes the relationship targets of `node` so they pop in declaration order.
fn push_targets(stack: &mut Vec<NodeId>, node: &ResourceNode) {
    let start = stack.len();
    for value in node.relationships.values() {
        stack.extend(value.targets().iter().copied());
    }
    stack[start..].reverse();
}

/// Encodes `primary` of `graph`: one node, a list of nodes, or [`Primary::Null`].
pub fn encode(graph: &ResourceGraph, primary: impl Into<Primary>) -> Result<Document> {
    GraphEncoder::new(graph).encode(&primary.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_null_primary() {
        let graph = ResourceGraph::new();
        let doc = GraphEncoder::new(&graph).encode(&Primary::Null).unwrap();
        assert_eq!(doc.to_value().unwrap(), json!({"data": null}));
    }

    #[test]
    fn test_primary_without_identity_is_allowed() {
        let mut graph = ResourceGraph::new();
        let draft = graph.insert(ResourceNode::new("articles").with_attribute("title", "Draft"));
        let doc = encode(&graph, draft).unwrap();
        assert_eq!(
            doc.to_value().unwrap(),
            json!({"data": {"type": "articles", "attributes": {"title": "Draft"}}})
        );
    }

    #[test]
    fn test_dangling_node_is_reported() {
        let mut other = ResourceGraph::new();
        other.insert(ResourceNode::new("people").with_id("1"));
        let stray = other.insert(ResourceNode::new("people").with_id("2"));

        let graph = ResourceGraph::new();
        let err = encode(&graph, stray).unwrap_err();
        assert!(matches!(err, JsonApiError::DanglingNode(id) if id == stray));
    }

    #[test]
    fn test_push_targets_preserves_declaration_order() {
        let mut graph = ResourceGraph::new();
        let a = graph.insert(ResourceNode::new("t").with_id("a"));
        let b = graph.insert(ResourceNode::new("t").with_id("b"));
        let c = graph.insert(ResourceNode::new("t").with_id("c"));
        let root = graph.insert(ResourceNode::new("t").with_id("root"));
        graph.set_to_one(root, "first", Some(a));
        graph.push_to_many(root, "rest", b);
        graph.push_to_many(root, "rest", c);

        let mut stack = vec![root];
        push_targets(&mut stack, &graph[root]);
        assert_eq!(stack.pop(), Some(a));
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(stack.pop(), Some(c));
        assert_eq!(stack.pop(), Some(root));
    }
}
