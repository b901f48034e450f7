//! Arena that owns resource nodes and the links between them.
//!
//! Relationship values hold [`NodeId`] handles rather than nodes, so a graph
//! may share nodes between parents and may contain cycles (an article whose
//! author lists the same article). Every traversal here tracks what it has
//! already visited and therefore terminates on cyclic input.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::identity::ResourceIdentity;
use crate::node::{RelationshipValue, ResourceNode};

/// Handle to a node inside a [`ResourceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its graph.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primary data of a document, in the shape it has on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primary {
    /// `"data": null`
    Null,
    /// A single primary resource.
    One(NodeId),
    /// An array of primary resources (possibly of length one or zero).
    Many(Vec<NodeId>),
}

impl Primary {
    /// The primary nodes, in document order.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Primary::Null => &[],
            Primary::One(id) => std::slice::from_ref(id),
            Primary::Many(ids) => ids,
        }
    }

    /// The single primary node, if the data member was a single object.
    pub fn one(&self) -> Option<NodeId> {
        match self {
            Primary::One(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<NodeId> for Primary {
    fn from(id: NodeId) -> Self {
        Primary::One(id)
    }
}

impl From<Vec<NodeId>> for Primary {
    fn from(ids: Vec<NodeId>) -> Self {
        Primary::Many(ids)
    }
}

/// Owner of a set of linked [`ResourceNode`]s.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its handle.
    pub fn insert(&mut self, node: ResourceNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ResourceNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// First node whose identity equals `identity`.
    pub fn find(&self, identity: &ResourceIdentity) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.identity().as_ref() == Some(identity))
            .map(|(id, _)| id)
    }

    /// Sets a to-one relationship on `from`.
    pub fn set_to_one(&mut self, from: NodeId, name: impl Into<String>, to: Option<NodeId>) {
        self[from]
            .relationships
            .insert(name.into(), RelationshipValue::ToOne(to));
    }

    /// Appends `to` to a to-many relationship on `from`, creating it if needed.
    ///
    /// An existing to-one value under the same name is replaced.
    pub fn push_to_many(&mut self, from: NodeId, name: impl Into<String>, to: NodeId) {
        let value = self[from]
            .relationships
            .entry(name.into())
            .or_insert_with(|| RelationshipValue::ToMany(Vec::new()));
        if let RelationshipValue::ToMany(targets) = value {
            targets.push(to);
        } else {
            *value = RelationshipValue::ToMany(vec![to]);
        }
    }

    /// Target of the to-one relationship `name` on `from`.
    pub fn to_one(&self, from: NodeId, name: &str) -> Option<NodeId> {
        match self.get(from)?.relationships.get(name)? {
            RelationshipValue::ToOne(target) => *target,
            RelationshipValue::ToMany(_) => None,
        }
    }

    /// Targets of the to-many relationship `name` on `from`.
    pub fn to_many(&self, from: NodeId, name: &str) -> &[NodeId] {
        match self.get(from).and_then(|node| node.relationships.get(name)) {
            Some(RelationshipValue::ToMany(targets)) => targets,
            _ => &[],
        }
    }

    /// `root` followed by every node reachable from it, each exactly once.
    ///
    /// Nodes are yielded before their relationships are explored, in
    /// breadth-first relationship-declaration order. Handles that do not
    /// belong to the graph are skipped.
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            for value in node.relationships.values() {
                queue.extend(value.targets().iter().copied());
            }
        }
        order
    }

    /// Fills in kind defaults on `root` and every node reachable from it.
    ///
    /// Only missing attribute and relationship names are filled; values that
    /// are already present are never overwritten. Generic nodes have no
    /// defaults.
    pub fn apply_defaults(&mut self, root: NodeId) {
        for id in self.reachable(root) {
            let node = &mut self[id];
            let Some(kind) = node.kind().cloned() else {
                continue;
            };
            for (name, value) in kind.default_attributes() {
                node.attributes.entry(name).or_insert(value);
            }
            for (name, value) in kind.default_relationships() {
                node.relationships.entry(name).or_insert(value);
            }
        }
    }

    /// Structural equality between node `a` of this graph and node `b` of `other`.
    ///
    /// Compares type name, `id`, `lid`, attributes and relationships,
    /// recursing into related nodes. A pair of nodes that is already being
    /// compared is treated as equal when met again, so cyclic graphs compare
    /// in bounded time. The constructing kind is not compared.
    pub fn deep_eq(&self, a: NodeId, other: &ResourceGraph, b: NodeId) -> bool {
        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut pending = vec![(a, b)];

        while let Some((left, right)) = pending.pop() {
            if !seen.insert((left, right)) {
                continue;
            }
            let (Some(lhs), Some(rhs)) = (self.get(left), other.get(right)) else {
                return false;
            };

            let base_case = lhs.type_name() == rhs.type_name()
                && lhs.id == rhs.id
                && lhs.lid == rhs.lid
                && lhs.attributes == rhs.attributes;
            if !base_case || lhs.relationships.len() != rhs.relationships.len() {
                return false;
            }

            for (name, lhs_value) in &lhs.relationships {
                let Some(rhs_value) = rhs.relationships.get(name) else {
                    return false;
                };
                match (lhs_value, rhs_value) {
                    (RelationshipValue::ToOne(None), RelationshipValue::ToOne(None)) => {}
                    (RelationshipValue::ToOne(Some(l)), RelationshipValue::ToOne(Some(r))) => {
                        pending.push((*l, *r));
                    }
                    (RelationshipValue::ToMany(ls), RelationshipValue::ToMany(rs))
                        if ls.len() == rs.len() =>
                    {
                        pending.extend(ls.iter().copied().zip(rs.iter().copied()));
                    }
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Index<NodeId> for ResourceGraph {
    type Output = ResourceNode;

    fn index(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for ResourceGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut ResourceNode {
        &mut self.nodes[id.0]
    }
}
