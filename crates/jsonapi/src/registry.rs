//! Resource kinds and the type registry.
//!
//! The registry maps a JSON:API `type` string to the [`ResourceKind`] that
//! constructs nodes of that type. Kinds give domain types their defaults and
//! a construction hook; the decoder itself only ever sees [`ResourceNode`]s.
//!
//! A registry is configured once through [`TypeRegistryBuilder`] and frozen by
//! [`TypeRegistryBuilder::build`]. The frozen registry is immutable, so it can
//! be shared read-only between any number of concurrent decodes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{JsonApiError, Result};
use crate::node::{Attributes, Relationships, ResourceNode};

/// Domain behaviour attached to a JSON:API type.
///
/// Implementors name their type and may supply defaults and an
/// initialization hook. Nodes built from a kind go through exactly the same
/// population path as generic nodes: the kind sees the node right after its
/// identity is set, before any attribute or relationship is filled in.
///
/// ```
/// use helios_jsonapi::{ResourceKind, ResourceNode, TypeRegistry};
///
/// struct Article;
///
/// impl ResourceKind for Article {
///     fn type_name(&self) -> &str {
///         "articles"
///     }
/// }
///
/// let registry = TypeRegistry::builder().register(Article).build()?;
/// let node = registry.construct("articles", Some("1".into()), None, false)?;
/// assert!(node.is_kind::<Article>());
/// # Ok::<(), helios_jsonapi::JsonApiError>(())
/// ```
pub trait ResourceKind: Any + Send + Sync {
    /// The JSON:API `type` this kind constructs.
    fn type_name(&self) -> &str;

    /// Attributes filled in by [`ResourceGraph::apply_defaults`](crate::ResourceGraph::apply_defaults)
    /// when missing.
    fn default_attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Relationships filled in by [`ResourceGraph::apply_defaults`](crate::ResourceGraph::apply_defaults)
    /// when missing. Targets cannot be known ahead of time, so these are
    /// usually empty to-one or to-many values.
    fn default_relationships(&self) -> Relationships {
        Relationships::new()
    }

    /// Called on every freshly constructed node of this kind.
    fn initialize(&self, _node: &mut ResourceNode) {}
}

/// Frozen mapping from type name to [`ResourceKind`].
#[derive(Clone)]
pub struct TypeRegistry {
    kinds: HashMap<String, Arc<dyn ResourceKind>>,
    allow_generic: bool,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.kinds.keys().collect();
        types.sort();
        f.debug_struct("TypeRegistry")
            .field("types", &types)
            .field("allow_generic", &self.allow_generic)
            .finish()
    }
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// A registry without kinds that builds generic nodes for every type.
    pub fn generic() -> Self {
        Self {
            kinds: HashMap::new(),
            allow_generic: true,
        }
    }

    /// Whether unregistered types fall back to generic nodes.
    pub fn allows_generic(&self) -> bool {
        self.allow_generic
    }

    pub fn kind(&self, type_name: &str) -> Option<&Arc<dyn ResourceKind>> {
        self.kinds.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.kinds.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Constructs an empty node of `type_name` with the given identity.
    ///
    /// Registered types are built by their kind. Unregistered types produce a
    /// generic node when `generic_allowed` is set and fail with
    /// [`JsonApiError::UnknownType`] otherwise.
    pub fn construct(
        &self,
        type_name: &str,
        id: Option<String>,
        lid: Option<String>,
        generic_allowed: bool,
    ) -> Result<ResourceNode> {
        let mut node = ResourceNode::new(type_name);
        node.id = id;
        node.lid = lid;

        match self.kinds.get(type_name) {
            Some(kind) => {
                let mut node = node.with_kind(Arc::clone(kind));
                kind.initialize(&mut node);
                Ok(node)
            }
            None if generic_allowed => {
                tracing::trace!(type_name, "constructing generic node for unregistered type");
                Ok(node)
            }
            None => Err(JsonApiError::UnknownType {
                type_name: type_name.to_string(),
                path: String::new(),
            }),
        }
    }

    /// [`construct`](Self::construct) using the registry's own generic policy.
    pub fn construct_default(
        &self,
        type_name: &str,
        id: Option<String>,
        lid: Option<String>,
    ) -> Result<ResourceNode> {
        self.construct(type_name, id, lid, self.allow_generic)
    }
}

/// Setup-time builder for [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    kinds: Vec<Arc<dyn ResourceKind>>,
    allow_generic: bool,
}

impl TypeRegistryBuilder {
    /// Registers a kind under its [`ResourceKind::type_name`].
    pub fn register<K: ResourceKind>(mut self, kind: K) -> Self {
        self.kinds.push(Arc::new(kind));
        self
    }

    /// Registers an already shared kind.
    pub fn register_arc(mut self, kind: Arc<dyn ResourceKind>) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Sets whether unregistered types fall back to generic nodes.
    pub fn allow_generic(mut self, allow: bool) -> Self {
        self.allow_generic = allow;
        self
    }

    /// Freezes the registry.
    ///
    /// Fails when two kinds claim the same type name, or when no kind is
    /// registered and generic nodes are not allowed.
    pub fn build(self) -> Result<TypeRegistry> {
        if self.kinds.is_empty() && !self.allow_generic {
            return Err(JsonApiError::EmptyRegistry);
        }

        let mut kinds: HashMap<String, Arc<dyn ResourceKind>> = HashMap::new();
        let mut duplicates = Vec::new();
        for kind in self.kinds {
            let type_name = kind.type_name().to_string();
            if kinds.contains_key(&type_name) {
                if !duplicates.contains(&type_name) {
                    duplicates.push(type_name);
                }
                continue;
            }
            kinds.insert(type_name, kind);
        }

        if !duplicates.is_empty() {
            duplicates.sort();
            return Err(JsonApiError::DuplicateKind(duplicates));
        }

        tracing::debug!(
            kinds = kinds.len(),
            allow_generic = self.allow_generic,
            "type registry frozen"
        );

        Ok(TypeRegistry {
            kinds,
            allow_generic: self.allow_generic,
        })
    }
}
