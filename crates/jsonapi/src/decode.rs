//! JSON:API document to resource graph.
//!
//! Decoding runs in two phases. First every resource object in `data` and
//! `included` is gathered into a flat pool keyed by identity. Then primary
//! resources are resolved against the pool: a node is constructed through the
//! [`TypeRegistry`], cached by identity, and only then are its relationships
//! populated. Because the cache entry exists before any relationship is
//! followed, a linkage that leads back to a node under construction finds the
//! cached node, and cycles close on the same [`NodeId`].
//!
//! Population uses an explicit work queue rather than recursion, so the depth
//! of a relationship chain does not grow the call stack.

use std::collections::VecDeque;

use helios_jsonapi_serde_support::OneOrMany;
use indexmap::IndexMap;

use crate::document::{Document, Linkage, RelationshipObject, ResourceObject};
use crate::error::{JsonApiError, Result};
use crate::graph::{NodeId, Primary, ResourceGraph};
use crate::identity::{IdentityIndex, ResourceIdentity};
use crate::node::{Attributes, RelationshipValue, ResourceNode};
use crate::registry::TypeRegistry;

/// What to do when `data` and `included` hold the same identity twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// Merge member by member; values from the later object win.
    #[default]
    LastWriteWins,
    /// Report [`JsonApiError::DuplicateIdentity`] and keep the first object.
    Reject,
}

/// Per-decoder options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Build generic nodes for types the registry does not know.
    pub allow_generic: bool,
    pub duplicate_policy: DuplicatePolicy,
    /// Turn the first per-resource issue into an error.
    pub fail_fast: bool,
    /// Report orphaned `included` resources and unresolved `lid` linkage.
    pub strict_includes: bool,
}

/// Result of a decode: the graph, its primary nodes, and any per-resource issues.
#[derive(Debug)]
pub struct Decoded {
    pub graph: ResourceGraph,
    pub primary: Primary,
    /// Problems found in individual resources that did not stop the decode.
    pub issues: Vec<JsonApiError>,
}

impl Decoded {
    /// Returns `self` if no issues were recorded, otherwise
    /// [`JsonApiError::InvalidDocument`] with every issue.
    pub fn into_clean(self) -> Result<Self> {
        if self.issues.is_empty() {
            Ok(self)
        } else {
            Err(JsonApiError::InvalidDocument(self.issues))
        }
    }

    /// The primary node, if `data` was a single resource object.
    pub fn one(&self) -> Option<NodeId> {
        self.primary.one()
    }

    /// The primary nodes, in document order.
    pub fn nodes(&self) -> &[NodeId] {
        self.primary.nodes()
    }
}

/// Decodes [`Document`]s into [`ResourceGraph`]s using a shared registry.
#[derive(Debug, Clone)]
pub struct GraphDecoder<'r> {
    registry: &'r TypeRegistry,
    options: DecodeOptions,
}

impl<'r> GraphDecoder<'r> {
    /// A decoder with default options and the registry's generic policy.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            options: DecodeOptions {
                allow_generic: registry.allows_generic(),
                ..DecodeOptions::default()
            },
        }
    }

    pub fn with_options(registry: &'r TypeRegistry, options: DecodeOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes `document` into a fresh graph.
    ///
    /// Fatal errors (an unknown type without generic fallback, or any issue
    /// when `fail_fast` is set) return `Err` and drop the partially built
    /// graph. Other issues are collected in [`Decoded::issues`].
    pub fn decode(&self, document: &Document) -> Result<Decoded> {
        let mut run = DecodeRun {
            registry: self.registry,
            options: &self.options,
            graph: ResourceGraph::new(),
            instances: IdentityIndex::new(),
            referenced: IdentityIndex::new(),
            queue: VecDeque::new(),
            issues: Vec::new(),
        };

        let (pool, primaries) = run.build_pool(document)?;

        let mut roots = Vec::with_capacity(primaries.len());
        for primary in &primaries {
            let root = match primary {
                PrimaryRef::Pooled(identity) => {
                    let path = pool
                        .get(identity)
                        .map(|entry| entry.path.clone())
                        .unwrap_or_default();
                    run.resolve(&pool, identity, &path)?
                }
                PrimaryRef::Anonymous(entry) => run.construct_anonymous(&pool, entry)?,
            };
            run.drain(&pool)?;
            roots.push(root);
        }

        if self.options.strict_includes {
            run.check_orphans(&pool)?;
        }

        let primary = match &document.data {
            OneOrMany::Null => Primary::Null,
            OneOrMany::One(_) => roots.first().copied().map_or(Primary::Null, Primary::One),
            OneOrMany::Many(_) => Primary::Many(roots),
        };

        tracing::debug!(
            resources = run.graph.len(),
            pooled = pool.len(),
            issues = run.issues.len(),
            "decoded JSON:API document"
        );

        Ok(Decoded {
            graph: run.graph,
            primary,
            issues: run.issues,
        })
    }
}

/// Decodes `document` with `registry` and its generic policy.
pub fn decode(document: &Document, registry: &TypeRegistry) -> Result<Decoded> {
    GraphDecoder::new(registry).decode(document)
}

/// One resource object of the document, merged across duplicates.
#[derive(Debug)]
struct PoolEntry<'d> {
    type_name: String,
    id: Option<String>,
    lid: Option<String>,
    path: String,
    included: bool,
    attributes: Attributes,
    relationships: IndexMap<&'d str, (&'d RelationshipObject, String)>,
}

impl<'d> PoolEntry<'d> {
    fn new(object: &'d ResourceObject, type_name: String, path: String, included: bool) -> Self {
        let mut entry = Self {
            type_name,
            id: object.id.clone(),
            lid: object.lid.clone(),
            path,
            included,
            attributes: Attributes::new(),
            relationships: IndexMap::new(),
        };
        entry.merge(object, None);
        entry
    }

    fn identity(&self) -> Option<ResourceIdentity> {
        ResourceIdentity::new(self.type_name.clone(), self.id.clone(), self.lid.clone())
    }

    /// Copies the members of `object` over this entry, later values winning
    /// per name. `path` locates `object` when it is not the first occurrence.
    fn merge(&mut self, object: &'d ResourceObject, path: Option<&str>) {
        let base = path.unwrap_or(&self.path).to_string();
        if let Some(attributes) = &object.attributes {
            for (name, value) in attributes {
                self.attributes.insert(name.clone(), value.clone());
            }
        }
        if let Some(relationships) = &object.relationships {
            for (name, relationship) in relationships {
                let path = format!("{base}/relationships/{}/data", escape_pointer(name));
                self.relationships.insert(name.as_str(), (relationship, path));
            }
        }
    }
}

type Pool<'d> = IdentityIndex<PoolEntry<'d>>;

enum PrimaryRef<'d> {
    Pooled(ResourceIdentity),
    /// A primary resource without `id` or `lid`, as in a create request.
    Anonymous(PoolEntry<'d>),
}

/// Working state of one decode call.
struct DecodeRun<'a> {
    registry: &'a TypeRegistry,
    options: &'a DecodeOptions,
    graph: ResourceGraph,
    instances: IdentityIndex<NodeId>,
    referenced: IdentityIndex<()>,
    queue: VecDeque<(NodeId, ResourceIdentity)>,
    issues: Vec<JsonApiError>,
}

impl DecodeRun<'_> {
    /// Records a non-fatal issue, or fails right away in fail-fast mode.
    fn report(&mut self, issue: JsonApiError) -> Result<()> {
        if self.options.fail_fast {
            return Err(issue);
        }
        tracing::debug!(error = %issue, "invalid resource skipped");
        self.issues.push(issue);
        Ok(())
    }

    /// Phase one: flat pool of `data` followed by `included`, keyed by identity.
    fn build_pool<'d>(
        &mut self,
        document: &'d Document,
    ) -> Result<(Pool<'d>, Vec<PrimaryRef<'d>>)> {
        let mut pool: Pool<'d> = IdentityIndex::new();
        let mut primaries = Vec::new();

        let data: Vec<(&'d ResourceObject, String)> = match &document.data {
            OneOrMany::Null => Vec::new(),
            OneOrMany::One(object) => vec![(object, "/data".to_string())],
            OneOrMany::Many(objects) => objects
                .iter()
                .enumerate()
                .map(|(i, object)| (object, format!("/data/{i}")))
                .collect(),
        };
        let primary_count = data.len();
        let included = document
            .included
            .iter()
            .enumerate()
            .map(|(i, object)| (object, format!("/included/{i}")));

        for (position, (object, path)) in data.into_iter().chain(included).enumerate() {
            let is_primary = position < primary_count;

            if let Some(reason) = object.invalid {
                self.report(JsonApiError::malformed(path, reason))?;
                continue;
            }
            let Some(type_name) = object.type_name.clone() else {
                self.report(JsonApiError::malformed(path, "resource object has no 'type'"))?;
                continue;
            };

            let Some(identity) = object.identity() else {
                if is_primary {
                    primaries.push(PrimaryRef::Anonymous(PoolEntry::new(
                        object, type_name, path, false,
                    )));
                } else {
                    self.report(JsonApiError::malformed(
                        path,
                        format!("included '{type_name}' resource has neither 'id' nor 'lid'"),
                    ))?;
                }
                continue;
            };

            let Some(existing) = pool.get_mut(&identity) else {
                warn_on_shared_lid(&pool, &identity, &path);
                pool.insert(
                    identity.clone(),
                    PoolEntry::new(object, type_name, path, !is_primary),
                );
                if is_primary {
                    primaries.push(PrimaryRef::Pooled(identity));
                }
                continue;
            };

            match self.options.duplicate_policy {
                DuplicatePolicy::LastWriteWins => {
                    tracing::warn!(
                        resource = %identity,
                        first = %existing.path,
                        duplicate = %path,
                        "duplicate resource in document, later members win"
                    );
                    existing.merge(object, Some(&path));
                    if is_primary {
                        existing.included = false;
                        primaries.push(PrimaryRef::Pooled(identity));
                    }
                }
                DuplicatePolicy::Reject => {
                    let first_path = existing.path.clone();
                    self.report(JsonApiError::DuplicateIdentity {
                        identity: identity.to_string(),
                        path,
                        first_path,
                    })?;
                    // The position still refers to the first object.
                    if is_primary {
                        primaries.push(PrimaryRef::Pooled(identity));
                    }
                }
            }
        }

        Ok((pool, primaries))
    }

    /// Returns the node for `identity`, constructing and caching it first if needed.
    ///
    /// A freshly constructed node is queued; [`drain`](Self::drain) fills in
    /// its members.
    fn resolve(
        &mut self,
        pool: &Pool<'_>,
        identity: &ResourceIdentity,
        path: &str,
    ) -> Result<NodeId> {
        let entry = pool.get(identity);
        let canonical = entry
            .and_then(PoolEntry::identity)
            .unwrap_or_else(|| identity.clone());
        if let Some(&node_id) = self.instances.get(&canonical) {
            return Ok(node_id);
        }

        let (type_name, id, lid) = match entry {
            Some(entry) => (entry.type_name.as_str(), entry.id.clone(), entry.lid.clone()),
            None => (
                canonical.type_name(),
                canonical.id().map(str::to_string),
                canonical.lid().map(str::to_string),
            ),
        };
        let node = self.construct(type_name, id, lid, path)?;

        let node_id = self.graph.insert(node);
        // Cached before population; this is what closes cycles.
        self.instances.insert(canonical.clone(), node_id);
        self.queue.push_back((node_id, canonical));
        Ok(node_id)
    }

    fn construct(
        &self,
        type_name: &str,
        id: Option<String>,
        lid: Option<String>,
        path: &str,
    ) -> Result<ResourceNode> {
        self.registry
            .construct(type_name, id, lid, self.options.allow_generic)
            .map_err(|err| match err {
                JsonApiError::UnknownType { type_name, .. } => JsonApiError::UnknownType {
                    type_name,
                    path: path.to_string(),
                },
                other => other,
            })
    }

    fn construct_anonymous(&mut self, pool: &Pool<'_>, entry: &PoolEntry<'_>) -> Result<NodeId> {
        let node = self.construct(&entry.type_name, None, None, &entry.path)?;
        let node_id = self.graph.insert(node);
        self.populate(pool, node_id, entry)?;
        Ok(node_id)
    }

    /// Phase two work loop: populates queued nodes until none remain.
    fn drain(&mut self, pool: &Pool<'_>) -> Result<()> {
        while let Some((node_id, identity)) = self.queue.pop_front() {
            match pool.get(&identity) {
                Some(entry) => self.populate(pool, node_id, entry)?,
                None => tracing::trace!(resource = %identity, "not in document, identifier only"),
            }
        }
        Ok(())
    }

    fn populate(&mut self, pool: &Pool<'_>, node_id: NodeId, entry: &PoolEntry<'_>) -> Result<()> {
        // Values set by the kind's initialize hook give way to document members.
        for (name, value) in &entry.attributes {
            self.graph[node_id]
                .attributes
                .insert(name.clone(), value.clone());
        }

        for (name, (relationship, path)) in &entry.relationships {
            let Some(data) = &relationship.data else {
                tracing::trace!(relationship = %name, path = %path, "relationship has no data, skipped");
                continue;
            };

            let value = match data {
                OneOrMany::Null => RelationshipValue::ToOne(None),
                OneOrMany::One(linkage) => match self.link(pool, linkage, path)? {
                    Some(target) => RelationshipValue::ToOne(Some(target)),
                    None => continue,
                },
                OneOrMany::Many(linkages) => {
                    let mut targets = Vec::with_capacity(linkages.len());
                    for (index, linkage) in linkages.iter().enumerate() {
                        let path = format!("{path}/{index}");
                        if let Some(target) = self.link(pool, linkage, &path)? {
                            targets.push(target);
                        }
                    }
                    RelationshipValue::ToMany(targets)
                }
            };
            self.graph[node_id]
                .relationships
                .insert((*name).to_string(), value);
        }
        Ok(())
    }

    /// Validates one linkage and resolves its target. `None` means the
    /// linkage was reported as malformed.
    fn link(&mut self, pool: &Pool<'_>, linkage: &Linkage, path: &str) -> Result<Option<NodeId>> {
        if linkage.attributes.is_some() || linkage.relationships.is_some() {
            self.report(JsonApiError::malformed(
                path,
                "resource linkage must not carry 'attributes' or 'relationships'",
            ))?;
            return Ok(None);
        }
        if let Some(reason) = linkage.invalid {
            self.report(JsonApiError::malformed(path, reason))?;
            return Ok(None);
        }
        let Some(type_name) = &linkage.type_name else {
            self.report(JsonApiError::malformed(path, "resource linkage has no 'type'"))?;
            return Ok(None);
        };
        let Some(identity) = linkage.identity() else {
            self.report(JsonApiError::malformed(
                path,
                format!("'{type_name}' linkage has neither 'id' nor 'lid'"),
            ))?;
            return Ok(None);
        };

        match pool.get(&identity).and_then(PoolEntry::identity) {
            Some(canonical) => {
                self.referenced.insert(canonical, ());
            }
            None if self.options.strict_includes && identity.id().is_none() => {
                self.report(JsonApiError::UnresolvedLocalId {
                    type_name: type_name.clone(),
                    lid: identity.lid().unwrap_or_default().to_string(),
                    path: path.to_string(),
                })?;
            }
            None => {}
        }

        self.resolve(pool, &identity, path).map(Some)
    }

    /// Every `included` resource must be the target of some linkage.
    fn check_orphans(&mut self, pool: &Pool<'_>) -> Result<()> {
        let orphans: Vec<_> = pool
            .iter()
            .filter(|(identity, entry)| entry.included && !self.referenced.contains(identity))
            .map(|(identity, entry)| JsonApiError::OrphanedInclude {
                identity: identity.to_string(),
                path: entry.path.clone(),
            })
            .collect();
        for orphan in orphans {
            self.report(orphan)?;
        }
        Ok(())
    }
}

/// Warns when `identity` shares its `lid` with a pooled resource that has a
/// different `id`. Both stay in the pool; a bare `lid` linkage finds the first.
fn warn_on_shared_lid(pool: &Pool<'_>, identity: &ResourceIdentity, path: &str) {
    let (Some(id), Some(lid)) = (identity.id(), identity.lid()) else {
        return;
    };
    let by_lid = ResourceIdentity::with_lid(identity.type_name(), lid);
    if let Some(other) = pool.get(&by_lid).filter(|other| other.id.as_deref() != Some(id)) {
        tracing::warn!(
            lid = %lid,
            id = %id,
            other_id = other.id.as_deref().unwrap_or_default(),
            first = %other.path,
            duplicate = %path,
            "resources with different ids share a lid, lid linkage resolves to the first"
        );
    }
}

/// Escapes a member name for use as a JSON pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
