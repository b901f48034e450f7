//! Resource identity and identity-keyed lookup.
//!
//! A JSON:API resource is identified by its `type` plus either a server
//! assigned `id` or a client generated `lid`. The two are independent
//! identity channels: this crate never reconciles a `lid` with an `id`.

use std::collections::HashMap;
use std::fmt;

/// Identity of a resource: `type` plus at least one of `id`/`lid`.
///
/// Two identities are equal when their type names match and, if both carry an
/// `id`, the ids match; otherwise, if both carry a `lid`, the lids match.
/// Identities that share no channel are never equal.
///
/// This equality is not transitive. `people/lid:x` equals both
/// `{id: 5, lid: x}` and `{id: 6, lid: x}`, yet those two differ because
/// their ids do. A decoder pool holding both answers a bare `lid` lookup
/// with whichever was inserted first.
#[derive(Debug, Clone)]
pub struct ResourceIdentity {
    type_name: String,
    id: Option<String>,
    lid: Option<String>,
}

impl ResourceIdentity {
    /// Creates an identity, returning `None` when neither `id` nor `lid` is given.
    pub fn new(
        type_name: impl Into<String>,
        id: Option<String>,
        lid: Option<String>,
    ) -> Option<Self> {
        if id.is_none() && lid.is_none() {
            return None;
        }
        Some(Self {
            type_name: type_name.into(),
            id,
            lid,
        })
    }

    /// Identity from a server assigned id.
    pub fn with_id(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: Some(id.into()),
            lid: None,
        }
    }

    /// Identity from a client generated local id.
    pub fn with_lid(type_name: impl Into<String>, lid: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
            lid: Some(lid.into()),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn lid(&self) -> Option<&str> {
        self.lid.as_deref()
    }

    /// Returns the lookup keys of this identity, `id` channel first.
    pub(crate) fn keys(&self) -> impl Iterator<Item = IdentityKey> + '_ {
        let id = self.id.as_ref().map(|id| IdentityKey {
            type_name: self.type_name.clone(),
            channel: Channel::Id(id.clone()),
        });
        let lid = self.lid.as_ref().map(|lid| IdentityKey {
            type_name: self.type_name.clone(),
            channel: Channel::Lid(lid.clone()),
        });
        id.into_iter().chain(lid)
    }
}

impl PartialEq for ResourceIdentity {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name != other.type_name {
            return false;
        }
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => matches!((&self.lid, &other.lid), (Some(a), Some(b)) if a == b),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.id, &self.lid) {
            (Some(id), _) => write!(f, "{}/{}", self.type_name, id),
            (None, Some(lid)) => write!(f, "{}/lid:{}", self.type_name, lid),
            (None, None) => write!(f, "{}/?", self.type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Channel {
    Id(String),
    Lid(String),
}

/// One hashable identity channel: `(type, id)` or `(type, lid)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct IdentityKey {
    type_name: String,
    channel: Channel,
}

/// Map from [`ResourceIdentity`] to values, honouring identity equality.
///
/// Each entry is reachable through every channel its identity carries, so a
/// resource stored with both `id` and `lid` is found by a linkage that uses
/// either one. Entries keep insertion order.
#[derive(Debug, Clone)]
pub(crate) struct IdentityIndex<V> {
    keys: HashMap<IdentityKey, usize>,
    entries: Vec<(ResourceIdentity, V)>,
}

impl<V> Default for IdentityIndex<V> {
    fn default() -> Self {
        Self {
            keys: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V> IdentityIndex<V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn position(&self, identity: &ResourceIdentity) -> Option<usize> {
        identity
            .keys()
            .filter_map(|key| self.keys.get(&key).copied())
            .find(|&index| self.entries[index].0 == *identity)
    }

    pub(crate) fn contains(&self, identity: &ResourceIdentity) -> bool {
        self.position(identity).is_some()
    }

    pub(crate) fn get(&self, identity: &ResourceIdentity) -> Option<&V> {
        self.position(identity).map(|index| &self.entries[index].1)
    }

    pub(crate) fn get_mut(&mut self, identity: &ResourceIdentity) -> Option<&mut V> {
        self.position(identity)
            .map(move |index| &mut self.entries[index].1)
    }

    /// Inserts a new entry, returning `false` (and leaving the index untouched)
    /// if an equal identity is already present.
    pub(crate) fn insert(&mut self, identity: ResourceIdentity, value: V) -> bool {
        if self.contains(&identity) {
            return false;
        }
        let index = self.entries.len();
        for key in identity.keys() {
            self.keys.entry(key).or_insert(index);
        }
        self.entries.push((identity, value));
        true
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ResourceIdentity, &V)> {
        self.entries.iter().map(|(identity, value)| (identity, value))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
