//! Wire-level JSON:API document model.
//!
//! Only the members this codec reads or writes are modelled: top-level `data`
//! and `included`, and within a resource object `type`, `id`, `lid`,
//! `attributes` and `relationships`. Every other member (`errors`, `jsonapi`,
//! `links`, `meta`, ...) is ignored when reading and never written.
//!
//! The types are deliberately permissive: a resource without `type`, or with a
//! `type`, `id` or `lid` of the wrong JSON type, still deserializes, so the
//! decoder can report the problem against the offending resource's path
//! instead of rejecting the whole document.

use helios_jsonapi_serde_support::{OneOrMany, present, string_or_number};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identity::ResourceIdentity;
use crate::node::Attributes;

/// Top-level JSON:API document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary data: `null`, one resource object, or an array of them.
    #[serde(default)]
    pub data: OneOrMany<ResourceObject>,

    /// Full representations of related resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
}

/// A resource object, in full form (primary data and `included`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<IndexMap<String, RelationshipObject>>,

    /// Why an identity member was unreadable, if one was.
    #[serde(skip)]
    pub(crate) invalid: Option<&'static str>,
}

#[derive(Deserialize)]
struct WireResourceObject {
    #[serde(rename = "type", default)]
    type_name: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    lid: Option<Value>,
    #[serde(default)]
    attributes: Option<Attributes>,
    #[serde(default)]
    relationships: Option<IndexMap<String, RelationshipObject>>,
}

impl<'de> Deserialize<'de> for ResourceObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireResourceObject::deserialize(deserializer)?;
        let members = IdentityMembers::read(wire.type_name, wire.id, wire.lid);
        Ok(Self {
            type_name: members.type_name,
            id: members.id,
            lid: members.lid,
            attributes: wire.attributes,
            relationships: wire.relationships,
            invalid: members.invalid,
        })
    }
}

impl ResourceObject {
    /// Identity of this object, if it has a `type` and an `id` or `lid`.
    pub fn identity(&self) -> Option<ResourceIdentity> {
        ResourceIdentity::new(self.type_name.clone()?, self.id.clone(), self.lid.clone())
    }
}

/// A relationship object: `{"data": <linkage>}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipObject {
    /// `None` when the member is absent, `Some(OneOrMany::Null)` for `"data": null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<OneOrMany<Linkage>>,
}

impl RelationshipObject {
    pub fn to_one(linkage: Option<Linkage>) -> Self {
        Self {
            data: Some(linkage.into()),
        }
    }

    pub fn to_many(linkages: Vec<Linkage>) -> Self {
        Self {
            data: Some(OneOrMany::Many(linkages)),
        }
    }
}

/// Resource linkage (resource identifier object): `{"type", "id" | "lid"}`.
///
/// `attributes` and `relationships` are captured only so the decoder can
/// reject linkages that carry them; they are never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Linkage {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,

    #[serde(skip)]
    pub(crate) attributes: Option<Value>,

    #[serde(skip)]
    pub(crate) relationships: Option<Value>,

    #[serde(skip)]
    pub(crate) invalid: Option<&'static str>,
}

#[derive(Deserialize)]
struct WireLinkage {
    #[serde(rename = "type", default)]
    type_name: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    lid: Option<Value>,
    #[serde(default)]
    attributes: Option<Value>,
    #[serde(default)]
    relationships: Option<Value>,
}

impl<'de> Deserialize<'de> for Linkage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireLinkage::deserialize(deserializer)?;
        let members = IdentityMembers::read(wire.type_name, wire.id, wire.lid);
        Ok(Self {
            type_name: members.type_name,
            id: members.id,
            lid: members.lid,
            attributes: wire.attributes,
            relationships: wire.relationships,
            invalid: members.invalid,
        })
    }
}

impl Linkage {
    /// Linkage to `identity`, using its `id` when present and its `lid` otherwise.
    pub fn to(identity: &ResourceIdentity) -> Self {
        let (id, lid) = match identity.id() {
            Some(id) => (Some(id.to_string()), None),
            None => (None, identity.lid().map(str::to_string)),
        };
        Self {
            type_name: Some(identity.type_name().to_string()),
            id,
            lid,
            attributes: None,
            relationships: None,
            invalid: None,
        }
    }

    pub fn identity(&self) -> Option<ResourceIdentity> {
        ResourceIdentity::new(self.type_name.clone()?, self.id.clone(), self.lid.clone())
    }
}

/// `type`, `id` and `lid` as read off the wire. A member of the wrong JSON
/// type is dropped and the first such member is named in `invalid`.
struct IdentityMembers {
    type_name: Option<String>,
    id: Option<String>,
    lid: Option<String>,
    invalid: Option<&'static str>,
}

impl IdentityMembers {
    fn read(type_name: Option<Value>, id: Option<Value>, lid: Option<Value>) -> Self {
        let mut invalid = None;
        let type_name = match type_name {
            None | Some(Value::Null) => None,
            Some(Value::String(type_name)) => Some(type_name),
            Some(_) => {
                invalid = Some("member 'type' must be a string");
                None
            }
        };
        let id = id.and_then(|id| {
            string_or_number(&id).unwrap_or_else(|_| {
                invalid.get_or_insert("member 'id' must be a string or an integer");
                None
            })
        });
        let lid = lid.and_then(|lid| {
            string_or_number(&lid).unwrap_or_else(|_| {
                invalid.get_or_insert("member 'lid' must be a string or an integer");
                None
            })
        });
        Self {
            type_name,
            id,
            lid,
            invalid,
        }
    }
}

impl Document {
    /// Parses a document from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Converts the document into a JSON value.
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
