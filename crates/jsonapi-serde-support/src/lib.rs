//! Serde helpers shared by the JSON:API document model.
//!
//! JSON:API uses a handful of members whose shape is only known once the value
//! is seen on the wire: primary `data` and relationship `data` may be `null`, a
//! single object or an array, and a relationship object may omit `data`
//! entirely. Identifiers are strings by the letter of the format, but plenty of
//! servers emit integers. The helpers here absorb those variations so the
//! document types in `helios-jsonapi` can stay plain derived structs.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

/// A member that is either `null`, a single value, or an array of values.
///
/// The variant records the shape seen on the wire so that a singular `data`
/// member decodes to a singular result and an array (even of length one)
/// decodes to a sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum OneOrMany<T> {
    /// Explicit `null`.
    Null,
    /// A single object.
    One(T),
    /// An array of objects.
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    #[inline]
    fn default() -> Self {
        OneOrMany::Null
    }
}

impl<T> OneOrMany<T> {
    /// Returns `true` for the `null` shape.
    pub fn is_null(&self) -> bool {
        matches!(self, OneOrMany::Null)
    }

    /// Returns `true` if the value was an array on the wire.
    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    /// Borrows the contained values as a slice, whatever the shape.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Null => &[],
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    /// Maps every contained value, preserving the shape.
    pub fn map<U, F>(self, mut f: F) -> OneOrMany<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            OneOrMany::Null => OneOrMany::Null,
            OneOrMany::One(value) => OneOrMany::One(f(value)),
            OneOrMany::Many(values) => OneOrMany::Many(values.into_iter().map(f).collect()),
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

impl<T> From<Option<T>> for OneOrMany<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => OneOrMany::One(value),
            None => OneOrMany::Null,
        }
    }
}

impl<T> Serialize for OneOrMany<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            OneOrMany::Null => serializer.serialize_none(),
            OneOrMany::One(value) => value.serialize(serializer),
            OneOrMany::Many(values) => values.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OneOrManyVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for OneOrManyVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = OneOrMany<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("null, an object, or an array of objects")
            }

            #[inline]
            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(OneOrMany::Null)
            }

            #[inline]
            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(OneOrMany::Null)
            }

            #[inline]
            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            #[inline]
            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let values = Deserialize::deserialize(de::value::SeqAccessDeserializer::new(seq))?;
                Ok(OneOrMany::Many(values))
            }

            #[inline]
            fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let value = Deserialize::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(OneOrMany::One(value))
            }
        }

        deserializer.deserialize_any(OneOrManyVisitor(PhantomData))
    }
}

/// Field helper that turns "member present" into `Some`, even when its value is `null`.
///
/// Pair it with `#[serde(default)]` so a missing member stays `None`:
///
/// ```
/// use helios_jsonapi_serde_support::{OneOrMany, present};
///
/// #[derive(serde::Deserialize)]
/// struct Relationship {
///     #[serde(default, deserialize_with = "present")]
///     data: Option<OneOrMany<String>>,
/// }
///
/// let missing: Relationship = serde_json::from_str("{}").unwrap();
/// assert!(missing.data.is_none());
///
/// let null: Relationship = serde_json::from_str(r#"{"data": null}"#).unwrap();
/// assert_eq!(null.data, Some(OneOrMany::Null));
/// ```
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Field helper for `id`/`lid` members that accepts strings and integers.
///
/// Integers are normalized to their decimal string form; `null` becomes `None`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or an integer identifier")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_owned()))
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}
