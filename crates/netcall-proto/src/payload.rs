//! Opaque payload codec: caller-defined structured values as text blobs.
//!
//! The protocol carries caller data it does not interpret. `encode` turns a
//! [`PayloadValue`] into a transport-safe string (postcard serialize, then
//! base64); `decode` reverses exactly that pipeline.
//!
//! The value space is a closed tagged variant set rather than an arbitrary
//! object graph: decoding untrusted input can only ever produce one of the
//! shapes below, never trigger caller-chosen behavior. Size and nesting caps
//! bound what a hostile payload can cost the decoding side; the depth cap is
//! enforced while the value is being read, so a deeply nested input fails
//! before it can exhaust the decoder's stack.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::{self, DeserializeSeed, EnumAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ProtoError, Result};

/// Maximum serialized payload size (256 KiB), before base64 expansion.
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024;

/// Maximum nesting depth of lists and maps.
pub const MAX_PAYLOAD_DEPTH: usize = 32;

/// A caller-defined structured value.
///
/// Closed set of primitive and composite shapes. `Map` is an ordered pair
/// list so structural equality (and the round-trip law) is well defined
/// independent of any hash ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<PayloadValue>),
    Map(Vec<(String, PayloadValue)>),
}

impl PayloadValue {
    /// Human-readable shape name, used when logging received payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadValue::Null => "null",
            PayloadValue::Bool(_) => "bool",
            PayloadValue::Int(_) => "int",
            PayloadValue::Float(_) => "float",
            PayloadValue::Text(_) => "text",
            PayloadValue::Bytes(_) => "bytes",
            PayloadValue::List(_) => "list",
            PayloadValue::Map(_) => "map",
        }
    }

    /// Nesting depth of the value. Scalars are depth 1.
    ///
    /// Iterative with an explicit worklist: callers may hand us values far
    /// deeper than the codec accepts, and measuring one must not recurse.
    fn depth(&self) -> usize {
        let mut max = 0;
        let mut worklist = vec![(self, 1usize)];
        while let Some((value, depth)) = worklist.pop() {
            max = max.max(depth);
            match value {
                PayloadValue::List(items) => {
                    worklist.extend(items.iter().map(|item| (item, depth + 1)));
                }
                PayloadValue::Map(entries) => {
                    worklist.extend(entries.iter().map(|(_, value)| (value, depth + 1)));
                }
                _ => {}
            }
        }
        max
    }
}

// ---------------------------------------------------------------------------
// Deserialization with in-flight depth accounting
//
// The derive would happily recurse through arbitrarily deep input before any
// post-hoc check could run, which on hostile bytes means a stack overflow
// and a process abort. Instead every nested value is read through a seed
// that carries its ancestor count and rejects the input the moment the cap
// is crossed.
// ---------------------------------------------------------------------------

const VARIANTS: &[&str] = &[
    "Null", "Bool", "Int", "Float", "Text", "Bytes", "List", "Map",
];

impl<'de> Deserialize<'de> for PayloadValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ValueSeed { depth: 0 }.deserialize(deserializer)
    }
}

/// Seed for one payload value with `depth` composite ancestors.
struct ValueSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = PayloadValue;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<PayloadValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        if self.depth >= MAX_PAYLOAD_DEPTH {
            return Err(de::Error::custom(format!(
                "payload nesting exceeds {MAX_PAYLOAD_DEPTH} levels"
            )));
        }
        deserializer.deserialize_enum("PayloadValue", VARIANTS, ValueVisitor { depth: self.depth })
    }
}

struct ValueVisitor {
    depth: usize,
}

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = PayloadValue;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a payload value variant")
    }

    fn visit_enum<A>(self, data: A) -> std::result::Result<PayloadValue, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (tag, variant) = data.variant::<VariantTag>()?;
        match tag {
            VariantTag::Null => {
                variant.unit_variant()?;
                Ok(PayloadValue::Null)
            }
            VariantTag::Bool => variant.newtype_variant().map(PayloadValue::Bool),
            VariantTag::Int => variant.newtype_variant().map(PayloadValue::Int),
            VariantTag::Float => variant.newtype_variant().map(PayloadValue::Float),
            VariantTag::Text => variant.newtype_variant().map(PayloadValue::Text),
            VariantTag::Bytes => variant.newtype_variant().map(PayloadValue::Bytes),
            VariantTag::List => variant
                .newtype_variant_seed(ListSeed {
                    depth: self.depth + 1,
                })
                .map(PayloadValue::List),
            VariantTag::Map => variant
                .newtype_variant_seed(MapSeed {
                    depth: self.depth + 1,
                })
                .map(PayloadValue::Map),
        }
    }
}

enum VariantTag {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    List,
    Map,
}

impl<'de> Deserialize<'de> for VariantTag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagVisitor;

        impl Visitor<'_> for TagVisitor {
            type Value = VariantTag;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a variant index 0 through 7")
            }

            fn visit_u32<E: de::Error>(self, value: u32) -> std::result::Result<VariantTag, E> {
                self.visit_u64(u64::from(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<VariantTag, E> {
                match value {
                    0 => Ok(VariantTag::Null),
                    1 => Ok(VariantTag::Bool),
                    2 => Ok(VariantTag::Int),
                    3 => Ok(VariantTag::Float),
                    4 => Ok(VariantTag::Text),
                    5 => Ok(VariantTag::Bytes),
                    6 => Ok(VariantTag::List),
                    7 => Ok(VariantTag::Map),
                    other => Err(E::invalid_value(
                        de::Unexpected::Unsigned(other),
                        &"a variant index 0 through 7",
                    )),
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<VariantTag, E> {
                match value {
                    "Null" => Ok(VariantTag::Null),
                    "Bool" => Ok(VariantTag::Bool),
                    "Int" => Ok(VariantTag::Int),
                    "Float" => Ok(VariantTag::Float),
                    "Text" => Ok(VariantTag::Text),
                    "Bytes" => Ok(VariantTag::Bytes),
                    "List" => Ok(VariantTag::List),
                    "Map" => Ok(VariantTag::Map),
                    other => Err(E::unknown_variant(other, VARIANTS)),
                }
            }
        }

        deserializer.deserialize_identifier(TagVisitor)
    }
}

/// Seed for the elements of a `List` at the given depth.
struct ListSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ListSeed {
    type Value = Vec<PayloadValue>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListVisitor {
            depth: usize,
        }

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = Vec<PayloadValue>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a list of payload values")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element_seed(ValueSeed { depth: self.depth })? {
                    items.push(item);
                }
                Ok(items)
            }
        }

        deserializer.deserialize_seq(ListVisitor { depth: self.depth })
    }
}

/// Seed for the entries of a `Map` at the given depth.
struct MapSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for MapSeed {
    type Value = Vec<(String, PayloadValue)>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor {
            depth: usize,
        }

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = Vec<(String, PayloadValue)>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a list of key-value entries")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) =
                    seq.next_element_seed(EntrySeed { depth: self.depth })?
                {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_seq(MapVisitor { depth: self.depth })
    }
}

/// Seed for one `(key, value)` map entry at the given depth.
struct EntrySeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for EntrySeed {
    type Value = (String, PayloadValue);

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor {
            depth: usize,
        }

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = (String, PayloadValue);

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a key-value entry")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let key: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &"a key-value entry"))?;
                let value = seq
                    .next_element_seed(ValueSeed { depth: self.depth })?
                    .ok_or_else(|| de::Error::invalid_length(1, &"a key-value entry"))?;
                Ok((key, value))
            }
        }

        deserializer.deserialize_tuple(2, EntryVisitor { depth: self.depth })
    }
}

/// Encode a payload value as a transport-safe text blob.
///
/// Rejects values over [`MAX_PAYLOAD_DEPTH`] or whose serialized form
/// exceeds [`MAX_PAYLOAD_SIZE`], so that every accepted value is also
/// decodable: `decode(encode(v)) == v`.
pub fn encode(value: &PayloadValue) -> Result<String> {
    let depth = value.depth();
    if depth > MAX_PAYLOAD_DEPTH {
        return Err(ProtoError::PayloadTooDeep(MAX_PAYLOAD_DEPTH));
    }
    let bytes = postcard::to_stdvec(value).map_err(ProtoError::PayloadEncode)?;
    if bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtoError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(BASE64.encode(bytes))
}

/// Decode a text blob back into a payload value.
///
/// Reverses exactly the [`encode`] pipeline. The size cap applies before
/// deserialization; the depth cap is enforced during it, while the value is
/// being read.
pub fn decode(encoded: &str) -> Result<PayloadValue> {
    let bytes = BASE64.decode(encoded)?;
    if bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtoError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    postcard::from_bytes(&bytes).map_err(ProtoError::PayloadDecode)
}
