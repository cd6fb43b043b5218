//! Serde support for [`ObjectId`].
//!
//! Human-readable formats get the hex string; binary formats get the raw
//! bytes. Deserialization accepts every text encoding that `parse` accepts.

use serde::{Deserializer, Serializer, de};
use std::fmt;

use crate::object_id::{OBJECT_ID_LEN, ObjectId, ObjectIdError};

impl serde::Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> serde::Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(ObjectIdVisitor)
        } else {
            deserializer.deserialize_bytes(ObjectIdVisitor)
        }
    }
}

struct ObjectIdVisitor;

impl<'de> de::Visitor<'de> for ObjectIdVisitor {
    type Value = ObjectId;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "a hex, base64 or base64url object id, or {OBJECT_ID_LEN} bytes"
        )
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        ObjectId::parse(value).map_err(de::Error::custom)
    }

    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
        ObjectId::from_slice(value).map_err(de::Error::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(OBJECT_ID_LEN);
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
            if bytes.len() > OBJECT_ID_LEN {
                return Err(de::Error::custom(ObjectIdError::InvalidLength(bytes.len())));
            }
        }
        ObjectId::from_slice(&bytes).map_err(de::Error::custom)
    }
}
