//! The 15-byte object identifier and its accessors.
//!
//! Layout (big-endian):
//!
//! ```text
//! 0       4      7      10   12     15
//! +-------+------+------+----+------+
//! |  sec  | usec | mach | pid| inc  |
//! +-------+------+------+----+------+
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::{self, Encoding, Input};

/// Byte length of every object id.
pub const OBJECT_ID_LEN: usize = 15;

const LOW_24_BITS: u32 = 0x00ff_ffff;

/// Errors that can occur while decoding or encoding object ids.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("Invalid length: binary object id must be 15 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid object id format: {0}")]
    InvalidFormat(String),
    #[error("Invalid input type: {0} (expected bytes or string)")]
    InvalidInputType(String),
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Time-sortable 15-byte identifier.
///
/// Ordering compares raw bytes, which sorts ids by creation time.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Byte length of an object id.
    pub const LEN: usize = OBJECT_ID_LEN;

    /// Wrap an already validated byte array.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Pack the individual fields. Only the low 24 bits of `micros` and
    /// `counter` are kept.
    pub const fn from_fields(
        seconds: u32,
        micros: u32,
        machine: [u8; 3],
        process: [u8; 2],
        counter: u32,
    ) -> Self {
        let s = seconds.to_be_bytes();
        let us = (micros & LOW_24_BITS).to_be_bytes();
        let inc = (counter & LOW_24_BITS).to_be_bytes();
        Self([
            s[0], s[1], s[2], s[3], us[1], us[2], us[3], machine[0], machine[1], machine[2],
            process[0], process[1], inc[1], inc[2], inc[3],
        ])
    }

    /// Build from a byte slice that must be exactly 15 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ObjectIdError> {
        codec::decode(Input::Bytes(bytes)).map(Self)
    }

    /// Parse a hex, base64 or base64url string.
    pub fn parse(text: &str) -> Result<Self, ObjectIdError> {
        codec::decode(Input::Text(text)).map(Self)
    }

    /// Decode any supported input variant.
    pub fn from_input(input: Input<'_>) -> Result<Self, ObjectIdError> {
        codec::decode(input).map(Self)
    }

    /// Returns a reference to the underlying bytes.
    pub const fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    pub fn encode(&self, encoding: Encoding) -> String {
        codec::encode(&self.0, encoding)
    }

    /// Render using an encoding selector string. `None` means hex.
    pub fn format(&self, selector: Option<&str>) -> Result<String, ObjectIdError> {
        let encoding = match selector {
            Some(s) => s.parse::<Encoding>()?,
            None => Encoding::default(),
        };
        Ok(self.encode(encoding))
    }

    pub fn to_hex(&self) -> String {
        self.encode(Encoding::Hex)
    }

    pub fn to_base64(&self) -> String {
        self.encode(Encoding::Base64)
    }

    pub fn to_base64url(&self) -> String {
        self.encode(Encoding::Base64Url)
    }

    /// Hex grouped as 8-6-6-4-6, e.g. `512055ac-09b897-9d8fa1-511f-000002`.
    pub fn to_pretty(&self) -> String {
        self.encode(Encoding::Pretty)
    }

    /// Unix timestamp in seconds.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Seconds and microseconds since the epoch, like `gettimeofday`.
    ///
    /// The microsecond read spans bytes 3..7 and masks off byte 3.
    pub fn time_of_day(&self) -> (u32, u32) {
        let micros =
            u32::from_be_bytes([self.0[3], self.0[4], self.0[5], self.0[6]]) & LOW_24_BITS;
        (self.timestamp(), micros)
    }

    /// Creation time at one-second resolution.
    pub fn date(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.timestamp()), 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn machine_fingerprint(&self) -> [u8; 3] {
        [self.0[7], self.0[8], self.0[9]]
    }

    pub fn process_fingerprint(&self) -> [u8; 2] {
        [self.0[10], self.0[11]]
    }

    /// The 24-bit counter value.
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.0[12], self.0[13], self.0[14]])
    }
}

impl fmt::Display for ObjectId {
    /// Hex by default, pretty with `{:#}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.to_pretty())
        } else {
            f.write_str(&self.to_hex())
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_pretty())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

/// Decode loosely typed JSON input: strings are parsed as text, arrays as
/// raw bytes. Everything else is rejected as the wrong input type.
impl TryFrom<&Value> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| {
                        ObjectIdError::InvalidInputType("array of non-byte values".to_string())
                    })?;
                Self::from_slice(&bytes)
            }
            other => Err(ObjectIdError::InvalidInputType(json_kind(other).to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; OBJECT_ID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
