//! Text codecs for object ids.
//!
//! Text input is matched against base64url, then base64, then hex. The first
//! pattern that matches decides the decoder; a 20-character string made only
//! of hex digits is therefore read as base64url.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::object_id::{OBJECT_ID_LEN, ObjectIdError};

/// Text encodings an object id can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Hex,
    Base64,
    Base64Url,
    Pretty,
}

impl Encoding {
    pub const ALL: [Encoding; 4] = [Self::Hex, Self::Base64, Self::Base64Url, Self::Pretty];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64 => "base64",
            Self::Base64Url => "base64url",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ObjectIdError::UnsupportedEncoding(s.to_string()))
    }
}

/// Raw input accepted by [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a [u8; OBJECT_ID_LEN]> for Input<'a> {
    fn from(bytes: &'a [u8; OBJECT_ID_LEN]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

static BASE64URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]{20}$").unwrap());
static BASE64_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z/+]{20}$").unwrap());
static HEX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{30}$").unwrap());

const TO_URL_SAFE: [(char, char); 2] = [('/', '_'), ('+', '-')];
const FROM_URL_SAFE: [(char, char); 2] = [('_', '/'), ('-', '+')];

/// Offsets in the hex string where the pretty form inserts a hyphen.
const PRETTY_BREAKS: [usize; 4] = [8, 14, 20, 24];

fn matchers() -> [(&'static Regex, Encoding); 3] {
    [
        (&*BASE64URL_PATTERN, Encoding::Base64Url),
        (&*BASE64_PATTERN, Encoding::Base64),
        (&*HEX_PATTERN, Encoding::Hex),
    ]
}

/// Detect which text encoding `text` is in. Pretty strings are not
/// recognized.
pub fn detect(text: &str) -> Option<Encoding> {
    matchers()
        .into_iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, encoding)| encoding)
}

fn translate(src: &str, table: &[(char, char)]) -> String {
    src.chars()
        .map(|c| {
            table
                .iter()
                .find_map(|&(from, to)| (from == c).then_some(to))
                .unwrap_or(c)
        })
        .collect()
}

fn to_array(bytes: &[u8]) -> Result<[u8; OBJECT_ID_LEN], ObjectIdError> {
    <[u8; OBJECT_ID_LEN]>::try_from(bytes).map_err(|_| ObjectIdError::InvalidLength(bytes.len()))
}

fn decode_text(text: &str) -> Result<[u8; OBJECT_ID_LEN], ObjectIdError> {
    let invalid = || ObjectIdError::InvalidFormat(text.to_string());
    let encoding = detect(text).ok_or_else(invalid)?;

    let bytes = match encoding {
        Encoding::Base64Url => STANDARD
            .decode(translate(text, &FROM_URL_SAFE))
            .map_err(|_| invalid())?,
        Encoding::Base64 => STANDARD.decode(text).map_err(|_| invalid())?,
        Encoding::Hex => hex::decode(text).map_err(|_| invalid())?,
        Encoding::Pretty => return Err(invalid()),
    };
    debug_assert_eq!(bytes.len(), OBJECT_ID_LEN);
    to_array(&bytes)
}

/// Decode binary or text input into the 15 raw bytes.
pub fn decode(input: Input<'_>) -> Result<[u8; OBJECT_ID_LEN], ObjectIdError> {
    match input {
        Input::Bytes(bytes) => to_array(bytes),
        Input::Text(text) => decode_text(text),
    }
}

fn prettify(hex: &str) -> String {
    let mut out = String::with_capacity(hex.len() + PRETTY_BREAKS.len());
    let mut start = 0;
    for end in PRETTY_BREAKS {
        out.push_str(&hex[start..end]);
        out.push('-');
        start = end;
    }
    out.push_str(&hex[start..]);
    out
}

/// Render raw bytes in the given encoding.
pub fn encode(bytes: &[u8; OBJECT_ID_LEN], encoding: Encoding) -> String {
    match encoding {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base64 => STANDARD.encode(bytes),
        Encoding::Base64Url => translate(&STANDARD.encode(bytes), &TO_URL_SAFE),
        Encoding::Pretty => prettify(&hex::encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BYTES: [u8; 15] = [
        0x51, 0x20, 0x55, 0xac, 0x09, 0xb8, 0x97, 0x9d, 0x8f, 0xa1, 0x51, 0x1f, 0x00, 0x00, 0x02,
    ];

    #[test]
    fn test_detect_order() {
        assert_eq!(detect("USBVrAm4l52PoVEfAAA_"), Some(Encoding::Base64Url));
        assert_eq!(detect("USBVrAm4l52PoVEfAAA+"), Some(Encoding::Base64));
        assert_eq!(detect("512055ac09b8979d8fa1511f000002"), Some(Encoding::Hex));
        // only letters and digits: both base64 alphabets match, base64url wins
        assert_eq!(detect("USBVrAm4l52PoVEfAAAC"), Some(Encoding::Base64Url));
        assert_eq!(detect("0123456789abcdef0123"), Some(Encoding::Base64Url));
    }

    #[test]
    fn test_detect_rejects() {
        assert_eq!(detect(""), None);
        assert_eq!(detect("512055ac-09b897-9d8fa1-511f-000002"), None);
        assert_eq!(detect("USBVrAm4l52PoVEfAAAC="), None);
        assert_eq!(detect("USBVrAm4l52PoVEfAA=="), None);
        assert_eq!(detect("512055ac09b8979d8fa1511f00000g"), None);
        assert_eq!(detect("512055ac09b8979d8fa1511f0000"), None);
    }

    #[test]
    fn test_encode_all() {
        assert_eq!(encode(&BYTES, Encoding::Hex), "512055ac09b8979d8fa1511f000002");
        assert_eq!(encode(&BYTES, Encoding::Base64), "USBVrAm4l52PoVEfAAAC");
        assert_eq!(encode(&BYTES, Encoding::Base64Url), "USBVrAm4l52PoVEfAAAC");
        assert_eq!(
            encode(&BYTES, Encoding::Pretty),
            "512055ac-09b897-9d8fa1-511f-000002"
        );
    }

    #[test]
    fn test_fixed_output_lengths() {
        for bytes in [[0u8; 15], [0xff; 15], BYTES] {
            assert_eq!(encode(&bytes, Encoding::Hex).len(), 30);
            assert_eq!(encode(&bytes, Encoding::Base64).len(), 20);
            assert_eq!(encode(&bytes, Encoding::Base64Url).len(), 20);
            assert_eq!(encode(&bytes, Encoding::Pretty).len(), 34);
        }
    }

    #[test]
    fn test_base64url_is_substituted_base64() {
        let bytes = [0xfb; 15];
        let standard = encode(&bytes, Encoding::Base64);
        let url = encode(&bytes, Encoding::Base64Url);
        assert!(standard.contains('+') || standard.contains('/'));
        assert_eq!(url, standard.replace('/', "_").replace('+', "-"));
        assert_eq!(decode(Input::Text(&url)), Ok(bytes));
        assert_eq!(decode(Input::Text(&standard)), Ok(bytes));
    }

    #[test]
    fn test_translate_is_reversible() {
        let src = "ab/+cd_-";
        let there = translate(src, &TO_URL_SAFE);
        assert_eq!(there, "ab_-cd_-");
        assert_eq!(translate("ab_-", &FROM_URL_SAFE), "ab/+");
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(decode(Input::from(&BYTES)), Ok(BYTES));
        assert_eq!(
            decode(Input::from(&BYTES[..14])),
            Err(ObjectIdError::InvalidLength(14))
        );
        assert_eq!(decode(Input::Bytes(&[])), Err(ObjectIdError::InvalidLength(0)));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode(Input::from("512055ac09b8979d8fa1511f000002")), Ok(BYTES));
        assert_eq!(decode(Input::from("USBVrAm4l52PoVEfAAAC")), Ok(BYTES));
        assert_eq!(
            decode(Input::from("not an id")),
            Err(ObjectIdError::InvalidFormat("not an id".to_string()))
        );
    }

    #[test]
    fn test_encoding_parse() {
        for encoding in Encoding::ALL {
            assert_eq!(encoding.as_str().parse::<Encoding>(), Ok(encoding));
            assert_eq!(encoding.to_string(), encoding.as_str());
        }
        assert_eq!(Encoding::default(), Encoding::Hex);
        assert_eq!(
            "hexo".parse::<Encoding>(),
            Err(ObjectIdError::UnsupportedEncoding("hexo".to_string()))
        );
        assert!("HEX".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_encoding_serde() {
        assert_eq!(
            serde_json::to_string(&Encoding::Base64Url).unwrap(),
            "\"base64url\""
        );
        let e: Encoding = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(e, Encoding::Pretty);
    }
}
