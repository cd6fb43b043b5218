//! objectid: compact, time-sortable 15-byte object identifiers.
//!
//! Ids sort by creation time and convert losslessly between raw bytes and
//! hex, base64 and base64url text. A hyphen-grouped "pretty" hex form is
//! available for display.
//!
//! # Layout
//!
//! ```text
//! bytes  0..4   seconds since the Unix epoch
//! bytes  4..7   microseconds (low 24 bits)
//! bytes  7..10  machine fingerprint
//! bytes 10..12  process fingerprint
//! bytes 12..15  counter (wraps at 2^24)
//! ```
//!
//! # Example
//!
//! ```
//! use objectid::{Encoding, ObjectId, ObjectIdGen};
//!
//! let generator = ObjectIdGen::new();
//! let id = generator.next_id();
//! println!("{}", id); // e.g., "512055ac09b8979d8fa1511f000002"
//!
//! let parsed: ObjectId = "USBVrAm4l52PoVEfAAAC".parse()?;
//! assert_eq!(parsed.to_hex(), "512055ac09b8979d8fa1511f000002");
//! assert_eq!(parsed.encode(Encoding::Pretty), "512055ac-09b897-9d8fa1-511f-000002");
//! assert_eq!(parsed.time_of_day(), (1361073580, 637079));
//! # Ok::<(), objectid::ObjectIdError>(())
//! ```

mod codec;
mod generator;
mod object_id;
mod serde_support;

pub use codec::{Encoding, Input, decode, detect, encode};
pub use generator::{Clock, Fingerprint, ObjectIdGen, SystemClock};
pub use object_id::{OBJECT_ID_LEN, ObjectId, ObjectIdError};
