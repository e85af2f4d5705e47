//! Storage-native document identifier.
//!
//! # Responsibility
//! - Define the 12-byte identifier assigned to every stored document.
//! - Translate losslessly between the binary form and the 24-char hex form
//!   exposed on `Recipe::id`.
//!
//! # Invariants
//! - The hex form is always lowercase and exactly 24 characters.
//! - Parsing is deterministic: the same input always yields the same id or
//!   the same error.
//! - Generated ids embed a big-endian seconds timestamp, 5 process-random
//!   bytes and a 3-byte wrapping counter.

use once_cell::sync::Lazy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Number of bytes in a binary identifier.
pub const OBJECT_ID_LEN: usize = 12;
/// Number of characters in the hex form.
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_LEN * 2;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let mut bytes = [0_u8; 5];
    bytes.copy_from_slice(&random.as_bytes()[..5]);
    bytes
});

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let bytes = random.as_bytes();
    AtomicU32::new(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
});

/// Binary identifier of one stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

/// Failure to translate between hex/raw input and `ObjectId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    /// Hex input does not have exactly 24 characters.
    InvalidHexLength { actual: usize },
    /// Hex input contains a non-hex character.
    InvalidHexCharacter { character: char, index: usize },
    /// Raw storage key does not have exactly 12 bytes.
    InvalidByteLength { actual: usize },
}

impl Display for ObjectIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHexLength { actual } => write!(
                f,
                "identifier must be {OBJECT_ID_HEX_LEN} hex characters, got {actual}"
            ),
            Self::InvalidHexCharacter { character, index } => {
                write!(f, "invalid hex character `{character}` at index {index}")
            }
            Self::InvalidByteLength { actual } => write!(
                f,
                "storage identifier must be {OBJECT_ID_LEN} bytes, got {actual}"
            ),
        }
    }
}

impl Error for ObjectIdError {}

impl ObjectId {
    /// Generates a fresh identifier for the current second.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        Self::from_parts(secs as u32, *PROCESS_UNIQUE, counter)
    }

    fn from_parts(timestamp: u32, process: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0_u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Wraps raw bytes without validation.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses the 24-character hex form (either case).
    pub fn parse_hex(value: &str) -> Result<Self, ObjectIdError> {
        if value.len() != OBJECT_ID_HEX_LEN {
            return Err(ObjectIdError::InvalidHexLength {
                actual: value.chars().count(),
            });
        }

        let mut bytes = [0_u8; OBJECT_ID_LEN];
        hex::decode_to_slice(value, &mut bytes).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                ObjectIdError::InvalidHexCharacter {
                    character: c,
                    index,
                }
            }
            _ => ObjectIdError::InvalidHexLength {
                actual: value.chars().count(),
            },
        })?;
        Ok(Self(bytes))
    }

    /// Returns the canonical lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Seconds since the unix epoch embedded at generation time.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(value)
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; OBJECT_ID_LEN] = value
            .try_into()
            .map_err(|_| ObjectIdError::InvalidByteLength {
                actual: value.len(),
            })?;
        Ok(Self(bytes))
    }
}
