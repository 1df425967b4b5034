// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the binary layout of a Mnema graph stream.
//!
//! Every stream starts with a fixed-size [`StreamHeader`] followed by exactly one
//! object encoding, the root of the graph:
//!
//! ```text
//! Stream    := Header Object
//! Header    := magic:u32  version:u16
//! Object    := SerialId:u32  [ TypeTag:LString  Fields ]   // bracket only on first sighting
//! Reference := SerialId:u32                              // 0 = null
//! LString   := length:u32  bytes:[u8; length]
//! Blob      := length:u32  bytes:[u8; length]            // 0 = empty/absent
//! Sequence  := count:u32  (T)*count
//! ```
//!
//! All integers are little-endian.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::StreamFault;

/// Magic number identifying a Mnema stream ("MNMA" read as a little-endian `u32`).
pub const STREAM_MAGIC: u32 = u32::from_le_bytes(*b"MNMA");

/// The only stream layout version this crate reads and writes.
pub const FORMAT_VERSION: u16 = 1;

/// The fixed-size header at the beginning of every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Must be [`STREAM_MAGIC`].
    pub magic: u32,
    /// Must be [`FORMAT_VERSION`].
    pub version: u16,
}

// NOTE: the header is not routed through the field codec. It is a fixed
// layout checked before any object is touched.
impl StreamHeader {
    /// The total size of the header in bytes.
    pub const SIZE: usize = 4 + 2;

    /// The header written by this version of the crate.
    pub const CURRENT: StreamHeader = StreamHeader {
        magic: STREAM_MAGIC,
        version: FORMAT_VERSION,
    };

    /// Serializes the header into its fixed byte layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes
    }

    /// Parses and validates a header from the beginning of a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StreamFault> {
        if bytes.len() < Self::SIZE {
            return Err(StreamFault::Truncated);
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != STREAM_MAGIC {
            return Err(StreamFault::BadMagic { found: magic });
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(StreamFault::UnsupportedVersion { found: version });
        }

        Ok(Self { magic, version })
    }
}

/// A pass-local object identity.
///
/// Ids are handed out in first-sighting order starting at 1. The value 0 is
/// reserved on the wire for a null reference and is therefore not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialId(NonZeroU32);

impl SerialId {
    /// The first id assigned in a pass.
    pub const FIRST: SerialId = SerialId(NonZeroU32::MIN);

    /// Interprets a raw wire value. Returns `None` for the null sentinel.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw wire value.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The id following this one, or `None` once the `u32` space is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for SerialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let bytes = StreamHeader::CURRENT.to_bytes();
        assert_eq!(&bytes[0..4], b"MNMA");
        assert_eq!(StreamHeader::from_bytes(&bytes), Ok(StreamHeader::CURRENT));
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut bytes = StreamHeader::CURRENT.to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            StreamHeader::from_bytes(&bytes),
            Err(StreamFault::BadMagic { .. })
        ));
    }

    #[test]
    fn test_header_rejects_other_version() {
        let header = StreamHeader {
            magic: STREAM_MAGIC,
            version: FORMAT_VERSION + 1,
        };
        assert_eq!(
            StreamHeader::from_bytes(&header.to_bytes()),
            Err(StreamFault::UnsupportedVersion {
                found: FORMAT_VERSION + 1
            })
        );
    }

    #[test]
    fn test_header_rejects_short_input() {
        assert_eq!(
            StreamHeader::from_bytes(&[0x4d, 0x4e]),
            Err(StreamFault::Truncated)
        );
    }

    #[test]
    fn test_serial_id_null_sentinel() {
        assert_eq!(SerialId::from_raw(0), None);
        assert_eq!(SerialId::from_raw(1), Some(SerialId::FIRST));
        assert_eq!(SerialId::FIRST.next().map(SerialId::get), Some(2));
        assert_eq!(SerialId::from_raw(u32::MAX).and_then(SerialId::next), None);
    }
}
