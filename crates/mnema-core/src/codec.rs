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

//! Little-endian primitive encoding over an abstract byte cursor.

use std::io::{Read, Write};

use bytemuck::Pod;

use crate::error::{LoadError, SaveError, StreamFault};

// Pod values and buffers are copied in host byte order, which matches the
// little-endian scalar encoding only on little-endian hosts.
const _: () = assert!(
    cfg!(target_endian = "little"),
    "the stream format is little-endian and pod payloads are copied verbatim"
);

macro_rules! encode_scalar {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $name(&mut self, value: $ty) -> Result<(), SaveError> {
                self.write_bytes(&value.to_le_bytes())
            }
        )*
    };
}

macro_rules! decode_scalar {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $name(&mut self) -> Result<$ty, LoadError> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                self.read_exact(&mut bytes)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        )*
    };
}

/// Converts a length to its `u32` wire form, enforcing `limit`.
fn wire_len(what: &'static str, len: usize, limit: u32) -> Result<u32, SaveError> {
    match u32::try_from(len) {
        Ok(wire) if wire <= limit => Ok(wire),
        _ => Err(SaveError::LengthLimit { what, len, limit }),
    }
}

/// Writes primitives to a sink and counts the bytes produced.
pub(crate) struct Encoder<'a> {
    sink: &'a mut dyn Write,
    written: u64,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(sink: &'a mut dyn Write) -> Self {
        Self { sink, written: 0 }
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.written
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        self.sink.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    encode_scalar! {
        write_u8: u8,
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_f32: f32,
        write_f64: f64,
    }

    pub(crate) fn write_bool(&mut self, value: bool) -> Result<(), SaveError> {
        self.write_u8(u8::from(value))
    }

    pub(crate) fn write_str(&mut self, value: &str, limit: u32) -> Result<(), SaveError> {
        let len = wire_len("string", value.len(), limit)?;
        self.write_u32(len)?;
        self.write_bytes(value.as_bytes())
    }

    /// Writes a length-prefixed blob. An empty slice writes only the zero marker.
    pub(crate) fn write_blob(&mut self, bytes: &[u8], limit: u32) -> Result<(), SaveError> {
        let len = wire_len("blob", bytes.len(), limit)?;
        self.write_u32(len)?;
        self.write_bytes(bytes)
    }

    pub(crate) fn write_count(&mut self, count: usize, limit: u32) -> Result<(), SaveError> {
        let count = wire_len("sequence", count, limit)?;
        self.write_u32(count)
    }

    pub(crate) fn write_pod<T: Pod>(&mut self, value: &T) -> Result<(), SaveError> {
        self.write_bytes(bytemuck::bytes_of(value))
    }
}

/// Reads primitives from a source.
///
/// Running out of bytes surfaces as [`StreamFault::Truncated`].
pub(crate) struct Decoder<'a> {
    source: &'a mut dyn Read,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(source: &'a mut dyn Read) -> Self {
        Self { source }
    }

    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LoadError> {
        self.source.read_exact(buf)?;
        Ok(())
    }

    decode_scalar! {
        read_u8: u8,
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
        read_i8: i8,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_f32: f32,
        read_f64: f64,
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool, LoadError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamFault::InvalidBool(other).into()),
        }
    }

    fn read_len(&mut self, what: &'static str, limit: u32) -> Result<u32, LoadError> {
        let len = self.read_u32()?;
        if len > limit {
            return Err(StreamFault::LengthLimit { what, len, limit }.into());
        }
        Ok(len)
    }

    fn read_vec(&mut self, len: u32) -> Result<Vec<u8>, LoadError> {
        let mut bytes = vec![0u8; len as usize];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    pub(crate) fn read_string(&mut self, limit: u32) -> Result<String, LoadError> {
        let len = self.read_len("string", limit)?;
        let bytes = self.read_vec(len)?;
        String::from_utf8(bytes).map_err(|_| StreamFault::InvalidUtf8.into())
    }

    /// Reads a length-prefixed blob. The zero marker yields `None` without allocating.
    pub(crate) fn read_blob(&mut self, limit: u32) -> Result<Option<Vec<u8>>, LoadError> {
        match self.read_len("blob", limit)? {
            0 => Ok(None),
            len => self.read_vec(len).map(Some),
        }
    }

    pub(crate) fn read_count(&mut self, limit: u32) -> Result<u32, LoadError> {
        self.read_len("sequence", limit)
    }

    pub(crate) fn read_pod<T: Pod>(&mut self) -> Result<T, LoadError> {
        let mut value = T::zeroed();
        self.read_exact(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_little_endian() {
        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        encoder.write_u32(0x0102_0304).unwrap();
        encoder.write_i16(-2).unwrap();
        encoder.write_bool(true).unwrap();
        assert_eq!(encoder.bytes_written(), 7);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01, 0xfe, 0xff, 0x01]);

        let mut cursor = buf.as_slice();
        let mut decoder = Decoder::new(&mut cursor);
        assert_eq!(decoder.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(decoder.read_i16().unwrap(), -2);
        assert!(decoder.read_bool().unwrap());
    }

    #[test]
    fn test_string_and_blob_layout() {
        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        encoder.write_str("hey", 16).unwrap();
        encoder.write_blob(&[], 16).unwrap();
        encoder.write_blob(&[9, 8], 16).unwrap();
        assert_eq!(
            buf,
            [3, 0, 0, 0, b'h', b'e', b'y', 0, 0, 0, 0, 2, 0, 0, 0, 9, 8]
        );

        let mut cursor = buf.as_slice();
        let mut decoder = Decoder::new(&mut cursor);
        assert_eq!(decoder.read_string(16).unwrap(), "hey");
        assert_eq!(decoder.read_blob(16).unwrap(), None);
        assert_eq!(decoder.read_blob(16).unwrap(), Some(vec![9, 8]));
    }

    #[test]
    fn test_truncated_blob() {
        let bytes = [4u8, 0, 0, 0, 1, 2];
        let mut cursor = &bytes[..];
        let mut decoder = Decoder::new(&mut cursor);
        assert!(matches!(
            decoder.read_blob(64),
            Err(LoadError::CorruptStream(StreamFault::Truncated))
        ));
    }

    #[test]
    fn test_length_limits() {
        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        assert!(matches!(
            encoder.write_str("too long", 4),
            Err(SaveError::LengthLimit { what: "string", len: 8, limit: 4 })
        ));

        let bytes = [0xffu8, 0xff, 0xff, 0x7f];
        let mut cursor = &bytes[..];
        let mut decoder = Decoder::new(&mut cursor);
        assert!(matches!(
            decoder.read_blob(1024),
            Err(LoadError::CorruptStream(StreamFault::LengthLimit { what: "blob", .. }))
        ));
    }

    #[test]
    fn test_invalid_bool_and_utf8() {
        let bytes = [2u8, 2, 0, 0, 0, 0xc3, 0x28];
        let mut cursor = &bytes[..];
        let mut decoder = Decoder::new(&mut cursor);
        assert!(matches!(
            decoder.read_bool(),
            Err(LoadError::CorruptStream(StreamFault::InvalidBool(2)))
        ));
        assert!(matches!(
            decoder.read_string(16),
            Err(LoadError::CorruptStream(StreamFault::InvalidUtf8))
        ));
    }

    #[test]
    fn test_pod_value() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_pod(&[1.5f32, -2.0, 0.25]).unwrap();
        assert_eq!(buf.len(), 12);

        let mut cursor = buf.as_slice();
        let value: [f32; 3] = Decoder::new(&mut cursor).read_pod().unwrap();
        assert_eq!(value, [1.5, -2.0, 0.25]);
    }
}
