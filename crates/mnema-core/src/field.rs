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

//! Per-field codecs used by `#[derive(Streamable)]`.
//!
//! The field's Rust type selects its wire form:
//!
//! | Field type                 | Wire form                  |
//! |----------------------------|----------------------------|
//! | integers, floats, `bool`   | fixed-width scalar         |
//! | `String`                   | length-prefixed string     |
//! | `Vec<u8>`                  | blob (empty = absent)      |
//! | `[T; N]` that is `Pod`     | fixed-size pod value       |
//! | `Option<Shared<T>>`        | owning / shared reference  |
//! | `Vec<Shared<T>>`           | reference sequence         |
//! | `Vec<Option<Shared<T>>>`   | reference sequence, nulls  |
//! | `Weak<RefCell<T>>`         | weak back reference        |
//!
//! Other pod buffers and single pod values are selected with the
//! `#[stream(pod_buffer)]` and `#[stream(pod)]` field attributes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bytemuck::Pod;

use crate::error::{LoadError, SaveError};
use crate::reader::GraphReader;
use crate::schema::FieldKind;
use crate::streamable::{Shared, Streamable};
use crate::writer::GraphWriter;

/// A value that knows how to stream itself as one field.
pub trait StreamField: Sized {
    /// The wire shape, used to build declared schemas.
    const KIND: FieldKind;

    /// Writes the field.
    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError>;

    /// Reads the field.
    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError>;
}

macro_rules! scalar_fields {
    ($($ty:ty => $kind:ident, $write:ident, $read:ident);* $(;)?) => {
        $(
            impl StreamField for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
                    writer.$write(*self)
                }

                fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
                    reader.$read()
                }
            }
        )*
    };
}

scalar_fields! {
    u8 => U8, write_u8, read_u8;
    u16 => U16, write_u16, read_u16;
    u32 => U32, write_u32, read_u32;
    u64 => U64, write_u64, read_u64;
    i8 => I8, write_i8, read_i8;
    i16 => I16, write_i16, read_i16;
    i32 => I32, write_i32, read_i32;
    i64 => I64, write_i64, read_i64;
    f32 => F32, write_f32, read_f32;
    f64 => F64, write_f64, read_f64;
    bool => Bool, write_bool, read_bool;
}

impl StreamField for String {
    const KIND: FieldKind = FieldKind::Str;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_str(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        reader.read_string()
    }
}

impl StreamField for Vec<u8> {
    const KIND: FieldKind = FieldKind::Blob;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_blob(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        Ok(reader.read_blob()?.unwrap_or_default())
    }
}

impl<T, const N: usize> StreamField for [T; N]
where
    [T; N]: Pod,
{
    const KIND: FieldKind = FieldKind::Pod(std::mem::size_of::<[T; N]>());

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_pod(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        reader.read_pod()
    }
}

impl<T: Streamable> StreamField for Option<Shared<T>> {
    const KIND: FieldKind = FieldKind::Ref;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_ref(self.as_ref())
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        reader.read_ref()
    }
}

impl<T: Streamable> StreamField for Vec<Shared<T>> {
    const KIND: FieldKind = FieldKind::RefSeq;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_refs(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        reader.read_refs()
    }
}

impl<T: Streamable> StreamField for Vec<Option<Shared<T>>> {
    const KIND: FieldKind = FieldKind::RefSeq;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_opt_refs(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        reader.read_opt_refs()
    }
}

impl<T: Streamable> StreamField for Weak<RefCell<T>> {
    const KIND: FieldKind = FieldKind::WeakRef;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_weak(self)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        Ok(reader
            .read_weak::<T>()?
            .map(|target| Rc::downgrade(&target))
            .unwrap_or_default())
    }
}

/// Codec for a single pod value, selected with `#[stream(pod)]`.
#[doc(hidden)]
pub mod pod {
    use super::*;

    pub const fn kind<T: Pod>() -> FieldKind {
        FieldKind::Pod(std::mem::size_of::<T>())
    }

    pub fn write<T: Pod>(value: &T, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_pod(value)
    }

    pub fn read<T: Pod>(reader: &mut GraphReader<'_>) -> Result<T, LoadError> {
        reader.read_pod()
    }
}

/// Codec for a buffer of pod elements, selected with `#[stream(pod_buffer)]`.
#[doc(hidden)]
pub mod pod_buffer {
    use super::*;

    pub const KIND: FieldKind = FieldKind::Blob;

    pub fn write<T: Pod>(values: &[T], writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_pod_blob(values)
    }

    pub fn read<T: Pod>(reader: &mut GraphReader<'_>) -> Result<Vec<T>, LoadError> {
        reader.read_pod_blob()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load_from_slice, save_to_vec, shared, StreamConfig, TypeRegistry};

    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct Vertex {
        position: [f32; 3],
        uv: [f32; 2],
    }

    #[derive(Default, crate::Streamable)]
    #[stream(tag = "test.Everything")]
    struct Everything {
        small: u8,
        signed: i64,
        ratio: f64,
        enabled: bool,
        name: String,
        bytes: Vec<u8>,
        tint: [f32; 4],
        #[stream(pod)]
        origin: Vertex,
        #[stream(pod_buffer)]
        vertices: Vec<Vertex>,
        #[stream(skip)]
        cache: Option<u64>,
        next: Option<Shared<Everything>>,
        all: Vec<Shared<Everything>>,
        back: Weak<RefCell<Everything>>,
    }

    #[test]
    fn test_derived_schema() {
        let schema = Everything::default().schema().unwrap();
        assert_eq!(
            schema,
            &[
                FieldKind::U8,
                FieldKind::I64,
                FieldKind::F64,
                FieldKind::Bool,
                FieldKind::Str,
                FieldKind::Blob,
                FieldKind::Pod(16),
                FieldKind::Pod(20),
                FieldKind::Blob,
                FieldKind::Ref,
                FieldKind::RefSeq,
                FieldKind::WeakRef,
            ]
        );
    }

    #[test]
    fn test_every_field_kind_round_trips() {
        let config = StreamConfig {
            check_schema: true,
            ..Default::default()
        };
        let vertex = Vertex {
            position: [1.0, 2.0, 3.0],
            uv: [0.5, 0.25],
        };
        let tail = shared(Everything {
            name: "tail".to_string(),
            ..Default::default()
        });
        let head = shared(Everything {
            small: 200,
            signed: -9_000_000_000,
            ratio: 0.125,
            enabled: true,
            name: "head".to_string(),
            bytes: vec![1, 2, 3],
            tint: [0.1, 0.2, 0.3, 1.0],
            origin: vertex,
            vertices: vec![vertex, Vertex::default()],
            cache: Some(99),
            next: Some(tail.clone()),
            all: vec![tail.clone(), tail],
            back: Weak::new(),
        });

        let bytes = save_to_vec(&head, &config).unwrap();
        let mut registry = TypeRegistry::new();
        registry.register::<Everything>();
        let loaded = load_from_slice::<Everything>(&bytes, &registry, &config).unwrap();

        let head = loaded.root().borrow();
        assert_eq!(head.small, 200);
        assert_eq!(head.signed, -9_000_000_000);
        assert_eq!(head.ratio, 0.125);
        assert!(head.enabled);
        assert_eq!(head.name, "head");
        assert_eq!(head.bytes, vec![1, 2, 3]);
        assert_eq!(head.tint, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(head.origin, vertex);
        assert_eq!(head.vertices, vec![vertex, Vertex::default()]);
        assert_eq!(head.cache, None);
        assert!(head.back.upgrade().is_none());

        let next = head.next.as_ref().unwrap();
        assert_eq!(next.borrow().name, "tail");
        assert_eq!(head.all.len(), 2);
        assert!(Rc::ptr_eq(next, &head.all[0]));
        assert!(Rc::ptr_eq(next, &head.all[1]));
        assert_eq!(loaded.len(), 2);
    }
}
