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

//! Declared field order of a streamable type.
//!
//! The wire format carries no per-field tags, so a `save` and a `load` that
//! drift apart are invisible in the bytes. A type may declare its field order
//! as a slice of [`FieldKind`]s; the writer and reader then check every field
//! operation against that declaration while the type is being streamed.

use std::fmt;

use crate::error::SchemaError;

/// The wire shape of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// One byte, 0 or 1.
    Bool,
    /// Length-prefixed UTF-8 string.
    Str,
    /// Length-prefixed byte blob.
    Blob,
    /// A fixed-size plain-old-data value of the given byte size.
    Pod(usize),
    /// An owning or shared object reference.
    Ref,
    /// A weak back reference.
    WeakRef,
    /// A counted sequence of object references.
    RefSeq,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::U8 => f.write_str("u8"),
            FieldKind::U16 => f.write_str("u16"),
            FieldKind::U32 => f.write_str("u32"),
            FieldKind::U64 => f.write_str("u64"),
            FieldKind::I8 => f.write_str("i8"),
            FieldKind::I16 => f.write_str("i16"),
            FieldKind::I32 => f.write_str("i32"),
            FieldKind::I64 => f.write_str("i64"),
            FieldKind::F32 => f.write_str("f32"),
            FieldKind::F64 => f.write_str("f64"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Str => f.write_str("string"),
            FieldKind::Blob => f.write_str("blob"),
            FieldKind::Pod(size) => write!(f, "pod[{size}]"),
            FieldKind::Ref => f.write_str("reference"),
            FieldKind::WeakRef => f.write_str("weak reference"),
            FieldKind::RefSeq => f.write_str("reference sequence"),
        }
    }
}

/// Tracks the fields streamed so far for one object.
#[derive(Debug)]
pub(crate) struct SchemaCursor {
    tag: &'static str,
    fields: Option<&'static [FieldKind]>,
    position: usize,
}

impl SchemaCursor {
    pub(crate) fn new(tag: &'static str, fields: Option<&'static [FieldKind]>) -> Self {
        Self {
            tag,
            fields,
            position: 0,
        }
    }

    /// Records one streamed field and checks it against the declaration.
    pub(crate) fn advance(&mut self, found: FieldKind) -> Result<(), SchemaError> {
        let index = self.position;
        self.position += 1;
        let Some(fields) = self.fields else {
            return Ok(());
        };
        let expected = fields.get(index).copied();
        if expected == Some(found) {
            Ok(())
        } else {
            Err(SchemaError::Mismatch {
                tag: self.tag,
                index,
                expected,
                found,
            })
        }
    }

    /// Checks that every declared field was streamed.
    pub(crate) fn finish(&self) -> Result<(), SchemaError> {
        match self.fields {
            Some(fields) if fields.len() != self.position => Err(SchemaError::Incomplete {
                tag: self.tag,
                streamed: self.position,
                declared: fields.len(),
            }),
            _ => Ok(()),
        }
    }
}
