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

//! The save side of a pass.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Weak;

use bytemuck::Pod;

use crate::codec::Encoder;
use crate::config::StreamConfig;
use crate::error::SaveError;
use crate::format::StreamHeader;
use crate::identity::{Identity, WriteTable};
use crate::schema::{FieldKind, SchemaCursor};
use crate::streamable::{Shared, SharedDyn, Streamable};

/// Counters describing one finished save pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Objects written in full.
    pub objects: u32,
    /// References written as an alias of an already written object.
    pub aliases: u32,
    /// Null references written.
    pub nulls: u32,
    /// Live weak references written as null because their holder was not the root.
    pub suppressed_weak: u32,
    /// Total stream size, header included.
    pub bytes: u64,
}

struct Frame {
    identity: Identity,
    schema: SchemaCursor,
}

/// Writes an object graph to a byte sink.
///
/// A `GraphWriter` exists for the duration of one pass. The pass is started with
/// [`GraphWriter::save`]; types receive the writer in their
/// [`Streamable::save`] and write their fields through it.
pub struct GraphWriter<'a> {
    encoder: Encoder<'a>,
    config: &'a StreamConfig,
    table: WriteTable,
    frames: Vec<Frame>,
    root: Option<Identity>,
    stats: PassStats,
}

impl<'a> GraphWriter<'a> {
    fn new(sink: &'a mut dyn Write, config: &'a StreamConfig) -> Self {
        Self {
            encoder: Encoder::new(sink),
            config,
            table: WriteTable::new(),
            frames: Vec::new(),
            root: None,
            stats: PassStats::default(),
        }
    }

    /// Runs a complete save pass: the header, then `root` and everything it reaches.
    ///
    /// `root` is the entry point of the pass: it is the only object whose weak
    /// references are followed.
    pub fn save<T: Streamable>(
        sink: &'a mut dyn Write,
        config: &'a StreamConfig,
        root: &Shared<T>,
    ) -> Result<PassStats, SaveError> {
        Self::save_dyn(sink, config, &(root.clone() as SharedDyn))
    }

    /// Type-erased form of [`GraphWriter::save`].
    pub fn save_dyn(
        sink: &'a mut dyn Write,
        config: &'a StreamConfig,
        root: &SharedDyn,
    ) -> Result<PassStats, SaveError> {
        let mut writer = Self::new(sink, config);
        writer.encoder.write_bytes(&StreamHeader::CURRENT.to_bytes())?;
        writer.root = Some(Identity::of_cell(root));
        log::debug!("GraphWriter: saving graph rooted at `{}`.", tag_of(root));

        writer.write_object(root)?;

        writer.stats.bytes = writer.encoder.bytes_written();
        log::debug!("GraphWriter: pass finished, {:?}.", writer.stats);
        Ok(writer.stats)
    }

    /// The configuration of this pass.
    pub fn config(&self) -> &StreamConfig {
        self.config
    }

    /// Returns `true` if `object` is the entry point of this pass.
    pub fn is_root<T: ?Sized>(&self, object: &T) -> bool {
        self.root == Some(Identity::of_value(object))
    }

    /// Returns `true` while the root object's own fields are being written.
    fn holder_is_root(&self) -> bool {
        match self.frames.last() {
            Some(frame) => self.root == Some(frame.identity),
            None => false,
        }
    }

    fn check_field(&mut self, kind: FieldKind) -> Result<(), SaveError> {
        if !self.config.check_schema {
            return Ok(());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.schema.advance(kind)?;
        }
        Ok(())
    }

    /// Writes a full encoding on first sighting, an alias otherwise.
    fn write_object(&mut self, cell: &RefCell<dyn Streamable>) -> Result<(), SaveError> {
        let identity = Identity::of_cell(cell);
        if let Some(id) = self.table.get(identity) {
            log::trace!("GraphWriter: alias {id}.");
            self.stats.aliases += 1;
            return self.encoder.write_u32(id.get());
        }

        let object = cell.try_borrow().map_err(|_| SaveError::Busy { tag: "<unknown>" })?;
        let tag = object.type_tag();
        if self.frames.len() >= self.config.max_depth {
            return Err(SaveError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        let id = self.table.assign(identity).ok_or(SaveError::IdOverflow)?;
        log::trace!("GraphWriter: object {id} `{tag}`.");
        self.stats.objects += 1;
        self.encoder.write_u32(id.get())?;
        self.encoder.write_str(tag, self.config.max_string_len)?;

        self.frames.push(Frame {
            identity,
            schema: SchemaCursor::new(tag, object.schema()),
        });
        let result = object.save(self);
        let frame = self.frames.pop();
        result?;

        if self.config.check_schema {
            if let Some(frame) = frame {
                frame.schema.finish()?;
            }
        }
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), SaveError> {
        self.stats.nulls += 1;
        self.encoder.write_u32(0)
    }

    /// Writes an owning or shared reference.
    ///
    /// The first reference to an object in a pass writes the object in full;
    /// later ones write only its serial id.
    pub fn write_ref<T: Streamable>(&mut self, target: Option<&Shared<T>>) -> Result<(), SaveError> {
        self.check_field(FieldKind::Ref)?;
        match target {
            Some(target) => self.write_object(&**target),
            None => self.write_null(),
        }
    }

    /// Type-erased form of [`GraphWriter::write_ref`].
    pub fn write_ref_dyn(&mut self, target: Option<&SharedDyn>) -> Result<(), SaveError> {
        self.check_field(FieldKind::Ref)?;
        match target {
            Some(target) => self.write_object(&**target),
            None => self.write_null(),
        }
    }

    /// Writes a weak back reference.
    ///
    /// Only the root of the pass writes its weak references like shared ones;
    /// for every other holder the reference is written as null, which keeps a
    /// save started at an inner node from climbing back up the tree.
    pub fn write_weak<T: Streamable>(&mut self, target: &Weak<RefCell<T>>) -> Result<(), SaveError> {
        self.check_field(FieldKind::WeakRef)?;
        let Some(target) = target.upgrade() else {
            return self.write_null();
        };
        if self.holder_is_root() {
            self.write_object(&*target)
        } else {
            self.stats.suppressed_weak += 1;
            self.write_null()
        }
    }

    /// Writes a counted sequence of references, preserving order.
    pub fn write_refs<T: Streamable>(&mut self, targets: &[Shared<T>]) -> Result<(), SaveError> {
        self.check_field(FieldKind::RefSeq)?;
        self.encoder
            .write_count(targets.len(), self.config.max_sequence_len)?;
        for target in targets {
            self.write_object(&**target)?;
        }
        Ok(())
    }

    /// Type-erased form of [`GraphWriter::write_refs`].
    pub fn write_refs_dyn(&mut self, targets: &[SharedDyn]) -> Result<(), SaveError> {
        self.check_field(FieldKind::RefSeq)?;
        self.encoder
            .write_count(targets.len(), self.config.max_sequence_len)?;
        for target in targets {
            self.write_object(&**target)?;
        }
        Ok(())
    }

    /// Writes a counted sequence of optional references; `None` elements are
    /// written as null.
    pub fn write_opt_refs<T: Streamable>(
        &mut self,
        targets: &[Option<Shared<T>>],
    ) -> Result<(), SaveError> {
        self.check_field(FieldKind::RefSeq)?;
        self.encoder
            .write_count(targets.len(), self.config.max_sequence_len)?;
        for target in targets {
            match target {
                Some(target) => self.write_object(&**target)?,
                None => self.write_null()?,
            }
        }
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<(), SaveError> {
        self.check_field(FieldKind::Str)?;
        self.encoder.write_str(value, self.config.max_string_len)
    }

    /// Writes a length-prefixed byte blob. An empty blob writes only the zero marker.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        self.check_field(FieldKind::Blob)?;
        self.encoder.write_blob(bytes, self.config.max_blob_len)
    }

    /// Writes a slice of plain-old-data elements as a blob.
    pub fn write_pod_blob<T: Pod>(&mut self, values: &[T]) -> Result<(), SaveError> {
        self.write_blob(bytemuck::cast_slice(values))
    }

    /// Writes a fixed-size plain-old-data value without a length prefix.
    pub fn write_pod<T: Pod>(&mut self, value: &T) -> Result<(), SaveError> {
        self.check_field(FieldKind::Pod(std::mem::size_of::<T>()))?;
        self.encoder.write_pod(value)
    }

    /// Writes a `bool` as one byte.
    pub fn write_bool(&mut self, value: bool) -> Result<(), SaveError> {
        self.check_field(FieldKind::Bool)?;
        self.encoder.write_bool(value)
    }
}

macro_rules! write_scalars {
    ($($name:ident: $ty:ty => $kind:ident),* $(,)?) => {
        impl GraphWriter<'_> {
            $(
                #[doc = concat!("Writes a little-endian `", stringify!($ty), "`.")]
                pub fn $name(&mut self, value: $ty) -> Result<(), SaveError> {
                    self.check_field(FieldKind::$kind)?;
                    self.encoder.$name(value)
                }
            )*
        }
    };
}

write_scalars! {
    write_u8: u8 => U8,
    write_u16: u16 => U16,
    write_u32: u32 => U32,
    write_u64: u64 => U64,
    write_i8: i8 => I8,
    write_i16: i16 => I16,
    write_i32: i32 => I32,
    write_i64: i64 => I64,
    write_f32: f32 => F32,
    write_f64: f64 => F64,
}

fn tag_of(object: &SharedDyn) -> &'static str {
    object
        .try_borrow()
        .map(|object| object.type_tag())
        .unwrap_or("<borrowed>")
}

/// Saves the graph rooted at `root` into a new byte vector.
pub fn save_to_vec<T: Streamable>(
    root: &Shared<T>,
    config: &StreamConfig,
) -> Result<Vec<u8>, SaveError> {
    let mut bytes = Vec::new();
    GraphWriter::save(&mut bytes, config, root)?;
    Ok(bytes)
}
