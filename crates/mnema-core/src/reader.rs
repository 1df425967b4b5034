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

//! The load side of a pass.

use std::any::type_name;
use std::fmt;
use std::io::Read;

use bytemuck::Pod;

use crate::codec::Decoder;
use crate::config::StreamConfig;
use crate::error::{LoadError, StreamFault};
use crate::format::{SerialId, StreamHeader};
use crate::identity::ReadTable;
use crate::registry::{ObjectSlot, TypeRegistry};
use crate::schema::{FieldKind, SchemaCursor};
use crate::streamable::{Shared, SharedDyn, Streamable};

/// The result of a load pass.
///
/// Besides the typed root, it keeps every object built during the pass alive,
/// in serial id order. Objects that the stream only reaches through weak
/// references have no other strong owner until the caller relinks them.
pub struct LoadedGraph<T: ?Sized> {
    root: Shared<T>,
    objects: Vec<SharedDyn>,
}

impl<T: ?Sized> LoadedGraph<T> {
    /// The root object.
    pub fn root(&self) -> &Shared<T> {
        &self.root
    }

    /// Every object built by the pass, the root first.
    pub fn objects(&self) -> &[SharedDyn] {
        &self.objects
    }

    /// Number of distinct objects in the stream.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Always `false`: a loaded graph holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops the keep-alive list and returns the root.
    pub fn into_root(self) -> Shared<T> {
        self.root
    }
}

impl<T: ?Sized> fmt::Debug for LoadedGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self
            .objects
            .first()
            .and_then(|root| root.try_borrow().ok().map(|root| root.type_tag()))
            .unwrap_or("<borrowed>");
        f.debug_struct("LoadedGraph")
            .field("root", &root)
            .field("objects", &self.objects.len())
            .finish()
    }
}

/// Reads an object graph from a byte source.
///
/// A `GraphReader` exists for the duration of one pass. The pass is started
/// with [`GraphReader::load`]; types receive the reader in their
/// [`Streamable::load`] and read their fields through it, in the order their
/// `save` wrote them.
pub struct GraphReader<'a> {
    decoder: Decoder<'a>,
    registry: &'a TypeRegistry,
    config: &'a StreamConfig,
    table: ReadTable,
    frames: Vec<SchemaCursor>,
}

impl<'a> GraphReader<'a> {
    fn new(
        source: &'a mut dyn Read,
        registry: &'a TypeRegistry,
        config: &'a StreamConfig,
    ) -> Self {
        Self {
            decoder: Decoder::new(source),
            registry,
            config,
            table: ReadTable::new(),
            frames: Vec::new(),
        }
    }

    /// Runs a complete load pass and returns the root as a `T`.
    pub fn load<T: Streamable>(
        source: &'a mut dyn Read,
        registry: &'a TypeRegistry,
        config: &'a StreamConfig,
    ) -> Result<LoadedGraph<T>, LoadError> {
        let (root, table) = Self::run(source, registry, config)?;
        let typed = downcast::<T>(&root)?;
        Ok(LoadedGraph {
            root: typed,
            objects: collect(table),
        })
    }

    /// Runs a complete load pass without knowing the root's type.
    pub fn load_dyn(
        source: &'a mut dyn Read,
        registry: &'a TypeRegistry,
        config: &'a StreamConfig,
    ) -> Result<LoadedGraph<dyn Streamable>, LoadError> {
        let (root, table) = Self::run(source, registry, config)?;
        Ok(LoadedGraph {
            root: root.into_object(),
            objects: collect(table),
        })
    }

    fn run(
        source: &'a mut dyn Read,
        registry: &'a TypeRegistry,
        config: &'a StreamConfig,
    ) -> Result<(ObjectSlot, ReadTable), LoadError> {
        let mut reader = Self::new(source, registry, config);

        let mut header = [0u8; StreamHeader::SIZE];
        reader.decoder.read_exact(&mut header)?;
        StreamHeader::from_bytes(&header)?;

        let root = reader.read_object()?.ok_or(StreamFault::NullRoot)?;
        log::debug!(
            "GraphReader: loaded graph rooted at `{}`, {} objects.",
            root.tag(),
            reader.table.len()
        );
        Ok((root, reader.table))
    }

    /// The configuration of this pass.
    pub fn config(&self) -> &StreamConfig {
        self.config
    }

    fn check_field(&mut self, kind: FieldKind) -> Result<(), LoadError> {
        if !self.config.check_schema {
            return Ok(());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.advance(kind)?;
        }
        Ok(())
    }

    /// Resolves one reference: null, an already built instance, or a new object.
    fn read_object(&mut self) -> Result<Option<ObjectSlot>, LoadError> {
        let raw = self.decoder.read_u32()?;
        let Some(id) = SerialId::from_raw(raw) else {
            return Ok(None);
        };
        if let Some(slot) = self.table.get(id) {
            log::trace!("GraphReader: alias {id}.");
            return Ok(Some(slot.clone()));
        }

        let expected = self.table.next_id();
        if raw != expected {
            return Err(StreamFault::UnexpectedSerialId {
                found: raw,
                expected,
            }
            .into());
        }

        let tag = self.decoder.read_string(self.config.max_string_len)?;
        if self.frames.len() >= self.config.max_depth {
            return Err(LoadError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        let slot = self.registry.construct(&tag)?;
        log::trace!("GraphReader: object {id} `{tag}`.");

        // Registered before `load` so that references back to this object,
        // met while its own fields are read, resolve to it.
        self.table.insert(slot.clone());

        let mut object = slot
            .object()
            .try_borrow_mut()
            .map_err(|_| LoadError::Busy { tag: tag.clone() })?;
        self.frames
            .push(SchemaCursor::new(slot.tag(), object.schema()));
        let result = object.load(self);
        let frame = self.frames.pop();
        result?;

        if self.config.check_schema {
            if let Some(frame) = frame {
                frame.finish()?;
            }
        }
        drop(object);
        Ok(Some(slot))
    }

    /// Reads an owning or shared reference to a `T`.
    ///
    /// Every reference to the same serial id yields the same instance.
    pub fn read_ref<T: Streamable>(&mut self) -> Result<Option<Shared<T>>, LoadError> {
        self.check_field(FieldKind::Ref)?;
        self.read_object()?.map(|slot| downcast(&slot)).transpose()
    }

    /// Type-erased form of [`GraphReader::read_ref`].
    pub fn read_ref_dyn(&mut self) -> Result<Option<SharedDyn>, LoadError> {
        self.check_field(FieldKind::Ref)?;
        Ok(self.read_object()?.map(ObjectSlot::into_object))
    }

    /// Reads a weak back reference.
    ///
    /// The stream holds a target only if the reference's holder was the root of
    /// the save pass; otherwise this yields `None`. Nothing is relinked here:
    /// restoring back references after a load is up to the caller.
    pub fn read_weak<T: Streamable>(&mut self) -> Result<Option<Shared<T>>, LoadError> {
        self.check_field(FieldKind::WeakRef)?;
        self.read_object()?.map(|slot| downcast(&slot)).transpose()
    }

    /// Reads a counted sequence of references, preserving order.
    pub fn read_refs<T: Streamable>(&mut self) -> Result<Vec<Shared<T>>, LoadError> {
        self.check_field(FieldKind::RefSeq)?;
        let count = self.decoder.read_count(self.config.max_sequence_len)?;
        let mut targets = Vec::with_capacity(count.min(1024) as usize);
        for index in 0..count {
            let slot = self
                .read_object()?
                .ok_or(StreamFault::NullElement { index })?;
            targets.push(downcast(&slot)?);
        }
        Ok(targets)
    }

    /// Type-erased form of [`GraphReader::read_refs`].
    pub fn read_refs_dyn(&mut self) -> Result<Vec<SharedDyn>, LoadError> {
        self.check_field(FieldKind::RefSeq)?;
        let count = self.decoder.read_count(self.config.max_sequence_len)?;
        let mut targets = Vec::with_capacity(count.min(1024) as usize);
        for index in 0..count {
            let slot = self
                .read_object()?
                .ok_or(StreamFault::NullElement { index })?;
            targets.push(slot.into_object());
        }
        Ok(targets)
    }

    /// Reads a counted sequence of optional references, preserving order.
    ///
    /// Unlike [`GraphReader::read_refs`], null elements are kept as `None`.
    pub fn read_opt_refs<T: Streamable>(&mut self) -> Result<Vec<Option<Shared<T>>>, LoadError> {
        self.check_field(FieldKind::RefSeq)?;
        let count = self.decoder.read_count(self.config.max_sequence_len)?;
        let mut targets = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            targets.push(self.read_object()?.map(|slot| downcast(&slot)).transpose()?);
        }
        Ok(targets)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, LoadError> {
        self.check_field(FieldKind::Str)?;
        self.decoder.read_string(self.config.max_string_len)
    }

    /// Reads a length-prefixed blob.
    ///
    /// A zero-length blob yields `None`; the returned buffer belongs to the caller.
    pub fn read_blob(&mut self) -> Result<Option<Vec<u8>>, LoadError> {
        self.check_field(FieldKind::Blob)?;
        self.decoder.read_blob(self.config.max_blob_len)
    }

    /// Reads a blob written by [`GraphWriter::write_pod_blob`](crate::GraphWriter::write_pod_blob).
    ///
    /// An empty blob yields an empty vector.
    pub fn read_pod_blob<T: Pod>(&mut self) -> Result<Vec<T>, LoadError> {
        let Some(bytes) = self.read_blob()? else {
            return Ok(Vec::new());
        };
        let element_size = std::mem::size_of::<T>();
        if element_size == 0 || bytes.len() % element_size != 0 {
            return Err(StreamFault::MisalignedBlob {
                len: bytes.len() as u32,
                element_size,
            }
            .into());
        }
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Reads a fixed-size plain-old-data value.
    pub fn read_pod<T: Pod>(&mut self) -> Result<T, LoadError> {
        self.check_field(FieldKind::Pod(std::mem::size_of::<T>()))?;
        self.decoder.read_pod()
    }

    /// Reads a `bool` stored as one byte.
    pub fn read_bool(&mut self) -> Result<bool, LoadError> {
        self.check_field(FieldKind::Bool)?;
        self.decoder.read_bool()
    }
}

macro_rules! read_scalars {
    ($($name:ident: $ty:ty => $kind:ident),* $(,)?) => {
        impl GraphReader<'_> {
            $(
                #[doc = concat!("Reads a little-endian `", stringify!($ty), "`.")]
                pub fn $name(&mut self) -> Result<$ty, LoadError> {
                    self.check_field(FieldKind::$kind)?;
                    self.decoder.$name()
                }
            )*
        }
    };
}

read_scalars! {
    read_u8: u8 => U8,
    read_u16: u16 => U16,
    read_u32: u32 => U32,
    read_u64: u64 => U64,
    read_i8: i8 => I8,
    read_i16: i16 => I16,
    read_i32: i32 => I32,
    read_i64: i64 => I64,
    read_f32: f32 => F32,
    read_f64: f64 => F64,
}

fn downcast<T: Streamable>(slot: &ObjectSlot) -> Result<Shared<T>, LoadError> {
    slot.downcast::<T>().ok_or_else(|| LoadError::TypeMismatch {
        expected: type_name::<T>(),
        found: slot.tag().to_string(),
    })
}

fn collect(table: ReadTable) -> Vec<SharedDyn> {
    table
        .into_slots()
        .into_iter()
        .map(ObjectSlot::into_object)
        .collect()
}

/// Loads a graph whose root is a `T` from a byte slice.
pub fn load_from_slice<T: Streamable>(
    bytes: &[u8],
    registry: &TypeRegistry,
    config: &StreamConfig,
) -> Result<LoadedGraph<T>, LoadError> {
    let mut cursor = bytes;
    GraphReader::load(&mut cursor, registry, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use crate::streamable::shared;
    use crate::{save_to_vec, GraphWriter, SaveError, SchemaError, Streamable};

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Leaf")]
    struct Leaf {
        value: u32,
        label: String,
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Pair")]
    struct Pair {
        left: Option<Shared<Leaf>>,
        right: Option<Shared<Leaf>>,
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Loop")]
    struct Loop {
        myself: Option<Shared<Loop>>,
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Node")]
    struct Node {
        name: String,
        children: Vec<Shared<Node>>,
        parent: Weak<RefCell<Node>>,
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.List")]
    struct List {
        items: Vec<Shared<Leaf>>,
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Slots")]
    struct Slots {
        items: Vec<Option<Shared<Leaf>>>,
    }

    /// Reads its fields in another order than it writes them.
    #[derive(Default)]
    struct Swapped {
        a: u32,
        b: u8,
    }

    impl Streamable for Swapped {
        fn type_tag(&self) -> &'static str {
            "test.Swapped"
        }

        fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
            writer.write_u32(self.a)?;
            writer.write_u8(self.b)
        }

        fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError> {
            self.b = reader.read_u8()?;
            self.a = reader.read_u32()?;
            Ok(())
        }

        fn schema(&self) -> Option<&'static [FieldKind]> {
            Some(&[FieldKind::U32, FieldKind::U8])
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Leaf>();
        registry.register::<Pair>();
        registry.register::<Loop>();
        registry.register::<Node>();
        registry.register::<List>();
        registry.register::<Slots>();
        registry.register_with("test.Swapped", Swapped::default);
        registry
    }

    fn checked() -> StreamConfig {
        StreamConfig {
            check_schema: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_leaf_round_trip() {
        let leaf = shared(Leaf {
            value: 7,
            label: "seven".to_string(),
        });
        let bytes = save_to_vec(&leaf, &checked()).unwrap();
        let loaded = load_from_slice::<Leaf>(&bytes, &registry(), &checked()).unwrap();

        assert_eq!(loaded.len(), 1);
        let leaf = loaded.root().borrow();
        assert_eq!(leaf.value, 7);
        assert_eq!(leaf.label, "seven");
    }

    #[test]
    fn test_sharing_is_preserved() {
        let leaf = shared(Leaf::default());
        let pair = shared(Pair {
            left: Some(leaf.clone()),
            right: Some(leaf),
        });
        let bytes = save_to_vec(&pair, &checked()).unwrap();
        let loaded = load_from_slice::<Pair>(&bytes, &registry(), &checked()).unwrap();

        let pair = loaded.root().borrow();
        let left = pair.left.as_ref().unwrap();
        let right = pair.right.as_ref().unwrap();
        assert!(Rc::ptr_eq(left, right));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_distinct_objects_stay_distinct() {
        let pair = shared(Pair {
            left: Some(shared(Leaf::default())),
            right: Some(shared(Leaf::default())),
        });
        let bytes = save_to_vec(&pair, &checked()).unwrap();
        let loaded = load_from_slice::<Pair>(&bytes, &registry(), &checked()).unwrap();

        let pair = loaded.root().borrow();
        assert!(!Rc::ptr_eq(
            pair.left.as_ref().unwrap(),
            pair.right.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_self_reference_resolves_to_same_instance() {
        let looped = shared(Loop::default());
        looped.borrow_mut().myself = Some(looped.clone());
        let bytes = save_to_vec(&looped, &checked()).unwrap();
        looped.borrow_mut().myself = None;

        let loaded = load_from_slice::<Loop>(&bytes, &registry(), &checked()).unwrap();
        let root = loaded.root().clone();
        let myself = root.borrow().myself.clone().unwrap();
        assert!(Rc::ptr_eq(&root, &myself));
        root.borrow_mut().myself = None;
    }

    #[test]
    fn test_weak_parent_of_non_root_is_null() {
        let root = shared(Node::default());
        let child = shared(Node {
            name: "child".to_string(),
            children: Vec::new(),
            parent: Rc::downgrade(&root),
        });
        root.borrow_mut().children.push(child);

        let bytes = save_to_vec(&root, &checked()).unwrap();
        let loaded = load_from_slice::<Node>(&bytes, &registry(), &checked()).unwrap();
        let root = loaded.root().borrow();
        assert!(root.children[0].borrow().parent.upgrade().is_none());
    }

    #[test]
    fn test_weak_parent_of_root_is_kept_alive() {
        let top = shared(Node {
            name: "top".to_string(),
            ..Default::default()
        });
        let inner = shared(Node {
            name: "inner".to_string(),
            children: Vec::new(),
            parent: Rc::downgrade(&top),
        });
        top.borrow_mut().children.push(inner.clone());

        let bytes = save_to_vec(&inner, &checked()).unwrap();
        let loaded = load_from_slice::<Node>(&bytes, &registry(), &checked()).unwrap();
        assert_eq!(loaded.len(), 2);

        let inner = loaded.root().borrow();
        let top = inner.parent.upgrade().expect("parent is retained by the graph");
        assert_eq!(top.borrow().name, "top");
        assert!(Rc::ptr_eq(&top.borrow().children[0], loaded.root()));
    }

    #[test]
    fn test_unknown_type() {
        let leaf = shared(Leaf::default());
        let bytes = save_to_vec(&leaf, &checked()).unwrap();
        let err = load_from_slice::<Leaf>(&bytes, &TypeRegistry::new(), &checked()).unwrap_err();
        assert!(matches!(err, LoadError::UnknownType(tag) if tag == "test.Leaf"));
    }

    #[test]
    fn test_type_mismatch() {
        let leaf = shared(Leaf::default());
        let bytes = save_to_vec(&leaf, &checked()).unwrap();
        let err = load_from_slice::<Pair>(&bytes, &registry(), &checked()).unwrap_err();
        assert!(matches!(err, LoadError::TypeMismatch { found, .. } if found == "test.Leaf"));
    }

    #[test]
    fn test_null_root() {
        let mut bytes = StreamHeader::CURRENT.to_bytes().to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let err = load_from_slice::<Leaf>(&bytes, &registry(), &checked()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CorruptStream(StreamFault::NullRoot)
        ));
    }

    #[test]
    fn test_out_of_order_serial_id() {
        let mut bytes = StreamHeader::CURRENT.to_bytes().to_vec();
        bytes.extend_from_slice(&5u32.to_le_bytes());
        let err = load_from_slice::<Leaf>(&bytes, &registry(), &checked()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CorruptStream(StreamFault::UnexpectedSerialId {
                found: 5,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let leaf = shared(Leaf {
            value: 1,
            label: "truncate me".to_string(),
        });
        let bytes = save_to_vec(&leaf, &checked()).unwrap();
        for cut in [0, 3, StreamHeader::SIZE + 2, bytes.len() - 1] {
            let err = load_from_slice::<Leaf>(&bytes[..cut], &registry(), &checked()).unwrap_err();
            assert!(
                matches!(err, LoadError::CorruptStream(StreamFault::Truncated)),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn test_schema_mismatch_on_load() {
        let bytes = save_to_vec(&shared(Swapped { a: 1, b: 2 }), &checked()).unwrap();
        let err = load_from_slice::<Swapped>(&bytes, &registry(), &checked()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaError::Mismatch {
                tag: "test.Swapped",
                index: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_load_dyn() {
        let leaf = shared(Leaf::default());
        let bytes = save_to_vec(&leaf, &checked()).unwrap();
        let mut cursor = bytes.as_slice();
        let registry = registry();
        let config = checked();
        let loaded = GraphReader::load_dyn(&mut cursor, &registry, &config).unwrap();
        assert_eq!(loaded.root().borrow().type_tag(), "test.Leaf");
    }

    #[test]
    fn test_loaded_graph_debug() {
        let bytes = save_to_vec(&shared(Leaf::default()), &checked()).unwrap();
        let loaded = load_from_slice::<Leaf>(&bytes, &registry(), &checked()).unwrap();
        let text = format!("{loaded:?}");
        assert!(text.contains("test.Leaf"));
        assert!(text.contains("objects: 1"));
    }

    #[test]
    fn test_depth_limit_on_load() {
        let root = shared(Node::default());
        let mut tip = root.clone();
        for _ in 0..10 {
            let next = shared(Node::default());
            tip.borrow_mut().children.push(next.clone());
            tip = next;
        }
        let bytes = save_to_vec(&root, &checked()).unwrap();

        let shallow = StreamConfig {
            max_depth: 3,
            ..checked()
        };
        let err = load_from_slice::<Node>(&bytes, &registry(), &shallow).unwrap_err();
        assert!(matches!(err, LoadError::DepthExceeded { limit: 3 }));

        let loaded = load_from_slice::<Node>(&bytes, &registry(), &checked()).unwrap();
        assert_eq!(loaded.len(), 11);
    }

    #[test]
    fn test_optional_sequence_keeps_nulls() {
        let leaf = shared(Leaf::default());
        let slots = shared(Slots {
            items: vec![None, Some(leaf.clone()), Some(leaf)],
        });
        let mut bytes = Vec::new();
        let stats = GraphWriter::save(&mut bytes, &checked(), &slots).unwrap();
        assert_eq!(stats.nulls, 1);
        assert_eq!(stats.aliases, 1);

        let loaded = load_from_slice::<Slots>(&bytes, &registry(), &checked()).unwrap();
        let slots = loaded.root().borrow();
        assert_eq!(slots.items.len(), 3);
        assert!(slots.items[0].is_none());
        assert!(Rc::ptr_eq(
            slots.items[1].as_ref().unwrap(),
            slots.items[2].as_ref().unwrap()
        ));
    }

    #[test]
    fn test_null_element_in_strict_sequence() {
        let slots = shared(Slots {
            items: vec![None, Some(shared(Leaf::default()))],
        });
        let bytes = save_to_vec(&slots, &checked()).unwrap();

        // Same wire layout, read back through the non-null sequence type.
        let mut registry = registry();
        registry.register_with("test.Slots", List::default);
        let err = load_from_slice::<List>(&bytes, &registry, &checked()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CorruptStream(StreamFault::NullElement { index: 0 })
        ));
    }

    #[test]
    fn test_pod_blob_round_trip_and_misalignment() {
        #[derive(Default)]
        struct Buffer {
            values: Vec<u32>,
            raw: Vec<u8>,
        }

        impl Streamable for Buffer {
            fn type_tag(&self) -> &'static str {
                "test.Buffer"
            }

            fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
                writer.write_pod_blob(&self.values)?;
                writer.write_blob(&self.raw)
            }

            fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError> {
                self.values = reader.read_pod_blob()?;
                self.raw = reader.read_pod_blob()?;
                Ok(())
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register_with("test.Buffer", Buffer::default);

        let buffer = shared(Buffer {
            values: vec![1, 2, 3],
            raw: Vec::new(),
        });
        let bytes = save_to_vec(&buffer, &checked()).unwrap();
        let loaded = load_from_slice::<Buffer>(&bytes, &registry, &checked()).unwrap();
        assert_eq!(loaded.root().borrow().values, vec![1, 2, 3]);
        assert!(loaded.root().borrow().raw.is_empty());

        // Three bytes cannot hold whole `u32`s.
        let odd = shared(Buffer {
            values: Vec::new(),
            raw: vec![1, 2, 3],
        });
        let bytes = save_to_vec(&odd, &checked()).unwrap();

        #[derive(Default)]
        struct Words(Vec<u32>);

        impl Streamable for Words {
            fn type_tag(&self) -> &'static str {
                "test.Buffer"
            }

            fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
                writer.write_pod_blob(&self.0)
            }

            fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError> {
                self.0 = reader.read_pod_blob()?;
                self.0 = reader.read_pod_blob()?;
                Ok(())
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register_with("test.Buffer", Words::default);
        let err = load_from_slice::<Words>(&bytes, &registry, &checked()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CorruptStream(StreamFault::MisalignedBlob {
                len: 3,
                element_size: 4
            })
        ));
    }
}
