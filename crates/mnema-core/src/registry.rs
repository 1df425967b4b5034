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

//! The tag → factory table used to rebuild objects while loading.
//!
//! A [`TypeRegistry`] is an ordinary value: it is built once (explicitly, from
//! the static [`TypeRegistration`]s gathered by `inventory`, or both) and then
//! lent to every load pass. Nothing is global, so tests can run against
//! independent registries.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{LoadError, RegistryError};
use crate::streamable::{Shared, SharedDyn, Streamable, TypeTagged};

type Factory = Box<dyn Fn() -> ObjectSlot + Send + Sync>;

/// A freshly constructed object, not yet populated by `load`.
///
/// The slot carries the object twice: once type-erased, to drive `load`, and
/// once as the concrete `Shared<T>` so that typed reads can recover it without
/// copying.
#[derive(Clone)]
pub struct ObjectSlot {
    tag: &'static str,
    object: SharedDyn,
    handle: Rc<dyn Any>,
}

impl ObjectSlot {
    /// Wraps an already shared object.
    pub fn from_shared<T: Streamable>(object: Shared<T>) -> Self {
        let tag = object.borrow().type_tag();
        Self {
            tag,
            object: object.clone(),
            handle: Rc::new(object),
        }
    }

    /// Wraps a plain value into a new shared object.
    pub fn new<T: Streamable>(value: T) -> Self {
        Self::from_shared(Rc::new(RefCell::new(value)))
    }

    fn construct_default<T: Streamable + Default>() -> Self {
        Self::new(T::default())
    }

    /// The tag of the contained object.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The type-erased object.
    pub fn object(&self) -> &SharedDyn {
        &self.object
    }

    /// Recovers the concrete object, or `None` if it is not a `T`.
    pub fn downcast<T: Streamable>(&self) -> Option<Shared<T>> {
        self.handle.downcast_ref::<Shared<T>>().cloned()
    }

    pub(crate) fn into_object(self) -> SharedDyn {
        self.object
    }
}

impl fmt::Debug for ObjectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSlot").field("tag", &self.tag).finish()
    }
}

/// A statically submitted registration, gathered by [`TypeRegistry::from_inventory`].
///
/// `#[derive(Streamable)]` emits one of these for types marked
/// `#[stream(register)]`; hand-written types submit their own:
///
/// ```ignore
/// mnema_core::inventory::submit! {
///     mnema_core::TypeRegistration::of::<Light>()
/// }
/// ```
pub struct TypeRegistration {
    tag: &'static str,
    construct: fn() -> ObjectSlot,
}

impl TypeRegistration {
    /// Registration of `T` with its default constructor.
    pub const fn of<T: TypeTagged + Streamable + Default>() -> Self {
        Self {
            tag: T::TYPE_TAG,
            construct: ObjectSlot::construct_default::<T>,
        }
    }

    /// The registered tag.
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

inventory::collect!(TypeRegistration);

/// Maps type tags to the factories that default-construct them.
#[derive(Default)]
pub struct TypeRegistry {
    factories: HashMap<String, Factory>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry holding every statically submitted [`TypeRegistration`].
    ///
    /// Submission order across crates is unspecified. If two registrations share a
    /// tag, which one wins is unspecified too; a warning is logged.
    #[must_use]
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<TypeRegistration> {
            let construct = registration.construct;
            registry.insert(registration.tag.to_string(), Box::new(construct));
        }
        log::debug!(
            "TypeRegistry: collected {} static registrations.",
            registry.len()
        );
        registry
    }

    /// Registers `T` under its [`TypeTagged::TYPE_TAG`] with `T::default` as factory.
    ///
    /// A previous registration of the same tag is replaced.
    pub fn register<T: TypeTagged + Streamable + Default>(&mut self) {
        self.insert(
            T::TYPE_TAG.to_string(),
            Box::new(ObjectSlot::construct_default::<T>),
        );
    }

    /// Registers an arbitrary factory under `tag`.
    ///
    /// A previous registration of the same tag is replaced.
    pub fn register_with<T, F>(&mut self, tag: &str, factory: F)
    where
        T: Streamable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.insert(tag.to_string(), Box::new(move || ObjectSlot::new(factory())));
    }

    /// Registers `T` unless its tag is already taken.
    pub fn try_register<T: TypeTagged + Streamable + Default>(
        &mut self,
    ) -> Result<(), RegistryError> {
        if self.contains(T::TYPE_TAG) {
            return Err(RegistryError::DuplicateTag(T::TYPE_TAG.to_string()));
        }
        self.register::<T>();
        Ok(())
    }

    fn insert(&mut self, tag: String, factory: Factory) {
        if self.factories.insert(tag.clone(), factory).is_some() {
            log::warn!("TypeRegistry: tag `{tag}` registered twice, keeping the latest factory.");
        }
    }

    /// Default-constructs an instance of the type registered under `tag`.
    ///
    /// The instance's fields are not populated; that is the job of `load`.
    pub fn construct(&self, tag: &str) -> Result<ObjectSlot, LoadError> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| LoadError::UnknownType(tag.to_string()))?;
        Ok(factory())
    }

    /// Returns `true` if `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Iterates over the registered tags in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Returns the number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("TypeRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphReader, GraphWriter, SaveError, Streamable};

    #[derive(Default)]
    struct Marker {
        value: u32,
    }

    impl TypeTagged for Marker {
        const TYPE_TAG: &'static str = "test.Marker";
    }

    impl Streamable for Marker {
        fn type_tag(&self) -> &'static str {
            Self::TYPE_TAG
        }

        fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
            writer.write_u32(self.value)
        }

        fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError> {
            self.value = reader.read_u32()?;
            Ok(())
        }
    }

    #[derive(Default, Streamable)]
    #[stream(tag = "test.Registered", register)]
    struct Registered {
        flag: bool,
    }

    #[test]
    fn test_construct_registered_type() {
        let mut registry = TypeRegistry::new();
        registry.register::<Marker>();

        let slot = registry.construct("test.Marker").unwrap();
        assert_eq!(slot.tag(), "test.Marker");
        let marker = slot.downcast::<Marker>().unwrap();
        assert_eq!(marker.borrow().value, 0);
        assert!(Rc::ptr_eq(&(marker as SharedDyn), slot.object()));
    }

    #[test]
    fn test_construct_unknown_tag() {
        let registry = TypeRegistry::new();
        let err = registry.construct("test.Missing").unwrap_err();
        assert!(matches!(err, LoadError::UnknownType(tag) if tag == "test.Missing"));
    }

    #[test]
    fn test_register_overwrites_latest_wins() {
        let mut registry = TypeRegistry::new();
        registry.register::<Marker>();
        registry.register_with("test.Marker", || Marker { value: 7 });

        assert_eq!(registry.len(), 1);
        let marker = registry
            .construct("test.Marker")
            .unwrap()
            .downcast::<Marker>()
            .unwrap();
        assert_eq!(marker.borrow().value, 7);
    }

    #[test]
    fn test_try_register_rejects_duplicates() {
        let mut registry = TypeRegistry::new();
        registry.try_register::<Marker>().unwrap();
        assert_eq!(
            registry.try_register::<Marker>(),
            Err(RegistryError::DuplicateTag("test.Marker".to_string()))
        );
    }

    #[test]
    fn test_downcast_to_wrong_type() {
        let slot = ObjectSlot::new(Marker::default());
        assert!(slot.downcast::<Registered>().is_none());
    }

    #[test]
    fn test_from_inventory_collects_derived_registrations() {
        let registry = TypeRegistry::from_inventory();
        assert!(registry.contains("test.Registered"));
        assert!(!registry.contains("test.Marker"));
    }

    #[test]
    fn test_independent_registries() {
        let mut a = TypeRegistry::new();
        let b = TypeRegistry::default();
        a.register::<Marker>();
        assert!(a.contains("test.Marker"));
        assert!(b.is_empty());
    }
}
