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

//! The contract every persistable type implements.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{LoadError, SaveError};
use crate::reader::GraphReader;
use crate::schema::FieldKind;
use crate::writer::GraphWriter;

/// A shared, mutable graph node: the type of owning and shared edges.
pub type Shared<T> = Rc<RefCell<T>>;

/// A type-erased [`Shared`] object.
pub type SharedDyn = Rc<RefCell<dyn Streamable>>;

/// Wraps a value into a fresh [`Shared`] node.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Associates a concrete type with its stable type tag.
///
/// The tag is written in front of every first-sighting object and is the key
/// under which the type's factory lives in a [`TypeRegistry`](crate::TypeRegistry).
/// It must stay the same across releases for existing streams to load.
pub trait TypeTagged {
    /// The stable tag, e.g. `"scene.Mesh"`.
    const TYPE_TAG: &'static str;
}

/// The persistence capability.
///
/// `save` and `load` must visit the same fields in the same order: the stream
/// holds no per-field markers. Object-shaped fields go through the reference
/// operations of the writer and reader rather than being written inline, so
/// that sharing and back references survive the round trip.
///
/// On any `load` error the instance is discarded by the caller; `load` does not
/// have to leave it in a consistent state.
///
/// Most types derive this trait together with [`TypeTagged`]:
///
/// ```
/// use mnema_core::{Shared, Streamable};
///
/// #[derive(Default, Streamable)]
/// #[stream(tag = "doc.Sprite")]
/// struct Sprite {
///     name: String,
///     layer: u32,
///     atlas: Option<Shared<Atlas>>,
/// }
///
/// #[derive(Default, Streamable)]
/// #[stream(tag = "doc.Atlas")]
/// struct Atlas {
///     pixels: Vec<u8>,
/// }
/// ```
pub trait Streamable: Any {
    /// The tag of the concrete type, equal to its [`TypeTagged::TYPE_TAG`].
    fn type_tag(&self) -> &'static str;

    /// Writes this object's fields.
    fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError>;

    /// Reads this object's fields into a default-constructed instance.
    fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError>;

    /// The declared field order, checked while streaming when enabled.
    fn schema(&self) -> Option<&'static [FieldKind]> {
        None
    }
}
