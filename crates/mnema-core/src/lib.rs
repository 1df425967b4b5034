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

//! # Mnema Core
//!
//! Persistence for polymorphic, reference-sharing object graphs.
//!
//! A save pass walks a graph of [`Shared`] objects starting at a root and
//! writes every object once: the first time an object is reached its
//! [`TypeTag`](TypeTagged::TYPE_TAG) and fields are written, every later
//! reference to it is written as its pass-local [`SerialId`] alone. A load pass
//! mirrors this, constructing objects through a [`TypeRegistry`] and handing
//! out the same instance for every reference to the same id.
//!
//! The main pieces:
//! - [`TypeRegistry`]: tag → factory table used while loading.
//! - [`Streamable`]: the contract every persistable type implements.
//! - [`GraphWriter`] / [`GraphReader`]: the orchestrators of a pass, also the
//!   cursor a type's `save`/`load` writes to and reads from.
//! - [`StreamField`]: per-field codec used by `#[derive(Streamable)]`.
//!
//! ## Byte order
//!
//! Scalars are encoded little-endian. Fields marked `#[stream(pod)]` or
//! `#[stream(pod_buffer)]` are copied in host byte order through `bytemuck`,
//! so the crate only builds for little-endian targets; a compile-time
//! assertion rejects big-endian ones.

#![warn(missing_docs)]

extern crate self as mnema_core;

pub mod config;
pub mod error;
pub mod field;
pub mod format;
pub mod registry;
pub mod schema;
pub mod streamable;

mod codec;
mod identity;
mod reader;
mod writer;

pub use config::StreamConfig;
pub use error::{LoadError, RegistryError, SaveError, SchemaError, StreamFault};
pub use field::StreamField;
pub use format::{SerialId, StreamHeader, FORMAT_VERSION, STREAM_MAGIC};
pub use reader::{load_from_slice, GraphReader, LoadedGraph};
pub use registry::{ObjectSlot, TypeRegistration, TypeRegistry};
pub use schema::FieldKind;
pub use streamable::{shared, Shared, SharedDyn, Streamable, TypeTagged};
pub use writer::{save_to_vec, GraphWriter, PassStats};

/// Derives [`Streamable`] and [`TypeTagged`] from a struct's field list.
pub use mnema_macros::Streamable;

#[doc(hidden)]
pub use inventory;
