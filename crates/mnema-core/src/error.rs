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

//! Defines the error types of the persistence system.
//!
//! Every failure is fatal to the pass it occurs in: nothing is retried and no
//! partially built graph is handed back. A collaborator's own failures travel
//! through the `Other` variants unchanged.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::schema::FieldKind;

/// A structural defect in an input stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamFault {
    /// The stream does not start with the Mnema magic number.
    #[error("bad magic number {found:#010x}")]
    BadMagic {
        /// The value found in place of the magic number.
        found: u32,
    },
    /// The stream was written with a different layout version.
    #[error("unsupported format version {found}")]
    UnsupportedVersion {
        /// The version found in the header.
        found: u16,
    },
    /// The stream ended in the middle of a value.
    #[error("stream ended unexpectedly")]
    Truncated,
    /// A string field does not hold valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    /// A declared length exceeds the configured limit.
    #[error("{what} length {len} exceeds the limit of {limit}")]
    LengthLimit {
        /// What kind of value carried the length.
        what: &'static str,
        /// The declared length.
        len: u32,
        /// The configured limit.
        limit: u32,
    },
    /// A first-sighting id that does not follow the previous one.
    #[error("unexpected serial id {found} (next expected id is {expected})")]
    UnexpectedSerialId {
        /// The id found in the stream.
        found: u32,
        /// The id a new object must carry at this point.
        expected: u32,
    },
    /// A null reference inside a reference sequence.
    #[error("null reference at index {index} of a reference sequence")]
    NullElement {
        /// Position of the null entry.
        index: u32,
    },
    /// A pod buffer whose byte length is not a multiple of its element size.
    #[error("blob of {len} bytes is not a whole number of {element_size}-byte elements")]
    MisalignedBlob {
        /// The blob length in bytes.
        len: u32,
        /// The element size in bytes.
        element_size: usize,
    },
    /// The root reference of the stream is null.
    #[error("stream root is null")]
    NullRoot,
}

/// A violation of a type's declared field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field was written or read with a kind other than the declared one.
    #[error("`{tag}` field {index}: expected {}, found {found}", describe(.expected))]
    Mismatch {
        /// Tag of the type being streamed.
        tag: &'static str,
        /// Position of the offending field.
        index: usize,
        /// The declared kind, `None` past the end of the schema.
        expected: Option<FieldKind>,
        /// The kind actually streamed.
        found: FieldKind,
    },
    /// Fewer fields were streamed than the schema declares.
    #[error("`{tag}` streamed {streamed} of {declared} declared fields")]
    Incomplete {
        /// Tag of the type being streamed.
        tag: &'static str,
        /// Fields actually streamed.
        streamed: usize,
        /// Fields declared by the schema.
        declared: usize,
    },
}

fn describe(kind: &Option<FieldKind>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "end of schema".to_string(),
    }
}

/// An error raised while saving a graph.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A type streamed its fields out of declared order.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The graph nests deeper than `StreamConfig::max_depth`.
    #[error("object nesting exceeds the depth limit of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },
    /// An object was mutably borrowed elsewhere while the pass tried to read it.
    #[error("`{tag}` is already mutably borrowed")]
    Busy {
        /// Tag of the object, when known.
        tag: &'static str,
    },
    /// A value is too long to be described by a `u32` length or exceeds the configured limit.
    #[error("{what} of length {len} exceeds the limit of {limit}")]
    LengthLimit {
        /// What kind of value was being written.
        what: &'static str,
        /// Its length.
        len: usize,
        /// The configured limit.
        limit: u32,
    },
    /// More objects than fit into the `u32` id space.
    #[error("serial id space exhausted")]
    IdOverflow,
    /// A failure raised by a type's own `save` logic.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SaveError {
    /// Builds a collaborator-defined save failure.
    pub fn custom(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }
}

/// An error raised while loading a graph.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The stream names a type tag that is not registered.
    #[error("unknown type tag `{0}`")]
    UnknownType(String),
    /// The stream is malformed.
    #[error("corrupt stream: {0}")]
    CorruptStream(#[from] StreamFault),
    /// A reference resolved to an instance of another type.
    #[error("expected an instance of `{expected}`, found `{found}`")]
    TypeMismatch {
        /// The Rust type the caller asked for.
        expected: &'static str,
        /// The tag of the instance the reference points at.
        found: String,
    },
    /// A type consumed its fields out of declared order.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The stream nests deeper than `StreamConfig::max_depth`.
    #[error("object nesting exceeds the depth limit of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },
    /// A freshly constructed object was already borrowed while being loaded.
    #[error("`{tag}` is already borrowed")]
    Busy {
        /// Tag of the object.
        tag: String,
    },
    /// The underlying source failed for a reason other than running out of bytes.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// A failure raised by a type's own `load` logic.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoadError {
    /// Builds a collaborator-defined load failure.
    pub fn custom(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            LoadError::CorruptStream(StreamFault::Truncated)
        } else {
            LoadError::Io(err)
        }
    }
}

/// An error raised while populating a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The tag is already bound to a factory.
    #[error("type tag `{0}` is already registered")]
    DuplicateTag(String),
}
