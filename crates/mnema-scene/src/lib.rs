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

//! # Mnema Scene
//!
//! Scene graph types persisted through `mnema-core`.
//!
//! Every type here is a plain struct that derives (or hand-writes)
//! `Streamable`, so the crate doubles as the reference collaborator for the
//! persistence core: textures carry blobs, meshes carry pod buffers, materials
//! and meshes are shared between nodes, and nodes hold owning children plus a
//! weak back reference to their parent.

#![warn(missing_docs)]

pub mod animation;
pub mod light;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod texture;

pub use animation::{AnimationClip, AnimationTrack, Keyframe, TrackChannel};
pub use light::{Light, LightKind};
pub use material::Material;
pub use mesh::{Aabb, Mesh, Vertex};
pub use node::{relink_parents, SceneNode, Transform};
pub use scene::{scene_registry, Scene};
pub use texture::Texture;
