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

//! Defines indexed triangle meshes and their vertex layout.

use bytemuck::{Pod, Zeroable};
use mnema_core::{Shared, Streamable};

use crate::material::Material;

/// The interleaved vertex layout of a [`Mesh`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Creates a vertex.
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// The minimum corner.
    pub min: [f32; 3],
    /// The maximum corner.
    pub max: [f32; 3],
}

/// An indexed triangle list.
///
/// Vertex and index buffers are streamed as raw pod blobs. The cached bounds
/// are not persisted; they are recomputed on demand after a load.
#[derive(Debug, Clone, Default, Streamable)]
#[stream(tag = "scene.Mesh", register)]
pub struct Mesh {
    /// A human-readable name for debugging.
    pub name: String,
    /// The vertex buffer.
    #[stream(pod_buffer)]
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`, three per triangle.
    #[stream(pod_buffer)]
    pub indices: Vec<u32>,
    /// The material used to shade the whole mesh.
    pub material: Option<Shared<Material>>,
    #[stream(skip)]
    bounds: Option<Aabb>,
}

impl Mesh {
    /// Creates a mesh without a material.
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            material: None,
            bounds: None,
        }
    }

    /// Sets the material.
    pub fn with_material(mut self, material: Shared<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// A single upward-facing quad made of two triangles.
    pub fn quad(name: impl Into<String>, half_extent: f32) -> Self {
        let h = half_extent;
        let up = [0.0, 1.0, 0.0];
        Self::new(
            name,
            vec![
                Vertex::new([-h, 0.0, -h], up, [0.0, 0.0]),
                Vertex::new([h, 0.0, -h], up, [1.0, 0.0]),
                Vertex::new([h, 0.0, h], up, [1.0, 1.0]),
                Vertex::new([-h, 0.0, h], up, [0.0, 1.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// Number of complete triangles in the index buffer.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if every index points into the vertex buffer.
    pub fn indices_in_range(&self) -> bool {
        self.indices
            .iter()
            .all(|&index| (index as usize) < self.vertices.len())
    }

    /// The bounds of the vertex positions, computed on first use.
    ///
    /// Returns `None` for a mesh without vertices.
    pub fn bounds(&mut self) -> Option<Aabb> {
        if self.bounds.is_none() {
            self.bounds = compute_bounds(&self.vertices);
        }
        self.bounds
    }

    /// Drops the cached bounds after the vertex buffer changed.
    pub fn invalidate_bounds(&mut self) {
        self.bounds = None;
    }
}

fn compute_bounds(vertices: &[Vertex]) -> Option<Aabb> {
    let (first, rest) = vertices.split_first()?;
    let mut aabb = Aabb {
        min: first.position,
        max: first.position,
    };
    for vertex in rest {
        for axis in 0..3 {
            aabb.min[axis] = aabb.min[axis].min(vertex.position[axis]);
            aabb.max[axis] = aabb.max[axis].max(vertex.position[axis]);
        }
    }
    Some(aabb)
}
