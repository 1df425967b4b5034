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

//! Defines the PBR material asset.

use mnema_core::{Shared, Streamable};

use crate::texture::Texture;

/// A metallic-roughness material.
///
/// Texture slots are shared references: many materials commonly point at the
/// same texture, and a save pass writes each texture once.
#[derive(Debug, Clone, Streamable)]
#[stream(tag = "scene.Material", register)]
pub struct Material {
    /// A human-readable name for debugging.
    pub name: String,
    /// Linear RGBA base color, multiplied with the albedo texture.
    pub base_color: [f32; 4],
    /// Metalness factor in `[0, 1]`.
    pub metallic: f32,
    /// Roughness factor in `[0, 1]`.
    pub roughness: f32,
    /// Optional albedo map.
    pub albedo: Option<Shared<Texture>>,
    /// Optional tangent-space normal map.
    pub normal_map: Option<Shared<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            albedo: None,
            normal_map: None,
        }
    }
}

impl Material {
    /// Creates an untextured material with the given base color.
    pub fn new(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color,
            ..Default::default()
        }
    }

    /// Sets the albedo map.
    pub fn with_albedo(mut self, texture: Shared<Texture>) -> Self {
        self.albedo = Some(texture);
        self
    }

    /// Sets the normal map.
    pub fn with_normal_map(mut self, texture: Shared<Texture>) -> Self {
        self.normal_map = Some(texture);
        self
    }
}
