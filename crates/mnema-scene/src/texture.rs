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

//! Defines the texture asset.

use mnema_core::Streamable;

/// An RGBA8 image.
///
/// `pixels` may be empty for a texture whose pixel data lives elsewhere (a
/// streamed or GPU-only texture); it is then written as an empty blob and
/// comes back empty.
#[derive(Debug, Clone, Default, PartialEq, Streamable)]
#[stream(tag = "scene.Texture", register)]
pub struct Texture {
    /// A human-readable name for debugging.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Bytes per pixel of the RGBA8 layout.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Creates a texture from its pixel data.
    pub fn new(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            pixels,
        }
    }

    /// Creates a texture whose pixels are not kept in memory.
    pub fn placeholder(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(name, width, height, Vec::new())
    }

    /// Returns `true` if the pixel data is held in memory.
    pub fn is_resident(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Returns `true` if `pixels` is empty or matches `width * height` RGBA8 pixels.
    pub fn is_consistent(&self) -> bool {
        !self.is_resident()
            || self.pixels.len() == self.width as usize * self.height as usize * Self::BYTES_PER_PIXEL
    }
}
