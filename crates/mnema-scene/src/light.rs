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

//! Defines the light source type.
//!
//! `Light` implements `Streamable` by hand: its kind is stored as a tag byte
//! that has to be validated on load, which the derive cannot express.

use mnema_core::{
    FieldKind, GraphReader, GraphWriter, LoadError, SaveError, Streamable, TypeRegistration,
    TypeTagged,
};

/// The shape of a light source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum LightKind {
    /// A light infinitely far away, lighting along its node's forward axis.
    #[default]
    Directional = 0,
    /// A light emitting in all directions from its node's position.
    Point = 1,
    /// A cone of light along its node's forward axis.
    Spot = 2,
}

impl LightKind {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Directional),
            1 => Some(Self::Point),
            2 => Some(Self::Spot),
            _ => None,
        }
    }
}

/// A light source attached to a scene node.
///
/// The node's transform provides the light's position and orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// The shape of the light.
    pub kind: LightKind,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity in lumens (point, spot) or lux (directional).
    pub intensity: f32,
    /// Attenuation range; ignored by directional lights.
    pub range: f32,
    /// Whether the light is currently active.
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::default(),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            range: 10.0,
            enabled: true,
        }
    }
}

impl Light {
    /// Creates a new enabled light of the given kind.
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Creates a new directional light (sun-like).
    pub fn directional() -> Self {
        Self::new(LightKind::Directional)
    }

    /// Creates a new point light.
    pub fn point() -> Self {
        Self::new(LightKind::Point)
    }

    /// Creates a new spot light.
    pub fn spot() -> Self {
        Self::new(LightKind::Spot)
    }
}

const LIGHT_SCHEMA: &[FieldKind] = &[
    FieldKind::U8,
    FieldKind::Pod(12),
    FieldKind::F32,
    FieldKind::F32,
    FieldKind::Bool,
];

impl TypeTagged for Light {
    const TYPE_TAG: &'static str = "scene.Light";
}

impl Streamable for Light {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn save(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_u8(self.kind as u8)?;
        writer.write_pod(&self.color)?;
        writer.write_f32(self.intensity)?;
        writer.write_f32(self.range)?;
        writer.write_bool(self.enabled)
    }

    fn load(&mut self, reader: &mut GraphReader<'_>) -> Result<(), LoadError> {
        let raw = reader.read_u8()?;
        self.kind = LightKind::from_u8(raw)
            .ok_or_else(|| LoadError::custom(format!("invalid light kind {raw}")))?;
        self.color = reader.read_pod()?;
        self.intensity = reader.read_f32()?;
        self.range = reader.read_f32()?;
        self.enabled = reader.read_bool()?;
        Ok(())
    }

    fn schema(&self) -> Option<&'static [FieldKind]> {
        Some(LIGHT_SCHEMA)
    }
}

mnema_core::inventory::submit! {
    TypeRegistration::of::<Light>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnema_core::{load_from_slice, save_to_vec, shared, StreamConfig, TypeRegistry};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Light>();
        registry
    }

    #[test]
    fn test_light_default() {
        let light = Light::default();
        assert!(light.enabled);
        assert_eq!(light.kind, LightKind::Directional);
    }

    #[test]
    fn test_light_constructors() {
        assert_eq!(Light::point().kind, LightKind::Point);
        assert_eq!(Light::spot().kind, LightKind::Spot);
        assert!(Light::spot().enabled);
    }

    #[test]
    fn test_light_round_trip_with_schema_check() {
        let config = StreamConfig {
            check_schema: true,
            ..Default::default()
        };
        let light = shared(Light {
            kind: LightKind::Spot,
            color: [1.0, 0.8, 0.6],
            intensity: 800.0,
            range: 25.0,
            enabled: false,
        });
        let bytes = save_to_vec(&light, &config).unwrap();
        let loaded = load_from_slice::<Light>(&bytes, &registry(), &config).unwrap();
        assert_eq!(*loaded.root().borrow(), *light.borrow());
    }

    #[test]
    fn test_invalid_kind_is_rejected() {
        let config = StreamConfig::default();
        let mut bytes = save_to_vec(&shared(Light::point()), &config).unwrap();
        // header (6) + serial id (4) + tag length (4) + tag, then the kind byte.
        let kind_at = 6 + 4 + 4 + Light::TYPE_TAG.len();
        assert_eq!(bytes[kind_at], LightKind::Point as u8);
        bytes[kind_at] = 7;

        let err = load_from_slice::<Light>(&bytes, &registry(), &config).unwrap_err();
        assert!(matches!(err, LoadError::Other(_)));
        assert!(err.to_string().contains("invalid light kind 7"));
    }
}
