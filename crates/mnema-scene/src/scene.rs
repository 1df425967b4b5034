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

//! The scene root and its file entry points.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use mnema_core::{
    GraphReader, GraphWriter, LoadError, LoadedGraph, PassStats, SaveError, Shared, StreamConfig,
    Streamable, TypeRegistry,
};

use crate::animation::{AnimationClip, AnimationTrack};
use crate::light::Light;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::node::{relink_parents, SceneNode};
use crate::texture::Texture;

/// Builds a registry holding every type of this crate.
pub fn scene_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<Scene>();
    registry.register::<SceneNode>();
    registry.register::<Mesh>();
    registry.register::<Material>();
    registry.register::<Texture>();
    registry.register::<Light>();
    registry.register::<AnimationClip>();
    registry.register::<AnimationTrack>();
    registry
}

/// A complete scene: the top-level nodes plus the assets and clips that
/// belong to it.
///
/// `materials` is a library of materials kept with the scene even when no
/// mesh uses them yet.
#[derive(Debug, Default, Streamable)]
#[stream(tag = "scene.Scene", register)]
pub struct Scene {
    /// A human-readable name for debugging.
    pub name: String,
    /// Top-level nodes.
    pub roots: Vec<Shared<SceneNode>>,
    /// Animation clips.
    pub clips: Vec<Shared<AnimationClip>>,
    /// The material library.
    pub materials: Vec<Shared<Material>>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Total number of nodes in the hierarchy.
    pub fn node_count(&self) -> usize {
        self.roots
            .iter()
            .map(|root| 1 + SceneNode::descendants(root).len())
            .sum()
    }

    /// Finds the first node named `name` under any root.
    pub fn find(&self, name: &str) -> Option<Shared<SceneNode>> {
        self.roots.iter().find_map(|root| SceneNode::find(root, name))
    }

    /// Writes `scene` and everything it reaches to `sink`.
    pub fn save(
        scene: &Shared<Scene>,
        sink: &mut dyn Write,
        config: &StreamConfig,
    ) -> Result<PassStats, SaveError> {
        let stats = GraphWriter::save(sink, config, scene)?;
        log::info!(
            "Saved scene `{}`: {} objects, {} bytes.",
            scene.borrow().name,
            stats.objects,
            stats.bytes
        );
        Ok(stats)
    }

    /// Reads a scene written by [`Scene::save`] and restores the parent links
    /// of its hierarchy.
    pub fn load(
        source: &mut dyn Read,
        config: &StreamConfig,
    ) -> Result<LoadedGraph<Scene>, LoadError> {
        let registry = scene_registry();
        Self::load_with(source, &registry, config)
    }

    /// Like [`Scene::load`], with a caller-provided registry.
    pub fn load_with(
        source: &mut dyn Read,
        registry: &TypeRegistry,
        config: &StreamConfig,
    ) -> Result<LoadedGraph<Scene>, LoadError> {
        let graph = GraphReader::load::<Scene>(source, registry, config)?;
        let scene = graph.root().borrow();
        for root in &scene.roots {
            relink_parents(root);
        }
        log::info!("Loaded scene `{}`: {} objects.", scene.name, graph.len());
        drop(scene);
        Ok(graph)
    }

    /// Saves `scene` to a file, replacing it.
    pub fn save_file(
        scene: &Shared<Scene>,
        path: impl AsRef<Path>,
        config: &StreamConfig,
    ) -> Result<PassStats, SaveError> {
        let mut sink = BufWriter::new(File::create(path)?);
        let stats = Self::save(scene, &mut sink, config)?;
        sink.flush()?;
        Ok(stats)
    }

    /// Loads a scene from a file.
    pub fn load_file(
        path: impl AsRef<Path>,
        config: &StreamConfig,
    ) -> Result<LoadedGraph<Scene>, LoadError> {
        let mut source = BufReader::new(File::open(path)?);
        Self::load(&mut source, config)
    }
}
