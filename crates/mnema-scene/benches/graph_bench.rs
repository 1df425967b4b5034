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

use criterion::{criterion_group, criterion_main, Criterion};
use mnema_core::{load_from_slice, save_to_vec, shared, Shared, StreamConfig};
use mnema_scene::{scene_registry, Material, Mesh, Scene, SceneNode, Transform};

use std::hint::black_box;

/// A flat grid of nodes sharing a handful of meshes.
fn grid_scene(side: usize) -> Shared<Scene> {
    let material = shared(Material::new("grid", [0.8, 0.8, 0.8, 1.0]));
    let meshes: Vec<_> = (0..4)
        .map(|i| shared(Mesh::quad(format!("tile_{i}"), 0.5).with_material(material.clone())))
        .collect();

    let world = shared(SceneNode::new("world"));
    for x in 0..side {
        for z in 0..side {
            let node = SceneNode::new(format!("tile_{x}_{z}"))
                .with_mesh(meshes[(x + z) % meshes.len()].clone())
                .with_transform(Transform::from_translation([x as f32, 0.0, z as f32]));
            SceneNode::add_child(&world, shared(node));
        }
    }

    let mut scene = Scene::new("grid");
    scene.roots.push(world);
    scene.materials.push(material);
    shared(scene)
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = StreamConfig {
        check_schema: false,
        ..Default::default()
    };
    let scene = grid_scene(32);

    c.bench_function("save_grid_1024", |b| {
        b.iter(|| save_to_vec(black_box(&scene), &config).unwrap());
    });

    let bytes = save_to_vec(&scene, &config).unwrap();
    let registry = scene_registry();
    c.bench_function("load_grid_1024", |b| {
        b.iter(|| load_from_slice::<Scene>(black_box(&bytes), &registry, &config).unwrap());
    });

    c.bench_function("load_grid_1024_schema_checked", |b| {
        let checked = StreamConfig {
            check_schema: true,
            ..Default::default()
        };
        b.iter(|| load_from_slice::<Scene>(black_box(&bytes), &registry, &checked).unwrap());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
