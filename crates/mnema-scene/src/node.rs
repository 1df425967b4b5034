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

//! Defines the scene hierarchy.
//!
//! A node owns its children and points back at its parent through a weak
//! reference. A save pass follows the back reference only for the node the
//! pass started at, so saving a subtree never climbs into the rest of the
//! scene; [`relink_parents`] restores the back references after a load.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bytemuck::{Pod, Zeroable};
use mnema_core::{Shared, Streamable};

use crate::light::Light;
use crate::mesh::Mesh;

/// A local translation, rotation and scale.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    /// Translation relative to the parent.
    pub translation: [f32; 3],
    /// Rotation quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Non-uniform scale.
    pub scale: [f32; 3],
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    /// An identity transform moved to `translation`.
    pub const fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A node of the scene hierarchy.
#[derive(Debug, Streamable)]
#[stream(tag = "scene.Node", register)]
pub struct SceneNode {
    /// A human-readable name, also used by [`SceneNode::find`].
    pub name: String,
    /// Local transform.
    #[stream(pod)]
    pub transform: Transform,
    /// Whether the node and its subtree are drawn.
    pub visible: bool,
    /// Geometry drawn at this node. Meshes are commonly shared between nodes.
    pub mesh: Option<Shared<Mesh>>,
    /// A light attached to this node.
    pub light: Option<Shared<Light>>,
    /// Owned children, in draw order.
    pub children: Vec<Shared<SceneNode>>,
    /// Back reference to the parent.
    pub parent: Weak<RefCell<SceneNode>>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::IDENTITY,
            visible: true,
            mesh: None,
            light: None,
            children: Vec::new(),
            parent: Weak::new(),
        }
    }
}

impl SceneNode {
    /// Creates a visible, empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the local transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the mesh.
    pub fn with_mesh(mut self, mesh: Shared<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Sets the light.
    pub fn with_light(mut self, light: Shared<Light>) -> Self {
        self.light = Some(light);
        self
    }

    /// The parent, if it is still alive.
    pub fn parent(&self) -> Option<Shared<SceneNode>> {
        self.parent.upgrade()
    }

    /// Appends `child` to `parent`'s children and points it back at `parent`.
    ///
    /// A child that already had a live parent is detached from it first.
    pub fn add_child(parent: &Shared<SceneNode>, child: Shared<SceneNode>) {
        let previous = child.borrow().parent.upgrade();
        if let Some(previous) = previous {
            previous
                .borrow_mut()
                .children
                .retain(|sibling| !Rc::ptr_eq(sibling, &child));
        }
        child.borrow_mut().parent = Rc::downgrade(parent);
        parent.borrow_mut().children.push(child);
    }

    /// Every node below `root`, depth first, in child order. `root` is excluded.
    pub fn descendants(root: &Shared<SceneNode>) -> Vec<Shared<SceneNode>> {
        let mut out = Vec::new();
        let mut stack: Vec<Shared<SceneNode>> =
            root.borrow().children.iter().rev().cloned().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.borrow().children.iter().rev().cloned());
            out.push(node);
        }
        out
    }

    /// Finds the first node named `name` in `root`'s subtree, `root` included.
    pub fn find(root: &Shared<SceneNode>, name: &str) -> Option<Shared<SceneNode>> {
        if root.borrow().name == name {
            return Some(root.clone());
        }
        Self::descendants(root)
            .into_iter()
            .find(|node| node.borrow().name == name)
    }
}

/// Points every node below `root` back at the node that owns it.
///
/// Returns the number of back references that were changed.
pub fn relink_parents(root: &Shared<SceneNode>) -> usize {
    let mut relinked = 0;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        let children = node.borrow().children.clone();
        for child in children {
            let mut child_ref = child.borrow_mut();
            let linked = child_ref
                .parent
                .upgrade()
                .is_some_and(|parent| Rc::ptr_eq(&parent, &node));
            if !linked {
                child_ref.parent = Rc::downgrade(&node);
                relinked += 1;
            }
            drop(child_ref);
            stack.push(child);
        }
    }
    log::trace!("relink_parents: {relinked} back references restored.");
    relinked
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnema_core::shared;

    fn names(nodes: &[Shared<SceneNode>]) -> Vec<String> {
        nodes.iter().map(|node| node.borrow().name.clone()).collect()
    }

    #[test]
    fn test_transform_default_is_identity() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        assert_eq!(std::mem::size_of::<Transform>(), 40);
    }

    #[test]
    fn test_add_child_links_both_ways() {
        let root = shared(SceneNode::new("root"));
        let child = shared(SceneNode::new("child"));
        SceneNode::add_child(&root, child.clone());

        assert_eq!(root.borrow().children.len(), 1);
        assert!(Rc::ptr_eq(&child.borrow().parent().unwrap(), &root));
    }

    #[test]
    fn test_add_child_reparents() {
        let a = shared(SceneNode::new("a"));
        let b = shared(SceneNode::new("b"));
        let child = shared(SceneNode::new("child"));
        SceneNode::add_child(&a, child.clone());
        SceneNode::add_child(&b, child.clone());

        assert!(a.borrow().children.is_empty());
        assert_eq!(b.borrow().children.len(), 1);
        assert!(Rc::ptr_eq(&child.borrow().parent().unwrap(), &b));
    }

    #[test]
    fn test_descendants_and_find() {
        let root = shared(SceneNode::new("root"));
        let arm = shared(SceneNode::new("arm"));
        let hand = shared(SceneNode::new("hand"));
        let leg = shared(SceneNode::new("leg"));
        SceneNode::add_child(&root, arm.clone());
        SceneNode::add_child(&arm, hand);
        SceneNode::add_child(&root, leg);

        assert_eq!(names(&SceneNode::descendants(&root)), ["arm", "hand", "leg"]);
        assert!(SceneNode::find(&root, "hand").is_some());
        assert!(Rc::ptr_eq(&SceneNode::find(&root, "root").unwrap(), &root));
        assert!(SceneNode::find(&root, "tail").is_none());
    }

    #[test]
    fn test_relink_parents() {
        let root = shared(SceneNode::new("root"));
        let child = shared(SceneNode::new("child"));
        let grandchild = shared(SceneNode::new("grandchild"));
        child.borrow_mut().children.push(grandchild.clone());
        root.borrow_mut().children.push(child.clone());

        assert_eq!(relink_parents(&root), 2);
        assert!(Rc::ptr_eq(&child.borrow().parent().unwrap(), &root));
        assert!(Rc::ptr_eq(&grandchild.borrow().parent().unwrap(), &child));
        assert_eq!(relink_parents(&root), 0);
    }
}
