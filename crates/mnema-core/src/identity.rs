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

//! Pass-local identity tables.
//!
//! Both tables live exactly as long as one save or load pass.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::format::SerialId;
use crate::registry::ObjectSlot;
use crate::streamable::Streamable;

/// The identity of a shared object: the address of the value inside its cell.
///
/// Two `Shared` handles to the same allocation yield the same identity, and so
/// does a plain `&T` borrowed out of that allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Identity(usize);

impl Identity {
    pub(crate) fn of_cell(cell: &RefCell<dyn Streamable>) -> Self {
        Self(cell.as_ptr() as *const () as usize)
    }

    pub(crate) fn of_value<T: ?Sized>(value: &T) -> Self {
        Self(value as *const T as *const () as usize)
    }
}

/// Write side: object identity → serial id, in first-sighting order.
#[derive(Debug)]
pub(crate) struct WriteTable {
    ids: HashMap<Identity, SerialId>,
    next: Option<SerialId>,
}

impl WriteTable {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: Some(SerialId::FIRST),
        }
    }

    pub(crate) fn get(&self, identity: Identity) -> Option<SerialId> {
        self.ids.get(&identity).copied()
    }

    /// Assigns the next id to a not yet seen identity.
    ///
    /// Returns `None` once the id space is exhausted.
    pub(crate) fn assign(&mut self, identity: Identity) -> Option<SerialId> {
        debug_assert!(!self.ids.contains_key(&identity));
        let id = self.next?;
        self.next = id.next();
        self.ids.insert(identity, id);
        Some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Read side: serial id → the instance built for it, in allocation order.
#[derive(Debug)]
pub(crate) struct ReadTable {
    slots: Vec<ObjectSlot>,
}

impl ReadTable {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn get(&self, id: SerialId) -> Option<&ObjectSlot> {
        self.slots.get(id.get() as usize - 1)
    }

    /// The id the next newly allocated object must carry.
    pub(crate) fn next_id(&self) -> u32 {
        self.slots.len() as u32 + 1
    }

    /// Registers a freshly allocated instance under the next id.
    pub(crate) fn insert(&mut self, slot: ObjectSlot) {
        self.slots.push(slot);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn into_slots(self) -> Vec<ObjectSlot> {
        self.slots
    }
}
