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

//! Keyframe animation clips.

use bytemuck::{Pod, Zeroable};
use mnema_core::{
    FieldKind, GraphReader, GraphWriter, LoadError, SaveError, Shared, StreamField, Streamable,
};

use crate::node::SceneNode;

/// The node property a track drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackChannel {
    /// `Transform::translation`, keyframe values are `[x, y, z, _]`.
    #[default]
    Translation = 0,
    /// `Transform::rotation`, keyframe values are a quaternion.
    Rotation = 1,
    /// `Transform::scale`, keyframe values are `[x, y, z, _]`.
    Scale = 2,
}

impl StreamField for TrackChannel {
    const KIND: FieldKind = FieldKind::U8;

    fn write_field(&self, writer: &mut GraphWriter<'_>) -> Result<(), SaveError> {
        writer.write_u8(*self as u8)
    }

    fn read_field(reader: &mut GraphReader<'_>) -> Result<Self, LoadError> {
        match reader.read_u8()? {
            0 => Ok(Self::Translation),
            1 => Ok(Self::Rotation),
            2 => Ok(Self::Scale),
            other => Err(LoadError::custom(format!("invalid track channel {other}"))),
        }
    }
}

/// One sample of a track.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Keyframe {
    /// Time in seconds from the start of the clip.
    pub time: f32,
    /// The sampled value; unused lanes are zero.
    pub value: [f32; 4],
}

impl Keyframe {
    /// Creates a keyframe.
    pub const fn new(time: f32, value: [f32; 4]) -> Self {
        Self { time, value }
    }
}

/// Keyframes driving one property of one node.
///
/// The target is a shared reference: the node is also owned by the scene
/// hierarchy, and a save pass writes it once wherever it is reached first.
#[derive(Debug, Default, Streamable)]
#[stream(tag = "scene.AnimationTrack", register)]
pub struct AnimationTrack {
    /// The driven property.
    pub channel: TrackChannel,
    /// The driven node.
    pub target: Option<Shared<SceneNode>>,
    /// Samples sorted by time.
    #[stream(pod_buffer)]
    pub keyframes: Vec<Keyframe>,
}

impl AnimationTrack {
    /// Creates a track; `keyframes` are sorted by time.
    pub fn new(
        channel: TrackChannel,
        target: Shared<SceneNode>,
        mut keyframes: Vec<Keyframe>,
    ) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            channel,
            target: Some(target),
            keyframes,
        }
    }

    /// Time of the last keyframe.
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |key| key.time)
    }

    /// Linearly interpolated value at `time`, clamped to the first and last keys.
    ///
    /// Returns `None` for a track without keyframes or a NaN `time`.
    pub fn sample(&self, time: f32) -> Option<[f32; 4]> {
        if time.is_nan() {
            return None;
        }
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.value);
        }
        let next = self.keyframes.partition_point(|key| key.time <= time);
        let Some(after) = self.keyframes.get(next) else {
            return self.keyframes.last().map(|key| key.value);
        };
        let before = self.keyframes.get(next.checked_sub(1)?)?;
        let span = after.time - before.time;
        let t = if span > 0.0 {
            (time - before.time) / span
        } else {
            0.0
        };
        let mut value = [0.0; 4];
        for (lane, out) in value.iter_mut().enumerate() {
            *out = before.value[lane] + (after.value[lane] - before.value[lane]) * t;
        }
        Some(value)
    }
}

/// A named set of tracks played together.
#[derive(Debug, Default, Streamable)]
#[stream(tag = "scene.AnimationClip", register)]
pub struct AnimationClip {
    /// A human-readable name for debugging.
    pub name: String,
    /// Whether playback wraps around at the end.
    pub looping: bool,
    /// The tracks of the clip.
    pub tracks: Vec<Shared<AnimationTrack>>,
}

impl AnimationClip {
    /// Creates an empty, non-looping clip.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Length of the clip: the latest keyframe over all tracks.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .map(|track| track.borrow().end_time())
            .fold(0.0, f32::max)
    }
}
