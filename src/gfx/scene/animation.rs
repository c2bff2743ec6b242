//! Clip playback
//!
//! [`AnimationMixer`] is the explicit playback state for one mounted asset.
//! It is owned by the scene, advanced once per frame through
//! [`AnimationMixer::advance`], and released when the asset is unmounted.
//! Only whole-node translation/rotation/scale tracks are evaluated; skinning
//! and cross-clip blending are left to a future renderer.

use std::collections::HashMap;

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

use super::asset::{LoadedAsset, NodeTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Keyframes hold (in-tangent, value, out-tangent) triples
    CubicSpline,
}

#[derive(Debug, Clone)]
pub enum ChannelValues {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
}

/// Keyframed track targeting one property of one node
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

impl Channel {
    pub fn new(node: usize, times: Vec<f32>, values: ChannelValues, interpolation: Interpolation) -> Self {
        Self {
            node,
            times,
            values,
            interpolation,
        }
    }

    /// Index of the keyframe value `k`, skipping cubic-spline tangents
    fn value_index(&self, k: usize) -> usize {
        match self.interpolation {
            Interpolation::CubicSpline => k * 3 + 1,
            _ => k,
        }
    }

    /// Keyframe pair around `time` and the blend factor between them
    fn locate(&self, time: f32) -> Option<(usize, usize, f32)> {
        let last = self.times.len().checked_sub(1)?;
        if time <= self.times[0] {
            return Some((0, 0, 0.0));
        }
        if time >= self.times[last] {
            return Some((last, last, 0.0));
        }
        let next = self.times.partition_point(|&t| t <= time);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let t = if span > 0.0 {
            (time - self.times[prev]) / span
        } else {
            0.0
        };
        match self.interpolation {
            Interpolation::Step => Some((prev, prev, 0.0)),
            _ => Some((prev, next, t)),
        }
    }

    /// Writes this channel's value at `time` into `pose`
    pub fn apply(&self, time: f32, pose: &mut [NodeTransform]) {
        let Some(target) = pose.get_mut(self.node) else {
            return;
        };
        let Some((a, b, t)) = self.locate(time) else {
            return;
        };
        let (ia, ib) = (self.value_index(a), self.value_index(b));

        match &self.values {
            ChannelValues::Translation(values) => {
                if let (Some(va), Some(vb)) = (values.get(ia), values.get(ib)) {
                    target.translation = va.lerp(*vb, t);
                }
            }
            ChannelValues::Scale(values) => {
                if let (Some(va), Some(vb)) = (values.get(ia), values.get(ib)) {
                    target.scale = va.lerp(*vb, t);
                }
            }
            ChannelValues::Rotation(values) => {
                if let (Some(qa), Some(qb)) = (values.get(ia), values.get(ib)) {
                    target.rotation = if t == 0.0 {
                        qa.normalize()
                    } else {
                        qa.normalize().slerp(qb.normalize(), t)
                    };
                }
            }
        }
    }
}

/// Named, time-parameterized animation
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: String, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name,
            duration,
            channels,
        }
    }

    /// Overwrites the animated properties of `pose` with their values at `time`
    pub fn sample_into(&self, time: f32, pose: &mut [NodeTransform]) {
        for channel in &self.channels {
            channel.apply(time, pose);
        }
    }
}

/// Playback cursor for one clip
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: usize,
    time: f32,
    duration: f32,
    looping: bool,
    playing: bool,
}

impl ClipAction {
    pub fn clip(&self) -> usize {
        self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.time += dt;
        if self.duration > 0.0 && self.time >= self.duration {
            if self.looping {
                self.time %= self.duration;
            } else {
                self.time = self.duration;
                self.playing = false;
            }
        }
    }
}

/// Per-scene clip playback state
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: HashMap<usize, ClipAction>,
    active: Option<usize>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached action for a clip, creating it on first use
    pub fn clip_action(&mut self, clip: usize, clips: &[AnimationClip]) -> Option<&mut ClipAction> {
        let duration = clips.get(clip)?.duration;
        Some(self.actions.entry(clip).or_insert_with(|| ClipAction {
            clip,
            time: 0.0,
            duration,
            looping: true,
            playing: false,
        }))
    }

    /// Starts looped playback of `clip` and makes it the active clip
    pub fn play(&mut self, clip: usize, clips: &[AnimationClip]) -> bool {
        let Some(action) = self.clip_action(clip, clips) else {
            log::warn!("Clip {clip} does not exist");
            return false;
        };
        action.looping = true;
        action.playing = true;
        self.active = Some(clip);
        if let Some(clip) = clips.get(clip) {
            log::info!("Playing clip '{}' ({:.2}s, looped)", clip.name, clip.duration);
        }
        true
    }

    /// Advances every playing action by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            log::debug!("Ignoring invalid frame delta {dt}");
            return;
        }
        for action in self.actions.values_mut() {
            action.advance(dt);
        }
    }

    pub fn stop_all(&mut self) {
        for action in self.actions.values_mut() {
            action.playing = false;
        }
    }

    /// Drops every cached action
    pub fn uncache_all(&mut self) {
        self.actions.clear();
        self.active = None;
    }

    pub fn active_action(&self) -> Option<&ClipAction> {
        self.active.and_then(|clip| self.actions.get(&clip))
    }

    /// Playback time of the active clip
    pub fn time(&self) -> Option<f32> {
        self.active_action().map(ClipAction::time)
    }

    pub fn cached_action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn is_playing(&self) -> bool {
        self.actions.values().any(ClipAction::is_playing)
    }

    /// Rest pose with the active clip applied at its current time
    pub fn sample_pose(&self, asset: &LoadedAsset) -> Vec<NodeTransform> {
        let mut pose = asset.rest_pose();
        if let Some(action) = self.active_action() {
            if let Some(clip) = asset.clips.get(action.clip) {
                clip.sample_into(action.time, &mut pose);
            }
        }
        pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::asset::tests::animated_triangle;
    use cgmath::Rad;
    use cgmath::Rotation3;

    fn slide_clip() -> AnimationClip {
        AnimationClip::new(
            "slide".to_string(),
            vec![Channel::new(
                0,
                vec![0.0, 1.0, 2.0],
                ChannelValues::Translation(vec![
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(4.0, 0.0, 0.0),
                    Vector3::new(4.0, 2.0, 0.0),
                ]),
                Interpolation::Linear,
            )],
        )
    }

    #[test]
    fn one_frame_advances_clip_time_by_dt() {
        let clips = vec![slide_clip()];
        let mut mixer = AnimationMixer::new();
        assert!(mixer.play(0, &clips));
        assert_eq!(mixer.time(), Some(0.0));

        let dt = 1.0 / 60.0;
        mixer.advance(dt);
        assert_eq!(mixer.time(), Some(dt));
    }

    #[test]
    fn looped_time_wraps_at_duration() {
        let clips = vec![slide_clip()];
        let mut mixer = AnimationMixer::new();
        mixer.play(0, &clips);
        mixer.advance(1.5);
        mixer.advance(1.0);
        assert!((mixer.time().unwrap() - 0.5).abs() < 1e-6);
        assert!(mixer.is_playing());
    }

    #[test]
    fn release_stops_and_clears_cache() {
        let clips = vec![slide_clip()];
        let mut mixer = AnimationMixer::new();
        mixer.play(0, &clips);
        mixer.advance(0.25);
        assert_eq!(mixer.cached_action_count(), 1);

        mixer.stop_all();
        mixer.advance(0.25);
        assert_eq!(mixer.time(), Some(0.25));

        mixer.uncache_all();
        assert_eq!(mixer.cached_action_count(), 0);
        assert_eq!(mixer.time(), None);
        assert!(!mixer.is_playing());
    }

    #[test]
    fn invalid_deltas_are_ignored() {
        let clips = vec![slide_clip()];
        let mut mixer = AnimationMixer::new();
        mixer.play(0, &clips);
        mixer.advance(-1.0);
        mixer.advance(f32::NAN);
        assert_eq!(mixer.time(), Some(0.0));
    }

    #[test]
    fn play_unknown_clip_fails() {
        let mut mixer = AnimationMixer::new();
        assert!(!mixer.play(3, &[slide_clip()]));
        assert_eq!(mixer.cached_action_count(), 0);
    }

    #[test]
    fn linear_translation_sampling() {
        let clip = slide_clip();
        assert_eq!(clip.duration, 2.0);
        let mut pose = vec![NodeTransform::default()];

        clip.sample_into(0.5, &mut pose);
        assert!((pose[0].translation.x - 2.0).abs() < 1e-6);

        clip.sample_into(1.5, &mut pose);
        assert!((pose[0].translation.x - 4.0).abs() < 1e-6);
        assert!((pose[0].translation.y - 1.0).abs() < 1e-6);

        // clamps outside the keyframe range
        clip.sample_into(5.0, &mut pose);
        assert_eq!(pose[0].translation, Vector3::new(4.0, 2.0, 0.0));
    }

    #[test]
    fn step_holds_previous_key() {
        let channel = Channel::new(
            0,
            vec![0.0, 1.0],
            ChannelValues::Scale(vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(3.0, 3.0, 3.0)]),
            Interpolation::Step,
        );
        let mut pose = vec![NodeTransform::default()];
        channel.apply(0.99, &mut pose);
        assert_eq!(pose[0].scale, Vector3::new(1.0, 1.0, 1.0));
        channel.apply(1.0, &mut pose);
        assert_eq!(pose[0].scale, Vector3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn rotation_slerps_between_keys() {
        let quarter = Quaternion::from_angle_z(Rad(std::f32::consts::FRAC_PI_2));
        let channel = Channel::new(
            0,
            vec![0.0, 1.0],
            ChannelValues::Rotation(vec![Quaternion::new(1.0, 0.0, 0.0, 0.0), quarter]),
            Interpolation::Linear,
        );
        let mut pose = vec![NodeTransform::default()];
        channel.apply(0.5, &mut pose);
        let expected = Quaternion::from_angle_z(Rad(std::f32::consts::FRAC_PI_4));
        assert!((pose[0].rotation - expected).magnitude() < 1e-5);
    }

    #[test]
    fn cubic_spline_uses_keyframe_values() {
        let channel = Channel::new(
            0,
            vec![0.0, 1.0],
            ChannelValues::Translation(vec![
                Vector3::new(9.0, 9.0, 9.0),
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(9.0, 9.0, 9.0),
                Vector3::new(9.0, 9.0, 9.0),
                Vector3::new(2.0, 0.0, 0.0),
                Vector3::new(9.0, 9.0, 9.0),
            ]),
            Interpolation::CubicSpline,
        );
        let mut pose = vec![NodeTransform::default()];
        channel.apply(0.5, &mut pose);
        assert!((pose[0].translation - Vector3::new(1.0, 0.0, 0.0)).magnitude() < 1e-6);
    }

    #[test]
    fn sample_pose_animates_loaded_asset() {
        let asset = animated_triangle();
        let mut mixer = AnimationMixer::new();
        mixer.play(0, &asset.clips);
        mixer.advance(0.5);

        let pose = mixer.sample_pose(&asset);
        assert!((pose[0].translation.x - 1.0).abs() < 1e-6);
        // the child is not animated and keeps its rest transform
        assert_eq!(pose[1].translation, Vector3::new(0.0, 0.0, 1.0));
    }
}
