use std::collections::BTreeSet;

use nanoem::motion::MotionKeyframeTypes;

/// Selected keyframes of one channel kind, keyed by track and frame index.
///
/// Global channels (camera, light, ...) use `()` as the track key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeSelectionSet<T: Ord + Clone> {
    keyframes: BTreeSet<(T, u32)>,
}

impl<T: Ord + Clone> Default for KeyframeSelectionSet<T> {
    fn default() -> Self {
        Self {
            keyframes: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> KeyframeSelectionSet<T> {
    pub fn contains(&self, track: &T, frame_index: u32) -> bool {
        self.keyframes.contains(&(track.clone(), frame_index))
    }

    pub fn add(&mut self, track: &T, frame_index: u32) {
        self.keyframes.insert((track.clone(), frame_index));
    }

    pub fn remove(&mut self, track: &T, frame_index: u32) {
        self.keyframes.remove(&(track.clone(), frame_index));
    }

    pub fn get_all(&self) -> impl Iterator<Item = (&T, u32)> {
        self.keyframes
            .iter()
            .map(|(track, frame_index)| (track, *frame_index))
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.keyframes.clear();
    }

    /// Drops every selected keyframe sitting at `frame_index`.
    pub fn remove_frame(&mut self, frame_index: u32) {
        self.keyframes.retain(|(_, f)| *f != frame_index);
    }

    /// Moves the selection of every keyframe at or after `from` by `delta` frames.
    pub fn shift_frames(&mut self, from: u32, delta: i32) {
        let (moved, kept): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut self.keyframes)
            .into_iter()
            .partition(|(_, frame_index)| *frame_index >= from);
        self.keyframes = kept;
        for (track, frame_index) in moved {
            let frame_index = if delta >= 0 {
                frame_index.saturating_add(delta as u32)
            } else {
                frame_index.saturating_sub(delta.unsigned_abs())
            };
            self.keyframes.insert((track, frame_index));
        }
    }
}

/// Active keyframe selection of a motion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionKeyframeSelection {
    pub accessory: KeyframeSelectionSet<()>,
    pub bone: KeyframeSelectionSet<String>,
    pub camera: KeyframeSelectionSet<()>,
    pub light: KeyframeSelectionSet<()>,
    pub model: KeyframeSelectionSet<()>,
    pub morph: KeyframeSelectionSet<String>,
    pub self_shadow: KeyframeSelectionSet<()>,
}

macro_rules! for_each_selection_set {
    ($self:ident, $types:expr, |$set:ident| $body:expr) => {{
        if $types.contains(MotionKeyframeTypes::ACCESSORY) {
            let $set = &mut $self.accessory;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::BONE) {
            let $set = &mut $self.bone;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::CAMERA) {
            let $set = &mut $self.camera;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::LIGHT) {
            let $set = &mut $self.light;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::MODEL) {
            let $set = &mut $self.model;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::MORPH) {
            let $set = &mut $self.morph;
            $body;
        }
        if $types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            let $set = &mut $self.self_shadow;
            $body;
        }
    }};
}

impl MotionKeyframeSelection {
    pub fn is_empty(&self) -> bool {
        self.accessory.is_empty()
            && self.bone.is_empty()
            && self.camera.is_empty()
            && self.light.is_empty()
            && self.model.is_empty()
            && self.morph.is_empty()
            && self.self_shadow.is_empty()
    }

    pub fn clear_all_keyframes(&mut self, types: MotionKeyframeTypes) {
        for_each_selection_set!(self, types, |set| set.clear_all());
    }

    pub fn remove_keyframe_column(&mut self, types: MotionKeyframeTypes, frame_index: u32) {
        for_each_selection_set!(self, types, |set| set.remove_frame(frame_index));
    }

    pub fn shift_keyframes(&mut self, types: MotionKeyframeTypes, from: u32, delta: i32) {
        for_each_selection_set!(self, types, |set| set.shift_frames(from, delta));
    }

    /// Replaces the selection of `types` with the one stored in `saved`.
    pub fn restore(&mut self, types: MotionKeyframeTypes, saved: &MotionKeyframeSelection) {
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            self.accessory = saved.accessory.clone();
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            self.bone = saved.bone.clone();
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            self.camera = saved.camera.clone();
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            self.light = saved.light.clone();
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            self.model = saved.model.clone();
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            self.morph = saved.morph.clone();
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            self.self_shadow = saved.self_shadow.clone();
        }
    }
}

#[test]
fn test_shift_selection() {
    let mut selection = MotionKeyframeSelection::default();
    selection.bone.add(&"センター".to_owned(), 4);
    selection.bone.add(&"センター".to_owned(), 10);
    selection.camera.add(&(), 10);
    selection.shift_keyframes(MotionKeyframeTypes::BONE, 5, 1);
    assert!(selection.bone.contains(&"センター".to_owned(), 4));
    assert!(selection.bone.contains(&"センター".to_owned(), 11));
    assert!(selection.camera.contains(&(), 10));
    selection.remove_keyframe_column(MotionKeyframeTypes::ALL, 11);
    assert_eq!(1, selection.bone.len());
    assert_eq!(1, selection.camera.len());
    selection.clear_all_keyframes(MotionKeyframeTypes::CAMERA);
    assert!(selection.camera.is_empty());
    assert!(!selection.is_empty());
}
