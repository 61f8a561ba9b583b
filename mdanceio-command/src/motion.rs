use nanoem::{
    common::Buffer,
    motion::MotionKeyframeTypes,
    mutable::common::MutableBuffer,
};

use crate::{error::MdanceioError, motion_keyframe_selection::MotionKeyframeSelection};

pub type NanoemMotion = nanoem::motion::Motion;

/// Closest existing keyframes around the frame a keyframe is being registered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeBound {
    pub previous: Option<u32>,
    pub current: u32,
    pub next: Option<u32>,
}

impl KeyframeBound {
    pub fn new(previous: Option<u32>, current: u32, next: Option<u32>) -> Self {
        Self {
            previous,
            current,
            next,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Motion {
    pub opaque: NanoemMotion,
    selection: MotionKeyframeSelection,
    dirty: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self::empty()
    }
}

impl Motion {
    pub const MAX_KEYFRAME_INDEX: u32 = u32::MAX;

    pub fn empty() -> Self {
        Self::from_opaque(NanoemMotion::empty())
    }

    pub fn from_opaque(opaque: NanoemMotion) -> Self {
        Self {
            opaque,
            selection: MotionKeyframeSelection::default(),
            dirty: false,
        }
    }

    pub fn add_frame_index_delta(value: i32, frame_index: u32) -> Option<u32> {
        if value > 0 {
            if frame_index <= Self::MAX_KEYFRAME_INDEX - value as u32 {
                return Some(frame_index + (value as u32));
            }
        } else if value < 0 && frame_index >= value.unsigned_abs() {
            return Some(frame_index - value.unsigned_abs());
        }
        None
    }

    pub fn selection(&self) -> &MotionKeyframeSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut MotionKeyframeSelection {
        &mut self.selection
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, value: bool) {
        self.dirty = value;
    }

    pub fn duration(&self) -> u32 {
        self.opaque.max_frame_index()
    }

    pub fn sort_all_keyframes(&mut self) {
        self.opaque.sort_all_keyframes();
    }

    /// Serializes the keyframes of `types` in the uncompressed snapshot layout.
    pub fn save_snapshot(&self, types: MotionKeyframeTypes) -> Result<Vec<u8>, MdanceioError> {
        let mut buffer = MutableBuffer::create()
            .map_err(|status| MdanceioError::from_nanoem("Cannot allocate snapshot: ", status))?;
        self.opaque
            .save_to_snapshot(types, &mut buffer)
            .map_err(|status| MdanceioError::from_nanoem("Cannot save snapshot: ", status))?;
        Ok(buffer.into_bytes())
    }

    /// Replaces every keyframe of `types` with the ones stored in `data`.
    ///
    /// The snapshot is parsed into a scratch motion first, so a corrupted buffer leaves this
    /// motion untouched.
    pub fn load_snapshot(
        &mut self,
        types: MotionKeyframeTypes,
        data: &[u8],
    ) -> Result<(), MdanceioError> {
        let mut scratch = NanoemMotion::empty();
        let mut buffer = Buffer::create(data.to_vec());
        let loaded_types = scratch
            .load_from_snapshot(&mut buffer)
            .map_err(|status| MdanceioError::from_nanoem("Cannot load snapshot: ", status))?;
        self.opaque.clear_keyframes(types);
        if types.contains(MotionKeyframeTypes::ACCESSORY)
            && loaded_types.contains(MotionKeyframeTypes::ACCESSORY)
        {
            self.opaque.accessory_keyframes = std::mem::take(&mut scratch.accessory_keyframes);
        }
        if types.contains(MotionKeyframeTypes::BONE)
            && loaded_types.contains(MotionKeyframeTypes::BONE)
        {
            self.opaque.local_bone_motion_track_bundle =
                std::mem::take(&mut scratch.local_bone_motion_track_bundle);
        }
        if types.contains(MotionKeyframeTypes::CAMERA)
            && loaded_types.contains(MotionKeyframeTypes::CAMERA)
        {
            self.opaque.camera_keyframes = std::mem::take(&mut scratch.camera_keyframes);
        }
        if types.contains(MotionKeyframeTypes::LIGHT)
            && loaded_types.contains(MotionKeyframeTypes::LIGHT)
        {
            self.opaque.light_keyframes = std::mem::take(&mut scratch.light_keyframes);
        }
        if types.contains(MotionKeyframeTypes::MODEL)
            && loaded_types.contains(MotionKeyframeTypes::MODEL)
        {
            self.opaque.model_keyframes = std::mem::take(&mut scratch.model_keyframes);
        }
        if types.contains(MotionKeyframeTypes::MORPH)
            && loaded_types.contains(MotionKeyframeTypes::MORPH)
        {
            self.opaque.local_morph_motion_track_bundle =
                std::mem::take(&mut scratch.local_morph_motion_track_bundle);
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW)
            && loaded_types.contains(MotionKeyframeTypes::SELF_SHADOW)
        {
            self.opaque.self_shadow_keyframes = std::mem::take(&mut scratch.self_shadow_keyframes);
        }
        self.opaque.sort_all_keyframes();
        Ok(())
    }
}

#[test]
fn test_add_frame_index_delta() {
    assert_eq!(Some(11), Motion::add_frame_index_delta(1, 10));
    assert_eq!(Some(9), Motion::add_frame_index_delta(-1, 10));
    assert_eq!(None, Motion::add_frame_index_delta(-1, 0));
    assert_eq!(None, Motion::add_frame_index_delta(1, Motion::MAX_KEYFRAME_INDEX));
}

#[test]
fn test_load_snapshot_replaces_only_requested_types() {
    use nanoem::motion::{MotionCameraKeyframe, MotionLightKeyframe};

    let mut motion = Motion::empty();
    motion
        .opaque
        .add_camera_keyframe(MotionCameraKeyframe::create(0), 5)
        .unwrap();
    motion
        .opaque
        .add_light_keyframe(MotionLightKeyframe::create(0), 7)
        .unwrap();
    let snapshot = motion.save_snapshot(MotionKeyframeTypes::ALL).unwrap();
    motion.opaque.remove_camera_keyframe(5).unwrap();
    motion.opaque.remove_light_keyframe(7).unwrap();
    motion
        .load_snapshot(MotionKeyframeTypes::CAMERA, &snapshot)
        .unwrap();
    assert!(motion.opaque.find_camera_keyframe_object(5).is_some());
    assert!(motion.opaque.find_light_keyframe_object(7).is_none());
    assert!(motion
        .load_snapshot(MotionKeyframeTypes::CAMERA, &snapshot[..4])
        .is_err());
    assert!(motion.opaque.find_camera_keyframe_object(5).is_some());
}
