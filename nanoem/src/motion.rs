use std::{
    collections::HashMap,
    ops::{BitOr, BitOrAssign},
};

use crate::{
    common::{Buffer, Status, F128},
    mutable::common::MutableBuffer,
    utils::{fourcc, CodecType},
};

pub trait Keyframe {
    fn frame_index(&self) -> u32;
    fn set_frame_index(&mut self, value: u32);

    fn frame_index_with_offset(&self, offset: i32) -> u32 {
        let frame_index = self.frame_index();
        if offset >= 0 {
            frame_index.saturating_add(offset as u32)
        } else {
            frame_index.saturating_sub(offset.unsigned_abs())
        }
    }
}

macro_rules! impl_keyframe {
    ($($typ:ty),*) => {
        $(
            impl Keyframe for $typ {
                fn frame_index(&self) -> u32 {
                    self.base.frame_index
                }

                fn set_frame_index(&mut self, value: u32) {
                    self.base.frame_index = value;
                }
            }
        )*
    };
}

/// Bit set of keyframe kinds a bulk operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MotionKeyframeTypes(u32);

impl MotionKeyframeTypes {
    pub const NONE: Self = Self(0);
    pub const ACCESSORY: Self = Self(1 << 0);
    pub const BONE: Self = Self(1 << 1);
    pub const CAMERA: Self = Self(1 << 2);
    pub const LIGHT: Self = Self(1 << 3);
    pub const MODEL: Self = Self(1 << 4);
    pub const MORPH: Self = Self(1 << 5);
    pub const SELF_SHADOW: Self = Self(1 << 6);
    pub const ALL: Self = Self((1 << 7) - 1);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MotionKeyframeTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MotionKeyframeTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone)]
pub struct MotionTrack<K: Sized> {
    id: i32,
    pub name: String,
    pub keyframes: HashMap<u32, K>,
    pub ordered_frame_index: Vec<u32>,
}

impl<K> MotionTrack<K> {
    fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            keyframes: HashMap::new(),
            ordered_frame_index: vec![],
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn find(&self, frame_index: u32) -> Option<&K> {
        self.keyframes.get(&frame_index)
    }

    pub fn find_mut(&mut self, frame_index: u32) -> Option<&mut K> {
        self.keyframes.get_mut(&frame_index)
    }

    fn insert(&mut self, frame_index: u32, keyframe: K) -> Result<(), K> {
        if self.keyframes.contains_key(&frame_index) {
            return Err(keyframe);
        }
        self.keyframes.insert(frame_index, keyframe);
        let pos = self
            .ordered_frame_index
            .binary_search(&frame_index)
            .unwrap_or_else(|e| e);
        self.ordered_frame_index.insert(pos, frame_index);
        Ok(())
    }

    fn remove(&mut self, frame_index: u32) -> Option<K> {
        let keyframe = self.keyframes.remove(&frame_index)?;
        if let Ok(pos) = self.ordered_frame_index.binary_search(&frame_index) {
            self.ordered_frame_index.remove(pos);
        }
        Some(keyframe)
    }

    /// Returns the nearest keyframes strictly before and strictly after `frame_index`.
    pub fn search_closest(&self, frame_index: u32) -> (Option<&K>, Option<&K>) {
        let (lower, upper) = match self.ordered_frame_index.binary_search(&frame_index) {
            Ok(pos) => (pos, pos + 1),
            Err(pos) => (pos, pos),
        };
        (
            lower
                .checked_sub(1)
                .and_then(|pos| self.ordered_frame_index.get(pos))
                .and_then(|f| self.keyframes.get(f)),
            self.ordered_frame_index
                .get(upper)
                .and_then(|f| self.keyframes.get(f)),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.ordered_frame_index
            .iter()
            .filter_map(|f| self.keyframes.get(f))
    }

    pub fn max_frame_index(&self) -> Option<u32> {
        self.ordered_frame_index.last().copied()
    }
}

impl<K> MotionTrack<K>
where
    K: Keyframe,
{
    /// Moves every keyframe at or after `from` by `delta`. Destination frames must be vacant.
    fn shift_frames(&mut self, from: u32, delta: i32) {
        let mut targets: Vec<u32> = self
            .ordered_frame_index
            .iter()
            .copied()
            .filter(|f| *f >= from)
            .collect();
        if delta > 0 {
            targets.reverse();
        }
        for frame_index in targets {
            if let Some(mut keyframe) = self.keyframes.remove(&frame_index) {
                let new_frame_index = keyframe.frame_index_with_offset(delta);
                keyframe.set_frame_index(new_frame_index);
                self.keyframes.insert(new_frame_index, keyframe);
            }
        }
        self.ordered_frame_index = self.keyframes.keys().copied().collect();
        self.ordered_frame_index.sort_unstable();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct IdAllocator(i32);

impl IdAllocator {
    pub fn next(&mut self) -> i32 {
        self.0 += 1;
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Clone)]
pub struct MotionTrackBundle<K: Sized> {
    allocator: IdAllocator,
    pub tracks: HashMap<String, MotionTrack<K>>,
}

impl<K> Default for MotionTrackBundle<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MotionTrackBundle<K> {
    pub fn new() -> MotionTrackBundle<K> {
        Self {
            allocator: IdAllocator::default(),
            tracks: HashMap::new(),
        }
    }

    pub fn keyframe_len(&self) -> usize {
        self.tracks.values().map(|track| track.len()).sum()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&MotionTrack<K>> {
        self.tracks.get(name)
    }

    fn get_mut_by_name(&mut self, name: &str) -> Option<&mut MotionTrack<K>> {
        self.tracks.get_mut(name)
    }

    pub fn resolve_name(&self, name: &str) -> Option<i32> {
        self.get_by_name(name).map(|track| track.id)
    }

    pub fn find_keyframe(&self, name: &str, frame_index: u32) -> Option<&K> {
        self.get_by_name(name)
            .and_then(|track| track.find(frame_index))
    }

    pub fn find_keyframe_mut(&mut self, name: &str, frame_index: u32) -> Option<&mut K> {
        self.get_mut_by_name(name)
            .and_then(|track| track.find_mut(frame_index))
    }

    pub fn insert_keyframe(&mut self, keyframe: K, frame_index: u32, name: &str) -> Result<(), K> {
        if !self.tracks.contains_key(name) {
            let id = self.allocator.next();
            self.tracks
                .insert(name.to_owned(), MotionTrack::new(id, name));
        }
        match self.get_mut_by_name(name) {
            Some(track) => track.insert(frame_index, keyframe),
            None => Err(keyframe),
        }
    }

    pub fn remove_keyframe(&mut self, frame_index: u32, name: &str) -> Option<K> {
        self.get_mut_by_name(name)
            .and_then(|track| track.remove(frame_index))
    }

    /// Track names in a stable order.
    pub fn sorted_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.tracks.keys().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.allocator.clear();
        self.tracks.clear();
    }

    pub fn max_frame_index(&self) -> Option<u32> {
        self.tracks
            .values()
            .filter_map(|track| track.max_frame_index())
            .max()
    }

    fn take_frame(&mut self, frame_index: u32) -> Vec<(String, K)> {
        let mut taken = vec![];
        for name in self.sorted_names().into_iter().cloned().collect::<Vec<_>>() {
            if let Some(keyframe) = self.remove_keyframe(frame_index, &name) {
                taken.push((name, keyframe));
            }
        }
        taken
    }
}

impl<K> MotionTrackBundle<K>
where
    K: Keyframe,
{
    fn shift_frames(&mut self, from: u32, delta: i32) {
        for track in self.tracks.values_mut() {
            track.shift_frames(from, delta);
        }
    }
}

fn find_keyframe_position<K: Keyframe>(keyframes: &[K], frame_index: u32) -> Option<usize> {
    keyframes
        .iter()
        .position(|keyframe| keyframe.frame_index() == frame_index)
}

fn search_closest_keyframes<K: Keyframe>(
    keyframes: &[K],
    frame_index: u32,
) -> (Option<&K>, Option<&K>) {
    let previous = keyframes
        .iter()
        .filter(|keyframe| keyframe.frame_index() < frame_index)
        .max_by_key(|keyframe| keyframe.frame_index());
    let next = keyframes
        .iter()
        .filter(|keyframe| keyframe.frame_index() > frame_index)
        .min_by_key(|keyframe| keyframe.frame_index());
    (previous, next)
}

fn shift_keyframes<K: Keyframe>(keyframes: &mut [K], from: u32, delta: i32) {
    for keyframe in keyframes
        .iter_mut()
        .filter(|keyframe| keyframe.frame_index() >= from)
    {
        let frame_index = keyframe.frame_index_with_offset(delta);
        keyframe.set_frame_index(frame_index);
    }
}

fn take_keyframe<K: Keyframe>(keyframes: &mut Vec<K>, frame_index: u32) -> Option<K> {
    find_keyframe_position(keyframes, frame_index).map(|pos| keyframes.remove(pos))
}

macro_rules! global_keyframe_accessors {
    ($field:ident, $typ:ty, $all:ident, $find:ident, $find_mut:ident, $add:ident, $remove:ident, $closest:ident, $exists:expr, $not_found:expr) => {
        pub fn $all(&self) -> &[$typ] {
            &self.$field
        }

        pub fn $find(&self, frame_index: u32) -> Option<&$typ> {
            find_keyframe_position(&self.$field, frame_index).map(|pos| &self.$field[pos])
        }

        pub fn $find_mut(&mut self, frame_index: u32) -> Option<&mut $typ> {
            find_keyframe_position(&self.$field, frame_index).map(|pos| &mut self.$field[pos])
        }

        pub fn $add(&mut self, mut keyframe: $typ, frame_index: u32) -> Result<(), Status> {
            if self.$find(frame_index).is_some() {
                Err($exists)
            } else {
                keyframe.base.frame_index = frame_index;
                self.$field.push(keyframe);
                Ok(())
            }
        }

        pub fn $remove(&mut self, frame_index: u32) -> Result<$typ, Status> {
            take_keyframe(&mut self.$field, frame_index).ok_or($not_found)
        }

        pub fn $closest(&self, frame_index: u32) -> (Option<&$typ>, Option<&$typ>) {
            search_closest_keyframes(&self.$field, frame_index)
        }
    };
}

macro_rules! local_keyframe_accessors {
    ($bundle:ident, $typ:ty, $find:ident, $find_mut:ident, $add:ident, $remove:ident, $closest:ident, $exists:expr, $not_found:expr) => {
        pub fn $find(&self, name: &str, frame_index: u32) -> Option<&$typ> {
            self.$bundle.find_keyframe(name, frame_index)
        }

        pub fn $find_mut(&mut self, name: &str, frame_index: u32) -> Option<&mut $typ> {
            self.$bundle.find_keyframe_mut(name, frame_index)
        }

        pub fn $add(&mut self, mut keyframe: $typ, name: &str, frame_index: u32) -> Result<(), Status> {
            keyframe.base.frame_index = frame_index;
            self.$bundle
                .insert_keyframe(keyframe, frame_index, name)
                .map_err(|_| $exists)
        }

        pub fn $remove(&mut self, name: &str, frame_index: u32) -> Result<$typ, Status> {
            self.$bundle
                .remove_keyframe(frame_index, name)
                .ok_or($not_found)
        }

        pub fn $closest(&self, name: &str, frame_index: u32) -> (Option<&$typ>, Option<&$typ>) {
            self.$bundle
                .get_by_name(name)
                .map(|track| track.search_closest(frame_index))
                .unwrap_or((None, None))
        }
    };
}

#[derive(Debug, Clone)]
pub struct Motion {
    pub target_model_name: String,
    pub accessory_keyframes: Vec<MotionAccessoryKeyframe>,
    pub camera_keyframes: Vec<MotionCameraKeyframe>,
    pub light_keyframes: Vec<MotionLightKeyframe>,
    pub model_keyframes: Vec<MotionModelKeyframe>,
    pub self_shadow_keyframes: Vec<MotionSelfShadowKeyframe>,
    pub local_bone_motion_track_bundle: MotionTrackBundle<MotionBoneKeyframe>,
    pub local_morph_motion_track_bundle: MotionTrackBundle<MotionMorphKeyframe>,
    pub preferred_fps: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self::empty()
    }
}

impl Motion {
    const SNAPSHOT_SIGNATURE: u32 = fourcc(b'N', b'M', b'S', b'S');
    const SNAPSHOT_VERSION: u32 = 1;

    pub fn empty() -> Self {
        Self {
            target_model_name: "".to_owned(),
            accessory_keyframes: vec![],
            camera_keyframes: vec![],
            light_keyframes: vec![],
            model_keyframes: vec![],
            self_shadow_keyframes: vec![],
            local_bone_motion_track_bundle: MotionTrackBundle::new(),
            local_morph_motion_track_bundle: MotionTrackBundle::new(),
            preferred_fps: 30f32,
        }
    }

    global_keyframe_accessors!(
        accessory_keyframes,
        MotionAccessoryKeyframe,
        get_all_accessory_keyframe_objects,
        find_accessory_keyframe_object,
        find_mut_accessory_keyframe_object,
        add_accessory_keyframe,
        remove_accessory_keyframe,
        search_closest_accessory_keyframes,
        Status::ErrorMotionAccessoryKeyframeAlreadyExists,
        Status::ErrorMotionAccessoryKeyframeNotFound
    );

    global_keyframe_accessors!(
        camera_keyframes,
        MotionCameraKeyframe,
        get_all_camera_keyframe_objects,
        find_camera_keyframe_object,
        find_mut_camera_keyframe_object,
        add_camera_keyframe,
        remove_camera_keyframe,
        search_closest_camera_keyframes,
        Status::ErrorMotionCameraKeyframeAlreadyExists,
        Status::ErrorMotionCameraKeyframeNotFound
    );

    global_keyframe_accessors!(
        light_keyframes,
        MotionLightKeyframe,
        get_all_light_keyframe_objects,
        find_light_keyframe_object,
        find_mut_light_keyframe_object,
        add_light_keyframe,
        remove_light_keyframe,
        search_closest_light_keyframes,
        Status::ErrorMotionLightKeyframeAlreadyExists,
        Status::ErrorMotionLightKeyframeNotFound
    );

    global_keyframe_accessors!(
        model_keyframes,
        MotionModelKeyframe,
        get_all_model_keyframe_objects,
        find_model_keyframe_object,
        find_mut_model_keyframe_object,
        add_model_keyframe,
        remove_model_keyframe,
        search_closest_model_keyframes,
        Status::ErrorMotionModelKeyframeAlreadyExists,
        Status::ErrorMotionModelKeyframeNotFound
    );

    global_keyframe_accessors!(
        self_shadow_keyframes,
        MotionSelfShadowKeyframe,
        get_all_self_shadow_keyframe_objects,
        find_self_shadow_keyframe_object,
        find_mut_self_shadow_keyframe_object,
        add_self_shadow_keyframe,
        remove_self_shadow_keyframe,
        search_closest_self_shadow_keyframes,
        Status::ErrorMotionSelfShadowKeyframeAlreadyExists,
        Status::ErrorMotionSelfShadowKeyframeNotFound
    );

    local_keyframe_accessors!(
        local_bone_motion_track_bundle,
        MotionBoneKeyframe,
        find_bone_keyframe_object,
        find_mut_bone_keyframe_object,
        add_bone_keyframe,
        remove_bone_keyframe,
        search_closest_bone_keyframes,
        Status::ErrorMotionBoneKeyframeAlreadyExists,
        Status::ErrorMotionBoneKeyframeNotFound
    );

    local_keyframe_accessors!(
        local_morph_motion_track_bundle,
        MotionMorphKeyframe,
        find_morph_keyframe_object,
        find_mut_morph_keyframe_object,
        add_morph_keyframe,
        remove_morph_keyframe,
        search_closest_morph_keyframes,
        Status::ErrorMotionMorphKeyframeAlreadyExists,
        Status::ErrorMotionMorphKeyframeNotFound
    );

    pub fn get_all_bone_keyframe_objects(&self) -> impl Iterator<Item = (&String, &MotionBoneKeyframe)> {
        self.local_bone_motion_track_bundle
            .tracks
            .iter()
            .flat_map(|(name, track)| track.iter().map(move |keyframe| (name, keyframe)))
    }

    pub fn get_all_morph_keyframe_objects(
        &self,
    ) -> impl Iterator<Item = (&String, &MotionMorphKeyframe)> {
        self.local_morph_motion_track_bundle
            .tracks
            .iter()
            .flat_map(|(name, track)| track.iter().map(move |keyframe| (name, keyframe)))
    }

    pub fn max_frame_index(&self) -> u32 {
        fn max_of<K: Keyframe>(keyframes: &[K]) -> u32 {
            keyframes
                .iter()
                .map(|keyframe| keyframe.frame_index())
                .max()
                .unwrap_or(0)
        }
        self.local_bone_motion_track_bundle
            .max_frame_index()
            .unwrap_or(0)
            .max(
                self.local_morph_motion_track_bundle
                    .max_frame_index()
                    .unwrap_or(0),
            )
            .max(max_of(&self.accessory_keyframes))
            .max(max_of(&self.camera_keyframes))
            .max(max_of(&self.light_keyframes))
            .max(max_of(&self.model_keyframes))
            .max(max_of(&self.self_shadow_keyframes))
    }

    pub fn sort_all_keyframes(&mut self) {
        self.accessory_keyframes
            .sort_by(|a, b| MotionKeyframeBase::compare(&a.base, &b.base));
        self.camera_keyframes
            .sort_by(|a, b| MotionKeyframeBase::compare(&a.base, &b.base));
        self.light_keyframes
            .sort_by(|a, b| MotionKeyframeBase::compare(&a.base, &b.base));
        self.model_keyframes
            .sort_by(|a, b| MotionKeyframeBase::compare(&a.base, &b.base));
        self.self_shadow_keyframes
            .sort_by(|a, b| MotionKeyframeBase::compare(&a.base, &b.base));
    }

    pub fn clear_keyframes(&mut self, types: MotionKeyframeTypes) {
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            self.accessory_keyframes.clear();
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            self.local_bone_motion_track_bundle.clear();
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            self.camera_keyframes.clear();
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            self.light_keyframes.clear();
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            self.model_keyframes.clear();
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            self.local_morph_motion_track_bundle.clear();
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            self.self_shadow_keyframes.clear();
        }
    }

    /// Writes the keyframes of `types` into `buffer` in the snapshot layout.
    pub fn save_to_snapshot(
        &self,
        types: MotionKeyframeTypes,
        buffer: &mut MutableBuffer,
    ) -> Result<(), Status> {
        buffer.write_u32_little_endian(Self::SNAPSHOT_SIGNATURE)?;
        buffer.write_u32_little_endian(Self::SNAPSHOT_VERSION)?;
        buffer.write_u32_little_endian(types.bits())?;
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            buffer.write_u32_little_endian(self.accessory_keyframes.len() as u32)?;
            for keyframe in &self.accessory_keyframes {
                keyframe.save_to_snapshot(buffer)?;
            }
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            let bundle = &self.local_bone_motion_track_bundle;
            buffer.write_u32_little_endian(bundle.tracks.len() as u32)?;
            for name in bundle.sorted_names() {
                if let Some(track) = bundle.get_by_name(name) {
                    buffer.write_string(name, CodecType::Utf8)?;
                    buffer.write_u32_little_endian(track.len() as u32)?;
                    for keyframe in track.iter() {
                        keyframe.save_to_snapshot(buffer)?;
                    }
                }
            }
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            buffer.write_u32_little_endian(self.camera_keyframes.len() as u32)?;
            for keyframe in &self.camera_keyframes {
                keyframe.save_to_snapshot(buffer)?;
            }
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            buffer.write_u32_little_endian(self.light_keyframes.len() as u32)?;
            for keyframe in &self.light_keyframes {
                keyframe.save_to_snapshot(buffer)?;
            }
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            buffer.write_u32_little_endian(self.model_keyframes.len() as u32)?;
            for keyframe in &self.model_keyframes {
                keyframe.save_to_snapshot(buffer)?;
            }
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            let bundle = &self.local_morph_motion_track_bundle;
            buffer.write_u32_little_endian(bundle.tracks.len() as u32)?;
            for name in bundle.sorted_names() {
                if let Some(track) = bundle.get_by_name(name) {
                    buffer.write_string(name, CodecType::Utf8)?;
                    buffer.write_u32_little_endian(track.len() as u32)?;
                    for keyframe in track.iter() {
                        keyframe.save_to_snapshot(buffer)?;
                    }
                }
            }
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            buffer.write_u32_little_endian(self.self_shadow_keyframes.len() as u32)?;
            for keyframe in &self.self_shadow_keyframes {
                keyframe.save_to_snapshot(buffer)?;
            }
        }
        Ok(())
    }

    /// Adds every keyframe stored in a snapshot. Returns the kinds the snapshot carried.
    pub fn load_from_snapshot(&mut self, buffer: &mut Buffer) -> Result<MotionKeyframeTypes, Status> {
        if buffer.read_u32_little_endian()? != Self::SNAPSHOT_SIGNATURE
            || buffer.read_u32_little_endian()? != Self::SNAPSHOT_VERSION
        {
            return Err(Status::ErrorInvalidSignature);
        }
        let types = MotionKeyframeTypes::from_bits_truncate(buffer.read_u32_little_endian()?);
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let keyframe = MotionAccessoryKeyframe::parse_snapshot(buffer)?;
                let frame_index = keyframe.base.frame_index;
                self.add_accessory_keyframe(keyframe, frame_index)?;
            }
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let name = buffer.read_string(CodecType::Utf8)?;
                for _ in 0..buffer.read_u32_little_endian()? {
                    let keyframe = MotionBoneKeyframe::parse_snapshot(buffer)?;
                    let frame_index = keyframe.base.frame_index;
                    self.add_bone_keyframe(keyframe, &name, frame_index)?;
                }
            }
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let keyframe = MotionCameraKeyframe::parse_snapshot(buffer)?;
                let frame_index = keyframe.base.frame_index;
                self.add_camera_keyframe(keyframe, frame_index)?;
            }
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let keyframe = MotionLightKeyframe::parse_snapshot(buffer)?;
                let frame_index = keyframe.base.frame_index;
                self.add_light_keyframe(keyframe, frame_index)?;
            }
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let keyframe = MotionModelKeyframe::parse_snapshot(buffer)?;
                let frame_index = keyframe.base.frame_index;
                self.add_model_keyframe(keyframe, frame_index)?;
            }
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let name = buffer.read_string(CodecType::Utf8)?;
                for _ in 0..buffer.read_u32_little_endian()? {
                    let keyframe = MotionMorphKeyframe::parse_snapshot(buffer)?;
                    let frame_index = keyframe.base.frame_index;
                    self.add_morph_keyframe(keyframe, &name, frame_index)?;
                }
            }
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            for _ in 0..buffer.read_u32_little_endian()? {
                let keyframe = MotionSelfShadowKeyframe::parse_snapshot(buffer)?;
                let frame_index = keyframe.base.frame_index;
                self.add_self_shadow_keyframe(keyframe, frame_index)?;
            }
        }
        if !buffer.is_end() {
            return Err(Status::ErrorBufferNotEnd);
        }
        self.sort_all_keyframes();
        Ok(types)
    }
}

/// Keyframes lifted out of a single frame column, keyed by track name for bone and morph.
#[derive(Debug, Clone, Default)]
pub struct MotionKeyframeColumn {
    pub accessory: Vec<MotionAccessoryKeyframe>,
    pub bone: Vec<(String, MotionBoneKeyframe)>,
    pub camera: Vec<MotionCameraKeyframe>,
    pub light: Vec<MotionLightKeyframe>,
    pub model: Vec<MotionModelKeyframe>,
    pub morph: Vec<(String, MotionMorphKeyframe)>,
    pub self_shadow: Vec<MotionSelfShadowKeyframe>,
}

impl MotionKeyframeColumn {
    pub fn is_empty(&self) -> bool {
        self.accessory.is_empty()
            && self.bone.is_empty()
            && self.camera.is_empty()
            && self.light.is_empty()
            && self.model.is_empty()
            && self.morph.is_empty()
            && self.self_shadow.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accessory.len()
            + self.bone.len()
            + self.camera.len()
            + self.light.len()
            + self.model.len()
            + self.morph.len()
            + self.self_shadow.len()
    }

    pub fn append(&mut self, other: &mut MotionKeyframeColumn) {
        self.accessory.append(&mut other.accessory);
        self.bone.append(&mut other.bone);
        self.camera.append(&mut other.camera);
        self.light.append(&mut other.light);
        self.model.append(&mut other.model);
        self.morph.append(&mut other.morph);
        self.self_shadow.append(&mut other.self_shadow);
    }
}

impl Motion {
    /// Removes every keyframe of `types` sitting exactly at `frame_index`.
    pub fn take_keyframe_column(
        &mut self,
        types: MotionKeyframeTypes,
        frame_index: u32,
    ) -> MotionKeyframeColumn {
        let mut column = MotionKeyframeColumn::default();
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            column
                .accessory
                .extend(take_keyframe(&mut self.accessory_keyframes, frame_index));
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            column.bone = self.local_bone_motion_track_bundle.take_frame(frame_index);
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            column
                .camera
                .extend(take_keyframe(&mut self.camera_keyframes, frame_index));
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            column
                .light
                .extend(take_keyframe(&mut self.light_keyframes, frame_index));
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            column
                .model
                .extend(take_keyframe(&mut self.model_keyframes, frame_index));
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            column.morph = self.local_morph_motion_track_bundle.take_frame(frame_index);
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            column
                .self_shadow
                .extend(take_keyframe(&mut self.self_shadow_keyframes, frame_index));
        }
        column
    }

    /// Puts every keyframe of `column` back at `frame_index`, stopping at the first conflict.
    pub fn restore_keyframe_column(
        &mut self,
        column: MotionKeyframeColumn,
        frame_index: u32,
    ) -> Result<(), Status> {
        for keyframe in column.accessory {
            self.add_accessory_keyframe(keyframe, frame_index)?;
        }
        for (name, keyframe) in column.bone {
            self.add_bone_keyframe(keyframe, &name, frame_index)?;
        }
        for keyframe in column.camera {
            self.add_camera_keyframe(keyframe, frame_index)?;
        }
        for keyframe in column.light {
            self.add_light_keyframe(keyframe, frame_index)?;
        }
        for keyframe in column.model {
            self.add_model_keyframe(keyframe, frame_index)?;
        }
        for (name, keyframe) in column.morph {
            self.add_morph_keyframe(keyframe, &name, frame_index)?;
        }
        for keyframe in column.self_shadow {
            self.add_self_shadow_keyframe(keyframe, frame_index)?;
        }
        Ok(())
    }

    /// Moves every keyframe of `types` at or after `from` by `delta` frames.
    ///
    /// Positive deltas walk each track from the last frame backwards so no keyframe lands on
    /// an occupied slot. The frame column at `from - 1` must be empty for a negative delta.
    pub fn shift_keyframes(&mut self, types: MotionKeyframeTypes, from: u32, delta: i32) {
        if types.contains(MotionKeyframeTypes::ACCESSORY) {
            shift_keyframes(&mut self.accessory_keyframes, from, delta);
        }
        if types.contains(MotionKeyframeTypes::BONE) {
            self.local_bone_motion_track_bundle.shift_frames(from, delta);
        }
        if types.contains(MotionKeyframeTypes::CAMERA) {
            shift_keyframes(&mut self.camera_keyframes, from, delta);
        }
        if types.contains(MotionKeyframeTypes::LIGHT) {
            shift_keyframes(&mut self.light_keyframes, from, delta);
        }
        if types.contains(MotionKeyframeTypes::MODEL) {
            shift_keyframes(&mut self.model_keyframes, from, delta);
        }
        if types.contains(MotionKeyframeTypes::MORPH) {
            self.local_morph_motion_track_bundle.shift_frames(from, delta);
        }
        if types.contains(MotionKeyframeTypes::SELF_SHADOW) {
            shift_keyframes(&mut self.self_shadow_keyframes, from, delta);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MotionKeyframeBase {
    pub frame_index: u32,
}

impl MotionKeyframeBase {
    pub fn new(frame_index: u32) -> Self {
        Self { frame_index }
    }

    fn compare(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.frame_index.cmp(&b.frame_index)
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.frame_index)
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self::new(buffer.read_u32_little_endian()?))
    }
}

/// Binds a subject (a model bone, or the whole object when the name is empty) to a bone of
/// another object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MotionOutsideParent {
    pub subject_bone_name: String,
    pub target_object_name: String,
    pub target_bone_name: String,
}

impl MotionOutsideParent {
    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_string(&self.subject_bone_name, CodecType::Utf8)?;
        buffer.write_string(&self.target_object_name, CodecType::Utf8)?;
        buffer.write_string(&self.target_bone_name, CodecType::Utf8)
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            subject_bone_name: buffer.read_string(CodecType::Utf8)?,
            target_object_name: buffer.read_string(CodecType::Utf8)?,
            target_bone_name: buffer.read_string(CodecType::Utf8)?,
        })
    }

    fn save_optional(value: &Option<Self>, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_bool(value.is_some())?;
        if let Some(outside_parent) = value {
            outside_parent.save_to_snapshot(buffer)?;
        }
        Ok(())
    }

    fn parse_optional(buffer: &mut Buffer) -> Result<Option<Self>, Status> {
        if buffer.read_bool()? {
            Ok(Some(Self::parse_snapshot(buffer)?))
        } else {
            Ok(None)
        }
    }
}

const IDENTITY_ORIENTATION: [f32; 4] = [0f32, 0f32, 0f32, 1f32];
pub const DEFAULT_INTERPOLATION: [u8; 4] = [20u8, 20u8, 107u8, 107u8];

#[derive(Debug, Clone, PartialEq)]
pub struct MotionAccessoryKeyframe {
    pub base: MotionKeyframeBase,
    pub translation: [f32; 4],
    pub orientation: [f32; 4],
    pub scale_factor: f32,
    pub opacity: f32,
    pub is_add_blending_enabled: bool,
    pub is_shadow_enabled: bool,
    pub visible: bool,
    pub outside_parent: Option<MotionOutsideParent>,
}

impl MotionAccessoryKeyframe {
    pub fn create(frame_index: u32) -> MotionAccessoryKeyframe {
        MotionAccessoryKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            translation: <[f32; 4]>::default(),
            orientation: IDENTITY_ORIENTATION,
            scale_factor: 1f32,
            opacity: 1f32,
            is_add_blending_enabled: false,
            is_shadow_enabled: true,
            visible: true,
            outside_parent: None,
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionAccessoryKeyframe, Status> {
        Ok(MotionAccessoryKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            translation: buffer.read_f32_4_little_endian()?.0,
            orientation: buffer.read_f32_4_little_endian()?.0,
            scale_factor: buffer.read_f32_little_endian()?,
            opacity: buffer.read_f32_little_endian()?,
            is_add_blending_enabled: buffer.read_bool()?,
            is_shadow_enabled: buffer.read_bool()?,
            visible: buffer.read_bool()?,
            outside_parent: MotionOutsideParent::parse_optional(buffer)?,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_4_little_endian(F128(self.translation))?;
        buffer.write_f32_4_little_endian(F128(self.orientation))?;
        buffer.write_f32_little_endian(self.scale_factor)?;
        buffer.write_f32_little_endian(self.opacity)?;
        buffer.write_bool(self.is_add_blending_enabled)?;
        buffer.write_bool(self.is_shadow_enabled)?;
        buffer.write_bool(self.visible)?;
        MotionOutsideParent::save_optional(&self.outside_parent, buffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionBoneKeyframeInterpolation {
    pub translation_x: [u8; 4],
    pub translation_y: [u8; 4],
    pub translation_z: [u8; 4],
    pub orientation: [u8; 4],
}

impl Default for MotionBoneKeyframeInterpolation {
    fn default() -> Self {
        Self {
            translation_x: DEFAULT_INTERPOLATION,
            translation_y: DEFAULT_INTERPOLATION,
            translation_z: DEFAULT_INTERPOLATION,
            orientation: DEFAULT_INTERPOLATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionBoneKeyframe {
    pub base: MotionKeyframeBase,
    pub translation: [f32; 4],
    pub orientation: [f32; 4],
    pub interpolation: MotionBoneKeyframeInterpolation,
    pub stage_index: u32,
    pub is_physics_simulation_enabled: bool,
}

impl MotionBoneKeyframe {
    pub fn create(frame_index: u32) -> MotionBoneKeyframe {
        MotionBoneKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            translation: <[f32; 4]>::default(),
            orientation: IDENTITY_ORIENTATION,
            interpolation: MotionBoneKeyframeInterpolation::default(),
            stage_index: 0,
            is_physics_simulation_enabled: true,
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionBoneKeyframe, Status> {
        Ok(MotionBoneKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            translation: buffer.read_f32_4_little_endian()?.0,
            orientation: buffer.read_f32_4_little_endian()?.0,
            interpolation: MotionBoneKeyframeInterpolation {
                translation_x: buffer.read_interpolation()?,
                translation_y: buffer.read_interpolation()?,
                translation_z: buffer.read_interpolation()?,
                orientation: buffer.read_interpolation()?,
            },
            stage_index: buffer.read_u32_little_endian()?,
            is_physics_simulation_enabled: buffer.read_bool()?,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_4_little_endian(F128(self.translation))?;
        buffer.write_f32_4_little_endian(F128(self.orientation))?;
        buffer.write_interpolation(self.interpolation.translation_x)?;
        buffer.write_interpolation(self.interpolation.translation_y)?;
        buffer.write_interpolation(self.interpolation.translation_z)?;
        buffer.write_interpolation(self.interpolation.orientation)?;
        buffer.write_u32_little_endian(self.stage_index)?;
        buffer.write_bool(self.is_physics_simulation_enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionCameraKeyframeInterpolation {
    pub lookat_x: [u8; 4],
    pub lookat_y: [u8; 4],
    pub lookat_z: [u8; 4],
    pub angle: [u8; 4],
    pub fov: [u8; 4],
    pub distance: [u8; 4],
}

impl Default for MotionCameraKeyframeInterpolation {
    fn default() -> Self {
        Self {
            lookat_x: DEFAULT_INTERPOLATION,
            lookat_y: DEFAULT_INTERPOLATION,
            lookat_z: DEFAULT_INTERPOLATION,
            angle: DEFAULT_INTERPOLATION,
            fov: DEFAULT_INTERPOLATION,
            distance: DEFAULT_INTERPOLATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionCameraKeyframe {
    pub base: MotionKeyframeBase,
    pub look_at: [f32; 4],
    pub angle: [f32; 4],
    pub distance: f32,
    pub fov: i32,
    pub interpolation: MotionCameraKeyframeInterpolation,
    pub is_perspective_view: bool,
    pub stage_index: u32,
    pub outside_parent: Option<MotionOutsideParent>,
}

impl MotionCameraKeyframe {
    pub fn create(frame_index: u32) -> MotionCameraKeyframe {
        MotionCameraKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            look_at: <[f32; 4]>::default(),
            angle: <[f32; 4]>::default(),
            distance: 0f32,
            fov: 30,
            interpolation: MotionCameraKeyframeInterpolation::default(),
            is_perspective_view: true,
            stage_index: 0,
            outside_parent: None,
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionCameraKeyframe, Status> {
        Ok(MotionCameraKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            look_at: buffer.read_f32_4_little_endian()?.0,
            angle: buffer.read_f32_4_little_endian()?.0,
            distance: buffer.read_f32_little_endian()?,
            fov: buffer.read_i32_little_endian()?,
            interpolation: MotionCameraKeyframeInterpolation {
                lookat_x: buffer.read_interpolation()?,
                lookat_y: buffer.read_interpolation()?,
                lookat_z: buffer.read_interpolation()?,
                angle: buffer.read_interpolation()?,
                fov: buffer.read_interpolation()?,
                distance: buffer.read_interpolation()?,
            },
            is_perspective_view: buffer.read_bool()?,
            stage_index: buffer.read_u32_little_endian()?,
            outside_parent: MotionOutsideParent::parse_optional(buffer)?,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_4_little_endian(F128(self.look_at))?;
        buffer.write_f32_4_little_endian(F128(self.angle))?;
        buffer.write_f32_little_endian(self.distance)?;
        buffer.write_i32_little_endian(self.fov)?;
        buffer.write_interpolation(self.interpolation.lookat_x)?;
        buffer.write_interpolation(self.interpolation.lookat_y)?;
        buffer.write_interpolation(self.interpolation.lookat_z)?;
        buffer.write_interpolation(self.interpolation.angle)?;
        buffer.write_interpolation(self.interpolation.fov)?;
        buffer.write_interpolation(self.interpolation.distance)?;
        buffer.write_bool(self.is_perspective_view)?;
        buffer.write_u32_little_endian(self.stage_index)?;
        MotionOutsideParent::save_optional(&self.outside_parent, buffer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionLightKeyframe {
    pub base: MotionKeyframeBase,
    pub color: [f32; 4],
    pub direction: [f32; 4],
}

impl MotionLightKeyframe {
    pub fn create(frame_index: u32) -> MotionLightKeyframe {
        MotionLightKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            color: [0.6f32, 0.6f32, 0.6f32, 1f32],
            direction: [-0.5f32, -1.0f32, 0.5f32, 0f32],
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionLightKeyframe, Status> {
        Ok(MotionLightKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            color: buffer.read_f32_4_little_endian()?.0,
            direction: buffer.read_f32_4_little_endian()?.0,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_4_little_endian(F128(self.color))?;
        buffer.write_f32_4_little_endian(F128(self.direction))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MotionModelKeyframeConstraintState {
    pub bone_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionModelKeyframe {
    pub base: MotionKeyframeBase,
    pub visible: bool,
    pub constraint_states: Vec<MotionModelKeyframeConstraintState>,
    pub outside_parents: Vec<MotionOutsideParent>,
    pub has_edge_option: bool,
    pub edge_scale_factor: f32,
    pub edge_color: [f32; 4],
    pub is_add_blending_enabled: bool,
    pub is_physics_simulation_enabled: bool,
}

impl MotionModelKeyframe {
    pub fn create(frame_index: u32) -> MotionModelKeyframe {
        MotionModelKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            visible: true,
            constraint_states: vec![],
            outside_parents: vec![],
            has_edge_option: false,
            edge_scale_factor: 1f32,
            edge_color: [0f32, 0f32, 0f32, 1f32],
            is_add_blending_enabled: false,
            is_physics_simulation_enabled: true,
        }
    }

    pub fn find_constraint_state(&self, bone_name: &str) -> Option<&MotionModelKeyframeConstraintState> {
        self.constraint_states
            .iter()
            .find(|state| state.bone_name == bone_name)
    }

    pub fn add_constraint_state(&mut self, bone_name: &str, enabled: bool) -> Result<(), Status> {
        if self.find_constraint_state(bone_name).is_some() {
            return Err(Status::ErrorModelConstraintStateAlreadyExists);
        }
        self.constraint_states
            .push(MotionModelKeyframeConstraintState {
                bone_name: bone_name.to_owned(),
                enabled,
            });
        Ok(())
    }

    pub fn remove_all_constraint_states(&mut self) {
        self.constraint_states.clear();
    }

    pub fn find_outside_parent(&self, subject_bone_name: &str) -> Option<&MotionOutsideParent> {
        self.outside_parents
            .iter()
            .find(|op| op.subject_bone_name == subject_bone_name)
    }

    pub fn add_outside_parent(&mut self, value: MotionOutsideParent) -> Result<(), Status> {
        if self.find_outside_parent(&value.subject_bone_name).is_some() {
            return Err(Status::ErrorModelBindingAlreadyExists);
        }
        self.outside_parents.push(value);
        Ok(())
    }

    pub fn remove_all_outside_parents(&mut self) {
        self.outside_parents.clear();
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionModelKeyframe, Status> {
        let mut keyframe = MotionModelKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            visible: buffer.read_bool()?,
            constraint_states: vec![],
            outside_parents: vec![],
            has_edge_option: buffer.read_bool()?,
            edge_scale_factor: buffer.read_f32_little_endian()?,
            edge_color: buffer.read_f32_4_little_endian()?.0,
            is_add_blending_enabled: buffer.read_bool()?,
            is_physics_simulation_enabled: buffer.read_bool()?,
        };
        for _ in 0..buffer.read_u32_little_endian()? {
            let bone_name = buffer.read_string(CodecType::Utf8)?;
            let enabled = buffer.read_bool()?;
            keyframe
                .add_constraint_state(&bone_name, enabled)
                .map_err(|_| Status::ErrorMotionModelKeyframeCorrupted)?;
        }
        for _ in 0..buffer.read_u32_little_endian()? {
            keyframe
                .add_outside_parent(MotionOutsideParent::parse_snapshot(buffer)?)
                .map_err(|_| Status::ErrorMotionModelKeyframeCorrupted)?;
        }
        Ok(keyframe)
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_bool(self.visible)?;
        buffer.write_bool(self.has_edge_option)?;
        buffer.write_f32_little_endian(self.edge_scale_factor)?;
        buffer.write_f32_4_little_endian(F128(self.edge_color))?;
        buffer.write_bool(self.is_add_blending_enabled)?;
        buffer.write_bool(self.is_physics_simulation_enabled)?;
        buffer.write_u32_little_endian(self.constraint_states.len() as u32)?;
        for constraint_state in &self.constraint_states {
            buffer.write_string(&constraint_state.bone_name, CodecType::Utf8)?;
            buffer.write_bool(constraint_state.enabled)?;
        }
        buffer.write_u32_little_endian(self.outside_parents.len() as u32)?;
        for outside_parent in &self.outside_parents {
            outside_parent.save_to_snapshot(buffer)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionMorphKeyframe {
    pub base: MotionKeyframeBase,
    pub weight: f32,
}

impl MotionMorphKeyframe {
    pub fn create(frame_index: u32) -> MotionMorphKeyframe {
        MotionMorphKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            weight: 0f32,
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionMorphKeyframe, Status> {
        Ok(MotionMorphKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            weight: buffer.read_f32_little_endian()?,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_little_endian(self.weight)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionSelfShadowKeyframe {
    pub base: MotionKeyframeBase,
    pub distance: f32,
    pub mode: i32,
}

impl MotionSelfShadowKeyframe {
    pub fn create(frame_index: u32) -> MotionSelfShadowKeyframe {
        MotionSelfShadowKeyframe {
            base: MotionKeyframeBase::new(frame_index),
            distance: 0f32,
            mode: 1,
        }
    }

    fn parse_snapshot(buffer: &mut Buffer) -> Result<MotionSelfShadowKeyframe, Status> {
        Ok(MotionSelfShadowKeyframe {
            base: MotionKeyframeBase::parse_snapshot(buffer)?,
            distance: buffer.read_f32_little_endian()?,
            mode: buffer.read_i32_little_endian()?,
        })
    }

    fn save_to_snapshot(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        self.base.save_to_snapshot(buffer)?;
        buffer.write_f32_little_endian(self.distance)?;
        buffer.write_i32_little_endian(self.mode)
    }
}

impl_keyframe!(
    MotionAccessoryKeyframe,
    MotionBoneKeyframe,
    MotionCameraKeyframe,
    MotionLightKeyframe,
    MotionModelKeyframe,
    MotionMorphKeyframe,
    MotionSelfShadowKeyframe
);

#[test]
fn test_bool_to_u8() {
    assert_eq!(1u8, true as u8);
    assert_eq!(0u8, false as u8);
}

#[test]
fn test_add_keyframe_already_exists() {
    let mut motion = Motion::empty();
    assert!(motion
        .add_camera_keyframe(MotionCameraKeyframe::create(0), 10)
        .is_ok());
    assert_eq!(
        Err(Status::ErrorMotionCameraKeyframeAlreadyExists),
        motion.add_camera_keyframe(MotionCameraKeyframe::create(0), 10)
    );
    assert!(motion
        .add_bone_keyframe(MotionBoneKeyframe::create(0), "センター", 10)
        .is_ok());
    assert_eq!(
        Err(Status::ErrorMotionBoneKeyframeAlreadyExists),
        motion.add_bone_keyframe(MotionBoneKeyframe::create(0), "センター", 10)
    );
    assert!(motion
        .add_bone_keyframe(MotionBoneKeyframe::create(0), "左足", 10)
        .is_ok());
}

#[test]
fn test_remove_keyframe_not_found() {
    let mut motion = Motion::empty();
    assert_eq!(
        Err(Status::ErrorMotionMorphKeyframeNotFound),
        motion.remove_morph_keyframe("まばたき", 3)
    );
    assert_eq!(
        Err(Status::ErrorMotionLightKeyframeNotFound),
        motion.remove_light_keyframe(3).map(|_| ())
    );
}

#[test]
fn test_sort_all_keyframes() {
    let mut motion = Motion::empty();
    for frame_index in [30, 10, 20] {
        motion
            .add_light_keyframe(MotionLightKeyframe::create(0), frame_index)
            .unwrap();
    }
    assert_eq!(30, motion.max_frame_index());
    motion.sort_all_keyframes();
    let frames: Vec<u32> = motion
        .get_all_light_keyframe_objects()
        .iter()
        .map(|keyframe| keyframe.base.frame_index)
        .collect();
    assert_eq!(vec![10, 20, 30], frames);
}

#[test]
fn test_search_closest() {
    let mut motion = Motion::empty();
    for frame_index in [0, 10, 20] {
        motion
            .add_bone_keyframe(MotionBoneKeyframe::create(0), "センター", frame_index)
            .unwrap();
        motion
            .add_camera_keyframe(MotionCameraKeyframe::create(0), frame_index)
            .unwrap();
    }
    let (prev, next) = motion.search_closest_bone_keyframes("センター", 10);
    assert_eq!(Some(0), prev.map(|k| k.base.frame_index));
    assert_eq!(Some(20), next.map(|k| k.base.frame_index));
    let (prev, next) = motion.search_closest_camera_keyframes(15);
    assert_eq!(Some(10), prev.map(|k| k.base.frame_index));
    assert_eq!(Some(20), next.map(|k| k.base.frame_index));
    let (prev, next) = motion.search_closest_camera_keyframes(25);
    assert_eq!(Some(20), prev.map(|k| k.base.frame_index));
    assert!(next.is_none());
    let (prev, next) = motion.search_closest_bone_keyframes("missing", 5);
    assert!(prev.is_none() && next.is_none());
}

#[test]
fn test_shift_and_restore_column() {
    let mut motion = Motion::empty();
    for frame_index in [0, 5, 6, 9] {
        motion
            .add_bone_keyframe(MotionBoneKeyframe::create(0), "センター", frame_index)
            .unwrap();
        motion
            .add_self_shadow_keyframe(MotionSelfShadowKeyframe::create(0), frame_index)
            .unwrap();
    }
    let column = motion.take_keyframe_column(MotionKeyframeTypes::ALL, 5);
    assert_eq!(2, column.len());
    motion.shift_keyframes(MotionKeyframeTypes::ALL, 6, -1);
    let track = motion
        .local_bone_motion_track_bundle
        .get_by_name("センター")
        .unwrap();
    assert_eq!(vec![0, 5, 8], track.ordered_frame_index);
    motion.shift_keyframes(MotionKeyframeTypes::ALL, 5, 1);
    motion.restore_keyframe_column(column, 5).unwrap();
    motion.sort_all_keyframes();
    let track = motion
        .local_bone_motion_track_bundle
        .get_by_name("センター")
        .unwrap();
    assert_eq!(vec![0, 5, 6, 9], track.ordered_frame_index);
    let frames: Vec<u32> = motion
        .get_all_self_shadow_keyframe_objects()
        .iter()
        .map(|keyframe| keyframe.base.frame_index)
        .collect();
    assert_eq!(vec![0, 5, 6, 9], frames);
}

#[test]
fn test_snapshot_keeps_only_requested_types() {
    let mut motion = Motion::empty();
    let mut bone_keyframe = MotionBoneKeyframe::create(0);
    bone_keyframe.translation = [1f32, 2f32, 3f32, 0f32];
    bone_keyframe.interpolation.orientation = [1, 2, 3, 4];
    motion
        .add_bone_keyframe(bone_keyframe.clone(), "右腕", 12)
        .unwrap();
    let mut model_keyframe = MotionModelKeyframe::create(0);
    model_keyframe.add_constraint_state("右足ＩＫ", false).unwrap();
    model_keyframe
        .add_outside_parent(MotionOutsideParent {
            subject_bone_name: "センター".to_owned(),
            target_object_name: "stage".to_owned(),
            target_bone_name: "root".to_owned(),
        })
        .unwrap();
    motion
        .add_model_keyframe(model_keyframe.clone(), 4)
        .unwrap();
    motion
        .add_camera_keyframe(MotionCameraKeyframe::create(0), 8)
        .unwrap();

    let mut buffer = MutableBuffer::create().unwrap();
    motion
        .save_to_snapshot(
            MotionKeyframeTypes::BONE | MotionKeyframeTypes::MODEL,
            &mut buffer,
        )
        .unwrap();
    let mut restored = Motion::empty();
    let types = restored
        .load_from_snapshot(&mut buffer.create_buffer_object())
        .unwrap();
    assert_eq!(MotionKeyframeTypes::BONE | MotionKeyframeTypes::MODEL, types);
    bone_keyframe.base.frame_index = 12;
    model_keyframe.base.frame_index = 4;
    assert_eq!(Some(&bone_keyframe), restored.find_bone_keyframe_object("右腕", 12));
    assert_eq!(Some(&model_keyframe), restored.find_model_keyframe_object(4));
    assert!(restored.get_all_camera_keyframe_objects().is_empty());
}

#[test]
fn test_snapshot_rejects_garbage() {
    let mut motion = Motion::empty();
    let mut buffer = Buffer::create(vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(
        Err(Status::ErrorInvalidSignature),
        motion.load_from_snapshot(&mut buffer)
    );
}
