use cgmath::Vector4;
use nanoem::{
    common::{Buffer, Status},
    motion::MotionKeyframeTypes,
    mutable::common::MutableBuffer,
    utils::CodecType,
};

use crate::{
    bezier_curve::BezierCurve,
    motion::{KeyframeBound, NanoemMotion},
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    project::Project,
};

/// Values that can be written to and read back from a command message buffer.
///
/// Fields are always written in declaration order, so a message read back produces a value
/// equal to the one written.
pub trait CommandMessage: Sized {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status>;
    fn read_message(buffer: &mut Buffer) -> Result<Self, Status>;
}

impl CommandMessage for () {
    fn write_message(&self, _buffer: &mut MutableBuffer) -> Result<(), Status> {
        Ok(())
    }

    fn read_message(_buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(())
    }
}

impl CommandMessage for String {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_string(self, CodecType::Utf8)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        buffer.read_string(CodecType::Utf8)
    }
}

impl CommandMessage for Vector4<u8> {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_interpolation((*self).into())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        buffer.read_interpolation().map(Vector4::from)
    }
}

/// A motion keyframe kind that keyframe commands can add, overwrite and remove.
pub trait Updatable: Sized + Clone + PartialEq + std::fmt::Debug {
    type State: CommandMessage + Clone + Default + PartialEq + std::fmt::Debug;
    /// Key of the track the keyframe lives in: the bone or morph name, `()` for global tracks.
    type Track: CommandMessage + Ord + Clone + std::fmt::Debug;
    /// Object whose live state is mirrored into the keyframes.
    type Target: Copy + std::fmt::Debug;
    /// Interpolation installed on the previous keyframe when an insertion splits its curve.
    type OverrideParameter: CommandMessage + Clone + PartialEq + std::fmt::Debug;

    const KEYFRAME_TYPE: MotionKeyframeTypes;
    const ALREADY_EXISTS: Status;
    const NOT_FOUND: Status;
    const ADD_COMMAND_NAME: &'static str;
    const REMOVE_COMMAND_NAME: &'static str;

    fn create(frame_index: u32) -> Self;
    fn frame_index(&self) -> u32;

    fn find<'a>(motion: &'a NanoemMotion, track: &Self::Track, frame_index: u32)
        -> Option<&'a Self>;
    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        track: &Self::Track,
        frame_index: u32,
    ) -> Option<&'a mut Self>;
    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        track: &Self::Track,
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>);
    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        track: &Self::Track,
        frame_index: u32,
    ) -> Result<(), Status>;
    fn remove(motion: &mut NanoemMotion, track: &Self::Track, frame_index: u32)
        -> Result<Self, Status>;

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<Self::Track>;
    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<Self::Track>;

    fn capture_state(&self) -> Self::State;
    fn restore_state(&mut self, state: &Self::State);

    fn apply_override(&mut self, _parameter: &Self::OverrideParameter) {}

    /// Runs once the keyframes of a command were registered to the motion.
    fn after_add(
        _project: &mut Project,
        _target: Self::Target,
        _updaters: &mut [KeyframeUpdater<Self>],
    ) {
    }

    /// Runs once the keyframes of a command were taken back from the motion.
    fn after_remove(
        _project: &mut Project,
        _target: Self::Target,
        _updaters: &[KeyframeUpdater<Self>],
    ) {
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurveOverride<P> {
    pub target_frame_index: u32,
    pub after: P,
    pub before: P,
}

impl<P: CommandMessage> CommandMessage for Option<BezierCurveOverride<P>> {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_bool(self.is_some())?;
        if let Some(value) = self {
            buffer.write_u32_little_endian(value.target_frame_index)?;
            value.after.write_message(buffer)?;
            value.before.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        if buffer.read_bool()? {
            Ok(Some(BezierCurveOverride {
                target_frame_index: buffer.read_u32_little_endian()?,
                after: P::read_message(buffer)?,
                before: P::read_message(buffer)?,
            }))
        } else {
            Ok(None)
        }
    }
}

/// One keyframe touched by a keyframe command, with the state written on redo and on undo.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeUpdater<K: Updatable> {
    pub frame_index: u32,
    pub track: K::Track,
    /// A keyframe already sat at `frame_index` and is overwritten in place.
    pub updated: bool,
    pub selected: bool,
    pub after_state: K::State,
    pub before_state: K::State,
    pub bezier_curve_override: Option<BezierCurveOverride<K::OverrideParameter>>,
    pub was_dirty: bool,
}

impl<K: Updatable> KeyframeUpdater<K> {
    /// Registers `state` at `frame_index`, overwriting the keyframe found there if any.
    pub fn adding(motion: &NanoemMotion, track: K::Track, frame_index: u32, state: K::State) -> Self {
        let existing = K::find(motion, &track, frame_index);
        Self {
            frame_index,
            updated: existing.is_some(),
            selected: existing.is_none(),
            before_state: existing.map(K::capture_state).unwrap_or_default(),
            after_state: state,
            track,
            bezier_curve_override: None,
            was_dirty: false,
        }
    }

    /// Takes the existing `keyframe` out of the motion.
    pub fn removing(track: K::Track, keyframe: &K, selected: bool) -> Self {
        Self {
            frame_index: keyframe.frame_index(),
            track,
            updated: false,
            selected,
            after_state: keyframe.capture_state(),
            before_state: keyframe.capture_state(),
            bezier_curve_override: None,
            was_dirty: false,
        }
    }

    pub fn updated(&self) -> bool {
        self.updated
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn bound(&self, motion: &NanoemMotion) -> KeyframeBound {
        let (previous, next) = K::search_closest(motion, &self.track, self.frame_index);
        KeyframeBound::new(
            previous.map(K::frame_index),
            self.frame_index,
            next.map(K::frame_index),
        )
    }
}

impl<K: Updatable> CommandMessage for KeyframeUpdater<K> {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_u32_little_endian(self.frame_index)?;
        self.track.write_message(buffer)?;
        buffer.write_bool(self.updated)?;
        buffer.write_bool(self.selected)?;
        self.after_state.write_message(buffer)?;
        self.before_state.write_message(buffer)?;
        self.bezier_curve_override.write_message(buffer)?;
        buffer.write_bool(self.was_dirty)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            frame_index: buffer.read_u32_little_endian()?,
            track: K::Track::read_message(buffer)?,
            updated: buffer.read_bool()?,
            selected: buffer.read_bool()?,
            after_state: K::State::read_message(buffer)?,
            before_state: K::State::read_message(buffer)?,
            bezier_curve_override: CommandMessage::read_message(buffer)?,
            was_dirty: buffer.read_bool()?,
        })
    }
}

/// Splits the curves of the previous keyframe around a keyframe inserted at `bound.current`.
///
/// Returns the parameters to install on the previous keyframe. Channels that get split or
/// that are linear also rewrite the matching entry of `incoming`, the new keyframe's own
/// parameters.
pub fn split_bezier_channels<const N: usize>(
    previous: [Vector4<u8>; N],
    incoming: &mut [Vector4<u8>; N],
    bound: &KeyframeBound,
    adjustable: [bool; N],
) -> [Vector4<u8>; N] {
    let mut after = previous;
    let interval = match (bound.previous, bound.next) {
        (Some(previous), Some(next)) if next > previous => Some((previous, next - previous)),
        _ => None,
    };
    for i in 0..N {
        if !adjustable[i] {
            continue;
        }
        if BezierCurve::is_linear_parameters(previous[i]) {
            incoming[i] = previous[i];
        } else if let Some((previous_frame_index, interval)) = interval {
            let curve = BezierCurve::from_parameters(previous[i], interval);
            let t = (bound.current.saturating_sub(previous_frame_index) as f64 / interval as f64)
                as f32;
            let (left, right) = curve.split(t);
            after[i] = left.to_parameters();
            incoming[i] = right.to_parameters();
        }
    }
    after
}

#[test]
fn test_split_bezier_channels() {
    let previous = [Vector4::new(20u8, 20, 107, 107), Vector4::new(64, 0, 64, 127)];
    let mut incoming = [Vector4::new(1u8, 2, 3, 4), Vector4::new(1, 2, 3, 4)];
    let bound = KeyframeBound::new(Some(0), 50, Some(100));
    let after = split_bezier_channels(previous, &mut incoming, &bound, [true, true]);
    assert_eq!(previous[0], after[0]);
    assert_eq!(previous[0], incoming[0]);
    assert_ne!(previous[1], after[1]);
    assert_ne!(Vector4::new(1, 2, 3, 4), incoming[1]);

    let mut incoming = [Vector4::new(1u8, 2, 3, 4), Vector4::new(1, 2, 3, 4)];
    let after = split_bezier_channels(previous, &mut incoming, &bound, [false, false]);
    assert_eq!(previous, after);
    assert_eq!([Vector4::new(1, 2, 3, 4); 2], incoming);

    let mut incoming = [Vector4::new(1u8, 2, 3, 4), Vector4::new(1, 2, 3, 4)];
    let open_bound = KeyframeBound::new(Some(0), 50, None);
    let after = split_bezier_channels(previous, &mut incoming, &open_bound, [true, true]);
    assert_eq!(previous, after);
    assert_eq!(Vector4::new(1, 2, 3, 4), incoming[1]);
}
