use cgmath::{Vector3, Vector4, Zero};
use nanoem::{
    common::{Buffer, Status, F128},
    motion::{MotionCameraKeyframe, MotionCameraKeyframeInterpolation, MotionKeyframeTypes},
    mutable::common::MutableBuffer,
};

use crate::{
    camera::PerspectiveCamera,
    motion::{KeyframeBound, NanoemMotion},
    motion_keyframe_selection::{KeyframeSelectionSet, MotionKeyframeSelection},
    utils::f128_to_vec4,
};

use super::updater::{
    split_bezier_channels, BezierCurveOverride, CommandMessage, KeyframeUpdater, Updatable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraKeyframeBezierControlPointParameter {
    pub look_at: Vector3<Vector4<u8>>,
    pub angle: Vector4<u8>,
    pub fov: Vector4<u8>,
    pub distance: Vector4<u8>,
}

impl Default for CameraKeyframeBezierControlPointParameter {
    fn default() -> Self {
        Self::from_channels([PerspectiveCamera::DEFAULT_BEZIER_CONTROL_POINT; 6])
    }
}

impl CameraKeyframeBezierControlPointParameter {
    /// Channels in keyframe order: look at x, y, z, angle, fov, then distance.
    pub fn channels(&self) -> [Vector4<u8>; 6] {
        [
            self.look_at.x,
            self.look_at.y,
            self.look_at.z,
            self.angle,
            self.fov,
            self.distance,
        ]
    }

    pub fn from_channels(channels: [Vector4<u8>; 6]) -> Self {
        Self {
            look_at: Vector3::new(channels[0], channels[1], channels[2]),
            angle: channels[3],
            fov: channels[4],
            distance: channels[5],
        }
    }

    pub fn from_interpolation(interpolation: &MotionCameraKeyframeInterpolation) -> Self {
        Self::from_channels([
            interpolation.lookat_x.into(),
            interpolation.lookat_y.into(),
            interpolation.lookat_z.into(),
            interpolation.angle.into(),
            interpolation.fov.into(),
            interpolation.distance.into(),
        ])
    }

    pub fn assign_to(&self, interpolation: &mut MotionCameraKeyframeInterpolation) {
        interpolation.lookat_x = self.look_at.x.into();
        interpolation.lookat_y = self.look_at.y.into();
        interpolation.lookat_z = self.look_at.z.into();
        interpolation.angle = self.angle.into();
        interpolation.fov = self.fov.into();
        interpolation.distance = self.distance.into();
    }
}

impl CommandMessage for CameraKeyframeBezierControlPointParameter {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        for channel in self.channels() {
            channel.write_message(buffer)?;
        }
        Ok(())
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        let mut channels = [Vector4::new(0u8, 0, 0, 0); 6];
        for channel in channels.iter_mut() {
            *channel = Vector4::read_message(buffer)?;
        }
        Ok(Self::from_channels(channels))
    }
}

/// Camera pose as stored in keyframes.
///
/// `distance` is kept with the sign of the live camera and flipped when written to a keyframe;
/// `fov` is kept in radians and rounded to whole degrees in the keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraKeyframeState {
    pub look_at: Vector4<f32>,
    pub angle: Vector4<f32>,
    pub distance: f32,
    pub fov: f32,
    pub bezier_param: CameraKeyframeBezierControlPointParameter,
    pub stage_index: u32,
    pub perspective: bool,
}

impl Default for CameraKeyframeState {
    fn default() -> Self {
        Self {
            look_at: Vector4::zero(),
            angle: Vector4::zero(),
            distance: PerspectiveCamera::INITIAL_DISTANCE,
            fov: PerspectiveCamera::INITIAL_FOV_RADIAN,
            bezier_param: CameraKeyframeBezierControlPointParameter::default(),
            stage_index: 0,
            perspective: true,
        }
    }
}

impl CameraKeyframeState {
    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        let angle = camera.angle();
        Self {
            look_at: camera.look_at().extend(1f32),
            angle: Vector4::new(
                angle.x * PerspectiveCamera::ANGLE_SCALE_FACTOR.x,
                angle.y * PerspectiveCamera::ANGLE_SCALE_FACTOR.y,
                angle.z * PerspectiveCamera::ANGLE_SCALE_FACTOR.z,
                0f32,
            ),
            distance: camera.distance(),
            fov: camera.fov_radians(),
            bezier_param: camera.bezier_control_points,
            stage_index: 0,
            perspective: camera.is_perspective(),
        }
    }

    pub fn from_keyframe(keyframe: &MotionCameraKeyframe) -> Self {
        Self {
            look_at: f128_to_vec4(keyframe.look_at),
            angle: f128_to_vec4(keyframe.angle),
            distance: -keyframe.distance,
            fov: (keyframe.fov as f32).to_radians(),
            bezier_param: CameraKeyframeBezierControlPointParameter::from_interpolation(
                &keyframe.interpolation,
            ),
            stage_index: keyframe.stage_index,
            perspective: keyframe.is_perspective_view,
        }
    }

    pub fn assign_to(&self, keyframe: &mut MotionCameraKeyframe) {
        keyframe.look_at = self.look_at.into();
        keyframe.angle = self.angle.into();
        keyframe.fov = self.fov.to_degrees().round() as i32;
        keyframe.distance = -self.distance;
        keyframe.is_perspective_view = self.perspective;
        keyframe.stage_index = self.stage_index;
        self.bezier_param.assign_to(&mut keyframe.interpolation);
    }

    /// Applies the state to the live camera.
    pub fn assign_to_camera(&self, camera: &mut PerspectiveCamera) {
        camera.set_look_at(self.look_at.truncate());
        camera.set_angle(Vector3::new(
            self.angle.x * PerspectiveCamera::ANGLE_SCALE_FACTOR.x,
            self.angle.y * PerspectiveCamera::ANGLE_SCALE_FACTOR.y,
            self.angle.z * PerspectiveCamera::ANGLE_SCALE_FACTOR.z,
        ));
        camera.set_distance(self.distance);
        camera.set_fov_radians(self.fov);
        camera.set_perspective(self.perspective);
    }
}

impl CommandMessage for CameraKeyframeState {
    fn write_message(&self, buffer: &mut MutableBuffer) -> Result<(), Status> {
        buffer.write_f32_4_little_endian(F128(self.look_at.into()))?;
        buffer.write_f32_4_little_endian(F128(self.angle.into()))?;
        buffer.write_f32_little_endian(self.distance)?;
        buffer.write_f32_little_endian(self.fov)?;
        self.bezier_param.write_message(buffer)?;
        buffer.write_u32_little_endian(self.stage_index)?;
        buffer.write_bool(self.perspective)
    }

    fn read_message(buffer: &mut Buffer) -> Result<Self, Status> {
        Ok(Self {
            look_at: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            angle: f128_to_vec4(buffer.read_f32_4_little_endian()?.0),
            distance: buffer.read_f32_little_endian()?,
            fov: buffer.read_f32_little_endian()?,
            bezier_param: CameraKeyframeBezierControlPointParameter::read_message(buffer)?,
            stage_index: buffer.read_u32_little_endian()?,
            perspective: buffer.read_bool()?,
        })
    }
}

impl Updatable for MotionCameraKeyframe {
    type State = CameraKeyframeState;
    type Track = ();
    type Target = ();
    type OverrideParameter = CameraKeyframeBezierControlPointParameter;

    const KEYFRAME_TYPE: MotionKeyframeTypes = MotionKeyframeTypes::CAMERA;
    const ALREADY_EXISTS: Status = Status::ErrorMotionCameraKeyframeAlreadyExists;
    const NOT_FOUND: Status = Status::ErrorMotionCameraKeyframeNotFound;
    const ADD_COMMAND_NAME: &'static str = "AddCameraKeyframeCommand";
    const REMOVE_COMMAND_NAME: &'static str = "RemoveCameraKeyframeCommand";

    fn create(frame_index: u32) -> Self {
        MotionCameraKeyframe::create(frame_index)
    }

    fn frame_index(&self) -> u32 {
        self.base.frame_index
    }

    fn find<'a>(motion: &'a NanoemMotion, _track: &(), frame_index: u32) -> Option<&'a Self> {
        motion.find_camera_keyframe_object(frame_index)
    }

    fn find_mut<'a>(
        motion: &'a mut NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> Option<&'a mut Self> {
        motion.find_mut_camera_keyframe_object(frame_index)
    }

    fn search_closest<'a>(
        motion: &'a NanoemMotion,
        _track: &(),
        frame_index: u32,
    ) -> (Option<&'a Self>, Option<&'a Self>) {
        motion.search_closest_camera_keyframes(frame_index)
    }

    fn insert(
        motion: &mut NanoemMotion,
        keyframe: Self,
        _track: &(),
        frame_index: u32,
    ) -> Result<(), Status> {
        motion.add_camera_keyframe(keyframe, frame_index)
    }

    fn remove(motion: &mut NanoemMotion, _track: &(), frame_index: u32) -> Result<Self, Status> {
        motion.remove_camera_keyframe(frame_index)
    }

    fn selection_set(selection: &MotionKeyframeSelection) -> &KeyframeSelectionSet<()> {
        &selection.camera
    }

    fn selection_set_mut(
        selection: &mut MotionKeyframeSelection,
    ) -> &mut KeyframeSelectionSet<()> {
        &mut selection.camera
    }

    fn capture_state(&self) -> CameraKeyframeState {
        CameraKeyframeState::from_keyframe(self)
    }

    fn restore_state(&mut self, state: &CameraKeyframeState) {
        state.assign_to(self)
    }

    fn apply_override(&mut self, parameter: &CameraKeyframeBezierControlPointParameter) {
        parameter.assign_to(&mut self.interpolation)
    }
}

/// Builds the updater registering the live state of `camera` at `frame_index`.
///
/// Look at and angle curves of the previous keyframe are split around the new keyframe; fov
/// and distance curves are left as they are.
pub fn build_updater_add(
    motion: &NanoemMotion,
    camera: &PerspectiveCamera,
    frame_index: u32,
    enable_bezier_curve_adjustment: bool,
) -> KeyframeUpdater<MotionCameraKeyframe> {
    let state = CameraKeyframeState::from_camera(camera);
    let mut updater = KeyframeUpdater::adding(motion, (), frame_index, state);
    if updater.updated() {
        return updater;
    }
    let bound = updater.bound(motion);
    if let Some(previous) = bound
        .previous
        .and_then(|previous| motion.find_camera_keyframe_object(previous))
    {
        updater.bezier_curve_override = Some(override_interpolation(
            previous,
            &mut updater.after_state.bezier_param,
            &bound,
            enable_bezier_curve_adjustment,
        ));
    }
    updater
}

fn override_interpolation(
    previous: &MotionCameraKeyframe,
    incoming: &mut CameraKeyframeBezierControlPointParameter,
    bound: &KeyframeBound,
    enable_bezier_curve_adjustment: bool,
) -> BezierCurveOverride<CameraKeyframeBezierControlPointParameter> {
    let before =
        CameraKeyframeBezierControlPointParameter::from_interpolation(&previous.interpolation);
    let adjust = enable_bezier_curve_adjustment;
    let mut channels = incoming.channels();
    let after = split_bezier_channels(
        before.channels(),
        &mut channels,
        bound,
        [adjust, adjust, adjust, adjust, false, false],
    );
    *incoming = CameraKeyframeBezierControlPointParameter::from_channels(channels);
    BezierCurveOverride {
        target_frame_index: previous.base.frame_index,
        after: CameraKeyframeBezierControlPointParameter::from_channels(after),
        before,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;
    use nanoem::motion::MotionCameraKeyframe;

    use crate::{camera::PerspectiveCamera, motion::NanoemMotion};

    use super::{build_updater_add, CameraKeyframeState};

    #[test]
    fn test_distance_and_fov_conversion() {
        let mut camera = PerspectiveCamera::new();
        camera.set_distance(50f32);
        camera.set_fov(45);
        let state = CameraKeyframeState::from_camera(&camera);
        let mut keyframe = MotionCameraKeyframe::create(0);
        state.assign_to(&mut keyframe);
        assert_eq!(-50f32, keyframe.distance);
        assert_eq!(45, keyframe.fov);
        let restored = CameraKeyframeState::from_keyframe(&keyframe);
        assert_eq!(50f32, restored.distance);
        let mut again = MotionCameraKeyframe::create(0);
        restored.assign_to(&mut again);
        assert_eq!(keyframe, again);
    }

    #[test]
    fn test_state_applies_to_camera() {
        let mut camera = PerspectiveCamera::new();
        camera.set_look_at(Vector3::new(1f32, 2f32, 3f32));
        camera.set_angle(Vector3::new(0.1f32, 0.2f32, 0.3f32));
        let state = CameraKeyframeState::from_camera(&camera);
        let mut other = PerspectiveCamera::new();
        state.assign_to_camera(&mut other);
        assert_eq!(camera.look_at(), other.look_at());
        assert_eq!(camera.angle(), other.angle());
    }

    #[test]
    fn test_build_updater_without_previous_keyframe() {
        let mut motion = NanoemMotion::empty();
        motion
            .add_camera_keyframe(MotionCameraKeyframe::create(30), 30)
            .unwrap();
        let updater = build_updater_add(&motion, &PerspectiveCamera::new(), 10, true);
        assert!(updater.selected());
        assert!(updater.bezier_curve_override.is_none());
    }
}
