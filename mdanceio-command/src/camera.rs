use cgmath::{AbsDiffEq, Deg, Rad, Vector3, Vector4, Zero};

use crate::keyframe::update::CameraKeyframeBezierControlPointParameter;

/// The project camera as far as keyframes are concerned.
///
/// Setters are ignored while the camera is locked and mark it dirty only on an actual change.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    look_at: Vector3<f32>,
    angle: Vector3<f32>,
    distance: f32,
    fov: (i32, f32),
    pub bezier_control_points: CameraKeyframeBezierControlPointParameter,
    perspective: bool,
    locked: bool,
    dirty: bool,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            look_at: Self::INITIAL_LOOK_AT,
            angle: Vector3::zero(),
            distance: Self::INITIAL_DISTANCE,
            fov: (Self::INITIAL_FOV, Self::INITIAL_FOV_RADIAN),
            bezier_control_points: CameraKeyframeBezierControlPointParameter::default(),
            perspective: true,
            locked: false,
            dirty: false,
        }
    }
}

impl PerspectiveCamera {
    pub const ANGLE_SCALE_FACTOR: Vector3<f32> = Vector3::new(-1f32, 1f32, 1f32);
    pub const INITIAL_LOOK_AT: Vector3<f32> = Vector3::new(0f32, 10f32, 0f32);
    pub const INITIAL_DISTANCE: f32 = 45f32;
    pub const INITIAL_FOV_RADIAN: f32 =
        (Self::INITIAL_FOV as f32) * 0.01745329251994329576923690768489f32;
    pub const MAX_FOV: i32 = 135;
    pub const MIN_FOV: i32 = 1;
    pub const INITIAL_FOV: i32 = 30;
    pub const DEFAULT_BEZIER_CONTROL_POINT: Vector4<u8> = Vector4::new(20, 20, 107, 107);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn look_at(&self) -> Vector3<f32> {
        self.look_at
    }

    pub fn set_look_at(&mut self, value: Vector3<f32>) {
        if !self.locked && !value.abs_diff_eq(&self.look_at, Vector3::<f32>::default_epsilon()) {
            self.look_at = value;
            self.dirty = true;
        }
    }

    pub fn angle(&self) -> Vector3<f32> {
        self.angle
    }

    pub fn set_angle(&mut self, value: Vector3<f32>) {
        if !self.locked && !value.abs_diff_eq(&self.angle, Vector3::<f32>::default_epsilon()) {
            self.angle = value;
            self.dirty = true;
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_distance(&mut self, value: f32) {
        if !self.locked && !value.abs_diff_eq(&self.distance, f32::default_epsilon()) {
            self.distance = value;
            self.dirty = true;
        }
    }

    pub fn fov(&self) -> i32 {
        self.fov.0
    }

    pub fn set_fov(&mut self, value: i32) {
        let value = value.clamp(Self::MIN_FOV, Self::MAX_FOV);
        if !self.locked && value != self.fov.0 {
            self.fov.0 = value;
            self.fov.1 = Rad::from(Deg(value as f32)).0;
            self.dirty = true
        }
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov.1
    }

    pub fn set_fov_radians(&mut self, value: f32) {
        if !self.locked && !value.abs_diff_eq(&self.fov.1, f32::default_epsilon()) {
            self.fov.0 = Deg::from(Rad(value)).0.round() as i32;
            self.fov.1 = value;
            self.dirty = true;
        }
    }

    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    pub fn set_perspective(&mut self, value: bool) {
        if !self.locked && value != self.perspective {
            self.perspective = value;
            self.dirty = true;
        }
    }

    pub fn set_locked(&mut self, value: bool) {
        self.locked = value;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, value: bool) {
        self.dirty = value;
    }
}

#[test]
fn test_locked_camera_ignores_setters() {
    let mut camera = PerspectiveCamera::new();
    camera.set_locked(true);
    camera.set_distance(100f32);
    camera.set_fov(60);
    assert_eq!(PerspectiveCamera::INITIAL_DISTANCE, camera.distance());
    assert_eq!(PerspectiveCamera::INITIAL_FOV, camera.fov());
    assert!(!camera.is_dirty());
    camera.set_locked(false);
    camera.set_fov(200);
    assert_eq!(PerspectiveCamera::MAX_FOV, camera.fov());
    assert!(camera.is_dirty());
}
