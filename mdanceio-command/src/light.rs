use cgmath::{AbsDiffEq, Vector3, Zero};

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    color: Vector3<f32>,
    direction: Vector3<f32>,
    dirty: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionalLight {
    pub const INITIAL_COLOR: Vector3<f32> =
        Vector3::new(154f32 / 255f32, 154f32 / 255f32, 154f32 / 255f32);
    pub const INITIAL_DIRECTION: Vector3<f32> = Vector3::new(-0.5f32, -1.0f32, 0.5f32);

    pub fn new() -> Self {
        Self {
            color: Self::INITIAL_COLOR,
            direction: Self::INITIAL_DIRECTION,
            dirty: false,
        }
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn set_color(&mut self, value: Vector3<f32>) {
        self.color = value;
        self.dirty = true;
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// A zero direction falls back to the initial one.
    pub fn set_direction(&mut self, value: Vector3<f32>) {
        self.direction =
            if !value.abs_diff_eq(&Vector3::<f32>::zero(), Vector3::<f32>::default_epsilon()) {
                value
            } else {
                Self::INITIAL_DIRECTION
            };
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, value: bool) {
        self.dirty = value;
    }
}

#[test]
fn test_zero_direction_falls_back() {
    let mut light = DirectionalLight::new();
    light.set_direction(Vector3::zero());
    assert_eq!(DirectionalLight::INITIAL_DIRECTION, light.direction());
    assert!(light.is_dirty());
}
