use cgmath::{AbsDiffEq, Quaternion, Vector3, Zero};

/// A static object placed in the stage, animated by its own motion.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessory {
    name: String,
    translation: Vector3<f32>,
    orientation: Quaternion<f32>,
    scale_factor: f32,
    opacity: f32,
    outside_parent: Option<(String, String)>,
    add_blending: bool,
    shadow: bool,
    visible: bool,
    dirty: bool,
}

impl Accessory {
    pub const INITIAL_SCALE_FACTOR: f32 = 1f32;
    pub const INITIAL_OPACITY: f32 = 1f32;

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            translation: Vector3::zero(),
            orientation: Quaternion::new(1f32, 0f32, 0f32, 0f32),
            scale_factor: Self::INITIAL_SCALE_FACTOR,
            opacity: Self::INITIAL_OPACITY,
            outside_parent: None,
            add_blending: false,
            shadow: true,
            visible: true,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.translation
    }

    pub fn set_translation(&mut self, value: Vector3<f32>) {
        if !value.abs_diff_eq(&self.translation, Vector3::<f32>::default_epsilon()) {
            self.translation = value;
            self.dirty = true;
        }
    }

    pub fn orientation(&self) -> Quaternion<f32> {
        self.orientation
    }

    pub fn set_orientation(&mut self, value: Quaternion<f32>) {
        if value != self.orientation {
            self.orientation = value;
            self.dirty = true;
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, value: f32) {
        if value != self.scale_factor {
            self.scale_factor = value;
            self.dirty = true;
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity is kept within `[0, 1]`.
    pub fn set_opacity(&mut self, value: f32) {
        let value = value.clamp(0f32, 1f32);
        if value != self.opacity {
            self.opacity = value;
            self.dirty = true;
        }
    }

    pub fn outside_parent(&self) -> Option<&(String, String)> {
        self.outside_parent.as_ref()
    }

    pub fn set_outside_parent(&mut self, value: Option<(String, String)>) {
        if value != self.outside_parent {
            self.outside_parent = value;
            self.dirty = true;
        }
    }

    pub fn is_add_blending_enabled(&self) -> bool {
        self.add_blending
    }

    pub fn set_add_blending_enabled(&mut self, value: bool) {
        self.add_blending = value;
    }

    pub fn is_shadow_enabled(&self) -> bool {
        self.shadow
    }

    pub fn set_shadow_enabled(&mut self, value: bool) {
        self.shadow = value;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, value: bool) {
        self.visible = value;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, value: bool) {
        self.dirty = value;
    }
}
