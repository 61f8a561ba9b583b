#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    None,
    Type1,
    Type2,
}

impl From<u32> for CoverageMode {
    fn from(v: u32) -> Self {
        match v {
            1 => Self::Type1,
            2 => Self::Type2,
            _ => Self::None,
        }
    }
}

impl From<CoverageMode> for u32 {
    fn from(mode: CoverageMode) -> Self {
        match mode {
            CoverageMode::None => 0,
            CoverageMode::Type1 => 1,
            CoverageMode::Type2 => 2,
        }
    }
}

/// Self shadow parameters of the project.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowCamera {
    coverage_mode: CoverageMode,
    distance: f32,
    dirty: bool,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowCamera {
    pub const MAXIMUM_DISTANCE: f32 = 10000f32;
    pub const MINIMUM_DISTANCE: f32 = 0f32;
    pub const INITIAL_DISTANCE: f32 = 8875f32;

    pub fn new() -> Self {
        Self {
            coverage_mode: CoverageMode::Type1,
            distance: Self::INITIAL_DISTANCE,
            dirty: false,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn coverage_mode(&self) -> CoverageMode {
        self.coverage_mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_distance(&mut self, value: f32) {
        if value != self.distance {
            self.distance = value.clamp(Self::MINIMUM_DISTANCE, Self::MAXIMUM_DISTANCE);
            self.dirty = true;
        }
    }

    pub fn set_coverage_mode(&mut self, value: CoverageMode) {
        if value != self.coverage_mode {
            self.coverage_mode = value;
            self.dirty = true;
        }
    }

    pub fn set_dirty(&mut self, value: bool) {
        self.dirty = value;
    }
}

#[test]
fn test_distance_is_clamped() {
    let mut shadow_camera = ShadowCamera::new();
    shadow_camera.set_distance(20000f32);
    assert_eq!(ShadowCamera::MAXIMUM_DISTANCE, shadow_camera.distance());
    shadow_camera.set_distance(-1f32);
    assert_eq!(ShadowCamera::MINIMUM_DISTANCE, shadow_camera.distance());
    assert_eq!(CoverageMode::Type2, CoverageMode::from(u32::from(CoverageMode::Type2)));
}
