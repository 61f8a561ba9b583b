pub mod accessory;
pub mod bone;
pub mod camera;
pub mod light;
pub mod model;
pub mod morph;
pub mod self_shadow;
pub mod updater;

pub use accessory::AccessoryKeyframeState;
pub use bone::{BoneKeyframeBezierControlPointParameter, BoneKeyframeState};
pub use camera::{CameraKeyframeBezierControlPointParameter, CameraKeyframeState};
pub use light::LightKeyframeState;
pub use model::ModelKeyframeState;
pub use morph::MorphKeyframeState;
pub use self_shadow::SelfShadowKeyframeState;
pub use updater::{BezierCurveOverride, CommandMessage, KeyframeUpdater, Updatable};
