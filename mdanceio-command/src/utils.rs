use cgmath::{Quaternion, Vector4};

pub fn f128_to_vec4(v: [f32; 4]) -> Vector4<f32> {
    v.into()
}

/// Keyframes store orientations as `[x, y, z, w]`.
pub fn f128_to_quat(v: [f32; 4]) -> Quaternion<f32> {
    v.into()
}

pub fn quat_to_f128(v: Quaternion<f32>) -> [f32; 4] {
    v.into()
}

#[test]
fn test_quat_round_trip() {
    let q = Quaternion::new(0.5f32, 0.1f32, 0.2f32, 0.3f32);
    assert_eq!(q, f128_to_quat(quat_to_f128(q)));
    assert_eq!([0.1f32, 0.2f32, 0.3f32, 0.5f32], quat_to_f128(q));
}
