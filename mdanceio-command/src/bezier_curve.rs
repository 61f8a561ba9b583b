use cgmath::{ElementWise, Vector2, Vector4};

/// Cubic easing curve between two keyframes, anchored at (0, 0) and (127, 127).
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    c0: Vector2<u8>,
    c1: Vector2<u8>,
    interval: u32,
}

impl BezierCurve {
    const P0: Vector2<f32> = Vector2 { x: 0f32, y: 0f32 };
    const P1: Vector2<f32> = Vector2 {
        x: 127f32,
        y: 127f32,
    };
    const SOLVE_ITERATIONS: usize = 32;

    pub fn create(c0: &Vector2<u8>, c1: &Vector2<u8>, interval: u32) -> Self {
        Self {
            c0: *c0,
            c1: *c1,
            interval,
        }
    }

    pub fn from_parameters(parameters: Vector4<u8>, interval: u32) -> Self {
        Self::create(
            &Vector2::new(parameters.x, parameters.y),
            &Vector2::new(parameters.z, parameters.w),
            interval,
        )
    }

    /// Both handles sit on the diagonal, so the curve degenerates to a straight line.
    pub fn is_linear_parameters(parameters: Vector4<u8>) -> bool {
        parameters.x == parameters.y && parameters.z == parameters.w
    }

    pub fn is_linear(&self) -> bool {
        Self::is_linear_parameters(self.to_parameters())
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn c0(&self) -> Vector2<u8> {
        self.c0
    }

    pub fn c1(&self) -> Vector2<u8> {
        self.c1
    }

    pub fn to_parameters(&self) -> Vector4<u8> {
        Vector4 {
            x: self.c0.x,
            y: self.c0.y,
            z: self.c1.x,
            w: self.c1.y,
        }
    }

    fn control_points(&self) -> [Vector2<f32>; 4] {
        [
            Self::P0,
            self.c0.map(|v| v as f32),
            self.c1.map(|v| v as f32),
            Self::P1,
        ]
    }

    /// Point on the curve at parameter `s` in `[0, 1]`.
    pub fn point(&self, s: f32) -> Vector2<f32> {
        let [p0, p1, p2, p3] = self.control_points();
        let is = 1f32 - s;
        p0 * is.powi(3) + p1 * (3f32 * s * is.powi(2)) + p2 * (3f32 * s.powi(2) * is) + p3 * s.powi(3)
    }

    /// Finds the curve parameter whose x coordinate equals `amount * 127`.
    fn solve_parameter(&self, amount: f32) -> f32 {
        let target = amount.clamp(0f32, 1f32) * Self::P1.x;
        let (mut lower, mut upper) = (0f32, 1f32);
        for _ in 0..Self::SOLVE_ITERATIONS {
            let middle = (lower + upper) * 0.5f32;
            if self.point(middle).x < target {
                lower = middle;
            } else {
                upper = middle;
            }
        }
        (lower + upper) * 0.5f32
    }

    /// Eased value in `[0, 1]` for the normalized time `amount`.
    pub fn value(&self, amount: f32) -> f32 {
        self.point(self.solve_parameter(amount)).y / Self::P1.y
    }

    /// Splits the curve at the normalized time `t` into two curves that trace the same shape.
    ///
    /// Each half is rescaled into its own 0..127 box so it can be stored as keyframe
    /// interpolation parameters.
    pub fn split(&self, t: f32) -> (Self, Self) {
        let tv = t.clamp(0f32, 1f32);
        let s = self.solve_parameter(tv);
        let mut left = vec![];
        let mut right = vec![];
        Self::split_bezier_curve(&self.control_points(), s, &mut left, &mut right);
        right.reverse();
        let middle = left[3];
        let left_extent = middle - Self::P0;
        let right_extent = Self::P1 - middle;
        let normalize = |point: Vector2<f32>, origin: Vector2<f32>, extent: Vector2<f32>| {
            let scaled = (point - origin).mul_element_wise(Self::P1);
            Vector2::new(
                Self::quantize(scaled.x, extent.x),
                Self::quantize(scaled.y, extent.y),
            )
        };
        let left_interval = (self.interval as f32 * tv).round() as u32;
        let right_interval = self.interval.saturating_sub(left_interval);
        (
            Self::create(
                &normalize(left[1], Self::P0, left_extent),
                &normalize(left[2], Self::P0, left_extent),
                left_interval,
            ),
            Self::create(
                &normalize(right[1], middle, right_extent),
                &normalize(right[2], middle, right_extent),
                right_interval,
            ),
        )
    }

    fn quantize(scaled: f32, extent: f32) -> u8 {
        if extent.abs() <= f32::EPSILON {
            0u8
        } else {
            (scaled / extent).round().clamp(0f32, Self::P1.x) as u8
        }
    }

    fn split_bezier_curve(
        points: &[Vector2<f32>],
        t: f32,
        left: &mut Vec<Vector2<f32>>,
        right: &mut Vec<Vector2<f32>>,
    ) {
        if points.len() == 1 {
            left.push(points[0]);
            right.push(points[0]);
        } else {
            left.push(points[0]);
            right.push(points[points.len() - 1]);
            let new_points: Vec<Vector2<f32>> = points
                .windows(2)
                .map(|pair| pair[0] * (1f32 - t) + pair[1] * t)
                .collect();
            Self::split_bezier_curve(&new_points, t, left, right);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Vector2, Vector4};

    use super::BezierCurve;

    #[test]
    fn test_linear_parameters() {
        assert!(BezierCurve::is_linear_parameters(Vector4::new(20, 20, 107, 107)));
        assert!(BezierCurve::is_linear_parameters(Vector4::new(200, 200, 100, 100)));
        assert!(!BezierCurve::is_linear_parameters(Vector4::new(64, 0, 64, 127)));
    }

    #[test]
    fn test_value_of_linear_curve() {
        let curve = BezierCurve::create(&Vector2::new(20, 20), &Vector2::new(107, 107), 30);
        assert!((curve.value(0.25f32) - 0.25f32).abs() < 1e-3);
        assert!((curve.value(1f32) - 1f32).abs() < 1e-3);
    }

    #[test]
    fn test_split_linear_curve_stays_linear() {
        let curve = BezierCurve::from_parameters(Vector4::new(20, 20, 107, 107), 100);
        let (left, right) = curve.split(0.5f32);
        assert!(left.is_linear());
        assert!(right.is_linear());
        assert_eq!(50, left.interval());
        assert_eq!(50, right.interval());
    }

    #[test]
    fn test_split_preserves_shape() {
        let curve = BezierCurve::from_parameters(Vector4::new(64, 0, 64, 127), 100);
        let (left, right) = curve.split(0.3f32);
        assert_eq!(30, left.interval());
        assert_eq!(70, right.interval());
        let split_value = curve.value(0.3f32);
        for i in 1..10 {
            let amount = i as f32 / 10f32;
            let expected = curve.value(amount * 0.3f32) / split_value;
            assert!((left.value(amount) - expected).abs() < 0.05f32);
            let expected =
                (curve.value(0.3f32 + amount * 0.7f32) - split_value) / (1f32 - split_value);
            assert!((right.value(amount) - expected).abs() < 0.05f32);
        }
    }
}
