//! Horizontal direction bands
//!
//! The frame is split into three equal bands. Bands are inclusive-left and
//! exclusive-right, except the last, which also takes the right edge.

use serde::{Deserialize, Serialize};

use super::Detection;

/// Which third of the frame a detection sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Center,
    Right,
}

impl Direction {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Spoken phrase relative to the listener
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Left => "on your left",
            Self::Center => "ahead of you",
            Self::Right => "on your right",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a horizontal position into a direction band
///
/// Positions left of the frame fall into `Left`, positions at or past the
/// right edge into `Right`.
#[must_use]
pub fn classify_x(center_x: f32, frame_width: u32) -> Direction {
    debug_assert!(frame_width > 0, "frame width must be positive");

    let x = f64::from(center_x) * 3.0;
    let w = f64::from(frame_width);

    if x < w {
        Direction::Left
    } else if x < 2.0 * w {
        Direction::Center
    } else {
        Direction::Right
    }
}

/// Direction of a detection's box center within a frame of `frame_width`
#[must_use]
pub fn classify(detection: &Detection, frame_width: u32) -> Direction {
    classify_x(detection.bbox.center_x(), frame_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::BoundingBox;

    fn det(x_min: f32, x_max: f32) -> Detection {
        Detection::new("object", 0.9, BoundingBox::new(x_min, 0.0, x_max, 10.0))
    }

    #[test]
    fn person_on_the_left() {
        assert_eq!(classify(&det(10.0, 50.0), 300), Direction::Left);
    }

    #[test]
    fn band_edges() {
        // 300 wide: [0,100) left, [100,200) center, [200,300] right
        assert_eq!(classify_x(0.0, 300), Direction::Left);
        assert_eq!(classify_x(99.99, 300), Direction::Left);
        assert_eq!(classify_x(100.0, 300), Direction::Center);
        assert_eq!(classify_x(199.99, 300), Direction::Center);
        assert_eq!(classify_x(200.0, 300), Direction::Right);
        assert_eq!(classify_x(300.0, 300), Direction::Right);
    }

    #[test]
    fn boxes_entirely_in_outer_thirds() {
        let width = 640u32;
        let third = 640.0 / 3.0;
        let mut x = 0.0f32;
        while x + 1.0 <= third {
            assert_eq!(classify(&det(x, x + 1.0), width), Direction::Left);
            x += 7.5;
        }

        let mut x = 2.0 * third;
        while x + 1.0 <= 640.0 {
            assert_eq!(classify(&det(x, x + 1.0), width), Direction::Right);
            x += 7.5;
        }
    }

    #[test]
    fn total_over_every_pixel_column() {
        for width in [1u32, 2, 3, 7, 300, 641, 1920] {
            let mut counts = [0usize; 3];
            for col in 0..width {
                #[allow(clippy::cast_precision_loss)]
                let dir = classify_x(col as f32 + 0.5, width);
                counts[dir as usize] += 1;
            }
            assert_eq!(counts.iter().sum::<usize>(), width as usize);
        }
    }

    #[test]
    fn wide_box_spanning_frame_is_center() {
        assert_eq!(classify(&det(0.0, 300.0), 300), Direction::Center);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Direction::Center).unwrap(),
            "\"center\""
        );
        assert_eq!(Direction::Right.to_string(), "right");
    }
}
