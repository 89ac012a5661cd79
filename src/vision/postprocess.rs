//! YOLOv8 pre- and post-processing
//!
//! Kept free of the ONNX runtime so geometry and suppression can be tested
//! on their own.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::labels::label_for;
use super::{BoundingBox, Detection};

/// Padding color used by Ultralytics letterboxing
const PAD_VALUE: u8 = 114;

/// Geometry for fitting a frame into a square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub size: u32,
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub resized_width: u32,
    pub resized_height: u32,
}

impl Letterbox {
    /// Compute letterbox geometry for a `width` × `height` source
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn new(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width.max(1) as f32).min(size as f32 / height.max(1) as f32);
        let resized_width = ((width as f32 * scale).round() as u32).clamp(1, size);
        let resized_height = ((height as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = (size - resized_width) as f32 / 2.0;
        let pad_y = (size - resized_height) as f32 / 2.0;

        Self {
            size,
            scale,
            pad_x,
            pad_y,
            resized_width,
            resized_height,
        }
    }

    /// Resize and pad an image into the model input square
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let resized = imageops::resize(
            image,
            self.resized_width,
            self.resized_height,
            FilterType::Triangle,
        );
        let mut canvas = RgbImage::from_pixel(self.size, self.size, Rgb([PAD_VALUE; 3]));
        imageops::replace(
            &mut canvas,
            &resized,
            i64::from(self.pad_x.floor() as u32),
            i64::from(self.pad_y.floor() as u32),
        );
        canvas
    }

    /// Map a box from model input space back to source pixels
    #[must_use]
    pub fn unmap(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (bbox.x_min - self.pad_x) / self.scale,
            (bbox.y_min - self.pad_y) / self.scale,
            (bbox.x_max - self.pad_x) / self.scale,
            (bbox.y_max - self.pad_y) / self.scale,
        )
    }
}

/// Planar CHW float tensor data scaled to `[0, 1]`
#[must_use]
pub fn to_chw(image: &RgbImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let plane = (w * h) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = f32::from(pixel[c]) / 255.0;
        }
    }

    data
}

/// A decoded candidate before suppression
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub score: f32,
    pub bbox: BoundingBox,
}

/// Decode a YOLOv8 `[4 + classes, anchors]` output into candidates
///
/// Rows are `cx, cy, w, h` followed by one score per class. Only the best
/// class per anchor is kept, and only if its score reaches `score_floor`.
/// Boxes are returned in source frame pixels.
#[must_use]
pub fn decode_output(
    data: &[f32],
    channels: usize,
    anchors: usize,
    letterbox: &Letterbox,
    score_floor: f32,
) -> Vec<Candidate> {
    if channels <= 4 || data.len() < channels * anchors {
        return Vec::new();
    }

    let at = |row: usize, col: usize| data[row * anchors + col];
    let mut out = Vec::new();

    for i in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..channels - 4 {
            let score = at(4 + class, i);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }

        if best_score.is_nan() || best_score < score_floor {
            continue;
        }

        let bbox = BoundingBox::from_center(at(0, i), at(1, i), at(2, i), at(3, i));
        out.push(Candidate {
            class_id: best_class,
            score: best_score,
            bbox: letterbox.unmap(bbox),
        });
    }

    out
}

/// Class-wise greedy non-maximum suppression
///
/// Output is ordered by descending score; ties keep input order.
#[must_use]
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Turn suppressed candidates into labeled detections
#[must_use]
pub fn into_detections(candidates: Vec<Candidate>) -> Vec<Detection> {
    candidates
        .into_iter()
        .map(|c| Detection::new(label_for(c.class_id), c.score.clamp(0.0, 1.0), c.bbox))
        .collect()
}
