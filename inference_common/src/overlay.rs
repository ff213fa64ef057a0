//! Draws detections onto a frame for the offline and live front-ends.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::Context;
use image::RgbImage;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detection::{BoxFormat, Detection};
use crate::palette::Palette;

const THICKNESS: i32 = 2;
const TEXT_SCALE: f32 = 16.0;

pub fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {path:?}"))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {path:?}"))
}

/// Corner + size of a reported box, whatever its encoding.
fn xywh(detection: &Detection, format: BoxFormat) -> (i32, i32, i32, i32) {
    let [a, b, c, d] = detection.bbox;
    match format {
        BoxFormat::Xywh => (a, b, c, d),
        BoxFormat::Xyxy => (a, b, c - a, d - b),
    }
}

/// Draws a rectangle per detection in its class colour, with a
/// `label: confidence` caption above it when a font is given.
pub fn draw_detections(
    image: &mut RgbImage,
    detections: &[Detection],
    format: BoxFormat,
    palette: &Palette,
    font: Option<&FontVec>,
) {
    for detection in detections {
        let color = palette.color(detection.class_idx);
        let (x, y, w, h) = xywh(detection, format);
        for t in 0..THICKNESS {
            let (w, h) = (w - 2 * t, h - 2 * t);
            if w <= 0 || h <= 0 {
                break;
            }
            draw_hollow_rect_mut(image, Rect::at(x + t, y + t).of_size(w as u32, h as u32), color);
        }

        if let Some(font) = font {
            let text = format!("{}: {:.4}", detection.label, detection.confidence);
            let text_y = (y - TEXT_SCALE as i32 - 2).max(0);
            draw_text_mut(image, color, x.max(0), text_y, PxScale::from(TEXT_SCALE), font, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn det(bbox: [i32; 4], class_idx: usize) -> Detection {
        Detection {
            label: "person".into(),
            confidence: 0.9,
            bbox,
            timestamp: None,
            frame_number: None,
            class_idx,
        }
    }

    #[test]
    fn draws_box_edges_in_class_colour() {
        let palette = Palette::new(1);
        let mut image = RgbImage::new(64, 64);
        draw_detections(&mut image, &[det([10, 10, 20, 20], 0)], BoxFormat::Xywh, &palette, None);
        assert_eq!(*image.get_pixel(10, 10), palette.color(0));
        assert_eq!(*image.get_pixel(11, 15), palette.color(0));
        assert_eq!(*image.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn xyxy_boxes_and_off_frame_boxes_are_drawn_safely() {
        let palette = Palette::new(1);
        let mut image = RgbImage::new(32, 32);
        draw_detections(
            &mut image,
            &[det([-5, -5, 40, 40], 0), det([3, 3, 3, 3], 0)],
            BoxFormat::Xyxy,
            &palette,
            None,
        );
        assert_eq!(*image.get_pixel(16, 16), Rgb([0, 0, 0]));
    }
}
