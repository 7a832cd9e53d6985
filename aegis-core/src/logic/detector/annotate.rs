//! Annotation Renderer
//!
//! Draws a risk-coloured frame and a `"<class>  <conf>%"` label tab for
//! every detection on a copy of the input. The original image is never
//! mutated.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use once_cell::sync::Lazy;

use super::types::Detection;
use crate::constants::ANNOTATED_JPEG_QUALITY;
use crate::logic::threat::RiskLevel;

const COLOR_HIGH_RISK: Rgb<u8> = Rgb([255, 0, 0]);
const COLOR_MEDIUM_RISK: Rgb<u8> = Rgb([255, 140, 0]);
const COLOR_LOW_RISK: Rgb<u8> = Rgb([80, 200, 0]);

const COLOR_LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Padding around the label text inside its tab
const TAB_PAD_X: i32 = 4;
const TAB_PAD_Y: i32 = 3;

static LABEL_FONT: Lazy<Option<FontRef<'static>>> = Lazy::new(|| {
    match FontRef::try_from_slice(include_bytes!("../../../assets/DejaVuSans.ttf")) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Label font unavailable, tabs drawn without text: {}", e);
            None
        }
    }
});

pub fn risk_color(risk: RiskLevel) -> Rgb<u8> {
    match risk {
        RiskLevel::High => COLOR_HIGH_RISK,
        RiskLevel::Medium => COLOR_MEDIUM_RISK,
        RiskLevel::Low => COLOR_LOW_RISK,
    }
}

/// Render all detections onto an RGB copy of `image`
pub fn render(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    if w == 0 || h == 0 {
        return canvas;
    }

    let short_side = w.min(h);
    let thickness = (short_side / 400).max(1) + 1;
    let scale = PxScale::from((short_side as f32 / 55.0).max(12.0));

    for det in detections {
        let color = risk_color(det.risk_level);
        let b = &det.bbox;

        let x1 = b.x1.clamp(0, w - 1);
        let y1 = b.y1.clamp(0, h - 1);
        let x2 = b.x2.clamp(0, w - 1);
        let y2 = b.y2.clamp(0, h - 1);
        if x1 >= x2 || y1 >= y2 {
            continue;
        }

        for t in 0..thickness {
            let (bw, bh) = (x2 - x1 - 2 * t, y2 - y1 - 2 * t);
            if bw <= 0 || bh <= 0 {
                break;
            }
            let rect = Rect::at(x1 + t, y1 + t).of_size(bw as u32, bh as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        draw_label(&mut canvas, &label_text(det), x1, y1, scale, color);
    }

    canvas
}

/// `"truck  89%"`
pub fn label_text(det: &Detection) -> String {
    format!("{}  {:.0}%", det.class_name, det.confidence * 100.0)
}

/// Tab above the box, or inside it when the box touches the top edge
fn draw_label(canvas: &mut RgbImage, label: &str, x1: i32, y1: i32, scale: PxScale, color: Rgb<u8>) {
    let w = canvas.width() as i32;
    let font = LABEL_FONT.as_ref();

    let (text_w, text_h) = match font {
        Some(font) => {
            let (tw, th) = text_size(scale, font, label);
            (tw as i32, th as i32)
        }
        None => ((label.len() as f32 * scale.x * 0.55) as i32, scale.y as i32),
    };

    let tab_width = (text_w + 2 * TAB_PAD_X).min(w - x1);
    let tab_height = text_h + 2 * TAB_PAD_Y;
    let tab_y = (y1 - tab_height).max(0);
    if tab_width <= 0 || tab_height <= 0 {
        return;
    }

    let rect = Rect::at(x1, tab_y).of_size(tab_width as u32, tab_height as u32);
    draw_filled_rect_mut(canvas, rect, color);
    if let Some(font) = font {
        draw_text_mut(canvas, COLOR_LABEL_TEXT, x1 + TAB_PAD_X, tab_y + TAB_PAD_Y, scale, font, label);
    }
}

/// Save as JPEG at the annotation quality
pub fn save_jpeg(image: &RgbImage, path: &Path) -> ImageResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, ANNOTATED_JPEG_QUALITY);
    encoder.encode_image(image)
}
