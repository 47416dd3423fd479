//! Shared test utilities for image-based unit tests.
//!
//! One synthetic sheet renderer instead of per-test copies: bubble outlines
//! for every choice, a filled disk for each marked one, drawn at the exact
//! layout-model coordinates so classifier tests exercise the real geometry
//! contract.

use image::{GrayImage, Luma};

use crate::layout::{Bubble, SheetLayout, CANONICAL_HEIGHT, CANONICAL_WIDTH, CHOICE_LABELS};

const PAPER: u8 = 235;
const OUTLINE: u8 = 110;
const INK: u8 = 30;

/// Render a canonical-size sheet with the given marks filled in.
///
/// `marks[i]` is the choice label filled for item `i`; `None` leaves the row
/// untouched (outlines only). Length must match the layout's item count.
pub(crate) fn render_marked_sheet(layout: &SheetLayout, marks: &[Option<char>]) -> GrayImage {
    assert_eq!(marks.len(), layout.bubble_positions().len());

    let mut img = GrayImage::from_pixel(CANONICAL_WIDTH, CANONICAL_HEIGHT, Luma([PAPER]));
    for (row, mark) in layout.bubble_positions().iter().zip(marks) {
        let marked_choice = mark.and_then(|m| CHOICE_LABELS.iter().position(|&c| c == m));
        for (choice, bubble) in row.iter().enumerate() {
            draw_ring(&mut img, bubble.x, bubble.y, bubble.r, OUTLINE);
            if Some(choice) == marked_choice {
                fill_bubble(&mut img, bubble);
            }
        }
    }
    img
}

/// Shade one bubble the way a pencil fill would, outline left intact.
pub(crate) fn fill_bubble(img: &mut GrayImage, bubble: &Bubble) {
    draw_disk(img, bubble.x, bubble.y, bubble.r - 1.0, INK);
}

/// Paste `sheet` onto a dark canvas at the given offset, simulating a
/// fronto-parallel photograph with background around the page.
pub(crate) fn embed_on_canvas(
    sheet: &GrayImage,
    canvas_w: u32,
    canvas_h: u32,
    offset_x: u32,
    offset_y: u32,
) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(canvas_w, canvas_h, Luma([15]));
    for (x, y, p) in sheet.enumerate_pixels() {
        let cx = x + offset_x;
        let cy = y + offset_y;
        if cx < canvas_w && cy < canvas_h {
            canvas.put_pixel(cx, cy, *p);
        }
    }
    canvas
}

fn draw_disk(img: &mut GrayImage, cx: f32, cy: f32, r: f32, value: u8) {
    for_circle_bbox(img, cx, cy, r, |img, x, y, d| {
        if d <= r {
            img.put_pixel(x, y, Luma([value]));
        }
    });
}

fn draw_ring(img: &mut GrayImage, cx: f32, cy: f32, r: f32, value: u8) {
    for_circle_bbox(img, cx, cy, r + 1.0, |img, x, y, d| {
        if (d - r).abs() <= 0.7 {
            img.put_pixel(x, y, Luma([value]));
        }
    });
}

fn for_circle_bbox(
    img: &mut GrayImage,
    cx: f32,
    cy: f32,
    r: f32,
    mut f: impl FnMut(&mut GrayImage, u32, u32, f32),
) {
    let (w, h) = img.dimensions();
    let x0 = ((cx - r).floor().max(0.0)) as u32;
    let y0 = ((cy - r).floor().max(0.0)) as u32;
    let x1 = (((cx + r).ceil() as i64).min(w as i64 - 1)).max(0) as u32;
    let y1 = (((cy + r).ceil() as i64).min(h as i64 - 1)).max(0) as u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            f(img, x, y, d);
        }
    }
}
