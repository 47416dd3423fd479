use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};

use bubblegrid::{classify, normalize, SheetConfig, SheetLayout, CANONICAL_HEIGHT, CANONICAL_WIDTH};

/// Canonical-size sheet with every row's first bubble filled.
fn synthetic_sheet(layout: &SheetLayout) -> GrayImage {
    let mut img = GrayImage::from_pixel(CANONICAL_WIDTH, CANONICAL_HEIGHT, Luma([235]));
    for row in layout.bubble_positions() {
        let b = row[0];
        let r = b.r - 1.0;
        for y in (b.y - r) as u32..=(b.y + r) as u32 {
            for x in (b.x - r) as u32..=(b.x + r) as u32 {
                let dx = x as f32 + 0.5 - b.x;
                let dy = y as f32 + 0.5 - b.y;
                if dx * dx + dy * dy <= r * r {
                    img.put_pixel(x, y, Luma([30]));
                }
            }
        }
    }
    img
}

/// Sheet pasted into a dark photo canvas, for the quad-detection path.
fn synthetic_photo(layout: &SheetLayout) -> GrayImage {
    let sheet = synthetic_sheet(layout);
    let mut canvas = GrayImage::from_pixel(795, 1042, Luma([15]));
    for (x, y, p) in sheet.enumerate_pixels() {
        canvas.put_pixel(x + 100, y + 100, *p);
    }
    canvas
}

fn bench_classify(c: &mut Criterion) {
    let layout = SheetLayout::new(SheetConfig::new(50, 4).unwrap());
    let sheet = synthetic_sheet(&layout);
    c.bench_function("classify_50x4_canonical", |b| {
        b.iter(|| classify(black_box(&sheet), &layout).unwrap())
    });
}

fn bench_normalize(c: &mut Criterion) {
    let layout = SheetLayout::new(SheetConfig::new(50, 4).unwrap());
    let photo = synthetic_photo(&layout);
    c.bench_function("normalize_photo_795x1042", |b| {
        b.iter(|| normalize(black_box(&photo)))
    });
}

criterion_group!(benches, bench_classify, bench_normalize);
criterion_main!(benches);
