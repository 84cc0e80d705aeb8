use centrack::{BoundingBox, Centroid, GateConfig, ObjectId};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgb, RgbImage};
use rand::Rng;
use speedcam::motion::{find_boxes, mask_motion, BackgroundModel, MotionConfig};
use speedcam::render::annotate;
use std::collections::BTreeMap;
use std::hint::black_box;

/// Create test image with realistic content
fn create_test_image(width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let r = ((x as f32 / width as f32) * 255.0) as u8;
        let g = ((y as f32 / height as f32) * 255.0) as u8;
        let b = ((x.wrapping_mul(y)) % 255) as u8;
        *pixel = Rgb([r, g, b]);
    }

    // Sensor noise
    let mut rng = rand::thread_rng();
    for _ in 0..(width * height / 100) {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        image.put_pixel(
            x,
            y,
            Rgb([rng.gen_range(0..255), rng.gen_range(0..255), rng.gen_range(0..255)]),
        );
    }

    image
}

/// Same scene with a few solid blocks pasted in
fn with_objects(base: &RgbImage, count: u32) -> RgbImage {
    let mut image = base.clone();
    for i in 0..count {
        let left = 40 + i * 150;
        for y in 100..180 {
            for x in left..(left + 100).min(image.width()) {
                image.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
    }
    image
}

fn bench_background_subtraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("background_subtraction");

    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)] {
        let background = create_test_image(width, height);
        let frame = with_objects(&background, 4);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(background, frame),
            |b, (background, frame)| {
                b.iter_batched(
                    || {
                        let mut model = BackgroundModel::new(1000);
                        model.apply(background).unwrap();
                        model
                    },
                    |mut model| model.apply(black_box(frame)).unwrap(),
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_mask_and_contours(c: &mut Criterion) {
    let background = create_test_image(1280, 720);
    let frame = with_objects(&background, 6);
    let mut model = BackgroundModel::new(1000);
    model.apply(&background).unwrap();
    let raw = model.apply(&frame).unwrap();
    let config = MotionConfig::default();

    c.bench_function("mask_motion_1280x720", |b| {
        b.iter(|| mask_motion(black_box(&raw), &config))
    });

    let cleaned = mask_motion(&raw, &config);
    c.bench_function("find_boxes_1280x720", |b| {
        b.iter(|| find_boxes(black_box(&cleaned), config.min_area))
    });
}

fn bench_annotation(c: &mut Criterion) {
    let frame = create_test_image(1280, 720);
    let gate = GateConfig::new(200, 600, 0.002, 3600.0);
    let detections: Vec<BoundingBox> = (0..20)
        .map(|i| BoundingBox::new(i * 60, 100, i * 60 + 50, 160))
        .collect();
    let tracked: BTreeMap<ObjectId, Centroid> = detections
        .iter()
        .enumerate()
        .map(|(i, b)| (ObjectId(i as u64), b.centroid()))
        .collect();

    c.bench_function("annotate_20_objects", |b| {
        b.iter(|| annotate(black_box(&frame), &gate, &detections, &tracked))
    });
}

criterion_group!(
    benches,
    bench_background_subtraction,
    bench_mask_and_contours,
    bench_annotation
);
criterion_main!(benches);
