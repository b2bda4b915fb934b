//! Annotation decoding benchmarks
//!
//! Label files are small, but the verifier may be pointed at datasets with
//! hundreds of boxes per image (crowd scenes, aerial imagery).
//!
//! Run with: cargo bench --bench annotation_decoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detbench::annotation::{decode_labels, denormalize, LabelBox};

const BOX_COUNTS: [usize; 3] = [10, 100, 1_000];

fn label_file(boxes: usize) -> String {
    (0..boxes)
        .map(|i| {
            let t = (i % 97) as f64 / 97.0;
            format!("{} {:.6} {:.6} {:.6} {:.6}\n", i % 80, t, 1.0 - t, 0.05, 0.08)
        })
        .collect()
}

/// Benchmark decoding a whole label file
fn bench_decode_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_labels");

    for count in BOX_COUNTS {
        let contents = label_file(count);
        group.bench_with_input(BenchmarkId::new("valid", count), &contents, |b, text| {
            b.iter(|| decode_labels(black_box(text)));
        });
    }

    // Every third line truncated
    let mixed: String = label_file(1_000)
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i % 3 == 0 {
                format!("{}\n", &line[..line.len() / 2])
            } else {
                format!("{line}\n")
            }
        })
        .collect();
    group.bench_with_input(BenchmarkId::new("one_third_malformed", 1_000), &mixed, |b, text| {
        b.iter(|| decode_labels(black_box(text)));
    });

    group.finish();
}

/// Benchmark normalized -> pixel conversion
fn bench_denormalize(c: &mut Criterion) {
    let boxes: Vec<LabelBox> = decode_labels(&label_file(1_000)).boxes;

    c.bench_function("denormalize_1000_boxes_1080p", |b| {
        b.iter(|| {
            black_box(&boxes)
                .iter()
                .map(|label| denormalize(label, 1920, 1080))
                .fold(0u64, |acc, corners| acc + u64::from(corners.x2 - corners.x1))
        });
    });
}

criterion_group!(benches, bench_decode_labels, bench_denormalize);
criterion_main!(benches);
