// In benches/codec_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;

use squeeze::bridge::{decode, encode};
use squeeze::lossy::quantize;
use squeeze::Algorithm;

/// Generates text with plenty of repetition.
fn generate_low_entropy_text(size: usize) -> String {
    let pattern = "the quick brown fox jumps over the lazy dog. ";
    pattern.chars().cycle().take(size).collect()
}

/// Generates text cycling through the printable ASCII range.
fn generate_high_entropy_text(size: usize) -> String {
    (0x20u8..0x7F).map(char::from).cycle().take(size).collect()
}

/// Generates space-separated integers for Golomb's numeric mode.
fn generate_numeric_text(count: usize) -> String {
    (0..count)
        .map(|i| ((i * 37) % 1000).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

const BENCH_TEXT_SIZE: usize = 16384; // 16 KB

fn bench_lossless_codecs(c: &mut Criterion) {
    let inputs = [
        ("Low Entropy", generate_low_entropy_text(BENCH_TEXT_SIZE)),
        ("High Entropy", generate_high_entropy_text(BENCH_TEXT_SIZE)),
    ];

    let mut group = c.benchmark_group("Lossless Codecs");
    group.throughput(criterion::Throughput::Bytes(BENCH_TEXT_SIZE as u64));

    for (label, text) in &inputs {
        for algo in Algorithm::ALL {
            let package = encode(algo, text).unwrap();
            group.bench_function(format!("Encode {} ({})", algo, label), |b| {
                b.iter(|| black_box(encode(algo, black_box(text))))
            });
            group.bench_function(format!("Decode {} ({})", algo, label), |b| {
                b.iter(|| black_box(decode(black_box(&package))))
            });
        }
    }

    let numbers = generate_numeric_text(2048);
    group.bench_function("Encode Golomb (Numeric)", |b| {
        b.iter(|| black_box(encode(Algorithm::Golomb, black_box(&numbers))))
    });

    group.finish();
}

fn bench_quantizer(c: &mut Criterion) {
    let image = Array2::from_shape_fn((256, 256), |(r, c)| ((r * 7 + c * 3) % 256) as u8);

    let mut group = c.benchmark_group("Quantizer");
    group.throughput(criterion::Throughput::Bytes(image.len() as u64));
    for bit_size in [1u32, 4, 8] {
        group.bench_function(format!("Quantize {} bits", bit_size), |b| {
            b.iter(|| black_box(quantize(black_box(&image), bit_size, None)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lossless_codecs, bench_quantizer);
criterion_main!(benches);
