//! Template Parser Benchmarks
//!
//! Parsing throughput over synthetic template blobs

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use frostlod_assets::template::{lod_in_window, parse_bytes};

/// Build a blob with `materials` materials spread across `levels` levels
fn synthetic_blob(materials: usize, levels: u32) -> Vec<u8> {
    let mut data = b"\x89RES\x02\x00\x00\x00".to_vec();
    for level in 0..levels {
        for index in 0..materials {
            data.extend_from_slice(format!("mat_part_{index:03}\0").as_bytes());
            data.extend_from_slice(&[0x10, 0x00, 0x00, 0x00, 0xff, 0x7e]);
            data.extend_from_slice(format!("Mesh:vehicles/bench/bench_body_lod{level}\0").as_bytes());
            data.extend((0..64u8).map(|b| b.wrapping_mul(37)));
        }
    }
    data
}

fn bench_parse_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_bytes");

    for materials in [4, 32, 256].iter() {
        let blob = synthetic_blob(*materials, 6);
        group.throughput(Throughput::Bytes(blob.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(materials), &blob, |b, blob| {
            b.iter(|| black_box(parse_bytes(blob)));
        });
    }

    group.finish();
}

fn bench_lod_window(c: &mut Criterion) {
    let window = b"mat_hull\0\x12\x00\x00\x7fMesh:vehicles/tank/tank_hull_lod3\0\xde\xad";

    c.bench_function("lod_in_window", |b| {
        b.iter(|| black_box(lod_in_window(black_box(window))));
    });
}

criterion_group!(benches, bench_parse_bytes, bench_lod_window);
criterion_main!(benches);
