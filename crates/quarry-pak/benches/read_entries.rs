//! Benchmarks for opening archives and reading entries

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use quarry_pak::{Pak, PakWriter};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 61) as u8).collect()
}

fn build(dir: &std::path::Path, name: &str, compress: bool, key: Option<&str>) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut writer = PakWriter::new();
    writer.set_compress(compress);
    if let Some(key) = key {
        writer.encrypt(key, true);
    }
    for i in 0..64 {
        writer.add_bytes(format!("file_{i}.bin"), payload(64 * 1024));
    }
    writer.write(&path).unwrap();
    path
}

fn bench_open(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let plain = build(dir.path(), "plain.pak", false, None);
    let encrypted = build(dir.path(), "encrypted.pak", false, Some("bench"));

    let mut group = c.benchmark_group("pak_open");
    group.bench_function("plain", |b| {
        b.iter(|| Pak::open(black_box(&plain), None).unwrap());
    });
    group.bench_function("encrypted", |b| {
        b.iter(|| Pak::open(black_box(&encrypted), Some("bench")).unwrap());
    });
    group.finish();
}

fn bench_read_entry(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let variants = [
        ("plain", build(dir.path(), "plain.pak", false, None), None),
        ("lz4", build(dir.path(), "lz4.pak", true, None), None),
        ("lz4_rc4", build(dir.path(), "full.pak", true, Some("bench")), Some("bench")),
    ];

    let mut group = c.benchmark_group("pak_read_entry");
    group.throughput(Throughput::Bytes(64 * 1024));
    for (label, path, key) in &variants {
        let mut pak = Pak::open(path, *key).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(label), &(), |b, _| {
            b.iter(|| pak.read_entry(black_box(17)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_open, bench_read_entry);
criterion_main!(benches);
