use criterion::{Criterion, black_box, criterion_group, criterion_main};
use repo_fs::io::{self, RobustnessConfig};
use repo_fs::{NormalizedPath, compute_content_checksum};
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("p/acme/widget$bench.json"));
        let content = br#"{"packages":{"acme/widget":{"1.0.0":{"name":"acme/widget","version":"1.0.0"}}}}"#;
        let config = RobustnessConfig {
            enable_fsync: false,
            ..RobustnessConfig::default()
        };

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content), config).unwrap();
        })
    });
}

fn checksum_benchmark(c: &mut Criterion) {
    let shard = vec![b'x'; 64 * 1024];
    c.bench_function("checksum::compute_content_checksum (64 KiB)", |b| {
        b.iter(|| compute_content_checksum(black_box(&shard)))
    });
}

criterion_group!(benches, write_atomic_benchmark, checksum_benchmark);
criterion_main!(benches);
