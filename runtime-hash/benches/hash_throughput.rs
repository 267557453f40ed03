use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use multios_runtime_hash::{hash_once, Algorithm};

const ALGORITHMS: [Algorithm; 11] = [
    Algorithm::Md5,
    Algorithm::Sha1,
    Algorithm::Sha2_224,
    Algorithm::Sha2_256,
    Algorithm::Sha2_384,
    Algorithm::Sha2_512,
    Algorithm::Sha3_224,
    Algorithm::Sha3_256,
    Algorithm::Sha3_384,
    Algorithm::Sha3_512,
    Algorithm::Gost94CryptoPro,
];

fn throughput(c: &mut Criterion) {
    let data = vec![0x5au8; 64 * 1024];
    let mut group = c.benchmark_group("hash_once");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for algo in ALGORITHMS {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{:?}", algo)), &algo, |b, &algo| {
            b.iter(|| hash_once(algo, black_box(&data)));
        });
    }
    group.finish();
}

criterion_group!(benches, throughput);
criterion_main!(benches);
