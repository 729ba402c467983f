use archmage::SimdToken;
use criterion::{BenchmarkGroup, Criterion, Throughput, measurement::WallTime};
use sampleband::ChannelOrder;
use sampleband::pack;

// === SIMD tier detection ===

fn tier_name<T: SimdToken>() -> &'static str {
    if T::summon().is_some() {
        "available"
    } else {
        "not available"
    }
}

fn print_simd_info() {
    eprintln!("=== SIMD Tier Detection ===");
    #[cfg(target_arch = "x86_64")]
    {
        eprintln!(
            "  AVX2+FMA (x86-64-v3):    {}",
            tier_name::<archmage::X64V3Token>()
        );
    }
    eprintln!("  Scalar:                  always available");
    eprintln!("===========================");
}

// === Scalar disable/enable via archmage ===

fn disable_all_simd() {
    let _ = archmage::dangerously_disable_tokens_except_wasm(true);
}

fn enable_all_simd() {
    let _ = archmage::dangerously_disable_tokens_except_wasm(false);
}

// === Naive scalar baselines ===

fn naive_pack3(src: &[u8]) -> Vec<i32> {
    src.chunks_exact(3)
        .map(|p| ((p[0] as i32) << 16) | ((p[1] as i32) << 8) | p[2] as i32)
        .collect()
}

fn naive_pack_planes(planes: &[&[u8]]) -> Vec<i32> {
    (0..planes[0].len())
        .map(|i| {
            ((planes[0][i] as i32) << 16) | ((planes[1][i] as i32) << 8) | planes[2][i] as i32
        })
        .collect()
}

fn naive_unpack_green(words: &[i32]) -> Vec<u8> {
    words.iter().map(|&w| (w >> 8) as u8).collect()
}

fn naive_swap16(buf: &mut [u8]) {
    for s in buf.chunks_exact_mut(2) {
        s.swap(0, 1);
    }
}

fn naive_swap32(buf: &mut [u8]) {
    for s in buf.chunks_exact_mut(4) {
        s.reverse();
    }
}

// === Benchmark helpers ===

const W: usize = 1920;
const H: usize = 1080;

fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

/// Benchmark with 3 variants: sampleband (best SIMD), sampleband_scalar, naive.
fn bench_three<F, N>(group: &mut BenchmarkGroup<WallTime>, mut ours: F, mut naive: N)
where
    F: FnMut(),
    N: FnMut(),
{
    group.bench_function("sampleband", |b| b.iter(&mut ours));

    disable_all_simd();
    group.bench_function("sampleband_scalar", |b| b.iter(&mut ours));
    enable_all_simd();

    group.bench_function("naive", |b| b.iter(&mut naive));
}

// === Benchmark groups ===

fn bench_pack_interleaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_interleaved_rgb");
    let n = W * H * 3;
    group.throughput(Throughput::Bytes(n as u64));
    let src = pattern(n);
    bench_three(
        &mut group,
        || {
            std::hint::black_box(pack::pack_interleaved(&src, 3, ChannelOrder::Rgb).unwrap());
        },
        || {
            std::hint::black_box(naive_pack3(&src));
        },
    );
    group.finish();
}

fn bench_pack_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_planes_rgb");
    let n = W * H;
    group.throughput(Throughput::Bytes((n * 3) as u64));
    let (r, g, b) = (pattern(n), pattern(n + 1)[1..].to_vec(), pattern(n + 2)[2..].to_vec());
    let planes = [r.as_slice(), g.as_slice(), b.as_slice()];
    bench_three(
        &mut group,
        || {
            std::hint::black_box(pack::pack_planes(&planes, ChannelOrder::Rgb).unwrap());
        },
        || {
            std::hint::black_box(naive_pack_planes(&planes));
        },
    );
    group.finish();
}

fn bench_unpack_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack_channel_green");
    let n = W * H;
    group.throughput(Throughput::Bytes((n * 4) as u64));
    let words = pack::pack_interleaved(&pattern(n * 3), 3, ChannelOrder::Rgb).unwrap();
    bench_three(
        &mut group,
        || {
            std::hint::black_box(pack::unpack_channel(&words, 3, 1, ChannelOrder::Rgb));
        },
        || {
            std::hint::black_box(naive_unpack_green(&words));
        },
    );
    group.finish();
}

fn bench_swap(c: &mut Criterion, width: usize, naive: fn(&mut [u8])) {
    let mut group = c.benchmark_group(format!("swap_byte_order_{width}"));
    let n = W * H * width;
    group.throughput(Throughput::Bytes(n as u64));
    let mut ours = pattern(n);
    let mut base = pattern(n);
    bench_three(
        &mut group,
        || pack::swap_byte_order(&mut ours, width).unwrap(),
        || naive(&mut base),
    );
    group.finish();
}

// === Custom main for tier detection before criterion runs ===

fn main() {
    print_simd_info();

    let mut criterion = Criterion::default().configure_from_args();
    bench_pack_interleaved(&mut criterion);
    bench_pack_planes(&mut criterion);
    bench_unpack_channel(&mut criterion);
    bench_swap(&mut criterion, 2, naive_swap16);
    bench_swap(&mut criterion, 4, naive_swap32);
    criterion.final_summary();
}
