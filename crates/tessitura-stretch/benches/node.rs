use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessitura_stretch::{BlockParams, PitchShiftNode, PitchShifter, SeekStrategy, StretchSettings};

const SAMPLE_RATE: f64 = 48000.0;
const QUANTUM: usize = 128;

fn sine(frames: usize, freq: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| (std::f32::consts::TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * 0.5)
        .collect()
}

fn node_with(seek: SeekStrategy) -> PitchShiftNode {
    let shifter = PitchShifter::builder()
        .sample_rate(SAMPLE_RATE)
        .settings(StretchSettings::default().seek(seek))
        .build()
        .expect("shifter");
    PitchShiftNode::with_shifter(shifter).expect("node")
}

fn bench_render_quantum(c: &mut Criterion) {
    let signal = sine(SAMPLE_RATE as usize, 440.0);
    let mut group = c.benchmark_group("render_quantum");

    for (name, seek) in [
        ("hierarchical", SeekStrategy::Hierarchical),
        ("exhaustive", SeekStrategy::Exhaustive),
    ] {
        for pitch in [0.5f32, 1.5, 2.0] {
            let params = BlockParams {
                pitch,
                ..BlockParams::default()
            };
            let mut node = node_with(seek);
            let mut out_l = vec![0.0f32; QUANTUM];
            let mut out_r = vec![0.0f32; QUANTUM];
            let mut blocks = signal.chunks_exact(QUANTUM).cycle();

            group.bench_with_input(BenchmarkId::new(name, pitch), &params, |b, params| {
                b.iter(|| {
                    let block = blocks.next().unwrap_or(&[]);
                    let channels = [block, block];
                    let input: &[&[f32]] = &channels;
                    let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
                    node.process(Some(black_box(input)), &mut output, params)
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_render_quantum);
criterion_main!(benches);
