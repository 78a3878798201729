use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quince_chess::board::Position;
use quince_chess::engine::{CancelToken, Engine, EngineConfig, SearchLimits};

const MIDDLEGAME_FEN: &str =
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
const ENDGAME_FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

fn bench_fixed_depth_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_fixed_depth");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(6));
    group.sample_size(10);

    for (name, fen, depth) in [
        ("startpos_d5", Position::start().to_fen(), 5u8),
        ("middlegame_d5", MIDDLEGAME_FEN.to_owned(), 5),
        ("endgame_d7", ENDGAME_FEN.to_owned(), 7),
    ] {
        let position = Position::from_fen(&fen).expect("benchmark FEN should parse");

        group.bench_with_input(BenchmarkId::from_parameter(name), &depth, |b, &depth| {
            b.iter(|| {
                // Fresh engine per run so the transposition table does not
                // carry results between iterations.
                let mut engine = Engine::new(EngineConfig {
                    hash_mb: 32,
                    ..EngineConfig::default()
                });
                let report = engine
                    .search(
                        black_box(&position),
                        &SearchLimits::depth(depth),
                        &CancelToken::new(),
                    )
                    .expect("benchmark search should succeed");
                black_box(report.nodes)
            });
        });
    }

    group.finish();
}

criterion_group!(search_benches, bench_fixed_depth_search);
criterion_main!(search_benches);
