//! Rollover must cost the same whether one period or a million elapsed.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vend_core::{AssetKind, PeriodState, SaleConfig, SaleParams};

fn config() -> SaleConfig {
    SaleConfig::new(SaleParams {
        purchase_asset: AssetKind::Native,
        period_secs: 3600,
        window: 256,
        target_per_period: 1_000_000_000,
        max_per_period: 2_000_000_000,
        starting_price: 1_000_000,
        sale_decimals: 9,
        purchase_decimals: 18,
    })
    .unwrap()
}

fn bench_rollover(c: &mut Criterion) {
    let cfg = config();
    let mut state = PeriodState::genesis(&cfg, 0);
    state.sold_this_period = cfg.target_scaled();

    let mut group = c.benchmark_group("rollover");
    for periods in [1u64, 256, 1_000_000, 1_000_000_000] {
        group.bench_function(format!("{periods}_periods"), |b| {
            b.iter(|| {
                black_box(&state)
                    .rolled_forward(&cfg, black_box(periods * 3600 + 7))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rollover);
criterion_main!(benches);
