use criterion::{Criterion, criterion_group, criterion_main};
use strata_sysconfig::{
    ConfigSnapshot, OptionValue, OverrideChain, OverrideLayer, OverrideTier,
    SystemConfigResolver, keys,
};

/// Benchmark: 典型四层覆盖链的整趟解析。
///
/// *Why*：解析发生在每次构建的关键路径上，确认默认路径保持轻量。
/// *How*：构造工程 / 平台 / 系统层 / 外部四层覆盖并完整解析。
/// *What*：关注单次 `resolve` 的耗时，包含校验引擎复检。
fn bench_full_resolution(c: &mut Criterion) {
    c.bench_function("sysconfig_full_resolution", |b| {
        b.iter(|| {
            let chain = OverrideChain::new()
                .with_layer(
                    OverrideLayer::new(OverrideTier::Project)
                        .with(keys::TIMER_POOL_MAX, OptionValue::Integer(16)),
                )
                .with_layer(
                    OverrideLayer::new(OverrideTier::Platform)
                        .with(keys::BUFFER_POOL_MAX, OptionValue::Integer(24)),
                )
                .with_layer(
                    OverrideLayer::new(OverrideTier::Layer)
                        .with(keys::ERROR_RANGE_BASE, OptionValue::Integer(9000)),
                )
                .with_layer(
                    OverrideLayer::new(OverrideTier::External)
                        .with(keys::USE_SOCKETS, OptionValue::Boolean(true)),
                );
            let resolved = SystemConfigResolver::new()
                .with_chain(chain)
                .resolve()
                .expect("bench configuration resolves");
            criterion::black_box(ConfigSnapshot::from_resolved(&resolved));
        });
    });
}

criterion_group!(resolution_benches, bench_full_resolution);
criterion_main!(resolution_benches);
