use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_inject::*;

// ===== Micro Benchmarks =====

fn bench_simple_build(c: &mut Criterion) {
    c.bench_function("build_single_provider", |b| {
        b.iter(|| {
            build(|n: u64| { black_box(n); }, provide(|| 42u64)).unwrap();
        })
    });
}

fn bench_dependency_chain(c: &mut Criterion) {
    c.bench_function("build_chain_of_8", |b| {
        b.iter(|| {
            build(
                |s: String| { black_box(s); },
                configs([
                    provide(|| 1u8),
                    provide(|n: u8| u16::from(n) + 1),
                    provide(|n: u16| u32::from(n) + 1),
                    provide(|n: u32| u64::from(n) + 1),
                    provide(|n: u64| n as i64 + 1),
                    provide(|n: i64| n as f64 + 1.0),
                    provide(|n: f64| n as usize + 1),
                    provide(|n: usize| n.to_string()),
                ]),
            )
            .unwrap();
        })
    });
}

fn constant(i: u32) -> ProviderDescriptor {
    ProviderDescriptor::new(
        vec![],
        vec![OutputSlot::of::<u32>()],
        Location::named(format!("member-{}", i)),
        move |_| Ok(vec![into_value(i)]),
    )
}

fn bench_group_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_group_members");

    for size in [1u32, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut options = vec![declare_auto_group::<u32>()];
                options.extend((0..size).map(|i| provide(constant(i))));
                let members: Vec<u32> = inject(configs(options)).unwrap();
                black_box(members);
            })
        });
    }

    group.finish();
}

fn bench_per_scope(c: &mut Criterion) {
    let scopes: Vec<Scope> = (0..16).map(|i| Scope::new(format!("tenant-{}", i))).collect();

    c.bench_function("per_scope_16_tenants", |b| {
        b.iter(|| {
            let mut options = vec![
                declare_per_scope::<String>(),
                provide(|scope: Scope| scope.name().len() as u64),
            ];
            options.extend(
                scopes
                    .iter()
                    .map(|scope| provide_with_scope(scope, |n: u64| n.to_string())),
            );
            let map: std::collections::HashMap<Scope, String> = inject(configs(options)).unwrap();
            black_box(map);
        })
    });
}

// ===== Diagnostics =====

fn bench_debug_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("debug_overhead");

    group.bench_function("silent", |b| {
        b.iter(|| {
            build(|s: String| { black_box(s); }, configs([provide(|| 1u8), provide(|n: u8| n.to_string())]))
                .unwrap();
        })
    });

    group.bench_function("logger_and_dot", |b| {
        b.iter(|| {
            build_debug(
                debug_options([logger(|line| { black_box(line); }), visualizer(|dot| { black_box(dot); })]),
                |s: String| { black_box(s); },
                configs([provide(|| 1u8), provide(|n: u8| n.to_string())]),
            )
            .unwrap();
        })
    });

    group.finish();
}

criterion_group!(
    micro_benches,
    bench_simple_build,
    bench_dependency_chain,
    bench_group_scaling,
    bench_per_scope
);

criterion_group!(diagnostic_benches, bench_debug_overhead);

criterion_main!(micro_benches, diagnostic_benches);
