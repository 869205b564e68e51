use std::hint::black_box;
use std::sync::Arc;

use bencher::{LOOKUPS, ROUTES};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use minnow_web::{handler_fn, Context, Router};

fn router() -> Router {
    let mut router = Router::new();
    for route in ROUTES {
        router
            .get(route, handler_fn(|ctx: Arc<Context>| async move { ctx.text("ok") }))
            .expect("benchmark routes should not conflict");
    }
    router
}

fn benchmark_router_resolve(criterion: &mut Criterion) {
    let router = router();
    let mut group = criterion.benchmark_group("router_resolve");

    for lookup in LOOKUPS {
        group.bench_with_input(BenchmarkId::from_parameter(lookup.name), lookup.path, |b, path| {
            b.iter(|| black_box(router.resolve(&Method::GET, black_box(path))));
        });
    }

    group.finish();
}

fn benchmark_router_build(criterion: &mut Criterion) {
    criterion.bench_function("router_build", |b| b.iter(|| black_box(router())));
}

criterion_group!(routing, benchmark_router_resolve, benchmark_router_build);
criterion_main!(routing);
