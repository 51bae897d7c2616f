#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use wiring::{Binding, BehaviorKind, ConstructorInfo, Kernel, TypeCatalog, TypeDescriptor};

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(
            TypeDescriptor::builder::<A>()
                .constructor(
                    ConstructorInfo::of(|arguments| Ok(A(arguments.get(0)?, arguments.get(1)?)))
                        .parameter::<B>("b")
                        .parameter::<C>("c"),
                )
                .build(),
        )
        .with(
            TypeDescriptor::builder::<B>()
                .constructor(ConstructorInfo::of(|_| Ok(B(2))))
                .build(),
        )
        .with(
            TypeDescriptor::builder::<C>()
                .constructor(ConstructorInfo::of(|arguments| Ok(C(arguments.get(0)?))).parameter::<CA>("ca"))
                .build(),
        )
        .with(
            TypeDescriptor::builder::<CA>()
                .constructor(ConstructorInfo::of(|arguments| Ok(CA(arguments.get(0)?))).parameter::<CAA>("caa"))
                .build(),
        )
        .with(
            TypeDescriptor::builder::<CAA>()
                .constructor(ConstructorInfo::of(|arguments| Ok(CAA(arguments.get(0)?))).parameter::<CAAA>("caaa"))
                .build(),
        )
        .with(
            TypeDescriptor::builder::<CAAA>()
                .constructor(ConstructorInfo::of(|_| Ok(CAAA)))
                .build(),
        )
}

#[inline]
fn kernel_new() -> Kernel {
    Kernel::builder().introspector(catalog()).build()
}

#[inline]
fn kernel_get(kernel: &Kernel) {
    let _ = kernel.get::<A>().unwrap();
}

#[inline]
fn scope_get_and_dispose(kernel: &Kernel) {
    let scope = kernel.begin_scope().unwrap();
    let _ = scope.get::<A>().unwrap();
    scope.dispose().unwrap();
}

#[inline]
fn nested_scopes(kernel: &Kernel) {
    let session = kernel.begin_scope().unwrap();
    let request = session.begin_scope().unwrap();
    let _ = request.begin_scope().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let transient = kernel_new();
    let singleton = Kernel::builder()
        .introspector(catalog())
        .bind(Binding::to_self::<CAAA>().with_behavior(BehaviorKind::Singleton))
        .bind(Binding::to_self::<B>().with_behavior(BehaviorKind::Singleton))
        .build();

    c.bench_function("kernel_new", |b| b.iter(kernel_new))
        .bench_function("kernel_get_first", |b| b.iter(|| kernel_get(&kernel_new())))
        .bench_function("kernel_get_with_cached_plans", |b| {
            kernel_get(&transient);
            b.iter(|| kernel_get(&transient))
        })
        .bench_function("kernel_get_with_singletons", |b| b.iter(|| kernel_get(&singleton)))
        .bench_function("scope_get_and_dispose", |b| b.iter(|| scope_get_and_dispose(&transient)))
        .bench_function("nested_scopes", |b| b.iter(|| nested_scopes(&transient)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
