//! Filter Compilation and SQL Rendering Benchmarks
//!
//! Measures filter compilation against model fields, predicate rendering for
//! nested groups, and end-to-end inserts into an in-memory database.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quill_orm::backends::sqlite::SqliteDialect;
use quill_orm::sql::SqlRenderer;
use quill_orm::{
    and, compile_filter, fields, or, payload, reflect_fields, Database, DatabaseConfig, FieldSet,
    Filter, Model,
};
use tokio::runtime::Runtime;

struct User;

impl Model for User {
    fn model_name() -> &'static str {
        "User"
    }

    fn declare_fields(fields: &mut FieldSet) {
        fields
            .add("name", fields::char_field(255).not_null())
            .add("age", fields::integer_field().not_null())
            .add("score", fields::float_field());
    }
}

/// OR of `width` AND-groups, each pairing a name and an age
fn wide_filter(width: usize) -> Filter {
    or((0..width).map(|i| {
        and([
            Filter::eq("name", format!("user{}", i)),
            Filter::eq("age", i.to_string()),
        ])
    }))
}

/// Chain of single-child groups `depth` levels deep
fn deep_filter(depth: usize) -> Filter {
    (0..depth).fold(Filter::eq("age", 1), |inner, i| {
        and([inner, Filter::like("name", format!("%{}%", i))])
    })
}

fn bench_filter_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compilation");
    let fields = reflect_fields::<User>();

    for &width in &[1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::new("wide", width), &width, |b, &width| {
            b.iter(|| black_box(compile_filter(&fields, wide_filter(width)).ok()))
        });
    }

    for &depth in &[4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("deep", depth), &depth, |b, &depth| {
            b.iter(|| black_box(compile_filter(&fields, deep_filter(depth)).ok()))
        });
    }

    group.finish();
}

fn bench_select_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_rendering");
    let fields = reflect_fields::<User>();
    let renderer = SqlRenderer::new(&SqliteDialect);

    for &width in &[1usize, 10, 100] {
        let Ok(filters) = compile_filter(&fields, wide_filter(width)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("wide", width), &filters, |b, filters| {
            b.iter(|| black_box(renderer.select("user", filters, None)))
        });
    }

    group.bench_function("create_table", |b| {
        b.iter(|| black_box(renderer.create_table("user", &fields)))
    });

    group.finish();
}

fn bench_in_memory_insert(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let db = rt.block_on(async {
        let db = Database::connect(DatabaseConfig::in_memory()).await.unwrap();
        db.create_table_if_missing::<User>().await.unwrap();
        db
    });

    c.bench_function("in_memory_insert", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                db.create::<User>(payload! { "name" => "Renan", "age" => 26, "score" => 9.5 })
                    .await
                    .ok(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_filter_compilation,
    bench_select_rendering,
    bench_in_memory_insert
);
criterion_main!(benches);
