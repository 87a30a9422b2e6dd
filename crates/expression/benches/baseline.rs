// Baseline benchmarks for nebula-expression
// Run with: cargo bench --bench baseline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nebula_expression::{EvaluationContext, ExpressionEngine, Template};
use serde_json::Value;

fn benchmark_template_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/parse");

    group.bench_function("simple", |b| {
        b.iter(|| Template::new(black_box("Hello {{ $input }}!")))
    });

    group.bench_function("multiple_expressions", |b| {
        b.iter(|| Template::new(black_box("{{ $a }} + {{ $b }} = {{ $a + $b }}")))
    });

    group.finish();
}

fn benchmark_template_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/render");

    let engine = ExpressionEngine::new();
    let mut context = EvaluationContext::new();
    context.set_input(Value::String("World".to_string()));

    let simple = Template::new("Hello {{ $input }}!").unwrap();

    group.bench_function("simple", |b| {
        b.iter(|| simple.render(black_box(&engine), black_box(&context)))
    });

    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/evaluate");

    let engine = ExpressionEngine::new();
    let context = EvaluationContext::new();

    let test_cases = vec![
        ("literal", "42"),
        ("arithmetic", "2 + 3 * 4"),
        ("comparison", "10 > 5"),
        ("string_concat", r#""hello" + " " + "world""#),
        ("function_call", "uppercase('hello')"),
    ];

    for (name, expr) in test_cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), expr, |b, expr| {
            b.iter(|| engine.evaluate(black_box(expr), black_box(&context)))
        });
    }

    group.finish();
}

fn benchmark_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver/render_template");

    let context = serde_json::json!({"input": {"name": "Ada", "score": 3.5}})
        .as_object()
        .unwrap()
        .clone();

    group.bench_function("single_placeholder", |b| {
        b.iter(|| nebula_expression::render_template(black_box("Hello {{input.name}}"), &context))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_template_parse,
    benchmark_template_render,
    benchmark_evaluate,
    benchmark_resolver
);
criterion_main!(benches);
