use awful::{Config, Interpreter};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

// ============================================================================
// Scanning Benchmarks
// ============================================================================

fn bench_scan_small(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    c.bench_function("scan small expr", |b| {
        b.iter(|| {
            interp.reset();
            black_box(interp.scan("({x: ADD x 2} 3)").unwrap())
        })
    });
}

fn bench_scan_long_list(c: &mut Criterion) {
    let program = "PUSH 1 ".repeat(1000) + "NIL";
    let mut interp = Interpreter::new();
    c.bench_function("scan 1000 pushes", |b| {
        b.iter(|| {
            interp.reset();
            black_box(interp.scan(&program).unwrap())
        })
    });
}

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_eval_arithmetic(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    c.bench_function("eval nested arithmetic", |b| {
        b.iter(|| black_box(interp.eval_str("ADD MUL 2 3 SUB DIV 20 4 POW 2 3").unwrap()))
    });
}

fn bench_eval_application(c: &mut Criterion) {
    let mut interp = Interpreter::new();
    c.bench_function("eval closure application", |b| {
        b.iter(|| black_box(interp.eval_str("({x y: ADD x y} 1, 2)").unwrap()))
    });
}

fn bench_eval_factorial(c: &mut Criterion) {
    let program = "({!fact: (fact 20)} {n: COND (LE n 1) 1 (MUL n (fact (SUB n 1)))})";
    let mut interp = Interpreter::new();
    c.bench_function("eval factorial 20", |b| {
        b.iter(|| black_box(interp.eval_str(program).unwrap()))
    });
}

fn bench_eval_list_walk(c: &mut Criterion) {
    let items = "PUSH 1 ".repeat(100);
    let program = format!(
        "({{!len: (len {items}NIL)}} {{l: COND (ISNIL l) 0 (ADD 1 (len BOS l))}})"
    );
    let mut interp = Interpreter::with_config(Config::default().with_chunk_size(4096));
    c.bench_function("eval list length 100", |b| {
        b.iter(|| black_box(interp.eval_str(&program).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_scan_small,
    bench_scan_long_list,
    bench_eval_arithmetic,
    bench_eval_application,
    bench_eval_factorial,
    bench_eval_list_walk,
);
criterion_main!(benches);
