//! Benchmarks for rule definition and loop expansion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use preprocessor::{preprocess, Preprocessor};

const RULES: &str = "\
#pragma macrule rule each
(f:$ident, list:$expr*) { $loop(i in list) { f($str(i), i); } }
#pragma macrule rule twice
(x:$expr) -> $expr { x * 2 }
";

fn generate_invocations(args: usize, calls: usize) -> String {
    let list: Vec<String> = (0..args).map(|i| format!("twice(v{})", i)).collect();
    let mut code = String::from(RULES);
    for _ in 0..calls {
        code.push_str(&format!("each(report, {})\n", list.join(", ")));
    }
    code
}

fn benchmark_loop_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("loop_expansion");

    for args in [1, 8, 64, 256].iter() {
        let code = generate_invocations(*args, 16);

        group.bench_with_input(BenchmarkId::from_parameter(args), &code, |b, code| {
            b.iter(|| {
                let mut pp = Preprocessor::default();
                rules::install(&mut pp);
                black_box(preprocess(&mut pp, "bench.c", code))
            });
        });
    }

    group.finish();
}

fn benchmark_rule_definition(c: &mut Criterion) {
    let mut code = String::new();
    for i in 0..200 {
        code.push_str(&format!(
            "#pragma macrule rule r{}\n(a:$expr, b:$stmt, rest:$expr*) -> $stmt {{ f(a, b); $loop(x in rest) {{ g(x); }} }}\n",
            i
        ));
    }

    c.bench_function("define_200_rules", |b| {
        b.iter(|| {
            let mut pp = Preprocessor::default();
            rules::install(&mut pp);
            black_box(preprocess(&mut pp, "defs.c", &code))
        });
    });
}

criterion_group!(benches, benchmark_loop_expansion, benchmark_rule_definition);
criterion_main!(benches);
