//! Dispatch loop benchmarks for Quill.
//!
//! Measures raw instruction throughput on loops, calls and heap access.

#![expect(clippy::unwrap_used, reason = "benchmarks abort on setup failure")]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quill_bytecode::Program;
use quill_compile::{compile, Globals};
use quill_syntax::parse;
use quill_vm::{silent_handler, Context, Vm, VmConfig};

struct Names<'a>(&'a Context);

impl Globals for Names<'_> {
    fn is_global(&self, name: &str) -> bool {
        self.0.is_global(name)
    }
}

fn build(ctx: &Context, source: &str) -> Program {
    let script = parse(source).unwrap();
    compile(&script, &Names(ctx)).unwrap()
}

/// Tight integer loop
const COUNT_LOOP: &str = "a = 0; while (a < 100000) ++a; return a;";

/// Recursive calls
const FIB: &str = "
fib = function(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); };
return fib(20);";

/// Array writes and reads
fn array_fill(n: usize) -> String {
    format!(
        "a = array(); for (let i = 0; i < {n}; ++i) a[i] = i;
         s = 0; foreach (x : a) s += x; return s;"
    )
}

fn bench_programs(c: &mut Criterion) {
    for (name, source) in [("vm/count_loop", COUNT_LOOP), ("vm/fib_20", FIB)] {
        let mut ctx = Context::new().with_print_handler(silent_handler());
        let program = build(&ctx, source);
        let mut vm = Vm::new(VmConfig::default());
        c.bench_function(name, |b| {
            b.iter(|| vm.run(black_box(&program), &mut ctx).unwrap());
        });
    }
}

fn bench_array_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("vm/array_fill");
    for size in [100, 1_000, 10_000] {
        let mut ctx = Context::new().with_print_handler(silent_handler());
        let program = build(&ctx, &array_fill(size));
        let mut vm = Vm::new(VmConfig::default());
        group.bench_with_input(BenchmarkId::new("elements", size), &program, |b, program| {
            b.iter(|| {
                let result = vm.run(black_box(program), &mut ctx).unwrap();
                ctx.collect();
                result
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_programs, bench_array_scaling);
criterion_main!(benches);
