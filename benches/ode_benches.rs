use RustedODE::numerical::explicit_api::Solvers;
use RustedODE::numerical::ode_function::parse_expression;
use RustedODE::numerical::ode_types::{NumberOrVec, SolverKind, VarExpr};
use criterion::{Criterion, criterion_group, criterion_main};

fn solve_growth(kind: SolverKind) {
    let f = parse_expression(&VarExpr::Scalar("y".to_string())).unwrap();
    let mut solver = Solvers::new(kind, &f, 0.0, NumberOrVec::Number(1.0), 1.0, 1e-3).unwrap();
    solver.solve().unwrap();
}

fn bench_forward_euler(c: &mut Criterion) {
    c.bench_function("forward euler dy/dt = y", |b| {
        b.iter(|| solve_growth(SolverKind::ForwardEuler))
    });
}

fn bench_explicit_midpoint(c: &mut Criterion) {
    c.bench_function("explicit midpoint dy/dt = y", |b| {
        b.iter(|| solve_growth(SolverKind::ExplicitMidpoint))
    });
}

fn bench_rk4(c: &mut Criterion) {
    c.bench_function("RK4 dy/dt = y", |b| {
        b.iter(|| solve_growth(SolverKind::RK4))
    });
}

criterion_group!(
    benches,
    bench_forward_euler,
    bench_explicit_midpoint,
    bench_rk4
);
criterion_main!(benches);
