/// shared value and record types of the ODE layer: scalar-or-vector state,
/// textual right-hand sides, test cases, trajectories, the solver family tag
pub mod ode_types;
/// builds the right-hand-side evaluator f(t, y) out of parsed expressions
pub mod ode_function;
/// explicit fixed-step solvers: Forward Euler, Explicit Midpoint, RK4
pub mod explicit_api;
/// accuracy, order-of-convergence and runtime experiments over the solvers
pub mod analysis;
/// ready-made IVP examples with known behavior
pub mod ode_examples;
