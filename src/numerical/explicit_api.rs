//! Explicit fixed-step IVP solvers: Forward Euler, Explicit Midpoint and the
//! classical Runge-Kutta 4 method.
//!
//! Every solver is constructed with `(f, t0, y0, t_bound, h)`, owns its own
//! (t, y) integration state for the duration of one solve and borrows the
//! right-hand side. `solve()` walks the fixed grid and returns the full
//! [`ODESolution`] trajectory. The number of steps is
//! `ceil((t_bound - t0) / h)` and the final step is clipped so the last
//! sample lands on t_bound exactly. Solvers are deterministic: repeated
//! solves with identical inputs produce identical trajectories.

use crate::errors::OdeError;
use crate::numerical::ode_function::OdeFunc;
use crate::numerical::ode_types::{NumberOrVec, ODESolution, SolverKind};
use log::debug;

fn check_grid(t0: f64, t_bound: f64, h: f64) -> Result<(), OdeError> {
    if !h.is_finite() || h <= 0.0 {
        return Err(OdeError::SolverInput(format!(
            "step size must be positive and finite, got {}",
            h
        )));
    }
    if !t0.is_finite() || !t_bound.is_finite() {
        return Err(OdeError::SolverInput(format!(
            "time interval must be finite, got [{}, {}]",
            t0, t_bound
        )));
    }
    if t_bound < t0 {
        return Err(OdeError::SolverInput(format!(
            "t_bound {} lies before t0 {}",
            t_bound, t0
        )));
    }
    Ok(())
}

/// Common stepping contract of the solver family; the update rule is the
/// only part that differs between methods.
trait Solver {
    fn kind(&self) -> SolverKind;
    fn grid(&self) -> (f64, f64, f64);
    fn state(&self) -> (f64, &NumberOrVec);
    /// advance (t, y) by one step of size h
    fn step(&mut self, h: f64) -> Result<(), OdeError>;
    /// pin the current time onto an exact grid value
    fn snap_time(&mut self, t: f64);
}

fn integrate<S: Solver>(solver: &mut S) -> Result<ODESolution, OdeError> {
    let (t0, t_bound, h) = solver.grid();
    let n_steps = ((t_bound - t0) / h).ceil() as usize;
    debug!(
        "{}: {} steps on [{}, {}] with h = {}",
        solver.kind(),
        n_steps,
        t0,
        t_bound,
        h
    );

    let mut solution = ODESolution::with_capacity(n_steps + 1);
    {
        let (t, y) = solver.state();
        solution.push(t, y.clone());
    }
    for i in 1..=n_steps {
        let t = solver.state().0;
        // the final step is clipped so the last sample lands on t_bound
        let h_i = if i == n_steps { t_bound - t } else { h };
        solver.step(h_i)?;
        if i == n_steps {
            solver.snap_time(t_bound);
        }
        let (t, y) = solver.state();
        solution.push(t, y.clone());
    }
    Ok(solution)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// `y_next = y + h * f(t, y)`
pub struct ForwardEulerSolver<'a> {
    f: &'a OdeFunc,
    t0: f64,
    y0: NumberOrVec,
    t_bound: f64,
    h: f64,
    t: f64,
    y: NumberOrVec,
}

impl<'a> ForwardEulerSolver<'a> {
    pub fn new(
        f: &'a OdeFunc,
        t0: f64,
        y0: NumberOrVec,
        t_bound: f64,
        h: f64,
    ) -> Result<Self, OdeError> {
        check_grid(t0, t_bound, h)?;
        Ok(ForwardEulerSolver {
            f,
            t0,
            y0: y0.clone(),
            t_bound,
            h,
            t: t0,
            y: y0,
        })
    }

    pub fn solve(&mut self) -> Result<ODESolution, OdeError> {
        self.t = self.t0;
        self.y = self.y0.clone();
        integrate(self)
    }
}

impl Solver for ForwardEulerSolver<'_> {
    fn kind(&self) -> SolverKind {
        SolverKind::ForwardEuler
    }

    fn grid(&self) -> (f64, f64, f64) {
        (self.t0, self.t_bound, self.h)
    }

    fn state(&self) -> (f64, &NumberOrVec) {
        (self.t, &self.y)
    }

    fn step(&mut self, h: f64) -> Result<(), OdeError> {
        let k1 = self.f.eval(self.t, &self.y)?;
        self.y = self.y.add(&k1.scale(h))?;
        self.t += h;
        Ok(())
    }

    fn snap_time(&mut self, t: f64) {
        self.t = t;
    }
}

/// `y_mid = y + (h/2) * f(t, y)`; `y_next = y + h * f(t + h/2, y_mid)`
pub struct ExplicitMidpointSolver<'a> {
    f: &'a OdeFunc,
    t0: f64,
    y0: NumberOrVec,
    t_bound: f64,
    h: f64,
    t: f64,
    y: NumberOrVec,
}

impl<'a> ExplicitMidpointSolver<'a> {
    pub fn new(
        f: &'a OdeFunc,
        t0: f64,
        y0: NumberOrVec,
        t_bound: f64,
        h: f64,
    ) -> Result<Self, OdeError> {
        check_grid(t0, t_bound, h)?;
        Ok(ExplicitMidpointSolver {
            f,
            t0,
            y0: y0.clone(),
            t_bound,
            h,
            t: t0,
            y: y0,
        })
    }

    pub fn solve(&mut self) -> Result<ODESolution, OdeError> {
        self.t = self.t0;
        self.y = self.y0.clone();
        integrate(self)
    }
}

impl Solver for ExplicitMidpointSolver<'_> {
    fn kind(&self) -> SolverKind {
        SolverKind::ExplicitMidpoint
    }

    fn grid(&self) -> (f64, f64, f64) {
        (self.t0, self.t_bound, self.h)
    }

    fn state(&self) -> (f64, &NumberOrVec) {
        (self.t, &self.y)
    }

    fn step(&mut self, h: f64) -> Result<(), OdeError> {
        let k1 = self.f.eval(self.t, &self.y)?;
        let y_mid = self.y.add(&k1.scale(h / 2.0))?;
        let k2 = self.f.eval(self.t + h / 2.0, &y_mid)?;
        self.y = self.y.add(&k2.scale(h))?;
        self.t += h;
        Ok(())
    }

    fn snap_time(&mut self, t: f64) {
        self.t = t;
    }
}

/// classical four-stage Runge-Kutta:
/// `y_next = y + (h/6) * (k1 + 2*k2 + 2*k3 + k4)`
pub struct RK4Solver<'a> {
    f: &'a OdeFunc,
    t0: f64,
    y0: NumberOrVec,
    t_bound: f64,
    h: f64,
    t: f64,
    y: NumberOrVec,
}

impl<'a> RK4Solver<'a> {
    pub fn new(
        f: &'a OdeFunc,
        t0: f64,
        y0: NumberOrVec,
        t_bound: f64,
        h: f64,
    ) -> Result<Self, OdeError> {
        check_grid(t0, t_bound, h)?;
        Ok(RK4Solver {
            f,
            t0,
            y0: y0.clone(),
            t_bound,
            h,
            t: t0,
            y: y0,
        })
    }

    pub fn solve(&mut self) -> Result<ODESolution, OdeError> {
        self.t = self.t0;
        self.y = self.y0.clone();
        integrate(self)
    }
}

impl Solver for RK4Solver<'_> {
    fn kind(&self) -> SolverKind {
        SolverKind::RK4
    }

    fn grid(&self) -> (f64, f64, f64) {
        (self.t0, self.t_bound, self.h)
    }

    fn state(&self) -> (f64, &NumberOrVec) {
        (self.t, &self.y)
    }

    fn step(&mut self, h: f64) -> Result<(), OdeError> {
        let k1 = self.f.eval(self.t, &self.y)?;
        let k2 = self
            .f
            .eval(self.t + h / 2.0, &self.y.add(&k1.scale(h / 2.0))?)?;
        let k3 = self
            .f
            .eval(self.t + h / 2.0, &self.y.add(&k2.scale(h / 2.0))?)?;
        let k4 = self.f.eval(self.t + h, &self.y.add(&k3.scale(h))?)?;
        let weighted = k1.add(&k2.scale(2.0))?.add(&k3.scale(2.0))?.add(&k4)?;
        self.y = self.y.add(&weighted.scale(h / 6.0))?;
        self.t += h;
        Ok(())
    }

    fn snap_time(&mut self, t: f64) {
        self.t = t;
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The closed set of solver instances, built from a [`SolverKind`] tag.
pub enum Solvers<'a> {
    ForwardEuler(ForwardEulerSolver<'a>),
    ExplicitMidpoint(ExplicitMidpointSolver<'a>),
    RK4(RK4Solver<'a>),
}

impl<'a> Solvers<'a> {
    pub fn new(
        kind: SolverKind,
        f: &'a OdeFunc,
        t0: f64,
        y0: NumberOrVec,
        t_bound: f64,
        h: f64,
    ) -> Result<Solvers<'a>, OdeError> {
        Ok(match kind {
            SolverKind::ForwardEuler => {
                Solvers::ForwardEuler(ForwardEulerSolver::new(f, t0, y0, t_bound, h)?)
            }
            SolverKind::ExplicitMidpoint => {
                Solvers::ExplicitMidpoint(ExplicitMidpointSolver::new(f, t0, y0, t_bound, h)?)
            }
            SolverKind::RK4 => Solvers::RK4(RK4Solver::new(f, t0, y0, t_bound, h)?),
        })
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solvers::ForwardEuler(_) => SolverKind::ForwardEuler,
            Solvers::ExplicitMidpoint(_) => SolverKind::ExplicitMidpoint,
            Solvers::RK4(_) => SolverKind::RK4,
        }
    }

    pub fn solve(&mut self) -> Result<ODESolution, OdeError> {
        match self {
            Solvers::ForwardEuler(solver) => solver.solve(),
            Solvers::ExplicitMidpoint(solver) => solver.solve(),
            Solvers::RK4(solver) => solver.solve(),
        }
    }
}
