//! Shared value and record types of the ODE layer: the scalar-or-vector
//! state, the textual right-hand-side description, test-case records, the
//! solution trajectory and the solver family tag.

use crate::errors::OdeError;
use itertools::Itertools;
use nalgebra::DVector;
use std::fmt;
use strum_macros::{Display, EnumIter};

/// default number of trajectory samples shown by the Display rendering
pub const DEFAULT_STEPS_TO_PRINT: usize = 10;

/// State of an ODE: either a scalar or a fixed-length vector.
///
/// All values taking part in one arithmetic operation or one solver run must
/// carry the same variant and, for vectors, the same length. Arithmetic is
/// exposed as named methods returning `Result` so that a variant or length
/// mismatch surfaces as a typed error instead of an implicit coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrVec {
    Number(f64),
    Vec(DVector<f64>),
}

impl NumberOrVec {
    pub fn from_components(components: Vec<f64>) -> Self {
        NumberOrVec::Vec(DVector::from_vec(components))
    }

    /// 1 for a scalar, the number of components for a vector
    pub fn len(&self) -> usize {
        match self {
            NumberOrVec::Number(_) => 1,
            NumberOrVec::Vec(v) => v.len(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, NumberOrVec::Number(_))
    }

    /// components in order; a scalar yields a single element
    pub fn iter(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            NumberOrVec::Number(n) => Box::new(std::iter::once(*n)),
            NumberOrVec::Vec(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    fn mismatch(&self, other: &Self, op: &str) -> OdeError {
        OdeError::Evaluation(format!(
            "operand mismatch in '{}': {} vs {}",
            op,
            self.shape_name(),
            other.shape_name()
        ))
    }

    fn shape_name(&self) -> String {
        match self {
            NumberOrVec::Number(_) => "scalar".to_string(),
            NumberOrVec::Vec(v) => format!("vector of length {}", v.len()),
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self, OdeError> {
        match (self, other) {
            (NumberOrVec::Number(a), NumberOrVec::Number(b)) => Ok(NumberOrVec::Number(a + b)),
            (NumberOrVec::Vec(a), NumberOrVec::Vec(b)) if a.len() == b.len() => {
                Ok(NumberOrVec::Vec(a + b))
            }
            _ => Err(self.mismatch(other, "add")),
        }
    }

    pub fn sub(&self, other: &Self) -> Result<Self, OdeError> {
        match (self, other) {
            (NumberOrVec::Number(a), NumberOrVec::Number(b)) => Ok(NumberOrVec::Number(a - b)),
            (NumberOrVec::Vec(a), NumberOrVec::Vec(b)) if a.len() == b.len() => {
                Ok(NumberOrVec::Vec(a - b))
            }
            _ => Err(self.mismatch(other, "sub")),
        }
    }

    /// broadcasts the scalar factor over every component
    pub fn scale(&self, factor: f64) -> Self {
        match self {
            NumberOrVec::Number(a) => NumberOrVec::Number(a * factor),
            NumberOrVec::Vec(a) => NumberOrVec::Vec(a.scale(factor)),
        }
    }

    pub fn div_elementwise(&self, other: &Self) -> Result<Self, OdeError> {
        match (self, other) {
            (NumberOrVec::Number(a), NumberOrVec::Number(b)) => {
                if *b == 0.0 {
                    return Err(OdeError::Evaluation("division by zero".to_string()));
                }
                Ok(NumberOrVec::Number(a / b))
            }
            (NumberOrVec::Vec(a), NumberOrVec::Vec(b)) if a.len() == b.len() => {
                if b.iter().any(|x| *x == 0.0) {
                    return Err(OdeError::Evaluation(
                        "division by zero component".to_string(),
                    ));
                }
                Ok(NumberOrVec::Vec(a.component_div(b)))
            }
            _ => Err(self.mismatch(other, "div_elementwise")),
        }
    }

    /// divides every component by the scalar divisor
    pub fn div_scalar(&self, divisor: f64) -> Result<Self, OdeError> {
        if divisor == 0.0 {
            return Err(OdeError::Evaluation("division by zero".to_string()));
        }
        Ok(self.scale(1.0 / divisor))
    }

    /// absolute error against another value of the same shape: |a - b| for
    /// scalars, the Euclidean norm of the difference for vectors
    pub fn abs_error(&self, other: &Self) -> Result<f64, OdeError> {
        match (self, other) {
            (NumberOrVec::Number(a), NumberOrVec::Number(b)) => Ok((a - b).abs()),
            (NumberOrVec::Vec(a), NumberOrVec::Vec(b)) if a.len() == b.len() => {
                Ok((a - b).norm())
            }
            _ => Err(self.mismatch(other, "abs_error")),
        }
    }
}

impl fmt::Display for NumberOrVec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NumberOrVec::Number(n) => write!(f, "{}", n),
            NumberOrVec::Vec(v) => {
                write!(f, "{}", v.iter().map(|x| x.to_string()).join(", "))
            }
        }
    }
}

/// Textual right-hand side of an ODE: one formula for a scalar problem or an
/// ordered formula per state component for a vector problem. Scalar formulas
/// reference `t` and `y`; vector formulas reference `t` and `y0..y{n-1}`.
#[derive(Debug, Clone, PartialEq)]
pub enum VarExpr {
    Scalar(String),
    Vector(Vec<String>),
}

impl VarExpr {
    pub fn n_components(&self) -> usize {
        match self {
            VarExpr::Scalar(_) => 1,
            VarExpr::Vector(components) => components.len(),
        }
    }
}

impl fmt::Display for VarExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VarExpr::Scalar(s) => write!(f, "{}", s),
            VarExpr::Vector(components) => write!(f, "[{}]", components.iter().join(", ")),
        }
    }
}

/// One integration problem, typically loaded from an external record and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct ODETestCase {
    pub expr: VarExpr,
    pub t0: f64,
    pub tf: f64,
    pub h: f64,
    pub y0: NumberOrVec,
    pub expected_final: Option<NumberOrVec>,
    pub expected_derivative: Option<VarExpr>,
}

impl fmt::Display for ODETestCase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ODE Test Case:")?;
        writeln!(f, "  Expression:\t\t{}", self.expr)?;
        writeln!(f, "  Initial time:\t\t{}", self.t0)?;
        writeln!(f, "  Final time:\t\t{}", self.tf)?;
        writeln!(f, "  Step size:\t\t{}", self.h)?;
        writeln!(f, "  Initial condition:\t{}", self.y0)?;
        if let Some(expected) = &self.expected_final {
            writeln!(f, "  Expected final value:\t{}", expected)?;
        }
        if let Some(derivative) = &self.expected_derivative {
            writeln!(f, "  Expected derivative:\t{}", derivative)?;
        }
        Ok(())
    }
}

/// Ordered (t, y) samples produced by one solver run over [t0, tf].
///
/// The stored data is immutable once the solve completes; `steps_to_print`
/// only controls how many samples the Display rendering shows and never
/// affects the stored samples or `get_result`.
#[derive(Debug, Clone)]
pub struct ODESolution {
    pub t_values: Vec<f64>,
    pub y_values: Vec<NumberOrVec>,
    pub steps_to_print: usize,
}

impl ODESolution {
    pub(crate) fn with_capacity(n_samples: usize) -> Self {
        ODESolution {
            t_values: Vec::with_capacity(n_samples),
            y_values: Vec::with_capacity(n_samples),
            steps_to_print: DEFAULT_STEPS_TO_PRINT,
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: NumberOrVec) {
        self.t_values.push(t);
        self.y_values.push(y);
    }

    /// number of stored samples, the initial condition included
    pub fn size(&self) -> usize {
        self.t_values.len()
    }

    /// final value of the trajectory, independent of steps_to_print
    pub fn get_result(&self) -> &NumberOrVec {
        self.y_values
            .last()
            .expect("a solution holds at least the initial sample")
    }

    /// strided view over the stored samples for reporting; the stride is
    /// max(1, samples / steps_to_print) and the exact final sample is always
    /// included. The iterator is a pure view and can be recreated at will.
    pub fn display_samples(&self) -> impl Iterator<Item = (f64, &NumberOrVec)> + '_ {
        let n = self.t_values.len();
        let stride = std::cmp::max(1, n / std::cmp::max(1, self.steps_to_print));
        (0..n.saturating_sub(1))
            .step_by(stride)
            .chain(n.checked_sub(1))
            .map(move |i| (self.t_values[i], &self.y_values[i]))
    }
}

impl fmt::Display for ODESolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\n  Solution trajectory:\n")?;
        for (t, y) in self.display_samples() {
            writeln!(f, "    t = {}, y = {}", t, y)?;
        }
        Ok(())
    }
}

/// The closed family of explicit fixed-step methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SolverKind {
    #[strum(to_string = "Forward Euler")]
    ForwardEuler,
    #[strum(to_string = "Explicit Midpoint")]
    ExplicitMidpoint,
    #[strum(to_string = "Runge-Kutta 4")]
    RK4,
}

impl SolverKind {
    /// theoretical global order of convergence; fixed metadata of the
    /// method, not recomputed from the stepping logic
    pub fn theoretical_order(&self) -> u32 {
        match self {
            SolverKind::ForwardEuler => 1,
            SolverKind::ExplicitMidpoint => 2,
            SolverKind::RK4 => 4,
        }
    }
}
