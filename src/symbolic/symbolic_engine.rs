//! # Symbolic Engine Module
//!
//! Core symbolic expression type for ODE right-hand sides. An `Expr` is an
//! abstract syntax tree built by the parser (`parse_expr`) and evaluated at
//! concrete (t, y) points by the numerical layer.
//!
//! The engine supports:
//! - **Variables**: `Var(String)` - the independent variable `t` and the
//!   state components `y` / `y0, y1, ...`
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`
//!
//! Evaluation is checked: a division by a runtime zero surfaces as an
//! `OdeError::Evaluation` instead of silently producing inf/NaN.

use crate::errors::OdeError;
use std::fmt;

/// Symbolic expression enum representing a right-hand-side formula as an
/// abstract syntax tree. Uses Box<Expr> for recursive structures, allowing
/// arbitrarily deep expression trees.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "t", "y", "y0")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Extracts all unique variable names from the symbolic expression,
    /// sorted and deduplicated. Used to validate that a parsed formula only
    /// references the variables its ODE context provides.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();

        match self {
            Expr::Var(name) => {
                vars.push(name.clone());
            }
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                vars.extend(lhs.all_arguments_are_variables());
                vars.extend(rhs.all_arguments_are_variables());
            }
            Expr::Exp(expr) | Expr::Ln(expr) | Expr::sin(expr) | Expr::cos(expr) => {
                vars.extend(expr.all_arguments_are_variables());
            }
        }

        vars.sort();
        vars.dedup();
        vars
    }

    /// Evaluates the expression tree with the given variable bindings.
    ///
    /// `vars` and `values` are matched positionally. Division by a runtime
    /// zero and references to unbound variables are reported as
    /// `OdeError::Evaluation`.
    pub fn eval_checked(&self, vars: &[String], values: &[f64]) -> Result<f64, OdeError> {
        match self {
            Expr::Var(name) => vars
                .iter()
                .position(|v| v == name)
                .map(|index| values[index])
                .ok_or_else(|| {
                    OdeError::Evaluation(format!("variable '{}' is not bound", name))
                }),
            Expr::Const(val) => Ok(*val),
            Expr::Add(lhs, rhs) => {
                Ok(lhs.eval_checked(vars, values)? + rhs.eval_checked(vars, values)?)
            }
            Expr::Sub(lhs, rhs) => {
                Ok(lhs.eval_checked(vars, values)? - rhs.eval_checked(vars, values)?)
            }
            Expr::Mul(lhs, rhs) => {
                Ok(lhs.eval_checked(vars, values)? * rhs.eval_checked(vars, values)?)
            }
            Expr::Div(lhs, rhs) => {
                let denominator = rhs.eval_checked(vars, values)?;
                if denominator == 0.0 {
                    return Err(OdeError::Evaluation(format!(
                        "division by zero in '{}'",
                        self
                    )));
                }
                Ok(lhs.eval_checked(vars, values)? / denominator)
            }
            Expr::Pow(base, exp) => {
                Ok(base.eval_checked(vars, values)?.powf(exp.eval_checked(vars, values)?))
            }
            Expr::Exp(expr) => Ok(expr.eval_checked(vars, values)?.exp()),
            Expr::Ln(expr) => Ok(expr.eval_checked(vars, values)?.ln()),
            Expr::sin(expr) => Ok(expr.eval_checked(vars, values)?.sin()),
            Expr::cos(expr) => Ok(expr.eval_checked(vars, values)?.cos()),
        }
    }
}
