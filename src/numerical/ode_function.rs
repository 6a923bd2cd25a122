//! Builds a single right-hand-side evaluator `f(t, y) -> dy/dt` out of a
//! textual [`VarExpr`], one parsed component per state dimension.

use crate::errors::OdeError;
use crate::numerical::ode_types::{NumberOrVec, VarExpr};
use crate::symbolic::parse_expr::parse_expression as parse_expression_str;
use crate::symbolic::symbolic_engine::Expr;
use nalgebra::DVector;

/// Right-hand side of an ODE, owning one parsed expression per component and
/// the ordered variable names the formulas may reference.
///
/// Parsing is stateless: parsing the same `VarExpr` twice yields two
/// independent, functionally equivalent evaluators.
#[derive(Debug)]
pub struct OdeFunc {
    components: Vec<Expr>,
    var_names: Vec<String>,
    scalar: bool,
}

/// Parse a mathematical expression into a callable right-hand side of the
/// form `f(t, y)` (scalar) or `[f1(t, y0, y1, ...), f2(t, y0, y1, ...), ...]`
/// (vector). Unknown identifiers are rejected here, at parse time.
pub fn parse_expression(expr: &VarExpr) -> Result<OdeFunc, OdeError> {
    match expr {
        VarExpr::Scalar(formula) => {
            let component = parse_expression_str(formula)?;
            let func = OdeFunc {
                components: vec![component],
                var_names: vec!["t".to_string(), "y".to_string()],
                scalar: true,
            };
            func.check_identifiers()?;
            Ok(func)
        }
        VarExpr::Vector(formulas) => {
            if formulas.is_empty() {
                return Err(OdeError::Parse {
                    expression: expr.to_string(),
                    fragment: "[]".to_string(),
                });
            }
            let components = formulas
                .iter()
                .map(|formula| parse_expression_str(formula))
                .collect::<Result<Vec<_>, _>>()?;
            let mut var_names = vec!["t".to_string()];
            var_names.extend((0..formulas.len()).map(|i| format!("y{}", i)));
            let func = OdeFunc {
                components,
                var_names,
                scalar: false,
            };
            func.check_identifiers()?;
            Ok(func)
        }
    }
}

impl OdeFunc {
    /// number of state components the right-hand side produces
    pub fn n_dim(&self) -> usize {
        self.components.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    fn check_identifiers(&self) -> Result<(), OdeError> {
        for component in &self.components {
            for name in component.all_arguments_are_variables() {
                if !self.var_names.contains(&name) {
                    return Err(OdeError::Parse {
                        expression: component.to_string(),
                        fragment: name,
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluates the right-hand side at (t, y). The result carries the same
    /// variant as `y`; a variant or length mismatch between the expression
    /// arity and the state is an evaluation error.
    pub fn eval(&self, t: f64, y: &NumberOrVec) -> Result<NumberOrVec, OdeError> {
        match y {
            NumberOrVec::Number(value) => {
                if !self.scalar {
                    return Err(OdeError::Evaluation(format!(
                        "scalar state passed to a {}-component expression",
                        self.n_dim()
                    )));
                }
                let bound = [t, *value];
                let dydt = self.components[0].eval_checked(&self.var_names, &bound)?;
                Ok(NumberOrVec::Number(dydt))
            }
            NumberOrVec::Vec(values) => {
                if self.scalar {
                    return Err(OdeError::Evaluation(
                        "vector state passed to a scalar expression".to_string(),
                    ));
                }
                if values.len() != self.n_dim() {
                    return Err(OdeError::Evaluation(format!(
                        "state has {} components but the expression has {}",
                        values.len(),
                        self.n_dim()
                    )));
                }
                let mut bound = Vec::with_capacity(values.len() + 1);
                bound.push(t);
                bound.extend(values.iter().copied());
                let mut dydt = Vec::with_capacity(self.n_dim());
                for component in &self.components {
                    dydt.push(component.eval_checked(&self.var_names, &bound)?);
                }
                Ok(NumberOrVec::Vec(DVector::from_vec(dydt)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_identity_rhs() {
        let f = parse_expression(&VarExpr::Scalar("y".to_string())).unwrap();
        let dydt = f.eval(0.0, &NumberOrVec::Number(1.0)).unwrap();
        assert_eq!(dydt, NumberOrVec::Number(1.0));
    }

    #[test]
    fn test_scalar_rhs_uses_time() {
        let f = parse_expression(&VarExpr::Scalar("t*y + 1".to_string())).unwrap();
        let dydt = f.eval(2.0, &NumberOrVec::Number(3.0)).unwrap();
        assert_eq!(dydt, NumberOrVec::Number(7.0));
    }

    #[test]
    fn test_vector_rhs_component_order() {
        let f = parse_expression(&VarExpr::Vector(vec![
            "0.1*y0 - 0.02*y0*y1".to_string(),
            "-0.3*y1 + 0.01*y0*y1".to_string(),
        ]))
        .unwrap();
        let y = NumberOrVec::from_components(vec![50.0, 20.0]);
        let dydt = f.eval(0.0, &y).unwrap();
        match dydt {
            NumberOrVec::Vec(v) => {
                assert_relative_eq!(v[0], -15.0, epsilon = 1e-12);
                assert_relative_eq!(v[1], 4.0, epsilon = 1e-12);
            }
            other => panic!("expected vector output, got {}", other),
        }
    }

    #[test]
    fn test_unknown_identifier_fails_at_parse_time() {
        let err = parse_expression(&VarExpr::Scalar("y + z".to_string())).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
        // vector formulas may only reference indexed components
        let err =
            parse_expression(&VarExpr::Vector(vec!["y1".to_string(), "y".to_string()]))
                .unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_out_of_range_component_fails_at_parse_time() {
        let err = parse_expression(&VarExpr::Vector(vec!["y0".to_string(), "y2".to_string()]))
            .unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_variant_mismatch_fails_at_eval_time() {
        let f = parse_expression(&VarExpr::Scalar("y".to_string())).unwrap();
        let err = f
            .eval(0.0, &NumberOrVec::from_components(vec![1.0, 2.0]))
            .unwrap_err();
        assert_eq!(err.kind(), "EvaluationError");

        let f = parse_expression(&VarExpr::Vector(vec!["y0".to_string(), "y1".to_string()]))
            .unwrap();
        let err = f.eval(0.0, &NumberOrVec::Number(1.0)).unwrap_err();
        assert_eq!(err.kind(), "EvaluationError");
        let err = f
            .eval(0.0, &NumberOrVec::from_components(vec![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), "EvaluationError");
    }

    #[test]
    fn test_division_by_zero_fails_at_eval_time_only() {
        let f = parse_expression(&VarExpr::Scalar("1/y".to_string())).unwrap();
        let ok = f.eval(0.0, &NumberOrVec::Number(2.0)).unwrap();
        assert_eq!(ok, NumberOrVec::Number(0.5));
        let err = f.eval(0.0, &NumberOrVec::Number(0.0)).unwrap_err();
        assert_eq!(err.kind(), "EvaluationError");
    }

    #[test]
    fn test_reparse_yields_equivalent_evaluators() {
        let expr = VarExpr::Scalar("exp(t) - y/2".to_string());
        let f1 = parse_expression(&expr).unwrap();
        let f2 = parse_expression(&expr).unwrap();
        let y = NumberOrVec::Number(0.7);
        let a = f1.eval(0.3, &y).unwrap();
        let b = f2.eval(0.3, &y).unwrap();
        assert_eq!(a, b);
    }
}
