//! a collection of ready-made IVP examples with known behavior, used by the
//! demo driver as a fallback when no test-case file is available and by the
//! analysis section

use crate::numerical::ode_types::{NumberOrVec, ODETestCase, VarExpr};
use strum_macros::{Display, EnumIter};

/*
 exponential growth:
 y' = y, y(0) = 1
 exact solution: y(t) = exp(t)

 exponential decay:
 y' = -y, y(0) = 1
 exact solution: y(t) = exp(-t)

 predator-prey (Lotka-Volterra with the classic demo coefficients):
 y0' = 0.1*y0 - 0.02*y0*y1
 y1' = -0.3*y1 + 0.01*y0*y1
 y0(0) = 50 (prey), y1(0) = 20 (predator); no elementary closed form
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum OdeExample {
    ExponentialGrowth,
    ExponentialDecay,
    PredatorPrey,
}

impl OdeExample {
    pub fn test_case(&self) -> ODETestCase {
        match self {
            OdeExample::ExponentialGrowth => ODETestCase {
                expr: VarExpr::Scalar("y".to_string()),
                t0: 0.0,
                tf: 1.0,
                h: 0.001,
                y0: NumberOrVec::Number(1.0),
                expected_final: Some(NumberOrVec::Number(std::f64::consts::E)),
                expected_derivative: Some(VarExpr::Scalar("y".to_string())),
            },
            OdeExample::ExponentialDecay => ODETestCase {
                expr: VarExpr::Scalar("-y".to_string()),
                t0: 0.0,
                tf: 1.0,
                h: 0.001,
                y0: NumberOrVec::Number(1.0),
                expected_final: Some(NumberOrVec::Number((-1.0_f64).exp())),
                expected_derivative: Some(VarExpr::Scalar("-y".to_string())),
            },
            OdeExample::PredatorPrey => ODETestCase {
                expr: VarExpr::Vector(vec![
                    "0.1*y0 - 0.02*y0*y1".to_string(),
                    "-0.3*y1 + 0.01*y0*y1".to_string(),
                ]),
                t0: 0.0,
                tf: 1.0,
                h: 0.001,
                y0: NumberOrVec::from_components(vec![50.0, 20.0]),
                expected_final: None,
                expected_derivative: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::analysis::run_batch;
    use strum::IntoEnumIterator;

    #[test]
    fn test_examples_build_consistent_cases() {
        for example in OdeExample::iter() {
            let case = example.test_case();
            assert_eq!(case.expr.n_components(), case.y0.len());
            assert!(case.h > 0.0);
            assert!(case.tf > case.t0);
        }
    }

    #[test]
    fn test_example_batch_passes_with_loose_tolerance() {
        let cases: Vec<_> = OdeExample::iter().map(|e| e.test_case()).collect();
        let batch = run_batch(&cases, 1e-2);
        assert!(batch.all_passed());
    }
}
