//! Controlled numerical experiments over the solver family: wall-clock
//! timing, absolute error against a known final value, empirical order of
//! convergence by step halving, and batch verification of test cases with
//! per-case failure isolation.

use crate::errors::OdeError;
use crate::numerical::explicit_api::Solvers;
use crate::numerical::ode_function::parse_expression;
use crate::numerical::ode_types::{NumberOrVec, ODESolution, ODETestCase, SolverKind, VarExpr};
use log::{info, warn};
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;
use tabled::{builder::Builder, settings::Style};

/// Wall-clock timing wrapper. The measurement brackets the whole call;
/// nothing inside the stepping loop is instrumented.
pub fn measure_execution_time<T>(f: impl FnOnce() -> T) -> (Duration, T) {
    let start = Instant::now();
    let out = f();
    (start.elapsed(), out)
}

/// absolute error `|final - expected|`
pub fn compute_error(result: &NumberOrVec, expected: &NumberOrVec) -> Result<f64, OdeError> {
    result.abs_error(expected)
}

/// Empirical order of convergence by step halving: the case is solved at h
/// and h/2 and the order is `log2(e(h) / e(h/2))`. A zero halved-step error
/// makes the ratio non-finite; the sentinel is returned as-is, not raised.
pub fn compute_order_of_convergence(
    case: &ODETestCase,
    kind: SolverKind,
) -> Result<f64, OdeError> {
    let expected = case.expected_final.as_ref().ok_or_else(|| {
        OdeError::SolverInput(
            "order of convergence needs an expected final value".to_string(),
        )
    })?;
    let f = parse_expression(&case.expr)?;
    let error_at = |h: f64| -> Result<f64, OdeError> {
        let mut solver = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, h)?;
        let solution = solver.solve()?;
        compute_error(solution.get_result(), expected)
    };
    let e_h = error_at(case.h)?;
    let e_half = error_at(case.h / 2.0)?;
    Ok((e_h / e_half).log2())
}

fn solve_case(case: &ODETestCase, kind: SolverKind) -> Result<ODESolution, OdeError> {
    let f = parse_expression(&case.expr)?;
    let mut solver = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, case.h)?;
    solver.solve()
}

/// Outcome of one (test case, solver) run.
#[derive(Debug)]
pub struct CaseReport {
    pub case_index: usize,
    pub solver: SolverKind,
    pub final_value: Option<NumberOrVec>,
    pub error: Option<f64>,
    pub elapsed: Duration,
    pub passed: bool,
    pub failure: Option<String>,
}

impl CaseReport {
    fn failed(case_index: usize, solver: SolverKind, elapsed: Duration, err: &OdeError) -> Self {
        CaseReport {
            case_index,
            solver,
            final_value: None,
            error: None,
            elapsed,
            passed: false,
            failure: Some(format!("{}: {}", err.kind(), err)),
        }
    }
}

/// Aggregate outcome of a batch run.
pub struct BatchReport {
    pub reports: Vec<CaseReport>,
}

impl BatchReport {
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.len() - self.passed_count()
    }

    pub fn summary_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(["case", "solver", "final value", "error", "time, ms", "status"]);
        for report in &self.reports {
            builder.push_record([
                report.case_index.to_string(),
                report.solver.to_string(),
                report
                    .final_value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                report
                    .error
                    .map(|e| format!("{:.3e}", e))
                    .unwrap_or_else(|| "-".to_string()),
                format!("{:.3}", report.elapsed.as_secs_f64() * 1000.0),
                if report.passed {
                    "passed".to_string()
                } else {
                    report
                        .failure
                        .clone()
                        .unwrap_or_else(|| "failed".to_string())
                },
            ]);
        }
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}

/// Runs one test case through one solver: parse, solve, time the solve, and
/// verify the final value when the case carries an expectation.
pub fn run_test_case(
    case: &ODETestCase,
    case_index: usize,
    kind: SolverKind,
    tolerance: f64,
) -> CaseReport {
    let (elapsed, outcome) = measure_execution_time(|| solve_case(case, kind));
    let solution = match outcome {
        Ok(solution) => solution,
        Err(err) => return CaseReport::failed(case_index, kind, elapsed, &err),
    };
    let final_value = solution.get_result().clone();

    let Some(expected) = &case.expected_final else {
        return CaseReport {
            case_index,
            solver: kind,
            final_value: Some(final_value),
            error: None,
            elapsed,
            passed: true,
            failure: None,
        };
    };

    match compute_error(&final_value, expected) {
        Ok(error) => {
            let passed = error <= tolerance;
            CaseReport {
                case_index,
                solver: kind,
                final_value: Some(final_value),
                error: Some(error),
                elapsed,
                passed,
                failure: if passed {
                    None
                } else {
                    Some(format!(
                        "error {:.3e} above tolerance {:.1e}",
                        error, tolerance
                    ))
                },
            }
        }
        Err(err) => CaseReport::failed(case_index, kind, elapsed, &err),
    }
}

/// Runs every test case through the whole solver family. One bad case never
/// stops the batch; failed runs are recorded on the report with their error
/// kind attached.
pub fn run_batch(cases: &[ODETestCase], tolerance: f64) -> BatchReport {
    let mut reports = Vec::new();
    for (case_index, case) in cases.iter().enumerate() {
        for kind in SolverKind::iter() {
            let report = run_test_case(case, case_index, kind, tolerance);
            if !report.passed {
                warn!(
                    "case {} with {} failed: {}",
                    case_index,
                    kind,
                    report.failure.as_deref().unwrap_or("verification failed")
                );
            }
            reports.push(report);
        }
    }
    let batch = BatchReport { reports };
    info!(
        "batch finished: {}/{} runs passed",
        batch.passed_count(),
        batch.reports.len()
    );
    batch
}

/// One known-value probe of the expression engine.
pub struct ParserProbe {
    pub expr: VarExpr,
    pub t: f64,
    pub y: NumberOrVec,
    pub expected: NumberOrVec,
}

/// Evaluates each probe and compares against its hand-computed value.
/// Returns true when every probe agrees within the tolerance.
pub fn run_parser_probes(probes: &[ParserProbe], tolerance: f64) -> bool {
    let mut all_passed = true;
    for (i, probe) in probes.iter().enumerate() {
        let outcome = parse_expression(&probe.expr)
            .and_then(|f| f.eval(probe.t, &probe.y))
            .and_then(|value| value.abs_error(&probe.expected));
        match outcome {
            Ok(error) if error <= tolerance => {
                info!("parser probe {} '{}' passed", i, probe.expr);
            }
            Ok(error) => {
                warn!(
                    "parser probe {} '{}' off by {:.3e}",
                    i, probe.expr, error
                );
                all_passed = false;
            }
            Err(err) => {
                warn!("parser probe {} '{}' failed: {}", i, probe.expr, err);
                all_passed = false;
            }
        }
    }
    all_passed
}

/// The stock probe set used by the demo driver.
pub fn default_parser_probes() -> Vec<ParserProbe> {
    vec![
        ParserProbe {
            expr: VarExpr::Scalar("y".to_string()),
            t: 0.0,
            y: NumberOrVec::Number(1.0),
            expected: NumberOrVec::Number(1.0),
        },
        ParserProbe {
            expr: VarExpr::Scalar("t*y + 1".to_string()),
            t: 2.0,
            y: NumberOrVec::Number(3.0),
            expected: NumberOrVec::Number(7.0),
        },
        ParserProbe {
            expr: VarExpr::Scalar("exp(t) - y^2".to_string()),
            t: 0.0,
            y: NumberOrVec::Number(2.0),
            expected: NumberOrVec::Number(-3.0),
        },
        ParserProbe {
            expr: VarExpr::Vector(vec![
                "0.1*y0 - 0.02*y0*y1".to_string(),
                "-0.3*y1 + 0.01*y0*y1".to_string(),
            ]),
            t: 0.0,
            y: NumberOrVec::from_components(vec![50.0, 20.0]),
            expected: NumberOrVec::from_components(vec![-15.0, 4.0]),
        },
    ]
}

////////////////////////////////////////////////////////////////////////////////////////
//          TESTS
///////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests_analysis {
    use super::*;
    use approx::assert_relative_eq;

    fn growth_case() -> ODETestCase {
        ODETestCase {
            expr: VarExpr::Scalar("y".to_string()),
            t0: 0.0,
            tf: 1.0,
            h: 0.01,
            y0: NumberOrVec::Number(1.0),
            expected_final: Some(NumberOrVec::Number(std::f64::consts::E)),
            expected_derivative: Some(VarExpr::Scalar("y".to_string())),
        }
    }

    #[test]
    fn test_order_of_convergence_forward_euler() {
        let order =
            compute_order_of_convergence(&growth_case(), SolverKind::ForwardEuler).unwrap();
        assert_relative_eq!(order, 1.0, epsilon = 0.2);
    }

    #[test]
    fn test_order_of_convergence_explicit_midpoint() {
        let order =
            compute_order_of_convergence(&growth_case(), SolverKind::ExplicitMidpoint).unwrap();
        assert_relative_eq!(order, 2.0, epsilon = 0.2);
    }

    #[test]
    fn test_order_of_convergence_rk4() {
        let order = compute_order_of_convergence(&growth_case(), SolverKind::RK4).unwrap();
        assert_relative_eq!(order, 4.0, epsilon = 0.4);
    }

    #[test]
    fn test_order_with_zero_halved_error_is_non_finite() {
        // y' = 1 is integrated exactly by every method, so both errors vanish
        let case = ODETestCase {
            expr: VarExpr::Scalar("1".to_string()),
            t0: 0.0,
            tf: 1.0,
            h: 0.1,
            y0: NumberOrVec::Number(0.0),
            expected_final: Some(NumberOrVec::Number(1.0)),
            expected_derivative: None,
        };
        let order = compute_order_of_convergence(&case, SolverKind::ForwardEuler).unwrap();
        assert!(!order.is_finite());
    }

    #[test]
    fn test_order_without_expectation_is_an_input_error() {
        let mut case = growth_case();
        case.expected_final = None;
        let err = compute_order_of_convergence(&case, SolverKind::RK4).unwrap_err();
        assert_eq!(err.kind(), "SolverInputError");
    }

    #[test]
    fn test_run_test_case_passes_within_tolerance() {
        let report = run_test_case(&growth_case(), 0, SolverKind::RK4, 1e-6);
        assert!(report.passed);
        assert!(report.error.unwrap() < 1e-6);
        assert!(report.elapsed < Duration::from_secs(60));
    }

    #[test]
    fn test_run_test_case_records_tolerance_violation() {
        // Euler at h = 0.01 carries an O(h) error far above 1e-9
        let report = run_test_case(&growth_case(), 0, SolverKind::ForwardEuler, 1e-9);
        assert!(!report.passed);
        assert!(report.failure.is_some());
        assert!(report.final_value.is_some());
    }

    #[test]
    fn test_batch_isolates_bad_cases() {
        let bad = ODETestCase {
            expr: VarExpr::Scalar("y +* 2".to_string()),
            ..growth_case()
        };
        let batch = run_batch(&[growth_case(), bad, growth_case()], 1e-1);
        // three cases, three solvers each; the malformed one fails, the rest run
        assert_eq!(batch.reports.len(), 9);
        assert_eq!(batch.failed_count(), 3);
        assert!(!batch.all_passed());
        assert!(
            batch.reports[3]
                .failure
                .as_deref()
                .unwrap()
                .contains("ParseError")
        );
        let table = batch.summary_table();
        assert!(table.contains("Runge-Kutta 4"));
    }

    #[test]
    fn test_parser_probes_pass() {
        assert!(run_parser_probes(&default_parser_probes(), 1e-9));
    }

    #[test]
    fn test_parser_probes_detect_wrong_expectation() {
        let probes = vec![ParserProbe {
            expr: VarExpr::Scalar("y".to_string()),
            t: 0.0,
            y: NumberOrVec::Number(1.0),
            expected: NumberOrVec::Number(2.0),
        }];
        assert!(!run_parser_probes(&probes, 1e-9));
    }

    #[test]
    fn test_measure_execution_time_returns_the_value() {
        let (elapsed, value) = measure_execution_time(|| 21 * 2);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(60));
    }
}
