use RustedODE::Utils::csv_io::load_tests_from_csv;
use RustedODE::Utils::logger::{init_logger, save_solution_to_csv};
use RustedODE::errors::OdeError;
use RustedODE::numerical::analysis::{
    compute_order_of_convergence, default_parser_probes, measure_execution_time, run_batch,
    run_parser_probes,
};
use RustedODE::numerical::explicit_api::Solvers;
use RustedODE::numerical::ode_examples::OdeExample;
use RustedODE::numerical::ode_function::parse_expression;
use RustedODE::numerical::ode_types::{ODETestCase, SolverKind};
use log::{error, warn};
use simplelog::LevelFilter;
use std::env;
use std::fs;
use std::path::PathBuf;
use strum::IntoEnumIterator;

fn main() {
    init_logger(LevelFilter::Info, None);
    if let Err(e) = run() {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), OdeError> {
    // default paths, overridable from the command line:
    // RustedODE [input.csv] [output_dir]
    let args: Vec<String> = env::args().collect();
    let input_file = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/ode_examples.csv"));
    let output_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"));
    fs::create_dir_all(&output_dir)?;

    println!("ODE Module Demo\n");

    let cases: Vec<ODETestCase> = if input_file.exists() {
        println!("Loading test cases from file: {}", input_file.display());
        load_tests_from_csv(&input_file)?
    } else {
        warn!(
            "input file {} not found, falling back to the built-in examples",
            input_file.display()
        );
        OdeExample::iter().map(|example| example.test_case()).collect()
    };

    for case in &cases {
        println!("\nTest case: {}", case);
        let f = match parse_expression(&case.expr) {
            Ok(f) => f,
            Err(e) => {
                warn!("skipping case: {}", e);
                continue;
            }
        };
        println!("  Solving ODE using different methods:\n");
        for kind in SolverKind::iter() {
            let outcome = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, case.h)
                .and_then(|mut solver| solver.solve());
            match outcome {
                Ok(solution) => println!("  {} Method:\t{}", kind, solution.get_result()),
                Err(e) => warn!("  {} failed: {}", kind, e),
            }
        }
    }

    println!("\n------------ Parser Verification ------------");
    if run_parser_probes(&default_parser_probes(), 1e-9) {
        println!("All parser probes passed!");
    } else {
        println!("Some parser probes failed!");
    }

    println!("\n------------ Batch Verification ------------");
    let batch = run_batch(&cases, 1e-2);
    println!("{}", batch.summary_table());
    println!("{}/{} runs passed", batch.passed_count(), batch.reports.len());

    // Example 1: scalar ODE (dy/dt = y), with timing and display strides
    println!("\nExample 1: Scalar ODE (dy/dt = y)");
    let case = OdeExample::ExponentialGrowth.test_case();
    println!("{}", case);
    let f = parse_expression(&case.expr)?;
    for (kind, steps_to_print) in SolverKind::iter().zip([1usize, 3, 5]) {
        println!("{} Method", kind);
        let mut solver = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, case.h)?;
        let (elapsed, outcome) = measure_execution_time(|| solver.solve());
        let mut solution = outcome?;
        println!("  solved in {:.3} ms", elapsed.as_secs_f64() * 1000.0);
        solution.steps_to_print = steps_to_print;
        println!("{}", solution);
        let file = output_dir.join(format!("scalar_ode_results_{}.csv", kind_tag(kind)));
        save_solution_to_csv(&solution, &file)?;
        println!("results saved on {}", file.display());
    }

    // Example 2: vector ODE (predator-prey model)
    println!("\nExample 2: Vector ODE (Predator-Prey Model)");
    let case = OdeExample::PredatorPrey.test_case();
    println!("{}", case);
    let f = parse_expression(&case.expr)?;
    for kind in SolverKind::iter() {
        println!("{} Method", kind);
        let mut solver = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, case.h)?;
        let mut solution = solver.solve()?;
        solution.steps_to_print = 5;
        println!("{}", solution);
        let file = output_dir.join(format!("vector_ode_results_{}.csv", kind_tag(kind)));
        save_solution_to_csv(&solution, &file)?;
        println!("results saved on {}", file.display());
    }

    // per-solver error, order of convergence and runtime on the reference case
    println!("\n------------ Analysis Section ------------");
    let mut case = OdeExample::ExponentialGrowth.test_case();
    case.h = 0.01;
    let f = parse_expression(&case.expr)?;
    for kind in SolverKind::iter() {
        let mut solver = Solvers::new(kind, &f, case.t0, case.y0.clone(), case.tf, case.h)?;
        let (elapsed, outcome) = measure_execution_time(|| solver.solve());
        let solution = outcome?;
        let error = match &case.expected_final {
            Some(expected) => solution.get_result().abs_error(expected)?,
            None => f64::NAN,
        };
        let order = compute_order_of_convergence(&case, kind)?;
        println!("Solver: {}", kind);
        println!("  Error:\t\t\t{:.6e}", error);
        println!(
            "  Order of Convergence:\t\t{:.3} (theoretical {})",
            order,
            kind.theoretical_order()
        );
        println!("  Execution Time:\t\t{:.6} seconds", elapsed.as_secs_f64());
    }

    Ok(())
}

fn kind_tag(kind: SolverKind) -> &'static str {
    match kind {
        SolverKind::ForwardEuler => "FE",
        SolverKind::ExplicitMidpoint => "EM",
        SolverKind::RK4 => "RK4",
    }
}
