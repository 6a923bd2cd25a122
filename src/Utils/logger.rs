//! tiny module to initialize logging and save a solution trajectory into a file

use crate::errors::OdeError;
use crate::numerical::ode_types::ODESolution;
use csv::Writer;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Initialize the console logger; an optional file receives a copy of the log.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        if let Ok(file) = File::create(path) {
            loggers.push(WriteLogger::new(level, Config::default(), file));
        }
    }
    let _ = CombinedLogger::init(loggers);
}

fn solution_headers(solution: &ODESolution) -> Vec<String> {
    let mut headers = vec!["t".to_string()];
    match solution.y_values.first() {
        Some(first) if !first.is_scalar() => {
            headers.extend((0..first.len()).map(|i| format!("y{}", i)));
        }
        _ => headers.push("y".to_string()),
    }
    headers
}

/// Save the trajectory to a CSV file at full sample resolution: header
/// `t,y` (scalar) or `t,y0..y{n-1}` (vector), one row per stored sample.
/// The display stride never affects what is written.
pub fn save_solution_to_csv(solution: &ODESolution, filename: &Path) -> Result<(), OdeError> {
    let mut wtr = Writer::from_path(filename)?;
    wtr.write_record(solution_headers(solution))?;
    for (t, y) in solution.t_values.iter().zip(solution.y_values.iter()) {
        let mut row = vec![t.to_string()];
        row.extend(y.iter().map(|x| x.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// tab-separated variant of the trajectory export
pub fn save_solution_to_file(solution: &ODESolution, filename: &Path) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "{}", solution_headers(solution).join("\t"))?;
    for (t, y) in solution.t_values.iter().zip(solution.y_values.iter()) {
        let mut row = vec![t.to_string()];
        row.extend(y.iter().map(|x| x.to_string()));
        writeln!(file, "{}", row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::ode_types::NumberOrVec;

    fn vector_solution() -> ODESolution {
        let mut solution = ODESolution::with_capacity(3);
        for i in 0..3 {
            solution.push(
                i as f64,
                NumberOrVec::from_components(vec![i as f64, -(i as f64)]),
            );
        }
        // a reduced display stride must not reduce the export
        solution.steps_to_print = 1;
        solution
    }

    #[test]
    fn test_csv_export_writes_all_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        save_solution_to_csv(&vector_solution(), &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            rdr.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["t", "y0", "y1"]
        );
        let rows: Vec<_> = rdr.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[2][0], "2");
        assert_eq!(&rows[2][2], "-2");
    }

    #[test]
    fn test_tsv_export_scalar_header() {
        let mut solution = ODESolution::with_capacity(2);
        solution.push(0.0, NumberOrVec::Number(1.0));
        solution.push(0.5, NumberOrVec::Number(2.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.tsv");
        save_solution_to_file(&solution, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "t\ty");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "0.5\t2");
    }
}
