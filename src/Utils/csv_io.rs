//! Loads ODE test cases from a CSV file, one row per case.
//!
//! Expected columns: `expr,t0,tf,h,y0,expected_final,expected_derivative`
//! (the last two optional). A vector expression is a bracketed,
//! comma-separated list of component formulas; a vector number is a
//! comma-separated list. The micro-formats inside the fields are parsed with
//! nom combinators; a malformed field is a `RecordFormatError` naming the
//! field, and a malformed row is logged and skipped so one bad record does
//! not sink the whole file.

use crate::errors::OdeError;
use crate::numerical::ode_types::{NumberOrVec, ODETestCase, VarExpr};
use csv::StringRecord;
use log::{info, warn};
use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while1},
    character::complete::space0,
    combinator::map,
    multi::separated_list1,
    number::complete::double,
    sequence::delimited,
};
use std::path::Path;

/// Parses a comma-separated list of numbers, e.g. "50.0, 20.0"
fn parse_number_list(input: &str) -> IResult<&str, Vec<f64>> {
    let separator = delimited(space0, tag(","), space0);
    let mut parser = separated_list1(separator, double);
    parser.parse(input)
}

/// Parses one component formula inside a bracketed list
fn parse_formula(input: &str) -> IResult<&str, String> {
    let formula = take_while1(|c: char| c != ',' && c != ']');
    let mut parser = map(formula, |s: &str| s.trim().to_string());
    parser.parse(input)
}

/// Parses a bracketed, comma-separated list of formulas,
/// e.g. "[0.1*y0 - 0.02*y0*y1, -0.3*y1 + 0.01*y0*y1]"
fn parse_formula_list(input: &str) -> IResult<&str, Vec<String>> {
    let mut parser = delimited(
        tag("["),
        separated_list1(tag(","), parse_formula),
        tag("]"),
    );
    parser.parse(input)
}

fn record_err(field: &str, reason: impl Into<String>) -> OdeError {
    OdeError::RecordFormat {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn field<'r>(
    headers: &StringRecord,
    record: &'r StringRecord,
    name: &str,
) -> Result<&'r str, OdeError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|i| record.get(i))
        .map(str::trim)
        .ok_or_else(|| record_err(name, "missing"))
}

/// None when the column is absent or the value is empty
fn optional_field<'r>(
    headers: &StringRecord,
    record: &'r StringRecord,
    name: &str,
) -> Option<&'r str> {
    field(headers, record, name)
        .ok()
        .filter(|raw| !raw.is_empty())
}

fn number_field(headers: &StringRecord, record: &StringRecord, name: &str) -> Result<f64, OdeError> {
    let raw = field(headers, record, name)?;
    raw.parse::<f64>()
        .map_err(|_| record_err(name, format!("'{}' is not a number", raw)))
}

fn expr_field(raw: &str, name: &str) -> Result<VarExpr, OdeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(record_err(name, "empty"));
    }
    if raw.starts_with('[') {
        return match parse_formula_list(raw) {
            Ok(("", components)) => Ok(VarExpr::Vector(components)),
            Ok((rest, _)) => Err(record_err(name, format!("trailing content '{}'", rest))),
            Err(_) => Err(record_err(name, "malformed bracketed expression list")),
        };
    }
    Ok(VarExpr::Scalar(raw.to_string()))
}

fn value_field(raw: &str, name: &str) -> Result<NumberOrVec, OdeError> {
    match parse_number_list(raw.trim()) {
        Ok(("", values)) if values.len() == 1 => Ok(NumberOrVec::Number(values[0])),
        Ok(("", values)) => Ok(NumberOrVec::from_components(values)),
        _ => Err(record_err(
            name,
            format!("'{}' is not a number or a number list", raw),
        )),
    }
}

/// Parse a test case from one CSV row.
pub fn parse_test_case(
    headers: &StringRecord,
    record: &StringRecord,
) -> Result<ODETestCase, OdeError> {
    let expr = expr_field(field(headers, record, "expr")?, "expr")?;
    let t0 = number_field(headers, record, "t0")?;
    let tf = number_field(headers, record, "tf")?;
    let h = number_field(headers, record, "h")?;
    let y0 = value_field(field(headers, record, "y0")?, "y0")?;
    if expr.n_components() != y0.len() {
        return Err(record_err(
            "y0",
            format!(
                "{} components for a {}-component expression",
                y0.len(),
                expr.n_components()
            ),
        ));
    }
    let expected_final = match optional_field(headers, record, "expected_final") {
        Some(raw) => Some(value_field(raw, "expected_final")?),
        None => None,
    };
    let expected_derivative = match optional_field(headers, record, "expected_derivative") {
        Some(raw) => Some(expr_field(raw, "expected_derivative")?),
        None => None,
    };
    Ok(ODETestCase {
        expr,
        t0,
        tf,
        h,
        y0,
        expected_final,
        expected_derivative,
    })
}

/// Load test cases from a CSV file. Rows that fail to parse are logged with
/// their record error and skipped; file-level failures abort the load.
pub fn load_tests_from_csv(path: &Path) -> Result<Vec<ODETestCase>, OdeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut cases = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        match parse_test_case(&headers, &record) {
            Ok(case) => cases.push(case),
            // header line is row 1, data starts at row 2
            Err(err) => warn!("skipping row {}: {}", row + 2, err),
        }
    }
    info!("loaded {} test cases from {}", cases.len(), path.display());
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_scalar_and_vector_rows() {
        let (_dir, path) = write_csv(
            "expr,t0,tf,h,y0,expected_final,expected_derivative\n\
             y,0,1,0.001,1,2.718281828459045,y\n\
             \"[0.1*y0 - 0.02*y0*y1, -0.3*y1 + 0.01*y0*y1]\",0,1,0.001,\"50,20\",,\n",
        );
        let cases = load_tests_from_csv(&path).unwrap();
        assert_eq!(cases.len(), 2);

        assert_eq!(cases[0].expr, VarExpr::Scalar("y".to_string()));
        assert_relative_eq!(cases[0].h, 0.001);
        match cases[0].expected_final.as_ref().unwrap() {
            NumberOrVec::Number(v) => assert_relative_eq!(*v, std::f64::consts::E, epsilon = 1e-12),
            other => panic!("expected scalar, got {}", other),
        }
        assert_eq!(
            cases[0].expected_derivative,
            Some(VarExpr::Scalar("y".to_string()))
        );

        assert_eq!(
            cases[1].expr,
            VarExpr::Vector(vec![
                "0.1*y0 - 0.02*y0*y1".to_string(),
                "-0.3*y1 + 0.01*y0*y1".to_string(),
            ])
        );
        assert_eq!(cases[1].y0, NumberOrVec::from_components(vec![50.0, 20.0]));
        assert!(cases[1].expected_final.is_none());
    }

    #[test]
    fn test_malformed_rows_are_skipped_not_fatal() {
        let (_dir, path) = write_csv(
            "expr,t0,tf,h,y0\n\
             y,0,1,0.001,1\n\
             y,zero,1,0.001,1\n\
             y,0,1,0.001,\"1,2\"\n",
        );
        // row 3 has a non-numeric t0, row 4 a vector y0 for a scalar expr
        let cases = load_tests_from_csv(&path).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn test_missing_column_is_a_record_error() {
        let headers = StringRecord::from(vec!["expr", "t0", "tf", "h"]);
        let record = StringRecord::from(vec!["y", "0", "1", "0.1"]);
        let err = parse_test_case(&headers, &record).unwrap_err();
        assert_eq!(err.kind(), "RecordFormatError");
    }

    #[test]
    fn test_malformed_optional_field_is_not_silently_none() {
        let headers = StringRecord::from(vec!["expr", "t0", "tf", "h", "y0", "expected_final"]);
        let record = StringRecord::from(vec!["y", "0", "1", "0.1", "1", "not-a-number"]);
        let err = parse_test_case(&headers, &record).unwrap_err();
        assert_eq!(err.kind(), "RecordFormatError");
    }

    #[test]
    fn test_unterminated_bracket_list_is_rejected() {
        let err = expr_field("[y0, y1", "expr").unwrap_err();
        assert_eq!(err.kind(), "RecordFormatError");
    }
}
