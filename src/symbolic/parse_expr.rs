use crate::errors::OdeError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{
    brackets_are_balanced, find_first_char_outside_brackets, find_pair_to_this_bracket,
    find_rightmost_operator_outside_brackets,
};

/// a module turns a String formula into a symbolic expression
///
/// The parser splits the input at the rightmost operator of the lowest
/// precedence level that sits outside any brackets, then recurses into both
/// halves; splitting at the rightmost occurrence keeps `+ - * /`
/// left-associative. `^` binds tighter than `* /`, which bind tighter than
/// `+ -`; function heads (`exp`, `ln`, `sin`, `cos`), literals, variables and
/// fully bracketed groups are handled once no top-level operator remains.
//
//                  search recursion diagram
//                "0.1*y0 - 0.02*y0*y1"             |
//                |       left   | right            |
//                |________________________________ |
//                |          split by  -            |
//                |________________________________ |
//                |    0.1*y0    | 0.02*y0*y1       |
//                |   split by * |   split by *     |
//                |  0.1  |  y0  | 0.02*y0  |  y1   |
//                |  Const|  Var |  ...     |  Var  |
//                  etc...
pub fn parse_expression(input: &str) -> Result<Expr, OdeError> {
    if !brackets_are_balanced(input) {
        return Err(parse_err(input, input));
    }
    parse_node(input, input)
}

fn parse_err(expression: &str, fragment: &str) -> OdeError {
    OdeError::Parse {
        expression: expression.trim().to_string(),
        fragment: fragment.trim().to_string(),
    }
}

fn parse_node(full: &str, input: &str) -> Result<Expr, OdeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(parse_err(full, input));
    }

    // addition and subtraction
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['+', '-']) {
        let left = input[..pos].trim();
        let right = input[pos + 1..].trim();
        if right.is_empty() {
            return Err(parse_err(full, input));
        }

        // unary minus
        if left.is_empty() {
            if op != '-' {
                return Err(parse_err(full, input));
            }
            if let Ok(value) = right.parse::<f64>() {
                return Ok(Expr::Const(-value));
            }
            return Ok(Expr::Mul(
                Expr::Const(-1.0).boxed(),
                parse_node(full, right)?.boxed(),
            ));
        }

        let left_expr = parse_node(full, left)?;
        let right_expr = parse_node(full, right)?;
        return Ok(match op {
            '+' => Expr::Add(left_expr.boxed(), right_expr.boxed()),
            _ => Expr::Sub(left_expr.boxed(), right_expr.boxed()),
        });
    }

    // multiplication and division share one precedence level
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['*', '/']) {
        let left = input[..pos].trim();
        let right = input[pos + 1..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(parse_err(full, input));
        }
        let left_expr = parse_node(full, left)?;
        let right_expr = parse_node(full, right)?;
        return Ok(match op {
            '*' => Expr::Mul(left_expr.boxed(), right_expr.boxed()),
            _ => Expr::Div(left_expr.boxed(), right_expr.boxed()),
        });
    }

    // power, split at the leftmost occurrence so that 2^3^2 nests to the right
    if let Some(pos) = find_first_char_outside_brackets(input, '^') {
        let base = input[..pos].trim();
        let exponent = input[pos + 1..].trim();
        if base.is_empty() || exponent.is_empty() {
            return Err(parse_err(full, input));
        }
        return Ok(Expr::Pow(
            parse_node(full, base)?.boxed(),
            parse_node(full, exponent)?.boxed(),
        ));
    }

    // function heads; log( is accepted as a synonym of ln(
    if let Some(inner) = function_argument(input, "exp(") {
        return Ok(Expr::Exp(parse_node(full, inner)?.boxed()));
    }
    if let Some(inner) = function_argument(input, "ln(") {
        return Ok(Expr::Ln(parse_node(full, inner)?.boxed()));
    }
    if let Some(inner) = function_argument(input, "log(") {
        return Ok(Expr::Ln(parse_node(full, inner)?.boxed()));
    }
    if let Some(inner) = function_argument(input, "sin(") {
        return Ok(Expr::sin(parse_node(full, inner)?.boxed()));
    }
    if let Some(inner) = function_argument(input, "cos(") {
        return Ok(Expr::cos(parse_node(full, inner)?.boxed()));
    }

    // constants, including scientific notation
    if let Ok(value) = input.parse::<f64>() {
        return Ok(Expr::Const(value));
    }

    // variables
    if is_identifier(input) {
        return Ok(Expr::Var(input.to_string()));
    }

    // expression that is all in brackets
    if input.starts_with('(') && input.ends_with(')') {
        if let Some(close) = find_pair_to_this_bracket(input, 0) {
            if close == input.len() - 1 {
                return parse_node(full, &input[1..close]);
            }
        }
    }

    Err(parse_err(full, input))
}

/// returns the argument substring when `input` is exactly `head ... )`
/// with the closing bracket of the head being the last character
fn function_argument<'a>(input: &'a str, head: &str) -> Option<&'a str> {
    if !input.starts_with(head) || !input.ends_with(')') {
        return None;
    }
    match find_pair_to_this_bracket(input, head.len() - 1) {
        Some(close) if close == input.len() - 1 => Some(&input[head.len()..close]),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
