/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedODE::symbolic::parse_expr::parse_expression;
/// let input = "0.1*y0 - 0.02*y0*y1";
/// let parsed_expression = parse_expression(input).unwrap();
/// println!("parsed_expression {}", parsed_expression);
/// ```
pub mod parse_expr;
/// # Symbolic engine
/// a module
/// 1) represents a right-hand-side formula as a symbolic expression tree
/// 2) evaluates the tree at concrete (t, y) bindings with checked division
/// 3) turns a symbolic expression into a string expression for printing and control results
pub mod symbolic_engine;
/// the collection of utility functions mainly for bracket parsing and proceeding
pub mod utils;
