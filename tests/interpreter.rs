use loxwalk::prelude::*;

fn make_expression(source: &'static str) -> Expr {
    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan_tokens();
    let mut parser = Parser::new(tokens);
    let stmt = parser.parse().pop().expect("no statement was created");

    match stmt {
        Stmt::Expression { expr } => expr,
        _ => panic!("statement is not an expression"),
    }
}

macro_rules! assert_literal {
    ($source:literal, $expected:expr, $lit_type:path) => {
        let mut ipr = Interpreter::new();
        let expr = make_expression($source);
        let res = ipr.evaluate_expr(&expr);
        assert!(res.is_ok());
        assert_eq!(res.unwrap(), $lit_type($expected));
    };
}

macro_rules! assert_number {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::Number);
    };
}

macro_rules! assert_string {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::String);
    };
}

macro_rules! assert_boolean {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::Boolean);
    };
}

macro_rules! assert_runtime_error {
    ($source:literal, $msg:literal) => {
        let mut ipr = Interpreter::new();
        let expr = make_expression($source);
        let res = ipr.evaluate_expr(&expr);
        match res {
            Err(RuntimeInterrupt::Error { msg, .. }) => assert_eq!(msg, $msg),
            other => panic!("expected a runtime error, got {:?}", other),
        }
    };
}

#[test]
fn unary_minus() {
    assert_number!("-3.14;", -3.14);
}

#[test]
fn unary_bang() {
    assert_boolean!("!true;", false);
    assert_boolean!("!false;", true);
    assert_boolean!("!nil;", true);
    assert_boolean!("!0;", false);
}

#[test]
fn binary_plus_numbers() {
    assert_number!("10 + 20;", 30.0);
}

#[test]
fn binary_plus_strings() {
    assert_string!(r#" "Hello " + "World!"; "#, "Hello World!".to_string());
}

#[test]
fn binary_minus() {
    assert_number!("10 - 20;", -10.0);
}

#[test]
fn binary_star() {
    assert_number!("10 * 20;", 200.0);
}

#[test]
fn binary_slash() {
    assert_number!("10 / 20;", 0.5);
}

#[test]
fn binary_greater() {
    assert_boolean!("10 > 20;", false);
    assert_boolean!("20 > 10;", true);
}

#[test]
fn binary_greater_equal() {
    assert_boolean!("10 >= 20;", false);
    assert_boolean!("20 >= 10;", true);
}

#[test]
fn binary_less() {
    assert_boolean!("10 < 20;", true);
    assert_boolean!("20 < 10;", false);
}

#[test]
fn binary_less_equal() {
    assert_boolean!("10 <= 20;", true);
    assert_boolean!("20 <= 10;", false);
}

#[test]
fn binary_equal_equal() {
    assert_boolean!("10 == 20;", false);
    assert_boolean!("10 == 10;", true);
    assert_boolean!("nil == nil;", true);
    assert_boolean!("1 == \"1\";", false);
}

#[test]
fn binary_bang_equal() {
    assert_boolean!("10 != 20;", true);
    assert_boolean!("10 != 10;", false);
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_number!("1 and 2;", 2.0);
    assert_boolean!("false and 2;", false);
    assert_number!("1 or 2;", 1.0);
    assert_number!("nil or 2;", 2.0);
    assert_string!(r#" "hi" or 2; "#, "hi".to_string());
}

#[test]
fn grouping_overrides_precedence() {
    assert_number!("(1 + 2) * 3;", 9.0);
    assert_number!("1 + 2 * 3;", 7.0);
}

#[test]
fn unary_minus_rejects_strings() {
    assert_runtime_error!(r#" -"x"; "#, "Operand must be a number.");
}

#[test]
fn plus_rejects_mixed_operands() {
    assert_runtime_error!(r#" "a" + 1; "#, "Operands must be numbers or strings.");
}

#[test]
fn comparison_rejects_strings() {
    assert_runtime_error!(r#" 1 < "two"; "#, "Operands must be numbers.");
}

#[test]
fn calling_a_number_fails() {
    assert_runtime_error!("4(1);", "Can only call functions and classes.");
}

#[test]
fn native_clock_returns_a_number() {
    let mut ipr = Interpreter::new();
    let expr = make_expression("clock();");
    let res = ipr.evaluate_expr(&expr).unwrap();
    assert!(matches!(res, Object::Number(n) if n > 0.0));
}
