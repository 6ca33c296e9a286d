use crate::arith;
use crate::ast::Expr;
use crate::error::{EvalError, Result};
use crate::functions::{self, Function};
use crate::parser;
use crate::value::Value;

/// Parse and evaluate `input`.
pub fn evaluate(input: &str) -> Result<Value> {
    let expr = parser::parse(input)?;
    eval(&expr)
}

/// Evaluate a parsed expression.
///
/// Only numbers, lists, tuples, constant names, unary and binary arithmetic
/// and calls to whitelisted functions produce values. Every other construct
/// is refused by name.
pub fn eval(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Number(value) => Ok(value.clone()),
        Expr::List(items) => eval_all(items).map(Value::List),
        Expr::Tuple(items) => eval_all(items).map(Value::Tuple),
        Expr::Name(name) => {
            functions::constant(name).ok_or_else(|| EvalError::NameNotAllowed(name.clone()))
        }
        Expr::Unary { op, operand } => arith::unary(*op, &eval(operand)?),
        Expr::Binary { op, left, right } => {
            arith::ensure_supported(*op)?;
            let left = eval(left)?;
            let right = eval(right)?;
            arith::binary(*op, &left, &right)
        }
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let Expr::Name(name) = func.as_ref() else {
                return Err(EvalError::NonSimpleCall);
            };
            let function = Function::lookup(name)
                .ok_or_else(|| EvalError::FunctionNotAllowed(name.clone()))?;
            if !keywords.is_empty() {
                return Err(EvalError::NotAllowed("keyword argument"));
            }
            function.apply(&eval_all(args)?)
        }
        Expr::Str(_) => Err(EvalError::StringLiteral),
        Expr::Bool(_)
        | Expr::NoneLiteral
        | Expr::Set(_)
        | Expr::Dict(_)
        | Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::Slice { .. }
        | Expr::Starred(_)
        | Expr::Lambda { .. }
        | Expr::Comprehension { .. }
        | Expr::Compare { .. }
        | Expr::BoolOp { .. }
        | Expr::Not(_)
        | Expr::IfElse { .. }
        | Expr::NamedExpr { .. } => Err(EvalError::NotAllowed(expr.kind_name())),
    }
}

fn eval_all(items: &[Expr]) -> Result<Vec<Value>> {
    items.iter().map(eval).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts;

    fn int(input: &str) -> i64 {
        match evaluate(input) {
            Ok(Value::Int(i)) => i,
            other => panic!("{input}: expected int, got {other:?}"),
        }
    }

    fn float(input: &str) -> f64 {
        match evaluate(input) {
            Ok(Value::Float(x)) => x,
            other => panic!("{input}: expected float, got {other:?}"),
        }
    }

    fn close(input: &str, expected: f64) {
        let actual = float(input);
        assert!(
            (actual - expected).abs() < 1e-10,
            "{input}: {actual} != {expected}"
        );
    }

    fn error(input: &str) -> String {
        evaluate(input)
            .expect_err(&format!("{input} should be rejected"))
            .to_string()
    }

    #[test]
    fn basic_arithmetic() {
        assert_eq!(int("2 + 3"), 5);
        assert_eq!(int("10 - 4"), 6);
        assert_eq!(int("3 * 4"), 12);
        assert_eq!(float("15 / 3"), 5.0);
        assert_eq!(int("17 // 5"), 3);
        assert_eq!(int("17 % 5"), 2);
        assert_eq!(int("2 ** 10"), 1024);
        assert_eq!(int("-7 // 2"), -4);
        assert_eq!(int("-7 % 3"), 2);
        assert_eq!(float("2 ** -1"), 0.5);
        assert_eq!(float("7.5 // 2"), 3.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(int("2 + 3 * 4"), 14);
        assert_eq!(int("(2 + 3) * 4"), 20);
        assert_eq!(int("10 - 2 - 3"), 5);
        assert_eq!(int("-2 ** 2"), -4);
        assert_eq!(int("2 ** 3 ** 2"), 512);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(int("-5"), -5);
        assert_eq!(int("+5"), 5);
        assert_eq!(int("--5"), 5);
        assert_eq!(int("-(-5)"), 5);
    }

    #[test]
    fn trigonometry() {
        close("sin(0)", 0.0);
        close("cos(0)", 1.0);
        close("sin(pi / 2)", 1.0);
        close("tan(pi / 4)", 1.0);
        close("asin(0.5)", 0.5_f64.asin());
        close("acos(0.5)", 0.5_f64.acos());
        close("atan(1)", 1.0_f64.atan());
        close("atan2(1, 1)", consts::FRAC_PI_4);
        close("sinh(1)", 1.0_f64.sinh());
        close("cosh(1)", 1.0_f64.cosh());
        close("tanh(1)", 1.0_f64.tanh());
        close("degrees(pi)", 180.0);
        close("radians(180)", consts::PI);
    }

    #[test]
    fn exponentials_and_logarithms() {
        close("exp(1)", consts::E);
        close("log(e)", 1.0);
        close("log(8, 2)", 3.0);
        close("log10(100)", 2.0);
        close("log2(8)", 3.0);
        close("log(exp(5))", 5.0);
        assert_eq!(float("sqrt(16)"), 4.0);
        assert_eq!(float("sqrt(2)"), 2.0_f64.sqrt());
        assert_eq!(int("pow(2, 10)"), 1024);
        close("cbrt(27)", 3.0);
        close("hypot(3, 4)", 5.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(int("abs(-42)"), 42);
        assert_eq!(float("fabs(-2)"), 2.0);
        assert_eq!(int("ceil(3.2)"), 4);
        assert_eq!(int("floor(3.8)"), 3);
        assert_eq!(int("trunc(3.8)"), 3);
        assert_eq!(int("trunc(-3.8)"), -3);
        assert_eq!(int("round(3.7)"), 4);
        assert_eq!(int("round(3.5)"), 4);
        assert_eq!(int("round(2.5)"), 2);
    }

    #[test]
    fn integer_functions() {
        assert_eq!(int("factorial(0)"), 1);
        assert_eq!(int("factorial(5)"), 120);
        assert_eq!(int("factorial(10)"), 3_628_800);
        assert_eq!(int("gcd(48, 18)"), 6);
        assert_eq!(int("lcm(12, 18)"), 36);
        assert_eq!(int("comb(10, 3)"), 120);
        assert_eq!(int("perm(5, 2)"), 20);
    }

    #[test]
    fn aggregates() {
        assert_eq!(int("max(1, 5, 3)"), 5);
        assert_eq!(int("min(1, 5, 3)"), 1);
        assert_eq!(int("sum([1, 2, 3, 4, 5])"), 15);
        assert_eq!(int("max((4, 8, 2))"), 8);
    }

    #[test]
    fn constants() {
        assert_eq!(float("pi"), consts::PI);
        assert_eq!(float("e"), consts::E);
        assert_eq!(float("tau"), consts::TAU);
        assert_eq!(float("tau / 2"), consts::PI);
        assert!(float("inf").is_infinite());
        assert!(float("nan").is_nan());
    }

    #[test]
    fn compound_expressions() {
        close("sin(pi/6) ** 2 + cos(pi/6) ** 2", 1.0);
        assert_eq!(float("sqrt(3**2 + 4**2)"), 5.0);
    }

    #[test]
    fn lists_and_tuples() {
        assert_eq!(
            evaluate("[1, 2, 3]").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            evaluate("(1, 2, 3)").unwrap(),
            Value::Tuple(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(evaluate("(1, 2, 3)").unwrap().to_string(), "(1, 2, 3)");
        assert_eq!(int("sum([1, 2, 3])"), 6);
    }

    #[test]
    fn blocked_calls() {
        assert_eq!(error("__import__('os')"), "function not allowed: __import__");
        assert_eq!(
            error("__import__('os').system('ls')"),
            "only simple function calls are allowed"
        );
        assert_eq!(error("open('/etc/passwd')"), "function not allowed: open");
        assert_eq!(error("exec('print(123)')"), "function not allowed: exec");
        assert_eq!(error("eval('1+1')"), "function not allowed: eval");
        assert_eq!(error("print(123)"), "function not allowed: print");
        assert_eq!(error("round(2.5, ndigits=1)"), "keyword argument not allowed");
    }

    #[test]
    fn blocked_constructs() {
        assert_eq!(error("lambda x: x + 1"), "lambda not allowed");
        assert_eq!(
            error("[x for x in range(10)]"),
            "list comprehension not allowed"
        );
        assert_eq!(error("x + 1"), "name not allowed: x");
        assert_eq!(error("1 < 2"), "comparison not allowed");
        assert_eq!(error("1 if 1 else 2"), "conditional expression not allowed");
        assert_eq!(error("(1, 2)[0]"), "subscript not allowed");
        assert_eq!(error("(y := 3)"), "assignment expression not allowed");
        assert_eq!(error("pi.real"), "attribute access not allowed");
        assert_eq!(error("True"), "boolean literal not allowed");
        assert_eq!(error("6 & 3"), "operator not allowed: &");
        assert_eq!(error("~1"), "operator not allowed: ~");
    }

    #[test]
    fn strings_are_rejected() {
        assert_eq!(error("'hello'"), "only numbers allowed (got a string literal)");
        assert_eq!(error("sqrt('4')"), "only numbers allowed (got a string literal)");
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(error("1 / 0"), "division by zero");
        assert_eq!(error("1 % 0"), "division by zero");
        assert_eq!(error("9223372036854775807 + 1"), "integer overflow");
        assert_eq!(error("sqrt(-1)"), "math domain error");
    }

    #[test]
    fn long_sums() {
        assert_eq!(int(&vec!["1"; 400].join(" + ")), 400);
        assert!(error(&vec!["1"; 200_000].join("+")).contains("expression too long"));
    }
}
