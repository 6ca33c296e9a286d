//! Whitelisted functions and named constants.

use std::cmp::Ordering;
use std::f64::consts;

use crate::arith;
use crate::error::{EvalError, Result};
use crate::value::Value;

const CONSTANTS: &[(&str, f64)] = &[
    ("pi", consts::PI),
    ("e", consts::E),
    ("tau", consts::TAU),
    ("inf", f64::INFINITY),
    ("nan", f64::NAN),
];

/// Look up a named constant.
pub fn constant(name: &str) -> Option<Value> {
    CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, x)| Value::Float(x))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Round,
    Min,
    Max,
    Sum,
    Pow,
    Sqrt,
    Cbrt,
    Exp,
    Log,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Ceil,
    Floor,
    Trunc,
    Degrees,
    Radians,
    Hypot,
    Fabs,
    Factorial,
    Comb,
    Perm,
    Gcd,
    Lcm,
}

const FUNCTIONS: &[(&str, Function)] = &[
    ("abs", Function::Abs),
    ("round", Function::Round),
    ("min", Function::Min),
    ("max", Function::Max),
    ("sum", Function::Sum),
    ("pow", Function::Pow),
    ("sqrt", Function::Sqrt),
    ("cbrt", Function::Cbrt),
    ("exp", Function::Exp),
    ("log", Function::Log),
    ("log10", Function::Log10),
    ("log2", Function::Log2),
    ("sin", Function::Sin),
    ("cos", Function::Cos),
    ("tan", Function::Tan),
    ("asin", Function::Asin),
    ("acos", Function::Acos),
    ("atan", Function::Atan),
    ("atan2", Function::Atan2),
    ("sinh", Function::Sinh),
    ("cosh", Function::Cosh),
    ("tanh", Function::Tanh),
    ("asinh", Function::Asinh),
    ("acosh", Function::Acosh),
    ("atanh", Function::Atanh),
    ("ceil", Function::Ceil),
    ("floor", Function::Floor),
    ("trunc", Function::Trunc),
    ("degrees", Function::Degrees),
    ("radians", Function::Radians),
    ("hypot", Function::Hypot),
    ("fabs", Function::Fabs),
    ("factorial", Function::Factorial),
    ("comb", Function::Comb),
    ("perm", Function::Perm),
    ("gcd", Function::Gcd),
    ("lcm", Function::Lcm),
];

impl Function {
    pub fn lookup(name: &str) -> Option<Function> {
        FUNCTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, f)| f)
    }

    pub fn name(self) -> &'static str {
        FUNCTIONS
            .iter()
            .find(|(_, f)| *f == self)
            .map_or("?", |&(n, _)| n)
    }

    /// Names of every whitelisted function, in a stable order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        FUNCTIONS.iter().map(|&(n, _)| n)
    }

    pub fn apply(self, args: &[Value]) -> Result<Value> {
        match self {
            Function::Abs => {
                let [x] = exact(self, args)?;
                match x {
                    Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
                    _ => Ok(Value::Float(float(self, x)?.abs())),
                }
            }
            Function::Round => round(self, args),
            Function::Min => extreme(self, args, Ordering::Less),
            Function::Max => extreme(self, args, Ordering::Greater),
            Function::Sum => sum(self, args),
            Function::Pow => pow(self, args),
            Function::Sqrt => unary(self, args, f64::sqrt),
            Function::Cbrt => unary(self, args, f64::cbrt),
            Function::Exp => unary_ranged(self, args, f64::exp),
            Function::Log => log(self, args),
            Function::Log10 => positive(self, args, f64::log10),
            Function::Log2 => positive(self, args, f64::log2),
            Function::Sin => unary(self, args, f64::sin),
            Function::Cos => unary(self, args, f64::cos),
            Function::Tan => unary(self, args, f64::tan),
            Function::Asin => unary(self, args, f64::asin),
            Function::Acos => unary(self, args, f64::acos),
            Function::Atan => unary(self, args, f64::atan),
            Function::Atan2 => {
                let [y, x] = exact(self, args)?;
                Ok(Value::Float(float(self, y)?.atan2(float(self, x)?)))
            }
            Function::Sinh => unary_ranged(self, args, f64::sinh),
            Function::Cosh => unary_ranged(self, args, f64::cosh),
            Function::Tanh => unary(self, args, f64::tanh),
            Function::Asinh => unary(self, args, f64::asinh),
            Function::Acosh => unary(self, args, f64::acosh),
            Function::Atanh => {
                let [x] = exact(self, args)?;
                let x = float(self, x)?;
                if x.abs() >= 1.0 {
                    return Err(EvalError::domain());
                }
                Ok(Value::Float(x.atanh()))
            }
            Function::Ceil => to_integer(self, args, f64::ceil),
            Function::Floor => to_integer(self, args, f64::floor),
            Function::Trunc => to_integer(self, args, f64::trunc),
            Function::Degrees => unary(self, args, f64::to_degrees),
            Function::Radians => unary(self, args, f64::to_radians),
            Function::Hypot => {
                let mut total = 0.0_f64;
                for arg in args {
                    total = total.hypot(float(self, arg)?);
                }
                Ok(Value::Float(total))
            }
            Function::Fabs => unary(self, args, f64::abs),
            Function::Factorial => {
                let [n] = exact(self, args)?;
                let n = integer(self, n)?;
                if n < 0 {
                    return Err(EvalError::Domain(
                        "factorial() not defined for negative values".into(),
                    ));
                }
                (2..=n).try_fold(1_i64, |acc, k| acc.checked_mul(k).ok_or(EvalError::Overflow))
                    .map(Value::Int)
            }
            Function::Comb => {
                let [n, k] = exact(self, args)?;
                let (n, k) = (non_negative(self, n)?, non_negative(self, k)?);
                if k > n {
                    return Ok(Value::Int(0));
                }
                let k = k.min(n - k);
                let mut result: i128 = 1;
                for i in 0..k {
                    // Exact at every step: the running value is C(n, i + 1).
                    result = result
                        .checked_mul(i128::from(n - i))
                        .ok_or(EvalError::Overflow)?
                        / i128::from(i + 1);
                }
                i64::try_from(result).map(Value::Int).map_err(|_| EvalError::Overflow)
            }
            Function::Perm => {
                arity(self, args, 1, 2)?;
                let n = non_negative(self, &args[0])?;
                let k = match args.get(1) {
                    Some(k) => non_negative(self, k)?,
                    None => n,
                };
                if k > n {
                    return Ok(Value::Int(0));
                }
                (n - k + 1..=n)
                    .try_fold(1_i64, |acc, f| acc.checked_mul(f).ok_or(EvalError::Overflow))
                    .map(Value::Int)
            }
            Function::Gcd => {
                let mut result: u64 = 0;
                for arg in args {
                    result = gcd(result, integer(self, arg)?.unsigned_abs());
                }
                i64::try_from(result).map(Value::Int).map_err(|_| EvalError::Overflow)
            }
            Function::Lcm => {
                let mut result: u64 = 1;
                for arg in args {
                    let n = integer(self, arg)?.unsigned_abs();
                    if n == 0 || result == 0 {
                        result = 0;
                        continue;
                    }
                    result = (result / gcd(result, n))
                        .checked_mul(n)
                        .ok_or(EvalError::Overflow)?;
                }
                i64::try_from(result).map(Value::Int).map_err(|_| EvalError::Overflow)
            }
        }
    }
}

// ── argument handling ───────────────────────────────────────────────────

fn exact<const N: usize>(f: Function, args: &[Value]) -> Result<&[Value; N]> {
    <&[Value; N]>::try_from(args).map_err(|_| {
        EvalError::type_error(format!(
            "{}() takes exactly {N} argument{} ({} given)",
            f.name(),
            if N == 1 { "" } else { "s" },
            args.len()
        ))
    })
}

fn arity(f: Function, args: &[Value], min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    Err(EvalError::type_error(format!(
        "{}() takes from {min} to {max} arguments ({} given)",
        f.name(),
        args.len()
    )))
}

fn float(f: Function, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        EvalError::type_error(format!(
            "{}() argument must be a number, not '{}'",
            f.name(),
            value.type_name()
        ))
    })
}

fn integer(f: Function, value: &Value) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        _ => Err(EvalError::type_error(format!(
            "{}() argument must be an integer, not '{}'",
            f.name(),
            value.type_name()
        ))),
    }
}

fn non_negative(f: Function, value: &Value) -> Result<i64> {
    let n = integer(f, value)?;
    if n < 0 {
        return Err(EvalError::Domain(format!(
            "{}() arguments must be non-negative integers",
            f.name()
        )));
    }
    Ok(n)
}

/// Convert an already-rounded float to an integer.
fn float_to_int(x: f64) -> Result<i64> {
    if x.is_nan() {
        return Err(EvalError::Domain("cannot convert float NaN to integer".into()));
    }
    if x.is_infinite() {
        return Err(EvalError::Domain(
            "cannot convert float infinity to integer".into(),
        ));
    }
    // 2^63 is exactly representable; anything at or past it does not fit.
    if !(-9.223_372_036_854_775_808e18..9.223_372_036_854_775_808e18).contains(&x) {
        return Err(EvalError::Overflow);
    }
    Ok(x as i64)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

// ── families ────────────────────────────────────────────────────────────

/// One float in, one float out; a NaN produced from a non-NaN input is a
/// domain error.
fn unary(f: Function, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    let [x] = exact(f, args)?;
    let x = float(f, x)?;
    let result = op(x);
    if result.is_nan() && !x.is_nan() {
        return Err(EvalError::domain());
    }
    Ok(Value::Float(result))
}

/// Like [`unary`], but an infinite result from a finite input is a range
/// error.
fn unary_ranged(f: Function, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    let [x] = exact(f, args)?;
    let x = float(f, x)?;
    let result = op(x);
    if result.is_infinite() && x.is_finite() {
        return Err(EvalError::Domain("math range error".into()));
    }
    Ok(Value::Float(result))
}

/// Logarithms: defined for strictly positive input only.
fn positive(f: Function, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    let [x] = exact(f, args)?;
    let x = float(f, x)?;
    if x <= 0.0 {
        return Err(EvalError::domain());
    }
    Ok(Value::Float(op(x)))
}

fn log(f: Function, args: &[Value]) -> Result<Value> {
    arity(f, args, 1, 2)?;
    let x = float(f, &args[0])?;
    if x <= 0.0 {
        return Err(EvalError::domain());
    }
    let Some(base) = args.get(1) else {
        return Ok(Value::Float(x.ln()));
    };
    let base = float(f, base)?;
    if base <= 0.0 {
        return Err(EvalError::domain());
    }
    if base == 1.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(x.ln() / base.ln()))
}

fn to_integer(f: Function, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    let [x] = exact(f, args)?;
    match x {
        Value::Int(i) => Ok(Value::Int(*i)),
        _ => float_to_int(op(float(f, x)?)).map(Value::Int),
    }
}

/// `round(x)` gives an integer; `round(x, n)` keeps the operand's type.
/// Ties go to the even neighbour.
fn round(f: Function, args: &[Value]) -> Result<Value> {
    arity(f, args, 1, 2)?;
    let x = &args[0];
    let Some(digits) = args.get(1) else {
        return match x {
            Value::Int(i) => Ok(Value::Int(*i)),
            _ => float_to_int(float(f, x)?.round_ties_even()).map(Value::Int),
        };
    };
    let digits = integer(f, digits)?;

    match x {
        Value::Int(i) if digits >= 0 => Ok(Value::Int(*i)),
        Value::Int(i) => {
            let Some(unit) = u32::try_from(digits.unsigned_abs()).ok().and_then(|d| 10_i64.checked_pow(d)) else {
                return Ok(Value::Int(0));
            };
            let remainder = i.rem_euclid(unit);
            let base = i.checked_sub(remainder).ok_or(EvalError::Overflow)?;
            let round_up = match (remainder * 2).cmp(&unit) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => (base / unit) % 2 != 0,
            };
            if round_up {
                base.checked_add(unit).map(Value::Int).ok_or(EvalError::Overflow)
            } else {
                Ok(Value::Int(base))
            }
        }
        _ => {
            let x = float(f, x)?;
            let factor = i32::try_from(digits).map_or(f64::INFINITY, |d| 10_f64.powi(d));
            if !factor.is_finite() || factor == 0.0 || !x.is_finite() {
                return Ok(Value::Float(x));
            }
            Ok(Value::Float((x * factor).round_ties_even() / factor))
        }
    }
}

/// `min`/`max` over varargs, or over the items of a single list or tuple.
/// The first of several equal extremes wins.
fn extreme(f: Function, args: &[Value], wanted: Ordering) -> Result<Value> {
    let candidates = match args {
        [single] => single.as_sequence().ok_or_else(|| {
            EvalError::type_error(format!("'{}' object is not iterable", single.type_name()))
        })?,
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for candidate in candidates {
        float(f, candidate)?;
        let replace = match best {
            None => true,
            Some(current) => compare(f, candidate, current)? == Some(wanted),
        };
        if replace {
            best = Some(candidate);
        }
    }
    best.cloned().ok_or_else(|| {
        EvalError::Domain(format!("{}() arg is an empty sequence", f.name()))
    })
}

/// Integers compare exactly; anything involving a float compares as floats.
fn compare(f: Function, a: &Value, b: &Value) -> Result<Option<Ordering>> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        _ => Ok(float(f, a)?.partial_cmp(&float(f, b)?)),
    }
}

fn sum(f: Function, args: &[Value]) -> Result<Value> {
    arity(f, args, 1, 2)?;
    let items = args[0].as_sequence().ok_or_else(|| {
        EvalError::type_error(format!("'{}' object is not iterable", args[0].type_name()))
    })?;
    let start = args.get(1).cloned().unwrap_or(Value::Int(0));
    items.iter().try_fold(start, |acc, item| arith::add(&acc, item))
}

/// Two arguments behave like `**`; a third is an integer modulus.
fn pow(f: Function, args: &[Value]) -> Result<Value> {
    arity(f, args, 2, 3)?;
    let Some(modulus) = args.get(2) else {
        return arith::power(&args[0], &args[1]);
    };
    let base = integer(f, &args[0])?;
    let exponent = integer(f, &args[1])?;
    let modulus = integer(f, modulus)?;
    if modulus == 0 {
        return Err(EvalError::Domain("pow() 3rd argument cannot be 0".into()));
    }
    if exponent < 0 {
        return Err(EvalError::Domain(
            "pow() negative exponent not supported with a modulus".into(),
        ));
    }

    let m = i128::from(modulus);
    let mut result: i128 = 1;
    let mut base = i128::from(base).rem_euclid(m);
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = (result * base).rem_euclid(m);
        }
        base = (base * base).rem_euclid(m);
        exponent >>= 1;
    }
    // Remainder takes the sign of the modulus.
    let result = result.rem_euclid(m);
    let result = if m < 0 && result != 0 { result + m } else { result };
    i64::try_from(result).map(Value::Int).map_err(|_| EvalError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        Function::lookup(name).expect("whitelisted").apply(args)
    }

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn lookup_covers_the_whitelist_only() {
        assert_eq!(Function::lookup("sqrt"), Some(Function::Sqrt));
        assert_eq!(Function::lookup("open"), None);
        assert_eq!(Function::lookup("__import__"), None);
        assert_eq!(Function::names().count(), FUNCTIONS.len());
        for name in Function::names() {
            assert_eq!(Function::lookup(name).map(Function::name), Some(name));
        }
    }

    #[test]
    fn rounding_family_returns_integers() {
        assert_eq!(call("ceil", &[Value::Float(3.2)]).unwrap(), int(4));
        assert_eq!(call("floor", &[Value::Float(3.8)]).unwrap(), int(3));
        assert_eq!(call("trunc", &[Value::Float(-3.8)]).unwrap(), int(-3));
        assert_eq!(call("round", &[Value::Float(2.5)]).unwrap(), int(2));
        assert_eq!(call("round", &[Value::Float(3.5)]).unwrap(), int(4));
        assert_eq!(
            call("round", &[Value::Float(2.675), int(1)]).unwrap(),
            Value::Float(2.7)
        );
        assert_eq!(call("round", &[int(1250), int(-2)]).unwrap(), int(1200));
        assert_eq!(call("round", &[int(1350), int(-2)]).unwrap(), int(1400));
        assert_eq!(call("round", &[int(-1250), int(-2)]).unwrap(), int(-1200));
        assert_eq!(
            call("round", &[int(i64::MIN), int(-1)]),
            Err(EvalError::Overflow)
        );
        assert!(call("ceil", &[Value::Float(f64::INFINITY)]).is_err());
    }

    #[test]
    fn integer_functions() {
        assert_eq!(call("factorial", &[int(10)]).unwrap(), int(3_628_800));
        assert_eq!(call("factorial", &[int(0)]).unwrap(), int(1));
        assert_eq!(call("factorial", &[int(21)]), Err(EvalError::Overflow));
        assert!(call("factorial", &[int(-1)]).is_err());
        assert!(call("factorial", &[Value::Float(5.0)]).is_err());
        assert_eq!(call("comb", &[int(5), int(2)]).unwrap(), int(10));
        assert_eq!(call("comb", &[int(2), int(5)]).unwrap(), int(0));
        assert_eq!(call("perm", &[int(5), int(2)]).unwrap(), int(20));
        assert_eq!(call("perm", &[int(4)]).unwrap(), int(24));
        assert_eq!(call("gcd", &[int(48), int(18)]).unwrap(), int(6));
        assert_eq!(call("gcd", &[int(-4), int(6), int(10)]).unwrap(), int(2));
        assert_eq!(call("gcd", &[]).unwrap(), int(0));
        assert_eq!(call("lcm", &[int(12), int(18)]).unwrap(), int(36));
        assert_eq!(call("lcm", &[int(0), int(3)]).unwrap(), int(0));
    }

    #[test]
    fn min_max_sum() {
        assert_eq!(call("max", &[int(1), int(5), int(3)]).unwrap(), int(5));
        assert_eq!(call("min", &[int(1), int(5), int(3)]).unwrap(), int(1));
        let list = Value::List(vec![int(4), Value::Float(2.5), int(9)]);
        assert_eq!(call("min", &[list.clone()]).unwrap(), Value::Float(2.5));
        assert_eq!(call("sum", &[list]).unwrap(), Value::Float(15.5));
        assert_eq!(
            call("sum", &[Value::Tuple(vec![int(1), int(2)]), int(10)]).unwrap(),
            int(13)
        );
        assert!(call("max", &[Value::List(vec![])]).is_err());

        let (above, below) = (int(9_007_199_254_740_993), int(9_007_199_254_740_992));
        assert_eq!(call("min", &[above.clone(), below.clone()]).unwrap(), below);
        assert_eq!(call("max", &[below, above.clone()]).unwrap(), above);
        assert!(call("sum", &[int(3)]).is_err());
    }

    #[test]
    fn domain_errors() {
        assert_eq!(call("sqrt", &[int(-1)]), Err(EvalError::domain()));
        assert_eq!(call("log", &[int(0)]), Err(EvalError::domain()));
        assert_eq!(call("asin", &[int(2)]), Err(EvalError::domain()));
        assert_eq!(call("atanh", &[int(1)]), Err(EvalError::domain()));
        assert!(call("exp", &[int(1000)]).is_err());
    }

    #[test]
    fn pow_with_modulus() {
        assert_eq!(call("pow", &[int(2), int(10)]).unwrap(), int(1024));
        assert_eq!(call("pow", &[int(3), int(4), int(5)]).unwrap(), int(1));
        assert_eq!(call("pow", &[int(-2), int(3), int(5)]).unwrap(), int(2));
        assert_eq!(call("pow", &[int(2), int(3), int(-5)]).unwrap(), int(-2));
        assert!(call("pow", &[int(2), int(3), int(0)]).is_err());
    }

    #[test]
    fn wrong_arity_is_a_type_error() {
        let err = call("sqrt", &[int(1), int(2)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "sqrt() takes exactly 1 argument (2 given)"
        );
    }

    #[test]
    fn constants() {
        assert_eq!(constant("pi"), Some(Value::Float(consts::PI)));
        assert_eq!(constant("tau"), Some(Value::Float(consts::TAU)));
        assert!(matches!(constant("nan"), Some(Value::Float(x)) if x.is_nan()));
        assert_eq!(constant("x"), None);
    }
}
