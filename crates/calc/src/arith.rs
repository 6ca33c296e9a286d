//! Arithmetic on [`Value`]s.
//!
//! Integer operations are checked and fail with [`EvalError::Overflow`]
//! instead of wrapping. Floor division and modulo round toward negative
//! infinity, so the remainder takes the sign of the divisor.

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{EvalError, Result};
use crate::value::Value;

enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn operands(op: BinaryOp, left: &Value, right: &Value) -> Result<Operands> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Ok(Operands::Ints(*a, *b));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Operands::Floats(a, b)),
        _ => Err(EvalError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Refuse operators outside the arithmetic subset before any operand is
/// evaluated.
pub(crate) fn ensure_supported(op: BinaryOp) -> Result<()> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Mod
        | BinaryOp::Pow => Ok(()),
        BinaryOp::MatMul
        | BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => Err(EvalError::OperatorNotAllowed(op.symbol())),
    }
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    ensure_supported(op)?;
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => match operands(op, left, right)? {
            Operands::Ints(a, b) => a.checked_sub(b).map(Value::Int).ok_or(EvalError::Overflow),
            Operands::Floats(a, b) => Ok(Value::Float(a - b)),
        },
        BinaryOp::Mul => match operands(op, left, right)? {
            Operands::Ints(a, b) => a.checked_mul(b).map(Value::Int).ok_or(EvalError::Overflow),
            Operands::Floats(a, b) => Ok(Value::Float(a * b)),
        },
        BinaryOp::Div => {
            let (a, b) = match operands(op, left, right)? {
                Operands::Ints(a, b) => (a as f64, b as f64),
                Operands::Floats(a, b) => (a, b),
            };
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::FloorDiv => match operands(op, left, right)? {
            Operands::Ints(a, b) => floor_div_int(a, b).map(Value::Int),
            Operands::Floats(a, b) => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Float((a / b).floor()))
            }
        },
        BinaryOp::Mod => match operands(op, left, right)? {
            Operands::Ints(a, b) => mod_int(a, b).map(Value::Int),
            Operands::Floats(a, b) => mod_float(a, b).map(Value::Float),
        },
        BinaryOp::Pow => power(left, right),
        BinaryOp::MatMul
        | BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => Err(EvalError::OperatorNotAllowed(op.symbol())),
    }
}

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Invert, _) => Err(EvalError::OperatorNotAllowed("~")),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
        (UnaryOp::Neg | UnaryOp::Pos, Value::List(_) | Value::Tuple(_)) => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            Err(EvalError::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                operand.type_name()
            )))
        }
    }
}

pub(crate) fn add(left: &Value, right: &Value) -> Result<Value> {
    match operands(BinaryOp::Add, left, right)? {
        Operands::Ints(a, b) => a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow),
        Operands::Floats(a, b) => Ok(Value::Float(a + b)),
    }
}

pub(crate) fn power(base: &Value, exponent: &Value) -> Result<Value> {
    match operands(BinaryOp::Pow, base, exponent)? {
        Operands::Ints(a, b) if b >= 0 => pow_int(a, b).map(Value::Int),
        Operands::Ints(a, b) => {
            if a == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Float((a as f64).powf(b as f64)))
        }
        Operands::Floats(a, b) => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            if a < 0.0 && b.is_finite() && b.fract() != 0.0 {
                return Err(EvalError::domain());
            }
            Ok(Value::Float(a.powf(b)))
        }
    }
}

fn pow_int(base: i64, exponent: i64) -> Result<i64> {
    match u32::try_from(exponent) {
        Ok(exponent) => base.checked_pow(exponent).ok_or(EvalError::Overflow),
        // Only these bases survive an exponent this large.
        Err(_) => match base {
            0 | 1 => Ok(base),
            -1 => Ok(if exponent % 2 == 0 { 1 } else { -1 }),
            _ => Err(EvalError::Overflow),
        },
    }
}

pub(crate) fn floor_div_int(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let quotient = a.checked_div(b).ok_or(EvalError::Overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

pub(crate) fn mod_int(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let remainder = a.wrapping_rem(b);
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

fn mod_float(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let remainder = a % b;
    if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}
