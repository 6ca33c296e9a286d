//! Sandboxed evaluation of numeric expressions.
//!
//! Input is parsed into a closed syntax tree and walked by an evaluator that
//! only knows arithmetic, a fixed set of math functions and a handful of
//! constants. Nothing in this crate touches the environment, the filesystem
//! or the process.

mod arith;
pub mod ast;
mod error;
mod eval;
mod functions;
mod lexer;
pub mod parser;
mod value;

pub use ast::Expr;
pub use error::{EvalError, Result};
pub use eval::{eval, evaluate};
pub use functions::{Function, constant};
pub use parser::parse;
pub use value::Value;
