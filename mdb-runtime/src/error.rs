//! ランタイムのエラー型

use crate::Location;
use thiserror::Error;

/// 構文解析エラー
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} at {location}")]
pub struct ParseError {
    pub message: String,
    pub location: Location,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// 実行時エラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("Use of uninitialized variable '{0}'")]
    UndefinedVariable(String),

    #[error("Function '{0}' not found")]
    UndefinedFunction(String),

    #[error("Index {index} out of bounds (length: {length})")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Member function '{member}' not found on {component}")]
    UnknownMember { component: String, member: String },

    #[error("Wrong number of arguments to '{name}': expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Divide by zero")]
    DivideByZero,

    #[error("Stack overflow")]
    StackOverflow,

    #[error("Count {0} does not fit in Integer")]
    CountOverflow(usize),
}
