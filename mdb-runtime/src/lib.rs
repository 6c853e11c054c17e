//! mdb のスクリプト実行エンジン
//!
//! このクレートは、字句解析・構文解析・実行環境・インタプリタを提供します。
//! デバッガ本体は [`StopHandler`] を通じてエンジンに接続されます。

pub mod ast;
pub mod environment;
pub mod error;
pub mod event;
pub mod interpreter;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod value;

pub use ast::Statement;
pub use environment::{BackTraceFrame, Environment, Scope, ROOT_OBJECT_NAME};
pub use error::{ParseError, RuntimeError};
pub use event::{DebugMarker, Event, EventSink};
pub use interpreter::{
    ExecResult, Flow, Interpreter, Interrupt, RunOutcome, StopHandler, ENGINE_STACK_SIZE,
    MAX_ARRAY_LEN, MAX_CALL_DEPTH,
};
pub use lexer::{Lexer, ScanResults, Token, TokenKind};
pub use location::{Location, Position};
pub use parser::{ParseResults, Parser, MAX_NESTING_DEPTH};
pub use value::{AssocArray, Value, ValueKind};

/// ランタイムの結果型
pub type Result<T> = anyhow::Result<T>;
