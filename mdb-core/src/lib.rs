//! mdb デバッガのコア機能
//!
//! このクレートは、スクリプトエンジンに組み込まれるマイクロデバッガを提供します。
//! コマンドチャネルによるコントローラとの同期、一時停止中のコマンド処理、
//! ライブ評価、ソースとバックトレースの整形を統合します。

pub mod backtrace;
pub mod channel;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod expr_eval;
pub mod session;
pub mod source;

pub use channel::{Claimed, CommandChannel};
pub use command::{Command, DebugCommand};
pub use config::DebuggerConfig;
pub use dispatcher::CommandDispatcher;
pub use errors::DebugError;
pub use expr_eval::ExpressionEvaluator;
pub use session::{DebugSession, SessionState};
pub use source::SourceWindow;

// 他のクレートから使用するために再エクスポート
pub use mdb_runtime::{Event, Interpreter, Location, RunOutcome};

/// デバッガの結果型
pub type Result<T> = anyhow::Result<T>;
