//! エラーメッセージ定数とデバッガのエラー種別

use mdb_runtime::{Event, RuntimeError};
use thiserror::Error;

/// EXPR 以外のコマンドに余分な引数が付いていた場合の警告
pub const ERR_UNEXPECTED_PARAMETER: &str = "Unexpected parameter";

/// 未知のコマンドコードを受け取った場合の警告
pub const ERR_INVALID_COMMAND: &str = "Invalid Debug command/expression!\r\n";

/// 一時停止中に BREAK を受け取った場合の警告
pub const ERR_ALREADY_RUNNING: &str = "Micro Debugger already running!\r\n";

/// ライブ評価のテキストが文として解析できなかった場合のエラー
pub const ERR_LIVE_COMPILE: &str = "Syntax Error. (compile error &h02) in $LIVECOMPILE";

/// ライブ評価で許可されていない文の場合のメッセージ
pub const ERR_NOT_SUPPORTED: &str = "Debug command/expression not supported!\r\n";

/// デバッグセッション中に発生するエラー
///
/// いずれもセッションを終了させません。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DebugError {
    /// 余分な引数、未知のコマンド、一時停止中の BREAK
    #[error("{0}")]
    ProtocolViolation(String),

    /// ライブ評価のテキストが0個の文に解析された
    #[error("{}", ERR_LIVE_COMPILE)]
    SyntaxError,

    /// 許可リスト外の文
    #[error("{}", ERR_NOT_SUPPORTED)]
    UnsupportedStatement(&'static str),

    /// 許可された文の実行中に発生した実行時エラー
    #[error("Live evaluation failed: {0}")]
    RuntimeFault(RuntimeError),
}

impl DebugError {
    pub fn protocol(message: &str) -> Self {
        DebugError::ProtocolViolation(message.to_string())
    }

    /// コントローラへ送るイベントに変換する
    ///
    /// 実行時エラーはコントローラへは通知しません。
    pub fn to_event(&self) -> Option<Event> {
        match self {
            DebugError::ProtocolViolation(message) => Some(Event::warning(message.as_str())),
            DebugError::SyntaxError => Some(Event::error(ERR_LIVE_COMPILE)),
            DebugError::UnsupportedStatement(_) => Some(Event::print(ERR_NOT_SUPPORTED)),
            DebugError::RuntimeFault(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_event_wire_format() {
        let event = DebugError::protocol(ERR_UNEXPECTED_PARAMETER).to_event().unwrap();
        assert_eq!(event.to_string(), "warning,Unexpected parameter");

        let event = DebugError::SyntaxError.to_event().unwrap();
        assert_eq!(
            event.to_string(),
            "error,Syntax Error. (compile error &h02) in $LIVECOMPILE"
        );

        let event = DebugError::UnsupportedStatement("if").to_event().unwrap();
        assert_eq!(event.to_string(), "print,Debug command/expression not supported!\r\n");
    }

    #[test]
    fn test_runtime_fault_is_silent() {
        let fault = DebugError::RuntimeFault(RuntimeError::DivideByZero);
        assert!(fault.to_event().is_none());
        assert!(fault.to_string().contains("Divide by zero"));
    }
}
