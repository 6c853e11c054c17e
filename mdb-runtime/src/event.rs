//! ホスト（コントローラ）へのイベントストリーム
//!
//! エンジンスレッドから送出される行指向・タグ付きのテキストイベントです。
//! `Display` 実装がワイヤ形式（`print,<text>` など）をそのまま生成します。

use std::fmt;
use std::sync::mpsc::Sender;

/// デバッガのライフサイクルマーカー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMarker {
    Stop,
    Continue,
}

/// ホストへ送るイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// 情報出力（バナー、リスト、バックトレース、変数ダンプ、print文の出力）
    Print(String),
    /// コマンド待ちのプロンプト（ワイヤ上は `print` として送られる）
    Prompt(String),
    /// 致命的でないプロトコル違反
    Warning(String),
    /// ライブ評価の構文エラー
    Error(String),
    /// セッションのライフサイクル
    Debug(DebugMarker),
}

impl Event {
    pub fn print(text: impl Into<String>) -> Self {
        Event::Print(text.into())
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Event::Warning(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Event::Error(text.into())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Print(text) => write!(f, "print,{}", text),
            Event::Prompt(prompt) => write!(f, "print,\r\n{}", prompt),
            Event::Warning(text) => write!(f, "warning,{}", text),
            Event::Error(text) => write!(f, "error,{}", text),
            Event::Debug(DebugMarker::Stop) => write!(f, "debug,stop"),
            Event::Debug(DebugMarker::Continue) => write!(f, "debug,continue"),
        }
    }
}

/// イベントの送出先
pub trait EventSink {
    fn post(&mut self, event: Event);
}

impl EventSink for Sender<Event> {
    fn post(&mut self, event: Event) {
        // 受信側が閉じていても実行は継続する
        let _ = self.send(event);
    }
}

impl EventSink for Vec<Event> {
    fn post(&mut self, event: Event) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(Event::print("hello").to_string(), "print,hello");
        assert_eq!(Event::warning("bad").to_string(), "warning,bad");
        assert_eq!(Event::error("oops").to_string(), "error,oops");
        assert_eq!(Event::Debug(DebugMarker::Stop).to_string(), "debug,stop");
        assert_eq!(
            Event::Debug(DebugMarker::Continue).to_string(),
            "debug,continue"
        );
        assert_eq!(Event::Prompt("> ".into()).to_string(), "print,\r\n> ");
    }
}
