//! コマンドチャネル
//!
//! コントローラとエンジンの間の単一スロットの同期メールボックスです。
//! 固定レイアウトの `i32` ワード配列を `Mutex` で保護し、`Condvar` で
//! エンジン側の待機を起こします。キューは持たず、未受信のコマンドは
//! 常に高々1つです。
//!
//! レイアウト:
//! - ワード 0: コマンドコード（`-1` は空）
//! - ワード 1: 余分な引数フラグ（0/1）
//! - ワード 32 以降: EXPR のペイロード（Unicode スカラー値、0 または容量で終端）

use crate::command::DebugCommand;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// コマンドコードのスロット
pub const COMMAND_SLOT: usize = 0;

/// 余分な引数フラグのスロット
pub const EXTRA_PARAMETER_SLOT: usize = 1;

/// ペイロード領域の開始位置
pub const PAYLOAD_OFFSET: usize = 32;

/// ペイロード領域のデフォルト容量（ワード数）
pub const DEFAULT_PAYLOAD_CAPACITY: usize = 1024;

/// 空のコマンドスロットを表す値
pub const EMPTY: i32 = -1;

/// エンジンが受け取ったコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claimed {
    pub code: i32,
    pub extra_parameter: bool,
    /// EXPR の場合のみ、小文字化したペイロード
    pub expression: Option<String>,
}

impl Claimed {
    pub fn command(&self) -> Option<DebugCommand> {
        DebugCommand::from_code(self.code)
    }
}

/// コマンドチャネル
#[derive(Debug)]
pub struct CommandChannel {
    words: Mutex<Vec<i32>>,
    signal: Condvar,
    capacity: usize,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::with_payload_capacity(DEFAULT_PAYLOAD_CAPACITY)
    }

    /// ペイロード容量を指定して作成する
    pub fn with_payload_capacity(capacity: usize) -> Self {
        let mut words = vec![0; PAYLOAD_OFFSET + capacity];
        words[COMMAND_SLOT] = EMPTY;
        Self {
            words: Mutex::new(words),
            signal: Condvar::new(),
            capacity,
        }
    }

    pub fn payload_capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Vec<i32>> {
        self.words.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// コマンドを送る（コントローラ側）
    ///
    /// EXPR ではペイロードをエンコードして格納します。それ以外のコマンドでは
    /// ペイロードが与えられた場合に余分な引数フラグを立てます。
    pub fn send(&self, command: DebugCommand, payload: Option<&str>) {
        let mut words = self.lock();
        if command == DebugCommand::Expr {
            encode_payload(&mut words[PAYLOAD_OFFSET..], payload.unwrap_or_default());
            words[EXTRA_PARAMETER_SLOT] = 0;
        } else {
            words[EXTRA_PARAMETER_SLOT] = i32::from(payload.is_some());
        }
        store_code(&mut words, command.code());
        drop(words);
        self.signal.notify_one();
    }

    /// コマンドコードをそのまま送る（コントローラ側）
    pub fn send_code(&self, code: i32, extra_parameter: bool) {
        let mut words = self.lock();
        words[EXTRA_PARAMETER_SLOT] = i32::from(extra_parameter);
        store_code(&mut words, code);
        drop(words);
        self.signal.notify_one();
    }

    /// コマンドが届くまで待機し、受け取る（エンジン側）
    ///
    /// 受け取ったスロットは同じロックの中で空に戻すため、同じコマンドが
    /// 二度処理されることはありません。
    pub fn blocking_receive(&self) -> Claimed {
        let words = self.lock();
        let mut words = self
            .signal
            .wait_while(words, |words| words[COMMAND_SLOT] == EMPTY)
            .unwrap_or_else(PoisonError::into_inner);

        let code = words[COMMAND_SLOT];
        words[COMMAND_SLOT] = EMPTY;
        let extra_parameter = words[EXTRA_PARAMETER_SLOT] != 0;
        words[EXTRA_PARAMETER_SLOT] = 0;

        let expression = (code == DebugCommand::Expr.code())
            .then(|| decode_payload(&words[PAYLOAD_OFFSET..]));

        debug!("Claimed command code {} (extra: {})", code, extra_parameter);
        Claimed {
            code,
            extra_parameter,
            expression,
        }
    }

    /// 実行中に BREAK が届いていれば受け取る（エンジン側）
    ///
    /// BREAK 以外のコマンドはスロットに残します。
    pub fn take_break_request(&self) -> bool {
        let mut words = self.lock();
        if words[COMMAND_SLOT] != DebugCommand::Break.code() {
            return false;
        }
        words[COMMAND_SLOT] = EMPTY;
        words[EXTRA_PARAMETER_SLOT] = 0;
        debug!("Claimed break request");
        true
    }

    /// 未受信のコマンドコード
    pub fn pending_code(&self) -> Option<i32> {
        let code = self.lock()[COMMAND_SLOT];
        (code != EMPTY).then_some(code)
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn store_code(words: &mut [i32], code: i32) {
    let previous = words[COMMAND_SLOT];
    if previous != EMPTY {
        warn!(
            "Overwriting unclaimed command code {} with {}",
            previous, code
        );
    }
    words[COMMAND_SLOT] = code;
}

/// テキストをペイロード領域に書き込む
///
/// 容量を超えた分は切り捨て、容量未満なら0で終端します。
fn encode_payload(region: &mut [i32], text: &str) {
    let mut written = 0;
    for (slot, ch) in region.iter_mut().zip(text.chars()) {
        *slot = ch as i32;
        written += 1;
    }
    if let Some(terminator) = region.get_mut(written) {
        *terminator = 0;
    }
}

/// ペイロード領域を読み出す
///
/// 最初の0ワードまたは容量で終端し、すべての文字を小文字化します。
fn decode_payload(region: &[i32]) -> String {
    region
        .iter()
        .take_while(|&&word| word != 0)
        .filter_map(|&word| u32::try_from(word).ok().and_then(char::from_u32))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_claim_empties_slot() {
        let channel = CommandChannel::new();
        channel.send(DebugCommand::Var, None);
        assert_eq!(channel.pending_code(), Some(DebugCommand::Var.code()));

        let claimed = channel.blocking_receive();
        assert_eq!(claimed.command(), Some(DebugCommand::Var));
        assert!(!claimed.extra_parameter);
        assert_eq!(claimed.expression, None);
        assert_eq!(channel.pending_code(), None);
    }

    #[test]
    fn test_expression_is_lower_cased() {
        let channel = CommandChannel::new();
        channel.send(DebugCommand::Expr, Some("Print X"));
        let claimed = channel.blocking_receive();
        assert_eq!(claimed.expression.as_deref(), Some("print x"));
        assert!(!claimed.extra_parameter);
    }

    #[test]
    fn test_shorter_payload_is_terminated() {
        let channel = CommandChannel::new();
        channel.send(DebugCommand::Expr, Some("abcdef"));
        channel.blocking_receive();
        channel.send(DebugCommand::Expr, Some("xy"));
        assert_eq!(channel.blocking_receive().expression.as_deref(), Some("xy"));
    }

    #[test]
    fn test_payload_truncated_at_capacity() {
        let channel = CommandChannel::with_payload_capacity(4);
        channel.send(DebugCommand::Expr, Some("abcdefgh"));
        assert_eq!(channel.blocking_receive().expression.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_extra_parameter_flag() {
        let channel = CommandChannel::new();
        channel.send(DebugCommand::Bt, Some("now"));
        assert!(channel.blocking_receive().extra_parameter);
        channel.send(DebugCommand::Bt, None);
        assert!(!channel.blocking_receive().extra_parameter);
    }

    #[test]
    fn test_last_write_wins() {
        let channel = CommandChannel::new();
        channel.send(DebugCommand::Bt, None);
        channel.send(DebugCommand::Var, None);
        assert_eq!(channel.blocking_receive().command(), Some(DebugCommand::Var));
        assert_eq!(channel.pending_code(), None);
    }

    #[test]
    fn test_unknown_code() {
        let channel = CommandChannel::new();
        channel.send_code(42, false);
        let claimed = channel.blocking_receive();
        assert_eq!(claimed.code, 42);
        assert_eq!(claimed.command(), None);
    }

    #[test]
    fn test_take_break_request_only_claims_break() {
        let channel = CommandChannel::new();
        assert!(!channel.take_break_request());

        channel.send(DebugCommand::Var, None);
        assert!(!channel.take_break_request());
        assert_eq!(channel.pending_code(), Some(DebugCommand::Var.code()));
        channel.blocking_receive();

        channel.send(DebugCommand::Break, None);
        assert!(channel.take_break_request());
        assert_eq!(channel.pending_code(), None);
    }

    #[test]
    fn test_blocking_receive_waits_for_sender() {
        let channel = Arc::new(CommandChannel::new());
        let engine = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.blocking_receive())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!engine.is_finished());

        channel.send(DebugCommand::Cont, None);
        let claimed = engine.join().unwrap();
        assert_eq!(claimed.command(), Some(DebugCommand::Cont));
        assert_eq!(channel.pending_code(), None);
    }
}
