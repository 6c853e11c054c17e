//! デバッガの設定

use crate::channel::DEFAULT_PAYLOAD_CAPACITY;
use crate::Result;
use anyhow::anyhow;

/// コマンド待ちのプロンプト
pub const DEFAULT_PROMPT: &str = "Brightscript Debugger> ";

/// ソースダイジェスト行に表示する値
pub const DEFAULT_SOURCE_DIGEST: &str = "5c04534a";

/// デバッガの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerConfig {
    pub prompt: String,
    /// チャネル（パッケージ）のバージョン
    pub channel_version: String,
    pub source_digest: String,
    /// アプリケーションのタイトル
    pub title: String,
    /// EXPR ペイロードの容量（ワード数）
    pub payload_capacity: usize,
}

impl DebuggerConfig {
    pub fn new() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            channel_version: "1.0.0".to_string(),
            source_digest: DEFAULT_SOURCE_DIGEST.to_string(),
            title: "mdb".to_string(),
            payload_capacity: DEFAULT_PAYLOAD_CAPACITY,
        }
    }

    /// 設定値を検証する
    pub fn validate(&self) -> Result<()> {
        if self.payload_capacity == 0 {
            return Err(anyhow!("Payload capacity must be at least 1 word"));
        }
        if self.prompt.is_empty() {
            return Err(anyhow!("Prompt must not be empty"));
        }
        Ok(())
    }

    /// バナーのソースダイジェスト行
    pub fn digest_line(&self) -> String {
        format!(
            "pkg: dev {} {} {}",
            self.channel_version, self.source_digest, self.title
        )
    }
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self::new()
    }
}
