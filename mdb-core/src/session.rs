//! デバッグセッション
//!
//! エンジンが一時停止するたびに呼ばれ、停止の通知を出力したあと
//! コマンドチャネルからコマンドを受け取り続けます。CONT / STEP / EXIT を
//! 受け取るとループを抜けてエンジンへ制御を返します。

use crate::channel::CommandChannel;
use crate::command::DebugCommand;
use crate::config::DebuggerConfig;
use crate::dispatcher::{format_variables, CommandDispatcher};
use crate::errors::{DebugError, ERR_INVALID_COMMAND, ERR_UNEXPECTED_PARAMETER};
use crate::expr_eval::ExpressionEvaluator;
use crate::source::{format_location, SourceWindow};
use crate::backtrace::format_backtrace;
use mdb_runtime::{DebugMarker, Event, Interpreter, Location, StopHandler};
use std::sync::Arc;
use tracing::{debug, info};

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// スクリプト実行中
    Running,
    /// 一時停止してコマンド待ち
    Paused,
    /// 1文だけ実行して再び停止する
    SteppingSingle,
    /// 終了済み
    Exited,
}

/// デバッグセッション
pub struct DebugSession {
    channel: Arc<CommandChannel>,
    config: DebuggerConfig,
    state: SessionState,
    step_mode: bool,
    sources: SourceWindow,
    evaluator: ExpressionEvaluator,
}

impl DebugSession {
    pub fn new(channel: Arc<CommandChannel>, config: DebuggerConfig) -> Self {
        Self {
            channel,
            config,
            state: SessionState::Running,
            step_mode: false,
            sources: SourceWindow::new(),
            evaluator: ExpressionEvaluator::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn step_mode(&self) -> bool {
        self.step_mode
    }

    /// 一時停止を処理する
    ///
    /// # Arguments
    /// * `current` - 次に実行する文の位置
    /// * `last` - 最後に実行した文の位置
    ///
    /// # Returns
    /// 実行を再開する場合はtrue、スクリプトを終了する場合はfalse
    pub fn run(&mut self, interpreter: &mut Interpreter, current: &Location, last: &Location) -> bool {
        if self.state == SessionState::Exited {
            return false;
        }
        self.state = SessionState::Paused;
        self.cache_source(interpreter, &current.file);
        self.cache_source(interpreter, &last.file);

        if self.step_mode {
            let line = self.sources.announce(&last.file, last.start.line);
            interpreter.post(Event::Print(line));
        } else {
            info!("Paused at {}", format_location(last));
            self.announce_stop(interpreter, current, last);
        }

        loop {
            interpreter.post(Event::Prompt(self.config.prompt.clone()));
            let claimed = self.channel.blocking_receive();
            let command = claimed.command();

            if command == Some(DebugCommand::Expr) {
                let text = claimed.expression.unwrap_or_default();
                if let Err(e) = self.evaluator.evaluate(interpreter, &text) {
                    if let Some(event) = e.to_event() {
                        interpreter.post(event);
                    }
                }
                continue;
            }

            if claimed.extra_parameter {
                post_error(interpreter, DebugError::protocol(ERR_UNEXPECTED_PARAMETER));
                continue;
            }

            match command {
                Some(DebugCommand::Cont) => {
                    self.step_mode = false;
                    interpreter.set_debug_mode(false);
                    interpreter.post(Event::Debug(DebugMarker::Continue));
                    self.state = SessionState::Running;
                    return true;
                }
                Some(DebugCommand::Step) => {
                    self.step_mode = true;
                    interpreter.set_debug_mode(true);
                    self.state = SessionState::SteppingSingle;
                    return true;
                }
                Some(DebugCommand::Exit) => {
                    debug!("Exit requested");
                    self.state = SessionState::Exited;
                    return false;
                }
                Some(other) => {
                    let events =
                        CommandDispatcher::new(interpreter, &self.sources, current, last)
                            .dispatch(other);
                    for event in events {
                        interpreter.post(event);
                    }
                }
                None => {
                    debug!("Unknown command code {}", claimed.code);
                    post_error(interpreter, DebugError::protocol(ERR_INVALID_COMMAND));
                }
            }
        }
    }

    fn cache_source(&mut self, interpreter: &Interpreter, file: &str) {
        if self.sources.contains(file) {
            return;
        }
        if let Some(text) = interpreter.source(file) {
            self.sources.load(file, text);
        }
    }

    /// 停止時のバナーを出力する
    fn announce_stop(&self, interpreter: &mut Interpreter, current: &Location, last: &Location) {
        interpreter.post(Event::Debug(DebugMarker::Stop));

        let last_line = last.start.line;
        let mut banner = String::from("BrightScript Micro Debugger.\r\n");
        banner.push_str("Enter any BrightScript statement, debug commands, or HELP\r\n\r\n");
        banner.push_str("\r\nCurrent Function:\r\n");
        banner.push_str(&self.sources.render(
            &last.file,
            last_line.saturating_sub(8),
            last_line + 5,
            last_line,
        ));
        banner.push_str("Source Digest(s):\r\n");
        banner.push_str(&format!("{}\r\n\r\n", self.config.digest_line()));
        banner.push_str(&format!(
            "STOP (runtime error &hf7) in {}\r\n",
            format_location(last)
        ));
        banner.push_str("Backtrace: \r\n");
        interpreter.post(Event::Print(banner));

        let frames = interpreter.environment().back_trace();
        interpreter.post(Event::Print(format_backtrace(&frames, current)));
        interpreter.post(Event::print("Local variables:\r\n"));
        let variables = format_variables(interpreter.environment());
        interpreter.post(Event::Print(variables));
    }
}

impl StopHandler for DebugSession {
    fn on_stop(&mut self, interpreter: &mut Interpreter, current: &Location, last: &Location) -> bool {
        self.run(interpreter, current, last)
    }

    fn break_requested(&mut self) -> bool {
        if self.state == SessionState::Exited || !self.channel.take_break_request() {
            return false;
        }
        info!("Break requested while running");
        self.step_mode = false;
        true
    }
}

fn post_error(interpreter: &mut Interpreter, error: DebugError) {
    if let Some(event) = error.to_event() {
        interpreter.post(event);
    }
}
