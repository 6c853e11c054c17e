//! 一時停止中の読み取り専用コマンド
//!
//! 各ハンドラはインタプリタを共有参照でのみ受け取り、出力イベントを返します。
//! バックトレースや変数は呼び出しのたびに環境から取り直します。

use crate::backtrace::format_backtrace;
use crate::command::DebugCommand;
use crate::errors::{DebugError, ERR_ALREADY_RUNNING, ERR_INVALID_COMMAND};
use crate::source::{format_location, SourceWindow};
use mdb_runtime::{Environment, Event, Interpreter, Location, Value, ROOT_OBJECT_NAME};

/// HELP の出力
const HELP_TEXT: &str = concat!(
    "Command List:\r\n",
    "   bt              Print backtrace of call function context frames\r\n",
    "   cont|c          Continue script execution\r\n",
    "   exit|q          Exit shell\r\n",
    "   last|l          Show last line that executed\r\n",
    "   next|n          Show the next line to execute\r\n",
    "   list            List current function\r\n",
    "   step|s|t        Step one program statement\r\n",
    "   thread|th       Show selected thread\r\n",
    "   threads|ths     List all threads of execution\r\n",
    "   over|v          Step over one program statement (for now act as step)\r\n",
    "   out|o           Step out from current function (for now act as step)\r\n",
    "   var             Display local variables and their types/values\r\n",
    "   print|p|?       Print variable value or expression\r\n\r\n",
    "   Type any expression for a live compile and run, in the context\r\n",
    "   of the current function.  Put the 'stop' statement in your code\r\n",
    "   to trigger a breakpoint.  Then use 'c', 's', or other commands.\r\n",
);

/// THREADS の見出し
const THREADS_HEADER: &str = "ID    Location                                Source Code\r\n";

/// 読み取り専用コマンドのディスパッチャ
pub struct CommandDispatcher<'a> {
    interpreter: &'a Interpreter,
    sources: &'a SourceWindow,
    /// 次に実行する文の位置
    current: &'a Location,
    /// 最後に実行した文の位置
    last: &'a Location,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(
        interpreter: &'a Interpreter,
        sources: &'a SourceWindow,
        current: &'a Location,
        last: &'a Location,
    ) -> Self {
        Self {
            interpreter,
            sources,
            current,
            last,
        }
    }

    /// コマンドを処理して出力イベントを返す
    pub fn dispatch(&self, command: DebugCommand) -> Vec<Event> {
        match command {
            DebugCommand::Bt => vec![self.backtrace()],
            DebugCommand::Help => vec![Event::print(HELP_TEXT)],
            DebugCommand::Last => vec![self.last_line()],
            DebugCommand::List => self.list(),
            DebugCommand::Next => vec![self.next_line()],
            DebugCommand::Thread => vec![self.thread()],
            DebugCommand::Threads => vec![self.threads()],
            DebugCommand::Var => vec![self.variables()],
            DebugCommand::Break => protocol_event(ERR_ALREADY_RUNNING).into_iter().collect(),
            DebugCommand::Cont | DebugCommand::Step | DebugCommand::Exit | DebugCommand::Expr => {
                protocol_event(ERR_INVALID_COMMAND).into_iter().collect()
            }
        }
    }

    /// BT
    pub fn backtrace(&self) -> Event {
        let frames = self.interpreter.environment().back_trace();
        Event::Print(format_backtrace(&frames, self.current))
    }

    /// LIST
    ///
    /// 最も内側の関数の範囲を1行ずつ出力します。
    pub fn list(&self) -> Vec<Event> {
        let frames = self.interpreter.environment().back_trace();
        let Some(innermost) = frames.last() else {
            return Vec::new();
        };

        let file = &self.current.file;
        let flag_line = if self.current.file == self.last.file {
            self.last.start.line
        } else {
            self.current.start.line
        };
        let span = &innermost.function_location;
        self.sources
            .clip(file, span.start.line, span.end.line)
            .map(|n| Event::Print(self.sources.render(file, n, n, flag_line)))
            .collect()
    }

    /// LAST
    pub fn last_line(&self) -> Event {
        Event::Print(self.sources.announce(&self.last.file, self.last.start.line))
    }

    /// NEXT
    pub fn next_line(&self) -> Event {
        Event::Print(self.sources.announce(&self.current.file, self.current.start.line))
    }

    fn thread_row(&self) -> String {
        let source = self
            .sources
            .line(&self.last.file, self.last.start.line)
            .unwrap_or_default()
            .trim();
        format!(" 0*   {:<40}{}", format_location(self.current), source)
    }

    /// THREAD
    pub fn thread(&self) -> Event {
        Event::Print(format!("Thread selected: {}\r\n", self.thread_row()))
    }

    /// THREADS
    pub fn threads(&self) -> Event {
        Event::Print(format!(
            "{}{}\r\n  *selected\r\n",
            THREADS_HEADER,
            self.thread_row()
        ))
    }

    /// VAR
    pub fn variables(&self) -> Event {
        Event::Print(format_variables(self.interpreter.environment()))
    }
}

fn protocol_event(message: &str) -> Option<Event> {
    DebugError::protocol(message).to_event()
}

/// ルートオブジェクトと最も内側の関数スコープの変数を一覧にする
pub fn format_variables(environment: &Environment) -> String {
    let root_count = environment.root_object().element_count().unwrap_or(0);
    let mut out = format!("{:<16} Interface:ifGlobal\r\n", "global");
    out.push_str(&format!(
        "{:<16} roAssociativeArray count:{}\r\n",
        ROOT_OBJECT_NAME, root_count
    ));
    for (name, value) in environment.function_scope().iter() {
        out.push_str(&format_variable(name, value));
        out.push_str("\r\n");
    }
    out
}

/// 変数1つ分の行
///
/// スカラーは値、コレクションは要素数、その他のオブジェクトはコンポーネント名を表示します。
pub fn format_variable(name: &str, value: &Value) -> String {
    match value {
        Value::Invalid | Value::Boolean(_) | Value::Integer(_) | Value::Float(_) | Value::Str(_) => {
            format!("{:<16} {} val:{}", name, value.kind(), value)
        }
        Value::Array(_) | Value::AssocArray(_) => format!(
            "{:<16} {} count:{}",
            name,
            value.component_name().unwrap_or_default(),
            value.element_count().unwrap_or(0)
        ),
        Value::Object(component) => format!("{:<17}{}", name, component),
        Value::Callable(_) => format!("{:<17}{}", name, value),
    }
}
