//! デバッガコマンド

/// チャネル上でやり取りされるデバッガコマンド
///
/// 判別値がそのままワイヤ上のコマンドコードになります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugCommand {
    /// バックトレース表示
    Bt = 0,
    /// 実行継続
    Cont = 1,
    /// スクリプトを終了
    Exit = 2,
    /// ヘルプ表示
    Help = 3,
    /// 最後に実行した行を表示
    Last = 4,
    /// 現在の関数を表示
    List = 5,
    /// 次に実行する行を表示
    Next = 6,
    /// 1文ステップ実行
    Step = 7,
    /// 選択中のスレッドを表示
    Thread = 8,
    /// スレッド一覧を表示
    Threads = 9,
    /// ローカル変数表示
    Var = 10,
    /// ライブ評価
    Expr = 11,
    /// 実行中のスクリプトを一時停止
    Break = 12,
}

impl DebugCommand {
    /// 全コマンド（コード順）
    pub const ALL: [DebugCommand; 13] = [
        DebugCommand::Bt,
        DebugCommand::Cont,
        DebugCommand::Exit,
        DebugCommand::Help,
        DebugCommand::Last,
        DebugCommand::List,
        DebugCommand::Next,
        DebugCommand::Step,
        DebugCommand::Thread,
        DebugCommand::Threads,
        DebugCommand::Var,
        DebugCommand::Expr,
        DebugCommand::Break,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

/// コントローラが入力したコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: DebugCommand,
    /// EXPR では評価するテキスト、それ以外では余分な引数
    pub payload: Option<String>,
}

impl Command {
    /// コマンド文字列をパースする
    ///
    /// コマンド名に一致しない入力はすべてライブ評価として扱います。
    pub fn parse(input: &str) -> Option<Self> {
        let line = input.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let kind = match word.to_ascii_lowercase().as_str() {
            "bt" => DebugCommand::Bt,
            "cont" | "c" => DebugCommand::Cont,
            "exit" | "q" => DebugCommand::Exit,
            "help" => DebugCommand::Help,
            "last" | "l" => DebugCommand::Last,
            "list" => DebugCommand::List,
            "next" | "n" => DebugCommand::Next,
            "step" | "s" | "t" | "over" | "v" | "out" | "o" => DebugCommand::Step,
            "thread" | "th" => DebugCommand::Thread,
            "threads" | "ths" => DebugCommand::Threads,
            "var" => DebugCommand::Var,
            "break" | "brk" => DebugCommand::Break,
            "print" | "p" | "?" => {
                return Some(Command::expr(format!("print {}", rest)));
            }
            _ => return Some(Command::expr(line)),
        };

        Some(Command {
            kind,
            payload: (!rest.is_empty()).then(|| rest.to_string()),
        })
    }

    /// ライブ評価コマンドを作成する
    pub fn expr(text: impl Into<String>) -> Self {
        Command {
            kind: DebugCommand::Expr,
            payload: Some(text.into()),
        }
    }
}
