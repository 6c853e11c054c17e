//! ソース位置情報

use std::fmt;

/// ソース中の位置（行・列とも1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// ファイル内の範囲
///
/// パーサが生成し、以降は表示用途でのみ参照されます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Location {
    /// 新しい位置情報を作成する
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// 開始行・終了行のみを指定して作成する
    pub fn lines(file: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self::new(file, Position::new(start_line, 0), Position::new(end_line, 0))
    }

    /// 二つの範囲を覆う範囲を返す
    pub fn span(&self, other: &Location) -> Location {
        Location {
            file: self.file.clone(),
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}-{},{})",
            self.file, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}
