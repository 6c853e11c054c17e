//! ソースの行キャッシュと表示用フォーマット

use mdb_runtime::Location;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// ファイルごとの行キャッシュ
///
/// 行は内部では0始まりで保持し、表示・問い合わせは1始まりで行います。
#[derive(Debug, Default)]
pub struct SourceWindow {
    files: HashMap<String, Vec<String>>,
}

impl SourceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    /// ソーステキストを行に分割してキャッシュする
    pub fn load(&mut self, file: &str, text: &str) {
        let lines = text
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        self.files.insert(file.to_string(), lines);
    }

    /// キャッシュ済みの行数（未キャッシュなら0）
    pub fn line_count(&self, file: &str) -> usize {
        self.files.get(file).map_or(0, Vec::len)
    }

    /// 1始まりの行番号で行を取得する
    pub fn line(&self, file: &str, line: usize) -> Option<&str> {
        let lines = self.files.get(file)?;
        line.checked_sub(1)
            .and_then(|index| lines.get(index))
            .map(String::as_str)
    }

    /// 範囲を `[1, 行数]` に収める
    pub fn clip(&self, file: &str, start: usize, end: usize) -> RangeInclusive<usize> {
        start.max(1)..=end.min(self.line_count(file))
    }

    /// `start..=end` の各行を `NNN:* text` 形式で連結する
    pub fn render(&self, file: &str, start: usize, end: usize, flag_line: usize) -> String {
        self.clip(file, start, end)
            .map(|n| {
                let text = self.line(file, n).unwrap_or_default();
                format!("{}\r\n", format_line(n, n == flag_line, text))
            })
            .collect()
    }

    /// 1行を `NNN: text` 形式で返す（ステップ実行の通知、LAST、NEXT）
    pub fn announce(&self, file: &str, line: usize) -> String {
        format!(
            "{:03}: {}\r\n",
            line,
            self.line(file, line).unwrap_or_default()
        )
    }
}

/// `NNN:* text` 形式の1行
pub fn format_line(line: usize, flagged: bool, text: &str) -> String {
    let flag = if flagged { '*' } else { ' ' };
    format!("{:03}:{} {}", line, flag, text)
}

/// 位置を `pkg:/file(line)` 形式で表す
pub fn format_location(location: &Location) -> String {
    if location.start.line == 0 {
        format!("pkg:/{}(??)", location.file)
    } else {
        format!("pkg:/{}({})", location.file, location.start.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> SourceWindow {
        let mut window = SourceWindow::new();
        window.load("main.brs", "sub main()\r\n  x = 1\n  stop\nend sub");
        window
    }

    #[test]
    fn test_line_lookup_is_one_based() {
        let window = window();
        assert_eq!(window.line_count("main.brs"), 4);
        assert_eq!(window.line("main.brs", 1), Some("sub main()"));
        assert_eq!(window.line("main.brs", 0), None);
        assert_eq!(window.line("main.brs", 5), None);
        assert_eq!(window.line("other.brs", 1), None);
    }

    #[test]
    fn test_clip_to_file_bounds() {
        let window = window();
        assert_eq!(window.clip("main.brs", 0, 40), 1..=4);
        assert!(window.clip("missing.brs", 1, 3).is_empty());
    }

    #[test]
    fn test_render_flags_line() {
        let window = window();
        assert_eq!(
            window.render("main.brs", 2, 9, 3),
            "002:    x = 1\r\n003:*   stop\r\n004:  end sub\r\n"
        );
    }

    #[test]
    fn test_announce() {
        assert_eq!(window().announce("main.brs", 3), "003:   stop\r\n");
    }

    #[test]
    fn test_format_location() {
        assert_eq!(
            format_location(&Location::lines("main.brs", 12, 12)),
            "pkg:/main.brs(12)"
        );
        assert_eq!(format_location(&Location::lines("main.brs", 0, 0)), "pkg:/main.brs(??)");
    }
}
