//! バックトレースの整形

use crate::source::format_location;
use mdb_runtime::{BackTraceFrame, Location};

/// 関数シグネチャを `Function name(a As Integer,b As String) As Void` 形式で返す
pub fn format_signature(frame: &BackTraceFrame) -> String {
    let args = frame
        .params
        .iter()
        .map(|(name, kind)| format!("{} As {}", name, kind))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "Function {}({}) As {}",
        frame.function_name, args, frame.return_kind
    )
}

/// バックトレースを整形する
///
/// `frames` は外側から内側の順（[`mdb_runtime::Environment::back_trace`] の順序）で
/// 受け取り、内側から外側へ出力します。各フレームには、1つ内側のフレームの
/// 呼び出し位置（最も内側のフレームは `stop`）を対応付けます。
pub fn format_backtrace(frames: &[BackTraceFrame], stop: &Location) -> String {
    let mut out = String::new();
    let mut location = stop;
    for (index, frame) in frames.iter().enumerate().rev() {
        out.push_str(&format!("#{}  {}\r\n", index, format_signature(frame)));
        out.push_str(&format!("   file/line: {}\r\n", format_location(location)));
        location = &frame.call_location;
    }
    out
}
