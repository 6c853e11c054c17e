//! エンジンスレッドとコントローラスレッドを使ったセッション全体のテスト

use mdb_core::dispatcher::CommandDispatcher;
use mdb_core::{Command, CommandChannel, DebugCommand, DebugSession, DebuggerConfig, SourceWindow};
use mdb_runtime::{
    DebugMarker, Event, Interpreter, Location, RunOutcome, StopHandler, ENGINE_STACK_SIZE,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// エンジンスレッドを起動する
fn spawn_engine(
    run: impl FnOnce() -> anyhow::Result<RunOutcome> + Send + 'static,
) -> JoinHandle<anyhow::Result<RunOutcome>> {
    thread::Builder::new()
        .name("engine".into())
        .stack_size(ENGINE_STACK_SIZE)
        .spawn(run)
        .unwrap()
}

/// スクリプトを実行し、プロンプトごとにコマンドを1つ送る
///
/// コマンドを使い切った後のプロンプトには EXIT を送ります。
fn run_script(
    source: &'static str,
    channel: Arc<CommandChannel>,
    commands: Vec<Command>,
) -> (anyhow::Result<RunOutcome>, Vec<Event>) {
    let (tx, rx) = mpsc::channel();
    let engine = {
        let channel = Arc::clone(&channel);
        spawn_engine(move || {
            let mut interpreter = Interpreter::new(tx)?;
            interpreter.set_stop_handler(DebugSession::new(channel, DebuggerConfig::default()));
            interpreter.run_source("main.brs", source)
        })
    };

    let mut commands = commands.into_iter();
    let mut events = Vec::new();
    while let Ok(event) = rx.recv() {
        let prompt = matches!(event, Event::Prompt(_));
        events.push(event);
        if prompt {
            let command = commands.next().unwrap_or_else(|| cmd(DebugCommand::Exit));
            channel.send(command.kind, command.payload.as_deref());
        }
    }

    (engine.join().unwrap(), events)
}

fn cmd(kind: DebugCommand) -> Command {
    Command {
        kind,
        payload: None,
    }
}

fn printed(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Print(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn stops(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| **e == Event::Debug(DebugMarker::Stop))
        .count()
}

const STEP_SCRIPT: &str = "sub main()
  x = 1
  stop
  y = 2
  z = 3
end sub";

#[test]
fn step_takes_one_line_announcement_path() {
    let channel = Arc::new(CommandChannel::new());
    let (outcome, events) = run_script(
        STEP_SCRIPT,
        Arc::clone(&channel),
        vec![cmd(DebugCommand::Step), cmd(DebugCommand::Cont)],
    );

    assert!(matches!(outcome.unwrap(), RunOutcome::Completed(_)));
    assert_eq!(stops(&events), 1);

    // STEP の後は y = 2 を実行し、z = 3 の手前で停止する
    let step_index = events
        .iter()
        .position(|e| *e == Event::print("004:   y = 2\r\n"))
        .expect("step announcement");
    assert!(matches!(events[step_index + 1], Event::Prompt(_)));
    assert_eq!(events.last(), Some(&Event::Debug(DebugMarker::Continue)));
    assert_eq!(channel.pending_code(), None);
}

#[test]
fn exit_in_step_mode_halts_script() {
    let (outcome, events) = run_script(
        STEP_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![cmd(DebugCommand::Step), cmd(DebugCommand::Exit)],
    );
    assert!(matches!(outcome.unwrap(), RunOutcome::Halted));
    assert!(!events.contains(&Event::Debug(DebugMarker::Continue)));
}

const VAR_SCRIPT: &str = "sub main()
  x = 1
  items = [1, 2, 3]
  stop
  print x
end sub";

#[test]
fn live_assignment_is_visible_to_var() {
    let (outcome, events) = run_script(
        VAR_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![
            Command::parse("x = 5").unwrap(),
            cmd(DebugCommand::Var),
            cmd(DebugCommand::Cont),
        ],
    );
    assert!(matches!(outcome.unwrap(), RunOutcome::Completed(_)));

    let text = printed(&events);
    assert!(text.contains(&format!("{:<16} Integer val:5\r\n", "x")));
    // コレクションは要素数のみ
    assert!(text.contains(&format!("{:<16} roArray count:3\r\n", "items")));
    // 再開後の print x は更新後の値を出力する
    assert!(events.ends_with(&[
        Event::Debug(DebugMarker::Continue),
        Event::print("5\r\n"),
    ]));
}

#[test]
fn control_flow_live_eval_is_rejected() {
    let (_, events) = run_script(
        VAR_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![
            Command::parse("if true then x = 9").unwrap(),
            cmd(DebugCommand::Var),
        ],
    );
    assert!(events.contains(&Event::print("Debug command/expression not supported!\r\n")));
    assert!(printed(&events).contains(&format!("{:<16} Integer val:1\r\n", "x")));
}

#[test]
fn out_of_bounds_live_eval_keeps_session_paused() {
    let (outcome, events) = run_script(
        VAR_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![
            Command::parse("print items[10]").unwrap(),
            cmd(DebugCommand::Next),
            cmd(DebugCommand::Exit),
        ],
    );
    assert!(matches!(outcome.unwrap(), RunOutcome::Halted));
    assert!(!events.iter().any(|e| matches!(e, Event::Error(_))));
    assert!(events.contains(&Event::print("004:   stop\r\n")));
}

#[test]
fn syntax_error_live_eval_reports_compile_error() {
    let (_, events) = run_script(
        VAR_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![Command::expr("= = =")],
    );
    assert!(events.contains(&Event::error(
        "Syntax Error. (compile error &h02) in $LIVECOMPILE"
    )));
}

const NESTED_SCRIPT: &str = "sub main()
  a = 1
  outer(a)
end sub

sub outer(n as integer)
  b = n + 1
  inner()
end sub

sub inner()
  stop
end sub";

#[test]
fn backtrace_pairs_frames_with_inner_call_sites() {
    let (_, events) = run_script(
        NESTED_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![cmd(DebugCommand::Bt)],
    );

    let expected = "#2  Function inner() As Void\r\n   file/line: pkg:/main.brs(12)\r\n\
#1  Function outer(n As Integer) As Void\r\n   file/line: pkg:/main.brs(8)\r\n\
#0  Function main() As Void\r\n   file/line: pkg:/main.brs(3)\r\n";
    // バナー内と BT コマンドの2回
    let count = events
        .iter()
        .filter(|e| **e == Event::print(expected))
        .count();
    assert_eq!(count, 2);
}

#[test]
fn list_flags_stop_line_in_innermost_function() {
    let (_, events) = run_script(
        NESTED_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![cmd(DebugCommand::List)],
    );
    let text = printed(&events);
    assert!(text.contains("011:  sub inner()\r\n012:*   stop\r\n013:  end sub\r\n"));
}

#[test]
fn break_request_pauses_running_script() {
    let channel = Arc::new(CommandChannel::new());
    channel.send(DebugCommand::Break, None);
    let (outcome, events) = run_script(STEP_SCRIPT, Arc::clone(&channel), vec![cmd(DebugCommand::Exit)]);

    assert!(matches!(outcome.unwrap(), RunOutcome::Halted));
    assert_eq!(events[0], Event::Debug(DebugMarker::Stop));
    assert!(printed(&events).contains("STOP (runtime error &hf7) in pkg:/main.brs(1)\r\n"));
}

#[test]
fn unknown_code_and_extra_parameter_warn() {
    let channel = Arc::new(CommandChannel::new());
    let (tx, rx) = mpsc::channel();
    let engine = {
        let channel = Arc::clone(&channel);
        spawn_engine(move || {
            let mut interpreter = Interpreter::new(tx)?;
            interpreter.set_stop_handler(DebugSession::new(channel, DebuggerConfig::default()));
            interpreter.run_source("main.brs", STEP_SCRIPT)
        })
    };

    let mut sent = 0;
    let mut events = Vec::new();
    while let Ok(event) = rx.recv() {
        let prompt = matches!(event, Event::Prompt(_));
        events.push(event);
        if prompt {
            match sent {
                0 => channel.send_code(99, false),
                1 => channel.send(DebugCommand::Cont, Some("now")),
                _ => channel.send(DebugCommand::Cont, None),
            }
            sent += 1;
        }
    }

    assert!(matches!(engine.join().unwrap().unwrap(), RunOutcome::Completed(_)));
    assert!(events.contains(&Event::warning("Invalid Debug command/expression!\r\n")));
    assert!(events.contains(&Event::warning("Unexpected parameter")));
    assert_eq!(sent, 3);
}

/// 停止時に、短く切り詰めたソースで LIST を実行するハンドラ
struct TruncatedList {
    output: mpsc::Sender<Vec<Event>>,
}

impl StopHandler for TruncatedList {
    fn on_stop(&mut self, interpreter: &mut Interpreter, current: &Location, last: &Location) -> bool {
        let mut sources = SourceWindow::new();
        // inner の本体（11〜13行目）のうち12行目までしかない
        let text: Vec<&str> = NESTED_SCRIPT.lines().take(12).collect();
        sources.load("main.brs", &text.join("\n"));
        let events = CommandDispatcher::new(interpreter, &sources, current, last).list();
        let _ = self.output.send(events);
        true
    }
}

#[test]
fn list_clips_to_cached_source_length() {
    let (tx, rx) = mpsc::channel();
    let (sink, _events) = mpsc::channel();
    let mut interpreter = Interpreter::new(sink).unwrap();
    interpreter.set_stop_handler(TruncatedList { output: tx });
    interpreter.run_source("main.brs", NESTED_SCRIPT).unwrap();

    let listed = rx.recv().unwrap();
    assert_eq!(
        listed,
        vec![
            Event::print("011:  sub inner()\r\n"),
            Event::print("012:*   stop\r\n"),
        ]
    );
}

const RECURSIVE_SCRIPT: &str = "sub main()
  stop
  print \"done\"
end sub

function depth(n as integer) as integer
  if n = 0 then return 0
  return depth(n - 1) + 1
end function";

#[test]
fn live_eval_that_would_exhaust_resources_keeps_session_alive() {
    let nested = format!("print {}1{}", "(".repeat(500), ")".repeat(500));
    let (outcome, events) = run_script(
        RECURSIVE_SCRIPT,
        Arc::new(CommandChannel::new()),
        vec![
            Command::parse("print depth(200)").unwrap(),
            Command::parse("print depth(100000)").unwrap(),
            Command::parse("items = [1]").unwrap(),
            Command::parse("items[2147483647] = 1").unwrap(),
            Command::expr(&nested),
            cmd(DebugCommand::Cont),
        ],
    );

    assert_eq!(outcome.unwrap(), RunOutcome::Completed("invalid".to_string()));
    assert!(events.contains(&Event::print("200\r\n")));
    assert!(events.contains(&Event::error(
        "Syntax Error. (compile error &h02) in $LIVECOMPILE"
    )));
    assert!(events.ends_with(&[
        Event::Debug(DebugMarker::Continue),
        Event::print("done\r\n"),
    ]));
}
