//! mdb CLI - コマンドラインインターフェース
//!
//! スクリプトをエンジンスレッドで実行し、マイクロデバッガのコントローラとして
//! 動作する REPL を提供します。

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mdb_core::channel::DEFAULT_PAYLOAD_CAPACITY;
use mdb_core::{Command, CommandChannel, DebugCommand, DebugSession, DebuggerConfig};
use mdb_runtime::{DebugMarker, Event, Interpreter, RunOutcome, ENGINE_STACK_SIZE};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// mdb - Micro debugger for BrightScript
#[derive(Parser)]
#[command(name = "mdb")]
#[command(version = "0.1.0")]
#[command(about = "Run a BrightScript file with the micro debugger attached", long_about = None)]
struct Cli {
    /// Path to the script file
    script: PathBuf,

    /// Pause before the first statement
    #[arg(long)]
    break_on_start: bool,

    /// Title shown in the source digest line
    #[arg(long, default_value = "mdb")]
    title: String,

    /// Channel version shown in the source digest line
    #[arg(long, default_value = "1.0.0")]
    channel_version: String,

    /// Capacity of the live-eval payload region, in characters
    #[arg(long, default_value_t = DEFAULT_PAYLOAD_CAPACITY)]
    payload_capacity: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = DebuggerConfig {
        title: cli.title.clone(),
        channel_version: cli.channel_version.clone(),
        payload_capacity: cli.payload_capacity,
        ..DebuggerConfig::default()
    };
    config.validate()?;

    let text = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("Failed to read {}", cli.script.display()))?;
    let file = script_name(&cli.script)?;

    let channel = Arc::new(CommandChannel::with_payload_capacity(config.payload_capacity));
    if cli.break_on_start {
        // 最初の文の手前でエンジンが受け取る
        channel.send(DebugCommand::Break, None);
    }

    let (tx, rx) = mpsc::channel();
    let engine = spawn_engine(file, text, Arc::clone(&channel), config, tx)?;

    run_repl(&channel, &rx)?;

    let outcome = engine
        .join()
        .map_err(|_| anyhow!("Engine thread panicked"))??;
    match outcome {
        RunOutcome::Completed(value) => info!("Script completed: {}", value),
        RunOutcome::Halted => println!("Script halted by debugger"),
    }

    Ok(())
}

/// スクリプトの表示名（`pkg:/` に続く部分）
fn script_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Invalid script path: {}", path.display()))
}

/// エンジンスレッドを起動する
///
/// インタプリタはスレッドをまたげないため、スレッド内で生成します。
fn spawn_engine(
    file: String,
    text: String,
    channel: Arc<CommandChannel>,
    config: DebuggerConfig,
    events: Sender<Event>,
) -> Result<JoinHandle<Result<RunOutcome>>> {
    let handle = thread::Builder::new()
        .name("engine".into())
        .stack_size(ENGINE_STACK_SIZE)
        .spawn(move || {
            let mut interpreter = Interpreter::new(events)?;
            interpreter.set_stop_handler(DebugSession::new(channel, config));
            debug!("Running {}", file);
            interpreter.run_source(&file, &text)
        })
        .context("Failed to spawn engine thread")?;
    Ok(handle)
}

/// REPLループを実行する
///
/// エンジンのイベントを表示し、プロンプトを受け取ったときだけ入力を読みます。
/// エンジンが終了してイベントストリームが閉じるとループを抜けます。
fn run_repl(channel: &CommandChannel, events: &Receiver<Event>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = home::home_dir().map(|dir| dir.join(".mdb_history"));
    if let Some(path) = &history {
        if rl.load_history(path).is_err() {
            debug!("No history at {}", path.display());
        }
    }

    while let Ok(event) = events.recv() {
        match event {
            Event::Prompt(prompt) => {
                let command = read_command(&mut rl, &prompt)?;
                debug!("Sending {:?}", command.kind);
                channel.send(command.kind, command.payload.as_deref());
            }
            other => render(&other)?,
        }
    }

    if let Some(path) = &history {
        if let Err(e) = rl.save_history(path) {
            debug!("Failed to save history: {}", e);
        }
    }
    Ok(())
}

/// 空でない入力が得られるまで読み込む
///
/// Ctrl-C / Ctrl-D は EXIT として扱います。
fn read_command(rl: &mut DefaultEditor, prompt: &str) -> Result<Command> {
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                rl.add_history_entry(line.trim())?;
                return Ok(command);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return Ok(Command {
                    kind: DebugCommand::Exit,
                    payload: None,
                });
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// イベントを端末に表示する
fn render(event: &Event) -> Result<()> {
    let mut stdout = std::io::stdout();
    match event {
        Event::Print(text) => write!(stdout, "{}", text.replace("\r\n", "\n"))?,
        Event::Warning(text) => eprintln!("{}", text.trim_end()),
        Event::Error(text) => eprintln!("{}", text.trim_end()),
        Event::Debug(DebugMarker::Stop) => debug!("Debugger stopped"),
        Event::Debug(DebugMarker::Continue) => debug!("Debugger continued"),
        Event::Prompt(prompt) => write!(stdout, "{}", prompt)?,
    }
    stdout.flush()?;
    Ok(())
}
