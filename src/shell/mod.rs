pub mod command;
pub mod parse;

use crate::{
    cli::Cli,
    disk::{init::perform_disk_initialization, SectorDevice},
    fs::FileSystem,
    shell::{
        command::{execute_command, Command, Session},
        parse::{parse_command, COMMANDS},
    },
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{error::Error, io::stdout, path::PathBuf, sync::mpsc, thread};

/// 交互界面操作的卷，底层可以是镜像文件或内存盘
pub type Volume = FileSystem<Box<dyn SectorDevice>>;

/// 启动线程向界面汇报的进度
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<Volume, Box<dyn Error + Send>>),
}

pub fn start_shell(cli: Cli) {
    let params = cli.format_params();
    let quiet = cli.quiet;

    let fs = match boot(cli, quiet) {
        Ok(fs) => fs,
        Err(e) => {
            println!("{} {}", "❌ Boot failed:".red().bold(), e);
            return;
        }
    };

    let mut session = Session::new(fs, params);
    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_default();

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".t2fs_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => warn!("[shell] history disabled: {}", e),
    }

    // 命令补全
    let words = COMMANDS.iter().map(|c| c.to_string()).collect();
    let completer = DefaultCompleter::new_with_wordlen(words, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("{}@{}", username, hostname)),
        DefaultPromptSegment::Basic("T2FS".to_string()),
    );

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut session) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command or bad arguments. Type 'help' for command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting T2FS...".yellow());
                break;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
}

/// 在后台线程打开并挂载磁盘，前台显示进度
fn boot(cli: Cli, quiet: bool) -> Result<Volume, Box<dyn Error + Send>> {
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || perform_disk_initialization(cli, tx));

    if !quiet {
        let mut stdout = stdout();
        let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
        println!("{}", "[T2FS Booting...]".bright_yellow().bold());
    }

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut result = None;
    for msg in rx {
        match msg {
            BootProgress::Step(step) => pb.set_message(step),
            BootProgress::Progress(p) => pb.set_position(p),
            BootProgress::Finished(r) => {
                result = Some(r);
                break;
            }
        }
    }
    let _ = worker.join();

    let result = match result {
        Some(r) => r,
        None => {
            let e: Box<dyn Error + Send> = Box::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "boot thread exited without a result",
            ));
            Err(e)
        }
    };

    match &result {
        Ok(_) => pb.finish_with_message("✅ Ready!"),
        Err(_) => pb.abandon_with_message("❌ Boot aborted"),
    }

    if !quiet && result.is_ok() {
        let mut stdout = stdout();
        let _ = execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print(format!("Welcome to T2FS v{}\n", env!("CARGO_PKG_VERSION"))),
            ResetColor
        );
    }
    result
}
