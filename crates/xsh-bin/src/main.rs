use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use xsh_shell::{execute_line, Session};
use xsh_vfs::mounts::host::mount_host;

/// Interactive development shell over the layered VFS (§4.9, §6.1).
#[derive(Parser)]
#[clap(name = "xsh", version = "0.1.0")]
struct Opts {
    /// Enable debug level logging regardless of XSH_LOG
    #[clap(long)]
    debug: bool,

    /// Run a script of shell commands non-interactively instead of reading stdin
    #[clap(long = "script")]
    script: Option<PathBuf>,

    /// Skip auto-mounting the directories named in UPP
    #[clap(long)]
    no_auto_mount: bool,
}

fn main() {
    let opts = Opts::parse();
    let _log_guard = xsh_core::tracing_support::init_logging(opts.debug);

    let mut session = Session::new();
    load_history(&mut session);
    if !opts.no_auto_mount {
        auto_mount(&mut session);
    }

    match &opts.script {
        Some(path) => run_script(&mut session, path),
        None => run_interactive(&mut session),
    }

    save_history(&session);
}

fn run_interactive(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("xsh> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                tracing::error!(error = xsh_core::tracing_support::error_value(&err), "failed to read stdin");
                break;
            }
        };
        if bytes_read == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);

        let result = execute_line(session, line);
        if !result.output.is_empty() {
            print!("{}", result.output);
            let _ = stdout.flush();
        }
        session.on_line_executed(line, Instant::now());
        if result.exit_requested {
            return;
        }
    }
}

fn run_script(session: &mut Session, path: &std::path::Path) {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read script {}: {}", path.display(), err);
            return;
        }
    };
    for line in text.lines() {
        let result = execute_line(session, line);
        if !result.output.is_empty() {
            print!("{}", result.output);
        }
        session.on_line_executed(line, Instant::now());
        if result.exit_requested {
            return;
        }
        if !result.success {
            eprintln!("{line}: command failed");
        }
    }
}

/// Loads `~/.xsh_history` (or `$XSH_HISTORY_FILE`) into the session's
/// in-memory history so `history` reflects prior sessions too (§6.3).
fn load_history(session: &mut Session) {
    let path = xsh_core::env::history_path();
    let Ok(file) = std::fs::File::open(&path) else {
        return;
    };
    for line in io::BufReader::new(file).lines().map_while(Result::ok) {
        session.history.push(line);
    }
}

fn save_history(session: &Session) {
    let path = xsh_core::env::history_path();
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            tracing::warn!(error = xsh_core::tracing_support::error_value(&err), "failed to create history directory");
            return;
        }
    }
    match std::fs::File::create(&path) {
        Ok(mut file) => {
            for line in &session.history {
                let _ = writeln!(file, "{line}");
            }
        }
        Err(err) => {
            tracing::warn!(error = xsh_core::tracing_support::error_value(&err), "failed to write history file");
        }
    }
}

/// Mounts every directory named in `UPP` under `/mnt/<basename>` (§6.2).
fn auto_mount(session: &mut Session) {
    for dir in xsh_core::env::auto_mount_dirs() {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let vfs_path = format!("/mnt/{name}");
        let ovl = session.current_overlay;
        if let Err(err) = mount_host(&mut session.vfs, &dir, &vfs_path, ovl) {
            tracing::warn!(path = %dir.display(), error = xsh_core::tracing_support::error_value(&err), "failed to auto-mount directory from UPP");
        }
    }
}
