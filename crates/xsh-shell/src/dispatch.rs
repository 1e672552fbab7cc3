use crate::chain::{ChainEntry, Invocation, Logical};
use crate::error::{ShellError, ShellResult};
use crate::session::Session;

/// Result of one command invocation (§4.9): every handler must respect this
/// signature so the chain executor can thread stdout between pipeline
/// stages uniformly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub exit_requested: bool,
    pub output: String,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        CommandResult { success: true, exit_requested: false, output: output.into() }
    }

    pub fn exit() -> Self {
        CommandResult { success: true, exit_requested: true, output: String::new() }
    }

    pub fn fail(output: impl Into<String>) -> Self {
        CommandResult { success: false, exit_requested: false, output: output.into() }
    }
}

/// Converts a fallible handler body into a `CommandResult`: the teacher's
/// `ScopedCoutCapture` substituted the real stdout stream for the
/// handler's duration; here every handler simply builds and returns its
/// own output buffer instead, which the dispatcher treats the same way.
pub fn from_result(result: ShellResult<String>) -> CommandResult {
    match result {
        Ok(output) => CommandResult::ok(output),
        Err(err) => CommandResult::fail(err.to_string()),
    }
}

pub type Handler = fn(&mut Session, &[String], &str) -> CommandResult;

/// Dispatcher contract: `execute(Invocation, stdin) -> CommandResult`
/// (§4.9).
pub fn execute(session: &mut Session, invocation: &Invocation, stdin: &str) -> CommandResult {
    match session.commands.get(invocation.name.as_str()).copied() {
        Some(handler) => handler(session, &invocation.args, stdin),
        None => CommandResult::fail(ShellError::UnknownCommand(invocation.name.clone()).to_string()),
    }
}

fn apply_redirect(session: &mut Session, path: &str, append: bool, data: &str) -> ShellResult<()> {
    let ovl = session.current_overlay;
    let mut bytes = if append { session.vfs.read(path, Some(ovl)).unwrap_or_default() } else { Vec::new() };
    bytes.extend_from_slice(data.as_bytes());
    session.vfs.write(path, bytes, ovl)?;
    Ok(())
}

/// Runs a parsed chain end to end (§4.9): short-circuits on `&&`/`||`,
/// threads stdout through a pipeline's stages as the next stage's stdin,
/// and on success applies the pipeline's redirect (clearing the
/// user-visible output).
pub fn execute_chain(session: &mut Session, entries: &[ChainEntry]) -> CommandResult {
    let mut last_success = true;
    let mut last_output = String::new();
    let mut exit_requested = false;

    for entry in entries {
        let skip = match entry.logical {
            Some(Logical::And) => !last_success,
            Some(Logical::Or) => last_success,
            None => false,
        };
        if skip {
            continue;
        }

        let mut stdin_data = String::new();
        let mut pipeline_success = true;
        let mut pipeline_output = String::new();
        for invocation in &entry.pipeline.commands {
            let result = execute(session, invocation, &stdin_data);
            pipeline_success = result.success;
            pipeline_output = result.output;
            stdin_data = pipeline_output.clone();
            exit_requested |= result.exit_requested;
            if !pipeline_success {
                break;
            }
        }

        if pipeline_success {
            if let Some(redirect) = &entry.pipeline.redirect {
                match apply_redirect(session, &redirect.path, redirect.append, &pipeline_output) {
                    Ok(()) => pipeline_output.clear(),
                    Err(err) => {
                        pipeline_success = false;
                        pipeline_output = err.to_string();
                    }
                }
            }
        }

        last_success = pipeline_success;
        last_output = pipeline_output;
        if exit_requested {
            break;
        }
    }

    CommandResult { success: last_success, exit_requested, output: last_output }
}

/// Tokenizes, chain-parses, and executes one full command line.
pub fn execute_line(session: &mut Session, line: &str) -> CommandResult {
    let tokens = match crate::tokenizer::tokenize(line) {
        Ok(t) => t,
        Err(err) => return CommandResult::fail(err.to_string()),
    };
    let entries = match crate::chain::parse_chain(tokens) {
        Ok(e) => e,
        Err(err) => return CommandResult::fail(err.to_string()),
    };
    if entries.is_empty() {
        return CommandResult::ok("");
    }
    execute_chain(session, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[test]
    fn pipe_threads_stdout_as_next_stdin() {
        let mut session = Session::new();
        session.vfs.write("/greeting.txt", b"hello world\n".to_vec(), 0).unwrap();
        let result = execute_line(&mut session, "cat /greeting.txt | grep hello");
        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("hello world"));
    }

    #[test]
    fn redirect_writes_to_vfs_and_clears_output() {
        let mut session = Session::new();
        let result = execute_line(&mut session, "echo hi > /out.txt");
        assert!(result.success, "{}", result.output);
        assert_eq!(result.output, "");
        let content = session.vfs.read("/out.txt", Some(0)).unwrap();
        assert_eq!(content, b"hi\n");
    }

    #[test]
    fn and_short_circuits_on_failure() {
        let mut session = Session::new();
        let result = execute_line(&mut session, "cat /missing && echo unreachable");
        assert!(!result.success);
        assert!(!result.output.contains("unreachable"));
    }

    #[test]
    fn or_runs_only_after_failure() {
        let mut session = Session::new();
        let result = execute_line(&mut session, "cat /missing || echo fallback");
        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("fallback"));
    }
}
