use crate::error::{ShellError, ShellResult};
use crate::tokenizer::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub append: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Invocation>,
    pub redirect: Option<Redirect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub logical: Option<Logical>,
    pub pipeline: Pipeline,
}

fn flush_command(words: &mut Vec<String>, commands: &mut Vec<Invocation>) -> ShellResult<()> {
    if words.is_empty() {
        return Err(ShellError::ParseError("missing command".into()));
    }
    let mut drained = words.drain(..);
    let name = drained.next().unwrap();
    let args = drained.collect();
    commands.push(Invocation { name, args });
    Ok(())
}

/// Splits a token stream into chain entries (§4.9): `|` ends one command
/// within a pipeline, `&&`/`||` end a pipeline and set the next entry's
/// logical operator, `>`/`>>` capture a redirect target for the pipeline's
/// final stdout.
pub fn parse_chain(tokens: Vec<Token>) -> ShellResult<Vec<ChainEntry>> {
    let mut entries = Vec::new();
    let mut commands = Vec::new();
    let mut words = Vec::new();
    let mut pending_logical = None;
    let mut redirect = None;

    let mut iter = tokens.into_iter();
    while let Some(tok) = iter.next() {
        match tok {
            Token::Word(w) => words.push(w),
            Token::Pipe => flush_command(&mut words, &mut commands)?,
            Token::And | Token::Or => {
                flush_command(&mut words, &mut commands)?;
                entries.push(ChainEntry {
                    logical: pending_logical.take(),
                    pipeline: Pipeline { commands: std::mem::take(&mut commands), redirect: redirect.take() },
                });
                pending_logical = Some(if tok == Token::And { Logical::And } else { Logical::Or });
            }
            Token::Redirect | Token::AppendRedirect => {
                flush_command(&mut words, &mut commands)?;
                let append = tok == Token::AppendRedirect;
                let path = match iter.next() {
                    Some(Token::Word(p)) => p,
                    _ => return Err(ShellError::ParseError("missing redirect target".into())),
                };
                redirect = Some(Redirect { path, append });
            }
        }
    }

    if pending_logical.is_some() && words.is_empty() && commands.is_empty() {
        return Err(ShellError::ParseError("trailing logical operator".into()));
    }
    if words.is_empty() && commands.is_empty() {
        return Ok(entries);
    }
    if !words.is_empty() {
        flush_command(&mut words, &mut commands)?;
    }
    entries.push(ChainEntry { logical: pending_logical.take(), pipeline: Pipeline { commands, redirect } });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(line: &str) -> ShellResult<Vec<ChainEntry>> {
        parse_chain(tokenize(line)?)
    }

    #[test]
    fn single_command() {
        let entries = parse("ls -l /tmp").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pipeline.commands, vec![Invocation { name: "ls".into(), args: vec!["-l".into(), "/tmp".into()] }]);
        assert!(entries[0].logical.is_none());
    }

    #[test]
    fn pipeline_and_redirect() {
        let entries = parse("cat a.txt | grep foo > out.txt").unwrap();
        assert_eq!(entries.len(), 1);
        let pipeline = &entries[0].pipeline;
        assert_eq!(pipeline.commands.len(), 2);
        assert_eq!(pipeline.redirect, Some(Redirect { path: "out.txt".into(), append: false }));
    }

    #[test]
    fn logical_chain() {
        let entries = parse("make a && make b || echo fallback").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].logical, None);
        assert_eq!(entries[1].logical, Some(Logical::And));
        assert_eq!(entries[2].logical, Some(Logical::Or));
    }

    #[test]
    fn trailing_operator_is_error() {
        assert!(parse("make a &&").is_err());
    }

    #[test]
    fn missing_redirect_target_is_error() {
        assert!(parse("echo hi >").is_err());
    }

    #[test]
    fn empty_line_has_no_entries() {
        assert!(parse("   ").unwrap().is_empty());
    }
}
