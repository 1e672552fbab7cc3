use crate::error::{ShellError, ShellResult};

/// Whitespace-separated words plus the chain operators, each its own token
/// (§4.9). Quoting and escapes are resolved here; the chain parser never
/// sees a raw quote character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Pipe,
    And,
    Or,
    Redirect,
    AppendRedirect,
}

/// Lexes one command line. Single quotes suppress all escaping; double
/// quotes and bare words honor a trailing backslash as an escape for the
/// next character. An unterminated quote or escape is a `ParseError`.
pub fn tokenize(line: &str) -> ShellResult<Vec<Token>> {
    let bytes = line.as_bytes();
    let mut pos = 0;
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        match c {
            ' ' | '\t' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
                pos += 1;
            }
            '\'' => {
                in_word = true;
                pos += 1;
                let start = pos;
                while pos < bytes.len() && bytes[pos] as char != '\'' {
                    pos += 1;
                }
                if pos >= bytes.len() {
                    return Err(ShellError::ParseError("unterminated single quote".into()));
                }
                current.push_str(&line[start..pos]);
                pos += 1;
            }
            '"' => {
                in_word = true;
                pos += 1;
                loop {
                    if pos >= bytes.len() {
                        return Err(ShellError::ParseError("unterminated double quote".into()));
                    }
                    match bytes[pos] as char {
                        '"' => {
                            pos += 1;
                            break;
                        }
                        '\\' => {
                            pos += 1;
                            if pos >= bytes.len() {
                                return Err(ShellError::ParseError("trailing backslash in quoted string".into()));
                            }
                            current.push(bytes[pos] as char);
                            pos += 1;
                        }
                        ch => {
                            current.push(ch);
                            pos += 1;
                        }
                    }
                }
            }
            '\\' => {
                in_word = true;
                pos += 1;
                if pos >= bytes.len() {
                    return Err(ShellError::ParseError("trailing backslash".into()));
                }
                current.push(bytes[pos] as char);
                pos += 1;
            }
            '|' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
                if pos + 1 < bytes.len() && bytes[pos + 1] as char == '|' {
                    tokens.push(Token::Or);
                    pos += 2;
                } else {
                    tokens.push(Token::Pipe);
                    pos += 1;
                }
            }
            '&' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
                if pos + 1 < bytes.len() && bytes[pos + 1] as char == '&' {
                    tokens.push(Token::And);
                    pos += 2;
                } else {
                    return Err(ShellError::ParseError("unexpected '&'".into()));
                }
            }
            '>' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut current)));
                    in_word = false;
                }
                if pos + 1 < bytes.len() && bytes[pos + 1] as char == '>' {
                    tokens.push(Token::AppendRedirect);
                    pos += 2;
                } else {
                    tokens.push(Token::Redirect);
                    pos += 1;
                }
            }
            other => {
                in_word = true;
                current.push(other);
                pos += 1;
            }
        }
    }
    if in_word {
        tokens.push(Token::Word(current));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_operators() {
        let tokens = tokenize("ls -l | grep foo >> out.txt").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("ls".into()),
                Token::Word("-l".into()),
                Token::Pipe,
                Token::Word("grep".into()),
                Token::Word("foo".into()),
                Token::AppendRedirect,
                Token::Word("out.txt".into()),
            ]
        );
    }

    #[test]
    fn honors_quotes_and_escapes() {
        let tokens = tokenize(r#"echo "a b" 'c && d' e\ f"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".into()),
                Token::Word("a b".into()),
                Token::Word("c && d".into()),
                Token::Word("e f".into()),
            ]
        );
    }

    #[test]
    fn unterminated_quote_is_parse_error() {
        assert!(tokenize("echo 'unterminated").is_err());
    }

    #[test]
    fn recognizes_logical_operators() {
        let tokens = tokenize("make a && make b || make c").unwrap();
        assert!(tokens.contains(&Token::And));
        assert!(tokens.contains(&Token::Or));
    }
}
