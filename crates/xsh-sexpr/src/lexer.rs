use crate::error::SexprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Int(i64),
    Bool(bool),
    Str(String),
    Sym(String),
}

/// Recognizes balanced parens, symbols, signed integers, `#t`/`#f`, and
/// double-quoted strings with `\\ \" \n \t \r` escapes (§4.4).
pub fn lex(src: &str) -> Result<Vec<Token>, SexprError> {
    let bytes = src.as_bytes();
    let mut pos = 0;
    let mut tokens = Vec::new();

    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b'"' => {
                let start = pos;
                pos += 1;
                let mut s = String::new();
                loop {
                    if pos >= bytes.len() {
                        return Err(SexprError::ParseError { offset: start, message: "unterminated string".into() });
                    }
                    match bytes[pos] {
                        b'"' => {
                            pos += 1;
                            break;
                        }
                        b'\\' => {
                            pos += 1;
                            if pos >= bytes.len() {
                                return Err(SexprError::ParseError { offset: start, message: "unterminated escape".into() });
                            }
                            let esc = match bytes[pos] {
                                b'\\' => '\\',
                                b'"' => '"',
                                b'n' => '\n',
                                b't' => '\t',
                                b'r' => '\r',
                                other => {
                                    return Err(SexprError::ParseError { offset: pos, message: format!("unknown escape \\{}", other as char) })
                                }
                            };
                            s.push(esc);
                            pos += 1;
                        }
                        other => {
                            s.push(other as char);
                            pos += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            _ => {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b' ' | b'\t' | b'\n' | b'\r' | b'(' | b')') {
                    pos += 1;
                }
                let word = std::str::from_utf8(&bytes[start..pos]).unwrap();
                tokens.push(match word {
                    "#t" => Token::Bool(true),
                    "#f" => Token::Bool(false),
                    _ => match word.parse::<i64>() {
                        Ok(n) => Token::Int(n),
                        Err(_) => Token::Sym(word.to_owned()),
                    },
                });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_atoms_and_strings() {
        let tokens = lex(r#"(if #t "a\nb" 42)"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Sym("if".into()),
                Token::Bool(true),
                Token::Str("a\nb".into()),
                Token::Int(42),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_parse_error() {
        assert!(lex("\"abc").is_err());
    }
}
