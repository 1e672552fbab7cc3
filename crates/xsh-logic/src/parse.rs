use thiserror::Error;
use xsh_tags::TagRegistry;

use crate::{Formula, ImplicationRule};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogicParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected character {0:?} at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("unknown operator {0:?}")]
    UnknownOperator(String),
    #[error("missing required field {0:?} in rule text")]
    MissingField(&'static str),
    #[error("invalid confidence value {0:?}")]
    InvalidConfidence(String),
}

/// Parses the small formula grammar used in persisted rule text:
/// a bare tag name is `Var`, otherwise `op(arg, arg, ...)` for
/// `not`/`and`/`or`/`implies`.
pub fn parse_formula(src: &str, registry: &mut TagRegistry) -> Result<Formula, LogicParseError> {
    let mut parser = FormulaParser { bytes: src.as_bytes(), pos: 0 };
    let formula = parser.parse_expr(registry)?;
    parser.skip_ws();
    Ok(formula)
}

struct FormulaParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse_ident(&mut self) -> Result<&'a str, LogicParseError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => LogicParseError::UnexpectedChar(c as char, self.pos),
                None => LogicParseError::UnexpectedEof,
            });
        }
        Ok(std::str::from_utf8(&self.bytes[start..self.pos]).unwrap())
    }

    fn expect(&mut self, ch: u8) -> Result<(), LogicParseError> {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(match self.peek() {
                Some(c) => LogicParseError::UnexpectedChar(c as char, self.pos),
                None => LogicParseError::UnexpectedEof,
            })
        }
    }

    fn parse_arg_list(&mut self, registry: &mut TagRegistry) -> Result<Vec<Formula>, LogicParseError> {
        let mut args = vec![self.parse_expr(registry)?];
        loop {
            self.skip_ws();
            if self.peek() == Some(b',') {
                self.pos += 1;
                args.push(self.parse_expr(registry)?);
            } else {
                break;
            }
        }
        Ok(args)
    }

    fn parse_expr(&mut self, registry: &mut TagRegistry) -> Result<Formula, LogicParseError> {
        let ident = self.parse_ident()?;
        self.skip_ws();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let op = ident;
            let formula = match op {
                "not" => {
                    let mut args = self.parse_arg_list(registry)?;
                    if args.len() != 1 {
                        return Err(LogicParseError::UnknownOperator("not/arity".into()));
                    }
                    Formula::not(args.remove(0))
                }
                "and" => Formula::And(self.parse_arg_list(registry)?),
                "or" => Formula::Or(self.parse_arg_list(registry)?),
                "implies" => {
                    let mut args = self.parse_arg_list(registry)?;
                    if args.len() != 2 {
                        return Err(LogicParseError::UnknownOperator("implies/arity".into()));
                    }
                    let rhs = args.remove(1);
                    let lhs = args.remove(0);
                    Formula::implies(lhs, rhs)
                }
                other => return Err(LogicParseError::UnknownOperator(other.to_owned())),
            };
            self.expect(b')')?;
            Ok(formula)
        } else {
            Ok(Formula::var(registry.register(ident)))
        }
    }
}

/// Renders a rule as the text payload stored at `/plan/rules/<name>`.
pub fn serialize_rule(rule: &ImplicationRule, registry: &TagRegistry) -> String {
    format!(
        "name: {}\nconfidence: {}\nsource: {}\npremise: {}\nconclusion: {}\n",
        rule.name,
        rule.confidence,
        rule.source,
        rule.premise.display(registry),
        rule.conclusion.display(registry),
    )
}

/// Inverse of [`serialize_rule`]; round-trips through the same pure parser.
pub fn deserialize_rule(text: &str, registry: &mut TagRegistry) -> Result<ImplicationRule, LogicParseError> {
    let mut name = None;
    let mut confidence = None;
    let mut source = None;
    let mut premise = None;
    let mut conclusion = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else { continue };
        let value = value.trim();
        match key.trim() {
            "name" => name = Some(value.to_owned()),
            "confidence" => {
                confidence = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| LogicParseError::InvalidConfidence(value.to_owned()))?,
                )
            }
            "source" => source = Some(value.to_owned()),
            "premise" => premise = Some(parse_formula(value, registry)?),
            "conclusion" => conclusion = Some(parse_formula(value, registry)?),
            _ => {}
        }
    }

    Ok(ImplicationRule::new(
        name.ok_or(LogicParseError::MissingField("name"))?,
        premise.ok_or(LogicParseError::MissingField("premise"))?,
        conclusion.ok_or(LogicParseError::MissingField("conclusion"))?,
        confidence.ok_or(LogicParseError::MissingField("confidence"))?,
        source.ok_or(LogicParseError::MissingField("source"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_round_trips_through_text() {
        let mut registry = TagRegistry::new();
        let rule = ImplicationRule::new(
            "r1",
            Formula::var(registry.register("doc")),
            Formula::var(registry.register("text")),
            0.9,
            "user",
        );
        let text = serialize_rule(&rule, &registry);
        let parsed = deserialize_rule(&text, &mut registry).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn parses_nested_formula() {
        let mut registry = TagRegistry::new();
        let f = parse_formula("and(doc, not(draft))", &mut registry).unwrap();
        match f {
            Formula::And(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected And"),
        }
    }
}
