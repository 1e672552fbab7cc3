use xsh_vfs::{NodeId, NodeKind, SAstKind, Vfs};

use crate::error::{SexprError, SexprResult};
use crate::lexer::{lex, Token};

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

enum Raw {
    Atom(SAstKind),
    List(Vec<Raw>),
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_expr(&mut self) -> SexprResult<Raw> {
        match self.peek() {
            None => Err(SexprError::ParseError { offset: self.pos, message: "unexpected end of input".into() }),
            Some(Token::LParen) => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        Some(Token::RParen) => {
                            self.pos += 1;
                            break;
                        }
                        None => return Err(SexprError::ParseError { offset: self.pos, message: "unterminated list".into() }),
                        Some(_) => items.push(self.parse_expr()?),
                    }
                }
                Ok(Raw::List(items))
            }
            Some(Token::RParen) => Err(SexprError::ParseError { offset: self.pos, message: "unexpected )".into() }),
            Some(Token::Int(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Raw::Atom(SAstKind::Int(n)))
            }
            Some(Token::Bool(b)) => {
                let b = *b;
                self.pos += 1;
                Ok(Raw::Atom(SAstKind::Bool(b)))
            }
            Some(Token::Str(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(Raw::Atom(SAstKind::Str(s)))
            }
            Some(Token::Sym(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(Raw::Atom(SAstKind::Sym(s)))
            }
        }
    }
}

fn symbol_head(items: &[Raw]) -> Option<&str> {
    match items.first() {
        Some(Raw::Atom(SAstKind::Sym(s))) => Some(s.as_str()),
        _ => None,
    }
}

/// Attaches `raw` under `dir/name` in `ovl`, returning the new node's id.
fn materialize(vfs: &mut Vfs, dir: &str, name: &str, raw: Raw, ovl: u32) -> SexprResult<NodeId> {
    match raw {
        Raw::Atom(kind) => Ok(vfs.add_node(dir, name, NodeKind::SAst(kind), ovl)?),
        Raw::List(items) => materialize_list(vfs, dir, name, items, ovl),
    }
}

fn materialize_list(vfs: &mut Vfs, dir: &str, name: &str, items: Vec<Raw>, ovl: u32) -> SexprResult<NodeId> {
    match symbol_head(&items) {
        Some("if") if items.len() == 4 => {
            let mut it = items.into_iter();
            it.next();
            let node_id = vfs.add_node(dir, name, NodeKind::SAst(SAstKind::If), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            materialize(vfs, &node_path, "cond", it.next().unwrap(), ovl)?;
            materialize(vfs, &node_path, "then", it.next().unwrap(), ovl)?;
            materialize(vfs, &node_path, "else", it.next().unwrap(), ovl)?;
            Ok(node_id)
        }
        Some("lambda") if items.len() == 3 => {
            let mut it = items.into_iter();
            it.next();
            let Raw::List(param_items) = it.next().unwrap() else {
                return Err(SexprError::ParseError { offset: 0, message: "lambda params must be a list".into() });
            };
            let mut params = Vec::new();
            for p in param_items {
                let Raw::Atom(SAstKind::Sym(s)) = p else {
                    return Err(SexprError::ParseError { offset: 0, message: "lambda parameter must be a symbol".into() });
                };
                params.push(s);
            }
            let node_id = vfs.add_node(dir, name, NodeKind::SAst(SAstKind::Lambda { params }), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            materialize(vfs, &node_path, "body", it.next().unwrap(), ovl)?;
            Ok(node_id)
        }
        _ => {
            let node_id = vfs.add_node(dir, name, NodeKind::SAst(SAstKind::Call), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            let mut it = items.into_iter();
            let Some(head) = it.next() else {
                return Err(SexprError::ParseError { offset: 0, message: "empty call".into() });
            };
            materialize(vfs, &node_path, "fn", head, ovl)?;
            for (i, arg) in it.enumerate() {
                materialize(vfs, &node_path, &format!("arg{i}"), arg, ovl)?;
            }
            Ok(node_id)
        }
    }
}

/// `parse <src> <dst>` (§6.1): lexes and parses `src`, materializing the
/// resulting AST as VFS nodes rooted at `dst`.
pub fn parse_to_vfs(vfs: &mut Vfs, src: &str, dst: &str, ovl: u32) -> SexprResult<NodeId> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let raw = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        return Err(SexprError::ParseError { offset: parser.pos, message: "trailing input after expression".into() });
    }
    let (dir, name) = xsh_vfs::path::parent_and_name(dst)?;
    materialize(vfs, &dir, name, raw, ovl)
}

/// Attaches a `Holder` node referencing `target` without re-materializing
/// it (§3.1).
pub fn make_holder(vfs: &mut Vfs, dir: &str, name: &str, target: Option<NodeId>, ovl: u32) -> SexprResult<NodeId> {
    Ok(vfs.add_node(dir, name, NodeKind::SAst(SAstKind::Holder { target }), ovl)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_if_into_named_children() {
        let mut vfs = Vfs::new();
        parse_to_vfs(&mut vfs, "(if #t 1 2)", "/ast/root", 0).unwrap();
        let cond = vfs.resolve_for_overlay("/ast/root/cond", 0).unwrap();
        let node = vfs.node(0, cond).unwrap();
        assert!(matches!(node.kind, NodeKind::SAst(SAstKind::Bool(true))));
    }

    #[test]
    fn parses_call_with_numbered_args() {
        let mut vfs = Vfs::new();
        parse_to_vfs(&mut vfs, "(+ 1 2 3)", "/ast/root", 0).unwrap();
        let arg1 = vfs.resolve_for_overlay("/ast/root/arg1", 0).unwrap();
        let node = vfs.node(0, arg1).unwrap();
        assert!(matches!(node.kind, NodeKind::SAst(SAstKind::Int(2))));
    }
}
