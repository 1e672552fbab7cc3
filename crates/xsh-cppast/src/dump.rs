use xsh_vfs::{CppAstKind, NodeId, NodeKind, Vfs};

use crate::error::{CppAstError, CppAstResult};
use crate::escape::escape_cpp_string;

fn child(vfs: &Vfs, ovl: u32, id: NodeId, name: &str) -> CppAstResult<NodeId> {
    vfs.node(ovl, id)?.children.get(name).copied().ok_or(CppAstError::UnexpectedKind { path: name.to_owned(), expected: "child" })
}

fn numbered_children(vfs: &Vfs, ovl: u32, id: NodeId, prefix: &str) -> CppAstResult<Vec<NodeId>> {
    let node = vfs.node(ovl, id)?;
    let mut out = Vec::new();
    let mut i = 0;
    loop {
        let Some(&next) = node.children.get(&format!("{prefix}{i}")) else { break };
        out.push(next);
        i += 1;
    }
    Ok(out)
}

fn cpp_ast_kind(vfs: &Vfs, ovl: u32, id: NodeId) -> CppAstResult<CppAstKind> {
    match &vfs.node(ovl, id)?.kind {
        NodeKind::CppAst(k) => Ok(k.clone()),
        other => Err(CppAstError::UnexpectedKind { path: other.type_tag().to_owned(), expected: "CppAst" }),
    }
}

fn dump_expr(vfs: &Vfs, ovl: u32, id: NodeId) -> CppAstResult<String> {
    match cpp_ast_kind(vfs, ovl, id)? {
        CppAstKind::Id { id } => Ok(id),
        CppAstKind::StringLit { value } => Ok(format!("\"{}\"", escape_cpp_string(&value))),
        CppAstKind::IntLit { value } => Ok(value.to_string()),
        CppAstKind::RawExpr { text } => Ok(text),
        CppAstKind::Call => {
            let func_id = child(vfs, ovl, id, "fn")?;
            let func = dump_expr(vfs, ovl, func_id)?;
            let args = numbered_children(vfs, ovl, id, "arg")?
                .into_iter()
                .map(|a| dump_expr(vfs, ovl, a))
                .collect::<CppAstResult<Vec<_>>>()?;
            Ok(format!("{func}({})", args.join(", ")))
        }
        CppAstKind::BinOp { op } => {
            let a = dump_expr(vfs, ovl, child(vfs, ovl, id, "a")?)?;
            let b = dump_expr(vfs, ovl, child(vfs, ovl, id, "b")?)?;
            Ok(format!("({a} {op} {b})"))
        }
        CppAstKind::StreamOut => {
            let parts = numbered_children(vfs, ovl, id, "part")?
                .into_iter()
                .map(|p| dump_expr(vfs, ovl, p))
                .collect::<CppAstResult<Vec<_>>>()?;
            Ok(parts.join(" << "))
        }
        other => Err(CppAstError::UnexpectedKind { path: format!("{other:?}"), expected: "expression" }),
    }
}

fn dump_stmt(vfs: &Vfs, ovl: u32, id: NodeId, indent: usize) -> CppAstResult<String> {
    let pad = "    ".repeat(indent);
    let line = match cpp_ast_kind(vfs, ovl, id)? {
        CppAstKind::ExprStmt => format!("{};", dump_expr(vfs, ovl, child(vfs, ovl, id, "expr")?)?),
        CppAstKind::Return { has_expr } => {
            if has_expr {
                format!("return {};", dump_expr(vfs, ovl, child(vfs, ovl, id, "expr")?)?)
            } else {
                "return;".to_owned()
            }
        }
        CppAstKind::VarDecl { ty, name, init, has_init } => {
            if has_init {
                format!("{ty} {name} = {};", init.unwrap_or_default())
            } else {
                format!("{ty} {name};")
            }
        }
        CppAstKind::RawStmt { text } => text,
        CppAstKind::RangeFor { decl, range } => {
            let body_id = child(vfs, ovl, id, "body")?;
            let body = dump_compound(vfs, ovl, body_id, indent)?;
            format!("for ({decl} : {range}) {{\n{body}\n{pad}}}")
        }
        other => return Err(CppAstError::UnexpectedKind { path: format!("{other:?}"), expected: "statement" }),
    };
    Ok(format!("{pad}{line}"))
}

/// Dumps a `Compound`'s statements in order, one per line.
pub fn dump_compound(vfs: &Vfs, ovl: u32, id: NodeId, indent: usize) -> CppAstResult<String> {
    let node = vfs.node(ovl, id)?;
    let mut lines = Vec::with_capacity(node.children.len());
    for &stmt_id in node.children.values() {
        lines.push(dump_stmt(vfs, ovl, stmt_id, indent + 1)?);
    }
    Ok(lines.join("\n"))
}

fn dump_function(vfs: &Vfs, ovl: u32, id: NodeId) -> CppAstResult<String> {
    let NodeKind::CppAst(CppAstKind::Function { return_type, name, params }) = &vfs.node(ovl, id)?.kind else {
        return Err(CppAstError::UnexpectedKind { path: "function".into(), expected: "Function" });
    };
    let params_text = params.iter().map(|(ty, n)| format!("{ty} {n}")).collect::<Vec<_>>().join(", ");
    let body_id = child(vfs, ovl, id, "body")?;
    let body = dump_compound(vfs, ovl, body_id, 0)?;
    Ok(format!("{return_type} {name}({params_text}) {{\n{body}\n}}"))
}

/// Dumps a `TranslationUnit` to syntactically valid C++ (§4.5):
/// includes first, in order, then functions, in order.
pub fn dump_translation_unit(vfs: &Vfs, ovl: u32, tu_path: &str) -> CppAstResult<String> {
    let tu_id = vfs.resolve_for_overlay(tu_path, ovl)?;
    let node = vfs.node(ovl, tu_id)?;

    let mut include_lines = Vec::new();
    let mut function_blocks = Vec::new();
    for &child_id in node.children.values() {
        match cpp_ast_kind(vfs, ovl, child_id)? {
            CppAstKind::Include { header, angled } => {
                let (open, close) = if angled { ('<', '>') } else { ('"', '"') };
                include_lines.push(format!("#include {open}{header}{close}"));
            }
            CppAstKind::Function { .. } => function_blocks.push(dump_function(vfs, ovl, child_id)?),
            _ => {}
        }
    }

    let mut out = include_lines.join("\n");
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(&function_blocks.join("\n\n"));
    out.push('\n');
    Ok(out)
}

/// `cpp.dump tu file` — writes the dump to a VFS file; side-effect-free
/// w.r.t. the AST itself (§4.5).
pub fn dump_to_vfs(vfs: &mut Vfs, ovl: u32, tu_path: &str, file_path: &str) -> CppAstResult<()> {
    let text = dump_translation_unit(vfs, ovl, tu_path)?;
    vfs.write(file_path, text.into_bytes(), ovl)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{add_function, add_include, add_print, add_return_int, make_tu, ExprSpec};

    #[test]
    fn dumps_hello_world() {
        let mut vfs = Vfs::new();
        make_tu(&mut vfs, "/cpp/tu", 0).unwrap();
        add_include(&mut vfs, "/cpp/tu", "iostream", true, 0).unwrap();
        add_function(&mut vfs, "/cpp/tu", "int", "main", 0).unwrap();
        add_print(&mut vfs, "/cpp/tu/main/body", vec![ExprSpec::Str("Hello".into())], 0).unwrap();
        add_return_int(&mut vfs, "/cpp/tu/main/body", 0, 0).unwrap();

        let text = dump_translation_unit(&vfs, 0, "/cpp/tu").unwrap();
        assert!(text.contains("#include <iostream>"));
        assert!(text.contains("int main() {"));
        assert!(text.contains(r#"std::cout << "Hello" << std::endl;"#));
        assert!(text.contains("return 0;"));
    }
}
