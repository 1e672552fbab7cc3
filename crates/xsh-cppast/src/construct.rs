use xsh_vfs::{CppAstKind, NodeId, NodeKind, Vfs};

use crate::error::{CppAstError, CppAstResult};

/// Expression shape accepted by the construction API; each variant
/// materializes into the matching [`CppAstKind`] expression node (§3.4).
#[derive(Debug, Clone)]
pub enum ExprSpec {
    Id(String),
    Str(String),
    Int(i64),
    Call { func: String, args: Vec<ExprSpec> },
    BinOp { op: String, a: Box<ExprSpec>, b: Box<ExprSpec> },
    StreamOut(Vec<ExprSpec>),
    Raw(String),
    /// `std::endl`, used inside `StreamOut` chains.
    Endl,
}

fn next_child_name(vfs: &Vfs, ovl: u32, dir: NodeId) -> CppAstResult<String> {
    let node = vfs.node(ovl, dir)?;
    Ok(node.children.len().to_string())
}

fn materialize_expr(vfs: &mut Vfs, dir: &str, name: &str, expr: ExprSpec, ovl: u32) -> CppAstResult<NodeId> {
    let id = match expr {
        ExprSpec::Id(id) => vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::Id { id }), ovl)?,
        ExprSpec::Str(value) => vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::StringLit { value }), ovl)?,
        ExprSpec::Int(value) => vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::IntLit { value }), ovl)?,
        ExprSpec::Endl => vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::RawExpr { text: "std::endl".into() }), ovl)?,
        ExprSpec::Raw(text) => vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::RawExpr { text }), ovl)?,
        ExprSpec::Call { func, args } => {
            let id = vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::Call), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            materialize_expr(vfs, &node_path, "fn", ExprSpec::Id(func), ovl)?;
            for (i, arg) in args.into_iter().enumerate() {
                materialize_expr(vfs, &node_path, &format!("arg{i}"), arg, ovl)?;
            }
            id
        }
        ExprSpec::BinOp { op, a, b } => {
            let id = vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::BinOp { op }), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            materialize_expr(vfs, &node_path, "a", *a, ovl)?;
            materialize_expr(vfs, &node_path, "b", *b, ovl)?;
            id
        }
        ExprSpec::StreamOut(chain) => {
            let id = vfs.add_node(dir, name, NodeKind::CppAst(CppAstKind::StreamOut), ovl)?;
            let node_path = format!("{}/{}", dir.trim_end_matches('/'), name);
            for (i, part) in chain.into_iter().enumerate() {
                materialize_expr(vfs, &node_path, &format!("part{i}"), part, ovl)?;
            }
            id
        }
    };
    Ok(id)
}

/// `cpp.tu` — creates an empty `TranslationUnit` directory at `path`.
pub fn make_tu(vfs: &mut Vfs, path: &str, ovl: u32) -> CppAstResult<NodeId> {
    let (dir, name) = xsh_vfs::path::parent_and_name(path)?;
    Ok(vfs.add_node(&dir, name, NodeKind::CppAst(CppAstKind::TranslationUnit), ovl)?)
}

/// `cpp.include` — appends an `#include` to the translation unit.
pub fn add_include(vfs: &mut Vfs, tu_path: &str, header: &str, angled: bool, ovl: u32) -> CppAstResult<NodeId> {
    let tu = vfs.resolve_for_overlay(tu_path, ovl)?;
    let name = next_child_name(vfs, ovl, tu)?;
    Ok(vfs.add_node(tu_path, &name, NodeKind::CppAst(CppAstKind::Include { header: header.to_owned(), angled }), ovl)?)
}

/// `cpp.func` — appends a function to the translation unit, along with its
/// (initially empty) `body` `Compound` child.
pub fn add_function(vfs: &mut Vfs, tu_path: &str, return_type: &str, name: &str, ovl: u32) -> CppAstResult<NodeId> {
    let func_id = vfs.add_node(
        tu_path,
        name,
        NodeKind::CppAst(CppAstKind::Function { return_type: return_type.to_owned(), name: name.to_owned(), params: Vec::new() }),
        ovl,
    )?;
    let func_path = format!("{}/{}", tu_path.trim_end_matches('/'), name);
    vfs.add_node(&func_path, "body", NodeKind::CppAst(CppAstKind::Compound), ovl)?;
    Ok(func_id)
}

/// `cpp.param` — appends a parameter to a previously-created function.
pub fn add_param(vfs: &mut Vfs, func_path: &str, ty: &str, name: &str, ovl: u32) -> CppAstResult<()> {
    let func_id = vfs.resolve_for_overlay(func_path, ovl)?;
    let node = vfs.node_mut(ovl, func_id)?;
    match &mut node.kind {
        NodeKind::CppAst(CppAstKind::Function { params, .. }) => {
            params.push((ty.to_owned(), name.to_owned()));
            Ok(())
        }
        _ => Err(CppAstError::UnexpectedKind { path: func_path.to_owned(), expected: "Function" }),
    }
}

fn compound_append(vfs: &mut Vfs, compound_path: &str, kind: CppAstKind, ovl: u32) -> CppAstResult<(NodeId, String)> {
    let compound_id = vfs.resolve_for_overlay(compound_path, ovl)?;
    let name = next_child_name(vfs, ovl, compound_id)?;
    let id = vfs.add_node(compound_path, &name, NodeKind::CppAst(kind), ovl)?;
    Ok((id, name))
}

/// `cpp.stmt` — appends a raw, verbatim statement.
pub fn add_raw_stmt(vfs: &mut Vfs, compound_path: &str, text: &str, ovl: u32) -> CppAstResult<NodeId> {
    Ok(compound_append(vfs, compound_path, CppAstKind::RawStmt { text: text.to_owned() }, ovl)?.0)
}

/// `cpp.vardecl` — appends a variable declaration, with or without an
/// initializer.
pub fn add_vardecl(vfs: &mut Vfs, compound_path: &str, ty: &str, name: &str, init: Option<&str>, ovl: u32) -> CppAstResult<NodeId> {
    let kind = CppAstKind::VarDecl { ty: ty.to_owned(), name: name.to_owned(), init: init.map(str::to_owned), has_init: init.is_some() };
    Ok(compound_append(vfs, compound_path, kind, ovl)?.0)
}

/// `cpp.return` — appends `return <expr>;`.
pub fn add_return(vfs: &mut Vfs, compound_path: &str, expr: Option<ExprSpec>, ovl: u32) -> CppAstResult<NodeId> {
    let (id, name) = compound_append(vfs, compound_path, CppAstKind::Return { has_expr: expr.is_some() }, ovl)?;
    if let Some(expr) = expr {
        let stmt_path = format!("{}/{}", compound_path.trim_end_matches('/'), name);
        materialize_expr(vfs, &stmt_path, "expr", expr, ovl)?;
    }
    Ok(id)
}

/// `cpp.returni` — convenience for `return <int literal>;`.
pub fn add_return_int(vfs: &mut Vfs, compound_path: &str, value: i64, ovl: u32) -> CppAstResult<NodeId> {
    add_return(vfs, compound_path, Some(ExprSpec::Int(value)), ovl)
}

/// `cpp.expr` — appends an expression statement.
pub fn add_expr_stmt(vfs: &mut Vfs, compound_path: &str, expr: ExprSpec, ovl: u32) -> CppAstResult<NodeId> {
    let (id, name) = compound_append(vfs, compound_path, CppAstKind::ExprStmt, ovl)?;
    let stmt_path = format!("{}/{}", compound_path.trim_end_matches('/'), name);
    materialize_expr(vfs, &stmt_path, "expr", expr, ovl)?;
    Ok(id)
}

/// `cpp.print` — convenience for `std::cout << ... << std::endl;`.
pub fn add_print(vfs: &mut Vfs, compound_path: &str, parts: Vec<ExprSpec>, ovl: u32) -> CppAstResult<NodeId> {
    let mut chain = vec![ExprSpec::Id("std::cout".into())];
    chain.extend(parts);
    chain.push(ExprSpec::Endl);
    add_expr_stmt(vfs, compound_path, ExprSpec::StreamOut(chain), ovl)
}

/// `cpp.rangefor` — appends a range-based `for`, with its own `body`
/// `Compound` child.
pub fn add_rangefor(vfs: &mut Vfs, compound_path: &str, decl: &str, range: &str, ovl: u32) -> CppAstResult<NodeId> {
    let (id, name) = compound_append(vfs, compound_path, CppAstKind::RangeFor { decl: decl.to_owned(), range: range.to_owned() }, ovl)?;
    let stmt_path = format!("{}/{}", compound_path.trim_end_matches('/'), name);
    vfs.add_node(&stmt_path, "body", NodeKind::CppAst(CppAstKind::Compound), ovl)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_translation_unit_with_main() {
        let mut vfs = Vfs::new();
        make_tu(&mut vfs, "/cpp/tu", 0).unwrap();
        add_include(&mut vfs, "/cpp/tu", "iostream", true, 0).unwrap();
        add_function(&mut vfs, "/cpp/tu", "int", "main", 0).unwrap();
        add_print(&mut vfs, "/cpp/tu/main/body", vec![ExprSpec::Str("Hello".into())], 0).unwrap();
        add_return_int(&mut vfs, "/cpp/tu/main/body", 0, 0).unwrap();

        let body = vfs.resolve_for_overlay("/cpp/tu/main/body", 0).unwrap();
        assert_eq!(vfs.node(0, body).unwrap().children.len(), 2);
    }
}
