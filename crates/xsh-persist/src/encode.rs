use std::collections::HashMap;

use xsh_vfs::{CppAstKind, NodeId, NodeKind, PlanKind, SAstKind, Vfs};

use crate::error::PersistResult;
use crate::format::{write_bool, write_bytes, write_i64, write_str, write_u32, write_u8, MAGIC};

/// Depth-first path enumeration from an overlay's root, used both to decide
/// serialization order and to resolve `Holder` cross-references to a
/// logical path (§6.3). A node reachable through two directory entries
/// (via `link`) is walked — and re-emitted — once per path, since the
/// on-disk format records paths, not ids; the acyclicity of `link` (an
/// ancestor may never link a descendant) guarantees this terminates.
fn enumerate_paths(vfs: &Vfs, ovl: u32, root: NodeId) -> PersistResult<(Vec<(String, NodeId)>, HashMap<NodeId, String>)> {
    let mut order = Vec::new();
    let mut canonical_paths = HashMap::new();
    let mut stack = vec![(String::new(), root)];
    while let Some((path, id)) = stack.pop() {
        canonical_paths.entry(id).or_insert_with(|| path.clone());
        order.push((path.clone(), id));
        let node = vfs.node(ovl, id)?;
        for (name, &child_id) in node.children.iter().rev() {
            let child_path = if path.is_empty() { name.clone() } else { format!("{path}/{name}") };
            stack.push((child_path, child_id));
        }
    }
    Ok((order, canonical_paths))
}

fn encode_payload(kind: &NodeKind, paths: &HashMap<NodeId, String>) -> Vec<u8> {
    let mut buf = Vec::new();
    match kind {
        NodeKind::Dir => {}
        NodeKind::File(data) => write_bytes(&mut buf, data),
        NodeKind::SAst(sast) => encode_sast(&mut buf, sast, paths),
        NodeKind::CppAst(cpp) => encode_cppast(&mut buf, cpp),
        NodeKind::Plan(plan) => encode_plan(&mut buf, plan),
        NodeKind::Mount(state) => {
            write_str(&mut buf, &state.host_path.to_string_lossy());
            write_bool(&mut buf, state.materialized);
        }
        NodeKind::Library(state) => {
            write_str(&mut buf, &state.host_path.to_string_lossy());
            write_bool(&mut buf, state.loaded);
        }
        NodeKind::LibrarySymbol(sig) => write_str(&mut buf, sig),
        NodeKind::Remote(state) => {
            write_str(&mut buf, &state.address);
            write_bool(&mut buf, state.connected);
        }
    }
    buf
}

fn encode_sast(buf: &mut Vec<u8>, sast: &SAstKind, paths: &HashMap<NodeId, String>) {
    match sast {
        SAstKind::Int(v) => {
            write_u8(buf, 0);
            write_i64(buf, *v);
        }
        SAstKind::Bool(v) => {
            write_u8(buf, 1);
            write_bool(buf, *v);
        }
        SAstKind::Str(s) => {
            write_u8(buf, 2);
            write_str(buf, s);
        }
        SAstKind::Sym(s) => {
            write_u8(buf, 3);
            write_str(buf, s);
        }
        SAstKind::If => write_u8(buf, 4),
        SAstKind::Lambda { params } => {
            write_u8(buf, 5);
            write_u32(buf, params.len() as u32);
            for p in params {
                write_str(buf, p);
            }
        }
        SAstKind::Call => write_u8(buf, 6),
        SAstKind::Holder { target } => {
            write_u8(buf, 7);
            match target.and_then(|id| paths.get(&id)) {
                Some(path) => {
                    write_bool(buf, true);
                    write_str(buf, path);
                }
                None => write_bool(buf, false),
            }
        }
    }
}

fn encode_cppast(buf: &mut Vec<u8>, cpp: &CppAstKind) {
    match cpp {
        CppAstKind::TranslationUnit => write_u8(buf, 0),
        CppAstKind::Include { header, angled } => {
            write_u8(buf, 1);
            write_str(buf, header);
            write_bool(buf, *angled);
        }
        CppAstKind::Function { return_type, name, params } => {
            write_u8(buf, 2);
            write_str(buf, return_type);
            write_str(buf, name);
            write_u32(buf, params.len() as u32);
            for (ty, n) in params {
                write_str(buf, ty);
                write_str(buf, n);
            }
        }
        CppAstKind::Compound => write_u8(buf, 3),
        CppAstKind::RangeFor { decl, range } => {
            write_u8(buf, 4);
            write_str(buf, decl);
            write_str(buf, range);
        }
        CppAstKind::ExprStmt => write_u8(buf, 5),
        CppAstKind::Return { has_expr } => {
            write_u8(buf, 6);
            write_bool(buf, *has_expr);
        }
        CppAstKind::VarDecl { ty, name, init, has_init } => {
            write_u8(buf, 7);
            write_str(buf, ty);
            write_str(buf, name);
            write_bool(buf, *has_init);
            write_str(buf, init.as_deref().unwrap_or(""));
        }
        CppAstKind::RawStmt { text } => {
            write_u8(buf, 8);
            write_str(buf, text);
        }
        CppAstKind::Id { id } => {
            write_u8(buf, 9);
            write_str(buf, id);
        }
        CppAstKind::StringLit { value } => {
            write_u8(buf, 10);
            write_str(buf, value);
        }
        CppAstKind::IntLit { value } => {
            write_u8(buf, 11);
            write_i64(buf, *value);
        }
        CppAstKind::Call => write_u8(buf, 12),
        CppAstKind::BinOp { op } => {
            write_u8(buf, 13);
            write_str(buf, op);
        }
        CppAstKind::StreamOut => write_u8(buf, 14),
        CppAstKind::RawExpr { text } => {
            write_u8(buf, 15);
            write_str(buf, text);
        }
    }
}

fn encode_plan(buf: &mut Vec<u8>, plan: &PlanKind) {
    match plan {
        PlanKind::Root { content } => {
            write_u8(buf, 0);
            write_str(buf, content);
        }
        PlanKind::SubPlan { content } => {
            write_u8(buf, 1);
            write_str(buf, content);
        }
        PlanKind::Strategy { content } => {
            write_u8(buf, 2);
            write_str(buf, content);
        }
        PlanKind::Notes { content } => {
            write_u8(buf, 3);
            write_str(buf, content);
        }
        PlanKind::Goals { items } => write_items(buf, 4, items),
        PlanKind::Ideas { items } => write_items(buf, 5, items),
        PlanKind::Deps { items } => write_items(buf, 6, items),
        PlanKind::Implemented { items } => write_items(buf, 7, items),
        PlanKind::Research { items } => write_items(buf, 8, items),
        PlanKind::Jobs { entries } => {
            write_u8(buf, 9);
            write_u32(buf, entries.len() as u32);
            for e in entries {
                write_bool(buf, e.done);
                write_i64(buf, e.priority);
                write_str(buf, &e.assignee);
                write_str(buf, &e.description);
            }
        }
    }
}

fn write_items(buf: &mut Vec<u8>, tag: u8, items: &[String]) {
    write_u8(buf, tag);
    write_u32(buf, items.len() as u32);
    for item in items {
        write_str(buf, item);
    }
}

/// Serializes one overlay's subtree (§6.3): a magic header, a record count,
/// then one `{type_tag, path, payload}` record per reachable node in
/// depth-first order.
pub fn encode_overlay(vfs: &Vfs, ovl: u32) -> PersistResult<Vec<u8>> {
    let root = vfs.overlay(ovl)?.root;
    let (order, paths) = enumerate_paths(vfs, ovl, root)?;

    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    write_u32(&mut buf, order.len() as u32);
    for (path, id) in &order {
        let node = vfs.node(ovl, *id)?;
        write_str(&mut buf, node.kind.type_tag());
        write_str(&mut buf, path);
        write_bytes(&mut buf, &encode_payload(&node.kind, &paths));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_overlay;

    #[test]
    fn round_trips_sast_tree_with_holder() {
        let mut vfs = Vfs::new();
        let ovl = vfs.add_overlay("sexpr");
        let target = vfs.add_node("/", "target", NodeKind::SAst(SAstKind::Int(42)), ovl).unwrap();
        vfs.add_node("/", "ref", NodeKind::SAst(SAstKind::Holder { target: Some(target) }), ovl).unwrap();

        let bytes = encode_overlay(&vfs, ovl).unwrap();

        let mut fresh = Vfs::new();
        let fresh_ovl = fresh.add_overlay("sexpr");
        decode_overlay(&mut fresh, fresh_ovl, &bytes).unwrap();

        let reloaded_target = fresh.resolve_for_overlay("/target", fresh_ovl).unwrap();
        let reloaded_ref = fresh.resolve_for_overlay("/ref", fresh_ovl).unwrap();
        match &fresh.node(fresh_ovl, reloaded_ref).unwrap().kind {
            NodeKind::SAst(SAstKind::Holder { target }) => assert_eq!(*target, Some(reloaded_target)),
            other => panic!("expected holder, got {other:?}"),
        }
    }
}
