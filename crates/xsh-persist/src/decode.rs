use std::collections::HashMap;

use xsh_vfs::{CppAstKind, JobEntry, NodeKind, PlanKind, SAstKind, Vfs};

use crate::error::{PersistError, PersistResult};
use crate::format::{Reader, MAGIC};

struct Record {
    type_tag: String,
    path: String,
    payload: Vec<u8>,
}

fn read_records(data: &[u8]) -> PersistResult<Vec<Record>> {
    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(PersistError::BadMagic);
    }
    let mut reader = Reader::new(&data[MAGIC.len()..]);
    let count = reader.read_u32()?;
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let type_tag = reader.read_str()?;
        let path = reader.read_str()?;
        let payload = reader.read_bytes()?;
        records.push(Record { type_tag, path, payload });
    }
    Ok(records)
}

enum Decoded {
    Kind(NodeKind),
    Holder(Option<String>),
}

fn decode_sast(reader: &mut Reader) -> PersistResult<Decoded> {
    Ok(match reader.read_u8()? {
        0 => Decoded::Kind(NodeKind::SAst(SAstKind::Int(reader.read_i64()?))),
        1 => Decoded::Kind(NodeKind::SAst(SAstKind::Bool(reader.read_bool()?))),
        2 => Decoded::Kind(NodeKind::SAst(SAstKind::Str(reader.read_str()?))),
        3 => Decoded::Kind(NodeKind::SAst(SAstKind::Sym(reader.read_str()?))),
        4 => Decoded::Kind(NodeKind::SAst(SAstKind::If)),
        5 => {
            let n = reader.read_u32()?;
            let mut params = Vec::with_capacity(n as usize);
            for _ in 0..n {
                params.push(reader.read_str()?);
            }
            Decoded::Kind(NodeKind::SAst(SAstKind::Lambda { params }))
        }
        6 => Decoded::Kind(NodeKind::SAst(SAstKind::Call)),
        7 => {
            let has_target = reader.read_bool()?;
            let target_path = if has_target { Some(reader.read_str()?) } else { None };
            Decoded::Holder(target_path)
        }
        other => return Err(PersistError::UnsupportedNodeKind(format!("sast tag {other}"))),
    })
}

fn decode_cppast(reader: &mut Reader) -> PersistResult<CppAstKind> {
    Ok(match reader.read_u8()? {
        0 => CppAstKind::TranslationUnit,
        1 => CppAstKind::Include { header: reader.read_str()?, angled: reader.read_bool()? },
        2 => {
            let return_type = reader.read_str()?;
            let name = reader.read_str()?;
            let n = reader.read_u32()?;
            let mut params = Vec::with_capacity(n as usize);
            for _ in 0..n {
                params.push((reader.read_str()?, reader.read_str()?));
            }
            CppAstKind::Function { return_type, name, params }
        }
        3 => CppAstKind::Compound,
        4 => CppAstKind::RangeFor { decl: reader.read_str()?, range: reader.read_str()? },
        5 => CppAstKind::ExprStmt,
        6 => CppAstKind::Return { has_expr: reader.read_bool()? },
        7 => {
            let ty = reader.read_str()?;
            let name = reader.read_str()?;
            let has_init = reader.read_bool()?;
            let init_text = reader.read_str()?;
            CppAstKind::VarDecl { ty, name, init: if has_init { Some(init_text) } else { None }, has_init }
        }
        8 => CppAstKind::RawStmt { text: reader.read_str()? },
        9 => CppAstKind::Id { id: reader.read_str()? },
        10 => CppAstKind::StringLit { value: reader.read_str()? },
        11 => CppAstKind::IntLit { value: reader.read_i64()? },
        12 => CppAstKind::Call,
        13 => CppAstKind::BinOp { op: reader.read_str()? },
        14 => CppAstKind::StreamOut,
        15 => CppAstKind::RawExpr { text: reader.read_str()? },
        other => return Err(PersistError::UnsupportedNodeKind(format!("cppast tag {other}"))),
    })
}

fn decode_plan(reader: &mut Reader) -> PersistResult<PlanKind> {
    fn read_items(reader: &mut Reader) -> PersistResult<Vec<String>> {
        let n = reader.read_u32()?;
        let mut items = Vec::with_capacity(n as usize);
        for _ in 0..n {
            items.push(reader.read_str()?);
        }
        Ok(items)
    }

    Ok(match reader.read_u8()? {
        0 => PlanKind::Root { content: reader.read_str()? },
        1 => PlanKind::SubPlan { content: reader.read_str()? },
        2 => PlanKind::Strategy { content: reader.read_str()? },
        3 => PlanKind::Notes { content: reader.read_str()? },
        4 => PlanKind::Goals { items: read_items(reader)? },
        5 => PlanKind::Ideas { items: read_items(reader)? },
        6 => PlanKind::Deps { items: read_items(reader)? },
        7 => PlanKind::Implemented { items: read_items(reader)? },
        8 => PlanKind::Research { items: read_items(reader)? },
        9 => {
            let n = reader.read_u32()?;
            let mut entries = Vec::with_capacity(n as usize);
            for _ in 0..n {
                entries.push(JobEntry {
                    done: reader.read_bool()?,
                    priority: reader.read_i64()?,
                    assignee: reader.read_str()?,
                    description: reader.read_str()?,
                });
            }
            PlanKind::Jobs { entries }
        }
        other => return Err(PersistError::UnsupportedNodeKind(format!("plan tag {other}"))),
    })
}

fn decode_payload(type_tag: &str, payload: &[u8]) -> PersistResult<Decoded> {
    let mut reader = Reader::new(payload);
    Ok(match type_tag {
        "dir" => Decoded::Kind(NodeKind::Dir),
        "file" => Decoded::Kind(NodeKind::File(reader.read_bytes()?)),
        "sast" => decode_sast(&mut reader)?,
        "cppast" => Decoded::Kind(NodeKind::CppAst(decode_cppast(&mut reader)?)),
        "plan" => Decoded::Kind(NodeKind::Plan(decode_plan(&mut reader)?)),
        "mount" => Decoded::Kind(NodeKind::Mount(xsh_vfs::MountState {
            host_path: reader.read_str()?.into(),
            materialized: reader.read_bool()?,
        })),
        "library" => Decoded::Kind(NodeKind::Library(xsh_vfs::LibraryState {
            host_path: reader.read_str()?.into(),
            loaded: reader.read_bool()?,
        })),
        "librarysymbol" => Decoded::Kind(NodeKind::LibrarySymbol(reader.read_str()?)),
        "remote" => Decoded::Kind(NodeKind::Remote(xsh_vfs::RemoteState { address: reader.read_str()?, connected: reader.read_bool()? })),
        other => return Err(PersistError::UnsupportedNodeKind(format!("type_tag {other:?}"))),
    })
}

/// Replaces overlay `ovl`'s subtree with the tree encoded in `data` (§6.3).
/// The overlay's root node is kept (it always exists); every other node is
/// rebuilt from scratch.
pub fn decode_overlay(vfs: &mut Vfs, ovl: u32, data: &[u8]) -> PersistResult<()> {
    let records = read_records(data)?;
    let mut holder_targets: Vec<(String, String)> = Vec::new();
    let mut path_to_node: HashMap<String, xsh_vfs::NodeId> = HashMap::new();

    for record in &records {
        if record.path.is_empty() {
            let root_id = vfs.overlay(ovl)?.root;
            path_to_node.insert(String::new(), root_id);
            continue;
        }

        let (dir, name) = match record.path.rsplit_once('/') {
            Some((parent, name)) => (format!("/{parent}"), name.to_owned()),
            None => ("/".to_owned(), record.path.clone()),
        };

        let kind = match decode_payload(&record.type_tag, &record.payload)? {
            Decoded::Kind(kind) => kind,
            Decoded::Holder(target_path) => {
                if let Some(target_path) = target_path {
                    holder_targets.push((record.path.clone(), target_path));
                }
                NodeKind::SAst(SAstKind::Holder { target: None })
            }
        };

        let id = vfs.add_node(&dir, &name, kind, ovl)?;
        path_to_node.insert(record.path.clone(), id);
    }

    for (holder_path, target_path) in holder_targets {
        let target_id = *path_to_node.get(&target_path).ok_or_else(|| PersistError::DanglingReference(target_path.clone()))?;
        let holder_id = *path_to_node.get(&holder_path).expect("holder was just created above");
        if let NodeKind::SAst(SAstKind::Holder { target }) = &mut vfs.node_mut(ovl, holder_id)?.kind {
            *target = Some(target_id);
        }
    }

    Ok(())
}
