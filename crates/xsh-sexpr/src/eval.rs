use xsh_vfs::{NodeId, SAstKind, Vfs};

use crate::env::{self, Env};
use crate::error::{SexprError, SexprResult};
use crate::value::Value;

fn numbered_args(vfs: &Vfs, ovl: u32, node_id: NodeId) -> SexprResult<Vec<NodeId>> {
    let node = vfs.node(ovl, node_id)?;
    let mut args = Vec::new();
    let mut i = 0;
    loop {
        let Some(&id) = node.children.get(&format!("arg{i}")) else { break };
        args.push(id);
        i += 1;
    }
    Ok(args)
}

fn sym_name(vfs: &Vfs, ovl: u32, node_id: NodeId) -> SexprResult<Option<String>> {
    match &vfs.node(ovl, node_id)?.kind {
        xsh_vfs::NodeKind::SAst(SAstKind::Sym(s)) => Ok(Some(s.clone())),
        _ => Ok(None),
    }
}

/// `eval(node, env)` (§4.4): total over `Value`'s variants.
pub fn eval(vfs: &mut Vfs, ovl: u32, node_id: NodeId, env: &Env) -> SexprResult<Value> {
    let kind = match &vfs.node(ovl, node_id)?.kind {
        xsh_vfs::NodeKind::SAst(k) => k.clone(),
        other => return Err(SexprError::TypeError(format!("not an s-expression node: {:?}", other.type_tag()))),
    };
    match kind {
        SAstKind::Int(n) => Ok(Value::Int(n)),
        SAstKind::Bool(b) => Ok(Value::Bool(b)),
        SAstKind::Str(s) => Ok(Value::Str(s)),
        SAstKind::Sym(name) => env::get(env, &name),
        SAstKind::Holder { target } => match target {
            Some(t) => eval(vfs, ovl, t, env),
            None => Err(SexprError::TypeError("dangling holder".into())),
        },
        SAstKind::If => {
            let node = vfs.node(ovl, node_id)?;
            let cond_id = *node.children.get("cond").ok_or_else(|| SexprError::TypeError("if missing cond".into()))?;
            let then_id = *node.children.get("then").ok_or_else(|| SexprError::TypeError("if missing then".into()))?;
            let else_id = *node.children.get("else").ok_or_else(|| SexprError::TypeError("if missing else".into()))?;
            let cond = eval(vfs, ovl, cond_id, env)?;
            let truthy = match cond {
                Value::Bool(b) => b,
                other => return Err(SexprError::TypeError(format!("if condition must be bool, got {}", other.type_name()))),
            };
            eval(vfs, ovl, if truthy { then_id } else { else_id }, env)
        }
        SAstKind::Lambda { params } => {
            let node = vfs.node(ovl, node_id)?;
            let body = *node.children.get("body").ok_or_else(|| SexprError::TypeError("lambda missing body".into()))?;
            Ok(Value::Closure { params, body, env: env.clone() })
        }
        SAstKind::Call => eval_call(vfs, ovl, node_id, env),
    }
}

fn eval_call(vfs: &mut Vfs, ovl: u32, node_id: NodeId, env: &Env) -> SexprResult<Value> {
    let fn_id = *vfs.node(ovl, node_id)?.children.get("fn").ok_or_else(|| SexprError::TypeError("call missing fn".into()))?;

    if let Some(name) = sym_name(vfs, ovl, fn_id)? {
        match name.as_str() {
            "define" => {
                let args = numbered_args(vfs, ovl, node_id)?;
                if args.len() != 2 {
                    return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
                }
                let target = sym_name(vfs, ovl, args[0])?.ok_or_else(|| SexprError::TypeError("define target must be a symbol".into()))?;
                let value = eval(vfs, ovl, args[1], env)?;
                env::define(env, &target, value.clone());
                return Ok(value);
            }
            "let" => {
                let args = numbered_args(vfs, ovl, node_id)?;
                if args.len() != 2 {
                    return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
                }
                let new_env = env::child(env);
                for pair_id in list_items(vfs, ovl, args[0])? {
                    let pair_node = vfs.node(ovl, pair_id)?;
                    let name_id = *pair_node.children.get("fn").ok_or_else(|| SexprError::TypeError("let binding missing name".into()))?;
                    let expr_id = *pair_node.children.get("arg0").ok_or_else(|| SexprError::TypeError("let binding missing expr".into()))?;
                    let name = sym_name(vfs, ovl, name_id)?.ok_or_else(|| SexprError::TypeError("let binding name must be a symbol".into()))?;
                    let value = eval(vfs, ovl, expr_id, env)?;
                    env::define(&new_env, &name, value);
                }
                return eval(vfs, ovl, args[1], &new_env);
            }
            _ => {}
        }
    }

    let op = eval(vfs, ovl, fn_id, env)?;
    let arg_ids = numbered_args(vfs, ovl, node_id)?;
    let mut args = Vec::with_capacity(arg_ids.len());
    for id in arg_ids {
        args.push(eval(vfs, ovl, id, env)?);
    }
    apply(vfs, ovl, op, args)
}

/// A `(a b c)`-shaped list node's items, where item 0 lives at `fn` and the
/// rest at `arg0`, `arg1`, ... — the same shape every plain call produces.
fn list_items(vfs: &Vfs, ovl: u32, node_id: NodeId) -> SexprResult<Vec<NodeId>> {
    let node = vfs.node(ovl, node_id)?;
    let mut items = vec![*node.children.get("fn").ok_or_else(|| SexprError::TypeError("expected a list".into()))?];
    items.extend(numbered_args(vfs, ovl, node_id)?);
    Ok(items)
}

pub fn apply(vfs: &mut Vfs, ovl: u32, op: Value, args: Vec<Value>) -> SexprResult<Value> {
    match op {
        Value::Builtin(name) => crate::builtins::call(&name, args),
        Value::Closure { params, body, env } => {
            if params.len() != args.len() {
                return Err(SexprError::ArityError { expected: params.len().to_string(), got: args.len() });
            }
            let call_env = env::child(&env);
            for (param, value) in params.iter().zip(args) {
                env::define(&call_env, param, value);
            }
            eval(vfs, ovl, body, &call_env)
        }
        other => Err(SexprError::TypeError(format!("{} is not callable", other.type_name()))),
    }
}

/// Installs the standard built-in bindings into `env` (§4.4).
pub fn install_builtins(env: &Env) {
    for name in crate::builtins::NAMES {
        env::define(env, name, Value::Builtin((*name).to_owned()));
    }
}
