use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::SexprError;
use crate::value::Value;

/// One frame of the lexical environment chain (§4.4). Closures capture
/// their defining frame via `Rc`, so its lifetime is however long the
/// longest-lived closure holds it.
#[derive(Debug, Default)]
pub struct EnvFrame {
    vars: HashMap<String, Value>,
    parent: Option<Env>,
}

pub type Env = Rc<RefCell<EnvFrame>>;

pub fn new_root() -> Env {
    Rc::new(RefCell::new(EnvFrame::default()))
}

pub fn child(parent: &Env) -> Env {
    Rc::new(RefCell::new(EnvFrame { vars: HashMap::new(), parent: Some(parent.clone()) }))
}

pub fn define(env: &Env, name: &str, value: Value) {
    env.borrow_mut().vars.insert(name.to_owned(), value);
}

/// Walks up the chain; the first definition found wins.
pub fn get(env: &Env, name: &str) -> Result<Value, SexprError> {
    if let Some(v) = env.borrow().vars.get(name) {
        return Ok(v.clone());
    }
    let parent = env.borrow().parent.clone();
    match parent {
        Some(p) => get(&p, name),
        None => Err(SexprError::UnboundSymbol(name.to_owned())),
    }
}

/// Writes to the innermost frame that already defines `name`; falls back
/// to defining it in the current frame if nowhere in the chain does.
pub fn set(env: &Env, name: &str, value: Value) {
    if env.borrow().vars.contains_key(name) {
        env.borrow_mut().vars.insert(name.to_owned(), value);
        return;
    }
    let parent = env.borrow().parent.clone();
    match parent {
        Some(p) => set(&p, name, value),
        None => define(env, name, value),
    }
}
