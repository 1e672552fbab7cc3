use crate::error::{SexprError, SexprResult};
use crate::value::Value;

/// Names installed into the root environment at startup (§4.4). `if`,
/// `lambda`, `define`, and `let` are not here: they're recognized as
/// special forms directly off the AST shape in [`crate::eval`], not as
/// callable values.
pub const NAMES: &[&str] = &["+", "-", "*", "/", "mod", "=", "<", ">", "<=", ">=", "list", "car", "cdr", "cons", "null?", "print"];

fn as_int(v: &Value) -> SexprResult<i64> {
    match v {
        Value::Int(n) => Ok(*n),
        other => Err(SexprError::TypeError(format!("expected int, got {}", other.type_name()))),
    }
}

pub fn call(name: &str, args: Vec<Value>) -> SexprResult<Value> {
    match name {
        "+" => fold_ints(&args, 0, |a, b| a + b),
        "*" => fold_ints(&args, 1, |a, b| a * b),
        "-" => match args.len() {
            0 => Err(SexprError::ArityError { expected: "1+".into(), got: 0 }),
            1 => Ok(Value::Int(-as_int(&args[0])?)),
            _ => {
                let mut it = args.iter();
                let first = as_int(it.next().unwrap())?;
                let mut acc = first;
                for v in it {
                    acc -= as_int(v)?;
                }
                Ok(Value::Int(acc))
            }
        },
        "/" => {
            if args.len() != 2 {
                return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
            }
            let a = as_int(&args[0])?;
            let b = as_int(&args[1])?;
            if b == 0 {
                return Err(SexprError::TypeError("division by zero".into()));
            }
            Ok(Value::Int(a / b))
        }
        "mod" => {
            if args.len() != 2 {
                return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
            }
            let a = as_int(&args[0])?;
            let b = as_int(&args[1])?;
            if b == 0 {
                return Err(SexprError::TypeError("division by zero".into()));
            }
            Ok(Value::Int(a % b))
        }
        "=" => compare(&args, |a, b| a == b),
        "<" => compare(&args, |a, b| a < b),
        ">" => compare(&args, |a, b| a > b),
        "<=" => compare(&args, |a, b| a <= b),
        ">=" => compare(&args, |a, b| a >= b),
        "list" => Ok(Value::List(args)),
        "car" => match args.into_iter().next() {
            Some(Value::List(items)) => items.into_iter().next().ok_or_else(|| SexprError::TypeError("car of empty list".into())),
            Some(other) => Err(SexprError::TypeError(format!("car expects a list, got {}", other.type_name()))),
            None => Err(SexprError::ArityError { expected: "1".into(), got: 0 }),
        },
        "cdr" => match args.into_iter().next() {
            Some(Value::List(items)) => {
                if items.is_empty() {
                    return Err(SexprError::TypeError("cdr of empty list".into()));
                }
                Ok(Value::List(items[1..].to_vec()))
            }
            Some(other) => Err(SexprError::TypeError(format!("cdr expects a list, got {}", other.type_name()))),
            None => Err(SexprError::ArityError { expected: "1".into(), got: 0 }),
        },
        "cons" => {
            if args.len() != 2 {
                return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
            }
            let mut items = vec![args[0].clone()];
            match &args[1] {
                Value::List(rest) => items.extend(rest.clone()),
                other => return Err(SexprError::TypeError(format!("cons expects a list tail, got {}", other.type_name()))),
            }
            Ok(Value::List(items))
        }
        "null?" => match args.into_iter().next() {
            Some(Value::List(items)) => Ok(Value::Bool(items.is_empty())),
            Some(_) => Ok(Value::Bool(false)),
            None => Err(SexprError::ArityError { expected: "1".into(), got: 0 }),
        },
        "print" => {
            let rendered = args.iter().map(Value::display).collect::<Vec<_>>().join(" ");
            println!("{rendered}");
            Ok(Value::Str(rendered))
        }
        other => Err(SexprError::UnboundSymbol(other.to_owned())),
    }
}

fn fold_ints(args: &[Value], init: i64, f: impl Fn(i64, i64) -> i64) -> SexprResult<Value> {
    let mut acc = init;
    for v in args {
        acc = f(acc, as_int(v)?);
    }
    Ok(Value::Int(acc))
}

fn compare(args: &[Value], f: impl Fn(i64, i64) -> bool) -> SexprResult<Value> {
    if args.len() != 2 {
        return Err(SexprError::ArityError { expected: "2".into(), got: args.len() });
    }
    Ok(Value::Bool(f(as_int(&args[0])?, as_int(&args[1])?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_and_comparison() {
        assert!(matches!(call("+", vec![Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(6)));
        assert!(matches!(call("<", vec![Value::Int(1), Value::Int(2)]).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn list_primitives_roundtrip() {
        let list = call("list", vec![Value::Int(1), Value::Int(2)]).unwrap();
        let Value::List(items) = &list else { panic!("expected list") };
        assert_eq!(items.len(), 2);
        let head = call("car", vec![list.clone()]).unwrap();
        assert!(matches!(head, Value::Int(1)));
    }
}
