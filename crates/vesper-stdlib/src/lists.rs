use vesper_core::{check_arity, Env, Value, VesperError};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "null?", |_ctx, _env, args| {
        check_arity!(args, "null?", 1);
        Ok(Value::Bool(args[0].is_null()))
    });

    register_fn(env, "pair?", |_ctx, _env, args| {
        check_arity!(args, "pair?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Pair(_))))
    });

    register_fn(env, "list?", |_ctx, _env, args| {
        check_arity!(args, "list?", 1);
        Ok(Value::Bool(args[0].is_list()))
    });

    register_fn(env, "cons", |_ctx, _env, args| {
        check_arity!(args, "cons", 2);
        Ok(Value::cons(args[0].clone(), args[1].clone()))
    });

    register_fn(env, "car", |_ctx, _env, args| {
        check_arity!(args, "car", 1);
        args[0].car()
    });

    register_fn(env, "cdr", |_ctx, _env, args| {
        check_arity!(args, "cdr", 1);
        args[0].cdr()
    });

    register_fn(env, "set-car!", |_ctx, _env, args| {
        check_arity!(args, "set-car!", 2);
        let pair = args[0].as_pair()?;
        pair.assert_mutable()?;
        *pair.car.borrow_mut() = args[1].clone();
        Ok(args[0].clone())
    });

    register_fn(env, "set-cdr!", |_ctx, _env, args| {
        check_arity!(args, "set-cdr!", 2);
        let pair = args[0].as_pair()?;
        pair.assert_mutable()?;
        *pair.cdr.borrow_mut() = args[1].clone();
        Ok(args[0].clone())
    });

    register_fn(env, "length", |_ctx, _env, args| {
        check_arity!(args, "length", 1);
        Ok(Value::int(args[0].list_to_vec()?.len() as i64))
    });

    register_fn(env, "list", |_ctx, _env, args| {
        Ok(Value::list(args.to_vec()))
    });

    register_fn(env, "append", |_ctx, _env, args| {
        if args.is_empty() {
            return Ok(Value::Null);
        }
        let mut items = Vec::new();
        for list in &args[..args.len() - 1] {
            if list.is_null() {
                continue;
            }
            items.extend(list.list_to_vec()?);
        }
        let last = args[args.len() - 1].clone();
        if items.is_empty() {
            return Ok(last);
        }
        Ok(Value::improper_list(items, last))
    });

    register_fn(env, "reverse", |_ctx, _env, args| {
        check_arity!(args, "reverse", 1);
        let mut items = args[0].list_to_vec()?;
        items.reverse();
        Ok(Value::list(items))
    });

    register_fn(env, "list-tail", |_ctx, _env, args| {
        check_arity!(args, "list-tail", 2);
        list_tail(&args[0], args[1].as_number()?.to_usize()?)
    });

    register_fn(env, "list-ref", |_ctx, _env, args| {
        check_arity!(args, "list-ref", 2);
        list_tail(&args[0], args[1].as_number()?.to_usize()?)?.car()
    });
}

fn list_tail(list: &Value, mut idx: usize) -> Result<Value, VesperError> {
    let mut next = list.clone();
    while idx > 0 {
        if next.is_null() {
            return Err(VesperError::eval("index not in range"));
        }
        next = next.cdr()?;
        idx -= 1;
    }
    Ok(next)
}
