use vesper_core::{check_arity, Env, Value, VesperError};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "procedure?", |_ctx, _env, args| {
        check_arity!(args, "procedure?", 1);
        Ok(Value::Bool(args[0].is_procedure()))
    });

    register_fn(env, "apply", |ctx, env, args| {
        check_arity!(args, "apply", 1..);
        let proc = &args[0];
        let rest = &args[1..];
        let call_args = match rest {
            [] => Vec::new(),
            [last] => last.list_to_vec()?,
            _ => {
                let mut out: Vec<Value> = rest[..rest.len() - 1].to_vec();
                out.extend(rest[rest.len() - 1].list_to_vec()?);
                out
            }
        };
        ctx.apply(env, proc, &call_args)
    });

    register_fn(env, "map", |ctx, env, args| {
        check_arity!(args, "map", 2..);
        let rows = argument_rows(&args[1..])?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(ctx.apply(env, &args[0], &row)?);
        }
        Ok(Value::list(out))
    });

    register_fn(env, "for-each", |ctx, env, args| {
        check_arity!(args, "for-each", 2..);
        for row in argument_rows(&args[1..])? {
            ctx.apply(env, &args[0], &row)?;
        }
        Ok(Value::Void)
    });

    register_fn(env, "force", |ctx, _env, args| {
        check_arity!(args, "force", 1);
        let Value::Promise(promise) = &args[0] else {
            return Err(VesperError::type_error("promise", args[0].type_name()));
        };
        if let Some(memo) = promise.forced.borrow().clone() {
            return Ok(memo);
        }
        let result = ctx.eval(&promise.env, &promise.body)?;
        *promise.forced.borrow_mut() = Some(result.clone());
        Ok(result)
    });

    register_fn(env, "error", |_ctx, _env, args| {
        check_arity!(args, "error", 1..);
        let mut message = args[0].display_string();
        for irritant in &args[1..] {
            message.push(' ');
            message.push_str(&irritant.to_scheme());
        }
        Err(VesperError::eval(message))
    });

    register_fn(env, "eval", |ctx, env, args| {
        check_arity!(args, "eval", 1);
        ctx.eval(env, &args[0])
    });

    register_fn(env, "exit", |_ctx, _env, args| {
        check_arity!(args, "exit", 0);
        std::process::exit(0);
    });
}

/// Transpose the argument lists of map/for-each into per-call argument rows,
/// erroring on length mismatches.
fn argument_rows(lists: &[Value]) -> Result<Vec<Vec<Value>>, VesperError> {
    let mut columns = Vec::with_capacity(lists.len());
    for list in lists {
        columns.push(list.list_to_vec()?);
    }
    let len = columns[0].len();
    if columns.iter().any(|c| c.len() != len) {
        return Err(VesperError::eval("mismatched list lengths"));
    }
    Ok((0..len)
        .map(|i| columns.iter().map(|c| c[i].clone()).collect())
        .collect())
}
