use vesper_core::{check_arity, Env, Value};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "eq?", |_ctx, _env, args| {
        check_arity!(args, "eq?", 2);
        Ok(Value::Bool(args[0].is_eq(&args[1])))
    });

    register_fn(env, "eqv?", |_ctx, _env, args| {
        check_arity!(args, "eqv?", 2);
        Ok(Value::Bool(args[0].is_eqv(&args[1])))
    });

    register_fn(env, "equal?", |_ctx, _env, args| {
        check_arity!(args, "equal?", 2);
        Ok(Value::Bool(args[0].is_equal(&args[1])))
    });

    register_fn(env, "not", |_ctx, _env, args| {
        check_arity!(args, "not", 1);
        Ok(Value::Bool(!args[0].is_truthy()))
    });

    register_fn(env, "boolean?", |_ctx, _env, args| {
        check_arity!(args, "boolean?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
    });
}
