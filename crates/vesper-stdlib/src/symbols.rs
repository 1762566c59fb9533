use vesper_core::{check_arity, Env, Symbol, Value};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "symbol?", |_ctx, _env, args| {
        check_arity!(args, "symbol?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
    });

    // interning folds case, so (eq? 'foo (string->symbol "FOO")) holds
    register_fn(env, "string->symbol", |_ctx, _env, args| {
        check_arity!(args, "string->symbol", 1);
        Ok(Value::symbol(&args[0].as_str()?.to_utf8()))
    });

    register_fn(env, "symbol->string", |_ctx, _env, args| {
        check_arity!(args, "symbol->string", 1);
        Ok(Value::string(&args[0].as_symbol()?.name()))
    });

    register_fn(env, "gensym", |_ctx, _env, args| {
        check_arity!(args, "gensym", 0);
        Ok(Value::Symbol(Symbol::uninterned("gensym-")))
    });
}
