use std::cmp::Ordering;

use vesper_core::{check_arity, Env, Value, VesperError};

use crate::register_fn;

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn compare_chars(
    args: &[Value],
    name: &'static str,
    fold_case: bool,
    ok: impl Fn(Ordering) -> bool,
) -> Result<Value, VesperError> {
    check_arity!(args, name, 2);
    let mut a = args[0].as_char()?;
    let mut b = args[1].as_char()?;
    if fold_case {
        a = fold(a);
        b = fold(b);
    }
    Ok(Value::Bool(ok(a.cmp(&b))))
}

pub fn register(env: &Env) {
    register_fn(env, "char?", |_ctx, _env, args| {
        check_arity!(args, "char?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Char(_))))
    });

    register_fn(env, "char=?", |_ctx, _env, args| {
        compare_chars(args, "char=?", false, |o| o == Ordering::Equal)
    });
    register_fn(env, "char<?", |_ctx, _env, args| {
        compare_chars(args, "char<?", false, |o| o == Ordering::Less)
    });
    register_fn(env, "char<=?", |_ctx, _env, args| {
        compare_chars(args, "char<=?", false, |o| o != Ordering::Greater)
    });
    register_fn(env, "char>?", |_ctx, _env, args| {
        compare_chars(args, "char>?", false, |o| o == Ordering::Greater)
    });
    register_fn(env, "char>=?", |_ctx, _env, args| {
        compare_chars(args, "char>=?", false, |o| o != Ordering::Less)
    });
    register_fn(env, "char-ci=?", |_ctx, _env, args| {
        compare_chars(args, "char-ci=?", true, |o| o == Ordering::Equal)
    });
    register_fn(env, "char-ci<?", |_ctx, _env, args| {
        compare_chars(args, "char-ci<?", true, |o| o == Ordering::Less)
    });
    register_fn(env, "char-ci<=?", |_ctx, _env, args| {
        compare_chars(args, "char-ci<=?", true, |o| o != Ordering::Greater)
    });
    register_fn(env, "char-ci>?", |_ctx, _env, args| {
        compare_chars(args, "char-ci>?", true, |o| o == Ordering::Greater)
    });
    register_fn(env, "char-ci>=?", |_ctx, _env, args| {
        compare_chars(args, "char-ci>=?", true, |o| o != Ordering::Less)
    });

    register_fn(env, "char-alphabetic?", |_ctx, _env, args| {
        check_arity!(args, "char-alphabetic?", 1);
        Ok(Value::Bool(args[0].as_char()?.is_alphabetic()))
    });

    register_fn(env, "char-numeric?", |_ctx, _env, args| {
        check_arity!(args, "char-numeric?", 1);
        Ok(Value::Bool(args[0].as_char()?.is_numeric()))
    });

    register_fn(env, "char-whitespace?", |_ctx, _env, args| {
        check_arity!(args, "char-whitespace?", 1);
        Ok(Value::Bool(args[0].as_char()?.is_whitespace()))
    });

    register_fn(env, "char-upper-case?", |_ctx, _env, args| {
        check_arity!(args, "char-upper-case?", 1);
        Ok(Value::Bool(args[0].as_char()?.is_uppercase()))
    });

    register_fn(env, "char-lower-case?", |_ctx, _env, args| {
        check_arity!(args, "char-lower-case?", 1);
        Ok(Value::Bool(args[0].as_char()?.is_lowercase()))
    });

    register_fn(env, "char->integer", |_ctx, _env, args| {
        check_arity!(args, "char->integer", 1);
        Ok(Value::int(args[0].as_char()? as i64))
    });

    register_fn(env, "integer->char", |_ctx, _env, args| {
        check_arity!(args, "integer->char", 1);
        let code = args[0].as_number()?.to_i64()?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| VesperError::eval(format!("{code} is not a valid character code")))
    });

    register_fn(env, "char-upcase", |_ctx, _env, args| {
        check_arity!(args, "char-upcase", 1);
        let c = args[0].as_char()?;
        Ok(Value::Char(c.to_uppercase().next().unwrap_or(c)))
    });

    register_fn(env, "char-downcase", |_ctx, _env, args| {
        check_arity!(args, "char-downcase", 1);
        let c = args[0].as_char()?;
        Ok(Value::Char(c.to_lowercase().next().unwrap_or(c)))
    });
}
