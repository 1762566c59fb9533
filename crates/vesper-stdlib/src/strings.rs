use std::cmp::Ordering;
use std::rc::Rc;

use vesper_core::{check_arity, Env, SchemeString, Value, VesperError};

use crate::register_fn;

fn string_index(s: &SchemeString, idx: &Value) -> Result<usize, VesperError> {
    let idx = idx.as_number()?.to_usize()?;
    if idx >= s.len() {
        return Err(VesperError::eval(format!(
            "string index {idx} out of range 0..{}",
            s.len()
        )));
    }
    Ok(idx)
}

fn compare_strings(
    args: &[Value],
    name: &'static str,
    fold_case: bool,
    ok: impl Fn(Ordering) -> bool,
) -> Result<Value, VesperError> {
    check_arity!(args, name, 2);
    let mut a = args[0].as_str()?.chars.borrow().clone();
    let mut b = args[1].as_str()?.chars.borrow().clone();
    if fold_case {
        a = a.iter().flat_map(|c| c.to_lowercase()).collect();
        b = b.iter().flat_map(|c| c.to_lowercase()).collect();
    }
    Ok(Value::Bool(ok(a.cmp(&b))))
}

pub fn register(env: &Env) {
    register_fn(env, "string?", |_ctx, _env, args| {
        check_arity!(args, "string?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Str(_))))
    });

    register_fn(env, "make-string", |_ctx, _env, args| {
        check_arity!(args, "make-string", 1..=2);
        let size = args[0].as_number()?.to_usize()?;
        let fill = match args.get(1) {
            Some(c) => c.as_char()?,
            None => '\0',
        };
        let text: String = std::iter::repeat(fill).take(size).collect();
        Ok(Value::string(&text))
    });

    register_fn(env, "string", |_ctx, _env, args| {
        let mut text = String::new();
        for arg in args {
            text.push(arg.as_char()?);
        }
        Ok(Value::string(&text))
    });

    register_fn(env, "string-length", |_ctx, _env, args| {
        check_arity!(args, "string-length", 1);
        Ok(Value::int(args[0].as_str()?.len() as i64))
    });

    register_fn(env, "string-ref", |_ctx, _env, args| {
        check_arity!(args, "string-ref", 2);
        let s = args[0].as_str()?;
        let idx = string_index(s, &args[1])?;
        Ok(Value::Char(s.chars.borrow()[idx]))
    });

    register_fn(env, "string-set!", |_ctx, _env, args| {
        check_arity!(args, "string-set!", 3);
        let s = args[0].as_str()?;
        s.assert_mutable()?;
        let idx = string_index(s, &args[1])?;
        s.chars.borrow_mut()[idx] = args[2].as_char()?;
        Ok(Value::Void)
    });

    register_fn(env, "string=?", |_ctx, _env, args| {
        compare_strings(args, "string=?", false, |o| o == Ordering::Equal)
    });
    register_fn(env, "string<?", |_ctx, _env, args| {
        compare_strings(args, "string<?", false, |o| o == Ordering::Less)
    });
    register_fn(env, "string<=?", |_ctx, _env, args| {
        compare_strings(args, "string<=?", false, |o| o != Ordering::Greater)
    });
    register_fn(env, "string>?", |_ctx, _env, args| {
        compare_strings(args, "string>?", false, |o| o == Ordering::Greater)
    });
    register_fn(env, "string>=?", |_ctx, _env, args| {
        compare_strings(args, "string>=?", false, |o| o != Ordering::Less)
    });
    register_fn(env, "string-ci=?", |_ctx, _env, args| {
        compare_strings(args, "string-ci=?", true, |o| o == Ordering::Equal)
    });
    register_fn(env, "string-ci<?", |_ctx, _env, args| {
        compare_strings(args, "string-ci<?", true, |o| o == Ordering::Less)
    });
    register_fn(env, "string-ci<=?", |_ctx, _env, args| {
        compare_strings(args, "string-ci<=?", true, |o| o != Ordering::Greater)
    });
    register_fn(env, "string-ci>?", |_ctx, _env, args| {
        compare_strings(args, "string-ci>?", true, |o| o == Ordering::Greater)
    });
    register_fn(env, "string-ci>=?", |_ctx, _env, args| {
        compare_strings(args, "string-ci>=?", true, |o| o != Ordering::Less)
    });

    register_fn(env, "substring", |_ctx, _env, args| {
        check_arity!(args, "substring", 3);
        let s = args[0].as_str()?;
        let start = args[1].as_number()?.to_usize()?;
        let end = args[2].as_number()?.to_usize()?;
        let chars = s.chars.borrow();
        if start > end || end > chars.len() {
            return Err(VesperError::eval(format!(
                "substring range {start}..{end} out of bounds for length {}",
                chars.len()
            )));
        }
        let text: String = chars[start..end].iter().collect();
        Ok(Value::string(&text))
    });

    register_fn(env, "string-append", |_ctx, _env, args| {
        let mut text = String::new();
        for arg in args {
            text.push_str(&arg.as_str()?.to_utf8());
        }
        Ok(Value::string(&text))
    });

    register_fn(env, "string->list", |_ctx, _env, args| {
        check_arity!(args, "string->list", 1);
        let chars = args[0].as_str()?.chars.borrow().clone();
        Ok(Value::list(chars.into_iter().map(Value::Char).collect()))
    });

    register_fn(env, "list->string", |_ctx, _env, args| {
        check_arity!(args, "list->string", 1);
        let mut text = String::new();
        for item in args[0].list_to_vec()? {
            text.push(item.as_char()?);
        }
        Ok(Value::string(&text))
    });

    register_fn(env, "string-copy", |_ctx, _env, args| {
        check_arity!(args, "string-copy", 1);
        Ok(Value::Str(Rc::new(SchemeString::new(
            &args[0].as_str()?.to_utf8(),
        ))))
    });

    register_fn(env, "string-fill!", |_ctx, _env, args| {
        check_arity!(args, "string-fill!", 2);
        let s = args[0].as_str()?;
        s.assert_mutable()?;
        let fill = args[1].as_char()?;
        for slot in s.chars.borrow_mut().iter_mut() {
            *slot = fill;
        }
        Ok(Value::Void)
    });
}
