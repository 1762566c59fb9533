use std::cmp::Ordering;

use vesper_core::{check_arity, Env, Number, Value, VesperError};

use crate::register_fn;

fn fold_numbers(
    args: &[Value],
    init: Number,
    f: impl Fn(&Number, &Number) -> Number,
) -> Result<Value, VesperError> {
    let mut acc = init;
    for arg in args {
        acc = f(&acc, arg.as_number()?);
    }
    Ok(Value::Number(acc))
}

fn chain_compare(
    args: &[Value],
    name: &'static str,
    ok: impl Fn(Ordering) -> bool,
) -> Result<Value, VesperError> {
    check_arity!(args, name, 1..);
    for pair in args.windows(2) {
        let a = pair[0].as_number()?;
        let b = pair[1].as_number()?;
        if !ok(a.compare(b)) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn register(env: &Env) {
    register_fn(env, "number?", |_ctx, _env, args| {
        check_arity!(args, "number?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Number(_))))
    });

    register_fn(env, "+", |_ctx, _env, args| {
        fold_numbers(args, Number::zero(), |a, b| a.add(b))
    });

    register_fn(env, "*", |_ctx, _env, args| {
        fold_numbers(args, Number::one(), |a, b| a.multiply(b))
    });

    register_fn(env, "-", |_ctx, _env, args| {
        check_arity!(args, "-", 1..);
        let first = args[0].as_number()?;
        if args.len() == 1 {
            return Ok(Value::Number(first.negate()));
        }
        fold_numbers(&args[1..], first.clone(), |a, b| a.subtract(b))
    });

    register_fn(env, "/", |_ctx, _env, args| {
        check_arity!(args, "/", 1..);
        let first = args[0].as_number()?;
        if args.len() == 1 {
            return Ok(Value::Number(first.reciprocal()?));
        }
        let mut acc = first.clone();
        for arg in &args[1..] {
            acc = acc.divide(arg.as_number()?)?;
        }
        Ok(Value::Number(acc))
    });

    register_fn(env, "=", |_ctx, _env, args| {
        chain_compare(args, "=", |ord| ord == Ordering::Equal)
    });
    register_fn(env, "<", |_ctx, _env, args| {
        chain_compare(args, "<", |ord| ord == Ordering::Less)
    });
    register_fn(env, "<=", |_ctx, _env, args| {
        chain_compare(args, "<=", |ord| ord != Ordering::Greater)
    });
    register_fn(env, ">", |_ctx, _env, args| {
        chain_compare(args, ">", |ord| ord == Ordering::Greater)
    });
    register_fn(env, ">=", |_ctx, _env, args| {
        chain_compare(args, ">=", |ord| ord != Ordering::Less)
    });

    register_fn(env, "min", |_ctx, _env, args| {
        check_arity!(args, "min", 1..);
        let mut best = args[0].as_number()?.clone();
        for arg in &args[1..] {
            let n = arg.as_number()?;
            if best.compare(n) == Ordering::Greater {
                best = n.clone();
            }
        }
        Ok(Value::Number(best))
    });

    register_fn(env, "max", |_ctx, _env, args| {
        check_arity!(args, "max", 1..);
        let mut best = args[0].as_number()?.clone();
        for arg in &args[1..] {
            let n = arg.as_number()?;
            if best.compare(n) == Ordering::Less {
                best = n.clone();
            }
        }
        Ok(Value::Number(best))
    });

    register_fn(env, "zero?", |_ctx, _env, args| {
        check_arity!(args, "zero?", 1);
        Ok(Value::Bool(args[0].as_number()?.is_zero()))
    });

    register_fn(env, "positive?", |_ctx, _env, args| {
        check_arity!(args, "positive?", 1);
        Ok(Value::Bool(args[0].as_number()?.signum() > 0))
    });

    register_fn(env, "negative?", |_ctx, _env, args| {
        check_arity!(args, "negative?", 1);
        Ok(Value::Bool(args[0].as_number()?.signum() < 0))
    });

    register_fn(env, "even?", |_ctx, _env, args| {
        check_arity!(args, "even?", 1);
        Ok(Value::Bool(args[0].as_number()?.is_even()?))
    });

    register_fn(env, "odd?", |_ctx, _env, args| {
        check_arity!(args, "odd?", 1);
        Ok(Value::Bool(!args[0].as_number()?.is_even()?))
    });

    register_fn(env, "integer?", |_ctx, _env, args| {
        check_arity!(args, "integer?", 1);
        Ok(Value::Bool(matches!(&args[0], Value::Number(n) if n.is_integer())))
    });

    // every number in the tower is rational, real, and complex
    register_fn(env, "rational?", |_ctx, _env, args| {
        check_arity!(args, "rational?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Number(_))))
    });

    register_fn(env, "real?", |_ctx, _env, args| {
        check_arity!(args, "real?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Number(_))))
    });

    register_fn(env, "complex?", |_ctx, _env, args| {
        check_arity!(args, "complex?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Number(_))))
    });

    register_fn(env, "exact?", |_ctx, _env, args| {
        check_arity!(args, "exact?", 1);
        Ok(Value::Bool(args[0].as_number()?.is_exact()))
    });

    register_fn(env, "inexact?", |_ctx, _env, args| {
        check_arity!(args, "inexact?", 1);
        Ok(Value::Bool(!args[0].as_number()?.is_exact()))
    });

    register_fn(env, "sqrt", |_ctx, _env, args| {
        check_arity!(args, "sqrt", 1);
        Ok(Value::Number(args[0].as_number()?.sqrt()?))
    });

    register_fn(env, "quotient", |_ctx, _env, args| {
        check_arity!(args, "quotient", 2);
        Ok(Value::Number(
            args[0].as_number()?.quotient(args[1].as_number()?)?,
        ))
    });

    register_fn(env, "remainder", |_ctx, _env, args| {
        check_arity!(args, "remainder", 2);
        Ok(Value::Number(
            args[0].as_number()?.remainder(args[1].as_number()?)?,
        ))
    });

    register_fn(env, "modulo", |_ctx, _env, args| {
        check_arity!(args, "modulo", 2);
        Ok(Value::Number(
            args[0].as_number()?.modulo(args[1].as_number()?)?,
        ))
    });

    register_fn(env, "abs", |_ctx, _env, args| {
        check_arity!(args, "abs", 1);
        Ok(Value::Number(args[0].as_number()?.abs()))
    });

    register_fn(env, "gcd", |_ctx, _env, args| {
        let mut acc = Number::zero();
        for arg in args {
            acc = acc.gcd(arg.as_number()?)?;
        }
        Ok(Value::Number(acc))
    });

    register_fn(env, "lcm", |_ctx, _env, args| {
        let mut acc = Number::one();
        for arg in args {
            acc = acc.lcm(arg.as_number()?)?;
        }
        Ok(Value::Number(acc))
    });

    register_fn(env, "numerator", |_ctx, _env, args| {
        check_arity!(args, "numerator", 1);
        Ok(Value::Number(args[0].as_number()?.numerator()?))
    });

    register_fn(env, "denominator", |_ctx, _env, args| {
        check_arity!(args, "denominator", 1);
        Ok(Value::Number(args[0].as_number()?.denominator()?))
    });

    register_fn(env, "string->number", |_ctx, _env, args| {
        check_arity!(args, "string->number", 1..=2);
        let text = args[0].as_str()?.to_utf8();
        let base = match args.get(1) {
            Some(b) => b.as_number()?.to_i64()?,
            None => 10,
        };
        if base != 10 {
            return Err(VesperError::eval(format!("unsupported base {base}")));
        }
        match Number::parse(&text, 10) {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => Ok(Value::Bool(false)),
        }
    });

    register_fn(env, "number->string", |_ctx, _env, args| {
        check_arity!(args, "number->string", 1);
        Ok(Value::string(&args[0].as_number()?.to_string()))
    });
}
