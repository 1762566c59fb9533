use vesper_core::{check_arity, Env, EvalContext, Port, Value, VesperError};

use crate::register_fn;

/// Resolve the optional trailing port argument of the output procedures.
fn port_or_current_output(
    ctx: &EvalContext,
    arg: Option<&Value>,
) -> Result<Value, VesperError> {
    match arg {
        Some(port) => {
            port.as_port()?;
            Ok(port.clone())
        }
        None => Ok(ctx.current_output.borrow().clone()),
    }
}

fn port_or_current_input(ctx: &EvalContext, arg: Option<&Value>) -> Result<Value, VesperError> {
    match arg {
        Some(port) => {
            port.as_port()?;
            Ok(port.clone())
        }
        None => Ok(ctx.current_input.borrow().clone()),
    }
}

fn write_to(port: &Value, text: &str) -> Result<Value, VesperError> {
    port.as_port()?.write_str(text)?;
    Ok(Value::Void)
}

fn read_from(port: &Value) -> Result<&std::rc::Rc<Port>, VesperError> {
    port.as_port()
}

pub fn register(env: &Env) {
    register_fn(env, "port?", |_ctx, _env, args| {
        check_arity!(args, "port?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Port(_))))
    });

    register_fn(env, "input-port?", |_ctx, _env, args| {
        check_arity!(args, "input-port?", 1);
        Ok(Value::Bool(
            matches!(&args[0], Value::Port(p) if p.is_input()),
        ))
    });

    register_fn(env, "output-port?", |_ctx, _env, args| {
        check_arity!(args, "output-port?", 1);
        Ok(Value::Bool(
            matches!(&args[0], Value::Port(p) if p.is_output()),
        ))
    });

    register_fn(env, "current-input-port", |ctx, _env, args| {
        check_arity!(args, "current-input-port", 0);
        Ok(ctx.current_input.borrow().clone())
    });

    register_fn(env, "current-output-port", |ctx, _env, args| {
        check_arity!(args, "current-output-port", 0);
        Ok(ctx.current_output.borrow().clone())
    });

    register_fn(env, "newline", |ctx, _env, args| {
        check_arity!(args, "newline", 0..=1);
        let port = port_or_current_output(ctx, args.first())?;
        write_to(&port, "\n")
    });

    register_fn(env, "write-char", |ctx, _env, args| {
        check_arity!(args, "write-char", 1..=2);
        let c = args[0].as_char()?;
        let port = port_or_current_output(ctx, args.get(1))?;
        write_to(&port, &c.to_string())
    });

    register_fn(env, "write", |ctx, _env, args| {
        check_arity!(args, "write", 1..=2);
        let port = port_or_current_output(ctx, args.get(1))?;
        write_to(&port, &args[0].to_scheme())
    });

    register_fn(env, "display", |ctx, _env, args| {
        check_arity!(args, "display", 1..=2);
        let port = port_or_current_output(ctx, args.get(1))?;
        write_to(&port, &args[0].display_string())
    });

    register_fn(env, "read-char", |ctx, _env, args| {
        check_arity!(args, "read-char", 0..=1);
        let port = port_or_current_input(ctx, args.first())?;
        match read_from(&port)?.read_char()? {
            Some(c) => Ok(Value::Char(c)),
            None => Ok(Value::Eof),
        }
    });

    register_fn(env, "peek-char", |ctx, _env, args| {
        check_arity!(args, "peek-char", 0..=1);
        let port = port_or_current_input(ctx, args.first())?;
        match read_from(&port)?.peek_char()? {
            Some(c) => Ok(Value::Char(c)),
            None => Ok(Value::Eof),
        }
    });

    register_fn(env, "eof", |_ctx, _env, args| {
        check_arity!(args, "eof", 0);
        Ok(Value::Eof)
    });

    register_fn(env, "eof-object?", |_ctx, _env, args| {
        check_arity!(args, "eof-object?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Eof)))
    });

    register_fn(env, "void", |_ctx, _env, _args| Ok(Value::Void));

    register_fn(env, "void?", |_ctx, _env, args| {
        check_arity!(args, "void?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Void)))
    });
}
