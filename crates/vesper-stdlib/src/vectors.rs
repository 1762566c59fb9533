use std::rc::Rc;

use vesper_core::{check_arity, Env, SchemeVector, Value, VesperError};

use crate::register_fn;

fn vector_index(vec: &SchemeVector, idx: &Value) -> Result<usize, VesperError> {
    let idx = idx.as_number()?.to_usize()?;
    if idx >= vec.len() {
        return Err(VesperError::eval(format!(
            "vector index {idx} out of range 0..{}",
            vec.len()
        )));
    }
    Ok(idx)
}

pub fn register(env: &Env) {
    register_fn(env, "vector?", |_ctx, _env, args| {
        check_arity!(args, "vector?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Vector(_))))
    });

    register_fn(env, "make-vector", |_ctx, _env, args| {
        check_arity!(args, "make-vector", 1..=2);
        let size = args[0].as_number()?.to_usize()?;
        let fill = args.get(1).cloned().unwrap_or(Value::Bool(false));
        Ok(Value::Vector(Rc::new(SchemeVector::new(vec![fill; size]))))
    });

    register_fn(env, "vector", |_ctx, _env, args| {
        Ok(Value::Vector(Rc::new(SchemeVector::new(args.to_vec()))))
    });

    register_fn(env, "vector-length", |_ctx, _env, args| {
        check_arity!(args, "vector-length", 1);
        Ok(Value::int(args[0].as_vector()?.len() as i64))
    });

    register_fn(env, "vector-ref", |_ctx, _env, args| {
        check_arity!(args, "vector-ref", 2);
        let vec = args[0].as_vector()?;
        let idx = vector_index(vec, &args[1])?;
        Ok(vec.items.borrow()[idx].clone())
    });

    register_fn(env, "vector-set!", |_ctx, _env, args| {
        check_arity!(args, "vector-set!", 3);
        let vec = args[0].as_vector()?;
        vec.assert_mutable()?;
        let idx = vector_index(vec, &args[1])?;
        vec.items.borrow_mut()[idx] = args[2].clone();
        Ok(Value::Void)
    });

    register_fn(env, "vector->list", |_ctx, _env, args| {
        check_arity!(args, "vector->list", 1);
        Ok(Value::list(args[0].as_vector()?.items.borrow().clone()))
    });

    register_fn(env, "list->vector", |_ctx, _env, args| {
        check_arity!(args, "list->vector", 1);
        Ok(Value::Vector(Rc::new(SchemeVector::new(
            args[0].list_to_vec()?,
        ))))
    });

    register_fn(env, "vector-fill!", |_ctx, _env, args| {
        check_arity!(args, "vector-fill!", 2);
        let vec = args[0].as_vector()?;
        vec.assert_mutable()?;
        for slot in vec.items.borrow_mut().iter_mut() {
            *slot = args[1].clone();
        }
        Ok(Value::Void)
    });
}
