mod arithmetic;
mod chars;
mod control;
mod equivalence;
mod io;
mod lists;
mod prelude;
mod strings;
mod symbols;
mod vectors;

use vesper_core::{Env, EvalContext, Symbol, Value, VesperError};

pub use prelude::PRELUDE;

/// Bind every builtin procedure into the environment.
pub fn register_stdlib(env: &Env) {
    equivalence::register(env);
    arithmetic::register(env);
    lists::register(env);
    vectors::register(env);
    strings::register(env);
    chars::register(env);
    symbols::register(env);
    control::register(env);
    io::register(env);
}

fn register_fn(
    env: &Env,
    name: &str,
    f: impl Fn(&EvalContext, &Env, &[Value]) -> Result<Value, VesperError> + 'static,
) {
    env.define(Symbol::intern(name), Value::builtin(name, f));
}
