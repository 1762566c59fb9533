use vesper_core::{Value, VesperError};
use vesper_vm::Interpreter;

/// Evaluate source in a fresh headless interpreter, panicking on error.
pub fn eval(input: &str) -> Value {
    let interp = Interpreter::headless();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval `{input}`: {e}"))
}

/// Evaluate and render the result in write notation.
pub fn eval_to_string(input: &str) -> String {
    eval(input).to_scheme()
}

/// Evaluate source expecting an error.
#[allow(dead_code)]
pub fn eval_err(input: &str) -> VesperError {
    let interp = Interpreter::headless();
    interp
        .eval_str(input)
        .expect_err(&format!("expected `{input}` to fail"))
}
