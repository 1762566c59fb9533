use std::cell::{Cell, RefCell};

use crate::error::VesperError;
use crate::value::{Env, Value};

pub type EvalHook = fn(&EvalContext, &Env, &Value) -> Result<Value, VesperError>;
pub type ApplyHook = fn(&EvalContext, &Env, &Value, &[Value]) -> Result<Value, VesperError>;

/// Per-interpreter state handed to every native procedure: the current
/// ports, the VM trace flag, and hooks back into the evaluator so builtins
/// like `map` and `force` can run Scheme procedures.
///
/// The hooks are installed by the interpreter at construction; the core
/// crate never depends on the evaluator.
pub struct EvalContext {
    pub current_input: RefCell<Value>,
    pub current_output: RefCell<Value>,
    pub trace: Cell<bool>,
    eval_hook: Cell<Option<EvalHook>>,
    apply_hook: Cell<Option<ApplyHook>>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            current_input: RefCell::new(Value::Void),
            current_output: RefCell::new(Value::Void),
            trace: Cell::new(false),
            eval_hook: Cell::new(None),
            apply_hook: Cell::new(None),
        }
    }

    pub fn set_eval_hook(&self, hook: EvalHook) {
        self.eval_hook.set(Some(hook));
    }

    pub fn set_apply_hook(&self, hook: ApplyHook) {
        self.apply_hook.set(Some(hook));
    }

    /// Evaluate an expression through the installed evaluator.
    pub fn eval(&self, env: &Env, expr: &Value) -> Result<Value, VesperError> {
        match self.eval_hook.get() {
            Some(hook) => hook(self, env, expr),
            None => Err(VesperError::eval("no evaluator installed")),
        }
    }

    /// Apply a procedure value to already-evaluated arguments.
    pub fn apply(&self, env: &Env, proc: &Value, args: &[Value]) -> Result<Value, VesperError> {
        match self.apply_hook.get() {
            Some(hook) => hook(self, env, proc, args),
            None => Err(VesperError::eval("no evaluator installed")),
        }
    }

    /// Write to the current output port.
    pub fn write_output(&self, text: &str) -> Result<(), VesperError> {
        let port = self.current_output.borrow();
        match &*port {
            Value::Port(p) => p.write_str(text),
            _ => Err(VesperError::Io("no current output port".to_string())),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
