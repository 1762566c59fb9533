mod interp;
mod machine;
mod ops;
mod quasiquote;

pub use interp::{EvalResult, Interpreter};
pub use machine::{apply_procedure, eval};
