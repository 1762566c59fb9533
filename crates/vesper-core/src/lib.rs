pub mod context;
pub mod error;
pub mod number;
pub mod value;

pub use context::EvalContext;
pub use error::{Span, VesperError};
pub use number::Number;
pub use value::{
    intern, resolve, with_resolved, Closure, Continuation, Env, NativeFn, Pair, Port, PortKind,
    Promise, SchemeString, SchemeVector, Symbol, Value,
};
