use std::cell::Cell;

use vesper_core::Symbol;

/// One atomic step of the machine. Entry opcodes carry a keyword name and
/// are reachable from source; the `*Term`/`*Test`/`*Loop` opcodes are
/// continuation steps pushed by their entry opcode and consume the result
/// register.
///
/// Each step triggers at most one nested EVAL, so a continuation captured
/// between any two steps re-enters cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Return,
    Eval,
    Quote,
    Begin,
    And,
    AndTest,
    Or,
    OrTest,
    IfInit,
    IfTerm,
    Set,
    SetTerm,
    DefineInit,
    DefineTerm,
    MustDefineTerm,
    Lambda,
    Trace,
    Delay,
    CondInit,
    CondTest,
    Let,
    LetSeq,
    Letrec,
    Do,
    CallInit,
    CallLoop,
    CallTerm,
    EvalClosure,
    CallCc,
    CallCcAlias,
    EvalCallCc,
    QqInit,
}

/// Pre-interned handles for every symbol the machine compares against.
/// Special-form dispatch runs on every list expression, so these are
/// interned once and compared as keys rather than strings.
pub struct Keywords {
    pub begin: Symbol,
    pub quote: Symbol,
    pub and: Symbol,
    pub or: Symbol,
    pub set_bang: Symbol,
    pub if_: Symbol,
    pub lambda: Symbol,
    pub trace_bang: Symbol,
    pub define: Symbol,
    pub delay: Symbol,
    pub cond: Symbol,
    pub let_: Symbol,
    pub let_star: Symbol,
    pub letrec: Symbol,
    pub do_: Symbol,
    pub call_cc: Symbol,
    pub call_with_current_continuation: Symbol,
    pub quasiquote: Symbol,
    pub unquote: Symbol,
    pub unquote_splicing: Symbol,
    pub else_: Symbol,
    pub arrow: Symbol,
    pub cons: Symbol,
    pub append: Symbol,
    pub list_to_vector: Symbol,
}

impl Keywords {
    fn init() -> Self {
        Keywords {
            begin: Symbol::intern("begin"),
            quote: Symbol::intern("quote"),
            and: Symbol::intern("and"),
            or: Symbol::intern("or"),
            set_bang: Symbol::intern("set!"),
            if_: Symbol::intern("if"),
            lambda: Symbol::intern("lambda"),
            trace_bang: Symbol::intern("trace!"),
            define: Symbol::intern("define"),
            delay: Symbol::intern("delay"),
            cond: Symbol::intern("cond"),
            let_: Symbol::intern("let"),
            let_star: Symbol::intern("let*"),
            letrec: Symbol::intern("letrec"),
            do_: Symbol::intern("do"),
            call_cc: Symbol::intern("call/cc"),
            call_with_current_continuation: Symbol::intern("call-with-current-continuation"),
            quasiquote: Symbol::intern("quasiquote"),
            unquote: Symbol::intern("unquote"),
            unquote_splicing: Symbol::intern("unquote-splicing"),
            else_: Symbol::intern("else"),
            arrow: Symbol::intern("=>"),
            cons: Symbol::intern("cons"),
            append: Symbol::intern("append"),
            list_to_vector: Symbol::intern("list->vector"),
        }
    }
}

thread_local! {
    static KW: Cell<Option<&'static Keywords>> = const { Cell::new(None) };
}

pub fn keywords() -> &'static Keywords {
    KW.with(|cell| match cell.get() {
        Some(kw) => kw,
        None => {
            let kw: &'static Keywords = Box::leak(Box::new(Keywords::init()));
            cell.set(Some(kw));
            kw
        }
    })
}

impl Op {
    /// Map a list head to its entry opcode; misses become applications.
    pub fn lookup(sym: Symbol) -> Option<Op> {
        let kw = keywords();
        if sym == kw.begin {
            Some(Op::Begin)
        } else if sym == kw.quote {
            Some(Op::Quote)
        } else if sym == kw.and {
            Some(Op::And)
        } else if sym == kw.or {
            Some(Op::Or)
        } else if sym == kw.set_bang {
            Some(Op::Set)
        } else if sym == kw.if_ {
            Some(Op::IfInit)
        } else if sym == kw.lambda {
            Some(Op::Lambda)
        } else if sym == kw.trace_bang {
            Some(Op::Trace)
        } else if sym == kw.define {
            Some(Op::DefineInit)
        } else if sym == kw.delay {
            Some(Op::Delay)
        } else if sym == kw.cond {
            Some(Op::CondInit)
        } else if sym == kw.let_ {
            Some(Op::Let)
        } else if sym == kw.let_star {
            Some(Op::LetSeq)
        } else if sym == kw.letrec {
            Some(Op::Letrec)
        } else if sym == kw.do_ {
            Some(Op::Do)
        } else if sym == kw.call_cc {
            Some(Op::CallCcAlias)
        } else if sym == kw.call_with_current_continuation {
            Some(Op::CallCc)
        } else if sym == kw.quasiquote {
            Some(Op::QqInit)
        } else {
            None
        }
    }
}
