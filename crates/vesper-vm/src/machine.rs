use std::rc::Rc;

use vesper_core::{
    Closure, Continuation, Env, EvalContext, Promise, Symbol, Value, VesperError,
};

use crate::ops::{keywords, Op};
use crate::quasiquote::expand_qq;

/// One suspended step of the computation: the opcode to run, its arguments,
/// and the environment in effect.
#[derive(Debug, Clone)]
pub struct Frame {
    pub env: Env,
    pub op: Op,
    pub args: Vec<Value>,
}

/// Evaluate an expression. The host call stack is never used for Scheme
/// recursion: the machine pushes frames onto its own stack, so tail calls
/// run in constant space and `call/cc` can snapshot the whole computation.
pub fn eval(ctx: &EvalContext, env: &Env, expr: &Value) -> Result<Value, VesperError> {
    run(
        ctx,
        vec![
            Frame {
                env: env.clone(),
                op: Op::Return,
                args: vec![],
            },
            Frame {
                env: env.clone(),
                op: Op::Eval,
                args: vec![expr.clone()],
            },
        ],
    )
}

/// Apply an already-evaluated procedure to evaluated arguments. Builtins run
/// directly; closures and continuations prime a fresh machine.
pub fn apply_procedure(
    ctx: &EvalContext,
    env: &Env,
    proc: &Value,
    args: &[Value],
) -> Result<Value, VesperError> {
    match proc {
        Value::Builtin(f) => (f.func)(ctx, env, args),
        Value::Closure(_) => run(
            ctx,
            vec![
                Frame {
                    env: env.clone(),
                    op: Op::Return,
                    args: vec![],
                },
                Frame {
                    env: env.clone(),
                    op: Op::EvalClosure,
                    args: vec![proc.clone(), Value::list(args.to_vec())],
                },
            ],
        ),
        Value::Continuation(_) => run(
            ctx,
            vec![
                Frame {
                    env: env.clone(),
                    op: Op::Return,
                    args: vec![],
                },
                Frame {
                    env: env.clone(),
                    op: Op::EvalCallCc,
                    args: vec![proc.clone(), Value::list(args.to_vec())],
                },
            ],
        ),
        other => Err(VesperError::eval(format!(
            "{} can't be evaluated",
            other.to_scheme()
        ))),
    }
}

/// Continue evaluation at a new frame.
fn jmp(stack: &mut Vec<Frame>, env: &Env, op: Op, args: Vec<Value>) {
    stack.push(Frame {
        env: env.clone(),
        op,
        args,
    });
}

/// Push a continuation frame that consumes the result register once the
/// chain jumped to afterwards completes. Push the ret first, then the jmp:
/// LIFO order makes the jumped-to frame run first.
fn push_ret(stack: &mut Vec<Frame>, env: &Env, op: Op, args: Vec<Value>) {
    stack.push(Frame {
        env: env.clone(),
        op,
        args,
    });
}

fn take_result(result: &Option<Value>) -> Result<Value, VesperError> {
    result
        .clone()
        .ok_or_else(|| VesperError::eval("bad state: opcode needs a result"))
}

/// The evaluation loop: pop a frame, execute it, repeat until RETURN.
///
/// Every step triggers at most one nested EVAL, so the stack is a valid
/// continuation between any two steps. Entry points prime the stack with a
/// RETURN frame followed by the frame to run.
fn run(ctx: &EvalContext, mut stack: Vec<Frame>) -> Result<Value, VesperError> {
    let kw = keywords();
    let mut result: Option<Value> = None;

    while let Some(frame) = stack.pop() {
        if ctx.trace.get() {
            let args: Vec<String> = frame.args.iter().map(|a| a.to_scheme()).collect();
            let ret = result.as_ref().map(|v| v.to_scheme()).unwrap_or_default();
            eprintln!(
                "TRACE: {:pad$}{:?} args: [{}] ret: {}",
                "",
                frame.op,
                args.join(", "),
                ret,
                pad = stack.len()
            );
        }

        match frame.op {
            // exit the loop with the result register
            Op::Return => return Ok(result.unwrap_or(Value::Void)),

            Op::Eval => {
                let node = &frame.args[0];
                match node {
                    Value::Symbol(sym) => {
                        result = Some(frame.env.lookup(*sym)?);
                    }
                    Value::Pair(_) => {
                        let items = node
                            .list_to_vec()
                            .map_err(|_| VesperError::eval("can't evaluate pairs, only lists"))?;
                        let mut dispatched = false;
                        if let Value::Symbol(head) = &items[0] {
                            if let Some(op) = Op::lookup(*head) {
                                jmp(&mut stack, &frame.env, op, items[1..].to_vec());
                                dispatched = true;
                            }
                        }
                        if !dispatched {
                            jmp(&mut stack, &frame.env, Op::CallInit, vec![node.clone()]);
                        }
                    }
                    // everything else, the empty list included, is itself
                    other => {
                        result = Some(other.clone());
                    }
                }
            }

            Op::Quote => {
                if frame.args.len() != 1 {
                    return Err(VesperError::arity("quote", "1", frame.args.len()));
                }
                result = Some(frame.args[0].clone());
            }

            Op::Begin => {
                if frame.args.is_empty() {
                    result = Some(Value::Void);
                } else {
                    // no ret behind the last expression: tail position
                    if frame.args.len() > 1 {
                        push_ret(&mut stack, &frame.env, Op::Begin, frame.args[1..].to_vec());
                    }
                    jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[0].clone()]);
                }
            }

            Op::And => and_or_step(&mut stack, &frame, &mut result, true),
            Op::AndTest => {
                let res = take_result(&result)?;
                if !res.is_truthy() {
                    result = Some(res);
                } else {
                    and_or_step(&mut stack, &frame, &mut result, true);
                }
            }

            Op::Or => and_or_step(&mut stack, &frame, &mut result, false),
            Op::OrTest => {
                let res = take_result(&result)?;
                if res.is_truthy() {
                    result = Some(res);
                } else {
                    and_or_step(&mut stack, &frame, &mut result, false);
                }
            }

            Op::IfInit => {
                if frame.args.len() < 2 || frame.args.len() > 3 {
                    return Err(VesperError::arity("if", "2-3", frame.args.len()));
                }
                push_ret(&mut stack, &frame.env, Op::IfTerm, frame.args[1..].to_vec());
                jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[0].clone()]);
            }

            Op::IfTerm => {
                let res = take_result(&result)?;
                if res.is_truthy() {
                    jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[0].clone()]);
                } else if frame.args.len() > 1 {
                    jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[1].clone()]);
                } else {
                    result = Some(Value::Void);
                }
            }

            Op::Set => {
                if frame.args.len() != 2 {
                    return Err(VesperError::arity("set!", "2", frame.args.len()));
                }
                push_ret(&mut stack, &frame.env, Op::SetTerm, vec![frame.args[0].clone()]);
                jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[1].clone()]);
            }

            Op::SetTerm => {
                let sym = frame.args[0].as_symbol()?;
                let res = take_result(&result)?;
                // the replaced value is the result, unspecified by R5RS
                result = Some(frame.env.replace(sym, res)?);
            }

            Op::DefineInit => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("define", "2+", frame.args.len()));
                }
                match &frame.args[0] {
                    Value::Symbol(sym) => {
                        if frame.args.len() != 2 {
                            return Err(VesperError::arity("define", "2", frame.args.len()));
                        }
                        push_ret(
                            &mut stack,
                            &frame.env,
                            Op::DefineTerm,
                            vec![Value::Symbol(*sym)],
                        );
                        jmp(&mut stack, &frame.env, Op::Eval, vec![frame.args[1].clone()]);
                    }
                    // (define (f p...) body...) is sugar for a lambda
                    Value::Pair(sig) => {
                        let name = sig.car.borrow().clone();
                        let formals = sig.cdr.borrow().clone();
                        name.as_symbol()?;
                        push_ret(&mut stack, &frame.env, Op::DefineTerm, vec![name]);
                        let mut lambda_args = vec![formals];
                        lambda_args.extend_from_slice(&frame.args[1..]);
                        jmp(&mut stack, &frame.env, Op::Lambda, lambda_args);
                    }
                    other => {
                        return Err(VesperError::eval(format!(
                            "can't define {}",
                            other.to_scheme()
                        )))
                    }
                }
            }

            Op::DefineTerm => {
                let sym = frame.args[0].as_symbol()?;
                frame.env.define(sym, take_result(&result)?);
                result = Some(Value::Symbol(sym));
            }

            // like DefineTerm, but rejects rebinding in the same frame
            Op::MustDefineTerm => {
                let sym = frame.args[0].as_symbol()?;
                if frame.env.define(sym, take_result(&result)?).is_some() {
                    return Err(VesperError::eval(format!(
                        "can't define {sym} more than once"
                    )));
                }
                result = Some(Value::Symbol(sym));
            }

            Op::Lambda => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("lambda", "2+", frame.args.len()));
                }
                let closure = build_closure(&frame.env, &frame.args[0], &frame.args[1..])?;
                result = Some(closure);
            }

            Op::Trace => {
                let state = !ctx.trace.get();
                ctx.trace.set(state);
                result = Some(Value::Bool(state));
            }

            Op::Delay => {
                if frame.args.len() != 1 {
                    return Err(VesperError::arity("delay", "1", frame.args.len()));
                }
                result = Some(Value::Promise(Rc::new(Promise {
                    env: frame.env.clone(),
                    body: frame.args[0].clone(),
                    forced: std::cell::RefCell::new(None),
                })));
            }

            Op::CondInit => {
                if frame.args.is_empty() {
                    return Err(VesperError::arity("cond", "1+", 0));
                }
                let clause = &frame.args[0];
                if !matches!(clause, Value::Pair(_)) {
                    return Err(VesperError::eval("malformed cond"));
                }
                let items = clause.list_to_vec()?;
                let test = items[0].clone();
                if matches!(&test, Value::Symbol(s) if *s == kw.else_) {
                    if frame.args.len() > 1 {
                        return Err(VesperError::eval("else must be final test of cond"));
                    }
                    if items.len() == 1 {
                        return Err(VesperError::eval("else missing expressions"));
                    }
                    jmp(&mut stack, &frame.env, Op::Begin, items[1..].to_vec());
                } else {
                    push_ret(&mut stack, &frame.env, Op::CondTest, frame.args.clone());
                    jmp(&mut stack, &frame.env, Op::Eval, vec![test]);
                }
            }

            Op::CondTest => {
                let clause = frame.args[0].list_to_vec()?;
                let res = take_result(&result)?;
                if res.is_truthy() {
                    if clause.len() == 1 {
                        result = Some(res);
                    } else if matches!(&clause[1], Value::Symbol(s) if *s == kw.arrow) {
                        if clause.len() != 3 {
                            return Err(VesperError::eval("cond => requires a single receiver"));
                        }
                        // call the receiver with the test value
                        let quoted = Value::list(vec![Value::Symbol(kw.quote), res]);
                        let invocation = Value::list(vec![clause[2].clone(), quoted]);
                        jmp(&mut stack, &frame.env, Op::Eval, vec![invocation]);
                    } else {
                        jmp(&mut stack, &frame.env, Op::Begin, clause[1..].to_vec());
                    }
                } else if frame.args.len() > 1 {
                    jmp(&mut stack, &frame.env, Op::CondInit, frame.args[1..].to_vec());
                } else {
                    result = Some(Value::Null);
                }
            }

            Op::Let => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("let", "2+", frame.args.len()));
                }
                let body_env = Env::with_parent(Rc::new(frame.env.clone()));
                match &frame.args[0] {
                    // (let ((x e)...) body...)
                    Value::Pair(_) | Value::Null => {
                        let body = frame.args[1..].to_vec();
                        push_ret(&mut stack, &body_env, Op::Begin, body);
                        resolve_let(
                            &mut stack,
                            &frame.env,
                            &body_env,
                            false,
                            false,
                            &frame.args[0],
                        )?;
                    }
                    // (let name ((x e)...) body...) recurses through name
                    Value::Symbol(name) => {
                        if frame.args.len() < 3 {
                            return Err(VesperError::arity("let", "3+", frame.args.len()));
                        }
                        let body = frame.args[2..].to_vec();
                        push_ret(&mut stack, &body_env, Op::Begin, body.clone());
                        let params = resolve_let(
                            &mut stack,
                            &frame.env,
                            &body_env,
                            false,
                            false,
                            &frame.args[1],
                        )?;
                        let closure = Value::Closure(Rc::new(Closure {
                            env: body_env.clone(),
                            params,
                            variadic: false,
                            body,
                        }));
                        body_env.define(*name, closure);
                    }
                    _ => {
                        return Err(VesperError::eval(
                            "second arg must be a symbol or list",
                        ))
                    }
                }
            }

            Op::LetSeq => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("let*", "2+", frame.args.len()));
                }
                let body_env = Env::with_parent(Rc::new(frame.env.clone()));
                push_ret(&mut stack, &body_env, Op::Begin, frame.args[1..].to_vec());
                // each init sees the bindings before it
                resolve_let(&mut stack, &body_env, &body_env, true, false, &frame.args[0])?;
            }

            Op::Letrec => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("letrec", "2+", frame.args.len()));
                }
                let body_env = Env::with_parent(Rc::new(frame.env.clone()));
                push_ret(&mut stack, &body_env, Op::Begin, frame.args[1..].to_vec());
                // names pre-declared so the inits can close over each other
                resolve_let(&mut stack, &body_env, &body_env, true, true, &frame.args[0])?;
            }

            Op::Do => {
                if frame.args.len() < 2 {
                    return Err(VesperError::arity("do", "2+", frame.args.len()));
                }
                let (defns, body) = expand_do(&frame.args)?;
                jmp(&mut stack, &frame.env, Op::Letrec, vec![defns, body]);
            }

            Op::CallInit => {
                let pair = frame.args[0].as_pair()?;
                let operator = pair.car.borrow().clone();
                let operands = pair.cdr.borrow().clone();
                push_ret(&mut stack, &frame.env, Op::CallTerm, vec![]);
                push_ret(
                    &mut stack,
                    &frame.env,
                    Op::CallLoop,
                    vec![operands, Value::Null],
                );
                jmp(&mut stack, &frame.env, Op::Eval, vec![operator]);
            }

            Op::CallLoop => {
                let unevaluated = frame.args[0].clone();
                // evaluated values accumulate reversed; CallTerm sees them
                // restored to call order
                let out = Value::cons(take_result(&result)?, frame.args[1].clone());
                if unevaluated.is_null() {
                    let mut items = out.list_to_vec()?;
                    items.reverse();
                    result = Some(Value::list(items));
                } else {
                    let pair = unevaluated.as_pair()?;
                    let next = pair.car.borrow().clone();
                    let rest = pair.cdr.borrow().clone();
                    push_ret(&mut stack, &frame.env, Op::CallLoop, vec![rest, out]);
                    jmp(&mut stack, &frame.env, Op::Eval, vec![next]);
                }
            }

            Op::CallTerm => {
                let call_list = take_result(&result)?.list_to_vec()?;
                let proc = call_list[0].clone();
                let operands = call_list[1..].to_vec();
                match &proc {
                    Value::Continuation(_) => jmp(
                        &mut stack,
                        &frame.env,
                        Op::EvalCallCc,
                        vec![proc.clone(), Value::list(operands)],
                    ),
                    Value::Closure(_) => jmp(
                        &mut stack,
                        &frame.env,
                        Op::EvalClosure,
                        vec![proc.clone(), Value::list(operands)],
                    ),
                    Value::Builtin(f) => {
                        result = Some((f.func)(ctx, &frame.env, &operands)?);
                    }
                    other => {
                        return Err(VesperError::eval(format!(
                            "{} can't be evaluated",
                            other.to_scheme()
                        )))
                    }
                }
            }

            Op::EvalClosure => {
                let Value::Closure(closure) = &frame.args[0] else {
                    return Err(VesperError::type_error(
                        "procedure",
                        frame.args[0].type_name(),
                    ));
                };
                let call_args = frame.args[1].list_to_vec()?;
                let proc_scope = bind_closure_args(closure, &call_args)?;
                // the body runs as a plain jmp: closure calls are tail calls
                jmp(&mut stack, &proc_scope, Op::Begin, closure.body.clone());
            }

            Op::EvalCallCc => {
                let Value::Continuation(cont) = &frame.args[0] else {
                    return Err(VesperError::type_error(
                        "continuation",
                        frame.args[0].type_name(),
                    ));
                };
                let call_args = frame.args[1].list_to_vec()?;
                if call_args.len() != 1 {
                    return Err(VesperError::arity("continuation", "1", call_args.len()));
                }
                let saved = cont
                    .state
                    .downcast_ref::<Vec<Frame>>()
                    .ok_or_else(|| VesperError::eval("corrupt continuation"))?;
                // re-enter the captured computation with the argument as
                // the value the call/cc expression produces
                stack.clear();
                stack.extend(saved.iter().cloned());
                result = Some(call_args[0].clone());
            }

            Op::CallCc | Op::CallCcAlias => {
                if frame.args.len() != 1 {
                    return Err(VesperError::arity("call/cc", "1", frame.args.len()));
                }
                let snapshot = Continuation {
                    state: Rc::new(stack.clone()),
                };
                let call = Value::list(vec![
                    frame.args[0].clone(),
                    Value::Continuation(Rc::new(snapshot)),
                ]);
                jmp(&mut stack, &frame.env, Op::Eval, vec![call]);
            }

            Op::QqInit => {
                if frame.args.len() != 1 {
                    return Err(VesperError::arity("quasiquote", "1", frame.args.len()));
                }
                let expanded = expand_qq(&frame.args[0], 0)?;
                jmp(&mut stack, &frame.env, Op::Eval, vec![expanded]);
            }
        }
    }

    Err(VesperError::eval("stack underflow"))
}

fn and_or_step(stack: &mut Vec<Frame>, frame: &Frame, result: &mut Option<Value>, is_and: bool) {
    if frame.args.is_empty() {
        *result = Some(Value::Bool(is_and));
        return;
    }
    if frame.args.len() > 1 {
        push_ret(
            stack,
            &frame.env,
            if is_and { Op::AndTest } else { Op::OrTest },
            frame.args[1..].to_vec(),
        );
    }
    jmp(stack, &frame.env, Op::Eval, vec![frame.args[0].clone()]);
}

/// Interpret lambda formals: a lone symbol collects the whole argument
/// list, a proper list of symbols is fixed arity. Dotted formals are
/// rejected.
fn build_closure(env: &Env, formals: &Value, body: &[Value]) -> Result<Value, VesperError> {
    let (params, variadic) = match formals {
        Value::Symbol(s) => (vec![*s], true),
        Value::Null => (vec![], false),
        Value::Pair(_) => {
            if !formals.is_list() {
                return Err(VesperError::eval("improper lists not yet supported"));
            }
            let mut params = Vec::new();
            for formal in formals.list_to_vec()? {
                params.push(formal.as_symbol()?);
            }
            (params, false)
        }
        other => {
            return Err(VesperError::eval(format!(
                "{} not allowed as first argument to lambda",
                other.to_scheme()
            )))
        }
    };
    Ok(Value::Closure(Rc::new(Closure {
        env: env.clone(),
        params,
        variadic,
        body: body.to_vec(),
    })))
}

/// Extend a closure's defining scope with its call arguments, checking
/// arity and collecting variadic tails.
fn bind_closure_args(closure: &Closure, call_args: &[Value]) -> Result<Env, VesperError> {
    let scope = Env::with_parent(Rc::new(closure.env.clone()));
    let mut required = closure.params.len();
    if closure.variadic {
        required -= 1;
    }
    if call_args.len() < required {
        return Err(VesperError::eval(format!(
            "expected at least {required} args, got {}",
            call_args.len()
        )));
    }
    if call_args.len() > required && !closure.variadic {
        return Err(VesperError::eval(format!(
            "expected at most {required} args, got {}",
            call_args.len()
        )));
    }
    for (param, arg) in closure.params[..required].iter().zip(call_args.iter()) {
        scope.define(*param, arg.clone());
    }
    if closure.variadic {
        scope.define(
            closure.params[required],
            Value::list(call_args[required..].to_vec()),
        );
    }
    Ok(scope)
}

/// Push the binding frames of a let form. Inits resolve in `resolve_in` and
/// their values bind into `define_in`; pushed reversed so the first binding
/// evaluates first. letrec pre-declares every name to () so the inits can
/// reference one another.
fn resolve_let(
    stack: &mut Vec<Frame>,
    resolve_in: &Env,
    define_in: &Env,
    allow_duplicates: bool,
    pre_declare: bool,
    defns: &Value,
) -> Result<Vec<Symbol>, VesperError> {
    let mut entries = Vec::new();
    for defn in defns.list_to_vec()? {
        let parts = defn.list_to_vec()?;
        if parts.len() != 2 {
            return Err(VesperError::eval("binding must be a (name value) pair"));
        }
        entries.push((parts[0].as_symbol()?, parts[1].clone()));
    }

    let names: Vec<Symbol> = entries.iter().map(|(name, _)| *name).collect();

    let term = if allow_duplicates {
        Op::DefineTerm
    } else {
        Op::MustDefineTerm
    };
    for (name, expr) in entries.iter().rev() {
        push_ret(stack, define_in, term, vec![Value::Symbol(*name)]);
        push_ret(stack, resolve_in, Op::Eval, vec![expr.clone()]);
    }

    if pre_declare {
        for (name, _) in &entries {
            push_ret(stack, define_in, Op::DefineTerm, vec![Value::Symbol(*name)]);
            push_ret(stack, define_in, Op::Eval, vec![Value::Null]);
        }
    }

    Ok(names)
}

/// Expand `(do ((v i s)...) (test result...) cmd...)` into a letrec-bound
/// loop procedure and its initial call.
fn expand_do(args: &[Value]) -> Result<(Value, Value), VesperError> {
    let kw = keywords();

    let mut names = Vec::new();
    let mut inits = Vec::new();
    let mut steps = Vec::new();
    for binding in args[0].list_to_vec()? {
        let parts = binding.list_to_vec()?;
        if parts.len() < 2 || parts.len() > 3 {
            return Err(VesperError::eval("do binding must be (var init step)"));
        }
        parts[0].as_symbol()?;
        names.push(parts[0].clone());
        inits.push(parts[1].clone());
        // a binding without a step keeps its value across iterations
        steps.push(parts.get(2).cloned().unwrap_or_else(|| parts[0].clone()));
    }

    let until = args[1].list_to_vec()?;
    if until.is_empty() {
        return Err(VesperError::eval("do missing test"));
    }
    let test = until[0].clone();
    let results = until[1..].to_vec();
    let commands = args[2..].to_vec();

    let loop_sym = Value::Symbol(Symbol::uninterned("do-"));

    let lambda = form(
        Value::Symbol(kw.lambda),
        vec![
            Value::list(names),
            form(
                Value::Symbol(kw.if_),
                vec![
                    test,
                    form(Value::Symbol(kw.begin), results),
                    form(
                        Value::Symbol(kw.begin),
                        vec![
                            form(Value::Symbol(kw.begin), commands),
                            form(loop_sym.clone(), steps),
                        ],
                    ),
                ],
            ),
        ],
    );

    let defns = Value::list(vec![Value::list(vec![loop_sym.clone(), lambda])]);
    let body = form(loop_sym, inits);
    Ok((defns, body))
}

fn form(head: Value, mut rest: Vec<Value>) -> Value {
    let mut items = vec![head];
    items.append(&mut rest);
    Value::list(items)
}
