use std::io::{Read, Write};
use std::rc::Rc;

use vesper_core::{Env, EvalContext, Port, Value, VesperError};

use crate::machine;

pub type EvalResult = Result<Value, VesperError>;

/// An instance of the interpreter: the global environment with every
/// builtin and the prelude loaded, plus the shared evaluation context.
pub struct Interpreter {
    pub global_env: Rc<Env>,
    pub ctx: EvalContext,
}

impl Interpreter {
    /// Start an interpreter on the given input and output streams. Closing
    /// the streams is the caller's responsibility.
    pub fn new(input: Box<dyn Read>, output: Box<dyn Write>) -> Self {
        let env = Rc::new(Env::new());
        vesper_stdlib::register_stdlib(&env);

        let ctx = EvalContext::new();
        ctx.set_eval_hook(machine::eval);
        ctx.set_apply_hook(machine::apply_procedure);
        *ctx.current_input.borrow_mut() = Value::Port(Rc::new(Port::input(input)));
        *ctx.current_output.borrow_mut() = Value::Port(Rc::new(Port::output(output)));

        let interpreter = Interpreter {
            global_env: env,
            ctx,
        };
        interpreter
            .eval_str(vesper_stdlib::PRELUDE)
            .expect("prelude must evaluate");
        interpreter
    }

    /// An interpreter wired to the process stdin/stdout.
    pub fn new_std() -> Self {
        Self::new(Box::new(std::io::stdin()), Box::new(std::io::stdout()))
    }

    /// An interpreter with an empty input and a discarding output.
    pub fn headless() -> Self {
        Self::new(Box::new(std::io::empty()), Box::new(std::io::sink()))
    }

    /// Evaluate one datum in the global environment.
    pub fn eval(&self, expr: &Value) -> EvalResult {
        machine::eval(&self.ctx, &self.global_env, expr)
    }

    /// Read and evaluate every datum in the source, returning the last
    /// value (or Void when the source is empty).
    pub fn eval_str(&self, input: &str) -> EvalResult {
        let exprs = vesper_reader::read_many(input)?;
        let mut result = Value::Void;
        for expr in &exprs {
            result = self.eval(expr)?;
        }
        Ok(result)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new_std()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> Value {
        Interpreter::headless()
            .eval_str(input)
            .unwrap_or_else(|e| panic!("failed to eval `{input}`: {e}"))
    }

    fn eval_to_string(input: &str) -> String {
        eval(input).to_scheme()
    }

    fn eval_err(input: &str) -> VesperError {
        Interpreter::headless()
            .eval_str(input)
            .expect_err(&format!("expected `{input}` to fail"))
    }

    #[test]
    fn self_evaluating_atoms() {
        assert_eq!(eval_to_string("42"), "42");
        assert_eq!(eval_to_string("#t"), "#t");
        assert_eq!(eval_to_string("\"hi\""), "\"hi\"");
        assert_eq!(eval_to_string("#\\a"), "#\\a");
        assert_eq!(eval_to_string("()"), "()");
    }

    #[test]
    fn quote_returns_datum() {
        assert_eq!(eval_to_string("'x"), "x");
        assert_eq!(eval_to_string("'(1 2 3)"), "(1 2 3)");
        assert_eq!(eval_to_string("''x"), "(quote x)");
    }

    #[test]
    fn if_branches() {
        assert_eq!(eval_to_string("(if #t 1 2)"), "1");
        assert_eq!(eval_to_string("(if #f 1 2)"), "2");
        // only #f is false
        assert_eq!(eval_to_string("(if 0 1 2)"), "1");
        assert_eq!(eval_to_string("(if '() 1 2)"), "1");
        assert_eq!(eval_to_string("(if #f 1)"), "#<void>");
    }

    #[test]
    fn define_and_set() {
        assert_eq!(eval_to_string("(define x 1) (set! x 2) x"), "2");
        assert!(matches!(
            eval_err("(set! unbound-here 1)"),
            VesperError::Unbound(_)
        ));
    }

    #[test]
    fn define_returns_the_symbol() {
        assert_eq!(eval_to_string("(define x 1)"), "x");
    }

    #[test]
    fn function_definitions() {
        assert_eq!(eval_to_string("(define (square x) (* x x)) (square 5)"), "25");
        assert_eq!(eval_to_string("((lambda (x y) (+ x y)) 3 4)"), "7");
        assert_eq!(eval_to_string("((lambda () 1 2 3))"), "3");
        assert_eq!(eval_to_string("((lambda v (apply + v)) 1 2 3 4 5)"), "15");
    }

    #[test]
    fn closure_arity_is_checked() {
        eval_err("((lambda (x) x))");
        eval_err("((lambda (x) x) 1 2)");
    }

    #[test]
    fn dotted_formals_are_rejected() {
        eval_err("(lambda (a . b) a)");
    }

    #[test]
    fn begin_sequences() {
        assert_eq!(eval_to_string("(begin 1 2 3)"), "3");
        assert_eq!(eval_to_string("(begin)"), "#<void>");
    }

    #[test]
    fn and_or_short_circuit() {
        assert_eq!(eval_to_string("(and)"), "#t");
        assert_eq!(eval_to_string("(and 1 2 3)"), "3");
        assert_eq!(eval_to_string("(and 1 #f (error \"unreached\"))"), "#f");
        assert_eq!(eval_to_string("(or)"), "#f");
        assert_eq!(eval_to_string("(or #f 2 (error \"unreached\"))"), "2");
        assert_eq!(eval_to_string("(or #f #f)"), "#f");
    }

    #[test]
    fn cond_clauses() {
        assert_eq!(
            eval_to_string("(cond ((= 1 2) 'a) ((= 1 1) 'b) (else 'c))"),
            "b"
        );
        assert_eq!(eval_to_string("(cond (#f 'a) (else 'c))"), "c");
        assert_eq!(eval_to_string("(cond (42))"), "42");
        assert_eq!(eval_to_string("(cond ((assv 'b '((a 1) (b 2))) => cadr) (else #f))"), "2");
        eval_err("(cond (else 'a) (#t 'b))");
    }

    #[test]
    fn let_family() {
        assert_eq!(eval_to_string("(let ((x 10) (y 20)) (+ x y))"), "30");
        assert_eq!(
            eval_to_string("(let ((x 2) (y 3)) (let ((x 7) (z (+ x y))) (* z x)))"),
            "35"
        );
        assert_eq!(
            eval_to_string("(let ((x 2) (y 3)) (let* ((x 7) (z (+ x y))) (* z x)))"),
            "70"
        );
        assert_eq!(
            eval_to_string(
                "(letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
                          (odd? (lambda (n) (if (= n 0) #f (even? (- n 1))))))
                   (even? 88))"
            ),
            "#t"
        );
        eval_err("(let ((x 1) (x 2)) x)");
    }

    #[test]
    fn named_let_loops() {
        assert_eq!(
            eval_to_string(
                "(let loop ((i 0) (sum 0)) (if (= i 10) sum (loop (+ i 1) (+ sum i))))"
            ),
            "45"
        );
    }

    #[test]
    fn do_loops() {
        assert_eq!(
            eval_to_string(
                "(do ((vec (make-vector 5)) (i 0 (+ i 1))) ((= i 5) vec) (vector-set! vec i i))"
            ),
            "#(0 1 2 3 4)"
        );
        assert_eq!(
            eval_to_string(
                "(let ((x '(1 3 5 7 9)))
                   (do ((x x (cdr x)) (sum 0 (+ sum (car x)))) ((null? x) sum)))"
            ),
            "25"
        );
    }

    #[test]
    fn tail_recursion_runs_in_constant_space() {
        assert_eq!(
            eval_to_string(
                "(define (f n) (if (= n 0) 'done (f (- n 1)))) (f 1000000)"
            ),
            "done"
        );
    }

    #[test]
    fn mutual_tail_recursion() {
        assert_eq!(
            eval_to_string(
                "(define (even? n) (if (= n 0) #t (odd? (- n 1))))
                 (define (odd? n) (if (= n 0) #f (even? (- n 1))))
                 (even? 100000)"
            ),
            "#t"
        );
    }

    #[test]
    fn deep_exact_arithmetic() {
        assert_eq!(
            eval_to_string(
                "(define (fact n) (if (<= n 1) 1 (* n (fact (- n 1))))) (fact 20)"
            ),
            "2432902008176640000"
        );
    }

    #[test]
    fn call_cc_escapes() {
        assert_eq!(
            eval_to_string("(call-with-current-continuation (lambda (k) (+ 1 2 (k 10) 20)))"),
            "10"
        );
        assert_eq!(
            eval_to_string("(+ 1 (call/cc (lambda (k) (+ 2 (k 3)))))"),
            "4"
        );
        // a continuation that is never invoked
        assert_eq!(eval_to_string("(call/cc (lambda (k) 42))"), "42");
    }

    #[test]
    fn call_cc_reenters() {
        // each (k 10) rewinds to the call/cc expression with a fresh value,
        // re-running the rest of the begin until n reaches 3
        assert_eq!(
            eval_to_string(
                "(define k #f)
                 (define n 0)
                 (begin
                   (call/cc (lambda (c) (set! k c) 0))
                   (set! n (+ n 1))
                   (if (< n 3) (k 10) n))"
            ),
            "3"
        );
    }

    #[test]
    fn quasiquote_scenarios() {
        assert_eq!(eval_to_string("`x"), "x");
        assert_eq!(eval_to_string("`(1 2)"), "(1 2)");
        assert_eq!(eval_to_string("`(1 ,(+ 1 1) ,@(list 3 4) 5)"), "(1 2 3 4 5)");
        assert_eq!(eval_to_string("`(1 ,@'(2 3) 4)"), "(1 2 3 4)");
        assert_eq!(eval_to_string("`#(1 ,(+ 1 1))"), "#(1 2)");
    }

    #[test]
    fn delay_and_force() {
        assert_eq!(eval_to_string("(force (delay (+ 1 2)))"), "3");
        assert_eq!(
            eval_to_string(
                "(define n 0)
                 (define p (delay (begin (set! n (+ n 1)) n)))
                 (force p)
                 (force p)"
            ),
            "1"
        );
    }

    #[test]
    fn stateful_counter_closure() {
        assert_eq!(
            eval_to_string(
                "(define c (let ((n 0)) (lambda () (set! n (+ n 1)) n))) (c) (c) (c)"
            ),
            "3"
        );
    }

    #[test]
    fn prelude_is_loaded() {
        assert_eq!(eval_to_string("(cadr '(1 2 3))"), "2");
        assert_eq!(eval_to_string("(cddddr '(1 2 3 4 5))"), "(5)");
        assert_eq!(eval_to_string("(memq 'b '(a b c))"), "(b c)");
        assert_eq!(eval_to_string("(member '(1) '((0) (1) (2)))"), "((1) (2))");
        assert_eq!(eval_to_string("(assq 'b '((a 1) (b 2)))"), "(b 2)");
        assert_eq!(eval_to_string("(memq 'z '(a b c))"), "#f");
    }

    #[test]
    fn identity_invariants() {
        assert_eq!(eval_to_string("(eq? 'foo (string->symbol \"FOO\"))"), "#t");
        assert_eq!(eval_to_string("(eq? (gensym) (gensym))"), "#f");
        assert_eq!(eval_to_string("(eqv? 1 1.0)"), "#f");
        assert_eq!(eval_to_string("(equal? '(1 (2)) '(1 (2)))"), "#t");
    }

    #[test]
    fn literal_mutation_is_rejected() {
        assert!(matches!(
            eval_err("(set-car! '(1 2) 9)"),
            VesperError::Immutable(_)
        ));
        assert_eq!(
            eval_to_string("(let ((v (make-vector 2 0))) (vector-set! v 0 9) v)"),
            "#(9 0)"
        );
    }

    #[test]
    fn evaluation_errors_surface() {
        assert!(matches!(eval_err("undefined-var"), VesperError::Unbound(_)));
        eval_err("(1 2 3)");
        eval_err("(error \"boom\")");
        eval_err("(car '())");
        eval_err("(/ 1 0)");
    }

    #[test]
    fn eval_str_returns_last_value() {
        assert_eq!(eval_to_string("1 2 3"), "3");
        assert_eq!(eval_to_string(""), "#<void>");
    }

    #[test]
    fn trace_toggles() {
        assert_eq!(eval_to_string("(trace! )"), "#t");
        assert_eq!(eval_to_string("(begin (trace!) (trace!))"), "#f");
    }
}
