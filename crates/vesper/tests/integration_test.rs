mod common;

use common::{eval, eval_err, eval_to_string};
use vesper_core::{Value, VesperError};

#[test]
fn test_arithmetic() {
    assert_eq!(eval("(+ 1 2)"), Value::int(3));
    assert_eq!(eval("(- 10 3)"), Value::int(7));
    assert_eq!(eval("(* 4 5)"), Value::int(20));
    assert_eq!(eval("(- 5)"), Value::int(-5));
    assert_eq!(eval("(+)"), Value::int(0));
    assert_eq!(eval("(*)"), Value::int(1));
    assert_eq!(eval_to_string("(/ 10 2)"), "5");
    assert_eq!(eval_to_string("(/ 6 4)"), "3/2");
    assert_eq!(eval_to_string("(/ 2)"), "1/2");
}

#[test]
fn test_rational_closure_under_division() {
    // (/ a b) stays exact: cross-product equal, lowest terms, positive denominator
    assert_eq!(eval_to_string("(* (/ 6 4) 4)"), "6");
    assert_eq!(eval_to_string("(/ 1 -2)"), "-1/2");
    assert_eq!(eval_to_string("(numerator (/ 6 4))"), "3");
    assert_eq!(eval_to_string("(denominator (/ 6 4))"), "2");
    assert_eq!(eval_to_string("(exact? (/ 1 3))"), "#t");
}

#[test]
fn test_inexact_arithmetic() {
    assert_eq!(eval_to_string("(exact? 1.5)"), "#f");
    assert_eq!(eval_to_string("(inexact? (sqrt 4))"), "#t");
    assert_eq!(eval_to_string("(integer? 2.0)"), "#t");
    assert_eq!(eval_to_string("(= (/ 1 2) 0.5)"), "#t");
}

#[test]
fn test_comparison_chains() {
    assert_eq!(eval("(< 1 2 3)"), Value::Bool(true));
    assert_eq!(eval("(< 1 3 2)"), Value::Bool(false));
    assert_eq!(eval("(<= 2 2 3)"), Value::Bool(true));
    assert_eq!(eval("(= 42 42)"), Value::Bool(true));
    assert_eq!(eval("(> 3 2 1)"), Value::Bool(true));
    assert_eq!(eval("(max 1 5 3)"), Value::int(5));
    assert_eq!(eval("(min 4 2 7)"), Value::int(2));
}

#[test]
fn test_quotient_remainder_modulo() {
    assert_eq!(eval_to_string("(quotient 7 2)"), "3");
    assert_eq!(eval_to_string("(quotient -7 2)"), "-3");
    assert_eq!(eval_to_string("(remainder 7 -2)"), "1");
    assert_eq!(eval_to_string("(remainder -7 2)"), "-1");
    assert_eq!(eval_to_string("(modulo 7 -2)"), "-1");
    assert_eq!(eval_to_string("(modulo -7 2)"), "1");
    assert_eq!(eval_to_string("(modulo 7 2)"), "1");
    eval_err("(quotient 1 0)");
}

#[test]
fn test_number_predicates() {
    assert_eq!(eval_to_string("(zero? 0)"), "#t");
    assert_eq!(eval_to_string("(positive? 3)"), "#t");
    assert_eq!(eval_to_string("(negative? -3)"), "#t");
    assert_eq!(eval_to_string("(even? 4)"), "#t");
    assert_eq!(eval_to_string("(odd? 3)"), "#t");
    assert_eq!(eval_to_string("(number? 1)"), "#t");
    assert_eq!(eval_to_string("(number? 'a)"), "#f");
    assert_eq!(eval_to_string("(rational? (/ 1 2))"), "#t");
    assert_eq!(eval_to_string("(real? 1.5)"), "#t");
}

#[test]
fn test_string_number_conversions() {
    assert_eq!(eval_to_string("(string->number \"42\")"), "42");
    assert_eq!(eval_to_string("(string->number \"nope\")"), "#f");
    assert_eq!(eval_to_string("(number->string 42)"), "\"42\"");
    eval_err("(string->number \"10\" 16)");
}

#[test]
fn test_gcd_lcm() {
    assert_eq!(eval_to_string("(gcd 32 -36)"), "4");
    assert_eq!(eval_to_string("(gcd)"), "0");
    assert_eq!(eval_to_string("(lcm 32 -36)"), "288");
    assert_eq!(eval_to_string("(lcm)"), "1");
}

#[test]
fn test_factorial_bignum() {
    assert_eq!(
        eval_to_string(
            "(define (fact n) (if (<= n 1) 1 (* n (fact (- n 1))))) (fact 20)"
        ),
        "2432902008176640000"
    );
    assert_eq!(
        eval_to_string("(define (fact n) (if (<= n 1) 1 (* n (fact (- n 1))))) (fact 30)"),
        "265252859812191058636308480000000"
    );
}

#[test]
fn test_named_let_sum() {
    assert_eq!(
        eval_to_string("(let loop ((i 0) (sum 0)) (if (= i 10) sum (loop (+ i 1) (+ sum i))))"),
        "45"
    );
}

#[test]
fn test_tail_recursion_bounded_memory() {
    assert_eq!(
        eval_to_string("(define (f n) (if (= n 0) 'done (f (- n 1)))) (f 1000000)"),
        "done"
    );
}

#[test]
fn test_call_cc() {
    assert_eq!(
        eval_to_string("(call-with-current-continuation (lambda (k) (+ 1 2 (k 10) 20)))"),
        "10"
    );
    assert_eq!(eval_to_string("(+ 1 (call/cc (lambda (k) (+ 2 (k 3)))))"), "4");
}

#[test]
fn test_quasiquote() {
    assert_eq!(eval_to_string("`(1 ,(+ 1 1) ,@(list 3 4) 5)"), "(1 2 3 4 5)");
    assert_eq!(eval_to_string("`(1 ,@'(2 3) 4)"), "(1 2 3 4)");
    assert_eq!(eval_to_string("`x"), "x");
    assert_eq!(eval("(equal? `x 'x)"), Value::Bool(true));
}

#[test]
fn test_vector_for_each() {
    assert_eq!(
        eval_to_string(
            "(let ((v (make-vector 3 0)))
               (for-each (lambda (i) (vector-set! v i (* i i))) '(0 1 2))
               v)"
        ),
        "#(0 1 4)"
    );
}

#[test]
fn test_counter_closure() {
    assert_eq!(
        eval_to_string("(define c (let ((n 0)) (lambda () (set! n (+ n 1)) n))) (c) (c) (c)"),
        "3"
    );
}

#[test]
fn test_truthiness() {
    assert_eq!(eval("(if 0 1 2)"), Value::int(1));
    assert_eq!(eval("(if \"\" 1 2)"), Value::int(1));
    assert_eq!(eval("(if '() 1 2)"), Value::int(1));
    assert_eq!(eval("(if #f 1 2)"), Value::int(2));
}

#[test]
fn test_identity() {
    assert_eq!(eval_to_string("(define x '(1 2)) (eq? x x)"), "#t");
    assert_eq!(eval_to_string("(eq? 'foo (string->symbol \"FOO\"))"), "#t");
    assert_eq!(eval_to_string("(eq? (gensym) (gensym))"), "#f");
    assert_eq!(eval_to_string("(eqv? 1 1)"), "#t");
    assert_eq!(eval_to_string("(eqv? 1 1.0)"), "#f");
    assert_eq!(eval_to_string("(eq? '(1) '(1))"), "#f");
    assert_eq!(eval_to_string("(equal? '(1 #(2)) '(1 #(2)))"), "#t");
}

#[test]
fn test_list_operations() {
    assert_eq!(eval("(car (list 1 2 3))"), Value::int(1));
    assert_eq!(eval_to_string("(cdr (list 1 2 3))"), "(2 3)");
    assert_eq!(eval_to_string("(cons 0 (list 1 2))"), "(0 1 2)");
    assert_eq!(eval("(length (list 1 2 3))"), Value::int(3));
    assert_eq!(eval("(length '())"), Value::int(0));
    assert_eq!(eval_to_string("(reverse (list 1 2 3))"), "(3 2 1)");
    assert_eq!(eval_to_string("(append (list 1 2) (list 3 4))"), "(1 2 3 4)");
    assert_eq!(eval_to_string("(append)"), "()");
    assert_eq!(eval_to_string("(append '(a) '(b . c))"), "(a b . c)");
    assert_eq!(eval_to_string("(append '() 'final)"), "final");
    assert_eq!(eval_to_string("(list-tail '(a b c) 2)"), "(c)");
    assert_eq!(eval_to_string("(list-ref '(a b c) 1)"), "b");
    eval_err("(list-tail '(a) 3)");
}

#[test]
fn test_pair_mutation() {
    assert_eq!(
        eval_to_string("(define p (cons 1 2)) (set-car! p 9) p"),
        "(9 . 2)"
    );
    assert_eq!(
        eval_to_string("(define p (cons 1 2)) (set-cdr! p '(5)) p"),
        "(1 5)"
    );
    assert!(matches!(
        eval_err("(set-car! '(1 2) 9)"),
        VesperError::Immutable(_)
    ));
}

#[test]
fn test_cyclic_structures() {
    // a cycle through set-cdr! still prints and answers list?
    assert_eq!(
        eval_to_string("(define p (cons 1 '())) (set-cdr! p p) (list? p)"),
        "#f"
    );
    let printed = eval_to_string("(define p (cons 1 '())) (set-cdr! p p) p");
    assert!(printed.ends_with("...)"));
}

#[test]
fn test_list_predicates() {
    assert_eq!(eval_to_string("(null? '())"), "#t");
    assert_eq!(eval_to_string("(null? '(1))"), "#f");
    assert_eq!(eval_to_string("(pair? '(1))"), "#t");
    assert_eq!(eval_to_string("(pair? '())"), "#f");
    assert_eq!(eval_to_string("(list? '(1 2))"), "#t");
    assert_eq!(eval_to_string("(list? '(1 . 2))"), "#f");
}

#[test]
fn test_map_and_apply() {
    assert_eq!(eval_to_string("(map (lambda (x) (* x x)) '(1 2 3))"), "(1 4 9)");
    assert_eq!(eval_to_string("(map cons '(1 2) '(10 20))"), "((1 . 10) (2 . 20))");
    eval_err("(map + '(1 2) '(1))");
    assert_eq!(eval("(apply + '(1 2 3))"), Value::int(6));
    assert_eq!(eval("(apply - 100 '(10 20))"), Value::int(70));
    assert_eq!(eval("(apply +)"), Value::int(0));
}

#[test]
fn test_vectors() {
    assert_eq!(eval_to_string("(vector 1 2 3)"), "#(1 2 3)");
    assert_eq!(eval_to_string("(make-vector 2)"), "#(#f #f)");
    assert_eq!(eval_to_string("(make-vector 2 'x)"), "#(x x)");
    assert_eq!(eval("(vector-length #(1 2 3))"), Value::int(3));
    assert_eq!(eval_to_string("(vector-ref #(a b c) 1)"), "b");
    assert_eq!(eval_to_string("(vector->list #(1 2))"), "(1 2)");
    assert_eq!(eval_to_string("(list->vector '(1 2))"), "#(1 2)");
    assert_eq!(
        eval_to_string("(define v (make-vector 3 0)) (vector-fill! v 'z) v"),
        "#(z z z)"
    );
    eval_err("(vector-ref #(1) 5)");
    eval_err("(vector-set! #(1) 0 2)");
}

#[test]
fn test_strings() {
    assert_eq!(eval("(string-length \"hello\")"), Value::int(5));
    assert_eq!(eval_to_string("(string-ref \"abc\" 1)"), "#\\b");
    assert_eq!(eval_to_string("(substring \"hello\" 1 3)"), "\"el\"");
    assert_eq!(eval_to_string("(string-append \"foo\" \"bar\")"), "\"foobar\"");
    assert_eq!(eval_to_string("(string #\\a #\\b)"), "\"ab\"");
    assert_eq!(eval_to_string("(make-string 2 #\\x)"), "\"xx\"");
    assert_eq!(eval_to_string("(string->list \"ab\")"), "(#\\a #\\b)");
    assert_eq!(eval_to_string("(list->string '(#\\a #\\b))"), "\"ab\"");
    assert_eq!(
        eval_to_string("(define s (string-copy \"abc\")) (string-set! s 0 #\\z) s"),
        "\"zbc\""
    );
    assert_eq!(
        eval_to_string("(define s (make-string 2 #\\a)) (string-fill! s #\\b) s"),
        "\"bb\""
    );
    assert!(matches!(
        eval_err("(string-set! \"lit\" 0 #\\z)"),
        VesperError::Immutable(_)
    ));
    eval_err("(string-ref \"a\" 4)");
}

#[test]
fn test_string_comparisons() {
    assert_eq!(eval_to_string("(string=? \"a\" \"a\")"), "#t");
    assert_eq!(eval_to_string("(string<? \"a\" \"b\")"), "#t");
    assert_eq!(eval_to_string("(string>? \"b\" \"a\")"), "#t");
    assert_eq!(eval_to_string("(string<=? \"a\" \"a\")"), "#t");
    assert_eq!(eval_to_string("(string-ci=? \"AbC\" \"aBc\")"), "#t");
    assert_eq!(eval_to_string("(string-ci<? \"abc\" \"ABD\")"), "#t");
}

#[test]
fn test_characters() {
    assert_eq!(eval_to_string("(char=? #\\a #\\a)"), "#t");
    assert_eq!(eval_to_string("(char<? #\\a #\\b)"), "#t");
    assert_eq!(eval_to_string("(char-ci=? #\\a #\\A)"), "#t");
    assert_eq!(eval_to_string("(char-alphabetic? #\\a)"), "#t");
    assert_eq!(eval_to_string("(char-numeric? #\\3)"), "#t");
    assert_eq!(eval_to_string("(char-whitespace? #\\space)"), "#t");
    assert_eq!(eval_to_string("(char-upper-case? #\\A)"), "#t");
    assert_eq!(eval_to_string("(char-lower-case? #\\a)"), "#t");
    assert_eq!(eval("(char->integer #\\a)"), Value::int(97));
    assert_eq!(eval_to_string("(integer->char 97)"), "#\\a");
    assert_eq!(eval_to_string("(char-upcase #\\a)"), "#\\A");
    assert_eq!(eval_to_string("(char-downcase #\\A)"), "#\\a");
}

#[test]
fn test_symbols() {
    assert_eq!(eval_to_string("(symbol? 'a)"), "#t");
    assert_eq!(eval_to_string("(symbol->string 'abc)"), "\"abc\"");
    assert_eq!(eval_to_string("(string->symbol \"abc\")"), "abc");
    assert_eq!(eval_to_string("(symbol? (gensym))"), "#t");
}

#[test]
fn test_booleans_and_procedures() {
    assert_eq!(eval_to_string("(boolean? #t)"), "#t");
    assert_eq!(eval_to_string("(boolean? 0)"), "#f");
    assert_eq!(eval_to_string("(not #f)"), "#t");
    assert_eq!(eval_to_string("(not '())"), "#f");
    assert_eq!(eval_to_string("(procedure? car)"), "#t");
    assert_eq!(eval_to_string("(procedure? (lambda (x) x))"), "#t");
    assert_eq!(eval_to_string("(procedure? 'car)"), "#f");
    assert_eq!(eval_to_string("(call/cc (lambda (k) (procedure? k)))"), "#t");
}

#[test]
fn test_eval_builtin() {
    assert_eq!(eval("(eval '(+ 1 2))"), Value::int(3));
    assert_eq!(eval_to_string("(define x 5) (eval 'x)"), "5");
}

#[test]
fn test_ports_and_void() {
    assert_eq!(eval_to_string("(port? (current-output-port))"), "#t");
    assert_eq!(eval_to_string("(output-port? (current-output-port))"), "#t");
    assert_eq!(eval_to_string("(input-port? (current-input-port))"), "#t");
    assert_eq!(eval_to_string("(eof-object? (eof))"), "#t");
    assert_eq!(eval_to_string("(eof-object? 'eof)"), "#f");
    assert_eq!(eval_to_string("(void? (void))"), "#t");
    // a headless interpreter reads end-of-stream immediately
    assert_eq!(eval_to_string("(eof-object? (read-char))"), "#t");
}

#[test]
fn test_display_write_to_sink() {
    // headless output discards bytes but the calls must succeed
    assert_eq!(eval_to_string("(display \"hi\")"), "#<void>");
    assert_eq!(eval_to_string("(write '(1 \"two\"))"), "#<void>");
    assert_eq!(eval_to_string("(newline)"), "#<void>");
    assert_eq!(eval_to_string("(write-char #\\x)"), "#<void>");
}

#[test]
fn test_delay_force() {
    assert_eq!(eval_to_string("(force (delay 42))"), "42");
    assert_eq!(
        eval_to_string(
            "(define n 0)
             (define p (delay (begin (set! n (+ n 1)) n)))
             (+ (force p) (force p))"
        ),
        "2"
    );
}

#[test]
fn test_error_builtin() {
    let err = eval_err("(error \"custom failure\")");
    assert!(err.to_string().contains("custom failure"));
}

#[test]
fn test_define_errors() {
    assert!(matches!(eval_err("nope"), VesperError::Unbound(_)));
    eval_err("(set! nope 1)");
    eval_err("(define)");
}

#[test]
fn test_printing() {
    assert_eq!(eval_to_string("'(a b . c)"), "(a b . c)");
    assert_eq!(eval_to_string("''x"), "(quote x)");
    assert_eq!(eval_to_string("(list #\\space #\\a)"), "(#\\space #\\a)");
    assert_eq!(eval_to_string("#\\newline"), "#\\newline");
    assert_eq!(eval_to_string("(cons 1 2)"), "(1 . 2)");
    assert_eq!(eval_to_string("(/ 4 4)"), "1");
}

#[test]
fn test_reader_errors() {
    let interp = vesper_vm::Interpreter::headless();
    assert!(matches!(
        interp.eval_str("(1 2"),
        Err(VesperError::Reader { .. })
    ));
    assert!(matches!(
        interp.eval_str(")"),
        Err(VesperError::Reader { .. })
    ));
}
