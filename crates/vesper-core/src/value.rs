use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{Read, Write};
use std::rc::Rc;

use hashbrown::HashMap;
use lasso::{Rodeo, Spur};

use crate::error::VesperError;
use crate::number::Number;
use crate::EvalContext;

// ── Symbol interning ──────────────────────────────────────────────

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
    static UNINTERNED_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// A Scheme symbol. Interned symbols are case-folded on creation and compare
/// equal by name; uninterned symbols carry a unique tag and compare equal
/// only to themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: Spur,
    tag: Option<u64>,
}

impl Symbol {
    /// The canonical interned symbol for a name, folded to lower case.
    pub fn intern(name: &str) -> Symbol {
        let folded = name.to_lowercase();
        Symbol {
            name: intern(&folded),
            tag: None,
        }
    }

    /// A fresh symbol that never compares equal to any other.
    pub fn uninterned(prefix: &str) -> Symbol {
        let n = UNINTERNED_COUNTER.with(|c| {
            let n = c.get();
            c.set(n + 1);
            n
        });
        Symbol {
            name: intern(&format!("{prefix}{n}")),
            tag: Some(n),
        }
    }

    pub fn is_uninterned(&self) -> bool {
        self.tag.is_some()
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_resolved(self.name, |s| f.write_str(s))
    }
}

// ── Supporting types ──────────────────────────────────────────────

/// A native procedure callable from Scheme.
pub type NativeFnInner = dyn Fn(&EvalContext, &Env, &[Value]) -> Result<Value, VesperError>;

pub struct NativeFn {
    pub name: String,
    pub func: Box<NativeFnInner>,
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[builtin {}]", self.name)
    }
}

/// A user-defined procedure: parameters, body, and the defining environment.
#[derive(Debug)]
pub struct Closure {
    pub env: Env,
    pub params: Vec<Symbol>,
    /// When set, the final parameter collects all remaining arguments as a
    /// list. A lone-symbol formal is encoded as `params = [sym]` + variadic.
    pub variadic: bool,
    pub body: Vec<Value>,
}

/// A reified VM stack. The frame representation lives in the evaluator
/// crate; the core only carries it opaquely.
pub struct Continuation {
    pub state: Rc<dyn std::any::Any>,
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#[continuation]")
    }
}

/// A delayed computation: captured environment plus an unevaluated body.
/// Forcing memoizes the result.
pub struct Promise {
    pub env: Env,
    pub body: Value,
    pub forced: RefCell<Option<Value>>,
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.forced.borrow().is_some() {
            f.write_str("#[promise (forced)]")
        } else {
            f.write_str("#[promise]")
        }
    }
}

/// A mutable character sequence.
#[derive(Debug)]
pub struct SchemeString {
    pub chars: RefCell<Vec<char>>,
    immutable: Cell<bool>,
}

impl SchemeString {
    pub fn new(s: &str) -> Self {
        SchemeString {
            chars: RefCell::new(s.chars().collect()),
            immutable: Cell::new(false),
        }
    }

    pub fn literal(s: &str) -> Self {
        let string = SchemeString::new(s);
        string.immutable.set(true);
        string
    }

    pub fn len(&self) -> usize {
        self.chars.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.borrow().is_empty()
    }

    pub fn to_utf8(&self) -> String {
        self.chars.borrow().iter().collect()
    }

    pub fn assert_mutable(&self) -> Result<(), VesperError> {
        if self.immutable.get() {
            Err(VesperError::Immutable(format!("\"{}\"", self.to_utf8())))
        } else {
            Ok(())
        }
    }
}

/// A mutable fixed-length array of values.
#[derive(Debug)]
pub struct SchemeVector {
    pub items: RefCell<Vec<Value>>,
    immutable: Cell<bool>,
}

impl SchemeVector {
    pub fn new(items: Vec<Value>) -> Self {
        SchemeVector {
            items: RefCell::new(items),
            immutable: Cell::new(false),
        }
    }

    pub fn literal(items: Vec<Value>) -> Self {
        let vector = SchemeVector::new(items);
        vector.immutable.set(true);
        vector
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn assert_mutable(&self) -> Result<(), VesperError> {
        if self.immutable.get() {
            Err(VesperError::Immutable("vector".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A cons cell.
#[derive(Debug)]
pub struct Pair {
    pub car: RefCell<Value>,
    pub cdr: RefCell<Value>,
    immutable: Cell<bool>,
}

impl Pair {
    pub fn new(car: Value, cdr: Value) -> Self {
        Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
            immutable: Cell::new(false),
        }
    }

    pub fn literal(car: Value, cdr: Value) -> Self {
        let pair = Pair::new(car, cdr);
        pair.immutable.set(true);
        pair
    }

    pub fn assert_mutable(&self) -> Result<(), VesperError> {
        if self.immutable.get() {
            Err(VesperError::Immutable("pair".to_string()))
        } else {
            Ok(())
        }
    }
}

// ── Ports ─────────────────────────────────────────────────────────

pub enum PortKind {
    Input {
        reader: RefCell<Box<dyn Read>>,
        peeked: Cell<Option<char>>,
    },
    Output {
        writer: RefCell<Box<dyn Write>>,
    },
}

/// A character-in / bytes-out stream with a close state.
pub struct Port {
    pub kind: PortKind,
    pub closed: Cell<bool>,
}

impl Port {
    pub fn input(reader: Box<dyn Read>) -> Port {
        Port {
            kind: PortKind::Input {
                reader: RefCell::new(reader),
                peeked: Cell::new(None),
            },
            closed: Cell::new(false),
        }
    }

    pub fn output(writer: Box<dyn Write>) -> Port {
        Port {
            kind: PortKind::Output {
                writer: RefCell::new(writer),
            },
            closed: Cell::new(false),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, PortKind::Input { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, PortKind::Output { .. })
    }

    fn assert_open(&self) -> Result<(), VesperError> {
        if self.closed.get() {
            Err(VesperError::Io("port is closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Read one character, decoding UTF-8 incrementally. None at end of
    /// stream.
    pub fn read_char(&self) -> Result<Option<char>, VesperError> {
        self.assert_open()?;
        let PortKind::Input { reader, peeked } = &self.kind else {
            return Err(VesperError::type_error("input port", "output port"));
        };
        if let Some(c) = peeked.take() {
            return Ok(Some(c));
        }
        let mut reader = reader.borrow_mut();
        let mut first = [0u8; 1];
        match reader.read(&mut first) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(VesperError::Io(e.to_string())),
        }
        let width = match first[0] {
            b if b < 0x80 => 1,
            b if b >= 0xC0 && b < 0xE0 => 2,
            b if b >= 0xE0 && b < 0xF0 => 3,
            b if b >= 0xF0 => 4,
            _ => return Err(VesperError::Io("invalid UTF-8 on input port".to_string())),
        };
        let mut buf = [0u8; 4];
        buf[0] = first[0];
        if width > 1 {
            reader
                .read_exact(&mut buf[1..width])
                .map_err(|e| VesperError::Io(e.to_string()))?;
        }
        std::str::from_utf8(&buf[..width])
            .map(|s| s.chars().next())
            .map_err(|_| VesperError::Io("invalid UTF-8 on input port".to_string()))
    }

    /// Read one character without consuming it.
    pub fn peek_char(&self) -> Result<Option<char>, VesperError> {
        let c = self.read_char()?;
        if let (Some(c), PortKind::Input { peeked, .. }) = (c, &self.kind) {
            peeked.set(Some(c));
        }
        Ok(c)
    }

    pub fn write_str(&self, s: &str) -> Result<(), VesperError> {
        self.assert_open()?;
        let PortKind::Output { writer } = &self.kind else {
            return Err(VesperError::type_error("output port", "input port"));
        };
        let mut writer = writer.borrow_mut();
        writer
            .write_all(s.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| VesperError::Io(e.to_string()))
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_input() {
            f.write_str("#[input-port]")
        } else {
            f.write_str("#[output-port]")
        }
    }
}

// ── Value ─────────────────────────────────────────────────────────

/// Number of cons cells the printer walks before giving up, so cyclic
/// structures still terminate.
const PRINT_CELL_LIMIT: usize = 4096;

/// The core Value type for all Scheme data.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Char(char),
    Number(Number),
    Str(Rc<SchemeString>),
    Symbol(Symbol),
    Null,
    Pair(Rc<Pair>),
    Vector(Rc<SchemeVector>),
    Builtin(Rc<NativeFn>),
    Closure(Rc<Closure>),
    Continuation(Rc<Continuation>),
    Port(Rc<Port>),
    Promise(Rc<Promise>),
    Eof,
    Void,
}

impl Value {
    // -- constructors --

    pub fn int(n: i64) -> Value {
        Value::Number(Number::from_i64(n))
    }

    pub fn string(s: &str) -> Value {
        Value::Str(Rc::new(SchemeString::new(s)))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::intern(name))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(Pair::new(car, cdr)))
    }

    /// Build a proper list.
    pub fn list(items: Vec<Value>) -> Value {
        Value::improper_list(items, Value::Null)
    }

    /// Build a list with an explicit final cdr.
    pub fn improper_list(items: Vec<Value>, tail: Value) -> Value {
        let mut result = tail;
        for item in items.into_iter().rev() {
            result = Value::cons(item, result);
        }
        result
    }

    pub fn builtin(
        name: &str,
        f: impl Fn(&EvalContext, &Env, &[Value]) -> Result<Value, VesperError> + 'static,
    ) -> Value {
        Value::Builtin(Rc::new(NativeFn {
            name: name.to_string(),
            func: Box::new(f),
        }))
    }

    // -- predicates --

    /// Everything except the false boolean is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_procedure(&self) -> bool {
        matches!(
            self,
            Value::Builtin(_) | Value::Closure(_) | Value::Continuation(_)
        )
    }

    /// True for a proper (finite, null-terminated) list. Cycle-safe.
    pub fn is_list(&self) -> bool {
        let mut slow = self.clone();
        let mut fast = self.clone();
        loop {
            match fast {
                Value::Null => return true,
                Value::Pair(p) => fast = p.cdr.borrow().clone(),
                _ => return false,
            }
            match fast {
                Value::Null => return true,
                Value::Pair(p) => fast = p.cdr.borrow().clone(),
                _ => return false,
            }
            slow = match slow {
                Value::Pair(p) => p.cdr.borrow().clone(),
                other => other,
            };
            if let (Value::Pair(a), Value::Pair(b)) = (&slow, &fast) {
                if Rc::ptr_eq(a, b) {
                    return false;
                }
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Char(_) => "character",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Null => "null",
            Value::Pair(_) => "pair",
            Value::Vector(_) => "vector",
            Value::Builtin(_) | Value::Closure(_) | Value::Continuation(_) => "procedure",
            Value::Port(_) => "port",
            Value::Promise(_) => "promise",
            Value::Eof => "eof",
            Value::Void => "void",
        }
    }

    // -- accessors --

    pub fn as_number(&self) -> Result<&Number, VesperError> {
        match self {
            Value::Number(n) => Ok(n),
            other => Err(VesperError::type_error("number", other.type_name())),
        }
    }

    pub fn as_symbol(&self) -> Result<Symbol, VesperError> {
        match self {
            Value::Symbol(s) => Ok(*s),
            other => Err(VesperError::type_error("symbol", other.type_name())),
        }
    }

    pub fn as_pair(&self) -> Result<&Rc<Pair>, VesperError> {
        match self {
            Value::Pair(p) => Ok(p),
            other => Err(VesperError::type_error("pair", other.type_name())),
        }
    }

    pub fn as_str(&self) -> Result<&Rc<SchemeString>, VesperError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(VesperError::type_error("string", other.type_name())),
        }
    }

    pub fn as_vector(&self) -> Result<&Rc<SchemeVector>, VesperError> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(VesperError::type_error("vector", other.type_name())),
        }
    }

    pub fn as_char(&self) -> Result<char, VesperError> {
        match self {
            Value::Char(c) => Ok(*c),
            other => Err(VesperError::type_error("character", other.type_name())),
        }
    }

    pub fn as_port(&self) -> Result<&Rc<Port>, VesperError> {
        match self {
            Value::Port(p) => Ok(p),
            other => Err(VesperError::type_error("port", other.type_name())),
        }
    }

    pub fn car(&self) -> Result<Value, VesperError> {
        match self {
            Value::Pair(p) => Ok(p.car.borrow().clone()),
            Value::Null => Err(VesperError::eval("can't take car of ()")),
            other => Err(VesperError::type_error("pair", other.type_name())),
        }
    }

    pub fn cdr(&self) -> Result<Value, VesperError> {
        match self {
            Value::Pair(p) => Ok(p.cdr.borrow().clone()),
            Value::Null => Err(VesperError::eval("can't take cdr of ()")),
            other => Err(VesperError::type_error("pair", other.type_name())),
        }
    }

    /// Flatten a proper list into a Vec. Errors on improper or cyclic lists.
    pub fn list_to_vec(&self) -> Result<Vec<Value>, VesperError> {
        if !self.is_list() {
            return Err(VesperError::eval(format!(
                "{} not a list",
                self.to_scheme()
            )));
        }
        let mut out = Vec::new();
        let mut next = self.clone();
        while let Value::Pair(p) = next {
            out.push(p.car.borrow().clone());
            next = p.cdr.borrow().clone();
        }
        Ok(out)
    }

    // -- identity and equality --

    /// Pointer identity, with the interned singletons compared by tag.
    pub fn is_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Eof, Value::Eof) => true,
            (Value::Void, Value::Void) => true,
            (Value::Char(a), Value::Char(b)) => a == b,
            // numbers are unboxed, so identity degrades to eqv
            (Value::Number(a), Value::Number(b)) => {
                a.is_exact() == b.is_exact() && a.num_eq(b)
            }
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
            (Value::Port(a), Value::Port(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The R5RS eqv? relation: eq?, plus characters by codepoint and numbers
    /// by numeric equality with matching exactness.
    pub fn is_eqv(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                a.is_exact() == b.is_exact() && a.num_eq(b)
            }
            _ => self.is_eq(other),
        }
    }

    /// Structural equality: recursive on pairs and vectors, codepoint
    /// equality on strings, eqv? elsewhere. May not terminate on cycles.
    pub fn is_equal(&self, other: &Value) -> bool {
        if self.is_eq(other) {
            return true;
        }
        match (self, other) {
            // cars recurse, the cdr spine iterates so long lists don't
            // exhaust the host stack
            (Value::Pair(_), Value::Pair(_)) => {
                let mut x = self.clone();
                let mut y = other.clone();
                loop {
                    match (x, y) {
                        (Value::Pair(a), Value::Pair(b)) => {
                            if Rc::ptr_eq(&a, &b) {
                                return true;
                            }
                            if !a.car.borrow().is_equal(&b.car.borrow()) {
                                return false;
                            }
                            x = a.cdr.borrow().clone();
                            y = b.cdr.borrow().clone();
                        }
                        (x, y) => return x.is_equal(&y),
                    }
                }
            }
            (Value::Vector(a), Value::Vector(b)) => {
                let a = a.items.borrow();
                let b = b.items.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.is_equal(y))
            }
            (Value::Str(a), Value::Str(b)) => *a.chars.borrow() == *b.chars.borrow(),
            _ => self.is_eqv(other),
        }
    }

    // -- printing --

    /// The machine-readable representation, as produced by `write`.
    pub fn to_scheme(&self) -> String {
        let mut out = String::new();
        let mut budget = PRINT_CELL_LIMIT;
        self.write_scheme(&mut out, false, &mut budget);
        out
    }

    /// The human-readable representation, as produced by `display`: strings
    /// without quotes, characters as themselves.
    pub fn display_string(&self) -> String {
        let mut out = String::new();
        let mut budget = PRINT_CELL_LIMIT;
        self.write_scheme(&mut out, true, &mut budget);
        out
    }

    fn write_scheme(&self, out: &mut String, display: bool, budget: &mut usize) {
        match self {
            Value::Bool(true) => out.push_str("#t"),
            Value::Bool(false) => out.push_str("#f"),
            Value::Char(c) => {
                if display {
                    out.push(*c);
                } else {
                    match c {
                        ' ' => out.push_str("#\\space"),
                        '\n' => out.push_str("#\\newline"),
                        c if c.is_alphanumeric() => {
                            out.push_str("#\\");
                            out.push(*c);
                        }
                        c => out.push_str(&format!("#\\U+{:X}", *c as u32)),
                    }
                }
            }
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Str(s) => {
                if display {
                    out.push_str(&s.to_utf8());
                } else {
                    out.push('"');
                    out.push_str(&s.to_utf8());
                    out.push('"');
                }
            }
            Value::Symbol(s) => {
                if s.is_uninterned() {
                    out.push_str(&format!("#<uninterned-symbol {s}>"));
                } else {
                    out.push_str(&s.name());
                }
            }
            Value::Null => out.push_str("()"),
            Value::Pair(_) => self.write_pair(out, display, budget),
            Value::Vector(v) => {
                out.push_str("#(");
                for (i, item) in v.items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    item.write_scheme(out, display, budget);
                }
                out.push(')');
            }
            Value::Builtin(f) => out.push_str(&format!("#[builtin {}]", f.name)),
            Value::Closure(c) => {
                out.push_str("#[closure (");
                for (i, p) in c.params.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    if c.variadic && i + 1 == c.params.len() {
                        out.push_str(". ");
                    }
                    out.push_str(&p.name());
                }
                out.push_str(")]");
            }
            Value::Continuation(_) => out.push_str("#[continuation]"),
            Value::Port(p) => {
                if p.is_input() {
                    out.push_str("#[input-port]");
                } else {
                    out.push_str("#[output-port]");
                }
            }
            Value::Promise(_) => out.push_str("#[promise]"),
            Value::Eof => out.push_str("#<EOF>"),
            Value::Void => out.push_str("#<void>"),
        }
    }

    fn write_pair(&self, out: &mut String, display: bool, budget: &mut usize) {
        out.push('(');
        let mut next = self.clone();
        loop {
            if *budget == 0 {
                out.push_str("...");
                break;
            }
            *budget -= 1;
            let Value::Pair(p) = next else { break };
            p.car.borrow().write_scheme(out, display, budget);
            let cdr = p.cdr.borrow().clone();
            match cdr {
                Value::Null => break,
                Value::Pair(_) => {
                    out.push(' ');
                    next = cdr;
                }
                other => {
                    out.push_str(" . ");
                    other.write_scheme(out, display, budget);
                    break;
                }
            }
        }
        out.push(')');
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scheme())
    }
}

/// Structural equality, mainly for tests. Mirrors `equal?`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

// ── Env ───────────────────────────────────────────────────────────

/// A lexical scope: a chain of binding frames. Cloning an Env yields a handle
/// to the same frame.
#[derive(Debug, Clone)]
pub struct Env {
    pub bindings: Rc<RefCell<HashMap<Symbol, Value>>>,
    pub parent: Option<Rc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(HashMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Env>) -> Self {
        Env {
            bindings: Rc::new(RefCell::new(HashMap::new())),
            parent: Some(parent),
        }
    }

    /// Insert or overwrite in this frame, returning any previous value.
    pub fn define(&self, name: Symbol, val: Value) -> Option<Value> {
        self.bindings.borrow_mut().insert(name, val)
    }

    /// Mutate the innermost existing binding, walking parent frames.
    /// Returns the replaced value.
    pub fn replace(&self, name: Symbol, val: Value) -> Result<Value, VesperError> {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(entry) = bindings.get_mut(&name) {
            let prev = entry.clone();
            *entry = val;
            return Ok(prev);
        }
        drop(bindings);
        match &self.parent {
            Some(parent) => parent.replace(name, val),
            None => Err(VesperError::Unbound(name.name())),
        }
    }

    /// Resolve a symbol, walking parent frames.
    pub fn lookup(&self, name: Symbol) -> Result<Value, VesperError> {
        if let Some(val) = self.bindings.borrow().get(&name) {
            return Ok(val.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => Err(VesperError::Unbound(name.name())),
        }
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        if self.bindings.borrow().contains_key(&name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_defined(name),
            None => false,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_fold_case() {
        assert_eq!(Symbol::intern("FOO"), Symbol::intern("foo"));
        assert_eq!(Symbol::intern("Foo").name(), "foo");
    }

    #[test]
    fn uninterned_symbols_are_unique() {
        let a = Symbol::uninterned("gensym-");
        let b = Symbol::uninterned("gensym-");
        assert_ne!(a, b);
        assert!(a.is_uninterned());
        assert_eq!(a, a);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Null.is_truthy());
        assert!(Value::int(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn list_printing() {
        let l = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
        assert_eq!(l.to_scheme(), "(1 2 3)");
        let dotted = Value::cons(Value::symbol("a"), Value::symbol("b"));
        assert_eq!(dotted.to_scheme(), "(a . b)");
        let nested = Value::improper_list(
            vec![Value::symbol("a"), Value::symbol("b")],
            Value::symbol("c"),
        );
        assert_eq!(nested.to_scheme(), "(a b . c)");
    }

    #[test]
    fn cyclic_print_terminates() {
        let p = Rc::new(Pair::new(Value::int(1), Value::Null));
        *p.cdr.borrow_mut() = Value::Pair(p.clone());
        let printed = Value::Pair(p).to_scheme();
        assert!(printed.ends_with("...)"));
    }

    #[test]
    fn char_printing() {
        assert_eq!(Value::Char(' ').to_scheme(), "#\\space");
        assert_eq!(Value::Char('\n').to_scheme(), "#\\newline");
        assert_eq!(Value::Char('x').to_scheme(), "#\\x");
        assert_eq!(Value::Char('\t').to_scheme(), "#\\U+9");
        assert_eq!(Value::Char('x').display_string(), "x");
    }

    #[test]
    fn eqv_numbers_track_exactness() {
        let exact = Value::int(1);
        let inexact = Value::Number(Number::parse("1.0", 10).unwrap());
        assert!(!exact.is_eqv(&inexact));
        assert!(exact.is_eqv(&Value::int(1)));
    }

    #[test]
    fn equal_is_structural() {
        let a = Value::list(vec![Value::int(1), Value::string("x")]);
        let b = Value::list(vec![Value::int(1), Value::string("x")]);
        assert!(!a.is_eq(&b));
        assert!(a.is_equal(&b));
    }

    #[test]
    fn immutable_literals_reject_mutation() {
        let s = SchemeString::literal("hi");
        assert!(s.assert_mutable().is_err());
        let s = SchemeString::new("hi");
        assert!(s.assert_mutable().is_ok());
    }

    #[test]
    fn env_define_replace_lookup() {
        let global = Rc::new(Env::new());
        let x = Symbol::intern("x");
        global.define(x, Value::int(1));
        let inner = Env::with_parent(global.clone());
        assert_eq!(inner.lookup(x).unwrap(), Value::int(1));
        inner.replace(x, Value::int(2)).unwrap();
        assert_eq!(global.lookup(x).unwrap(), Value::int(2));
        assert!(inner.replace(Symbol::intern("nope"), Value::Null).is_err());
        assert!(inner.lookup(Symbol::intern("nope")).is_err());
    }

    #[test]
    fn is_list_handles_cycles() {
        let p = Rc::new(Pair::new(Value::int(1), Value::Null));
        *p.cdr.borrow_mut() = Value::Pair(p.clone());
        assert!(!Value::Pair(p).is_list());
        assert!(Value::list(vec![Value::int(1)]).is_list());
        assert!(Value::Null.is_list());
        assert!(!Value::cons(Value::int(1), Value::int(2)).is_list());
    }
}
