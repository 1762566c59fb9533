use std::rc::Rc;

use vesper_core::{Pair, SchemeString, SchemeVector, Span, Value, VesperError};

use crate::lexer::{tokenize, SpannedToken, Token};

/// Read a single datum from source text. Empty input yields the Eof
/// singleton.
pub fn read(input: &str) -> Result<Value, VesperError> {
    let mut parser = Parser::new(tokenize(input)?);
    parser.parse_expr()
}

/// Read every datum from source text, stopping at end of input.
pub fn read_many(input: &str) -> Result<Vec<Value>, VesperError> {
    let mut parser = Parser::new(tokenize(input)?);
    let mut exprs = Vec::new();
    loop {
        match parser.parse_expr()? {
            Value::Eof => return Ok(exprs),
            expr => exprs.push(expr),
        }
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .or_else(|| self.tokens.last().map(|t| t.span))
            .unwrap_or(Span::point(0, 0))
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self, open: Span) -> Result<(), VesperError> {
        match self.advance() {
            Some(t) if t.token == Token::RParen => Ok(()),
            Some(t) => Err(VesperError::reader(
                format!("expected `)`, got `{:?}`", t.token),
                t.span,
            )),
            None => Err(VesperError::reader("unterminated list", open)),
        }
    }

    fn parse_expr(&mut self) -> Result<Value, VesperError> {
        let span = self.span();
        match self.peek() {
            None => Ok(Value::Eof),
            Some(Token::LParen) => self.parse_list(),
            Some(Token::LVector) => self.parse_vector(),
            Some(Token::Quote) => self.parse_prefixed("quote"),
            Some(Token::Quasiquote) => self.parse_prefixed("quasiquote"),
            Some(Token::Unquote) => self.parse_prefixed("unquote"),
            Some(Token::UnquoteSplice) => self.parse_prefixed("unquote-splicing"),
            Some(Token::RParen) => Err(VesperError::reader("unexpected close bracket", span)),
            Some(_) => self.parse_atom(),
        }
    }

    /// `'x` and friends read as two-element lists: `(quote x)`.
    fn parse_prefixed(&mut self, keyword: &str) -> Result<Value, VesperError> {
        let span = self.span();
        self.advance();
        match self.parse_expr()? {
            Value::Eof => Err(VesperError::reader(
                format!("{keyword} requires an expression after it"),
                span,
            )),
            expr => Ok(literal_list(vec![Value::symbol(keyword), expr], Value::Null)),
        }
    }

    fn parse_list(&mut self) -> Result<Value, VesperError> {
        let open = self.span();
        self.advance(); // consume LParen
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(VesperError::reader("unterminated list", open)),
                Some(Token::RParen) => {
                    self.advance();
                    return Ok(literal_list(items, Value::Null));
                }
                Some(Token::Dot) => {
                    let span = self.span();
                    if items.is_empty() {
                        return Err(VesperError::reader("malformed dotted list", span));
                    }
                    self.advance(); // consume dot
                    let tail = self.parse_expr()?;
                    if matches!(tail, Value::Eof) {
                        return Err(VesperError::reader("malformed dotted list", span));
                    }
                    self.expect_rparen(open)?;
                    return Ok(literal_list(items, tail));
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_vector(&mut self) -> Result<Value, VesperError> {
        let open = self.span();
        self.advance(); // consume LVector
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(VesperError::reader("unterminated vector", open)),
                Some(Token::RParen) => {
                    self.advance();
                    return Ok(Value::Vector(Rc::new(SchemeVector::literal(items))));
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Value, VesperError> {
        let span = self.span();
        let tok = self.advance().expect("caller checked peek");
        match &tok.token {
            Token::Bool(b) => Ok(Value::Bool(*b)),
            Token::Char(c) => Ok(Value::Char(*c)),
            Token::Number(text) => vesper_core::Number::parse(text, 10)
                .map(Value::Number)
                .map_err(|e| VesperError::reader(e.to_string(), span)),
            Token::Str(s) => Ok(Value::Str(Rc::new(SchemeString::literal(s)))),
            Token::Identifier(name) => Ok(Value::symbol(name)),
            // a dot outside a list reads as the identifier `.`
            Token::Dot => Ok(Value::symbol(".")),
            other => Err(VesperError::reader(
                format!("unexpected token: {other:?}"),
                span,
            )),
        }
    }
}

/// Build a (possibly improper) list of immutable pairs, as read syntax
/// produces.
fn literal_list(items: Vec<Value>, tail: Value) -> Value {
    let mut result = tail;
    for item in items.into_iter().rev() {
        result = Value::Pair(Rc::new(Pair::literal(item, result)));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read1(input: &str) -> Value {
        read(input).unwrap()
    }

    #[test]
    fn atoms() {
        assert_eq!(read1("#t"), Value::Bool(true));
        assert_eq!(read1("42").to_scheme(), "42");
        assert_eq!(read1("-3.5").to_scheme(), "-3.5");
        assert_eq!(read1("\"hi\"").to_scheme(), "\"hi\"");
        assert_eq!(read1("foo").to_scheme(), "foo");
        assert_eq!(read1("#\\a"), Value::Char('a'));
        assert!(matches!(read1(""), Value::Eof));
    }

    #[test]
    fn identifiers_fold_case() {
        assert_eq!(read1("FOO").to_scheme(), "foo");
        assert_eq!(read1("Lambda").to_scheme(), "lambda");
    }

    #[test]
    fn proper_lists() {
        assert_eq!(read1("(1 2 3)").to_scheme(), "(1 2 3)");
        assert_eq!(read1("()").to_scheme(), "()");
        assert_eq!(read1("(a (b c))").to_scheme(), "(a (b c))");
    }

    #[test]
    fn dotted_lists() {
        assert_eq!(read1("(a . b)").to_scheme(), "(a . b)");
        assert_eq!(read1("(a b . c)").to_scheme(), "(a b . c)");
        assert!(read("(a . b c)").is_err());
        assert!(read("( . b)").is_err());
    }

    #[test]
    fn vectors() {
        assert_eq!(read1("#(1 2 3)").to_scheme(), "#(1 2 3)");
        assert_eq!(read1("#()").to_scheme(), "#()");
    }

    #[test]
    fn quote_forms() {
        assert_eq!(read1("'x").to_scheme(), "(quote x)");
        assert_eq!(read1("`(a ,b ,@c)").to_scheme(),
            "(quasiquote (a (unquote b) (unquote-splicing c)))");
    }

    #[test]
    fn literals_are_immutable() {
        let pair = read1("(1 2)");
        let p = pair.as_pair().unwrap();
        assert!(p.assert_mutable().is_err());
        let s = read1("\"hi\"");
        assert!(s.as_str().unwrap().assert_mutable().is_err());
        let v = read1("#(1)");
        assert!(v.as_vector().unwrap().assert_mutable().is_err());
    }

    #[test]
    fn unbalanced_input_errors() {
        assert!(read("(1 2").is_err());
        assert!(read(")").is_err());
        assert!(read("#(1").is_err());
    }

    #[test]
    fn read_many_collects_all() {
        let exprs = read_many("1 2 (3)").unwrap();
        assert_eq!(exprs.len(), 3);
        assert_eq!(exprs[2].to_scheme(), "(3)");
    }
}
