use vesper_core::{Span, VesperError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LVector,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplice,
    /// Raw literal text; the reader parses it into the numeric tower.
    Number(String),
    Bool(bool),
    Char(char),
    Str(String),
    Dot,
    Identifier(String),
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// True where an identifier or character name ends. Identifiers may contain
/// almost anything; only whitespace, parentheses, and comment starts
/// terminate them.
fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | ';')
}

fn starts_with_ci(chars: &[char], i: usize, word: &str) -> bool {
    word.chars().enumerate().all(|(k, w)| {
        chars
            .get(i + k)
            .is_some_and(|c| c.to_ascii_lowercase() == w)
    })
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, VesperError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    let mut line = 1;
    let mut col = 1;

    macro_rules! push {
        ($tok:expr, $span:expr, $len:expr) => {{
            tokens.push(SpannedToken {
                token: $tok,
                span: $span,
            });
            i += $len;
            col += $len;
        }};
    }

    while i < chars.len() {
        let ch = chars[i];
        let span = Span::point(line, col);

        match ch {
            ' ' | '\t' | '\r' => {
                i += 1;
                col += 1;
            }
            '\n' => {
                i += 1;
                line += 1;
                col = 1;
            }

            ';' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }

            '(' => push!(Token::LParen, span, 1),
            ')' => push!(Token::RParen, span, 1),
            '\'' => push!(Token::Quote, span, 1),
            '`' => push!(Token::Quasiquote, span, 1),

            ',' => {
                if chars.get(i + 1) == Some(&'@') {
                    push!(Token::UnquoteSplice, span, 2);
                } else {
                    push!(Token::Unquote, span, 1);
                }
            }

            '"' => {
                let mut s = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => {
                            return Err(VesperError::reader("unterminated string", span));
                        }
                        Some('"') => break,
                        Some('\\') if chars.get(j + 1) == Some(&'"') => {
                            s.push('"');
                            j += 2;
                        }
                        Some(&c) => {
                            if c == '\n' {
                                line += 1;
                                col = 0;
                            }
                            s.push(c);
                            j += 1;
                        }
                    }
                }
                let len = j + 1 - i;
                push!(Token::Str(s), span, len);
            }

            '#' => match chars.get(i + 1) {
                Some('(') => push!(Token::LVector, span, 2),
                Some('t') | Some('T') => push!(Token::Bool(true), span, 2),
                Some('f') | Some('F') => push!(Token::Bool(false), span, 2),
                Some('\\') => {
                    if starts_with_ci(&chars, i + 2, "space") {
                        push!(Token::Char(' '), span, 7);
                    } else if starts_with_ci(&chars, i + 2, "newline") {
                        push!(Token::Char('\n'), span, 9);
                    } else if let Some(&c) = chars.get(i + 2) {
                        push!(Token::Char(c), span, 3);
                    } else {
                        return Err(VesperError::reader("unexpected end of input after #\\", span));
                    }
                }
                Some(&c) => {
                    return Err(VesperError::reader(
                        format!("unexpected character after #: '{c}'"),
                        span,
                    ));
                }
                None => {
                    return Err(VesperError::reader("unexpected end of input after `#`", span));
                }
            },

            _ => {
                if looks_like_number(&chars, i) {
                    let len = scan_number(&chars, i);
                    let text: String = chars[i..i + len].iter().collect();
                    push!(Token::Number(text), span, len);
                } else if !ch.is_ascii_digit() {
                    let mut j = i;
                    while j < chars.len() && !is_delimiter(chars[j]) {
                        j += 1;
                    }
                    let len = j - i;
                    let text: String = chars[i..j].iter().collect();
                    if text == "." {
                        push!(Token::Dot, span, 1);
                    } else {
                        push!(Token::Identifier(text), span, len);
                    }
                } else {
                    return Err(VesperError::reader(
                        format!("unexpected character: '{ch}'"),
                        span,
                    ));
                }
            }
        }
    }

    Ok(tokens)
}

/// A number starts with a digit, a sign followed by a digit or point, or a
/// point followed by a digit.
fn looks_like_number(chars: &[char], i: usize) -> bool {
    match chars[i] {
        c if c.is_ascii_digit() => true,
        '+' | '-' => match chars.get(i + 1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.get(i + 2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        },
        '.' => chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Length of the longest number literal at position i: optional sign, digits
/// with an optional decimal point, optional exponent.
fn scan_number(chars: &[char], i: usize) -> usize {
    let mut j = i;
    if matches!(chars[j], '+' | '-') {
        j += 1;
    }
    while j < chars.len() && chars[j].is_ascii_digit() {
        j += 1;
    }
    if j < chars.len() && chars[j] == '.' {
        j += 1;
        while j < chars.len() && chars[j].is_ascii_digit() {
            j += 1;
        }
    }
    if j < chars.len()
        && matches!(chars[j], 'e' | 'E')
        && chars
            .get(j + 1)
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-'))
    {
        let mut k = j + 1;
        if matches!(chars[k], '+' | '-') {
            k += 1;
        }
        if k < chars.len() && chars[k].is_ascii_digit() {
            while k < chars.len() && chars[k].is_ascii_digit() {
                k += 1;
            }
            j = k;
        }
    }
    j - i
}
