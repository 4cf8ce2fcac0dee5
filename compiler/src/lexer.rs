//! One-pass tokenizer. Consumes source text line by line (splitting on
//! `\r\n`, `\r` or `\n`), matching a prioritized alternation of labels,
//! identifiers/keywords, literals, symbols, comments and line
//! continuations. Whitespace is insignificant except as a separator.

use abysmal_decimal::Decimal;

use crate::error::{CompilationError, CompilationErrorKind};
use crate::source_map::SourceLine;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub char: u32,
    /// The logical-line span (single line, or continuation range) this
    /// token's statement belongs to; used for diagnostics and the AST's
    /// per-statement line info rather than for this token's own position.
    pub span: SourceLine,
}

impl Token {
    pub fn describe(&self) -> String {
        self.kind.describe()
    }

    pub(crate) fn unexpected(&self) -> CompilationError {
        CompilationError::at(
            CompilationErrorKind::Unexpected(self.describe()),
            self.line,
            self.char,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Label(String),
    Identifier(String),
    Literal(Decimal),
    Random,
    Let,
    In,
    Not,
    Symbol(Symbol),
    EndOfLine,
    EndOfInput,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Label(_) => "label".to_string(),
            TokenKind::Identifier(_) => "identifier".to_string(),
            TokenKind::Literal(_) => "literal".to_string(),
            TokenKind::Random => "random".to_string(),
            TokenKind::Let => "let".to_string(),
            TokenKind::In => "in".to_string(),
            TokenKind::Not => "not".to_string(),
            TokenKind::Symbol(symbol) => symbol.text().to_string(),
            TokenKind::EndOfLine => "end-of-line".to_string(),
            TokenKind::EndOfInput => "end-of-input".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Symbol {
    EqEq,
    Arrow,
    Eq,
    NotEq,
    Bang,
    LtEq,
    Lt,
    GtEq,
    Gt,
    AndAnd,
    OrOr,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Question,
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl Symbol {
    pub fn text(self) -> &'static str {
        match self {
            Symbol::EqEq => "==",
            Symbol::Arrow => "=>",
            Symbol::Eq => "=",
            Symbol::NotEq => "!=",
            Symbol::Bang => "!",
            Symbol::LtEq => "<=",
            Symbol::Lt => "<",
            Symbol::GtEq => ">=",
            Symbol::Gt => ">",
            Symbol::AndAnd => "&&",
            Symbol::OrOr => "||",
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::Caret => "^",
            Symbol::Question => "?",
            Symbol::Colon => ":",
            Symbol::Comma => ",",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::LBracket => "[",
            Symbol::RBracket => "]",
            Symbol::LBrace => "{",
            Symbol::RBrace => "}",
        }
    }
}

const SUFFIX_SHIFT: [(char, i64); 4] = [('%', -2), ('k', 3), ('m', 6), ('b', 9)];

/// Splits source text on any of `\r\n`, `\r`, `\n` without losing empty
/// trailing lines, mirroring Python's `re.split(r'\r\n?|\n', ...)`.
fn split_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = source;
    loop {
        if let Some(pos) = rest.find(['\n', '\r']) {
            lines.push(&rest[..pos]);
            let after = &rest[pos..];
            if after.starts_with("\r\n") {
                rest = &after[2..];
            } else {
                rest = &after[1..];
            }
        } else {
            lines.push(rest);
            break;
        }
    }
    lines
}

/// Tokenizes `source` into a flat list of tokens, ending in `EndOfInput`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompilationError> {
    let mut tokens = Vec::new();
    let mut line_number: u32 = 1;
    let mut continuations: u32 = 0;
    let mut carries_over = false;

    for line in split_lines(source) {
        continuations = if carries_over { continuations + 1 } else { 0 };
        carries_over = false;
        let span = if continuations == 0 {
            SourceLine::Single(line_number)
        } else {
            SourceLine::Range(line_number - continuations, line_number)
        };

        let chars: Vec<char> = line.chars().collect();
        let mut pos = 0usize;
        while pos < chars.len() {
            if chars[pos].is_whitespace() {
                pos += 1;
                continue;
            }
            if chars[pos] == '#' {
                break;
            }
            if chars[pos] == '\\' {
                let mut rest = pos + 1;
                while rest < chars.len() && chars[rest].is_whitespace() {
                    rest += 1;
                }
                if rest < chars.len() && chars[rest] != '#' {
                    return Err(CompilationError::at(
                        CompilationErrorKind::UnexpectedTextAfterLineContinuation,
                        line_number,
                        rest as u32,
                    ));
                }
                carries_over = true;
                break;
            }
            if chars[pos] == '@' {
                let start = pos;
                let mut end = pos + 1;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                if end == start + 1 {
                    return Err(CompilationError::at(
                        CompilationErrorKind::UnknownToken,
                        line_number,
                        start as u32,
                    ));
                }
                let text: String = chars[start + 1..end].iter().collect();
                tokens.push(Token {
                    kind: TokenKind::Label(text),
                    line: line_number,
                    char: start as u32,
                    span,
                });
                pos = end;
                continue;
            }
            if chars[pos].is_ascii_alphabetic() {
                let start = pos;
                if chars[start..].len() >= 7 && chars[start..start + 7] == ['r', 'a', 'n', 'd', 'o', 'm', '!'] {
                    tokens.push(Token {
                        kind: TokenKind::Random,
                        line: line_number,
                        char: start as u32,
                        span,
                    });
                    pos = start + 7;
                    continue;
                }
                let mut end = pos + 1;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                let kind = match text.as_str() {
                    "in" => TokenKind::In,
                    "let" => TokenKind::Let,
                    "not" => TokenKind::Not,
                    _ => TokenKind::Identifier(text),
                };
                tokens.push(Token {
                    kind,
                    line: line_number,
                    char: start as u32,
                    span,
                });
                pos = end;
                continue;
            }
            if chars[pos].is_ascii_digit() {
                let start = pos;
                let (end, value) = scan_literal(&chars, start);
                tokens.push(Token {
                    kind: TokenKind::Literal(value),
                    line: line_number,
                    char: start as u32,
                    span,
                });
                pos = end;
                continue;
            }
            if let Some((symbol, len)) = match_symbol(&chars[pos..]) {
                tokens.push(Token {
                    kind: TokenKind::Symbol(symbol),
                    line: line_number,
                    char: pos as u32,
                    span,
                });
                pos += len;
                continue;
            }
            return Err(CompilationError::at(
                CompilationErrorKind::UnknownToken,
                line_number,
                pos as u32,
            ));
        }

        if !carries_over {
            tokens.push(Token {
                kind: TokenKind::EndOfLine,
                line: line_number,
                char: chars.len() as u32,
                span,
            });
        }
        line_number += 1;
    }

    tokens.push(Token {
        kind: TokenKind::EndOfInput,
        line: line_number,
        char: 0,
        span: SourceLine::Single(line_number),
    });
    Ok(tokens)
}

/// Scans a `[0-9]+(\.[0-9]+)?[%kKmMbB]?` literal starting at `start`,
/// returning the position just past it and its canonical decimal value.
fn scan_literal(chars: &[char], start: usize) -> (usize, Decimal) {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    let whole_end = end;

    let mut fraction_end = None;
    if end < chars.len() && chars[end] == '.' && end + 1 < chars.len() && chars[end + 1].is_ascii_digit()
    {
        let mut f = end + 1;
        while f < chars.len() && chars[f].is_ascii_digit() {
            f += 1;
        }
        fraction_end = Some(f);
        end = f;
    }

    let suffix = if end < chars.len() && SUFFIX_SHIFT.iter().any(|(c, _)| *c == chars[end].to_ascii_lowercase())
    {
        let s = chars[end];
        end += 1;
        Some(s)
    } else {
        None
    };

    let whole: String = chars[start..whole_end].iter().collect();
    let fraction: Option<String> = fraction_end.map(|f| chars[whole_end + 1..f].iter().collect());
    let value = number_from_parts(&whole, fraction.as_deref(), suffix);
    (end, value)
}

/// Builds the canonical decimal value for a literal's digit/fraction/
/// suffix parts, matching the original compiler's `_number_from_match`:
/// shift the implicit decimal point by the suffix, pad with zeros as
/// needed, then trim leading/trailing zeros around the new point.
fn number_from_parts(whole: &str, fraction: Option<&str>, suffix: Option<char>) -> Decimal {
    let mut digits = whole.to_string();
    let mut decimal_point = whole.len() as i64;

    if let Some(fraction) = fraction {
        digits.push_str(fraction);
    }

    if let Some(suffix) = suffix {
        let shift = SUFFIX_SHIFT
            .iter()
            .find(|(c, _)| *c == suffix.to_ascii_lowercase())
            .map(|(_, shift)| *shift)
            .unwrap_or(0);
        decimal_point += shift;
    }

    if decimal_point <= 0 {
        digits = format!("{}{}", "0".repeat((-decimal_point) as usize), digits);
        decimal_point = 0;
    } else if decimal_point as usize > digits.len() {
        let zeros = decimal_point as usize - digits.len();
        digits.push_str(&"0".repeat(zeros));
        decimal_point = digits.len() as i64;
    }

    let (int_part, frac_part) = digits.split_at(decimal_point as usize);
    let int_trimmed = int_part.trim_start_matches('0');
    let frac_trimmed = frac_part.trim_end_matches('0');

    if int_trimmed.is_empty() && frac_trimmed.is_empty() {
        return Decimal::zero();
    }

    let int_str = if int_trimmed.is_empty() { "0" } else { int_trimmed };
    let text = if frac_trimmed.is_empty() {
        int_str.to_string()
    } else {
        format!("{}.{}", int_str, frac_trimmed)
    };
    Decimal::parse(&text).expect("literal scanned by the lexer grammar must parse")
}

/// Matches the longest symbol at the start of `chars`, trying two-
/// character symbols before their single-character prefixes.
fn match_symbol(chars: &[char]) -> Option<(Symbol, usize)> {
    let two = if chars.len() >= 2 {
        Some((chars[0], chars[1]))
    } else {
        None
    };
    if let Some(pair) = two {
        let symbol = match pair {
            ('=', '=') => Some(Symbol::EqEq),
            ('=', '>') => Some(Symbol::Arrow),
            ('!', '=') => Some(Symbol::NotEq),
            ('<', '=') => Some(Symbol::LtEq),
            ('>', '=') => Some(Symbol::GtEq),
            ('&', '&') => Some(Symbol::AndAnd),
            ('|', '|') => Some(Symbol::OrOr),
            _ => None,
        };
        if let Some(symbol) = symbol {
            return Some((symbol, 2));
        }
    }
    let symbol = match chars[0] {
        '=' => Symbol::Eq,
        '!' => Symbol::Bang,
        '<' => Symbol::Lt,
        '>' => Symbol::Gt,
        '+' => Symbol::Plus,
        '-' => Symbol::Minus,
        '*' => Symbol::Star,
        '/' => Symbol::Slash,
        '^' => Symbol::Caret,
        '?' => Symbol::Question,
        ':' => Symbol::Colon,
        ',' => Symbol::Comma,
        '(' => Symbol::LParen,
        ')' => Symbol::RParen,
        '[' => Symbol::LBracket,
        ']' => Symbol::RBracket,
        '{' => Symbol::LBrace,
        '}' => Symbol::RBrace,
        _ => return None,
    };
    Some((symbol, 1))
}

/// Canonicalizes a standalone number literal (not embedded in a larger
/// program), returning `None` if it doesn't match the literal grammar.
/// Used by callers that want to normalize user-entered literal text
/// (`"42k"` -> `"42000"`) without compiling a whole program.
pub fn canonicalize_number_literal(s: &str) -> Option<Decimal> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() || !chars[0].is_ascii_digit() {
        return None;
    }
    let (end, value) = scan_literal(&chars, 0);
    if end == chars.len() {
        Some(value)
    } else {
        None
    }
}
