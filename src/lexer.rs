use crate::error::{ErrorList, LionError};
use std::fmt::Display;

/// A 1-based, inclusive span of lines and columns in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Region {
    pub fn new(start_line: usize, end_line: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_col,
            end_col,
        }
    }

    /// A region covering a single column.
    pub fn point(line: usize, col: usize) -> Self {
        Self::new(line, line, col, col)
    }

    /// Component-wise minimum of the starts and maximum of the ends.
    #[must_use]
    pub fn combine(&self, other: &Region) -> Region {
        Region {
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
            start_col: self.start_col.min(other.start_col),
            end_col: self.end_col.max(other.end_col),
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// Represents the different kinds of tokens that the lexer can produce.
/// Literal tokens carry their parsed value.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Literals ==
    /// A base-2, base-8, base-10 or base-16 integer literal.
    Integer(i64),
    /// A number literal containing a decimal point.
    Float(f64),
    /// A string literal, enclosed in double quotes, taken verbatim.
    String(String),
    /// `true` or `false`.
    Boolean(bool),

    // == Names ==
    /// A run of ASCII letters, used for keys and type names.
    Identifier(String),
    /// An `@` followed by letters, e.g. `@doc`, `@schema`, `@definition`, `@subschema`.
    /// The associated `String` includes the `@`.
    Modifier(String),

    // == Punctuation ==
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Colon: `:`
    Colon,
    /// Comma: `,`
    Comma,
    /// Opens a type parameter: `<`
    OfTypeStart,
    /// Closes a type parameter: `>`
    OfTypeEnd,
    /// Marks a schema property as optional: `?`
    OptionalProperty,

    /// Represents the end of the input.
    Eof,
}

impl TokenType {
    /// True when both token types are the same kind, ignoring their payloads.
    pub fn same_kind(&self, other: &TokenType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Upper-case kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::Integer(_) => "INTEGER",
            TokenType::Float(_) => "FLOAT",
            TokenType::String(_) => "STRING",
            TokenType::Boolean(_) => "BOOLEAN",
            TokenType::Identifier(_) => "IDENTIFIER",
            TokenType::Modifier(_) => "MODIFIER",
            TokenType::LBracket => "LBRACKET",
            TokenType::RBracket => "RBRACKET",
            TokenType::LBrace => "LBRACE",
            TokenType::RBrace => "RBRACE",
            TokenType::Colon => "COLON",
            TokenType::Comma => "COMMA",
            TokenType::OfTypeStart => "OF_TYPE_START",
            TokenType::OfTypeEnd => "OF_TYPE_END",
            TokenType::OptionalProperty => "OPTIONAL_PROPERTY",
            TokenType::Eof => "EOF",
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Integer(n) => write!(f, "{n}"),
            TokenType::Float(n) => write!(f, "{n}"),
            TokenType::String(s) => write!(f, "\"{s}\""),
            TokenType::Boolean(b) => write!(f, "{b}"),
            TokenType::Identifier(s) | TokenType::Modifier(s) => write!(f, "{s}"),
            TokenType::LBracket => write!(f, "["),
            TokenType::RBracket => write!(f, "]"),
            TokenType::LBrace => write!(f, "{{"),
            TokenType::RBrace => write!(f, "}}"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Comma => write!(f, ","),
            TokenType::OfTypeStart => write!(f, "<"),
            TokenType::OfTypeEnd => write!(f, ">"),
            TokenType::OptionalProperty => write!(f, "?"),
            TokenType::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its type and source region
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ttype: TokenType,
    pub region: Region,
}

impl Token {
    pub fn new(ttype: TokenType, region: Region) -> Token {
        Token { ttype, region }
    }
}

/// Returned when lexing stops at a malformed literal. The error has already
/// been recorded; `partial` holds the tokens produced before that point and
/// does not end with [`TokenType::Eof`].
#[derive(Debug, Clone, PartialEq)]
pub struct LexAbort {
    pub partial: Vec<Token>,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn lex(&mut self, errors: &mut ErrorList) -> Result<Vec<Token>, LexAbort> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.peek() {
            let region = Region::point(self.line, self.col);
            let single = match c {
                '{' => Some(TokenType::LBrace),
                '}' => Some(TokenType::RBrace),
                '[' => Some(TokenType::LBracket),
                ']' => Some(TokenType::RBracket),
                '<' => Some(TokenType::OfTypeStart),
                '>' => Some(TokenType::OfTypeEnd),
                ':' => Some(TokenType::Colon),
                ',' => Some(TokenType::Comma),
                '?' => Some(TokenType::OptionalProperty),
                _ => None,
            };
            if let Some(ttype) = single {
                self.advance();
                tokens.push(Token::new(ttype, region));
                continue;
            }

            let token = match c {
                '"' => self.read_string(errors),
                't' if self.rest().starts_with("true") => Ok(self.read_keyword(4, true)),
                'f' if self.rest().starts_with("false") => Ok(self.read_keyword(5, false)),
                c if c.is_ascii_digit() => self.read_number(errors),
                c if c.is_ascii_alphabetic() => Ok(self.read_identifier()),
                '@' => Ok(self.read_modifier()),
                // Whitespace and anything unrecognized is skipped.
                _ => {
                    self.advance();
                    continue;
                }
            };

            match token {
                Ok(token) => tokens.push(token),
                Err(()) => {
                    log::trace!("lexing aborted after {} tokens", tokens.len());
                    return Err(LexAbort { partial: tokens });
                }
            }
        }
        tokens.push(Token::new(
            TokenType::Eof,
            Region::point(self.line, self.col),
        ));
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
            match c {
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                '\r' => self.col = 1,
                '\t' => self.col += 4,
                _ => self.col += 1,
            }
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn read_string(&mut self, errors: &mut ErrorList) -> Result<Token, ()> {
        let (start_line, start_col) = (self.line, self.col);
        self.advance(); // Consume the opening quote
        let mut value = String::new();
        while let Some(&c) = self.peek() {
            if c == '"' {
                let end_col = self.col;
                let end_line = self.line;
                self.advance(); // Consume the closing quote
                return Ok(Token::new(
                    TokenType::String(value),
                    Region::new(start_line, end_line, start_col, end_col),
                ));
            }
            value.push(c);
            self.advance();
        }
        let _ = errors.add(
            LionError::lex(
                "Unterminated string.",
                Region::new(start_line, self.line, start_col, self.col),
            )
            .with_description("Add a closing '\"' to end the string."),
        );
        Err(())
    }

    fn read_keyword(&mut self, len: usize, value: bool) -> Token {
        let region = Region::new(self.line, self.line, self.col, self.col + len - 1);
        for _ in 0..len {
            self.advance();
        }
        Token::new(TokenType::Boolean(value), region)
    }

    fn read_identifier(&mut self) -> Token {
        let (line, start_col) = (self.line, self.col);
        let ident = self.read_letters();
        Token::new(
            TokenType::Identifier(ident),
            Region::new(line, line, start_col, self.col - 1),
        )
    }

    fn read_modifier(&mut self) -> Token {
        let (line, start_col) = (self.line, self.col);
        self.advance(); // Consume the '@'
        let mut name = String::from("@");
        name.push_str(&self.read_letters());
        Token::new(
            TokenType::Modifier(name),
            Region::new(line, line, start_col, self.col - 1),
        )
    }

    fn read_letters(&mut self) -> String {
        let mut letters = String::new();
        while let Some(&c) = self.peek() {
            if c.is_ascii_alphabetic() {
                letters.push(c);
                self.advance();
            } else {
                break;
            }
        }
        letters
    }

    fn read_number(&mut self, errors: &mut ErrorList) -> Result<Token, ()> {
        let (line, start_col) = (self.line, self.col);
        let mut number_str = String::new();
        let mut is_float = false;
        let mut contains_letter = false;

        while let Some(&c) = self.peek() {
            let is_marker = matches!(c, 'b' | 'x' | 'o');
            if !(c.is_ascii_digit() || c == '.' || is_marker) {
                break;
            }
            let here = Region::point(self.line, self.col);
            if c == '.' && (is_float || contains_letter) {
                let description = if contains_letter {
                    "A number marked as binary, hexadecimal or octal cannot contain a decimal point."
                } else {
                    "Multiple decimal points in a number. Try removing one."
                };
                let _ = errors.add(LionError::lex("Invalid float.", here).with_description(description));
                return Err(());
            }
            if is_marker && (is_float || contains_letter) {
                let _ = errors.add(LionError::lex("Invalid number.", here).with_description(
                    "Number contains letters. Numbers cannot contain letters except for prefixes \"0x\", \"0b\" and \"0o\".",
                ));
                return Err(());
            }
            is_float |= c == '.';
            contains_letter |= is_marker;
            number_str.push(c);
            self.advance();
        }

        let region = Region::new(line, line, start_col, self.col - 1);
        let ttype = if let Some(radix) = radix_of(&number_str) {
            let digits: String = number_str.chars().filter(|c| c.is_ascii_digit()).collect();
            i64::from_str_radix(&digits, radix).map(TokenType::Integer).ok()
        } else if is_float {
            number_str.parse::<f64>().map(TokenType::Float).ok()
        } else {
            number_str.parse::<i64>().map(TokenType::Integer).ok()
        };

        match ttype {
            Some(ttype) => Ok(Token::new(ttype, region)),
            None => {
                let _ = errors.add(
                    LionError::lex("Invalid number.", region).with_description(format!(
                        "'{number_str}' is not a valid number in its base or is out of range."
                    )),
                );
                Err(())
            }
        }
    }
}

fn radix_of(number: &str) -> Option<u32> {
    if number.contains('b') {
        Some(2)
    } else if number.contains('x') {
        Some(16)
    } else if number.contains('o') {
        Some(8)
    } else {
        None
    }
}
