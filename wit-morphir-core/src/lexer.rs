//! Lexer for WIT source text.
//!
//! Errors are tokens: the lexer never fails, it hands an
//! [`TokenKind::Error`] token to the parser, which decides what to do.

use std::fmt;

use crate::span::Position;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Eof,
    Error,

    // Identifiers and literals
    Ident,
    Integer,

    // Punctuation
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LAngle,     // <
    RAngle,     // >
    Comma,      // ,
    Colon,      // :
    Semicolon,  // ;
    Equal,      // =
    Arrow,      // ->
    Star,       // *
    Slash,      // /
    Dot,        // .
    At,         // @
    Percent,    // %
    Underscore, // _

    // Keywords
    Package,
    Interface,
    World,
    Func,
    Type,
    Record,
    Variant,
    Enum,
    Flags,
    Resource,
    Use,
    As,
    Import,
    Export,
    Include,
    With,
    Constructor,
    Static,
    Async,
    Own,
    Borrow,

    // Builtin type names
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F32,
    F64,
    Bool,
    Char,
    String,
    List,
    Option,
    Result,
    Tuple,
    Future,
    Stream,
}

impl TokenKind {
    /// Keyword table lookup. Unmatched text is a plain identifier.
    pub fn from_word(text: &str) -> TokenKind {
        match text {
            "package" => TokenKind::Package,
            "interface" => TokenKind::Interface,
            "world" => TokenKind::World,
            "func" => TokenKind::Func,
            "type" => TokenKind::Type,
            "record" => TokenKind::Record,
            "variant" => TokenKind::Variant,
            "enum" => TokenKind::Enum,
            "flags" => TokenKind::Flags,
            "resource" => TokenKind::Resource,
            "use" => TokenKind::Use,
            "as" => TokenKind::As,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "include" => TokenKind::Include,
            "with" => TokenKind::With,
            "constructor" => TokenKind::Constructor,
            "static" => TokenKind::Static,
            "async" => TokenKind::Async,
            "own" => TokenKind::Own,
            "borrow" => TokenKind::Borrow,
            "u8" => TokenKind::U8,
            "u16" => TokenKind::U16,
            "u32" => TokenKind::U32,
            "u64" => TokenKind::U64,
            "s8" => TokenKind::S8,
            "s16" => TokenKind::S16,
            "s32" => TokenKind::S32,
            "s64" => TokenKind::S64,
            "f32" => TokenKind::F32,
            "f64" => TokenKind::F64,
            "bool" => TokenKind::Bool,
            "char" => TokenKind::Char,
            "string" => TokenKind::String,
            "list" => TokenKind::List,
            "option" => TokenKind::Option,
            "result" => TokenKind::Result,
            "tuple" => TokenKind::Tuple,
            "future" => TokenKind::Future,
            "stream" => TokenKind::Stream,
            _ => TokenKind::Ident,
        }
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Package
                | Interface
                | World
                | Func
                | Type
                | Record
                | Variant
                | Enum
                | Flags
                | Resource
                | Use
                | As
                | Import
                | Export
                | Include
                | With
                | Constructor
                | Static
                | Async
                | Own
                | Borrow
        )
    }

    pub fn is_builtin_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            U8 | U16
                | U32
                | U64
                | S8
                | S16
                | S32
                | S64
                | F32
                | F64
                | Bool
                | Char
                | String
                | List
                | Option
                | Result
                | Tuple
                | Future
                | Stream
        )
    }

    /// Identifier or any reserved word, for positions where WIT accepts
    /// keywords as names (field names, method names, ...).
    pub fn is_word(self) -> bool {
        self == TokenKind::Ident || self.is_keyword() || self.is_builtin_type()
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid token",
            TokenKind::Ident => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Equal => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Dot => "'.'",
            TokenKind::At => "'@'",
            TokenKind::Percent => "'%'",
            TokenKind::Underscore => "'_'",
            TokenKind::Package => "'package'",
            TokenKind::Interface => "'interface'",
            TokenKind::World => "'world'",
            TokenKind::Func => "'func'",
            TokenKind::Type => "'type'",
            TokenKind::Record => "'record'",
            TokenKind::Variant => "'variant'",
            TokenKind::Enum => "'enum'",
            TokenKind::Flags => "'flags'",
            TokenKind::Resource => "'resource'",
            TokenKind::Use => "'use'",
            TokenKind::As => "'as'",
            TokenKind::Import => "'import'",
            TokenKind::Export => "'export'",
            TokenKind::Include => "'include'",
            TokenKind::With => "'with'",
            TokenKind::Constructor => "'constructor'",
            TokenKind::Static => "'static'",
            TokenKind::Async => "'async'",
            TokenKind::Own => "'own'",
            TokenKind::Borrow => "'borrow'",
            TokenKind::U8 => "'u8'",
            TokenKind::U16 => "'u16'",
            TokenKind::U32 => "'u32'",
            TokenKind::U64 => "'u64'",
            TokenKind::S8 => "'s8'",
            TokenKind::S16 => "'s16'",
            TokenKind::S32 => "'s32'",
            TokenKind::S64 => "'s64'",
            TokenKind::F32 => "'f32'",
            TokenKind::F64 => "'f64'",
            TokenKind::Bool => "'bool'",
            TokenKind::Char => "'char'",
            TokenKind::String => "'string'",
            TokenKind::List => "'list'",
            TokenKind::Option => "'option'",
            TokenKind::Result => "'result'",
            TokenKind::Tuple => "'tuple'",
            TokenKind::Future => "'future'",
            TokenKind::Stream => "'stream'",
        };
        f.write_str(text)
    }
}

/// A single token.
///
/// `docs` holds the `///` comment lines that appeared between the
/// previous token and this one, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: Position,
    pub end: Position,
    pub docs: Vec<String>,
}

pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    index: usize,
    line: usize,
    column: usize,
    pending_docs: Vec<String>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Lexer<'src> {
        Lexer {
            source,
            bytes: source.as_bytes(),
            index: 0,
            line: 1,
            column: 1,
            pending_docs: Vec::new(),
        }
    }

    /// Lex the next token. After the end of input this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.position();
        let Some(ch) = self.peek_char() else {
            return self.token(TokenKind::Eof, start, String::new());
        };

        let kind = match ch {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'<' => Some(TokenKind::LAngle),
            b'>' => Some(TokenKind::RAngle),
            b',' => Some(TokenKind::Comma),
            b':' => Some(TokenKind::Colon),
            b';' => Some(TokenKind::Semicolon),
            b'=' => Some(TokenKind::Equal),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'.' => Some(TokenKind::Dot),
            b'@' => Some(TokenKind::At),
            b'%' => Some(TokenKind::Percent),
            b'_' if !self.peek_next().is_some_and(is_ident_continue) => {
                Some(TokenKind::Underscore)
            }
            _ => None,
        };
        if let Some(kind) = kind {
            self.consume_char();
            return self.simple_token(kind, start);
        }

        if ch == b'-' {
            self.consume_char();
            if self.peek_char() == Some(b'>') {
                self.consume_char();
                return self.simple_token(TokenKind::Arrow, start);
            }
            return self.token(TokenKind::Error, start, "unexpected '-'".to_string());
        }

        if ch.is_ascii_digit() {
            return self.lex_integer(start);
        }

        if is_ident_start(ch) {
            return self.lex_word(start);
        }

        // Decode the full character so multi-byte input is reported intact.
        let offending = self.source[self.index..].chars().next().unwrap_or('\u{fffd}');
        for _ in 0..offending.len_utf8() {
            self.consume_char();
        }
        self.token(
            TokenKind::Error,
            start,
            format!("unexpected character {offending:?}"),
        )
    }

    /// Lex up to and including the first `Eof` or `Error` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Error);
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => self.consume_char(),
                b'/' if self.peek_next() == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_next() == Some(b'*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        let start = self.index;
        while let Some(ch) = self.peek_char() {
            if ch == b'\n' {
                break;
            }
            self.consume_char();
        }
        let text = &self.source[start..self.index];
        // `///` is documentation, `////...` is an ordinary comment.
        if let Some(doc) = text.strip_prefix("///") {
            if !doc.starts_with('/') {
                let doc = doc.strip_prefix(' ').unwrap_or(doc);
                self.pending_docs.push(doc.trim_end().to_string());
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.consume_char(); // '/'
        self.consume_char(); // '*'
        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek_char(), self.peek_next()) {
                (None, _) => break,
                (Some(b'/'), Some(b'*')) => {
                    self.consume_char();
                    self.consume_char();
                    depth += 1;
                }
                (Some(b'*'), Some(b'/')) => {
                    self.consume_char();
                    self.consume_char();
                    depth -= 1;
                }
                _ => self.consume_char(),
            }
        }
    }

    fn lex_integer(&mut self, start: Position) -> Token {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.consume_char();
        }
        let text = self.source[start.offset..self.index].to_string();
        self.token(TokenKind::Integer, start, text)
    }

    fn lex_word(&mut self, start: Position) -> Token {
        self.consume_char();
        while self.peek_char().is_some_and(is_ident_continue) {
            self.consume_char();
        }
        let text = &self.source[start.offset..self.index];
        let kind = TokenKind::from_word(text);
        self.token(kind, start, text.to_string())
    }

    fn simple_token(&mut self, kind: TokenKind, start: Position) -> Token {
        let text = self.source[start.offset..self.index].to_string();
        self.token(kind, start, text)
    }

    fn token(&mut self, kind: TokenKind, start: Position, value: String) -> Token {
        Token {
            kind,
            value,
            start,
            end: self.position(),
            docs: std::mem::take(&mut self.pending_docs),
        }
    }

    fn position(&self) -> Position {
        Position::new(self.index, self.line, self.column)
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        let Some(ch) = self.peek_char() else {
            return;
        };
        self.index += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if ch & 0xC0 != 0x80 {
            // continuation bytes of a UTF-8 sequence share one column
            self.column += 1;
        }
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'-' || ch == b'_'
}
