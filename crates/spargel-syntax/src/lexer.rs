//! Hand-written lexer for Spargel source code.
//!
//! Lexing runs four passes over one token list:
//!
//! 1. scan bytes into raw tokens, trivia included, ending in `EndOfFile`;
//! 2. annotate every token with its line and column;
//! 3. fold trivia onto the substantive tokens around it;
//! 4. decode identifier and literal text and classify keywords.
//!
//! Lexing is total. A byte that starts no known unit becomes a one-byte
//! `Unknown` token and the parser decides whether to complain about it.

use spargel_source::{FileId, SourceBuffer, SourceLocation, SourceSpan};

use crate::token::{KeywordKind, Token, TokenKind};

/// Knobs for [`lex_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexOptions {
    /// Attach trivia to neighbouring tokens. When off, trivia tokens stay in
    /// the list as standalone entries.
    pub fold_trivia: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        Self { fold_trivia: true }
    }
}

/// Lex a buffer with trivia folding on.
///
/// The last token is always `EndOfFile`.
pub fn lex(buffer: &SourceBuffer) -> Vec<Token> {
    lex_with_options(buffer, LexOptions::default())
}

pub fn lex_with_options(buffer: &SourceBuffer, options: LexOptions) -> Vec<Token> {
    let source = buffer.bytes();

    let mut tokens = Lexer::new(source, buffer.id()).scan_all();
    tracing::debug!(file = buffer.name(), tokens = tokens.len(), "scanned");

    annotate(&mut tokens, buffer.id());

    if options.fold_trivia {
        tokens = fold_trivia(tokens);
        tracing::debug!(tokens = tokens.len(), "folded trivia");
    }

    decode(&mut tokens, buffer);
    tokens
}

// ---------------------------------------------------------------------------
// Pass 1: scan
// ---------------------------------------------------------------------------

struct Lexer<'src> {
    source: &'src [u8],
    file: FileId,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src [u8], file: FileId) -> Self {
        Self {
            source,
            file,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn scan_all(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.scan_token();
        }
        self.emit(TokenKind::EndOfFile, self.pos);
        self.tokens
    }

    fn scan_token(&mut self) {
        let start = self.pos;
        let ch = self.advance();

        match ch {
            b'\n' => self.emit(TokenKind::Newline, start),
            b' ' => {
                while self.peek() == Some(b' ') {
                    self.advance();
                }
                self.emit(TokenKind::Whitespace, start);
            }
            b'/' if self.match_char(b'/') => {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.advance();
                }
                self.emit(TokenKind::LineComment, start);
            }

            b'(' => self.emit(TokenKind::LeftParen, start),
            b')' => self.emit(TokenKind::RightParen, start),
            b'{' => self.emit(TokenKind::LeftBrace, start),
            b'}' => self.emit(TokenKind::RightBrace, start),
            b'@' => self.emit(TokenKind::At, start),
            b',' => self.emit(TokenKind::Comma, start),
            b'=' => self.emit(TokenKind::Equal, start),
            b'.' => self.emit(TokenKind::Period, start),
            b';' => self.emit(TokenKind::Semicolon, start),

            c if c.is_ascii_digit() => self.scan_number(start, c),
            c if is_ident_start(c) => self.scan_ident(start),

            // Exactly one byte, whatever it is.
            _ => self.emit(TokenKind::Unknown, start),
        }
    }

    fn scan_number(&mut self, start: usize, first: u8) {
        if first == b'0' {
            if let Some(b'x' | b'X') = self.peek()
                && self.peek_next().is_some_and(|c| c.is_ascii_hexdigit())
            {
                self.advance();
                self.eat_while(|c| c.is_ascii_hexdigit());
                self.emit(TokenKind::IntegerLiteral, start);
                return;
            }
            if let Some(b'b' | b'B') = self.peek()
                && self.peek_next().is_some_and(|c| c == b'0' || c == b'1')
            {
                self.advance();
                self.eat_while(|c| c == b'0' || c == b'1');
                self.emit(TokenKind::IntegerLiteral, start);
                return;
            }
        }

        self.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;

        // `1.foo` is an integer followed by a period.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        if let Some(b'e' | b'E') = self.peek() {
            let digits_at = match self.peek_next() {
                Some(b'+' | b'-') => self.pos + 2,
                _ => self.pos + 1,
            };
            if self.source.get(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos = digits_at;
                self.eat_while(|c| c.is_ascii_digit());
                is_float = true;
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntegerLiteral
        };
        self.emit(kind, start);
    }

    fn scan_ident(&mut self, start: usize) {
        self.eat_while(is_ident_continue);
        self.emit(TokenKind::Identifier, start);
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    fn match_char(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize) {
        // Positions are placeholders until the annotate pass runs.
        let span = SourceSpan::new(start as u32, self.pos as u32);
        self.tokens
            .push(Token::new(kind, span, SourceLocation::start_of(self.file)));
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

// ---------------------------------------------------------------------------
// Pass 2: annotate
// ---------------------------------------------------------------------------

fn annotate(tokens: &mut [Token], file_id: FileId) {
    let mut line = 1;
    let mut line_offset = 0;
    for token in tokens {
        token.location = SourceLocation {
            line,
            column: token.span.start - line_offset + 1,
            byte_position: token.span.start,
            file_id,
        };
        if token.kind == TokenKind::Newline {
            line += 1;
            line_offset = token.span.end;
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 3: fold trivia
// ---------------------------------------------------------------------------

/// Everything up to a substantive token is its leading trivia; same-line
/// trivia after it, stopping before a newline, is its trailing trivia.
fn fold_trivia(tokens: Vec<Token>) -> Vec<Token> {
    let mut folded = Vec::with_capacity(tokens.len() / 2 + 1);
    let mut leading = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(mut token) = iter.next() {
        if token.kind.is_trivia() {
            leading.push(token);
            continue;
        }
        token.leading_trivia = std::mem::take(&mut leading);
        while let Some(trivia) =
            iter.next_if(|next| next.kind.is_trivia() && next.kind != TokenKind::Newline)
        {
            token.trailing_trivia.push(trivia);
        }
        folded.push(token);
    }

    debug_assert!(leading.is_empty(), "trivia after the end-of-file token");
    folded
}

// ---------------------------------------------------------------------------
// Pass 4: decode and classify
// ---------------------------------------------------------------------------

fn decode(tokens: &mut [Token], buffer: &SourceBuffer) {
    for token in tokens.iter_mut().filter(|token| token.kind.carries_text()) {
        let text = String::from_utf8_lossy(buffer.slice(token.span)).into_owned();
        if token.kind == TokenKind::Identifier {
            token.keyword = KeywordKind::from_text(&text);
        }
        token.text = Some(text);
    }
}
