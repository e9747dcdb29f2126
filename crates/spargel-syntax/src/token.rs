//! Token types produced by the Spargel lexer.

use std::fmt;

use spargel_source::{SourceLocation, SourceSpan};

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A single byte no other rule accepts.
    Unknown,
    /// Zero-width sentinel; always the last token.
    EndOfFile,

    // -- Trivia --
    /// A single `\n`.
    Newline,
    /// A run of spaces.
    Whitespace,
    /// `//` up to the end of the line, excluding the newline.
    LineComment,

    // -- Words and literals --
    Identifier,
    IntegerLiteral,
    FloatLiteral,

    // -- Delimiters --
    LeftBrace,  // {
    RightBrace, // }
    LeftParen,  // (
    RightParen, // )

    // -- Punctuation --
    At,        // @
    Comma,     // ,
    Equal,     // =
    Period,    // .
    Semicolon, // ;
}

impl TokenKind {
    /// Newlines, whitespace and comments are folded onto neighbouring tokens.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Whitespace | TokenKind::LineComment
        )
    }

    /// Tokens whose decoded text is kept on the token.
    pub fn carries_text(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::IntegerLiteral | TokenKind::FloatLiteral
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::IntegerLiteral | TokenKind::FloatLiteral)
    }

    /// How the kind reads in a diagnostic, e.g. ``expected `)` ``.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Unknown => "unknown character",
            TokenKind::EndOfFile => "end of file",
            TokenKind::Newline => "newline",
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::At => "`@`",
            TokenKind::Comma => "`,`",
            TokenKind::Equal => "`=`",
            TokenKind::Period => "`.`",
            TokenKind::Semicolon => "`;`",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Reserved words. Keyword-ness is a property of an `Identifier` token, not a
/// separate token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordKind {
    Func,
    Open,
    Impl,
    Trait,
    Return,
}

impl KeywordKind {
    pub const ALL: [KeywordKind; 5] = [
        KeywordKind::Func,
        KeywordKind::Open,
        KeywordKind::Impl,
        KeywordKind::Trait,
        KeywordKind::Return,
    ];

    /// Case-sensitive lookup.
    pub fn from_text(text: &str) -> Option<KeywordKind> {
        match text {
            "func" => Some(KeywordKind::Func),
            "open" => Some(KeywordKind::Open),
            "impl" => Some(KeywordKind::Impl),
            "trait" => Some(KeywordKind::Trait),
            "return" => Some(KeywordKind::Return),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeywordKind::Func => "func",
            KeywordKind::Open => "open",
            KeywordKind::Impl => "impl",
            KeywordKind::Trait => "trait",
            KeywordKind::Return => "return",
        }
    }
}

/// A token with its kind, source span and attached trivia.
///
/// Leading trivia is everything between the previous substantive token's
/// trailing trivia and this token. Trailing trivia is same-line whitespace and
/// comments after this token, up to but excluding the next newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
    pub location: SourceLocation,
    /// Decoded source text, for identifiers and literals only.
    pub text: Option<String>,
    pub leading_trivia: Vec<Token>,
    pub trailing_trivia: Vec<Token>,
    pub keyword: Option<KeywordKind>,
}

impl Token {
    pub fn new(kind: TokenKind, span: SourceSpan, location: SourceLocation) -> Self {
        Self {
            kind,
            span,
            location,
            text: None,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
            keyword: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_keyword(&self, keyword: KeywordKind) -> bool {
        self.keyword == Some(keyword)
    }

    /// Append leading trivia, the token's own bytes and trailing trivia.
    pub fn write_source(&self, source: &[u8], out: &mut Vec<u8>) {
        for trivia in &self.leading_trivia {
            trivia.write_source(source, out);
        }
        out.extend_from_slice(span_bytes(source, self.span));
        for trivia in &self.trailing_trivia {
            trivia.write_source(source, out);
        }
    }

    /// How this particular token reads in a diagnostic.
    pub fn describe(&self, source: &[u8]) -> String {
        match (self.kind, self.keyword, self.text()) {
            (_, Some(keyword), _) => format!("keyword `{}`", keyword.as_str()),
            (kind, None, Some(text)) => format!("{} `{text}`", kind.describe()),
            (TokenKind::Unknown, _, _) => format!("`{}`", show_byte(source, self.span)),
            (kind, _, _) => kind.describe().to_string(),
        }
    }
}

/// Printable ASCII as itself, anything else as `0x..`.
pub(crate) fn show_byte(source: &[u8], span: SourceSpan) -> String {
    match span_bytes(source, span).first() {
        Some(byte) if (0x20..=0x7e).contains(byte) => (*byte as char).to_string(),
        Some(byte) => format!("0x{byte:02x}"),
        None => String::new(),
    }
}

fn span_bytes(source: &[u8], span: SourceSpan) -> &[u8] {
    let end = (span.end as usize).min(source.len());
    let start = (span.start as usize).min(end);
    &source[start..end]
}

/// A token slot in the syntax tree: either the token the parser consumed or a
/// record of the token it expected and did not find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxToken {
    Present(Token),
    /// Zero-width, no text, no trivia; contributes nothing to the source text.
    Missing {
        expected: TokenKind,
        location: SourceLocation,
    },
}

impl SyntaxToken {
    pub fn is_present(&self) -> bool {
        matches!(self, SyntaxToken::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        !self.is_present()
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            SyntaxToken::Present(token) => token.kind,
            SyntaxToken::Missing { expected, .. } => *expected,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            SyntaxToken::Present(token) => Some(token),
            SyntaxToken::Missing { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.token().and_then(Token::text)
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            SyntaxToken::Present(token) => token.location,
            SyntaxToken::Missing { location, .. } => *location,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            SyntaxToken::Present(token) => token.span,
            SyntaxToken::Missing { location, .. } => SourceSpan::empty(location.byte_position),
        }
    }
}

/// Reconstruct source bytes from a token list.
///
/// The key invariant: for any buffer,
/// `reconstruct_source(&lex(buffer), buffer.bytes()) == buffer.bytes()`.
pub fn reconstruct_source(tokens: &[Token], source: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(source.len());
    for token in tokens {
        token.write_source(source, &mut output);
    }
    output
}

#[cfg(test)]
mod tests {
    use spargel_source::FileId;

    use super::*;

    fn token(kind: TokenKind, start: u32, end: u32) -> Token {
        Token::new(
            kind,
            SourceSpan::new(start, end),
            SourceLocation::start_of(FileId(0)),
        )
    }

    #[test]
    fn keyword_lookup_is_case_sensitive() {
        for keyword in KeywordKind::ALL {
            assert_eq!(KeywordKind::from_text(keyword.as_str()), Some(keyword));
        }
        assert_eq!(KeywordKind::from_text("Func"), None);
        assert_eq!(KeywordKind::from_text("let"), None);
    }

    #[test]
    fn describe_prefers_keyword_then_text() {
        let source = b"func main $";
        let mut func = token(TokenKind::Identifier, 0, 4);
        func.text = Some("func".into());
        func.keyword = Some(KeywordKind::Func);
        assert_eq!(func.describe(source), "keyword `func`");

        let mut main = token(TokenKind::Identifier, 5, 9);
        main.text = Some("main".into());
        assert_eq!(main.describe(source), "identifier `main`");

        assert_eq!(token(TokenKind::Unknown, 10, 11).describe(source), "`$`");
        assert_eq!(token(TokenKind::EndOfFile, 11, 11).describe(source), "end of file");
    }

    #[test]
    fn non_printable_bytes_show_as_hex() {
        assert_eq!(show_byte(&[0x07], SourceSpan::new(0, 1)), "0x07");
        assert_eq!(show_byte(&[0xff], SourceSpan::new(0, 1)), "0xff");
    }

    #[test]
    fn missing_token_is_zero_width() {
        let location = SourceLocation {
            line: 2,
            column: 3,
            byte_position: 9,
            file_id: FileId(0),
        };
        let missing = SyntaxToken::Missing {
            expected: TokenKind::RightParen,
            location,
        };
        assert!(missing.is_missing());
        assert_eq!(missing.kind(), TokenKind::RightParen);
        assert_eq!(missing.text(), None);
        assert_eq!(missing.span(), SourceSpan::empty(9));
    }
}
