//! Error-tolerant recursive descent parser for Spargel.
//!
//! The parser never fails. A required token that is absent becomes a
//! [`SyntaxToken::Missing`] slot without consuming input; a token that fits
//! nowhere is wrapped in an [`Unexpected`] node and skipped. Both are reported
//! as diagnostics, and the tree always covers the whole input.

use spargel_diag::{Diagnostic, DiagnosticId};

use crate::cst::*;
use crate::token::{KeywordKind, SyntaxToken, Token, TokenKind, show_byte};

/// The result of parsing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub source_file: SourceFile,
    /// Syntax diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Parse {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse a folded token stream into a [`SourceFile`].
///
/// `source` is the buffer the tokens were lexed from; it is only read to
/// describe unknown bytes in diagnostics.
///
/// # Panics
///
/// If `tokens` does not end with an `EndOfFile` token. The lexer always
/// produces one, so this only fires for hand-built streams.
pub fn parse(tokens: Vec<Token>, source: &[u8]) -> Parse {
    assert!(
        tokens
            .last()
            .is_some_and(|token| token.kind == TokenKind::EndOfFile),
        "token stream handed to the parser must end with EndOfFile"
    );
    debug_assert!(
        tokens.iter().all(|token| !token.kind.is_trivia()),
        "token stream handed to the parser must have its trivia folded"
    );

    let mut parser = Parser::new(tokens, source);
    let source_file = parser.source_file();
    tracing::debug!(
        items = source_file.items.len(),
        diagnostics = parser.errors.len(),
        "parsed"
    );
    Parse {
        source_file,
        diagnostics: parser.errors,
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src [u8],
    errors: Vec<Diagnostic>,
    /// Cursor position of the last reported missing token. Further missing
    /// tokens at the same position are recorded in the tree only.
    last_missing_at: Option<usize>,
}

impl<'src> Parser<'src> {
    fn new(tokens: Vec<Token>, source: &'src [u8]) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            errors: Vec::new(),
            last_missing_at: None,
        }
    }

    // -- Items --

    fn source_file(&mut self) -> SourceFile {
        let mut items = Vec::new();
        while !self.at_eof() {
            self.item(&mut items);
        }
        SourceFile {
            items,
            end_of_file: SyntaxToken::Present(self.advance()),
        }
    }

    /// Parse one item, or a run of attributes and the declaration they
    /// annotate. Always consumes at least one token.
    fn item(&mut self, items: &mut Vec<Item>) {
        let mut attributes = Vec::new();
        while self.check(TokenKind::At) {
            attributes.push(self.attribute());
        }

        match self.current_keyword() {
            Some(KeywordKind::Func) => {
                items.push(Item::Func(self.func_decl(attributes)));
                return;
            }
            Some(KeywordKind::Open) => {
                items.push(Item::Open(self.open_decl(attributes)));
                return;
            }
            Some(KeywordKind::Impl | KeywordKind::Trait | KeywordKind::Return) | None => {}
        }

        if !attributes.is_empty() {
            for attribute in attributes {
                self.dangling_attribute(&attribute);
                items.push(Item::Attribute(attribute));
            }
            return;
        }

        tracing::trace!(pos = self.pos, "skipping top-level token");
        items.push(Item::Unexpected(self.unexpected(DiagnosticId::ExpectedItem)));
    }

    fn open_decl(&mut self, attributes: Vec<Attribute>) -> OpenDecl {
        let open_keyword = SyntaxToken::Present(self.advance());
        let module_name = self.module_name();
        let semicolon = self
            .check(TokenKind::Semicolon)
            .then(|| SyntaxToken::Present(self.advance()));
        OpenDecl {
            attributes,
            open_keyword,
            module_name,
            semicolon,
        }
    }

    fn module_name(&mut self) -> ModuleName {
        let name = self.eat_name();
        let segments = self.qualified_segments();
        ModuleName { name, segments }
    }

    fn attribute(&mut self) -> Attribute {
        let at = SyntaxToken::Present(self.advance());
        let name = self.eat_name();
        let segments = self.qualified_segments();
        let arguments = self
            .check(TokenKind::LeftParen)
            .then(|| self.argument_list());
        Attribute {
            at,
            name,
            segments,
            arguments,
        }
    }

    fn qualified_segments(&mut self) -> Vec<QualifiedSegment> {
        let mut segments = Vec::new();
        while self.check(TokenKind::Period) {
            let period = SyntaxToken::Present(self.advance());
            let name = self.eat_name();
            segments.push(QualifiedSegment { period, name });
        }
        segments
    }

    fn func_decl(&mut self, attributes: Vec<Attribute>) -> FuncDecl {
        let func_keyword = SyntaxToken::Present(self.advance());
        let name = self.eat_func_name();
        let signature = self.func_sig();
        let body = self.block();
        FuncDecl {
            attributes,
            func_keyword,
            name,
            signature,
            body,
        }
    }

    fn func_sig(&mut self) -> FuncSig {
        let left_paren = self.eat_token(TokenKind::LeftParen);
        let mut params = Vec::new();
        if left_paren.is_present() {
            while self.check(TokenKind::Identifier) {
                let name = SyntaxToken::Present(self.advance());
                let comma = self.eat_optional(TokenKind::Comma);
                let done = comma.is_none();
                params.push(FuncParam { name, comma });
                if done {
                    break;
                }
            }
        }
        let right_paren = self.eat_closing(TokenKind::RightParen, &left_paren);
        FuncSig {
            left_paren,
            params,
            right_paren,
        }
    }

    // -- Blocks and statements --

    fn block(&mut self) -> Block {
        let left_brace = self.eat_token(TokenKind::LeftBrace);
        let mut items = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.at_eof() {
            items.push(self.block_item());
        }
        let right_brace = self.eat_closing(TokenKind::RightBrace, &left_brace);
        Block {
            left_brace,
            items,
            right_brace,
        }
    }

    fn block_item(&mut self) -> BlockItem {
        if self.current_keyword() == Some(KeywordKind::Return) {
            return BlockItem::Return(self.return_stmt());
        }
        if self.check(TokenKind::Identifier)
            && self
                .peek_at(1)
                .is_some_and(|next| next.kind == TokenKind::LeftParen)
        {
            return BlockItem::Call(self.func_call_expr());
        }
        tracing::trace!(pos = self.pos, "skipping block token");
        BlockItem::Unexpected(self.unexpected(DiagnosticId::UnexpectedToken))
    }

    fn return_stmt(&mut self) -> ReturnStmt {
        let return_keyword = SyntaxToken::Present(self.advance());
        let value = self.expression();
        let semicolon = self.eat_token(TokenKind::Semicolon);
        ReturnStmt {
            return_keyword,
            value,
            semicolon,
        }
    }

    fn func_call_expr(&mut self) -> FuncCallExpr {
        let callee = SyntaxToken::Present(self.advance());
        let arguments = self.argument_list();
        let semicolon = self.eat_token(TokenKind::Semicolon);
        FuncCallExpr {
            callee,
            arguments,
            semicolon,
        }
    }

    // -- Expressions --

    /// `None`, consuming nothing, when the current token cannot start an
    /// expression.
    fn expression(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.check(TokenKind::LeftParen) {
                let arguments = self.argument_list();
                expr = Expr::Call(Box::new(CallExpr {
                    callee: expr,
                    arguments,
                }));
            } else if self.check(TokenKind::Period) {
                let period = SyntaxToken::Present(self.advance());
                let member = self.eat_name();
                expr = Expr::Member(Box::new(MemberExpr {
                    base: expr,
                    period,
                    member,
                }));
            } else {
                return Some(expr);
            }
        }
    }

    fn primary(&mut self) -> Option<Expr> {
        if self.check_name() {
            return Some(Expr::Name(NameExpr {
                name: SyntaxToken::Present(self.advance()),
            }));
        }
        match self.peek_kind() {
            kind if kind.is_literal() => Some(Expr::Literal(LiteralExpr {
                literal: SyntaxToken::Present(self.advance()),
            })),
            TokenKind::LeftParen => {
                let left_paren = SyntaxToken::Present(self.advance());
                let inner = self.required_expression();
                let right_paren = self.eat_closing(TokenKind::RightParen, &left_paren);
                Some(Expr::Paren(Box::new(ParenExpr {
                    left_paren,
                    inner,
                    right_paren,
                })))
            }
            _ => None,
        }
    }

    fn required_expression(&mut self) -> Option<Expr> {
        let expr = self.expression();
        if expr.is_none() {
            self.report_missing(DiagnosticId::ExpectedExpression, vec![self.describe_current()]);
        }
        expr
    }

    /// `'(' (Expr (',' Expr)* ','?)? ')'`, entered at a `(`.
    fn argument_list(&mut self) -> ArgumentList {
        let left_paren = self.eat_token(TokenKind::LeftParen);
        let mut arguments = Vec::new();
        while !self.check(TokenKind::RightParen) && !self.at_eof() {
            let Some(value) = self.required_expression() else {
                break;
            };
            let comma = self.eat_optional(TokenKind::Comma);
            let done = comma.is_none();
            arguments.push(Argument { value, comma });
            if done {
                break;
            }
        }
        let right_paren = self.eat_closing(TokenKind::RightParen, &left_paren);
        ArgumentList {
            left_paren,
            arguments,
            right_paren,
        }
    }

    // -- Recovery --

    /// Consume the current token if it has `kind`; otherwise report it and
    /// return a missing slot without moving.
    fn eat_token(&mut self, kind: TokenKind) -> SyntaxToken {
        if self.check(kind) {
            return SyntaxToken::Present(self.advance());
        }
        self.missing(kind)
    }

    /// Any identifier, keyword text included.
    fn eat_name(&mut self) -> SyntaxToken {
        self.eat_token(TokenKind::Identifier)
    }

    /// A keyword here most likely starts the next declaration, so it is left
    /// in place rather than taken as the function's name.
    fn eat_func_name(&mut self) -> SyntaxToken {
        if self.check_name() {
            return SyntaxToken::Present(self.advance());
        }
        self.missing(TokenKind::Identifier)
    }

    fn eat_optional(&mut self, kind: TokenKind) -> Option<SyntaxToken> {
        self.check(kind).then(|| SyntaxToken::Present(self.advance()))
    }

    /// Eat a closing delimiter. When it is missing but its opener was
    /// present, the error carries a note pointing at the opener.
    fn eat_closing(&mut self, kind: TokenKind, opener: &SyntaxToken) -> SyntaxToken {
        if self.check(kind) {
            return SyntaxToken::Present(self.advance());
        }
        let reported = self.errors.len();
        let missing = self.missing(kind);
        if let Some(open) = opener.token()
            && self.errors.len() > reported
            && let Some(diagnostic) = self.errors.pop()
        {
            self.errors.push(diagnostic.note(
                DiagnosticId::UnclosedDelimiter,
                open.location,
                open.span,
                vec![open.kind.describe().to_string()],
            ));
        }
        missing
    }

    fn missing(&mut self, expected: TokenKind) -> SyntaxToken {
        tracing::trace!(pos = self.pos, expected = %expected, "synthesizing missing token");
        self.report_missing(
            DiagnosticId::ExpectedToken,
            vec![expected.describe().to_string(), self.describe_current()],
        );
        SyntaxToken::Missing {
            expected,
            location: self.current().location,
        }
    }

    /// Report at the current token unless something was already found
    /// missing here.
    fn report_missing(&mut self, id: DiagnosticId, args: Vec<String>) {
        if self.last_missing_at == Some(self.pos) {
            return;
        }
        self.last_missing_at = Some(self.pos);
        let (location, span) = (self.current().location, self.current().span);
        self.errors
            .push(Diagnostic::error(id, location, span, args));
    }

    /// Wrap the current token in an `Unexpected` node and step past it.
    /// Unknown bytes are always reported as invalid characters.
    fn unexpected(&mut self, id: DiagnosticId) -> Unexpected {
        let token = self.advance();
        let (id, args) = if token.kind == TokenKind::Unknown {
            (
                DiagnosticId::InvalidCharacter,
                vec![show_byte(self.source, token.span)],
            )
        } else {
            (id, vec![token.describe(self.source)])
        };
        self.errors
            .push(Diagnostic::error(id, token.location, token.span, args));
        Unexpected {
            token: SyntaxToken::Present(token),
        }
    }

    fn dangling_attribute(&mut self, attribute: &Attribute) {
        let Some(at) = attribute.at.token() else {
            return;
        };
        let last = attribute
            .segments
            .last()
            .map_or(attribute.name.span(), |segment| segment.name.span());
        let span = at.span.merge(last);
        let name = attribute
            .dotted_name()
            .unwrap_or_else(|| "<missing>".to_string());
        self.errors.push(Diagnostic::warning(
            DiagnosticId::DanglingAttribute,
            at.location,
            span,
            vec![name],
        ));
    }

    // -- Token stream helpers --

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn current_keyword(&self) -> Option<KeywordKind> {
        self.current().keyword
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// An identifier usable as a name: not a keyword.
    fn check_name(&self) -> bool {
        self.check(TokenKind::Identifier) && self.current_keyword().is_none()
    }

    fn at_eof(&self) -> bool {
        self.check(TokenKind::EndOfFile)
    }

    /// Take the current token. Never moves past the final `EndOfFile`.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn describe_current(&self) -> String {
        self.current().describe(self.source)
    }
}
