//! Concrete syntax tree for Spargel.
//!
//! Every node owns its tokens, trivia included, so a tree reproduces the exact
//! source it was parsed from. Token slots are [`SyntaxToken`]s: a slot the
//! parser had to synthesize is `Missing` and contributes no text.
//!
//! Nodes are plain structs and enums. [`SyntaxNode`] is a borrowed,
//! kind-tagged view over any of them for generic traversal.

use std::fmt;

use crate::token::{SyntaxToken, Token};

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// The root node. Owns the end-of-file token so trailing trivia survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub end_of_file: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Open(OpenDecl),
    Func(FuncDecl),
    /// Attributes with no declaration after them.
    Attribute(Attribute),
    Unexpected(Unexpected),
}

/// `open std.io;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDecl {
    pub attributes: Vec<Attribute>,
    pub open_keyword: SyntaxToken,
    pub module_name: ModuleName,
    pub semicolon: Option<SyntaxToken>,
}

/// A dotted module path. The first segment is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleName {
    pub name: SyntaxToken,
    pub segments: Vec<QualifiedSegment>,
}

/// `.name` continuing a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedSegment {
    pub period: SyntaxToken,
    pub name: SyntaxToken,
}

/// `@shader.fragment` or `@location(5)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub at: SyntaxToken,
    pub name: SyntaxToken,
    pub segments: Vec<QualifiedSegment>,
    pub arguments: Option<ArgumentList>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub attributes: Vec<Attribute>,
    pub func_keyword: SyntaxToken,
    pub name: SyntaxToken,
    pub signature: FuncSig,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSig {
    pub left_paren: SyntaxToken,
    pub params: Vec<FuncParam>,
    pub right_paren: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncParam {
    pub name: SyntaxToken,
    pub comma: Option<SyntaxToken>,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub left_brace: SyntaxToken,
    pub items: Vec<BlockItem>,
    pub right_brace: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Return(ReturnStmt),
    Call(FuncCallExpr),
    Unexpected(Unexpected),
}

/// `return expr;` or `return;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub return_keyword: SyntaxToken,
    pub value: Option<Expr>,
    pub semicolon: SyntaxToken,
}

/// A call in statement position: `print(x);`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncCallExpr {
    pub callee: SyntaxToken,
    pub arguments: ArgumentList,
    pub semicolon: SyntaxToken,
}

/// A single token the parser could not place, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unexpected {
    pub token: SyntaxToken,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(NameExpr),
    Literal(LiteralExpr),
    Paren(Box<ParenExpr>),
    Call(Box<CallExpr>),
    Member(Box<MemberExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub name: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExpr {
    pub literal: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub left_paren: SyntaxToken,
    /// `None` when the parentheses are empty; the parser reports it.
    pub inner: Option<Expr>,
    pub right_paren: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub callee: Expr,
    pub arguments: ArgumentList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberExpr {
    pub base: Expr,
    pub period: SyntaxToken,
    pub member: SyntaxToken,
}

/// `(a, b,)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    pub left_paren: SyntaxToken,
    pub arguments: Vec<Argument>,
    pub right_paren: SyntaxToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub value: Expr,
    pub comma: Option<SyntaxToken>,
}

// ---------------------------------------------------------------------------
// Convenience accessors
// ---------------------------------------------------------------------------

/// Join a head name and its `.segment`s, `None` if any part is missing.
fn dotted(name: &SyntaxToken, segments: &[QualifiedSegment]) -> Option<String> {
    let mut out = name.text()?.to_string();
    for segment in segments {
        out.push('.');
        out.push_str(segment.name.text()?);
    }
    Some(out)
}

impl ModuleName {
    pub fn dotted(&self) -> Option<String> {
        dotted(&self.name, &self.segments)
    }
}

impl Attribute {
    pub fn dotted_name(&self) -> Option<String> {
        dotted(&self.name, &self.segments)
    }
}

impl FuncDecl {
    pub fn name_text(&self) -> Option<&str> {
        self.name.text()
    }
}

impl Item {
    pub fn as_node(&self) -> SyntaxNode<'_> {
        match self {
            Item::Open(node) => SyntaxNode::OpenDecl(node),
            Item::Func(node) => SyntaxNode::FuncDecl(node),
            Item::Attribute(node) => SyntaxNode::Attribute(node),
            Item::Unexpected(node) => SyntaxNode::Unexpected(node),
        }
    }
}

impl BlockItem {
    pub fn as_node(&self) -> SyntaxNode<'_> {
        match self {
            BlockItem::Return(node) => SyntaxNode::ReturnStmt(node),
            BlockItem::Call(node) => SyntaxNode::FuncCallExpr(node),
            BlockItem::Unexpected(node) => SyntaxNode::Unexpected(node),
        }
    }
}

impl Expr {
    pub fn as_node(&self) -> SyntaxNode<'_> {
        match self {
            Expr::Name(node) => SyntaxNode::NameExpr(node),
            Expr::Literal(node) => SyntaxNode::LiteralExpr(node),
            Expr::Paren(node) => SyntaxNode::ParenExpr(node),
            Expr::Call(node) => SyntaxNode::CallExpr(node),
            Expr::Member(node) => SyntaxNode::MemberExpr(node),
        }
    }
}

impl Unexpected {
    /// The wrapped token. The parser only builds `Unexpected` around a
    /// consumed token, so this is `None` only for hand-built trees.
    pub fn raw(&self) -> Option<&Token> {
        self.token.token()
    }
}

// ---------------------------------------------------------------------------
// Generic view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxNodeKind {
    SourceFile,
    FuncDecl,
    FuncSig,
    Block,
    OpenDecl,
    ModuleName,
    FuncCallExpr,
    ReturnStmt,
    Attribute,
    Unexpected,
    NameExpr,
    LiteralExpr,
    ParenExpr,
    CallExpr,
    MemberExpr,
}

impl SyntaxNodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxNodeKind::SourceFile => "SourceFile",
            SyntaxNodeKind::FuncDecl => "FuncDecl",
            SyntaxNodeKind::FuncSig => "FuncSig",
            SyntaxNodeKind::Block => "Block",
            SyntaxNodeKind::OpenDecl => "OpenDecl",
            SyntaxNodeKind::ModuleName => "ModuleName",
            SyntaxNodeKind::FuncCallExpr => "FuncCallExpr",
            SyntaxNodeKind::ReturnStmt => "ReturnStmt",
            SyntaxNodeKind::Attribute => "Attribute",
            SyntaxNodeKind::Unexpected => "Unexpected",
            SyntaxNodeKind::NameExpr => "NameExpr",
            SyntaxNodeKind::LiteralExpr => "LiteralExpr",
            SyntaxNodeKind::ParenExpr => "ParenExpr",
            SyntaxNodeKind::CallExpr => "CallExpr",
            SyntaxNodeKind::MemberExpr => "MemberExpr",
        }
    }
}

impl fmt::Display for SyntaxNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed reference to any node in the tree.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxNode<'a> {
    SourceFile(&'a SourceFile),
    FuncDecl(&'a FuncDecl),
    FuncSig(&'a FuncSig),
    Block(&'a Block),
    OpenDecl(&'a OpenDecl),
    ModuleName(&'a ModuleName),
    FuncCallExpr(&'a FuncCallExpr),
    ReturnStmt(&'a ReturnStmt),
    Attribute(&'a Attribute),
    Unexpected(&'a Unexpected),
    NameExpr(&'a NameExpr),
    LiteralExpr(&'a LiteralExpr),
    ParenExpr(&'a ParenExpr),
    CallExpr(&'a CallExpr),
    MemberExpr(&'a MemberExpr),
}

/// A direct child of a node: a token slot or a nested node.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxElement<'a> {
    Token(&'a SyntaxToken),
    Node(SyntaxNode<'a>),
}

/// Builds the ordered child list of one node.
struct Children<'a>(Vec<SyntaxElement<'a>>);

impl<'a> Children<'a> {
    fn token(&mut self, token: &'a SyntaxToken) -> &mut Self {
        self.0.push(SyntaxElement::Token(token));
        self
    }

    fn opt_token(&mut self, token: &'a Option<SyntaxToken>) -> &mut Self {
        if let Some(token) = token {
            self.token(token);
        }
        self
    }

    fn node(&mut self, node: SyntaxNode<'a>) -> &mut Self {
        self.0.push(SyntaxElement::Node(node));
        self
    }

    fn segments(&mut self, segments: &'a [QualifiedSegment]) -> &mut Self {
        for segment in segments {
            self.token(&segment.period).token(&segment.name);
        }
        self
    }

    fn attributes(&mut self, attributes: &'a [Attribute]) -> &mut Self {
        for attribute in attributes {
            self.node(SyntaxNode::Attribute(attribute));
        }
        self
    }

    fn arguments(&mut self, list: &'a ArgumentList) -> &mut Self {
        self.token(&list.left_paren);
        for argument in &list.arguments {
            self.node(argument.value.as_node()).opt_token(&argument.comma);
        }
        self.token(&list.right_paren)
    }
}

impl<'a> SyntaxNode<'a> {
    pub fn kind(&self) -> SyntaxNodeKind {
        match self {
            SyntaxNode::SourceFile(_) => SyntaxNodeKind::SourceFile,
            SyntaxNode::FuncDecl(_) => SyntaxNodeKind::FuncDecl,
            SyntaxNode::FuncSig(_) => SyntaxNodeKind::FuncSig,
            SyntaxNode::Block(_) => SyntaxNodeKind::Block,
            SyntaxNode::OpenDecl(_) => SyntaxNodeKind::OpenDecl,
            SyntaxNode::ModuleName(_) => SyntaxNodeKind::ModuleName,
            SyntaxNode::FuncCallExpr(_) => SyntaxNodeKind::FuncCallExpr,
            SyntaxNode::ReturnStmt(_) => SyntaxNodeKind::ReturnStmt,
            SyntaxNode::Attribute(_) => SyntaxNodeKind::Attribute,
            SyntaxNode::Unexpected(_) => SyntaxNodeKind::Unexpected,
            SyntaxNode::NameExpr(_) => SyntaxNodeKind::NameExpr,
            SyntaxNode::LiteralExpr(_) => SyntaxNodeKind::LiteralExpr,
            SyntaxNode::ParenExpr(_) => SyntaxNodeKind::ParenExpr,
            SyntaxNode::CallExpr(_) => SyntaxNodeKind::CallExpr,
            SyntaxNode::MemberExpr(_) => SyntaxNodeKind::MemberExpr,
        }
    }

    /// Tokens and nodes directly under this node, in document order.
    pub fn children_with_tokens(&self) -> Vec<SyntaxElement<'a>> {
        let mut out = Children(Vec::new());
        match *self {
            SyntaxNode::SourceFile(file) => {
                for item in &file.items {
                    out.node(item.as_node());
                }
                out.token(&file.end_of_file);
            }
            SyntaxNode::FuncDecl(decl) => {
                out.attributes(&decl.attributes)
                    .token(&decl.func_keyword)
                    .token(&decl.name)
                    .node(SyntaxNode::FuncSig(&decl.signature))
                    .node(SyntaxNode::Block(&decl.body));
            }
            SyntaxNode::FuncSig(sig) => {
                out.token(&sig.left_paren);
                for param in &sig.params {
                    out.token(&param.name).opt_token(&param.comma);
                }
                out.token(&sig.right_paren);
            }
            SyntaxNode::Block(block) => {
                out.token(&block.left_brace);
                for item in &block.items {
                    out.node(item.as_node());
                }
                out.token(&block.right_brace);
            }
            SyntaxNode::OpenDecl(decl) => {
                out.attributes(&decl.attributes)
                    .token(&decl.open_keyword)
                    .node(SyntaxNode::ModuleName(&decl.module_name))
                    .opt_token(&decl.semicolon);
            }
            SyntaxNode::ModuleName(name) => {
                out.token(&name.name).segments(&name.segments);
            }
            SyntaxNode::FuncCallExpr(call) => {
                out.token(&call.callee)
                    .arguments(&call.arguments)
                    .token(&call.semicolon);
            }
            SyntaxNode::ReturnStmt(stmt) => {
                out.token(&stmt.return_keyword);
                if let Some(value) = &stmt.value {
                    out.node(value.as_node());
                }
                out.token(&stmt.semicolon);
            }
            SyntaxNode::Attribute(attr) => {
                out.token(&attr.at)
                    .token(&attr.name)
                    .segments(&attr.segments);
                if let Some(arguments) = &attr.arguments {
                    out.arguments(arguments);
                }
            }
            SyntaxNode::Unexpected(unexpected) => {
                out.token(&unexpected.token);
            }
            SyntaxNode::NameExpr(expr) => {
                out.token(&expr.name);
            }
            SyntaxNode::LiteralExpr(expr) => {
                out.token(&expr.literal);
            }
            SyntaxNode::ParenExpr(expr) => {
                out.token(&expr.left_paren);
                if let Some(inner) = &expr.inner {
                    out.node(inner.as_node());
                }
                out.token(&expr.right_paren);
            }
            SyntaxNode::CallExpr(expr) => {
                out.node(expr.callee.as_node()).arguments(&expr.arguments);
            }
            SyntaxNode::MemberExpr(expr) => {
                out.node(expr.base.as_node())
                    .token(&expr.period)
                    .token(&expr.member);
            }
        }
        out.0
    }

    pub fn children(&self) -> Vec<SyntaxNode<'a>> {
        self.children_with_tokens()
            .into_iter()
            .filter_map(|element| match element {
                SyntaxElement::Node(node) => Some(node),
                SyntaxElement::Token(_) => None,
            })
            .collect()
    }

    /// Token slots directly under this node, missing ones included.
    pub fn tokens(&self) -> Vec<&'a SyntaxToken> {
        self.children_with_tokens()
            .into_iter()
            .filter_map(|element| match element {
                SyntaxElement::Token(token) => Some(token),
                SyntaxElement::Node(_) => None,
            })
            .collect()
    }

    /// Every present token under this node, depth first.
    pub fn descendant_tokens(&self) -> Vec<&'a Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<&'a Token>) {
        for element in self.children_with_tokens() {
            match element {
                SyntaxElement::Token(token) => out.extend(token.token()),
                SyntaxElement::Node(node) => node.collect_tokens(out),
            }
        }
    }

    /// The exact source bytes this node spans, trivia included.
    pub fn source_bytes(&self, source: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for token in self.descendant_tokens() {
            token.write_source(source, &mut out);
        }
        out
    }

    pub fn text(&self, source: &[u8]) -> String {
        String::from_utf8_lossy(&self.source_bytes(source)).into_owned()
    }
}

impl SourceFile {
    pub fn as_node(&self) -> SyntaxNode<'_> {
        SyntaxNode::SourceFile(self)
    }

    /// Reproduce the source the tree was parsed from.
    pub fn source_bytes(&self, source: &[u8]) -> Vec<u8> {
        self.as_node().source_bytes(source)
    }
}
