use std::fmt::Write;

use insta::assert_snapshot;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use spargel_diag::{Diagnostic, render_diagnostic};
use spargel_source::{FileId, SourceBuffer, SourceMap};
use spargel_syntax::{
    LexOptions, SyntaxElement, SyntaxNode, SyntaxNodeKind, TokenKind, dump_tree, lex,
    lex_with_options, parse_source, reconstruct_source,
};

#[test]
fn parser_dump_snapshot_corpus() {
    let cases: [(&str, &str); 6] = [
        ("open_and_func", "open std\nfunc main() {}"),
        (
            "attributes",
            "@shader.fragment\nfunc frag() {\n  return color(1.0, 0.5);\n}",
        ),
        ("lone_func", "func"),
        ("stray_tokens", "= open std\nimpl"),
        ("unclosed_block", "func main() {\n  print(x);\n  x\n"),
        ("invalid_character", "func f() { $ }"),
    ];

    let mut output = String::new();
    for (name, source) in cases {
        writeln!(&mut output, "## {name}").unwrap();
        writeln!(&mut output, "source:").unwrap();
        output.push_str(&render_source(source));
        output.push_str(&render_parse(source));
    }

    assert_snapshot!(output, @r"
    ## open_and_func
    source:
    |open·std
    |func·main()·{}
    |-SourceFile:
    | |-OpenDecl: std
    | |-FuncDecl: main
    | | |-Block:
    diagnostics: []
    ## attributes
    source:
    |@shader.fragment
    |func·frag()·{
    |··return·color(1.0,·0.5);
    |}
    |-SourceFile:
    | |-FuncDecl: frag
    | | |-Attribute: shader.fragment
    | | |-Block:
    | | | |-ReturnStmt:
    diagnostics: []
    ## lone_func
    source:
    |func
    |-SourceFile:
    | |-FuncDecl: <missing>
    | | |-Block:
    diagnostics:
    - error 1:5: expected identifier, found end of file
    ## stray_tokens
    source:
    |=·open·std
    |impl
    |-SourceFile:
    | |-Unexpected: 1:1
    | |-OpenDecl: std
    | |-Unexpected: 2:1
    diagnostics:
    - error 1:1: expected `func` or `open`, found `=`
    - error 2:1: expected `func` or `open`, found keyword `impl`
    ## unclosed_block
    source:
    |func·main()·{
    |··print(x);
    |··x
    |
    |-SourceFile:
    | |-FuncDecl: main
    | | |-Block:
    | | | |-FuncCallExpr:
    | | | |-Unexpected: 3:3
    diagnostics:
    - error 3:3: unexpected identifier `x`
    - error 4:1: expected `}`, found end of file
      note 1:13: unclosed `{` opened here
    ## invalid_character
    source:
    |func·f()·{·$·}
    |-SourceFile:
    | |-FuncDecl: f
    | | |-Block:
    | | | |-Unexpected: 1:12
    diagnostics:
    - error 1:12: invalid character `$`
    ");
}

#[test]
fn rendered_syntax_error_snapshot() {
    let mut sources = SourceMap::new();
    let buffer = sources.add_str("main.sp", "func main( {}");
    let parse = parse_source(&buffer);
    assert_eq!(parse.diagnostics.len(), 1);

    assert_snapshot!(render_diagnostic(&parse.diagnostics[0], &sources), @r"
    error: expected `)`, found `{`
      --> main.sp:1:
       |
     1 |func main( {}
       |           ^
    note: unclosed `(` opened here
      --> main.sp:1:
       |
     1 |func main( {}
       |         ^
    ");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_lexing_is_lossless_for_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let buffer = SourceBuffer::from_bytes(FileId(0), "<prop>", bytes.clone())
            .expect("small buffers always fit");

        let folded = lex(&buffer);
        prop_assert_eq!(reconstruct_source(&folded, &bytes), bytes.clone());
        assert_ends_with_single_eof(&folded, buffer.len());

        let raw = lex_with_options(&buffer, LexOptions { fold_trivia: false });
        prop_assert_eq!(reconstruct_source(&raw, &bytes), bytes.clone());
        assert_ends_with_single_eof(&raw, buffer.len());
    }

    #[test]
    fn prop_parse_tree_is_lossless_and_diagnostics_are_in_bounds(
        fragments in prop::collection::vec(prop::sample::select(FRAGMENTS.to_vec()), 0..48)
    ) {
        let source = fragments.concat();
        let buffer = SourceBuffer::from_text("<prop>", &source);
        let parse = parse_source(&buffer);

        prop_assert_eq!(parse.source_file.source_bytes(buffer.bytes()), source.as_bytes());
        prop_assert_eq!(parse.source_file.end_of_file.kind(), TokenKind::EndOfFile);
        prop_assert!(parse.source_file.end_of_file.is_present());
        assert_coherent_diagnostics(&parse.diagnostics, buffer.len());
    }

    #[test]
    fn prop_every_node_covers_a_contiguous_slice(
        fragments in prop::collection::vec(prop::sample::select(FRAGMENTS.to_vec()), 0..48)
    ) {
        let source = fragments.concat();
        let buffer = SourceBuffer::from_text("<prop>", &source);
        let parse = parse_source(&buffer);
        check_node(parse.source_file.as_node(), buffer.bytes())?;
    }

    #[test]
    fn prop_parser_terminates_on_arbitrary_text(source in "\\PC{0,96}") {
        let buffer = SourceBuffer::from_text("<prop>", &source);
        let parse = parse_source(&buffer);
        prop_assert_eq!(parse.source_file.source_bytes(buffer.bytes()), source.as_bytes());
        assert_coherent_diagnostics(&parse.diagnostics, buffer.len());
    }
}

const FRAGMENTS: [&str; 22] = [
    "func", "open", "return", "impl", "main", "std", "x", "(", ")", "{", "}", ";", ",", ".",
    "@", " ", "\n", "42", "1.5", "// note\n", "$", "\t",
];

/// Checks one node and everything under it: its text is its children's text
/// in order, and that text is the source slice between its first and last
/// present tokens.
fn check_node(node: SyntaxNode<'_>, source: &[u8]) -> Result<(), TestCaseError> {
    let elements = node.children_with_tokens();
    prop_assert_eq!(node.tokens().len() + node.children().len(), elements.len());

    let mut joined = Vec::new();
    for element in &elements {
        match element {
            SyntaxElement::Token(token) => {
                if let Some(token) = token.token() {
                    token.write_source(source, &mut joined);
                }
            }
            SyntaxElement::Node(child) => joined.extend(child.source_bytes(source)),
        }
    }
    let text = node.text(source);
    prop_assert_eq!(text.as_bytes(), joined.as_slice(), "{} children", node.kind());

    let tokens = node.descendant_tokens();
    let expected: &[u8] = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => {
            let start = first
                .leading_trivia
                .first()
                .map_or(first.span.start, |trivia| trivia.span.start);
            let end = last
                .trailing_trivia
                .last()
                .map_or(last.span.end, |trivia| trivia.span.end);
            &source[start as usize..end as usize]
        }
        _ => &[],
    };
    prop_assert_eq!(text.as_bytes(), expected, "{} slice", node.kind());

    if let SyntaxNode::Unexpected(unexpected) = node {
        prop_assert_eq!(node.kind(), SyntaxNodeKind::Unexpected);
        prop_assert!(unexpected.raw().is_some());
    }

    for child in node.children() {
        check_node(child, source)?;
    }
    Ok(())
}

fn assert_ends_with_single_eof(tokens: &[spargel_syntax::Token], len: u32) {
    let eofs = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::EndOfFile)
        .count();
    assert_eq!(eofs, 1, "exactly one EndOfFile token");
    let last = tokens.last().expect("token list is never empty");
    assert_eq!(last.kind, TokenKind::EndOfFile);
    assert!(last.span.is_empty() && last.span.start == len);
}

fn assert_coherent_diagnostics(diagnostics: &[Diagnostic], len: u32) {
    for diagnostic in diagnostics {
        assert!(!diagnostic.messages.is_empty());
        assert_eq!(diagnostic.primary().level, diagnostic.level);
        for message in &diagnostic.messages {
            assert!(message.location.byte_position <= len);
            assert!(message.span.start <= message.span.end && message.span.end <= len);
            assert!(message.location.line >= 1 && message.location.column >= 1);
            assert_eq!(message.args.len(), message.id.arity(), "{message}");
        }
    }
}

fn render_source(source: &str) -> String {
    let mut rendered = String::new();
    for line in source.split('\n') {
        let visible = line.replace('\t', "\\t").replace(' ', "·");
        let _ = writeln!(&mut rendered, "|{visible}");
    }
    rendered
}

fn render_parse(source: &str) -> String {
    let buffer = SourceBuffer::from_text("<test>", source);
    let parse = parse_source(&buffer);
    let mut out = dump_tree(&parse.source_file);
    if parse.diagnostics.is_empty() {
        out.push_str("diagnostics: []\n");
        return out;
    }
    out.push_str("diagnostics:\n");
    for diagnostic in &parse.diagnostics {
        for (idx, message) in diagnostic.messages.iter().enumerate() {
            let bullet = if idx == 0 { "-" } else { " " };
            let _ = writeln!(
                &mut out,
                "{bullet} {} {}:{}: {}",
                message.level,
                message.location.line,
                message.location.column,
                message.format()
            );
        }
    }
    out
}
