//! Indented debug dump of a syntax tree.
//!
//! One line per node, `<prefix>|-<Kind>: <description>`, children indented by
//! `| `. Only declarations, blocks and unexpected tokens are listed.

use std::fmt::Write;

use crate::cst::{BlockItem, FuncDecl, Item, SourceFile, SyntaxNode};
use crate::token::SyntaxToken;

const MISSING: &str = "<missing>";

pub fn dump_tree(file: &SourceFile) -> String {
    let mut out = String::new();
    dump_node(&mut out, file.as_node(), "");
    out
}

fn dump_node(out: &mut String, node: SyntaxNode<'_>, prefix: &str) {
    let description = describe(node);
    if description.is_empty() {
        let _ = writeln!(out, "{prefix}|-{}:", node.kind());
    } else {
        let _ = writeln!(out, "{prefix}|-{}: {description}", node.kind());
    }

    let child_prefix = format!("{prefix}| ");
    for child in dumped_children(node) {
        dump_node(out, child, &child_prefix);
    }
}

fn describe(node: SyntaxNode<'_>) -> String {
    match node {
        SyntaxNode::FuncDecl(decl) => name_or_missing(&decl.name),
        SyntaxNode::OpenDecl(decl) => decl
            .module_name
            .dotted()
            .unwrap_or_else(|| MISSING.to_string()),
        SyntaxNode::Attribute(attr) => attr
            .dotted_name()
            .unwrap_or_else(|| MISSING.to_string()),
        SyntaxNode::Unexpected(unexpected) => {
            let location = unexpected.token.location();
            format!("{}:{}", location.line, location.column)
        }
        _ => String::new(),
    }
}

fn name_or_missing(token: &SyntaxToken) -> String {
    token.text().unwrap_or(MISSING).to_string()
}

fn dumped_children(node: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    match node {
        SyntaxNode::SourceFile(file) => file.items.iter().map(Item::as_node).collect(),
        SyntaxNode::FuncDecl(FuncDecl {
            attributes, body, ..
        }) => attributes
            .iter()
            .map(SyntaxNode::Attribute)
            .chain([SyntaxNode::Block(body)])
            .collect(),
        SyntaxNode::OpenDecl(decl) => decl.attributes.iter().map(SyntaxNode::Attribute).collect(),
        SyntaxNode::Block(block) => block.items.iter().map(BlockItem::as_node).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use spargel_source::SourceBuffer;

    use super::*;
    use crate::parse_source;

    fn dump(source: &str) -> String {
        dump_tree(&parse_source(&SourceBuffer::from_text("<test>", source)).source_file)
    }

    #[test]
    fn dumps_declarations_and_blocks() {
        assert_eq!(
            dump("open std\nfunc main() {\n  print();\n}"),
            "|-SourceFile:\n\
             | |-OpenDecl: std\n\
             | |-FuncDecl: main\n\
             | | |-Block:\n\
             | | | |-FuncCallExpr:\n"
        );
    }

    #[test]
    fn unexpected_shows_line_and_column() {
        assert_eq!(
            dump("func f() {\n  ;\n}"),
            "|-SourceFile:\n\
             | |-FuncDecl: f\n\
             | | |-Block:\n\
             | | | |-Unexpected: 2:3\n"
        );
    }

    #[test]
    fn missing_name_is_marked() {
        assert_eq!(
            dump("func"),
            "|-SourceFile:\n| |-FuncDecl: <missing>\n| | |-Block:\n"
        );
    }
}
