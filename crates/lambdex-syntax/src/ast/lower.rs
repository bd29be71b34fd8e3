//! Lowering from Tree-sitter nodes to owned [`Node`]s.

use super::{Node, NodeKind};
use crate::parser::ParseResult;
use crate::position::Span;

/// Lowers a whole parse into an owned tree rooted at a module node.
#[must_use]
pub fn lower(parsed: &ParseResult) -> Node {
    lower_node(parsed, parsed.root_node())
}

fn lower_node(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> Node {
    let kind = match node.kind() {
        "module" => NodeKind::Module {
            statements: named_children(parsed, node),
        },
        "call" => lower_call(parsed, node),
        "attribute" => lower_attribute(parsed, node),
        "identifier" => NodeKind::Name {
            id: parsed.node_text(node).to_owned(),
        },
        "lambda" => lower_lambda(parsed, node),
        "list" => NodeKind::List {
            elements: named_children(parsed, node),
        },
        "subscript" => lower_subscript(parsed, node),
        "comment" => NodeKind::Comment {
            text: parsed.node_text(node).to_owned(),
        },
        // Interpolations stay part of the literal.
        "string" => NodeKind::Other {
            kind: node.kind().to_owned(),
            children: Vec::new(),
        },
        _ => other(parsed, node),
    };
    Node::new(kind, Span::of_node(node))
}

fn named_children(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !is_continuation(*child))
        .map(|child| lower_node(parsed, child))
        .collect()
}

fn is_continuation(node: tree_sitter::Node<'_>) -> bool {
    node.kind() == "line_continuation"
}

fn other(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> NodeKind {
    NodeKind::Other {
        kind: node.kind().to_owned(),
        children: named_children(parsed, node),
    }
}

fn lower_call(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> NodeKind {
    let Some(function) = node.child_by_field_name("function") else {
        return other(parsed, node);
    };
    let arguments = match node.child_by_field_name("arguments") {
        Some(args) if args.kind() == "argument_list" => named_children(parsed, args),
        // A bare generator argument: `f(x for x in y)`.
        Some(args) => vec![lower_node(parsed, args)],
        None => Vec::new(),
    };
    NodeKind::Call {
        function: Box::new(lower_node(parsed, function)),
        arguments,
    }
}

fn lower_attribute(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> NodeKind {
    let (Some(object), Some(attribute)) = (
        node.child_by_field_name("object"),
        node.child_by_field_name("attribute"),
    ) else {
        return other(parsed, node);
    };
    NodeKind::Attribute {
        object: Box::new(lower_node(parsed, object)),
        attribute: parsed.node_text(attribute).to_owned(),
        attribute_span: Span::of_node(attribute),
    }
}

fn lower_lambda(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> NodeKind {
    let Some(body) = node.child_by_field_name("body") else {
        return other(parsed, node);
    };

    let mut comments = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.id() != body.id() {
            collect_comments(parsed, child, &mut comments);
        }
    }

    NodeKind::Lambda {
        parameters: node.child_by_field_name("parameters").map(Span::of_node),
        body: Box::new(lower_node(parsed, body)),
        comments,
    }
}

fn collect_comments(parsed: &ParseResult, node: tree_sitter::Node<'_>, out: &mut Vec<Node>) {
    if node.kind() == "comment" {
        out.push(lower_node(parsed, node));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_comments(parsed, child, out);
    }
}

fn lower_subscript(parsed: &ParseResult, node: tree_sitter::Node<'_>) -> NodeKind {
    let Some(value) = node.child_by_field_name("value") else {
        return other(parsed, node);
    };
    let mut cursor = node.walk();
    let items = node
        .named_children(&mut cursor)
        .filter(|child| child.id() != value.id() && !is_continuation(*child))
        .map(|child| lower_node(parsed, child))
        .collect();
    NodeKind::Subscript {
        value: Box::new(lower_node(parsed, value)),
        items,
    }
}
