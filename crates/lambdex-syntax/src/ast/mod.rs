//! Owned, immutable syntax tree used for structural search.
//!
//! Tree-sitter nodes borrow their tree; [`Node`] is an owned snapshot with one
//! tagged variant per construct the extended-lambda tooling cares about.
//! Everything else is kept as [`NodeKind::Other`] so that searches still reach
//! calls nested inside arbitrary expressions.

mod lower;

pub use lower::lower;

use crate::position::Span;

/// A syntax node and the source span it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    span: Span,
}

/// The construct represented by a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A whole source file.
    Module {
        /// Top-level statements and comments.
        statements: Vec<Node>,
    },
    /// A call expression.
    Call {
        /// The callee.
        function: Box<Node>,
        /// Arguments in source order, comments included.
        arguments: Vec<Node>,
    },
    /// `object.attribute`.
    Attribute {
        /// The value being accessed.
        object: Box<Node>,
        /// Attribute name.
        attribute: String,
        /// Span of the attribute name.
        attribute_span: Span,
    },
    /// An identifier.
    Name {
        /// Identifier text.
        id: String,
    },
    /// A native `lambda` expression.
    Lambda {
        /// Span of the parameter list, if any.
        parameters: Option<Span>,
        /// The lambda body.
        body: Box<Node>,
        /// Comments inside the lambda but outside its body.
        comments: Vec<Node>,
    },
    /// A list display.
    List {
        /// Elements in source order, comments included.
        elements: Vec<Node>,
    },
    /// `value[items]`.
    Subscript {
        /// The subscripted value.
        value: Box<Node>,
        /// Subscript items in source order, comments included.
        items: Vec<Node>,
    },
    /// A `#` comment.
    Comment {
        /// Comment text including the leading `#`.
        text: String,
    },
    /// Any other construct.
    Other {
        /// Tree-sitter node kind.
        kind: String,
        /// Named children in source order.
        children: Vec<Node>,
    },
}

impl Node {
    /// Creates a node.
    #[must_use]
    pub const fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the construct.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Consumes the node, returning its construct.
    #[must_use]
    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    /// Returns the covered source span.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Returns whether this node is a comment.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self.kind, NodeKind::Comment { .. })
    }

    /// Returns the child nodes in field declaration order, then list order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            NodeKind::Module { statements } => statements.iter().collect(),
            NodeKind::Call {
                function,
                arguments,
            } => std::iter::once(function.as_ref())
                .chain(arguments.iter())
                .collect(),
            NodeKind::Attribute { object, .. } => vec![object.as_ref()],
            NodeKind::Lambda { body, .. } => vec![body.as_ref()],
            NodeKind::List { elements } => elements.iter().collect(),
            NodeKind::Subscript { value, items } => std::iter::once(value.as_ref())
                .chain(items.iter())
                .collect(),
            NodeKind::Other { children, .. } => children.iter().collect(),
            NodeKind::Name { .. } | NodeKind::Comment { .. } => Vec::new(),
        }
    }

    /// Returns the dotted path of a callee made of names and attributes.
    ///
    /// `def_.fib` yields `Some("def_.fib")`; any other shape yields `None`.
    #[must_use]
    pub fn callee_path(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Name { id } => Some(id.clone()),
            NodeKind::Attribute {
                object, attribute, ..
            } => object
                .callee_path()
                .map(|prefix| format!("{prefix}.{attribute}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn first_statement(source: &str) -> Node {
        let parsed = parse_source(source).expect("parse");
        let NodeKind::Module { statements } = lower(&parsed).kind else {
            panic!("root must be a module");
        };
        statements.into_iter().next().expect("statement")
    }

    fn call_of(statement: &Node) -> &Node {
        let mut pending = vec![statement];
        while let Some(node) = pending.pop() {
            if matches!(node.kind(), NodeKind::Call { .. }) {
                return node;
            }
            pending.extend(node.children().into_iter().rev());
        }
        panic!("no call found");
    }

    #[test]
    fn lowers_extended_lambda_call() {
        let statement = first_statement("f = def_.fib(lambda n: [\n    n,  # keep\n    n\n])\n");
        let call = call_of(&statement);
        let NodeKind::Call {
            function,
            arguments,
        } = call.kind()
        else {
            panic!("expected call");
        };
        assert_eq!(function.callee_path().as_deref(), Some("def_.fib"));
        assert_eq!(arguments.len(), 1);

        let Some(NodeKind::Lambda {
            parameters, body, ..
        }) = arguments.first().map(Node::kind)
        else {
            panic!("expected lambda argument");
        };
        assert!(parameters.is_some());
        let NodeKind::List { elements } = body.kind() else {
            panic!("expected list body");
        };
        assert_eq!(elements.len(), 3);
        assert!(elements.get(1).is_some_and(Node::is_comment));
    }

    #[test]
    fn subscript_items_exclude_the_value() {
        let statement = first_statement("if_[x] [\n    y, z\n]\n");
        let mut pending = vec![&statement];
        let mut found = None;
        while let Some(node) = pending.pop() {
            if let NodeKind::Subscript { value, items } = node.kind()
                && matches!(value.kind(), NodeKind::Subscript { .. })
            {
                found = Some(items.len());
                break;
            }
            pending.extend(node.children());
        }
        assert_eq!(found, Some(2));
    }

    #[test]
    fn lambda_header_comments_are_collected() {
        let statement = first_statement("f = g(lambda a,  # c\n      b: [a])\n");
        let call = call_of(&statement);
        let NodeKind::Call { arguments, .. } = call.kind() else {
            panic!("expected call");
        };
        let Some(NodeKind::Lambda { comments, .. }) = arguments.first().map(Node::kind) else {
            panic!("expected lambda");
        };
        assert_eq!(comments.len(), 1);
    }

    #[test]
    fn callee_path_rejects_calls() {
        let statement = first_statement("a.b().c(x)\n");
        let NodeKind::Call { function, .. } = call_of(&statement).kind() else {
            panic!("expected call");
        };
        assert_eq!(function.callee_path(), None);
    }
}
