//! Partially specified node shapes and their text syntax.

use std::str::FromStr;

use crate::ast::{Node, NodeKind};
use crate::error::SyntaxError;

/// Expected shape of a node. Unspecified parts match anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePattern {
    /// Matches any node.
    Any,
    /// Matches an identifier with this exact text.
    Name(String),
    /// Matches `value.attr`; `attr` of `None` matches any attribute name.
    Attribute {
        /// Pattern for the accessed object.
        value: Box<NodePattern>,
        /// Required attribute name.
        attr: Option<String>,
    },
    /// Matches a call.
    Call {
        /// Pattern for the callee.
        func: Box<NodePattern>,
        /// Pattern for the arguments.
        args: ArgsPattern,
    },
    /// Matches a native lambda whose body matches.
    Lambda {
        /// Pattern for the body.
        body: Box<NodePattern>,
    },
    /// Matches any list display.
    List,
}

/// Expected arguments of a call. Comments never count as arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsPattern {
    /// Any argument list, including none.
    Any,
    /// Exactly these arguments, in order.
    Exactly(Vec<NodePattern>),
}

impl NodePattern {
    /// Pattern for a call to `keyword` or `keyword.identifier` with one
    /// argument.
    ///
    /// # Errors
    ///
    /// Returns an error when `keyword` or `identifier` is not a valid name.
    pub fn single_call(keyword: &str, identifier: &str) -> Result<Self, SyntaxError> {
        if identifier.is_empty() {
            format!("{keyword}(?)").parse()
        } else {
            format!("{keyword}.{identifier}(?)").parse()
        }
    }

    /// Returns whether `node` has the expected shape.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        match (self, node.kind()) {
            (Self::Any, _) | (Self::List, NodeKind::List { .. }) => true,
            (Self::Name(expected), NodeKind::Name { id }) => expected == id,
            (
                Self::Attribute { value, attr },
                NodeKind::Attribute {
                    object, attribute, ..
                },
            ) => value.matches(object) && attr.as_ref().is_none_or(|name| name == attribute),
            (Self::Call { func, args }, NodeKind::Call { function, arguments }) => {
                func.matches(function) && args.matches(arguments)
            }
            (Self::Lambda { body: expected }, NodeKind::Lambda { body, .. }) => {
                expected.matches(body)
            }
            _ => false,
        }
    }
}

impl ArgsPattern {
    fn matches(&self, arguments: &[Node]) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(expected) => {
                let mut actual = arguments.iter().filter(|arg| !arg.is_comment());
                expected
                    .iter()
                    .all(|pattern| actual.next().is_some_and(|arg| pattern.matches(arg)))
                    && actual.next().is_none()
            }
        }
    }
}

impl FromStr for NodePattern {
    type Err = SyntaxError;

    /// Parses `a.b.?` callee paths with an optional argument list.
    ///
    /// Inside the parentheses `?` matches one argument, `??` matches any
    /// argument list, and dotted paths match names and attributes.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let Some((callee, rest)) = trimmed.split_once('(') else {
            return parse_path(text, trimmed);
        };
        let Some(inner) = rest.strip_suffix(')') else {
            return Err(SyntaxError::pattern_compile(text, "unclosed argument list"));
        };

        let args = match inner.trim() {
            "??" => ArgsPattern::Any,
            "" => ArgsPattern::Exactly(Vec::new()),
            list => ArgsPattern::Exactly(
                list.split(',')
                    .map(|arg| parse_path(text, arg.trim()))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Self::Call {
            func: Box::new(parse_path(text, callee.trim())?),
            args,
        })
    }
}

fn parse_path(pattern: &str, path: &str) -> Result<NodePattern, SyntaxError> {
    let mut segments = path.split('.');
    let head = segments.next().unwrap_or_default();
    let mut node = match head {
        "?" => NodePattern::Any,
        name if is_name(name) => NodePattern::Name(name.to_owned()),
        _ => {
            return Err(SyntaxError::pattern_compile(
                pattern,
                format!("invalid name segment '{head}'"),
            ));
        }
    };

    for segment in segments {
        let attr = match segment {
            "?" => None,
            name if is_name(name) => Some(name.to_owned()),
            _ => {
                return Err(SyntaxError::pattern_compile(
                    pattern,
                    format!("invalid attribute segment '{segment}'"),
                ));
            }
        };
        node = NodePattern::Attribute {
            value: Box::new(node),
            attr,
        };
    }

    Ok(node)
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}
