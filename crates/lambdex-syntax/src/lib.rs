//! Tree-sitter powered analysis of extended lambdas in Python sources.
//!
//! An extended lambda is a call of the lambda keyword (by default `def_`,
//! optionally followed by `.name`) whose only argument is a native `lambda`
//! with a list body:
//!
//! ```python
//! fib = def_.fib(lambda n: [
//!     if_[n <= 2] [
//!         return_[1]
//!     ],
//!     return_[fib(n - 1) + fib(n - 2)]
//! ])
//! ```
//!
//! This crate provides:
//!
//! - **Tokens** via [`tokenize`], covering the source byte for byte
//! - **Rule dispatch** via [`DispatchTable`], keyed on token type, token
//!   string and parser state with ranked wildcard fallback
//! - **Structural search** via [`find_matches`], [`extract_single_call`] and
//!   [`lambda_to_ast`]
//! - **Layout** via [`Transformer`], which rewrites every extended lambda of a
//!   file into canonical form
//!
//! # Example
//!
//! ```ignore
//! use lambdex_syntax::{Transformer, parse_source};
//!
//! let parsed = parse_source("f = def_(lambda x: [a, b])\n")?;
//! let result = Transformer::default().apply(&parsed)?;
//! assert_eq!(result.output(), "f = def_(lambda x: [\n    a,\n    b\n])\n");
//! ```

pub mod ast;
mod context;
pub mod dispatch;
mod error;
mod parser;
mod position;
mod scanner;
pub mod search;
mod token;
pub mod transform;

pub use ast::{Node, NodeKind};
pub use context::ParseContext;
pub use dispatch::{DispatchError, DispatchTable, Handler, RuleKey};
pub use error::SyntaxError;
pub use parser::{ParseResult, Parser, SyntaxErrorInfo, parse_source};
pub use position::{Position, Span};
pub use scanner::{LambdaRegion, LambdaState, scan_regions};
pub use search::{
    ArgsPattern, CallableSource, NodePattern, SourceLocation, extract_single_call, find_matches,
    lambda_to_ast,
};
pub use token::{ExactType, Token, tokenize};
pub use transform::{DEFAULT_KEYWORD, TransformOptions, TransformResult, Transformer};
