pub mod adapter;
pub mod ast;
pub mod binder;
pub mod compiler;
pub mod config;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use adapter::{CompileError, CompileErrorKind, CompiledExpression, ExpressionCompiler};
pub use ast::{BinOp, Expr, Lambda, Token};
pub use binder::{BindError, Binder, BoundType};
pub use compiler::{MAX_NESTING, PathCompiler, PathError};
pub use config::{CompilerConfig, RenderStyle};
pub use evaluator::{EvalContext, EvalError, Evaluator};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{MAX_DEPTH, ParseError, Parser};
pub use printer::{to_source, to_source_with};
pub use schema::{Member, MemberLookup, ScalarKind, Schema, SchemaError, TypeName, TypeSystem};
pub use value::Value;
