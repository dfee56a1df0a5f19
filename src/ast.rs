//! # Accessor Expression Trees
//!
//! This module defines the expression tree shared by the path compiler, the
//! parser, the binder, the printer and the evaluator.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes and the single-parameter [`Lambda`]
//! - **[operators]** - Binary operators (comparison, arithmetic, logical)
//!
//! ## Shape of a Member Path
//!
//! A compiled member path is always a lambda over the root object:
//!
//! ```text
//! a => a.Title
//! a => a["PropertyKey"]
//! a => Include(a.Lists, b => Include(b.RoleAssignments, c => c.Member))
//! ```
//!
//! Every queryable collection crossed on the way introduces one `Include`
//! call whose selector lambda binds the next variable.
//!
//! ## Filters
//!
//! Filter fragments are lambdas too, wrapped in a `Where` over the root
//! collection:
//!
//! ```text
//! __filter_source => Where(__filter_source, l => l.Hidden == false)
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Lambda};
pub use operators::BinOp;
pub use tokens::Token;
