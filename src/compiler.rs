//! Dotted member path to accessor expression.
//!
//! `"Lists.RoleAssignments.Member"` on `Web` becomes
//!
//! ```text
//! a => Include(a.Lists, b => Include(b.RoleAssignments, c => c.Member))
//! ```
//!
//! Segments are walked left to right against the [`TypeSystem`]. A member whose
//! type is a queryable collection opens a new `Include` level with a fresh bound
//! variable; a segment that is not a member becomes an indexer lookup and ends
//! the walk.

use std::mem;

use tracing::{trace, warn};

use crate::{
    ast::{Expr, Lambda},
    schema::{MemberLookup, TypeSystem},
};

/// Most `Include` levels a generated accessor may nest.
///
/// Checking, rendering and evaluating a tree recurse once per level, so deeper
/// paths are rejected up front.
pub const MAX_NESTING: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("member path '{0}' contains no segments")]
    Empty(String),

    #[error("member path '{path}' crosses more than {limit} collections")]
    TooDeep { path: String, limit: usize },
}

/// Non-empty pieces of `path` between dots, in order.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|segment| !segment.is_empty()).collect()
}

/// Name of the `index`-th bound variable: `a`..`z`, then `aa`, `ab`, ...
pub fn variable_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// Strictly increasing supply of lambda parameter names.
#[derive(Debug, Default)]
struct BoundVariables {
    issued: usize,
}

impl BoundVariables {
    fn fresh(&mut self) -> String {
        let name = variable_name(self.issued);
        self.issued += 1;
        name
    }
}

/// An open `Include(source, var => ...)` whose body is still being built.
struct Level {
    source: Expr,
    var: String,
}

pub struct PathCompiler<'a, S: TypeSystem> {
    types: &'a S,
}

impl<'a, S: TypeSystem> PathCompiler<'a, S> {
    pub fn new(types: &'a S) -> Self {
        PathCompiler { types }
    }

    /// Builds the accessor lambda for `path` rooted at `root`.
    ///
    /// Fails when the path has no usable segments or crosses more than
    /// [`MAX_NESTING`] queryable collections. Unknown or ambiguous members fall
    /// back to `["name"]` indexer syntax and stop the walk, since the indexer
    /// result is untyped.
    pub fn generate(&self, root: &S::Type, path: &str) -> Result<Lambda, PathError> {
        let segments = split_path(path);
        if segments.is_empty() {
            return Err(PathError::Empty(path.to_string()));
        }

        let mut vars = BoundVariables::default();
        let root_var = vars.fresh();
        let mut levels = Vec::new();
        let mut chain = Expr::param(&root_var);
        let mut current_type = root.clone();

        if let Some(element) = self.types.queryable_element_type(root) {
            let var = vars.fresh();
            let source = mem::replace(&mut chain, Expr::param(&var));
            levels.push(Level { source, var });
            current_type = element;
        }

        for segment in segments {
            let member = match self.types.find_member(&current_type, segment) {
                MemberLookup::Found(member) => member,
                MemberLookup::Ambiguous(candidates) => {
                    warn!(
                        segment,
                        owner = %self.types.type_name(&current_type),
                        ?candidates,
                        "ambiguous member, falling back to indexer"
                    );
                    chain = chain.index(segment);
                    break;
                }
                MemberLookup::Missing => {
                    trace!(
                        segment,
                        owner = %self.types.type_name(&current_type),
                        "unknown member, using indexer"
                    );
                    chain = chain.index(segment);
                    break;
                }
            };

            chain = chain.member(segment);
            current_type = member.value_type;

            if let Some(element) = self.types.queryable_element_type(&current_type) {
                if levels.len() == MAX_NESTING {
                    return Err(PathError::TooDeep {
                        path: path.to_string(),
                        limit: MAX_NESTING,
                    });
                }
                let var = vars.fresh();
                let source = mem::replace(&mut chain, Expr::param(&var));
                levels.push(Level { source, var });
                current_type = element;
            }
        }

        let body = levels
            .into_iter()
            .rev()
            .fold(chain, |body, level| {
                level.source.include(Lambda::new(level.var, body))
            });

        Ok(Lambda::new(root_var, body))
    }
}
