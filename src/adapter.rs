//! Front door for turning member paths and filter fragments into checked,
//! runnable expressions.
//!
//! ```
//! use include_path::{CompilerConfig, ExpressionCompiler, schema::Schema};
//!
//! let schema = Schema::sharepoint().unwrap();
//! let config = CompilerConfig::default();
//! let compiler = ExpressionCompiler::new(&schema, &config);
//!
//! let web = schema.lookup("Web").unwrap();
//! let compiled = compiler.compile_member_path(&web, "Lists.Title").unwrap();
//! assert_eq!(compiled.code(), "a => Include(a.Lists, b => b.Title)");
//! ```

use std::fmt;

use tracing::debug;

use crate::{
    ast::{Expr, Lambda},
    binder::{BindError, Binder, BoundType},
    compiler::{PathCompiler, PathError},
    config::CompilerConfig,
    evaluator::{EvalError, Evaluator},
    parser::{ParseError, Parser},
    printer::{declaration, to_source_with},
    schema::TypeSystem,
    value::Value,
};

/// Failure to compile a member path or filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("error while generating expression for code snippet '{snippet}': {kind}")]
pub struct CompileError {
    /// Source text that was being compiled.
    pub snippet: String,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileErrorKind {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),
}

impl CompileError {
    fn new(snippet: impl Into<String>, kind: impl Into<CompileErrorKind>) -> Self {
        CompileError {
            snippet: snippet.into(),
            kind: kind.into(),
        }
    }
}

/// A type-checked accessor over instances of a root type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression<T> {
    root: T,
    lambda: Lambda,
    result_type: BoundType<T>,
    code: String,
    declaration: String,
}

impl<T> CompiledExpression<T> {
    pub fn root(&self) -> &T {
        &self.root
    }

    pub fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    /// Type of the lambda body.
    pub fn result_type(&self) -> &BoundType<T> {
        &self.result_type
    }

    /// Rendered lambda, e.g. `a => Include(a.Lists, b => b.Title)`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Typed declaration-and-return snippet, with imports.
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// Runs the expression against an instance graph of the root type.
    pub fn evaluate(&self, instance: &Value) -> Result<Value, EvalError> {
        Evaluator::new().eval_lambda(&self.lambda, instance.clone())
    }
}

impl<T> fmt::Display for CompiledExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

pub struct ExpressionCompiler<'a, S: TypeSystem> {
    types: &'a S,
    config: &'a CompilerConfig,
}

impl<'a, S: TypeSystem> ExpressionCompiler<'a, S> {
    pub fn new(types: &'a S, config: &'a CompilerConfig) -> Self {
        ExpressionCompiler { types, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        self.config
    }

    /// Generates the accessor for `path` and checks it against `root`.
    pub fn compile_member_path(
        &self,
        root: &S::Type,
        path: &str,
    ) -> Result<CompiledExpression<S::Type>, CompileError> {
        let lambda = PathCompiler::new(self.types)
            .generate(root, path)
            .map_err(|e| CompileError::new(path, e))?;
        debug!(path, code = %lambda, "generated accessor");
        self.finish(root, lambda)
    }

    /// Compiles each path on its own; one failure does not stop the rest.
    pub fn compile_member_paths<P: AsRef<str>>(
        &self,
        root: &S::Type,
        paths: &[P],
    ) -> Vec<Result<CompiledExpression<S::Type>, CompileError>> {
        paths
            .iter()
            .map(|path| self.compile_member_path(root, path.as_ref()))
            .collect()
    }

    /// Compiles a free-form predicate such as `l => l.Hidden == false` as
    /// `source => Where(source, <filter>)` over the collection type `root`.
    pub fn compile_filter_expression(
        &self,
        root: &S::Type,
        filter: &str,
    ) -> Result<CompiledExpression<S::Type>, CompileError> {
        let source = &self.config.filter_variable;
        let snippet = format!("{} => Where({}, {})", source, source, filter);

        let predicate = match Parser::parse_str(filter) {
            Ok(Expr::Lambda(lambda)) => lambda,
            Ok(_) => return Err(CompileError::new(snippet, BindError::ExpectedLambda)),
            Err(e) => return Err(CompileError::new(snippet, e)),
        };
        let lambda = Lambda::new(source.clone(), Expr::param(source).filter(predicate));
        self.finish(root, lambda)
    }

    fn finish(
        &self,
        root: &S::Type,
        lambda: Lambda,
    ) -> Result<CompiledExpression<S::Type>, CompileError> {
        let code = to_source_with(&lambda, self.config);
        let result_type = match Binder::new(self.types).bind_root(&lambda, root) {
            Ok(ty) => ty,
            Err(e) => {
                debug!(code = %code, error = %e, "expression failed to bind");
                return Err(CompileError::new(code, e));
            }
        };
        let declaration = declaration(&self.types.full_name(root), &code, self.config);
        Ok(CompiledExpression {
            root: root.clone(),
            lambda,
            result_type,
            code,
            declaration,
        })
    }
}
