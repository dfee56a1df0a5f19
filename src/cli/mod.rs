//! CLI support for include-path
//!
//! The binary is a thin wrapper over these functions; each returns the text to
//! print so the commands can be driven from tests.

mod commands;
mod convert;

pub use commands::{
    CliContext, SessionOptions, execute_compile, execute_eval, execute_filter, execute_generate,
    execute_types,
};
pub use convert::{json_to_value, value_to_json};

use std::{io, path::PathBuf};

use crate::{CompileError, EvalError, PathError, SchemaError};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Unknown type '{0}'. Run 'include-path types' to list the known types.")]
    UnknownType(String),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}
