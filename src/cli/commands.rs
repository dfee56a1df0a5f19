//! Command implementations

use std::{fs, path::PathBuf};

use tracing::debug;

use super::{CliError, json_to_value, value_to_json};
use crate::{
    CompilerConfig, ExpressionCompiler, PathCompiler, RenderStyle, Schema, TypeName,
    TypeSystem, to_source_with,
};

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Schema file; the bundled SharePoint schema when absent
    pub schema: Option<PathBuf>,
    /// Compiler config file
    pub config: Option<PathBuf>,
    /// Render namespace-qualified `Include` / `Where`
    pub qualified: bool,
}

/// Schema and config loaded once per invocation
#[derive(Debug)]
pub struct CliContext {
    pub schema: Schema,
    pub config: CompilerConfig,
}

impl CliContext {
    pub fn load(options: &SessionOptions) -> Result<Self, CliError> {
        let schema = match &options.schema {
            Some(path) => Schema::from_json(&fs::read_to_string(path)?)?,
            None => Schema::sharepoint()?,
        };
        let mut config = match &options.config {
            Some(path) => CompilerConfig::from_json(&fs::read_to_string(path)?).map_err(
                |source| CliError::Config {
                    path: path.clone(),
                    source,
                },
            )?,
            None => CompilerConfig::default(),
        };
        if options.qualified {
            config.style = RenderStyle::Qualified;
        }
        debug!(namespace = schema.namespace(), style = ?config.style, "session loaded");
        Ok(CliContext { schema, config })
    }

    fn root(&self, name: &str) -> Result<TypeName, CliError> {
        self.schema
            .lookup(name)
            .ok_or_else(|| CliError::UnknownType(name.to_string()))
    }

    fn compiler(&self) -> ExpressionCompiler<'_, Schema> {
        ExpressionCompiler::new(&self.schema, &self.config)
    }
}

/// Generated accessor text, without type checking.
pub fn execute_generate(context: &CliContext, root: &str, path: &str) -> Result<String, CliError> {
    let root = context.root(root)?;
    let lambda = PathCompiler::new(&context.schema).generate(&root, path)?;
    Ok(to_source_with(&lambda, &context.config))
}

/// One checked result per path, in input order.
pub fn execute_compile(
    context: &CliContext,
    root: &str,
    paths: &[String],
    declaration: bool,
) -> Result<Vec<Result<String, CliError>>, CliError> {
    let root = context.root(root)?;
    Ok(context
        .compiler()
        .compile_member_paths(&root, paths)
        .into_iter()
        .map(|result| {
            result
                .map(|compiled| render(compiled.code(), compiled.declaration(), declaration))
                .map_err(CliError::from)
        })
        .collect())
}

pub fn execute_filter(
    context: &CliContext,
    root: &str,
    filter: &str,
    declaration: bool,
) -> Result<String, CliError> {
    let root = context.root(root)?;
    let compiled = context.compiler().compile_filter_expression(&root, filter)?;
    Ok(render(compiled.code(), compiled.declaration(), declaration))
}

/// Compiles `path` and runs it against the JSON instance in `input`.
pub fn execute_eval(
    context: &CliContext,
    root: &str,
    path: &str,
    input: Option<&str>,
) -> Result<serde_json::Value, CliError> {
    let root = context.root(root)?;
    let compiled = context.compiler().compile_member_path(&root, path)?;
    let input = input.ok_or(CliError::NoInput)?;
    let instance = json_to_value(serde_json::from_str(input)?);
    Ok(value_to_json(compiled.evaluate(&instance)?))
}

/// One line per schema type: its name and what it holds or declares.
pub fn execute_types(context: &CliContext) -> Vec<String> {
    let schema = &context.schema;
    schema
        .type_names()
        .into_iter()
        .filter_map(|name| schema.lookup(name))
        .map(|ty| match schema.queryable_element_type(&ty) {
            Some(element) => format!("{}  (collection of {})", ty, element),
            None => {
                let members: Vec<String> = schema
                    .members(&ty)
                    .iter()
                    .map(|member| format!("{}: {}", member.name, member.value_type))
                    .collect();
                if members.is_empty() {
                    ty.to_string()
                } else {
                    format!("{}  {{ {} }}", ty, members.join(", "))
                }
            }
        })
        .collect()
}

fn render(code: &str, snippet: &str, declaration: bool) -> String {
    if declaration {
        snippet.to_string()
    } else {
        code.to_string()
    }
}
