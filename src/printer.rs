//! Source text rendering of expression trees.
//!
//! The rendered form is what a person (or a C# compiler) reads:
//!
//! ```
//! use include_path::ast::{Expr, Lambda};
//! use include_path::printer::to_source;
//!
//! let tree = Lambda::new(
//!     "a",
//!     Expr::param("a")
//!         .member("Lists")
//!         .include(Lambda::new("b", Expr::param("b").member("Title"))),
//! );
//! assert_eq!(to_source(&tree), "a => Include(a.Lists, b => b.Title)");
//! ```
//!
//! Output is parenthesized only where precedence requires it, so parsing the
//! text back yields the same tree.

use std::fmt;

use crate::{
    ast::{BinOp, Expr, Lambda},
    config::CompilerConfig,
};

pub struct ExprPrinter<'a> {
    include_name: &'a str,
    where_name: &'a str,
}

/// Binding strength of postfix forms (member access, indexers, calls).
const POSTFIX: u8 = 10;
/// Binding strength of `!x` and `-x`.
const UNARY: u8 = 9;
/// Binding strength of `x => ...`.
const LAMBDA: u8 = 0;

impl<'a> ExprPrinter<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        ExprPrinter {
            include_name: config.include_name(),
            where_name: config.where_name(),
        }
    }

    /// Printer using bare `Include` / `Where`.
    pub fn short() -> ExprPrinter<'static> {
        ExprPrinter {
            include_name: "Include",
            where_name: "Where",
        }
    }

    pub fn print_lambda(&self, lambda: &Lambda) -> String {
        format!("{} => {}", lambda.param, self.print(&lambda.body))
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Float(n) => format!("{:?}", n),
            Expr::Integer(n) => n.to_string(),
            Expr::String(s) => format!("\"{}\"", self.escape_string(s)),
            Expr::Boolean(b) => b.to_string(),
            Expr::Null => "null".to_string(),
            Expr::Param(name) => name.clone(),
            Expr::Member { object, name } => {
                format!("{}.{}", self.print_operand(object, POSTFIX), name)
            }
            Expr::Index { object, key } => {
                format!("{}[{}]", self.print_operand(object, POSTFIX), self.print(key))
            }
            Expr::Include { source, selector } => format!(
                "{}({}, {})",
                self.include_name,
                self.print(source),
                self.print_lambda(selector)
            ),
            Expr::Where { source, predicate } => format!(
                "{}({}, {})",
                self.where_name,
                self.print(source),
                self.print_lambda(predicate)
            ),
            Expr::Lambda(lambda) => self.print_lambda(lambda),
            Expr::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                format!(
                    "{} {} {}",
                    self.print_operand(left, precedence),
                    op.symbol(),
                    // Left-associative: an equal-precedence right operand needs parentheses.
                    self.print_operand(right, precedence + 1)
                )
            }
            Expr::Not(operand) => format!("!{}", self.print_operand(operand, UNARY)),
            Expr::Negate(operand) => format!("-{}", self.print_operand(operand, UNARY)),
            Expr::MethodCall {
                object,
                method,
                args,
            } => format!(
                "{}.{}({})",
                self.print_operand(object, POSTFIX),
                method,
                self.print_args(args)
            ),
            Expr::Call { function, args } => format!("{}({})", function, self.print_args(args)),
        }
    }

    fn print_args(&self, args: &[Expr]) -> String {
        let items: Vec<String> = args.iter().map(|arg| self.print(arg)).collect();
        items.join(", ")
    }

    /// Prints `expr`, parenthesized when it binds looser than `min_precedence`.
    fn print_operand(&self, expr: &Expr, min_precedence: u8) -> String {
        let text = self.print(expr);
        if precedence(expr) < min_precedence {
            format!("({})", text)
        } else {
            text
        }
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c => vec![c],
            })
            .collect()
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Lambda(_) => LAMBDA,
        Expr::BinaryOp { op, .. } => op.precedence(),
        Expr::Not(_) | Expr::Negate(_) => UNARY,
        // Negative literals print with a leading `-`.
        Expr::Integer(n) if *n < 0 => UNARY,
        Expr::Float(n) if n.is_sign_negative() => UNARY,
        _ => POSTFIX,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExprPrinter::short().print(self))
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExprPrinter::short().print_lambda(self))
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Renders with bare `Include` / `Where` names.
pub fn to_source(lambda: &Lambda) -> String {
    ExprPrinter::short().print_lambda(lambda)
}

/// Renders with the operator names and style from `config`.
pub fn to_source_with(lambda: &Lambda, config: &CompilerConfig) -> String {
    ExprPrinter::new(config).print_lambda(lambda)
}

/// Wraps rendered code in a typed declaration-and-return snippet:
///
/// ```text
/// using Microsoft.SharePoint.Client;
/// ...
/// Expression<Func<Microsoft.SharePoint.Client.Web, object>> GetExpression() { return a => a.Title; }
/// return GetExpression();
/// ```
pub fn declaration(root_type: &str, code: &str, config: &CompilerConfig) -> String {
    let mut result = String::new();
    for import in &config.imports {
        result.push_str(&format!("using {};\n", import));
    }
    if !config.imports.is_empty() {
        result.push('\n');
    }
    result.push_str(&format!(
        "Expression<Func<{}, object>> GetExpression() {{ return {}; }}\nreturn GetExpression();",
        root_type, code
    ));
    result
}
