// tests/adapter_tests.rs

use std::collections::HashMap;

use include_path::adapter::{CompileErrorKind, ExpressionCompiler};
use include_path::binder::{BindError, BoundType};
use include_path::compiler::{MAX_NESTING, PathError};
use include_path::config::{CompilerConfig, RenderStyle};
use include_path::evaluator::EvalError;
use include_path::parser::ParseError;
use include_path::schema::{ScalarKind, Schema, TypeName};
use include_path::value::Value;

fn object(fields: Vec<(&str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect::<HashMap<_, _>>(),
    )
}

fn text(s: &str) -> Value {
    Value::String(s.to_string())
}

/// A web with two lists; the first has a role assignment for "Owners".
fn sample_web() -> Value {
    let owners = object(vec![("Title", text("Owners")), ("LoginName", text("owners"))]);
    let assignment = object(vec![
        ("PrincipalId", Value::Integer(3)),
        ("Member", owners),
        (
            "RoleDefinitionBindings",
            Value::Array(vec![object(vec![("Name", text("Full Control"))])]),
        ),
    ]);
    let documents = object(vec![
        ("Title", text("Documents")),
        ("Hidden", Value::Boolean(false)),
        ("ItemCount", Value::Integer(12)),
        ("DefaultView", object(vec![("Title", text("All Documents"))])),
        ("RoleAssignments", Value::Array(vec![assignment])),
    ]);
    let catalog = object(vec![
        ("Title", text("Catalog")),
        ("Hidden", Value::Boolean(true)),
        ("ItemCount", Value::Integer(0)),
        ("DefaultView", object(vec![("Title", text("All Items"))])),
        ("RoleAssignments", Value::Array(vec![])),
    ]);
    object(vec![
        ("Title", text("Team Site")),
        ("Lists", Value::Array(vec![documents, catalog])),
        ("PropertyKey", text("custom")),
    ])
}

// ============================================================================
// compile_member_path
// ============================================================================

#[test]
fn test_compile_scalar_path() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let compiled = compiler.compile_member_path(&web, "Title").unwrap();
    assert_eq!(compiled.code(), "a => a.Title");
    assert_eq!(compiled.root(), &web);
    assert_eq!(compiled.result_type(), &BoundType::Scalar(ScalarKind::String));
    assert_eq!(compiled.evaluate(&sample_web()).unwrap(), text("Team Site"));
}

#[test]
fn test_compile_nested_includes() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let compiled = compiler
        .compile_member_path(&web, "Lists.RoleAssignments.Member")
        .unwrap();
    assert_eq!(
        compiled.code(),
        "a => Include(a.Lists, b => Include(b.RoleAssignments, c => c.Member))"
    );
    assert_eq!(
        compiled.result_type(),
        &BoundType::Object(TypeName::new("ListCollection"))
    );
}

#[test]
fn test_compile_reports_empty_path() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let err = compiler.compile_member_path(&web, "..").unwrap_err();
    assert_eq!(err.snippet, "..");
    assert_eq!(err.kind, CompileErrorKind::InvalidPath(PathError::Empty("..".to_string())));
}

#[test]
fn test_wrong_casing_generates_but_fails_to_bind() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let err = compiler.compile_member_path(&web, "title").unwrap_err();
    assert_eq!(err.snippet, "a => a.title");
    assert!(matches!(err.kind, CompileErrorKind::Bind(BindError::UnknownMember { .. })));
    assert_eq!(
        err.to_string(),
        "error while generating expression for code snippet 'a => a.title': \
         'Web' does not contain a definition for 'title'; did you mean 'Title'?"
    );
}

#[test]
fn test_declaration_snippet() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let compiled = compiler.compile_member_path(&web, "Lists.Title").unwrap();
    assert_eq!(
        compiled.declaration(),
        "using Microsoft.SharePoint.Client;\n\
         using System;\n\
         using System.Linq;\n\
         using System.Linq.Expressions;\n\
         \n\
         Expression<Func<Microsoft.SharePoint.Client.Web, object>> GetExpression() \
         { return a => Include(a.Lists, b => b.Title); }\n\
         return GetExpression();"
    );
}

#[test]
fn test_qualified_config() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default().with_style(RenderStyle::Qualified);
    let compiler = ExpressionCompiler::new(&schema, &config);
    let items = schema.lookup("ListItemCollection").unwrap();

    let compiled = compiler.compile_member_path(&items, "FileRef").unwrap();
    assert_eq!(
        compiled.code(),
        r#"a => Microsoft.SharePoint.Client.ClientObjectQueryableExtension.Include(a, b => b["FileRef"])"#
    );
}

#[test]
fn test_deep_paths() {
    let schema = Schema::from_json(
        r#"{
            "types": [
                { "name": "Node", "members": [ { "name": "Children", "type": "NodeCollection" } ] },
                { "name": "NodeCollection", "queryable_of": "Node" }
            ]
        }"#,
    )
    .unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let node = TypeName::new("Node");

    let deepest = vec!["Children"; MAX_NESTING].join(".");
    let compiled = compiler.compile_member_path(&node, &deepest).unwrap();
    let leaf = object(vec![("Children", Value::Array(vec![]))]);
    assert_eq!(compiled.evaluate(&leaf).unwrap(), Value::Array(vec![]));

    let too_deep = vec!["Children"; 3000].join(".");
    let err = compiler.compile_member_path(&node, &too_deep).unwrap_err();
    assert_eq!(err.snippet, too_deep);
    assert!(matches!(err.kind, CompileErrorKind::InvalidPath(PathError::TooDeep { .. })));
}

// ============================================================================
// compile_member_paths
// ============================================================================

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let results = compiler.compile_member_paths(&web, &["Lists.Title", "", "lists", "Title"]);
    assert_eq!(results.len(), 4);
    assert_eq!(
        results[0].as_ref().unwrap().code(),
        "a => Include(a.Lists, b => b.Title)"
    );
    assert!(matches!(
        results[1].as_ref().unwrap_err().kind,
        CompileErrorKind::InvalidPath(_)
    ));
    assert!(matches!(
        results[2].as_ref().unwrap_err().kind,
        CompileErrorKind::Bind(_)
    ));
    assert_eq!(results[3].as_ref().unwrap().code(), "a => a.Title");
}

// ============================================================================
// compile_filter_expression
// ============================================================================

#[test]
fn test_filter_wraps_in_where() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let compiled = compiler
        .compile_filter_expression(&lists, "l => l.Hidden == false && l.ItemCount > 0")
        .unwrap();
    assert_eq!(
        compiled.code(),
        "__filter_source => Where(__filter_source, l => l.Hidden == false && l.ItemCount > 0)"
    );

    let web = sample_web();
    let result = compiled.evaluate(web.get("Lists").unwrap()).unwrap();
    let Value::Array(kept) = result else {
        panic!("expected a collection, got {:?}", result);
    };
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].get("Title"), Some(&text("Documents")));
}

#[test]
fn test_filter_uses_configured_variable() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig {
        filter_variable: "src".to_string(),
        ..CompilerConfig::default()
    };
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let compiled = compiler
        .compile_filter_expression(&lists, r#"l => l.Title.StartsWith("Doc")"#)
        .unwrap();
    assert_eq!(
        compiled.code(),
        r#"src => Where(src, l => l.Title.StartsWith("Doc"))"#
    );
}

#[test]
fn test_filter_must_be_a_lambda() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let err = compiler.compile_filter_expression(&lists, "true").unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::Bind(BindError::ExpectedLambda));
    assert_eq!(err.snippet, "__filter_source => Where(__filter_source, true)");
}

#[test]
fn test_filter_must_be_boolean() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let err = compiler.compile_filter_expression(&lists, "l => l.Title").unwrap_err();
    assert_eq!(
        err.kind,
        CompileErrorKind::Bind(BindError::PredicateNotBoolean("String".to_string()))
    );
}

#[test]
fn test_filter_syntax_error() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let err = compiler.compile_filter_expression(&lists, "l => l.Title ==").unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::Syntax(ParseError::Unexpected { .. })));
}

#[test]
fn test_filter_reports_integer_overflow() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let lists = schema.lookup("ListCollection").unwrap();

    let compiled = compiler
        .compile_filter_expression(&lists, "l => l.ItemCount / -1 == 1")
        .unwrap();
    let instance = Value::Array(vec![object(vec![("ItemCount", Value::Integer(i64::MIN))])]);
    assert_eq!(
        compiled.evaluate(&instance),
        Err(EvalError::TypeError("Integer overflow".to_string()))
    );
}

#[test]
fn test_filter_needs_queryable_root() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();

    let err = compiler.compile_filter_expression(&web, "w => w.Title == \"x\"").unwrap_err();
    assert!(matches!(
        err.kind,
        CompileErrorKind::Bind(BindError::NotQueryable { operator: "Where", .. })
    ));
}

// ============================================================================
// Evaluation round trips
// ============================================================================

#[test]
fn test_evaluate_every_branch() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let web = schema.lookup("Web").unwrap();
    let instance = sample_web();

    let eval = |path: &str| {
        compiler
            .compile_member_path(&web, path)
            .unwrap()
            .evaluate(&instance)
            .unwrap()
    };

    assert_eq!(eval("PropertyKey"), text("custom"));
    assert_eq!(
        eval("Lists.Title"),
        Value::Array(vec![text("Documents"), text("Catalog")])
    );
    assert_eq!(
        eval("Lists.DefaultView.Title"),
        Value::Array(vec![text("All Documents"), text("All Items")])
    );
    assert_eq!(
        eval("Lists.RoleAssignments.Member"),
        Value::Array(vec![
            Value::Array(vec![object(vec![
                ("Title", text("Owners")),
                ("LoginName", text("owners")),
            ])]),
            Value::Array(vec![]),
        ])
    );
}

#[test]
fn test_evaluate_queryable_root() {
    let schema = Schema::sharepoint().unwrap();
    let config = CompilerConfig::default();
    let compiler = ExpressionCompiler::new(&schema, &config);
    let items = schema.lookup("ListItemCollection").unwrap();

    let instance = Value::Array(vec![
        object(vec![("DisplayName", text("a.docx")), ("FileRef", text("/a.docx"))]),
        object(vec![("DisplayName", text("b.docx"))]),
    ]);

    let compiled = compiler.compile_member_path(&items, "FileRef").unwrap();
    assert_eq!(
        compiled.evaluate(&instance).unwrap(),
        Value::Array(vec![text("/a.docx"), Value::Null])
    );
}
