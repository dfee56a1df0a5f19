// tests/compiler_tests.rs

use include_path::compiler::{MAX_NESTING, PathCompiler, PathError};
use include_path::config::{CompilerConfig, RenderStyle};
use include_path::printer::{to_source, to_source_with};
use include_path::schema::{Schema, TypeName};

fn sharepoint() -> Schema {
    Schema::sharepoint().unwrap()
}

fn generate(root: &str, path: &str) -> String {
    let schema = sharepoint();
    let root = schema.lookup(root).unwrap();
    let lambda = PathCompiler::new(&schema).generate(&root, path).unwrap();
    to_source(&lambda)
}

fn generate_qualified(root: &str, path: &str) -> String {
    let schema = sharepoint();
    let config = CompilerConfig::default().with_style(RenderStyle::Qualified);
    let root = schema.lookup(root).unwrap();
    let lambda = PathCompiler::new(&schema).generate(&root, path).unwrap();
    to_source_with(&lambda, &config)
}

// ============================================================================
// Member chains
// ============================================================================

#[test]
fn test_scalar_member() {
    assert_eq!(generate("Web", "Title"), "a => a.Title");
}

#[test]
fn test_unknown_member_uses_indexer() {
    assert_eq!(generate("Web", "PropertyKey"), r#"a => a["PropertyKey"]"#);
}

#[test]
fn test_indexer_stops_the_walk() {
    assert_eq!(
        generate("Web", "PropertyKey.Title.Lists"),
        r#"a => a["PropertyKey"]"#
    );
}

#[test]
fn test_object_member_chain() {
    assert_eq!(generate("Web", "CurrentUser.LoginName"), "a => a.CurrentUser.LoginName");
}

#[test]
fn test_empty_segments_are_skipped() {
    assert_eq!(generate("Web", ".Lists..Title."), "a => Include(a.Lists, b => b.Title)");
}

// ============================================================================
// Queryable boundaries
// ============================================================================

#[test]
fn test_collection_member() {
    assert_eq!(generate("Web", "Lists"), "a => Include(a.Lists, b => b)");
}

#[test]
fn test_collection_then_scalar() {
    assert_eq!(generate("Web", "Lists.Title"), "a => Include(a.Lists, b => b.Title)");
}

#[test]
fn test_two_collections() {
    assert_eq!(
        generate("Web", "Lists.RoleAssignments"),
        "a => Include(a.Lists, b => Include(b.RoleAssignments, c => c))"
    );
}

#[test]
fn test_role_assignment_members() {
    assert_eq!(
        generate("Web", "Lists.RoleAssignments.Member"),
        "a => Include(a.Lists, b => Include(b.RoleAssignments, c => c.Member))"
    );
}

#[test]
fn test_scalars_between_boundaries_share_a_variable() {
    assert_eq!(
        generate("Web", "Lists.DefaultView.Title"),
        "a => Include(a.Lists, b => b.DefaultView.Title)"
    );
}

#[test]
fn test_queryable_root() {
    assert_eq!(
        generate("ListItemCollection", "DisplayName"),
        "a => Include(a, b => b.DisplayName)"
    );
}

#[test]
fn test_queryable_root_with_indexer() {
    assert_eq!(
        generate("ListItemCollection", "FileRef"),
        r#"a => Include(a, b => b["FileRef"])"#
    );
}

#[test]
fn test_role_definition_bindings() {
    assert_eq!(
        generate("Web", "RoleAssignments.RoleDefinitionBindings.Name"),
        "a => Include(a.RoleAssignments, b => Include(b.RoleDefinitionBindings, c => c.Name))"
    );
}

#[test]
fn test_member_lookup_ignores_case() {
    // The caller's spelling is kept in the output.
    assert_eq!(generate("Web", "lists.title"), "a => Include(a.lists, b => b.title)");
}

// ============================================================================
// Qualified rendering
// ============================================================================

#[test]
fn test_qualified_vectors() {
    let include = "Microsoft.SharePoint.Client.ClientObjectQueryableExtension.Include";
    let cases = vec![
        ("Web", "Title", "a => a.Title".to_string()),
        ("Web", "PropertyKey", r#"a => a["PropertyKey"]"#.to_string()),
        ("Web", "Lists", format!("a => {include}(a.Lists, b => b)")),
        ("Web", "Lists.Title", format!("a => {include}(a.Lists, b => b.Title)")),
        (
            "Web",
            "Lists.RoleAssignments",
            format!("a => {include}(a.Lists, b => {include}(b.RoleAssignments, c => c))"),
        ),
        (
            "Web",
            "Lists.RoleAssignments.Member",
            format!("a => {include}(a.Lists, b => {include}(b.RoleAssignments, c => c.Member))"),
        ),
        (
            "Web",
            "Lists.DefaultView.Title",
            format!("a => {include}(a.Lists, b => b.DefaultView.Title)"),
        ),
        (
            "ListItemCollection",
            "DisplayName",
            format!("a => {include}(a, b => b.DisplayName)"),
        ),
        (
            "ListItemCollection",
            "FileRef",
            format!(r#"a => {include}(a, b => b["FileRef"])"#),
        ),
        (
            "Web",
            "RoleAssignments.RoleDefinitionBindings.Name",
            format!("a => {include}(a.RoleAssignments, b => {include}(b.RoleDefinitionBindings, c => c.Name))"),
        ),
    ];

    for (root, path, expected) in cases {
        assert_eq!(generate_qualified(root, path), expected, "path {}", path);
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_generate_is_idempotent() {
    let schema = sharepoint();
    let compiler = PathCompiler::new(&schema);
    let web = schema.lookup("Web").unwrap();

    let first = compiler.generate(&web, "Lists.RoleAssignments.Member").unwrap();
    let second = compiler.generate(&web, "Lists.RoleAssignments.Member").unwrap();
    assert_eq!(first, second);
    assert_eq!(to_source(&first), to_source(&second));
}

#[test]
fn test_empty_path() {
    let schema = sharepoint();
    let web = schema.lookup("Web").unwrap();
    let compiler = PathCompiler::new(&schema);

    assert_eq!(compiler.generate(&web, ""), Err(PathError::Empty(String::new())));
    assert_eq!(
        compiler.generate(&web, "..."),
        Err(PathError::Empty("...".to_string()))
    );
}

#[test]
fn test_ambiguous_member_falls_back_to_indexer() {
    let schema = Schema::from_json(
        r#"{
            "types": [
                {
                    "name": "Item",
                    "members": [
                        { "name": "Name", "type": "String" },
                        { "name": "NAME", "type": "String" },
                        { "name": "Title", "type": "String" }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();
    let compiler = PathCompiler::new(&schema);
    let item = TypeName::new("Item");

    let lambda = compiler.generate(&item, "name").unwrap();
    assert_eq!(to_source(&lambda), r#"a => a["name"]"#);

    // An exact spelling is still ambiguous under the case-insensitive rule.
    let lambda = compiler.generate(&item, "Name").unwrap();
    assert_eq!(to_source(&lambda), r#"a => a["Name"]"#);

    let lambda = compiler.generate(&item, "title").unwrap();
    assert_eq!(to_source(&lambda), "a => a.title");
}

/// A type whose `Children` are a collection of itself.
fn tree_schema() -> Schema {
    Schema::from_json(
        r#"{
            "types": [
                { "name": "Node", "members": [ { "name": "Children", "type": "NodeCollection" } ] },
                { "name": "NodeCollection", "queryable_of": "Node" }
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn test_variables_continue_past_z() {
    let schema = tree_schema();
    let path = vec!["Children"; 27].join(".");
    let lambda = PathCompiler::new(&schema)
        .generate(&TypeName::new("Node"), &path)
        .unwrap();
    let text = to_source(&lambda);

    assert!(text.starts_with("a => Include(a.Children, b => Include(b.Children, c =>"));
    assert!(text.contains("y => Include(y.Children, z => Include(z.Children, aa => Include(aa.Children, ab => ab)"));
    assert!(text.ends_with(&format!("ab => ab{}", ")".repeat(27))));
}

#[test]
fn test_nesting_limit() {
    let schema = tree_schema();
    let compiler = PathCompiler::new(&schema);
    let node = TypeName::new("Node");

    let path = vec!["Children"; MAX_NESTING].join(".");
    assert!(compiler.generate(&node, &path).is_ok());

    let path = vec!["Children"; MAX_NESTING + 1].join(".");
    assert_eq!(
        compiler.generate(&node, &path),
        Err(PathError::TooDeep {
            path: path.clone(),
            limit: MAX_NESTING,
        })
    );
}

#[test]
fn test_thousands_of_levels_are_rejected() {
    let schema = tree_schema();
    let path = vec!["Children"; 5000].join(".");
    let result = PathCompiler::new(&schema).generate(&TypeName::new("Node"), &path);
    assert!(matches!(result, Err(PathError::TooDeep { limit: MAX_NESTING, .. })));
}
