//! Type information consumed by the path compiler and the binder.
//!
//! [`TypeSystem`] is the reflection capability: enumerate the members of a
//! type and tell whether a type is a queryable collection. [`Schema`] is the
//! implementation used by the CLI and the tests, described in JSON:
//!
//! ```json
//! {
//!   "namespace": "Microsoft.SharePoint.Client",
//!   "types": [
//!     { "name": "Web", "members": [ { "name": "Lists", "type": "ListCollection" } ] },
//!     { "name": "ListCollection", "queryable_of": "List" },
//!     { "name": "List", "members": [ { "name": "Title", "type": "String" } ] }
//!   ]
//! }
//! ```

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::LazyLock,
};

use regex::Regex;
use serde::Deserialize;

/// A member of a type: its name and declared value type.
#[derive(Debug, Clone, PartialEq)]
pub struct Member<T> {
    pub name: String,
    pub value_type: T,
}

/// Outcome of resolving a member name.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberLookup<T> {
    Found(Member<T>),
    Missing,
    /// More than one member matched case-insensitively; carries their names.
    Ambiguous(Vec<String>),
}

impl<T> MemberLookup<T> {
    /// The unique match, if any. Ambiguous and missing are treated the same.
    pub fn found(self) -> Option<Member<T>> {
        match self {
            MemberLookup::Found(member) => Some(member),
            MemberLookup::Missing | MemberLookup::Ambiguous(_) => None,
        }
    }
}

/// Primitive value kinds a member can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Guid,
}

impl ScalarKind {
    /// Maps a built-in type name (`String`, `Int32`, ...) to its kind.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "String" => ScalarKind::String,
            "Int16" | "Int32" | "Int64" | "UInt32" | "UInt64" => ScalarKind::Integer,
            "Single" | "Double" | "Decimal" => ScalarKind::Float,
            "Boolean" => ScalarKind::Boolean,
            "DateTime" => ScalarKind::DateTime,
            "Guid" => ScalarKind::Guid,
            _ => return None,
        })
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::String => "String",
            ScalarKind::Integer => "Int32",
            ScalarKind::Float => "Double",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::Guid => "Guid",
        })
    }
}

/// Reflection over the types of a client object model.
pub trait TypeSystem {
    type Type: Clone + fmt::Debug + PartialEq;

    /// All members declared on `ty`, in declaration order.
    fn members(&self, ty: &Self::Type) -> &[Member<Self::Type>];

    /// The element type if `ty` behaves as a queryable collection.
    fn queryable_element_type(&self, ty: &Self::Type) -> Option<Self::Type>;

    /// Short name used in diagnostics.
    fn type_name(&self, ty: &Self::Type) -> String;

    /// Namespace-qualified name used in generated declarations.
    fn full_name(&self, ty: &Self::Type) -> String {
        self.type_name(ty)
    }

    fn scalar_kind(&self, _ty: &Self::Type) -> Option<ScalarKind> {
        None
    }

    /// Case-insensitive lookup that only accepts a single candidate.
    fn find_member(&self, ty: &Self::Type, name: &str) -> MemberLookup<Self::Type> {
        let mut candidates = self
            .members(ty)
            .iter()
            .filter(|member| member.name.eq_ignore_ascii_case(name));

        match (candidates.next(), candidates.next()) {
            (None, _) => MemberLookup::Missing,
            (Some(member), None) => MemberLookup::Found(member.clone()),
            (Some(first), Some(second)) => {
                let mut names = vec![first.name.clone(), second.name.clone()];
                names.extend(candidates.map(|member| member.name.clone()));
                MemberLookup::Ambiguous(names)
            }
        }
    }

    /// Exact, case-sensitive lookup.
    fn exact_member(&self, ty: &Self::Type, name: &str) -> Option<Member<Self::Type>> {
        self.members(ty)
            .iter()
            .find(|member| member.name == name)
            .cloned()
    }
}

/// Handle to a type in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName(pub String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("type '{type_name}' declares member '{member}' more than once")]
    DuplicateMember { type_name: String, member: String },

    #[error("type '{0}' is referenced but never defined")]
    UnknownType(String),
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    namespace: String,
    types: Vec<TypeDocument>,
}

#[derive(Debug, Deserialize)]
struct TypeDocument {
    name: String,
    #[serde(default)]
    members: Vec<MemberDocument>,
    #[serde(default)]
    queryable_of: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberDocument {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Clone, Default)]
struct TypeDef {
    members: Vec<Member<TypeName>>,
    queryable_of: Option<TypeName>,
}

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

const SHAREPOINT_SCHEMA: &str = include_str!("../schemas/sharepoint.json");

/// Type system described by a JSON document.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    namespace: String,
    types: HashMap<String, TypeDef>,
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// The bundled SharePoint client object model subset.
    pub fn sharepoint() -> Result<Self, SchemaError> {
        Self::from_json(SHAREPOINT_SCHEMA)
    }

    fn from_document(document: SchemaDocument) -> Result<Self, SchemaError> {
        let mut types = HashMap::new();

        for ty in &document.types {
            check_identifier(&ty.name)?;
            if ScalarKind::from_type_name(&ty.name).is_some() || types.contains_key(&ty.name) {
                return Err(SchemaError::DuplicateType(ty.name.clone()));
            }
            types.insert(ty.name.clone(), TypeDef::default());
        }

        let is_known = |name: &str| {
            types.contains_key(name) || ScalarKind::from_type_name(name).is_some()
        };

        let mut defs = HashMap::with_capacity(types.len());
        for ty in document.types {
            let mut seen = HashSet::new();
            let mut members = Vec::with_capacity(ty.members.len());

            for member in ty.members {
                check_identifier(&member.name)?;
                if !seen.insert(member.name.clone()) {
                    return Err(SchemaError::DuplicateMember {
                        type_name: ty.name,
                        member: member.name,
                    });
                }
                if !is_known(&member.type_name) {
                    return Err(SchemaError::UnknownType(member.type_name));
                }
                members.push(Member {
                    name: member.name,
                    value_type: TypeName(member.type_name),
                });
            }

            let queryable_of = match ty.queryable_of {
                Some(element) if !is_known(&element) => {
                    return Err(SchemaError::UnknownType(element));
                }
                element => element.map(TypeName),
            };

            defs.insert(
                ty.name,
                TypeDef {
                    members,
                    queryable_of,
                },
            );
        }

        tracing::debug!(
            namespace = %document.namespace,
            types = defs.len(),
            "loaded schema"
        );

        Ok(Schema {
            namespace: document.namespace,
            types: defs,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolves a defined or built-in type by exact name.
    pub fn lookup(&self, name: &str) -> Option<TypeName> {
        (self.types.contains_key(name) || ScalarKind::from_type_name(name).is_some())
            .then(|| TypeName::new(name))
    }

    /// Names of all defined (non built-in) types, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn check_identifier(name: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}

impl TypeSystem for Schema {
    type Type = TypeName;

    fn members(&self, ty: &TypeName) -> &[Member<TypeName>] {
        self.types
            .get(ty.as_str())
            .map(|def| def.members.as_slice())
            .unwrap_or(&[])
    }

    fn queryable_element_type(&self, ty: &TypeName) -> Option<TypeName> {
        self.types.get(ty.as_str())?.queryable_of.clone()
    }

    fn type_name(&self, ty: &TypeName) -> String {
        ty.0.clone()
    }

    fn full_name(&self, ty: &TypeName) -> String {
        if ScalarKind::from_type_name(ty.as_str()).is_some() {
            format!("System.{}", ty)
        } else if self.namespace.is_empty() {
            ty.0.clone()
        } else {
            format!("{}.{}", self.namespace, ty)
        }
    }

    fn scalar_kind(&self, ty: &TypeName) -> Option<ScalarKind> {
        ScalarKind::from_type_name(ty.as_str())
    }
}
