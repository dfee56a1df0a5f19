use std::collections::HashMap;

/// A node of an in-memory client object graph.
///
/// Compiled expressions are evaluated against values of this type. Client
/// objects are [`Value::Object`]s whose map holds both typed properties
/// (`Title`) and dynamic field values reached through the indexer
/// (`FileRef`). Queryable collections are [`Value::Array`]s.
///
/// # Examples
///
/// ```
/// use include_path::Value;
/// use std::collections::HashMap;
///
/// let mut list = HashMap::new();
/// list.insert("Title".to_string(), Value::String("Documents".to_string()));
/// list.insert("ItemCount".to_string(), Value::Integer(12));
///
/// let mut web = HashMap::new();
/// web.insert("Lists".to_string(), Value::Array(vec![Value::Object(list)]));
/// let web = Value::Object(web);
///
/// assert!(web.get("Lists").is_some());
/// assert_eq!(web.get("Missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    String(String),

    /// Collection of client objects or plain values
    Array(Vec<Value>),

    /// Client object: property and field values by name
    Object(HashMap<String, Value>),
}

impl Value {
    /// Check if the value is truthy (for conditions)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(_) => true,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Property or field value of an object.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Human-readable name of the value's kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "collection",
            Value::Object(_) => "object",
        }
    }
}
