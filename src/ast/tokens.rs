#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 100
    /// ```
    Integer(i64),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "Documents"
    /// 'FileRef'
    /// ```
    String(String),

    /// Boolean values
    ///
    /// # Examples
    /// ```text
    /// true
    /// false
    /// ```
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers
    /// Member name, lambda parameter or function name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// Title
    /// RoleAssignments
    /// __filter_source
    /// ```
    Identifier(String),

    /// Lambda arrow
    ///
    /// # Examples
    /// ```text
    /// a => a.Title
    /// ```
    Arrow,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction or negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    // Logical
    /// Logical AND
    ///
    /// # Examples
    /// ```text
    /// l.Hidden == false && l.ItemCount > 0
    /// ```
    AndAnd,

    /// Logical OR
    OrOr,

    /// Logical NOT
    Bang,

    // Delimiters
    /// Left bracket for indexers
    LBracket,

    /// Right bracket
    RBracket,

    /// Left parenthesis for grouping or calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Dot for member access
    Dot,

    /// Comma for separating arguments
    Comma,

    /// End of input
    Eof,
}
