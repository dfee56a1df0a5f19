use crate::ast::BinOp;

/// Abstract Syntax Tree node of an accessor or filter expression.
///
/// Trees are built directly by the path compiler or produced by the parser
/// from expression text. Rendering a tree with the printer yields the text form.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 0.5
    /// ```
    Float(f64),

    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "Documents"
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// Reference to a bound lambda parameter
    ///
    /// # Example
    /// ```text
    /// b
    /// ```
    Param(String),

    // Access
    /// Typed member access
    ///
    /// # Examples
    /// ```text
    /// a.Title
    /// b.DefaultView.Title
    /// ```
    Member { object: Box<Expr>, name: String },

    /// Dynamic lookup through the object's string indexer
    ///
    /// # Example
    /// ```text
    /// b["FileRef"]
    /// ```
    Index { object: Box<Expr>, key: Box<Expr> },

    // Query operators
    /// Per-element inclusion on a queryable collection
    ///
    /// # Example
    /// ```text
    /// Include(a.Lists, b => b.Title)
    /// ```
    Include { source: Box<Expr>, selector: Lambda },

    /// Filtering of a queryable collection
    ///
    /// # Example
    /// ```text
    /// Where(s, l => l.Hidden == false)
    /// ```
    Where { source: Box<Expr>, predicate: Lambda },

    /// Nested lambda in expression position
    Lambda(Lambda),

    // Operations
    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation (`!`)
    Not(Box<Expr>),

    /// Arithmetic negation (`-`)
    Negate(Box<Expr>),

    /// Method call on a receiver
    ///
    /// # Examples
    /// ```text
    /// l.Title.StartsWith("Doc")
    /// b.RoleAssignments.Count()
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Call of a free function that is neither `Include` nor `Where`
    Call { function: String, args: Vec<Expr> },
}

/// Single-parameter lambda: `param => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub param: String,
    pub body: Box<Expr>,
}

impl Lambda {
    pub fn new(param: impl Into<String>, body: Expr) -> Self {
        Lambda {
            param: param.into(),
            body: Box::new(body),
        }
    }
}

impl Expr {
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Param(name.into())
    }

    /// `self.name`
    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(self),
            name: name.into(),
        }
    }

    /// `self["key"]`
    pub fn index(self, key: impl Into<String>) -> Self {
        Expr::Index {
            object: Box::new(self),
            key: Box::new(Expr::String(key.into())),
        }
    }

    /// `Include(self, selector)`
    pub fn include(self, selector: Lambda) -> Self {
        Expr::Include {
            source: Box::new(self),
            selector,
        }
    }

    /// `Where(self, predicate)`
    pub fn filter(self, predicate: Lambda) -> Self {
        Expr::Where {
            source: Box::new(self),
            predicate,
        }
    }

    /// Number of nodes on the longest root-to-leaf chain, counted without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(expr.children().into_iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Float(_)
            | Expr::Integer(_)
            | Expr::String(_)
            | Expr::Boolean(_)
            | Expr::Null
            | Expr::Param(_) => vec![],
            Expr::Member { object, .. } | Expr::Not(object) | Expr::Negate(object) => vec![&**object],
            Expr::Index { object, key } => vec![&**object, &**key],
            Expr::Include {
                source,
                selector: lambda,
            }
            | Expr::Where {
                source,
                predicate: lambda,
            } => vec![&**source, &*lambda.body],
            Expr::Lambda(lambda) => vec![&*lambda.body],
            Expr::BinaryOp { left, right, .. } => vec![&**left, &**right],
            Expr::MethodCall { object, args, .. } => {
                let mut children = vec![&**object];
                children.extend(args);
                children
            }
            Expr::Call { args, .. } => args.iter().collect(),
        }
    }
}
