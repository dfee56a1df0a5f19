//! Type checking of expression trees against a [`TypeSystem`].
//!
//! Member access is resolved the way a compiler for the client model would:
//! exact, case-sensitive names. Indexer results are untyped (`dynamic`) and
//! anything reached through them is accepted.

use crate::{
    ast::{BinOp, Expr, Lambda},
    schema::{ScalarKind, TypeSystem},
};

/// Static type of a bound expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundType<T> {
    /// A type from the type system, collections included.
    Object(T),
    Scalar(ScalarKind),
    Null,
    /// Result of an indexer lookup.
    Dynamic,
}

impl<T> BoundType<T> {
    fn is_boolean(&self) -> bool {
        matches!(self, BoundType::Scalar(ScalarKind::Boolean) | BoundType::Dynamic)
    }

    fn is_string(&self) -> bool {
        matches!(self, BoundType::Scalar(ScalarKind::String) | BoundType::Dynamic)
    }

    fn numeric(&self) -> Option<ScalarKind> {
        match self {
            BoundType::Scalar(kind @ (ScalarKind::Integer | ScalarKind::Float)) => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("the name '{0}' does not exist in the current context")]
    UnknownVariable(String),

    #[error("'{owner}' does not contain a definition for '{member}'{hint}")]
    UnknownMember {
        owner: String,
        member: String,
        hint: String,
    },

    #[error("cannot access member '{member}' on a value of type {type_name}")]
    NoMembers { type_name: String, member: String },

    #[error("cannot apply indexing to a value of type {0}")]
    NotIndexable(String),

    #[error("indexer key must be a string, found {0}")]
    InvalidIndexKey(String),

    #[error("{operator} requires a queryable source, found {type_name}")]
    NotQueryable {
        operator: &'static str,
        type_name: String,
    },

    #[error("filter must be a lambda expression")]
    ExpectedLambda,

    #[error("filter body must be boolean, found {0}")]
    PredicateNotBoolean(String),

    #[error("lambda expressions are only allowed as Include or Where arguments")]
    UnexpectedLambda,

    #[error("operator '{op}' cannot be applied to operands of type {left} and {right}")]
    InvalidOperands {
        op: BinOp,
        left: String,
        right: String,
    },

    #[error("operator '{operator}' cannot be applied to an operand of type {type_name}")]
    InvalidOperand {
        operator: &'static str,
        type_name: String,
    },

    #[error("'{receiver}' does not contain a method '{method}'")]
    UnknownMethod { method: String, receiver: String },

    #[error("method '{method}' takes {expected} argument(s) but {found} were supplied")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("argument of '{method}' must be a string, found {found}")]
    ArgumentType { method: String, found: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),
}

type BindResult<T> = Result<BoundType<T>, BindError>;

pub struct Binder<'a, S: TypeSystem> {
    types: &'a S,
    scopes: Vec<(String, BoundType<S::Type>)>,
}

impl<'a, S: TypeSystem> Binder<'a, S> {
    pub fn new(types: &'a S) -> Self {
        Binder {
            types,
            scopes: Vec::new(),
        }
    }

    /// Binds an accessor lambda whose parameter is an instance of `root`,
    /// returning the type of its body.
    pub fn bind_root(&mut self, lambda: &Lambda, root: &S::Type) -> BindResult<S::Type> {
        let param_type = self.value_type(root.clone());
        self.bind_lambda(lambda, param_type)
    }

    /// Binds `lambda` with its parameter typed as `param_type`.
    pub fn bind_lambda(
        &mut self,
        lambda: &Lambda,
        param_type: BoundType<S::Type>,
    ) -> BindResult<S::Type> {
        self.scopes.push((lambda.param.clone(), param_type));
        let result = self.bind(&lambda.body);
        self.scopes.pop();
        result
    }

    pub fn bind(&mut self, expr: &Expr) -> BindResult<S::Type> {
        match expr {
            Expr::Float(_) => Ok(BoundType::Scalar(ScalarKind::Float)),
            Expr::Integer(_) => Ok(BoundType::Scalar(ScalarKind::Integer)),
            Expr::String(_) => Ok(BoundType::Scalar(ScalarKind::String)),
            Expr::Boolean(_) => Ok(BoundType::Scalar(ScalarKind::Boolean)),
            Expr::Null => Ok(BoundType::Null),
            Expr::Param(name) => self
                .scopes
                .iter()
                .rev()
                .find(|(param, _)| param == name)
                .map(|(_, ty)| ty.clone())
                .ok_or_else(|| BindError::UnknownVariable(name.clone())),
            Expr::Member { object, name } => {
                let object_type = self.bind(object)?;
                self.bind_member(object_type, name)
            }
            Expr::Index { object, key } => {
                let object_type = self.bind(object)?;
                let key_type = self.bind(key)?;
                if !key_type.is_string() {
                    return Err(BindError::InvalidIndexKey(self.describe(&key_type)));
                }
                match object_type {
                    BoundType::Object(ty) if self.types.scalar_kind(&ty).is_none() => {
                        Ok(BoundType::Dynamic)
                    }
                    BoundType::Dynamic => Ok(BoundType::Dynamic),
                    other => Err(BindError::NotIndexable(self.describe(&other))),
                }
            }
            Expr::Include { source, selector } => {
                let source_type = self.bind(source)?;
                let element = self.element_type("Include", &source_type)?;
                self.bind_lambda(selector, element)?;
                Ok(source_type)
            }
            Expr::Where { source, predicate } => {
                let source_type = self.bind(source)?;
                let element = self.element_type("Where", &source_type)?;
                let body = self.bind_lambda(predicate, element)?;
                if !body.is_boolean() {
                    return Err(BindError::PredicateNotBoolean(self.describe(&body)));
                }
                Ok(source_type)
            }
            Expr::Lambda(_) => Err(BindError::UnexpectedLambda),
            Expr::BinaryOp { op, left, right } => {
                let left = self.bind(left)?;
                let right = self.bind(right)?;
                self.bind_binary(*op, left, right)
            }
            Expr::Not(operand) => {
                let operand = self.bind(operand)?;
                if operand.is_boolean() {
                    Ok(BoundType::Scalar(ScalarKind::Boolean))
                } else {
                    Err(BindError::InvalidOperand {
                        operator: "!",
                        type_name: self.describe(&operand),
                    })
                }
            }
            Expr::Negate(operand) => {
                let operand = self.bind(operand)?;
                match operand {
                    BoundType::Dynamic => Ok(BoundType::Dynamic),
                    ty if ty.numeric().is_some() => Ok(ty),
                    other => Err(BindError::InvalidOperand {
                        operator: "-",
                        type_name: self.describe(&other),
                    }),
                }
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = self.bind(object)?;
                let arg_types = args
                    .iter()
                    .map(|arg| self.bind(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.bind_method(receiver, method, arg_types)
            }
            Expr::Call { function, .. } => Err(BindError::UnknownFunction(function.clone())),
        }
    }

    fn bind_member(&self, object_type: BoundType<S::Type>, name: &str) -> BindResult<S::Type> {
        match object_type {
            BoundType::Dynamic => Ok(BoundType::Dynamic),
            BoundType::Object(ty) if self.types.scalar_kind(&ty).is_none() => {
                match self.types.exact_member(&ty, name) {
                    Some(member) => Ok(self.value_type(member.value_type)),
                    None => {
                        let hint = self
                            .types
                            .find_member(&ty, name)
                            .found()
                            .map(|member| format!("; did you mean '{}'?", member.name))
                            .unwrap_or_default();
                        Err(BindError::UnknownMember {
                            owner: self.types.type_name(&ty),
                            member: name.to_string(),
                            hint,
                        })
                    }
                }
            }
            other => Err(BindError::NoMembers {
                type_name: self.describe(&other),
                member: name.to_string(),
            }),
        }
    }

    fn bind_binary(
        &self,
        op: BinOp,
        left: BoundType<S::Type>,
        right: BoundType<S::Type>,
    ) -> BindResult<S::Type> {
        if op.is_comparison() {
            return Ok(BoundType::Scalar(ScalarKind::Boolean));
        }
        if op.is_logical() {
            if left.is_boolean() && right.is_boolean() {
                return Ok(BoundType::Scalar(ScalarKind::Boolean));
            }
            return Err(self.invalid_operands(op, &left, &right));
        }

        match (&left, &right) {
            (BoundType::Dynamic, _) | (_, BoundType::Dynamic) => Ok(BoundType::Dynamic),
            (BoundType::Scalar(ScalarKind::String), _) | (_, BoundType::Scalar(ScalarKind::String))
                if op == BinOp::Add =>
            {
                Ok(BoundType::Scalar(ScalarKind::String))
            }
            _ => match (left.numeric(), right.numeric()) {
                (Some(ScalarKind::Integer), Some(ScalarKind::Integer)) => {
                    Ok(BoundType::Scalar(ScalarKind::Integer))
                }
                (Some(_), Some(_)) => Ok(BoundType::Scalar(ScalarKind::Float)),
                _ => Err(self.invalid_operands(op, &left, &right)),
            },
        }
    }

    fn bind_method(
        &self,
        receiver: BoundType<S::Type>,
        method: &str,
        args: Vec<BoundType<S::Type>>,
    ) -> BindResult<S::Type> {
        let expect_args = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(BindError::ArgumentCount {
                    method: method.to_string(),
                    expected,
                    found: args.len(),
                })
            }
        };

        match method {
            "StartsWith" | "EndsWith" | "Contains" if receiver.is_string() => {
                expect_args(1)?;
                if !args[0].is_string() {
                    return Err(BindError::ArgumentType {
                        method: method.to_string(),
                        found: self.describe(&args[0]),
                    });
                }
                Ok(BoundType::Scalar(ScalarKind::Boolean))
            }
            "ToLower" | "ToUpper" | "Trim" if receiver.is_string() => {
                expect_args(0)?;
                Ok(BoundType::Scalar(ScalarKind::String))
            }
            "Any" | "Count" if self.queryable(&receiver).is_some() => {
                expect_args(0)?;
                Ok(BoundType::Scalar(if method == "Any" {
                    ScalarKind::Boolean
                } else {
                    ScalarKind::Integer
                }))
            }
            _ => Err(BindError::UnknownMethod {
                method: method.to_string(),
                receiver: self.describe(&receiver),
            }),
        }
    }

    fn queryable(&self, ty: &BoundType<S::Type>) -> Option<BoundType<S::Type>> {
        match ty {
            BoundType::Object(ty) => self
                .types
                .queryable_element_type(ty)
                .map(|element| self.value_type(element)),
            BoundType::Dynamic => Some(BoundType::Dynamic),
            _ => None,
        }
    }

    fn element_type(
        &self,
        operator: &'static str,
        source: &BoundType<S::Type>,
    ) -> BindResult<S::Type> {
        self.queryable(source).ok_or_else(|| BindError::NotQueryable {
            operator,
            type_name: self.describe(source),
        })
    }

    fn value_type(&self, ty: S::Type) -> BoundType<S::Type> {
        match self.types.scalar_kind(&ty) {
            Some(kind) => BoundType::Scalar(kind),
            None => BoundType::Object(ty),
        }
    }

    fn invalid_operands(
        &self,
        op: BinOp,
        left: &BoundType<S::Type>,
        right: &BoundType<S::Type>,
    ) -> BindError {
        BindError::InvalidOperands {
            op,
            left: self.describe(left),
            right: self.describe(right),
        }
    }

    /// Display name of a bound type.
    pub fn describe(&self, ty: &BoundType<S::Type>) -> String {
        match ty {
            BoundType::Object(ty) => self.types.type_name(ty),
            BoundType::Scalar(kind) => kind.to_string(),
            BoundType::Null => "null".to_string(),
            BoundType::Dynamic => "dynamic".to_string(),
        }
    }
}
