use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    ast::{BinOp, Expr, Lambda},
    value::Value,
};

/// Lambda parameters in scope, innermost last.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    bindings: Vec<(String, Value)>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new context with `name` bound to `value`
    pub fn with_binding(&self, name: &str, value: Value) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.push((name.to_string(), value));
        EvalContext { bindings }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }
}

/// Errors that can occur while evaluating an expression against an object graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid member or indexer access
    #[error("Access error: {0}")]
    AccessError(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// Runs expression trees against in-memory client object graphs.
///
/// `Include` maps its selector over every element of the source collection,
/// so evaluating an accessor returns the shape of what it would load:
///
/// ```
/// use include_path::{Evaluator, Parser, Value, ast::Expr};
/// use std::collections::HashMap;
///
/// let mut list = HashMap::new();
/// list.insert("Title".to_string(), Value::String("Documents".into()));
/// let mut web = HashMap::new();
/// web.insert("Lists".to_string(), Value::Array(vec![Value::Object(list)]));
///
/// let Expr::Lambda(lambda) = Parser::parse_str("a => Include(a.Lists, b => b.Title)").unwrap() else {
///     unreachable!()
/// };
/// let result = Evaluator::new().eval_lambda(&lambda, Value::Object(web)).unwrap();
/// assert_eq!(result, Value::Array(vec![Value::String("Documents".into())]));
/// ```
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Applies a single-parameter lambda to `argument`.
    pub fn eval_lambda(&self, lambda: &Lambda, argument: Value) -> Result<Value, EvalError> {
        self.apply(lambda, argument, &EvalContext::new())
    }

    /// Evaluates a standalone expression in `context`.
    pub fn eval_expression(&self, expr: &Expr, context: &EvalContext) -> Result<Value, EvalError> {
        self.eval_expr(expr, context)
    }

    fn apply(&self, lambda: &Lambda, argument: Value, context: &EvalContext) -> Result<Value, EvalError> {
        let inner = context.with_binding(&lambda.param, argument);
        self.eval_expr(&lambda.body, &inner)
    }

    fn eval_expr(&self, expr: &Expr, context: &EvalContext) -> Result<Value, EvalError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Param(name) => context
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Expr::Member { object, name } => {
                let object = self.eval_expr(object, context)?;
                self.apply_access(&object, name)
            }
            Expr::Index { object, key } => {
                let object = self.eval_expr(object, context)?;
                match self.eval_expr(key, context)? {
                    Value::String(key) => self.apply_access(&object, &key),
                    other => Err(EvalError::TypeError(format!(
                        "Indexer key must be a string, got {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Include { source, selector } => {
                let elements = match self.eval_expr(source, context)? {
                    Value::Null => return Ok(Value::Null),
                    Value::Array(elements) => elements,
                    other => return Err(not_queryable("Include", &other)),
                };
                elements
                    .into_iter()
                    .map(|element| self.apply(selector, element, context))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Expr::Where { source, predicate } => {
                let elements = match self.eval_expr(source, context)? {
                    Value::Null => return Ok(Value::Null),
                    Value::Array(elements) => elements,
                    other => return Err(not_queryable("Where", &other)),
                };
                let mut kept = Vec::new();
                for element in elements {
                    if self.apply(predicate, element.clone(), context)?.is_truthy() {
                        kept.push(element);
                    }
                }
                Ok(Value::Array(kept))
            }
            Expr::Lambda(_) => Err(EvalError::TypeError(
                "A lambda cannot be evaluated outside Include or Where".to_string(),
            )),
            Expr::BinaryOp { op, left, right } => match op {
                BinOp::And => {
                    let left = self.eval_expr(left, context)?;
                    if !left.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                    Ok(Value::Boolean(self.eval_expr(right, context)?.is_truthy()))
                }
                BinOp::Or => {
                    let left = self.eval_expr(left, context)?;
                    if left.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                    Ok(Value::Boolean(self.eval_expr(right, context)?.is_truthy()))
                }
                _ => {
                    let left = self.eval_expr(left, context)?;
                    let right = self.eval_expr(right, context)?;
                    self.apply_binop(*op, &left, &right)
                }
            },
            Expr::Not(operand) => match self.eval_expr(operand, context)? {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                Value::Null => Ok(Value::Null),
                other => Err(EvalError::TypeError(format!(
                    "Cannot negate {}",
                    other.type_name()
                ))),
            },
            Expr::Negate(operand) => match self.eval_expr(operand, context)? {
                Value::Integer(n) => n
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::TypeError("Integer overflow".to_string())),
                Value::Float(n) => Ok(Value::Float(-n)),
                Value::Null => Ok(Value::Null),
                other => Err(EvalError::TypeError(format!(
                    "Cannot negate {}",
                    other.type_name()
                ))),
            },
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = self.eval_expr(object, context)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, context))
                    .collect::<Result<Vec<_>, _>>()?;
                self.eval_method_call(&receiver, method, &args)
            }
            Expr::Call { function, .. } => Err(EvalError::UnknownFunction(function.clone())),
        }
    }

    fn apply_access(&self, object: &Value, name: &str) -> Result<Value, EvalError> {
        match object {
            Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            other => Err(EvalError::AccessError(format!(
                "Cannot read '{}' from {}",
                name,
                other.type_name()
            ))),
        }
    }

    fn apply_binop(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinOp::Equal => Ok(Value::Boolean(values_equal(left, right))),
            BinOp::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),
            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
                let ordering = match (left, right) {
                    (Value::String(a), Value::String(b)) => a.cmp(b),
                    _ => match (left.as_float(), right.as_float()) {
                        (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                            EvalError::TypeError("Cannot compare NaN".to_string())
                        })?,
                        // Comparisons with null are false, as with nullable operands in C#.
                        _ if *left == Value::Null || *right == Value::Null => {
                            return Ok(Value::Boolean(false));
                        }
                        _ => {
                            return Err(EvalError::TypeError(format!(
                                "Cannot compare {} with {}",
                                left.type_name(),
                                right.type_name()
                            )));
                        }
                    },
                };
                Ok(Value::Boolean(match op {
                    BinOp::LessThan => ordering.is_lt(),
                    BinOp::GreaterThan => ordering.is_gt(),
                    BinOp::LessEqual => ordering.is_le(),
                    _ => ordering.is_ge(),
                }))
            }
            BinOp::Add => match (left, right) {
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, concat_text(b)))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", concat_text(a), b))),
                _ => self.apply_arithmetic(op, left, right),
            },
            BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
                self.apply_arithmetic(op, left, right)
            }
            BinOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
            BinOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
        }
    }

    fn apply_arithmetic(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
                BinOp::Add => a + b,
                BinOp::Subtract => a - b,
                BinOp::Multiply => a * b,
                BinOp::Divide => a / b,
                _ => a % b,
            })),
            (Value::Integer(a), Value::Float(b)) => Ok(mixed_arithmetic(
                op,
                Decimal::from_i64(*a),
                Decimal::from_f64(*b),
            )
            .unwrap_or_else(|| float_arithmetic(op, *a as f64, *b))),
            (Value::Float(a), Value::Integer(b)) => Ok(mixed_arithmetic(
                op,
                Decimal::from_f64(*a),
                Decimal::from_i64(*b),
            )
            .unwrap_or_else(|| float_arithmetic(op, *a, *b as f64))),
            (a, b) => Err(EvalError::TypeError(format!(
                "Cannot apply '{}' to {} and {}",
                op,
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn eval_method_call(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        match (receiver, method, args) {
            (Value::String(s), "StartsWith", [Value::String(arg)]) => {
                Ok(Value::Boolean(s.starts_with(arg.as_str())))
            }
            (Value::String(s), "EndsWith", [Value::String(arg)]) => {
                Ok(Value::Boolean(s.ends_with(arg.as_str())))
            }
            (Value::String(s), "Contains", [Value::String(arg)]) => {
                Ok(Value::Boolean(s.contains(arg.as_str())))
            }
            (Value::String(s), "ToLower", []) => Ok(Value::String(s.to_lowercase())),
            (Value::String(s), "ToUpper", []) => Ok(Value::String(s.to_uppercase())),
            (Value::String(s), "Trim", []) => Ok(Value::String(s.trim().to_string())),
            (Value::Array(items), "Any", []) => Ok(Value::Boolean(!items.is_empty())),
            (Value::Array(items), "Count", []) => Ok(Value::Integer(items.len() as i64)),
            (Value::Null, _, _) => Err(EvalError::AccessError(format!(
                "Cannot call '{}' on null",
                method
            ))),
            (receiver, method, args) => Err(EvalError::TypeError(format!(
                "No method '{}' on {} taking {} argument(s)",
                method,
                receiver.type_name(),
                args.len()
            ))),
        }
    }
}

fn not_queryable(operator: &str, value: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "{} expects a collection, got {}",
        operator,
        value.type_name()
    ))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn concat_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Boolean(true) => "True".to_string(),
        Value::Boolean(false) => "False".to_string(),
        Value::Null => String::new(),
        other => other.type_name().to_string(),
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::TypeError("Integer overflow".to_string());
    match op {
        BinOp::Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Subtract => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Multiply => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
        BinOp::Divide if b == 0 => Err(EvalError::DivisionByZero),
        // Exact divisions stay integral
        BinOp::Divide => match a.checked_rem(b).ok_or_else(overflow)? {
            0 => a.checked_div(b).map(Value::Integer).ok_or_else(overflow),
            _ => Ok(Value::Float(a as f64 / b as f64)),
        },
        BinOp::Modulo if b == 0 => Err(EvalError::DivisionByZero),
        _ => a.checked_rem(b).map(Value::Integer).ok_or_else(overflow),
    }
}

/// Mixed integer/float arithmetic through decimals, so `1 + 0.1` is exactly `1.1`
/// and whole results come back as integers.
fn mixed_arithmetic(op: BinOp, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let result = match op {
        BinOp::Add => a.checked_add(b)?,
        BinOp::Subtract => a.checked_sub(b)?,
        BinOp::Multiply => a.checked_mul(b)?,
        BinOp::Divide => a.checked_div(b)?,
        BinOp::Modulo => a.checked_rem(b)?,
        _ => return None,
    };
    if result.is_integer()
        && let Some(r) = result.to_i64()
    {
        return Some(Value::Integer(r));
    }
    result.to_f64().map(Value::Float)
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Value {
    Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        _ => a % b,
    })
}
