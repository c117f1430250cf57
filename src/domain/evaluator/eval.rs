//! Tree-walking evaluation over the allow-listed subset of the grammar.

use std::cmp::Ordering;

use crate::domain::error::EvalErrorKind;
use crate::domain::evaluator::ast::{BinaryOp, CompareOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::domain::value::{Value, Variables};

/// Logic functions callable from expressions, all of arity 2.
pub const ALLOWED_FUNCTIONS: [&str; 5] = ["implies", "iff", "xor", "nand", "nor"];

/// The only function callable as a statement.
pub const OUTPUT_FUNCTION: &str = "print";

#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Assigned(String),
    Printed(String),
}

fn unsupported(what: impl Into<String>) -> EvalErrorKind {
    EvalErrorKind::UnsupportedConstruct(what.into())
}

fn node_label(expr: &Expr) -> &'static str {
    match expr {
        Expr::Number(_) => "number literal",
        Expr::Text(_) => "string literal",
        Expr::Bool(_) => "boolean literal",
        Expr::None => "None",
        Expr::Name(_) => "name",
        Expr::Unary { .. } => "unary operation",
        Expr::Binary { .. } => "binary operation",
        Expr::Logical { .. } => "boolean operation",
        Expr::Compare { .. } => "comparison",
        Expr::Call { .. } => "call",
        Expr::Attribute { .. } => "attribute access",
        Expr::Subscript { .. } => "subscript",
        Expr::List(_) => "list display",
        Expr::Tuple(_) => "tuple display",
        Expr::Lambda { .. } => "lambda",
        Expr::Conditional { .. } => "conditional expression",
    }
}

fn binary_rejection(op: BinaryOp) -> EvalErrorKind {
    match op {
        BinaryOp::FloorDiv => unsupported("floor division"),
        other => unsupported(format!("bitwise operator '{}'", other.symbol())),
    }
}

pub fn permitted_binary(op: BinaryOp) -> Result<(), EvalErrorKind> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => Ok(()),
        BinaryOp::FloorDiv
        | BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => Err(binary_rejection(op)),
    }
}

fn allowed_function(callee: &Expr) -> Result<&'static str, EvalErrorKind> {
    let Expr::Name(name) = callee else {
        return Err(unsupported("call on a non-name callee"));
    };
    ALLOWED_FUNCTIONS
        .iter()
        .find(|f| **f == name.as_str())
        .copied()
        .ok_or_else(|| unsupported(format!("call to '{}'", name)))
}

/// Walk the whole tree and reject any node outside the executable grammar,
/// so nothing runs when any part of the input is disallowed.
pub fn ensure_permitted(expr: &Expr) -> Result<(), EvalErrorKind> {
    match expr {
        Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) | Expr::None | Expr::Name(_) => Ok(()),
        Expr::Unary {
            op: UnaryOp::Invert,
            ..
        } => Err(unsupported("bitwise inversion")),
        Expr::Unary { operand, .. } => ensure_permitted(operand),
        Expr::Binary { op, left, right } => {
            permitted_binary(*op)?;
            ensure_permitted(left)?;
            ensure_permitted(right)
        }
        Expr::Logical { operands, .. } => operands.iter().try_for_each(ensure_permitted),
        Expr::Compare { first, rest } => {
            ensure_permitted(first)?;
            for (op, operand) in rest {
                if matches!(
                    op,
                    CompareOp::In | CompareOp::NotIn | CompareOp::Is | CompareOp::IsNot
                ) {
                    return Err(unsupported(format!("'{}' comparison", op.symbol())));
                }
                ensure_permitted(operand)?;
            }
            Ok(())
        }
        Expr::Call {
            callee,
            args,
            keywords,
        } => {
            allowed_function(callee)?;
            if !keywords.is_empty() {
                return Err(unsupported("keyword arguments"));
            }
            args.iter().try_for_each(ensure_permitted)
        }
        Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::List(_)
        | Expr::Tuple(_)
        | Expr::Lambda { .. }
        | Expr::Conditional { .. } => Err(unsupported(node_label(expr))),
    }
}

pub fn evaluate(expr: &Expr, variables: &Variables) -> Result<Value, EvalErrorKind> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::None => Ok(Value::None),
        Expr::Name(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| EvalErrorKind::UnknownVariable(name.clone())),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, variables)?;
            unary(*op, value)
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, variables)?;
            let right = evaluate(right, variables)?;
            binary(*op, left, right)
        }
        Expr::Logical { op, operands } => {
            // The first decisive operand ends evaluation.
            let decisive = matches!(op, LogicalOp::Or);
            for operand in operands {
                if evaluate(operand, variables)?.is_truthy() == decisive {
                    return Ok(Value::Bool(decisive));
                }
            }
            Ok(Value::Bool(!decisive))
        }
        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, variables)?;
            for (op, operand) in rest {
                let right = evaluate(operand, variables)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Call {
            callee,
            args,
            keywords,
        } => {
            let function = allowed_function(callee)?;
            if !keywords.is_empty() {
                return Err(unsupported("keyword arguments"));
            }
            if args.len() != 2 {
                return Err(EvalErrorKind::Arity {
                    function,
                    expected: 2,
                    found: args.len(),
                });
            }
            let a = evaluate(&args[0], variables)?.is_truthy();
            let b = evaluate(&args[1], variables)?.is_truthy();
            let result = match function {
                "implies" => !a || b,
                "iff" => a == b,
                "xor" => a != b,
                "nand" => !(a && b),
                _ => !(a || b),
            };
            Ok(Value::Bool(result))
        }
        Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::List(_)
        | Expr::Tuple(_)
        | Expr::Lambda { .. }
        | Expr::Conditional { .. } => Err(unsupported(node_label(expr))),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalErrorKind> {
    let symbol = match op {
        UnaryOp::Not => return Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Invert => return Err(unsupported("bitwise inversion")),
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
    };
    let n = value.as_number().ok_or(EvalErrorKind::BadOperand {
        op: symbol,
        operand: value.type_name(),
    })?;
    Ok(Value::Number(if op == UnaryOp::Minus { -n } else { n }))
}

pub fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalErrorKind> {
    permitted_binary(op)?;
    if op == BinaryOp::Add {
        match (&left, &right) {
            (Value::Text(a), Value::Text(b)) => return Ok(Value::Text(format!("{}{}", a, b))),
            (Value::Series(a), Value::Series(b)) => {
                return Ok(Value::Series(a.iter().chain(b).copied().collect()));
            }
            (Value::List(a), Value::List(b)) => {
                return Ok(Value::List(a.iter().chain(b).cloned().collect()));
            }
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(EvalErrorKind::TypeMismatch {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            floored_mod(a, b)
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a.powf(b)
        }
        BinaryOp::FloorDiv
        | BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => return Err(binary_rejection(op)),
    };
    Ok(Value::Number(result))
}

/// Result takes the sign of the divisor.
fn floored_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Some(a.partial_cmp(&b));
    }
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(Some(a.cmp(b))),
        (Value::Series(a), Value::Series(b)) => Some(a.partial_cmp(b)),
        _ => None,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalErrorKind> {
    match op {
        CompareOp::Eq => Ok(left.loose_eq(right)),
        CompareOp::Ne => Ok(!left.loose_eq(right)),
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
            let ordering = ordering(left, right).ok_or(EvalErrorKind::TypeMismatch {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            })?;
            // NaN compares false under every ordering.
            let Some(ordering) = ordering else {
                return Ok(false);
            };
            Ok(match op {
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
                CompareOp::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
        CompareOp::In | CompareOp::NotIn | CompareOp::Is | CompareOp::IsNot => {
            Err(unsupported(format!("'{}' comparison", op.symbol())))
        }
    }
}

fn assignment_target(target: &Expr) -> Result<&str, EvalErrorKind> {
    match target {
        Expr::Name(name) => Ok(name),
        Expr::Tuple(_) | Expr::List(_) => Err(EvalErrorKind::UnsupportedStatement(
            "destructuring assignment".to_string(),
        )),
        other => Err(EvalErrorKind::UnsupportedStatement(format!(
            "assignment to {}",
            node_label(other)
        ))),
    }
}

/// Run one statement. The mapping is only touched once the new value is known.
pub fn execute(stmt: &Stmt, variables: &mut Variables) -> Result<StatementOutcome, EvalErrorKind> {
    match stmt {
        Stmt::Assign { targets, value } => {
            let [target] = targets.as_slice() else {
                return Err(EvalErrorKind::UnsupportedStatement(
                    "chained assignment".to_string(),
                ));
            };
            let name = assignment_target(target)?;
            ensure_permitted(value)?;
            let result = evaluate(value, variables)?;
            variables.insert(name.to_string(), result);
            Ok(StatementOutcome::Assigned(name.to_string()))
        }
        Stmt::AugAssign { target, op, value } => {
            let name = assignment_target(target)?;
            permitted_binary(*op)?;
            ensure_permitted(value)?;
            let current = variables
                .get(name)
                .cloned()
                .ok_or_else(|| EvalErrorKind::UnknownVariable(name.to_string()))?;
            let operand = evaluate(value, variables)?;
            let result = binary(*op, current, operand)?;
            variables.insert(name.to_string(), result);
            Ok(StatementOutcome::Assigned(name.to_string()))
        }
        Stmt::Expr(Expr::Call {
            callee,
            args,
            keywords,
        }) if matches!(callee.as_ref(), Expr::Name(n) if n == OUTPUT_FUNCTION) => {
            if !keywords.is_empty() {
                return Err(unsupported("keyword arguments"));
            }
            args.iter().try_for_each(ensure_permitted)?;
            let rendered = args
                .iter()
                .map(|arg| evaluate(arg, variables).map(|v| v.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StatementOutcome::Printed(rendered.join(" ")))
        }
        Stmt::Expr(_) => Err(EvalErrorKind::UnsupportedStatement(
            "bare expression".to_string(),
        )),
        Stmt::Keyword(keyword) => Err(EvalErrorKind::UnsupportedStatement(format!(
            "'{}' statement",
            keyword
        ))),
    }
}
