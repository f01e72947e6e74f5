use std::error::Error;
use std::fmt;

use crate::{BinaryOp, Expr, Reference, UnaryOp};

/// Supplies the value of each reference met during evaluation.
///
/// Implementations decide how unqualified names are scoped and may
/// evaluate further formulas on demand; their error type must absorb
/// arithmetic failures raised by the expression itself.
pub trait Resolve {
    type Error: From<EvalError>;

    fn resolve(&mut self, reference: &Reference) -> Result<f64, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    DivisionByZero,
    Domain { function: &'static str, value: f64 },
    NonFinite,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::DivisionByZero => f.write_str("division by zero"),
            EvalError::Domain { function, value } => {
                write!(f, "{function} argument out of domain: {value}")
            }
            EvalError::NonFinite => f.write_str("formula produced a non-finite value"),
        }
    }
}

impl Error for EvalError {}

impl Expr {
    pub fn evaluate<R: Resolve>(&self, resolver: &mut R) -> Result<f64, R::Error> {
        match self {
            Expr::Number(number) => Ok(number.base_value()),
            Expr::Reference(reference) => resolver.resolve(reference),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Neg => Ok(-expr.evaluate(resolver)?),
            },
            Expr::Binary { lhs, op, rhs } => {
                let lhs = lhs.evaluate(resolver)?;
                let rhs = rhs.evaluate(resolver)?;
                Ok(apply_binary(*op, lhs, rhs)?)
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.evaluate(resolver)? != 0.0 {
                    then_branch.evaluate(resolver)
                } else {
                    else_branch.evaluate(resolver)
                }
            }
            Expr::Call { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.evaluate(resolver)?);
                }
                Ok(function.apply(&values)?)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let truth = |condition: bool| if condition { 1.0 } else { 0.0 };
    Ok(match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs / rhs
        }
        BinaryOp::Mod => {
            if rhs == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs % rhs
        }
        BinaryOp::Pow => lhs.powf(rhs),
        BinaryOp::Lt => truth(lhs < rhs),
        BinaryOp::Le => truth(lhs <= rhs),
        BinaryOp::Gt => truth(lhs > rhs),
        BinaryOp::Ge => truth(lhs >= rhs),
        BinaryOp::Eq => truth(lhs == rhs),
        BinaryOp::Ne => truth(lhs != rhs),
    })
}
