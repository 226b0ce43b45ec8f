use std::fmt;

use crate::ast::{Expr, Func};
use crate::error::ExprError;
use crate::parser::parse_expr;

type EvalFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// An expression resolved against a fixed argument list and lowered to a closure.
///
/// Variables are bound to argument positions at compile time, so evaluation is a
/// plain closure call over a slice with no name lookups.
pub struct CompiledExpr {
    source: String,
    eval: Box<EvalFn>,
}

impl CompiledExpr {
    /// Parses and compiles `src`, binding variable names to positions in `args`.
    pub fn compile(src: &str, args: &[&str]) -> Result<Self, ExprError> {
        let expr = parse_expr(src)?;
        Self::from_expr(src, &expr, args)
    }

    /// Compiles an already parsed expression. `source` is kept for diagnostics only.
    pub fn from_expr(source: &str, expr: &Expr, args: &[&str]) -> Result<Self, ExprError> {
        Ok(Self {
            source: source.to_string(),
            eval: lower(expr, args)?,
        })
    }

    /// Evaluates the expression. Missing positional arguments read as NaN.
    #[inline]
    pub fn eval(&self, args: &[f64]) -> f64 {
        (self.eval)(args)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpr").field("source", &self.source).finish()
    }
}

fn lower(expr: &Expr, args: &[&str]) -> Result<Box<EvalFn>, ExprError> {
    let lowered: Box<EvalFn> = match expr {
        Expr::Number(n) => {
            let n = *n;
            Box::new(move |_: &[f64]| n)
        }
        Expr::Var { name, col } => {
            let index = args.iter().position(|a| a == name).ok_or_else(|| {
                ExprError::new(format!("unknown argument `{}`", name), *col)
            })?;
            Box::new(move |a: &[f64]| a.get(index).copied().unwrap_or(f64::NAN))
        }
        Expr::Neg(inner) => {
            let inner = lower(inner, args)?;
            Box::new(move |a: &[f64]| -inner(a))
        }
        Expr::Binary { op, lhs, rhs } => {
            let op = *op;
            let lhs = lower(lhs, args)?;
            let rhs = lower(rhs, args)?;
            Box::new(move |a: &[f64]| op.apply(lhs(a), rhs(a)))
        }
        Expr::Call { func, args: call_args } => {
            let func: Func = *func;
            let mut operands = call_args
                .iter()
                .map(|e| lower(e, args))
                .collect::<Result<Vec<_>, _>>()?;
            match operands.len() {
                // Single-argument calls dominate; skip the scratch Vec.
                1 => {
                    let single = operands.remove(0);
                    Box::new(move |a: &[f64]| func.apply(&[single(a)]))
                }
                _ => Box::new(move |a: &[f64]| {
                    let values: Vec<f64> = operands.iter().map(|f| f(a)).collect();
                    func.apply(&values)
                }),
            }
        }
    };
    Ok(lowered)
}
