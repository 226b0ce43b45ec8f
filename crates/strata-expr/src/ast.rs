/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Remainder with the sign of the dividend.
    Rem,
}

impl BinOp {
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
            BinOp::Div => lhs / rhs,
            BinOp::Rem => lhs % rhs,
        }
    }
}

/// Built-in function callable from an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Floor,
    Ceil,
    /// Halves round toward positive infinity.
    Round,
    Abs,
    Sqrt,
    Min,
    Max,
}

impl Func {
    /// Resolves a call name. `Math.`-prefixed spellings are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Func> {
        let bare = name.strip_prefix("Math.").unwrap_or(name);
        Some(match bare {
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return None,
        })
    }

    /// `None` means variadic with at least one argument.
    pub fn arity(self) -> Option<usize> {
        match self {
            Func::Min | Func::Max => None,
            _ => Some(1),
        }
    }

    pub fn apply(self, args: &[f64]) -> f64 {
        let first = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Func::Floor => first.floor(),
            Func::Ceil => first.ceil(),
            Func::Round => (first + 0.5).floor(),
            Func::Abs => first.abs(),
            Func::Sqrt => first.sqrt(),
            Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Parsed attribute value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Reference to a positional argument by name; `col` locates it in the source.
    Var { name: String, col: usize },
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call { func: Func, args: Vec<Expr> },
}

impl Expr {
    /// Collects the argument names referenced by this expression, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var { name, .. } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Neg(inner) => inner.collect_vars(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            Expr::Call { args, .. } => {
                for a in args {
                    a.collect_vars(out);
                }
            }
        }
    }
}
