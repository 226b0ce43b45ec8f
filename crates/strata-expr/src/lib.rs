//! Lexer, parser, and closure compiler for **attribute value expressions**.
//!
//! A shader interface declares each vertex attribute component as a small
//! arithmetic expression over the positional arguments of its add-vertex call,
//! e.g. `box = ["x * 2", "y * 2"]` with arguments `["x", "y"]`. This crate turns
//! those strings into closures once, so record emission never re-parses.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ast`] | `Expr`, `BinOp`, `Func` |
//! | [`error`] | `ExprError` |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | `parse_expr` entry point |
//! | [`compile`] | `CompiledExpr` |
//!
//! # Quick start
//!
//! ```rust
//! use strata_expr::CompiledExpr;
//!
//! let expr = CompiledExpr::compile("x * 2 + (ex + 1) / 2", &["x", "y", "ex", "ey"]).unwrap();
//! assert_eq!(expr.eval(&[10.0, 0.0, 1.0, 0.0]), 21.0);
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::Expr;
pub use compile::CompiledExpr;
pub use error::ExprError;
pub use parser::parse_expr;
