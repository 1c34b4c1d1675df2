//! Dual-layer intermediate representation: expressions and statements,
//! plus the traversal framework that rewrites them (spec §3.2, §3.3, §4.B,
//! §4.C).

pub mod expr;
pub mod mutator;
pub mod stmt;
pub mod visitor;

pub use expr::{Expr, ExprKind, ExprNode};
pub use stmt::{ForType, Stmt, StmtKind, StmtNode};
