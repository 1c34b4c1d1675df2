//! Statement IR (spec §3.3, §4.B).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::ir::expr::Expr;
use crate::core::types::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForType {
    Serial,
    Parallel,
    Unrolled,
    Vectorized,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    LetStmt {
        name: String,
        value: Expr,
        body: Stmt,
    },
    AssertStmt {
        condition: Expr,
        message: String,
    },
    PrintStmt {
        message: String,
        args: Vec<Expr>,
    },
    /// The three-phase lifecycle of a function's realization.
    Pipeline {
        name: String,
        produce: Stmt,
        update: Option<Stmt>,
        consume: Stmt,
    },
    Block(Vec<Stmt>),
    For {
        name: String,
        min: Expr,
        extent: Expr,
        for_type: ForType,
        body: Stmt,
    },
    /// Flat single-dimensional store, produced by storage flattening.
    Store {
        buffer: String,
        value: Expr,
        index: Expr,
    },
    /// Multi-dimensional write, pre-flattening.
    Provide {
        name: String,
        value: Expr,
        args: Vec<Expr>,
    },
    /// Scoped flat allocation.
    Allocate {
        name: String,
        ty: Type,
        size: Expr,
        body: Stmt,
    },
    /// Scoped multi-dimensional symbolic allocation, pre-flattening.
    Realize {
        name: String,
        ty: Type,
        bounds: Vec<(Expr, Expr)>,
        body: Stmt,
    },
    /// Empty statement — the base case for `Block` folding and trivial bodies.
    Nop,
}

#[derive(Debug, PartialEq)]
pub struct StmtNode {
    pub kind: StmtKind,
}

pub type Stmt = Rc<StmtNode>;

pub fn same_as(a: &Stmt, b: &Stmt) -> bool {
    Rc::ptr_eq(a, b)
}

fn node(kind: StmtKind) -> Stmt {
    Rc::new(StmtNode { kind })
}

pub fn nop() -> Stmt {
    node(StmtKind::Nop)
}

pub fn let_stmt(name: impl Into<String>, value: Expr, body: Stmt) -> Stmt {
    node(StmtKind::LetStmt {
        name: name.into(),
        value,
        body,
    })
}

pub fn assert_stmt(condition: Expr, message: impl Into<String>) -> Stmt {
    assert!(condition.ty.is_bool());
    node(StmtKind::AssertStmt {
        condition,
        message: message.into(),
    })
}

pub fn print_stmt(message: impl Into<String>, args: Vec<Expr>) -> Stmt {
    node(StmtKind::PrintStmt {
        message: message.into(),
        args,
    })
}

pub fn pipeline(name: impl Into<String>, produce: Stmt, update: Option<Stmt>, consume: Stmt) -> Stmt {
    node(StmtKind::Pipeline {
        name: name.into(),
        produce,
        update,
        consume,
    })
}

/// Construct a `Block`, flattening nested blocks and dropping `Nop`s so that
/// later passes see a canonical shape (mirrors the teacher's habit of
/// normalizing sequence construction at the smart-constructor boundary).
pub fn block(stmts: Vec<Stmt>) -> Stmt {
    let mut flat = Vec::with_capacity(stmts.len());
    for s in stmts {
        match &s.kind {
            StmtKind::Nop => {}
            StmtKind::Block(inner) => flat.extend(inner.iter().cloned()),
            _ => flat.push(s),
        }
    }
    if flat.is_empty() {
        return nop();
    }
    if flat.len() == 1 {
        return flat.into_iter().next().unwrap();
    }
    node(StmtKind::Block(flat))
}

pub fn for_(
    name: impl Into<String>,
    min: Expr,
    extent: Expr,
    for_type: ForType,
    body: Stmt,
) -> Stmt {
    if matches!(for_type, ForType::Vectorized | ForType::Unrolled) {
        assert!(
            matches!(extent.kind, crate::core::ir::expr::ExprKind::IntImm(_)),
            "Vectorized/Unrolled For requires a literal integer extent"
        );
    }
    node(StmtKind::For {
        name: name.into(),
        min,
        extent,
        for_type,
        body,
    })
}

pub fn store(buffer: impl Into<String>, value: Expr, index: Expr) -> Stmt {
    node(StmtKind::Store {
        buffer: buffer.into(),
        value,
        index,
    })
}

pub fn provide(name: impl Into<String>, value: Expr, args: Vec<Expr>) -> Stmt {
    node(StmtKind::Provide {
        name: name.into(),
        value,
        args,
    })
}

pub fn allocate(name: impl Into<String>, ty: Type, size: Expr, body: Stmt) -> Stmt {
    node(StmtKind::Allocate {
        name: name.into(),
        ty,
        size,
        body,
    })
}

pub fn realize(name: impl Into<String>, ty: Type, bounds: Vec<(Expr, Expr)>, body: Stmt) -> Stmt {
    node(StmtKind::Realize {
        name: name.into(),
        ty,
        bounds,
        body,
    })
}

impl fmt::Display for StmtNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Nop => write!(f, "{{}}"),
            StmtKind::LetStmt { name, value, body } => {
                write!(f, "let {} = {};\n{}", name, value, body)
            }
            StmtKind::AssertStmt { condition, message } => {
                write!(f, "assert({}, \"{}\")", condition, message)
            }
            StmtKind::PrintStmt { message, .. } => write!(f, "print(\"{}\")", message),
            StmtKind::Pipeline {
                name,
                produce,
                update,
                consume,
            } => {
                write!(f, "produce {} {{\n{}\n}}", name, produce)?;
                if let Some(u) = update {
                    write!(f, "\nupdate {} {{\n{}\n}}", name, u)?;
                }
                write!(f, "\nconsume {} {{\n{}\n}}", name, consume)
            }
            StmtKind::Block(stmts) => {
                for (i, s) in stmts.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", s)?;
                }
                Ok(())
            }
            StmtKind::For {
                name,
                min,
                extent,
                for_type,
                body,
            } => {
                let kind = match for_type {
                    ForType::Serial => "for",
                    ForType::Parallel => "parallel",
                    ForType::Unrolled => "unrolled",
                    ForType::Vectorized => "vectorized",
                };
                write!(f, "{} {} in [{}, {}+{}) {{\n{}\n}}", kind, name, min, min, extent, body)
            }
            StmtKind::Store { buffer, value, index } => {
                write!(f, "{}[{}] = {}", buffer, index, value)
            }
            StmtKind::Provide { name, value, args } => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ") = {}", value)
            }
            StmtKind::Allocate { name, ty, size, body } => {
                write!(f, "allocate {} of type {} size {} {{\n{}\n}}", name, ty, size, body)
            }
            StmtKind::Realize { name, ty, bounds, body } => {
                write!(f, "realize {} of type {} over [", name, ty)?;
                for (i, (min, extent)) in bounds.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({}, {})", min, extent)?;
                }
                write!(f, "] {{\n{}\n}}", body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::expr::*;

    #[test]
    fn block_flattens_and_drops_nops() {
        let a = store("out", int32(1), int32(0));
        let inner = block(vec![a.clone(), nop()]);
        let outer = block(vec![nop(), inner, nop()]);
        match &outer.kind {
            StmtKind::Store { .. } => {} // flattened down to the single real statement
            other => panic!("expected flattened Store, got {:?}", other),
        }
    }

    #[test]
    fn empty_block_is_nop() {
        let b = block(vec![nop(), nop()]);
        assert!(matches!(b.kind, StmtKind::Nop));
    }

    #[test]
    #[should_panic]
    fn vectorized_for_requires_literal_extent() {
        let v = variable("n", Type::int(32, 1));
        for_("x", int32(0), v, ForType::Vectorized, nop());
    }
}
