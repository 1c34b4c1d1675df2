//! Read-only traversal (spec §4.C): one method per node kind, default
//! recursion descends into every subnode. Unlike `Mutator`, a `Visitor`
//! does not rebuild anything — it accumulates into `&mut self`.

use crate::core::ir::expr::*;
use crate::core::ir::stmt::*;

pub trait ExprVisitor {
    fn visit(&mut self, e: &Expr) {
        default_visit_expr(self, e);
    }
}

pub fn default_visit_expr<V: ExprVisitor + ?Sized>(v: &mut V, e: &Expr) {
    match &e.kind {
        ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::Variable { .. } => {}
        ExprKind::Cast { value } => v.visit(value),
        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Min(a, b)
        | ExprKind::Max(a, b)
        | ExprKind::EQ(a, b)
        | ExprKind::NE(a, b)
        | ExprKind::LT(a, b)
        | ExprKind::LE(a, b)
        | ExprKind::GT(a, b)
        | ExprKind::GE(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b) => {
            v.visit(a);
            v.visit(b);
        }
        ExprKind::Not(a) => v.visit(a),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => {
            v.visit(cond);
            v.visit(true_value);
            v.visit(false_value);
        }
        ExprKind::Load { index, .. } => v.visit(index),
        ExprKind::Ramp { base, stride, .. } => {
            v.visit(base);
            v.visit(stride);
        }
        ExprKind::Broadcast { value, .. } => v.visit(value),
        ExprKind::Call { args, .. } => {
            for a in args {
                v.visit(a);
            }
        }
        ExprKind::Let { value, body, .. } => {
            v.visit(value);
            v.visit(body);
        }
    }
}

pub trait StmtVisitor: ExprVisitor {
    fn visit_stmt(&mut self, s: &Stmt) {
        default_visit_stmt(self, s);
    }
}

pub fn default_visit_stmt<V: StmtVisitor + ?Sized>(v: &mut V, s: &Stmt) {
    match &s.kind {
        StmtKind::Nop => {}
        StmtKind::LetStmt { value, body, .. } => {
            v.visit(value);
            v.visit_stmt(body);
        }
        StmtKind::AssertStmt { condition, .. } => v.visit(condition),
        StmtKind::PrintStmt { args, .. } => {
            for a in args {
                v.visit(a);
            }
        }
        StmtKind::Pipeline {
            produce,
            update,
            consume,
            ..
        } => {
            v.visit_stmt(produce);
            if let Some(u) = update {
                v.visit_stmt(u);
            }
            v.visit_stmt(consume);
        }
        StmtKind::Block(stmts) => {
            for st in stmts {
                v.visit_stmt(st);
            }
        }
        StmtKind::For {
            min, extent, body, ..
        } => {
            v.visit(min);
            v.visit(extent);
            v.visit_stmt(body);
        }
        StmtKind::Store { value, index, .. } => {
            v.visit(value);
            v.visit(index);
        }
        StmtKind::Provide { value, args, .. } => {
            v.visit(value);
            for a in args {
                v.visit(a);
            }
        }
        StmtKind::Allocate { size, body, .. } => {
            v.visit(size);
            v.visit_stmt(body);
        }
        StmtKind::Realize { bounds, body, .. } => {
            for (mn, ex) in bounds {
                v.visit(mn);
                v.visit(ex);
            }
            v.visit_stmt(body);
        }
    }
}

/// Collects the set of free variable names referenced in an expression.
#[derive(Default)]
pub struct FreeVars {
    pub names: std::collections::BTreeSet<String>,
}

impl ExprVisitor for FreeVars {
    fn visit(&mut self, e: &Expr) {
        if let ExprKind::Variable { name, .. } = &e.kind {
            self.names.insert(name.clone());
        }
        default_visit_expr(self, e);
    }
}

pub fn free_vars(e: &Expr) -> std::collections::BTreeSet<String> {
    let mut fv = FreeVars::default();
    fv.visit(e);
    fv.names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn free_vars_collects_variable_names() {
        let x = variable("x", Type::int(32, 1));
        let y = variable("y", Type::int(32, 1));
        let e = add(mul(x, int32(2)), y);
        let fv = free_vars(&e);
        assert_eq!(fv.len(), 2);
        assert!(fv.contains("x"));
        assert!(fv.contains("y"));
    }
}
