//! Final tidy-up passes (spec §4.J.4), grounded in `remove_trivial_for_loops`
//! (`original_source/cpp/src/RemoveTrivialForLoops.cpp`) and
//! `remove_dead_lets` (`original_source/cpp/src/RemoveDeadLets.cpp`): turn a
//! unit-extent loop into a plain binding, then drop every `let`/`Let` whose
//! name is never referenced in its body.

use std::cell::Cell;
use std::rc::Rc;

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;
use crate::core::scope::Scope;

struct TrivialForRemover;

impl ExprMutator for TrivialForRemover {}

impl StmtMutator for TrivialForRemover {
    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        let nbody = self.mutate_stmt(body);
        if matches!(extent.kind, ExprKind::IntImm(1)) {
            let name = match &s.kind {
                StmtKind::For { name, .. } => name.clone(),
                _ => unreachable!(),
            };
            return let_stmt(name, min.clone(), nbody);
        }
        if crate::core::ir::stmt::same_as(&nbody, body) {
            s.clone()
        } else {
            let name = match &s.kind {
                StmtKind::For { name, .. } => name.clone(),
                _ => unreachable!(),
            };
            for_(name, min.clone(), extent.clone(), for_type, nbody)
        }
    }
}

/// Collapse every unit-extent `For` loop into a `let` binding of its index.
pub fn remove_trivial_for_loops(s: &Stmt) -> Stmt {
    let mut r = TrivialForRemover;
    r.mutate_stmt(s)
}

type RefCount = Rc<Cell<u32>>;

struct DeadLetRemover {
    refs: Scope<RefCount>,
}

impl DeadLetRemover {
    fn new() -> Self {
        DeadLetRemover { refs: Scope::new() }
    }

    fn bump(&self, name: &str) {
        if let Some(count) = self.refs.get(name) {
            count.set(count.get() + 1);
        }
    }
}

impl ExprMutator for DeadLetRemover {
    fn visit_variable(&mut self, e: &Expr, name: &str) -> Expr {
        self.bump(name);
        e.clone()
    }

    fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        let name = match &e.kind {
            ExprKind::Let { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        self.refs.push(name.clone(), Rc::new(Cell::new(0)));
        let nb = self.mutate_expr(body);
        let used = self.refs.get(&name).map(|c| c.get() > 0).unwrap_or(false);
        self.refs.pop(&name);
        if !used {
            return nb;
        }
        if same_as(&nv, value) && same_as(&nb, body) {
            e.clone()
        } else {
            let_in(name, nv, nb)
        }
    }
}

impl StmtMutator for DeadLetRemover {
    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        let nmin = self.mutate_expr(min);
        let nextent = self.mutate_expr(extent);
        let name = match &s.kind {
            StmtKind::For { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        self.refs.push(name.clone(), Rc::new(Cell::new(0)));
        let nbody = self.mutate_stmt(body);
        self.refs.pop(&name);
        if same_as(&nmin, min) && same_as(&nextent, extent) && crate::core::ir::stmt::same_as(&nbody, body) {
            s.clone()
        } else {
            for_(name, nmin, nextent, for_type, nbody)
        }
    }

    fn visit_let_stmt(&mut self, s: &Stmt, value: &Expr, body: &Stmt) -> Stmt {
        let nv = self.mutate_expr(value);
        let name = match &s.kind {
            StmtKind::LetStmt { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        self.refs.push(name.clone(), Rc::new(Cell::new(0)));
        let nb = self.mutate_stmt(body);
        let used = self.refs.get(&name).map(|c| c.get() > 0).unwrap_or(false);
        self.refs.pop(&name);
        if !used {
            return nb;
        }
        if same_as(&nv, value) && crate::core::ir::stmt::same_as(&nb, body) {
            s.clone()
        } else {
            let_stmt(name, nv, nb)
        }
    }
}

/// Drop every `let`/`Let` binding whose name is never read in its body.
pub fn remove_dead_lets(s: &Stmt) -> Stmt {
    let mut r = DeadLetRemover::new();
    r.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn unit_extent_for_becomes_a_let() {
        let body = store("out", variable("i", i32ty()), int32(0));
        let loop_stmt = for_("i", int32(5), int32(1), ForType::Serial, body);
        let result = remove_trivial_for_loops(&loop_stmt);
        assert!(matches!(result.kind, StmtKind::LetStmt { .. }));
    }

    #[test]
    fn multi_extent_for_is_unchanged() {
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Serial, nop());
        let result = remove_trivial_for_loops(&loop_stmt);
        assert!(crate::core::ir::stmt::same_as(&result, &loop_stmt));
    }

    #[test]
    fn unused_let_is_dropped() {
        let body = store("out", int32(1), int32(0));
        let let_stmt_node = let_stmt("dead", int32(99), body);
        let result = remove_dead_lets(&let_stmt_node);
        assert!(matches!(result.kind, StmtKind::Store { .. }));
    }

    #[test]
    fn referenced_let_is_kept() {
        let body = store("out", variable("live", i32ty()), int32(0));
        let let_stmt_node = let_stmt("live", int32(99), body);
        let result = remove_dead_lets(&let_stmt_node);
        assert!(matches!(result.kind, StmtKind::LetStmt { .. }));
    }
}
