//! Visitor/Mutator framework (spec §4.C).
//!
//! A `Mutator` is a visitor that returns a (possibly new) `Expr`/`Stmt`.
//! Default implementations reconstruct a node only if a child changed;
//! otherwise they return the input handle unchanged (`same_as` holds).
//! Traversal order is left-to-right over fields, `Pipeline` visits
//! `produce -> update -> consume`.
//!
//! Concrete passes implement `ExprMutator`/`StmtMutator` and override only
//! the `visit_*` hooks they care about; everything else falls through to
//! the default recursive descent below.

use std::rc::Rc;

use crate::core::ir::expr::*;
use crate::core::ir::stmt::*;

pub trait ExprMutator {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        default_mutate_expr(self, e)
    }

    fn visit_int_imm(&mut self, e: &Expr, _v: i64) -> Expr {
        e.clone()
    }
    fn visit_float_imm(&mut self, e: &Expr, _v: f64) -> Expr {
        e.clone()
    }
    fn visit_variable(&mut self, e: &Expr, _name: &str) -> Expr {
        e.clone()
    }
    fn visit_cast(&mut self, e: &Expr, value: &Expr) -> Expr {
        let new_value = self.mutate_expr(value);
        if same_as(&new_value, value) {
            e.clone()
        } else {
            cast(e.ty, new_value)
        }
    }
    fn visit_binop(&mut self, e: &Expr, a: &Expr, b: &Expr) -> Expr {
        let na = self.mutate_expr(a);
        let nb = self.mutate_expr(b);
        if same_as(&na, a) && same_as(&nb, b) {
            return e.clone();
        }
        rebuild_binop(&e.kind, na, nb)
    }
    fn visit_not(&mut self, e: &Expr, a: &Expr) -> Expr {
        let na = self.mutate_expr(a);
        if same_as(&na, a) {
            e.clone()
        } else {
            not(na)
        }
    }
    fn visit_select(&mut self, e: &Expr, cond: &Expr, t: &Expr, f: &Expr) -> Expr {
        let nc = self.mutate_expr(cond);
        let nt = self.mutate_expr(t);
        let nf = self.mutate_expr(f);
        if same_as(&nc, cond) && same_as(&nt, t) && same_as(&nf, f) {
            e.clone()
        } else {
            select(nc, nt, nf)
        }
    }
    fn visit_load(&mut self, e: &Expr, index: &Expr) -> Expr {
        let ni = self.mutate_expr(index);
        if same_as(&ni, index) {
            return e.clone();
        }
        match &e.kind {
            ExprKind::Load {
                buffer_name, image, ..
            } => load(e.ty, buffer_name.clone(), ni, *image),
            _ => unreachable!(),
        }
    }
    fn visit_ramp(&mut self, e: &Expr, base: &Expr, stride: &Expr, width: u32) -> Expr {
        let nb = self.mutate_expr(base);
        let ns = self.mutate_expr(stride);
        if same_as(&nb, base) && same_as(&ns, stride) {
            e.clone()
        } else {
            ramp(nb, ns, width)
        }
    }
    fn visit_broadcast(&mut self, e: &Expr, value: &Expr, width: u32) -> Expr {
        let nv = self.mutate_expr(value);
        if same_as(&nv, value) {
            e.clone()
        } else {
            broadcast(nv, width)
        }
    }
    fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
        let mut changed = false;
        let new_args: Vec<Expr> = args
            .iter()
            .map(|a| {
                let na = self.mutate_expr(a);
                if !same_as(&na, a) {
                    changed = true;
                }
                na
            })
            .collect();
        if !changed {
            return e.clone();
        }
        match &e.kind {
            ExprKind::Call { name, call_kind, .. } => {
                call(e.ty, name.clone(), new_args, *call_kind)
            }
            _ => unreachable!(),
        }
    }
    fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        let nb = self.mutate_expr(body);
        if same_as(&nv, value) && same_as(&nb, body) {
            return e.clone();
        }
        match &e.kind {
            ExprKind::Let { name, .. } => let_in(name.clone(), nv, nb),
            _ => unreachable!(),
        }
    }
}

fn rebuild_binop(kind: &ExprKind, a: Expr, b: Expr) -> Expr {
    match kind {
        ExprKind::Add(..) => add(a, b),
        ExprKind::Sub(..) => sub(a, b),
        ExprKind::Mul(..) => mul(a, b),
        ExprKind::Div(..) => div(a, b),
        ExprKind::Mod(..) => rem(a, b),
        ExprKind::Min(..) => min(a, b),
        ExprKind::Max(..) => max(a, b),
        ExprKind::EQ(..) => eq(a, b),
        ExprKind::NE(..) => ne(a, b),
        ExprKind::LT(..) => lt(a, b),
        ExprKind::LE(..) => le(a, b),
        ExprKind::GT(..) => gt(a, b),
        ExprKind::GE(..) => ge(a, b),
        ExprKind::And(..) => and(a, b),
        ExprKind::Or(..) => or(a, b),
        _ => unreachable!("rebuild_binop called on non-binop kind"),
    }
}

/// Default recursive descent, dispatching to the trait's per-kind hooks.
pub fn default_mutate_expr<M: ExprMutator + ?Sized>(m: &mut M, e: &Expr) -> Expr {
    match &e.kind {
        ExprKind::IntImm(v) => m.visit_int_imm(e, *v),
        ExprKind::FloatImm(v) => m.visit_float_imm(e, *v),
        ExprKind::Variable { name, .. } => m.visit_variable(e, name),
        ExprKind::Cast { value } => m.visit_cast(e, value),
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
        | ExprKind::Or(a, b) => m.visit_binop(e, a, b),
        ExprKind::Not(a) => m.visit_not(e, a),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => m.visit_select(e, cond, true_value, false_value),
        ExprKind::Load { index, .. } => m.visit_load(e, index),
        ExprKind::Ramp { base, stride, width } => m.visit_ramp(e, base, stride, *width),
        ExprKind::Broadcast { value, width } => m.visit_broadcast(e, value, *width),
        ExprKind::Call { args, .. } => m.visit_call(e, args),
        ExprKind::Let { value, body, .. } => m.visit_let_expr(e, value, body),
    }
}

pub trait StmtMutator: ExprMutator {
    fn mutate_stmt(&mut self, s: &Stmt) -> Stmt {
        default_mutate_stmt(self, s)
    }

    fn visit_nop(&mut self, s: &Stmt) -> Stmt {
        s.clone()
    }
    fn visit_let_stmt(&mut self, s: &Stmt, value: &Expr, body: &Stmt) -> Stmt {
        let nv = self.mutate_expr(value);
        let nb = self.mutate_stmt(body);
        if same_as_expr(&nv, value) && same_as_stmt(&nb, body) {
            return s.clone();
        }
        match &s.kind {
            StmtKind::LetStmt { name, .. } => let_stmt(name.clone(), nv, nb),
            _ => unreachable!(),
        }
    }
    fn visit_assert_stmt(&mut self, s: &Stmt, condition: &Expr) -> Stmt {
        let nc = self.mutate_expr(condition);
        if same_as_expr(&nc, condition) {
            return s.clone();
        }
        match &s.kind {
            StmtKind::AssertStmt { message, .. } => assert_stmt(nc, message.clone()),
            _ => unreachable!(),
        }
    }
    fn visit_print_stmt(&mut self, s: &Stmt, args: &[Expr]) -> Stmt {
        let mut changed = false;
        let new_args: Vec<Expr> = args
            .iter()
            .map(|a| {
                let na = self.mutate_expr(a);
                if !same_as_expr(&na, a) {
                    changed = true;
                }
                na
            })
            .collect();
        if !changed {
            return s.clone();
        }
        match &s.kind {
            StmtKind::PrintStmt { message, .. } => print_stmt(message.clone(), new_args),
            _ => unreachable!(),
        }
    }
    fn visit_pipeline(
        &mut self,
        s: &Stmt,
        produce: &Stmt,
        update: &Option<Stmt>,
        consume: &Stmt,
    ) -> Stmt {
        let np = self.mutate_stmt(produce);
        let nu = update.as_ref().map(|u| self.mutate_stmt(u));
        let nc = self.mutate_stmt(consume);
        let update_changed = match (&nu, update) {
            (Some(a), Some(b)) => !same_as_stmt(a, b),
            (None, None) => false,
            _ => true,
        };
        if same_as_stmt(&np, produce) && !update_changed && same_as_stmt(&nc, consume) {
            return s.clone();
        }
        match &s.kind {
            StmtKind::Pipeline { name, .. } => pipeline(name.clone(), np, nu, nc),
            _ => unreachable!(),
        }
    }
    fn visit_block(&mut self, s: &Stmt, stmts: &[Stmt]) -> Stmt {
        let mut changed = false;
        let new_stmts: Vec<Stmt> = stmts
            .iter()
            .map(|st| {
                let n = self.mutate_stmt(st);
                if !same_as_stmt(&n, st) {
                    changed = true;
                }
                n
            })
            .collect();
        if !changed {
            return s.clone();
        }
        block(new_stmts)
    }
    fn visit_for(
        &mut self,
        s: &Stmt,
        min: &Expr,
        extent: &Expr,
        for_type: ForType,
        body: &Stmt,
    ) -> Stmt {
        let nmin = self.mutate_expr(min);
        let nextent = self.mutate_expr(extent);
        let nbody = self.mutate_stmt(body);
        if same_as_expr(&nmin, min) && same_as_expr(&nextent, extent) && same_as_stmt(&nbody, body)
        {
            return s.clone();
        }
        match &s.kind {
            StmtKind::For { name, .. } => for_(name.clone(), nmin, nextent, for_type, nbody),
            _ => unreachable!(),
        }
    }
    fn visit_store(&mut self, s: &Stmt, value: &Expr, index: &Expr) -> Stmt {
        let nv = self.mutate_expr(value);
        let ni = self.mutate_expr(index);
        if same_as_expr(&nv, value) && same_as_expr(&ni, index) {
            return s.clone();
        }
        match &s.kind {
            StmtKind::Store { buffer, .. } => store(buffer.clone(), nv, ni),
            _ => unreachable!(),
        }
    }
    fn visit_provide(&mut self, s: &Stmt, value: &Expr, args: &[Expr]) -> Stmt {
        let nv = self.mutate_expr(value);
        let mut changed = !same_as_expr(&nv, value);
        let new_args: Vec<Expr> = args
            .iter()
            .map(|a| {
                let na = self.mutate_expr(a);
                if !same_as_expr(&na, a) {
                    changed = true;
                }
                na
            })
            .collect();
        if !changed {
            return s.clone();
        }
        match &s.kind {
            StmtKind::Provide { name, .. } => provide(name.clone(), nv, new_args),
            _ => unreachable!(),
        }
    }
    fn visit_allocate(&mut self, s: &Stmt, size: &Expr, body: &Stmt) -> Stmt {
        let nsize = self.mutate_expr(size);
        let nbody = self.mutate_stmt(body);
        if same_as_expr(&nsize, size) && same_as_stmt(&nbody, body) {
            return s.clone();
        }
        match &s.kind {
            StmtKind::Allocate { name, ty, .. } => allocate(name.clone(), *ty, nsize, nbody),
            _ => unreachable!(),
        }
    }
    fn visit_realize(&mut self, s: &Stmt, bounds: &[(Expr, Expr)], body: &Stmt) -> Stmt {
        let mut changed = false;
        let new_bounds: Vec<(Expr, Expr)> = bounds
            .iter()
            .map(|(mn, ex)| {
                let nmn = self.mutate_expr(mn);
                let nex = self.mutate_expr(ex);
                if !same_as_expr(&nmn, mn) || !same_as_expr(&nex, ex) {
                    changed = true;
                }
                (nmn, nex)
            })
            .collect();
        let nbody = self.mutate_stmt(body);
        if !same_as_stmt(&nbody, body) {
            changed = true;
        }
        if !changed {
            return s.clone();
        }
        match &s.kind {
            StmtKind::Realize { name, ty, .. } => realize(name.clone(), *ty, new_bounds, nbody),
            _ => unreachable!(),
        }
    }
}

fn same_as_expr(a: &Expr, b: &Expr) -> bool {
    Rc::ptr_eq(a, b)
}
fn same_as_stmt(a: &Stmt, b: &Stmt) -> bool {
    Rc::ptr_eq(a, b)
}

pub fn default_mutate_stmt<M: StmtMutator + ?Sized>(m: &mut M, s: &Stmt) -> Stmt {
    match &s.kind {
        StmtKind::Nop => m.visit_nop(s),
        StmtKind::LetStmt { value, body, .. } => m.visit_let_stmt(s, value, body),
        StmtKind::AssertStmt { condition, .. } => m.visit_assert_stmt(s, condition),
        StmtKind::PrintStmt { args, .. } => m.visit_print_stmt(s, args),
        StmtKind::Pipeline {
            produce,
            update,
            consume,
            ..
        } => m.visit_pipeline(s, produce, update, consume),
        StmtKind::Block(stmts) => m.visit_block(s, stmts),
        StmtKind::For {
            min,
            extent,
            for_type,
            body,
            ..
        } => m.visit_for(s, min, extent, *for_type, body),
        StmtKind::Store { value, index, .. } => m.visit_store(s, value, index),
        StmtKind::Provide { value, args, .. } => m.visit_provide(s, value, args),
        StmtKind::Allocate { size, body, .. } => m.visit_allocate(s, size, body),
        StmtKind::Realize { bounds, body, .. } => m.visit_realize(s, bounds, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;
    impl ExprMutator for Identity {}
    impl StmtMutator for Identity {}

    #[test]
    fn identity_mutator_preserves_pointer_identity() {
        let x = variable("x", crate::core::types::Type::int(32, 1));
        let e = add(x.clone(), int32(1));
        let mut m = Identity;
        let e2 = m.mutate_expr(&e);
        assert!(same_as(&e, &e2));
    }

    #[test]
    fn identity_mutator_preserves_stmt_identity() {
        let x = variable("x", crate::core::types::Type::int(32, 1));
        let s = store("buf", add(x, int32(1)), int32(0));
        let mut m = Identity;
        let s2 = m.mutate_stmt(&s);
        assert!(crate::core::ir::stmt::same_as(&s, &s2));
    }

    struct ConstFolder;
    impl ExprMutator for ConstFolder {
        fn visit_binop(&mut self, e: &Expr, a: &Expr, b: &Expr) -> Expr {
            let na = self.mutate_expr(a);
            let nb = self.mutate_expr(b);
            if let (ExprKind::IntImm(x), ExprKind::IntImm(y)) = (&na.kind, &nb.kind) {
                if matches!(e.kind, ExprKind::Add(..)) {
                    return int_imm(x + y, e.ty);
                }
            }
            rebuild_binop(&e.kind, na, nb)
        }
    }
    impl StmtMutator for ConstFolder {}

    #[test]
    fn overriding_one_hook_rewrites_only_matching_nodes() {
        let mut m = ConstFolder;
        let e = add(int32(2), int32(3));
        let folded = m.mutate_expr(&e);
        assert!(matches!(folded.kind, ExprKind::IntImm(5)));

        let unrelated = variable("x", crate::core::types::Type::int(32, 1));
        let folded2 = m.mutate_expr(&unrelated);
        assert!(same_as(&unrelated, &folded2));
    }
}
