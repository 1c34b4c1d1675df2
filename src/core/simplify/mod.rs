//! Algebraic simplifier (spec §4.E): constant folding, canonicalization,
//! algebraic identities, and `Let`-substitution, run to a fixed point
//! (§4.E.6). Grounded in the recursive rewrite style of `SymValue::simplify`
//! (`examples/mastercyb-trident/src/verify/sym/mod.rs`), generalized from a
//! standalone function into an `ExprMutator`/`StmtMutator` implementation so
//! it plugs into the same traversal framework as every other pass.

mod algebra;
mod canonicalize;
mod constant_fold;
mod modulus;

pub use constant_fold::as_int_const;
pub use modulus::ModulusRemainder;

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::{assert_stmt, for_, nop, ForType, Stmt, StmtKind};
use crate::core::scope::Scope;

/// Simplify `e` to a fixed point with no ambient knowledge of bound
/// variables.
pub fn simplify(e: &Expr) -> Expr {
    let mut scope = Scope::new();
    let mut mod_scope = Scope::new();
    simplify_in_scope(e, &mut scope, &mut mod_scope)
}

/// Simplify `e`, consulting (and extending, for nested `Let`s) the given
/// value/modulus scopes. Lets a caller simplify a sub-expression that
/// references variables already bound further out (e.g. during bounds
/// inference, spec §4.F).
pub fn simplify_in_scope(
    e: &Expr,
    scope: &mut Scope<Expr>,
    mod_scope: &mut Scope<ModulusRemainder>,
) -> Expr {
    let mut s = Simplifier { scope, mod_scope };
    let mut current = e.clone();
    // The rewrite rules are confluent and strictly reduce a well-founded
    // complexity measure (shared with Halide's own simplifier: constant
    // folding and algebraic collapse can only shrink a term), but a safety
    // cap keeps a pathological input from looping forever.
    for _ in 0..64 {
        let next = s.mutate_expr(&current);
        if same_as(&next, &current) {
            break;
        }
        current = next;
    }
    current
}

pub fn simplify_stmt(s: &Stmt) -> Stmt {
    let mut scope = Scope::new();
    let mut mod_scope = Scope::new();
    let mut simp = Simplifier {
        scope: &mut scope,
        mod_scope: &mut mod_scope,
    };
    let mut current = s.clone();
    for _ in 0..64 {
        let next = simp.mutate_stmt(&current);
        if crate::core::ir::stmt::same_as(&next, &current) {
            break;
        }
        current = next;
    }
    current
}

struct Simplifier<'a> {
    scope: &'a mut Scope<Expr>,
    mod_scope: &'a mut Scope<ModulusRemainder>,
}

impl<'a> ExprMutator for Simplifier<'a> {
    fn visit_variable(&mut self, e: &Expr, name: &str) -> Expr {
        self.scope.get(name).cloned().unwrap_or_else(|| e.clone())
    }

    fn visit_cast(&mut self, e: &Expr, value: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        if let Some(folded) = constant_fold::try_fold_cast(e.ty, &nv) {
            return folded;
        }
        if same_as(&nv, value) {
            e.clone()
        } else {
            cast(e.ty, nv)
        }
    }

    fn visit_binop(&mut self, e: &Expr, a: &Expr, b: &Expr) -> Expr {
        let na = self.mutate_expr(a);
        let nb = self.mutate_expr(b);
        if let Some(result) = self.try_rewrite_binop(e, &na, &nb) {
            return result;
        }
        if same_as(&na, a) && same_as(&nb, b) {
            e.clone()
        } else {
            rebuild_like(&e.kind, na, nb)
        }
    }

    fn visit_not(&mut self, e: &Expr, a: &Expr) -> Expr {
        let na = self.mutate_expr(a);
        match &na.kind {
            ExprKind::Not(inner) => inner.clone(),
            ExprKind::LT(x, y) => self.mutate_expr(&le(y.clone(), x.clone())),
            ExprKind::EQ(x, y) => self.mutate_expr(&ne(x.clone(), y.clone())),
            ExprKind::IntImm(v) => int_imm(if *v == 0 { 1 } else { 0 }, e.ty),
            _ => {
                if same_as(&na, a) {
                    e.clone()
                } else {
                    not(na)
                }
            }
        }
    }

    fn visit_select(&mut self, e: &Expr, cond: &Expr, t: &Expr, f: &Expr) -> Expr {
        let nc = self.mutate_expr(cond);
        let nt = self.mutate_expr(t);
        let nf = self.mutate_expr(f);
        if let ExprKind::IntImm(v) = &nc.kind {
            return if *v != 0 { nt } else { nf };
        }
        match &nc.kind {
            ExprKind::NE(x, y) => {
                return self.mutate_expr(&select(eq(x.clone(), y.clone()), nf, nt));
            }
            ExprKind::LE(x, y) => {
                return self.mutate_expr(&select(lt(y.clone(), x.clone()), nf, nt));
            }
            _ => {}
        }
        if same_as(&nc, cond) && same_as(&nt, t) && same_as(&nf, f) {
            e.clone()
        } else {
            select(nc, nt, nf)
        }
    }

    fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        match &e.kind {
            ExprKind::Let { name, .. } => {
                // Ramp/Broadcast values are split so `body` can still see
                // their vector structure through separately-bound base/value
                // lets (spec §4.E.4).
                if let ExprKind::Ramp { base, stride, width } = &nv.kind {
                    let base_name = format!("{name}.base");
                    let stride_name = format!("{name}.stride");
                    let substituted = substitute(
                        body,
                        name,
                        &ramp(
                            variable(base_name.clone(), base.ty),
                            variable(stride_name.clone(), stride.ty),
                            *width,
                        ),
                    );
                    return let_in(
                        base_name,
                        base.clone(),
                        let_in(stride_name, stride.clone(), self.mutate_expr(&substituted)),
                    );
                }
                if let ExprKind::Broadcast { value: inner, width } = &nv.kind {
                    let inner_name = format!("{name}.value");
                    let substituted = substitute(
                        body,
                        name,
                        &broadcast(variable(inner_name.clone(), inner.ty), *width),
                    );
                    return let_in(inner_name, inner.clone(), self.mutate_expr(&substituted));
                }
                if is_const(&nv) || matches!(nv.kind, ExprKind::Variable { .. }) {
                    // Trivial value: substitute it directly and drop the let.
                    let substituted = substitute(body, name, &nv);
                    return self.mutate_expr(&substituted);
                }
                let fv = modulus::analyze(&nv, self.mod_scope);
                self.scope.push(name.clone(), nv.clone());
                self.mod_scope.push(name.clone(), fv);
                let nb = self.mutate_expr(body);
                self.mod_scope.pop(name);
                self.scope.pop(name);
                if same_as(&nv, value) && same_as(&nb, body) {
                    e.clone()
                } else {
                    let_in(name.clone(), nv, nb)
                }
            }
            _ => unreachable!(),
        }
    }
}

impl<'a> StmtMutator for Simplifier<'a> {
    fn visit_assert_stmt(&mut self, s: &Stmt, condition: &Expr) -> Stmt {
        let nc = self.mutate_expr(condition);
        if let ExprKind::IntImm(1) = &nc.kind {
            return nop();
        }
        match &s.kind {
            StmtKind::AssertStmt { message, .. } => assert_stmt(nc, message.clone()),
            _ => unreachable!(),
        }
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
        if crate::core::ir::expr::same_as(&nmin, min)
            && crate::core::ir::expr::same_as(&nextent, extent)
            && crate::core::ir::stmt::same_as(&nbody, body)
        {
            return s.clone();
        }
        match &s.kind {
            StmtKind::For { name, .. } => for_(name.clone(), nmin, nextent, for_type, nbody),
            _ => unreachable!(),
        }
    }
}

impl<'a> Simplifier<'a> {
    fn try_rewrite_binop(&mut self, e: &Expr, a: &Expr, b: &Expr) -> Option<Expr> {
        if let Some(v) = constant_fold::try_fold(&e.kind, a, b) {
            return Some(v);
        }
        if canonicalize::should_swap_commutative(&e.kind, a, b) {
            let swapped = rebuild_like(&e.kind, b.clone(), a.clone());
            return Some(self.mutate_expr(&swapped));
        }
        if let Some(rewritten) = canonicalize::sub_to_add_neg(&e.kind, a, b) {
            return Some(self.mutate_expr(&rewritten));
        }
        if let Some(rewritten) = canonicalize::push_ramp_broadcast(&e.kind, a, b) {
            return Some(self.mutate_expr(&rewritten));
        }
        match &e.kind {
            ExprKind::GT(..) => return Some(self.mutate_expr(&lt(b.clone(), a.clone()))),
            ExprKind::GE(..) => return Some(self.mutate_expr(&not(lt(a.clone(), b.clone())))),
            _ => {}
        }
        if let Some(rewritten) = algebra::try_identity(&e.kind, a, b, self.mod_scope) {
            return Some(self.mutate_expr(&rewritten));
        }
        None
    }
}

fn rebuild_like(kind: &ExprKind, a: Expr, b: Expr) -> Expr {
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
        _ => unreachable!("rebuild_like called on non-binop kind"),
    }
}

/// Replace every free occurrence of `name` in `e` with `value`. Used only
/// for trivial (literal/variable/split-vector) let values, where capture is
/// not a concern because the replacement introduces no new binders.
fn substitute(e: &Expr, name: &str, value: &Expr) -> Expr {
    struct Subst<'a> {
        name: &'a str,
        value: &'a Expr,
    }
    impl<'a> ExprMutator for Subst<'a> {
        fn visit_variable(&mut self, e: &Expr, var_name: &str) -> Expr {
            if var_name == self.name {
                self.value.clone()
            } else {
                e.clone()
            }
        }
        fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
            let nv = self.mutate_expr(value);
            match &e.kind {
                ExprKind::Let { name: bound, .. } if bound == self.name => {
                    // Inner let shadows the name being substituted; stop here.
                    if same_as(&nv, value) {
                        e.clone()
                    } else {
                        let_in(bound.clone(), nv, body.clone())
                    }
                }
                ExprKind::Let { name: bound, .. } => {
                    let nb = self.mutate_expr(body);
                    let_in(bound.clone(), nv, nb)
                }
                _ => unreachable!(),
            }
        }
    }
    let mut s = Subst { name, value };
    s.mutate_expr(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn folds_constants() {
        let e = add(int32(2), int32(3));
        assert!(matches!(simplify(&e).kind, ExprKind::IntImm(5)));
    }

    #[test]
    fn cancels_additive_inverse() {
        let x = variable("x", Type::int(32, 1));
        let e = add(x.clone(), sub(int32(0), x));
        assert!(matches!(simplify(&e).kind, ExprKind::IntImm(0)));
    }

    #[test]
    fn canonicalizes_gt_into_lt() {
        let x = variable("x", Type::int(32, 1));
        let e = gt(x.clone(), int32(0));
        let simplified = simplify(&e);
        assert!(matches!(simplified.kind, ExprKind::LT(..)));
    }

    #[test]
    fn ge_canonicalizes_to_le_flipped() {
        let x = variable("x", Type::int(32, 1));
        let e = ge(x, int32(0));
        let simplified = simplify(&e);
        assert!(matches!(simplified.kind, ExprKind::LE(..)));
    }

    #[test]
    fn select_on_ne_flips_branches_to_eq() {
        let x = variable("x", Type::int(32, 1));
        let cond = ne(x.clone(), int32(0));
        let e = select(cond, int32(1), int32(2));
        let simplified = simplify(&e);
        match &simplified.kind {
            ExprKind::Select { cond, true_value, false_value } => {
                assert!(matches!(cond.kind, ExprKind::EQ(..)));
                assert!(matches!(true_value.kind, ExprKind::IntImm(2)));
                assert!(matches!(false_value.kind, ExprKind::IntImm(1)));
            }
            _ => panic!("expected Select to survive"),
        }
    }

    #[test]
    fn literal_let_is_substituted_away() {
        let x = variable("x", Type::int(32, 1));
        let e = let_in("x", int32(5), add(x, int32(1)));
        assert!(matches!(simplify(&e).kind, ExprKind::IntImm(6)));
    }

    #[test]
    fn cast_narrows_with_wraparound() {
        let e = cast(Type::int(8, 1), int32(1232));
        assert!(matches!(simplify(&e).kind, ExprKind::IntImm(-48)));
    }

    #[test]
    fn common_factor_extraction_via_full_pipeline() {
        let a = variable("a", Type::int(32, 1));
        let b = variable("b", Type::int(32, 1));
        let x = variable("x", Type::int(32, 1));
        let e = add(mul(a, x.clone()), mul(b, x));
        let simplified = simplify(&e);
        assert!(matches!(simplified.kind, ExprKind::Mul(..)));
    }
}
