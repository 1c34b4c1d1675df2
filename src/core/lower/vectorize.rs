//! Loop vectorization (spec §4.J.1), grounded in `vectorize_loops`
//! (`original_source/cpp/src/VectorizeLoops.cpp`): replace a
//! `ForType::Vectorized` loop with a single straight-line vector copy of its
//! body, substituting the loop variable for `ramp(min, 1, width)`. Ordinary
//! arithmetic widens automatically through `Type::widen` as the substituted
//! `Ramp` propagates up through `rebuild_binop`; only `Load`/`Call` (which
//! carry an explicit `ty` field the default mutator doesn't recompute) and
//! `Select` (whose branches must agree on width) need manual widening here.

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

/// Broadcast a scalar operand up to `width` lanes so it can sit alongside an
/// operand the substitution already widened.
fn widen_to(e: Expr, width: u32) -> Expr {
    if e.ty.width == width || width <= 1 {
        e
    } else {
        broadcast(e, width)
    }
}

struct LaneSubst<'a> {
    name: &'a str,
    lane: &'a Expr,
}

impl<'a> ExprMutator for LaneSubst<'a> {
    fn visit_variable(&mut self, e: &Expr, var_name: &str) -> Expr {
        if var_name == self.name {
            self.lane.clone()
        } else {
            e.clone()
        }
    }

    fn visit_select(&mut self, _e: &Expr, cond: &Expr, t: &Expr, f: &Expr) -> Expr {
        let nc = self.mutate_expr(cond);
        let nt = self.mutate_expr(t);
        let nf = self.mutate_expr(f);
        let width = nc.ty.width.max(nt.ty.width).max(nf.ty.width);
        select(widen_to(nc, width), widen_to(nt, width), widen_to(nf, width))
    }

    fn visit_load(&mut self, e: &Expr, index: &Expr) -> Expr {
        let ni = self.mutate_expr(index);
        let (buffer_name, image) = match &e.kind {
            ExprKind::Load { buffer_name, image, .. } => (buffer_name.clone(), *image),
            _ => unreachable!(),
        };
        load(e.ty.vector_of(ni.ty.width), buffer_name, ni, image)
    }

    fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
        let new_args: Vec<Expr> = args.iter().map(|a| self.mutate_expr(a)).collect();
        let width = new_args.iter().map(|a| a.ty.width).max().unwrap_or(1);
        let (name, call_kind) = match &e.kind {
            ExprKind::Call { name, call_kind, .. } => (name.clone(), *call_kind),
            _ => unreachable!(),
        };
        call(e.ty.vector_of(width), name, new_args, call_kind)
    }
}

impl<'a> StmtMutator for LaneSubst<'a> {}

struct Vectorizer;

impl ExprMutator for Vectorizer {}

impl StmtMutator for Vectorizer {
    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        let nbody = self.mutate_stmt(body);
        if !matches!(for_type, ForType::Vectorized) {
            return if crate::core::ir::stmt::same_as(&nbody, body) {
                s.clone()
            } else {
                let name = match &s.kind {
                    StmtKind::For { name, .. } => name.clone(),
                    _ => unreachable!(),
                };
                for_(name, min.clone(), extent.clone(), for_type, nbody)
            };
        }

        let name = match &s.kind {
            StmtKind::For { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        let width = match &extent.kind {
            ExprKind::IntImm(v) if *v >= 2 => *v as u32,
            _ => panic!("Vectorized For requires a literal integer extent >= 2"),
        };
        let lane = ramp(min.clone(), int_imm(1, min.ty), width);
        let mut subst = LaneSubst { name: &name, lane: &lane };
        subst.mutate_stmt(&nbody)
    }
}

/// Replace every vectorized loop with its widened straight-line body.
pub fn vectorize_loops(s: &Stmt) -> Stmt {
    let mut v = Vectorizer;
    v.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn vectorized_loop_disappears_and_widens_the_store() {
        let i = variable("i", i32ty());
        let body = store("out", i.clone(), i);
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Vectorized, body);
        let vectorized = vectorize_loops(&loop_stmt);
        match &vectorized.kind {
            StmtKind::Store { value, index, .. } => {
                assert_eq!(value.ty.width, 4);
                assert_eq!(index.ty.width, 4);
            }
            other => panic!("expected a bare Store, got {:?}", other),
        }
    }

    #[test]
    fn select_branches_are_broadcast_to_match_the_vectorized_condition() {
        let i = variable("i", i32ty());
        let cond = crate::core::ir::expr::gt(i.clone(), int32(0));
        let picked = select(cond, i, int32(0));
        let body = store("out", picked, int32(0));
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Vectorized, body);
        let vectorized = vectorize_loops(&loop_stmt);
        match &vectorized.kind {
            StmtKind::Store { value, .. } => assert_eq!(value.ty.width, 4),
            other => panic!("expected a bare Store, got {:?}", other),
        }
    }

    #[test]
    fn serial_loop_is_left_alone() {
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Serial, nop());
        let result = vectorize_loops(&loop_stmt);
        assert!(crate::core::ir::stmt::same_as(&result, &loop_stmt));
    }
}
