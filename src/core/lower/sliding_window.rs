//! Sliding window (spec §4.I.2), grounded in `sliding_window`
//! (`original_source/cpp/src/SlidingWindow.cpp`).
//!
//! Detects the common case of a `Realize` immediately inside a `Serial` loop
//! whose function window translates by a constant step each iteration with a
//! fixed-size extent (the textbook row-at-a-time stencil pattern): the
//! allocation is hoisted outside the loop so storage persists across
//! iterations, and the produce step for the sliding dimension is narrowed to
//! recompute only the newly exposed slice after the first iteration. Any
//! other shape of `Realize`/loop is left untouched — sliding windows beyond
//! this pattern (non-unit step, multiple sliding dimensions at once) are not
//! attempted.

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

/// `min == loop_var (+ const)?`, i.e. the window translates by exactly one
/// loop step per iteration.
fn is_translating_min(min_expr: &Expr, loop_var: &str) -> bool {
    match &min_expr.kind {
        ExprKind::Variable { name, .. } => name == loop_var,
        ExprKind::Add(a, b) => {
            matches!(&a.kind, ExprKind::Variable { name, .. } if name == loop_var)
                && matches!(b.kind, ExprKind::IntImm(_))
        }
        _ => false,
    }
}

fn is_constant_extent(extent_expr: &Expr) -> bool {
    matches!(extent_expr.kind, ExprKind::IntImm(_))
}

/// Find a bound dimension (by position) whose min translates with
/// `loop_var` and whose extent is a compile-time constant.
fn find_slidable_dim(bounds: &[(Expr, Expr)], loop_var: &str) -> Option<usize> {
    bounds
        .iter()
        .position(|(min_e, extent_e)| is_translating_min(min_e, loop_var) && is_constant_extent(extent_e))
}

/// Rewrite the produce-step `Let` bindings for `func.{var}.min`/`.extent` so
/// that every iteration but the first only computes the newly exposed slice.
fn narrow_produce_bounds(body: &Stmt, min_name: &str, extent_name: &str, loop_var: &str, loop_min: &Expr) -> Stmt {
    struct Narrow<'a> {
        min_name: &'a str,
        extent_name: &'a str,
        loop_var: &'a str,
        loop_min: &'a Expr,
    }
    impl<'a> ExprMutator for Narrow<'a> {}
    impl<'a> StmtMutator for Narrow<'a> {
        fn visit_let_stmt(&mut self, s: &Stmt, value: &Expr, body: &Stmt) -> Stmt {
            let nbody = self.mutate_stmt(body);
            let (name, _) = match &s.kind {
                StmtKind::LetStmt { name, .. } => (name.clone(), ()),
                _ => unreachable!(),
            };
            let is_first_iter = eq(variable(self.loop_var, self.loop_min.ty), self.loop_min.clone());
            if name == self.min_name {
                // First iteration computes from the original min; later
                // iterations only need the newly exposed row at the far
                // edge of the window, i.e. `min + extent - 1`.
                let extent_ref = variable(self.extent_name, value.ty);
                let incremental = crate::core::ir::expr::add(
                    value.clone(),
                    crate::core::ir::expr::sub(extent_ref, int_imm(1, value.ty)),
                );
                let narrowed = select(is_first_iter, value.clone(), incremental);
                return let_stmt(name, narrowed, nbody);
            }
            if name == self.extent_name {
                let narrowed = select(is_first_iter, value.clone(), int_imm(1, value.ty));
                return let_stmt(name, narrowed, nbody);
            }
            let_stmt(name, value.clone(), nbody)
        }
    }
    let mut n = Narrow {
        min_name,
        extent_name,
        loop_var,
        loop_min,
    };
    n.mutate_stmt(body)
}

struct Slider;

impl ExprMutator for Slider {}

impl StmtMutator for Slider {
    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        let loop_name = match &s.kind {
            StmtKind::For { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        let new_body = self.mutate_stmt(body);

        if matches!(for_type, ForType::Serial) {
            if let StmtKind::Realize {
                name,
                ty,
                bounds,
                body: realize_body,
            } = &new_body.kind
            {
                if let Some(dim) = find_slidable_dim(bounds, &loop_name) {
                    let (min_e, extent_e) = &bounds[dim];
                    let min_name = match &min_e.kind {
                        ExprKind::Variable { name, .. } => name.clone(),
                        _ => unreachable!(),
                    };
                    let extent_name = match &extent_e.kind {
                        ExprKind::Variable { name, .. } => name.clone(),
                        _ => unreachable!(),
                    };
                    let narrowed_body =
                        narrow_produce_bounds(realize_body, &min_name, &extent_name, &loop_name, min);
                    let new_for = for_(loop_name, min.clone(), extent.clone(), for_type, narrowed_body);
                    return realize(name.clone(), *ty, bounds.clone(), new_for);
                }
            }
        }

        if crate::core::ir::stmt::same_as(&new_body, body) {
            s.clone()
        } else {
            for_(loop_name, min.clone(), extent.clone(), for_type, new_body)
        }
    }
}

/// Apply the sliding-window rewrite wherever the textbook pattern is found.
pub fn sliding_window(s: &Stmt) -> Stmt {
    let mut slider = Slider;
    slider.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn translating_window_with_constant_extent_is_slidable() {
        let bounds = vec![(
            add(variable("y", i32ty()), int32(0)),
            int32(3),
        )];
        assert_eq!(find_slidable_dim(&bounds, "y"), Some(0));
    }

    #[test]
    fn non_constant_extent_is_not_slidable() {
        let bounds = vec![(variable("y", i32ty()), variable("h", i32ty()))];
        assert_eq!(find_slidable_dim(&bounds, "y"), None);
    }

    #[test]
    fn hoists_realize_outside_the_matching_loop() {
        let body = let_stmt(
            "f.y.min",
            variable("y", i32ty()),
            let_stmt("f.y.extent", int32(3), nop()),
        );
        let realized = realize(
            "f",
            i32ty(),
            vec![(variable("f.y.min", i32ty()), variable("f.y.extent", i32ty()))],
            body,
        );
        let looped = for_("y", int32(0), int32(10), ForType::Serial, realized);
        let slid = sliding_window(&looped);
        match &slid.kind {
            StmtKind::Realize { body, .. } => {
                assert!(matches!(body.kind, StmtKind::For { .. }));
            }
            other => panic!("expected Realize to be hoisted outside the loop, got {:?}", other),
        }
    }
}
