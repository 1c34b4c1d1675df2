//! Bounds inference (spec §4.I.1), grounded in `bounds_inference`
//! (`original_source/cpp/src/BoundsInference.cpp`): for every `Realize`,
//! compute the union of regions the function is actually called over within
//! its scope and bind its symbolic `"{func}.{var}.min"`/`".extent"` names to
//! that computed region.

use crate::core::bounds::region_called;
use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

fn bound_name(e: &Expr) -> Option<String> {
    match &e.kind {
        ExprKind::Variable { name, .. } => Some(name.clone()),
        _ => None,
    }
}

struct BoundsInjector;

impl ExprMutator for BoundsInjector {}

impl StmtMutator for BoundsInjector {
    fn visit_realize(&mut self, s: &Stmt, bounds: &[(Expr, Expr)], body: &Stmt) -> Stmt {
        let (name, ty) = match &s.kind {
            StmtKind::Realize { name, ty, .. } => (name.clone(), *ty),
            _ => unreachable!(),
        };
        let new_body = self.mutate_stmt(body);
        let required = region_called(&new_body, &name);

        let mut wrapped = new_body;
        if required.len() == bounds.len() {
            for (i, (min_e, extent_e)) in bounds.iter().enumerate().rev() {
                let (req_min, req_extent) = &required[i];
                if let Some(extent_name) = bound_name(extent_e) {
                    wrapped = let_stmt(extent_name, req_extent.clone(), wrapped);
                }
                if let Some(min_name) = bound_name(min_e) {
                    wrapped = let_stmt(min_name, req_min.clone(), wrapped);
                }
            }
        }
        realize(name, ty, bounds.to_vec(), wrapped)
    }
}

/// Narrow every `Realize`'s symbolic bounds to the region it is actually
/// used over, innermost `Realize` first (so an outer function's inference
/// sees its producers already resolved).
pub fn bounds_inference(s: &Stmt) -> Stmt {
    let mut b = BoundsInjector;
    b.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn realize_bounds_are_bound_to_the_region_actually_called() {
        let min_var = variable("f.x.min", i32ty());
        let extent_var = variable("f.x.extent", i32ty());

        let x = variable("x", i32ty());
        let call_expr = call(i32ty(), "f", vec![add(x.clone(), int32(1))], CallKind::Halide);
        let consumer = for_(
            "g.x",
            int32(0),
            int32(10),
            ForType::Serial,
            provide("g", call_expr, vec![x]),
        );

        let produce = for_(
            "f.x",
            min_var.clone(),
            extent_var.clone(),
            ForType::Serial,
            provide("f", int32(0), vec![variable("f.x", i32ty())]),
        );
        let realized = realize(
            "f",
            i32ty(),
            vec![(min_var, extent_var)],
            block(vec![produce, consumer]),
        );

        let inferred = bounds_inference(&realized);
        let rendered = format!("{}", inferred);
        assert!(rendered.contains("f.x.min"));
        assert!(rendered.contains("f.x.extent"));
    }
}
