//! Storage flattening (spec §4.I.4), grounded in `storage_flattening`
//! (`original_source/cpp/src/StorageFlattening.cpp`): lowers every symbolic
//! `Realize`/`Provide`/`Call` to a flat `Allocate`/`Store`/`Load`, computing
//! a row-major index from the realized region (dimension 0 innermost).

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;
use crate::core::scope::Scope;

fn flat_index(args: &[Expr], bounds: &[(Expr, Expr)]) -> Expr {
    let mut index = int32(0);
    let mut stride = int32(1);
    for (arg, (dim_min, dim_extent)) in args.iter().zip(bounds.iter()) {
        let rebased = sub(arg.clone(), dim_min.clone());
        index = add(index, mul(rebased, stride.clone()));
        stride = mul(stride, dim_extent.clone());
    }
    index
}

struct Flattener {
    scope: Scope<Vec<(Expr, Expr)>>,
}

impl ExprMutator for Flattener {
    fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
        let (call_name, call_kind) = match &e.kind {
            ExprKind::Call { name, call_kind, .. } => (name.clone(), *call_kind),
            _ => unreachable!(),
        };
        let new_args: Vec<Expr> = args.iter().map(|a| self.mutate_expr(a)).collect();
        if matches!(call_kind, CallKind::Halide) {
            if let Some(bounds) = self.scope.get(&call_name).cloned() {
                let idx = flat_index(&new_args, &bounds);
                return load(e.ty, call_name, idx, false);
            }
        }
        call(e.ty, call_name, new_args, call_kind)
    }
}

impl StmtMutator for Flattener {
    fn visit_realize(&mut self, s: &Stmt, bounds: &[(Expr, Expr)], body: &Stmt) -> Stmt {
        let (name, ty) = match &s.kind {
            StmtKind::Realize { name, ty, .. } => (name.clone(), *ty),
            _ => unreachable!(),
        };
        let resolved_bounds: Vec<(Expr, Expr)> = bounds
            .iter()
            .map(|(min_e, extent_e)| (self.mutate_expr(min_e), self.mutate_expr(extent_e)))
            .collect();

        self.scope.push(name.clone(), resolved_bounds.clone());
        let new_body = self.mutate_stmt(body);
        self.scope.pop(&name);

        let size = resolved_bounds
            .iter()
            .fold(int32(1), |acc, (_, extent)| mul(acc, extent.clone()));
        allocate(name, ty, size, new_body)
    }

    fn visit_provide(&mut self, s: &Stmt, value: &Expr, args: &[Expr]) -> Stmt {
        let nv = self.mutate_expr(value);
        let name = match &s.kind {
            StmtKind::Provide { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        let new_args: Vec<Expr> = args.iter().map(|a| self.mutate_expr(a)).collect();
        if let Some(bounds) = self.scope.get(&name).cloned() {
            let idx = flat_index(&new_args, &bounds);
            return store(name, nv, idx);
        }
        provide(name, nv, new_args)
    }
}

/// Flatten every `Realize`/`Provide`/`Call` under `s` into `Allocate`/
/// `Store`/`Load`. Functions with no enclosing `Realize` (pipeline inputs
/// bound directly as image parameters) are left as `Call`/`Load` nodes for
/// the backend to resolve against an external buffer.
pub fn storage_flattening(s: &Stmt) -> Stmt {
    let mut f = Flattener { scope: Scope::new() };
    f.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn realize_becomes_allocate_with_product_size() {
        let i32ty = Type::int(32, 1);
        let x = variable("x", i32ty);
        let body = provide("f", int32(1), vec![x]);
        let realized = realize("f", i32ty, vec![(int32(0), int32(10))], body);
        let flattened = storage_flattening(&realized);
        match &flattened.kind {
            StmtKind::Allocate { name, .. } => assert_eq!(name, "f"),
            other => panic!("expected Allocate, got {:?}", other),
        }
    }

    #[test]
    fn provide_and_call_become_store_and_load_with_matching_index() {
        let i32ty = Type::int(32, 1);
        let x = variable("x", i32ty);
        let inner_call = call(i32ty, "f", vec![x.clone()], CallKind::Halide);
        let consumer = provide("g", inner_call, vec![x.clone()]);
        let producer = provide("f", int32(1), vec![x]);
        let realized = realize(
            "f",
            i32ty,
            vec![(int32(0), int32(10))],
            block(vec![producer, consumer]),
        );
        let flattened = storage_flattening(&realized);
        let rendered = format!("{}", flattened);
        assert!(rendered.contains("f["));
    }
}
