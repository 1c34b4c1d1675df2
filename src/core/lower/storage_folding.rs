//! Storage folding (spec §4.I.3), grounded in `storage_folding`
//! (`original_source/cpp/src/StorageFolding.cpp`): when a `Realize`'s
//! dimension has a small compile-time-constant extent, wrap every store and
//! load index in that dimension with `% extent` so the backing allocation
//! only ever needs to hold `extent` slices instead of the whole axis —
//! pairs naturally with [[sliding_window]], which is what produces most
//! constant-extent dimensions in the first place.

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

fn fold_factor(extent_e: &Expr) -> Option<i64> {
    match &extent_e.kind {
        ExprKind::IntImm(v) if *v > 0 => Some(*v),
        _ => None,
    }
}

/// Wrap argument `dim` of every `Provide`/`Call` to `name` within `body`
/// with `% factor`.
fn fold_dimension(body: &Stmt, name: &str, dim: usize, factor: i64) -> Stmt {
    struct Fold<'a> {
        name: &'a str,
        dim: usize,
        factor: i64,
    }
    impl<'a> ExprMutator for Fold<'a> {
        fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
            let (call_name, call_kind) = match &e.kind {
                ExprKind::Call { name, call_kind, .. } => (name.clone(), *call_kind),
                _ => unreachable!(),
            };
            let targets_folded_func = call_name == self.name;
            let new_args: Vec<Expr> = args
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let na = self.mutate_expr(a);
                    if targets_folded_func && i == self.dim {
                        rem(na.clone(), int_imm(self.factor, na.ty))
                    } else {
                        na
                    }
                })
                .collect();
            call(e.ty, call_name, new_args, call_kind)
        }
    }
    impl<'a> StmtMutator for Fold<'a> {
        fn visit_provide(&mut self, s: &Stmt, value: &Expr, args: &[Expr]) -> Stmt {
            let nv = self.mutate_expr(value);
            let provide_name = match &s.kind {
                StmtKind::Provide { name, .. } => name.clone(),
                _ => unreachable!(),
            };
            let targets_folded_func = provide_name == self.name;
            let new_args: Vec<Expr> = args
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let na = self.mutate_expr(a);
                    if targets_folded_func && i == self.dim {
                        rem(na.clone(), int_imm(self.factor, na.ty))
                    } else {
                        na
                    }
                })
                .collect();
            provide(provide_name, nv, new_args)
        }
    }
    let mut f = Fold { name, dim, factor };
    f.mutate_stmt(body)
}

struct Folder;

impl ExprMutator for Folder {}

impl StmtMutator for Folder {
    fn visit_realize(&mut self, s: &Stmt, bounds: &[(Expr, Expr)], body: &Stmt) -> Stmt {
        let new_body = self.mutate_stmt(body);
        let (name, ty) = match &s.kind {
            StmtKind::Realize { name, ty, .. } => (name.clone(), *ty),
            _ => unreachable!(),
        };
        if let Some(dim) = bounds.iter().position(|(_, extent)| fold_factor(extent).is_some()) {
            let factor = fold_factor(&bounds[dim].1).unwrap();
            let folded_body = fold_dimension(&new_body, &name, dim, factor);
            return realize(name, ty, bounds.to_vec(), folded_body);
        }
        realize(name, ty, bounds.to_vec(), new_body)
    }
}

/// Fold every constant-extent storage dimension to save memory.
pub fn storage_folding(s: &Stmt) -> Stmt {
    let mut f = Folder;
    f.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn constant_extent_dimension_gets_modulo_wrapped() {
        let i32ty = Type::int(32, 1);
        let y = variable("y", i32ty);
        let body = provide("f", int32(1), vec![y.clone()]);
        let realized = realize("f", i32ty, vec![(int32(0), int32(3))], body);
        let folded = storage_folding(&realized);
        let rendered = format!("{}", folded);
        assert!(rendered.contains('%'));
    }
}
