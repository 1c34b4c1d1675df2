//! Loop unrolling (spec §4.J.2), grounded in `unroll_loops`
//! (`original_source/cpp/src/UnrollLoops.cpp`): replace every
//! `ForType::Unrolled` loop with `extent` copies of its body, each with the
//! loop variable substituted for `min + i`.

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

use super::rename::substitute_stmt;

struct Unroller;

impl ExprMutator for Unroller {}

impl StmtMutator for Unroller {
    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        let nbody = self.mutate_stmt(body);
        if !matches!(for_type, ForType::Unrolled) {
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
        let trip_count = match &extent.kind {
            ExprKind::IntImm(v) => *v,
            _ => panic!("Unrolled For requires a literal integer extent"),
        };
        let copies: Vec<Stmt> = (0..trip_count)
            .map(|i| {
                let iter_value = add(min.clone(), int_imm(i, min.ty));
                substitute_stmt(&nbody, &name, &iter_value)
            })
            .collect();
        block(copies)
    }
}

/// Expand every unrolled loop into its straight-line copies.
pub fn unroll_loops(s: &Stmt) -> Stmt {
    let mut u = Unroller;
    u.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn unrolled_loop_expands_to_one_copy_per_iteration() {
        let i32ty = Type::int(32, 1);
        let body = store("buf", variable("i", i32ty), variable("i", i32ty));
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Unrolled, body);
        let unrolled = unroll_loops(&loop_stmt);
        match &unrolled.kind {
            StmtKind::Block(stmts) => assert_eq!(stmts.len(), 4),
            other => panic!("expected a Block of 4 copies, got {:?}", other),
        }
    }

    #[test]
    fn serial_loop_is_left_alone() {
        let body = nop();
        let loop_stmt = for_("i", int32(0), int32(4), ForType::Serial, body);
        let result = unroll_loops(&loop_stmt);
        assert!(crate::core::ir::stmt::same_as(&result, &loop_stmt));
    }
}
