//! Name-substitution helpers shared by inlining and loop-nest construction,
//! grounded in `Substitute`/`QualifyExpr` (`original_source/cpp/src/Lower.cpp`,
//! `Substitute.cpp`).

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

/// Replace every free occurrence of `name` with `value`. Every name this
/// compiler core hands to a binder is qualified (`"f.x"`-style) before it is
/// ever substituted, so accidental capture cannot occur in practice.
pub fn substitute_expr(e: &Expr, name: &str, value: &Expr) -> Expr {
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
    }
    let mut s = Subst { name, value };
    s.mutate_expr(e)
}

pub fn substitute_stmt(s: &Stmt, name: &str, value: &Expr) -> Stmt {
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
    }
    impl<'a> StmtMutator for Subst<'a> {}
    let mut m = Subst { name, value };
    m.mutate_stmt(s)
}

/// Qualify every `Variable`/`Let` name by prepending `prefix`, except names
/// that carry a parameter or reduction-domain binding (those are pipeline-
/// global already). Mirrors `QualifyExpr`: splicing a function's value
/// expression into the shared statement tree must not collide with another
/// function's identically-named pure args.
pub fn qualify_expr(e: &Expr, prefix: &str) -> Expr {
    struct Qualify<'a> {
        prefix: &'a str,
    }
    impl<'a> ExprMutator for Qualify<'a> {
        fn visit_variable(&mut self, e: &Expr, name: &str) -> Expr {
            match &e.kind {
                ExprKind::Variable {
                    param: None,
                    reduction_domain: None,
                    ..
                } => variable(format!("{}{}", self.prefix, name), e.ty),
                _ => e.clone(),
            }
        }
        fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
            let nv = self.mutate_expr(value);
            let nb = self.mutate_expr(body);
            match &e.kind {
                ExprKind::Let { name, .. } => let_in(format!("{}{}", self.prefix, name), nv, nb),
                _ => unreachable!(),
            }
        }
    }
    let mut q = Qualify { prefix };
    q.mutate_expr(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn substitute_replaces_free_variable() {
        let x = variable("x", Type::int(32, 1));
        let e = add(x, int32(1));
        let replaced = substitute_expr(&e, "x", &int32(5));
        assert!(matches!(replaced.kind, ExprKind::Add(..)));
        if let ExprKind::Add(a, _) = &replaced.kind {
            assert!(matches!(a.kind, ExprKind::IntImm(5)));
        }
    }

    #[test]
    fn qualify_prefixes_plain_variables_only() {
        let x = variable("x", Type::int(32, 1));
        let q = qualify_expr(&x, "f.");
        match &q.kind {
            ExprKind::Variable { name, .. } => assert_eq!(name, "f.x"),
            _ => panic!("expected Variable"),
        }
    }
}
