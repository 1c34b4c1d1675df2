//! Function inlining (spec §4.H.3), grounded in `InlineFunction`
//! (`original_source/cpp/src/Lower.cpp`, `Inline.cpp`): every `Call` to an
//! inline-scheduled function is replaced by its pure value expression with
//! actual arguments substituted for its pure args.

use crate::core::func::Function;
use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::Stmt;

use super::rename::substitute_expr;

/// Replace every call to `func` within `s` with its pure definition.
pub fn inline_function(s: &Stmt, func: &Function) -> Stmt {
    struct Inliner<'a> {
        func: &'a Function,
    }

    impl<'a> ExprMutator for Inliner<'a> {
        fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
            let new_args: Vec<Expr> = args.iter().map(|a| self.mutate_expr(a)).collect();
            match &e.kind {
                ExprKind::Call { name, call_kind, .. }
                    if name == &self.func.name && matches!(call_kind, CallKind::Halide) =>
                {
                    let mut body = self
                        .func
                        .pure_value
                        .clone()
                        .expect("inlined function must have a pure definition");
                    for (pure_name, actual) in self.func.pure_args.iter().zip(new_args.iter()) {
                        body = substitute_expr(&body, pure_name, actual);
                    }
                    // The substituted body may itself call other functions;
                    // keep descending with the same mutator.
                    self.mutate_expr(&body)
                }
                ExprKind::Call { name, call_kind, .. } => {
                    if new_args.iter().zip(args).all(|(n, o)| same_as(n, o)) {
                        e.clone()
                    } else {
                        call(e.ty, name.clone(), new_args, *call_kind)
                    }
                }
                _ => unreachable!(),
            }
        }
    }
    impl<'a> StmtMutator for Inliner<'a> {}

    let mut m = Inliner { func };
    m.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn inlining_substitutes_pure_args_into_call_site() {
        let mut f = Function::new("f");
        let x = variable("x", Type::int(32, 1));
        f.define(vec!["x".into()], mul(x, int32(2))).unwrap();

        let y = variable("y", Type::int(32, 1));
        let call_site = call(Type::int(32, 1), "f", vec![add(y, int32(1))], CallKind::Halide);
        let s = crate::core::ir::stmt::provide("out", call_site, vec![]);

        let inlined = inline_function(&s, &f);
        match &inlined.kind {
            crate::core::ir::stmt::StmtKind::Provide { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Mul(..)));
            }
            _ => panic!("expected Provide"),
        }
    }
}
