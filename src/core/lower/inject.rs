//! Realization injection and the `schedule_functions` driver (spec §4.H.2,
//! §4.G), grounded in `InjectRealization`/`schedule_functions`
//! (`original_source/cpp/src/Lower.cpp`).
//!
//! `create_initial_loop_nest` builds the output function's own produce/update
//! as a `Pipeline`, wraps it in a synthetic `".<root>"` loop, then walks the
//! realization order in reverse (consumers before producers) either inlining
//! each other function or injecting its `Pipeline`/`Realize` at the `For`
//! loops named by its schedule's compute/store levels. The synthetic loop is
//! stripped once every function has been placed.

use std::collections::BTreeMap;

use crate::core::diagnostic::LowerError;
use crate::core::func::Function;
use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;
use crate::core::types::Type;

use super::inline::inline_function;
use super::loop_nest::{build_realization, inject_explicit_bounds};

const SYNTHETIC_ROOT: &str = ".<root>";

fn i32ty() -> Type {
    Type::int(32, 1)
}

fn references_function(s: &Stmt, name: &str) -> bool {
    struct Finder<'a> {
        name: &'a str,
        found: bool,
    }
    impl<'a> ExprMutator for Finder<'a> {
        fn visit_call(&mut self, e: &Expr, args: &[Expr]) -> Expr {
            if let ExprKind::Call { name, call_kind, .. } = &e.kind {
                if name == self.name && matches!(call_kind, CallKind::Halide) {
                    self.found = true;
                }
            }
            for a in args {
                self.mutate_expr(a);
            }
            e.clone()
        }
    }
    impl<'a> StmtMutator for Finder<'a> {
        fn visit_provide(&mut self, s: &Stmt, value: &Expr, args: &[Expr]) -> Stmt {
            if let StmtKind::Provide { name, .. } = &s.kind {
                if name == self.name {
                    self.found = true;
                }
            }
            self.mutate_expr(value);
            for a in args {
                self.mutate_expr(a);
            }
            s.clone()
        }
    }
    let mut f = Finder { name, found: false };
    f.mutate_stmt(s);
    f.found
}

/// Symbolic `[min, extent)` bounds for every pure arg, to be narrowed by
/// bounds inference later in the pipeline.
fn symbolic_bounds(func: &Function) -> Vec<(Expr, Expr)> {
    func.pure_args
        .iter()
        .map(|a| {
            let prefix = format!("{}.", func.name);
            (
                variable(format!("{prefix}{a}.min"), i32ty()),
                variable(format!("{prefix}{a}.extent"), i32ty()),
            )
        })
        .collect()
}

struct InjectRealization<'a> {
    func: &'a Function,
    compute_found: bool,
}

impl<'a> InjectRealization<'a> {
    fn new(func: &'a Function) -> Self {
        InjectRealization {
            func,
            compute_found: false,
        }
    }
}

impl<'a> ExprMutator for InjectRealization<'a> {}

impl<'a> StmtMutator for InjectRealization<'a> {
    fn visit_for(
        &mut self,
        s: &Stmt,
        min: &Expr,
        extent: &Expr,
        for_type: ForType,
        body: &Stmt,
    ) -> Stmt {
        let loop_name = match &s.kind {
            StmtKind::For { name, .. } => name.clone(),
            _ => unreachable!(),
        };

        // Vectorized loops are fully unrolled/vectorized by a later pass;
        // nothing may be injected inside one.
        let mut new_body = if matches!(for_type, ForType::Vectorized) {
            body.clone()
        } else {
            self.mutate_stmt(body)
        };

        if self.func.pure_schedule.compute_level.matches_for_name(&loop_name)
            && references_function(&new_body, &self.func.name)
        {
            let (produce, update) = build_realization(self.func);
            new_body = pipeline(self.func.name.clone(), produce, update, new_body);
            self.compute_found = true;
        }

        if self.func.pure_schedule.store_level.matches_for_name(&loop_name) {
            new_body = realize(
                self.func.name.clone(),
                pure_value_type(self.func),
                symbolic_bounds(self.func),
                new_body,
            );
        }

        for_(
            loop_name,
            self.mutate_expr(min),
            self.mutate_expr(extent),
            for_type,
            new_body,
        )
    }
}

fn pure_value_type(func: &Function) -> Type {
    func.pure_value
        .as_ref()
        .map(|v| v.ty)
        .unwrap_or_else(|| i32ty())
}

/// The output function's own produce/update, with its explicit bounds
/// pinned, as the seed of the lowered tree.
fn create_initial_loop_nest(func: &Function) -> Stmt {
    let (produce, update) = build_realization(func);
    let body = pipeline(func.name.clone(), produce, update, nop());
    inject_explicit_bounds(body, &func.name, &func.pure_schedule)
}

/// Place every function's realization (or inline it), working from the
/// output backward through its producers (spec §4.H.2).
pub fn schedule_functions(
    env: &BTreeMap<String, Function>,
    order: &[String],
    root_name: &str,
) -> Result<Stmt, LowerError> {
    let root_func = env.get(root_name).ok_or_else(|| LowerError::UnknownIdentifier {
        name: root_name.to_string(),
        in_scope: env.keys().cloned().collect(),
    })?;

    let mut body = create_initial_loop_nest(root_func);
    body = for_(SYNTHETIC_ROOT, int32(0), int32(1), ForType::Serial, body);

    for name in order.iter().rev() {
        if name == root_name {
            continue;
        }
        let func = env.get(name).ok_or_else(|| LowerError::UnknownIdentifier {
            name: name.clone(),
            in_scope: env.keys().cloned().collect(),
        })?;

        if func.pure_schedule.compute_level.is_inline() {
            body = inline_function(&body, func);
        } else {
            let mut inj = InjectRealization::new(func);
            body = inj.mutate_stmt(&body);
            if !inj.compute_found {
                return Err(LowerError::ScheduleInconsistency {
                    function: func.name.clone(),
                    detail: format!(
                        "compute_at/compute_root loop level was never reached for `{}`",
                        func.name
                    ),
                });
            }
        }
    }

    match &body.kind {
        StmtKind::For { body: inner, .. } => Ok(inner.clone()),
        _ => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Function {
        let mut f = Function::new(name);
        let x = variable("x", i32ty());
        f.define(vec!["x".into()], x).unwrap();
        f
    }

    #[test]
    fn inline_default_schedule_substitutes_call_away() {
        let mut env = BTreeMap::new();
        env.insert("input".to_string(), leaf("input"));

        let mut g = Function::new("g");
        let x = variable("x", i32ty());
        let call_expr = call(i32ty(), "input", vec![x], CallKind::Halide);
        g.define(vec!["x".into()], add(call_expr, int32(1))).unwrap();
        env.insert("g".to_string(), g);

        let order = vec!["input".to_string(), "g".to_string()];
        let s = schedule_functions(&env, &order, "g").unwrap();
        assert!(!references_function(&s, "input"));
    }

    #[test]
    fn compute_root_injects_a_realize_and_pipeline() {
        let mut env = BTreeMap::new();
        env.insert("input".to_string(), leaf("input"));

        let mut g = Function::new("g");
        let x = variable("x", i32ty());
        let call_expr = call(i32ty(), "input", vec![x], CallKind::Halide);
        g.define(vec!["x".into()], add(call_expr, int32(1))).unwrap();
        env.get_mut("input").unwrap().pure_schedule.compute_root();
        env.insert("g".to_string(), g);

        let order = vec!["input".to_string(), "g".to_string()];
        let s = schedule_functions(&env, &order, "g").unwrap();
        let rendered = format!("{}", s);
        assert!(rendered.contains("realize input"));
        assert!(rendered.contains("produce input"));
    }
}
