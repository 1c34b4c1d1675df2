//! Execution tracing (spec §4.H), grounded in `InjectTracing`
//! (`original_source/cpp/src/Tracing.cpp`): at `trace_level >= 1`, wrap every
//! `Pipeline`/`Realize` with `PrintStmt`s announcing produce/update/consume
//! and realization bounds; at `>= 2` also descend into `For` loop bodies
//! (below that, a loop's body is left entirely untouched, matching the
//! original's early return); at `>= 3` also announce every `Provide`.

use crate::core::config::LowerConfig;
use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

fn current_time() -> Expr {
    call(Type_int32(), "halide_current_time", Vec::new(), CallKind::Extern)
}

#[allow(non_snake_case)]
fn Type_int32() -> crate::core::types::Type {
    crate::core::types::Type::int(32, 1)
}

struct InjectTracing<'a> {
    config: &'a LowerConfig,
}

impl<'a> ExprMutator for InjectTracing<'a> {}

impl<'a> StmtMutator for InjectTracing<'a> {
    fn visit_provide(&mut self, s: &Stmt, value: &Expr, args: &[Expr]) -> Stmt {
        // `Provide` has no nested statements, only expression children we
        // never rewrite here, so the untraced case is just `s` itself.
        let base = s.clone();
        if !self.config.trace_level.traces_provides() {
            return base;
        }
        let name = match &s.kind {
            StmtKind::Provide { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        let mut print_args: Vec<Expr> = args.to_vec();
        print_args.push(value.clone());
        let print = print_stmt(format!("Provide {}", name), print_args);
        block(vec![print, base])
    }

    fn visit_realize(&mut self, s: &Stmt, bounds: &[(Expr, Expr)], body: &Stmt) -> Stmt {
        let nbody = self.mutate_stmt(body);
        let (name, ty) = match &s.kind {
            StmtKind::Realize { name, ty, .. } => (name.clone(), *ty),
            _ => unreachable!(),
        };
        if !self.config.trace_level.traces_realizations() {
            return realize(name, ty, bounds.to_vec(), nbody);
        }
        let mut print_args: Vec<Expr> = Vec::new();
        for (min_e, extent_e) in bounds {
            print_args.push(min_e.clone());
            print_args.push(extent_e.clone());
        }
        let print = print_stmt(format!("Realizing {} over ", name), print_args);
        let start_time = print_stmt(format!("Starting realization of {} at time ", name), vec![current_time()]);
        let traced_body = block(vec![start_time, print, nbody]);
        realize(name, ty, bounds.to_vec(), traced_body)
    }

    fn visit_pipeline(&mut self, s: &Stmt, produce: &Stmt, update: &Option<Stmt>, consume: &Stmt) -> Stmt {
        let name = match &s.kind {
            StmtKind::Pipeline { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        if !self.config.trace_level.traces_realizations() {
            let np = self.mutate_stmt(produce);
            let nu = update.as_ref().map(|u| self.mutate_stmt(u));
            let nc = self.mutate_stmt(consume);
            return pipeline(name, np, nu, nc);
        }
        let np = self.mutate_stmt(produce);
        let nu = update.as_ref().map(|u| self.mutate_stmt(u));
        let nc = self.mutate_stmt(consume);
        let print_produce = print_stmt(format!("Producing {} at time ", name), vec![current_time()]);
        let print_update = print_stmt(format!("Updating {} at time ", name), vec![current_time()]);
        let print_consume = print_stmt(format!("Consuming {} at time ", name), vec![current_time()]);
        let traced_produce = block(vec![print_produce, np]);
        let traced_update = nu.map(|u| block(vec![print_update, u]));
        let traced_consume = block(vec![print_consume, nc]);
        pipeline(name, traced_produce, traced_update, traced_consume)
    }

    fn visit_for(&mut self, s: &Stmt, min: &Expr, extent: &Expr, for_type: ForType, body: &Stmt) -> Stmt {
        if !self.config.trace_level.traces_for_loops() {
            return s.clone();
        }
        let nbody = self.mutate_stmt(body);
        let name = match &s.kind {
            StmtKind::For { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        for_(name, min.clone(), extent.clone(), for_type, nbody)
    }
}

/// Inject `PrintStmt`/`AssertStmt` tracing wherever `config.trace_level`
/// calls for it, and (at any non-`None` level) wrap the whole program with a
/// clock start/stop pair.
pub fn inject_tracing(s: &Stmt, config: &LowerConfig) -> Stmt {
    let mut t = InjectTracing { config };
    let traced = t.mutate_stmt(s);
    if !config.trace_level.traces_realizations() {
        return traced;
    }
    let start_clock_call = call(Type_int32(), "halide_start_clock", Vec::new(), CallKind::Extern);
    let start_clock = assert_stmt(eq(start_clock_call, int32(0)), "Failed to start clock");
    let print_final_time = print_stmt("Total time: ", vec![current_time()]);
    block(vec![start_clock, traced, print_final_time])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TraceLevel;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn untraced_config_leaves_the_tree_alone() {
        let config = LowerConfig::default();
        let body = provide("f", int32(1), vec![variable("x", i32ty())]);
        let realized = realize("f", i32ty(), vec![(int32(0), int32(10))], body);
        let traced = inject_tracing(&realized, &config);
        assert!(crate::core::ir::stmt::same_as(&traced, &realized));
    }

    #[test]
    fn level_one_wraps_realize_and_the_whole_program() {
        let mut config = LowerConfig::default();
        config.trace_level = TraceLevel::RealizationsAndPipelines;
        let body = provide("f", int32(1), vec![variable("x", i32ty())]);
        let realized = realize("f", i32ty(), vec![(int32(0), int32(10))], body);
        let traced = inject_tracing(&realized, &config);
        let rendered = format!("{}", traced);
        assert!(rendered.contains("Realizing f over"));
        assert!(rendered.contains("Total time"));
    }

    #[test]
    fn level_three_also_traces_provide() {
        let mut config = LowerConfig::default();
        config.trace_level = TraceLevel::AlsoProvides;
        let body = provide("f", int32(1), vec![variable("x", i32ty())]);
        let traced = inject_tracing(&body, &config);
        let rendered = format!("{}", traced);
        assert!(rendered.contains("Provide f"));
    }
}
