//! The lowering driver (spec §4.H): turns a pipeline of `Function`
//! definitions into a single flat `Stmt` ready for a backend, by running the
//! pass pipeline grounded in `Halide::Internal::lower`
//! (`original_source/cpp/src/Lower.cpp`) in its original order:
//!
//! environment -> schedule_functions -> tracing -> image checks -> bounds
//! inference -> sliding window -> storage folding -> storage flattening ->
//! vectorize -> unroll -> rewrite interleavings -> cleanup, with a
//! `simplify_stmt` pass after every stage that can introduce redundant
//! arithmetic (matching the original's habit of interleaving `simplify`
//! calls through the pipeline rather than running it once at the end).
//!
//! The original's `debug_to_file` step has no counterpart here: this core
//! has no on-disk IR dump format, and the closest analogue
//! (`LowerConfig::debug_log`) already gives callers a text trace of each
//! stage without a file-format commitment.

mod bounds_inference;
mod cleanup;
mod environment;
mod image_checks;
mod inject;
mod inline;
mod interleave;
mod loop_nest;
mod rename;
mod sliding_window;
mod storage_flattening;
mod storage_folding;
mod tracing;
mod unroll;
mod vectorize;

use std::collections::BTreeMap;

use crate::core::config::LowerConfig;
use crate::core::diagnostic::LowerError;
use crate::core::func::Function;
use crate::core::ir::stmt::Stmt;
use crate::core::simplify::simplify_stmt;

use environment::{reachable_functions, realization_order};
use inject::schedule_functions;

/// Lower `root_name` (and everything it transitively calls) from `universe`
/// into a single flat statement, per `config`.
pub fn lower(
    root_name: &str,
    universe: &BTreeMap<String, Function>,
    config: &LowerConfig,
) -> Result<Stmt, LowerError> {
    config.debug_log(1, || format!("lowering `{}`", root_name));

    let env = reachable_functions(universe, root_name)?;
    let order = realization_order(universe, root_name, &env)?;
    config.debug_log(2, || format!("realization order: {:?}", order));

    let mut s = schedule_functions(universe, &order, root_name)?;
    s = tracing::inject_tracing(&s, config);
    s = image_checks::add_image_checks(s, root_name, config);
    s = bounds_inference::bounds_inference(&s);
    s = simplify_stmt(&s);

    s = sliding_window::sliding_window(&s);
    s = simplify_stmt(&s);

    s = storage_folding::storage_folding(&s);
    s = storage_flattening::storage_flattening(&s);
    s = simplify_stmt(&s);

    s = vectorize::vectorize_loops(&s);
    s = unroll::unroll_loops(&s);
    s = simplify_stmt(&s);

    s = interleave::rewrite_interleavings(&s);
    s = simplify_stmt(&s);

    s = cleanup::remove_trivial_for_loops(&s);
    s = cleanup::remove_dead_lets(&s);

    config.debug_log(1, || "lowering complete".to_string());
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::expr::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn lowers_a_single_inline_function_to_a_bare_store() {
        let mut env = BTreeMap::new();
        let mut f = Function::new("f");
        let x = variable("x", i32ty());
        f.define(vec!["x".into()], add(x, int32(1))).unwrap();
        env.insert("f".to_string(), f);

        let config = LowerConfig::default();
        let lowered = lower("f", &env, &config).unwrap();
        let rendered = format!("{}", lowered);
        assert!(rendered.contains("f["));
    }

    #[test]
    fn two_stage_pipeline_lowers_without_error() {
        let mut env = BTreeMap::new();

        let mut input = Function::new("input");
        let x = variable("x", i32ty());
        input.define(vec!["x".into()], x).unwrap();
        env.insert("input".to_string(), input);

        let mut blur = Function::new("blur");
        let x2 = variable("x", i32ty());
        let call_expr = call(i32ty(), "input", vec![x2.clone()], CallKind::Halide);
        blur.define(vec!["x".into()], add(call_expr, int32(1))).unwrap();
        env.get_mut("input").unwrap().pure_schedule.compute_root();
        env.insert("blur".to_string(), blur);

        let config = LowerConfig::default();
        let lowered = lower("blur", &env, &config).unwrap();
        let rendered = format!("{}", lowered);
        assert!(rendered.contains("allocate input"));
    }

    #[test]
    fn unknown_root_is_reported() {
        let env: BTreeMap<String, Function> = BTreeMap::new();
        let config = LowerConfig::default();
        let err = lower("missing", &env, &config).unwrap_err();
        assert!(matches!(err, LowerError::UnknownIdentifier { .. }));
    }
}
