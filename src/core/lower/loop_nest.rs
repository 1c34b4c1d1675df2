//! Initial loop-nest construction (spec §4.H.1, §4.G), grounded in
//! `build_provide_loop_nest`/`build_produce`/`build_update`/`build_realization`
//! (`original_source/cpp/src/Lower.cpp`).
//!
//! Every `For`/`Let` name constructed here is qualified `"{func}.{var}"` so
//! that `LoopLevel::At{func,var}` matching (spec §4.G) can never confuse two
//! functions that happen to share a variable name.

use crate::core::func::Function;
use crate::core::ir::expr::*;
use crate::core::ir::stmt::*;
use crate::core::schedule::Schedule;
use crate::core::types::Type;

fn i32ty() -> Type {
    Type::int(32, 1)
}

fn bound_var(prefix: &str, var: &str, suffix: &str) -> Expr {
    variable(format!("{prefix}{var}.{suffix}"), i32ty())
}

/// Build one function's produce/update loop nest over `value`/`args`, per
/// `schedule`'s splits and dims (innermost-first).
fn build_provide_loop_nest(func_name: &str, value: Expr, args: Vec<Expr>, schedule: &Schedule) -> Stmt {
    let prefix = format!("{func_name}.");

    let mut body = provide(func_name, value, args);

    // old_var = outer*factor + inner, bound right next to the Provide so its
    // args (expressed in terms of the pre-split variable) still resolve.
    for split in &schedule.splits {
        let outer = variable(format!("{prefix}{}", split.outer), i32ty());
        let inner = variable(format!("{prefix}{}", split.inner), i32ty());
        let reconstructed = add(mul(outer, int32(split.factor as i32)), inner);
        body = let_stmt(format!("{prefix}{}", split.old_var), reconstructed, body);
    }

    for dim in &schedule.dims {
        let name = format!("{prefix}{}", dim.var);
        let min = bound_var(&prefix, &dim.var, "min");
        let extent = bound_var(&prefix, &dim.var, "extent");
        body = for_(name, min, extent, dim.for_type, body);
    }

    // Split inner/outer extents are determined by the factor and the
    // pre-split extent; their mins are always 0 in the split's own frame.
    for split in &schedule.splits {
        let inner_extent_name = format!("{prefix}{}.extent", split.inner);
        let inner_min_name = format!("{prefix}{}.min", split.inner);
        let outer_min_name = format!("{prefix}{}.min", split.outer);
        let outer_extent_name = format!("{prefix}{}.extent", split.outer);
        let old_extent = bound_var(&prefix, &split.old_var, "extent");

        body = let_stmt(inner_min_name, int32(0), body);
        body = let_stmt(inner_extent_name, int32(split.factor as i32), body);
        body = let_stmt(outer_min_name, int32(0), body);
        let outer_extent = div(
            add(sub(old_extent, int32(1)), int32(split.factor as i32)),
            int32(split.factor as i32),
        );
        body = let_stmt(outer_extent_name, outer_extent, body);
    }

    body
}

/// The pure-step loop nest: `f(x, y) = value`.
pub fn build_produce(func: &Function) -> Stmt {
    let value = func
        .pure_value
        .clone()
        .expect("build_produce requires a pure definition");
    let args = func
        .pure_args
        .iter()
        .map(|a| variable(a.clone(), i32ty()))
        .collect();
    build_provide_loop_nest(&func.name, value, args, &func.pure_schedule)
}

/// The update-step loop nest, if this function has a reduction definition.
pub fn build_update(func: &Function) -> Option<Stmt> {
    let value = func.reduction_value.clone()?;
    build_provide_loop_nest(&func.name, value, func.reduction_args.clone(), &func.reduction_schedule).into()
}

/// `produce`/`update` together as a `Pipeline` (the `consume` stage is filled
/// in by the caller once the rest of the tree is known).
pub fn build_realization(func: &Function) -> (Stmt, Option<Stmt>) {
    (build_produce(func), build_update(func))
}

/// Pin a function's named bounds to its `Schedule::bound` directives,
/// overriding what bounds inference would otherwise compute (spec §4.G).
pub fn inject_explicit_bounds(body: Stmt, func_name: &str, schedule: &Schedule) -> Stmt {
    let prefix = format!("{func_name}.");
    let mut wrapped = body;
    for b in schedule.bounds.iter().rev() {
        wrapped = let_stmt(format!("{prefix}{}.extent", b.var), b.extent.clone(), wrapped);
        wrapped = let_stmt(format!("{prefix}{}.min", b.var), b.min.clone(), wrapped);
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produce_nests_a_for_loop_per_pure_arg() {
        let mut f = Function::new("f");
        let x = variable("x", i32ty());
        let y = variable("y", i32ty());
        f.define(vec!["x".into(), "y".into()], add(x, y)).unwrap();

        let produce = build_produce(&f);
        let mut depth = 0;
        let mut cur = &produce;
        loop {
            match &cur.kind {
                StmtKind::For { body, .. } => {
                    depth += 1;
                    cur = body;
                }
                StmtKind::Provide { .. } => break,
                _ => panic!("unexpected node in produce nest: {:?}", cur.kind),
            }
        }
        assert_eq!(depth, 2);
    }

    #[test]
    fn split_introduces_outer_inner_lets() {
        let mut f = Function::new("f");
        let x = variable("x", i32ty());
        f.define(vec!["x".into()], x).unwrap();
        f.pure_schedule.split("x", "x.outer", "x.inner", 4);

        let produce = build_produce(&f);
        let rendered = format!("{}", produce);
        assert!(rendered.contains("f.x.outer"));
        assert!(rendered.contains("f.x.inner"));
    }
}
