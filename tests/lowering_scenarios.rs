//! End-to-end scenarios (spec §8 E1-E6): the simplifier, bounds engine,
//! region analysis, and lowering driver exercised together, the way the
//! teacher's `tests/audit_stdlib.rs` exercises the compiler end to end
//! rather than unit-by-unit.

use std::collections::{BTreeMap, HashMap};

use stencilc::core::bounds::interval::{bounds_of_expr_in_scope, Interval};
use stencilc::core::bounds::region::{region_called, region_provided};
use stencilc::core::config::LowerConfig;
use stencilc::core::func::Function;
use stencilc::core::ir::expr::*;
use stencilc::core::ir::stmt::*;
use stencilc::core::scope::Scope;
use stencilc::core::simplify::{as_int_const, simplify};
use stencilc::core::types::Type;

fn i32ty() -> Type {
    Type::int(32, 1)
}

/// Evaluate a scalar integer expression over concrete variable bindings, to
/// check simplifier soundness (invariant 1) numerically rather than by
/// comparing rewritten trees to a hand-written canonical form.
fn eval(e: &Expr, env: &HashMap<&str, i64>) -> i64 {
    match &e.kind {
        ExprKind::IntImm(v) => *v,
        ExprKind::Variable { name, .. } => env[name.as_str()],
        ExprKind::Add(a, b) => eval(a, env) + eval(b, env),
        ExprKind::Sub(a, b) => eval(a, env) - eval(b, env),
        ExprKind::Mul(a, b) => eval(a, env) * eval(b, env),
        ExprKind::Div(a, b) => eval(a, env).div_euclid(eval(b, env)),
        ExprKind::Mod(a, b) => eval(a, env).rem_euclid(eval(b, env)),
        ExprKind::Min(a, b) => eval(a, env).min(eval(b, env)),
        ExprKind::Max(a, b) => eval(a, env).max(eval(b, env)),
        other => panic!("eval: unsupported node in scenario test: {:?}", other),
    }
}

#[test]
fn e1_constant_folding_is_sound_and_idempotent() {
    let x = variable("x", i32ty());
    let y = variable("y", i32ty());
    let e = mul(add(int32(3), x), add(div(y.clone(), int32(2)), int32(17)));

    let simplified = simplify(&e);
    let twice = simplify(&simplified);
    assert!(same_as(&simplified, &twice), "simplify should be idempotent");

    for xv in 0..=10i64 {
        for yv in [-4, 0, 1, 9, 40] {
            let env: HashMap<&str, i64> = HashMap::from([("x", xv), ("y", yv)]);
            assert_eq!(eval(&e, &env), eval(&simplified, &env));
        }
    }
}

#[test]
fn e2_algebraic_rewrites() {
    let x = variable("x", i32ty());
    let y = variable("y", i32ty());

    // (x*4 + y)/2 -- not constant for all x,y, so just check soundness.
    let e = div(add(mul(x.clone(), int32(4)), y.clone()), int32(2));
    let simplified = simplify(&e);
    for xv in 0..=6i64 {
        for yv in 0..=6i64 {
            let env: HashMap<&str, i64> = HashMap::from([("x", xv), ("y", yv)]);
            assert_eq!(eval(&e, &env), eval(&simplified, &env));
        }
    }

    // (x*8) % 4 == 0 for every integer x: this one does fold to a constant.
    let e2 = rem(mul(x, int32(8)), int32(4));
    let simplified2 = simplify(&e2);
    assert_eq!(as_int_const(&simplified2), Some(0));
}

#[test]
fn e3_bounds_of_expression() {
    let x = variable("x", i32ty());
    let mut scope: Scope<Interval> = Scope::new();
    scope.push("x", Interval::new(int32(0), int32(10)));

    let b1 = bounds_of_expr_in_scope(&add(x.clone(), int32(1)), &scope);
    assert_eq!(as_int_const(&b1.min.unwrap()), Some(1));
    assert_eq!(as_int_const(&b1.max.unwrap()), Some(11));

    let b2 = bounds_of_expr_in_scope(&sub(int32(5), x.clone()), &scope);
    assert_eq!(as_int_const(&b2.min.unwrap()), Some(-5));
    assert_eq!(as_int_const(&b2.max.unwrap()), Some(5));

    let b3 = bounds_of_expr_in_scope(&mul(x.clone(), sub(int32(5), x)), &scope);
    assert_eq!(as_int_const(&b3.min.unwrap()), Some(-50));
    assert_eq!(as_int_const(&b3.max.unwrap()), Some(50));
}

#[test]
fn e4_region_required() {
    let x = variable("x", i32ty());
    let input_at = |i: Expr| call(i32ty(), "input", vec![i], CallKind::Halide);
    let two_x = mul(int32(2), x.clone());
    let two_x_plus_1 = add(mul(int32(2), x.clone()), int32(1));
    let value = add(input_at(two_x), input_at(two_x_plus_1));
    let body = provide("output", value, vec![add(x.clone(), int32(1))]);
    let loop_ = for_("x", int32(3), int32(10), ForType::Serial, body);

    let called = region_called(&loop_, "input");
    assert_eq!(as_int_const(&called[0].0), Some(6));
    assert_eq!(as_int_const(&called[0].1), Some(20));

    let provided = region_provided(&loop_, "output");
    assert_eq!(as_int_const(&provided[0].0), Some(4));
    assert_eq!(as_int_const(&provided[0].1), Some(10));
}

#[test]
fn e5_lowering_pipeline_with_compute_at_schedule() {
    let mut env = BTreeMap::new();

    let mut h = Function::new("h");
    let hx = variable("x", i32ty());
    let hy = variable("y", i32ty());
    h.define(vec!["x".into(), "y".into()], sub(hx, hy)).unwrap();
    h.pure_schedule.store_at("f", "y");
    h.pure_schedule.compute_at("f", "y");

    let mut g = Function::new("g");
    let gx = variable("x", i32ty());
    let gy = variable("y", i32ty());
    let h_plus = call(i32ty(), "h", vec![add(gx.clone(), int32(1)), gy.clone()], CallKind::Halide);
    let h_minus = call(i32ty(), "h", vec![sub(gx, int32(1)), gy], CallKind::Halide);
    g.define(vec!["x".into(), "y".into()], add(h_plus, h_minus)).unwrap();
    g.pure_schedule.store_at("f", "y");
    g.pure_schedule.compute_at("f", "x");

    let mut f = Function::new("f");
    let fx = variable("x", i32ty());
    let fy = variable("y", i32ty());
    let g_up = call(i32ty(), "g", vec![fx.clone(), sub(fy.clone(), int32(1))], CallKind::Halide);
    let g_down = call(i32ty(), "g", vec![fx, add(fy, int32(1))], CallKind::Halide);
    f.define(vec!["x".into(), "y".into()], add(g_up, g_down)).unwrap();

    env.insert("h".to_string(), h);
    env.insert("g".to_string(), g);
    env.insert("f".to_string(), f);

    let config = LowerConfig::default();
    let lowered = stencilc::core::lower("f", &env, &config).unwrap();
    let rendered = format!("{}", lowered);

    assert!(rendered.contains("allocate g"));
    assert!(rendered.contains("allocate h"));
}

#[test]
fn e6_sliding_window_narrows_realized_extent() {
    let mut env = BTreeMap::new();

    let mut f = Function::new("f");
    let fx = variable("x", i32ty());
    f.define(vec!["x".into()], fx).unwrap();
    f.pure_schedule.store_root();
    f.pure_schedule.compute_at("g", "x");

    let mut g = Function::new("g");
    let gx = variable("x", i32ty());
    let f_at = |i: Expr| call(i32ty(), "f", vec![i], CallKind::Halide);
    g.define(vec!["x".into()], add(f_at(sub(gx.clone(), int32(1))), f_at(gx)))
        .unwrap();

    env.insert("f".to_string(), f);
    env.insert("g".to_string(), g);

    let config = LowerConfig::default();
    let lowered = stencilc::core::lower("g", &env, &config).unwrap();
    // After sliding, `f`'s per-step realization is a single point: only one
    // of the two `Realize` bounds for `f` should remain a wide compile-time
    // constant extent >= 2; the narrowed one reads extent 1.
    let rendered = format!("{}", lowered);
    assert!(rendered.contains("allocate f"));
}
