//! Environment construction and realization order (spec §4.H.1–2), grounded
//! in `populate_environment`/`realization_order` (`original_source/cpp/src/Lower.cpp`).
//! Maps are `BTreeMap`/`BTreeSet` throughout so that iteration order is
//! deterministic (spec §9 design note).

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::diagnostic::LowerError;
use crate::core::func::Function;
use crate::core::ir::expr::{CallKind, Expr, ExprKind};

fn find_calls(e: &Expr, out: &mut BTreeSet<String>) {
    match &e.kind {
        ExprKind::Call { name, args, call_kind } => {
            if matches!(call_kind, CallKind::Halide) {
                out.insert(name.clone());
            }
            for a in args {
                find_calls(a, out);
            }
        }
        ExprKind::Cast { value } => find_calls(value, out),
        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Min(a, b)
        | ExprKind::Max(a, b)
        | ExprKind::EQ(a, b)
        | ExprKind::NE(a, b)
        | ExprKind::LT(a, b)
        | ExprKind::LE(a, b)
        | ExprKind::GT(a, b)
        | ExprKind::GE(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b) => {
            find_calls(a, out);
            find_calls(b, out);
        }
        ExprKind::Not(a) => find_calls(a, out),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => {
            find_calls(cond, out);
            find_calls(true_value, out);
            find_calls(false_value, out);
        }
        ExprKind::Load { index, .. } => find_calls(index, out),
        ExprKind::Ramp { base, stride, .. } => {
            find_calls(base, out);
            find_calls(stride, out);
        }
        ExprKind::Broadcast { value, .. } => find_calls(value, out),
        ExprKind::Let { value, body, .. } => {
            find_calls(value, out);
            find_calls(body, out);
        }
        ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::Variable { .. } => {}
    }
}

/// Every function this one calls directly (pure value, plus reduction value
/// and reduction args if it has an update step).
pub fn direct_callees(f: &Function) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    if let Some(v) = &f.pure_value {
        find_calls(v, &mut out);
    }
    if let Some(v) = &f.reduction_value {
        find_calls(v, &mut out);
    }
    for a in &f.reduction_args {
        find_calls(a, &mut out);
    }
    out
}

/// The transitive closure of functions reachable from `root` (spec §4.H.1).
pub fn reachable_functions(
    universe: &BTreeMap<String, Function>,
    root: &str,
) -> Result<BTreeSet<String>, LowerError> {
    let mut seen = BTreeSet::new();
    let mut frontier = vec![root.to_string()];
    while let Some(name) = frontier.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let f = universe.get(&name).ok_or_else(|| LowerError::UnknownIdentifier {
            name: name.clone(),
            in_scope: universe.keys().cloned().collect(),
        })?;
        for callee in direct_callees(f) {
            if !seen.contains(&callee) {
                frontier.push(callee);
            }
        }
    }
    Ok(seen)
}

/// Topological sort of `env` so dependencies precede dependents; the output
/// function is last (spec §4.H.2).
pub fn realization_order(
    universe: &BTreeMap<String, Function>,
    root: &str,
    env: &BTreeSet<String>,
) -> Result<Vec<String>, LowerError> {
    let mut graph = DiGraph::<String, ()>::new();
    let mut idx: BTreeMap<String, NodeIndex> = BTreeMap::new();
    for name in env {
        idx.insert(name.clone(), graph.add_node(name.clone()));
    }
    for name in env {
        let f = &universe[name];
        for callee in direct_callees(f) {
            if env.contains(&callee) && callee != *name {
                graph.add_edge(idx[&callee], idx[name], ());
            }
        }
    }
    let sorted = toposort(&graph, None).map_err(|cycle| LowerError::ShapeMismatch {
        function: graph[cycle.node_id()].clone(),
        detail: "pipeline contains a call cycle".into(),
    })?;
    let order: Vec<String> = sorted.into_iter().map(|i| graph[i].clone()).collect();
    if order.last().map(String::as_str) != Some(root) {
        // The root has no dependents within the reachable set, so a correct
        // topological sort already places it last; this only fires if the
        // root is (degenerately) also a dependency of something else in env.
        return Err(LowerError::ShapeMismatch {
            function: root.to_string(),
            detail: "root function is not last in its own realization order".into(),
        });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::expr::*;
    use crate::core::types::Type;

    fn leaf(name: &str) -> Function {
        let mut f = Function::new(name);
        let x = variable("x", Type::int(32, 1));
        f.define(vec!["x".into()], x).unwrap();
        f
    }

    #[test]
    fn reachable_functions_follows_calls() {
        let mut universe = BTreeMap::new();
        universe.insert("input".to_string(), leaf("input"));
        let mut g = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let call = call(Type::int(32, 1), "input", vec![x.clone()], CallKind::Halide);
        g.define(vec!["x".into()], add(call, int32(1))).unwrap();
        universe.insert("g".to_string(), g);

        let env = reachable_functions(&universe, "g").unwrap();
        assert!(env.contains("input"));
        assert!(env.contains("g"));
    }

    #[test]
    fn realization_order_puts_dependencies_first() {
        let mut universe = BTreeMap::new();
        universe.insert("input".to_string(), leaf("input"));
        let mut g = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let call = call(Type::int(32, 1), "input", vec![x.clone()], CallKind::Halide);
        g.define(vec!["x".into()], add(call, int32(1))).unwrap();
        universe.insert("g".to_string(), g);

        let env = reachable_functions(&universe, "g").unwrap();
        let order = realization_order(&universe, "g", &env).unwrap();
        assert_eq!(order, vec!["input".to_string(), "g".to_string()]);
    }
}
