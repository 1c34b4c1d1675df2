//! Region analysis (spec §4.F.2), grounded in Halide's `RegionTouched`
//! visitor (`original_source/cpp/src/Bounds.cpp`): walk a `Stmt`, and for
//! every `Call`/`Provide` to a tracked function accumulate one `Interval`
//! per argument position, unioning across every call site found. A `Region`
//! is the resulting per-dimension box converted to `(min, extent)` pairs
//! (`interval_to_range` in the original).

use std::collections::HashMap;

use crate::core::bounds::interval::{bounds_of_expr_in_scope, interval_union, Interval};
use crate::core::ir::expr::*;
use crate::core::ir::stmt::{Stmt, StmtKind};
use crate::core::scope::Scope;
use crate::core::simplify::simplify;

/// One `(min, extent)` pair per dimension of a function's footprint.
pub type Region = Vec<(Expr, Expr)>;

pub fn region_union(a: &Region, b: &Region) -> Region {
    let len = a.len().max(b.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => {
                let ia = Interval::new(x.0.clone(), simplify(&sub(add(x.0.clone(), x.1.clone()), int32(1))));
                let ib = Interval::new(y.0.clone(), simplify(&sub(add(y.0.clone(), y.1.clone()), int32(1))));
                out.push(interval_to_range(&interval_union(&ia, &ib)));
            }
            (Some(x), None) => out.push(x.clone()),
            (None, Some(y)) => out.push(y.clone()),
            (None, None) => unreachable!(),
        }
    }
    out
}

/// Convert `(min, max)` to `(min, extent)`, per `interval_to_range`.
fn interval_to_range(i: &Interval) -> (Expr, Expr) {
    match (&i.min, &i.max) {
        (Some(min), Some(max)) => (
            simplify(min),
            simplify(&sub(add(max.clone(), int32(1)), min.clone())),
        ),
        _ => (int32(0), int32(0)),
    }
}

struct RegionTouched {
    func: Option<String>,
    consider_calls: bool,
    consider_provides: bool,
    regions: HashMap<String, Vec<Interval>>,
    region: Vec<Interval>,
    scope: Scope<Interval>,
    inside_update: Scope<()>,
}

impl RegionTouched {
    fn box_for<'a>(&'a mut self, name: &str) -> &'a mut Vec<Interval> {
        match &self.func {
            Some(_) => &mut self.region,
            None => self.regions.entry(name.to_string()).or_default(),
        }
    }

    fn record_args(&mut self, name: &str, args: &[Expr]) {
        let bounds: Vec<Interval> = args
            .iter()
            .map(|a| bounds_of_expr_in_scope(a, &self.scope))
            .collect();
        let r = self.box_for(name);
        for (i, b) in bounds.into_iter().enumerate() {
            if i < r.len() {
                r[i] = interval_union(&r[i], &b);
            } else {
                r.push(b);
            }
        }
    }

    fn walk_expr(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Call { name, args, call_kind } => {
                for a in args {
                    self.walk_expr(a);
                }
                if self.consider_calls
                    && !self.inside_update.contains(name)
                    && self.func.as_deref().map_or(true, |f| f == name)
                    && matches!(call_kind, CallKind::Halide)
                {
                    self.record_args(name, args);
                }
            }
            ExprKind::Cast { value } => self.walk_expr(value),
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
                self.walk_expr(a);
                self.walk_expr(b);
            }
            ExprKind::Not(a) => self.walk_expr(a),
            ExprKind::Select {
                cond,
                true_value,
                false_value,
            } => {
                self.walk_expr(cond);
                self.walk_expr(true_value);
                self.walk_expr(false_value);
            }
            ExprKind::Load { index, .. } => self.walk_expr(index),
            ExprKind::Ramp { base, stride, .. } => {
                self.walk_expr(base);
                self.walk_expr(stride);
            }
            ExprKind::Broadcast { value, .. } => self.walk_expr(value),
            ExprKind::Let { name, value, body } => {
                self.walk_expr(value);
                let vb = bounds_of_expr_in_scope(value, &self.scope);
                self.scope.push(name.clone(), vb);
                self.walk_expr(body);
                self.scope.pop(name);
            }
            ExprKind::IntImm(_) | ExprKind::FloatImm(_) | ExprKind::Variable { .. } => {}
        }
    }

    fn walk_stmt(&mut self, s: &Stmt) {
        match &s.kind {
            StmtKind::Nop | StmtKind::PrintStmt { .. } => {}
            StmtKind::LetStmt { name, value, body } => {
                self.walk_expr(value);
                let vb = bounds_of_expr_in_scope(value, &self.scope);
                self.scope.push(name.clone(), vb);
                self.walk_stmt(body);
                self.scope.pop(name);
            }
            StmtKind::AssertStmt { condition, .. } => self.walk_expr(condition),
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.walk_stmt(s);
                }
            }
            StmtKind::For {
                name,
                min,
                extent,
                body,
                ..
            } => {
                self.walk_expr(min);
                self.walk_expr(extent);
                let mb = bounds_of_expr_in_scope(min, &self.scope);
                let eb = bounds_of_expr_in_scope(extent, &self.scope);
                let lo = mb.min.clone();
                let hi = match (mb.max, eb.max) {
                    (Some(mmax), Some(emax)) => Some(simplify(&sub(add(mmax, emax), int32(1)))),
                    _ => None,
                };
                self.scope.push(name.clone(), Interval { min: lo, max: hi });
                self.walk_stmt(body);
                self.scope.pop(name);
            }
            StmtKind::Store { value, index, .. } => {
                self.walk_expr(value);
                self.walk_expr(index);
            }
            StmtKind::Provide { name, value, args } => {
                self.walk_expr(value);
                for a in args {
                    self.walk_expr(a);
                }
                if self.consider_provides && self.func.as_deref().map_or(true, |f| f == name) {
                    self.record_args(name, args);
                }
            }
            StmtKind::Allocate { size, body, .. } => {
                self.walk_expr(size);
                self.walk_stmt(body);
            }
            StmtKind::Realize { bounds, body, .. } => {
                for (min, extent) in bounds {
                    self.walk_expr(min);
                    self.walk_expr(extent);
                }
                self.walk_stmt(body);
            }
            StmtKind::Pipeline {
                name,
                produce,
                update,
                consume,
            } => {
                self.walk_stmt(produce);
                if let Some(u) = update {
                    self.inside_update.push(name.clone(), ());
                    self.walk_stmt(u);
                    self.inside_update.pop(name);
                }
                self.walk_stmt(consume);
            }
        }
    }
}

fn compute(s: &Stmt, consider_calls: bool, consider_provides: bool, func: Option<&str>) -> RegionTouched {
    let mut r = RegionTouched {
        func: func.map(str::to_string),
        consider_calls,
        consider_provides,
        regions: HashMap::new(),
        region: Vec::new(),
        scope: Scope::new(),
        inside_update: Scope::new(),
    };
    r.walk_stmt(s);
    r
}

fn box_to_region(box_: &[Interval]) -> Region {
    box_.iter().map(interval_to_range).collect()
}

pub fn region_touched(s: &Stmt, func: &str) -> Region {
    let r = compute(s, true, true, Some(func));
    box_to_region(&r.region)
}

pub fn region_provided(s: &Stmt, func: &str) -> Region {
    let r = compute(s, false, true, Some(func));
    box_to_region(&r.region)
}

pub fn region_called(s: &Stmt, func: &str) -> Region {
    let r = compute(s, true, false, Some(func));
    box_to_region(&r.region)
}

pub fn regions_touched(s: &Stmt) -> HashMap<String, Region> {
    let r = compute(s, true, true, None);
    r.regions
        .iter()
        .map(|(k, v)| (k.clone(), box_to_region(v)))
        .collect()
}

pub fn regions_provided(s: &Stmt) -> HashMap<String, Region> {
    let r = compute(s, false, true, None);
    r.regions
        .iter()
        .map(|(k, v)| (k.clone(), box_to_region(v)))
        .collect()
}

pub fn regions_called(s: &Stmt) -> HashMap<String, Region> {
    let r = compute(s, true, false, None);
    r.regions
        .iter()
        .map(|(k, v)| (k.clone(), box_to_region(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::stmt::*;
    use crate::core::simplify::as_int_const;
    use crate::core::types::Type;

    #[test]
    fn provide_footprint_is_the_loop_range() {
        let x = variable("x", Type::int(32, 1));
        let body = provide("out", int32(1), vec![x]);
        let loop_ = for_("x", int32(0), int32(10), ForType::Serial, body);
        let region = region_provided(&loop_, "out");
        assert_eq!(region.len(), 1);
        let (min, extent) = &region[0];
        assert_eq!(as_int_const(min), Some(0));
        assert_eq!(as_int_const(extent), Some(10));
    }

    #[test]
    fn call_footprint_widens_across_multiple_sites() {
        let input_at = |i: Expr| call(Type::int(32, 1), "input", vec![i], CallKind::Halide);
        let x = variable("x", Type::int(32, 1));
        let body = block(vec![
            provide("out", input_at(x.clone()), vec![x.clone()]),
            provide("out2", input_at(add(x.clone(), int32(1))), vec![x]),
        ]);
        let loop_ = for_("x", int32(0), int32(10), ForType::Serial, body);
        let region = region_called(&loop_, "input");
        assert_eq!(region.len(), 1);
        let (min, extent) = &region[0];
        assert_eq!(as_int_const(min), Some(0));
        assert_eq!(as_int_const(extent), Some(10));
    }

    #[test]
    fn region_union_widens_to_cover_both() {
        let a: Region = vec![(int32(2), int32(3))]; // [2, 4]
        let b: Region = vec![(int32(0), int32(2))]; // [0, 1]
        let u = region_union(&a, &b);
        assert_eq!(as_int_const(&u[0].0), Some(0));
        assert_eq!(as_int_const(&u[0].1), Some(5));
    }
}
