//! Symbolic interval arithmetic (spec §4.F.1), grounded in Halide's
//! `struct Interval { Expr min, max; }` (`original_source/cpp/src/Bounds.h`):
//! bounds are themselves `Expr`s, not concrete integers, so "the bound of
//! `x` is `x`" is exact and "the bound of `x + n` for unknown `n`" is still
//! expressible as `min(x) + min(n)`. `None` means unbounded in that
//! direction.

use crate::core::ir::expr::*;
use crate::core::scope::Scope;
use crate::core::simplify::simplify;

#[derive(Clone, Debug)]
pub struct Interval {
    pub min: Option<Expr>,
    pub max: Option<Expr>,
}

impl Interval {
    pub fn new(min: Expr, max: Expr) -> Interval {
        Interval {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn single(point: Expr) -> Interval {
        Interval::new(point.clone(), point)
    }

    pub fn everything() -> Interval {
        Interval {
            min: None,
            max: None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn is_single_point(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn union_endpoint(a: Option<Expr>, b: Option<Expr>, wider: fn(Expr, Expr) -> Expr) -> Option<Expr> {
    match (a, b) {
        (Some(a), Some(b)) => Some(simplify(&wider(a, b))),
        _ => None,
    }
}

/// The smallest interval containing both `a` and `b`.
pub fn interval_union(a: &Interval, b: &Interval) -> Interval {
    Interval {
        min: union_endpoint(a.min.clone(), b.min.clone(), min),
        max: union_endpoint(a.max.clone(), b.max.clone(), max),
    }
}

/// Bounds of `e` given bounds for its free variables, per
/// `bounds_of_expr_in_scope`.
pub fn bounds_of_expr_in_scope(e: &Expr, scope: &Scope<Interval>) -> Interval {
    match &e.kind {
        ExprKind::IntImm(_) | ExprKind::FloatImm(_) => Interval::single(e.clone()),
        ExprKind::Variable { name, .. } => scope
            .get(name)
            .cloned()
            .unwrap_or_else(Interval::everything),
        ExprKind::Cast { value } => {
            let inner = bounds_of_expr_in_scope(value, scope);
            Interval {
                min: inner.min.map(|m| simplify(&cast(e.ty, m))),
                max: inner.max.map(|m| simplify(&cast(e.ty, m))),
            }
        }
        ExprKind::Add(a, b) => monotone_binop(a, b, scope, add, add),
        ExprKind::Sub(a, b) => {
            let ia = bounds_of_expr_in_scope(a, scope);
            let ib = bounds_of_expr_in_scope(b, scope);
            Interval {
                min: combine(ia.min, ib.max, sub),
                max: combine(ia.max, ib.min, sub),
            }
        }
        ExprKind::Mul(a, b) => mul_bounds(a, b, scope),
        ExprKind::Min(a, b) => monotone_binop(a, b, scope, min, min),
        ExprKind::Max(a, b) => monotone_binop(a, b, scope, max, max),
        ExprKind::Let { name, value, body } => {
            let iv = bounds_of_expr_in_scope(value, scope);
            let mut inner = scope.clone();
            inner.push(name.clone(), iv);
            bounds_of_expr_in_scope(body, &inner)
        }
        ExprKind::Select {
            true_value,
            false_value,
            ..
        } => {
            let it = bounds_of_expr_in_scope(true_value, scope);
            let if_ = bounds_of_expr_in_scope(false_value, scope);
            interval_union(&it, &if_)
        }
        ExprKind::Ramp { base, stride, width } => {
            let ib = bounds_of_expr_in_scope(base, scope);
            // base + stride*(width-1), bounds over both endpoints of base
            let hi_offset = mul(stride.clone(), int_imm((*width as i64) - 1, stride.ty));
            match (ib.min, ib.max) {
                (Some(mn), Some(mx)) => {
                    let a_end = simplify(&add(mn.clone(), hi_offset.clone()));
                    let b_end = simplify(&add(mx, hi_offset));
                    Interval::new(
                        simplify(&min(mn, a_end.clone())),
                        simplify(&max(a_end, b_end)),
                    )
                }
                _ => Interval::everything(),
            }
        }
        ExprKind::Broadcast { value, .. } => bounds_of_expr_in_scope(value, scope),
        _ => Interval::everything(),
    }
}

/// `bounds_of_expr_in_scope` with an empty scope.
pub fn bounds_of_expr(e: &Expr) -> Interval {
    bounds_of_expr_in_scope(e, &Scope::new())
}

fn combine(a: Option<Expr>, b: Option<Expr>, f: fn(Expr, Expr) -> Expr) -> Option<Expr> {
    match (a, b) {
        (Some(a), Some(b)) => Some(simplify(&f(a, b))),
        _ => None,
    }
}

fn monotone_binop(
    a: &Expr,
    b: &Expr,
    scope: &Scope<Interval>,
    lo: fn(Expr, Expr) -> Expr,
    hi: fn(Expr, Expr) -> Expr,
) -> Interval {
    let ia = bounds_of_expr_in_scope(a, scope);
    let ib = bounds_of_expr_in_scope(b, scope);
    Interval {
        min: combine(ia.min, ib.min, lo),
        max: combine(ia.max, ib.max, hi),
    }
}

fn mul_bounds(a: &Expr, b: &Expr, scope: &Scope<Interval>) -> Interval {
    let ia = bounds_of_expr_in_scope(a, scope);
    let ib = bounds_of_expr_in_scope(b, scope);
    match (ia.min, ia.max, ib.min, ib.max) {
        (Some(amin), Some(amax), Some(bmin), Some(bmax)) => {
            let candidates = [
                simplify(&mul(amin.clone(), bmin.clone())),
                simplify(&mul(amin, bmax.clone())),
                simplify(&mul(amax.clone(), bmin)),
                simplify(&mul(amax, bmax)),
            ];
            let mut lo = candidates[0].clone();
            let mut hi = candidates[0].clone();
            for c in &candidates[1..] {
                lo = simplify(&min(lo, c.clone()));
                hi = simplify(&max(hi, c.clone()));
            }
            Interval::new(lo, hi)
        }
        _ => Interval::everything(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn literal_bounds_is_a_point() {
        let i = bounds_of_expr(&int32(5));
        assert!(i.is_single_point());
    }

    #[test]
    fn unbound_variable_is_everything() {
        let x = variable("x", Type::int(32, 1));
        let i = bounds_of_expr(&x);
        assert!(!i.is_bounded());
    }

    #[test]
    fn add_of_bounded_vars_is_bounded() {
        let mut scope = Scope::new();
        scope.push("x", Interval::new(int32(0), int32(10)));
        scope.push("y", Interval::new(int32(1), int32(2)));
        let x = variable("x", Type::int(32, 1));
        let y = variable("y", Type::int(32, 1));
        let i = bounds_of_expr_in_scope(&add(x, y), &scope);
        assert!(i.is_bounded());
    }

    #[test]
    fn ramp_bounds_cover_all_lanes() {
        let base = int32(0);
        let stride = int32(2);
        let r = ramp(base, stride, 4);
        let i = bounds_of_expr(&r);
        assert!(i.is_bounded());
    }
}
