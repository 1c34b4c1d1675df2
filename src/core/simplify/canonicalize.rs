//! Canonicalization rules (spec §4.E.2): put expressions into one shape so
//! later identity matching does not need to consider symmetric variants.

use crate::core::ir::expr::*;

use super::constant_fold::{as_float_const, as_int_const, float_const_like, int_const_like};

/// Operators for which operand order does not change meaning.
fn is_commutative(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Add(..)
            | ExprKind::Mul(..)
            | ExprKind::Min(..)
            | ExprKind::Max(..)
            | ExprKind::EQ(..)
            | ExprKind::NE(..)
            | ExprKind::And(..)
            | ExprKind::Or(..)
    )
}

/// A literal constant belongs on the right: `c + x` should read `x + c`.
pub fn should_swap_commutative(kind: &ExprKind, a: &Expr, b: &Expr) -> bool {
    is_commutative(kind) && is_const(a) && !is_const(b)
}

/// `a - c` canonicalizes to `a + (-c)`, so later rules only ever have to
/// look for `Add`.
pub fn sub_to_add_neg(kind: &ExprKind, a: &Expr, b: &Expr) -> Option<Expr> {
    if !matches!(kind, ExprKind::Sub(..)) {
        return None;
    }
    if let Some(c) = as_int_const(b) {
        return Some(add(a.clone(), int_const_like(b, -c)));
    }
    if let Some(c) = as_float_const(b) {
        return Some(add(a.clone(), float_const_like(b, -c)));
    }
    None
}

/// Push `Ramp`/`Broadcast` outward through `Add`/`Sub`/`Mul` so vector-lane
/// structure survives as long as possible instead of collapsing to a
/// generic elementwise node.
pub fn push_ramp_broadcast(kind: &ExprKind, a: &Expr, b: &Expr) -> Option<Expr> {
    match kind {
        ExprKind::Add(..) | ExprKind::Sub(..) | ExprKind::Mul(..) => {}
        _ => return None,
    }
    match (&a.kind, &b.kind) {
        (
            ExprKind::Ramp {
                base: b1,
                stride: s1,
                width: w1,
            },
            ExprKind::Ramp {
                base: b2,
                stride: s2,
                width: w2,
            },
        ) if w1 == w2 => {
            let new_base = rebuild(kind, b1.clone(), b2.clone());
            let new_stride = if matches!(kind, ExprKind::Mul(..)) {
                return None; // Ramp * Ramp is not a Ramp; leave to elementwise handling.
            } else {
                rebuild(kind, s1.clone(), s2.clone())
            };
            Some(ramp(new_base, new_stride, *w1))
        }
        (
            ExprKind::Ramp {
                base, stride, width,
            },
            ExprKind::Broadcast { value, width: w2 },
        ) if width == w2 => match kind {
            ExprKind::Mul(..) => Some(ramp(
                rebuild(kind, base.clone(), value.clone()),
                rebuild(kind, stride.clone(), value.clone()),
                *width,
            )),
            _ => Some(ramp(
                rebuild(kind, base.clone(), value.clone()),
                stride.clone(),
                *width,
            )),
        },
        (
            ExprKind::Broadcast { value, width: w1 },
            ExprKind::Ramp {
                base, stride, width,
            },
        ) if width == w1 && !matches!(kind, ExprKind::Sub(..)) => match kind {
            ExprKind::Mul(..) => Some(ramp(
                rebuild(kind, value.clone(), base.clone()),
                rebuild(kind, value.clone(), stride.clone()),
                *width,
            )),
            _ => Some(ramp(rebuild(kind, value.clone(), base.clone()), stride.clone(), *width)),
        },
        (
            ExprKind::Broadcast { value: v1, width: w1 },
            ExprKind::Broadcast { value: v2, width: w2 },
        ) if w1 == w2 => Some(broadcast(rebuild(kind, v1.clone(), v2.clone()), *w1)),
        _ => None,
    }
}

fn rebuild(kind: &ExprKind, a: Expr, b: Expr) -> Expr {
    match kind {
        ExprKind::Add(..) => add(a, b),
        ExprKind::Sub(..) => sub(a, b),
        ExprKind::Mul(..) => mul(a, b),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn constant_moves_to_the_right() {
        let x = variable("x", Type::int(32, 1));
        assert!(should_swap_commutative(
            &ExprKind::Add(int32(1), int32(1)),
            &int32(1),
            &x
        ));
    }

    #[test]
    fn sub_constant_becomes_add_negative() {
        let x = variable("x", Type::int(32, 1));
        let rewritten = sub_to_add_neg(&ExprKind::Sub(int32(0), int32(0)), &x, &int32(5)).unwrap();
        assert!(matches!(rewritten.kind, ExprKind::Add(..)));
    }

    #[test]
    fn ramp_plus_ramp_stays_a_ramp() {
        let base1 = int32(0);
        let stride1 = int32(1);
        let r1 = ramp(base1, stride1, 4);
        let base2 = int32(10);
        let stride2 = int32(2);
        let r2 = ramp(base2, stride2, 4);
        let rewritten = push_ramp_broadcast(&ExprKind::Add(int32(0), int32(0)), &r1, &r2).unwrap();
        assert!(matches!(rewritten.kind, ExprKind::Ramp { .. }));
    }
}
