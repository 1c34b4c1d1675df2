//! Algebraic identities (spec §4.E.3): rewrites that hold regardless of what
//! the non-constant operands turn out to be. Each `try_*` function assumes
//! its operands have already been through constant folding and
//! canonicalization, so it only needs to look for structural patterns.

use crate::core::ir::expr::*;
use crate::core::scope::Scope;

use super::constant_fold::{as_float_const, as_int_const, float_const_like, int_const_like, is_one, is_zero, one_like, zero_like};
use super::modulus::{analyze as analyze_modulus, ModulusRemainder};

pub fn try_identity(
    kind: &ExprKind,
    a: &Expr,
    b: &Expr,
    mod_scope: &Scope<ModulusRemainder>,
) -> Option<Expr> {
    match kind {
        ExprKind::Add(..) => try_add(a, b),
        ExprKind::Sub(..) => try_sub(a, b),
        ExprKind::Mul(..) => try_mul(a, b),
        ExprKind::Div(..) => try_div(a, b),
        ExprKind::Mod(..) => try_mod(a, b, mod_scope),
        ExprKind::Min(..) => try_min(a, b),
        ExprKind::Max(..) => try_max(a, b),
        ExprKind::LT(..) => try_lt(a, b),
        ExprKind::And(..) => try_and(a, b),
        ExprKind::Or(..) => try_or(a, b),
        _ => None,
    }
}

fn try_add(a: &Expr, b: &Expr) -> Option<Expr> {
    if is_zero(b) {
        return Some(a.clone());
    }
    if is_zero(a) {
        return Some(b.clone());
    }
    // (x + c1) + c2 -> x + (c1 + c2)
    if let ExprKind::Add(x, c1) = &a.kind {
        if let (Some(c1v), Some(c2v)) = (as_int_const(c1), as_int_const(b)) {
            return Some(add(x.clone(), int_const_like(b, c1v + c2v)));
        }
        if let (Some(c1v), Some(c2v)) = (as_float_const(c1), as_float_const(b)) {
            return Some(add(x.clone(), float_const_like(b, c1v + c2v)));
        }
        // (x + c) + y -> (x + y) + c, keeping the constant canonically rightmost
        if (as_int_const(c1).is_some() || as_float_const(c1).is_some()) && !is_const(b) {
            return Some(add(add(x.clone(), b.clone()), c1.clone()));
        }
    }
    // (x - y) + y -> x, (y - x) + x -> y
    if let ExprKind::Sub(x, y) = &a.kind {
        if *y == *b {
            return Some(x.clone());
        }
    }
    try_common_factor(a, b)
}

fn try_sub(a: &Expr, b: &Expr) -> Option<Expr> {
    // Reaches here only when `b` was not a plain literal (that case is
    // handled by `sub_to_add_neg`, which rewrites it to `Add` upstream).
    if a == b {
        return Some(zero_like(a));
    }
    if let ExprKind::Add(x, y) = &a.kind {
        if *x == *b {
            return Some(y.clone());
        }
        if *y == *b {
            return Some(x.clone());
        }
    }
    None
}

fn try_mul(a: &Expr, b: &Expr) -> Option<Expr> {
    if is_zero(a) {
        return Some(zero_like(a));
    }
    if is_zero(b) {
        return Some(zero_like(b));
    }
    if is_one(b) {
        return Some(a.clone());
    }
    if is_one(a) {
        return Some(b.clone());
    }
    None
}

fn try_div(a: &Expr, b: &Expr) -> Option<Expr> {
    if is_zero(a) {
        return Some(zero_like(a));
    }
    if is_one(b) {
        return Some(a.clone());
    }
    if a == b {
        return Some(one_like(a));
    }
    if let Some(c2) = as_int_const(b) {
        if c2 != 0 {
            // (x*c1 + y) / c2 -> x*(c1/c2) + y/c2, when c2 | c1
            if let ExprKind::Add(l, r) = &a.kind {
                for (mul_side, rest) in [(l, r), (r, l)] {
                    if let ExprKind::Mul(x, c1e) = &mul_side.kind {
                        if let Some(c1) = as_int_const(c1e) {
                            if c1 % c2 == 0 {
                                return Some(add(
                                    mul(x.clone(), int_const_like(b, c1 / c2)),
                                    div(rest.clone(), b.clone()),
                                ));
                            }
                        }
                    }
                }
            }
            // (x*c1) / c2 -> x / (c2/c1), when c1 | c2
            if let ExprKind::Mul(x, c1e) = &a.kind {
                if let Some(c1) = as_int_const(c1e) {
                    if c1 != 0 && c2 % c1 == 0 {
                        return Some(div(x.clone(), int_const_like(b, c2 / c1)));
                    }
                }
            }
            // (x / c1) / c2 -> x / (c1*c2)
            if let ExprKind::Div(x, c1e) = &a.kind {
                if let Some(c1) = as_int_const(c1e) {
                    return Some(div(x.clone(), int_const_like(b, c1 * c2)));
                }
            }
        }
    }
    if a.ty.is_float() {
        if let Some(c) = as_float_const(b) {
            if c != 0.0 {
                return Some(mul(a.clone(), float_const_like(b, 1.0 / c)));
            }
        }
    }
    None
}

fn try_mod(a: &Expr, b: &Expr, mod_scope: &Scope<ModulusRemainder>) -> Option<Expr> {
    if is_zero(a) {
        return Some(zero_like(a));
    }
    let c2 = as_int_const(b)?;
    if c2 <= 0 {
        return None;
    }
    // (x*c1 + y) % c2 -> y % c2, when c2 | c1
    if let ExprKind::Add(l, r) = &a.kind {
        for (mul_side, rest) in [(l, r), (r, l)] {
            if let ExprKind::Mul(_, c1e) = &mul_side.kind {
                if let Some(c1) = as_int_const(c1e) {
                    if c1 % c2 == 0 {
                        return Some(rem(rest.clone(), b.clone()));
                    }
                }
            }
        }
    }
    // Exact congruence, proven by modulus/remainder analysis: a % c2 is the
    // known constant remainder whenever c2 divides the established modulus.
    let fact = analyze_modulus(a, mod_scope);
    if fact.modulus % c2 == 0 {
        return Some(int_const_like(b, fact.remainder.rem_euclid(c2)));
    }
    None
}

fn try_min(a: &Expr, b: &Expr) -> Option<Expr> {
    if a == b {
        return Some(a.clone());
    }
    // min(min(x, y), x) -> min(x, y), and symmetric permutations.
    if let ExprKind::Min(x, y) = &a.kind {
        if *x == *b || *y == *b {
            return Some(a.clone());
        }
        // min(min(x, c1), c2) -> min(x, min(c1, c2))
        if let (Some(c1), Some(c2)) = (as_int_const(y), as_int_const(b)) {
            return Some(min(x.clone(), int_const_like(b, c1.min(c2))));
        }
    }
    if let ExprKind::Min(x, y) = &b.kind {
        if *x == *a || *y == *a {
            return Some(b.clone());
        }
    }
    // (x + c1) min (x + c2) -> x + min(c1, c2)
    if let (ExprKind::Add(x1, c1e), ExprKind::Add(x2, c2e)) = (&a.kind, &b.kind) {
        if *x1 == *x2 {
            if let (Some(c1), Some(c2)) = (as_int_const(c1e), as_int_const(c2e)) {
                return Some(add(x1.clone(), int_const_like(c1e, c1.min(c2))));
            }
        }
    }
    None
}

fn try_max(a: &Expr, b: &Expr) -> Option<Expr> {
    if a == b {
        return Some(a.clone());
    }
    if let ExprKind::Max(x, y) = &a.kind {
        if *x == *b || *y == *b {
            return Some(a.clone());
        }
        if let (Some(c1), Some(c2)) = (as_int_const(y), as_int_const(b)) {
            return Some(max(x.clone(), int_const_like(b, c1.max(c2))));
        }
    }
    if let ExprKind::Max(x, y) = &b.kind {
        if *x == *a || *y == *a {
            return Some(b.clone());
        }
    }
    if let (ExprKind::Add(x1, c1e), ExprKind::Add(x2, c2e)) = (&a.kind, &b.kind) {
        if *x1 == *x2 {
            if let (Some(c1), Some(c2)) = (as_int_const(c1e), as_int_const(c2e)) {
                return Some(add(x1.clone(), int_const_like(c1e, c1.max(c2))));
            }
        }
    }
    None
}

fn try_lt(a: &Expr, b: &Expr) -> Option<Expr> {
    // (x + c1) < (y + c2) -> x < y + (c2 - c1)
    if let (ExprKind::Add(x, c1e), ExprKind::Add(y, c2e)) = (&a.kind, &b.kind) {
        if let (Some(c1), Some(c2)) = (as_int_const(c1e), as_int_const(c2e)) {
            return Some(lt(x.clone(), add(y.clone(), int_const_like(c1e, c2 - c1))));
        }
    }
    if let ExprKind::Add(x, c1e) = &a.kind {
        if let Some(c1) = as_int_const(c1e) {
            return Some(lt(x.clone(), sub(b.clone(), int_const_like(c1e, c1))));
        }
    }
    // c*x < c*y -> x < y, for a positive literal common factor c
    if let (ExprKind::Mul(x, c1e), ExprKind::Mul(y, c2e)) = (&a.kind, &b.kind) {
        if let (Some(c1), Some(c2)) = (as_int_const(c1e), as_int_const(c2e)) {
            if c1 == c2 && c1 > 0 {
                return Some(lt(x.clone(), y.clone()));
            }
        }
    }
    None
}

fn try_and(a: &Expr, b: &Expr) -> Option<Expr> {
    if let ExprKind::IntImm(v) = &b.kind {
        return Some(if *v != 0 { a.clone() } else { zero_like(b) });
    }
    if let ExprKind::IntImm(v) = &a.kind {
        return Some(if *v != 0 { b.clone() } else { zero_like(a) });
    }
    if a == b {
        return Some(a.clone());
    }
    None
}

fn try_or(a: &Expr, b: &Expr) -> Option<Expr> {
    if let ExprKind::IntImm(v) = &b.kind {
        return Some(if *v != 0 { one_like(b) } else { a.clone() });
    }
    if let ExprKind::IntImm(v) = &a.kind {
        return Some(if *v != 0 { one_like(a) } else { b.clone() });
    }
    if a == b {
        return Some(a.clone());
    }
    None
}

/// `a*x + b*x -> (a+b)*x`, matched across all four argument positions.
fn try_common_factor(a: &Expr, b: &Expr) -> Option<Expr> {
    let (a1, a2) = decompose_mul(a)?;
    let (b1, b2) = decompose_mul(b)?;
    if a2 == b2 {
        return Some(mul(add(a1, b1), a2));
    }
    if a1 == b1 {
        return Some(mul(a1, add(a2, b2)));
    }
    if a1 == b2 {
        return Some(mul(add(a2, b1), a1));
    }
    if a2 == b1 {
        return Some(mul(add(a1, b2), a2));
    }
    None
}

fn decompose_mul(e: &Expr) -> Option<(Expr, Expr)> {
    match &e.kind {
        ExprKind::Mul(l, r) => Some((l.clone(), r.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn x_plus_zero_is_x() {
        let x = variable("x", Type::int(32, 1));
        let r = try_add(&x, &int32(0)).unwrap();
        assert!(same_as(&r, &x));
    }

    #[test]
    fn x_times_zero_is_zero() {
        let x = variable("x", Type::int(32, 1));
        let r = try_mul(&x, &int32(0)).unwrap();
        assert!(matches!(r.kind, ExprKind::IntImm(0)));
    }

    #[test]
    fn x_minus_x_is_zero() {
        let x = variable("x", Type::int(32, 1));
        let r = try_sub(&x, &x).unwrap();
        assert!(matches!(r.kind, ExprKind::IntImm(0)));
    }

    #[test]
    fn common_factor_extraction() {
        let x = variable("x", Type::int(32, 1));
        let a_ = variable("a", Type::int(32, 1));
        let b_ = variable("b", Type::int(32, 1));
        let lhs = mul(a_.clone(), x.clone());
        let rhs = mul(b_.clone(), x.clone());
        let r = try_common_factor(&lhs, &rhs).unwrap();
        assert!(matches!(r.kind, ExprKind::Mul(..)));
    }

    #[test]
    fn div_by_one_is_identity() {
        let x = variable("x", Type::int(32, 1));
        let r = try_div(&x, &int32(1)).unwrap();
        assert!(same_as(&r, &x));
    }
}
