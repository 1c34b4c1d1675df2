//! Constant folding (spec §4.E.1). If all operands are simple literals of a
//! compatible type, evaluate directly. Integer division follows floor
//! semantics; `Mod` follows the source convention of adjusting a negative
//! remainder by adding the modulus (spec §9 design note: preserved as-is,
//! undefined for a zero or negative modulus).

use crate::core::ir::expr::*;

pub fn as_int_const(e: &Expr) -> Option<i64> {
    match &e.kind {
        ExprKind::IntImm(v) => Some(*v),
        _ => None,
    }
}

pub fn as_float_const(e: &Expr) -> Option<f64> {
    match &e.kind {
        ExprKind::FloatImm(v) => Some(*v),
        _ => None,
    }
}

pub fn is_zero(e: &Expr) -> bool {
    as_int_const(e) == Some(0) || as_float_const(e) == Some(0.0)
}

pub fn is_one(e: &Expr) -> bool {
    as_int_const(e) == Some(1) || as_float_const(e) == Some(1.0)
}

pub fn zero_like(e: &Expr) -> Expr {
    if e.ty.is_float() {
        float_imm(0.0, e.ty)
    } else {
        int_imm(0, e.ty)
    }
}

pub fn one_like(e: &Expr) -> Expr {
    if e.ty.is_float() {
        float_imm(1.0, e.ty)
    } else {
        int_imm(1, e.ty)
    }
}

pub fn int_const_like(model: &Expr, v: i64) -> Expr {
    int_imm(v, model.ty)
}

pub fn float_const_like(model: &Expr, v: f64) -> Expr {
    float_imm(v, model.ty)
}

/// Floor division: rounds toward negative infinity, matching the
/// region/bounds arithmetic used throughout the lowering passes.
pub fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if (r != 0) && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Modulo with the source's negative-remainder convention: the result is
/// adjusted into `[0, modulus)` by adding the modulus once. Undefined (we
/// fall back to plain truncating `%`) for a zero or negative modulus.
pub fn mod_adjusted(a: i64, b: i64) -> i64 {
    if b <= 0 {
        return a % b.max(1);
    }
    let r = a % b;
    if r < 0 {
        r + b
    } else {
        r
    }
}

/// Truncate a constant to `to_type`'s bit width, two's-complement style.
/// `cast<i8>(1232) == -48`.
pub fn cast_int_const(to_type: crate::core::types::Type, value: i64) -> i64 {
    let bits = to_type.bits as u32;
    if bits >= 64 {
        return value;
    }
    let mask: i64 = (1i64 << bits) - 1;
    let mut v = value & mask;
    if to_type.is_int() && (v & (1i64 << (bits - 1))) != 0 {
        v -= 1i64 << bits;
    }
    v
}

/// Evaluate `kind(a, b)` directly if both operands are simple literals.
pub fn try_fold(kind: &ExprKind, a: &Expr, b: &Expr) -> Option<Expr> {
    use ExprKind::*;
    if let (Some(x), Some(y)) = (as_int_const(a), as_int_const(b)) {
        let result_ty = a.ty; // binop constructors already unified operand types
        return match kind {
            Add(..) => Some(int_imm(x.wrapping_add(y), result_ty)),
            Sub(..) => Some(int_imm(x.wrapping_sub(y), result_ty)),
            Mul(..) => Some(int_imm(x.wrapping_mul(y), result_ty)),
            Div(..) if y != 0 => Some(int_imm(div_floor(x, y), result_ty)),
            Mod(..) if y != 0 => Some(int_imm(mod_adjusted(x, y), result_ty)),
            Min(..) => Some(int_imm(x.min(y), result_ty)),
            Max(..) => Some(int_imm(x.max(y), result_ty)),
            EQ(..) => Some(bool_const(x == y, a.ty.width)),
            NE(..) => Some(bool_const(x != y, a.ty.width)),
            LT(..) => Some(bool_const(x < y, a.ty.width)),
            LE(..) => Some(bool_const(x <= y, a.ty.width)),
            GT(..) => Some(bool_const(x > y, a.ty.width)),
            GE(..) => Some(bool_const(x >= y, a.ty.width)),
            _ => None,
        };
    }
    if let (Some(x), Some(y)) = (as_float_const(a), as_float_const(b)) {
        let result_ty = a.ty;
        return match kind {
            Add(..) => Some(float_imm(x + y, result_ty)),
            Sub(..) => Some(float_imm(x - y, result_ty)),
            Mul(..) => Some(float_imm(x * y, result_ty)),
            Div(..) if y != 0.0 => Some(float_imm(x / y, result_ty)),
            Min(..) => Some(float_imm(x.min(y), result_ty)),
            Max(..) => Some(float_imm(x.max(y), result_ty)),
            EQ(..) => Some(bool_const(x == y, a.ty.width)),
            NE(..) => Some(bool_const(x != y, a.ty.width)),
            LT(..) => Some(bool_const(x < y, a.ty.width)),
            LE(..) => Some(bool_const(x <= y, a.ty.width)),
            GT(..) => Some(bool_const(x > y, a.ty.width)),
            GE(..) => Some(bool_const(x >= y, a.ty.width)),
            _ => None,
        };
    }
    if let (ExprKind::IntImm(x), And(..)) | (ExprKind::IntImm(x), Or(..)) = (&a.kind, kind) {
        let _ = x;
    }
    None
}

fn bool_const(v: bool, width: u32) -> Expr {
    int_imm(
        if v { 1 } else { 0 },
        crate::core::types::Type::bool_(width),
    )
}

/// Fold `cast(to_type, value)` when `value` is a literal.
pub fn try_fold_cast(to_type: crate::core::types::Type, value: &Expr) -> Option<Expr> {
    if to_type.is_float() {
        if let Some(v) = as_int_const(value) {
            return Some(float_imm(v as f64, to_type));
        }
        if let Some(v) = as_float_const(value) {
            return Some(float_imm(v, to_type));
        }
        return None;
    }
    if let Some(v) = as_int_const(value) {
        return Some(int_imm(cast_int_const(to_type, v), to_type));
    }
    if let Some(v) = as_float_const(value) {
        return Some(int_imm(cast_int_const(to_type, v as i64), to_type));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn cast_narrowing_wraps_twos_complement() {
        assert_eq!(cast_int_const(Type::int(8, 1), 1232), -48);
    }

    #[test]
    fn mod_adjusts_negative_remainder() {
        assert_eq!(mod_adjusted(-1, 4), 3);
        assert_eq!(mod_adjusted(7, 4), 3);
    }

    #[test]
    fn div_is_floor() {
        assert_eq!(div_floor(-7, 2), -4);
        assert_eq!(div_floor(7, 2), 3);
    }

    #[test]
    fn fold_add() {
        let e = try_fold(&ExprKind::Add(int32(1), int32(1)), &int32(3), &int32(4)).unwrap();
        assert_eq!(as_int_const(&e), Some(7));
    }
}
