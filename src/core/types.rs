//! Scalar/vector type descriptors with widening rules (spec §3.1, §4.A).
//!
//! A `Type` is structural: `{kind, bits, width}`. `width == 1` is scalar;
//! `width > 1` is a SIMD vector. Boolean values are represented as
//! `UInt(1, width)`, matching the convention that comparisons produce a
//! bool-or-bool-vector of the operand width.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Int,
    UInt,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub bits: u8,
    pub width: u32,
}

impl Type {
    pub fn new(kind: TypeKind, bits: u8, width: u32) -> Self {
        assert!(width >= 1, "type width must be at least 1");
        Type { kind, bits, width }
    }

    pub fn int(bits: u8, width: u32) -> Self {
        Type::new(TypeKind::Int, bits, width)
    }

    pub fn uint(bits: u8, width: u32) -> Self {
        Type::new(TypeKind::UInt, bits, width)
    }

    pub fn float(bits: u8, width: u32) -> Self {
        Type::new(TypeKind::Float, bits, width)
    }

    /// Bool is represented as a 1-bit unsigned integer (possibly vector-width).
    pub fn bool_(width: u32) -> Self {
        Type::uint(1, width)
    }

    pub fn is_int(&self) -> bool {
        self.kind == TypeKind::Int
    }

    pub fn is_uint(&self) -> bool {
        self.kind == TypeKind::UInt
    }

    pub fn is_float(&self) -> bool {
        self.kind == TypeKind::Float
    }

    pub fn is_bool(&self) -> bool {
        self.kind == TypeKind::UInt && self.bits == 1
    }

    pub fn is_scalar(&self) -> bool {
        self.width == 1
    }

    pub fn is_vector(&self) -> bool {
        self.width > 1
    }

    pub fn vector_of(&self, width: u32) -> Self {
        Type::new(self.kind, self.bits, width)
    }

    pub fn element_of(&self) -> Self {
        Type::new(self.kind, self.bits, 1)
    }

    /// The widening rule used implicitly by arithmetic constructors (spec §3.1).
    ///
    /// `is_const_a`/`is_const_b` mark operands that are bare integer literals —
    /// a literal never forces its own type on a non-literal partner.
    pub fn widen(a: Type, b: Type, is_const_a: bool, is_const_b: bool) -> Type {
        if a == b {
            return a;
        }
        match (a.kind, b.kind) {
            (TypeKind::Float, TypeKind::Float) => {
                Type::float(a.bits.max(b.bits), a.width.max(b.width))
            }
            (TypeKind::Float, _) => a,
            (_, TypeKind::Float) => b,
            (TypeKind::Int, TypeKind::Int) => Type::int(a.bits.max(b.bits), a.width.max(b.width)),
            (TypeKind::UInt, TypeKind::UInt) => {
                Type::uint(a.bits.max(b.bits), a.width.max(b.width))
            }
            (TypeKind::Int, TypeKind::UInt) | (TypeKind::UInt, TypeKind::Int) => {
                if is_const_a {
                    b
                } else if is_const_b {
                    a
                } else {
                    Type::int(a.bits.max(b.bits), a.width.max(b.width))
                }
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TypeKind::Int => "int",
            TypeKind::UInt => "uint",
            TypeKind::Float => "float",
        };
        if self.width == 1 {
            write!(f, "{}{}", kind, self.bits)
        } else {
            write!(f, "{}{}x{}", kind, self.bits, self.width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_vs_vector() {
        assert!(Type::int(32, 1).is_scalar());
        assert!(Type::int(32, 4).is_vector());
    }

    #[test]
    fn bool_is_uint1() {
        let b = Type::bool_(8);
        assert!(b.is_bool());
        assert_eq!(b.width, 8);
    }

    #[test]
    fn widen_int_float() {
        let i = Type::int(32, 1);
        let f = Type::float(32, 1);
        assert_eq!(Type::widen(i, f, false, false), f);
        assert_eq!(Type::widen(f, i, false, false), f);
    }

    #[test]
    fn widen_float_float_takes_max_bits() {
        let a = Type::float(32, 1);
        let b = Type::float(64, 1);
        assert_eq!(Type::widen(a, b, false, false), Type::float(64, 1));
    }

    #[test]
    fn widen_int_uint_constant_yields_nonconstant_type() {
        let i = Type::int(32, 1);
        let u = Type::uint(16, 1);
        // `i` is the constant operand: result takes `u`'s type.
        assert_eq!(Type::widen(i, u, true, false), u);
        // `u` is the constant operand: result takes `i`'s type.
        assert_eq!(Type::widen(i, u, false, true), i);
    }

    #[test]
    fn widen_mixed_int_uint_non_constant_picks_int_max_bits() {
        let i = Type::int(16, 1);
        let u = Type::uint(32, 1);
        assert_eq!(Type::widen(i, u, false, false), Type::int(32, 1));
    }

    #[test]
    fn display() {
        assert_eq!(Type::int(32, 1).to_string(), "int32");
        assert_eq!(Type::float(32, 4).to_string(), "float32x4");
    }
}
