//! Expression IR (spec §3.2, §4.B).
//!
//! Every node is immutable once built and reference-counted; `Expr` is a
//! cheap-to-clone handle (`Rc<ExprNode>`). `same_as` compares handle identity
//! so rewrite passes can short-circuit when nothing changed.

use std::fmt;
use std::rc::Rc;

use crate::core::types::Type;

/// Which kind of function a `Call` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Refers to another user-defined `Function`, resolved by name in the
    /// lowering environment (spec §9: avoid cycles by storing names, not
    /// `Rc<Function>` pointers, inside `Call`).
    Halide,
    /// Refers to a runtime/extern library function.
    Extern,
    /// Loads from an image/buffer parameter.
    Image,
}

/// A parameter reference: a pipeline input bound by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamRef {
    pub name: String,
}

/// A reduction domain: a named, shared rectangle of `(var_name, min, extent)`
/// triples that a reduction iterates over (spec §3.4).
#[derive(Clone, Debug, PartialEq)]
pub struct ReductionDomain {
    pub name: String,
    pub bounds: Vec<(String, Expr, Expr)>,
}

impl ReductionDomain {
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.bounds.iter().map(|(n, _, _)| n.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntImm(i64),
    FloatImm(f64),
    Variable {
        name: String,
        param: Option<Rc<ParamRef>>,
        reduction_domain: Option<Rc<ReductionDomain>>,
    },
    Cast {
        value: Expr,
    },
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Mod(Expr, Expr),
    Min(Expr, Expr),
    Max(Expr, Expr),
    EQ(Expr, Expr),
    NE(Expr, Expr),
    LT(Expr, Expr),
    LE(Expr, Expr),
    GT(Expr, Expr),
    GE(Expr, Expr),
    And(Expr, Expr),
    Or(Expr, Expr),
    Not(Expr),
    Select {
        cond: Expr,
        true_value: Expr,
        false_value: Expr,
    },
    Load {
        buffer_name: String,
        index: Expr,
        image: bool,
        param: Option<Rc<ParamRef>>,
    },
    Ramp {
        base: Expr,
        stride: Expr,
        width: u32,
    },
    Broadcast {
        value: Expr,
        width: u32,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        call_kind: CallKind,
    },
    Let {
        name: String,
        value: Expr,
        body: Expr,
    },
}

/// An IR node: its variant plus the type it was built with (spec invariant:
/// "every Expr has a defined type").
#[derive(Debug, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub ty: Type,
}

/// A reference-counted, immutable handle to an `ExprNode`.
pub type Expr = Rc<ExprNode>;

/// Do `a` and `b` point at the same underlying node?
pub fn same_as(a: &Expr, b: &Expr) -> bool {
    Rc::ptr_eq(a, b)
}

fn node(kind: ExprKind, ty: Type) -> Expr {
    Rc::new(ExprNode { kind, ty })
}

// ─── Smart constructors (enforce invariants from spec §3.2) ───────────────

pub fn int_imm(value: i64, ty: Type) -> Expr {
    assert!(ty.is_int() || ty.is_uint());
    node(ExprKind::IntImm(value), ty)
}

pub fn int32(value: i32) -> Expr {
    int_imm(value as i64, Type::int(32, 1))
}

pub fn float_imm(value: f64, ty: Type) -> Expr {
    assert!(ty.is_float());
    node(ExprKind::FloatImm(value), ty)
}

pub fn float32(value: f32) -> Expr {
    float_imm(value as f64, Type::float(32, 1))
}

pub fn variable(name: impl Into<String>, ty: Type) -> Expr {
    node(
        ExprKind::Variable {
            name: name.into(),
            param: None,
            reduction_domain: None,
        },
        ty,
    )
}

pub fn param_variable(name: impl Into<String>, ty: Type, param: Rc<ParamRef>) -> Expr {
    node(
        ExprKind::Variable {
            name: name.into(),
            param: Some(param),
            reduction_domain: None,
        },
        ty,
    )
}

pub fn reduction_variable(name: impl Into<String>, ty: Type, rdom: Rc<ReductionDomain>) -> Expr {
    node(
        ExprKind::Variable {
            name: name.into(),
            param: None,
            reduction_domain: Some(rdom),
        },
        ty,
    )
}

pub fn cast(to_type: Type, value: Expr) -> Expr {
    node(ExprKind::Cast { value }, to_type)
}

/// Is this node a "simple" literal constant the simplifier can fold directly?
pub fn is_const(e: &Expr) -> bool {
    matches!(e.kind, ExprKind::IntImm(_) | ExprKind::FloatImm(_))
}

macro_rules! binop_ctor {
    ($fname:ident, $variant:ident) => {
        pub fn $fname(a: Expr, b: Expr) -> Expr {
            let ty = Type::widen(a.ty, b.ty, is_const(&a), is_const(&b));
            let a = coerce(a, ty);
            let b = coerce(b, ty);
            node(ExprKind::$variant(a, b), ty)
        }
    };
}

/// Implicitly coerce an integer-literal operand to the type the arithmetic
/// node settled on (spec §3.1: "integer-literal matching implicitly coerces
/// to the type of the non-constant operand").
fn coerce(e: Expr, ty: Type) -> Expr {
    if e.ty == ty {
        return e;
    }
    match &e.kind {
        ExprKind::IntImm(v) if ty.is_int() || ty.is_uint() => int_imm(*v, ty),
        _ => e,
    }
}

binop_ctor!(add, Add);
binop_ctor!(sub, Sub);
binop_ctor!(mul, Mul);
binop_ctor!(div, Div);
binop_ctor!(rem, Mod);
binop_ctor!(min, Min);
binop_ctor!(max, Max);

macro_rules! cmp_ctor {
    ($fname:ident, $variant:ident) => {
        pub fn $fname(a: Expr, b: Expr) -> Expr {
            let op_ty = Type::widen(a.ty, b.ty, is_const(&a), is_const(&b));
            let a = coerce(a, op_ty);
            let b = coerce(b, op_ty);
            let bool_ty = Type::bool_(op_ty.width);
            node(ExprKind::$variant(a, b), bool_ty)
        }
    };
}

cmp_ctor!(eq, EQ);
cmp_ctor!(ne, NE);
cmp_ctor!(lt, LT);
cmp_ctor!(le, LE);
cmp_ctor!(gt, GT);
cmp_ctor!(ge, GE);

pub fn and(a: Expr, b: Expr) -> Expr {
    assert!(a.ty.is_bool() && b.ty.is_bool());
    let width = a.ty.width.max(b.ty.width);
    node(ExprKind::And(a, b), Type::bool_(width))
}

pub fn or(a: Expr, b: Expr) -> Expr {
    assert!(a.ty.is_bool() && b.ty.is_bool());
    let width = a.ty.width.max(b.ty.width);
    node(ExprKind::Or(a, b), Type::bool_(width))
}

pub fn not(a: Expr) -> Expr {
    assert!(a.ty.is_bool());
    let ty = a.ty;
    node(ExprKind::Not(a), ty)
}

pub fn select(cond: Expr, true_value: Expr, false_value: Expr) -> Expr {
    assert!(cond.ty.is_bool());
    assert_eq!(true_value.ty, false_value.ty);
    if cond.ty.is_scalar() {
        assert!(cond.ty.width == 1);
    }
    let ty = true_value.ty;
    node(
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        },
        ty,
    )
}

pub fn load(ty: Type, buffer_name: impl Into<String>, index: Expr, image: bool) -> Expr {
    node(
        ExprKind::Load {
            buffer_name: buffer_name.into(),
            index,
            image,
            param: None,
        },
        ty,
    )
}

pub fn ramp(base: Expr, stride: Expr, width: u32) -> Expr {
    assert!(width >= 2, "Ramp.width must be >= 2");
    assert_eq!(base.ty, stride.ty);
    let ty = base.ty.vector_of(width);
    node(ExprKind::Ramp { base, stride, width }, ty)
}

pub fn broadcast(value: Expr, width: u32) -> Expr {
    assert!(width >= 2, "Broadcast.width must be >= 2");
    let ty = value.ty.vector_of(width);
    node(ExprKind::Broadcast { value, width }, ty)
}

pub fn call(ty: Type, name: impl Into<String>, args: Vec<Expr>, call_kind: CallKind) -> Expr {
    node(
        ExprKind::Call {
            name: name.into(),
            args,
            call_kind,
        },
        ty,
    )
}

pub fn let_in(name: impl Into<String>, value: Expr, body: Expr) -> Expr {
    let ty = body.ty;
    node(
        ExprKind::Let {
            name: name.into(),
            value,
            body,
        },
        ty,
    )
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntImm(v) => write!(f, "{}", v),
            ExprKind::FloatImm(v) => write!(f, "{}f", v),
            ExprKind::Variable { name, .. } => write!(f, "{}", name),
            ExprKind::Cast { value } => write!(f, "cast<{}>({})", self.ty, value),
            ExprKind::Add(a, b) => write!(f, "({} + {})", a, b),
            ExprKind::Sub(a, b) => write!(f, "({} - {})", a, b),
            ExprKind::Mul(a, b) => write!(f, "({} * {})", a, b),
            ExprKind::Div(a, b) => write!(f, "({} / {})", a, b),
            ExprKind::Mod(a, b) => write!(f, "({} % {})", a, b),
            ExprKind::Min(a, b) => write!(f, "min({}, {})", a, b),
            ExprKind::Max(a, b) => write!(f, "max({}, {})", a, b),
            ExprKind::EQ(a, b) => write!(f, "({} == {})", a, b),
            ExprKind::NE(a, b) => write!(f, "({} != {})", a, b),
            ExprKind::LT(a, b) => write!(f, "({} < {})", a, b),
            ExprKind::LE(a, b) => write!(f, "({} <= {})", a, b),
            ExprKind::GT(a, b) => write!(f, "({} > {})", a, b),
            ExprKind::GE(a, b) => write!(f, "({} >= {})", a, b),
            ExprKind::And(a, b) => write!(f, "({} && {})", a, b),
            ExprKind::Or(a, b) => write!(f, "({} || {})", a, b),
            ExprKind::Not(a) => write!(f, "!{}", a),
            ExprKind::Select {
                cond,
                true_value,
                false_value,
            } => write!(f, "select({}, {}, {})", cond, true_value, false_value),
            ExprKind::Load {
                buffer_name, index, ..
            } => write!(f, "{}[{}]", buffer_name, index),
            ExprKind::Ramp { base, stride, width } => {
                write!(f, "ramp({}, {}, {})", base, stride, width)
            }
            ExprKind::Broadcast { value, width } => write!(f, "x{}({})", width, value),
            ExprKind::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            ExprKind::Let { name, value, body } => {
                write!(f, "(let {} = {} in {})", name, value, body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_as_identity() {
        let x = variable("x", Type::int(32, 1));
        let y = x.clone();
        assert!(same_as(&x, &y));
        let z = variable("x", Type::int(32, 1));
        assert!(!same_as(&x, &z));
    }

    #[test]
    fn add_matches_operand_types() {
        let x = variable("x", Type::int(32, 1));
        let e = add(x.clone(), int32(1));
        assert_eq!(e.ty, Type::int(32, 1));
        if let ExprKind::Add(a, b) = &e.kind {
            assert_eq!(a.ty, b.ty);
        } else {
            panic!("expected Add");
        }
    }

    #[test]
    fn comparisons_return_bool() {
        let x = variable("x", Type::int(32, 4));
        let e = lt(x, int_imm(0, Type::int(32, 4)));
        assert!(e.ty.is_bool());
        assert_eq!(e.ty.width, 4);
    }

    #[test]
    fn ramp_and_broadcast_require_width_ge_2() {
        let base = int32(0);
        let stride = int32(1);
        let r = ramp(base, stride, 4);
        assert_eq!(r.ty.width, 4);
    }

    #[test]
    #[should_panic]
    fn select_requires_matching_branch_types() {
        let cond = eq(int32(1), int32(1));
        select(cond, int32(1), float32(1.0));
    }

    #[test]
    fn display_renders_readable_expr() {
        let x = variable("x", Type::int(32, 1));
        let e = add(x, int32(3));
        assert_eq!(format!("{}", e), "(x + 3)");
    }
}
