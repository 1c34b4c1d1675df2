//! Pipeline description format (spec §3.4): a serde-friendly mirror of
//! `Function`/`Expr`/`Schedule` that a document on disk can actually contain,
//! since `Expr` embeds `Rc<ExprNode>` and has no `Deserialize` impl of its
//! own. `stencilc lower` reads one of these and converts it with
//! [`to_universe`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::diagnostic::LowerError;
use crate::core::func::Function;
use crate::core::ir::expr::*;
use crate::core::types::Type;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum TypeKindDto {
    Int,
    UInt,
    Float,
    Bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TypeDto {
    pub kind: TypeKindDto,
    pub bits: u8,
    #[serde(default = "one")]
    pub width: u32,
}

fn one() -> u32 {
    1
}

impl From<TypeDto> for Type {
    fn from(d: TypeDto) -> Type {
        match d.kind {
            TypeKindDto::Int => Type::int(d.bits, d.width),
            TypeKindDto::UInt => Type::uint(d.bits, d.width),
            TypeKindDto::Float => Type::float(d.bits, d.width),
            TypeKindDto::Bool => Type::bool_(d.width),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum CallKindDto {
    Halide,
    Extern,
    Image,
}

impl From<CallKindDto> for CallKind {
    fn from(d: CallKindDto) -> CallKind {
        match d {
            CallKindDto::Halide => CallKind::Halide,
            CallKindDto::Extern => CallKind::Extern,
            CallKindDto::Image => CallKind::Image,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExprDto {
    Int { value: i64, ty: TypeDto },
    Float { value: f64, ty: TypeDto },
    Var { name: String, ty: TypeDto },
    Add { a: Box<ExprDto>, b: Box<ExprDto> },
    Sub { a: Box<ExprDto>, b: Box<ExprDto> },
    Mul { a: Box<ExprDto>, b: Box<ExprDto> },
    Div { a: Box<ExprDto>, b: Box<ExprDto> },
    Mod { a: Box<ExprDto>, b: Box<ExprDto> },
    Min { a: Box<ExprDto>, b: Box<ExprDto> },
    Max { a: Box<ExprDto>, b: Box<ExprDto> },
    Eq { a: Box<ExprDto>, b: Box<ExprDto> },
    Ne { a: Box<ExprDto>, b: Box<ExprDto> },
    Lt { a: Box<ExprDto>, b: Box<ExprDto> },
    Le { a: Box<ExprDto>, b: Box<ExprDto> },
    Gt { a: Box<ExprDto>, b: Box<ExprDto> },
    Ge { a: Box<ExprDto>, b: Box<ExprDto> },
    And { a: Box<ExprDto>, b: Box<ExprDto> },
    Or { a: Box<ExprDto>, b: Box<ExprDto> },
    Not { a: Box<ExprDto> },
    Select { cond: Box<ExprDto>, t: Box<ExprDto>, f: Box<ExprDto> },
    Load { buffer: String, index: Box<ExprDto>, ty: TypeDto, image: bool },
    Call { name: String, args: Vec<ExprDto>, ty: TypeDto, call_kind: CallKindDto },
    Let { name: String, value: Box<ExprDto>, body: Box<ExprDto> },
}

/// Build the `Expr` this document describes. Binary arithmetic/comparison
/// nodes go through the ordinary smart constructors, so the result's type is
/// whatever `Type::widen` settles on rather than a caller-supplied `ty`;
/// only leaves (`Int`/`Float`/`Var`) and nodes with no type-inference rule of
/// their own (`Load`/`Call`) carry an explicit `TypeDto`.
pub fn to_expr(dto: &ExprDto) -> Expr {
    match dto {
        ExprDto::Int { value, ty } => int_imm(*value, (*ty).into()),
        ExprDto::Float { value, ty } => float_imm(*value, (*ty).into()),
        ExprDto::Var { name, ty } => variable(name.clone(), (*ty).into()),
        ExprDto::Add { a, b } => add(to_expr(a), to_expr(b)),
        ExprDto::Sub { a, b } => sub(to_expr(a), to_expr(b)),
        ExprDto::Mul { a, b } => mul(to_expr(a), to_expr(b)),
        ExprDto::Div { a, b } => div(to_expr(a), to_expr(b)),
        ExprDto::Mod { a, b } => rem(to_expr(a), to_expr(b)),
        ExprDto::Min { a, b } => min(to_expr(a), to_expr(b)),
        ExprDto::Max { a, b } => max(to_expr(a), to_expr(b)),
        ExprDto::Eq { a, b } => eq(to_expr(a), to_expr(b)),
        ExprDto::Ne { a, b } => ne(to_expr(a), to_expr(b)),
        ExprDto::Lt { a, b } => lt(to_expr(a), to_expr(b)),
        ExprDto::Le { a, b } => le(to_expr(a), to_expr(b)),
        ExprDto::Gt { a, b } => gt(to_expr(a), to_expr(b)),
        ExprDto::Ge { a, b } => ge(to_expr(a), to_expr(b)),
        ExprDto::And { a, b } => and(to_expr(a), to_expr(b)),
        ExprDto::Or { a, b } => or(to_expr(a), to_expr(b)),
        ExprDto::Not { a } => not(to_expr(a)),
        ExprDto::Select { cond, t, f } => select(to_expr(cond), to_expr(t), to_expr(f)),
        ExprDto::Load { buffer, index, ty, image } => {
            load((*ty).into(), buffer.clone(), to_expr(index), *image)
        }
        ExprDto::Call { name, args, ty, call_kind } => {
            call((*ty).into(), name.clone(), args.iter().map(to_expr).collect(), (*call_kind).into())
        }
        ExprDto::Let { name, value, body } => let_in(name.clone(), to_expr(value), to_expr(body)),
    }
}

/// Schedule directives a pipeline document may request for a Function's
/// pure definition (spec §4.G). Reduction scheduling is out of scope for
/// this document format; reductions still lower correctly with the default
/// inline reduction schedule.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScheduleDto {
    #[serde(default)]
    pub compute_root: bool,
    #[serde(default)]
    pub vectorize: Vec<String>,
    #[serde(default)]
    pub unroll: Vec<String>,
    #[serde(default)]
    pub parallel: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDto {
    pub name: String,
    pub pure_args: Vec<String>,
    pub pure_value: ExprDto,
    #[serde(default)]
    pub reduction_args: Option<Vec<ExprDto>>,
    #[serde(default)]
    pub reduction_value: Option<ExprDto>,
    #[serde(default)]
    pub schedule: Option<ScheduleDto>,
}

pub fn to_function(dto: &FunctionDto) -> Result<Function, LowerError> {
    let mut f = Function::new(dto.name.clone());
    f.define(dto.pure_args.clone(), to_expr(&dto.pure_value))?;

    if let (Some(args), Some(value)) = (&dto.reduction_args, &dto.reduction_value) {
        f.define_reduction(args.iter().map(to_expr).collect(), to_expr(value))?;
    }

    if let Some(sched) = &dto.schedule {
        if sched.compute_root {
            f.pure_schedule.compute_root();
        }
        for v in &sched.vectorize {
            f.pure_schedule.vectorize(v);
        }
        for v in &sched.unroll {
            f.pure_schedule.unroll(v);
        }
        for v in &sched.parallel {
            f.pure_schedule.parallel(v);
        }
    }
    Ok(f)
}

/// A whole pipeline document: every Function it defines, plus which one is
/// the root to lower.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineDto {
    pub functions: Vec<FunctionDto>,
    pub root: String,
}

/// Convert a document into the `(universe, root_name)` pair `core::lower`
/// expects.
pub fn to_universe(dto: &PipelineDto) -> Result<(BTreeMap<String, Function>, String), LowerError> {
    let mut universe = BTreeMap::new();
    for fdto in &dto.functions {
        let f = to_function(fdto)?;
        universe.insert(f.name.clone(), f);
    }
    Ok((universe, dto.root.clone()))
}
