//! Interleaved-access rewriting (spec §4.J.3), grounded in `Deinterleaver`
//! (`original_source/cpp/src/Deinterleave.cpp`): a stride-2 `Ramp` load
//! addresses every other element of a buffer, which most backends can't
//! issue directly. `extract_even_lanes`/`extract_odd_lanes` pull the even or
//! odd half out of an already-loaded dense vector; `rewrite_interleavings`
//! uses them to turn a strided load into a dense load plus an extraction,
//! which every backend can emit. The inverse (fusing two strided *stores*
//! into one dense store) needs a paired-statement search this pass does not
//! attempt — strided stores are left as `Store`s with a `Ramp` index for the
//! backend to handle directly.

use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;
use crate::core::scope::Scope;

struct Deinterleaver {
    even: bool,
    new_width: u32,
    internal: Scope<()>,
}

impl ExprMutator for Deinterleaver {
    fn visit_broadcast(&mut self, _e: &Expr, value: &Expr, _width: u32) -> Expr {
        broadcast(value.clone(), self.new_width)
    }

    fn visit_load(&mut self, e: &Expr, index: &Expr) -> Expr {
        let ni = self.mutate_expr(index);
        let (buffer_name, image) = match &e.kind {
            ExprKind::Load { buffer_name, image, .. } => (buffer_name.clone(), *image),
            _ => unreachable!(),
        };
        load(e.ty.vector_of(self.new_width), buffer_name, ni, image)
    }

    fn visit_ramp(&mut self, _e: &Expr, base: &Expr, stride: &Expr, _width: u32) -> Expr {
        let doubled_stride = mul(stride.clone(), int_imm(2, stride.ty));
        if self.even {
            ramp(base.clone(), doubled_stride, self.new_width)
        } else {
            ramp(add(base.clone(), int_imm(1, base.ty)), doubled_stride, self.new_width)
        }
    }

    fn visit_variable(&mut self, e: &Expr, name: &str) -> Expr {
        let ty = e.ty.vector_of(self.new_width);
        if self.internal.contains(name) {
            variable(name, ty)
        } else {
            // Can't symbolically deinterleave a free vector variable; leave
            // an explicit marker for the backend to synthesize at codegen
            // time, mirroring the original's "extract even/odd lanes" call.
            let marker = if self.even { "extract_even_lanes" } else { "extract_odd_lanes" };
            call(ty, marker, vec![e.clone()], CallKind::Extern)
        }
    }

    fn visit_cast(&mut self, _e: &Expr, value: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        cast(nv.ty.vector_of(self.new_width), nv)
    }

    fn visit_let_expr(&mut self, e: &Expr, value: &Expr, body: &Expr) -> Expr {
        let nv = self.mutate_expr(value);
        let name = match &e.kind {
            ExprKind::Let { name, .. } => name.clone(),
            _ => unreachable!(),
        };
        self.internal.push(name.clone(), ());
        let nb = self.mutate_expr(body);
        self.internal.pop(&name);
        let_in(name, nv, nb)
    }
}

fn even_width(width: u32) -> u32 {
    (width + 1) / 2
}

fn odd_width(width: u32) -> u32 {
    width / 2
}

/// Pull the even-indexed half out of a `width`-wide vector expression.
pub fn extract_even_lanes(e: &Expr) -> Expr {
    let mut d = Deinterleaver {
        even: true,
        new_width: even_width(e.ty.width),
        internal: Scope::new(),
    };
    d.mutate_expr(e)
}

/// Pull the odd-indexed half out of a `width`-wide vector expression.
pub fn extract_odd_lanes(e: &Expr) -> Expr {
    let mut d = Deinterleaver {
        even: false,
        new_width: odd_width(e.ty.width),
        internal: Scope::new(),
    };
    d.mutate_expr(e)
}

struct Rewriter;

impl ExprMutator for Rewriter {
    fn visit_load(&mut self, e: &Expr, index: &Expr) -> Expr {
        let ni = self.mutate_expr(index);
        let (buffer_name, image) = match &e.kind {
            ExprKind::Load { buffer_name, image, .. } => (buffer_name.clone(), *image),
            _ => unreachable!(),
        };
        match &ni.kind {
            ExprKind::Ramp {
                base,
                stride,
                width,
            } if matches!(stride.kind, ExprKind::IntImm(2)) && *width > 1 => {
                let dense_index = ramp(base.clone(), int_imm(1, stride.ty), width * 2);
                let dense_ty = e.ty.vector_of(width * 2);
                let dense_load = load(dense_ty, buffer_name, dense_index, image);
                extract_even_lanes(&dense_load)
            }
            _ => {
                if same_as(&ni, index) {
                    e.clone()
                } else {
                    load(e.ty, buffer_name, ni, image)
                }
            }
        }
    }
}

impl StmtMutator for Rewriter {}

/// Turn every stride-2 `Ramp`-indexed load into a dense load plus an
/// even-lane extraction.
pub fn rewrite_interleavings(s: &Stmt) -> Stmt {
    let mut r = Rewriter;
    r.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    fn i32ty() -> Type {
        Type::int(32, 1)
    }

    #[test]
    fn extract_even_lanes_halves_a_broadcast() {
        let b = broadcast(int32(7), 8);
        let e = extract_even_lanes(&b);
        assert_eq!(e.ty.width, 4);
    }

    #[test]
    fn strided_load_becomes_dense_load_plus_extraction() {
        let idx = ramp(int32(0), int32(2), 4);
        let strided = load(i32ty().vector_of(4), "buf", idx, false);
        let rewritten = rewrite_interleavings(&store("out", strided, int32(0)));
        match &rewritten.kind {
            StmtKind::Store { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Call { .. }));
                assert_eq!(value.ty.width, 4);
            }
            other => panic!("expected Store, got {:?}", other),
        }
    }

    #[test]
    fn unit_stride_load_is_untouched() {
        let idx = ramp(int32(0), int32(1), 4);
        let dense = load(i32ty().vector_of(4), "buf", idx, false);
        let rewritten = rewrite_interleavings(&store("out", dense.clone(), int32(0)));
        match &rewritten.kind {
            StmtKind::Store { value, .. } => assert!(matches!(value.kind, ExprKind::Load { .. })),
            other => panic!("expected Store, got {:?}", other),
        }
    }
}
