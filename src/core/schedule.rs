//! Schedule model (spec §3.4, §4.G): the set of decisions about how a
//! Function is computed and stored.

use serde::{Deserialize, Serialize};

use crate::core::ir::expr::Expr;
use crate::core::ir::stmt::ForType;

/// Where a Function is stored or computed, relative to an enclosing loop
/// nest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopLevel {
    /// Substituted into every call site; no Realize/Pipeline is injected.
    Inline,
    /// Outermost: wraps the whole lowered tree.
    Root,
    /// The loop body of `func`'s named variable `var`.
    At { func: String, var: String },
}

impl LoopLevel {
    pub fn is_inline(&self) -> bool {
        matches!(self, LoopLevel::Inline)
    }

    pub fn is_root(&self) -> bool {
        matches!(self, LoopLevel::Root)
    }

    /// Does the `For` loop named `loop_name` correspond to this loop level?
    /// Mirrors `LoopLevel::match`: the synthetic root loop is named
    /// `".<root>"`, and every other loop is named `"{func}.{var}"`.
    pub fn matches_for_name(&self, loop_name: &str) -> bool {
        match self {
            LoopLevel::Inline => false,
            LoopLevel::Root => loop_name == ".<root>",
            LoopLevel::At { func, var } => {
                loop_name.starts_with(&format!("{func}.")) && loop_name.ends_with(&format!(".{var}"))
            }
        }
    }
}

/// `old_var = outer*factor + inner`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub old_var: String,
    pub outer: String,
    pub inner: String,
    pub factor: i64,
}

/// One loop variable after splits, innermost-first, with its for-loop kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dim {
    pub var: String,
    pub for_type: ForType,
}

/// An explicit loop bound the user has asserted (`Schedule::bound`).
#[derive(Clone, Debug)]
pub struct Bound {
    pub var: String,
    pub min: Expr,
    pub extent: Expr,
}

/// How a Function (or its reduction step) is computed and stored.
#[derive(Clone, Debug)]
pub struct Schedule {
    pub store_level: LoopLevel,
    pub compute_level: LoopLevel,
    pub splits: Vec<Split>,
    pub dims: Vec<Dim>,
    pub storage_dims: Vec<String>,
    pub bounds: Vec<Bound>,
}

impl Schedule {
    /// A freshly created Function's default schedule: inline, with `dims`
    /// left in the definition's own argument order.
    pub fn new(pure_args: &[String]) -> Schedule {
        Schedule {
            store_level: LoopLevel::Inline,
            compute_level: LoopLevel::Inline,
            splits: Vec::new(),
            dims: pure_args
                .iter()
                .map(|v| Dim {
                    var: v.clone(),
                    for_type: ForType::Serial,
                })
                .collect(),
            storage_dims: pure_args.to_vec(),
            bounds: Vec::new(),
        }
    }

    pub fn compute_root(&mut self) {
        self.compute_level = LoopLevel::Root;
        if matches!(self.store_level, LoopLevel::Inline) {
            self.store_level = LoopLevel::Root;
        }
    }

    pub fn store_root(&mut self) {
        self.store_level = LoopLevel::Root;
    }

    pub fn compute_at(&mut self, func: impl Into<String>, var: impl Into<String>) {
        self.compute_level = LoopLevel::At {
            func: func.into(),
            var: var.into(),
        };
        if matches!(self.store_level, LoopLevel::Inline) {
            self.store_level = self.compute_level.clone();
        }
    }

    pub fn store_at(&mut self, func: impl Into<String>, var: impl Into<String>) {
        self.store_level = LoopLevel::At {
            func: func.into(),
            var: var.into(),
        };
    }

    pub fn compute_inline(&mut self) {
        self.compute_level = LoopLevel::Inline;
        self.store_level = LoopLevel::Inline;
    }

    /// `old_var = outer*factor + inner`; updates `dims` in place, replacing
    /// `old_var` with `outer`, `inner` at the same position.
    pub fn split(&mut self, old_var: &str, outer: impl Into<String>, inner: impl Into<String>, factor: i64) {
        let outer = outer.into();
        let inner = inner.into();
        if let Some(pos) = self.dims.iter().position(|d| d.var == old_var) {
            let for_type = self.dims[pos].for_type;
            self.dims.splice(
                pos..=pos,
                [
                    Dim {
                        var: outer.clone(),
                        for_type,
                    },
                    Dim {
                        var: inner.clone(),
                        for_type,
                    },
                ],
            );
        }
        self.splits.push(Split {
            old_var: old_var.to_string(),
            outer,
            inner,
            factor,
        });
    }

    /// Reorder `dims` to match `order` (innermost-first).
    pub fn reorder(&mut self, order: &[&str]) {
        let mut reordered = Vec::with_capacity(self.dims.len());
        for name in order {
            if let Some(pos) = self.dims.iter().position(|d| &d.var == name) {
                reordered.push(self.dims.remove(pos));
            }
        }
        reordered.extend(self.dims.drain(..));
        self.dims = reordered;
    }

    pub fn vectorize(&mut self, var: &str) {
        self.set_for_type(var, ForType::Vectorized);
    }

    pub fn unroll(&mut self, var: &str) {
        self.set_for_type(var, ForType::Unrolled);
    }

    pub fn parallel(&mut self, var: &str) {
        self.set_for_type(var, ForType::Parallel);
    }

    fn set_for_type(&mut self, var: &str, for_type: ForType) {
        if let Some(d) = self.dims.iter_mut().find(|d| d.var == var) {
            d.for_type = for_type;
        }
    }

    pub fn bound(&mut self, var: impl Into<String>, min: Expr, extent: Expr) {
        self.bounds.push(Bound {
            var: var.into(),
            min,
            extent,
        });
    }

    pub fn tile(
        &mut self,
        x: &str,
        y: &str,
        xo: impl Into<String>,
        yo: impl Into<String>,
        xi: impl Into<String>,
        yi: impl Into<String>,
        x_factor: i64,
        y_factor: i64,
    ) {
        let xo = xo.into();
        let xi = xi.into();
        let yo = yo.into();
        let yi = yi.into();
        self.split(x, xo.clone(), xi.clone(), x_factor);
        self.split(y, yo.clone(), yi.clone(), y_factor);
        self.reorder(&[&xi, &yi, &xo, &yo]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_at_also_sets_store_level_when_inline() {
        let mut s = Schedule::new(&["x".into(), "y".into()]);
        s.compute_at("f", "y");
        assert_eq!(s.store_level, s.compute_level);
    }

    #[test]
    fn split_replaces_dim_in_place() {
        let mut s = Schedule::new(&["x".into()]);
        s.split("x", "xo", "xi", 4);
        assert_eq!(s.dims.len(), 2);
        assert_eq!(s.dims[0].var, "xo");
        assert_eq!(s.dims[1].var, "xi");
    }

    #[test]
    fn reorder_respects_requested_order() {
        let mut s = Schedule::new(&["x".into(), "y".into()]);
        s.reorder(&["y", "x"]);
        assert_eq!(s.dims[0].var, "y");
        assert_eq!(s.dims[1].var, "x");
    }
}
