//! Image/parameter bounds checks (spec §4.H.6), grounded in
//! `add_image_checks` (`original_source/cpp/src/Lower.cpp`). Every buffer an
//! `Image`-kind `Load` touches gets an assert that its required region has a
//! non-negative extent in every dimension, unless bounds checking is
//! disabled.

use std::collections::BTreeSet;

use crate::core::bounds::region_called;
use crate::core::config::LowerConfig;
use crate::core::ir::expr::*;
use crate::core::ir::mutator::{ExprMutator, StmtMutator};
use crate::core::ir::stmt::*;

fn collect_image_buffers(s: &Stmt, out: &mut BTreeSet<String>) {
    struct Collector<'a> {
        out: &'a mut BTreeSet<String>,
    }
    impl<'a> ExprMutator for Collector<'a> {
        fn visit_load(&mut self, e: &Expr, index: &Expr) -> Expr {
            if let ExprKind::Load { buffer_name, image, .. } = &e.kind {
                if *image {
                    self.out.insert(buffer_name.clone());
                }
            }
            self.mutate_expr(index);
            e.clone()
        }
    }
    impl<'a> StmtMutator for Collector<'a> {}
    let mut c = Collector { out };
    c.mutate_stmt(s);
}

/// Inject a non-negative-extent assert for every image buffer referenced in
/// `s`, plus `output`'s own computed region.
pub fn add_image_checks(s: Stmt, output: &str, config: &LowerConfig) -> Stmt {
    if config.disable_bounds_checking {
        return s;
    }
    let mut buffers = BTreeSet::new();
    collect_image_buffers(&s, &mut buffers);
    buffers.insert(output.to_string());

    let mut wrapped = s;
    for buf in buffers.into_iter().rev() {
        let region = region_called(&wrapped, &buf);
        for (i, (_min, extent)) in region.into_iter().enumerate().rev() {
            let cond = le(int32(0), extent);
            let message = format!("{} has a negative extent in dimension {}", buf, i);
            wrapped = block(vec![assert_stmt(cond, message), wrapped]);
        }
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Type;

    #[test]
    fn disabled_bounds_checking_skips_injection() {
        let s = store("out", int32(1), int32(0));
        let config = LowerConfig {
            disable_bounds_checking: true,
            ..LowerConfig::default()
        };
        let checked = add_image_checks(s.clone(), "out", &config);
        assert!(crate::core::ir::stmt::same_as(&checked, &s));
    }

    #[test]
    fn image_load_gets_an_extent_assert() {
        let idx = variable("i", Type::int(32, 1));
        let loaded = load(Type::int(32, 1), "buf", idx.clone(), true);
        let body = provide("out", loaded, vec![idx]);
        let config = LowerConfig::default();
        let checked = add_image_checks(body, "out", &config);
        assert!(format!("{}", checked).contains("negative extent"));
    }
}
