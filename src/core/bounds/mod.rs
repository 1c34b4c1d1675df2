//! Bounds and region analysis (spec §4.F): symbolic interval arithmetic
//! plus the region-footprint queries built on top of it, grounded in
//! `original_source/cpp/src/Bounds.h`/`Bounds.cpp`.

pub mod interval;
pub mod region;

pub use interval::{bounds_of_expr, bounds_of_expr_in_scope, interval_union, Interval};
pub use region::{
    region_called, region_provided, region_touched, region_union, regions_called,
    regions_provided, regions_touched, Region,
};
