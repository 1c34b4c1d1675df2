//! The compiler core: types, IR, traversal framework, simplifier, bounds
//! engine, Function/Schedule model, and lowering driver (spec §1, §2).

pub mod bounds;
pub mod config;
pub mod diagnostic;
pub mod func;
pub mod ir;
pub mod lower;
pub mod pipeline;
pub mod schedule;
pub mod scope;
pub mod simplify;
pub mod types;

pub use config::LowerConfig;
pub use diagnostic::{Diagnostic, LowerError};
pub use func::Function;
pub use lower::lower;
pub use schedule::{LoopLevel, Schedule};
pub use types::Type;
