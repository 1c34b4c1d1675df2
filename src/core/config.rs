//! Lowering configuration (spec §3.3, §6.4), in the shape of the teacher's
//! `config::target::TerrainConfig`: collect every environment/target knob
//! into one struct read once, instead of scattering `env::var` calls
//! through the passes.

use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    None,
    RealizationsAndPipelines,
    AlsoForLoops,
    AlsoProvides,
}

impl TraceLevel {
    pub fn from_int(v: u32) -> TraceLevel {
        match v {
            0 => TraceLevel::None,
            1 => TraceLevel::RealizationsAndPipelines,
            2 => TraceLevel::AlsoForLoops,
            _ => TraceLevel::AlsoProvides,
        }
    }

    pub fn traces_for_loops(&self) -> bool {
        matches!(self, TraceLevel::AlsoForLoops | TraceLevel::AlsoProvides)
    }

    pub fn traces_provides(&self) -> bool {
        matches!(self, TraceLevel::AlsoProvides)
    }

    pub fn traces_realizations(&self) -> bool {
        !matches!(self, TraceLevel::None)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowerConfig {
    pub trace_level: TraceLevel,
    pub disable_bounds_checking: bool,
    pub debug_codegen: u32,
    pub target: String,
    pub num_threads: u32,
}

impl Default for LowerConfig {
    fn default() -> Self {
        LowerConfig {
            trace_level: TraceLevel::None,
            disable_bounds_checking: false,
            debug_codegen: 0,
            target: "x86".to_string(),
            num_threads: 1,
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

impl LowerConfig {
    /// Read the five environment variables from spec §6.4.
    pub fn from_env() -> LowerConfig {
        LowerConfig {
            trace_level: TraceLevel::from_int(env_u32("HL_TRACE", 0)),
            disable_bounds_checking: env_bool("HL_DISABLE_BOUNDS_CHECKING", false),
            debug_codegen: env_u32("HL_DEBUG_CODEGEN", 0),
            target: env::var("HL_TARGET").unwrap_or_else(|_| "x86".to_string()),
            num_threads: env_u32("HL_NUMTHREADS", 1),
        }
    }

    /// `eprintln!` gated by `debug_codegen`, following the teacher's own
    /// ambient-logging convention (no `log`/`tracing` dependency).
    pub fn debug_log(&self, level: u32, message: impl Fn() -> String) {
        if self.debug_codegen >= level {
            eprintln!("[lower] {}", message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_traces_nothing() {
        let c = LowerConfig::default();
        assert_eq!(c.trace_level, TraceLevel::None);
        assert!(!c.disable_bounds_checking);
    }

    #[test]
    fn trace_level_thresholds() {
        assert!(!TraceLevel::RealizationsAndPipelines.traces_for_loops());
        assert!(TraceLevel::AlsoForLoops.traces_for_loops());
        assert!(!TraceLevel::AlsoForLoops.traces_provides());
        assert!(TraceLevel::AlsoProvides.traces_provides());
    }
}
