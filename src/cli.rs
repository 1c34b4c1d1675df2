//! The `stencilc` command line (spec §3.4): a single `lower` subcommand that
//! reads a pipeline description and prints the lowered statement tree, in
//! the shape of the teacher's `cli/*.rs` (one `Args` struct per subcommand,
//! a `cmd_*` function doing the work, `eprintln!`/`process::exit` for
//! reporting). This binary has no front-end parser of its own — the
//! pipeline description is the input format, not a language.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Args;

use crate::core::config::LowerConfig;
use crate::core::pipeline::{self, PipelineDto};

#[derive(Args)]
pub struct LowerArgs {
    /// Pipeline description file (JSON)
    pub input: PathBuf,
    /// Execution trace level: 0 (none) .. 3 (also Provide)
    #[arg(long, default_value_t = 0)]
    pub trace: u32,
    /// Target triple passed through to `LowerConfig`
    #[arg(long, default_value = "x86")]
    pub target: String,
}

fn read_pipeline(path: &PathBuf) -> Result<PipelineDto, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("malformed pipeline description: {}", e))
}

pub fn cmd_lower(args: LowerArgs) {
    let dto = match read_pipeline(&args.input) {
        Ok(dto) => dto,
        Err(msg) => {
            eprintln!("error: {}", msg);
            process::exit(1);
        }
    };

    let (universe, root) = match pipeline::to_universe(&dto) {
        Ok(pair) => pair,
        Err(err) => {
            crate::core::Diagnostic::from(&err).render();
            process::exit(1);
        }
    };

    let mut config = LowerConfig::default();
    config.target = args.target;
    config.trace_level = crate::core::config::TraceLevel::from_int(args.trace);

    match crate::core::lower(&root, &universe, &config) {
        Ok(stmt) => println!("{}", stmt),
        Err(err) => {
            crate::core::Diagnostic::from(&err).render();
            process::exit(1);
        }
    }
}
