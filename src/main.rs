//! GBADs engine CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; a failure is logged
//! as a FATAL event and the process exits non-zero.

use gbads_engine::cli;
use gbads_engine::observability::Logger;

fn main() {
    if let Err(e) = cli::run() {
        Logger::fatal("CLI_FAILED", &[("code", e.code()), ("error", &e.to_string())]);
        std::process::exit(1);
    }
}
