//! Binary crate for the `cityweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts (configuration and the city loop)
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so they never mix with rendered weather on stdout.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "cityweather=debug,cityweather_core=debug,reqwest=info"
    } else {
        "cityweather=info,cityweather_core=info,reqwest=warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_both_crates() {
        let quiet = default_directives(false);
        assert!(quiet.contains("cityweather=info"));
        assert!(quiet.contains("cityweather_core=info"));
        assert!(quiet.contains("reqwest=warn"));

        let verbose = default_directives(true);
        assert!(verbose.contains("cityweather_core=debug"));
    }

    #[test]
    fn default_directives_parse() {
        for verbose in [false, true] {
            for directive in default_directives(verbose).split(',') {
                assert!(
                    directive.parse::<tracing_subscriber::filter::Directive>().is_ok(),
                    "bad directive {directive}"
                );
            }
        }
    }
}
