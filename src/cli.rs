use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

/// Build identifier baked in at compile time (`EMV_COMMIT=$(git rev-parse --short HEAD)`)
pub const COMMIT: &str = match option_env!("EMV_COMMIT") {
    Some(commit) => commit,
    None => "none",
};

fn banner() -> String {
    format!("emv v{} ({})", env!("CARGO_PKG_VERSION"), COMMIT)
}

#[derive(Parser, Debug)]
#[command(name = "emv")]
#[command(about = "Embed values into files using regex rules from a config file")]
#[command(long_about = "emv resolves the VALUEs given on the command line against the \"values\"
section of its config, then rewrites every target file with the config's embed rules.

A value may carry a pattern with named capture groups; each captured group becomes
a value of its own. Replacement templates reference values as {{.name}}.

EXAMPLES:
  emv 3.4.1                         Embed version 3.4.1 using ./emv.json
  emv -c release.json 3.4.1 2024-05-01
  emv -t ./packages 3.4.1           Resolve target files against ./packages
  emv -n 3.4.1                      Preview changes without writing")]
#[command(version)]
#[command(before_help = banner())]
#[command(override_usage = "emv [-c CONFIG] [-t TARGET] VALUE1 ...")]
struct Cli {
    /// Config file path
    #[arg(short = 'c', long, value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// The base directory to search for target files. If not specified, it is the same directory as the config file
    #[arg(short = 't', long, value_name = "TARGET")]
    target: Option<PathBuf>,

    /// Show what would change without modifying any file
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Log resolved values and compiled rules to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    no_color: bool,

    /// Values, one per entry of the config's "values" list, in order
    #[arg(value_name = "VALUE")]
    values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: PathBuf,
    pub target: Option<PathBuf>,
    pub values: Vec<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub no_color: bool,
}

impl From<Cli> for Args {
    fn from(cli: Cli) -> Self {
        Args {
            config: cli.config,
            target: cli.target,
            values: cli.values,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
            no_color: cli.no_color,
        }
    }
}

pub fn parse_args() -> Args {
    Cli::parse().into()
}

pub fn try_parse_from<I, T>(itr: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr).map(Args::from)
}

/// Full help text, as printed by --help
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = try_parse_from(["emv", "3.4.1"]).unwrap();
        assert_eq!(args.config, PathBuf::from("emv.json"));
        assert_eq!(args.target, None);
        assert_eq!(args.values, vec!["3.4.1"]);
        assert!(!args.dry_run);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_options() {
        let args = try_parse_from([
            "emv", "-c", "cfg/emv.toml", "-t", "pkg", "-n", "-v", "--no-color", "3.4.1", "2021-12-24",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("cfg/emv.toml"));
        assert_eq!(args.target, Some(PathBuf::from("pkg")));
        assert_eq!(args.values, vec!["3.4.1", "2021-12-24"]);
        assert!(args.dry_run && args.verbose && args.no_color);
    }

    #[test]
    fn test_no_values_parses() {
        let args = try_parse_from(["emv"]).unwrap();
        assert!(args.values.is_empty());
    }

    #[test]
    fn test_usage_contains_banner() {
        let text = usage();
        assert!(text.contains(&format!("emv v{}", env!("CARGO_PKG_VERSION"))));
        assert!(text.contains("--config"));
        assert!(text.contains("--target"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
