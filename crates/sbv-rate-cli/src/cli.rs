//! CLI argument definitions for `sbv-rate`.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `DATE` | today (UTC+7) | Target date, `YYYY-MM-DD` |
//! | `--debug`, `-d` | `false` | Verbose logs and raw payload dumps |
//! | `--policy` | `priority` | `priority` or `median` |
//! | `--source` | all | Restrict the chain (repeatable) |
//! | `--strict-band` | `false` | Use the 24000–28000 band |
//! | `--band-min`/`--band-max` | | Custom band bounds |
//! | `--timeout-ms` | catalog | Per-request HTTP timeout |
//! | `--render` | `false` | Add the headless-browser SBV source |
//! | `--dump-dir` | `.` | Directory for debug artifacts |
//! | `--format` | `text` | `text` or `json` |
//!
//! Flags override the matching `SBV_RATE_*` environment variables.
//!
//! # Examples
//!
//! ```bash
//! sbv-rate 2023-09-01
//! sbv-rate --policy median --format json
//! sbv-rate 2024-03-15 --source sbv-english --source vietcombank -d
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;

/// USD/VND central rate from the State Bank of Vietnam.
#[derive(Debug, Parser)]
#[command(
    name = "sbv-rate",
    author,
    version,
    about = "Resolve the SBV USD/VND central rate for a date",
    long_about = "Queries the State Bank of Vietnam pages first, then commercial bank feeds \
and an international API, and prints the resolved USD/VND rate.\n\
\n\
Exit codes: 0 found, 2 invalid input, 3 not found, 4 missing dependency, \
10 I/O or serialization failure."
)]
pub struct Cli {
    /// Target date in YYYY-MM-DD format. Defaults to today in Vietnam.
    pub date: Option<String>,

    /// Enable debug logs and write raw source payloads to the dump directory.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Resolution policy: priority or median.
    #[arg(long)]
    pub policy: Option<String>,

    /// Query only these sources (e.g. sbv-english, vietcombank).
    #[arg(long = "source", value_name = "ID")]
    pub sources: Vec<String>,

    /// Use the strict 24000-28000 VND plausibility band.
    #[arg(long, default_value_t = false, conflicts_with_all = ["band_min", "band_max"])]
    pub strict_band: bool,

    /// Lower bound of a custom plausibility band, in VND.
    #[arg(long, requires = "band_max")]
    pub band_min: Option<Decimal>,

    /// Upper bound of a custom plausibility band, in VND.
    #[arg(long, requires = "band_min")]
    pub band_max: Option<Decimal>,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Also query the SBV page through a headless Chromium/Chrome.
    #[arg(long, default_value_t = false)]
    pub render: bool,

    /// Directory for debug artifacts.
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Full resolution report as JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["sbv-rate"]).expect("valid args");
        assert_eq!(cli.date, None);
        assert!(!cli.debug);
        assert!(cli.sources.is_empty());
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parses_full_invocation() {
        let cli = Cli::try_parse_from([
            "sbv-rate",
            "2023-09-01",
            "-d",
            "--policy",
            "median",
            "--source",
            "sbv-english",
            "--source",
            "bidv",
            "--band-min",
            "23000",
            "--band-max",
            "25000",
            "--timeout-ms",
            "5000",
            "--format",
            "json",
        ])
        .expect("valid args");

        assert_eq!(cli.date.as_deref(), Some("2023-09-01"));
        assert!(cli.debug);
        assert_eq!(cli.policy.as_deref(), Some("median"));
        assert_eq!(cli.sources, vec!["sbv-english", "bidv"]);
        assert_eq!(cli.band_min, Some(dec!(23000)));
        assert_eq!(cli.band_max, Some(dec!(25000)));
        assert_eq!(cli.timeout_ms, Some(5_000));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn band_bounds_come_in_pairs() {
        assert!(Cli::try_parse_from(["sbv-rate", "--band-min", "23000"]).is_err());
        assert!(
            Cli::try_parse_from(["sbv-rate", "--strict-band", "--band-min", "1", "--band-max", "2"])
                .is_err()
        );
    }
}
