use std::io::{self, Write};

use sbv_rate_core::{QuoteScale, Resolution};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(resolution: &Resolution, format: OutputFormat) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, resolution)?;
            writeln!(out)?;
        }
        OutputFormat::Text => render_text(&mut out, resolution)?,
    }
    out.flush()?;
    Ok(())
}

fn render_text<W: Write>(out: &mut W, resolution: &Resolution) -> Result<(), CliError> {
    let date = resolution_date(resolution);
    match &resolution.rate {
        Some(rate) => {
            writeln!(
                out,
                "USD/VND rate for {date}: 1 USD = {} VND",
                rate.vnd_per_usd().normalize()
            )?;
            if rate.scale == QuoteScale::Thousands {
                writeln!(out, "published as : {} (thousand VND)", rate.value)?;
            }
            writeln!(out, "origin       : {}", rate.origin.label())?;
            writeln!(
                out,
                "sources      : {}",
                join_ids(rate.contributing_sources.iter().map(|id| id.as_str()))
            )?;
        }
        None => writeln!(out, "No plausible USD/VND rate found for {date}")?,
    }

    writeln!(out, "policy       : {}", resolution.policy)?;
    writeln!(out, "latency_ms   : {}", resolution.latency_ms)?;

    let failures = resolution.failed_attempts().collect::<Vec<_>>();
    if !failures.is_empty() {
        writeln!(out, "failed sources:")?;
        for attempt in failures {
            match &attempt.error {
                Some(error) => writeln!(out, "  - {}: {}", attempt.source, error)?,
                None => writeln!(out, "  - {}: no payload", attempt.source)?,
            }
        }
    }

    Ok(())
}

fn resolution_date(resolution: &Resolution) -> String {
    let date = resolution.query_date;
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.collect::<Vec<_>>().join(",")
}
