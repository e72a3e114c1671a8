use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use sgb::process::extract::extract_all;
use sgb::process::read::Container;
use sgb::structs::ac3::StreamStats;
use sgb::utils::errors::ExtractError;

use super::command::{Cli, InfoArgs};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing container: {}", args.input.display());

    let container = Container::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Walking sync frames...");
        Some(pb)
    } else {
        None
    };

    let reports = build_reports(&container);

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    display_container_info(&container, &args.input);
    for report in &reports {
        display_stream_report(report);
    }

    let invalid = reports.iter().filter(|report| report.detail.is_err()).count();
    if invalid > 0 {
        log::warn!("{invalid} of {} streams failed validation", reports.len());
        if cli.strict {
            bail!("{invalid} invalid streams in {}", args.input.display());
        }
    }

    Ok(())
}

struct StreamReport {
    index: usize,
    role: String,
    offset: u64,
    length: u64,
    length_inferred: bool,
    detail: Result<StreamStats, String>,
}

fn build_reports(container: &Container) -> Vec<StreamReport> {
    let table = sgb::process::classify::RoleTable::default();
    let results = extract_all(container, &table);

    container
        .streams()
        .iter()
        .zip(results)
        .map(|(descriptor, result)| {
            let (length, detail) = match result {
                Ok(stream) => (
                    stream.len() as u64,
                    StreamStats::scan(stream.payload).map_err(|e| e.to_string()),
                ),
                Err(ExtractError::InvalidPayload { source, .. }) => (
                    descriptor.declared_length.unwrap_or(0),
                    Err(source.to_string()),
                ),
                Err(error) => (descriptor.declared_length.unwrap_or(0), Err(error.to_string())),
            };

            StreamReport {
                index: descriptor.index,
                role: table.classify(descriptor.index, container.stream_count()).to_string(),
                offset: descriptor.offset,
                length,
                length_inferred: descriptor.declared_length.is_none(),
                detail,
            }
        })
        .collect()
}

fn display_container_info(container: &Container, input: &std::path::Path) {
    println!();
    println!("SGB Container Information");
    println!("=========================");
    println!();
    println!("Container");
    println!("  Source                    {}", input.display());

    let size_mb = container.len() as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        container.len()
    );
    println!("  Streams                   {}", container.stream_count());
    println!();
}

fn display_stream_report(report: &StreamReport) {
    println!("Stream {:02} ({})", report.index, report.role);
    println!("  Offset                    {}", report.offset);
    println!(
        "  Length                    {} bytes ({})",
        report.length,
        if report.length_inferred {
            "inferred"
        } else {
            "declared"
        }
    );

    match &report.detail {
        Ok(stats) => {
            println!("  Sample rate               {} Hz", stats.sync.sample_rate());
            println!("  Bitrate                   {} kbps", stats.sync.bitrate_kbps());

            let trailing = report.length as usize - stats.bytes;
            if trailing > 0 {
                println!(
                    "  Frames                    {} ({trailing} trailing bytes)",
                    stats.frames
                );
            } else {
                println!("  Frames                    {}", stats.frames);
            }
            println!(
                "  Duration                  {}",
                time_str(stats.duration_secs())
            );
        }
        Err(message) => {
            println!("  Invalid                   {message}");
        }
    }
    println!();
}

fn time_str(sec: f64) -> String {
    let ms = sec * 1000f64;
    let hours = (ms / 3600000f64) as u64;
    let minutes = ((ms % 3600000f64) / 60000f64) as u64;
    let seconds = ((ms % 60000f64) / 1000f64) as u64;
    let milliseconds = (ms % 1000f64) as u64;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

#[test]
fn time_str_formats() {
    assert_eq!(time_str(0.0), "00:00:00.000");
    assert_eq!(time_str(4.0), "00:00:04.000");
    assert_eq!(time_str(3723.5), "01:02:03.500");
}
