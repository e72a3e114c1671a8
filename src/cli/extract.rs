use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use sgb::process::classify::RoleTable;
use sgb::process::extract::extract_all_parallel;
use sgb::process::read::Container;
use sgb::process::write::{OutputFile, Writer};

use super::command::{Cli, ExtractArgs};
use crate::manifest::{Manifest, ManifestStream};
use crate::transcode::{Transcoder, WAV_SUBDIR, wav_output_path};

const DEFAULT_OUTPUT_DIR: &str = "extracted_ac3";

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let inputs = discover_inputs(&args.input)?;
    if inputs.is_empty() {
        bail!("No .sgb files found in {}", args.input.display());
    }

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => default_output_dir(&args.input),
    };

    // A requested conversion with no ffmpeg fails here, before any
    // extraction work starts.
    let transcoder = if args.wav {
        let transcoder = Transcoder::discover(args.ffmpeg.as_deref())?;
        log::info!(
            "WAV conversion via {}",
            transcoder.version().unwrap_or("ffmpeg (unknown version)")
        );
        Some(transcoder)
    } else {
        None
    };

    let table = args.role_table();
    let writer = Writer::new(&output_dir);

    log::info!(
        "Extracting {} bank(s) into {}",
        inputs.len(),
        output_dir.display()
    );

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new(inputs.len() as u64));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} banks ({percent}%)\n{msg}",
        )?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut summary = Summary::default();
    let mut written = Vec::new();

    for path in &inputs {
        if let Some(ref pb) = pb {
            pb.set_message(path.display().to_string());
        }

        match process_container(path, &table, &writer, args, cli, pb.as_ref()) {
            Ok(outcome) => {
                summary.containers += 1;
                summary.streams_extracted += outcome.written.len();
                summary.streams_failed += outcome.failed;
                written.extend(outcome.written);
            }
            Err(error) => {
                if cli.strict {
                    return Err(error);
                }
                summary.containers_failed += 1;
                log::error!("{}: {error:#}", path.display());
            }
        }

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    if let Some(ref transcoder) = transcoder {
        let (converted, failed) = convert_outputs(transcoder, &output_dir, &written, cli, multi)?;
        summary.wav_converted = converted;
        summary.wav_failed = failed;
    }

    summary.display(&output_dir, args.wav);

    if summary.containers == 0 {
        bail!("No container could be processed");
    }

    Ok(())
}

struct ContainerOutcome {
    written: Vec<OutputFile>,
    failed: usize,
}

fn process_container(
    path: &Path,
    table: &RoleTable,
    writer: &Writer,
    args: &ExtractArgs,
    cli: &Cli,
    pb: Option<&ProgressBar>,
) -> Result<ContainerOutcome> {
    let container =
        Container::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let total = container.stream_count();

    if total == 0 {
        log::warn!("{}: container holds no streams", container.name());
    }

    let results = extract_all_parallel(&container, table, args.jobs);

    let mut manifest = args.manifest.then(|| Manifest::new(&container));
    let mut written = Vec::new();
    let mut failed = 0usize;

    for (n, (descriptor, result)) in container.streams().iter().zip(results).enumerate() {
        if let Some(pb) = pb {
            pb.set_message(format!("{}: stream {}/{total}", container.name(), n + 1));
        }

        match result {
            Ok(stream) => {
                let output = writer.write(&stream).with_context(|| {
                    format!("Failed to write stream {} of {}", stream.index, path.display())
                })?;

                log::info!(
                    "{} ({} bytes)",
                    output.path.display(),
                    output.bytes
                );

                if let Some(ref mut manifest) = manifest {
                    manifest.streams.push(ManifestStream {
                        index: stream.index,
                        role: stream.role.to_string(),
                        offset: descriptor.offset,
                        length: output.bytes,
                        output: output
                            .path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned()),
                        error: None,
                    });
                }

                written.push(output);
            }
            Err(error) => {
                log::error!("{}: {error}", container.name());
                if cli.strict {
                    return Err(error).with_context(|| format!("in {}", path.display()));
                }

                failed += 1;
                if let Some(ref mut manifest) = manifest {
                    manifest.streams.push(ManifestStream {
                        index: error.index(),
                        role: table.classify(error.index(), total).to_string(),
                        offset: descriptor.offset,
                        length: descriptor.declared_length.unwrap_or(0),
                        output: None,
                        error: Some(error.to_string()),
                    });
                }
            }
        }
    }

    if let Some(manifest) = manifest {
        let manifest_path = Manifest::path_for(writer.output_dir(), container.name());
        manifest.write(&manifest_path)?;
    }

    log::info!(
        "{}: extracted {} of {total} streams",
        container.name(),
        written.len()
    );

    Ok(ContainerOutcome { written, failed })
}

fn convert_outputs(
    transcoder: &Transcoder,
    output_dir: &Path,
    outputs: &[OutputFile],
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<(usize, usize)> {
    if outputs.is_empty() {
        return Ok((0, 0));
    }

    let wav_dir = output_dir.join(WAV_SUBDIR);
    fs::create_dir_all(&wav_dir)
        .with_context(|| format!("Failed to create {}", wav_dir.display()))?;

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new(outputs.len() as u64));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.green/white} {pos}/{len} wav ({percent}%)\n{msg}",
        )?);
        Some(pb)
    } else {
        None
    };

    let mut converted = 0usize;
    let mut failed = 0usize;

    for output in outputs {
        let wav = wav_output_path(output_dir, &output.path);

        if let Some(ref pb) = pb {
            pb.set_message(wav.display().to_string());
        }

        match transcoder.convert(&output.path, &wav) {
            Ok(wav_file) => {
                converted += 1;
                log::info!("{} ({} bytes)", wav_file.path.display(), wav_file.bytes);
            }
            Err(error) => {
                if cli.strict {
                    return Err(error);
                }
                failed += 1;
                log::error!("{error:#}");
            }
        }

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    Ok((converted, failed))
}

#[derive(Default)]
struct Summary {
    containers: usize,
    containers_failed: usize,
    streams_extracted: usize,
    streams_failed: usize,
    wav_converted: usize,
    wav_failed: usize,
}

impl Summary {
    fn display(&self, output_dir: &Path, wav: bool) {
        println!();
        println!("Extraction Summary");
        println!("  Containers processed      {}", self.containers);
        println!("  Containers failed         {}", self.containers_failed);
        println!("  Streams extracted         {}", self.streams_extracted);
        println!("  Streams failed            {}", self.streams_failed);
        println!("  Output directory          {}", output_dir.display());
        if wav {
            println!("  WAV converted             {}", self.wav_converted);
            println!("  WAV failed                {}", self.wav_failed);
        }
        println!();
    }
}

/// A single `.sgb` file, or every `.sgb` file directly inside a directory.
/// The extension match ignores case, game dumps are wild about it.
fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(input)
        .with_context(|| format!("Cannot read input {}", input.display()))?;

    if metadata.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut banks = Vec::new();
    for entry in
        fs::read_dir(input).with_context(|| format!("Cannot list {}", input.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_sgb_extension(&path) {
            banks.push(path);
        }
    }

    // Deterministic batch order regardless of directory enumeration.
    banks.sort();
    Ok(banks)
}

fn has_sgb_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sgb"))
}

fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(DEFAULT_OUTPUT_DIR)
    } else {
        match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(DEFAULT_OUTPUT_DIR),
            _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[test]
fn sgb_extension_matching_ignores_case() {
    assert!(has_sgb_extension(Path::new("bank.sgb")));
    assert!(has_sgb_extension(Path::new("BANK.SGB")));
    assert!(has_sgb_extension(Path::new("dir/bank.Sgb")));
    assert!(!has_sgb_extension(Path::new("bank.sgb.bak")));
    assert!(!has_sgb_extension(Path::new("banksgb")));
}

#[test]
fn discovers_sorted_banks_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.sgb", "a.SGB", "ignore.txt", "c.sgb"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }

    let banks = discover_inputs(dir.path()).unwrap();
    let names: Vec<_> = banks
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.SGB", "b.sgb", "c.sgb"]);
}

#[test]
fn default_output_dir_sits_next_to_input() {
    assert_eq!(
        default_output_dir(Path::new("dumps/bank.sgb")),
        PathBuf::from("dumps/extracted_ac3")
    );
    assert_eq!(
        default_output_dir(Path::new("bank.sgb")),
        PathBuf::from("extracted_ac3")
    );
}
