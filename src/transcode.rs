//! WAV conversion through an external ffmpeg.
//!
//! AC-3 output plays in most tools, but the original workflow also dumped
//! PCM WAV copies for quick audition. Decoding stays out of this tool:
//! conversion shells out to ffmpeg when one can be found.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, bail};
use sgb::process::write::{OutputFile, OutputFormat};

/// Subdirectory of the output directory that receives WAV files.
pub const WAV_SUBDIR: &str = "wav_converted";

/// Handle to a discovered ffmpeg executable.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    version: Option<String>,
}

impl Transcoder {
    /// Resolves ffmpeg from an explicit path or `PATH`.
    ///
    /// An explicit path must exist; without one, `PATH` is searched. Either
    /// way a missing ffmpeg fails here, before any extraction work starts.
    pub fn discover(override_path: Option<&Path>) -> Result<Self> {
        let ffmpeg = match override_path {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => bail!("ffmpeg not found at {}", path.display()),
            None => match which::which("ffmpeg") {
                Ok(path) => path,
                Err(_) => bail!("ffmpeg not found; is it installed and in PATH?"),
            },
        };

        let version = detect_version(&ffmpeg);
        match &version {
            Some(version) => log::debug!("Using {}: {version}", ffmpeg.display()),
            None => log::warn!(
                "{} did not report a version, continuing anyway",
                ffmpeg.display()
            ),
        }

        Ok(Self { ffmpeg, version })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Converts one `.ac3` file to 16-bit 44.1kHz PCM WAV.
    ///
    /// The WAV bytes are never inspected; only existence and size are
    /// reported back.
    pub fn convert(&self, ac3: &Path, wav: &Path) -> Result<OutputFile> {
        let output = Command::new(&self.ffmpeg)
            .arg("-i")
            .arg(ac3)
            .args(["-acodec", "pcm_s16le", "-ar", "44100", "-y"])
            .arg(wav)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output");
            bail!(
                "ffmpeg failed on {} ({}): {reason}",
                ac3.display(),
                output.status
            );
        }

        log::debug!("converted {} -> {}", ac3.display(), wav.display());
        Ok(OutputFile {
            path: wav.to_path_buf(),
            format: OutputFormat::Wav,
            bytes: fs::metadata(wav).map(|meta| meta.len()).unwrap_or(0),
        })
    }
}

/// WAV path for an extracted `.ac3` file: `<output_dir>/wav_converted/<stem>.wav`.
pub fn wav_output_path(output_dir: &Path, ac3: &Path) -> PathBuf {
    let stem = ac3
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("stream"));

    output_dir.join(WAV_SUBDIR).join(format!("{stem}.wav"))
}

/// Run `ffmpeg -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[test]
fn wav_paths_mirror_ac3_names() {
    let out = Path::new("/tmp/extracted_ac3");

    assert_eq!(
        wav_output_path(out, Path::new("/tmp/extracted_ac3/demo_00_music.ac3")),
        PathBuf::from("/tmp/extracted_ac3/wav_converted/demo_00_music.wav")
    );
    assert_eq!(
        wav_output_path(out, Path::new("relative/bank_02_demo.ac3")),
        PathBuf::from("/tmp/extracted_ac3/wav_converted/bank_02_demo.wav")
    );
}

#[test]
fn discover_rejects_missing_override() {
    let dir = tempfile::tempdir().unwrap();
    let result = Transcoder::discover(Some(&dir.path().join("no_such_ffmpeg")));
    assert!(result.is_err());
}
