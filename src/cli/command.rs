use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use sgb::process::classify::{AudioType, RoleTable};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nsgb ",
    env!("SGB_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Extract AC-3 audio streams from Puppeteer .sgb sound banks",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Abort on the first failed stream or container instead of skipping it.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract every AC-3 stream from the given sound banks.
    Extract(ExtractArgs),

    /// Print container and stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input .sgb file, or a directory scanned for .sgb files.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory (default: "extracted_ac3" next to the input).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Roles assigned within each stream group, in order.
    #[arg(long, value_enum, value_name = "ROLES", value_delimiter = ',')]
    pub roles: Option<Vec<RoleName>>,

    /// Worker threads for per-stream extraction.
    #[arg(long, value_name = "N", default_value_t = NonZeroUsize::MIN)]
    pub jobs: NonZeroUsize,

    /// Convert extracted streams to WAV with ffmpeg.
    #[arg(long)]
    pub wav: bool,

    /// Path to the ffmpeg executable (default: search PATH).
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Write a YAML manifest next to the extracted streams.
    #[arg(long)]
    pub manifest: bool,
}

impl ExtractArgs {
    /// Role table from `--roles`, or the stock three-per-group layout.
    pub fn role_table(&self) -> RoleTable {
        match &self.roles {
            Some(roles) => RoleTable::new(
                roles.len(),
                roles.iter().map(|role| AudioType::from(*role)).collect(),
            ),
            None => RoleTable::default(),
        }
    }
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input .sgb container.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleName {
    Music,
    Ambient,
    Demo,
    Unknown,
}

impl From<RoleName> for AudioType {
    fn from(role: RoleName) -> Self {
        match role {
            RoleName::Music => AudioType::Music,
            RoleName::Ambient => AudioType::Ambient,
            RoleName::Demo => AudioType::Demo,
            RoleName::Unknown => AudioType::Unknown,
        }
    }
}

#[test]
fn role_table_from_cli_roles() {
    let args = ExtractArgs {
        input: PathBuf::from("bank.sgb"),
        output_dir: None,
        roles: Some(vec![RoleName::Music, RoleName::Demo]),
        jobs: NonZeroUsize::MIN,
        wav: false,
        ffmpeg: None,
        manifest: false,
    };

    let table = args.role_table();
    assert_eq!(table.group_size(), 2);
    assert_eq!(table.classify(0, 2), AudioType::Music);
    assert_eq!(table.classify(1, 2), AudioType::Demo);

    let default_args = ExtractArgs { roles: None, ..args };
    assert_eq!(default_args.role_table(), RoleTable::default());
}
