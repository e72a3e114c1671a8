//! YAML manifest describing one extraction run.
//!
//! Written next to the extracted streams so later tooling can tell which
//! payload came from where without reparsing the container. Failed
//! streams are recorded with their error instead of being dropped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use sgb::process::read::Container;

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub container: String,
    pub container_size: u64,
    pub stream_count: usize,
    pub creation_tool: String,
    pub creation_tool_version: String,
    pub streams: Vec<ManifestStream>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStream {
    pub index: usize,
    pub role: String,
    pub offset: u64,
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Manifest {
    /// Empty manifest for `container`, stamped with this tool's version.
    pub fn new(container: &Container) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            container: container.name().to_string(),
            container_size: container.len() as u64,
            stream_count: container.stream_count(),
            creation_tool: env!("CARGO_PKG_NAME").to_string(),
            creation_tool_version: env!("CARGO_PKG_VERSION").to_string(),
            streams: Vec::new(),
        }
    }

    /// Manifest file path for a container extracted into `output_dir`.
    pub fn path_for(output_dir: &Path, container_name: &str) -> PathBuf {
        output_dir.join(format!("{container_name}.extraction.yaml"))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_yaml_ng::to_string(self)?)?;
        log::debug!("wrote manifest {}", path.display());
        Ok(())
    }
}

#[test]
fn roundtrip() {
    let yaml_data = format!(
        r#"version: '{MANIFEST_VERSION}'
container: demo
containerSize: 56
streamCount: 3
creationTool: stringpuller
creationToolVersion: {}
streams:
- index: 0
  role: music
  offset: 32
  length: 8
  output: demo_00_music.ac3
- index: 1
  role: ambient
  offset: 40
  length: 8
  error: 'Invalid AC-3 sync word: read 0xFFFF, expected 0x0B77'
- index: 2
  role: demo
  offset: 48
  length: 8
  output: demo_02_demo.ac3
"#,
        env!("CARGO_PKG_VERSION")
    );

    let manifest: Manifest = serde_yaml_ng::from_str(&yaml_data).unwrap();
    assert_eq!(manifest.version, MANIFEST_VERSION);
    assert_eq!(manifest.stream_count, 3);
    assert_eq!(manifest.streams.len(), 3);
    assert_eq!(manifest.streams[0].output.as_deref(), Some("demo_00_music.ac3"));
    assert!(manifest.streams[1].output.is_none());
    assert!(manifest.streams[1].error.is_some());

    let back: Manifest = serde_yaml_ng::from_str(&serde_yaml_ng::to_string(&manifest).unwrap()).unwrap();
    assert_eq!(back.streams[2].role, "demo");
}

#[test]
fn manifest_paths() {
    assert_eq!(
        Manifest::path_for(Path::new("out"), "bgm_stage1"),
        PathBuf::from("out/bgm_stage1.extraction.yaml")
    );
}
