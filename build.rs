use anyhow::Result;
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;

fn main() -> Result<()> {
    // Add build timestamp
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => chrono::Utc.timestamp_opt(val.parse::<i64>()?, 0).unwrap(),
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    // Get sgb library version using cargo metadata
    let sgb_version = get_sgb_version_from_metadata()
        .unwrap_or_else(|_| read_sgb_version_fallback().unwrap_or_else(|_| "unknown".to_string()));
    println!("cargo:rustc-env=SGB_VERSION={sgb_version}");

    // Tell cargo to rerun this build script if the sgb Cargo.toml changes
    println!("cargo:rerun-if-changed=sgb/Cargo.toml");

    Ok(())
}

/// Get sgb version using cargo metadata (works with published and local dependencies)
fn get_sgb_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    // Method 1: Look for sgb in workspace members first (local development)
    if let Some(packages) = metadata["packages"].as_array() {
        for package in packages {
            if let Some(name) = package["name"].as_str() {
                if name == "sgb" {
                    if let Some(version) = package["version"].as_str() {
                        return Ok(version.to_string());
                    }
                }
            }
        }
    }

    // Method 2: Look in dependency graph for published sgb package
    if let Some(resolve) = metadata.get("resolve") {
        if let Some(nodes) = resolve["nodes"].as_array() {
            for node in nodes {
                if let Some(id) = node["id"].as_str() {
                    if id.starts_with("sgb ") {
                        // Extract version from "sgb 0.1.0 (registry+...)" format
                        if let Some(version_start) = id.find(' ') {
                            if let Some(version_end) = id[version_start + 1..].find(' ') {
                                let version =
                                    &id[version_start + 1..version_start + 1 + version_end];
                                return Ok(version.to_string());
                            }
                        }
                    }
                }
            }
        }
    }

    anyhow::bail!("sgb package not found in metadata");
}

/// Fallback: manually parse sgb/Cargo.toml (for edge cases)
fn read_sgb_version_fallback() -> Result<String> {
    let toml_content = fs::read_to_string("sgb/Cargo.toml")?;

    for line in toml_content.lines() {
        let line = line.trim();
        if line.starts_with("version") && line.contains("=") {
            if let Some(equals_pos) = line.find('=') {
                let version_part = line[equals_pos + 1..].trim();
                let version = version_part.trim_matches('"').trim_matches('\'');
                return Ok(version.to_string());
            }
        }
    }

    anyhow::bail!("Could not find version in sgb/Cargo.toml");
}
