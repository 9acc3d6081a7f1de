//! Chart loading from packaged archives and unpacked directories
//!
//! Archives follow the Helm layout: a gzip-compressed tarball whose entries
//! live under a single top-level directory named after the chart
//! (`nginx/Chart.yaml`, `nginx/templates/...`).
//!
//! Loading is bounded: a single file may not exceed [`MAX_FILE_SIZE`] and the
//! decompressed chart may not exceed [`MAX_CHART_SIZE`].

use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use tar::Archive;
use walkdir::WalkDir;

use crate::chart::{Chart, ChartFile, ChartMetadata, Values};
use crate::error::{CoreError, Result};

const CHART_FILE: &str = "Chart.yaml";
const VALUES_FILE: &str = "values.yaml";
const TEMPLATES_DIR: &str = "templates/";

/// Largest single file accepted in a chart (5 MiB)
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Largest decompressed chart accepted (100 MiB)
pub const MAX_CHART_SIZE: u64 = 100 * 1024 * 1024;

/// Load a chart from a `.tgz` archive or a chart directory
pub fn load_chart(path: &Path) -> Result<Chart> {
    if path.is_dir() {
        load_dir(path)
    } else if path.is_file() {
        load_archive(path)
    } else {
        Err(CoreError::ChartNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Load a chart from a gzip-compressed tarball
pub fn load_archive(archive_path: &Path) -> Result<Chart> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut files = BTreeMap::new();
    let mut total = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.into_owned();
        // Drop the top-level chart directory
        let Some(name) = relative_name(path.components().skip(1)) else {
            continue;
        };

        let mut data = Vec::new();
        (&mut entry).take(MAX_FILE_SIZE + 1).read_to_end(&mut data)?;
        check_size(&name, data.len() as u64, &mut total)?;
        files.insert(name, data);
    }

    from_files(files, &archive_path.display().to_string())
}

/// Load a chart from an unpacked directory
pub fn load_dir(root: &Path) -> Result<Chart> {
    let mut files = BTreeMap::new();
    let mut total = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if let Some(name) = relative_name(rel.components()) {
            let size = entry.metadata().map_err(|e| CoreError::Io(e.into()))?.len();
            check_size(&name, size, &mut total)?;
            files.insert(name, std::fs::read(entry.path())?);
        }
    }

    from_files(files, &root.display().to_string())
}

/// Reject a file over [`MAX_FILE_SIZE`] or a running total over [`MAX_CHART_SIZE`]
fn check_size(name: &str, size: u64, total: &mut u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(CoreError::InvalidChart {
            message: format!("{} exceeds the {} byte file size limit", name, MAX_FILE_SIZE),
        });
    }
    *total += size;
    if *total > MAX_CHART_SIZE {
        return Err(CoreError::InvalidChart {
            message: format!("chart exceeds the {} byte decompressed size limit", MAX_CHART_SIZE),
        });
    }
    Ok(())
}

/// Join normal path components with `/`, rejecting anything that escapes the chart root
fn relative_name<'a>(components: impl Iterator<Item = Component<'a>>) -> Option<String> {
    let mut parts = Vec::new();
    for component in components {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn from_files(mut files: BTreeMap<String, Vec<u8>>, origin: &str) -> Result<Chart> {
    let chart_yaml = files.remove(CHART_FILE).ok_or_else(|| CoreError::InvalidChart {
        message: format!("{} is missing {}", origin, CHART_FILE),
    })?;
    let metadata = ChartMetadata::from_yaml(&String::from_utf8_lossy(&chart_yaml))?;
    if metadata.name.is_empty() {
        return Err(CoreError::MissingField {
            field: "name".to_string(),
        });
    }

    let values = match files.get(VALUES_FILE) {
        Some(data) => parse_values(data)?,
        None => Values::new(),
    };

    let mut templates = Vec::new();
    let mut rest = Vec::new();
    for (name, data) in files {
        let file = ChartFile { name, data };
        if file.name.starts_with(TEMPLATES_DIR) {
            templates.push(file);
        } else {
            rest.push(file);
        }
    }

    Ok(Chart {
        metadata,
        values,
        templates,
        files: rest,
    })
}

fn parse_values(data: &[u8]) -> Result<Values> {
    match serde_yaml::from_slice::<serde_json::Value>(data)? {
        serde_json::Value::Null => Ok(Values::new()),
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CoreError::InvalidChart {
            message: format!("{} must be a mapping, got {}", VALUES_FILE, other),
        }),
    }
}
