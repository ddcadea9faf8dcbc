use crate::DataValue;
use crate::getter::Entity;
use anyhow::Context;
use flate2::read::GzDecoder;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json5,
    GzipJson5,
}

/// A data snapshot read from disk, ready to serve as an autocomplete target.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub source_path: Option<PathBuf>,
    pub format: DataFormat,
    pub entity: Entity,
}

impl LoadedData {
    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let format = detect_format(path, &bytes);
        let text_bytes = match format {
            DataFormat::Json5 => bytes,
            DataFormat::GzipJson5 => {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).context("gzip decompress")?;
                out
            }
        };

        let text = std::str::from_utf8(&text_bytes).context("data file is not valid UTF-8")?;
        let root = DataValue::parse_json5(text).context("parsing JSON5")?;
        info!(path = %path.display(), ?format, "loaded data snapshot");

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            format,
            entity: Entity::from_snapshot(root),
        })
    }

    pub fn from_value(root: DataValue) -> Self {
        Self {
            source_path: None,
            format: DataFormat::Json5,
            entity: Entity::from_snapshot(root),
        }
    }
}

const GZIP_HEADER: [u8; 2] = [0x1F, 0x8B];

/// Snapshots are gzip when they carry the gzip header, or when named `*.gz` (any case).
/// Anything else is read as JSON5 text.
fn detect_format(path: &Path, bytes: &[u8]) -> DataFormat {
    let gz_suffix = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if gz_suffix || bytes.starts_with(&GZIP_HEADER) {
        DataFormat::GzipJson5
    } else {
        DataFormat::Json5
    }
}
