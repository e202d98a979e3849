//! Fixed compression policy and output naming.

use std::path::PathBuf;

use crate::zip::CompressionMethod;

/// Every entry is deflated
pub const COMPRESSION_METHOD: CompressionMethod = CompressionMethod::Deflate;

/// Fastest deflate level; speed is favoured over ratio
pub const COMPRESSION_LEVEL: u32 = 1;

/// Human-readable form of the policy, for previews.
pub fn compression_label() -> String {
    match COMPRESSION_METHOD {
        CompressionMethod::Deflate => format!("DEFLATE level {COMPRESSION_LEVEL}"),
        CompressionMethod::Stored => "STORED".to_string(),
    }
}

/// `<basename of source>.zip`, ignoring trailing path separators.
pub fn default_output_name(source: &str) -> String {
    let trimmed = source.trim().trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();
    format!("{base}.zip")
}

/// The output path for a run: `output` if it is non-blank, else the default name.
pub fn resolve_output_path(source: &str, output: Option<&str>) -> PathBuf {
    match output.map(str::trim) {
        Some(name) if !name.is_empty() => PathBuf::from(name),
        _ => PathBuf::from(default_output_name(source)),
    }
}
