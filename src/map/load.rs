//! Map loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable map files.
//! Supports both compressed (brotli) and uncompressed RON files.
//! - Reading: Auto-detects format by checking for valid RON start
//! - Writing: Always uses brotli compression

use std::fs;
use std::io::Cursor;
use std::path::Path;

use super::MapGeometry;

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of sectors in a map
    pub const MAX_SECTORS: usize = 8192;
    /// Maximum number of linedefs
    pub const MAX_LINES: usize = 65536;
    /// Maximum number of vertices
    pub const MAX_VERTICES: usize = 65536;
    /// Maximum string length for flat names
    pub const MAX_STRING_LEN: usize = 64;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
}

/// Error type for map loading
#[derive(Debug)]
pub enum MapError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for MapError {
    fn from(e: ron::error::SpannedError) -> Self {
        MapError::ParseError(e)
    }
}

impl From<ron::Error> for MapError {
    fn from(e: ron::Error) -> Self {
        MapError::SerializeError(e)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::IoError(e) => write!(f, "IO error: {}", e),
            MapError::ParseError(e) => write!(f, "Parse error: {}", e),
            MapError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            MapError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for MapError {}

/// Check if a float is valid (not NaN or Inf)
fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

/// Validate an entire map
pub fn validate_map(map: &MapGeometry) -> Result<(), MapError> {
    let fail = |msg: String| Err(MapError::ValidationError(msg));

    if map.sectors.len() > limits::MAX_SECTORS {
        return fail(format!(
            "too many sectors ({} > {})",
            map.sectors.len(),
            limits::MAX_SECTORS
        ));
    }
    if map.linedefs.len() > limits::MAX_LINES {
        return fail(format!(
            "too many linedefs ({} > {})",
            map.linedefs.len(),
            limits::MAX_LINES
        ));
    }
    if map.vertices.len() > limits::MAX_VERTICES {
        return fail(format!(
            "too many vertices ({} > {})",
            map.vertices.len(),
            limits::MAX_VERTICES
        ));
    }

    for (i, v) in map.vertices.iter().enumerate() {
        if !is_valid_float(v.x) || !is_valid_float(v.y) {
            return fail(format!("vertex[{}]: invalid coordinates ({}, {})", i, v.x, v.y));
        }
    }

    for (i, side) in map.sidedefs.iter().enumerate() {
        if side.sector >= map.sectors.len() {
            return fail(format!(
                "sidedef[{}]: invalid sector {} (only {} sectors)",
                i,
                side.sector,
                map.sectors.len()
            ));
        }
    }

    for (i, line) in map.linedefs.iter().enumerate() {
        if line.from >= map.vertices.len() || line.to >= map.vertices.len() {
            return fail(format!(
                "linedef[{}]: invalid vertex reference ({}, {})",
                i, line.from, line.to
            ));
        }
        if line.front >= map.sidedefs.len() {
            return fail(format!("linedef[{}]: invalid front sidedef {}", i, line.front));
        }
        if let Some(back) = line.back {
            if back >= map.sidedefs.len() {
                return fail(format!("linedef[{}]: invalid back sidedef {}", i, back));
            }
        }
    }

    for (i, sector) in map.sectors.iter().enumerate() {
        if !is_valid_float(sector.floor_height) || !is_valid_float(sector.ceiling_height) {
            return fail(format!(
                "sector[{}]: invalid heights ({}, {})",
                i, sector.floor_height, sector.ceiling_height
            ));
        }
        if sector.floor_flat.len() > limits::MAX_STRING_LEN {
            return fail(format!(
                "sector[{}]: floor flat name too long ({} > {})",
                i,
                sector.floor_flat.len(),
                limits::MAX_STRING_LEN
            ));
        }
        if sector.ceiling_flat.len() > limits::MAX_STRING_LEN {
            return fail(format!(
                "sector[{}]: ceiling flat name too long ({} > {})",
                i,
                sector.ceiling_flat.len(),
                limits::MAX_STRING_LEN
            ));
        }
    }

    for (i, marker) in map.markers.iter().enumerate() {
        if !is_valid_float(marker.position.x) || !is_valid_float(marker.position.y) {
            return fail(format!("marker[{}]: invalid position", i));
        }
    }

    if map.pvs.row_count() > map.sectors.len() {
        return fail(format!(
            "pvs has {} rows for {} sectors",
            map.pvs.row_count(),
            map.sectors.len()
        ));
    }

    Ok(())
}

/// Decode bytes that may be plain RON or brotli-compressed RON
fn decode_bytes(bytes: &[u8]) -> Result<String, MapError> {
    // Detect format: RON files start with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false);

    if is_plain_ron {
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            MapError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))
        })
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed).map_err(|e| {
            MapError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))
        })?;
        String::from_utf8(decompressed).map_err(|e| {
            MapError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))
        })
    }
}

/// Parse map data from bytes (plain or compressed RON)
pub fn parse_map_bytes(bytes: &[u8]) -> Result<MapGeometry, MapError> {
    let contents = decode_bytes(bytes)?;

    let mut map: MapGeometry = match ron::from_str(&contents) {
        Ok(m) => m,
        Err(e) => {
            log::error!("RON parse error: {}", e);
            let pos = e.position;
            let lines: Vec<&str> = contents.lines().collect();
            let line_idx = pos.line.saturating_sub(1);
            if line_idx < lines.len() {
                log::error!("  Line {}: {}", pos.line, lines[line_idx]);
            }
            return Err(e.into());
        }
    };

    // Validate to prevent malicious files
    validate_map(&map)?;

    // Recalculate the spatial index (not serialized)
    map.rebuild_index();

    Ok(map)
}

/// Load a map from a RON file (supports both compressed and uncompressed)
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<MapGeometry, MapError> {
    let bytes = fs::read(path.as_ref())?;
    parse_map_bytes(&bytes)
}

/// Load a map from a RON string (for embedded maps or testing)
pub fn load_map_from_str(s: &str) -> Result<MapGeometry, MapError> {
    let mut map: MapGeometry = ron::from_str(s)?;
    validate_map(&map)?;
    map.rebuild_index();
    Ok(map)
}

/// Serialize a map to compressed bytes
pub fn serialize_map(map: &MapGeometry) -> Result<Vec<u8>, MapError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let ron_string = ron::ser::to_string_pretty(map, config)?;

    // Compress with brotli (quality 6, window 22 - good balance of speed/ratio)
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_string.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| {
        MapError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("brotli compression failed: {}", e),
        ))
    })?;

    Ok(compressed)
}

/// Save a map to a compressed RON file (brotli)
pub fn save_map<P: AsRef<Path>>(map: &MapGeometry, path: P) -> Result<(), MapError> {
    let data = serialize_map(map)?;
    fs::write(path, data)?;
    Ok(())
}
