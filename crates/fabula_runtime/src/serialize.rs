//! Session snapshots in `MessagePack`.
//!
//! Only the mutable state is written: the overlay and the relation tables.
//! Loading needs a world built from the same story, whose sealed base the
//! snapshot is restored against.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use fabula_foundation::{Error, ErrorKind, Result};
use fabula_storage::{World, WorldSnapshot};

/// Encodes a world's snapshot.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(world: &World) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&world.snapshot())
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Decodes a snapshot and restores it against `base`.
///
/// # Errors
///
/// Returns an error if decoding fails or the snapshot does not fit the base.
pub fn from_bytes(base: &World, bytes: &[u8]) -> Result<World> {
    let snapshot: WorldSnapshot = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
    base.restore(snapshot)
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!("failed to {action} file '{}': {e}", path.display())))
}

/// Saves a world's snapshot to a file, overwriting it if present.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(world: &World, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;
    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(world)?;
    writer.write_all(&bytes).map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
    Ok(())
}

/// Loads a snapshot file and restores it against `base`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode.
pub fn load_from_file<P: AsRef<Path>>(base: &World, path: P) -> Result<World> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| io_error("read", path, &e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "snapshot loaded");
    from_bytes(base, &bytes)
}
