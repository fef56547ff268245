use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Serializes `value` with `postcard` and writes it to `path`.
///
/// - Overwrites any existing file
/// - Parent directories must already exist
pub(crate) fn write_binary<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a file written by [`write_binary`].
pub(crate) fn read_binary<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}
