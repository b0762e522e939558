//! Pretty-printed JSON records on disk.
//!
//! Both the config and the conversations are single JSON documents that are
//! always written whole. These helpers own the open modes so every record
//! gets the same guarantees: reads tell a missing file apart from a corrupt
//! one, and in-place updates truncate before writing.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::observability::{STORE_ERRORS, STORE_READS, STORE_WRITES};

/// Read and decode the record at `path`.
///
/// `what` names the record in error messages ("config", "conversation").
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    STORE_READS.click();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            STORE_ERRORS.click();
            return Err(Error::not_found(format!("{what} file does not exist"), path));
        }
        Err(err) => {
            STORE_ERRORS.click();
            return Err(Error::io(
                format!("failed to open {what} file {}: {err}", path.display()),
                err,
            ));
        }
    };
    from_reader(BufReader::new(file)).map_err(|err| {
        STORE_ERRORS.click();
        Error::corrupt(
            format!("failed to parse {what}: {err}"),
            path,
            Some(Box::new(err)),
        )
    })
}

/// Write `record` to a new file at `path`, replacing any existing file.
pub(crate) fn create_record<T: Serialize>(path: &Path, record: &T, what: &str) -> Result<()> {
    let file = File::create(path).map_err(|err| {
        STORE_ERRORS.click();
        Error::io(
            format!("failed to create {what} file {}: {err}", path.display()),
            err,
        )
    })?;
    write_record(file, path, record, what)
}

/// Rewrite the existing file at `path` with `record`.
///
/// The file must already exist; it is truncated before writing so a shorter
/// record never leaves trailing bytes behind.
pub(crate) fn overwrite_record<T: Serialize>(path: &Path, record: &T, what: &str) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| {
            STORE_ERRORS.click();
            Error::io(
                format!("failed to open {what} file {}: {err}", path.display()),
                err,
            )
        })?;
    write_record(file, path, record, what)
}

fn write_record<T: Serialize>(file: File, path: &Path, record: &T, what: &str) -> Result<()> {
    STORE_WRITES.click();
    let mut writer = BufWriter::new(file);
    let written = to_writer_pretty(&mut writer, record)
        .map_err(std::io::Error::from)
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush());
    written.map_err(|err| {
        STORE_ERRORS.click();
        Error::io(
            format!("failed to write {what} file {}: {err}", path.display()),
            err,
        )
    })
}
