//! Batch operations over a client table.
//!
//! Each [`Mode`] is a single pass over the table that produces a [`Report`],
//! the JSON payload handed back to the calling process on stdout.

use crate::error::{ConvertError, Result};
use crate::fdf::{record_fields, template_fields, write_fdf, FdfDocument};
use crate::naming::{display_name, fdf_base_name, sanitize_filename};
use crate::table::{read_header, read_table};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Operation to run against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// List every client, newest first.
    ListClients,
    /// Write one client's FDF into `output_dir`.
    ConvertClient {
        output_dir: PathBuf,
        /// Raw index text, validated against the table size.
        client_index: String,
    },
    /// Write every client's FDF into `output_dir`, bundle them into a zip
    /// at `output_zip_path` and remove the loose files.
    ConvertAllToZip {
        output_dir: PathBuf,
        output_zip_path: PathBuf,
    },
    /// Write an FDF with one empty field per header column.
    GenerateEmptyFdf { output_dir: PathBuf },
    /// Write every client's fields, in file order, into a single FDF.
    ConvertAllToFdf { output_path: PathBuf },
}

/// One entry of the client list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientEntry {
    pub original_index: usize,
    pub display_name: String,
}

/// Machine-readable result of a [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Clients(Vec<ClientEntry>),
    Fdf {
        fdf_filename: String,
    },
    Archive {
        zip_filename: String,
        fdf_count: usize,
    },
    MergedFdf {
        fdf_filename: String,
        record_count: usize,
    },
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Run `mode` against the table at `table_path`.
pub fn run(table_path: &Path, mode: &Mode) -> Result<Report> {
    debug!(table = %table_path.display(), ?mode, "running");

    match mode {
        Mode::ListClients => list_clients(table_path).map(Report::Clients),
        Mode::ConvertClient {
            output_dir,
            client_index,
        } => convert_client(table_path, output_dir, client_index)
            .map(|fdf_filename| Report::Fdf { fdf_filename }),
        Mode::ConvertAllToZip {
            output_dir,
            output_zip_path,
        } => convert_all_to_zip(table_path, output_dir, output_zip_path).map(|fdf_count| {
            Report::Archive {
                zip_filename: file_name(output_zip_path),
                fdf_count,
            }
        }),
        Mode::GenerateEmptyFdf { output_dir } => generate_empty_fdf(table_path, output_dir)
            .map(|fdf_filename| Report::Fdf { fdf_filename }),
        Mode::ConvertAllToFdf { output_path } => {
            convert_all_to_fdf(table_path, output_path).map(|record_count| Report::MergedFdf {
                fdf_filename: file_name(output_path),
                record_count,
            })
        }
    }
}

/// Clients in reverse file order, each tagged with its original row index.
pub fn list_clients(table_path: &Path) -> Result<Vec<ClientEntry>> {
    let table = read_table(table_path)?;

    let clients: Vec<ClientEntry> = table
        .records
        .iter()
        .enumerate()
        .rev()
        .map(|(original_index, record)| ClientEntry {
            original_index,
            display_name: display_name(record),
        })
        .collect();

    info!("listed {} clients", clients.len());
    Ok(clients)
}

/// Parse a client index, rejecting anything outside `[0, count)`.
///
/// Negative indices are errors, not offsets from the end.
pub fn parse_client_index(value: &str, count: usize) -> Result<usize> {
    let invalid = || ConvertError::InvalidIndex {
        value: value.to_string(),
        count,
    };

    let index: i64 = value.trim().parse().map_err(|_| invalid())?;
    usize::try_from(index)
        .ok()
        .filter(|&index| index < count)
        .ok_or_else(invalid)
}

/// Convert one client to FDF and return the file name written into
/// `output_dir`.
pub fn convert_client(table_path: &Path, output_dir: &Path, client_index: &str) -> Result<String> {
    let table = read_table(table_path)?;
    let index = parse_client_index(client_index, table.records.len())?;
    let record = &table.records[index];

    ensure_dir(output_dir)?;
    let fdf_filename = format!("{}_{}.fdf", fdf_base_name(record, index), timestamp_millis());
    let fdf_path = output_dir.join(&fdf_filename);
    write_fdf(&fdf_path, &FdfDocument::from_record(record))?;

    info!(index, path = %fdf_path.display(), "converted client");
    Ok(fdf_filename)
}

/// Convert every client and bundle the FDFs into a zip archive.
///
/// Returns the number of FDF entries in the archive. The per-client files
/// written into `output_dir` are removed whether or not archiving succeeds,
/// and a half-written archive is removed on failure.
pub fn convert_all_to_zip(
    table_path: &Path,
    output_dir: &Path,
    output_zip_path: &Path,
) -> Result<usize> {
    let table = read_table(table_path)?;
    if table.records.is_empty() {
        return Err(ConvertError::EmptyDataset {
            path: table_path.to_path_buf(),
        });
    }

    ensure_dir(output_dir)?;
    let mut scratch = ScratchFiles::default();
    let mut entries = Vec::with_capacity(table.records.len());

    for (index, record) in table.records.iter().enumerate() {
        let entry_name = format!("{}_{}.fdf", fdf_base_name(record, index), index);
        let fdf_path = output_dir.join(&entry_name);
        scratch.track(fdf_path.clone());
        write_fdf(&fdf_path, &FdfDocument::from_record(record))?;
        entries.push((entry_name, fdf_path));
    }

    if let Some(parent) = output_zip_path.parent() {
        ensure_dir(parent)?;
    }
    let mut partial_archive = ScratchFiles::default();
    partial_archive.track(output_zip_path.to_path_buf());
    write_archive(output_zip_path, &entries)?;
    partial_archive.keep();

    info!(
        path = %output_zip_path.display(),
        entries = entries.len(),
        "wrote archive"
    );
    Ok(entries.len())
}

/// Write an FDF template with an empty field per header column and return
/// its file name.
pub fn generate_empty_fdf(table_path: &Path, output_dir: &Path) -> Result<String> {
    let header = read_header(table_path)?;

    ensure_dir(output_dir)?;
    let stem = table_path
        .file_stem()
        .map(|stem| sanitize_filename(&stem.to_string_lossy()))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "table".to_string());
    let fdf_filename = format!("{}_empty_template_{}.fdf", stem, timestamp_millis());
    let fdf_path = output_dir.join(&fdf_filename);
    write_fdf(&fdf_path, &FdfDocument::new(template_fields(&header)))?;

    info!(fields = header.len(), path = %fdf_path.display(), "wrote empty template");
    Ok(fdf_filename)
}

/// Write every client's fields into one FDF, in file order. Returns the
/// number of records written.
pub fn convert_all_to_fdf(table_path: &Path, output_path: &Path) -> Result<usize> {
    let table = read_table(table_path)?;
    if table.records.is_empty() {
        warn!(table = %table_path.display(), "table has no data records, writing empty document");
    }

    let fields = table
        .records
        .iter()
        .flat_map(record_fields)
        .collect();

    if let Some(parent) = output_path.parent() {
        ensure_dir(parent)?;
    }
    write_fdf(output_path, &FdfDocument::new(fields))?;

    info!(
        records = table.records.len(),
        path = %output_path.display(),
        "wrote merged FDF"
    );
    Ok(table.records.len())
}

fn write_archive(zip_path: &Path, entries: &[(String, PathBuf)]) -> Result<()> {
    let file = File::create(zip_path).map_err(|e| ConvertError::output(zip_path, e))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry_name, fdf_path) in entries {
        writer
            .start_file(entry_name.as_str(), options)
            .map_err(|source| archive_error(zip_path, source))?;
        let mut source = File::open(fdf_path).map_err(|e| ConvertError::input(fdf_path, e))?;
        io::copy(&mut source, &mut writer).map_err(|e| ConvertError::output(zip_path, e))?;
    }

    writer
        .finish()
        .map_err(|source| archive_error(zip_path, source))?;
    Ok(())
}

fn archive_error(path: &Path, source: zip::result::ZipError) -> ConvertError {
    ConvertError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| ConvertError::output(dir, e))
}

fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files removed when the guard is dropped, unless [`ScratchFiles::keep`]
/// is called first.
#[derive(Debug, Default)]
struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn keep(mut self) {
        self.paths.clear();
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed scratch file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch file"),
            }
        }
    }
}
