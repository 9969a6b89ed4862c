//! # FDF Converter
//!
//! Converts client records exported from a spreadsheet (CSV) into FDF (Forms
//! Data Format) documents that PDF tools use to fill in form fields.
//!
//! ## Field mapping
//!
//! Every column of a record becomes an FDF field named after its header cell.
//! Empty cells are left out. Header cells that are empty or whitespace-only
//! get placeholder names in encounter order: the first is `ClientNameJP`, the
//! second `InsuredNameJP`, and later ones `UnnamedField<N>` where `N` is the
//! column's position among the unnamed columns. The same rule names the
//! fields of the empty template, so a template and a filled document always
//! agree on field names.
//!
//! ## Output
//!
//! FDF importers are picky, so documents are written from fixed header and
//! footer literals with one `<< /T (name) /V (value) >>` line per field.
//! Names and values are escaped with [`escape_fdf_string`].
//!
//! ## Operations
//!
//! [`Mode`] selects what a run does with the table; [`run`] executes it and
//! returns a [`Report`] whose JSON form is the only thing callers parse.

pub mod batch;
pub mod error;
pub mod fdf;
pub mod naming;
pub mod table;

pub use batch::{
    convert_all_to_fdf, convert_all_to_zip, convert_client, generate_empty_fdf, list_clients,
    parse_client_index, run, ClientEntry, Mode, Report,
};
pub use error::{ConvertError, Result};
pub use fdf::{
    escape_fdf_string, record_fields, template_fields, write_fdf, FdfDocument, Field, FDF_FOOTER,
    FDF_HEADER,
};
pub use naming::{display_name, fdf_base_name, sanitize_filename, ColumnAlias, GIVEN_NAME, SURNAME};
pub use table::{parse_table, read_header, read_table, Record, Table};
