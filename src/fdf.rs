//! FDF 1.2 document rendering.
//!
//! PDF tools that import FDF are strict about the layout, so the header,
//! footer and field lines are emitted byte-for-byte from fixed literals.

use crate::error::{ConvertError, Result};
use crate::table::Record;
use std::fmt;
use std::fs;
use std::path::Path;

pub const FDF_HEADER: &str = "%FDF-1.2\n1 0 obj\n<<\n/FDF\n<<\n/Fields [\n";

pub const FDF_FOOTER: &str = "]\n>>\n>>\nendobj\ntrailer\n<<\n/Root 1 0 R\n>>\n%%EOF";

/// Placeholder names for the first and second unnamed columns.
const PLACEHOLDER_NAMES: [&str; 2] = ["ClientNameJP", "InsuredNameJP"];

const UNNAMED_FIELD_PREFIX: &str = "UnnamedField";

/// A form field name/value pair, unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Escape a string for use inside an FDF literal string `( ... )`.
///
/// Backslashes are escaped first so the escapes added for parentheses and
/// line breaks are not doubled. Each `\n` and each `\r` becomes the two
/// characters `\r`.
pub fn escape_fdf_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 8);

    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\n' | '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Hands out names for unnamed columns in encounter order.
///
/// One instance lives for exactly one header walk, so numbering restarts for
/// every record.
#[derive(Debug, Default)]
struct UnnamedColumns {
    seen: usize,
}

impl UnnamedColumns {
    fn name_for(&mut self, column: &str) -> String {
        if !column.trim().is_empty() {
            return column.to_string();
        }

        self.seen += 1;
        match PLACEHOLDER_NAMES.get(self.seen - 1) {
            Some(name) => (*name).to_string(),
            None => format!("{}{}", UNNAMED_FIELD_PREFIX, self.seen),
        }
    }
}

/// Fields for one record: empty values dropped, unnamed columns renamed.
pub fn record_fields(record: &Record) -> Vec<Field> {
    let mut unnamed = UnnamedColumns::default();

    record
        .cells()
        .filter_map(|(column, value)| {
            // Name every column so placeholder numbering stays tied to the
            // header position even when the value is skipped.
            let name = unnamed.name_for(column);
            (!value.is_empty()).then(|| Field::new(name, value))
        })
        .collect()
}

/// One empty-valued field per header column.
pub fn template_fields(header: &[String]) -> Vec<Field> {
    let mut unnamed = UnnamedColumns::default();

    header
        .iter()
        .map(|column| Field::new(unnamed.name_for(column), ""))
        .collect()
}

/// A complete FDF document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FdfDocument {
    fields: Vec<Field>,
}

impl FdfDocument {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn from_record(record: &Record) -> Self {
        Self::new(record_fields(record))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(FDF_HEADER)?;
        for field in &self.fields {
            writeln!(
                f,
                "<< /T ({}) /V ({}) >>",
                escape_fdf_string(&field.name),
                escape_fdf_string(&field.value)
            )?;
        }
        f.write_str(FDF_FOOTER)
    }
}

/// Write a rendered document to `path`.
pub fn write_fdf(path: &Path, document: &FdfDocument) -> Result<()> {
    fs::write(path, document.render()).map_err(|e| ConvertError::output(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_escape_parens_and_backslash() {
        assert_eq!(escape_fdf_string("a)b(c\\d"), "a\\)b\\(c\\\\d");
    }

    #[test]
    fn test_escape_line_breaks() {
        assert_eq!(escape_fdf_string("line1\nline2"), "line1\\rline2");
        assert_eq!(escape_fdf_string("line1\rline2"), "line1\\rline2");
        assert_eq!(escape_fdf_string("line1\r\nline2"), "line1\\r\\rline2");
    }

    #[test]
    fn test_escape_plain_text_untouched() {
        assert_eq!(escape_fdf_string("山田 太郎 / 123"), "山田 太郎 / 123");
    }

    #[test]
    fn test_unnamed_columns_get_placeholders() {
        let record = Record::from_row(&header(&["", "Name", ""]), &["X", "Y", "Z"]);
        let names: Vec<String> = record_fields(&record).into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["ClientNameJP", "Name", "InsuredNameJP"]);
    }

    #[test]
    fn test_third_unnamed_column_is_numbered() {
        let record = Record::from_row(&header(&["", " ", "A", "\t"]), &["1", "2", "3", "4"]);
        let names: Vec<String> = record_fields(&record).into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["ClientNameJP", "InsuredNameJP", "A", "UnnamedField3"]
        );
    }

    #[test]
    fn test_empty_values_are_dropped_but_keep_numbering() {
        let record = Record::from_row(&header(&["", "", "Name"]), &["", "Z", ""]);
        let fields = record_fields(&record);
        assert_eq!(fields, vec![Field::new("InsuredNameJP", "Z")]);
    }

    #[test]
    fn test_numbering_restarts_per_record() {
        let columns = header(&["", "Name"]);
        let first = Record::from_row(&columns, &["A", "B"]);
        let second = Record::from_row(&columns, &["C", "D"]);
        assert_eq!(record_fields(&first)[0].name, "ClientNameJP");
        assert_eq!(record_fields(&second)[0].name, "ClientNameJP");
    }

    #[test]
    fn test_template_fields_are_empty() {
        let fields = template_fields(&header(&["Client1Sur", "", "Client1First", ""]));
        assert_eq!(
            fields,
            vec![
                Field::new("Client1Sur", ""),
                Field::new("ClientNameJP", ""),
                Field::new("Client1First", ""),
                Field::new("InsuredNameJP", ""),
            ]
        );
    }

    #[test]
    fn test_render_exact_bytes() {
        let document = FdfDocument::new(vec![
            Field::new("Name", "Doe (Jr)"),
            Field::new("Notes", "a\nb"),
        ]);
        let expected = "%FDF-1.2\n1 0 obj\n<<\n/FDF\n<<\n/Fields [\n\
                        << /T (Name) /V (Doe \\(Jr\\)) >>\n\
                        << /T (Notes) /V (a\\rb) >>\n\
                        ]\n>>\n>>\nendobj\ntrailer\n<<\n/Root 1 0 R\n>>\n%%EOF";
        assert_eq!(document.render(), expected);
    }

    #[test]
    fn test_render_empty_document() {
        let rendered = FdfDocument::default().render();
        assert_eq!(rendered, format!("{}{}", FDF_HEADER, FDF_FOOTER));
    }
}
