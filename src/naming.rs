//! Display labels and file names for client records.

use crate::table::Record;

/// Label used when no alias of a logical field has a value.
pub const MISSING_LABEL: &str = "N/A";

/// Accepted header spellings for one logical field, in priority order.
///
/// Client tables come from two different export templates, so the same
/// value can live under either spelling.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pub columns: &'static [&'static str],
}

impl ColumnAlias {
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }

    /// First alias with a present, non-blank value.
    pub fn lookup<'a>(&self, record: &'a Record) -> Option<&'a str> {
        self.columns
            .iter()
            .filter_map(|column| record.get(column))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

pub const SURNAME: ColumnAlias = ColumnAlias::new(&["Client1Sur", "settlorname[last]"]);

pub const GIVEN_NAME: ColumnAlias = ColumnAlias::new(&["Client1First", "settlorname[first]"]);

/// Human label shown when picking a client, e.g. `Doe, John`.
pub fn display_name(record: &Record) -> String {
    format!(
        "{}, {}",
        SURNAME.lookup(record).unwrap_or(MISSING_LABEL),
        GIVEN_NAME.lookup(record).unwrap_or(MISSING_LABEL)
    )
}

/// Reduce an arbitrary string to a token that is safe in a file name.
///
/// Whitespace runs become `_`, anything other than alphanumerics, `_`, `-`
/// and `.` is removed, and leading/trailing `_`/`-` are trimmed. May return
/// an empty string.
pub fn sanitize_filename(s: &str) -> String {
    let mut sanitized = String::with_capacity(s.len());
    let mut in_whitespace = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            sanitized.push(c);
        }
    }

    sanitized.trim_matches(|c| c == '_' || c == '-').to_string()
}

/// File stem for a record's FDF: `{surname}_{given}`, or `client_{index}`
/// when neither name yields any usable characters.
pub fn fdf_base_name(record: &Record, index: usize) -> String {
    let surname = SURNAME.lookup(record).unwrap_or_default();
    let given = GIVEN_NAME.lookup(record).unwrap_or_default();

    let base = sanitize_filename(&format!("{}_{}", surname, given));
    if base.is_empty() {
        format!("client_{}", index)
    } else {
        base
    }
}
