//! Zone code humanization.
//!
//! Notifications read better with "Geauga" than "OHC055". Names come from
//! an optional markdown file of `| Name | Code |` tables; codes without a
//! name fall back to the raw code.

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Zone code to display name table.
#[derive(Debug, Clone, Default)]
pub struct ZoneNames {
    names: HashMap<String, String>,
}

impl ZoneNames {
    /// Load the table from an optional markdown file. A missing or
    /// unreadable file yields an empty table; never fails.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                debug!("zone names file {} unreadable ({e}), using codes", path.display());
                Self::default()
            }
        }
    }

    /// Parse `| Name | Code |` rows out of markdown text. Header and
    /// separator rows are ignored; later rows win on duplicate codes.
    pub fn parse(text: &str) -> Self {
        let mut names = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if !line.starts_with('|') {
                continue;
            }
            let cells: Vec<&str> = line
                .trim_matches('|')
                .split('|')
                .map(str::trim)
                .collect();
            if cells.len() < 2 {
                continue;
            }
            let (name, code) = (cells[0], cells[1]);
            if name.is_empty() || code.is_empty() {
                continue;
            }
            if is_separator(name) || code.eq_ignore_ascii_case("code") {
                continue;
            }
            names.insert(code.to_owned(), name.to_owned());
        }

        Self { names }
    }

    /// Display name for a zone code, falling back to the code itself.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map_or(code, String::as_str)
    }

    /// Number of known names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Markdown table separator cell (`---`, `:---:`, ...).
fn is_separator(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
}
