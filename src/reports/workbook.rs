//! Report workbook: named sheets of string cells, exported as one CSV file per sheet

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reports::StatementLine;
use crate::types::*;

/// Longest sheet name spreadsheet applications accept
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Format an amount for a sheet cell
pub fn amount(value: &BigDecimal) -> String {
    value.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create an empty sheet; the name is cut to 31 characters
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.chars().take(MAX_SHEET_NAME_LEN).collect(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.chars().take(MAX_SHEET_NAME_LEN).collect();
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn add_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows.extend(rows);
    }

    /// Section title, one row per line, then the section total
    pub fn add_section(&mut self, title: &str, lines: &[StatementLine], total: &BigDecimal) {
        self.add_row(vec![title.to_string(), String::new(), String::new()]);
        for line in lines {
            self.add_row(vec![line.name.clone(), line.code.clone(), amount(&line.amount)]);
        }
        self.add_row(vec![format!("Total {}", title), String::new(), amount(total)]);
    }

    /// Serialize headers and rows as CSV
    pub fn to_csv(&self) -> LedgerResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        if !self.headers.is_empty() {
            writer.write_record(&self.headers)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| LedgerError::Export(e.to_string()))
    }

    /// File name used when the sheet is written to a directory
    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}.csv", stem)
    }
}

/// Implemented by every report that exports to a sheet
pub trait ToSheet {
    fn to_sheet(&self) -> Sheet;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Write one CSV file per sheet into `dir`, creating it if needed.
    /// Returns the written paths in sheet order.
    pub fn write_to_dir(&self, dir: &Path) -> LedgerResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.sheets.len());
        for sheet in &self.sheets {
            let path = dir.join(sheet.file_name());
            std::fs::write(&path, sheet.to_csv()?)?;
            written.push(path);
        }
        tracing::info!(dir = %dir.display(), sheets = written.len(), "workbook exported");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_is_truncated() {
        let sheet = Sheet::new("Neraca Saldo Setelah Penyesuaian", &["Kode Akun"]);
        assert_eq!(sheet.name.chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(sheet.name, "Neraca Saldo Setelah Penyesuaia");
    }

    #[test]
    fn test_csv_quotes_fields() {
        let mut sheet = Sheet::new("Jurnal Umum", &["Keterangan", "Debit"]);
        sheet.add_row(vec!["Gaji, November".to_string(), "1500".to_string()]);
        let csv = String::from_utf8(sheet.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Keterangan,Debit\n\"Gaji, November\",1500\n");
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("Neraca Saldo", &["Kode Akun"]));
        workbook.add_sheet(Sheet::new("Laporan Arus Kas", &["Aktivitas"]));

        let paths = workbook.write_to_dir(dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("Neraca_Saldo.csv"));
        let content = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(content, "Aktivitas\n");
    }
}
