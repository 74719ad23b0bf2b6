// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CSV Parts Catalog
//!
//! The canonical part data lives on disk as one CSV per category under the
//! parts directory. First row is headers; the IPN column is detected
//! case-insensitively among `ipn`, `part_number`, `pn`. Reads tolerate
//! ragged rows (`flexible`); writes always go through write-to-temp +
//! rename in the same directory, so a reader never observes a partial file.
//!
//! BOM files are recognized by path shape: any ancestor directory whose
//! name contains `assembl`, or a file name starting with `PCA-` or `ASY-`.
//!
//! Catalog writers are serialized by the ECO implementation mutex one layer
//! up; this module only guarantees per-file atomicity.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, warn};

use zrp_domain::ZrpError;

/// Header names accepted as the IPN column, lowercase.
const IPN_COLUMNS: [&str; 3] = ["ipn", "part_number", "pn"];

/// BOM file-name prefixes.
const BOM_FILE_PREFIXES: [&str; 2] = ["PCA-", "ASY-"];

/// A parsed catalog file held in memory during an edit.
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub path: PathBuf,
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

impl CsvFile {
    /// Index of the IPN column, if this file has one.
    pub fn ipn_column(&self) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| IPN_COLUMNS.contains(&h.trim().to_ascii_lowercase().as_str()))
    }

    /// Index of `field` by case-insensitive header match.
    pub fn column(&self, field: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(field.trim()))
    }

    /// Row index whose IPN cell matches `ipn` (case-insensitive, trimmed).
    pub fn find_row(&self, ipn: &str) -> Option<usize> {
        let col = self.ipn_column()?;
        self.records
            .iter()
            .position(|r| r.get(col).map(|cell| cell.trim().eq_ignore_ascii_case(ipn)).unwrap_or(false))
    }

    /// Renders one row as a header → value map.
    pub fn row_as_map(&self, index: usize) -> HashMap<String, String> {
        let record = &self.records[index];
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect()
    }
}

/// Location of one part's row in the catalog.
#[derive(Debug)]
pub struct PartLocation {
    pub file: CsvFile,
    pub row: usize,
}

/// The on-disk catalog rooted at the configured parts directory.
#[derive(Debug, Clone)]
pub struct PartsCatalog {
    root: PathBuf,
}

impl PartsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `.csv` under the root, category subdirectories included.
    pub fn csv_files(&self) -> Result<Vec<PathBuf>, ZrpError> {
        let mut files = Vec::new();
        collect_csv_files(&self.root, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Loads one file; lazy-quote tolerant, ragged rows allowed.
    pub fn load(&self, path: &Path) -> Result<CsvFile, ZrpError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| ZrpError::IoError(format!("{}: {}", path.display(), e)))?;
        let headers = reader
            .headers()
            .map_err(|e| ZrpError::bad_request(format!("{}: {}", path.display(), e)))?
            .clone();
        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record.map_err(|e| ZrpError::bad_request(format!("{}: {}", path.display(), e)))?);
        }
        Ok(CsvFile {
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    /// Linear scan of the catalog for the file containing `ipn`.
    pub fn find_part(&self, ipn: &str) -> Result<Option<PartLocation>, ZrpError> {
        for path in self.csv_files()? {
            let file = match self.load(&path) {
                Ok(file) => file,
                Err(err) => {
                    // One unreadable file must not hide the rest of the catalog.
                    warn!(path = %path.display(), error = %err, "skipping unreadable catalog file");
                    continue;
                }
            };
            if let Some(row) = file.find_row(ipn) {
                return Ok(Some(PartLocation { file, row }));
            }
        }
        Ok(None)
    }

    /// All rows of all files as header → value maps (the parts listing).
    pub fn list_parts(&self) -> Result<Vec<HashMap<String, String>>, ZrpError> {
        let mut parts = Vec::new();
        for path in self.csv_files()? {
            let file = match self.load(&path) {
                Ok(file) => file,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable catalog file");
                    continue;
                }
            };
            if file.ipn_column().is_none() {
                continue;
            }
            for index in 0..file.records.len() {
                parts.push(file.row_as_map(index));
            }
        }
        Ok(parts)
    }

    /// Applies field edits to one part's row and rewrites the file
    /// atomically. Fields with no matching column are ignored, not errors.
    /// Returns the number of cells actually changed.
    pub fn apply_changes(&self, ipn: &str, changes: &[(String, String)]) -> Result<usize, ZrpError> {
        let location = self
            .find_part(ipn)?
            .ok_or_else(|| ZrpError::not_found(format!("part {} not found in catalog", ipn)))?;
        let mut file = location.file;
        let row = location.row;

        let mut cells: Vec<String> = file.records[row].iter().map(|c| c.to_string()).collect();
        // Ragged row shorter than the header: pad so column writes land.
        while cells.len() < file.headers.len() {
            cells.push(String::new());
        }

        let mut applied = 0;
        for (field, new_value) in changes {
            match file.column(field) {
                Some(col) => {
                    cells[col] = new_value.clone();
                    applied += 1;
                }
                None => {
                    debug!(ipn, field = %field, "field not present in catalog file, ignored");
                }
            }
        }

        file.records[row] = StringRecord::from(cells);
        atomic_write(&file)?;
        Ok(applied)
    }

    /// True when `path` looks like a BOM file.
    pub fn is_bom_path(&self, path: &Path) -> bool {
        let in_assembly_dir = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .ancestors()
            .skip(1)
            .filter_map(|p| p.file_name())
            .any(|name| name.to_string_lossy().to_ascii_lowercase().contains("assembl"));
        let bom_file_name = path
            .file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                BOM_FILE_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
            })
            .unwrap_or(false);
        in_assembly_dir || bom_file_name
    }

    /// Rewrites every BOM reference from `old` to `new`.
    ///
    /// Each file is rewritten atomically, but the walk is not transactional:
    /// on the first failing file the error names it and already-updated
    /// files keep their rewrite. Returns the paths that were updated.
    pub fn update_bom_references(&self, old: &str, new: &str) -> Result<Vec<PathBuf>, ZrpError> {
        let mut updated = Vec::new();
        for path in self.csv_files()? {
            if !self.is_bom_path(&path) {
                continue;
            }
            let mut file = self
                .load(&path)
                .map_err(|e| ZrpError::IoError(format!("BOM update failed at {}: {}", path.display(), e)))?;
            let Some(col) = file.ipn_column() else {
                continue;
            };

            let mut changed = false;
            for record in &mut file.records {
                if record.get(col).map(|cell| cell.trim().eq_ignore_ascii_case(old)).unwrap_or(false) {
                    let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
                    cells[col] = new.to_string();
                    *record = StringRecord::from(cells);
                    changed = true;
                }
            }
            if changed {
                atomic_write(&file)
                    .map_err(|e| ZrpError::IoError(format!("BOM update failed at {}: {}", path.display(), e)))?;
                updated.push(path);
            }
        }
        Ok(updated)
    }
}

fn collect_csv_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ZrpError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).map_err(|e| ZrpError::IoError(format!("{}: {}", dir.display(), e)))? {
        let entry = entry.map_err(|e| ZrpError::IoError(format!("{}: {}", dir.display(), e)))?;
        let path = entry.path();
        if path.is_dir() {
            collect_csv_files(&path, out)?;
        } else if path.extension().map(|ext| ext.eq_ignore_ascii_case("csv")).unwrap_or(false) {
            out.push(path);
        }
    }
    Ok(())
}

/// Write-to-temp + rename in the file's own directory, so the rename never
/// crosses a filesystem boundary.
fn atomic_write(file: &CsvFile) -> Result<(), ZrpError> {
    let parent = file
        .path
        .parent()
        .ok_or_else(|| ZrpError::IoError(format!("no parent directory for {}", file.path.display())))?;
    let temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| ZrpError::IoError(format!("{}: {}", parent.display(), e)))?;

    {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(temp.as_file());
        writer
            .write_record(&file.headers)
            .map_err(|e| ZrpError::IoError(e.to_string()))?;
        for record in &file.records {
            writer.write_record(record).map_err(|e| ZrpError::IoError(e.to_string()))?;
        }
        writer.flush().map_err(|e| ZrpError::IoError(e.to_string()))?;
    }

    temp.persist(&file.path)
        .map_err(|e| ZrpError::IoError(format!("{}: {}", file.path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn catalog_with(files: &[(&str, &str)]) -> (tempfile::TempDir, PartsCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
        }
        let catalog = PartsCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_find_part_across_categories() {
        let (_dir, catalog) = catalog_with(&[
            ("resistors/resistors.csv", "IPN,Description,Cost\nRES-0001,Old,10.50\nRES-0002,Other,1.00\n"),
            ("caps/caps.csv", "part_number,Description\nCAP-0001,A capacitor\n"),
        ]);

        let location = catalog.find_part("RES-0001").unwrap().unwrap();
        assert_eq!(location.row, 0);
        assert_eq!(location.file.row_as_map(0)["Description"], "Old");

        let by_alias = catalog.find_part("cap-0001").unwrap().unwrap();
        assert_eq!(by_alias.file.row_as_map(by_alias.row)["Description"], "A capacitor");

        assert!(catalog.find_part("MISSING").unwrap().is_none());
    }

    #[test]
    fn test_apply_changes_rewrites_only_matching_columns() {
        let (_dir, catalog) = catalog_with(&[(
            "resistors/resistors.csv",
            "IPN,Description,Cost\nRES-0001,Old,10.50\nRES-0002,Other,1.00\n",
        )]);

        let applied = catalog
            .apply_changes(
                "RES-0001",
                &[
                    ("Description".to_string(), "New".to_string()),
                    ("Cost".to_string(), "12.00".to_string()),
                    ("NoSuchField".to_string(), "x".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(applied, 2);

        let file = catalog.load(&catalog.csv_files().unwrap()[0]).unwrap();
        assert_eq!(file.row_as_map(0)["Description"], "New");
        assert_eq!(file.row_as_map(0)["Cost"], "12.00");
        assert_eq!(file.row_as_map(1)["Description"], "Other", "other rows untouched");
    }

    #[test]
    fn test_bom_detection() {
        let (_dir, catalog) = catalog_with(&[
            ("assemblies/boards.csv", "IPN,Qty\nRES-0001,2\n"),
            ("misc/PCA-100.csv", "IPN,Qty\nRES-0001,4\n"),
            ("resistors/resistors.csv", "IPN,Description\nRES-0001,Old\n"),
        ]);

        let files = catalog.csv_files().unwrap();
        let bom_count = files.iter().filter(|p| catalog.is_bom_path(p)).count();
        assert_eq!(bom_count, 2);
    }

    #[test]
    fn test_update_bom_references_rewrites_all_boms() {
        let (_dir, catalog) = catalog_with(&[
            ("assemblies/boards.csv", "IPN,Qty\nRES-0001,2\nCAP-0001,1\n"),
            ("misc/ASY-7.csv", "pn,Qty\nres-0001,4\n"),
            ("resistors/resistors.csv", "IPN,Description\nRES-0001,Old\n"),
        ]);

        let updated = catalog.update_bom_references("RES-0001", "RES-1000").unwrap();
        assert_eq!(updated.len(), 2);

        for path in updated {
            let file = catalog.load(&path).unwrap();
            let col = file.ipn_column().unwrap();
            assert!(file.records.iter().any(|r| r.get(col) == Some("RES-1000")));
            assert!(!file.records.iter().any(|r| r.get(col).unwrap().eq_ignore_ascii_case("RES-0001")));
        }

        // Non-BOM catalog file is untouched.
        let parts = catalog.find_part("RES-0001").unwrap();
        assert!(parts.is_some());
    }

    #[test]
    fn test_large_file_lookup_is_quick() {
        let mut content = String::from("IPN,Description\n");
        for i in 0..10_000 {
            content.push_str(&format!("PRT-{:05},part {}\n", i, i));
        }
        let (_dir, catalog) = catalog_with(&[("parts/generated.csv", content.as_str())]);

        let start = std::time::Instant::now();
        let location = catalog.find_part("PRT-09999").unwrap().unwrap();
        assert_eq!(location.row, 9999);
        assert!(start.elapsed().as_millis() < 1000, "10k-row scan took too long");
    }
}
