//! CSV file discovery and reading.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::{
    cli::types::Season,
    error::{ImportError, Result},
};

/// Raw contents of one CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl CsvTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn read_csv(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CsvTable { headers, rows })
}

/// One `<year>.csv` file inside a per-season folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonFile {
    pub label: String,
    pub season: Option<Season>,
    pub path: PathBuf,
}

/// List the `.csv` files in `dir`, sorted by file name.
pub fn season_files(dir: &Path) -> Result<Vec<SeasonFile>> {
    if !dir.is_dir() {
        return Err(ImportError::Aborted {
            reason: format!("{} is not a directory (expected files like {}/2024.csv)", dir.display(), dir.display()),
        });
    }

    let mut files: Vec<SeasonFile> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .map(|path| {
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let season = label.parse::<Season>().ok();
            SeasonFile { label, season, path }
        })
        .collect();

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    if files.is_empty() {
        return Err(ImportError::NoData {
            endpoint: format!("{}/*.csv", dir.display()),
        });
    }

    Ok(files)
}
