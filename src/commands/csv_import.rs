//! CSV table imports: one file or a folder of per-season files.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::common::{clear_table, print_banner};
use crate::{
    error::ImportError,
    ingest::{
        dedupe,
        jobs::profile,
        read_csv, season_files, upload_in_batches, write_failure_log, CsvJobKind, CsvSource, DuplicatePolicy,
        SeasonFile, UploadMode, UploadReport,
    },
    storage::{Filter, Store},
    Result,
};

#[derive(Debug, Clone)]
pub struct CsvImportParams {
    pub kind: CsvJobKind,
    pub data_dir: PathBuf,
    /// Replaces the job's default file or folder.
    pub source: Option<PathBuf>,
    pub clear: bool,
    pub on_duplicate: DuplicatePolicy,
    pub batch_size: Option<usize>,
    /// Where `import_failures_*.json` is written.
    pub failure_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub label: String,
    pub total: usize,
    pub inserted: usize,
    pub failed: usize,
    pub duplicates_removed: usize,
}

#[derive(Debug, Default)]
pub struct CsvImportSummary {
    pub files: Vec<FileSummary>,
    /// Files that could not be read, with the reason.
    pub unreadable: Vec<(String, String)>,
    pub report: UploadReport,
    pub failure_log: Option<PathBuf>,
    /// Row count in the table after the import, when it could be read.
    pub stored: Option<u64>,
}

fn source_files(source: CsvSource, data_dir: &Path, override_path: Option<&Path>) -> Result<Vec<SeasonFile>> {
    match source {
        CsvSource::File(name) => {
            let path = override_path.map_or_else(|| data_dir.join(name), Path::to_path_buf);
            if !path.is_file() {
                return Err(ImportError::Aborted {
                    reason: format!("{} not found", path.display()),
                });
            }
            Ok(vec![SeasonFile {
                label: name.to_string(),
                season: None,
                path,
            }])
        }
        CsvSource::SeasonFolder(dir) => {
            let path = override_path.map_or_else(|| data_dir.join(dir), Path::to_path_buf);
            season_files(&path)
        }
    }
}

/// Import one CSV job into its table.
///
/// Unreadable files are skipped and listed; rejected rows are retried one
/// at a time and written to a failure log. Only a missing source or an
/// `abort` duplicate policy stops the run.
pub async fn handle_csv_import<S: Store>(store: &mut S, params: CsvImportParams) -> Result<CsvImportSummary> {
    let job = params.kind.job();
    let batch_size = params.batch_size.unwrap_or(job.batch_size);

    println!("Starting {} import into {} ({})", job.name, job.table, store.describe());

    let files = source_files(job.source, &params.data_dir, params.source.as_deref())?;
    if matches!(job.source, CsvSource::SeasonFolder(_)) {
        println!("\nFound {} CSV files to import:", files.len());
        for file in &files {
            println!("  - {}", file.path.display());
        }
    }

    if params.clear {
        clear_table(store, job.table).await;
    }

    let mut summary = CsvImportSummary::default();

    for file in &files {
        print_banner(&format!("Processing {}", file.label));

        let table = match read_csv(&file.path) {
            Ok(table) => table,
            Err(e) => {
                warn!(file = %file.path.display(), error = %e, "Skipping unreadable file");
                summary.unreadable.push((file.label.clone(), e.to_string()));
                continue;
            }
        };
        println!("  Loaded {} rows from {}", table.len(), file.path.display());

        let records = job.prepare(&table);
        if matches!(job.source, CsvSource::File(_)) {
            println!("\nData profile:");
            profile(&records, job.id_column, job.profile_columns).print(job.id_column);
        }

        let outcome = dedupe(records, job.dedupe_key, params.on_duplicate)?;
        if outcome.removed > 0 {
            println!(
                "  Removed {} duplicate rows on ({})",
                outcome.removed,
                job.dedupe_key.join(", ")
            );
        }

        let report = upload_in_batches(store, job.table, &outcome.records, UploadMode::Insert, batch_size).await;
        println!(
            "  {} summary: {} inserted, {} failed",
            file.label,
            report.inserted,
            report.failed.len()
        );

        summary.files.push(FileSummary {
            label: file.label.clone(),
            total: report.attempted,
            inserted: report.inserted,
            failed: report.failed.len(),
            duplicates_removed: outcome.removed,
        });
        summary.report.merge(report);
    }

    summary.failure_log = write_failure_log(&params.failure_dir, job.table, &summary.report.failed)?;

    print_banner("IMPORT SUMMARY");
    if files.len() > 1 {
        println!("CSV files processed: {}", files.len());
    }
    summary.report.print_summary();

    if summary.files.len() > 1 {
        println!("\nBy file:");
        for file in &summary.files {
            let status = if file.failed == 0 { "✓" } else { "!" };
            println!("  {status} {}: {}/{}", file.label, file.inserted, file.total);
        }
    }
    if !summary.unreadable.is_empty() {
        println!("\nFiles that failed to process:");
        for (label, error) in &summary.unreadable {
            println!("  - {label}: {error}");
        }
    }
    if let Some(path) = &summary.failure_log {
        println!("\nFailed records saved to {}", path.display());
    }

    summary.stored = verify(store, job.table, &files, summary.report.inserted).await;

    Ok(summary)
}

/// Print stored row counts, per season for season folders.
async fn verify<S: Store>(store: &mut S, table: &str, files: &[SeasonFile], inserted: usize) -> Option<u64> {
    println!("\nVerifying import...");
    let stored = match store.count(table, &[]).await {
        Ok(count) => count,
        Err(e) => {
            warn!(table, error = %e, "Verification failed");
            return None;
        }
    };
    println!("✓ {table} now contains {stored} records");
    if stored != inserted as u64 {
        info!(table, stored, inserted, "Stored count differs from rows written this run");
    }

    let seasons: Vec<_> = files.iter().filter_map(|f| f.season).collect();
    if !seasons.is_empty() {
        println!("\nRecords by season:");
        for season in seasons {
            match store.count(table, &[Filter::eq("season", season.as_u16())]).await {
                Ok(count) => println!("  {season}: {count}"),
                Err(e) => {
                    warn!(table, %season, error = %e, "Season count failed");
                    break;
                }
            }
        }
    }

    Some(stored)
}
