use super::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Warnings listed individually before the rest are summarized.
const MAX_LISTED_WARNINGS: usize = 10;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Import {
        file,
        name,
        notes,
        fill,
    } = cmd
    {
        let mut cfg = cfg.clone();
        if let Some(mode) = fill {
            cfg.fill_mode = *mode;
        }

        let name = name.clone().unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "datalog".to_string())
        });

        let mut store = open_store(&cfg)?;
        let mut report_progress = |percent: f64| {
            log::debug!("import progress: {:.0}%", percent);
            false
        };
        let report = store.import_datalog(file, &name, notes, Some(&mut report_progress))?;

        for w in report.warnings.iter().take(MAX_LISTED_WARNINGS) {
            warning(format!("line {}: {} ({})", w.line, w.message, w.text));
        }
        if report.warnings.len() > MAX_LISTED_WARNINGS {
            warning(format!(
                "... and {} more skipped lines",
                report.warnings.len() - MAX_LISTED_WARNINGS
            ));
        }

        success(format!(
            "Imported {} records from {} as session #{} '{}'",
            report.records,
            file.display(),
            report.session_id,
            name
        ));
    }
    Ok(())
}
