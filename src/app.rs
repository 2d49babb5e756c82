use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::domain::ImportSpecifier;
use crate::error::KiraError;
use crate::importer::SkippedRow;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub items: Vec<ImportSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub file: String,
    pub profile_id: i64,
    pub data_lines: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub profile_total: usize,
    pub dry_run: bool,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub database: Option<String>,
    pub initialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Info,
    Progress,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App {
    store: Store,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn init(&self, sink: &dyn ProgressSink) -> Result<InitResult, KiraError> {
        sink.event(ProgressEvent {
            level: ProgressLevel::Info,
            message: "phase=Store; creating tables".to_string(),
            elapsed: None,
        });
        self.store.init_schema()?;
        Ok(InitResult {
            database: self.store.path().map(|path| path.to_string()),
            initialized: true,
        })
    }

    /// Imports the given file, or every import listed in the config. Files
    /// run one after another, each in its own transaction; the first
    /// failure stops the run.
    pub fn import(
        &mut self,
        specifier: Option<ImportSpecifier>,
        config: Option<&ResolvedConfig>,
        options: ImportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ImportResult, KiraError> {
        let specs = match (specifier, config) {
            (Some(spec), _) => vec![spec],
            (None, Some(config)) => config.imports.clone(),
            (None, None) => Vec::new(),
        };
        if specs.is_empty() {
            return Err(KiraError::NothingToImport);
        }

        let mut items = Vec::with_capacity(specs.len());
        for spec in &specs {
            items.push(self.import_single(spec, options, sink)?);
        }
        Ok(ImportResult { items })
    }

    fn import_single(
        &mut self,
        spec: &ImportSpecifier,
        options: ImportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ImportSummary, KiraError> {
        info!(file = %spec.file, profile = %spec.profile_id, "importing single-cell expression data");
        let report = self.store.import_file(spec, options.dry_run, sink)?;
        let profile_total = self.store.count_records(spec.profile_id)?;

        Ok(ImportSummary {
            file: spec.file.to_string(),
            profile_id: spec.profile_id.get(),
            data_lines: report.data_lines,
            accepted: report.accepted,
            skipped: report.skipped_count(),
            skipped_rows: report.skipped,
            profile_total,
            dry_run: options.dry_run,
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}
