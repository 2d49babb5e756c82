use std::fmt;
use std::io::BufRead;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{ProgressEvent, ProgressLevel, ProgressSink};
use crate::columns::ColumnLayout;
use crate::domain::{ExpressionRecord, GeneticProfileId};
use crate::error::KiraError;
use crate::reference::{
    GeneLookup, ProfileLookup, RecordStore, ReferenceResolver, SampleLookup, SkipReason,
};
use crate::tsv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    AwaitingHeader,
    HeaderValidated,
    ScanningRows,
    Finalizing,
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportPhase::AwaitingHeader => write!(f, "Header"),
            ImportPhase::HeaderValidated => write!(f, "Columns"),
            ImportPhase::ScanningRows => write!(f, "Rows"),
            ImportPhase::Finalizing => write!(f, "Finalize"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub data_lines: usize,
    pub accepted: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Per-run progress state: the line counter and the sink that receives
/// warnings and summaries.
pub struct ImportContext<'s> {
    sink: &'s dyn ProgressSink,
    current_line: usize,
    max_lines: Option<usize>,
    last_percent: Option<usize>,
    started: Instant,
}

impl<'s> ImportContext<'s> {
    pub fn new(sink: &'s dyn ProgressSink, max_lines: Option<usize>) -> Self {
        Self {
            sink,
            current_line: 0,
            max_lines,
            last_percent: None,
            started: Instant::now(),
        }
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn increment_line(&mut self) {
        self.current_line += 1;
        let Some(max) = self.max_lines.filter(|max| *max > 0) else {
            return;
        };
        let percent = (self.current_line * 100 / max).min(100);
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            self.emit(
                ProgressLevel::Progress,
                format!("{percent}% ({}/{max} lines)", self.current_line),
            );
        }
    }

    pub fn phase(&self, phase: ImportPhase, detail: &str) {
        debug!("phase={phase}; {detail}");
        self.emit(ProgressLevel::Info, format!("phase={phase}; {detail}"));
    }

    pub fn warn(&self, message: String) {
        warn!(line = self.current_line, "{message}");
        self.emit(ProgressLevel::Warning, message);
    }

    pub fn message(&self, message: String) {
        info!("{message}");
        self.emit(ProgressLevel::Info, message);
    }

    fn emit(&self, level: ProgressLevel, message: String) {
        self.sink.event(ProgressEvent {
            level,
            message,
            elapsed: Some(self.started.elapsed()),
        });
    }
}

/// Reads one expression file and hands every resolvable row to the store.
pub struct RowImporter<'a, R, S> {
    reference: &'a R,
    store: &'a S,
}

impl<'a, R, S> RowImporter<'a, R, S>
where
    R: GeneLookup + SampleLookup + ProfileLookup,
    S: RecordStore,
{
    pub fn new(reference: &'a R, store: &'a S) -> Self {
        Self { reference, store }
    }

    /// Runs the whole file. Unresolvable rows are skipped; a bad header, an
    /// unknown profile, a store failure or an empty result end the run with
    /// an error.
    pub fn import<B: BufRead>(
        &self,
        reader: B,
        source: &str,
        profile_id: GeneticProfileId,
        context: &mut ImportContext<'_>,
    ) -> Result<ImportReport, KiraError> {
        let profile = self
            .reference
            .profile_by_id(profile_id)?
            .ok_or(KiraError::ProfileNotFound(profile_id.get()))?;
        let resolver =
            ReferenceResolver::new(self.reference, self.reference, profile.cancer_study_id);

        context.phase(ImportPhase::AwaitingHeader, &format!("reading {source}"));
        let mut lines = reader.lines();
        let layout = loop {
            let Some(line) = lines.next() else {
                return Err(KiraError::MissingHeader(source.to_string()));
            };
            let line =
                line.map_err(|err| KiraError::Filesystem(format!("read {source}: {err}")))?;
            context.increment_line();
            if tsv::is_data_line(&line) {
                break ColumnLayout::from_header(&tsv::split_line(&line))?;
            }
        };
        context.phase(
            ImportPhase::HeaderValidated,
            &format!("profile {} ({})", profile.id, profile.stable_id),
        );

        context.phase(ImportPhase::ScanningRows, "resolving genes and samples");
        let mut report = ImportReport::default();
        for line in lines {
            let line =
                line.map_err(|err| KiraError::Filesystem(format!("read {source}: {err}")))?;
            context.increment_line();
            if !tsv::is_data_line(&line) {
                continue;
            }
            report.data_lines += 1;

            let parts = tsv::split_line(&line);
            let resolution = match layout.fields(&parts) {
                Some(fields) => resolver
                    .resolve(fields.entrez_gene_id, fields.hugo_symbol, fields.sample_id)?
                    .into_result()
                    .map(|(gene, sample)| {
                        ExpressionRecord::new(
                            &sample,
                            profile.id,
                            gene,
                            fields.cell_type,
                            fields.tissue,
                            fields.expression_value,
                        )
                    }),
                None => Err(SkipReason::TooFewFields {
                    found: parts.len(),
                    expected: layout.min_fields(),
                }),
            };

            match resolution {
                Ok(record) => {
                    self.store.insert(&record)?;
                    report.accepted += 1;
                }
                Err(reason) => {
                    context.warn(reason.to_string());
                    report.skipped.push(SkippedRow {
                        line: context.current_line(),
                        reason,
                    });
                }
            }
        }

        context.phase(ImportPhase::Finalizing, "checking results");
        if !report.skipped.is_empty() {
            context.message(format!(
                "total number of data entries skipped: {}",
                report.skipped_count()
            ));
        }
        if report.accepted == 0 {
            return Err(KiraError::NothingImported {
                lines: report.data_lines,
                skipped: report.skipped_count(),
            });
        }
        context.message(format!("imported {} records from {source}", report.accepted));
        Ok(report)
    }
}
