use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::app::ProgressSink;
use crate::domain::{
    CanonicalGene, ExpressionRecord, GeneticProfile, GeneticProfileId, ImportSpecifier, Sample,
};
use crate::error::KiraError;
use crate::fs_util;
use crate::importer::{ImportContext, ImportReport, RowImporter};
use crate::memory::MemoryRecordStore;
use crate::reference::{GeneLookup, ProfileLookup, RecordStore, SampleLookup, SymbolMatch};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cancer_study (
    cancer_study_id INTEGER PRIMARY KEY,
    cancer_study_identifier TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS gene (
    entrez_gene_id INTEGER PRIMARY KEY,
    hugo_gene_symbol TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS gene_alias (
    entrez_gene_id INTEGER NOT NULL REFERENCES gene (entrez_gene_id),
    gene_alias TEXT NOT NULL,
    PRIMARY KEY (entrez_gene_id, gene_alias)
);
CREATE TABLE IF NOT EXISTS sample (
    internal_id INTEGER PRIMARY KEY,
    stable_id TEXT NOT NULL,
    cancer_study_id INTEGER NOT NULL REFERENCES cancer_study (cancer_study_id),
    UNIQUE (cancer_study_id, stable_id)
);
CREATE TABLE IF NOT EXISTS genetic_profile (
    genetic_profile_id INTEGER PRIMARY KEY,
    stable_id TEXT NOT NULL UNIQUE,
    cancer_study_id INTEGER NOT NULL REFERENCES cancer_study (cancer_study_id)
);
CREATE TABLE IF NOT EXISTS single_cell_expression (
    genetic_profile_id INTEGER NOT NULL REFERENCES genetic_profile (genetic_profile_id),
    sample_id INTEGER NOT NULL REFERENCES sample (internal_id),
    tissue TEXT,
    cell_type TEXT,
    entrez_gene_id INTEGER NOT NULL REFERENCES gene (entrez_gene_id),
    expression_value TEXT
);
";

/// The relational store: reference tables plus `single_cell_expression`.
pub struct Store {
    conn: Connection,
    path: Option<Utf8PathBuf>,
}

impl Store {
    pub fn open(path: &Utf8Path) -> Result<Self, KiraError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        Self::configure(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, KiraError> {
        Self::configure(Connection::open_in_memory()?, None)
    }

    fn configure(conn: Connection, path: Option<Utf8PathBuf>) -> Result<Self, KiraError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, path })
    }

    /// `<data dir>/kira-sc-expression/portal.sqlite`
    pub fn default_path() -> Result<Utf8PathBuf, KiraError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.data_dir()
                        .join("kira-sc-expression")
                        .join("portal.sqlite"),
                )
                .ok()
            })
            .ok_or_else(|| KiraError::Filesystem("unable to resolve data directory".to_string()))
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn init_schema(&self) -> Result<(), KiraError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn count_records(&self, profile_id: GeneticProfileId) -> Result<usize, KiraError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM single_cell_expression WHERE genetic_profile_id = ?1",
            params![profile_id.get()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Imports one file inside a single transaction. Any error rolls the
    /// whole file back; a dry run resolves everything and always rolls back.
    pub fn import_file(
        &mut self,
        spec: &ImportSpecifier,
        dry_run: bool,
        sink: &dyn ProgressSink,
    ) -> Result<ImportReport, KiraError> {
        let max_lines = fs_util::count_lines(&spec.file)?;
        let reader = fs_util::open_input(&spec.file)?;
        let source = spec.file.as_str();

        let tx = self.conn.transaction()?;
        let report = {
            let session = SqliteSession::new(&tx);
            let mut context = ImportContext::new(sink, Some(max_lines));
            if dry_run {
                let records = MemoryRecordStore::new();
                RowImporter::new(&session, &records).import(
                    reader,
                    source,
                    spec.profile_id,
                    &mut context,
                )?
            } else {
                RowImporter::new(&session, &session).import(
                    reader,
                    source,
                    spec.profile_id,
                    &mut context,
                )?
            }
        };

        if dry_run {
            tx.rollback()?;
            debug!("dry run for {source}; rolled back");
        } else {
            tx.commit()?;
            debug!("committed {} records from {source}", report.accepted);
        }
        Ok(report)
    }
}

/// Lookups and inserts over one connection or open transaction.
pub struct SqliteSession<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSession<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn load_gene(&self, entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError> {
        let symbol: Option<String> = self
            .conn
            .prepare_cached("SELECT hugo_gene_symbol FROM gene WHERE entrez_gene_id = ?1")?
            .query_row(params![entrez_gene_id], |row| row.get(0))
            .optional()?;
        let Some(symbol) = symbol else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT gene_alias FROM gene_alias WHERE entrez_gene_id = ?1 ORDER BY gene_alias",
        )?;
        let aliases = stmt
            .query_map(params![entrez_gene_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CanonicalGene {
            entrez_gene_id,
            hugo_symbol: symbol,
            aliases,
        }))
    }

    fn entrez_ids(&self, sql: &str, symbol: &str) -> Result<Vec<i64>, KiraError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let ids = stmt
            .query_map(params![symbol], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl GeneLookup for SqliteSession<'_> {
    fn gene_by_entrez_id(&self, entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError> {
        self.load_gene(entrez_gene_id)
    }

    fn gene_by_symbol(&self, symbol: &str) -> Result<SymbolMatch, KiraError> {
        let mut ids = self.entrez_ids(
            "SELECT entrez_gene_id FROM gene WHERE hugo_gene_symbol = ?1 COLLATE NOCASE \
             ORDER BY entrez_gene_id",
            symbol,
        )?;
        if ids.is_empty() {
            ids = self.entrez_ids(
                "SELECT DISTINCT entrez_gene_id FROM gene_alias WHERE gene_alias = ?1 COLLATE NOCASE \
                 ORDER BY entrez_gene_id",
                symbol,
            )?;
        }

        match ids.as_slice() {
            [] => Ok(SymbolMatch::NotFound),
            [id] => Ok(self
                .load_gene(*id)?
                .map(SymbolMatch::Unique)
                .unwrap_or(SymbolMatch::NotFound)),
            _ => Ok(SymbolMatch::Ambiguous(ids)),
        }
    }
}

impl SampleLookup for SqliteSession<'_> {
    fn sample_in_study(
        &self,
        cancer_study_id: i64,
        stable_id: &str,
    ) -> Result<Option<Sample>, KiraError> {
        let sample = self
            .conn
            .prepare_cached(
                "SELECT internal_id, stable_id, cancer_study_id FROM sample \
                 WHERE cancer_study_id = ?1 AND stable_id = ?2",
            )?
            .query_row(params![cancer_study_id, stable_id], |row| {
                Ok(Sample {
                    internal_id: row.get(0)?,
                    stable_id: row.get(1)?,
                    cancer_study_id: row.get(2)?,
                })
            })
            .optional()?;
        Ok(sample)
    }
}

impl ProfileLookup for SqliteSession<'_> {
    fn profile_by_id(&self, id: GeneticProfileId) -> Result<Option<GeneticProfile>, KiraError> {
        let profile = self
            .conn
            .prepare_cached(
                "SELECT stable_id, cancer_study_id FROM genetic_profile \
                 WHERE genetic_profile_id = ?1",
            )?
            .query_row(params![id.get()], |row| {
                Ok(GeneticProfile {
                    id,
                    stable_id: row.get(0)?,
                    cancer_study_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(profile)
    }
}

impl RecordStore for SqliteSession<'_> {
    fn insert(&self, record: &ExpressionRecord) -> Result<(), KiraError> {
        self.conn
            .prepare_cached(
                "INSERT INTO single_cell_expression \
                 (genetic_profile_id, sample_id, tissue, cell_type, entrez_gene_id, expression_value) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(params![
                record.profile_id().get(),
                record.sample_id(),
                record.tissue(),
                record.cell_type(),
                record.gene().entrez_gene_id,
                record.expression_value(),
            ])?;
        Ok(())
    }
}
