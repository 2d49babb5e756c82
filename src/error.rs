use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid import specifier: {0}")]
    InvalidImportSpecifier(String),

    #[error("invalid genetic profile id: {0}")]
    InvalidProfileId(String),

    #[error("missing config file kira-scx.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("nothing to import: pass a file or list imports in the config")]
    NothingToImport,

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("input file has no header line: {0}")]
    #[diagnostic(help("the first non-blank, non-comment line must name the columns"))]
    MissingHeader(String),

    #[error("Missing {0} columns. Please fix your file.")]
    #[diagnostic(help(
        "required columns: Sample_Id, Cell_Type, Tissue, Expression_Value and Hugo_Symbol or Entrez_Gene_Id"
    ))]
    MissingColumns(String),

    #[error("genetic profile not found: {0}")]
    ProfileNotFound(i64),

    #[error("no records saved to the database ({lines} data lines read, {skipped} skipped)")]
    NothingImported { lines: usize, skipped: usize },

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for KiraError {
    fn from(err: rusqlite::Error) -> Self {
        KiraError::Database(err.to_string())
    }
}
