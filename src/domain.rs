use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneticProfileId(i64);

impl GeneticProfileId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GeneticProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for GeneticProfileId {
    type Error = KiraError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        if id <= 0 {
            return Err(KiraError::InvalidProfileId(id.to_string()));
        }
        Ok(Self(id))
    }
}

impl FromStr for GeneticProfileId {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| KiraError::InvalidProfileId(value.to_string()))
            .and_then(Self::try_from)
    }
}

/// A gene from the reference table, keyed by its Entrez id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalGene {
    pub entrez_gene_id: i64,
    pub hugo_symbol: String,
    pub aliases: Vec<String>,
}

impl CanonicalGene {
    pub fn new(entrez_gene_id: i64, hugo_symbol: &str) -> Self {
        Self {
            entrez_gene_id,
            hugo_symbol: hugo_symbol.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub internal_id: i64,
    pub stable_id: String,
    pub cancer_study_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneticProfile {
    pub id: GeneticProfileId,
    pub cancer_study_id: i64,
    pub stable_id: String,
}

/// One validated row of a single-cell expression file.
///
/// Only built once both the gene and the sample have been resolved, so a
/// record always points at existing reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionRecord {
    sample_id: i64,
    profile_id: GeneticProfileId,
    gene: CanonicalGene,
    cell_type: String,
    tissue: String,
    expression_value: String,
}

impl ExpressionRecord {
    pub fn new(
        sample: &Sample,
        profile_id: GeneticProfileId,
        gene: CanonicalGene,
        cell_type: &str,
        tissue: &str,
        expression_value: &str,
    ) -> Self {
        Self {
            sample_id: sample.internal_id,
            profile_id,
            gene,
            cell_type: cell_type.to_string(),
            tissue: tissue.to_string(),
            expression_value: expression_value.to_string(),
        }
    }

    pub fn sample_id(&self) -> i64 {
        self.sample_id
    }

    pub fn profile_id(&self) -> GeneticProfileId {
        self.profile_id
    }

    pub fn gene(&self) -> &CanonicalGene {
        &self.gene
    }

    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    pub fn tissue(&self) -> &str {
        &self.tissue
    }

    pub fn expression_value(&self) -> &str {
        &self.expression_value
    }
}

/// A file paired with the genetic profile its rows belong to.
///
/// Written as `<profile_id>:<path>`, e.g. `12:data/sc_expression.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub profile_id: GeneticProfileId,
    pub file: Utf8PathBuf,
}

impl fmt::Display for ImportSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.profile_id, self.file)
    }
}

impl FromStr for ImportSpecifier {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (profile, file) = trimmed
            .split_once(':')
            .ok_or_else(|| KiraError::InvalidImportSpecifier(value.to_string()))?;
        if file.trim().is_empty() {
            return Err(KiraError::InvalidImportSpecifier(value.to_string()));
        }
        Ok(Self {
            profile_id: profile.parse()?,
            file: Utf8PathBuf::from(file.trim()),
        })
    }
}
