use std::fmt;

use serde::Serialize;

use crate::domain::{CanonicalGene, ExpressionRecord, GeneticProfile, GeneticProfileId, Sample};
use crate::error::KiraError;

/// Outcome of a symbol lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMatch {
    Unique(CanonicalGene),
    NotFound,
    /// The symbol is an alias of several genes; holds their Entrez ids.
    Ambiguous(Vec<i64>),
}

pub trait GeneLookup {
    fn gene_by_entrez_id(&self, entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError>;
    fn gene_by_symbol(&self, symbol: &str) -> Result<SymbolMatch, KiraError>;
}

pub trait SampleLookup {
    fn sample_in_study(
        &self,
        cancer_study_id: i64,
        stable_id: &str,
    ) -> Result<Option<Sample>, KiraError>;
}

pub trait ProfileLookup {
    fn profile_by_id(&self, id: GeneticProfileId) -> Result<Option<GeneticProfile>, KiraError>;
}

/// Append-only sink for validated records. Every call adds a new row.
pub trait RecordStore {
    fn insert(&self, record: &ExpressionRecord) -> Result<(), KiraError>;
}

/// Why a row could not be tied to reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidEntrezId { value: String },
    EntrezIdNotFound { entrez_gene_id: i64 },
    AmbiguousSymbol { symbol: String, candidates: Vec<i64> },
    GeneNotFound { symbol: String, entrez_gene_id: String },
    SampleNotFound { sample_id: String },
    TooFewFields { found: usize, expected: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidEntrezId { value } => {
                write!(f, "Ignoring line with invalid Entrez_Id {value}")
            }
            SkipReason::EntrezIdNotFound { entrez_gene_id } => {
                write!(
                    f,
                    "Entrez gene ID {entrez_gene_id} not found. Record will be skipped."
                )
            }
            SkipReason::AmbiguousSymbol { symbol, candidates } => {
                let ids = candidates
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "Ambiguous gene symbol {symbol} (matches Entrez ids {ids}). Record will be skipped."
                )
            }
            SkipReason::GeneNotFound {
                symbol,
                entrez_gene_id,
            } => write!(
                f,
                "Missing gene: {symbol} [{entrez_gene_id}]. Record will be skipped."
            ),
            SkipReason::SampleNotFound { sample_id } => {
                write!(f, "Sample '{sample_id}' not found in sample file. Skipping line.")
            }
            SkipReason::TooFewFields { found, expected } => {
                write!(
                    f,
                    "Line has {found} fields, expected at least {expected}. Skipping line."
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { gene: CanonicalGene, sample: Sample },
    Skipped(SkipReason),
}

impl Resolution {
    pub fn into_result(self) -> Result<(CanonicalGene, Sample), SkipReason> {
        match self {
            Resolution::Resolved { gene, sample } => Ok((gene, sample)),
            Resolution::Skipped(reason) => Err(reason),
        }
    }
}

/// Ties the raw identifiers of a row to reference genes and samples.
pub struct ReferenceResolver<'a, G: GeneLookup, S: SampleLookup> {
    genes: &'a G,
    samples: &'a S,
    cancer_study_id: i64,
}

impl<'a, G: GeneLookup, S: SampleLookup> ReferenceResolver<'a, G, S> {
    pub fn new(genes: &'a G, samples: &'a S, cancer_study_id: i64) -> Self {
        Self {
            genes,
            samples,
            cancer_study_id,
        }
    }

    /// Resolves the gene first, then the sample. Lookup errors are
    /// infrastructure failures and propagate; everything else is a skip.
    pub fn resolve(
        &self,
        entrez_gene_id: &str,
        hugo_symbol: &str,
        sample_id: &str,
    ) -> Result<Resolution, KiraError> {
        let gene = match self.resolve_gene(entrez_gene_id, hugo_symbol)? {
            Ok(gene) => gene,
            Err(reason) => return Ok(Resolution::Skipped(reason)),
        };

        match self.samples.sample_in_study(self.cancer_study_id, sample_id)? {
            Some(sample) => Ok(Resolution::Resolved { gene, sample }),
            None => Ok(Resolution::Skipped(SkipReason::SampleNotFound {
                sample_id: sample_id.to_string(),
            })),
        }
    }

    /// An Entrez id, when supplied, is authoritative: a malformed or unknown
    /// one never falls back to the symbol.
    pub fn resolve_gene(
        &self,
        entrez_gene_id: &str,
        hugo_symbol: &str,
    ) -> Result<Result<CanonicalGene, SkipReason>, KiraError> {
        if !(entrez_gene_id.is_empty() || entrez_gene_id == "0") {
            let parsed = match entrez_gene_id.parse::<i64>() {
                Ok(id) if id >= 0 => id,
                _ => {
                    return Ok(Err(SkipReason::InvalidEntrezId {
                        value: entrez_gene_id.to_string(),
                    }));
                }
            };
            return Ok(match self.genes.gene_by_entrez_id(parsed)? {
                Some(gene) => Ok(gene),
                None => Err(SkipReason::EntrezIdNotFound {
                    entrez_gene_id: parsed,
                }),
            });
        }

        if !(hugo_symbol.is_empty() || hugo_symbol == "Unknown") {
            match self.genes.gene_by_symbol(hugo_symbol)? {
                SymbolMatch::Unique(gene) => return Ok(Ok(gene)),
                SymbolMatch::Ambiguous(candidates) => {
                    return Ok(Err(SkipReason::AmbiguousSymbol {
                        symbol: hugo_symbol.to_string(),
                        candidates,
                    }));
                }
                SymbolMatch::NotFound => {}
            }
        }

        Ok(Err(SkipReason::GeneNotFound {
            symbol: hugo_symbol.to_string(),
            entrez_gene_id: entrez_gene_id.to_string(),
        }))
    }
}
