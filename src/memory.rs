use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{CanonicalGene, ExpressionRecord, GeneticProfile, GeneticProfileId, Sample};
use crate::error::KiraError;
use crate::reference::{GeneLookup, ProfileLookup, RecordStore, SampleLookup, SymbolMatch};

/// Reference data held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReference {
    genes: HashMap<i64, CanonicalGene>,
    samples: HashMap<(i64, String), Sample>,
    profiles: HashMap<GeneticProfileId, GeneticProfile>,
}

impl MemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_gene(&mut self, gene: CanonicalGene) -> &mut Self {
        self.genes.insert(gene.entrez_gene_id, gene);
        self
    }

    pub fn add_sample(&mut self, sample: Sample) -> &mut Self {
        self.samples.insert(
            (sample.cancer_study_id, sample.stable_id.clone()),
            sample,
        );
        self
    }

    pub fn add_profile(&mut self, profile: GeneticProfile) -> &mut Self {
        self.profiles.insert(profile.id, profile);
        self
    }
}

/// Hugo symbols win over aliases; several genes behind one name is
/// ambiguous.
pub fn match_symbol<'a>(
    genes: impl Iterator<Item = &'a CanonicalGene> + Clone,
    symbol: &str,
) -> SymbolMatch {
    let by_hugo = genes
        .clone()
        .filter(|gene| gene.hugo_symbol.eq_ignore_ascii_case(symbol))
        .collect::<Vec<_>>();
    let candidates = if by_hugo.is_empty() {
        genes
            .filter(|gene| {
                gene.aliases
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(symbol))
            })
            .collect::<Vec<_>>()
    } else {
        by_hugo
    };

    match candidates.as_slice() {
        [] => SymbolMatch::NotFound,
        [gene] => SymbolMatch::Unique((*gene).clone()),
        many => {
            let mut ids = many.iter().map(|gene| gene.entrez_gene_id).collect::<Vec<_>>();
            ids.sort_unstable();
            SymbolMatch::Ambiguous(ids)
        }
    }
}

impl GeneLookup for MemoryReference {
    fn gene_by_entrez_id(&self, entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError> {
        Ok(self.genes.get(&entrez_gene_id).cloned())
    }

    fn gene_by_symbol(&self, symbol: &str) -> Result<SymbolMatch, KiraError> {
        Ok(match_symbol(self.genes.values(), symbol))
    }
}

impl SampleLookup for MemoryReference {
    fn sample_in_study(
        &self,
        cancer_study_id: i64,
        stable_id: &str,
    ) -> Result<Option<Sample>, KiraError> {
        Ok(self
            .samples
            .get(&(cancer_study_id, stable_id.to_string()))
            .cloned())
    }
}

impl ProfileLookup for MemoryReference {
    fn profile_by_id(&self, id: GeneticProfileId) -> Result<Option<GeneticProfile>, KiraError> {
        Ok(self.profiles.get(&id).cloned())
    }
}

/// Collects records instead of writing them anywhere. Used for dry runs.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<ExpressionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExpressionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, record: &ExpressionRecord) -> Result<(), KiraError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| KiraError::Database("record store lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }
}
