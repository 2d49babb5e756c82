use std::sync::Mutex;

use assert_matches::assert_matches;

use kira_sc_expression::domain::{CanonicalGene, Sample};
use kira_sc_expression::error::KiraError;
use kira_sc_expression::reference::{
    GeneLookup, ReferenceResolver, Resolution, SampleLookup, SkipReason, SymbolMatch,
};

#[derive(Default)]
struct MockGenes {
    entrez_calls: Mutex<usize>,
    symbol_calls: Mutex<usize>,
}

impl GeneLookup for MockGenes {
    fn gene_by_entrez_id(&self, entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError> {
        *self.entrez_calls.lock().unwrap() += 1;
        Ok(match entrez_gene_id {
            7157 => Some(CanonicalGene::new(7157, "TP53")),
            3845 => Some(CanonicalGene::new(3845, "KRAS")),
            _ => None,
        })
    }

    fn gene_by_symbol(&self, symbol: &str) -> Result<SymbolMatch, KiraError> {
        *self.symbol_calls.lock().unwrap() += 1;
        Ok(match symbol {
            "TP53" => SymbolMatch::Unique(CanonicalGene::new(7157, "TP53")),
            "KRAS" => SymbolMatch::Unique(CanonicalGene::new(3845, "KRAS")),
            _ => SymbolMatch::NotFound,
        })
    }
}

struct MockSamples;

impl SampleLookup for MockSamples {
    fn sample_in_study(
        &self,
        cancer_study_id: i64,
        stable_id: &str,
    ) -> Result<Option<Sample>, KiraError> {
        Ok((stable_id == "S1").then(|| Sample {
            internal_id: 11,
            stable_id: stable_id.to_string(),
            cancer_study_id,
        }))
    }
}

struct BrokenGenes;

impl GeneLookup for BrokenGenes {
    fn gene_by_entrez_id(&self, _entrez_gene_id: i64) -> Result<Option<CanonicalGene>, KiraError> {
        Err(KiraError::Database("connection lost".to_string()))
    }

    fn gene_by_symbol(&self, _symbol: &str) -> Result<SymbolMatch, KiraError> {
        Err(KiraError::Database("connection lost".to_string()))
    }
}

#[test]
fn entrez_id_wins_over_symbol() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    let resolution = resolver.resolve("7157", "KRAS", "S1").unwrap();

    assert_matches!(
        resolution,
        Resolution::Resolved { gene, sample }
            if gene.hugo_symbol == "TP53" && sample.internal_id == 11
    );
    assert_eq!(*genes.symbol_calls.lock().unwrap(), 0);
}

#[test]
fn unusable_identifiers_fail() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    for (entrez, symbol) in [("0", ""), ("0", "Unknown"), ("", ""), ("", "Unknown")] {
        let resolution = resolver.resolve(entrez, symbol, "S1").unwrap();
        assert_matches!(
            resolution,
            Resolution::Skipped(SkipReason::GeneNotFound { .. }),
            "entrez={entrez:?} symbol={symbol:?}"
        );
    }
    assert_eq!(*genes.entrez_calls.lock().unwrap(), 0);
    assert_eq!(*genes.symbol_calls.lock().unwrap(), 0);
}

#[test]
fn malformed_entrez_id_never_falls_back_to_symbol() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    for entrez in ["-5", "abc", "7157.0"] {
        let resolution = resolver.resolve(entrez, "TP53", "S1").unwrap();
        assert_matches!(
            resolution,
            Resolution::Skipped(SkipReason::InvalidEntrezId { ref value }) if value == entrez
        );
    }
    assert_eq!(*genes.entrez_calls.lock().unwrap(), 0);
    assert_eq!(*genes.symbol_calls.lock().unwrap(), 0);
}

#[test]
fn unknown_entrez_id_never_falls_back_to_symbol() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    let resolution = resolver.resolve("12345", "TP53", "S1").unwrap();

    assert_matches!(
        resolution,
        Resolution::Skipped(SkipReason::EntrezIdNotFound {
            entrez_gene_id: 12345
        })
    );
    assert_eq!(*genes.symbol_calls.lock().unwrap(), 0);
}

#[test]
fn symbol_is_used_when_entrez_is_absent() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    let resolution = resolver.resolve("", "KRAS", "S1").unwrap();

    assert_matches!(
        resolution,
        Resolution::Resolved { gene, .. } if gene.entrez_gene_id == 3845
    );
}

#[test]
fn missing_sample_is_named_in_the_warning() {
    let genes = MockGenes::default();
    let resolver = ReferenceResolver::new(&genes, &MockSamples, 1);

    let resolution = resolver.resolve("7157", "", "S404").unwrap();

    let Resolution::Skipped(reason) = resolution else {
        panic!("expected a skip");
    };
    assert!(reason.to_string().contains("'S404'"));
}

#[test]
fn lookup_failures_propagate() {
    let resolver = ReferenceResolver::new(&BrokenGenes, &MockSamples, 1);
    let err = resolver.resolve("7157", "", "S1").unwrap_err();
    assert_matches!(err, KiraError::Database(_));
}
