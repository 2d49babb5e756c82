use std::fs::File;
use std::io::Write;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use kira_sc_expression::app::{App, ImportOptions};
use kira_sc_expression::config::ResolvedConfig;
use kira_sc_expression::domain::{GeneticProfileId, ImportSpecifier};
use kira_sc_expression::error::KiraError;
use kira_sc_expression::output::JsonOutput;
use kira_sc_expression::store::Store;

const HEADER: &str = "Sample_Id\tEntrez_Gene_Id\tHugo_Symbol\tCell_Type\tTissue\tExpression_Value\n";

fn profile_id() -> GeneticProfileId {
    GeneticProfileId::new(4)
}

fn seeded_store(temp: &TempDir) -> Store {
    let path = Utf8PathBuf::from_path_buf(temp.path().join("db").join("portal.sqlite")).unwrap();
    let store = Store::open(&path).unwrap();
    store.init_schema().unwrap();
    store
        .connection()
        .execute_batch(
            "INSERT INTO cancer_study VALUES (1, 'brca_tcga');
             INSERT INTO cancer_study VALUES (2, 'luad_tcga');
             INSERT INTO gene VALUES (7157, 'TP53');
             INSERT INTO gene VALUES (3845, 'KRAS');
             INSERT INTO gene VALUES (4893, 'NRAS');
             INSERT INTO gene_alias VALUES (3845, 'RASK2');
             INSERT INTO gene_alias VALUES (3845, 'SHARED');
             INSERT INTO gene_alias VALUES (4893, 'SHARED');
             INSERT INTO sample VALUES (10, 'S1', 1);
             INSERT INTO sample VALUES (11, 'S2', 1);
             INSERT INTO sample VALUES (20, 'S3', 2);
             INSERT INTO genetic_profile VALUES (4, 'brca_tcga_sc_expression', 1);",
        )
        .unwrap();
    store
}

fn write_input(temp: &TempDir, name: &str, body: &str) -> ImportSpecifier {
    let path = Utf8PathBuf::from_path_buf(temp.path().join(name)).unwrap();
    std::fs::write(path.as_std_path(), format!("{HEADER}{body}")).unwrap();
    ImportSpecifier {
        profile_id: profile_id(),
        file: path,
    }
}

#[test]
fn rows_are_written_with_their_references() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let spec = write_input(
        &temp,
        "sc.txt",
        "S1\t7157\tTP53\tTcell\tBlood\t4.2\n\
         S2\t0\tRASK2\tBcell\tMarrow\t0.5\n\
         S3\t7157\tTP53\tTcell\tBlood\t1.1\n\
         S1\t\tSHARED\tTcell\tBlood\t9\n",
    );

    let report = store.import_file(&spec, false, &JsonOutput).unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.skipped_count(), 2);
    let rows = store
        .connection()
        .prepare(
            "SELECT genetic_profile_id, sample_id, tissue, cell_type, entrez_gene_id, expression_value \
             FROM single_cell_expression ORDER BY sample_id",
        )
        .unwrap()
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (4, 10, "Blood".to_string(), "Tcell".to_string(), 7157, "4.2".to_string()),
            (4, 11, "Marrow".to_string(), "Bcell".to_string(), 3845, "0.5".to_string()),
        ]
    );
}

#[test]
fn reimporting_duplicates_rows() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let spec = write_input(&temp, "sc.txt", "S1\t7157\tTP53\tTcell\tBlood\t4.2\n");

    store.import_file(&spec, false, &JsonOutput).unwrap();
    store.import_file(&spec, false, &JsonOutput).unwrap();

    assert_eq!(store.count_records(profile_id()).unwrap(), 2);
}

#[test]
fn write_failure_rolls_back_the_whole_file() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON single_cell_expression
             WHEN NEW.expression_value = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
    let spec = write_input(
        &temp,
        "sc.txt",
        "S1\t7157\tTP53\tTcell\tBlood\t4.2\nS2\t7157\tTP53\tTcell\tBlood\tboom\n",
    );

    let err = store.import_file(&spec, false, &JsonOutput).unwrap_err();

    assert_matches!(err, KiraError::Database(_));
    assert_eq!(store.count_records(profile_id()).unwrap(), 0);
}

#[test]
fn nothing_imported_commits_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let spec = write_input(&temp, "sc.txt", "S404\t7157\tTP53\tTcell\tBlood\t4.2\n");

    let err = store.import_file(&spec, false, &JsonOutput).unwrap_err();

    assert_matches!(err, KiraError::NothingImported { lines: 1, skipped: 1 });
    assert_eq!(store.count_records(profile_id()).unwrap(), 0);
}

#[test]
fn dry_run_resolves_but_writes_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let spec = write_input(&temp, "sc.txt", "S1\t7157\tTP53\tTcell\tBlood\t4.2\n");

    let report = store.import_file(&spec, true, &JsonOutput).unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(store.count_records(profile_id()).unwrap(), 0);
}

#[test]
fn unknown_profile_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let mut spec = write_input(&temp, "sc.txt", "S1\t7157\tTP53\tTcell\tBlood\t4.2\n");
    spec.profile_id = GeneticProfileId::new(77);

    let err = store.import_file(&spec, false, &JsonOutput).unwrap_err();

    assert_matches!(err, KiraError::ProfileNotFound(77));
}

#[test]
fn gzip_input_is_imported() {
    let temp = tempfile::tempdir().unwrap();
    let mut store = seeded_store(&temp);
    let path = Utf8PathBuf::from_path_buf(temp.path().join("sc.txt.gz")).unwrap();
    let mut encoder = GzEncoder::new(File::create(path.as_std_path()).unwrap(), Compression::default());
    encoder
        .write_all(format!("{HEADER}S1\t7157\tTP53\tTcell\tBlood\t4.2\n").as_bytes())
        .unwrap();
    encoder.finish().unwrap();
    let spec = ImportSpecifier {
        profile_id: profile_id(),
        file: path,
    };

    let report = store.import_file(&spec, false, &JsonOutput).unwrap();

    assert_eq!(report.accepted, 1);
}

#[test]
fn app_imports_every_configured_file() {
    let temp = tempfile::tempdir().unwrap();
    let store = seeded_store(&temp);
    let first = write_input(&temp, "a.txt", "S1\t7157\tTP53\tTcell\tBlood\t4.2\n");
    let second = write_input(
        &temp,
        "b.txt",
        "S2\t3845\tKRAS\tBcell\tMarrow\t1\nS9\t3845\tKRAS\tBcell\tMarrow\t1\n",
    );
    let config = ResolvedConfig {
        schema_version: 1,
        database: None,
        imports: vec![first, second],
    };
    let mut app = App::new(store);

    let result = app
        .import(None, Some(&config), ImportOptions::default(), &JsonOutput)
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].accepted, 1);
    assert_eq!(result.items[1].accepted, 1);
    assert_eq!(result.items[1].skipped, 1);
    assert_eq!(result.items[1].profile_total, 2);
    assert_eq!(app.store().count_records(profile_id()).unwrap(), 2);
}

#[test]
fn app_needs_something_to_import() {
    let store = Store::open_in_memory().unwrap();
    let mut app = App::new(store);
    let err = app
        .import(None, None, ImportOptions::default(), &JsonOutput)
        .unwrap_err();
    assert_matches!(err, KiraError::NothingToImport);
}
