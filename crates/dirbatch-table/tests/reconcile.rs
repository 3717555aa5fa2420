use std::collections::BTreeSet;
use std::path::Path;

use dirbatch_parser::Value;
use dirbatch_status::{StatusChain, StatusValue};
use dirbatch_table::{
    MatchStatus, Reconciler, Reconciliation, RecordSource, RecordStore, TableMap,
    ORPHAN_DIRECTORIES, ORPHAN_TABLE_ROWS,
};
use dirbatch_test_utils::{depth_parser, period_parser, standard_levels, DirFixture, TWO_RUNS};
use dirbatch_tree::{DirectoryMap, DirectoryTree, NodeSource, TreeOptions};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

struct Run {
    tree: DirectoryTree,
    store: RecordStore,
    chain: StatusChain,
}

fn standard_maps() -> Vec<DirectoryMap> {
    standard_levels()
        .into_iter()
        .map(|(name, parser)| DirectoryMap::new(name, parser))
        .collect()
}

fn open(root: &DirFixture, maps: Vec<DirectoryMap>) -> Run {
    let mut chain = StatusChain::new();
    let mut tree = DirectoryTree::build(root.root(), maps, TreeOptions::new(), &mut chain).unwrap();
    tree.check_depth(&chain).unwrap();
    tree.flatten_virtual_leaves(&chain).unwrap();
    let store = RecordStore::from_tree(&mut tree).unwrap();
    Run { tree, store, chain }
}

fn reconcile(run: &mut Run, reconciler: &Reconciler, table: &Path) -> Reconciliation {
    reconciler
        .reconcile_file(table, &mut run.tree, &mut run.store, &mut run.chain)
        .unwrap()
}

#[test]
fn two_runs_match_one_row() {
    let root = DirFixture::with_dirs(&TWO_RUNS);
    let aux = DirFixture::new();
    let table = aux.write_csv("t.csv", &["period", "depth", "cd"], &[&["100", "5", "0.320"]]);

    let mut run = open(&root, standard_maps());
    assert_eq!(run.store.len(), 1);
    let outcome = reconcile(&mut run, &Reconciler::default(), &table);

    assert_eq!(outcome.matched.len(), 1);
    assert!(outcome.directory_only.is_empty());
    assert!(outcome.table_only.is_empty());

    let record = run.store.get(outcome.matched[0]).unwrap();
    assert_eq!(record.status, StatusValue::of(MatchStatus::Matched));
    assert_eq!(record.get("jobid"), Some(&Value::from("jobB")));

    let leaf = run.tree.get(record.node.unwrap()).unwrap();
    let runs: Vec<&str> = leaf
        .runs()
        .iter()
        .map(|id| run.tree.get(*id).unwrap().name())
        .collect();
    assert_eq!(runs, vec!["cd_0320_jobA", "cd_0320_jobB"]);
}

#[test]
fn partitions_and_synthesizes_table_only_rows() {
    let root = DirFixture::with_dirs(&["period_100/depth_5/cd_0320", "period_100/depth_6/cd_0150"]);
    let aux = DirFixture::new();
    let table = aux.write_csv(
        "t.csv",
        &["T", "depth", "cd", "h"],
        &[&["100", "5", "0.32", "1.5"], &["200", "5", "0.5", "2.0"]],
    );
    let reconciler = Reconciler::new(vec![TableMap::new("period", "T")]);

    let mut run = open(&root, standard_maps());
    let nodes_before = run.tree.len();
    let outcome = reconcile(&mut run, &reconciler, &table);

    assert_eq!(outcome.matched.len(), 1);
    assert_eq!(outcome.directory_only.len(), 1);
    assert_eq!(outcome.table_only.len(), 1);
    assert_eq!(outcome.created, 1);
    assert_eq!(run.store.len(), 3);

    let matched = run.store.get(outcome.matched[0]).unwrap();
    assert_eq!(matched.get("h"), Some(&Value::Float(1.5)));

    let orphan = run.store.get(outcome.directory_only[0]).unwrap();
    assert!(!orphan.valid);
    assert_eq!(orphan.status, StatusValue::of(MatchStatus::DirectoryOnly));

    let synthesized = run.store.get(outcome.table_only[0]).unwrap();
    assert_eq!(synthesized.source, RecordSource::Synthesized);
    assert_eq!(synthesized.path, None);
    let leaf = run.tree.get(synthesized.node.unwrap()).unwrap();
    assert_eq!(leaf.name(), "cd_0500");
    assert_eq!(leaf.source(), NodeSource::Synthesized);
    assert_eq!(run.tree.node_for_record(synthesized.id), synthesized.node);
    assert_eq!(run.tree.len(), nodes_before + 3);

    let periods: Vec<i64> = run
        .store
        .iter()
        .filter_map(|r| r.get("period").and_then(Value::as_i64))
        .collect();
    assert_eq!(periods, vec![100, 100, 200]);
}

#[test]
fn second_reconciliation_creates_nothing() {
    let root = DirFixture::with_dirs(&["period_100/depth_5/cd_0320"]);
    let aux = DirFixture::new();
    let table = aux.write_csv(
        "t.csv",
        &["period", "depth", "cd"],
        &[&["100", "5", "0.32"], &["300", "1", "0.1"]],
    );

    let mut run = open(&root, standard_maps());
    let first = reconcile(&mut run, &Reconciler::default(), &table);
    let ids: BTreeSet<u64> = run.store.iter().map(|r| r.id).collect();
    let nodes = run.tree.len();

    let second = reconcile(&mut run, &Reconciler::default(), &table);
    assert_eq!(second.created, 0);
    assert_eq!(second.table_only, first.table_only);
    assert_eq!(second.matched, first.matched);
    assert_eq!(run.tree.len(), nodes);
    let again: BTreeSet<u64> = run.store.iter().map(|r| r.id).collect();
    assert_eq!(again, ids);
    assert_eq!(run.store.next_id(), 2);
}

#[test]
fn float_keys_compare_at_declared_digits() {
    let root = DirFixture::with_dirs(&["period_100/depth_5/cd_0320"]);
    let aux = DirFixture::new();
    let close = aux.write_csv(
        "close.csv",
        &["period", "depth", "cd"],
        &[&["100", "5", "0.32000001"]],
    );
    let apart = aux.write_csv("apart.csv", &["period", "depth", "cd"], &[&["100", "5", "0.321"]]);

    let mut run = open(&root, standard_maps());
    assert_eq!(reconcile(&mut run, &Reconciler::default(), &close).matched.len(), 1);

    let mut run = open(&root, standard_maps());
    let outcome = reconcile(&mut run, &Reconciler::default(), &apart);
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.table_only.len(), 1);
}

#[test]
fn orphan_listings_are_written() {
    let root = DirFixture::with_dirs(&["period_100/depth_5/cd_0320", "period_100/depth_5/cd_0330"]);
    let aux = DirFixture::new();
    let table = aux.write_csv(
        "t.csv",
        &["period", "depth", "cd"],
        &[&["100", "5", "0.33"], &["1", "1", "0.1"]],
    );
    let logs = aux.mkdir("logs");

    let mut run = open(&root, standard_maps());
    reconcile(&mut run, &Reconciler::default().with_logs_dir(logs.clone()), &table);

    let directories = std::fs::read_to_string(logs.join(ORPHAN_DIRECTORIES)).unwrap();
    assert_eq!(directories.lines().count(), 2);
    assert!(directories.contains("[4] Not matched to table row"));
    let rows = std::fs::read_to_string(logs.join(ORPHAN_TABLE_ROWS)).unwrap();
    assert_eq!(rows.lines().count(), 2);
    assert!(rows.contains("synthesized"));
}

#[test]
fn unknown_table_map_is_rejected() {
    let root = DirFixture::with_dirs(&["period_100/depth_5/cd_0320"]);
    let aux = DirFixture::new();
    let table = aux.write_csv("t.csv", &["period", "depth", "cd"], &[&["100", "5", "0.32"]]);

    let mut run = open(&root, standard_maps());
    let err = Reconciler::new(vec![TableMap::new("pressure", "p")])
        .reconcile_file(&table, &mut run.tree, &mut run.store, &mut run.chain)
        .unwrap_err();
    assert!(err.is_config_error());
}

fn two_level_maps() -> Vec<DirectoryMap> {
    vec![
        DirectoryMap::new("period", period_parser()),
        DirectoryMap::new("depth", depth_parser()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_partitions_cover_the_union(
        dirs in prop::collection::btree_set((0_i64..4, 0_i64..3), 1..8),
        rows in prop::collection::btree_set((0_i64..4, 0_i64..3), 1..8),
    ) {
        let paths: Vec<String> = dirs
            .iter()
            .map(|(p, d)| format!("period_{p}/depth_{d}"))
            .collect();
        let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let root = DirFixture::with_dirs(&path_refs);
        let aux = DirFixture::new();
        let mut csv = String::from("period,depth\n");
        for (p, d) in &rows {
            csv.push_str(&format!("{p},{d}\n"));
        }
        let table = aux.write_file("t.csv", &csv);

        let mut run = open(&root, two_level_maps());
        let outcome = reconcile(&mut run, &Reconciler::default(), &table);

        let both = dirs.intersection(&rows).count();
        prop_assert_eq!(outcome.matched.len(), both);
        prop_assert_eq!(outcome.directory_only.len(), dirs.len() - both);
        prop_assert_eq!(outcome.table_only.len(), rows.len() - both);
        prop_assert_eq!(outcome.total(), dirs.union(&rows).count());

        let mut seen = BTreeSet::new();
        for id in outcome.matched.iter().chain(&outcome.directory_only).chain(&outcome.table_only) {
            prop_assert!(seen.insert(*id));
        }
    }
}
