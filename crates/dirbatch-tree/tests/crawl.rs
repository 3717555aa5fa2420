use dirbatch_parser::Value;
use dirbatch_status::{StatusChain, TreeStatus};
use dirbatch_test_utils::{standard_levels, DirFixture, TWO_RUNS};
use dirbatch_tree::{DirectoryMap, DirectoryTree, NodeKind, TreeError, TreeOptions};
use pretty_assertions::assert_eq;

fn maps() -> Vec<DirectoryMap> {
    standard_levels()
        .into_iter()
        .map(|(name, parser)| DirectoryMap::new(name, parser))
        .collect()
}

fn build(fixture: &DirFixture) -> Result<(DirectoryTree, StatusChain), TreeError> {
    let mut chain = StatusChain::new();
    let tree = DirectoryTree::build(fixture.root(), maps(), TreeOptions::new(), &mut chain)?;
    Ok((tree, chain))
}

#[test]
fn k_levels_yield_k_fields() {
    let fixture = DirFixture::with_dirs(&[
        "period_100/depth_5/cd_0320",
        "period_100/depth_6/cd_0150",
    ]);
    let (mut tree, chain) = build(&fixture).unwrap();
    tree.check_depth(&chain).unwrap();

    let records = tree.leaf_records();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.values.len(), 3);
        assert!(record.status.is_valid());
    }
    assert_eq!(records[0].get("cd"), Some(&Value::Float(0.32)));
    assert_eq!(records[1].get("depth"), Some(&Value::Int(6)));
}

#[test]
fn virtual_runs_add_one_level_and_one_field() {
    let fixture = DirFixture::with_dirs(&TWO_RUNS);
    let (mut tree, chain) = build(&fixture).unwrap();
    assert!(tree.has_virtual());

    let report = tree.check_depth(&chain).unwrap();
    assert_eq!(report.found, 3);
    assert_eq!(report.incomplete, 0);

    let groups = tree.virtual_parents();
    assert_eq!(groups.len(), 1);
    let group = tree.get(groups[0]).unwrap();
    assert_eq!(group.name(), "cd_0320");
    assert_eq!(group.path(), None);
    assert_eq!(group.children().len(), 2);

    tree.flatten_virtual_leaves(&chain).unwrap();
    let records = tree.leaf_records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.values.len(), 4);
    assert_eq!(record.get("jobid"), Some(&Value::from("jobB")));
    assert!(record.path.as_ref().unwrap().ends_with("cd_0320_jobB"));

    let flattened = tree.get(groups[0]).unwrap();
    let runs: Vec<_> = flattened
        .runs()
        .iter()
        .map(|id| tree.get(*id).unwrap().name().to_string())
        .collect();
    assert_eq!(runs, vec!["cd_0320_jobA", "cd_0320_jobB"]);
    assert!(flattened
        .runs()
        .iter()
        .all(|id| tree.get(*id).unwrap().kind() == NodeKind::Run(2)));
}

#[test]
fn mixed_suffix_siblings_are_fatal() {
    let fixture = DirFixture::with_dirs(&[
        "period_100/depth_5/cd_0320_jobA",
        "period_100/depth_5/cd_0150",
    ]);
    let err = build(&fixture).unwrap_err();
    assert!(matches!(
        err,
        TreeError::MixedVirtualSiblings {
            with_suffix: 1,
            without_suffix: 1,
            ..
        }
    ));
}

#[test]
fn shallow_tree_is_flagged_not_fatal() {
    let fixture = DirFixture::with_dirs(&["period_100/depth_5", "period_200"]);
    let (mut tree, chain) = build(&fixture).unwrap();
    let report = tree.check_depth(&chain).unwrap();

    assert_eq!(report.found, 2);
    assert_eq!(report.incomplete, 2);
    assert!(tree.leaf_records().is_empty());
    assert_eq!(
        tree.get(tree.root()).unwrap().status(),
        TreeStatus::Invalid.into()
    );
}

#[test]
fn snapshots_are_written_per_stage() {
    let fixture = DirFixture::with_dirs(&TWO_RUNS);
    let logs = fixture.mkdir("batch_postprocessing/logs");
    let mut chain = StatusChain::new();
    let mut tree = DirectoryTree::build(
        fixture.root(),
        maps(),
        TreeOptions::new()
            .with_reserved("batch_postprocessing")
            .with_snapshot_dir(&logs),
        &mut chain,
    )
    .unwrap();
    tree.check_depth(&chain).unwrap();

    let first = std::fs::read_to_string(logs.join("filter_stage_01_dir_mapping.txt")).unwrap();
    assert!(first.contains("[✓] cd_0320"));
    assert!(first.contains("[✓] cd_0320_jobA"));
    assert!(!first.contains("batch_postprocessing"));
    assert!(logs.join("filter_stage_02_depth_check.txt").exists());
}
