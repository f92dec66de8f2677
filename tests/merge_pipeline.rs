//! End-to-end pipeline tests over the fixture sources.
//!
//! Two fixture sources share the raw boat id "17" on purpose: the merged
//! store must keep them apart via the per-source prefix.

use std::fs;
use std::path::PathBuf;

use sailtrack::inventory::SourceInventory;
use sailtrack::pipeline::{run, PipelineError, RunOptions};

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_inventory() -> SourceInventory {
    SourceInventory::from_dirs(&[fixture_dir("vendee"), fixture_dir("biscay")]).unwrap()
}

fn options_into(dir: &tempfile::TempDir) -> RunOptions {
    RunOptions {
        out_dir: dir.path().to_path_buf(),
        ..RunOptions::default()
    }
}

#[test]
fn merges_two_sources_and_writes_all_outputs() {
    let out = tempfile::tempdir().unwrap();
    let summary = run(&fixture_inventory(), &options_into(&out)).unwrap();

    assert_eq!(summary.sources.len(), 2);
    assert_eq!(summary.sources[0].prefix, 'a');
    assert_eq!(summary.sources[1].prefix, 'b');
    assert_eq!(summary.boats_registered, 5);
    assert_eq!(summary.samples_appended, 5);
    assert_eq!(summary.chunk_errors, 1);

    // Only Beta (no track) falls to the default policy.
    assert_eq!(summary.boats_removed, 1);
    assert_eq!(summary.removed_no_track, 1);
    assert_eq!(summary.boats_retained, 4);
    assert!(!summary.empty_selection);

    for output in &summary.outputs {
        assert!(output.exists(), "missing output {}", output.display());
    }

    let tracks = fs::read_to_string(out.path().join("tracks.gpx")).unwrap();
    assert!(tracks.contains("past Alpha"));
    assert!(tracks.contains("past Gamma"));
    assert!(tracks.contains("past Delta"));
    // Echo shares raw id 17 with Alpha and still gets its own track.
    assert!(tracks.contains("past Echo"));
    assert!(!tracks.contains("past Beta"));
}

#[test]
fn marks_come_from_the_last_source() {
    let out = tempfile::tempdir().unwrap();
    run(&fixture_inventory(), &options_into(&out)).unwrap();

    let wpts = fs::read_to_string(out.path().join("wpts.gpx")).unwrap();
    assert!(wpts.contains("<name>START</name>"));
    assert!(wpts.contains("<name>FINISH</name>"));
    // Biscay is merged second, so its leg marks win.
    assert!(wpts.contains(r#"lat="43.35""#));
    assert!(wpts.contains(r#"lat="48.38""#));
    assert!(!wpts.contains(r#"lat="14.61""#));
}

#[test]
fn exclude_dnf_drops_the_trailing_boat() {
    let out = tempfile::tempdir().unwrap();
    let options = RunOptions {
        exclude_dnf: true,
        ..options_into(&out)
    };
    let summary = run(&fixture_inventory(), &options).unwrap();

    // Delta's last report trails the fleet by more than an hour.
    assert_eq!(summary.removed_dnf, 1);
    assert_eq!(summary.removed_no_track, 1);
    assert_eq!(summary.boats_retained, 3);

    let tracks = fs::read_to_string(out.path().join("tracks.gpx")).unwrap();
    assert!(!tracks.contains("past Delta"));
    assert!(tracks.contains("past Alpha"));
}

#[test]
fn class_filter_allows_that_class_from_every_source() {
    let out = tempfile::tempdir().unwrap();
    let options = RunOptions {
        class_filter: Some("IMOCA".to_string()),
        ..options_into(&out)
    };
    let summary = run(&fixture_inventory(), &options).unwrap();

    // Delta (Ultim) is filtered; Beta still falls to the no-track rule;
    // Echo is IMOCA in the second source and survives.
    assert_eq!(summary.boats_retained, 3);
    assert_eq!(summary.removed_by_filter, 1);

    let tracks = fs::read_to_string(out.path().join("tracks.gpx")).unwrap();
    assert!(tracks.contains("past Echo"));
    assert!(!tracks.contains("past Delta"));
}

#[test]
fn ship_filter_restricts_to_one_name() {
    let out = tempfile::tempdir().unwrap();
    let options = RunOptions {
        name_filter: Some("Alpha".to_string()),
        ..options_into(&out)
    };
    let summary = run(&fixture_inventory(), &options).unwrap();

    assert_eq!(summary.boats_retained, 1);

    let wpts = fs::read_to_string(out.path().join("wpts.gpx")).unwrap();
    assert!(wpts.contains("<name>Alpha</name>"));
    assert!(!wpts.contains("<name>Echo</name>"));
}

#[test]
fn over_strict_filter_yields_empty_but_valid_outputs() {
    let out = tempfile::tempdir().unwrap();
    let options = RunOptions {
        name_filter: Some("Nonexistent".to_string()),
        ..options_into(&out)
    };
    let summary = run(&fixture_inventory(), &options).unwrap();

    assert!(summary.empty_selection);
    assert_eq!(summary.boats_retained, 0);

    // Outputs still render: marks-only waypoints, housekeeping-only routes.
    let wpts = fs::read_to_string(out.path().join("wpts.gpx")).unwrap();
    assert_eq!(wpts.matches("<wpt").count(), 2);
    let routes = fs::read_to_string(out.path().join("qtvlm_all_routes.xml")).unwrap();
    assert_eq!(routes.matches("<run>").count(), 1);
}

#[test]
fn qtvlm_routes_start_from_last_positions() {
    let out = tempfile::tempdir().unwrap();
    run(&fixture_inventory(), &options_into(&out)).unwrap();

    let routes = fs::read_to_string(out.path().join("qtvlm_all_routes.xml")).unwrap();
    assert!(routes.contains("<routingName>Alpha</routingName>"));
    // Alpha's last sample is 2023-11-14 22:23:20 UTC.
    assert!(routes.contains("<startDate>11/14/2023</startDate>"));
    assert!(routes.contains("<startTime>22:23:20</startTime>"));
    assert!(routes.contains("<endPoint>FINISH</endPoint>"));
}

#[test]
fn manifest_run_matches_positional_run() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("sources.toml");
    fs::write(
        &manifest,
        format!(
            r#"
            [[source]]
            name = "vendee"
            config = "{vendee}/config.xml"
            tracks = "{vendee}/tracks.json"

            [[source]]
            name = "biscay"
            config = "{biscay}/config.xml"
            tracks = "{biscay}/tracks.json"
            "#,
            vendee = fixture_dir("vendee").display(),
            biscay = fixture_dir("biscay").display(),
        ),
    )
    .unwrap();

    let inventory = SourceInventory::load(&manifest).unwrap();
    let out = tempfile::tempdir().unwrap();
    let summary = run(&inventory, &options_into(&out)).unwrap();

    assert_eq!(summary.sources[0].name, "vendee");
    assert_eq!(summary.boats_registered, 5);
    assert_eq!(summary.boats_retained, 4);
}

#[test]
fn malformed_config_aborts_the_run() {
    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("config.xml"), "<config><boats></config>").unwrap();
    fs::write(source.path().join("tracks.json"), r#"{ "tracks": [] }"#).unwrap();

    let inventory = SourceInventory::from_dirs(&[source.path().to_path_buf()]).unwrap();
    let out = tempfile::tempdir().unwrap();
    let error = run(&inventory, &options_into(&out)).unwrap_err();

    assert!(matches!(error, PipelineError::SourceConfig { .. }));
    assert_eq!(error.exit_code(), 3);
    // Nothing was written.
    assert!(!out.path().join("tracks.gpx").exists());
}

#[test]
fn missing_tracks_file_aborts_the_run() {
    let source = tempfile::tempdir().unwrap();
    fs::copy(
        fixture_dir("vendee").join("config.xml"),
        source.path().join("config.xml"),
    )
    .unwrap();

    let inventory = SourceInventory::from_dirs(&[source.path().to_path_buf()]).unwrap();
    let out = tempfile::tempdir().unwrap();
    let error = run(&inventory, &options_into(&out)).unwrap_err();

    assert!(matches!(error, PipelineError::SourceFeed { .. }));
    assert_eq!(error.exit_code(), 4);
}
