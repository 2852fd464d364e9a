//! Artifact publication integration tests.
//!
//! Publication must succeed when artifacts are missing (diagnostics-only
//! runs) and only fail on real filesystem problems.

mod support;

use tempfile::TempDir;
use xcarchiver::archiver::{Archive, ExportError, ExportOpts};

use support::{test_archiver, CountingCodesign, ScriptedExecutor};

fn opts(output_dir: std::path::PathBuf) -> ExportOpts {
    ExportOpts {
        output_dir,
        artifact_name: "App".to_string(),
        export_all_dsyms: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn exporting_an_empty_result_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());
    let output_dir = tmp.path().join("deploy");

    archiver
        .export_output(opts(output_dir.clone()))
        .await
        .expect("empty export succeeds");

    assert!(output_dir.is_dir());
    assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn present_logs_are_published() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let archive_log = tmp.path().join("xcodebuild-archive.log");
    std::fs::write(&archive_log, "** ARCHIVE FAILED **").unwrap();

    let output_dir = tmp.path().join("deploy");
    let mut export_opts = opts(output_dir.clone());
    export_opts.archive_log = Some(archive_log);

    archiver.export_output(export_opts).await.expect("export succeeds");

    let published = output_dir.join("xcodebuild-archive.log");
    assert_eq!(
        std::fs::read_to_string(published).unwrap(),
        "** ARCHIVE FAILED **"
    );
}

#[tokio::test]
async fn scraped_but_missing_ide_logs_dir_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let output_dir = tmp.path().join("deploy");
    let mut export_opts = opts(output_dir.clone());
    export_opts.ide_distribution_logs_dir =
        Some(std::path::PathBuf::from("/var/folders/gone/IDEDistributionLogs"));

    archiver.export_output(export_opts).await.expect("export succeeds");
    assert!(!output_dir.join("ide-distribution-logs").exists());
}

#[tokio::test]
async fn archive_packages_and_dsyms_are_published() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    // Fake archive bundle with one dSYM
    let archive_path = tmp.path().join("App.xcarchive");
    std::fs::create_dir_all(archive_path.join("Products")).unwrap();
    let dsym = archive_path.join("dSYMs").join("App.app.dSYM").join("Contents");
    std::fs::create_dir_all(&dsym).unwrap();
    std::fs::write(dsym.join("Info.plist"), "<plist/>").unwrap();

    // Fake export directory with the distributable package
    let export_dir = tmp.path().join("export");
    std::fs::create_dir_all(&export_dir).unwrap();
    std::fs::write(export_dir.join("App.ipa"), "ipa payload").unwrap();

    let output_dir = tmp.path().join("deploy");
    let mut export_opts = opts(output_dir.clone());
    export_opts.archive = Some(Archive {
        path: archive_path,
    });
    export_opts.app_export_dir = Some(export_dir);

    archiver.export_output(export_opts).await.expect("export succeeds");

    assert!(output_dir.join("App.xcarchive/Products").is_dir());
    assert!(output_dir.join("App.app.dSYM/Contents/Info.plist").is_file());
    assert!(output_dir.join("App.ipa").is_file());
}

#[tokio::test]
async fn dsyms_are_left_behind_when_not_requested() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    let archive_path = tmp.path().join("App.xcarchive");
    let dsym = archive_path.join("dSYMs").join("App.app.dSYM");
    std::fs::create_dir_all(&dsym).unwrap();

    let output_dir = tmp.path().join("deploy");
    let mut export_opts = opts(output_dir.clone());
    export_opts.export_all_dsyms = false;
    export_opts.archive = Some(Archive {
        path: archive_path,
    });

    archiver.export_output(export_opts).await.expect("export succeeds");

    assert!(output_dir.join("App.xcarchive").is_dir());
    assert!(!output_dir.join("App.app.dSYM").exists());
}

#[tokio::test]
async fn unwritable_output_location_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let archiver = test_archiver(ScriptedExecutor::default(), CountingCodesign::new());

    // A file occupies the output path, so the directory cannot be created
    let output_dir = tmp.path().join("deploy");
    std::fs::write(&output_dir, "not a directory").unwrap();

    let err = archiver
        .export_output(opts(output_dir))
        .await
        .expect_err("export must fail");
    assert!(matches!(err, ExportError::OutputDir { .. }));
}
