use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn run_bin(args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_summit-stats"));

    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn run_bin_ok(args: &[&str]) -> String {
    let output = run_bin(args);

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );

    stdout_str.to_string()
}

fn fresh_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    test_dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("failed to convert path to string")
}

#[test]
fn basic_workflow() {
    let test_dir = fresh_dir("basic_workflow");
    let out_dir = test_dir.join("output");
    let out_dir_str = path_str(&out_dir);

    let table = run_bin_ok(&["--out-dir", out_dir_str, "table"]);
    assert_eq!(table.lines().count(), 22);
    assert!(table.contains("Bear Peak"));
    assert!(table.contains("Mt Blue Sky"));

    run_bin_ok(&["--out-dir", out_dir_str, "analyze"]);
    let results = fs::read_to_string(out_dir.join("results.json"))
        .expect("failed to read results file");
    let results: serde_json::Value =
        serde_json::from_str(&results).expect("failed to parse results file");

    assert_eq!(results["records"].as_array().map(Vec::len), Some(21));
    assert_eq!(results["trend"]["t_min"], "2024-05-26");
    let r = results["trend"]["fit"]["r"].as_f64().expect("missing r");
    assert!(r > 0.0);
    let counts = results["distribution"]["histogram"]["counts"]
        .as_array()
        .expect("missing counts");
    assert_eq!(counts.len(), 21);

    run_bin_ok(&["--out-dir", out_dir_str, "plot"]);
    let trend_svg = fs::read_to_string(out_dir.join("elevation_vs_time.svg"))
        .expect("failed to read trend chart");
    assert!(trend_svg.contains("Elevation v. Time"));
    assert!(trend_svg.contains("Line of Best Fit"));
    assert!(trend_svg.contains("R-value: 0.793"));

    let hist_svg = fs::read_to_string(out_dir.join("summit_histogram.svg"))
        .expect("failed to read histogram chart");
    assert!(hist_svg.contains("Summit Histogram"));
    assert!(hist_svg.contains("Normal Curve"));

    run_bin_ok(&["--out-dir", out_dir_str, "clean"]);
    assert!(!out_dir.join("results.json").exists());
    assert!(!out_dir.join("elevation_vs_time.svg").exists());
    assert!(!out_dir.join("summit_histogram.svg").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn clean_leaves_other_files_alone() {
    let test_dir = fresh_dir("clean_leaves_other_files_alone");

    // A glob metacharacter in the output directory must not widen what
    // `clean` matches.
    let archive_dir = test_dir.join("archive");
    let out_dir = test_dir.join("a*");
    fs::create_dir_all(&archive_dir).expect("failed to create archive directory");
    fs::create_dir_all(&out_dir).expect("failed to create output directory");

    let keep_file = archive_dir.join("keep.svg");
    let user_file = out_dir.join("user_diagram.svg");
    fs::write(&keep_file, "<svg/>").expect("failed to write archive file");
    fs::write(&user_file, "<svg/>").expect("failed to write user file");

    let out_dir_str = path_str(&out_dir);
    run_bin_ok(&["--out-dir", out_dir_str, "plot"]);
    assert!(out_dir.join("summit_histogram.svg").exists());

    run_bin_ok(&["--out-dir", out_dir_str, "clean"]);
    assert!(!out_dir.join("results.json").exists());
    assert!(!out_dir.join("elevation_vs_time.svg").exists());
    assert!(!out_dir.join("summit_histogram.svg").exists());
    assert!(keep_file.exists());
    assert!(user_file.exists());

    // Cleaning an already clean directory is not an error.
    run_bin_ok(&["--out-dir", out_dir_str, "clean"]);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn config_file_changes_binning() {
    let test_dir = fresh_dir("config_file_changes_binning");
    let out_dir = test_dir.join("output");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[figure]\n"
        + "width_in = 8.0\n"
        + "height_in = 6.0\n"
        + "\n"
        + "[histogram]\n"
        + "n_bins = 7\n"
        + "curve_points = 50\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    run_bin_ok(&[
        "--out-dir",
        path_str(&out_dir),
        "--config",
        path_str(&config_path),
        "plot",
    ]);

    let results = fs::read_to_string(out_dir.join("results.json"))
        .expect("failed to read results file");
    let results: serde_json::Value =
        serde_json::from_str(&results).expect("failed to parse results file");
    let dist = &results["distribution"];
    assert_eq!(dist["histogram"]["counts"].as_array().map(Vec::len), Some(7));
    assert_eq!(dist["normal_curve"].as_array().map(Vec::len), Some(50));

    let trend_svg = fs::read_to_string(out_dir.join("elevation_vs_time.svg"))
        .expect("failed to read trend chart");
    assert!(trend_svg.contains("width=\"800\""));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let test_dir = fresh_dir("invalid_config_fails");
    let config_path = test_dir.join("config.toml");
    fs::write(&config_path, "[histogram]\nn_bins = 0\n").expect("failed to write config file");

    let output = run_bin(&[
        "--out-dir",
        path_str(&test_dir.join("output")),
        "--config",
        path_str(&config_path),
        "analyze",
    ]);
    assert!(!output.status.success());
    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains("invalid number of bins"));

    fs::remove_dir_all(&test_dir).ok();
}
