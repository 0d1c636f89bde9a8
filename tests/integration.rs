use std::{env, fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "seed = 1234\n"
        + "\n"
        + "[network]\n"
        + "n = 300\n"
        + "kmean = 5.0\n"
        + "\n"
        + "[sir]\n"
        + "p_infect = 0.3\n"
        + "p_recover = 0.1\n"
        + "p_infected = 0.05\n"
        + "force_seed = true\n"
        + "max_time = 50.0\n"
        + "\n"
        + "[mean_field]\n"
        + "t_max = 150.0\n"
        + "dt = 1.0\n"
        + "\n"
        + "[outbreak]\n"
        + "t = 0.6\n"
        + "\n"
        + "[percolation]\n"
        + "t = 0.6\n"
        + "\n"
        + "[evolve]\n"
        + "k_max = 20\n"
        + "kernel = \"delta\"\n"
        + "t_max = 5.0\n"
        + "dt = 0.01\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_epinet"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "run"]);
    run_bin(&["--sim-dir", test_dir_str, "run"]);

    run_bin(&["--sim-dir", test_dir_str, "mean-field"]);
    run_bin(&["--sim-dir", test_dir_str, "outbreak"]);
    run_bin(&["--sim-dir", test_dir_str, "percolation"]);
    run_bin(&["--sim-dir", test_dir_str, "evolve"]);

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);

    assert!(test_dir.join("run-0000/results.msgpack").exists());
    assert!(test_dir.join("run-0001/results.msgpack").exists());
    assert!(test_dir.join("mean_field.json").exists());
    assert!(test_dir.join("outbreak.json").exists());
    assert!(test_dir.join("percolation.json").exists());
    assert!(test_dir.join("evolve.json").exists());
    assert!(test_dir.join("summary.json").exists());

    run_bin(&["--sim-dir", test_dir_str, "clean"]);

    assert!(!test_dir.join("run-0000").exists());
    assert!(!test_dir.join("summary.json").exists());

    fs::remove_dir_all(&test_dir).ok();
}
