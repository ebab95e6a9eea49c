use std::process::Command;

#[test]
fn test_runtime_main_runs_the_demo_scene() {
    let output = Command::new(env!("CARGO_BIN_EXE_runtime_main"))
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to run runtime_main");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    eprintln!("--- runtime_main STDOUT ---\n{stdout}");
    eprintln!("--- runtime_main STDERR ---\n{stderr}");

    assert!(
        output.status.success(),
        "runtime_main exited with error: {:?}",
        output.status.code()
    );
    assert!(
        stdout.contains("Starting simulation loop"),
        "Expected startup log not found in stdout."
    );
    assert!(
        stdout.contains("Box 3 final position"),
        "Expected final poses in stdout."
    );
}
