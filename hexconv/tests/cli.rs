//! Pruebas de extremo a extremo de los convertidores.

use std::{
    ffi::OsStr,
    fs,
    process::{Command, Output},
};

fn run<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Output {
    Command::new(program)
        .args(args)
        .output()
        .expect("failed to execute converter")
}

#[test]
fn hexbytes2bin_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("table.txt");
    let output = dir.path().join("table.bin");

    fs::write(&input, "# header\n01 02\n\nff\n").unwrap();

    let result = run(env!("CARGO_BIN_EXE_hexbytes2bin"), &[&input, &output]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(fs::read(&output).unwrap(), [0x01, 0x02, 0xff]);
}

#[test]
fn hexbytes2bin_bad_line_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("table.txt");
    let output = dir.path().join("table.bin");

    // Las primeras líneas son válidas
    fs::write(&input, "01 02\n03 04\nzz\n").unwrap();

    let result = run(env!("CARGO_BIN_EXE_hexbytes2bin"), &[&input, &output]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("line 3"));
    assert!(!output.exists());
}

#[test]
fn hex2other_bad_input_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("table.txt");
    let output = dir.path().join("table.hex");

    fs::write(&input, "01 02\n0\n").unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_hex2other"))
        .args(["-f", "intelhex", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to execute converter");

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn hex2other_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("table.txt");
    let output = dir.path().join("table.hex");

    fs::write(&input, "0a 0b\n0c\n").unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_hex2other"))
        .args(["-f", "hex", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .expect("failed to execute converter");

    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(fs::read_to_string(&output).unwrap(), "0A0B0C");
}
