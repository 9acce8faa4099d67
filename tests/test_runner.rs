use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

include!(concat!(env!("OUT_DIR"), "/test_files.rs"));

// These functions are used by the included tests above.
// See `build.rs` for the code that generates the tests.
//
// Each .lox file declares its expectations in comments:
//   // expect: LINE        -- one line of stdout
//   // expect-err: LINE    -- one line of stderr
//   // exit: N             -- expected exit code (default 0)

fn do_test(filename: &Path) {
    let expected_out = find_expects(filename, "expect: ").join("\n");
    let expected_err = find_expects(filename, "expect-err: ").join("\n");
    let expected_exit: i32 = find_expects(filename, "exit: ")
        .first()
        .map(|s| s.trim().parse().expect("exit expectation must be a number"))
        .unwrap_or(0);

    let output = run_file(filename);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stdout = stdout.trim_end();

    let stderr = String::from_utf8(output.stderr).unwrap();
    let stderr = stderr.trim_end();

    assert_eq!(stdout, expected_out, "generated output != expected output");
    assert_eq!(stderr, expected_err, "generated error != expected error");
    assert_eq!(
        output.status.code(),
        Some(expected_exit),
        "generated exit code != expected exit code"
    );
}

fn run_file(filename: &Path) -> Output {
    let mut cmd = Command::cargo_bin("loxwalk").unwrap();
    cmd.arg(filename).output().unwrap()
}

fn find_expects(filename: &Path, prefix: &str) -> Vec<String> {
    let content = std::fs::read_to_string(filename)
        .unwrap_or_else(|_| panic!("failed to read {}", filename.display()));

    let comment = "// ";
    let pattern = format!("{}{}", comment, prefix);

    let mut result = vec![];
    for line in content.lines() {
        let indices: Vec<_> = line.match_indices(&pattern).collect();
        if indices.is_empty() {
            continue;
        }

        let (idx, _) = indices.last().unwrap();
        let target = &line[idx + pattern.len()..];
        result.push(target.into());
    }

    result
}
