//! Integration test suite for the `clx` CLI
use assert_cmd::Command;

/// Helper function to run the `main` binary with the given arguments and
/// return a [`assert_cmd::assert::Assert`].
fn run_main(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd =
        Command::cargo_bin("clx").expect("Failed to find main binary");
    cmd.args(args);
    cmd.assert()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write as _;

    #[test]
    fn nonexistent_file() {
        let assert = run_main(&["does/not/exist.json"]);
        assert.failure().code(1);
    }

    #[test]
    fn file_tokenized_as_json_lines() {
        let output = run_main(&["--json", "tests/data/simple.json"])
            .success()
            .code(0)
            .get_output()
            .stdout
            .clone();
        let output_str =
            String::from_utf8(output).expect("Invalid UTF-8 output");

        let tokens: Vec<Value> = output_str
            .lines()
            .map(|line| {
                serde_json::from_str(line).expect("each line is a JSON token")
            })
            .collect();
        // The fixture document surfaces 19 tokens once whitespace is gone.
        assert_eq!(tokens.len(), 19);
        assert_eq!(tokens[0]["kind"], "begin-object");
        assert_eq!(tokens[1]["kind"], "string");
        assert_eq!(tokens[1]["value"], "\"name\"");
        assert_eq!(tokens[18]["kind"], "end-object");

        // Concatenated values minus ignored whitespace.
        let rebuilt: String = tokens
            .iter()
            .map(|t| t["value"].as_str().expect("string value"))
            .collect();
        assert_eq!(
            rebuilt,
            r#"{"name":"Ada","age":32,"tags":[true,null,-1.5]}"#
        );
    }

    #[test]
    fn stdin_tokenized() {
        let mut cmd =
            Command::cargo_bin("clx").expect("Failed to find main binary");
        let assert = cmd.write_stdin("[1, 2]").assert().success();
        let output_str =
            String::from_utf8(assert.get_output().stdout.clone())
                .expect("Invalid UTF-8 output");
        let lines: Vec<&str> = output_str.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "begin-array \"[\"");
        assert_eq!(lines[1], "number \"1\"");
        assert_eq!(lines[2], "comma \",\"");
        assert_eq!(lines[3], "number \"2\"");
        assert_eq!(lines[4], "end-array \"]\"");
    }

    #[test]
    fn malformed_input_fails() {
        let mut cmd =
            Command::cargo_bin("clx").expect("Failed to find main binary");
        cmd.write_stdin("{\"a\": @}").assert().failure().code(1);
    }

    #[test]
    fn truncated_input_fails() {
        let mut cmd =
            Command::cargo_bin("clx").expect("Failed to find main binary");
        cmd.write_stdin("\"abc").assert().failure().code(1);
    }

    #[test]
    fn count_without_listing() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{}", r#"{"xs":[1,2,3]}"#).expect("write fixture");
        let path = file.path().to_str().expect("utf-8 temp path");

        let assert =
            run_main(&["--count", "--no-display", path]).success().code(0);
        let output_str =
            String::from_utf8(assert.get_output().stdout.clone())
                .expect("Invalid UTF-8 output");
        assert_eq!(output_str.trim(), "Tokens: 11");
    }

    #[test]
    fn tiny_chunk_size_matches_default() {
        let default_out = run_main(&["--json", "tests/data/simple.json"])
            .success()
            .get_output()
            .stdout
            .clone();
        let tiny_out = run_main(&[
            "--json",
            "--chunk-size",
            "1",
            "tests/data/simple.json",
        ])
        .success()
        .get_output()
        .stdout
        .clone();
        assert_eq!(default_out, tiny_out);
    }
}
