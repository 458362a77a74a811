//! CLI integration tests for variant-schema binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("variant-schema"))
}

// Helper to create a temp definition file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const USER: &str = r#"{
    "name": "User",
    "package": "com.example",
    "variants": ["Create", "Update", "Partial"],
    "fields": [
        { "name": "id", "type": "java.lang.String", "markers": ["creatable", "updatable"] },
        { "name": "name", "type": "java.lang.String", "markers": ["updatable", "nullable"] },
        { "name": "age", "type": "java.lang.Integer", "markers": ["creatable"] }
    ]
}"#;

const BROKEN: &str = r#"{
    "name": "Secret",
    "variants": ["Create", "Partial"],
    "fields": [
        { "name": "token", "type": "java.lang.String", "markers": [
            "creatable",
            { "rule": { "kind": "Partial", "required": "absent" } }
        ] }
    ]
}"#;

mod generate_command {
    use super::*;

    #[test]
    fn kotlin_to_stdout() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args(["generate", defs.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("data class CreateUser("))
            .stdout(predicate::str::contains("data class UpdateUser("))
            .stdout(predicate::str::contains("data class PartialUser("))
            .stdout(predicate::str::contains("constructor(user: User)"));
    }

    #[test]
    fn json_to_output_dir() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);
        let out = dir.path().join("generated");

        cmd()
            .args([
                "generate",
                defs.to_str().unwrap(),
                "--format",
                "json",
                "--out",
                out.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let create = fs::read_to_string(out.join("CreateUser.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&create).unwrap();
        assert_eq!(value["name"], "CreateUser");
        assert_eq!(value["fields"][0]["requiredness"], "required");
        assert!(out.join("UpdateUser.json").exists());
        assert!(out.join("PartialUser.json").exists());
    }

    #[test]
    fn multiple_sources() {
        let dir = TempDir::new().unwrap();
        let user = write_temp_file(&dir, "user.json", USER);
        let note = write_temp_file(
            &dir,
            "note.json",
            r#"{"name": "Note", "variants": ["Partial"], "fields": [{"name": "text", "type": "java.lang.String"}]}"#,
        );
        let out = dir.path().join("out");

        cmd()
            .args([
                "generate",
                user.to_str().unwrap(),
                note.to_str().unwrap(),
                "--out",
                out.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert!(out.join("CreateUser.kt").exists());
        assert!(out.join("PartialNote.kt").exists());
    }

    #[test]
    fn failing_entity_exits_2_but_emits_others() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(
            &dir,
            "batch.json",
            &format!("[{}, {}]", BROKEN, USER),
        );
        let out = dir.path().join("out");

        cmd()
            .args(["generate", defs.to_str().unwrap(), "--out", out.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Secret.token"));

        assert!(out.join("CreateUser.kt").exists());
        assert!(!out.join("CreateSecret.kt").exists());
    }

    #[test]
    fn strict_with_known_type() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(
            &dir,
            "order.json",
            r#"{"name": "Order", "variants": ["Dto"], "fields": [
                {"name": "customer", "type": "java.lang.String", "markers": [
                    {"rule": {"kind": "Dto", "required": "required", "type_name": "CustomerDto"}}
                ]}
            ]}"#,
        );

        cmd()
            .args(["generate", defs.to_str().unwrap(), "--strict"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("CustomerDto"));

        cmd()
            .args([
                "generate",
                defs.to_str().unwrap(),
                "--strict",
                "--known-type",
                "CustomerDto",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("val customer: CustomerDto"));
    }

    #[test]
    fn map_type_override() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(
            &dir,
            "event.json",
            r#"{"name": "Event", "variants": ["Partial"], "fields": [
                {"name": "at", "type": "java.time.Instant"}
            ]}"#,
        );

        cmd()
            .args([
                "generate",
                defs.to_str().unwrap(),
                "--format",
                "json",
                "--map-type",
                "java.time.Instant=kotlinx.datetime.Instant",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("kotlinx.datetime.Instant?"));
    }

    #[test]
    fn invalid_map_type_rejected() {
        cmd()
            .args(["generate", "defs.json", "--map-type", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("FROM=TO"));
    }

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["generate", "/nonexistent/defs.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "bad.json", "{ not json }");

        cmd()
            .args(["generate", defs.to_str().unwrap()])
            .assert()
            .code(2);
    }
}

mod resolve_command {
    use super::*;

    #[test]
    fn basic_resolve() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args([
                "resolve",
                defs.to_str().unwrap(),
                "--entity",
                "User",
                "--kind",
                "Update",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""name":"UpdateUser""#))
            .stdout(predicate::str::contains(r#""toPartial""#))
            .stdout(predicate::str::contains(r#""age""#).not());
    }

    #[test]
    fn resolve_with_pretty() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args([
                "resolve",
                defs.to_str().unwrap(),
                "--entity",
                "User",
                "-k",
                "Partial",
                "--pretty",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn resolve_unknown_entity() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args([
                "resolve",
                defs.to_str().unwrap(),
                "--entity",
                "Account",
                "--kind",
                "Create",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Account"));
    }
}

mod validate_command {
    use super::*;

    fn validate_args<'a>(payload: &'a str, defs: &'a str) -> Vec<&'a str> {
        vec![
            "validate", payload, "--entities", defs, "--entity", "User", "--kind", "Create",
        ]
    }

    #[test]
    fn valid_payload() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);
        let payload = write_temp_file(&dir, "payload.json", r#"{"id": "u1", "age": 30}"#);

        cmd()
            .args(validate_args(payload.to_str().unwrap(), defs.to_str().unwrap()))
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);
        let payload = write_temp_file(&dir, "payload.json", r#"{"name": "Ada"}"#);

        cmd()
            .args(validate_args(payload.to_str().unwrap(), defs.to_str().unwrap()))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"));
    }

    #[test]
    fn json_output() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);
        let payload = write_temp_file(&dir, "payload.json", r#"{"id": 7, "age": 30}"#);

        let mut args = validate_args(payload.to_str().unwrap(), defs.to_str().unwrap());
        args.push("--json");
        cmd()
            .args(args)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains("/id"));
    }

    #[test]
    fn strict_rejects_extra_fields() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);
        let payload = write_temp_file(
            &dir,
            "payload.json",
            r#"{"id": "u1", "age": 30, "nickname": "x"}"#,
        );

        let args = validate_args(payload.to_str().unwrap(), defs.to_str().unwrap());
        cmd().args(&args).assert().success();

        let mut strict = args.clone();
        strict.extend(["--strict", "true"]);
        cmd().args(strict).assert().code(1);
    }

    #[test]
    fn missing_payload_exits_3() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args(validate_args("/nonexistent/payload.json", defs.to_str().unwrap()))
            .assert()
            .code(3);
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_valid_directory() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "user.json", USER);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "secret.json", BROKEN);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E003"));
    }

    #[test]
    fn lint_json_format() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "bad.json", "{ not json }");

        let output = cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["files_checked"], 1);
        assert_eq!(result["results"][0]["diagnostics"][0]["code"], "E001");
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "empty.json", r#"{"name": "User", "variants": []}"#);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1);
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/defs"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod verbose_flag {
    use super::*;

    #[test]
    fn verbose_logs_to_stderr() {
        let dir = TempDir::new().unwrap();
        let defs = write_temp_file(&dir, "user.json", USER);

        cmd()
            .args(["-v", "generate", defs.to_str().unwrap()])
            .assert()
            .success()
            .stderr(predicate::str::contains("built variant"));
    }
}
