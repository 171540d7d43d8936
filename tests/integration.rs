use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;
use std::process::Command;
use tempfile::{Builder, TempDir};

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_rpgledoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn stdout_json(assert: assert_cmd::assert::Assert) -> Value {
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&output).unwrap()
}

fn find<'a>(entries: &'a Value, name: &str) -> &'a Value {
    entries
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == name)
        .unwrap_or_else(|| panic!("no entry named {name}"))
}

// -- stdin mode --

#[test]
fn stdin_mode_scans_procedures() {
    let input = std::fs::read_to_string(fixture_path("calc.rpgle")).unwrap();
    let json = stdout_json(cmd().args(["--name", "calc"]).write_stdin(input).assert().success());

    assert_eq!(json["name"], "calc");
    let entries = &json["entries"];
    assert_eq!(entries.as_array().unwrap().len(), 4);

    let add = find(entries, "add");
    assert_eq!(add["line"], 4);
    assert_eq!(add["kind"], "procedure");
    assert_eq!(add["exported"], true);
    assert_eq!(add["reference"], "add");
    assert_eq!(add["short_desc"], "Add two numbers.");
    assert_eq!(
        add["long_desc"],
        "Returns the sum of {@code a} and {@code b}. See {@link sub} for the inverse."
    );
    assert_eq!(add["params"][0]["name"], "a");
    assert_eq!(add["params"][0]["type"], "int(10) const");
    assert_eq!(add["params"][0]["line"], 21);
    assert_eq!(add["params"][1]["desc"], "second operand, may be negative");
    assert_eq!(add["params"][1]["line"], 22);
    assert_eq!(add["return"]["type"], "int(10)");
    assert_eq!(add["return"]["desc"], "the sum");
    assert_eq!(add["examples"][0]["title"], "Simple addition");
    assert_eq!(add["examples"][0]["lines"][0], "   result = add(1 : 2);");
    assert_eq!(add["examples"][0]["lines"][1], "     // nested indent");
    assert_eq!(add["see"][0], "sub");

    let sub = find(entries, "sub");
    assert_eq!(sub["deprecated"]["deprecated"], true);
    assert_eq!(sub["deprecated"]["desc"], "use {@link add} with a negative operand");
    assert_eq!(sub["params"][1]["line"], 38);

    let tmp = find(entries, "tmp");
    assert_eq!(tmp["kind"], "standalone");
    assert_eq!(tmp["scope"]["procedure"], "sub");
    assert_eq!(tmp["reference"], "calc:sub:tmp");

    let helper = find(entries, "helper");
    assert_eq!(helper["exported"], false);
    assert_eq!(helper["reference"], "calc:helper");
    assert!(helper["return"]["type"].is_null());
}

#[test]
fn stdin_mode_default_name() {
    let input = "/**\n * Counter.\n */\ndcl-s counter int(10);\n";
    let json = stdout_json(cmd().write_stdin(input).assert().success());
    assert_eq!(json["entries"][0]["reference"], "stdin:counter");
    assert_eq!(json["lines"].as_array().unwrap().len(), 4);
}

#[test]
fn stdin_unknown_tag_fails() {
    let input = std::fs::read_to_string(fixture_path("badtag.rpgle")).unwrap();
    cmd()
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 4: @foo: unknown tag"));
}

// -- file mode --

#[test]
fn file_mode_prints_array() {
    let json = stdout_json(
        cmd()
            .arg(fixture_path("shapes.rpgle"))
            .arg(fixture_path("calc.rpgle"))
            .assert()
            .success(),
    );
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    // Sorted by path
    assert_eq!(reports[0]["name"], "calc");
    assert_eq!(reports[1]["name"], "shapes");
}

#[test]
fn file_mode_data_structures_and_prototypes() {
    let json = stdout_json(cmd().arg(fixture_path("shapes.rpgle")).assert().success());
    let entries = &json[0]["entries"];
    assert_eq!(entries.as_array().unwrap().len(), 4);

    let point = find(entries, "point_t");
    assert_eq!(point["kind"], "data_structure");
    assert_eq!(point["params"][0]["type"], "int(10)");
    assert_eq!(point["params"][0]["line"], 9);
    assert_eq!(point["params"][1]["type"], "int(10)");
    assert_eq!(point["reference"], "shapes:point_t");

    let origin = find(entries, "origin");
    assert_eq!(origin["kind"], "data_structure");

    let distance = find(entries, "distance");
    assert_eq!(distance["kind"], "prototype");
    assert_eq!(distance["params"][0]["type"], "likeds(point_t) const");
    assert_eq!(distance["params"][1]["line"], 27);

    let orphan = &entries[3];
    assert_eq!(orphan["line"], 30);
    assert!(orphan["kind"].is_null());
    assert_eq!(orphan["name"], "");
    assert!(orphan["reference"].is_null());
}

#[test]
fn file_mode_writes_output_dir() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("calc.rpgle"))
        .arg(fixture_path("shapes.rpgle"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let calc: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("calc.json")).unwrap()).unwrap();
    assert_eq!(calc["entries"].as_array().unwrap().len(), 4);
    assert!(dir.path().join("shapes.json").exists());
}

#[test]
fn file_mode_directory_input() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(fixture_path("calc.rpgle"), dir.path().join("calc.rpgle")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "/**\n * @bogus\n */\n").unwrap();

    let json = stdout_json(cmd().arg(dir.path().to_str().unwrap()).assert().success());
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn file_mode_unknown_tag_aborts() {
    cmd()
        .arg(fixture_path("calc.rpgle"))
        .arg(fixture_path("badtag.rpgle"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("badtag.rpgle"))
        .stderr(predicate::str::contains("@foo: unknown tag"));
}

#[test]
fn file_mode_keep_going_skips_bad_file() {
    let json = stdout_json(
        cmd()
            .arg("--keep-going")
            .arg(fixture_path("calc.rpgle"))
            .arg(fixture_path("badtag.rpgle"))
            .assert()
            .success()
            .stderr(predicate::str::contains("skipping")),
    );
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["name"], "calc");
}

#[test]
fn file_mode_no_source() {
    let json = stdout_json(
        cmd()
            .arg("--no-source")
            .arg(fixture_path("calc.rpgle"))
            .assert()
            .success(),
    );
    assert!(json[0].get("lines").is_none());
}

#[test]
fn file_mode_no_matches_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg(format!("{}/*.rpgle", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files"));
}

// -- markers --

#[test]
fn html_markers() {
    let json = stdout_json(
        cmd()
            .args(["--markers", "html"])
            .arg(fixture_path("calc.rpgle"))
            .assert()
            .success(),
    );
    let add = find(&json[0]["entries"], "add");
    assert_eq!(
        add["long_desc"],
        "Returns the sum of <code>a</code> and <code>b</code>. See <a href=\"#ref:sub\">sub</a> for the inverse."
    );
    assert_eq!(add["see"][0], "<a href=\"#ref:sub\">sub</a>");
}

#[test]
fn html_unknown_marker_fails() {
    cmd()
        .args(["--markers", "html"])
        .arg(fixture_path("badmarker.rpgle"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("@value: unknown marker"));
}

#[test]
fn raw_markers_keep_unknown_marker() {
    let json = stdout_json(cmd().arg(fixture_path("badmarker.rpgle")).assert().success());
    assert_eq!(json[0]["entries"][0]["short_desc"], "Uses {@value MAX} as the limit.");
}

// -- references --

#[test]
fn private_names_unique_across_files() {
    let dir = TempDir::new().unwrap();
    let src = "/**\n * Calc.\n */\ndcl-proc calc;\nend-proc;\n";
    std::fs::write(dir.path().join("a.rpgle"), src).unwrap();
    std::fs::write(dir.path().join("b.rpgle"), src).unwrap();

    let json = stdout_json(cmd().arg(dir.path().to_str().unwrap()).assert().success());
    assert_eq!(json[0]["entries"][0]["reference"], "a:calc");
    assert_eq!(json[1]["entries"][0]["reference"], "b:calc");
}

#[test]
fn duplicate_exported_names_warn() {
    let mut a = Builder::new().suffix(".rpgle").tempfile().unwrap();
    let mut b = Builder::new().suffix(".rpgle").tempfile().unwrap();
    let src = b"/**\n * Calc.\n */\ndcl-proc calc export;\nend-proc;\n";
    a.write_all(src).unwrap();
    b.write_all(src).unwrap();

    cmd()
        .arg(a.path().to_str().unwrap())
        .arg(b.path().to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("reference calc is declared in more than one place"));
}
