use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    _temp: tempfile::TempDir,
    root: PathBuf,
    config: PathBuf,
}

fn workspace() -> Workspace {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().to_path_buf();
    let slash = |p: &Path| p.to_string_lossy().replace('\\', "/");
    let config = root.join("navigator.toml");
    fs::write(
        &config,
        format!(
            r#"
[metadata]
path = '{meta}/metadata.csv'
backup_dir = '{meta}/backups'

[safety]
protected_paths = ['{share}']
"#,
            meta = slash(&root.join("meta")),
            share = slash(&root.join("share")),
        ),
    )
    .unwrap();
    for (name, content) in [
        ("work/a.dwg", "drawing"),
        ("work/b.pdf", "document"),
        ("share/title.dwg", "template"),
    ] {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    Workspace {
        _temp: temp,
        root,
        config,
    }
}

fn run(ws: &Workspace, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_file-navigator"))
        .arg("--config")
        .arg(&ws.config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn run_json(ws: &Workspace, args: &[&str]) -> Value {
    let out = run(ws, args);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

fn path_arg(ws: &Workspace, name: &str) -> String {
    ws.root.join(name).to_string_lossy().into_owned()
}

#[test]
fn index_edit_and_search() {
    let ws = workspace();
    let work = path_arg(&ws, "work");
    let share = path_arg(&ws, "share");
    let drawing = path_arg(&ws, "work/a.dwg");

    let summary = run_json(&ws, &["index", &work, &share, "--json"]);
    assert_eq!(summary["discovered"], 3);
    assert_eq!(summary["added"], 2);
    assert_eq!(summary["skipped"].as_array().unwrap().len(), 1);

    let out = run(&ws, &["set", &drawing, "department=Electrical", "type=Plan View"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let hits = run_json(&ws, &["search", "--filter", "department=Electrical", "--json"]);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["file_path"], Value::String(drawing.clone()));
    assert_eq!(hits[0]["type"], "Plan View");

    let shown = run_json(&ws, &["show", &drawing, "--json"]);
    assert_eq!(shown["indexed"], true);
    assert_eq!(shown["access"]["protected"], false);

    let stats = run_json(&ws, &["stats", "--json"]);
    assert_eq!(stats["total_files"], 2);
    assert_eq!(stats["departments"], serde_json::json!(["Electrical"]));

    let backups = run_json(&ws, &["backups", "--json"]);
    assert_eq!(backups.as_array().unwrap().len(), 2);
}

#[test]
fn protected_files_cannot_be_edited() {
    let ws = workspace();
    let template = path_arg(&ws, "share/title.dwg");

    let out = run(&ws, &["set", &template, "department=Civil"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("protected"));

    let shown = run_json(&ws, &["show", &template, "--json"]);
    assert_eq!(shown["indexed"], false);
    assert_eq!(shown["access"]["protected"], true);
    assert_eq!(shown["record"]["file_extension"], ".dwg");
}

#[test]
fn unknown_fields_are_rejected() {
    let ws = workspace();
    let drawing = path_arg(&ws, "work/a.dwg");
    let out = run(&ws, &["set", &drawing, "colour=red"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown metadata field"));
}

#[test]
fn vocabulary_lists_are_printed() {
    let ws = workspace();
    let lists = run_json(&ws, &["vocab", "department", "--json"]);
    let departments = lists["department"].as_array().unwrap();
    assert!(departments.contains(&Value::String("Electrical".into())));
}

#[test]
fn session_keeps_history_for_suggestions_and_popular() {
    use std::io::Write;
    use std::process::Stdio;

    let ws = workspace();
    let work = path_arg(&ws, "work");
    run_json(&ws, &["index", &work, "--json"]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_file-navigator"))
        .arg("--config")
        .arg(&ws.config)
        .args(["session", "--json"])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"search dwg\nsearch pdf\nsearch dwg\nbogus\nsuggest dw\npopular\nquit\nsearch never\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown session command"));

    let replies: Vec<Value> = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 5);
    assert_eq!(replies[0]["records"].as_array().unwrap().len(), 1);
    assert_eq!(replies[2]["cached"], true);
    assert_eq!(replies[3][0], "dwg");
    // The cached repeat is not recorded, so both texts were run once.
    let popular = replies[4].as_array().unwrap();
    assert_eq!(popular.len(), 2);
    assert_eq!(popular[0]["text"], "pdf");
}
