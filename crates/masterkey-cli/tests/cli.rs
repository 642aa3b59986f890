//! End-to-end tests driving `mkplan` commands against a project file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use masterkey_cli::{run, App, Cli, CliError, Status};
use masterkey_engine::{EngineError, MasterKeyEngine};
use masterkey_store::Store;
use serde_json::Value;
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    path: PathBuf,
    doors: PathBuf,
}

fn setup() -> Project {
    let dir = TempDir::new().unwrap();
    let doors = dir.path().join("doors.json");
    fs::write(
        &doors,
        r#"[
            {"id": "101", "mark": "101", "use": "Office", "zone": "East"},
            {"id": "102", "mark": "102", "use": "Office", "zone": "East"},
            {"id": "201", "mark": "201", "use": "Lab", "zone": "West", "qty": 2},
            {"id": "301", "mark": "301", "use": "Reception", "zone": "Admin", "ada": true}
        ]"#,
    )
    .unwrap();
    Project {
        path: dir.path().join("project.json"),
        doors,
        _dir: dir,
    }
}

fn mkplan(project: &Path, args: &[&str]) -> Result<(Status, String), CliError> {
    let project = project.to_string_lossy();
    let argv = ["mkplan", "--project", project.as_ref()]
        .into_iter()
        .chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    let status = run(&cli, &mut out)?;
    Ok((status, String::from_utf8(out).unwrap()))
}

fn json(project: &Path, args: &[&str]) -> Value {
    let (_, out) = mkplan(project, args).unwrap();
    serde_json::from_str(&out).unwrap()
}

fn init(project: &Project) {
    let doors = project.doors.to_string_lossy();
    mkplan(&project.path, &["init", "--doors", doors.as_ref()]).unwrap();
}

#[test]
fn init_refuses_to_overwrite() {
    let project = setup();
    init(&project);
    let err = mkplan(&project.path, &["init"]).unwrap_err();
    assert!(matches!(err, CliError::ProjectExists(_)));

    let (status, _) = mkplan(&project.path, &["init", "--force"]).unwrap();
    assert_eq!(status, Status::Success);
    let app = App::open(&project.path).unwrap();
    assert!(app.service().store().list_doors().unwrap().is_empty());
}

#[test]
fn generate_plan_and_validate() {
    let project = setup();
    init(&project);

    let tree = json(&project.path, &["generate", "--depth", "3"]);
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["level"]["key_symbol"], "A");

    let plan = json(&project.path, &["plan"]);
    assert_eq!(plan["total_change_keys"], 4);
    let stats = json(&project.path, &["stats"]);
    assert_eq!(stats["assigned_doors"], 0);

    json(&project.path, &["plan", "--apply"]);
    let stats = json(&project.path, &["stats"]);
    assert_eq!(stats["assigned_doors"], 4);
    assert_eq!(stats["progress_percentage"], 100);

    let (status, _) = mkplan(&project.path, &["validate", "--critical"]).unwrap();
    assert_eq!(status, Status::Success);
}

#[test]
fn validate_reports_missing_hierarchy() {
    let project = setup();
    init(&project);

    let (status, out) = mkplan(&project.path, &["validate"]).unwrap();
    assert_eq!(status, Status::Invalid);
    let report: Value = serde_json::from_str(&out).unwrap();
    let kinds: Vec<&str> = report["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["type"].as_str())
        .collect();
    assert!(kinds.contains(&"no_hierarchy"));
    assert!(kinds.contains(&"unassigned_doors"));
}

#[test]
fn preview_does_not_write() {
    let project = setup();
    init(&project);
    let before = fs::read_to_string(&project.path).unwrap();

    let preview = json(&project.path, &["preview", "--depth", "3"]);
    assert_eq!(preview["depth"], 3);
    assert_eq!(preview["total_doors"], 4);

    let (_, text) = mkplan(&project.path, &["--format", "text", "preview"]).unwrap();
    assert!(text.contains("Estimated keys"));
    assert_eq!(fs::read_to_string(&project.path).unwrap(), before);
}

#[test]
fn assign_by_master_symbol() {
    let project = setup();
    init(&project);
    json(&project.path, &["generate", "--depth", "3"]);

    let app = App::open(&project.path).unwrap();
    let master = app.service().store().list_hierarchy_levels().unwrap()[1].clone();

    let assignment = json(&project.path, &["assign", "101", "--master", &master.key_symbol]);
    assert_eq!(assignment["door_id"], "101");
    assert_eq!(assignment["key_type"], "KD");
    let symbol = assignment["key_symbol"].as_str().unwrap().to_string();
    assert!(symbol.starts_with(&master.key_symbol));

    let err = mkplan(
        &project.path,
        &["assign", "102", "--master", &master.key_symbol, "--symbol", &symbol],
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Engine(EngineError::SymbolInUse(_))));

    let err = mkplan(&project.path, &["assign", "102", "--master", "ZZ"]).unwrap_err();
    assert!(matches!(err, CliError::UnknownMaster(_)));

    json(&project.path, &["unassign", "101"]);
    assert_eq!(json(&project.path, &["stats"])["assigned_doors"], 0);
}

#[test]
fn keyed_alike_group_lifecycle() {
    let project = setup();
    init(&project);
    json(&project.path, &["generate", "--depth", "3"]);
    let app = App::open(&project.path).unwrap();
    let master = app.service().store().list_hierarchy_levels().unwrap()[1].clone();

    let group = json(
        &project.path,
        &[
            "ka", "create", "--name", "Labs", "--master", &master.key_symbol, "--door", "101",
            "--door", "201", "--quantity", "6",
        ],
    );
    assert_eq!(group["door_ids"].as_array().unwrap().len(), 2);
    let id = group["id"].as_str().unwrap().to_string();

    let capacity = json(&project.path, &["capacity"]);
    assert_eq!(capacity["differs_used"], 5);

    let renamed = json(&project.path, &["ka", "update", &id, "--name", "Shared Labs"]);
    assert_eq!(renamed["name"], "Shared Labs");

    json(&project.path, &["ka", "delete", &id]);
    let app = App::open(&project.path).unwrap();
    assert!(app.service().store().list_ka_groups().unwrap().is_empty());
    assert_eq!(app.service().assignment_stats().unwrap().assigned_doors, 0);
}

#[test]
fn export_writes_file() {
    let project = setup();
    init(&project);
    json(&project.path, &["generate", "--depth", "3"]);
    json(&project.path, &["plan", "--apply"]);

    let output = project.path.with_file_name("export.json");
    let target = output.to_string_lossy();
    let (_, out) = mkplan(&project.path, &["export", "--output", target.as_ref()]).unwrap();
    assert!(out.is_empty());

    let snapshot: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(snapshot["schedule"].as_array().unwrap().len(), 4);
    assert_eq!(snapshot["standard"]["id"], "ANSI_BHMA");
}

#[test]
fn switching_standard_updates_capacity_ceiling() {
    let project = setup();
    init(&project);

    assert_eq!(json(&project.path, &["capacity"])["max_differs"], 117_649);

    let config = json(&project.path, &["standard", "EN"]);
    assert_eq!(config["standard"], "EN");
    assert_eq!(json(&project.path, &["capacity"])["max_differs"], 7776);
}
