use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn codesum(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codesum").expect("binary");
    cmd.current_dir(workdir)
        .env("CODESUM_LLM_PROVIDER", "stub")
        .env_remove("RUST_LOG");
    cmd
}

fn setup_project(root: &Path) {
    fs::create_dir_all(root.join("shop/src/shop")).unwrap();
    fs::write(
        root.join("shop/src/shop/Cart.java"),
        "package shop;\n\nimport shop.Item;\n\npublic class Cart {\n    int total() {\n        return item.price();\n    }\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("shop/src/shop/Item.java"),
        "package shop;\n\npublic class Item {\n    int price() {\n        return 1;\n    }\n}\n",
    )
    .unwrap();
    fs::write(root.join("shop/src/shop/ItemTest.java"), "class ItemTest {}\n").unwrap();
    fs::write(root.join("shop/README.md"), "# shop\n").unwrap();
}

#[test]
fn summarize_writes_artifact_and_stats() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    setup_project(root);

    let output = codesum(root)
        .args(["summarize", "shop", "--json", "--workers", "2"])
        .output()
        .expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["project_summary"], "Create a h");
    assert_eq!(body["total_files"], 2);
    assert_eq!(body["total_chunks"], 2);
    assert_eq!(body["project_path"], "shop");

    let summaries = body["file_summaries"].as_object().unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.values().all(|s| s == "Write a 3-"));

    let written: Value =
        serde_json::from_str(&fs::read_to_string(root.join("summary_shop.json")).unwrap())
            .unwrap();
    assert_eq!(written, body);

    let stats: Value =
        serde_json::from_str(&fs::read_to_string(root.join("stats/shop_stats.json")).unwrap())
            .unwrap();
    assert_eq!(stats["project"], "shop");
    assert_eq!(stats["llm_calls"]["chunk_summary"], 2);
    assert_eq!(stats["llm_calls"]["method_summary"], 1);
    assert_eq!(stats["total_llm_calls"], 6);
}

#[test]
fn config_file_and_explicit_output_path() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    setup_project(root);
    fs::write(
        root.join("custom.toml"),
        "[project]\ninclude_tests = true\n\n[output]\nstats_dir = \"metrics\"\nprompt_log_sample_percent = 100\n",
    )
    .unwrap();

    codesum(root)
        .args([
            "summarize",
            "shop",
            "--config",
            "custom.toml",
            "--output",
            "out/result.json",
        ])
        .assert()
        .success();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(root.join("out/result.json")).unwrap()).unwrap();
    assert_eq!(written["total_files"], 3);
    assert!(root.join("metrics/shop_stats.json").exists());

    let prompts = fs::read_to_string(root.join("prompt_logs/prompts.jsonl")).unwrap();
    assert_eq!(prompts.lines().count(), 8);
}

#[test]
fn chunks_lists_resolved_dependencies() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    setup_project(root);

    let output = codesum(root)
        .args(["chunks", "shop", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let rows: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let cart = rows
        .iter()
        .find(|r| r["file_path"].as_str().unwrap().ends_with("Cart.java"))
        .unwrap();
    assert_eq!(cart["call_sites"], 1);
    assert_eq!(cart["dependencies"][0]["class_name"], "Item");
    assert_eq!(cart["dependencies"][0]["method_name"], "price");
    assert!(!root.join("stats").exists());
}

#[test]
fn missing_api_key_fails_before_any_work() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    setup_project(root);
    fs::write(
        root.join("codesum.toml"),
        "[llm]\nprovider = \"anthropic\"\napi_key_env = \"CODESUM_TEST_KEY_NEVER_SET\"\n",
    )
    .unwrap();

    let output = codesum(root)
        .env_remove("CODESUM_LLM_PROVIDER")
        .env_remove("CODESUM_TEST_KEY_NEVER_SET")
        .args(["summarize", "shop"])
        .output()
        .expect("command run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CODESUM_TEST_KEY_NEVER_SET"), "stderr: {stderr}");
    assert!(!root.join("summary_shop.json").exists());
}

#[test]
fn invalid_overlap_is_rejected() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    setup_project(root);

    codesum(root)
        .args(["chunks", "shop", "--window-size", "10", "--overlap", "10"])
        .assert()
        .failure();
}

#[test]
fn missing_project_directory_is_an_error() {
    let temp = tempdir().unwrap();

    codesum(temp.path())
        .args(["summarize", "does-not-exist"])
        .assert()
        .failure();
}
