//! Shared fixtures for CLI integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const START: &str = ":: Start\nYou wake in a field.\n[[A]]\n[[B]]\n";
pub const A: &str = ":: A\nYou walk north.\n[[End]]\n";
pub const B: &str = ":: B\nYou walk south.\n[[End]]\n";
pub const END: &str = ":: End\nThe end.\n";

/// A throwaway story project: one twee file per passage, the parser's graph
/// and source map, and (optionally) a git repository around them.
pub struct StoryProject {
    dir: TempDir,
}

impl StoryProject {
    /// The diamond story: Start links to A and B, both of which link to End.
    pub fn diamond() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let project = Self { dir };
        project.write("story/start.twee", START);
        project.write("story/a.twee", A);
        project.write("story/b.twee", B);
        project.write("story/end.twee", END);
        project.write_json(
            "build/graph.json",
            &json!({
                "start_passage": "Start",
                "passages": {
                    "Start": {"content": "You wake in a field.", "links": ["A", "B"]},
                    "A": {"content": "You walk north.", "links": ["End"]},
                    "B": {"content": "You walk south.", "links": ["End"]},
                    "End": {"content": "The end."}
                }
            }),
        );
        project.write_json(
            "build/sources.json",
            &json!({
                "root": "../story",
                "passages": {
                    "Start": ["start.twee"],
                    "A": ["a.twee"],
                    "B": ["b.twee"],
                    "End": ["end.twee"]
                }
            }),
        );
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, text: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, text).expect("write fixture file");
    }

    pub fn write_json(&self, rel: &str, value: &Value) {
        let text = serde_json::to_string_pretty(value).expect("serialize fixture");
        self.write(rel, &text);
    }

    pub fn read_json(&self, rel: &str) -> Value {
        let text = fs::read_to_string(self.path(rel)).expect("read json");
        serde_json::from_str(&text).expect("parse json")
    }

    /// Initialize a repository and commit everything under `story/`.
    pub fn commit_story(&self) {
        self.init_repo();
        self.commit_all_story();
    }

    pub fn init_repo(&self) {
        self.git(&["init", "-q"]);
    }

    pub fn set_git_config(&self, key: &str, value: &str) {
        self.git(&["config", key, value]);
    }

    /// Rewrite every story file with CRLF line endings.
    pub fn use_crlf(&self) {
        for (rel, text) in [
            ("story/start.twee", START),
            ("story/a.twee", A),
            ("story/b.twee", B),
            ("story/end.twee", END),
        ] {
            self.write(rel, &text.replace('\n', "\r\n"));
        }
    }

    pub fn commit_all_story(&self) {
        self.git(&["add", "story"]);
        self.git(&[
            "-c",
            "user.name=Story Tests",
            "-c",
            "user.email=story@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            "initial story",
        ]);
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(self.root())
            .args(args)
            .env("LC_ALL", "C")
            .status()
            .expect("run git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Run the CLI against this project.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_storypaths"))
            .arg("--root")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("run storypaths")
    }

    pub fn run_ok(&self, args: &[&str]) -> Output {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "storypaths {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }

    /// Categorize the diamond story and return the report.
    pub fn categorize(&self, extra: &[&str]) -> Value {
        let graph = self.path("build/graph.json");
        let sources = self.path("build/sources.json");
        let out = self.path("build/report.json");
        let mut args = vec![
            "categorize",
            "--graph",
            graph.to_str().expect("utf-8 path"),
            "--sources",
            sources.to_str().expect("utf-8 path"),
            "--out",
            out.to_str().expect("utf-8 path"),
        ];
        args.extend_from_slice(extra);
        self.run_ok(&args);
        self.read_json("build/report.json")
    }
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// The report entry whose route passes through `passage`.
pub fn path_through<'a>(report: &'a Value, passage: &str) -> &'a Value {
    report["paths"]
        .as_array()
        .expect("paths array")
        .iter()
        .find(|path| {
            path["route"]
                .as_array()
                .expect("route array")
                .iter()
                .any(|name| name == passage)
        })
        .expect("path through passage")
}

pub fn path_ids(report: &Value) -> Vec<String> {
    report["paths"]
        .as_array()
        .expect("paths array")
        .iter()
        .map(|path| path["path_id"].as_str().expect("path_id").to_string())
        .collect()
}
