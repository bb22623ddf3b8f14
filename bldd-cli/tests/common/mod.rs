#![allow(dead_code)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use bldd_core::fixture::ElfFixture;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch tree to scan plus a separate place for reports.
pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub out_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("tree");
        let out_dir = tmp.path().join("out");
        fs::create_dir_all(&root).expect("create scan root");
        fs::create_dir_all(&out_dir).expect("create output dir");
        Self {
            _tmp: tmp,
            root,
            out_dir,
        }
    }

    pub fn write(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create parent");
        fs::write(&path, bytes).expect("write fixture");
        path
    }

    pub fn write_elf(&self, rel: &str, fixture: ElfFixture) -> PathBuf {
        self.write(rel, &fixture.build())
    }

    pub fn report_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("bldd");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Runs a scan of the tree into `name` and returns the report text.
    pub fn scan(&self, name: &str, extra: &[&str]) -> String {
        let out = self.report_path(name);
        self.cmd()
            .arg("--dir")
            .arg(&self.root)
            .arg("--output")
            .arg(&out)
            .args(extra)
            .assert()
            .success();
        read(&out)
    }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("report exists")
}
