mod common;

use bldd_core::fixture::ElfFixture;
use bldd_core::{EM_386, EM_AARCH64, EM_ARM, EM_X86_64};
use common::TestEnv;
use predicates::str::contains;

#[test]
fn reports_two_architectures() {
    let env = TestEnv::new();
    let amd64 = env.write_elf(
        "usr/bin/calc",
        ElfFixture::new(EM_X86_64).needs(&["libc.so.6", "libm.so.6"]),
    );
    let arm64 = env.write_elf(
        "arm/bin/calc",
        ElfFixture::new(EM_AARCH64).needs(&["libc.so.6"]),
    );

    let report = env.scan("report.txt", &[]);
    let expected = format!(
        "Report on dynamic used libraries by ELF executables on {root}
==================================================

---------- aarch64 ----------
libc.so.6 (1 execs)
-> {arm64}

---------- x86-64 ----------
libc.so.6 (1 execs)
-> {amd64}
libm.so.6 (1 execs)
-> {amd64}

",
        root = env.root.display(),
        arm64 = arm64.display(),
        amd64 = amd64.display(),
    );
    assert_eq!(report, expected);
}

#[test]
fn prints_success_message() {
    let env = TestEnv::new();
    env.write_elf("tool", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));
    let out = env.report_path("deps.txt");

    env.cmd()
        .args(["-d", env.root.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Report generated successfully in"));
    assert!(out.exists());
}

#[test]
fn sections_sorted_by_label() {
    let env = TestEnv::new();
    env.write_elf("x64", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));
    env.write_elf("x86", ElfFixture::new(EM_386).elf32().needs(&["libc.so.6"]));
    env.write_elf("arm", ElfFixture::new(EM_ARM).elf32().needs(&["libc.so.6"]));
    env.write_elf("a64", ElfFixture::new(EM_AARCH64).needs(&["libc.so.6"]));

    let report = env.scan("report.txt", &[]);
    let headings: Vec<_> = report
        .lines()
        .filter(|line| line.starts_with("---------- "))
        .collect();
    assert_eq!(
        headings,
        vec![
            "---------- aarch64 ----------",
            "---------- armv7 ----------",
            "---------- i386 (x86) ----------",
            "---------- x86-64 ----------",
        ]
    );
}

#[test]
fn libraries_sorted_by_usage() {
    let env = TestEnv::new();
    env.write_elf("a", ElfFixture::new(EM_X86_64).needs(&["libonce.so", "libc.so.6"]));
    env.write_elf("b", ElfFixture::new(EM_X86_64).needs(&["libc.so.6", "libtwice.so"]));
    env.write_elf("c", ElfFixture::new(EM_X86_64).needs(&["libtwice.so", "libc.so.6"]));

    let report = env.scan("report.txt", &[]);
    let libraries: Vec<_> = report
        .lines()
        .filter(|line| line.ends_with(" execs)"))
        .collect();
    assert_eq!(
        libraries,
        vec!["libc.so.6 (3 execs)", "libtwice.so (2 execs)", "libonce.so (1 execs)"]
    );
}

#[test]
fn skips_unusable_files() {
    let env = TestEnv::new();
    let good = ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]).build();
    env.write("notes.txt", b"hello");
    env.write("tiny", b"\x7f");
    env.write("truncated", &good[..30]);
    env.write_elf("mips", ElfFixture::new(8).elf32().needs(&["libc.so.6"]));
    env.write_elf(
        "corrupt",
        ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]).dangling_needed(),
    );
    env.write_elf("static", ElfFixture::new(EM_X86_64).static_linked());
    let kept = env.write("zz/good", &good);

    let report = env.scan("report.txt", &[]);
    assert!(report.contains("libc.so.6 (1 execs)"));
    assert!(report.contains(&format!("-> {}\n", kept.display())));
    for skipped in ["notes.txt", "tiny", "truncated", "mips", "corrupt", "static"] {
        assert!(
            !report.contains(&format!("{}\n", env.root.join(skipped).display())),
            "{skipped} should not be listed"
        );
    }
}

#[test]
fn rescanning_is_byte_identical() {
    let env = TestEnv::new();
    for (i, libs) in [
        &["libc.so.6"][..],
        &["libz.so.1", "libc.so.6"][..],
        &["libz.so.1"][..],
        &["libpthread.so.0", "libc.so.6"][..],
    ]
    .iter()
    .enumerate()
    {
        env.write_elf(&format!("dir{}/exe{i}", i % 2), ElfFixture::new(EM_X86_64).needs(libs));
    }

    let first = env.scan("first.txt", &[]);
    let second = env.scan("second.txt", &[]);
    assert_eq!(first, second);
}

#[test]
fn empty_directory_gives_header_only() {
    let env = TestEnv::new();
    let report = env.scan("report.txt", &[]);
    assert_eq!(
        report,
        format!(
            "Report on dynamic used libraries by ELF executables on {}\n{}\n\n",
            env.root.display(),
            "=".repeat(50)
        )
    );
}

#[test]
fn json_format() {
    let env = TestEnv::new();
    env.write_elf("tool", ElfFixture::new(EM_AARCH64).needs(&["libc.so.6"]));

    let report = env.scan("report.json", &["--format", "json"]);
    assert!(report.contains("\"architecture\": \"aarch64\""));
    assert!(report.contains("\"library\": \"libc.so.6\""));
}

#[test]
fn summary_table() {
    let env = TestEnv::new();
    env.write_elf("a", ElfFixture::new(EM_X86_64).needs(&["libc.so.6", "libm.so.6"]));
    env.write_elf("b", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));
    let out = env.report_path("report.txt");

    env.cmd()
        .arg("--dir")
        .arg(&env.root)
        .arg("--output")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(contains("Architecture"))
        .stdout(contains("x86-64"))
        .stdout(contains("libc.so.6 (2)"));
}

#[test]
fn missing_directory_fails() {
    let env = TestEnv::new();
    let out = env.report_path("report.txt");

    env.cmd()
        .arg("--dir")
        .arg(env.root.join("does-not-exist"))
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .stderr(contains("Error scanning directory"));
    assert!(!out.exists());
}

#[test]
fn unwritable_output_fails() {
    let env = TestEnv::new();
    env.write_elf("tool", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));

    env.cmd()
        .arg("--dir")
        .arg(&env.root)
        .arg("--output")
        .arg(env.out_dir.join("missing/report.txt"))
        .assert()
        .failure()
        .stderr(contains("Error generating report"));
}

#[test]
fn default_directory_reports_clean_relative_paths() {
    let env = TestEnv::new();
    env.write_elf("tool", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));
    env.write_elf("sub/helper", ElfFixture::new(EM_X86_64).needs(&["libc.so.6"]));
    let out = env.report_path("report.txt");

    env.cmd()
        .current_dir(&env.root)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let report = common::read(&out);
    assert!(report.starts_with("Report on dynamic used libraries by ELF executables on .\n"));
    assert!(report.contains("libc.so.6 (2 execs)\n-> sub/helper\n-> tool\n"));
}
