use crate::arch::ArchitectureKind;
use crate::error::ScanError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const TITLE_RULE: &str = "==================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryUsage {
    pub library: String,
    /// Executables in the order they were recorded. Never empty.
    pub executables: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureReport {
    pub architecture: ArchitectureKind,
    pub libraries: Vec<LibraryUsage>,
}

impl ArchitectureReport {
    /// Number of distinct executables referencing any library.
    pub fn executable_count(&self) -> usize {
        self.libraries
            .iter()
            .flat_map(|usage| usage.executables.iter())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub root: PathBuf,
    pub architectures: Vec<ArchitectureReport>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.architectures.is_empty()
    }
}

pub fn render_text<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Report on dynamic used libraries by ELF executables on {}",
        report.root.display()
    )?;
    writeln!(out, "{TITLE_RULE}")?;
    writeln!(out)?;

    for arch in &report.architectures {
        writeln!(out, "---------- {} ----------", arch.architecture)?;
        for usage in &arch.libraries {
            writeln!(out, "{} ({} execs)", usage.library, usage.executables.len())?;
            for exec in &usage.executables {
                writeln!(out, "-> {}", exec.display())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn render_json<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

/// Writes the report next to `dest` and renames it into place, so `dest`
/// either keeps its previous content or holds the complete report.
pub fn write_report(report: &Report, dest: &Path, format: ReportFormat) -> Result<(), ScanError> {
    let output_err = |source: io::Error| ScanError::OutputWrite {
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".bldd-report");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // umask still applies, as for File::create
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(output_err)?;

    {
        let mut out = io::BufWriter::new(tmp.as_file_mut());
        let rendered = match format {
            ReportFormat::Text => render_text(report, &mut out),
            ReportFormat::Json => render_json(report, &mut out),
        };
        rendered.and_then(|()| out.flush()).map_err(output_err)?;
    }
    tmp.as_file().sync_all().map_err(output_err)?;
    tmp.persist(dest).map_err(|err| output_err(err.error))?;

    log::debug!("report written to {}", dest.display());
    Ok(())
}
