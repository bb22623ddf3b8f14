use crate::arch::ArchitectureKind;
use crate::report::{ArchitectureReport, LibraryUsage, Report};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Accumulates (architecture, library, executable) records for one scan.
///
/// Usages live in an arena in first-recorded order; the map only points
/// into it. Sorting happens once, in [`Aggregator::build`].
#[derive(Debug, Default)]
pub struct Aggregator {
    usages: Vec<(ArchitectureKind, LibraryUsage)>,
    index: HashMap<(ArchitectureKind, String), usize>,
    records: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `executable` to the usage list of `library`. Repeated
    /// executables are kept.
    pub fn record(&mut self, architecture: ArchitectureKind, library: &str, executable: &Path) {
        self.records += 1;
        if let Some(&slot) = self.index.get(&(architecture, library.to_string())) {
            self.usages[slot].1.executables.push(executable.to_path_buf());
            return;
        }

        self.index
            .insert((architecture, library.to_string()), self.usages.len());
        self.usages.push((
            architecture,
            LibraryUsage {
                library: library.to_string(),
                executables: vec![executable.to_path_buf()],
            },
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Number of records accumulated so far.
    pub fn len(&self) -> usize {
        self.records
    }

    /// Sorts libraries by descending executable count (first recorded wins
    /// ties) and architectures by ascending label.
    pub fn build(&self, root: impl Into<PathBuf>) -> Report {
        let mut architectures: Vec<ArchitectureReport> = Vec::new();
        for (architecture, usage) in &self.usages {
            match architectures
                .iter_mut()
                .find(|report| report.architecture == *architecture)
            {
                Some(report) => report.libraries.push(usage.clone()),
                None => architectures.push(ArchitectureReport {
                    architecture: *architecture,
                    libraries: vec![usage.clone()],
                }),
            }
        }

        for report in &mut architectures {
            // stable: equal counts keep arena (first-recorded) order
            report
                .libraries
                .sort_by(|a, b| b.executables.len().cmp(&a.executables.len()));
        }
        architectures.sort_by_key(|report| report.architecture.label());

        Report {
            root: root.into(),
            architectures,
        }
    }
}
