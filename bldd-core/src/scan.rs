use crate::aggregate::Aggregator;
use crate::binary::Binary;
use crate::detect::is_elf_path;
use crate::error::{ScanError, SkipReason};
use crate::report::Report;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

fn traversal_error(path: &Path) -> impl FnOnce(io::Error) -> ScanError {
    let path = path.to_path_buf();
    move |source| ScanError::Traversal { path, source }
}

/// Joins `name` onto `dir` and cleans the result lexically: `.` components
/// vanish and `..` removes the component before it. `./bin` + `ls` gives
/// `bin/ls`.
fn clean_join(dir: &Path, name: &OsStr) -> PathBuf {
    let joined = dir.join(name);
    let mut cleaned: Vec<Component<'_>> = Vec::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.last().copied() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(component),
            },
            other => cleaned.push(other),
        }
    }
    if cleaned.is_empty() {
        return PathBuf::from(".");
    }
    cleaned.iter().collect()
}

/// Result of classifying one file. Skips are ordinary outcomes, not errors.
#[derive(Debug)]
pub enum FileOutcome {
    Recorded(Binary),
    Skipped(SkipReason),
}

/// Only regular files (or symlinks to them) are opened, since opening a FIFO
/// blocks. The magic is checked before the file is read in full.
pub fn classify_file(path: &Path) -> FileOutcome {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return FileOutcome::Skipped(SkipReason::NotRegularFile),
        Err(_) => return FileOutcome::Skipped(SkipReason::NotACandidate),
    }
    if !is_elf_path(path) {
        return FileOutcome::Skipped(SkipReason::NotACandidate);
    }
    match Binary::open(path) {
        Ok(binary) => FileOutcome::Recorded(binary),
        Err(reason) => FileOutcome::Skipped(reason),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files: usize,
    pub recorded: usize,
    pub not_elf: usize,
    pub not_regular: usize,
    pub unreadable: usize,
    pub malformed: usize,
    pub unsupported: usize,
    pub corrupt: usize,
}

impl ScanStats {
    pub fn skipped(&self) -> usize {
        self.not_elf
            + self.not_regular
            + self.unreadable
            + self.malformed
            + self.unsupported
            + self.corrupt
    }

    fn note(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::NotACandidate => self.not_elf += 1,
            SkipReason::NotRegularFile => self.not_regular += 1,
            SkipReason::Unreadable(_) => self.unreadable += 1,
            SkipReason::MalformedContainer(_) => self.malformed += 1,
            SkipReason::UnsupportedArchitecture(_) => self.unsupported += 1,
            SkipReason::DependencySectionCorrupt(_) => self.corrupt += 1,
        }
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub report: Report,
    pub stats: ScanStats,
}

/// Walks a directory tree and aggregates the dependencies of every ELF
/// executable in it.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    aggregator: Aggregator,
    stats: ScanStats,
}

impl Scanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            aggregator: Aggregator::new(),
            stats: ScanStats::default(),
        }
    }

    pub fn run(mut self) -> Result<ScanOutcome, ScanError> {
        let root = self.root.clone();
        let meta = fs::symlink_metadata(&root).map_err(traversal_error(&root))?;
        if meta.is_dir() {
            self.walk(&root)?;
        } else {
            self.visit_file(&root);
        }

        let stats = self.stats;
        log::info!(
            "scanned {} files under {}: {} ELF recorded, {} skipped ({} not ELF, {} not regular, {} unreadable, {} malformed, {} unsupported, {} corrupt)",
            stats.files,
            root.display(),
            stats.recorded,
            stats.skipped(),
            stats.not_elf,
            stats.not_regular,
            stats.unreadable,
            stats.malformed,
            stats.unsupported,
            stats.corrupt
        );
        Ok(ScanOutcome {
            report: self.aggregator.build(root),
            stats,
        })
    }

    fn walk(&mut self, dir: &Path) -> Result<(), ScanError> {
        let mut entries = fs::read_dir(dir)
            .map_err(traversal_error(dir))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(traversal_error(dir))?;
        // read_dir order is filesystem dependent
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = clean_join(dir, &entry.file_name());
            let file_type = entry.file_type().map_err(traversal_error(&path))?;
            if file_type.is_dir() {
                self.walk(&path)?;
            } else {
                self.visit_file(&path);
            }
        }
        Ok(())
    }

    fn visit_file(&mut self, path: &Path) {
        self.stats.files += 1;
        match classify_file(path) {
            FileOutcome::Recorded(binary) => {
                self.stats.recorded += 1;
                for library in &binary.libraries {
                    self.aggregator
                        .record(binary.architecture, library, &binary.path);
                }
            }
            FileOutcome::Skipped(reason) => {
                match &reason {
                    SkipReason::NotACandidate | SkipReason::NotRegularFile => {
                        log::trace!("skipping {}: {}", path.display(), reason)
                    }
                    SkipReason::DependencySectionCorrupt(_) => {
                        log::warn!("skipping {}: {}", path.display(), reason)
                    }
                    _ => log::debug!("skipping {}: {}", path.display(), reason),
                }
                self.stats.note(&reason);
            }
        }
    }
}

pub fn scan_directory<P: AsRef<Path>>(root: P) -> Result<ScanOutcome, ScanError> {
    Scanner::new(root).run()
}
