use std::io;
use std::path::PathBuf;

/// Why a file was left out of the report.
///
/// None of these abort a scan; they are counted and logged.
#[derive(thiserror::Error, Debug)]
pub enum SkipReason {
    #[error("not an ELF file")]
    NotACandidate,
    #[error("not a regular file")]
    NotRegularFile,
    #[error("unreadable: {0}")]
    Unreadable(String),
    #[error("malformed ELF container: {0}")]
    MalformedContainer(String),
    #[error("unsupported architecture (e_machine {0:#x})")]
    UnsupportedArchitecture(u16),
    #[error("corrupt dynamic section: {0}")]
    DependencySectionCorrupt(String),
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("cannot traverse {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write report to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
