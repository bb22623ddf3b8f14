use serde::Serialize;
use std::fmt;

pub const EM_386: u16 = 3;
pub const EM_ARM: u16 = 40;
pub const EM_X86_64: u16 = 62;
pub const EM_AARCH64: u16 = 183;

/// Target architectures the report knows about.
///
/// Anything else found in `e_machine` is reported as unsupported and the
/// file is left out of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ArchitectureKind {
    #[serde(rename = "i386 (x86)")]
    X86,
    #[serde(rename = "x86-64")]
    X86_64,
    #[serde(rename = "armv7")]
    Armv7,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl ArchitectureKind {
    pub const ALL: [ArchitectureKind; 4] = [
        ArchitectureKind::X86,
        ArchitectureKind::X86_64,
        ArchitectureKind::Armv7,
        ArchitectureKind::Aarch64,
    ];

    pub fn from_machine(machine: u16) -> Option<Self> {
        match machine {
            EM_386 => Some(ArchitectureKind::X86),
            EM_X86_64 => Some(ArchitectureKind::X86_64),
            EM_ARM => Some(ArchitectureKind::Armv7),
            EM_AARCH64 => Some(ArchitectureKind::Aarch64),
            _ => None,
        }
    }

    pub fn machine(self) -> u16 {
        match self {
            ArchitectureKind::X86 => EM_386,
            ArchitectureKind::X86_64 => EM_X86_64,
            ArchitectureKind::Armv7 => EM_ARM,
            ArchitectureKind::Aarch64 => EM_AARCH64,
        }
    }

    /// Label used in report headings. Reports order sections by this string.
    pub fn label(self) -> &'static str {
        match self {
            ArchitectureKind::X86 => "i386 (x86)",
            ArchitectureKind::X86_64 => "x86-64",
            ArchitectureKind::Armv7 => "armv7",
            ArchitectureKind::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
