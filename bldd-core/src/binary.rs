use crate::arch::ArchitectureKind;
use crate::detect::is_elf_candidate;
use crate::dynamic::needed_libraries;
use crate::error::SkipReason;
use crate::header::elf::ElfHeader;
use crate::header::Header;
use goblin::container::Ctx;
use goblin::elf::program_header::ProgramHeader;
use goblin::elf::section_header::SectionHeader;
use goblin::elf::Elf;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// `e_shstrndx` escape meaning the real index lives in section header 0.
const SHN_XINDEX: u16 = 0xffff;

/// An ELF executable whose architecture and dependencies are known.
#[derive(Debug)]
pub struct Binary {
    pub path: PathBuf,
    pub header: Box<dyn Header>,
    pub architecture: ArchitectureKind,
    /// `DT_NEEDED` names, in dynamic table order. Empty for static binaries.
    pub libraries: Vec<String>,
}

fn malformed(err: impl std::fmt::Display) -> SkipReason {
    SkipReason::MalformedContainer(err.to_string())
}

/// Decodes the program and section header tables, rejecting images whose
/// tables do not fit the file.
fn layout(bytes: &[u8], header: &ElfHeader) -> Result<(Vec<ProgramHeader>, Ctx), SkipReason> {
    let goblin_header = Elf::parse_header(bytes).map_err(malformed)?;
    let ctx = Ctx::new(
        goblin_header.container().map_err(malformed)?,
        goblin_header.endianness().map_err(malformed)?,
    );

    let phoff = usize::try_from(header.e_phoff).map_err(malformed)?;
    let shoff = usize::try_from(header.e_shoff).map_err(malformed)?;
    let program_headers = if header.e_phnum == 0 {
        Vec::new()
    } else {
        ProgramHeader::parse(bytes, phoff, header.e_phnum as usize, ctx).map_err(malformed)?
    };
    let section_headers =
        SectionHeader::parse(bytes, shoff, header.e_shnum as usize, ctx).map_err(malformed)?;
    if header.e_shnum > 0
        && header.e_shstrndx != SHN_XINDEX
        && header.e_shstrndx as usize >= section_headers.len()
    {
        return Err(malformed(format!(
            "section name table index {} out of range",
            header.e_shstrndx
        )));
    }

    Ok((program_headers, ctx))
}

impl Binary {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SkipReason> {
        let bytes =
            std::fs::read(&path).map_err(|err| SkipReason::Unreadable(err.to_string()))?;
        Self::from_bytes(path.as_ref(), &bytes)
    }

    /// Classifies an in-memory image: magic, header, architecture, then
    /// dependencies. The first failing stage decides the skip reason.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, SkipReason> {
        if !is_elf_candidate(&mut &bytes[..]) {
            return Err(SkipReason::NotACandidate);
        }

        let header = ElfHeader::from_reader(&mut Cursor::new(bytes))
            .map_err(|err| SkipReason::MalformedContainer(format!("{err:#}")))?;
        let (program_headers, ctx) = layout(bytes, &header)?;
        let architecture = header.architecture()?;
        let libraries = needed_libraries(bytes, &program_headers, ctx)?;

        log::trace!(
            "{}: {} {}-bit, {} needed",
            path.display(),
            architecture,
            if header.is_64() { 64 } else { 32 },
            libraries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header: Box::new(header),
            architecture,
            libraries,
        })
    }

    pub fn is_static(&self) -> bool {
        self.libraries.is_empty()
    }
}
