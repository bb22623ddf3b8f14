use crate::detect::ELF_MAGIC;
use crate::header::Header;
use anyhow::{bail, Result};
use byteorder::{ByteOrder, ReadBytesExt, BE, LE};
use std::io::Read;

pub const ELFCLASS32: u8 = 1;
pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;
pub const EV_CURRENT: u8 = 1;

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;

/// The ELF file header, widened to 64-bit fields for both classes.
///
/// This mirrors `Elf32_Ehdr`/`Elf64_Ehdr` from the ELF specification. Only the
/// fields needed to validate the container layout are interpreted; the rest
/// are kept for diagnostics.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    /// ELF identification bytes: magic, class, data encoding, version, ABI.
    pub e_ident: [u8; 16],

    /// Object file type (`ET_EXEC` = 2, `ET_DYN` = 3, ...).
    pub e_type: u16,

    /// Target architecture, e.g. `EM_X86_64` (62) or `EM_AARCH64` (183).
    pub e_machine: u16,

    pub e_version: u32,
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Header size for the given class.
    pub fn header_size(is_64: bool) -> u16 {
        if is_64 {
            64
        } else {
            52
        }
    }

    pub fn program_header_size(is_64: bool) -> u16 {
        if is_64 {
            56
        } else {
            32
        }
    }

    pub fn section_header_size(is_64: bool) -> u16 {
        if is_64 {
            64
        } else {
            40
        }
    }

    /// Reads and validates the file header at the current position.
    pub fn from_reader<R: Read>(cur: &mut R) -> Result<ElfHeader> {
        let mut e_ident = [0u8; 16];
        cur.read_exact(&mut e_ident)?;

        if e_ident[..4] != ELF_MAGIC {
            bail!("bad magic {:02x?}", &e_ident[..4]);
        }
        let is_64 = match e_ident[EI_CLASS] {
            ELFCLASS32 => false,
            ELFCLASS64 => true,
            class => bail!("invalid class {class}"),
        };
        if e_ident[EI_VERSION] != EV_CURRENT {
            bail!("invalid identification version {}", e_ident[EI_VERSION]);
        }

        let header = match e_ident[EI_DATA] {
            ELFDATA2LSB => Self::read_fields::<LE, R>(cur, e_ident, is_64)?,
            ELFDATA2MSB => Self::read_fields::<BE, R>(cur, e_ident, is_64)?,
            data => bail!("invalid data encoding {data}"),
        };
        header.validate()?;
        Ok(header)
    }

    fn read_fields<B: ByteOrder, R: Read>(
        cur: &mut R,
        e_ident: [u8; 16],
        is_64: bool,
    ) -> Result<ElfHeader> {
        let e_type = cur.read_u16::<B>()?;
        let e_machine = cur.read_u16::<B>()?;
        let e_version = cur.read_u32::<B>()?;
        let (e_entry, e_phoff, e_shoff) = if is_64 {
            (cur.read_u64::<B>()?, cur.read_u64::<B>()?, cur.read_u64::<B>()?)
        } else {
            (
                cur.read_u32::<B>()? as u64,
                cur.read_u32::<B>()? as u64,
                cur.read_u32::<B>()? as u64,
            )
        };

        Ok(ElfHeader {
            e_ident,
            e_type,
            e_machine,
            e_version,
            e_entry,
            e_phoff,
            e_shoff,
            e_flags: cur.read_u32::<B>()?,
            e_ehsize: cur.read_u16::<B>()?,
            e_phentsize: cur.read_u16::<B>()?,
            e_phnum: cur.read_u16::<B>()?,
            e_shentsize: cur.read_u16::<B>()?,
            e_shnum: cur.read_u16::<B>()?,
            e_shstrndx: cur.read_u16::<B>()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let is_64 = self.is_64();
        if self.e_version != EV_CURRENT as u32 {
            bail!("invalid version {}", self.e_version);
        }
        if self.e_ehsize != Self::header_size(is_64) {
            bail!("header size {} does not match class", self.e_ehsize);
        }
        if self.e_phnum > 0 && self.e_phentsize != Self::program_header_size(is_64) {
            bail!("program header entry size {} does not match class", self.e_phentsize);
        }
        if self.e_shnum > 0 && self.e_shentsize != Self::section_header_size(is_64) {
            bail!("section header entry size {} does not match class", self.e_shentsize);
        }
        Ok(())
    }
}

impl Header for ElfHeader {
    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn is_64(&self) -> bool {
        self.e_ident[EI_CLASS] == ELFCLASS64
    }

    fn is_big_endian(&self) -> bool {
        self.e_ident[EI_DATA] == ELFDATA2MSB
    }

    fn format_name(&self) -> &'static str {
        "ELF"
    }
}
