//! Synthetic ELF images for tests.
//!
//! Images carry a file header, a `PT_LOAD` segment mapping the whole file at
//! virtual address zero, and (unless built as static) a `PT_DYNAMIC` segment
//! whose `DT_NEEDED` entries point into a small `.dynstr`-style string table.
//! Section headers are only emitted on request, and are all `SHT_NULL`.

use crate::header::elf::{ElfHeader, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, EV_CURRENT};
use byteorder::{ByteOrder, WriteBytesExt, BE, LE};
use std::io::{self, Write};

const PT_LOAD: u32 = 1;
const PT_DYNAMIC: u32 = 2;
const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRTAB: u64 = 5;
const DT_STRSZ: u64 = 10;
const ET_EXEC: u16 = 2;

#[derive(Debug, Clone)]
pub struct ElfFixture {
    machine: u16,
    is_64: bool,
    big_endian: bool,
    needed: Option<Vec<String>>,
    dangling_needed: bool,
    extra_dynstr: Vec<u8>,
    shnum: u16,
    shstrndx: u16,
    sections_past_end: bool,
}

impl ElfFixture {
    /// A 64-bit little-endian dynamically linked executable with no
    /// dependencies.
    pub fn new(machine: u16) -> Self {
        Self {
            machine,
            is_64: true,
            big_endian: false,
            needed: Some(Vec::new()),
            dangling_needed: false,
            extra_dynstr: Vec::new(),
            shnum: 0,
            shstrndx: 0,
            sections_past_end: false,
        }
    }

    pub fn elf32(mut self) -> Self {
        self.is_64 = false;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn needs(mut self, libraries: &[&str]) -> Self {
        self.needed = Some(libraries.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Drops the dynamic segment entirely.
    pub fn static_linked(mut self) -> Self {
        self.needed = None;
        self
    }

    /// Appends a `DT_NEEDED` entry whose name offset lies past the string table.
    pub fn dangling_needed(mut self) -> Self {
        self.dangling_needed = true;
        self
    }

    /// Appends an unreferenced string to the dynamic string table.
    pub fn extra_dynstr(mut self, bytes: &[u8]) -> Self {
        self.extra_dynstr = bytes.to_vec();
        self
    }

    /// Emits `count` section headers after the dynamic table.
    pub fn section_headers(mut self, count: u16, shstrndx: u16) -> Self {
        self.shnum = count;
        self.shstrndx = shstrndx;
        self
    }

    /// Points `e_shoff` past the end of the file.
    pub fn sections_past_end(mut self) -> Self {
        self.shnum = self.shnum.max(1);
        self.sections_past_end = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let result = if self.big_endian {
            self.write_image::<BE>()
        } else {
            self.write_image::<LE>()
        };
        result.expect("writing into a Vec cannot fail")
    }

    fn write_image<B: ByteOrder>(&self) -> io::Result<Vec<u8>> {
        let ehsize = ElfHeader::header_size(self.is_64) as u64;
        let phentsize = ElfHeader::program_header_size(self.is_64) as u64;
        let dynent: u64 = if self.is_64 { 16 } else { 8 };
        let phnum: u64 = if self.needed.is_some() { 2 } else { 1 };

        let strtab_off = ehsize + phnum * phentsize;
        let mut strtab = vec![0u8];
        let mut dyns = Vec::new();
        if let Some(needed) = &self.needed {
            for lib in needed {
                dyns.push((DT_NEEDED, strtab.len() as u64));
                strtab.extend_from_slice(lib.as_bytes());
                strtab.push(0);
            }
            if !self.extra_dynstr.is_empty() {
                strtab.extend_from_slice(&self.extra_dynstr);
                strtab.push(0);
            }
            if self.dangling_needed {
                dyns.push((DT_NEEDED, strtab.len() as u64 + 0x100));
            }
            dyns.push((DT_STRTAB, strtab_off));
            dyns.push((DT_STRSZ, strtab.len() as u64));
            dyns.push((DT_NULL, 0));
        } else {
            strtab.clear();
        }

        let dyn_off = (strtab_off + strtab.len() as u64).next_multiple_of(8);
        let dyn_size = dyns.len() as u64 * dynent;
        // A few bytes of "code" so static images are not empty past the headers.
        let body_end = (dyn_off + dyn_size).max(strtab_off + 16);
        let shentsize = ElfHeader::section_header_size(self.is_64) as u64;
        let (shoff, file_len) = if self.sections_past_end {
            (body_end + 0x1000, body_end)
        } else if self.shnum > 0 {
            let shoff = body_end.next_multiple_of(8);
            (shoff, shoff + self.shnum as u64 * shentsize)
        } else {
            (0, body_end)
        };

        let mut out = Vec::with_capacity(file_len as usize);

        let mut e_ident = [0u8; 16];
        e_ident[..4].copy_from_slice(b"\x7fELF");
        e_ident[4] = if self.is_64 { ELFCLASS64 } else { ELFCLASS32 };
        e_ident[5] = if self.big_endian { ELFDATA2MSB } else { ELFDATA2LSB };
        e_ident[6] = EV_CURRENT;
        out.write_all(&e_ident)?;
        out.write_u16::<B>(ET_EXEC)?;
        out.write_u16::<B>(self.machine)?;
        out.write_u32::<B>(EV_CURRENT as u32)?;
        self.write_word::<B>(&mut out, 0)?; // e_entry
        self.write_word::<B>(&mut out, ehsize)?; // e_phoff
        self.write_word::<B>(&mut out, shoff)?;
        out.write_u32::<B>(0)?;
        out.write_u16::<B>(ehsize as u16)?;
        out.write_u16::<B>(phentsize as u16)?;
        out.write_u16::<B>(phnum as u16)?;
        out.write_u16::<B>(shentsize as u16)?;
        out.write_u16::<B>(self.shnum)?;
        out.write_u16::<B>(self.shstrndx)?;

        self.write_phdr::<B>(&mut out, PT_LOAD, 5, 0, file_len, 0x1000)?;
        if self.needed.is_some() {
            self.write_phdr::<B>(&mut out, PT_DYNAMIC, 6, dyn_off, dyn_size, 8)?;
        }

        out.write_all(&strtab)?;
        out.resize(dyn_off as usize, 0);
        for (tag, val) in dyns {
            self.write_word::<B>(&mut out, tag)?;
            self.write_word::<B>(&mut out, val)?;
        }
        out.resize(file_len as usize, 0);
        Ok(out)
    }

    fn write_word<B: ByteOrder>(&self, out: &mut Vec<u8>, value: u64) -> io::Result<()> {
        if self.is_64 {
            out.write_u64::<B>(value)
        } else {
            out.write_u32::<B>(value as u32)
        }
    }

    /// Segment mapped at a virtual address equal to its file offset.
    fn write_phdr<B: ByteOrder>(
        &self,
        out: &mut Vec<u8>,
        p_type: u32,
        p_flags: u32,
        offset: u64,
        size: u64,
        align: u64,
    ) -> io::Result<()> {
        out.write_u32::<B>(p_type)?;
        if self.is_64 {
            out.write_u32::<B>(p_flags)?;
            for value in [offset, offset, offset, size, size, align] {
                out.write_u64::<B>(value)?;
            }
        } else {
            for value in [offset, offset, offset, size, size] {
                out.write_u32::<B>(value as u32)?;
            }
            out.write_u32::<B>(p_flags)?;
            out.write_u32::<B>(align as u32)?;
        }
        Ok(())
    }
}
