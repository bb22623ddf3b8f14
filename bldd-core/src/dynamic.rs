use crate::error::SkipReason;
use goblin::container::Ctx;
use goblin::elf::dynamic::{Dynamic, DT_NEEDED, DT_STRSZ, DT_STRTAB};
use goblin::elf::program_header::{ProgramHeader, PT_LOAD};

fn corrupt(msg: impl Into<String>) -> SkipReason {
    SkipReason::DependencySectionCorrupt(msg.into())
}

/// Translates a virtual address to a file offset through the `PT_LOAD` segments.
fn vm_to_offset(program_headers: &[ProgramHeader], addr: u64) -> Option<u64> {
    program_headers
        .iter()
        .filter(|ph| ph.p_type == PT_LOAD)
        .find(|ph| addr >= ph.p_vaddr && addr - ph.p_vaddr < ph.p_filesz)
        .and_then(|ph| (addr - ph.p_vaddr).checked_add(ph.p_offset))
}

/// Reads the NUL-terminated name at `offset` of a string table.
///
/// Names are decoded lossily; other strings in the table are never looked at.
fn name_at(strtab: &[u8], offset: u64) -> Option<String> {
    let start = usize::try_from(offset).ok().filter(|&off| off < strtab.len())?;
    let len = strtab[start..].iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&strtab[start..start + len]).into_owned())
}

/// Returns the `DT_NEEDED` names of an ELF image in table order.
///
/// An image without a `PT_DYNAMIC` segment is statically linked and has no
/// dependencies. A dynamic table that cannot be read, or that points outside
/// its string table, is reported as corrupt.
pub fn needed_libraries(
    bytes: &[u8],
    program_headers: &[ProgramHeader],
    ctx: Ctx,
) -> Result<Vec<String>, SkipReason> {
    let dynamic = match Dynamic::parse(bytes, program_headers, ctx) {
        Ok(Some(dynamic)) => dynamic,
        Ok(None) => return Ok(Vec::new()),
        Err(err) => return Err(corrupt(format!("unreadable dynamic table: {err}"))),
    };

    let mut needed = Vec::new();
    let mut strtab_addr = None;
    let mut strsz = None;
    for entry in &dynamic.dyns {
        match entry.d_tag {
            DT_NEEDED => needed.push(entry.d_val),
            DT_STRTAB => strtab_addr = Some(entry.d_val),
            DT_STRSZ => strsz = Some(entry.d_val),
            _ => {}
        }
    }
    if needed.is_empty() {
        return Ok(Vec::new());
    }

    let (Some(strtab_addr), Some(strsz)) = (strtab_addr, strsz) else {
        return Err(corrupt("DT_NEEDED without DT_STRTAB/DT_STRSZ"));
    };
    let strtab_off = vm_to_offset(program_headers, strtab_addr)
        .ok_or_else(|| corrupt(format!("DT_STRTAB {strtab_addr:#x} is not mapped")))?;
    let strtab = strtab_off
        .checked_add(strsz)
        .and_then(|end| {
            let start = usize::try_from(strtab_off).ok()?;
            let end = usize::try_from(end).ok()?;
            bytes.get(start..end)
        })
        .ok_or_else(|| {
            corrupt(format!(
                "string table {strtab_off:#x}+{strsz:#x} outside the file"
            ))
        })?;

    needed
        .into_iter()
        .map(|name_off| {
            name_at(strtab, name_off)
                .ok_or_else(|| corrupt(format!("DT_NEEDED offset {name_off:#x} out of bounds")))
        })
        .collect()
}
