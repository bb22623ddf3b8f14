use std::io::Read;
use std::path::Path;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Returns true when the first four bytes of `reader` are the ELF magic.
///
/// Short or failing reads count as "not ELF". The reader is left positioned
/// after the magic, so callers must rewind or reopen before parsing.
pub fn is_elf_candidate<R: Read>(reader: &mut R) -> bool {
    let mut magic = [0u8; 4];
    match reader.read_exact(&mut magic) {
        Ok(()) => magic == ELF_MAGIC,
        Err(_) => false,
    }
}

pub fn is_elf_path<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::File::open(path) {
        Ok(mut file) => is_elf_candidate(&mut file),
        Err(_) => false,
    }
}
