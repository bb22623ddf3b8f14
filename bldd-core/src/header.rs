pub mod elf;

use crate::arch::ArchitectureKind;
use crate::error::SkipReason;

pub trait Header: std::fmt::Debug + Send + Sync {
    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    /// Returns true if this is a 64-bit binary.
    fn is_64(&self) -> bool;

    /// Returns true if multi-byte fields are stored big-endian.
    fn is_big_endian(&self) -> bool;

    /// Returns a short human-readable name, e.g. "ELF".
    fn format_name(&self) -> &'static str;

    /// Maps the machine field onto the architectures the report covers.
    fn architecture(&self) -> Result<ArchitectureKind, SkipReason> {
        let machine = self.machine();
        ArchitectureKind::from_machine(machine).ok_or(SkipReason::UnsupportedArchitecture(machine))
    }
}
