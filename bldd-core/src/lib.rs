pub mod aggregate;
pub mod arch;
pub mod binary;
pub mod detect;
pub mod dynamic;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
mod header;
pub mod report;
pub mod scan;

pub use aggregate::*;
pub use arch::*;
pub use binary::*;
pub use error::*;
pub use header::elf::ElfHeader;
pub use header::Header;
pub use report::*;
pub use scan::*;
