pub mod layout;
pub mod maps;
mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use maps::ModuleLocator;
pub use process::*;
pub use reader::{ReadMemory, WriteMemory, dump_c_str, dump_i32, dump_u64, truncate_at_nul};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
