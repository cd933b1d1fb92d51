// Domain models: per-unit readings and bar-protocol blocks

mod block;
mod reading;

pub use block::{Align, Block, Header};
pub use reading::{
    CpuLoad, DiskRates, FreeSpace, InterfaceRate, MemoryUsage, Reading, ScalarValue, VolumeState,
    WindowState,
};
