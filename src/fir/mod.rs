pub mod arch;
mod descriptor;
pub mod partition;
mod register;
mod reload;
mod stage;
mod taps;

pub use arch::BufferArch;
pub use descriptor::{CascadePosition, StageDescriptor, describe};
pub use partition::{TapRange, fir_margin, fir_range, fir_range_offset, fir_range_rem};
pub use register::{DataRegister, Sweep};
pub use reload::{ReloadPhase, ReloadState, ReloadToken};
pub use stage::{CascadePacket, Stage, StageInput, StageOutput, StageStats};
pub use taps::{TapTable, expand_half_band, half_band_unique};
