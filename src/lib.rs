pub mod arith;
pub mod config;
pub mod constants;
pub mod design;
pub mod error;
pub mod fir;
pub mod graph;
pub mod io;
pub mod output;
pub mod reference;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{FilterSpec, PipelineConfig, PipelineOptions, PlatformConfig};
pub use error::{FirError, Result};
pub use graph::{Pipeline, PipelineBuilder, ThreadedPipeline};
pub use reference::ReferenceInterpolator;
