mod builder;
mod links;
mod pipeline;
mod threaded;

pub use builder::PipelineBuilder;
pub use links::{CoefficientLink, ExternalLinks, SampleLink, StageLinks, wire};
pub use pipeline::Pipeline;
pub use threaded::ThreadedPipeline;
