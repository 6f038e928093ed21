use tilefir::arith::{Coefficient, Element, Sample};
use tilefir::config::FilterSpec;
use tilefir::graph::PipelineBuilder;
use tilefir::reference::ReferenceInterpolator;
use tilefir::simulation::{create_rng, random_block};

/// `count` seeded random blocks of `len` samples
#[allow(dead_code)]
pub fn random_blocks<D: Element>(seed: u64, count: usize, len: usize, amplitude: f64) -> Vec<Vec<D>> {
    let mut rng = create_rng(Some(seed));
    (0..count)
        .map(|_| random_block(&mut rng, len, amplitude))
        .collect()
}

/// Run `blocks` through a synchronous pipeline, returning each merged output
#[allow(dead_code)]
pub fn run_sync<D: Sample, C: Coefficient<D>>(
    builder: PipelineBuilder<D, C>,
    blocks: &[Vec<D>],
) -> Vec<Vec<D>> {
    let mut pipeline = builder.build().expect("pipeline should build");
    let io_mode = pipeline.options().io_mode;
    blocks
        .iter()
        .map(|b| pipeline.process(b).expect("block should process").merged(io_mode))
        .collect()
}

/// Run `blocks` through a threaded pipeline, submitting ahead of receiving
#[allow(dead_code)]
pub fn run_threaded<D: Sample, C: Coefficient<D>>(
    builder: PipelineBuilder<D, C>,
    blocks: &[Vec<D>],
    io_mode: tilefir::config::IoMode,
) -> Vec<Vec<D>> {
    let mut pipeline = builder.build_threaded().expect("pipeline should build");
    let mut outputs = Vec::new();
    for (i, b) in blocks.iter().enumerate() {
        pipeline.submit(b).expect("submit");
        if i >= 1 {
            outputs.push(pipeline.recv().expect("recv").merged(io_mode));
        }
    }
    while outputs.len() < blocks.len() {
        outputs.push(pipeline.recv().expect("recv").merged(io_mode));
    }
    pipeline.finish().expect("clean shutdown");
    outputs
}

/// Direct-form model output for `blocks`
#[allow(dead_code)]
pub fn run_reference<D: Sample, C: Coefficient<D>>(
    spec: &FilterSpec,
    coefficients: &[C],
    blocks: &[Vec<D>],
) -> Vec<Vec<D>> {
    let mut model =
        ReferenceInterpolator::<D, C>::from_spec(spec, coefficients).expect("model should build");
    blocks.iter().map(|b| model.process_block(b)).collect()
}
