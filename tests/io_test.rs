mod test_pipelines;

use tilefir::arith::{CFloat, CInt16};
use tilefir::config::{ElementType, FilterSpec, IoMode};
use tilefir::graph::PipelineBuilder;
use tilefir::io::{Stimulus, merge_streams, split_streams};
use tilefir::simulation::{create_rng, random_taps};
use tilefir::FirError;
use test_pipelines::run::{random_blocks, run_reference, run_sync, run_threaded};

const WINDOW: usize = 32;

fn spec() -> FilterSpec {
    FilterSpec::asymmetric(ElementType::Cint16, ElementType::Int16, 32, 4, WINDOW).with_shift(12)
}

fn taps() -> Vec<i16> {
    random_taps(&mut create_rng(Some(99)), 32, 4000.0)
}

#[test]
fn test_dual_stream_input() {
    let blocks: Vec<Vec<CInt16>> = random_blocks(1, 3, WINDOW, 10000.0);
    let single = run_sync(
        PipelineBuilder::<CInt16, i16>::new(spec())
            .stages(2)
            .io_mode(IoMode::Stream)
            .coefficients(&taps()),
        &blocks,
    );
    let dual = run_sync(
        PipelineBuilder::<CInt16, i16>::new(spec())
            .stages(2)
            .io_mode(IoMode::Stream)
            .dual_input(true)
            .coefficients(&taps()),
        &blocks,
    );
    assert_eq!(dual, single);
    assert_eq!(single, run_reference(&spec(), &taps(), &blocks));
}

#[test]
fn test_dual_output_ports() {
    let block: Vec<CInt16> = Stimulus::Ramp.block(0, WINDOW, 8000.0);

    let mut window = PipelineBuilder::<CInt16, i16>::new(spec())
        .outputs(2)
        .coefficients(&taps())
        .build()
        .unwrap();
    let out = window.process(&block).unwrap();
    assert_eq!(out.secondary.as_ref(), Some(&out.primary));

    let mut stream = PipelineBuilder::<CInt16, i16>::new(spec())
        .outputs(2)
        .io_mode(IoMode::Stream)
        .coefficients(&taps())
        .build()
        .unwrap();
    let out = stream.process(&block).unwrap();
    // cint16 is 4 bytes, so the ports alternate in runs of 4 samples
    let second = out.secondary.clone().unwrap();
    assert_eq!(out.primary.len(), WINDOW * 2);
    assert_eq!(second.len(), WINDOW * 2);
    let merged = out.merged(IoMode::Stream);
    assert_eq!(&merged[..4], &out.primary[..4]);
    assert_eq!(&merged[4..8], &second[..4]);

    // Splitting only changes which port a sample leaves on.
    let mut plain = PipelineBuilder::<CInt16, i16>::new(spec())
        .io_mode(IoMode::Stream)
        .coefficients(&taps())
        .build()
        .unwrap();
    assert_eq!(merged, plain.process(&block).unwrap().primary);
}

#[test]
fn test_split_merge_interleave() {
    let samples: Vec<i16> = (0..32).collect();
    // 16-byte chunks hold 8 i16 samples
    let (a, b) = split_streams(&samples);
    assert_eq!(&a[..8], &samples[..8]);
    assert_eq!(&b[..8], &samples[8..16]);
    assert_eq!(merge_streams(&a, &b), samples);
}

#[test]
fn test_threaded_matches_sync() {
    let blocks: Vec<Vec<CInt16>> = random_blocks(23, 8, WINDOW, 10000.0);
    for stages in [1, 3, 8] {
        let sync = run_sync(
            PipelineBuilder::<CInt16, i16>::new(spec())
                .stages(stages)
                .coefficients(&taps()),
            &blocks,
        );
        let threaded = run_threaded(
            PipelineBuilder::<CInt16, i16>::new(spec())
                .stages(stages)
                .link_depth(2)
                .coefficients(&taps()),
            &blocks,
            IoMode::Window,
        );
        assert_eq!(threaded, sync, "{} stages", stages);
    }

    let float_spec = FilterSpec::asymmetric(ElementType::Cfloat, ElementType::Float, 24, 3, 16);
    let float_taps: Vec<f32> = random_taps(&mut create_rng(Some(5)), 24, 0.5);
    let float_blocks: Vec<Vec<CFloat>> = random_blocks(6, 5, 16, 1.0);
    let sync = run_sync(
        PipelineBuilder::<CFloat, f32>::new(float_spec.clone())
            .stages(4)
            .io_mode(IoMode::Stream)
            .dual_input(true)
            .coefficients(&float_taps),
        &float_blocks,
    );
    let threaded = run_threaded(
        PipelineBuilder::<CFloat, f32>::new(float_spec)
            .stages(4)
            .io_mode(IoMode::Stream)
            .dual_input(true)
            .coefficients(&float_taps),
        &float_blocks,
        IoMode::Stream,
    );
    assert_eq!(threaded, sync);
}

#[test]
fn test_threaded_shutdown_on_drop() {
    let mut pipeline = PipelineBuilder::<CInt16, i16>::new(spec())
        .stages(3)
        .coefficients(&taps())
        .build_threaded()
        .unwrap();
    pipeline.submit(&vec![CInt16::new(1, 1); WINDOW]).unwrap();
    pipeline.submit(&vec![CInt16::new(2, 2); WINDOW]).unwrap();
    // Unreceived outputs are drained and the threads joined.
    drop(pipeline);
}

#[test]
fn test_block_length_checked() {
    let mut pipeline = PipelineBuilder::<CInt16, i16>::new(spec())
        .coefficients(&taps())
        .build()
        .unwrap();
    let err = pipeline.process(&vec![CInt16::default(); WINDOW - 1]).unwrap_err();
    assert!(matches!(
        err,
        FirError::BlockSize {
            expected: WINDOW,
            actual: 31
        }
    ));

    let mut threaded = PipelineBuilder::<CInt16, i16>::new(spec())
        .io_mode(IoMode::Stream)
        .coefficients(&taps())
        .build_threaded()
        .unwrap();
    assert!(matches!(
        threaded.submit(&vec![CInt16::default(); 8]),
        Err(FirError::BlockSize { .. })
    ));
}

#[test]
fn test_dual_input_needs_stream_io() {
    let err = PipelineBuilder::<CInt16, i16>::new(spec())
        .dual_input(true)
        .coefficients(&taps())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FirError::Config(_)));

    let err = PipelineBuilder::<CInt16, i16>::new(spec())
        .outputs(3)
        .coefficients(&taps())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FirError::Config(_)));
}
