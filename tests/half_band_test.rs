mod test_pipelines;

use tilefir::arith::{CInt16, Coefficient, Sample};
use tilefir::config::{ElementType, FilterSpec, IoMode};
use tilefir::fir::expand_half_band;
use tilefir::graph::PipelineBuilder;
use tilefir::simulation::{create_rng, random_taps};
use test_pipelines::run::{random_blocks, run_reference, run_sync};

const WINDOW: usize = 32;

/// Half-band pipelines against the asymmetric pipeline over the expanded
/// taps, padded with one trailing zero to a whole number of phases
fn check_against_expanded<D: Sample, C: Coefficient<D>>(
    data: ElementType,
    coeff: ElementType,
    fir_len: usize,
    max_stages: usize,
    io_mode: IoMode,
) {
    let spec = FilterSpec::half_band(data, coeff, fir_len, WINDOW).with_shift(12);
    let unique: Vec<C> = random_taps(&mut create_rng(Some(fir_len as u64)), spec.coefficient_count(), 3000.0);
    let blocks: Vec<Vec<D>> = random_blocks(17, 4, WINDOW, 12000.0);

    let mut full = expand_half_band(&unique, fir_len);
    full.push(C::default());
    let asym_spec = FilterSpec::asymmetric(data, coeff, fir_len + 1, 2, WINDOW).with_shift(12);
    let expected = run_sync(
        PipelineBuilder::<D, C>::new(asym_spec).coefficients(&full),
        &blocks,
    );
    assert_eq!(expected, run_reference(&spec, &unique, &blocks));

    for stages in 1..=max_stages {
        let actual = run_sync(
            PipelineBuilder::<D, C>::new(spec.clone())
                .stages(stages)
                .io_mode(io_mode)
                .coefficients(&unique),
            &blocks,
        );
        assert_eq!(actual, expected, "{} taps, {} stages, {:?}", fir_len, stages, io_mode);
    }
}

#[test]
fn test_half_band_matches_expanded_filter() {
    for fir_len in [3, 7, 11, 23, 31] {
        let pairs = (fir_len + 1) / 4;
        check_against_expanded::<i16, i16>(
            ElementType::Int16,
            ElementType::Int16,
            fir_len,
            pairs.min(4),
            IoMode::Window,
        );
    }
}

#[test]
fn test_half_band_stream() {
    check_against_expanded::<i16, i16>(ElementType::Int16, ElementType::Int16, 31, 4, IoMode::Stream);
}

#[test]
fn test_half_band_complex() {
    check_against_expanded::<CInt16, i16>(ElementType::Cint16, ElementType::Int16, 23, 3, IoMode::Window);
    check_against_expanded::<CInt16, CInt16>(
        ElementType::Cint16,
        ElementType::Cint16,
        15,
        2,
        IoMode::Window,
    );
}

#[test]
fn test_centre_tap_on_odd_outputs() {
    // Only the centre tap: odd outputs copy the input, even ones stay zero.
    let spec = FilterSpec::half_band(ElementType::Int16, ElementType::Int16, 7, 16);
    let mut pipeline = PipelineBuilder::<i16, i16>::new(spec)
        .stages(2)
        .coefficients(&[0, 0, 1])
        .build()
        .unwrap();
    let block: Vec<i16> = (1..=16).collect();
    let out = pipeline.process(&block).unwrap().primary;
    for (n, pair) in out.chunks(2).enumerate() {
        assert_eq!(pair[0], 0);
        // centre sits (7 - 1) / 2 taps in, one input sample behind
        let expected = if n >= 1 { block[n - 1] } else { 0 };
        assert_eq!(pair[1], expected, "output pair {}", n);
    }
}

#[test]
fn test_half_band_rejects_bad_length() {
    for fir_len in [5, 9, 13] {
        let spec = FilterSpec::half_band(ElementType::Int16, ElementType::Int16, fir_len, 16);
        let count = (fir_len + 1) / 4 + 1;
        let err = PipelineBuilder::<i16, i16>::new(spec)
            .coefficients(&vec![1; count])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, tilefir::FirError::TapLength { .. }), "{}", err);
    }
}
