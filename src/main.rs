use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use log::info;

use tilefir::arith::{CFloat, CInt16, CInt32, Coefficient, Element, Sample};
use tilefir::config::{ElementType, PipelineConfig};
use tilefir::fir::StageStats;
use tilefir::io::{PipelineOutput, Stimulus};
use tilefir::output::{BlockOutput, Formatter, OutputFormat, create_formatter};
use tilefir::{Pipeline, PipelineBuilder, ReferenceInterpolator, ThreadedPipeline};

#[derive(Parser, Debug)]
#[command(name = "tilefir")]
#[command(about = "Run a cascaded interpolating FIR pipeline over test stimulus", long_about = None)]
struct Args {
    /// Pipeline configuration file (TOML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Number of blocks to process
    #[arg(short = 'n', long, default_value = "4")]
    blocks: usize,

    /// Input stimulus: impulse, step, ramp
    #[arg(short = 's', long, value_enum, default_value = "impulse")]
    stimulus: Stimulus,

    /// Stimulus amplitude (default: a quarter of full scale, 1.0 for float)
    #[arg(short = 'a', long)]
    amplitude: Option<f64>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Override the configured stage count
    #[arg(long)]
    stages: Option<usize>,

    /// Compare every block against the direct-form reference model
    #[arg(long)]
    verify: bool,

    /// Run each stage on its own thread
    #[arg(long)]
    threaded: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = PipelineConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(stages) = args.stages {
        config.pipeline.stages = stages;
    }

    use ElementType::*;
    match (config.filter.data_type, config.filter.coeff_type) {
        (Int16, Int16) => run::<i16, i16>(&args, &config),
        (Int32, Int16) => run::<i32, i16>(&args, &config),
        (Int32, Int32) => run::<i32, i32>(&args, &config),
        (Cint16, Int16) => run::<CInt16, i16>(&args, &config),
        (Cint16, Cint16) => run::<CInt16, CInt16>(&args, &config),
        (Cint32, Int16) => run::<CInt32, i16>(&args, &config),
        (Cint32, Int32) => run::<CInt32, i32>(&args, &config),
        (Cint32, Cint16) => run::<CInt32, CInt16>(&args, &config),
        (Cint32, Cint32) => run::<CInt32, CInt32>(&args, &config),
        (Float, Float) => run::<f32, f32>(&args, &config),
        (Cfloat, Float) => run::<CFloat, f32>(&args, &config),
        (Cfloat, Cfloat) => run::<CFloat, CFloat>(&args, &config),
        (data, coeff) => bail!("unsupported type combination: {} data with {} coefficients", data, coeff),
    }
}

enum Runner<D: Sample, C: Coefficient<D>> {
    Sync(Pipeline<D, C>),
    Threaded(ThreadedPipeline<D, C>),
}

struct Report<'a, D: Sample, C: Coefficient<D>> {
    formatter: Box<dyn Formatter>,
    reference: Option<ReferenceInterpolator<D, C>>,
    inputs: std::collections::VecDeque<Vec<D>>,
    config: &'a PipelineConfig,
    failed_blocks: usize,
}

impl<D: Sample, C: Coefficient<D>> Report<'_, D, C> {
    fn emit(&mut self, index: usize, output: &PipelineOutput<D>) -> anyhow::Result<()> {
        let input = self
            .inputs
            .pop_front()
            .context("output without a matching input block")?;
        let mismatches = match &mut self.reference {
            Some(model) => {
                let expected = model.process_block(&input);
                let actual = output.merged(self.config.pipeline.io_mode);
                let count = count_mismatches(&expected, &actual);
                if count > 0 {
                    self.failed_blocks += 1;
                }
                Some(count)
            }
            None => None,
        };

        let ports = std::iter::once(&output.primary).chain(output.secondary.as_ref());
        for (port, samples) in ports.enumerate() {
            let mut record = BlockOutput::new(index, port, samples);
            if let Some(m) = mismatches {
                record = record.with_mismatches(m);
            }
            println!("{}", self.formatter.format(&record));
        }
        Ok(())
    }
}

fn run<D: Sample, C: Coefficient<D>>(args: &Args, config: &PipelineConfig) -> anyhow::Result<()> {
    let spec = config.filter_spec();
    spec.validate(&config.platform)?;
    let taps: Vec<C> = config
        .filter
        .taps
        .iter()
        .map(|v| {
            let (re, im) = v.parts();
            C::from_parts(re, im)
        })
        .collect();
    let amplitude = args
        .amplitude
        .unwrap_or_else(|| default_amplitude(spec.data_type));

    let reference = if args.verify {
        Some(ReferenceInterpolator::<D, C>::from_spec(&spec, &taps)?)
    } else {
        None
    };

    let builder = PipelineBuilder::<D, C>::new(spec.clone())
        .options(config.pipeline.clone())
        .platform(config.platform.clone())
        .coefficients(&taps);
    let mut runner = if args.threaded {
        Runner::Threaded(builder.build_threaded()?)
    } else {
        Runner::Sync(builder.build()?)
    };

    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }
    let mut report = Report {
        formatter,
        reference,
        inputs: Default::default(),
        config,
        failed_blocks: 0,
    };

    info!(
        "processing {} block(s) of {:?} stimulus, amplitude {}",
        args.blocks, args.stimulus, amplitude
    );

    let stats = match &mut runner {
        Runner::Sync(pipeline) => {
            for index in 0..args.blocks {
                let block = args.stimulus.block::<D>(index, spec.window_size, amplitude);
                let output = pipeline.process(&block)?;
                report.inputs.push_back(block);
                report.emit(index, &output)?;
            }
            pipeline.stats()
        }
        Runner::Threaded(pipeline) => {
            // Keep at most link_depth blocks in flight.
            let depth = config.pipeline.link_depth.max(1);
            let mut received = 0;
            for index in 0..args.blocks {
                let block = args.stimulus.block::<D>(index, spec.window_size, amplitude);
                pipeline.submit(&block)?;
                report.inputs.push_back(block);
                if index + 1 >= depth {
                    let output = pipeline.recv()?;
                    report.emit(received, &output)?;
                    received += 1;
                }
            }
            while received < args.blocks {
                let output = pipeline.recv()?;
                report.emit(received, &output)?;
                received += 1;
            }
            Vec::new()
        }
    };
    let stats = match runner {
        Runner::Sync(_) => stats,
        Runner::Threaded(pipeline) => pipeline.finish()?,
    };
    print_stats(&stats, args.verbose)?;

    if report.failed_blocks > 0 {
        bail!(
            "{} of {} block(s) differ from the reference model",
            report.failed_blocks,
            args.blocks
        );
    }
    if args.verify {
        info!("all {} block(s) match the reference model", args.blocks);
    }
    Ok(())
}

fn print_stats(stats: &[StageStats], verbose: u8) -> anyhow::Result<()> {
    for (i, s) in stats.iter().enumerate() {
        info!(
            "stage {}: {} call(s), {} vector(s), {} load(s), {} reload(s)",
            i, s.calls, s.vectors, s.loads, s.reloads
        );
    }
    if verbose > 1 {
        let json = serde_json::to_string_pretty(stats).context("Failed to serialize stats")?;
        eprintln!("{}", json);
    }
    Ok(())
}

fn default_amplitude(data: ElementType) -> f64 {
    if data.is_float() {
        1.0
    } else {
        (1u64 << (data.component_bits() - 2)) as f64
    }
}

fn count_mismatches<D: Element>(expected: &[D], actual: &[D]) -> usize {
    if expected.len() != actual.len() {
        return expected.len().max(actual.len());
    }
    expected
        .iter()
        .zip(actual)
        .filter(|(e, a)| {
            if D::ELEMENT.is_float() {
                let (er, ei) = e.to_parts();
                let (ar, ai) = a.to_parts();
                let tol = 1e-4 * er.abs().max(ei.abs()).max(1.0);
                (er - ar).abs() > tol || (ei - ai).abs() > tol
            } else {
                e != a
            }
        })
        .count()
}
