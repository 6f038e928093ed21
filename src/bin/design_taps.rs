use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use tilefir::design::{half_band, half_band_unique, lowpass_prototype, quantize};

#[derive(Parser, Debug)]
#[command(name = "design_taps")]
#[command(about = "Design interpolation filter coefficients and print them as a TOML [filter] fragment")]
struct Args {
    /// Number of taps (a multiple of the factor, or 4n - 1 for half-band)
    #[arg(short, long)]
    taps: usize,

    /// Interpolation factor
    #[arg(short, long, default_value_t = 2)]
    factor: usize,

    /// Design a half-band filter and print its unique coefficients
    #[arg(long)]
    half_band: bool,

    /// Transition width as a fraction of the output sample rate
    /// (default: 0.2 / factor)
    #[arg(long)]
    transition: Option<f64>,

    /// Fractional bits of the quantized coefficients
    #[arg(short = 'b', long, default_value_t = 14)]
    frac_bits: u32,

    /// Print unquantized floating-point coefficients
    #[arg(long)]
    float: bool,
}

#[derive(Serialize)]
struct Fragment<T> {
    family: &'static str,
    fir_len: usize,
    interpolate_factor: usize,
    shift: u32,
    taps: Vec<T>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let factor = if args.half_band { 2 } else { args.factor };
    let transition = args.transition.unwrap_or(0.2 / factor as f64);

    let full = if args.half_band {
        half_band(args.taps, transition)?
    } else {
        lowpass_prototype(args.taps, factor, transition)?
    };
    let taps = if args.half_band {
        half_band_unique(&full)
    } else {
        full
    };
    let family = if args.half_band {
        "half_band"
    } else {
        "asymmetric"
    };
    log::info!(
        "designed {} filter: {} taps, factor {}, transition {}",
        family,
        args.taps,
        factor,
        transition
    );

    let serialized = if args.float {
        toml::to_string(&Fragment {
            family,
            fir_len: args.taps,
            interpolate_factor: factor,
            shift: 0,
            taps,
        })
    } else {
        toml::to_string(&Fragment {
            family,
            fir_len: args.taps,
            interpolate_factor: factor,
            shift: args.frac_bits,
            taps: quantize(&taps, args.frac_bits),
        })
    };
    let text = serialized.context("Failed to serialize coefficients")?;

    println!("[filter]");
    print!("{}", text);
    Ok(())
}
