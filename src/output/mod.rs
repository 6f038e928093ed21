mod csv;
mod json;
mod text;

use serde::Serialize;

use crate::arith::Element;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One output port's samples for one block
#[derive(Debug, Clone, Serialize)]
pub struct BlockOutput {
    pub block: usize,
    pub port: usize,
    pub re: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub im: Option<Vec<f64>>,
    /// Samples differing from the reference model, when verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatches: Option<usize>,
}

impl BlockOutput {
    pub fn new<D: Element>(block: usize, port: usize, samples: &[D]) -> Self {
        let (re, im): (Vec<f64>, Vec<f64>) = samples.iter().map(|s| s.to_parts()).unzip();
        Self {
            block,
            port,
            re,
            im: D::ELEMENT.is_complex().then_some(im),
            mismatches: None,
        }
    }

    pub fn with_mismatches(mut self, mismatches: usize) -> Self {
        self.mismatches = Some(mismatches);
        self
    }

    pub fn len(&self) -> usize {
        self.re.len()
    }

    pub fn is_empty(&self) -> bool {
        self.re.is_empty()
    }
}

pub trait Formatter: Send {
    fn format(&self, output: &BlockOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}
