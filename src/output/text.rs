use super::{BlockOutput, Formatter};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &BlockOutput) -> String {
        let samples: Vec<String> = match &output.im {
            Some(im) => output
                .re
                .iter()
                .zip(im)
                .map(|(re, im)| format!("({},{})", re, im))
                .collect(),
            None => output.re.iter().map(|re| re.to_string()).collect(),
        };
        let line = format!(
            "block {} out {}: {}",
            output.block,
            output.port,
            samples.join(" ")
        );
        if self.verbose {
            let verify = output
                .mismatches
                .map_or("-".to_string(), |m| m.to_string());
            format!("{} [n: {}, mismatches: {}]", line, output.len(), verify)
        } else {
            line
        }
    }
}
