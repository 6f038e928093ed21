use super::{BlockOutput, Formatter};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &BlockOutput) -> String {
        let mut rows = Vec::with_capacity(output.len());
        for (i, re) in output.re.iter().enumerate() {
            let im = output.im.as_ref().map_or(0.0, |im| im[i]);
            rows.push(format!("{},{},{},{},{}", output.block, output.port, i, re, im));
        }
        rows.join("\n")
    }

    fn header(&self) -> Option<&'static str> {
        Some("block,port,index,re,im")
    }
}
