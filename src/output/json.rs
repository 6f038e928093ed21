use super::{BlockOutput, Formatter};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, output: &BlockOutput) -> String {
        serde_json::to_string(output).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
