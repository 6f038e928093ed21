use super::split_streams;
use crate::arith::Element;
use crate::config::IoMode;

/// Output of one block at the external ports
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput<D> {
    pub primary: Vec<D>,
    /// Second port, present for dual-output pipelines
    pub secondary: Option<Vec<D>>,
}

/// Routes the last stage's samples to one or two ports
///
/// Window pipelines duplicate the block on the second port. Stream
/// pipelines split it into two interleaved streams instead.
#[derive(Debug, Clone, Copy)]
pub struct OutputSink {
    outputs: usize,
    io_mode: IoMode,
}

impl OutputSink {
    pub fn new(outputs: usize, io_mode: IoMode) -> Self {
        Self { outputs, io_mode }
    }

    pub fn emit<D: Element>(&self, samples: Vec<D>) -> PipelineOutput<D> {
        if self.outputs < 2 {
            return PipelineOutput {
                primary: samples,
                secondary: None,
            };
        }
        match self.io_mode {
            IoMode::Window => PipelineOutput {
                secondary: Some(samples.clone()),
                primary: samples,
            },
            IoMode::Stream => {
                let (primary, secondary) = split_streams(&samples);
                PipelineOutput {
                    primary,
                    secondary: Some(secondary),
                }
            }
        }
    }
}

impl<D: Element> PipelineOutput<D> {
    /// The block as one sequence regardless of port layout
    pub fn merged(&self, io_mode: IoMode) -> Vec<D> {
        match (&self.secondary, io_mode) {
            (Some(second), IoMode::Stream) => super::merge_streams(&self.primary, second),
            _ => self.primary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_output() {
        let sink = OutputSink::new(1, IoMode::Stream);
        let out = sink.emit(vec![1i16, 2, 3]);
        assert_eq!(out.primary, vec![1, 2, 3]);
        assert!(out.secondary.is_none());
    }

    #[test]
    fn test_window_dual_output_duplicates() {
        let sink = OutputSink::new(2, IoMode::Window);
        let out = sink.emit(vec![1i16, 2, 3]);
        assert_eq!(out.secondary.as_deref(), Some(&[1i16, 2, 3][..]));
    }

    #[test]
    fn test_stream_dual_output_interleaves() {
        let sink = OutputSink::new(2, IoMode::Stream);
        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let out = sink.emit(samples.clone());
        assert_eq!(out.primary, vec![0.0, 1.0, 2.0, 3.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(out.merged(IoMode::Stream), samples);
    }
}
