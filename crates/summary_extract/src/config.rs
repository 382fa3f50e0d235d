use crate::error::SkipSink;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ExtractLimits {
    /// Lines longer than this are skipped without being decoded.
    pub max_line_bytes: Option<usize>,
}

#[derive(Default)]
pub struct ExtractConfig {
    pub limits: ExtractLimits,
    pub skip_sink: Option<Box<dyn SkipSink>>,
}

impl ExtractConfig {
    pub fn with_skip_sink(mut self, sink: impl SkipSink) -> Self {
        self.skip_sink = Some(Box::new(sink));
        self
    }
}
