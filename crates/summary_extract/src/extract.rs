use tracing::{debug, trace};

use crate::config::ExtractConfig;
use crate::dialect::{Dialect, DialectParser, Diagnostics, SelectionPolicy};
use crate::lines::JsonLines;
use crate::summary::Summary;

/// Runs one dialect parser over captured output.
///
/// Each call starts from a reset parser, so extracting the same output twice
/// gives the same answer.
pub struct SummaryExtractor<P: DialectParser> {
    parser: P,
    config: ExtractConfig,
}

impl<P: DialectParser> SummaryExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, ExtractConfig::default())
    }

    pub fn with_config(parser: P, config: ExtractConfig) -> Self {
        Self { parser, config }
    }

    pub fn extract(&mut self, raw: &str) -> Option<Summary> {
        run(&mut self.parser, raw, &mut self.config)
    }
}

/// Extracts the summary of one agent run, or `None` when there is none.
pub fn extract(dialect: Dialect, raw: &str) -> Option<Summary> {
    extract_with_config(dialect, raw, &mut ExtractConfig::default())
}

pub fn extract_with_config(
    dialect: Dialect,
    raw: &str,
    config: &mut ExtractConfig,
) -> Option<Summary> {
    let mut parser = dialect.parser();
    run(parser.as_mut(), raw, config)
}

fn run<P: DialectParser + ?Sized>(
    parser: &mut P,
    raw: &str,
    config: &mut ExtractConfig,
) -> Option<Summary> {
    parser.reset();
    let dialect = parser.name();
    let limits = config.limits;
    let mut diag = Diagnostics::new(dialect, config.skip_sink.as_deref_mut());

    if let Some(summary) = parser.parse_blob(raw, &mut diag) {
        debug!(dialect, source = "blob", "summary accepted");
        return Some(summary);
    }

    if parser.walks_lines() {
        let policy = parser.policy();
        let mut best = None;

        for record in JsonLines::new(raw, limits) {
            let line_number = record.line_number;
            let event = match record.outcome {
                Ok(event) => event,
                Err(reason) => {
                    diag.skip(Some(line_number), reason);
                    continue;
                }
            };
            trace!(dialect, line_number, "scanning line");

            let Some(summary) = parser.parse_line(line_number, event, &mut diag) else {
                continue;
            };
            match policy {
                SelectionPolicy::FirstWins => {
                    debug!(dialect, source = "line", line_number, "summary accepted");
                    return Some(summary);
                }
                SelectionPolicy::LastWins => {
                    debug!(dialect, line_number, "summary candidate recorded");
                    best = Some(summary);
                }
            }
        }

        if best.is_some() {
            debug!(dialect, source = "line", "summary accepted");
            return best;
        }
    }

    let fallback = parser.finish(&mut diag);
    if fallback.is_some() {
        debug!(dialect, source = "fallback", "summary accepted");
    } else {
        debug!(dialect, "no summary found");
    }
    fallback
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::dialect::StreamJsonParser;
    use crate::error::{SkipDetail, SkipReason, SkipSink};

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<SkipDetail>>>);

    impl SkipSink for Collect {
        fn on_skip(&mut self, detail: SkipDetail) {
            self.0.lock().unwrap().push(detail);
        }
    }

    #[test]
    fn extractor_is_repeatable() {
        let raw = "{\"type\":\"assistant_message\",\"content\":\"Summary: {\\\"summary\\\":\\\"done\\\"}\"}\n";
        let mut extractor = SummaryExtractor::new(StreamJsonParser::new());

        let first = extractor.extract(raw);
        let second = extractor.extract(raw);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn skipped_lines_reach_the_sink() {
        let sink = Collect::default();
        let mut config = ExtractConfig::default().with_skip_sink(sink.clone());
        let raw = "not json\n\n{\"type\":\"ping\"}\n";

        assert!(extract_with_config(Dialect::Ndjson, raw, &mut config).is_none());

        let skipped = sink.0.lock().unwrap().clone();
        assert_eq!(
            skipped,
            vec![
                SkipDetail {
                    dialect: "ndjson",
                    line_number: Some(1),
                    reason: SkipReason::JsonParse,
                },
                SkipDetail {
                    dialect: "ndjson",
                    line_number: Some(3),
                    reason: SkipReason::NoSummaryFields,
                },
            ]
        );
    }
}
