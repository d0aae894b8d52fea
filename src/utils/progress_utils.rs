use indicatif::ProgressStyle;
use tracing::{info_span, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>2}/{len:2} {msg}";

pub fn progress_style() -> Option<ProgressStyle> {
    ProgressStyle::with_template(TEMPLATE)
        .ok()
        .map(|style| style.progress_chars("##-"))
}

/// Span drawn as a progress bar by the `IndicatifLayer` while it is entered,
/// so log lines print above it instead of through it.
pub fn progress_span(len: u64, msg: &str) -> Span {
    let span = info_span!("refresh", phase = msg);
    if let Some(style) = progress_style() {
        span.pb_set_style(&style);
    }
    span.pb_set_length(len);
    span.pb_set_message(msg);
    span
}
