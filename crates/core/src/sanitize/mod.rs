//! Agent output sanitization.
//!
//! Raw agent output is console text: colour codes, panel borders, library log
//! lines and the user's own question echoed back. Sanitization is an ordered
//! list of [`SanitizeStage`]s run by a [`SanitizePipeline`]:
//!
//! 1. `strip_ansi` - terminal escape sequences
//! 2. `strip_box_drawing` - U+2500..=U+257F
//! 3. `strip_control_chars` - control and format characters except tab
//! 4. `trim_lines` - trims, drops blank lines
//! 5. `drop_log_lines` - `INFO`/`DEBUG`/`WARNING`/`ERROR`/`TRACE` and setup notices
//! 6. `drop_query_echoes` - leading placeholder and echo lines
//!
//! The pipeline never fails and is idempotent. [`ResponseCleaner`] is the
//! second pass applied before extraction and gating.

mod cleaner;
mod pipeline;
mod stages;

pub use cleaner::{ResponseCleaner, EMPTY_RESPONSE_PLACEHOLDER, MIN_CLEANED_CHARS};
pub use pipeline::{SanitizePipeline, SanitizeStage, StageContext};
pub use stages::{
    normalize_line, DropLogLines, DropMarkerLines, DropQueryEchoes, StripAnsi, StripBoxDrawing,
    StripControlChars, StripQueryPrefix, TrimLines,
};

pub fn sanitize_agent_output(raw: &str, query: &str) -> String {
    SanitizePipeline::agent_output().run(raw, query)
}
