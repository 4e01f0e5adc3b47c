use super::stages::{
    normalize_line, DropLogLines, DropMarkerLines, DropQueryEchoes, StripAnsi, StripBoxDrawing,
    StripControlChars, StripQueryPrefix, TrimLines,
};

/// Per-run inputs shared by every stage.
#[derive(Clone, Debug)]
pub struct StageContext<'a> {
    query: &'a str,
    normalized_query: String,
}

impl<'a> StageContext<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query, normalized_query: normalize_line(query) }
    }

    pub fn query(&self) -> &str {
        self.query
    }

    pub fn normalized_query(&self) -> &str {
        &self.normalized_query
    }
}

/// A stateless transform over line-structured text.
pub trait SanitizeStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, lines: Vec<String>, context: &StageContext<'_>) -> Vec<String>;
}

pub struct SanitizePipeline {
    stages: Vec<Box<dyn SanitizeStage>>,
}

impl SanitizePipeline {
    pub fn new(stages: Vec<Box<dyn SanitizeStage>>) -> Self {
        Self { stages }
    }

    /// Scrubs raw console output captured from the agent.
    pub fn agent_output() -> Self {
        Self::new(vec![
            Box::new(StripAnsi),
            Box::new(StripBoxDrawing),
            Box::new(StripControlChars),
            Box::new(TrimLines),
            Box::new(DropLogLines),
            Box::new(DropQueryEchoes),
        ])
    }

    /// Second pass over already sanitized text: panel markers and query prefixes.
    pub fn response_cleanup() -> Self {
        Self::new(vec![Box::new(TrimLines), Box::new(DropMarkerLines), Box::new(StripQueryPrefix)])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, raw: &str, query: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let context = StageContext::new(query);
        let lines = raw.split('\n').map(str::to_string).collect::<Vec<_>>();
        let lines = self.stages.iter().fold(lines, |lines, stage| stage.apply(lines, &context));

        lines.join("\n").trim().to_string()
    }
}

impl Default for SanitizePipeline {
    fn default() -> Self {
        Self::agent_output()
    }
}

impl std::fmt::Debug for SanitizePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizePipeline").field("stages", &self.stage_names()).finish()
    }
}
