//! Ordered CTE pipeline
//!
//! A pipeline is a list of named stages rendered as one WITH-chain.
//! Stages render strictly in insertion order, which is what makes the
//! policy-before-filter guarantee structural rather than conventional.

/// Stage names used by the composer
pub const DATASET_CTE: &str = "dataset_";
pub const PREFILTER_CTE: &str = "prefilter_";
pub const POLICY_CTE: &str = "policy_";
pub const FILTER_CTE: &str = "filter_";
pub const CONTEXT_CTE: &str = "context_";
pub const PROMPTS_CTE: &str = "prompts_";

/// An ordered chain of named CTE stages
#[derive(Debug, Clone, Default)]
pub struct CtePipeline {
    segments: Vec<String>,
}

impl CtePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named stage
    pub fn stage(mut self, name: &str, body: &str) -> Self {
        self.segments.push(format!("{} AS ({})", name, body));
        self
    }

    /// Append an already-formed CTE segment verbatim
    ///
    /// Used for dataset queries that declare their own `dataset_` CTE
    /// chain; such queries pass through unmodified.
    pub fn raw(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Number of stages in the chain
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the full statement: the WITH-chain plus the final stage
    pub fn render(&self, final_stage: &str) -> String {
        if self.segments.is_empty() {
            return final_stage.to_string();
        }
        format!("WITH {} {}", self.segments.join(", "), final_stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_render_in_insertion_order() {
        let sql = CtePipeline::new()
            .stage("dataset_", "SELECT * FROM t")
            .stage("policy_", "SELECT * FROM dataset_ WHERE TRUE")
            .stage("filter_", "SELECT * FROM policy_ WHERE TRUE")
            .render("SELECT * FROM filter_");

        assert_eq!(
            sql,
            "WITH dataset_ AS (SELECT * FROM t), \
             policy_ AS (SELECT * FROM dataset_ WHERE TRUE), \
             filter_ AS (SELECT * FROM policy_ WHERE TRUE) \
             SELECT * FROM filter_"
        );
    }

    #[test]
    fn test_raw_segment_passes_through() {
        let sql = CtePipeline::new()
            .raw("a AS (SELECT 1), dataset_ AS (SELECT * FROM a)")
            .stage("policy_", "SELECT * FROM dataset_ WHERE TRUE")
            .render("SELECT * FROM policy_");

        assert!(sql.starts_with("WITH a AS (SELECT 1), dataset_ AS"));
    }

    #[test]
    fn test_empty_pipeline_renders_final_stage_only() {
        let sql = CtePipeline::new().render("SELECT 1");
        assert_eq!(sql, "SELECT 1");
    }
}
