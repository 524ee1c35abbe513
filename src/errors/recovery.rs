// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest breaking a cycle that a proposed connection would close
    pub fn fix_circular_dependency(path: &[String]) -> Self {
        Self {
            action: "Choose a different connection".into(),
            steps: vec![
                format!("Existing path: {}", path.join(" → ")),
                "Connecting the last step back to the first would close a loop".into(),
                "Remove one of the connections on the path, or connect in the other direction"
                    .into(),
            ],
            commands: vec![
                "# Visualize your pipeline:".into(),
                "stepgraph graph <pipeline> --format mermaid".into(),
            ],
        }
    }

    /// Suggest checking a step id
    pub fn unknown_step(step: &str) -> Self {
        Self {
            action: format!("Check the step id '{}'", step),
            steps: vec![
                "Step ids are the keys of the 'steps' mapping in the pipeline file".into(),
                "Ids are case-sensitive".into(),
            ],
            commands: vec![
                "# List steps in execution order:".into(),
                "stepgraph graph <pipeline>".into(),
            ],
        }
    }

    /// Suggest repairing a pipeline file that failed validation
    pub fn invalid_pipeline(reason: &str) -> Self {
        Self {
            action: "Repair the pipeline file".into(),
            steps: vec![
                reason.to_string(),
                "Every incoming connection must name an existing step".into(),
                "A step must not list itself as an incoming connection".into(),
            ],
            commands: vec![
                "# Show every problem at once:".into(),
                "stepgraph validate <pipeline>".into(),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_commands() {
        let suggestion = RecoverySuggestion::unknown_step("load");
        let text = suggestion.to_string();

        assert!(text.starts_with("→ Check the step id 'load'"));
        assert!(text.contains("stepgraph graph <pipeline>"));
    }
}
