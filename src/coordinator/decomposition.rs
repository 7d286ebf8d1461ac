// Decomposition output parsing
//
// The execution capability answers a decomposition request with free text.
// Turning that text into subtasks is kept behind `SubtaskParser` so the
// heuristics can be swapped without touching the orchestrator.

use crate::domain::agent::Agent;
use crate::domain::collaboration::Subtask;

const FILLER_DETAILS: &str = "Provide assistance and support for the main task";

pub trait SubtaskParser: Send + Sync {
    /// Ordered subtasks found in `text`; may be empty
    fn parse(&self, text: &str) -> Vec<Subtask>;
}

/// Parses bulleted or numbered lists
///
/// A line starting with `-`, `*`, `•`, `N.` or `N)` opens a subtask. Non-empty
/// lines that follow it are appended to its details. Text before the first
/// list item is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListItemParser;

impl ListItemParser {
    fn list_item(line: &str) -> Option<&str> {
        for bullet in ['-', '*', '•'] {
            if let Some(rest) = line.strip_prefix(bullet) {
                return Some(rest.trim());
            }
        }

        let digits = line.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let rest = &line[digits..];
        rest.strip_prefix('.')
            .or_else(|| rest.strip_prefix(')'))
            .map(str::trim)
    }
}

impl SubtaskParser for ListItemParser {
    fn parse(&self, text: &str) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Self::list_item(line) {
                Some(description) if !description.is_empty() => {
                    subtasks.push(Subtask::new(description));
                }
                _ => {
                    if let Some(current) = subtasks.last_mut() {
                        if !current.details.is_empty() {
                            current.details.push(' ');
                        }
                        current.details.push_str(line);
                    }
                }
            }
        }

        subtasks
    }
}

/// Exactly one subtask per helper, in helper order
///
/// Missing subtasks are filled with a support task naming the helper; any
/// extra subtasks are dropped.
pub fn fit_to_helpers(mut subtasks: Vec<Subtask>, helpers: &[Agent]) -> Vec<Subtask> {
    subtasks.truncate(helpers.len());
    for helper in &helpers[subtasks.len()..] {
        subtasks.push(Subtask {
            description: format!("Support task for {}", helper.name),
            details: FILLER_DETAILS.to_string(),
        });
    }
    subtasks
}
