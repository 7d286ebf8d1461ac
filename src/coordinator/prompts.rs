// Prompt templates for execution requests
//
// Templates are versioned so recorded collaboration logs can be traced back
// to the exact wording that produced them.

use std::collections::HashMap;

/// Prompt template structure
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub system: String,
    pub user_template: String,
}

impl PromptTemplate {
    /// Render the user template, replacing every `{{key}}` with its value
    ///
    /// Placeholders without a value are left untouched.
    pub fn render(&self, variables: &HashMap<&str, String>) -> String {
        let mut rendered = String::with_capacity(self.user_template.len());
        let mut rest = self.user_template.as_str();

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    match variables.get(key) {
                        Some(value) => rendered.push_str(value),
                        None => rendered.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    rendered.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        rendered.push_str(rest);
        rendered
    }

    /// System preamble followed by the rendered user template
    pub fn render_full(&self, variables: &HashMap<&str, String>) -> String {
        format!("{}\n\n{}", self.system, self.render(variables))
    }
}

pub mod library {
    use super::PromptTemplate;

    /// Variables: `title`, `description`, `roster`
    pub fn task_decomposition() -> PromptTemplate {
        PromptTemplate {
            name: "task_decomposition".to_string(),
            version: "1.0.0".to_string(),
            system: "As the coordinating agent, decompose this task into subtasks for the available agents."
                .to_string(),
            user_template: "Task: {{title}}\n\
                            {{description}}\n\n\
                            Available agents:\n\
                            {{roster}}\n\n\
                            List one subtask per line, each starting with \"-\" or a number. \
                            Put any details for a subtask on the lines below it."
                .to_string(),
        }
    }

    /// Variables: `description`, `details`, `role`
    pub fn subtask_execution() -> PromptTemplate {
        PromptTemplate {
            name: "subtask_execution".to_string(),
            version: "1.0.0".to_string(),
            system: "You are one member of a team working on a larger task.".to_string(),
            user_template: "Execute this subtask as the team's {{role}}: {{description}}. {{details}}"
                .to_string(),
        }
    }

    /// Variables: `description`, `results`
    pub fn result_integration() -> PromptTemplate {
        PromptTemplate {
            name: "result_integration".to_string(),
            version: "1.0.0".to_string(),
            system: "Integrate the subtask results into a final solution for the original task."
                .to_string(),
            user_template: "Original task: {{description}}\n\n\
                            Subtask results (some may have failed):\n\
                            {{results}}"
                .to_string(),
        }
    }
}
