use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of agent kinds known to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Information gathering and analysis
    Research,
    /// Code writing and software development
    Development,
    /// Task automation and scripting
    Automation,
    /// Data analysis and insights
    Analysis,
    /// Email, messaging, social interaction
    Communication,
    /// Content creation, design, writing
    Creative,
    /// System administration and monitoring
    System,
    /// Meta-agent coordinating the others
    Coordination,
}

impl AgentType {
    pub const ALL: [AgentType; 8] = [
        AgentType::Research,
        AgentType::Development,
        AgentType::Automation,
        AgentType::Analysis,
        AgentType::Communication,
        AgentType::Creative,
        AgentType::System,
        AgentType::Coordination,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Research => "research",
            AgentType::Development => "development",
            AgentType::Automation => "automation",
            AgentType::Analysis => "analysis",
            AgentType::Communication => "communication",
            AgentType::Creative => "creative",
            AgentType::System => "system",
            AgentType::Coordination => "coordination",
        }
    }

    /// Role label this agent takes when it joins a collaboration as a helper
    pub fn collaboration_role(&self) -> &'static str {
        match self {
            AgentType::Research => "researcher",
            AgentType::Development => "developer",
            AgentType::Automation => "automator",
            AgentType::Analysis => "analyst",
            AgentType::Communication => "communicator",
            AgentType::Creative => "creative_lead",
            AgentType::System => "system_specialist",
            AgentType::Coordination => "specialist",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown agent type: {}", s))
    }
}

/// Runtime status of an agent
///
/// # Status Transitions
/// ```text
/// Idle -> Assigned -> Working -> Idle
/// ```
/// Release always returns the agent to `Idle`, whatever state it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Assigned,
    Working,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Assigned => "assigned",
            AgentStatus::Working => "working",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AgentStatus::Idle),
            "assigned" => Ok(AgentStatus::Assigned),
            "working" => Ok(AgentStatus::Working),
            other => Err(format!("Unknown agent status: {}", other)),
        }
    }
}
