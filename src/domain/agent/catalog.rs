use super::{Agent, AgentType};

/// Id of the catalog agent that coordinates the others
pub const COORDINATION_MASTER: &str = "coordination_master";

/// The fixed set of agents the coordinator starts with
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent::new(
            "research_specialist",
            AgentType::Research,
            "Research Specialist",
            &["web_search", "data_analysis", "summarization", "fact_checking"],
            &["academic_research", "market_research", "technical_documentation"],
        )
        .with_description("Expert in information gathering, analysis, and research tasks")
        .with_execution_hints(&["reasoning", "general"])
        .with_resource_requirements(&[("memory", "medium"), ("processing", "medium")]),
        Agent::new(
            "development_expert",
            AgentType::Development,
            "Development Expert",
            &["code_generation", "debugging", "testing", "architecture_design"],
            &["python", "javascript", "system_programming", "web_development"],
        )
        .with_description("Specialized in software development, coding, and technical tasks")
        .with_execution_hints(&["code", "reasoning"])
        .with_resource_requirements(&[("memory", "high"), ("processing", "high")]),
        Agent::new(
            "automation_engineer",
            AgentType::Automation,
            "Automation Engineer",
            &["script_generation", "workflow_design", "system_integration", "monitoring"],
            &["bash_scripting", "python_automation", "desktop_automation"],
        )
        .with_description("Expert in task automation, scripting, and workflow optimization")
        .with_execution_hints(&["code", "general"])
        .with_resource_requirements(&[("memory", "medium"), ("processing", "medium")]),
        Agent::new(
            "data_analyst",
            AgentType::Analysis,
            "Data Analyst",
            &["data_processing", "statistical_analysis", "visualization", "reporting"],
            &["pandas", "matplotlib", "statistical_modeling", "business_intelligence"],
        )
        .with_description("Specialized in data analysis, visualization, and insights")
        .with_execution_hints(&["reasoning", "code"])
        .with_resource_requirements(&[("memory", "high"), ("processing", "high")]),
        Agent::new(
            "communication_assistant",
            AgentType::Communication,
            "Communication Assistant",
            &["content_writing", "email_composition", "social_media", "translation"],
            &["professional_writing", "technical_writing", "customer_service"],
        )
        .with_description("Expert in communication, writing, and social interaction")
        .with_execution_hints(&["general", "reasoning"])
        .with_resource_requirements(&[("memory", "low"), ("processing", "medium")]),
        Agent::new(
            "creative_designer",
            AgentType::Creative,
            "Creative Designer",
            &["content_creation", "design_thinking", "brainstorming", "visual_design"],
            &["graphic_design", "ui_ux", "creative_writing", "branding"],
        )
        .with_description("Specialized in creative tasks, design, and content creation")
        .with_execution_hints(&["general", "creative"])
        .with_resource_requirements(&[("memory", "medium"), ("processing", "medium")]),
        Agent::new(
            "system_administrator",
            AgentType::System,
            "System Administrator",
            &["system_monitoring", "performance_optimization", "security", "maintenance"],
            &["linux_administration", "network_management", "security_auditing"],
        )
        .with_description("Expert in system administration, monitoring, and infrastructure")
        .with_execution_hints(&["code", "general"])
        .with_resource_requirements(&[("memory", "medium"), ("processing", "low")]),
        Agent::new(
            COORDINATION_MASTER,
            AgentType::Coordination,
            "Coordination Master",
            &["task_decomposition", "agent_selection", "load_balancing", "conflict_resolution"],
            &["project_management", "resource_allocation", "strategic_planning"],
        )
        .with_description("Meta-agent responsible for coordinating and managing other agents")
        .with_execution_hints(&["reasoning", "general"])
        .with_resource_requirements(&[("memory", "high"), ("processing", "medium")]),
    ]
}
