//! Project model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{decode_string_list, encode_string_list, AccountSummary};

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::NotStarted => write!(f, "Not Started"),
            ProjectStatus::InProgress => write!(f, "In Progress"),
            ProjectStatus::Completed => write!(f, "Completed"),
            ProjectStatus::OnHold => write!(f, "On Hold"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(ProjectStatus::NotStarted),
            "In Progress" => Ok(ProjectStatus::InProgress),
            "Completed" => Ok(ProjectStatus::Completed),
            "On Hold" => Ok(ProjectStatus::OnHold),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    /// JSON array of skill tags
    pub required_skills: String,
    pub status: String,
    pub deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn required_skills_list(&self) -> Vec<String> {
        decode_string_list(&self.required_skills)
    }

    pub fn encode_skills(skills: &[String]) -> String {
        encode_string_list(skills)
    }
}

/// Project with its assignees resolved to name/email summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "requiredSkills")]
    pub required_skills: Vec<String>,
    #[serde(rename = "assignedEmployees")]
    pub assigned_employees: Vec<AccountSummary>,
    pub status: String,
    pub deadline: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl ProjectResponse {
    pub fn new(project: Project, assigned_employees: Vec<AccountSummary>) -> Self {
        let required_skills = project.required_skills_list();
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            required_skills,
            assigned_employees,
            status: project.status,
            deadline: project.deadline,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, rename = "requiredSkills")]
    pub required_skills: Vec<String>,
    #[serde(default, rename = "assignedEmployees")]
    pub assigned_employees: Vec<String>,
    pub status: Option<ProjectStatus>,
    pub deadline: Option<String>,
}

/// Partial update; absent fields keep their current values. An explicit
/// empty array clears the corresponding set.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "requiredSkills")]
    pub required_skills: Option<Vec<String>>,
    #[serde(rename = "assignedEmployees")]
    pub assigned_employees: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    pub deadline: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trip() {
        for name in ["Not Started", "In Progress", "Completed", "On Hold"] {
            assert_eq!(ProjectStatus::from_str(name).unwrap().to_string(), name);
        }
        assert!(ProjectStatus::from_str("Cancelled").is_err());
    }

    #[test]
    fn status_serde_uses_wire_names() {
        let json = serde_json::to_string(&ProjectStatus::NotStarted).unwrap();
        assert_eq!(json, r#""Not Started""#);
        let parsed: ProjectStatus = serde_json::from_str(r#""On Hold""#).unwrap();
        assert_eq!(parsed, ProjectStatus::OnHold);
    }
}
