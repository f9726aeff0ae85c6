//! Account and role models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{decode_string_list, encode_string_list};

/// Account roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// Roles allowed to manage courses, accounts and projects
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Employee => write!(f, "employee"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Role::Employee)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    /// JSON array of skill tags
    pub skills: String,
    pub reward_points: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    pub fn role_enum(&self) -> Role {
        Role::from(self.role.clone())
    }

    pub fn skills_list(&self) -> Vec<String> {
        decode_string_list(&self.skills)
    }

    pub fn encode_skills(skills: &[String]) -> String {
        encode_string_list(skills)
    }
}

/// Account as returned by the API, with the password hash redacted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub skills: Vec<String>,
    #[serde(rename = "rewardPoints")]
    pub reward_points: i64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let skills = account.skills_list();
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
            skills,
            reward_points: account.reward_points,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Compact account view embedded in project responses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub skills: Vec<String>,
    // Accepted for wire compatibility with older clients but never honored;
    // every signup starts as employee
    #[serde(default)]
    #[allow(dead_code)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub name: String,
}

/// Staff-side account update; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub role: Option<Role>,
}

/// Self-service profile update; role is deliberately not part of this shape
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub skills: Option<Vec<String>>,
}
