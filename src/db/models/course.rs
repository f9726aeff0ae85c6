//! Course model and catalog filtering.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{decode_string_list, encode_string_list};

/// Course difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    #[serde(rename = "All Levels")]
    AllLevels,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
            Difficulty::AllLevels => write!(f, "All Levels"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Beginner" => Ok(Difficulty::Beginner),
            "Intermediate" => Ok(Difficulty::Intermediate),
            "Advanced" => Ok(Difficulty::Advanced),
            "All Levels" => Ok(Difficulty::AllLevels),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    /// JSON array of skill/category tags
    pub tags: String,
    pub difficulty: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Course {
    pub fn tags_list(&self) -> Vec<String> {
        decode_string_list(&self.tags)
    }

    pub fn encode_tags(tags: &[String]) -> String {
        encode_string_list(tags)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub difficulty: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        let tags = course.tags_list();
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            tags,
            difficulty: course.difficulty,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub difficulty: Option<Difficulty>,
}

/// Partial update; absent fields keep their current values. An explicit
/// empty tags array clears the tag set.
#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
}

/// Catalog query parameters, all optional and AND-composed
#[derive(Debug, Default, Deserialize)]
pub struct CourseQuery {
    /// Comma-separated skill tags; a course matches if any tag intersects
    pub skills: Option<String>,
    /// Exact difficulty; "All" or "All Levels" means no constraint
    pub difficulty: Option<String>,
    /// Case-insensitive substring over title or description
    pub search: Option<String>,
}

/// Resolved catalog filter evaluated over fetched rows
#[derive(Debug, Default)]
pub struct CourseFilter {
    skills: Vec<String>,
    difficulty: Option<String>,
    search: Option<String>,
}

impl CourseFilter {
    pub fn from_query(query: &CourseQuery) -> Self {
        let skills = query
            .skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let difficulty = query
            .difficulty
            .as_deref()
            .filter(|d| !d.is_empty() && *d != "All" && *d != "All Levels")
            .map(|d| d.to_string());

        let search = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());

        Self {
            skills,
            difficulty,
            search,
        }
    }

    pub fn matches(&self, course: &Course) -> bool {
        if !self.skills.is_empty() {
            let tags = course.tags_list();
            if !self.skills.iter().any(|s| tags.contains(s)) {
                return false;
            }
        }

        if let Some(ref difficulty) = self.difficulty {
            if course.difficulty != *difficulty {
                return false;
            }
        }

        if let Some(ref needle) = self.search {
            let in_title = course.title.to_lowercase().contains(needle);
            let in_description = course.description.to_lowercase().contains(needle);
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn course(title: &str, description: &str, tags: &[&str], difficulty: &str) -> Course {
        Course {
            id: "c1".into(),
            title: title.into(),
            description: description.into(),
            tags: serde_json::to_string(tags).unwrap(),
            difficulty: difficulty.into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn filter(skills: Option<&str>, difficulty: Option<&str>, search: Option<&str>) -> CourseFilter {
        CourseFilter::from_query(&CourseQuery {
            skills: skills.map(String::from),
            difficulty: difficulty.map(String::from),
            search: search.map(String::from),
        })
    }

    #[test]
    fn difficulty_round_trip() {
        for name in ["Beginner", "Intermediate", "Advanced", "All Levels"] {
            assert_eq!(Difficulty::from_str(name).unwrap().to_string(), name);
        }
        assert!(Difficulty::from_str("Expert").is_err());
    }

    #[test]
    fn empty_filter_matches_everything() {
        let c = course("Rust 101", "Intro", &["Rust"], "Beginner");
        assert!(filter(None, None, None).matches(&c));
    }

    #[test]
    fn skills_match_any() {
        let c = course("Data basics", "Intro", &["SQL", "ETL"], "Beginner");
        assert!(filter(Some("SQL,Python"), None, None).matches(&c));
        assert!(!filter(Some("Python"), None, None).matches(&c));
        // Whitespace and empty segments are tolerated
        assert!(filter(Some(" SQL , "), None, None).matches(&c));
    }

    #[test]
    fn difficulty_sentinels_impose_no_constraint() {
        let c = course("Rust 101", "Intro", &[], "Advanced");
        assert!(filter(None, Some("All"), None).matches(&c));
        assert!(filter(None, Some("All Levels"), None).matches(&c));
        assert!(filter(None, Some("Advanced"), None).matches(&c));
        assert!(!filter(None, Some("Beginner"), None).matches(&c));
    }

    #[test]
    fn search_is_case_insensitive_over_title_or_description() {
        let c = course("Intro to Rust", "Systems programming", &[], "Beginner");
        assert!(filter(None, None, Some("RUST")).matches(&c));
        assert!(filter(None, None, Some("systems")).matches(&c));
        assert!(!filter(None, None, Some("haskell")).matches(&c));
    }

    #[test]
    fn filters_compose_with_and() {
        let c = course("Intro to SQL", "Query foo databases", &["SQL"], "Beginner");
        assert!(filter(Some("SQL"), Some("Beginner"), Some("foo")).matches(&c));
        // Any single failing predicate rejects the course
        assert!(!filter(Some("SQL"), Some("Advanced"), Some("foo")).matches(&c));
        assert!(!filter(Some("Rust"), Some("Beginner"), Some("foo")).matches(&c));
        assert!(!filter(Some("SQL"), Some("Beginner"), Some("bar")).matches(&c));
    }
}
