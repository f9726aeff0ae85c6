//! Input validation for API requests.
//!
//! Small presence/shape checks returning `Result<(), String>` so handlers
//! can collect them into a `ValidationErrorBuilder`.

/// Validate an email address (presence and rough shape)
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email address".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Validate a person's display name
pub fn validate_person_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 100 {
        return Err("Name is too long (max 100 characters)".to_string());
    }
    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.len() < 2 {
        return Err("Password is too short (min 2 characters)".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    Ok(())
}

/// Validate a course or project title
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    if title.len() > 200 {
        return Err("Title is too long (max 200 characters)".to_string());
    }
    Ok(())
}

/// Validate a course or project description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description is required".to_string());
    }
    if description.len() > 2000 {
        return Err("Description is too long (max 2000 characters)".to_string());
    }
    Ok(())
}

/// Validate that an identifier is a well-formed UUID
pub fn validate_uuid(id: &str, field: &str) -> Result<(), String> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| format!("{} is not a valid identifier", field))
}

/// Validate an optional RFC3339-ish deadline date
pub fn validate_deadline(deadline: &Option<String>) -> Result<(), String> {
    if let Some(d) = deadline {
        if d.is_empty() {
            return Ok(()); // Empty string treated as no deadline
        }
        if chrono::DateTime::parse_from_rfc3339(d).is_err()
            && chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err()
        {
            return Err("Deadline must be an RFC3339 timestamp or YYYY-MM-DD date".to_string());
        }
    }
    Ok(())
}
