use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub email: String, // lower-cased, primary key
    pub full_name: String,
    pub username: String,
    pub branch: Option<String>, // upper-cased
    pub usn: String,            // lower-cased
    pub study_year: i32,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    /// Parsed role; `None` for rows written with a role this build does not know.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// Fully validated user ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub username: String,
    pub branch: Option<Branch>,
    pub usn: String,
    pub study_year: i32,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    PlacementCell,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Faculty, Role::PlacementCell];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::PlacementCell => "placement_cell",
        }
    }

    /// Human-readable label used in chat prompts.
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::PlacementCell => "Placement Cell",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| "Role must be one of: student, faculty, placement_cell.".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Branch {
    Cs,
    Ai,
    Is,
    Csbs,
    Csd,
    Ec,
}

impl Branch {
    pub const ALL: [Branch; 6] = [
        Branch::Cs,
        Branch::Ai,
        Branch::Is,
        Branch::Csbs,
        Branch::Csd,
        Branch::Ec,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Branch::Cs => "CS",
            Branch::Ai => "AI",
            Branch::Is => "IS",
            Branch::Csbs => "CSBS",
            Branch::Csd => "CSD",
            Branch::Ec => "EC",
        }
    }

    /// Two-letter code embedded in student USNs.
    pub fn usn_code(self) -> &'static str {
        match self {
            Branch::Cs => "cs",
            Branch::Ai => "ai",
            Branch::Is => "is",
            Branch::Csbs => "cb",
            Branch::Csd => "cd",
            Branch::Ec => "ec",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Branch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Branch::ALL
            .into_iter()
            .find(|b| b.as_str() == upper)
            .ok_or_else(|| "Branch must be one of: CS, AI, IS, CSBS, CSD, EC.".to_string())
    }
}

/// Which uniqueness constraint a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Email,
    Usn,
    Username,
    Unknown,
}

impl ConflictField {
    pub fn message(self) -> &'static str {
        match self {
            ConflictField::Email => "Email already registered.",
            ConflictField::Usn => "USN/Employee ID already registered.",
            ConflictField::Username => "Username already taken.",
            ConflictField::Unknown => "Email, USN/Employee ID, or Username already exists.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(" PLACEMENT_CELL ".parse::<Role>().unwrap(), Role::PlacementCell);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn branch_codes() {
        assert_eq!("csbs".parse::<Branch>().unwrap().usn_code(), "cb");
        assert_eq!("CSD".parse::<Branch>().unwrap().usn_code(), "cd");
        assert_eq!("ai".parse::<Branch>().unwrap().as_str(), "AI");
        assert!("ME".parse::<Branch>().is_err());
    }
}
