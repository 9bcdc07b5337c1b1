use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    auth::{
        dto::RegisterRequest,
        policy::normalize_email,
        repo_types::{Branch, Role},
    },
    config::UsnValidation,
    error::AppError,
};

pub const MIN_USERNAME_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration input after every field rule has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub email: String,
    pub full_name: String,
    pub username: String,
    pub branch: Option<Branch>,
    pub usn: String,
    pub study_year: i32,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UsnRules {
    pub prefix: String,
    pub mode: UsnValidation,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_staff_id(usn: &str) -> bool {
    lazy_static! {
        static ref STAFF_ID_RE: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
    }
    STAFF_ID_RE.is_match(usn)
}

fn student_usn_regex(prefix: &str, branch: Branch) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)^{}([0-9]{{2}})({})([0-9]{{3}})$",
        regex::escape(prefix),
        branch.usn_code()
    ))
}

pub fn validate_registration(
    req: &RegisterRequest,
    rules: &UsnRules,
) -> Result<ValidRegistration, AppError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::Invalid("Invalid email.".into()));
    }

    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::Invalid("Full name is required.".into()));
    }

    let username = req.username.trim().to_string();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::Invalid(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters."
        )));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let role: Role = req.role.parse().map_err(AppError::Invalid)?;

    let branch = match req.branch.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => Some(b.parse::<Branch>().map_err(AppError::Invalid)?),
        _ => None,
    };

    let usn = req.usn.trim();
    let study_year = req.study_year;

    // Non-ASCII digits and case-folded letters would alias an existing USN.
    if !usn.is_ascii() {
        return Err(AppError::Invalid(
            "USN/Employee ID must contain only ASCII characters.".into(),
        ));
    }

    match rules.mode {
        UsnValidation::Strict => {
            match role {
                Role::Student => {
                    let branch = branch.ok_or_else(|| {
                        AppError::Invalid("Branch is required for students.".into())
                    })?;
                    let pattern = student_usn_regex(&rules.prefix, branch)
                        .map_err(|e| AppError::Internal(e.into()))?;
                    if !pattern.is_match(usn) {
                        return Err(AppError::Invalid(format!(
                            "USN must be in the format {}YY[BranchCode]NNN, specific to the selected branch ({}).",
                            rules.prefix,
                            branch.usn_code()
                        )));
                    }
                    if !(1..=4).contains(&study_year) {
                        return Err(AppError::Invalid(
                            "Student study_year must be between 1 and 4.".into(),
                        ));
                    }
                }
                Role::Faculty | Role::PlacementCell => {
                    if !is_staff_id(usn) {
                        return Err(AppError::Invalid(
                            "Employee ID must be exactly 10 digits.".into(),
                        ));
                    }
                    if study_year != 0 {
                        return Err(AppError::Invalid(format!(
                            "{role} must have a study_year of 0."
                        )));
                    }
                }
            }
        }
        UsnValidation::Legacy => {
            if usn.chars().count() != 10 {
                return Err(AppError::Invalid(
                    "USN/Employee ID must be exactly 10 characters.".into(),
                ));
            }
            if !(0..=4).contains(&study_year) {
                return Err(AppError::Invalid(
                    "study_year must be between 0 and 4.".into(),
                ));
            }
            if role == Role::Student && branch.is_none() {
                return Err(AppError::Invalid("Branch is required for students.".into()));
            }
        }
    }

    Ok(ValidRegistration {
        email,
        full_name,
        username,
        branch,
        usn: usn.to_ascii_lowercase(),
        study_year,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn strict() -> UsnRules {
        UsnRules {
            prefix: "4cb".into(),
            mode: UsnValidation::Strict,
        }
    }

    fn student(usn: &str, branch: &str, year: i32) -> RegisterRequest {
        RegisterRequest {
            email: " A@X.com ".into(),
            password: "abcdefgh".into(),
            full_name: "Asha Rao".into(),
            username: "stud1".into(),
            branch: Some(branch.into()),
            usn: usn.into(),
            study_year: year,
            role: "student".into(),
        }
    }

    fn staff(role: &str, usn: &str, year: i32) -> RegisterRequest {
        RegisterRequest {
            branch: None,
            role: role.into(),
            ..student(usn, "CS", year)
        }
    }

    fn invalid_message(req: &RegisterRequest, rules: &UsnRules) -> String {
        let err = validate_registration(req, rules).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        err.to_string()
    }

    #[test]
    fn accepts_student_and_normalizes() {
        let ok = validate_registration(&student("4CB23CS001", "cs", 2), &strict()).unwrap();
        assert_eq!(ok.email, "a@x.com");
        assert_eq!(ok.usn, "4cb23cs001");
        assert_eq!(ok.branch, Some(Branch::Cs));
        assert_eq!(ok.role, Role::Student);
    }

    #[test]
    fn student_usn_uses_branch_code() {
        for (branch, usn) in [
            ("CSBS", "4cb22cb015"),
            ("CSD", "4cb21cd100"),
            ("AI", "4cb23ai001"),
            ("IS", "4cb24is042"),
            ("EC", "4cb20ec999"),
        ] {
            assert!(
                validate_registration(&student(usn, branch, 1), &strict()).is_ok(),
                "{branch} {usn}"
            );
        }

        // Right shape, wrong branch code.
        let msg = invalid_message(&student("4cb23ai001", "CS", 2), &strict());
        assert!(msg.contains("(cs)"));
        // Wrong prefix, short sequence, trailing junk.
        for usn in ["5cb23cs001", "4cb23cs01", "4cb23cs0012", "4cb2xcs001"] {
            assert!(validate_registration(&student(usn, "CS", 2), &strict()).is_err());
        }
    }

    #[test]
    fn prefix_is_configurable() {
        let rules = UsnRules {
            prefix: "1rv".into(),
            mode: UsnValidation::Strict,
        };
        assert!(validate_registration(&student("1RV23CS001", "CS", 2), &rules).is_ok());
        assert!(validate_registration(&student("4cb23cs001", "CS", 2), &rules).is_err());
    }

    #[test]
    fn student_requires_branch_and_year_range() {
        let mut no_branch = student("4cb23cs001", "CS", 2);
        no_branch.branch = None;
        assert!(invalid_message(&no_branch, &strict()).contains("Branch is required"));

        for year in [0, 5, -1] {
            let msg = invalid_message(&student("4cb23cs001", "CS", year), &strict());
            assert!(msg.contains("between 1 and 4"));
        }
    }

    #[test]
    fn staff_needs_ten_digit_id_and_year_zero() {
        let ok = validate_registration(&staff("faculty", "0123456789", 0), &strict()).unwrap();
        assert_eq!(ok.branch, None);
        assert!(validate_registration(&staff("Placement_Cell", "9876543210", 0), &strict()).is_ok());

        for id in ["012345678", "01234567890", "01234x6789", "4cb23cs001"] {
            let msg = invalid_message(&staff("faculty", id, 0), &strict());
            assert!(msg.contains("10 digits"));
        }
        let msg = invalid_message(&staff("placement_cell", "0123456789", 3), &strict());
        assert!(msg.contains("placement_cell must have a study_year of 0"));
    }

    #[test]
    fn staff_branch_is_optional_but_checked() {
        let mut with_branch = staff("faculty", "0123456789", 0);
        with_branch.branch = Some("ai".into());
        let ok = validate_registration(&with_branch, &strict()).unwrap();
        assert_eq!(ok.branch, Some(Branch::Ai));

        with_branch.branch = Some("ME".into());
        assert!(invalid_message(&with_branch, &strict()).contains("Branch must be one of"));
    }

    #[test]
    fn length_and_shape_rules() {
        let mut req = student("4cb23cs001", "CS", 2);
        req.username = "abc".into();
        assert!(invalid_message(&req, &strict()).contains("Username"));

        let mut req = student("4cb23cs001", "CS", 2);
        req.password = "short".into();
        assert!(invalid_message(&req, &strict()).contains("Password"));

        let mut req = student("4cb23cs001", "CS", 2);
        req.email = "not-an-email".into();
        assert!(invalid_message(&req, &strict()).contains("email"));

        let mut req = student("4cb23cs001", "CS", 2);
        req.full_name = "   ".into();
        assert!(invalid_message(&req, &strict()).contains("Full name"));

        let mut req = student("4cb23cs001", "CS", 2);
        req.role = "admin".into();
        assert!(invalid_message(&req, &strict()).contains("Role must be one of"));
    }

    #[test]
    fn legacy_mode_accepts_any_ten_characters() {
        let legacy = UsnRules {
            prefix: "4cb".into(),
            mode: UsnValidation::Legacy,
        };
        let ok = validate_registration(&student("ABCDEFGHIJ", "CS", 0), &legacy).unwrap();
        assert_eq!(ok.usn, "abcdefghij");
        assert!(validate_registration(&staff("faculty", "emp-000001", 2), &legacy).is_ok());
        assert!(validate_registration(&student("short", "CS", 1), &legacy).is_err());
        assert!(validate_registration(&student("ABCDEFGHIJ", "CS", 5), &legacy).is_err());
    }

    #[test]
    fn non_ascii_lookalikes_are_rejected() {
        // Arabic-Indic digits for 1234567890.
        let msg = invalid_message(
            &staff("faculty", "\u{661}\u{662}\u{663}\u{664}\u{665}\u{666}\u{667}\u{668}\u{669}\u{660}", 0),
            &strict(),
        );
        assert!(msg.contains("ASCII"));

        // Long s folds to 's' under Unicode case folding.
        let msg = invalid_message(&student("4cb23i\u{17f}001", "IS", 2), &strict());
        assert!(msg.contains("ASCII"));

        let legacy = UsnRules {
            prefix: "4cb".into(),
            mode: UsnValidation::Legacy,
        };
        assert!(invalid_message(&student("4cb23i\u{17f}001", "IS", 2), &legacy).contains("ASCII"));
    }
}
