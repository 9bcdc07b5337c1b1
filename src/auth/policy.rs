//! Deployment-supplied whitelist and per-email role bindings.
//!
//! Loaded once at startup from a JSON document shaped like
//! `config/access_policy.example.json`. An absent file means registration is
//! open to any address.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    auth::repo_types::{Branch, Role},
    error::AppError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RoleBinding {
    pub role: Role,
    #[serde(default)]
    pub branch: Option<Branch>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    whitelist_enabled: bool,
    #[serde(default)]
    allowed_emails: Vec<String>,
    #[serde(default)]
    bindings: HashMap<String, RoleBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    /// `None` disables the whitelist check.
    whitelist: Option<HashSet<String>>,
    bindings: HashMap<String, RoleBinding>,
}

impl AccessPolicy {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read access policy {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse access policy {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: PolicyFile = serde_json::from_str(raw)?;
        let bindings: HashMap<String, RoleBinding> = file
            .bindings
            .into_iter()
            .map(|(email, binding)| (normalize_email(&email), binding))
            .collect();

        // Bound emails are implicitly whitelisted.
        let whitelist = file.whitelist_enabled.then(|| {
            file.allowed_emails
                .iter()
                .map(|e| normalize_email(e))
                .chain(bindings.keys().cloned())
                .collect()
        });

        Ok(Self {
            whitelist,
            bindings,
        })
    }

    pub fn whitelist_len(&self) -> Option<usize> {
        self.whitelist.as_ref().map(HashSet::len)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// `email` must already be normalized.
    pub fn check_allowed(&self, email: &str) -> Result<(), AppError> {
        match &self.whitelist {
            Some(allowed) if !allowed.contains(email) => Err(AppError::Forbidden(
                "This email is not authorised to access the portal.".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Rejects a registration whose role or branch contradicts the binding for `email`.
    pub fn check_binding(
        &self,
        email: &str,
        role: &str,
        branch: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(binding) = self.bindings.get(email) else {
            return Ok(());
        };

        if role.trim().to_lowercase() != binding.role.as_str() {
            return Err(AppError::Invalid(format!(
                "This email is registered for the {} role.",
                binding.role
            )));
        }

        if let Some(required) = binding.branch {
            let submitted = branch.map(|b| b.trim().to_uppercase());
            if submitted.as_deref() != Some(required.as_str()) {
                return Err(AppError::Invalid(format!(
                    "This email is registered for the {required} branch."
                )));
            }
        }
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const POLICY: &str = r#"{
        "whitelist_enabled": true,
        "allowed_emails": ["Student.One@College.edu"],
        "bindings": {
            "hod.cs@college.edu": { "role": "faculty", "branch": "CS" },
            "tpo@college.edu": { "role": "placement_cell" }
        }
    }"#;

    #[test]
    fn open_policy_allows_everyone() {
        let policy = AccessPolicy::open();
        assert!(policy.check_allowed("anyone@anywhere.com").is_ok());
        assert!(policy.check_binding("anyone@anywhere.com", "student", None).is_ok());
    }

    #[test]
    fn whitelist_is_normalized_and_includes_bindings() {
        let policy = AccessPolicy::from_json(POLICY).unwrap();
        assert_eq!(policy.whitelist_len(), Some(3));
        assert!(policy.check_allowed("student.one@college.edu").is_ok());
        assert!(policy.check_allowed("tpo@college.edu").is_ok());

        let err = policy.check_allowed("stranger@college.edu").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn binding_requires_matching_role_and_branch() {
        let policy = AccessPolicy::from_json(POLICY).unwrap();
        assert!(policy
            .check_binding("hod.cs@college.edu", "Faculty", Some("cs"))
            .is_ok());

        let wrong_role = policy
            .check_binding("hod.cs@college.edu", "student", Some("CS"))
            .unwrap_err();
        assert_eq!(wrong_role.status(), StatusCode::BAD_REQUEST);
        assert!(wrong_role.to_string().contains("faculty"));

        let wrong_branch = policy
            .check_binding("hod.cs@college.edu", "faculty", Some("AI"))
            .unwrap_err();
        assert!(wrong_branch.to_string().contains("CS"));
        assert!(policy
            .check_binding("hod.cs@college.edu", "faculty", None)
            .is_err());

        // No branch constraint on this binding.
        assert!(policy
            .check_binding("tpo@college.edu", "placement_cell", None)
            .is_ok());
    }

    #[test]
    fn disabled_whitelist_still_enforces_bindings() {
        let policy = AccessPolicy::from_json(
            r#"{ "bindings": { "tpo@college.edu": { "role": "placement_cell" } } }"#,
        )
        .unwrap();
        assert_eq!(policy.whitelist_len(), None);
        assert!(policy.check_allowed("stranger@college.edu").is_ok());
        assert!(policy
            .check_binding("tpo@college.edu", "faculty", None)
            .is_err());
    }

    #[test]
    fn rejects_unknown_role_in_file() {
        let err = AccessPolicy::from_json(
            r#"{ "bindings": { "x@college.edu": { "role": "admin" } } }"#,
        );
        assert!(err.is_err());
    }
}
