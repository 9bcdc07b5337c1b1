use serde::Serialize;

use crate::auth::repo_types::Role;

/// Which UI view the client renders after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    /// Senior students see the placements board alongside the general one.
    StudentPlacements,
    StudentGeneral,
    FacultyDashboard,
    PlacementDashboard,
    General,
}

impl Dashboard {
    pub fn as_str(self) -> &'static str {
        match self {
            Dashboard::StudentPlacements => "student_placements",
            Dashboard::StudentGeneral => "student_general",
            Dashboard::FacultyDashboard => "faculty_dashboard",
            Dashboard::PlacementDashboard => "placement_dashboard",
            Dashboard::General => "general",
        }
    }
}

/// `role` is the stored role string; unknown roles fall through to `General`.
pub fn derive_dashboard(role: &str, study_year: i32) -> Dashboard {
    match role.parse::<Role>() {
        Ok(Role::Student) if matches!(study_year, 3 | 4) => Dashboard::StudentPlacements,
        Ok(Role::Student) => Dashboard::StudentGeneral,
        Ok(Role::Faculty) => Dashboard::FacultyDashboard,
        Ok(Role::PlacementCell) => Dashboard::PlacementDashboard,
        Err(_) => Dashboard::General,
    }
}
