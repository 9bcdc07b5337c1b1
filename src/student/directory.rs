use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use anyhow::Context;
use serde::Deserialize;

/// Day name to timetable text.
pub type Schedule = BTreeMap<String, String>;

pub const USN_PREFIX_LEN: usize = 7;

/// Static lookup tables for the student utility endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CampusDirectory {
    #[serde(default)]
    notes_links: HashMap<String, String>,
    #[serde(default)]
    schedules: HashMap<String, Schedule>,
}

impl CampusDirectory {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read campus directory {}", path.display()))?;
        let dir: CampusDirectory = serde_json::from_str(&raw)
            .with_context(|| format!("parse campus directory {}", path.display()))?;
        Ok(dir.normalized())
    }

    fn normalized(self) -> Self {
        Self {
            notes_links: self
                .notes_links
                .into_iter()
                .map(|(k, v)| (k.trim().to_uppercase(), v))
                .collect(),
            schedules: self
                .schedules
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        }
    }

    pub fn notes_link(&self, branch: &str) -> Option<&str> {
        self.notes_links
            .get(&branch.trim().to_uppercase())
            .map(String::as_str)
    }

    /// `prefix` is the batch key produced by [`usn_prefix`].
    pub fn schedule(&self, prefix: &str) -> Option<&Schedule> {
        self.schedules.get(prefix)
    }

    pub fn branch_count(&self) -> usize {
        self.notes_links.len()
    }
}

/// First seven characters of a USN, lower-cased; `None` when the USN is shorter.
pub fn usn_prefix(usn: &str) -> Option<String> {
    let usn = usn.trim();
    if usn.chars().count() < USN_PREFIX_LEN {
        return None;
    }
    Some(usn.chars().take(USN_PREFIX_LEN).collect::<String>().to_lowercase())
}

impl Default for CampusDirectory {
    fn default() -> Self {
        let notes_links = [
            ("CS", "https://drive.google.com/drive/folders/CS_2025_Syllabus_Notes_Link"),
            ("AI", "https://drive.google.com/drive/folders/AI_2025_Notes_Repository"),
            ("IS", "https://drive.google.com/drive/folders/IS_Core_Materials_Shared"),
            ("EC", "https://drive.google.com/drive/folders/EC_Sem_Materials"),
            ("CSBS", "https://drive.google.com/drive/folders/CSBS_Notes_Link"),
            ("CSD", "https://drive.google.com/drive/folders/CSD_Notes_Link"),
        ]
        .into_iter()
        .map(|(b, l)| (b.to_string(), l.to_string()))
        .collect();

        fn day(pairs: &[(&str, &str)]) -> Schedule {
            pairs
                .iter()
                .map(|(d, s)| (d.to_string(), s.to_string()))
                .collect()
        }
        let schedules = HashMap::from([
            (
                "4cb23cs".to_string(),
                day(&[
                    ("Monday", "9:00 AM - 10:00 AM: DSA, 10:00 AM - 11:00 AM: DBMS Lab"),
                    ("Tuesday", "9:00 AM - 12:00 PM: Project Meeting, 2:00 PM - 3:00 PM: Workshop"),
                    ("Wednesday", "11:00 AM - 1:00 PM: OS Lecture"),
                ]),
            ),
            (
                "4cb23ai".to_string(),
                day(&[
                    ("Monday", "10:00 AM - 11:00 AM: Linear Algebra, 11:00 AM - 1:00 PM: AI Principles Lab"),
                    ("Tuesday", "9:00 AM - 10:00 AM: Ethics in AI"),
                    ("Wednesday", "1:00 PM - 2:00 PM: Communication Skills"),
                ]),
            ),
        ]);

        Self {
            notes_links,
            schedules,
        }
    }
}
