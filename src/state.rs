use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::{
        policy::AccessPolicy,
        repo::{InMemoryUserStore, PgUserStore, UserStore},
    },
    chat::client::{ChatModel, GeminiClient},
    config::{AppConfig, UsnValidation},
    db,
    placement::repo::{InMemoryJobStore, JobStore, PgJobStore},
    student::directory::CampusDirectory,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub jobs: Arc<dyn JobStore>,
    pub policy: Arc<AccessPolicy>,
    pub directory: Arc<CampusDirectory>,
    pub chat: Option<Arc<dyn ChatModel>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (users, jobs) = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url).await?;
                (
                    Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgJobStore::new(pool)) as Arc<dyn JobStore>,
                )
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores, data is lost on restart");
                (
                    Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(InMemoryJobStore::new()) as Arc<dyn JobStore>,
                )
            }
        };

        let policy = match &config.identity.access_policy_path {
            Some(path) => {
                let policy = AccessPolicy::load(path)?;
                info!(
                    whitelist = ?policy.whitelist_len(),
                    bindings = policy.binding_count(),
                    "access policy loaded"
                );
                policy
            }
            None => {
                info!("no access policy configured; registration is open");
                AccessPolicy::open()
            }
        };

        if config.identity.usn_validation == UsnValidation::Legacy {
            warn!("USN_VALIDATION=legacy is deprecated; USN shape and role/year consistency are not enforced");
        }

        let directory = match &config.directory_path {
            Some(path) => CampusDirectory::load(path)?,
            None => CampusDirectory::default(),
        };
        info!(branches = directory.branch_count(), "campus directory ready");

        let chat = GeminiClient::from_config(&config.chat)?
            .map(|c| Arc::new(c) as Arc<dyn ChatModel>);
        if chat.is_none() {
            warn!("GEMINI_API_KEY not set; AI chat endpoint will answer 503");
        }

        Ok(Self::from_parts(
            config,
            users,
            jobs,
            Arc::new(policy),
            Arc::new(directory),
            chat,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        jobs: Arc<dyn JobStore>,
        policy: Arc<AccessPolicy>,
        directory: Arc<CampusDirectory>,
        chat: Option<Arc<dyn ChatModel>>,
    ) -> Self {
        Self {
            config,
            users,
            jobs,
            policy,
            directory,
            chat,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(crate::config::test_config()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryJobStore::new()),
            Arc::new(AccessPolicy::open()),
            Arc::new(CampusDirectory::default()),
            None,
        )
    }
}
