use crate::config::AppConfig;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Store::new(&config.db_path);
        store.init().await?;
        Ok(Self { store, config })
    }

    /// State wired to an explicit store path with a fixed jwt config, for
    /// tests that never read process env.
    pub fn fake(store: Store) -> Self {
        let config = Arc::new(AppConfig {
            db_path: store.path().display().to_string(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        Self { store, config }
    }
}
