//! 应用状态定义

use std::sync::Arc;

use loyalty_shared::cache::Cache;
use loyalty_shared::config::UnitOfWorkConfig;
use loyalty_shared::database::Database;

use crate::random::RandomSource;
use crate::repository::{LevelRepository, SettingsRepository};
use crate::service::{LuckyDrawService, SignInService, WalletService};
use crate::wallet::{Ledger, ProvisionerRegistry};

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Arc<Cache>,
    pub sign_in_service: Arc<SignInService<SettingsRepository>>,
    pub lucky_draw_service: Arc<LuckyDrawService<SettingsRepository>>,
    pub wallet_service: Arc<WalletService<LevelRepository>>,
}

impl AppState {
    /// 组装服务依赖
    pub fn new(
        db: Database,
        cache: Arc<Cache>,
        random: Arc<dyn RandomSource>,
        uow_config: UnitOfWorkConfig,
    ) -> Self {
        let pool = db.pool().clone();
        let ledger = Arc::new(Ledger::new(
            pool.clone(),
            Arc::new(ProvisionerRegistry::with_defaults()),
        ));
        let settings_repo = Arc::new(SettingsRepository::new(pool.clone()));

        let sign_in_service = Arc::new(SignInService::new(
            pool.clone(),
            ledger.clone(),
            settings_repo.clone(),
            random.clone(),
            cache.clone(),
            uow_config.clone(),
        ));
        let lucky_draw_service = Arc::new(LuckyDrawService::new(
            pool.clone(),
            ledger.clone(),
            settings_repo,
            random,
            cache.clone(),
            uow_config,
        ));
        let wallet_service = Arc::new(WalletService::new(
            ledger,
            Arc::new(LevelRepository::new(pool)),
            cache.clone(),
        ));

        Self {
            db,
            cache,
            sign_in_service,
            lucky_draw_service,
            wallet_service,
        }
    }
}
