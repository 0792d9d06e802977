//! 开户策略注册表
//!
//! 以钱包类型为 key 管理开户策略，账本开户时按类型路由。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::provisioner::{PointsProvisioner, WalletProvisioner};
use crate::error::{LoyaltyError, Result};
use crate::models::WalletType;

/// 开户策略注册表
pub struct ProvisionerRegistry {
    provisioners: HashMap<WalletType, Arc<dyn WalletProvisioner>>,
}

impl ProvisionerRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            provisioners: HashMap::new(),
        }
    }

    /// 注册策略，同类型的旧策略会被替换
    pub fn register(&mut self, provisioner: Arc<dyn WalletProvisioner>) -> &mut Self {
        let wallet_type = provisioner.wallet_type();
        debug!(
            wallet_type = ?wallet_type,
            rounding = provisioner.rounding(),
            description = provisioner.description(),
            "注册开户策略"
        );
        self.provisioners.insert(wallet_type, provisioner);
        self
    }

    /// 获取指定类型的策略
    pub fn get(&self, wallet_type: WalletType) -> Option<Arc<dyn WalletProvisioner>> {
        self.provisioners.get(&wallet_type).cloned()
    }

    /// 获取策略，未注册时返回错误
    pub fn require(&self, wallet_type: WalletType) -> Result<Arc<dyn WalletProvisioner>> {
        self.get(wallet_type)
            .ok_or_else(|| LoyaltyError::WalletTypeNotSupported(wallet_type.as_str().to_string()))
    }

    /// 已注册的钱包类型
    pub fn registered_types(&self) -> Vec<WalletType> {
        self.provisioners.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.provisioners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provisioners.is_empty()
    }

    /// 创建包含默认策略的注册表
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PointsProvisioner::default()));

        info!(
            provisioner_count = registry.len(),
            types = ?registry.registered_types(),
            "默认开户策略初始化完成"
        );

        registry
    }
}

impl Default for ProvisionerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
