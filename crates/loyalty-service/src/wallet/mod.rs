//! 钱包账本
//!
//! - `provisioner`: 按钱包类型的开户策略
//! - `registry`: 开户策略注册表
//! - `ledger`: 记账、转账、余额与流水查询

pub mod ledger;
pub mod provisioner;
pub mod registry;

pub use ledger::{Ledger, TransactionPage, TransactionView};
pub use provisioner::{PointsProvisioner, WalletProvisioner};
pub use registry::ProvisionerRegistry;
