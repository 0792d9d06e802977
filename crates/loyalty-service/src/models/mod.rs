//! 领域模型定义

mod enums;
mod level;
mod lucky_draw;
mod period;
mod sign_in;
mod wallet;

pub use enums::*;
#[cfg(test)]
pub(crate) use level::fixtures as level_fixtures;
pub use level::{LevelLadder, MemberLevel, MemberLevelDefinition};
pub use lucky_draw::{LuckyDraw, LuckyDrawRecord, LuckyDrawRule, MemberGiftExchange, NewGiftExchange};
pub use period::{ClockInCampaign, NfcSignInPeriod};
pub use sign_in::{GlobalSettings, NewSignInRecord, NfcSignInRecord, Restaurant};
pub use wallet::{
    BalanceView, Posting, PostingDetail, TransactionFilter, WalletAccount, WalletBalance,
    WalletTransaction, display_amount,
};
