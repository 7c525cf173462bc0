pub mod catalog_service;
pub mod coupon_service;
pub mod gift_service;
pub mod lottery_service;
pub mod order_service;
pub mod pricing_service;
pub mod reward_service;
pub mod scope_service;

pub use catalog_service::*;
pub use coupon_service::*;
pub use gift_service::*;
pub use lottery_service::*;
pub use order_service::*;
pub use pricing_service::*;
pub use reward_service::*;
pub use scope_service::*;
