pub mod coupon;
pub mod gift;
pub mod lottery;
pub mod order;
pub mod owner;
pub mod pagination;
pub mod reward;

pub use coupon::*;
pub use gift::*;
pub use lottery::*;
pub use order::*;
pub use owner::*;
pub use pagination::*;
pub use reward::*;
