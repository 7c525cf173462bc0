pub mod coupon;
pub mod gift;
pub mod lottery;
pub mod order;
pub mod reward;

pub use coupon::coupon_config;
pub use gift::gift_config;
pub use lottery::lottery_config;
pub use order::order_config;
pub use reward::reward_config;

use crate::error::AppError;
use crate::models::{AuthActor, OwnerId};
use actix_web::{HttpMessage, HttpRequest};

/// 鉴权中间件注入的请求身份；缺失说明路由没挂中间件
pub(crate) fn get_actor(req: &HttpRequest) -> Result<AuthActor, AppError> {
    req.extensions()
        .get::<AuthActor>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing credentials".to_string()))
}

/// 员工（配送员/管理员）的促销管理分区
pub(crate) fn get_staff_owner(req: &HttpRequest) -> Result<OwnerId, AppError> {
    get_actor(req)?.staff_owner().ok_or(AppError::Forbidden)
}
