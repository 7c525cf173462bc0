use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{CouponStatus, PaymentStatus, RewardStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::order::create_order,
        handlers::order::get_orders,
        handlers::order::get_order,
        handlers::order::set_payment_status,
        handlers::order::delete_order,
        handlers::coupon::get_coupons,
        handlers::coupon::issue_coupons,
        handlers::coupon::revoke_coupon,
        handlers::coupon::delete_coupon,
        handlers::reward::get_rewards,
        handlers::gift::get_gift_thresholds,
        handlers::gift::create_gift_threshold,
        handlers::gift::update_gift_threshold,
        handlers::gift::delete_gift_threshold,
        handlers::gift::get_auto_gifts,
        handlers::gift::create_auto_gift,
        handlers::gift::update_auto_gift,
        handlers::gift::delete_auto_gift,
        handlers::lottery::draw,
        handlers::lottery::get_groups,
        handlers::lottery::create_group,
        handlers::lottery::update_group,
        handlers::lottery::delete_group,
    ),
    components(
        schemas(
            PaymentStatus,
            CouponStatus,
            RewardStatus,
            OwnerId,
            OrderLine,
            CartLineRequest,
            CreateOrderRequest,
            CreateOrderResponse,
            SetPaymentStatusRequest,
            OrderQuery,
            OrderResponse,
            CouponResponse,
            CouponQuery,
            IssueCouponRequest,
            IssueCouponResponse,
            RewardResponse,
            DrawResponse,
            LotteryGroupItemRequest,
            LotteryGroupItemResponse,
            LotteryGroupResponse,
            CreateLotteryGroupRequest,
            UpdateLotteryGroupRequest,
            GiftThresholdItemRequest,
            GiftThresholdItemResponse,
            GiftThresholdResponse,
            CreateGiftThresholdRequest,
            UpdateGiftThresholdRequest,
            CreateAutoGiftRequest,
            UpdateAutoGiftRequest,
            AutoGiftResponse,
            PaginationParams,
            PaginationInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "order", description = "订单与支付状态"),
        (name = "coupon", description = "优惠券账本"),
        (name = "reward", description = "奖品账本"),
        (name = "gift", description = "满额赠送与常驻赠品池"),
        (name = "lottery", description = "抽奖")
    ),
    info(
        title = "DormShop Fulfillment API",
        description = "宿舍小商店的订单履约与激励结算引擎",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
