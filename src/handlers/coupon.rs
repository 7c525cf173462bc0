use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::{get_actor, get_staff_owner};
use crate::error::AppError;
use crate::models::*;
use crate::services::CouponService;

#[utoipa::path(
    get,
    path = "/api/v1/coupons",
    tag = "coupon",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "券状态过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取优惠券列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_coupons(
    coupon_service: web::Data<CouponService>,
    req: HttpRequest,
    query: web::Query<CouponQuery>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };
    let Some(customer_id) = actor.customer_id() else {
        return Ok(AppError::Forbidden.error_response());
    };

    match coupon_service.list_for_customer(customer_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/coupons/issue",
    tag = "coupon",
    request_body = IssueCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "批量发券完成，返回实际发放数量"),
        (status = 400, description = "面值/数量/过期时间非法"),
        (status = 403, description = "仅员工可发券")
    )
)]
pub async fn issue_coupons(
    coupon_service: web::Data<CouponService>,
    req: HttpRequest,
    body: web::Json<IssueCouponRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match coupon_service.issue(owner, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/coupons/{id}/revoke",
    tag = "coupon",
    params(
        ("id" = i64, Path, description = "优惠券 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "作废成功"),
        (status = 409, description = "券已被使用或被订单锁定")
    )
)]
pub async fn revoke_coupon(
    coupon_service: web::Data<CouponService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match coupon_service.revoke(owner, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/coupons/{id}",
    tag = "coupon",
    params(
        ("id" = i64, Path, description = "优惠券 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 409, description = "只有已作废的券可以删除")
    )
)]
pub async fn delete_coupon(
    coupon_service: web::Data<CouponService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match coupon_service.delete(owner, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn coupon_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("", web::get().to(get_coupons))
            .route("/issue", web::post().to(issue_coupons))
            .route("/{id}/revoke", web::put().to(revoke_coupon))
            .route("/{id}", web::delete().to(delete_coupon)),
    );
}
