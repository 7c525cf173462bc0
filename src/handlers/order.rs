use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::get_actor;
use crate::models::*;
use crate::services::OrderService;

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "order",
    request_body = CreateOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "下单成功"),
        (status = 400, description = "购物车为空 / 库存不足 / 优惠券不可用"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.create_order(&actor, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "order",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "支付状态过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取订单列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.list_orders(&actor, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取订单成功"),
        (status = 404, description = "订单不存在或不可见")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.get_order(&actor, path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/payment-status",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    request_body = SetPaymentStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态更新成功"),
        (status = 400, description = "非法状态迁移"),
        (status = 409, description = "并发冲突")
    )
)]
pub async fn set_payment_status(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SetPaymentStatusRequest>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service
        .set_payment_status(&actor, path.into_inner(), body.status)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 403, description = "顾客不能删除已收款订单"),
        (status = 404, description = "订单不存在或不可见")
    )
)]
pub async fn delete_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.delete_order(&actor, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(get_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/payment-status", web::put().to(set_payment_status))
            .route("/{id}", web::delete().to(delete_order)),
    );
}
