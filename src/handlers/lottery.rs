use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::{get_actor, get_staff_owner};
use crate::models::*;
use crate::services::LotteryService;

#[utoipa::path(
    post,
    path = "/api/v1/lottery/draw/{order_id}",
    tag = "lottery",
    params(
        ("order_id" = i64, Path, description = "参与抽奖的订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖完成（重复请求返回首次结果）"),
        (status = 400, description = "订单未达到抽奖门槛"),
        (status = 404, description = "订单不存在或不可见")
    )
)]
pub async fn draw(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.draw(&actor, path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/lottery/groups",
    tag = "lottery",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖品组成功"),
        (status = 403, description = "仅员工可管理抽奖配置")
    )
)]
pub async fn get_groups(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.list_groups(owner).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/lottery/groups",
    tag = "lottery",
    request_body = CreateLotteryGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建奖品组成功"),
        (status = 400, description = "权重非法")
    )
)]
pub async fn create_group(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    body: web::Json<CreateLotteryGroupRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.create_group(owner, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/lottery/groups/{id}",
    tag = "lottery",
    params(
        ("id" = i64, Path, description = "奖品组 ID")
    ),
    request_body = UpdateLotteryGroupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新奖品组成功"),
        (status = 404, description = "奖品组不存在")
    )
)]
pub async fn update_group(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateLotteryGroupRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service
        .update_group(owner, path.into_inner(), &body)
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
    path = "/api/v1/lottery/groups/{id}",
    tag = "lottery",
    params(
        ("id" = i64, Path, description = "奖品组 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除奖品组成功"),
        (status = 404, description = "奖品组不存在")
    )
)]
pub async fn delete_group(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.delete_group(owner, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lottery")
            .route("/draw/{order_id}", web::post().to(draw))
            .route("/groups", web::get().to(get_groups))
            .route("/groups", web::post().to(create_group))
            .route("/groups/{id}", web::put().to(update_group))
            .route("/groups/{id}", web::delete().to(delete_group)),
    );
}
