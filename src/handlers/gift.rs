use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::get_staff_owner;
use crate::models::*;
use crate::services::GiftService;

#[utoipa::path(
    get,
    path = "/api/v1/gift-thresholds",
    tag = "gift",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取满额赠送档位成功"),
        (status = 403, description = "仅员工可管理促销")
    )
)]
pub async fn get_gift_thresholds(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.list_thresholds(owner).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/gift-thresholds",
    tag = "gift",
    request_body = CreateGiftThresholdRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建档位成功"),
        (status = 400, description = "门槛/券面值非法")
    )
)]
pub async fn create_gift_threshold(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    body: web::Json<CreateGiftThresholdRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.create_threshold(owner, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/gift-thresholds/{id}",
    tag = "gift",
    params(
        ("id" = i64, Path, description = "档位 ID")
    ),
    request_body = UpdateGiftThresholdRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新档位成功"),
        (status = 404, description = "档位不存在")
    )
)]
pub async fn update_gift_threshold(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateGiftThresholdRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service
        .update_threshold(owner, path.into_inner(), &body)
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
    path = "/api/v1/gift-thresholds/{id}",
    tag = "gift",
    params(
        ("id" = i64, Path, description = "档位 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除档位成功"),
        (status = 404, description = "档位不存在")
    )
)]
pub async fn delete_gift_threshold(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.delete_threshold(owner, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auto-gifts",
    tag = "gift",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取常驻赠品池成功"),
        (status = 403, description = "仅员工可管理促销")
    )
)]
pub async fn get_auto_gifts(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.list_auto_gifts(owner).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auto-gifts",
    tag = "gift",
    request_body = CreateAutoGiftRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "加入赠品池成功")
    )
)]
pub async fn create_auto_gift(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    body: web::Json<CreateAutoGiftRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.create_auto_gift(owner, &body).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/auto-gifts/{id}",
    tag = "gift",
    params(
        ("id" = i64, Path, description = "赠品池条目 ID")
    ),
    request_body = UpdateAutoGiftRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "启停成功"),
        (status = 404, description = "条目不存在")
    )
)]
pub async fn update_auto_gift(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateAutoGiftRequest>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service
        .set_auto_gift_active(owner, path.into_inner(), body.is_active)
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
    path = "/api/v1/auto-gifts/{id}",
    tag = "gift",
    params(
        ("id" = i64, Path, description = "赠品池条目 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "条目不存在")
    )
)]
pub async fn delete_auto_gift(
    gift_service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let owner = match get_staff_owner(&req) {
        Ok(owner) => owner,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_service.delete_auto_gift(owner, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn gift_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gift-thresholds")
            .route("", web::get().to(get_gift_thresholds))
            .route("", web::post().to(create_gift_threshold))
            .route("/{id}", web::put().to(update_gift_threshold))
            .route("/{id}", web::delete().to(delete_gift_threshold)),
    )
    .service(
        web::scope("/auto-gifts")
            .route("", web::get().to(get_auto_gifts))
            .route("", web::post().to(create_auto_gift))
            .route("/{id}", web::put().to(update_auto_gift))
            .route("/{id}", web::delete().to(delete_auto_gift)),
    );
}
