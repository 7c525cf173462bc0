use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::get_actor;
use crate::error::AppError;
use crate::models::*;
use crate::services::RewardService;

#[utoipa::path(
    get,
    path = "/api/v1/rewards",
    tag = "reward",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖品列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_rewards(
    reward_service: web::Data<RewardService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let actor = match get_actor(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };
    let Some(customer_id) = actor.customer_id() else {
        return Ok(AppError::Forbidden.error_response());
    };

    match reward_service.list_for_customer(customer_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn reward_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/rewards").route("", web::get().to(get_rewards)));
}
