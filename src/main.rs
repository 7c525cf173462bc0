use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use dormshop_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret);

    // 创建服务
    let shop = config.shop.clone();
    let catalog_service = CatalogService::new();
    let scope_service = ScopeService::new(pool.clone(), shop.clone());
    let pricing_service = PricingService::new(shop.clone(), catalog_service.clone());
    let coupon_service = CouponService::new(pool.clone(), shop.clone());
    let reward_service = RewardService::new(pool.clone());
    let lottery_service = LotteryService::new(pool.clone(), shop.clone(), catalog_service.clone());
    let gift_service = GiftService::new(pool.clone());
    let order_service = OrderService::new(
        pool.clone(),
        shop.clone(),
        catalog_service.clone(),
        scope_service.clone(),
        pricing_service.clone(),
        coupon_service.clone(),
        reward_service.clone(),
    );

    // 启动后台定时任务
    tasks::spawn_all(order_service.clone(), shop.purge_interval_secs);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(coupon_service.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(lottery_service.clone()))
            .app_data(web::Data::new(gift_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::order_config)
                    .configure(handlers::coupon_config)
                    .configure(handlers::reward_config)
                    .configure(handlers::gift_config)
                    .configure(handlers::lottery_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
