//! Background scheduled tasks for the application.
//!
//! The only autonomous job in the engine is the purge of expired unpaid
//! orders. Call `spawn_all` once during startup to launch it.

use crate::services::OrderService;

/// Spawn all background tasks.
///
/// Detaches via `tokio::spawn`; does not block.
pub fn spawn_all(order_service: OrderService, purge_interval_secs: u64) {
    // 定期清理超时未支付订单
    {
        let svc = order_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.purge_expired_unpaid().await {
                    Ok(n) if n > 0 => log::info!("Purged expired unpaid orders: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to purge expired unpaid orders: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(purge_interval_secs)).await;
            }
        });
    }
}
