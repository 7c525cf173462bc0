use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub shop: ShopConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// 店铺运营参数（金额均为分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// 配送费（固定）
    #[serde(default = "default_flat_shipping_fee")]
    pub flat_shipping_fee_cents: i64,
    /// 免配送费门槛（订单小计达到即免）
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold_cents: i64,
    /// 携带奖品抵扣的最低小计
    #[serde(default = "default_reward_qualify")]
    pub reward_qualify_cents: i64,
    /// 参与抽奖的最低小计
    #[serde(default = "default_lottery_qualify")]
    pub lottery_qualify_cents: i64,
    /// 单次最多发放优惠券数量
    #[serde(default = "default_coupon_batch_max")]
    pub coupon_batch_max: u32,
    /// 未支付订单过期时间（分钟）
    #[serde(default = "default_unpaid_expire_minutes")]
    pub unpaid_order_expire_minutes: i64,
    /// 过期订单清理间隔（秒）
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
    /// 店铺营业开关
    #[serde(default = "default_is_open")]
    pub is_open: bool,
}

fn default_flat_shipping_fee() -> i64 {
    100
}
fn default_free_shipping_threshold() -> i64 {
    1000
}
fn default_reward_qualify() -> i64 {
    1000
}
fn default_lottery_qualify() -> i64 {
    2000
}
fn default_coupon_batch_max() -> u32 {
    200
}
fn default_unpaid_expire_minutes() -> i64 {
    30
}
fn default_purge_interval() -> u64 {
    300
}
fn default_is_open() -> bool {
    true
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            flat_shipping_fee_cents: default_flat_shipping_fee(),
            free_shipping_threshold_cents: default_free_shipping_threshold(),
            reward_qualify_cents: default_reward_qualify(),
            lottery_qualify_cents: default_lottery_qualify(),
            coupon_batch_max: default_coupon_batch_max(),
            unpaid_order_expire_minutes: default_unpaid_expire_minutes(),
            purge_interval_secs: default_purge_interval(),
            is_open: default_is_open(),
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str)
                    .map_err(|e| anyhow::anyhow!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                    },
                    shop: ShopConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow::anyhow!("无法读取配置文件 {config_path}: {e}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("SHOP_FLAT_SHIPPING_FEE_CENTS")
            && let Ok(n) = v.parse()
        {
            config.shop.flat_shipping_fee_cents = n;
        }
        if let Ok(v) = env::var("SHOP_FREE_SHIPPING_THRESHOLD_CENTS")
            && let Ok(n) = v.parse()
        {
            config.shop.free_shipping_threshold_cents = n;
        }
        if let Ok(v) = env::var("SHOP_REWARD_QUALIFY_CENTS")
            && let Ok(n) = v.parse()
        {
            config.shop.reward_qualify_cents = n;
        }
        if let Ok(v) = env::var("SHOP_LOTTERY_QUALIFY_CENTS")
            && let Ok(n) = v.parse()
        {
            config.shop.lottery_qualify_cents = n;
        }
        if let Ok(v) = env::var("SHOP_COUPON_BATCH_MAX")
            && let Ok(n) = v.parse()
        {
            config.shop.coupon_batch_max = n;
        }
        if let Ok(v) = env::var("SHOP_UNPAID_ORDER_EXPIRE_MINUTES")
            && let Ok(n) = v.parse()
        {
            config.shop.unpaid_order_expire_minutes = n;
        }
        if let Ok(v) = env::var("SHOP_PURGE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.shop.purge_interval_secs = n;
        }
        if let Ok(v) = env::var("SHOP_IS_OPEN")
            && let Ok(b) = v.parse()
        {
            config.shop.is_open = b;
        }

        Ok(config)
    }
}
