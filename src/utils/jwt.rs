use crate::error::{AppError, AppResult};
use crate::models::AuthActor;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// "customer" / "agent" / "admin"
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    /// 还原请求身份；sub 无法解析按无效凭证处理
    pub fn actor(&self) -> AppResult<AuthActor> {
        let id = self
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        match self.role.as_str() {
            "customer" => Ok(AuthActor::Customer(id)),
            "agent" => Ok(AuthActor::Agent(id)),
            "admin" => Ok(AuthActor::Admin),
            _ => Err(AppError::AuthError("Unknown role".to_string())),
        }
    }
}

/// 只负责校验。令牌由账号体系签发，本服务不发令牌
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn mint(secret: &str, sub: &str, role: &str, token_type: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = JwtService::new("test-secret");
        let token = mint("test-secret", "42", "customer", "access");
        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.actor().unwrap(), AuthActor::Customer(42));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let jwt = JwtService::new("test-secret");
        let token = mint("test-secret", "3", "agent", "refresh");
        assert!(jwt.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt = JwtService::new("test-secret");
        let token = mint("other-secret", "1", "customer", "access");
        assert!(jwt.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let claims = Claims {
            sub: "1".to_string(),
            role: "robot".to_string(),
            exp: 0,
            iat: 0,
            token_type: "access".to_string(),
        };
        assert!(claims.actor().is_err());
    }
}
