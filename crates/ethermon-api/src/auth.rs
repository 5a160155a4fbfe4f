use crate::error::{ApiError, Result};
use crate::state::AppState;
use anyhow::Result as AnyResult;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// 管理员角色
pub const ROLE_ADMIN: &str = "admin";

/// 操作员角色
pub const ROLE_OPERATOR: &str = "operator";

/// JWT 认证管理器
///
/// 只负责令牌的签发与校验；用户与口令管理属于外部协作方。
pub struct JwtAuth {
    secret: Arc<String>,
    expiration: Duration,
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    /// 用户角色
    pub roles: Vec<String>,
    /// 过期时间
    pub exp: i64,
    /// 签发时间
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl Claims {
    /// 是否拥有某个角色
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl JwtAuth {
    /// 创建认证管理器
    pub fn new(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret),
            expiration: Duration::hours(expiration_hours),
        }
    }

    /// 签发令牌
    pub fn generate_token(&self, user_id: &str, roles: Vec<String>) -> AnyResult<String> {
        let now = Utc::now();
        let exp = (now + self.expiration).timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            roles,
            exp,
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// 校验令牌
    pub fn verify_token(&self, token: &str) -> AnyResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

/// 认证中间件
///
/// 校验 `Authorization: Bearer` 头，把 Claims 放进请求扩展里。
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    debug!(user = %claims.sub, "Request authenticated");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_token() {
        let auth = JwtAuth::new("test-secret".to_string(), 1);

        let token = auth
            .generate_token("user123", vec![ROLE_ADMIN.to_string()])
            .unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "user123");
        assert!(claims.has_role(ROLE_ADMIN));
        assert!(!claims.has_role(ROLE_OPERATOR));
    }

    #[test]
    fn test_invalid_token() {
        let auth = JwtAuth::new("test-secret".to_string(), 1);

        let result = auth.verify_token("invalid-token");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let auth = JwtAuth::new("secret-a".to_string(), 1);
        let other = JwtAuth::new("secret-b".to_string(), 1);

        let token = auth.generate_token("user123", vec![]).unwrap();
        assert!(other.verify_token(&token).is_err());
    }
}
