//! JWT Token 处理
//!
//! 提供 JWT Token 的验证与（测试/工具场景下的）生成。
//! 与认证服务通过共享密钥约定 HS256 签名。

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use loyalty_shared::config::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 用户 login
    pub sub: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expires_in_secs: i64,
}

impl JwtManager {
    /// 创建 JWT 管理器
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            expires_in_secs: 86400,
        }
    }

    /// 生成 JWT Token
    ///
    /// 正常部署下令牌由认证服务签发，这里的生成入口服务于
    /// 本地联调和集成测试。
    pub fn generate_token(&self, login: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: login.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expires_in_secs)).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(format!("签发 Token 失败: {}", e)))
    }

    /// 验证 JWT Token 并返回 Claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::Unauthorized(format!("Token 无效: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: "loyalty-auth".to_string(),
        })
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = manager();
        let token = jwt.generate_token("alice").unwrap();
        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "loyalty-auth");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = manager();
        let err = jwt.verify_token("not-a-token").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt = manager();
        let other = JwtManager::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            issuer: "loyalty-auth".to_string(),
        });

        let token = other.generate_token("alice").unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let jwt = manager();
        let other = JwtManager::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: "someone-else".to_string(),
        });

        let token = other.generate_token("alice").unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }
}
