//! 媒体会话令牌签发
//!
//! 令牌是 `(appId, roomId, userId, expiry)` 与共享密钥的 HMAC 签名拼接，
//! 由第三方媒体中继用同一密钥独立校验。密钥缺失时返回可识别的
//! 哨兵令牌 `invalid-token`，由调用方决定是否硬失败。

use config::MediaConfig;
use data_encoding::HEXLOWER;
use domain::UserId;
use ring::hmac;
use tracing::warn;

/// 密钥缺失时的哨兵令牌
pub const INVALID_TOKEN: &str = "invalid-token";

/// 媒体令牌签发接口
pub trait MediaTokenIssuer: Send + Sync {
    /// 为一个参与者在一个媒体房间内签发短时令牌
    fn mint(&self, user_id: UserId, room: &str) -> String;
}

/// 基于 HMAC-SHA256 共享密钥的令牌签发器
pub struct HmacMediaTokenIssuer {
    app_id: String,
    secret: Option<String>,
    ttl_secs: u64,
}

impl HmacMediaTokenIssuer {
    pub fn new(media: &MediaConfig) -> Self {
        Self {
            app_id: media.app_id.clone(),
            secret: media
                .app_secret
                .clone()
                .filter(|secret| !secret.is_empty()),
            ttl_secs: media.token_ttl_secs,
        }
    }
}

impl MediaTokenIssuer for HmacMediaTokenIssuer {
    fn mint(&self, user_id: UserId, room: &str) -> String {
        let secret = match &self.secret {
            Some(secret) => secret,
            None => {
                warn!(user_id = %user_id, room, "媒体密钥未配置，返回哨兵令牌");
                return INVALID_TOKEN.to_string();
            }
        };

        let expiry = chrono::Utc::now().timestamp() as u64 + self.ttl_secs;
        let payload = format!("{}:{}:{}:{}", self.app_id, room, user_id, expiry);

        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, payload.as_bytes());

        format!("{}:{}", payload, HEXLOWER.encode(signature.as_ref()))
    }
}
