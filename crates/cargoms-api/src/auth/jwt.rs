//! JWT 토큰 발급/검증.
//!
//! HS256으로 서명된 Access Token을 사용합니다. 서명 키는 시작 시 한 번 로드되며
//! 이후 읽기 전용입니다. 폐기 목록과 리프레시 토큰은 지원하지 않습니다.

use cargoms_core::{JwtConfig, Role, User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Identity;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 사용자 이름
    pub username: String,
    /// 사용자 역할. 검증 시 닫힌 열거형으로 변환됩니다.
    pub role: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// 발급된 토큰.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

/// JWT 처리 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(String),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("토큰 서명이 유효하지 않습니다")]
    InvalidSignature,
    #[error("토큰 발급자가 일치하지 않습니다")]
    InvalidIssuer,
    #[error("토큰 대상이 일치하지 않습니다")]
    InvalidAudience,
    #[error("알 수 없는 역할: {0}")]
    UnknownRole(String),
    #[error("잘못된 토큰 형식")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            _ => TokenError::Malformed,
        }
    }
}

/// 토큰 발급기/검증기.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: Duration::minutes(config.expires_minutes),
        }
    }

    /// 토큰 유효 기간.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// 사용자에게 새 토큰을 발급합니다 (로그인).
    pub fn issue_for(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let expires_at = truncate_to_seconds(Utc::now() + self.lifetime);
        let identity = Identity::for_user(user, expires_at);
        let token = self.issue(&identity)?;
        Ok(IssuedToken {
            token,
            expires_at,
            identity,
        })
    }

    /// 신원을 서명된 토큰으로 만듭니다. 만료 시각은 `identity.expires_at`입니다.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.subject_id.to_string(),
            username: identity.username.clone(),
            role: identity.role.as_str().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: Utc::now().timestamp(),
            exp: identity.expires_at.timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };
        self.encode_claims(&claims)
    }

    /// 토큰을 검증하고 신원을 반환합니다.
    ///
    /// 서명 불일치, 만료(now ≥ exp), 발급자/대상 불일치, 형식 오류, 알 수 없는 역할은
    /// 모두 실패입니다.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let subject_id: i64 = claims.sub.parse().map_err(|_| TokenError::Malformed)?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| TokenError::UnknownRole(claims.role.clone()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        debug!(subject_id, role = %role, "Token validated");
        Ok(Identity::new(subject_id, claims.username, role, expires_at))
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(audience: &str) -> JwtConfig {
        JwtConfig::new("test-secret-key-for-unit-tests", "cargoms", audience, 60)
    }

    fn identity(expires_at: DateTime<Utc>) -> Identity {
        Identity::new(7, "alice", Role::User, truncate_to_seconds(expires_at))
    }

    /// 서명 세그먼트 중간의 한 글자를 바꿉니다.
    fn flip_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_round_trip() {
        let service = TokenService::new(&config("cargoms-clients"));
        let original = identity(Utc::now() + Duration::minutes(5));

        let token = service.issue(&original).unwrap();
        let validated = service.validate(&token).unwrap();

        assert_eq!(validated, original);
    }

    #[test]
    fn test_issue_for_user() {
        let service = TokenService::new(&config("cargoms-clients"));
        let user = User {
            id: 3,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        };

        let issued = service.issue_for(&user).unwrap();
        let validated = service.validate(&issued.token).unwrap();
        assert_eq!(validated.subject_id, 3);
        assert_eq!(validated.role, Role::Admin);
        assert_eq!(validated.expires_at, issued.expires_at);
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(&config("cargoms-clients"));
        let token = service
            .issue(&identity(Utc::now() - Duration::seconds(10)))
            .unwrap();

        assert_eq!(service.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_flipped_signature_rejected() {
        let service = TokenService::new(&config("cargoms-clients"));
        let token = service
            .issue(&identity(Utc::now() + Duration::minutes(5)))
            .unwrap();

        assert!(service.validate(&flip_signature(&token)).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let issuer = TokenService::new(&config("cargoms-clients"));
        let other = TokenService::new(&config("someone-else"));
        let token = issuer
            .issue(&identity(Utc::now() + Duration::minutes(5)))
            .unwrap();

        assert_eq!(other.validate(&token), Err(TokenError::InvalidAudience));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new(&config("cargoms-clients"));
        let other = TokenService::new(&JwtConfig::new(
            "a-completely-different-secret",
            "cargoms",
            "cargoms-clients",
            60,
        ));
        let token = issuer
            .issue(&identity(Utc::now() + Duration::minutes(5)))
            .unwrap();

        assert_eq!(other.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let service = TokenService::new(&config("cargoms-clients"));
        let claims = Claims {
            sub: "1".to_string(),
            username: "mallory".to_string(),
            role: "Superuser".to_string(),
            iss: "cargoms".to_string(),
            aud: "cargoms-clients".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            jti: None,
        };
        let token = service.encode_claims(&claims).unwrap();

        assert_eq!(
            service.validate(&token),
            Err(TokenError::UnknownRole("Superuser".to_string()))
        );
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = TokenService::new(&config("cargoms-clients"));
        assert_eq!(service.validate("not-a-jwt"), Err(TokenError::Malformed));
    }
}
