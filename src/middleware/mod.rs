use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};

/// Токен вызывающего из `Authorization: Bearer ...`.
/// Без заголовка запросы к CRM идут с сервисным токеном из конфигурации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(BearerToken(None));
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    "Ожидается заголовок Authorization: Bearer <token>".to_string(),
                )
            })?;

        Ok(BearerToken(Some(token.to_string())))
    }
}
