use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::Shop;
use crate::session::{SessionError, ShopSession};

use super::error::ApiError;
use super::AppState;

// ============================================================================
// Authenticated shop extractor
// ============================================================================
//
// Resolves `Authorization: Bearer <token>` through the session provider.
// Every handler takes it as an argument, so a request without a valid session
// fails extraction and never reaches the repository. Other extractors (JSON
// body, path, query) may still fail first with their own 400/404.
//
// ============================================================================

pub struct AuthenticatedShop(ShopSession);

impl AuthenticatedShop {
    pub fn shop(&self) -> &Shop {
        &self.0.shop
    }

    pub fn session(&self) -> &ShopSession {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedShop {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);
        let path = req.path().to_string();

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not registered; cannot resolve sessions");
                return Err(ApiError::Internal("Session lookup unavailable"));
            };

            let token = token.ok_or(SessionError::Missing);
            let resolved = match token {
                Ok(token) => state.sessions.resolve(&token).await,
                Err(e) => Err(e),
            };

            match resolved {
                Ok(session) => Ok(AuthenticatedShop(session)),
                Err(SessionError::Store(e)) => {
                    tracing::error!(path = %path, error = %e, "Session lookup failed");
                    Err(ApiError::Internal("Session lookup unavailable"))
                }
                Err(e) => {
                    tracing::warn!(path = %path, reason = %e, "Rejected unauthenticated request");
                    Err(ApiError::Unauthorized)
                }
            }
        })
    }
}
