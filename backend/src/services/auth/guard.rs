//! Request guards.
//!
//! A guard is an ordered chain of steps run before the handler. Each step
//! sees the request and the claims produced so far, and either passes them on
//! or stops the request with an [`ApiError`]. Handlers opt in by taking
//! [`AuthUser`] or [`AdminUser`] as an argument.

use crate::error::ApiError;
use crate::services::auth::token::Claims;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use log::warn;

type Step = fn(&HttpRequest, Option<Claims>) -> Result<Option<Claims>, ApiError>;

const AUTHENTICATED: &[Step] = &[bearer];
const PRIVILEGED: &[Step] = &[bearer, privileged];

fn run_chain(req: &HttpRequest, steps: &[Step]) -> Result<Claims, ApiError> {
    let mut claims = None;
    for step in steps {
        claims = step(req, claims)?;
    }
    claims.ok_or_else(|| ApiError::Unauthorized("No se ha proporcionado un token.".to_string()))
}

/// Decodes `Authorization: Bearer <token>`.
fn bearer(req: &HttpRequest, _: Option<Claims>) -> Result<Option<Claims>, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state not configured".to_string()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("No se ha proporcionado un token.".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Formato de token inválido.".to_string()))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected token on {}: {}", req.path(), e);
        ApiError::Unauthorized("Token inválido o expirado.".to_string())
    })?;
    Ok(Some(claims))
}

fn privileged(req: &HttpRequest, claims: Option<Claims>) -> Result<Option<Claims>, ApiError> {
    match claims {
        Some(claims) if claims.rol => Ok(Some(claims)),
        Some(claims) => {
            warn!("User {} denied on {}", claims.user_id, req.path());
            Err(ApiError::Forbidden("Acceso denegado.".to_string()))
        }
        None => Err(ApiError::Forbidden("Acceso denegado.".to_string())),
    }
}

/// Any caller with a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// A caller with a valid token and the privileged role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(run_chain(req, AUTHENTICATED).map(AuthUser))
    }
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(run_chain(req, PRIVILEGED).map(AdminUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::test::TestRequest;

    fn request(auth: Option<&str>) -> HttpRequest {
        let (state, _dir) = test_support::state();
        let mut req = TestRequest::default().app_data(web::Data::new(state));
        if let Some(value) = auth {
            req = req.insert_header((AUTHORIZATION, value));
        }
        req.to_http_request()
    }

    fn token(rol: bool) -> String {
        test_support::tokens().issue(1, "Ana", "Pérez", rol).unwrap()
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = run_chain(&request(None), AUTHENTICATED).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m == "No se ha proporcionado un token."));
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        let err = run_chain(&request(Some("Basic abc")), AUTHENTICATED).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m == "Formato de token inválido."));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let err = run_chain(&request(Some("Bearer not.a.jwt")), AUTHENTICATED).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(m) if m == "Token inválido o expirado."));
    }

    #[test]
    fn plain_users_pass_the_auth_chain_only() {
        let header = format!("Bearer {}", token(false));
        let req = request(Some(&header));

        assert!(run_chain(&req, AUTHENTICATED).is_ok());
        assert!(matches!(
            run_chain(&req, PRIVILEGED),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn admins_pass_both_chains() {
        let header = format!("Bearer {}", token(true));
        let req = request(Some(&header));

        let claims = run_chain(&req, PRIVILEGED).unwrap();
        assert!(claims.rol);
        assert_eq!(claims.user_id, 1);
    }
}
