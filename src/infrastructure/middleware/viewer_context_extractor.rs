// Viewer extractor - turns the identity headers set by the upstream auth layer into a ViewerContext

use axum::{extract::FromRequestParts, http::{request::Parts, HeaderMap}};

use crate::core::UserId;
use crate::error::AppError;
use crate::infrastructure::viewer::{ViewerContext, ViewerRole};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated viewer for handlers that require a signed-in user.
///
/// Rejects with 401 when the identity headers are missing or malformed.
#[derive(Debug, Clone)]
pub struct Vc(pub ViewerContext);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ViewerContext> for Vc {
    fn as_ref(&self) -> &ViewerContext {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_viewer(&parts.headers).map(Vc)
    }
}

/// Viewer that must hold the admin role. 401 without identity, 403 for non-admins.
#[derive(Debug, Clone)]
pub struct AdminVc(pub ViewerContext);

impl std::ops::Deref for AdminVc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AdminVc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let viewer = extract_viewer(&parts.headers)?;
        viewer.require_admin()?;
        Ok(AdminVc(viewer))
    }
}

fn extract_viewer(headers: &HeaderMap) -> Result<ViewerContext, AppError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no identity".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed user id header".to_string()))?
        .parse::<UserId>()
        .map_err(|_| AppError::Unauthorized("Malformed user id header".to_string()))?;

    if !user_id.is_valid() {
        return Err(AppError::Unauthorized("Malformed user id header".to_string()));
    }

    let role = match headers.get(USER_ROLE_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed role header".to_string()))?
            .parse::<ViewerRole>()?,
        None => ViewerRole::User,
    };

    Ok(ViewerContext { user_id, role })
}
