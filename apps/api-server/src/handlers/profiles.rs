//! Profile handlers.

use actix_web::{HttpResponse, web};

use typelab_core::domain::Profile;
use typelab_shared::dto::{ProfileIdsQuery, ProfileResponse, UpdateProfileRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/profiles?ids=a,b
pub async fn get_profiles(
    state: web::Data<AppState>,
    query: web::Query<ProfileIdsQuery>,
) -> AppResult<HttpResponse> {
    let ids = query.parse_ids().map_err(AppError::BadRequest)?;
    let profiles = state.profiles.find_by_ids(&ids).await?;

    let body: Vec<ProfileResponse> = profiles.into_iter().map(ProfileResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// PUT /api/profiles/me
pub async fn update_my_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let profile = Profile::new(identity.user_id, &body.display_name)?;
    let profile = state.profiles.save(profile).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}
