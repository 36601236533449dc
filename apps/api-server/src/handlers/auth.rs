//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use typelab_core::authors::ANONYMOUS_LABEL;
use typelab_core::domain::{Profile, User};
use typelab_core::ports::{AuthError, PasswordService, TokenService};
use typelab_shared::dto::{AuthResponse, MeResponse, SignInRequest, SignUpRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(token_service: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = token_service
        .generate_token(user.id, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
    })
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<SignUpRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = User::normalize_email(&req.email)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;
    let user = User::new(email, password_hash);

    // Validate the profile before anything is written.
    let profile = Profile::new(user.id, &req.display_name)?;

    let user = state.users.save(user).await?;
    if let Err(e) = state.profiles.save(profile).await {
        // Undo the account so the email can sign up again.
        if let Err(cleanup) = state.users.delete(user.id).await {
            tracing::error!(user_id = %user.id, error = %cleanup, "Orphaned user left after failed sign-up");
        }
        return Err(e.into());
    }

    tracing::info!(user_id = %user.id, "User signed up");

    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<SignInRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    // An address that cannot be normalized cannot belong to any account.
    let email = User::normalize_email(&req.email).map_err(|_| AuthError::InvalidCredentials)?;
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Sign-in with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// POST /api/auth/sign-out
///
/// Tokens are stateless; the client discards its copy.
pub async fn sign_out() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let display_name = state
        .profiles
        .find_by_id(user.id)
        .await?
        .map(|profile| profile.display_name)
        .unwrap_or_else(|| ANONYMOUS_LABEL.to_string());

    Ok(HttpResponse::Ok().json(MeResponse {
        id: user.id,
        email: user.email,
        display_name,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use typelab_core::domain::Profile;
    use typelab_core::error::RepoError;
    use typelab_core::ports::{BaseRepository, ProfileRepository};
    use typelab_infra::InMemoryProfileRepository;

    use crate::handlers::testing::TestContext;

    /// Profile store whose writes always fail.
    struct BrokenProfiles;

    #[async_trait]
    impl BaseRepository<Profile, Uuid> for BrokenProfiles {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Profile>, RepoError> {
            Ok(None)
        }

        async fn save(&self, _entity: Profile) -> Result<Profile, RepoError> {
            Err(RepoError::Query("profiles table locked".to_string()))
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Err(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl ProfileRepository for BrokenProfiles {
        async fn find_by_ids(&self, _ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
            Ok(Vec::new())
        }
    }

    fn sign_up(body: serde_json::Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/auth/sign-up")
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_sign_up_sign_in_and_me() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);

        let res = test::call_service(
            &app,
            sign_up(json!({"email": "Kim@Typelab.dev", "password": "hunter22", "display_name": " Kim "})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(json!({"email": "kim@typelab.dev", "password": "hunter22"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(body["token_type"], "Bearer");

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["email"], "kim@typelab.dev");
        assert_eq!(me["display_name"], "Kim");
    }

    #[actix_web::test]
    async fn test_sign_up_validation() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);

        for body in [
            json!({"email": "no-at-sign", "password": "hunter22", "display_name": "Kim"}),
            json!({"email": "kim@typelab.dev", "password": "short", "display_name": "Kim"}),
            json!({"email": "kim@typelab.dev", "password": "hunter22", "display_name": "   "}),
        ] {
            let res = test::call_service(&app, sign_up(body).to_request()).await;
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }

        // Nothing was written by the rejected attempts.
        let res = test::call_service(
            &app,
            sign_up(json!({"email": "kim@typelab.dev", "password": "hunter22", "display_name": "Kim"})).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_duplicate_email_conflicts() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);
        let body = json!({"email": "lee@typelab.dev", "password": "hunter22", "display_name": "Lee"});

        let first = test::call_service(&app, sign_up(body.clone()).to_request()).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = test::call_service(&app, sign_up(body).to_request()).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_failed_profile_write_removes_the_account() {
        let mut ctx = TestContext::new();
        ctx.state.profiles = Arc::new(BrokenProfiles);
        let body = json!({"email": "choi@typelab.dev", "password": "hunter22", "display_name": "Choi"});

        let app = init_app!(ctx);
        let res = test::call_service(&app, sign_up(body.clone()).to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            ctx.state
                .users
                .find_by_email("choi@typelab.dev")
                .await
                .unwrap()
                .is_none()
        );

        // Once profiles work again the same email can register.
        ctx.state.profiles = Arc::new(InMemoryProfileRepository::new());
        let app = init_app!(ctx);
        let res = test::call_service(&app, sign_up(body).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_wrong_password_is_unauthorized() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);
        test::call_service(
            &app,
            sign_up(json!({"email": "park@typelab.dev", "password": "hunter22", "display_name": "Park"})).to_request(),
        )
        .await;

        for (email, password) in [("park@typelab.dev", "wrong-pass"), ("ghost@typelab.dev", "hunter22")] {
            let req = test::TestRequest::post()
                .uri("/api/auth/sign-in")
                .set_json(json!({"email": email, "password": password}))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn test_me_requires_token() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/auth/me").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["title"], "Authentication Required");
    }

    #[actix_web::test]
    async fn test_sign_out_acknowledges() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);
        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/auth/sign-out").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
