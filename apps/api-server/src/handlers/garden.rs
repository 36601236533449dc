//! The garden view: one tile per day since the garden opened.

use actix_web::{HttpResponse, web};

use typelab_core::domain::Category;
use typelab_core::feed::{self, GardenQuery};
use typelab_core::garden::{GardenWindow, RandomWater};
use typelab_shared::dto::{GardenParams, GardenResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/garden?category=
pub async fn get_garden(
    state: web::Data<AppState>,
    params: web::Query<GardenParams>,
) -> AppResult<HttpResponse> {
    let category = Category::parse_filter(params.category.as_deref())?;
    let window = GardenWindow::ending_today(state.garden.start_date, state.garden.offset_minutes);
    let query = GardenQuery::new(window).with_category(category);

    let mut decoration = RandomWater::from_entropy();
    let snapshot = feed::load_garden(
        state.posts.as_ref(),
        state.profiles.as_ref(),
        &query,
        &mut decoration,
    )
    .await?;

    tracing::debug!(
        tiles = snapshot.tiles.len(),
        authors = snapshot.authors.len(),
        category = ?category,
        "Garden built"
    );

    Ok(HttpResponse::Ok().json(GardenResponse::from(&snapshot)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use chrono::{Days, NaiveDate};
    use serde_json::json;

    use typelab_core::garden::GardenWindow;

    use crate::handlers::testing::TestContext;

    #[actix_web::test]
    async fn test_new_post_grows_grass_on_its_publish_day() {
        let ctx = TestContext::new();
        let app = init_app!(ctx);
        let (_, auth) = ctx.user("Kim").await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(auth)
            .set_json(json!({"title": "today", "content": "x", "category": "daily"}))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let published_on = created["published_on"].as_str().unwrap().to_string();

        let garden: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/garden").to_request(),
        )
        .await;

        // The window comes from the response itself, so a midnight between
        // the two requests cannot skew the expectations.
        let day = |v: &serde_json::Value| NaiveDate::parse_from_str(v.as_str().unwrap(), "%Y-%m-%d").unwrap();
        let window = GardenWindow::new(day(&garden["start_date"]), day(&garden["today"]));
        let tiles = garden["tiles"].as_array().unwrap();
        assert_eq!(tiles.len(), window.day_count().unwrap());

        let grown = tiles
            .iter()
            .find(|t| t["date"] == published_on.as_str())
            .unwrap();
        assert_eq!(grown["type"], "grass-short");
        assert_eq!(grown["blade_count"], 3);
        assert_eq!(grown["posts"][0]["title"], "today");
        assert_eq!(grown["posts"][0]["author_name"], "Kim");

        let with_posts = tiles
            .iter()
            .filter(|t| !t["posts"].as_array().unwrap().is_empty())
            .count();
        assert_eq!(with_posts, 1);

        let info: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/garden?category=info")
                .to_request(),
        )
        .await;
        let info_tiles = info["tiles"].as_array().unwrap();
        assert_eq!(info_tiles.len(), tiles.len());
        assert!(info_tiles
            .iter()
            .all(|t| t["posts"].as_array().unwrap().is_empty()));
    }

    #[actix_web::test]
    async fn test_future_start_date_renders_empty_grid() {
        let mut ctx = TestContext::new();
        ctx.state.garden.start_date = chrono::Utc::now()
            .date_naive()
            .checked_add_days(Days::new(30))
            .unwrap();
        let app = init_app!(ctx);

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/garden").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let garden: serde_json::Value = test::read_body_json(res).await;
        assert!(garden["tiles"].as_array().unwrap().is_empty());
    }
}
