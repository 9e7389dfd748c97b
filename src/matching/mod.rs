pub mod scorer;
pub mod service;

use axum::{
    debug_handler,
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{auth::CurrentUser, AppResult, AppState};

pub use service::{MatchQueryService, OpportunityMatch, VolunteerMatch};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(for_volunteer))
        .route("/{opportunity_id}", get(for_opportunity))
}

#[debug_handler(state = AppState)]
async fn for_volunteer(
    State(matches): State<MatchQueryService>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<OpportunityMatch>>> {
    Ok(Json(matches.matches_for_volunteer(user_id).await?))
}

#[debug_handler(state = AppState)]
async fn for_opportunity(
    State(matches): State<MatchQueryService>,
    CurrentUser(user_id): CurrentUser,
    opportunity_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<VolunteerMatch>>> {
    let Path(opportunity_id) = opportunity_id?;
    Ok(Json(matches.matches_for_opportunity(opportunity_id, user_id).await?))
}
