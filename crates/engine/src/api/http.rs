//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use lorekeeper_domain::{CharacterId, GameId, ItemId, PartyMemberId};

use crate::app::App;
use crate::use_cases::inventory::InventoryError;
use crate::use_cases::narration::{NarrationError, NarrationOutcome};

/// How many turns the history endpoint returns.
const TURN_PAGE_SIZE: usize = 50;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/games", post(create_game))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/party", get(get_party).post(add_party_member))
        .route("/api/games/{id}/turns", get(get_turns))
        .route("/api/games/{id}/actions", post(post_action))
        .route(
            "/api/party/{member_id}/items/{item_id}/use",
            post(use_item),
        )
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameRequest {
    name: String,
    #[serde(default)]
    setting: String,
    provider: lorekeeper_domain::ProviderKind,
}

async fn create_game(
    State(app): State<Arc<App>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<lorekeeper_domain::Game>, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Game name cannot be empty".to_string()));
    }
    let game = lorekeeper_domain::Game::new(request.name.trim(), request.provider)
        .with_setting(request.setting);
    app.repositories.games.save(&game).await?;
    Ok(Json(game))
}

async fn get_game(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<lorekeeper_domain::Game>, ApiError> {
    let game = app
        .repositories
        .games
        .get(GameId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(game))
}

async fn get_party(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<lorekeeper_domain::PartyMember>>, ApiError> {
    let roster = app.repositories.party.roster(GameId::from_uuid(id)).await?;
    Ok(Json(roster))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPartyMemberRequest {
    name: String,
    class_name: String,
    #[serde(default)]
    stats: String,
    character_id: Option<Uuid>,
}

async fn add_party_member(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddPartyMemberRequest>,
) -> Result<Json<lorekeeper_domain::PartyMember>, ApiError> {
    let game_id = GameId::from_uuid(id);
    app.repositories
        .games
        .get(game_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let name = lorekeeper_domain::CharacterName::new(request.name)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let character_id = request
        .character_id
        .map(CharacterId::from_uuid)
        .unwrap_or_else(CharacterId::new);
    let member = lorekeeper_domain::PartyMember::new(
        game_id,
        character_id,
        name,
        request.class_name,
    )
    .with_stats(request.stats);
    app.repositories.party.save(&member).await?;
    Ok(Json(member))
}

async fn get_turns(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<lorekeeper_domain::Turn>>, ApiError> {
    let turns = app
        .repositories
        .turns
        .recent(GameId::from_uuid(id), TURN_PAGE_SIZE)
        .await?;
    Ok(Json(turns))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest {
    character_id: Option<Uuid>,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    turn: lorekeeper_domain::Turn,
    /// True when generation failed and the turn is the fallback notice.
    unavailable: bool,
}

async fn post_action(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = app
        .use_cases
        .narration
        .handle_player_action
        .execute(
            GameId::from_uuid(id),
            request.character_id.map(CharacterId::from_uuid),
            &request.message,
        )
        .await?;

    let response = match outcome {
        NarrationOutcome::Narrated { turn } => ActionResponse {
            turn,
            unavailable: false,
        },
        NarrationOutcome::Unavailable { turn } => ActionResponse {
            turn,
            unavailable: true,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UseItemResponse {
    item_name: String,
    remaining: u32,
}

async fn use_item(
    State(app): State<Arc<App>>,
    Path((member_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UseItemResponse>, ApiError> {
    let outcome = app
        .use_cases
        .inventory
        .use_item
        .execute(
            PartyMemberId::from_uuid(member_id),
            ItemId::from_uuid(item_id),
        )
        .await?;
    Ok(Json(UseItemResponse {
        item_name: outcome.item_name.to_string(),
        remaining: outcome.remaining,
    }))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::MemberNotFound(_) | InventoryError::ItemNotFound(_) => {
                ApiError::NotFound
            }
            InventoryError::NotHeld | InventoryError::NotUsable(_) => {
                ApiError::BadRequest(e.to_string())
            }
            InventoryError::Repo(e) => e.into(),
        }
    }
}

impl From<NarrationError> for ApiError {
    fn from(e: NarrationError) -> Self {
        match e {
            NarrationError::GameNotFound(_) => ApiError::NotFound,
            NarrationError::EmptyMessage => ApiError::BadRequest(e.to_string()),
            NarrationError::Repo(e) => e.into(),
        }
    }
}
