use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::routing::{get, post};
use axum::Router;

use ballcards_infrastructure::services::ServiceRegistry;

use ballcards_interface::errors::{AppError, Result};
use ballcards_interface::players::model::{
    DescriptionResponse, GetPlayersQuery, Player, PlayersPage, UpdatePlayerRequest,
};
use ballcards_interface::players::service::PlayersServiceHandle;

pub struct PlayersRouter;

impl PlayersRouter {
    pub fn new(service_registry: ServiceRegistry) -> Router {
        Router::new()
            .route("/players", get(Self::get_players))
            .route(
                "/players/:id",
                get(Self::get_player).put(Self::update_player),
            )
            .route("/players/:id/description", post(Self::generate_description))
            .with_state(service_registry)
    }

    // The query is validated before reaching the store, a malformed query
    // string is reported like any other validation error.
    async fn get_players(
        State(players_service): State<PlayersServiceHandle>,
        params: std::result::Result<Query<GetPlayersQuery>, QueryRejection>,
    ) -> Result<Json<PlayersPage>> {
        let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;
        let listing = params.validate()?;

        players_service.get_players(listing).await.map(Json)
    }

    async fn get_player(
        State(players_service): State<PlayersServiceHandle>,
        Path(id): Path<String>,
    ) -> Result<Json<Player>> {
        players_service.get_player(&id).await.map(Json)
    }

    async fn update_player(
        State(players_service): State<PlayersServiceHandle>,
        Path(id): Path<String>,
        body: std::result::Result<Json<UpdatePlayerRequest>, JsonRejection>,
    ) -> Result<Json<Player>> {
        let Json(body) = body.map_err(|e| AppError::validation(e.body_text()))?;
        let changes = body.validate()?;

        players_service.update_player(&id, changes).await.map(Json)
    }

    async fn generate_description(
        State(players_service): State<PlayersServiceHandle>,
        Path(id): Path<String>,
    ) -> Result<Json<DescriptionResponse>> {
        let player = players_service.get_player(&id).await?;

        // TODO: generate the description with the AI agent instead of the placeholder.
        let updated = players_service
            .set_description(&id, player.placeholder_description())
            .await?;

        Ok(Json(DescriptionResponse {
            description: updated.description.unwrap_or_default(),
        }))
    }
}
