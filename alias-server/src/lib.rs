use serde::Serialize;
use std::sync::Arc;
use warp::Filter;

use crate::channels::ChannelRegistry;
use crate::websocket::ConnectionManager;
use alias_core::normalize_room_code;
use alias_types::{PresenceMeta, room_topic};

pub mod channels;
pub mod config;
pub mod websocket;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresenceResponse {
    room_id: String,
    members: Vec<PresenceMeta>,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<ChannelRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(registry_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, registry| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, registry))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Who is currently in a room
    let presence = warp::path!("rooms" / String / "presence")
        .and(warp::get())
        .and(registry_filter.clone())
        .and_then(handle_presence_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(presence)
        .with(cors)
        .with(warp::log("alias_relay"))
}

async fn handle_presence_request(
    code: String,
    registry: Arc<ChannelRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let room_id = match normalize_room_code(&code) {
        Ok(room_id) => room_id,
        Err(_) => {
            return Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Invalid room code"
                })),
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    let topic = room_topic(&room_id);
    if registry.subscribers(&topic).await.is_empty() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        ));
    }

    let members = registry.presence(&topic).await;
    Ok(warp::reply::with_status(
        warp::reply::json(&PresenceResponse { room_id, members }),
        warp::http::StatusCode::OK,
    ))
}
