use actix_web::{web, HttpResponse, Responder};
use log::info;

use crate::game::project;
use crate::game::registry::lock;
use crate::state::AppState;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Room Server")
}

/// Current snapshot of a live room. Never creates the room.
pub async fn get_room(path: web::Path<String>, app_state: web::Data<AppState>) -> impl Responder {
    let room_id = path.into_inner();
    match app_state.rooms.get(&room_id) {
        Some(room) => {
            let snapshot = project(&lock(&room));
            HttpResponse::Ok().json(snapshot)
        }
        None => HttpResponse::NotFound().body(format!("Room not found: {}", room_id)),
    }
}

/// Tear a room down and tell its connections; the next join starts a fresh
/// match.
pub async fn delete_room(path: web::Path<String>, app_state: web::Data<AppState>) -> impl Responder {
    let room_id = path.into_inner();
    if app_state.rooms.remove(&room_id) {
        let notified = app_state.close_room(&room_id);
        info!("Room {} torn down over HTTP, {} connection(s) notified", room_id, notified);
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().body(format!("Room not found: {}", room_id))
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(
            web::resource("/rooms/{room_id}")
                .route(web::get().to(get_room))
                .route(web::delete().to(delete_room)),
        )
        .service(web::resource("/").route(web::get().to(index)));
}
