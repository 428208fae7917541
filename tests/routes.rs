use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::Value;

use chess_room_server::config::ServerConfig;
use chess_room_server::game::registry::lock;
use chess_room_server::game::{ChessRules, RoomRegistry};
use chess_room_server::routes::configure_routes;
use chess_room_server::state::{AppState, Subscriber};

fn app_state() -> web::Data<AppState> {
    let rooms = RoomRegistry::new(Arc::new(ChessRules), 60_000);
    web::Data::new(AppState::new(rooms, ServerConfig::default()))
}

#[actix_rt::test]
async fn test_index() {
    let app = test::init_service(App::new().app_data(app_state()).configure(configure_routes)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_unknown_room_is_not_created_by_lookup() {
    let state = app_state();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/rooms/nowhere").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(state.rooms.get("nowhere").is_none());
}

#[actix_rt::test]
async fn test_room_snapshot_and_teardown() {
    let state = app_state();
    {
        let room = state.rooms.get_or_create("lobby");
        let mut game = lock(&room);
        game.join("alice");
        game.join("bob");
    }
    state.subscribe(
        "lobby",
        Subscriber {
            connection_id: "conn-1".to_string(),
            identity: "alice".to_string(),
        },
    );
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/rooms/lobby").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["room_id"], "lobby");
    assert_eq!(body["players"][0]["identity"], "alice");
    assert_eq!(body["players"][1]["color"], "black");
    assert_eq!(body["is_over"], false);
    assert_eq!(body["fen"], "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");

    let resp = test::call_service(&app, test::TestRequest::delete().uri("/rooms/lobby").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.subscriber_count("lobby"), 0);
    let resp = test::call_service(&app, test::TestRequest::delete().uri("/rooms/lobby").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(state.rooms.is_empty());
}
