use actix_cors::Cors;
use actix_web::{
    delete, get, patch, post, web, App, HttpResponse, HttpServer, Responder,
    Result as ActixResult,
};
use actix_ws::Message;
use cardcore::{CardId, CardPatch, CardStore, EngineError, EventBus};
use cardengine::WorkflowEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Application state shared across handlers
struct AppState {
    engine: Arc<WorkflowEngine>,
    store: Arc<RwLock<CardStore>>,
    /// Whether a real credential is configured; without one, runs are only
    /// allowed when mock mode was explicitly enabled.
    credentialed: bool,
    allow_mock: bool,
}

/// Request body for card creation
#[derive(Debug, Default, Deserialize)]
struct CreateCardRequest {
    parent_id: Option<CardId>,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cardserver"
    }))
}

/// List the whole card forest, keyed by card id, as the canvas consumes it
#[get("/api/cards")]
async fn list_cards(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let store = data.store.read().await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "cards": store.cards })))
}

/// Create a card, optionally as a child of an existing one
#[post("/api/cards")]
async fn create_card(
    data: web::Data<AppState>,
    req: web::Json<CreateCardRequest>,
) -> ActixResult<impl Responder> {
    let parent = req.into_inner().parent_id;
    let mut store = data.store.write().await;

    match store.create_card(parent) {
        Some(id) => {
            info!("Created card {} (parent: {:?})", id, parent);
            Ok(HttpResponse::Created().json(store.get(&id)))
        }
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Parent card {} not found", parent.unwrap_or_default()),
        })),
    }
}

/// Merge prompt/position updates into a card
#[patch("/api/cards/{id}")]
async fn update_card(
    data: web::Data<AppState>,
    path: web::Path<CardId>,
    patch: web::Json<CardPatch>,
) -> ActixResult<impl Responder> {
    let card_id = path.into_inner();
    let mut store = data.store.write().await;

    if !store.contains(&card_id) {
        return Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Card {} not found", card_id),
        }));
    }

    store.apply(card_id, patch.into_inner());
    Ok(HttpResponse::Ok().json(store.get(&card_id)))
}

/// Delete a card and its entire descendant subtree
#[delete("/api/cards/{id}")]
async fn delete_card(
    data: web::Data<AppState>,
    path: web::Path<CardId>,
) -> ActixResult<impl Responder> {
    let card_id = path.into_inner();
    let mut store = data.store.write().await;

    store.delete_card(card_id);
    info!("Deleted card {} and its subtree", card_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Card deleted successfully"
    })))
}

/// Run every tree in the forest, waiting for full settlement
#[post("/api/run")]
async fn run_workflow(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    if !data.credentialed && !data.allow_mock {
        return Ok(HttpResponse::PreconditionFailed().json(ErrorResponse {
            error: "No API key configured. Set GEMINI_API_KEY (or CARDFLOW_ALLOW_MOCK=1 \
                    for mocked completions) before running a workflow."
                .to_string(),
        }));
    }

    match data.engine.run().await {
        Ok(summary) => {
            info!(
                "Run {} settled: {}/{} cards completed, {} failed",
                summary.run_id, summary.completed, summary.total, summary.failed
            );
            Ok(HttpResponse::Ok().json(summary))
        }
        Err(EngineError::RunInFlight) => Ok(HttpResponse::Conflict().json(ErrorResponse {
            error: "A run is already in progress".to_string(),
        })),
        Err(e) => {
            error!("Run failed to start: {}", e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

/// WebSocket endpoint streaming execution events to the canvas
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    let mut events = data.engine.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting card workflow server");

    let api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let credentialed = api_key.is_some();
    let allow_mock = std::env::var("CARDFLOW_ALLOW_MOCK").is_ok_and(|v| v == "1");

    if !credentialed {
        info!("No GEMINI_API_KEY set; runs require CARDFLOW_ALLOW_MOCK=1");
    }

    let store = Arc::new(RwLock::new(CardStore::new()));
    let client = cardclient::client_for(api_key.as_deref());
    let engine = Arc::new(WorkflowEngine::with_event_bus(
        Arc::clone(&store),
        client,
        Arc::new(EventBus::default()),
    ));

    let app_state = web::Data::new(AppState {
        engine,
        store,
        credentialed,
        allow_mock,
    });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(list_cards)
            .service(create_card)
            .service(update_card)
            .service(delete_card)
            .service(run_workflow)
            .service(websocket_events)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
