//! HTTP API server: axum router and request handlers.
//!
//! The carousel itself runs its timer and analyses as Tokio tasks; the
//! handlers only issue navigation commands and read its state.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `WebSocketUpgrade`
//! - `tokio::select!` to watch state changes and the socket at once
//! - `tower-http` middleware for CORS and request tracing

use crate::carousel::{Carousel, Frame, Slide};
use crate::{Color, DefaultImageSource};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// The carousel served by the binary: images come from URLs or disk.
pub type HttpCarousel = Carousel<DefaultImageSource>;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
///
/// `Carousel` is an `Arc` inside, so axum's per-request clone is cheap.
#[derive(Clone)]
pub struct AppState {
    pub carousel: HttpCarousel,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(get_carousel, post_next, post_previous, get_images),
    components(schemas(CarouselView, GradientView, Slide, ImageEntry)),
    tags(
        (name = "carousel", description = "Carousel state and navigation"),
        (name = "media", description = "Image set"),
    ),
    info(
        title = "Gradient Carousel API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Image carousel with a background gradient derived from the current slide"
    )
)]
pub struct ApiDoc;

// ── Response types ───────────────────────────────────────────────────

/// Background gradient in both structured and CSS form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct GradientView {
    /// Gradient direction in degrees
    #[schema(example = 135)]
    pub angle_degrees: u16,
    /// Color stops in CSS notation, dominant color first
    #[schema(example = json!(["rgb(200, 200, 200)", "rgb(100, 100, 100)"]))]
    pub stops: Vec<String>,
    /// Ready-to-use CSS background value
    #[schema(example = "linear-gradient(135deg, rgb(200, 200, 200), rgb(100, 100, 100))")]
    pub css: String,
}

/// Everything a renderer needs to draw the carousel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CarouselView {
    /// Index of the current slide
    pub index: usize,
    /// Locator of the current slide
    pub locator: String,
    /// Previous, current and next slides
    pub slides: Vec<Slide>,
    /// Background gradient for the current slide
    pub gradient: GradientView,
    /// Whether the autoplay timer is running
    pub autoplay: bool,
}

impl CarouselView {
    pub fn capture(carousel: &HttpCarousel) -> Self {
        let Frame { state, slides } = carousel.frame();
        let gradient = state.gradient;

        Self {
            index: state.index,
            locator: slides[1].locator.clone(),
            slides: slides.to_vec(),
            gradient: GradientView {
                angle_degrees: gradient.angle_degrees,
                stops: gradient.stops.iter().map(Color::to_string).collect(),
                css: gradient.css(),
            },
            autoplay: carousel.is_autoplaying(),
        }
    }
}

/// One entry of the image set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ImageEntry {
    /// Position in the carousel
    pub index: usize,
    /// Image URL or path
    #[schema(example = "https://images.example.com/slide.jpg")]
    pub locator: String,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/carousel", get(get_carousel))
        .route("/api/v1/carousel/next", post(post_next))
        .route("/api/v1/carousel/previous", post(post_previous))
        .route("/api/v1/carousel/stream", get(ws_carousel_stream))
        .route("/api/v1/images", get(get_images))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/carousel — current slide, neighborhood and gradient
#[utoipa::path(
    get,
    path = "/api/v1/carousel",
    tag = "carousel",
    responses(
        (status = 200, description = "Current carousel state", body = CarouselView)
    )
)]
async fn get_carousel(State(state): State<AppState>) -> Json<CarouselView> {
    Json(CarouselView::capture(&state.carousel))
}

/// POST /api/v1/carousel/next — show the next slide
#[utoipa::path(
    post,
    path = "/api/v1/carousel/next",
    tag = "carousel",
    responses(
        (status = 200, description = "State after moving forward", body = CarouselView)
    )
)]
async fn post_next(State(state): State<AppState>) -> Json<CarouselView> {
    state.carousel.next();
    Json(CarouselView::capture(&state.carousel))
}

/// POST /api/v1/carousel/previous — show the previous slide
#[utoipa::path(
    post,
    path = "/api/v1/carousel/previous",
    tag = "carousel",
    responses(
        (status = 200, description = "State after moving back", body = CarouselView)
    )
)]
async fn post_previous(State(state): State<AppState>) -> Json<CarouselView> {
    state.carousel.previous();
    Json(CarouselView::capture(&state.carousel))
}

/// GET /api/v1/images — the image set, in carousel order
#[utoipa::path(
    get,
    path = "/api/v1/images",
    tag = "media",
    responses(
        (status = 200, description = "Images in carousel order", body = Vec<ImageEntry>)
    )
)]
async fn get_images(State(state): State<AppState>) -> Json<Vec<ImageEntry>> {
    let images = state
        .carousel
        .images()
        .iter()
        .enumerate()
        .map(|(index, locator)| ImageEntry {
            index,
            locator: locator.to_string(),
        })
        .collect();
    Json(images)
}

// ── WebSocket streaming ─────────────────────────────────────────────

/// GET /api/v1/carousel/stream — WebSocket pushing the state on every change.
///
/// The current state is sent right after connecting, then one JSON text
/// message per change (slide moved or gradient updated). Incoming messages
/// are ignored apart from close frames.
async fn ws_carousel_stream(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream_socket(socket, state))
}

async fn handle_stream_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket stream client connected");

    let mut changes = state.carousel.subscribe();
    let mut updates: u64 = 0;

    if !send_view(&mut socket, &state.carousel).await {
        return;
    }

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() || !send_view(&mut socket, &state.carousel).await {
                    break;
                }
                updates += 1;
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket receive error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore text/binary, ping/pong handled by axum
                }
            }
        }
    }

    tracing::info!(
        "WebSocket stream client disconnected ({} updates sent)",
        updates
    );
}

/// Send the current view as a JSON text message. Returns false once the
/// client is gone.
async fn send_view(socket: &mut WebSocket, carousel: &HttpCarousel) -> bool {
    let json = match serde_json::to_string(&CarouselView::capture(carousel)) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize carousel state: {}", e);
            return false;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CarouselConfig;
    use crate::analyzer::tests::{png, two_tone};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn carousel_in(tmp: &TempDir) -> HttpCarousel {
        let first = tmp.path().join("first.png");
        std::fs::write(&first, png(&two_tone())).unwrap();
        let locators = [
            first.display().to_string(),
            tmp.path().join("second.png").display().to_string(),
            tmp.path().join("third.png").display().to_string(),
        ];
        Carousel::from_locators(locators, DefaultImageSource::default(), CarouselConfig::manual())
            .unwrap()
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn carousel_state_starts_at_placeholder() {
        let tmp = TempDir::new().unwrap();
        let router = create_router(AppState {
            carousel: carousel_in(&tmp),
        });

        let (status, body) = call(router, "GET", "/api/v1/carousel").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], 0);
        assert_eq!(body["autoplay"], false);
        assert_eq!(
            body["gradient"]["css"],
            "linear-gradient(45deg, rgb(240, 240, 240), rgb(224, 224, 224))"
        );
        let offsets: Vec<i64> = body["slides"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["offset"].as_i64().unwrap())
            .collect();
        assert_eq!(offsets, vec![-1, 0, 1]);
        assert_eq!(body["slides"][0]["index"], 2);
    }

    #[tokio::test]
    async fn analyzed_gradient_is_served() {
        let tmp = TempDir::new().unwrap();
        let carousel = carousel_in(&tmp);
        carousel.start();
        carousel.settle().await;

        let (_, body) = call(create_router(AppState { carousel }), "GET", "/api/v1/carousel").await;
        assert_eq!(
            body["gradient"]["stops"],
            serde_json::json!(["rgb(240, 0, 0)", "rgb(0, 0, 240)"])
        );
        assert_eq!(body["gradient"]["angle_degrees"], 135);
    }

    #[tokio::test]
    async fn next_and_previous_navigate() {
        let tmp = TempDir::new().unwrap();
        let carousel = carousel_in(&tmp);
        let router = create_router(AppState {
            carousel: carousel.clone(),
        });

        let (status, body) = call(router.clone(), "POST", "/api/v1/carousel/next").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], 1);
        assert!(body["locator"].as_str().unwrap().ends_with("second.png"));

        let (_, body) = call(router.clone(), "POST", "/api/v1/carousel/previous").await;
        assert_eq!(body["index"], 0);

        let (_, body) = call(router, "POST", "/api/v1/carousel/previous").await;
        assert_eq!(body["index"], 2);

        carousel.settle().await;
    }

    #[tokio::test]
    async fn missing_image_falls_back_to_gray() {
        let tmp = TempDir::new().unwrap();
        let carousel = carousel_in(&tmp);
        carousel.next(); // second.png does not exist
        carousel.settle().await;

        let (_, body) = call(create_router(AppState { carousel }), "GET", "/api/v1/carousel").await;
        assert_eq!(
            body["gradient"]["css"],
            "linear-gradient(135deg, rgb(200, 200, 200), rgb(100, 100, 100))"
        );
    }

    #[tokio::test]
    async fn images_are_listed_in_order() {
        let tmp = TempDir::new().unwrap();
        let router = create_router(AppState {
            carousel: carousel_in(&tmp),
        });

        let (_, body) = call(router, "GET", "/api/v1/images").await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["index"], 2);
        assert!(entries[2]["locator"].as_str().unwrap().ends_with("third.png"));
    }

    #[tokio::test]
    async fn captured_view_describes_one_slide() {
        let tmp = TempDir::new().unwrap();
        let carousel = carousel_in(&tmp);
        carousel.previous();

        let view = CarouselView::capture(&carousel);
        assert_eq!(view.index, 2);
        assert_eq!(view.slides[1].index, view.index);
        assert_eq!(view.locator, view.slides[1].locator);
        assert!(view.locator.ends_with("third.png"));
        carousel.settle().await;
    }

    #[tokio::test]
    async fn stream_sends_current_state_then_changes() {
        let tmp = TempDir::new().unwrap();
        let carousel = carousel_in(&tmp);
        let router = create_router(AppState {
            carousel: carousel.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, router).await });

        let (mut stream, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/carousel/stream"))
                .await
                .unwrap();

        let first: Value =
            serde_json::from_str(stream.next().await.unwrap().unwrap().to_text().unwrap()).unwrap();
        assert_eq!(first["index"], 0);
        assert_eq!(first["slides"][1]["index"], 0);

        carousel.next();
        let second: Value =
            serde_json::from_str(stream.next().await.unwrap().unwrap().to_text().unwrap()).unwrap();
        assert_eq!(second["index"], 1);
        assert!(second["locator"].as_str().unwrap().ends_with("second.png"));

        stream.close(None).await.unwrap();
        carousel.settle().await;
        server.abort();
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/v1/carousel",
            "/api/v1/carousel/next",
            "/api/v1/carousel/previous",
            "/api/v1/images",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
