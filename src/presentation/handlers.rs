// HTTP request handlers
use crate::application::preferences::PreferenceStore;
use crate::domain::cache_key::{CacheKey, ImageRef};
use crate::domain::page::{Fragment, GraphPage, RenderStats};
use crate::domain::session::SessionPreferences;
use crate::presentation::app_state::AppState;
use crate::presentation::cookies::CookieTokens;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct GraphQuery {
    pub refresh: Option<String>,
}

#[derive(Deserialize)]
pub struct PreferenceForm {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub span: String,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum GraphItem<'a> {
    Image { url: String, image: &'a ImageRef },
    Separator,
}

#[derive(Serialize)]
struct GraphPageBody<'a> {
    #[serde(flatten)]
    preferences: &'a SessionPreferences,
    items: Vec<GraphItem<'a>>,
    stats: &'a RenderStats,
}

impl<'a> GraphPageBody<'a> {
    fn new(preferences: &'a SessionPreferences, page: &'a GraphPage) -> Self {
        let items = page
            .fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Image(image) => GraphItem::Image {
                    url: image_url(image),
                    image,
                },
                Fragment::Separator => GraphItem::Separator,
            })
            .collect();
        Self {
            preferences,
            items,
            stats: &page.stats,
        }
    }
}

fn image_url(image: &ImageRef) -> String {
    format!("/images/{}", urlencoding::encode(&image.file_name))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Resolve the visitor's preferences and prepare every chart image for the page
pub async fn list_graphs(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<GraphQuery>,
) -> (CookieJar, Response) {
    let mut store = PreferenceStore::new(CookieTokens::new(jar, state.session_max_age_days));
    let preferences = store.resolve(query.refresh.is_some());

    let page = state.graph_service.render(&preferences).await;
    let body = Json(GraphPageBody::new(&preferences, &page)).into_response();
    (store.into_inner().into_jar(), body)
}

/// Store an explicit chart mode and span; starts a new render group
pub async fn change_preferences(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<PreferenceForm>,
) -> (CookieJar, Json<SessionPreferences>) {
    let mut store = PreferenceStore::new(CookieTokens::new(jar, state.session_max_age_days));
    let preferences = store.change(&form.mode, &form.span);

    (store.into_inner().into_jar(), Json(preferences))
}

/// Serve one cached chart image
pub async fn get_image(
    Path(file): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(key) = CacheKey::from_file_name(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.graph_service.cache().store().open(&key).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            bytes,
        )
            .into_response(),
        Err(err) if err.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(op = "handlers::get_image", file = %file, error = %err, "Failed to read cached image");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::graph_service::GraphService;
    use crate::application::preferences::{GROUP_ID_TOKEN, MODE_TOKEN, SPAN_TOKEN};
    use crate::application::render_cache::{RenderCache, RenderPolicy};
    use crate::application::renderer::{ChartRenderer, RenderError, RenderRequest};
    use crate::domain::chart::{Category, ChartMode, ChartSpan};
    use crate::domain::session::RenderGroupId;
    use crate::infrastructure::disk_cache::DiskCacheStore;
    use crate::infrastructure::log_files::FileLogMerger;
    use crate::infrastructure::sensor_file::FileSensorRepository;
    use async_trait::async_trait;
    use axum_extra::extract::cookie::Cookie;
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct PngRenderer;

    #[async_trait]
    impl ChartRenderer for PngRenderer {
        async fn render(&self, request: RenderRequest) -> Result<(), RenderError> {
            tokio::fs::write(&request.output, b"png")
                .await
                .map_err(RenderError::Io)
        }
    }

    struct Harness {
        _dir: TempDir,
        images: PathBuf,
        state: Arc<AppState>,
    }

    /// Temperature has series 1 and 3 enabled; every other category is off.
    fn harness() -> Harness {
        let dir = TempDir::new().expect("temp dir");
        let logs = dir.path().join("log");
        std::fs::create_dir_all(&logs).expect("log dir");
        std::fs::write(logs.join("sensor-t.log"), "1 20.5\n").expect("write");
        std::fs::write(logs.join("sensor-t-tmp.log"), "2 20.7\n").expect("write");
        let sensors = dir.path().join("sensors.toml");
        std::fs::write(&sensors, "[graph]\ntemperature = [true, false, true]\n").expect("write");

        let images = dir.path().join("images");
        let store = DiskCacheStore::new(images.clone()).expect("store");
        let cache = RenderCache::new(
            Arc::new(store),
            Arc::new(PngRenderer),
            RenderPolicy {
                timeout: Duration::from_secs(5),
                failure_backoff: Duration::from_secs(30),
            },
        );
        let graph_service = GraphService::new(
            Arc::new(FileSensorRepository::new(sensors)),
            Arc::new(FileLogMerger::new(logs, dir.path().join("tmp"))),
            Arc::new(cache),
        );
        Harness {
            _dir: dir,
            images,
            state: Arc::new(AppState {
                graph_service,
                session_max_age_days: 10,
            }),
        }
    }

    fn cookie(jar: &CookieJar, name: &str) -> Option<String> {
        jar.get(name).map(|c| c.value().to_string())
    }

    fn held(group_id: &'static str) -> CookieJar {
        CookieJar::new().add(Cookie::new(GROUP_ID_TOKEN, group_id))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    async fn graphs(state: &Arc<AppState>, jar: CookieJar, refresh: bool) -> (CookieJar, Value) {
        let query = GraphQuery {
            refresh: refresh.then(|| "1".to_string()),
        };
        let (jar, response) = list_graphs(State(state.clone()), jar, Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        (jar, body_json(response).await)
    }

    fn image(category: Category, index: u32) -> ImageRef {
        ImageRef::from_key(&CacheKey::default_series(
            category,
            RenderGroupId::parse("abc123").unwrap(),
            index,
        ))
    }

    #[test]
    fn test_page_body_shape() {
        let preferences = SessionPreferences::new(
            RenderGroupId::parse("abc123").unwrap(),
            ChartMode::Default,
            ChartSpan::Default,
        );
        let mut page = GraphPage::default();
        page.push_image(image(Category::Temperature, 1));
        page.push_image(image(Category::Co2, 2));
        page.stats.rendered = 2;

        let body = serde_json::to_value(GraphPageBody::new(&preferences, &page)).unwrap();

        assert_eq!(body["group_id"], json!("abc123"));
        assert_eq!(body["mode"], json!("default"));
        assert_eq!(body["span"], json!("default"));
        let kinds: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["image", "separator", "image"]);
        assert_eq!(
            body["items"][0]["url"],
            json!("/images/graph-tdefaultdefault-abc123-1.png")
        );
        assert_eq!(body["items"][2]["image"]["category"], json!("co2"));
        assert_eq!(body["stats"]["rendered"], json!(2));
    }

    #[tokio::test]
    async fn test_list_graphs_mints_cookies_for_new_visitor() {
        let h = harness();

        let (jar, body) = graphs(&h.state, CookieJar::new(), false).await;

        let id = cookie(&jar, GROUP_ID_TOKEN).expect("group id cookie");
        assert!(RenderGroupId::parse(&id).is_some());
        assert_eq!(cookie(&jar, MODE_TOKEN).as_deref(), Some("default"));
        assert_eq!(cookie(&jar, SPAN_TOKEN).as_deref(), Some("default"));
        assert_eq!(jar.get(GROUP_ID_TOKEN).and_then(|c| c.path()), Some("/"));

        assert_eq!(body["group_id"], json!(id));
        assert_eq!(body["items"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["stats"]["rendered"], json!(2));
        assert!(h.images.join(format!("graph-tdefaultdefault-{id}-1.png")).exists());
        assert!(h.images.join(format!("graph-tdefaultdefault-{id}-3.png")).exists());
    }

    #[tokio::test]
    async fn test_list_graphs_reuses_held_id_and_resets_bad_mode() {
        let h = harness();
        let jar = held("abc123").add(Cookie::new(MODE_TOKEN, "garbage"));

        let (jar, body) = graphs(&h.state, jar, false).await;
        assert_eq!(cookie(&jar, GROUP_ID_TOKEN).as_deref(), Some("abc123"));
        assert_eq!(cookie(&jar, MODE_TOKEN).as_deref(), Some("default"));
        assert_eq!(body["stats"]["rendered"], json!(2));

        let (_, body) = graphs(&h.state, jar, false).await;
        assert_eq!(body["stats"]["hits"], json!(2));
        assert_eq!(body["stats"]["rendered"], json!(0));
    }

    #[tokio::test]
    async fn test_refresh_leaves_previous_images_servable() {
        let h = harness();
        let (_, _) = graphs(&h.state, held("abc123"), false).await;
        let previous = h.images.join("graph-tdefaultdefault-abc123-1.png");
        assert!(previous.exists());

        let (jar, _) = graphs(&h.state, held("abc123"), true).await;
        let fresh = cookie(&jar, GROUP_ID_TOKEN).expect("group id cookie");
        assert_ne!(fresh, "abc123");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(previous.exists());
        let response = get_image(
            Path("graph-tdefaultdefault-abc123-1.png".to_string()),
            State(h.state.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_preferences_persists_choice_and_mints_id() {
        let h = harness();
        let form = PreferenceForm {
            mode: "separate".to_string(),
            span: "1w".to_string(),
        };

        let (jar, Json(preferences)) =
            change_preferences(State(h.state.clone()), held("abc123"), Form(form)).await;

        assert_eq!(preferences.mode, ChartMode::Separate);
        assert_eq!(preferences.span, ChartSpan::OneWeek);
        assert_eq!(cookie(&jar, MODE_TOKEN).as_deref(), Some("separate"));
        assert_eq!(cookie(&jar, SPAN_TOKEN).as_deref(), Some("1w"));
        let id = cookie(&jar, GROUP_ID_TOKEN).expect("group id cookie");
        assert_ne!(id, "abc123");
        assert_eq!(id, preferences.group_id.as_str());

        let (_, body) = graphs(&h.state, jar, false).await;
        assert_eq!(body["mode"], json!("separate"));
        assert_eq!(body["span"], json!("1w"));
        assert!(h.images.join(format!("graph-tseparate1w-{id}-1.png")).exists());
    }

    #[tokio::test]
    async fn test_change_preferences_rejects_unknown_values() {
        let h = harness();
        let form = PreferenceForm {
            mode: "bogus".to_string(),
            span: "2y".to_string(),
        };

        let (jar, Json(preferences)) =
            change_preferences(State(h.state.clone()), CookieJar::new(), Form(form)).await;

        assert_eq!(preferences.mode, ChartMode::Default);
        assert_eq!(preferences.span, ChartSpan::Default);
        assert_eq!(cookie(&jar, MODE_TOKEN).as_deref(), Some("default"));
        assert_eq!(cookie(&jar, SPAN_TOKEN).as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn test_get_image_serves_png_or_not_found() {
        let h = harness();
        let name = "graph-tdefaultdefault-abc123-1.png";

        let missing = get_image(Path(name.to_string()), State(h.state.clone())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let invalid = get_image(Path("../sensors.toml".to_string()), State(h.state.clone())).await;
        assert_eq!(invalid.status(), StatusCode::NOT_FOUND);

        std::fs::write(h.images.join(name), b"png").expect("write");
        let found = get_image(Path(name.to_string()), State(h.state.clone())).await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(
            found.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"image/png"[..])
        );
        let bytes = axum::body::to_bytes(found.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"png");
    }
}
