// 🌐 Web server - public pages, health check, and the optional admin
//
// One SQLite connection behind a mutex; each request locks it, runs its
// queries, renders a template, and releases it before responding.

pub mod admin;
pub mod error;
pub mod render;

use crate::error::Result;
use crate::listing::ListingQuery;
use crate::models::{
    Address, AssumedName, Campaign, Document, Election, Email, Entity, ExternalId,
    FormerOfficeHolder, Industry, Office, PhoneNumber, Relationship, ReportedSubtotals,
    ReportedTotals, Transaction, Website,
};
use crate::pages::{self, Page};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tera::Tera;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub templates: Arc<Tera>,
    /// Admin routes exist only when this is set
    pub admin_password: Option<Arc<str>>,
}

impl AppState {
    pub fn new(conn: Connection, admin_password: Option<String>) -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            templates: Arc::new(render::templates()?),
            admin_password: admin_password.map(Arc::from),
        })
    }

    pub fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::internal("database connection lock poisoned"))
    }

    pub fn render(&self, name: &str, context: &impl Serialize) -> AppResult<Html<String>> {
        Ok(Html(render::render(&self.templates, name, context)?))
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET / - latest contributions
async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let page = {
        let conn = state.conn()?;
        pages::home_page(&conn)?
    };
    state.render("index.html", &page)
}

async fn glossary(State(state): State<AppState>) -> AppResult<Html<String>> {
    state.render("glossary.html", &serde_json::json!({}))
}

/// GET /static/script.js
async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_str!("../../web/static/script.js"),
    )
}

async fn list<T: Page>(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Html<String>> {
    let page = {
        let conn = state.conn()?;
        pages::list_page::<T>(&conn, &query)?
    };
    state.render(&format!("{}_list.html", T::ROUTE), &page)
}

async fn detail<T: Page>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Html<String>> {
    let page = {
        let conn = state.conn()?;
        pages::detail_page::<T>(&conn, &key)?
    };
    state.render(&format!("{}_detail.html", T::ROUTE), &page)
}

async fn sector_list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let page = {
        let conn = state.conn()?;
        pages::sector_list(&conn)?
    };
    state.render("industrysector_list.html", &page)
}

async fn sector_detail(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Html<String>> {
    let page = {
        let conn = state.conn()?;
        pages::sector_detail(&conn, &key)?
    };
    state.render("industrysector_detail.html", &page)
}

async fn not_found() -> AppError {
    AppError::not_found("No page at this address.")
}

// ============================================================================
// ROUTER
// ============================================================================

fn list_route<T: Page>(router: Router<AppState>) -> Router<AppState> {
    router.route(&format!("/{}", T::ROUTE), get(list::<T>))
}

fn page_routes<T: Page>(router: Router<AppState>) -> Router<AppState> {
    list_route::<T>(router)
        .route(&format!("/{}/:uuid", T::ROUTE), get(detail::<T>))
        .route(&format!("/{}/:uuid/", T::ROUTE), get(detail::<T>))
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(home))
        .route("/glossary", get(glossary))
        .route("/static/script.js", get(script))
        .route("/api/health", get(health_check))
        .route("/industrysector", get(sector_list))
        .route("/industrysector/:uuid", get(sector_detail))
        .route("/industrysector/:uuid/", get(sector_detail));

    app = page_routes::<Entity>(app);
    app = list_route::<Industry>(app);
    app = page_routes::<ExternalId>(app);
    app = page_routes::<Relationship>(app);
    app = page_routes::<Campaign>(app);
    app = page_routes::<Office>(app);
    app = list_route::<FormerOfficeHolder>(app);
    app = page_routes::<Election>(app);
    app = page_routes::<Document>(app);
    app = page_routes::<ReportedTotals>(app);
    app = page_routes::<ReportedSubtotals>(app);
    app = page_routes::<Transaction>(app);
    app = page_routes::<Address>(app);
    app = page_routes::<PhoneNumber>(app);
    app = page_routes::<Email>(app);
    app = page_routes::<Website>(app);
    app = page_routes::<AssumedName>(app);

    if state.admin_password.is_some() {
        app = app.nest("/admin", admin::routes(state.clone()));
    } else {
        tracing::info!("no admin password configured; /admin disabled");
    }

    app.fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Category, CategoryKind, Record};
    use crate::schema::open_in_memory;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    pub(crate) fn test_state(admin_password: Option<&str>) -> AppState {
        AppState::new(open_in_memory().unwrap(), admin_password.map(str::to_string)).unwrap()
    }

    pub(crate) async fn get_page(state: &AppState, uri: &str) -> (StatusCode, String) {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entity(state: &AppState, first: &str, last: &str) -> Record<Entity> {
        let conn = state.conn().unwrap();
        Record::create(
            &conn,
            Entity {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state(None);
        let (status, body) = get_page(&state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"success":true,"data":"OK"}"#);
    }

    #[tokio::test]
    async fn test_empty_listings_say_no_data() {
        let state = test_state(None);
        for route in [
            "/entity",
            "/industrysector",
            "/industry",
            "/externalid",
            "/relationship",
            "/campaign",
            "/office",
            "/formerofficeholder",
            "/election",
            "/document",
            "/reportedtotals",
            "/reportedsubtotals",
            "/transaction",
            "/address",
            "/phonenumber",
            "/email",
            "/website",
            "/assumedname",
        ] {
            let (status, body) = get_page(&state, route).await;
            assert_eq!(status, StatusCode::OK, "{route}");
            assert!(body.contains("No data found."), "{route}");
        }
    }

    #[tokio::test]
    async fn test_unknown_uuid_is_404() {
        let state = test_state(None);
        let missing = uuid::Uuid::new_v4();
        for route in ["entity", "campaign", "document", "address", "assumedname", "industrysector"] {
            let (status, _) = get_page(&state, &format!("/{route}/{missing}/")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{route}");
        }
        let (status, body) = get_page(&state, "/entity/not-a-uuid/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));

        let (status, _) = get_page(&state, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_sort_is_bad_request() {
        let state = test_state(None);
        let (status, _) = get_page(&state, "/entity?sortby=shoe%20size").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Unknown categories are ignored
        let (status, _) = get_page(&state, "/entity?category=robot").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_campaign_listing_and_detail() {
        let state = test_state(None);
        let candidate = entity(&state, "", "candidate1");
        let contributor = entity(&state, "", "contributor1");
        let campaign = {
            let conn = state.conn().unwrap();
            let category = Category::create(&conn, CategoryKind::Campaign, "Candidate").unwrap();
            let office = Record::create(
                &conn,
                Office {
                    name: "Mayor".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
            let mut campaign = Campaign::new("campaign1", date(2023, 3, 1));
            campaign.category_id = Some(category.id);
            campaign.office_sought_id = Some(office.id);
            campaign.candidate_entity_id = Some(candidate.id);
            campaign.notes = "Test notes".to_string();
            let campaign = Record::create(&conn, campaign).unwrap();
            Record::create(&conn, Campaign::new("campaign2", date(2023, 2, 1))).unwrap();
            Record::create(
                &conn,
                Transaction {
                    campaign_id: Some(campaign.id),
                    payer_entity_id: Some(contributor.id),
                    payee_entity_id: Some(candidate.id),
                    amount: Decimal::new(1234, 2),
                    recorded_date: Some(date(2023, 1, 1)),
                    ..Default::default()
                },
            )
            .unwrap();
            campaign
        };

        let (status, body) = get_page(&state, "/campaign").await;
        assert_eq!(status, StatusCode::OK);
        for text in ["campaign1", "campaign2", "Candidate", "Mayor", "March 1, 2023", "Feb. 1, 2023"] {
            assert!(body.contains(text), "{text}");
        }

        let (status, body) = get_page(&state, &format!("/campaign/{}/", campaign.uuid)).await;
        assert_eq!(status, StatusCode::OK);
        for text in ["campaign1", "candidate1", "Mayor", "Test notes", "contributor1", "Jan. 1, 2023", "$12.34"] {
            assert!(body.contains(text), "{text}");
        }
    }

    #[tokio::test]
    async fn test_entity_detail_page() {
        let state = test_state(None);
        let jane = entity(&state, "Jane", "Doe");
        let pac = entity(&state, "", "Austin PAC");
        {
            let conn = state.conn().unwrap();
            Record::create(
                &conn,
                Relationship {
                    category_id: None,
                    parent_entity_id: jane.id,
                    child_entity_id: pac.id,
                    notes: String::new(),
                },
            )
            .unwrap();
        }

        let (status, body) = get_page(&state, &format!("/entity/{}", jane.uuid)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Jane Doe"));
        assert!(body.contains("Austin PAC"));
        assert!(body.contains(&format!("/entity/{}/", pac.uuid)));
    }

    #[tokio::test]
    async fn test_home_page_shows_contributions() {
        let state = test_state(None);
        let donor = entity(&state, "", "donor1");
        {
            let conn = state.conn().unwrap();
            let contribution = Category::create(&conn, CategoryKind::Transaction, "contribution").unwrap();
            Record::create(
                &conn,
                Transaction {
                    category_id: Some(contribution.id),
                    payer_entity_id: Some(donor.id),
                    amount: Decimal::new(4321, 2),
                    recorded_date: Some(date(2023, 2, 27)),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let (status, body) = get_page(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("donor1"));
        assert!(body.contains("$43.21"));
        assert!(body.contains("Feb. 27, 2023"));
    }

    #[tokio::test]
    async fn test_glossary_and_script() {
        let state = test_state(None);
        let (status, body) = get_page(&state, "/glossary").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Glossary"));

        let (status, body) = get_page(&state, "/static/script.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("category-select"));
    }

    #[tokio::test]
    async fn test_admin_absent_without_password() {
        let state = test_state(None);
        let (status, _) = get_page(&state, "/admin/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
