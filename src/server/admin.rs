// 🔐 Admin handlers - change lists and add/edit/delete forms behind HTTP Basic auth

use crate::admin::{
    find_admin, form_sections, load_form, parse_form, raw_form, AdminRow, FormSection,
    ModelAdmin, RawForm, ADMINS,
};
use crate::error::Error;
use crate::server::{AppError, AppResult, AppState};
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ADMIN_USER: &str = "admin";

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/:model", get(change_list))
        .route("/:model/", get(change_list))
        .route("/:model/add", get(add_form).post(create))
        .route("/:model/:id", get(edit_form).post(update))
        .route("/:model/:id/delete", post(delete))
        .layer(middleware::from_fn_with_state(state, require_admin))
}

// ============================================================================
// AUTH
// ============================================================================

/// True when the header carries `admin:<password>` in Basic form
fn credentials_match(value: Option<&HeaderValue>, password: &str) -> bool {
    let Some(encoded) = value
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };

    match credentials.split_once(':') {
        Some((user, given)) => user == ADMIN_USER && given == password,
        None => false,
    }
}

async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = state
        .admin_password
        .as_deref()
        .is_some_and(|password| credentials_match(request.headers().get(header::AUTHORIZATION), password));

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "admin request without valid credentials");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"admin\"")],
        "Authentication required",
    )
        .into_response()
}

// ============================================================================
// PAGE CONTEXTS
// ============================================================================

#[derive(Serialize)]
struct ModelLink {
    slug: &'static str,
    title: &'static str,
}

impl From<&ModelAdmin> for ModelLink {
    fn from(admin: &ModelAdmin) -> Self {
        Self {
            slug: admin.slug,
            title: admin.title,
        }
    }
}

#[derive(Serialize)]
struct IndexPage {
    models: Vec<ModelLink>,
}

#[derive(Serialize)]
struct ChangeList {
    model: ModelLink,
    headers: Vec<&'static str>,
    rows: Vec<AdminRow>,
    searchable: bool,
    q: String,
}

#[derive(Serialize)]
struct FormPage {
    model: ModelLink,
    id: Option<i64>,
    sections: Vec<FormSection>,
    /// Error not tied to one field (constraint violations)
    form_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn model(slug: &str) -> AppResult<&'static ModelAdmin> {
    find_admin(slug).ok_or_else(|| AppError::not_found(format!("no admin for {slug}")))
}

fn form_page(
    conn: &Connection,
    admin: &'static ModelAdmin,
    id: Option<i64>,
    form: &RawForm,
    errors: &BTreeMap<String, String>,
    form_error: Option<String>,
) -> AppResult<FormPage> {
    Ok(FormPage {
        model: admin.into(),
        id,
        sections: form_sections(conn, admin, form, errors)?,
        form_error,
    })
}

fn back_to_list(admin: &ModelAdmin) -> Response {
    Redirect::to(&format!("/admin/{}", admin.slug)).into_response()
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let page = IndexPage {
        models: ADMINS.iter().map(ModelLink::from).collect(),
    };
    state.render("admin/index.html", &page)
}

async fn change_list(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let admin = model(&slug)?;
    let q = query.q.unwrap_or_default();
    let rows = {
        let conn = state.conn()?;
        crate::admin::list(&conn, admin, Some(&q))?
    };
    let page = ChangeList {
        model: admin.into(),
        headers: admin.list_headers(),
        rows,
        searchable: !admin.search_fields.is_empty(),
        q,
    };
    state.render("admin/list.html", &page)
}

async fn add_form(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Html<String>> {
    let admin = model(&slug)?;
    let page = {
        let conn = state.conn()?;
        form_page(&conn, admin, None, &RawForm::new(), &BTreeMap::new(), None)?
    };
    state.render("admin/form.html", &page)
}

async fn edit_form(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i64)>,
) -> AppResult<Html<String>> {
    let admin = model(&slug)?;
    let page = {
        let conn = state.conn()?;
        let form = load_form(&conn, admin, id)?;
        form_page(&conn, admin, Some(id), &form, &BTreeMap::new(), None)?
    };
    state.render("admin/form.html", &page)
}

/// Saved -> redirect to the change list; rejected -> the form again with errors
enum Outcome {
    Saved,
    Rejected(FormPage),
}

fn save(conn: &Connection, admin: &'static ModelAdmin, id: Option<i64>, form: &RawForm) -> AppResult<Outcome> {
    let submission = parse_form(conn, admin, form)?;
    if !submission.is_valid() {
        return Ok(Outcome::Rejected(form_page(conn, admin, id, form, &submission.errors, None)?));
    }

    let saved = match id {
        Some(id) => crate::admin::update(conn, admin, id, &submission),
        None => crate::admin::create(conn, admin, &submission).map(|_| ()),
    };
    match saved {
        Ok(()) => Ok(Outcome::Saved),
        Err(Error::Constraint(message)) => {
            let form_error = format!("Could not save: {message}");
            Ok(Outcome::Rejected(form_page(conn, admin, id, form, &submission.errors, Some(form_error))?))
        }
        Err(err) => Err(err.into()),
    }
}

fn respond(state: &AppState, admin: &ModelAdmin, outcome: Outcome) -> AppResult<Response> {
    match outcome {
        Outcome::Saved => Ok(back_to_list(admin)),
        Outcome::Rejected(page) => Ok(state.render("admin/form.html", &page)?.into_response()),
    }
}

async fn create(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let admin = model(&slug)?;
    let outcome = {
        let conn = state.conn()?;
        save(&conn, admin, None, &raw_form(pairs))?
    };
    respond(&state, admin, outcome)
}

async fn update(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, i64)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let admin = model(&slug)?;
    let outcome = {
        let conn = state.conn()?;
        save(&conn, admin, Some(id), &raw_form(pairs))?
    };
    respond(&state, admin, outcome)
}

async fn delete(State(state): State<AppState>, Path((slug, id)): Path<(String, i64)>) -> AppResult<Response> {
    let admin = model(&slug)?;
    {
        let conn = state.conn()?;
        crate::admin::delete(&conn, admin, id)?;
    }
    Ok(back_to_list(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryKind, Entity, Office, Record};
    use crate::server::router;
    use crate::server::tests::test_state;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const PASSWORD: &str = "secret";

    fn basic(user: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, location, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, basic(ADMIN_USER, PASSWORD))
            .body(Body::empty())
            .unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, basic(ADMIN_USER, PASSWORD))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_credentials_match() {
        let good = HeaderValue::from_str(&basic("admin", "secret")).unwrap();
        let wrong_user = HeaderValue::from_str(&basic("root", "secret")).unwrap();
        let wrong_password = HeaderValue::from_str(&basic("admin", "guess")).unwrap();
        let garbage = HeaderValue::from_static("Basic !!!");

        assert!(credentials_match(Some(&good), "secret"));
        assert!(!credentials_match(Some(&wrong_user), "secret"));
        assert!(!credentials_match(Some(&wrong_password), "secret"));
        assert!(!credentials_match(Some(&garbage), "secret"));
        assert!(!credentials_match(None, "secret"));
    }

    #[tokio::test]
    async fn test_admin_requires_credentials() {
        let state = test_state(Some(PASSWORD));

        let anonymous = Request::builder().uri("/admin").body(Body::empty()).unwrap();
        let (status, _, _) = send(&state, anonymous).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/admin/entity")
            .header(header::AUTHORIZATION, basic(ADMIN_USER, "guess"))
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&state, wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) = send(&state, get("/admin")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Entities"));
        assert!(body.contains("/admin/phonenumber"));
    }

    #[tokio::test]
    async fn test_category_crud() {
        let state = test_state(Some(PASSWORD));

        let (status, location, _) = send(&state, post("/admin/entitycategory/add", "name=individual")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/admin/entitycategory"));

        let (status, _, body) = send(&state, get("/admin/entitycategory")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("individual"));

        // Duplicate names come back as a form error
        let (status, _, body) = send(&state, post("/admin/entitycategory/add", "name=individual")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Could not save"));

        let id = {
            let conn = state.conn().unwrap();
            Category::find_by_name(&conn, CategoryKind::Entity, "individual").unwrap().unwrap().id
        };
        let (_, _, body) = send(&state, get(&format!("/admin/entitycategory/{id}"))).await;
        assert!(body.contains("value=\"individual\""));

        let (status, _, _) = send(&state, post(&format!("/admin/entitycategory/{id}"), "name=person")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        {
            let conn = state.conn().unwrap();
            assert_eq!(Category::get(&conn, CategoryKind::Entity, id).unwrap().name, "person");
        }

        let (status, _, _) = send(&state, post(&format!("/admin/entitycategory/{id}/delete"), "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, _, body) = send(&state, get("/admin/entitycategory")).await;
        assert!(!body.contains("person"));

        let (status, _, _) = send(&state, post(&format!("/admin/entitycategory/{id}/delete"), "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_required_field_error_rerenders_form() {
        let state = test_state(Some(PASSWORD));
        let (status, _, body) = send(&state, post("/admin/office/add", "name=&notes=kept")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("This field is required."));
        assert!(body.contains("kept"));
    }

    #[tokio::test]
    async fn test_restricted_picker_rejects_other_categories() {
        let state = test_state(Some(PASSWORD));
        let (person, government) = {
            let conn = state.conn().unwrap();
            let individual = Category::create(&conn, CategoryKind::Entity, "individual").unwrap();
            let government = Category::create(&conn, CategoryKind::Entity, "government").unwrap();
            let person = Record::create(&conn, Entity::named(Some(individual.id), "Doe")).unwrap();
            let city = Record::create(&conn, Entity::named(Some(government.id), "City of Austin")).unwrap();
            (person, city)
        };

        let (status, _, body) = send(
            &state,
            post("/admin/office/add", &format!("name=Mayor&government_entity_id={}", person.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(crate::admin::INVALID_CHOICE));

        let (status, _, _) = send(
            &state,
            post(
                "/admin/office/add",
                &format!("name=Mayor&government_entity_id={}&holder_entity_id={}", government.id, person.id),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let conn = state.conn().unwrap();
        let offices = Record::<Office>::of_government(&conn, government.id).unwrap();
        assert_eq!(offices.len(), 1);
        assert_eq!(offices[0].holder_entity_id, Some(person.id));
    }

    #[tokio::test]
    async fn test_unknown_model_is_404() {
        let state = test_state(Some(PASSWORD));
        let (status, _, _) = send(&state, get("/admin/spaceship")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
