//! HTTP route handlers.

use std::io;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domain::{ATTRIBUTE_NAMES, CSV_COLUMNS, StationCode, parse_search_date};
use crate::itinerary::{
    self, CsvSink, ExportSink, ItineraryError, PersistError, check_new_search, export_search,
    export_segments,
};
use crate::session::{SearchError, SearchRequest};
use crate::stations::{StationDirectory, StationTable};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(search_stations))
        .route("/search", post(run_search))
        .route("/searches/:search", get(get_search))
        .route("/searches/:search/export", get(export_search_csv))
        .route("/itinerary", get(get_itinerary))
        .route("/itinerary/segments", post(save_segment))
        .route("/itinerary/segments/:segment", delete(delete_segment))
        .route("/itinerary/segments/:segment/swap", post(swap_segment))
        .route("/itinerary/export", get(export_itinerary_csv))
        .route("/itinerary/save", post(save_itinerary))
        .route("/itinerary/load", post(load_itinerary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Search stations by code or name prefix.
async fn search_stations(
    State(state): State<AppState>,
    Query(req): Query<StationQuery>,
) -> Json<StationSearchResponse> {
    let limit = req.limit.unwrap_or(10).min(50);
    let stations = state
        .stations
        .search(&req.q, limit)
        .into_iter()
        .map(|key| StationMatch {
            key: key.to_string(),
            code: state.stations.code_for(key).map(|c| c.to_string()),
        })
        .collect();

    Json(StationSearchResponse { stations })
}

/// Run a search on the booking site and record its results.
///
/// Sanity warnings are computed against the itinerary as it was before the
/// search; they never stop the search from running.
async fn run_search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, AppError> {
    let origin = resolve_station(&state.stations, &body.origin)?;
    let destination = resolve_station(&state.stations, &body.destination)?;
    if origin == destination {
        return Err(AppError::BadRequest {
            message: "Origin and destination must be different stations".into(),
        });
    }
    let date = parse_date(&body.date)?;

    let warnings = check_new_search(&*state.itinerary.lock().await, origin, destination, date);

    let results = state
        .searcher
        .search(SearchRequest::new(origin, destination, date))
        .await?;

    let search = state
        .itinerary
        .lock()
        .await
        .add_search(origin, destination, date, (*results).clone());

    Ok(Json(SearchResponse {
        search,
        origin: origin.to_string(),
        destination: destination.to_string(),
        date,
        results: LegView::from_results(&results),
        warnings: warnings.into_iter().map(WarningView::from).collect(),
    }))
}

async fn get_search(
    State(state): State<AppState>,
    Path(search): Path<u32>,
) -> Result<Json<SearchRecordView>, AppError> {
    let current = state.itinerary.lock().await;
    let record = current
        .search(search)
        .ok_or(ItineraryError::UnknownSearch(search))?;
    Ok(Json(SearchRecordView::from_record(search, record)))
}

/// One search's results as CSV.
async fn export_search_csv(
    State(state): State<AppState>,
    Path(search): Path<u32>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let columns = export_columns(&query);
    let current = state.itinerary.lock().await;
    let record = current
        .search(search)
        .ok_or(ItineraryError::UnknownSearch(search))?;
    csv_response(|sink| export_search(record, &columns, sink))
}

async fn get_itinerary(State(state): State<AppState>) -> Json<ItineraryView> {
    Json(ItineraryView::from_itinerary(&*state.itinerary.lock().await))
}

/// Save one search result as the last segment.
async fn save_segment(
    State(state): State<AppState>,
    Json(body): Json<SaveSegmentBody>,
) -> Result<Json<SegmentResponse>, AppError> {
    let segment = state
        .itinerary
        .lock()
        .await
        .save_result(body.search, body.index)?;
    Ok(Json(SegmentResponse { segment }))
}

async fn delete_segment(
    State(state): State<AppState>,
    Path(segment): Path<u32>,
) -> Result<Json<DeletedResponse>, AppError> {
    let search = state.itinerary.lock().await.delete_segment(segment)?;
    Ok(Json(DeletedResponse { search }))
}

async fn swap_segment(
    State(state): State<AppState>,
    Path(segment): Path<u32>,
    Json(body): Json<SwapBody>,
) -> Result<Json<SegmentResponse>, AppError> {
    let segment = state
        .itinerary
        .lock()
        .await
        .swap_segment(segment, body.direction)?;
    Ok(Json(SegmentResponse { segment }))
}

/// Saved segments as CSV, in slot order.
async fn export_itinerary_csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let columns = export_columns(&query);
    let current = state.itinerary.lock().await;
    csv_response(|sink| export_segments(&current, &columns, sink))
}

async fn save_itinerary(State(state): State<AppState>) -> Result<Json<SavedResponse>, AppError> {
    let current = state.itinerary.lock().await;
    itinerary::save(&current, &state.itinerary_path)?;
    Ok(Json(SavedResponse {
        path: state.itinerary_path.display().to_string(),
        segments: current.segments().len(),
    }))
}

/// Replace the itinerary with the saved one.
async fn load_itinerary(State(state): State<AppState>) -> Result<Json<ItineraryView>, AppError> {
    let loaded = itinerary::load(&state.itinerary_path)?;
    let mut current = state.itinerary.lock().await;
    *current = loaded;
    Ok(Json(ItineraryView::from_itinerary(&current)))
}

/// Accepts a directory display key, or any well-formed station code.
fn resolve_station(stations: &StationTable, name: &str) -> Result<StationCode, AppError> {
    if let Some(code) = stations.code_for(name) {
        return Ok(code);
    }
    StationCode::parse_normalized(name).map_err(|e| AppError::BadRequest {
        message: format!("Unknown station {name:?}: {e}"),
    })
}

/// Accepts `mm/dd/yyyy` or `yyyy-mm-dd`.
fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    parse_search_date(s)
        .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .map_err(|_| AppError::BadRequest {
            message: format!("Invalid date {s:?}: expected MM/DD/YYYY or YYYY-MM-DD"),
        })
}

/// Requested export columns; unknown names come out as empty cells.
fn export_columns(query: &ExportQuery) -> Vec<String> {
    let Some(columns) = query.column_list() else {
        return CSV_COLUMNS.iter().map(|c| c.to_string()).collect();
    };
    for unknown in columns.iter().filter(|c| !ATTRIBUTE_NAMES.contains(&c.as_str())) {
        warn!(column = %unknown, "unknown export column; exporting it empty");
    }
    columns
}

fn csv_response(write: impl FnOnce(&mut dyn ExportSink) -> bool) -> Result<Response, AppError> {
    let failed = || AppError::Internal {
        message: "Failed to write CSV export".into(),
    };
    let mut sink = CsvSink::new(Vec::new());
    if !write(&mut sink) {
        return Err(failed());
    }
    let body = sink.into_inner().ok_or_else(failed)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// The booking site search did not produce results
    Search(SearchError),
    Internal { message: String },
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        AppError::Search(e)
    }
}

impl From<ItineraryError> for AppError {
    fn from(e: ItineraryError) -> Self {
        let message = e.to_string();
        match e {
            ItineraryError::UnknownSegment(_)
            | ItineraryError::UnknownSearch(_)
            | ItineraryError::LegNotInSearch { .. } => AppError::NotFound { message },
            ItineraryError::CannotSwap { .. } | ItineraryError::Full => {
                AppError::BadRequest { message }
            }
            ItineraryError::InvariantViolated(_) => AppError::Internal { message },
        }
    }
}

impl From<PersistError> for AppError {
    fn from(e: PersistError) -> Self {
        match &e {
            PersistError::Io(io) if io.kind() == io::ErrorKind::NotFound => AppError::NotFound {
                message: "No saved itinerary".into(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, kind) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message, None),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message, None),
            AppError::Search(e) => {
                let status = match e {
                    SearchError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
                    SearchError::PageUnavailable(_) | SearchError::ExtractionFailed(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.to_string(), Some(e.kind()))
            }
            AppError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        };

        warn!(%status, kind = kind.unwrap_or("-"), "{message}");

        let body = Json(ErrorResponse {
            error: message,
            kind,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::browser::{FixtureDriver, FixtureNode, FixturePage, SharedBrowser};
    use crate::session::testing::{config, outcome_page, result_row, site};
    use crate::session::{PageLocators, SearchSession, SearchWorker};
    use crate::stations::StationEntry;

    fn stations() -> StationTable {
        let entry = |code: &str, name: &str, city: &str, state: &str| StationEntry {
            code: code.into(),
            name: name.into(),
            city: city.into(),
            state: state.into(),
        };
        StationTable::from_entries([
            entry("WAS", "Washington Union Station", "Washington", "DC"),
            entry("NYP", "New York Penn Station", "New York", "NY"),
        ])
        .unwrap()
    }

    fn results_page(loc: &PageLocators) -> FixturePage {
        outcome_page(loc).element(
            FixtureNode::new(loc.results_container.clone())
                .child(result_row(loc, "171\nNortheast Regional", "7:05a", "10:30a", "$49"))
                .child(result_row(loc, "2151\nAcela", "8:00a", "10:55a", "$129")),
        )
    }

    fn app(results: FixturePage, itinerary_path: &std::path::Path) -> Router {
        let loc = PageLocators::default();
        let browser = SharedBrowser::new(FixtureDriver::new(site(&loc, results)));
        let searcher = SearchWorker::spawn(SearchSession::new(browser, config()), None);
        create_router(AppState::new(searcher, stations(), itinerary_path))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn call_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn search_body() -> Value {
        json!({
            "origin": "WAS | Washington Union Station, DC",
            "destination": "nyp",
            "date": "03/29/2024",
        })
    }

    #[tokio::test]
    async fn health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(FixturePage::new(), &dir.path().join("pass.json"));
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn station_prefix_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(FixturePage::new(), &dir.path().join("pass.json"));
        let (status, body) = call_json(&app, Method::GET, "/stations?q=new", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stations"][0]["key"], "NYP | New York Penn Station, NY");
        assert_eq!(body["stations"][0]["code"], "NYP");
    }

    #[tokio::test(start_paused = true)]
    async fn search_save_reorder_export_delete() {
        let dir = tempfile::tempdir().unwrap();
        let loc = PageLocators::default();
        let app = app(results_page(&loc), &dir.path().join("pass.json"));

        let (status, found) = call_json(&app, Method::POST, "/search", Some(search_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["search"], 1);
        assert_eq!(found["origin"], "WAS");
        assert_eq!(found["destination"], "NYP");
        assert_eq!(found["results"].as_array().unwrap().len(), 2);
        assert_eq!(found["results"][1]["train"], "Acela 2151");
        assert_eq!(found["warnings"], json!([]));

        let save = |index: usize| json!({ "search": 1, "index": index });
        let (_, first) =
            call_json(&app, Method::POST, "/itinerary/segments", Some(save(1))).await;
        assert_eq!(first["segment"], 1);
        let (_, second) =
            call_json(&app, Method::POST, "/itinerary/segments", Some(save(0))).await;
        assert_eq!(second["segment"], 2);

        let (_, swapped) = call_json(
            &app,
            Method::POST,
            "/itinerary/segments/2/swap",
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(swapped["segment"], 1);

        let (status, csv) =
            call(&app, Method::GET, "/itinerary/export?columns=Train,Origin", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Train,Origin\nNortheast Regional 171,WAS\nAcela 2151,WAS\n"
        );

        let (status, csv) =
            call(&app, Method::GET, "/itinerary/export?columns=Train,Wifi", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Train,Wifi\nNortheast Regional 171,\nAcela 2151,\n"
        );

        let (_, record) = call_json(&app, Method::GET, "/searches/1", None).await;
        assert_eq!(record["has_segment_saved"], true);
        assert_eq!(record["saved_indices"], json!([1, 0]));

        let (status, deleted) =
            call_json(&app, Method::DELETE, "/itinerary/segments/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["search"], 1);

        let (_, itinerary) = call_json(&app, Method::GET, "/itinerary", None).await;
        assert_eq!(itinerary["num_segments"], 2);
        assert_eq!(itinerary["segments"][0]["segment"], 1);
        assert_eq!(itinerary["segments"][0]["leg"]["train_id"], "2151");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_route_is_warned_about() {
        let dir = tempfile::tempdir().unwrap();
        let loc = PageLocators::default();
        let app = app(results_page(&loc), &dir.path().join("pass.json"));

        call_json(&app, Method::POST, "/search", Some(search_body())).await;
        call_json(
            &app,
            Method::POST,
            "/itinerary/segments",
            Some(json!({ "search": 1, "index": 0 })),
        )
        .await;

        let (status, found) = call_json(&app, Method::POST, "/search", Some(search_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["search"], 2);
        let kinds: Vec<&str> = found["warnings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["same_route", "tight_transfer"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_reports_kind() {
        let dir = tempfile::tempdir().unwrap();
        let loc = PageLocators::default();
        let page = outcome_page(&loc).element(
            FixtureNode::new(loc.no_service_banner.clone())
                .with_text("There is no service between these stations."),
        );
        let app = app(page, &dir.path().join("pass.json"));

        let (status, body) = call_json(&app, Method::POST, "/search", Some(search_body())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "no_service");
        assert_eq!(body["error"], "There is no service between these stations.");

        let (status, _) = call_json(&app, Method::GET, "/searches/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(FixturePage::new(), &dir.path().join("pass.json"));

        let mut body = search_body();
        body["origin"] = json!("Washington");
        let (status, _) = call_json(&app, Method::POST, "/search", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut body = search_body();
        body["date"] = json!("29/03/2024");
        let (status, _) = call_json(&app, Method::POST, "/search", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut body = search_body();
        body["destination"] = json!("was");
        let (status, _) = call_json(&app, Method::POST, "/search", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

    }

    #[tokio::test]
    async fn unknown_segments_and_searches() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(FixturePage::new(), &dir.path().join("pass.json"));

        let (status, body) = call_json(&app, Method::DELETE, "/itinerary/segments/3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no saved segment 3");

        let (status, _) = call_json(
            &app,
            Method::POST,
            "/itinerary/segments",
            Some(json!({ "search": 7, "index": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/searches/2/export", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pass.json");
        let loc = PageLocators::default();
        let app = app(results_page(&loc), &path);

        let (status, _) = call_json(&app, Method::POST, "/itinerary/load", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call_json(&app, Method::POST, "/search", Some(search_body())).await;
        call_json(
            &app,
            Method::POST,
            "/itinerary/segments",
            Some(json!({ "search": 1, "index": 1 })),
        )
        .await;
        let (status, saved) = call_json(&app, Method::POST, "/itinerary/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["segments"], 1);

        call_json(&app, Method::DELETE, "/itinerary/segments/1", None).await;
        let (status, loaded) = call_json(&app, Method::POST, "/itinerary/load", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["segments"][0]["leg"]["train_id"], "2151");
        assert_eq!(loaded["num_segments"], 2);
    }

    #[test]
    fn dates_in_either_format() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        assert_eq!(parse_date("03/29/2024").unwrap(), expected);
        assert_eq!(parse_date(" 2024-03-29 ").unwrap(), expected);
        assert!(parse_date("March 29").is_err());
    }
}
