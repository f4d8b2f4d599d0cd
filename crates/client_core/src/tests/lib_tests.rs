use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use shared::domain::{
    BasicInfo, Details, DetailsPatch, EmploymentType, JobRole, LookupId, LookupItem, RecordId,
};
use storage::MemoryStore;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::{
    lookup::LookupSource,
    test_support::{basic_info, details},
};

type Params = Query<HashMap<String, String>>;
type Reply<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Clone, Default)]
struct Backend {
    basic: Arc<Mutex<Vec<BasicInfo>>>,
    details: Arc<Mutex<Vec<Details>>>,
    /// Unpaginated basic-info listings fail; pages still work.
    fail_unpaged: bool,
}

impl Backend {
    async fn seeded(basics: Vec<BasicInfo>, records: Vec<Details>) -> Self {
        let backend = Self::default();
        for (index, mut record) in basics.into_iter().enumerate() {
            record.id = Some(RecordId(index as i64 + 1));
            backend.basic.lock().await.push(record);
        }
        for (index, mut record) in records.into_iter().enumerate() {
            record.id = Some(RecordId(index as i64 + 1));
            backend.details.lock().await.push(record);
        }
        backend
    }
}

fn paginate<T: Clone>(records: &[T], params: &HashMap<String, String>) -> Option<Vec<T>> {
    let page: usize = params.get("_page")?.parse().ok()?;
    let limit: usize = params.get("_limit")?.parse().ok()?;
    Some(
        records
            .iter()
            .skip(page.saturating_sub(1) * limit)
            .take(limit)
            .cloned()
            .collect(),
    )
}

fn lookup_items(names: &[&str], params: &HashMap<String, String>) -> Vec<LookupItem> {
    let needle = params
        .get("name_like")
        .or_else(|| params.get("q"))
        .map(|value| value.to_lowercase())
        .unwrap_or_default();
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(index, name)| LookupItem {
            id: LookupId(index as i64 + 1),
            name: name.to_string(),
        })
        .collect()
}

fn reject_client_id(body: &serde_json::Value) -> Result<(), (StatusCode, String)> {
    if body.get("id").is_some() {
        return Err((StatusCode::BAD_REQUEST, "client supplied id".into()));
    }
    Ok(())
}

async fn list_basic(State(backend): State<Backend>, Query(params): Params) -> Reply<Vec<BasicInfo>> {
    let records = backend.basic.lock().await.clone();
    match paginate(&records, &params) {
        Some(page) => Ok(Json(page)),
        None if backend.fail_unpaged => {
            Err((StatusCode::INTERNAL_SERVER_ERROR, "count unavailable".into()))
        }
        None => Ok(Json(records)),
    }
}

async fn create_basic(
    State(backend): State<Backend>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<BasicInfo>), (StatusCode, String)> {
    reject_client_id(&body)?;
    let mut record: BasicInfo = serde_json::from_value(body)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
    let mut records = backend.basic.lock().await;
    record.id = Some(RecordId(records.len() as i64 + 1));
    records.push(record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_details(State(backend): State<Backend>, Query(params): Params) -> Reply<Vec<Details>> {
    let records = backend.details.lock().await.clone();
    if let Some(employee_id) = params.get("employeeId") {
        return Ok(Json(
            records
                .into_iter()
                .filter(|record| &record.employee_id == employee_id)
                .collect(),
        ));
    }
    Ok(Json(paginate(&records, &params).unwrap_or(records)))
}

async fn create_details(
    State(backend): State<Backend>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Details>), (StatusCode, String)> {
    reject_client_id(&body)?;
    let mut record: Details = serde_json::from_value(body)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
    let mut records = backend.details.lock().await;
    record.id = Some(RecordId(records.len() as i64 + 1));
    records.push(record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_details(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(patch): Json<DetailsPatch>,
) -> Reply<Details> {
    let mut records = backend.details.lock().await;
    let Some(record) = records.iter_mut().find(|r| r.id == Some(RecordId(id))) else {
        return Err((StatusCode::NOT_FOUND, "{}".into()));
    };
    if let Some(v) = patch.employment_type {
        record.employment_type = v;
    }
    if let Some(v) = patch.office_location {
        record.office_location = v;
    }
    if patch.notes.is_some() {
        record.notes = patch.notes;
    }
    if patch.photo.is_some() {
        record.photo = patch.photo;
    }
    Ok(Json(record.clone()))
}

async fn departments(Query(params): Params) -> Json<Vec<LookupItem>> {
    Json(lookup_items(&["Engineering", "Finance", "Operations"], &params))
}

async fn locations(Query(params): Params) -> Json<Vec<LookupItem>> {
    Json(lookup_items(&["Berlin", "New York", "Lagos"], &params))
}

async fn spawn_backend(backend: Backend) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/basicInfo", get(list_basic).post(create_basic))
        .route("/details", get(list_details).post(create_details))
        .route("/details/:id", patch(update_details))
        .route("/departments", get(departments))
        .route("/locations", get(locations))
        .route(
            "/broken",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
        )
        .route("/garbled", get(|| async { "not json" }))
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/"))
}

#[tokio::test]
async fn basic_info_service_creates_and_pages() {
    let backend = Backend::seeded(
        vec![
            basic_info("Ada Lovelace", "Engineering", "ENG-001"),
            basic_info("Grace Hopper", "Engineering", "ENG-002"),
        ],
        Vec::new(),
    )
    .await;
    let url = spawn_backend(backend.clone()).await.expect("spawn backend");
    let service = BasicInfoService::new(JsonClient::new(url));

    let mut draft = basic_info("Joan Clarke", "Finance", "FIN-001");
    draft.id = Some(RecordId(99));
    draft.role = JobRole::Finance;
    let created = service.create(&draft).await.expect("create");
    assert_eq!(created.id, Some(RecordId(3)));
    assert_eq!(created.role, JobRole::Finance);

    assert_eq!(service.get_all().await.expect("all").len(), 3);
    let second_page = service.get_paginated(2, 2).await.expect("page");
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].full_name, "Joan Clarke");
}

#[tokio::test]
async fn details_service_filters_and_patches() {
    let backend = Backend::seeded(
        Vec::new(),
        vec![details("ENG-001", "Berlin"), details("FIN-001", "Lagos")],
    )
    .await;
    let url = spawn_backend(backend).await.expect("spawn backend");
    let service = DetailsService::new(JsonClient::new(url));

    let found = service.get_by_employee_id("FIN-001").await.expect("lookup");
    assert_eq!(found.len(), 1);
    let id = found[0].id.expect("id");

    let updated = service
        .update(
            id,
            &DetailsPatch {
                employment_type: Some(EmploymentType::Intern),
                office_location: Some("New York".into()),
                ..DetailsPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.employment_type, EmploymentType::Intern);
    assert_eq!(updated.office_location, "New York");

    let err = service
        .update(RecordId(404), &DetailsPatch::default())
        .await
        .expect_err("missing record");
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));

    assert!(service
        .get_by_employee_id("OPS-001")
        .await
        .expect("lookup")
        .is_empty());
    assert_eq!(service.get_paginated(1, 1).await.expect("page").len(), 1);
}

#[tokio::test]
async fn non_success_status_keeps_raw_body() {
    let url = spawn_backend(Backend::default()).await.expect("spawn backend");
    let client = JsonClient::new(url);

    let err = client
        .get::<Vec<BasicInfo>>("broken")
        .await
        .expect_err("503");
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status, 503);
            assert_eq!(api.code, shared::error::ErrorCode::Unavailable);
            assert_eq!(api.body, "upstream down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let url = spawn_backend(Backend::default()).await.expect("spawn backend");
    let client = JsonClient::new(url);

    let err = client
        .get::<Vec<BasicInfo>>("garbled")
        .await
        .expect_err("not json");
    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let service = BasicInfoService::new(JsonClient::new(format!("http://{addr}")));
    let err = service.get_all().await.expect_err("connection refused");
    assert!(matches!(err, ClientError::Transport { .. }));
}

#[tokio::test]
async fn lookups_filter_by_query_parameter() {
    let url = spawn_backend(Backend::default()).await.expect("spawn backend");
    let client = JsonClient::new(url);
    let basic = BasicInfoService::new(client.clone());
    let details = DetailsService::new(client.clone());

    let departments = basic.get_departments(Some("fin")).await.expect("departments");
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].name, "Finance");
    assert_eq!(basic.get_departments(None).await.expect("all").len(), 3);

    let locations = details.get_locations(Some("new")).await.expect("locations");
    assert_eq!(locations[0].name, "New York");

    let custom = LookupEndpoint::new(client, "/locations").with_query_param("q");
    let found = custom.search("lag").await.expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Lagos");
}

#[tokio::test]
async fn directory_merges_page_with_all_details() {
    let basics = (1..=12)
        .map(|n| basic_info(&format!("Person {n}"), "Engineering", &format!("ENG-{n:03}")))
        .collect();
    let backend = Backend::seeded(
        basics,
        vec![
            details("ENG-011", "Berlin"),
            details("ENG-011", "Lagos"),
            details("ZZZ-999", "Nowhere"),
        ],
    )
    .await;
    let url = spawn_backend(backend).await.expect("spawn backend");
    let settings = Settings {
        step1_api_url: url.clone(),
        step2_api_url: url,
        page_size: 5,
        ..Settings::default()
    };
    let ctx = OnboardingContext::http(&settings, DraftStore::new(Arc::new(MemoryStore::new())));

    let page = ctx.directory().list_page(3).await.expect("page 3");
    assert_eq!(page.page, 3);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.employees.len(), 2);
    let eleventh = &page.employees[0];
    assert_eq!(eleventh.employee_id(), "ENG-011");
    assert_eq!(eleventh.office_location(), Some("Berlin"));
    assert!(!eleventh.is_incomplete());
    assert!(page.employees[1].details.is_none());
    assert!(page.employees[1].is_incomplete());
}

#[tokio::test]
async fn directory_keeps_one_page_when_count_fails() {
    let backend = Backend {
        fail_unpaged: true,
        ..Backend::seeded(
            vec![basic_info("Ada Lovelace", "Engineering", "ENG-001")],
            Vec::new(),
        )
        .await
    };
    let url = spawn_backend(backend).await.expect("spawn backend");
    let client = JsonClient::new(url);
    let directory = EmployeeDirectory::new(
        Arc::new(BasicInfoService::new(client.clone())),
        Arc::new(DetailsService::new(client)),
        10,
    );

    let page = directory.list_page(1).await.expect("page");
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.employees.len(), 1);
}

#[test]
fn merge_is_a_left_join_where_first_details_win() {
    let basics = vec![
        basic_info("Ada Lovelace", "Engineering", "ENG-001"),
        basic_info("Grace Hopper", "Engineering", "ENG-002"),
    ];
    let records = vec![
        details("ENG-002", "Berlin"),
        details("ENG-002", "Lagos"),
        details("FIN-404", "Orphaned"),
    ];

    let merged = merge_employees(basics, &records);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].employee_id(), "ENG-001");
    assert!(merged[0].details.is_none());
    assert_eq!(merged[1].office_location(), Some("Berlin"));
}

#[test]
fn page_count_rounds_up_and_never_hits_zero() {
    use crate::directory::page_count;

    assert_eq!(page_count(0, 10), 1);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(25, 5), 5);
}

#[test]
fn context_wires_timing_from_settings() {
    let settings = Settings {
        lookup_debounce_ms: 150,
        page_size: 25,
        ..Settings::default()
    };
    let ctx = OnboardingContext::http(&settings, DraftStore::new(Arc::new(MemoryStore::new())));

    assert_eq!(ctx.timing.lookup_debounce, std::time::Duration::from_millis(150));
    assert_eq!(ctx.directory().page_size(), 25);
}
