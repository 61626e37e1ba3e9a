//! SAVISER REST API server binary.
//!
//! ## Purpose
//! Serves the triage intake workflow over HTTP: open encounters, record
//! vital signs (which classifies them immediately), read the projected
//! waiting-room queue, and hot-reload the rule set. OpenAPI/Swagger UI is
//! served alongside for development.
//!
//! The routes mirror the original SAVISER backend surface (`/health`,
//! `/info`, patient and triage routes); authentication and durable
//! persistence remain external collaborators.

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_rest::{EncounterStore, StoreError};
use api_shared::{
    EncounterSummary, HealthRes, HealthService, InfoRes, ListEncountersRes, OpenEncounterReq,
    OpenEncounterRes, QueueEntryRes, QueueRes, RecordVitalsReq, RecordVitalsRes, ReloadRulesReq,
    ReloadRulesRes, RulesRes,
};
use saviser_core::{
    resolve_rules_path, ClassificationEngine, ConsciousnessLevel, CoreConfig, NonEmptyText,
    RuleSet, TriageError, VitalSignsInput, VitalSignsRecord,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
struct AppState {
    cfg: Arc<CoreConfig>,
    engine: Arc<ClassificationEngine>,
    store: Arc<EncounterStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        open_encounter,
        list_encounters,
        record_vitals,
        queue,
        reload_rules,
        get_rules,
    ),
    components(schemas(
        HealthRes,
        InfoRes,
        OpenEncounterReq,
        OpenEncounterRes,
        EncounterSummary,
        ListEncountersRes,
        RecordVitalsReq,
        RecordVitalsRes,
        QueueEntryRes,
        QueueRes,
        ReloadRulesReq,
        ReloadRulesRes,
        RulesRes,
    ))
)]
struct ApiDoc;

/// Main entry point for the SAVISER REST API server.
///
/// # Environment Variables
/// - `SAVISER_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SAVISER_RULES_PATH`: Rule definition file (default: the workspace's
///   `rules/default.yaml`)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the rule definition file cannot be resolved or loaded, or
/// - the server address cannot be bound or the HTTP server fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("saviser_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SAVISER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let rules_override = std::env::var("SAVISER_RULES_PATH").ok().map(PathBuf::from);
    let rules_path = resolve_rules_path(rules_override)?;
    let cfg = Arc::new(CoreConfig::new(rules_path)?);

    let initial_rules = RuleSet::load_from_path(cfg.rules_path())?;
    tracing::info!(
        rules = initial_rules.len(),
        path = %cfg.rules_path().display(),
        "loaded rule set"
    );

    let state = AppState {
        cfg,
        engine: Arc::new(ClassificationEngine::new(initial_rules)),
        store: Arc::new(EncounterStore::new()),
    };

    tracing::info!("-- Starting SAVISER REST API on {}", addr);

    let app = Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/encounters", post(open_encounter))
        .route("/encounters", get(list_encounters))
        .route("/encounters/:id/vitals", post(record_vitals))
        .route("/queue", get(queue))
        .route("/rules/reload", post(reload_rules))
        .route("/rules", get(get_rules))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancer checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/info",
    responses(
        (status = 200, description = "System information", body = InfoRes)
    )
)]
/// System information: name, version and the available endpoints.
#[axum::debug_handler]
async fn info(State(_state): State<AppState>) -> Json<InfoRes> {
    Json(InfoRes {
        name: "SAVISER".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: "Sistema de Clasificación de Triage".into(),
        endpoints: vec![
            "/health".into(),
            "/info".into(),
            "/encounters".into(),
            "/encounters/{id}/vitals".into(),
            "/queue".into(),
            "/rules".into(),
            "/rules/reload".into(),
        ],
    })
}

#[utoipa::path(
    post,
    path = "/encounters",
    request_body = OpenEncounterReq,
    responses(
        (status = 201, description = "Encounter opened", body = OpenEncounterRes),
        (status = 400, description = "Bad request")
    )
)]
/// Opens a new patient encounter.
#[axum::debug_handler]
async fn open_encounter(
    State(state): State<AppState>,
    Json(req): Json<OpenEncounterReq>,
) -> Result<(StatusCode, Json<OpenEncounterRes>), (StatusCode, String)> {
    let patient_name = NonEmptyText::new(&req.patient_name)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let encounter_id = state.store.open(patient_name);
    Ok((StatusCode::CREATED, Json(OpenEncounterRes { encounter_id })))
}

#[utoipa::path(
    get,
    path = "/encounters",
    responses(
        (status = 200, description = "All encounters with their latest level", body = ListEncountersRes)
    )
)]
/// Lists all encounters, including those still pending classification.
#[axum::debug_handler]
async fn list_encounters(State(state): State<AppState>) -> Json<ListEncountersRes> {
    Json(ListEncountersRes {
        encounters: state.store.summaries(),
    })
}

#[utoipa::path(
    post,
    path = "/encounters/{id}/vitals",
    request_body = RecordVitalsReq,
    responses(
        (status = 201, description = "Vitals recorded and classified", body = RecordVitalsRes),
        (status = 400, description = "Vital signs out of plausible bounds"),
        (status = 404, description = "Encounter not found"),
        (status = 500, description = "Classification failed")
    )
)]
/// Records a vital-signs snapshot and classifies it immediately.
///
/// A failed classification is surfaced as an error and nothing is stored;
/// the encounter stays "pending classification" rather than receiving a
/// defaulted level.
#[axum::debug_handler]
async fn record_vitals(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<RecordVitalsReq>,
) -> Result<(StatusCode, Json<RecordVitalsRes>), (StatusCode, String)> {
    let consciousness = ConsciousnessLevel::from_token(&req.consciousness).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("unknown consciousness level {:?}", req.consciousness),
        )
    })?;

    let record = VitalSignsRecord::new(VitalSignsInput {
        heart_rate: req.heart_rate,
        systolic_bp: req.systolic_bp,
        diastolic_bp: req.diastolic_bp,
        respiratory_rate: req.respiratory_rate,
        spo2: req.spo2,
        temperature: req.temperature,
        pain_scale: req.pain_scale,
        consciousness,
        chief_complaint: req.chief_complaint,
        age: req.age,
    })
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let result = state.engine.evaluate(&record).map_err(|e| {
        tracing::error!(encounter_id = %id, error = %e, "classification failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "classification failed".to_string())
    })?;

    let response = RecordVitalsRes {
        record_id: record.id(),
        level: result.level().as_u8(),
        matched_rule_ids: result
            .matched_rule_ids()
            .into_iter()
            .map(str::to_owned)
            .collect(),
        rationale: result.rationale(),
        classified_at: result.classified_at(),
    };

    state.store.attach(id, record, result).map_err(|e| match e {
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Core(inner) => {
            tracing::error!(encounter_id = %id, error = %inner, "failed to store result");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to store result".to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/queue",
    responses(
        (status = 200, description = "Projected waiting-room order", body = QueueRes),
        (status = 503, description = "Snapshot was inconsistent, retry")
    )
)]
/// Projects the waiting-room queue from the current encounter snapshot.
#[axum::debug_handler]
async fn queue(State(state): State<AppState>) -> Result<Json<QueueRes>, (StatusCode, String)> {
    let (projection, names) = state.store.project_queue().map_err(|e| {
        tracing::error!(error = %e, "queue projection failed");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    let ordered = projection
        .ordered
        .into_iter()
        .map(|entry| QueueEntryRes {
            encounter_id: entry.encounter_id,
            patient_name: names.get(&entry.encounter_id).cloned().unwrap_or_default(),
            level: entry.level.as_u8(),
            classified_at: entry.classified_at,
        })
        .collect();

    Ok(Json(QueueRes {
        ordered,
        pending: projection.pending,
    }))
}

#[utoipa::path(
    post,
    path = "/rules/reload",
    request_body = ReloadRulesReq,
    responses(
        (status = 200, description = "Rule set replaced atomically", body = ReloadRulesRes),
        (status = 400, description = "Definition rejected, previous rule set remains active")
    )
)]
/// Atomically replaces the active rule set.
///
/// With a `source` body the submitted YAML is loaded; without one the
/// configured rules file is re-read. A rejected definition leaves the
/// last-known-good rule set active.
#[axum::debug_handler]
async fn reload_rules(
    State(state): State<AppState>,
    Json(req): Json<ReloadRulesReq>,
) -> Result<Json<ReloadRulesRes>, (StatusCode, String)> {
    let outcome = match &req.source {
        Some(source) => state.engine.reload(source),
        None => state.engine.reload_from_path(state.cfg.rules_path()),
    };

    match outcome {
        Ok(()) => Ok(Json(ReloadRulesRes {
            rules: state.engine.snapshot().len(),
        })),
        Err(e @ (TriageError::InvalidRuleDefinition(_) | TriageError::YamlDeserialization(_))) => {
            tracing::warn!(error = %e, "rule reload rejected, keeping previous rule set");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, "rule reload failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/rules",
    responses(
        (status = 200, description = "Active rule set in canonical YAML", body = RulesRes)
    )
)]
/// Returns the active rule set in canonical, re-loadable YAML form.
#[axum::debug_handler]
async fn get_rules(State(state): State<AppState>) -> Json<RulesRes> {
    let snapshot = state.engine.snapshot();
    Json(RulesRes {
        rules: snapshot.len(),
        source: snapshot.to_source(),
    })
}
