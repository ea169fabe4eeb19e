//! `reach-launch` runs against an in-process HTTP backend.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::{json, Value};

use reach_cli::args::Args;
use reach_cli::campaign_file::{CampaignFile, FollowUpEntry};
use reach_cli::run::{fill_and_launch, run, RunOutcome};
use reach_client::{ClientConfig, SmsApi, SmsBackend};
use reach_core::defaults::CampaignDefaults;
use reach_wizard::{StepOutcome, WizardSession};

type Log = Arc<Mutex<Vec<(Method, String, Value)>>>;

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

async fn handle(State(log): State<Log>, method: Method, uri: Uri, body: Bytes) -> impl IntoResponse {
    let path = uri.path().trim_start_matches("/api").to_string();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    log.lock().unwrap().push((method.clone(), path.clone(), parsed));

    let (status, body) = match (method, path.as_str()) {
        (Method::GET, "/calls/connections") => (
            StatusCode::OK,
            json!([{"id": 3, "name": "SW", "provider": "signalwire", "status": "active"}]),
        ),
        (Method::GET, "/connections/3/phone-numbers") => (
            StatusCode::OK,
            json!({"phoneNumbers": [{"phone_number": "+15551230000", "friendly_name": "Main"}]}),
        ),
        (Method::GET, "/sms-templates") => (
            StatusCode::OK,
            json!({"templates": [{"id": "t1", "name": "Welcome", "message": "Welcome {{firstName}}!"}]}),
        ),
        (Method::GET, "/ab-tests") => (StatusCode::OK, json!({"items": []})),
        (Method::GET, "/sms-recipients") => (StatusCode::OK, json!({"recipients": []})),
        (Method::POST, "/sms-campaigns") => (
            StatusCode::CREATED,
            json!({"id": 314, "name": "Q1 Launch", "status": "scheduled"}),
        ),
        (Method::POST, "/sms-sequences") => (
            StatusCode::CREATED,
            json!({"sequence": {"id": 9, "name": "Q1 Launch Follow-ups"}}),
        ),
        (Method::PUT, "/sms-campaigns/314") => (StatusCode::OK, json!({"id": 314})),
        (Method::POST, "/sms-recipients") => (StatusCode::OK, json!({"items": [{"id": 1}]})),
        _ => (StatusCode::NOT_FOUND, json!({"error": "Not found"})),
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body.to_string())
}

async fn serve() -> (Arc<dyn SmsBackend>, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(handle).with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let config = ClientConfig {
        api_url: format!("http://{addr}/api"),
        ..ClientConfig::default()
    };
    (Arc::new(SmsApi::new(&config).unwrap()), log)
}

fn writes(log: &Log) -> Vec<(Method, String, Value)> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(m, _, _)| *m != Method::GET)
        .cloned()
        .collect()
}

fn campaign() -> CampaignFile {
    CampaignFile {
        name: "Q1 Launch".into(),
        message: "Hello {{firstName}}".into(),
        ..CampaignFile::default()
    }
}

const CSV: &str = "Phone,First Name\n+15550001111,Ann\n";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_saves_nothing() {
    let (backend, log) = serve().await;
    let mut session = WizardSession::new(backend, CampaignDefaults::default());

    let outcome = fill_and_launch(&mut session, &campaign(), Some(CSV), true)
        .await
        .unwrap();

    assert_matches!(outcome, RunOutcome::DryRun);
    assert!(writes(&log).is_empty());
    assert_eq!(session.draft().sender_number.as_deref(), Some("+15551230000"));
    assert_eq!(session.recipients().len(), 1);
}

#[tokio::test]
async fn launch_with_follow_ups_and_csv() {
    let (backend, log) = serve().await;
    let mut session = WizardSession::new(backend, CampaignDefaults::default());
    let mut file = campaign();
    file.follow_ups = vec![FollowUpEntry {
        content: "Reminder".into(),
        delay_days: Some(2),
    }];

    let outcome = fill_and_launch(&mut session, &file, Some(CSV), false)
        .await
        .unwrap();

    let report = assert_matches!(outcome, RunOutcome::Launched(report) => report);
    assert_eq!(report.campaign_id, "314");
    assert_eq!(report.follow_ups, StepOutcome::Succeeded { count: 1 });
    assert_eq!(report.recipients, StepOutcome::Succeeded { count: 1 });

    let writes = writes(&log);
    let paths: Vec<_> = writes.iter().map(|(_, p, _)| p.as_str()).collect();
    assert_eq!(
        paths,
        ["/sms-campaigns", "/sms-sequences", "/sms-campaigns/314", "/sms-recipients"]
    );
    assert_eq!(writes[1].2["steps"][0]["delay_hours"], 48);
    assert_eq!(writes[3].2["items"][0]["name"], "Ann");
}

#[tokio::test]
async fn template_fills_message_when_file_has_none() {
    let (backend, _log) = serve().await;
    let mut session = WizardSession::new(backend, CampaignDefaults::default());
    let file = CampaignFile {
        message: String::new(),
        template_id: Some("t1".into()),
        ..campaign()
    };

    fill_and_launch(&mut session, &file, Some(CSV), true)
        .await
        .unwrap();
    assert_eq!(session.draft().message, "Welcome {{firstName}}!");
}

#[tokio::test]
async fn missing_name_stops_at_account_step() {
    let (backend, log) = serve().await;
    let mut session = WizardSession::new(backend, CampaignDefaults::default());
    let file = CampaignFile {
        name: String::new(),
        ..campaign()
    };

    let err = fill_and_launch(&mut session, &file, Some(CSV), false)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Account"), "{err:#}");
    assert!(writes(&log).is_empty());
}

#[tokio::test]
async fn no_recipients_stops_at_audience_step() {
    let (backend, log) = serve().await;
    let mut session = WizardSession::new(backend, CampaignDefaults::default());

    let err = fill_and_launch(&mut session, &campaign(), None, false)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Audience"), "{err:#}");
    assert!(writes(&log).is_empty());
}

#[tokio::test]
async fn run_reads_files_from_disk() {
    let (backend, log) = serve().await;
    let dir = std::env::temp_dir().join(format!("reach-launch-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let campaign_path = dir.join("campaign.json");
    let csv_path = dir.join("recipients.csv");
    std::fs::write(
        &campaign_path,
        r#"{"name": "Q1 Launch", "message": "Hi", "settings": {"priority": "high"}}"#,
    )
    .unwrap();
    std::fs::write(&csv_path, CSV).unwrap();

    let args = Args {
        campaign: campaign_path,
        recipients: Some(csv_path),
        edit: None,
        defaults: None,
        dry_run: false,
    };
    let outcome = run(&args, backend).await.unwrap();
    assert_matches!(outcome, RunOutcome::Launched(report) if report.is_complete());

    let writes = writes(&log);
    assert_eq!(writes[0].2["priority"], "high");

    let missing = Args {
        campaign: dir.join("missing.json"),
        ..args
    };
    let (backend, _) = serve().await;
    let err = run(&missing, backend).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to read campaign file"));

    std::fs::remove_dir_all(&dir).ok();
}
