//! Tests for the domain actions
//!
//! Validates that each action hits its endpoint with the right payload,
//! commits the right transition and leaves the session alone on failure.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use serde_json::{Value, json};
use shared::models::{ChangePasswordRequest, NomineeDetails, ProfileUpdateRequest};

use crate::{
    actions::{KycDocument, KycSubmission},
    boundary::{Attachment, GrantAll, Permission, PermissionGate},
    credentials::CredentialStore,
    error::{ActionError, ApiError, BoundaryError},
    session::Action,
    test_support::{Hits, actions, spawn_server},
};

async fn login(Json(body): Json<Value>) -> Json<Value> {
    if body["password"] == "secret1" {
        Json(json!({"status": true, "data": "tok_abc"}))
    } else {
        Json(json!({"status": false, "msg": "You have entered an incorrect password."}))
    }
}

async fn profile(State(hits): State<Hits>) -> Json<Value> {
    let n = hits.record();
    Json(json!({"status": true, "member": {"name": format!("Asha v{n}"), "username": "SAM1024"}}))
}

async fn saved() -> Json<Value> {
    Json(json!({"status": true, "msg": "Saved"}))
}

async fn multipart_echo(mut multipart: Multipart) -> Json<Value> {
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();
        let _ = field.bytes().await.unwrap();
        names.push(if is_file { format!("{name}*") } else { name });
    }
    Json(json!({"status": true, "msg": names.join(",")}))
}

fn router(hits: &Hits) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/profile", get(profile))
        .route("/api/update-nominee-details", post(saved))
        .route("/api/update-profile", post(saved))
        .route("/api/update-kyc", post(multipart_echo))
        .route("/api/update-profile-img", post(multipart_echo))
        .with_state(hits.clone())
}

struct DenyAll;

#[async_trait]
impl PermissionGate for DenyAll {
    async fn request(&self, _permission: Permission) -> bool {
        false
    }
}

struct FixedImage;

#[async_trait]
impl crate::boundary::AttachmentSource for FixedImage {
    async fn pick(&self) -> Result<Attachment, BoundaryError> {
        Ok(Attachment::new("me.png", "image/png", vec![0x89, b'P', b'N', b'G']))
    }
}

#[tokio::test]
async fn test_login_commits_and_persists_token() {
    let hits = Hits::default();
    let (actions, session, credentials) = actions(spawn_server(router(&hits)).await);

    actions.login(" SAM1024 ", "secret1").await.unwrap();

    assert_eq!(session.token().as_deref(), Some("tok_abc"));
    assert_eq!(credentials.get().unwrap().as_deref(), Some("tok_abc"));
}

#[tokio::test]
async fn test_login_failure_leaves_session_anonymous() {
    let hits = Hits::default();
    let (actions, session, credentials) = actions(spawn_server(router(&hits)).await);

    let err = actions.login("SAM1024", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "You have entered an incorrect password.");
    assert_eq!(session.token(), None);
    assert_eq!(credentials.get().unwrap(), None);
}

#[tokio::test]
async fn test_logout_twice_is_same_as_once() {
    let hits = Hits::default();
    let (actions, session, credentials) = actions(spawn_server(router(&hits)).await);
    actions.login("SAM1024", "secret1").await.unwrap();
    actions.fetch_profile().await.unwrap();

    actions.logout();
    let once = session.snapshot();
    actions.logout();

    assert_eq!(session.snapshot(), once);
    assert_eq!(once.token(), None);
    assert!(once.profile().is_none());
    assert_eq!(credentials.get().unwrap(), None);
}

async fn slow_profile_by_token(headers: HeaderMap) -> Json<Value> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    tokio::time::sleep(Duration::from_millis(200)).await;
    Json(json!({"status": true, "member": {"name": bearer}}))
}

#[tokio::test]
async fn test_profile_fetch_after_account_switch_is_not_shared() {
    let base = spawn_server(Router::new().route("/api/profile", get(slow_profile_by_token))).await;
    let (actions, session, _) = actions(base);
    session.dispatch(Action::Authenticate("tok_a".into()));

    let previous = tokio::spawn({
        let actions = actions.clone();
        async move { actions.fetch_profile().await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    actions.logout();
    session.dispatch(Action::Authenticate("tok_b".into()));

    let current = actions.fetch_profile().await.unwrap();
    assert_eq!(current.name, "Bearer tok_b");

    let stale = previous.await.unwrap().unwrap();
    assert_eq!(stale.name, "Bearer tok_a");
    let snapshot = session.snapshot();
    assert_eq!(snapshot.token(), Some("tok_b"));
    assert_eq!(snapshot.profile().map(|p| p.name.as_str()), Some("Bearer tok_b"));
}

#[tokio::test]
async fn test_rejected_previous_token_keeps_new_session() {
    async fn reject_after_delay() -> StatusCode {
        tokio::time::sleep(Duration::from_millis(200)).await;
        StatusCode::UNAUTHORIZED
    }
    let base = spawn_server(Router::new().route("/api/profile", get(reject_after_delay))).await;
    let (actions, session, credentials) = actions(base);
    session.dispatch(Action::Authenticate("tok_a".into()));

    let previous = tokio::spawn({
        let actions = actions.clone();
        async move { actions.fetch_profile().await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    actions.logout();
    session.dispatch(Action::Authenticate("tok_b".into()));
    credentials.set("tok_b").unwrap();

    assert_eq!(previous.await.unwrap().unwrap_err(), ApiError::Auth);
    assert_eq!(session.token().as_deref(), Some("tok_b"));
    assert_eq!(credentials.get().unwrap().as_deref(), Some("tok_b"));
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let hits = Hits::default();
    let (actions, session, _) = actions(spawn_server(router(&hits)).await);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let err = actions
        .update_profile(&ProfileUpdateRequest::default())
        .await
        .unwrap_err();

    let errors = err.validation().unwrap();
    assert_eq!(errors.get("name"), Some("Name is required"));
    assert_eq!(hits.count(), 0);

    let err = actions
        .change_password(&ChangePasswordRequest {
            old_password: "old".into(),
            new_password: "short".into(),
            new_password_confirmation: "short".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Validation(_)));
}

#[tokio::test]
async fn test_nominee_update_refreshes_profile() {
    let hits = Hits::default();
    let (actions, session, _) = actions(spawn_server(router(&hits)).await);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let message = actions
        .update_nominee(&NomineeDetails {
            nominee_name: "Ravi Rao".into(),
            relationship: "Brother".into(),
            nominee_mobile: "9876543210".into(),
            nominee_address: "Bengaluru".into(),
        })
        .await
        .unwrap();

    assert_eq!(message, "Saved");
    assert_eq!(hits.count(), 1);
    assert_eq!(
        session.snapshot().profile().map(|p| p.name.clone()),
        Some("Asha v1".to_string())
    );
}

#[tokio::test]
async fn test_kyc_submission_mixes_existing_and_new_documents() {
    let hits = Hits::default();
    let (actions, session, _) = actions(spawn_server(router(&hits)).await);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let submission = KycSubmission {
        aadhaar: "123412341234".into(),
        pan: "ABCDE1234F".into(),
        aadhaar_img: Some(KycDocument::Existing("kyc/a.jpg".into())),
        aadhaar_back_img: Some(KycDocument::Existing("kyc/b.jpg".into())),
        pan_img: Some(KycDocument::Upload(Attachment::new(
            "pan.jpg",
            "image/jpeg",
            vec![1, 2, 3],
        ))),
        checkbook_img: Some(KycDocument::Existing("kyc/c.jpg".into())),
    };
    let message = actions.update_kyc(submission).await.unwrap();

    assert_eq!(
        message,
        "aadhaar,pan,aadhaar_img,aadhaar_back_img,pan_img*,checkbook_img"
    );
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_profile_image_upload() {
    let hits = Hits::default();
    let (actions, session, _) = actions(spawn_server(router(&hits)).await);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let message = actions
        .upload_profile_image(&GrantAll, &FixedImage)
        .await
        .unwrap();
    assert_eq!(message, "profile_img*");
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_denied_permission_aborts_upload() {
    let hits = Hits::default();
    let (actions, session, _) = actions(spawn_server(router(&hits)).await);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let err = actions
        .upload_profile_image(&DenyAll, &FixedImage)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ActionError::Boundary(BoundaryError::PermissionDenied(Permission::PhotoLibrary))
    ));
    assert_eq!(err.user_message(), "Photo library permission is required to continue");
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn test_stale_district_list_is_dropped() {
    async fn districts(Path(state_id): Path<u64>) -> Json<Value> {
        if state_id == 29 {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        Json(json!({"status": true, "data": [{"id": state_id * 100, "name": format!("District of {state_id}")}]}))
    }
    let base = spawn_server(Router::new().route("/api/districts/{state_id}", get(districts))).await;
    let (actions, session, _) = actions(base);

    let (slow, fast) = tokio::join!(actions.select_state(Some(29)), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        actions.select_state(Some(32)).await
    });
    assert!(slow.is_ok() && fast.is_ok());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.selected_state(), Some(32));
    assert_eq!(snapshot.districts().len(), 1);
    assert_eq!(snapshot.districts()[0].id, 3200);

    actions.select_state(None).await.unwrap();
    assert!(session.snapshot().districts().is_empty());
}

#[tokio::test]
async fn test_reference_lookups() {
    async fn amount() -> Json<Value> {
        Json(json!({"status": true, "amount": "500"}))
    }
    async fn guide(Path(sam_no): Path<String>) -> Json<Value> {
        if sam_no == "SAM1024" {
            Json(json!({"status": true, "name": "Asha Rao"}))
        } else {
            Json(json!({"status": false, "msg": "Invalid SAM number"}))
        }
    }
    let base = spawn_server(
        Router::new()
            .route("/api/register-amount", get(amount))
            .route("/api/get-guide-details/{sam_no}", get(guide)),
    )
    .await;
    let (actions, session, _) = actions(base);

    assert!((actions.fetch_registration_amount().await.unwrap() - 500.0).abs() < f64::EPSILON);
    assert_eq!(session.snapshot().registration_amount(), Some(500.0));

    assert_eq!(actions.lookup_guide("SA").await.unwrap(), None);
    assert_eq!(
        actions.lookup_guide("SAM1024").await.unwrap().as_deref(),
        Some("Asha Rao")
    );
    assert_eq!(
        actions.lookup_guide("SAM9").await.unwrap_err(),
        ApiError::domain(Some(200), "Invalid SAM number")
    );
}

#[tokio::test]
async fn test_guide_lookup_keeps_sam_number_inside_its_path_segment() {
    async fn profile(State(hits): State<Hits>) -> Json<Value> {
        hits.record();
        Json(json!({"status": true, "member": {"name": "Someone Else"}}))
    }
    async fn guide(State(hits): State<Hits>) -> Json<Value> {
        hits.record();
        Json(json!({"status": true, "name": "Asha Rao"}))
    }
    let hits = Hits::default();
    let base = spawn_server(
        Router::new()
            .route("/api/profile", get(profile))
            .route("/api/get-guide-details/{sam_no}", get(guide))
            .with_state(hits.clone()),
    )
    .await;
    let (actions, _, _) = actions(base);

    for sam_no in ["../profile", "SAM1/../../profile", "SAM1?x=1", "SAM1#frag", "SAM 1024"] {
        assert_eq!(actions.lookup_guide(sam_no).await.unwrap(), None, "{sam_no}");
    }
    assert_eq!(hits.count(), 0);
}

#[tokio::test]
async fn test_referral_views() {
    async fn dashboard() -> Json<Value> {
        Json(json!({"status": true, "total_referral": 4, "total_amount": "1250.50"}))
    }
    async fn referrals() -> Json<Value> {
        Json(json!({
            "status": true,
            "referrals": [{"name": "Ravi", "status": "ACTIVE"}],
            "total_mem": 4,
            "total_pending_mem": 1,
            "total_active_mem": 2,
            "total_rejected_mem": 1
        }))
    }
    async fn income(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body, json!({"month": 3, "year": 2025}));
        Json(json!({"status": true, "income": {"direct": {"count": 2, "amount": 200}}}))
    }
    let base = spawn_server(
        Router::new()
            .route("/api/dashboard-data", get(dashboard))
            .route("/api/referral-list", get(referrals))
            .route("/api/referral-income-list", post(income)),
    )
    .await;
    let (actions, session, _) = actions(base);
    session.dispatch(Action::Authenticate("tok_abc".into()));

    let summary = actions.fetch_dashboard().await.unwrap();
    assert_eq!(summary.total_referral, 4);

    let referrals = actions.fetch_referrals().await.unwrap();
    assert_eq!(referrals.total, 4);
    assert_eq!(referrals.members.len(), 1);

    let income = actions.fetch_referral_income(3, 2025).await.unwrap();
    assert_eq!(income.direct.count, 2);

    let snapshot = session.snapshot();
    assert!(snapshot.dashboard().is_some());
    assert_eq!(snapshot.referrals().map(|r| r.active), Some(2));
    assert!(snapshot.referral_income().is_some());
}
