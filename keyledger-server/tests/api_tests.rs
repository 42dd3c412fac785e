// File: keyledger-server/tests/api_tests.rs
//
// Router-level tests over in-memory repositories: one POST /api surface,
// distinct statuses per failure, no internals leaking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use keyledger_common::Error;
use keyledger_common::models::{
    AdminCredential, CodeStatus, CredentialStatus, Purchase, PurchaseStatus, RedeemableCode,
};
use keyledger_common::traits::notify_traits::NotificationSink;
use keyledger_common::traits::repository_traits::{
    AdminCredentialRepository, PurchaseRepository, RedeemableCodeRepository,
};
use keyledger_common::models::notification::NotificationEvent;
use keyledger_core::services::{CredentialService, PurchaseService, RedemptionService};

// Minimal in-memory fakes, enough to drive the router.

#[derive(Default)]
struct MemoryCredentialRepo {
    creds: Mutex<HashMap<String, AdminCredential>>,
}

#[async_trait]
impl AdminCredentialRepository for MemoryCredentialRepo {
    async fn validate(&self, key: &str) -> Result<bool, Error> {
        let mut map = self.creds.lock().unwrap();
        match map.get_mut(key) {
            Some(c) if c.status == CredentialStatus::Active => {
                c.last_used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
    async fn revoke(&self, key: &str) -> Result<(), Error> {
        if let Some(c) = self.creds.lock().unwrap().get_mut(key) {
            c.status = CredentialStatus::Revoked;
        }
        Ok(())
    }
    async fn get(&self, key: &str) -> Result<Option<AdminCredential>, Error> {
        Ok(self.creds.lock().unwrap().get(key).cloned())
    }
}

#[derive(Default)]
struct MemoryCodeRepo {
    codes: Mutex<HashMap<String, RedeemableCode>>,
}

#[async_trait]
impl RedeemableCodeRepository for MemoryCodeRepo {
    async fn insert(&self, code: &RedeemableCode) -> Result<(), Error> {
        self.codes
            .lock()
            .unwrap()
            .insert(code.code.clone(), code.clone());
        Ok(())
    }
    async fn get(&self, code: &str) -> Result<Option<RedeemableCode>, Error> {
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }
    async fn redeem(
        &self,
        code: &str,
        redeemed_by: &str,
        replacement: Option<&RedeemableCode>,
    ) -> Result<(), Error> {
        let mut map = self.codes.lock().unwrap();
        match map.get_mut(code) {
            None => Err(Error::NotFound(format!("code '{}'", code))),
            Some(c) if c.status == CodeStatus::Redeemed => {
                Err(Error::AlreadyRedeemed(code.to_string()))
            }
            Some(c) => {
                c.status = CodeStatus::Redeemed;
                c.redeemed_by = Some(redeemed_by.to_string());
                c.redeemed_at = Some(Utc::now());
                if let Some(fresh) = replacement {
                    map.insert(fresh.code.clone(), fresh.clone());
                }
                Ok(())
            }
        }
    }
}

#[derive(Default)]
struct MemoryPurchaseRepo {
    purchases: Mutex<HashMap<String, Purchase>>,
}

#[async_trait]
impl PurchaseRepository for MemoryPurchaseRepo {
    async fn create(&self, purchase: &Purchase) -> Result<(), Error> {
        self.purchases
            .lock()
            .unwrap()
            .insert(purchase.purchase_id.clone(), purchase.clone());
        Ok(())
    }
    async fn get(&self, purchase_id: &str) -> Result<Option<Purchase>, Error> {
        Ok(self.purchases.lock().unwrap().get(purchase_id).cloned())
    }
    async fn approve(
        &self,
        purchase_id: &str,
        code: &RedeemableCode,
        validated_at: chrono::DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut map = self.purchases.lock().unwrap();
        match map.get_mut(purchase_id) {
            None => Err(Error::NotFound(format!("purchase '{}'", purchase_id))),
            Some(p) if p.status != PurchaseStatus::Pending => {
                Err(Error::AlreadyValidated(purchase_id.to_string()))
            }
            Some(p) => {
                p.status = PurchaseStatus::Approved;
                p.issued_code = Some(code.code.clone());
                p.validated_at = Some(validated_at);
                Ok(())
            }
        }
    }
    async fn reject(
        &self,
        purchase_id: &str,
        reason: &str,
        validated_at: chrono::DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut map = self.purchases.lock().unwrap();
        match map.get_mut(purchase_id) {
            None => Err(Error::NotFound(format!("purchase '{}'", purchase_id))),
            Some(p) if p.status != PurchaseStatus::Pending => {
                Err(Error::AlreadyValidated(purchase_id.to_string()))
            }
            Some(p) => {
                p.status = PurchaseStatus::Rejected;
                p.rejection_reason = Some(reason.to_string());
                p.validated_at = Some(validated_at);
                Ok(())
            }
        }
    }
    async fn list_pending(&self, limit: i64) -> Result<Vec<Purchase>, Error> {
        let map = self.purchases.lock().unwrap();
        let mut pending: Vec<Purchase> = map
            .values()
            .filter(|p| p.status == PurchaseStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending.truncate(limit as usize);
        Ok(pending)
    }
}

struct SilentSink;

#[async_trait]
impl NotificationSink for SilentSink {
    async fn notify(&self, _event: &NotificationEvent) -> Result<(), Error> {
        Ok(())
    }
}

const ADMIN_KEY: &str = "ADM-staff";

fn test_router() -> (Router, Arc<MemoryPurchaseRepo>, Arc<MemoryCodeRepo>) {
    let creds = Arc::new(MemoryCredentialRepo::default());
    creds.creds.lock().unwrap().insert(
        ADMIN_KEY.to_string(),
        AdminCredential {
            key: ADMIN_KEY.to_string(),
            status: CredentialStatus::Active,
            created_at: Utc::now(),
            last_used_at: None,
        },
    );
    let codes = Arc::new(MemoryCodeRepo::default());
    let purchases = Arc::new(MemoryPurchaseRepo::default());
    let sink = Arc::new(SilentSink);

    let state = keyledger_server::api::ApiState {
        credentials: Arc::new(CredentialService::new(creds.clone())),
        purchases: Arc::new(PurchaseService::new(
            creds.clone(),
            purchases.clone(),
            sink.clone(),
            100,
        )),
        redemptions: Arc::new(RedemptionService::new(
            creds,
            codes.clone(),
            sink,
            false,
        )),
    };
    (keyledger_server::api::router(state), purchases, codes)
}

async fn post_api(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_endpoint_answers() {
    let (app, _, _) = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn approve_purchase_round_trip() {
    let (app, purchases, _) = test_router();
    purchases
        .create(&Purchase::new_pending("GC-1", "b@example.com", 19900, "GC-REF"))
        .await
        .unwrap();

    let (status, body) = post_api(
        app.clone(),
        json!({ "action": "approve_purchase", "admin_key": ADMIN_KEY, "purchase_id": "GC-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap();
    assert!(code.starts_with("PRM-"));
    assert!(body["notify_text"].as_str().unwrap().contains("GC-1"));

    // Second approval is a conflict, surfaced as 409.
    let (status, body) = post_api(
        app,
        json!({ "action": "approve_purchase", "admin_key": ADMIN_KEY, "purchase_id": "GC-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bad_admin_key_is_forbidden() {
    let (app, purchases, _) = test_router();
    purchases
        .create(&Purchase::new_pending("GC-2", "b@example.com", 19900, "GC-REF"))
        .await
        .unwrap();

    let (status, body) = post_api(
        app,
        json!({ "action": "approve_purchase", "admin_key": "ADM-nope", "purchase_id": "GC-2" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
    assert_eq!(
        purchases.get("GC-2").await.unwrap().unwrap().status,
        PurchaseStatus::Pending
    );
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let (app, purchases, _) = test_router();
    purchases
        .create(&Purchase::new_pending("GC-3", "b@example.com", 19900, "GC-REF"))
        .await
        .unwrap();

    let (status, _) = post_api(
        app.clone(),
        json!({ "action": "reject_purchase", "admin_key": ADMIN_KEY, "purchase_id": "GC-3", "reason": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post_api(
        app,
        json!({ "action": "reject_purchase", "admin_key": ADMIN_KEY, "purchase_id": "GC-3", "reason": "bad ref" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["notify_text"].as_str().unwrap().contains("bad ref"));
}

#[tokio::test]
async fn redeem_code_conflicts_on_second_use() {
    let (app, _, codes) = test_router();
    codes
        .insert(&RedeemableCode::new("PRM-TESTCODE".to_string()))
        .await
        .unwrap();

    let (status, body) = post_api(
        app.clone(),
        json!({ "action": "redeem_code", "user_id": "player_one", "code": "PRM-TESTCODE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["replacement_code"], Value::Null);

    let (status, _) = post_api(
        app.clone(),
        json!({ "action": "redeem_code", "user_id": "player_two", "code": "PRM-TESTCODE" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post_api(
        app,
        json!({ "action": "redeem_code", "user_id": "player_two", "code": "PRM-NEVERWAS" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pending_returns_only_pending() {
    let (app, purchases, _) = test_router();
    purchases
        .create(&Purchase::new_pending("GC-4", "b@example.com", 19900, "GC-REF"))
        .await
        .unwrap();

    let (status, body) = post_api(
        app.clone(),
        json!({ "action": "approve_purchase", "admin_key": ADMIN_KEY, "purchase_id": "GC-4" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["code"].is_string());

    purchases
        .create(&Purchase::new_pending("GC-5", "c@example.com", 9900, "GC-REF2"))
        .await
        .unwrap();

    let (status, body) = post_api(
        app,
        json!({ "action": "list_pending", "admin_key": ADMIN_KEY }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["purchases"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["purchase_id"], json!("GC-5"));
}

#[tokio::test]
async fn validate_admin_reports_revoked_keys_as_invalid() {
    let (app, _, _) = test_router();

    let (status, body) = post_api(
        app.clone(),
        json!({ "action": "validate_admin", "key": ADMIN_KEY }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));

    let (status, body) = post_api(
        app,
        json!({ "action": "validate_admin", "key": "ADM-revoked-or-unknown" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));
}

#[tokio::test]
async fn mint_code_is_admin_gated() {
    let (app, _, codes) = test_router();

    let (status, body) = post_api(
        app.clone(),
        json!({ "action": "mint_code", "admin_key": ADMIN_KEY }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap();
    assert!(code.starts_with("PRM-"));
    assert!(codes.get(code).await.unwrap().is_some());

    let (status, _) = post_api(
        app,
        json!({ "action": "mint_code", "admin_key": "ADM-nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_actions_are_client_errors() {
    let (app, _, _) = test_router();
    let (status, _) = post_api(
        app,
        json!({ "action": "drop_tables", "admin_key": ADMIN_KEY }),
    )
    .await;
    assert!(status.is_client_error());
}
