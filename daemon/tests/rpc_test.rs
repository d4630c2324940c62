//! HTTP routes: caller extraction, status codes and bodies

#![allow(clippy::disallowed_methods)]

mod common;

use std::sync::Arc;

use actix_web::{
    http::{header::CONTENT_TYPE, StatusCode},
    test,
    web::Data,
    App,
};
use common::*;
use meridian_common::{
    api::{
        daemon::{ErrorResponse, TokenPrice, WalletSummary},
        CallbackAck, Page, PaymentResult, PHONEPE_VERIFY_HEADER,
    },
    config::DEFAULT_TOKEN_PRICE,
    id::Id,
    referral::ReferralSummary,
    transaction::WalletTransaction,
};
use meridian_daemon::{config::USER_ID_HEADER, core::storage::SledStorage, rpc::rpc::configure};
use serde_json::json;
use tempdir::TempDir;

macro_rules! app {
    ($backend:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::from(Arc::clone(&$backend)))
                .configure(configure::<SledStorage>),
        )
        .await
    };
}

#[actix_web::test]
async fn test_public_price_route() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);

    let req = test::TestRequest::get().uri("/ico/price").to_request();
    let price: TokenPrice = test::call_and_read_body_json(&app, req).await;
    assert_eq!(price.price, DEFAULT_TOKEN_PRICE);
}

#[actix_web::test]
async fn test_caller_header_required() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);

    let req = test::TestRequest::get().uri("/wallet/summary").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/wallet/summary")
        .insert_header((USER_ID_HEADER, "not-an-id"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let user = Id::random();
    let req = test::TestRequest::get()
        .uri("/wallet/summary")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .to_request();
    let summary: WalletSummary = test::call_and_read_body_json(&app, req).await;
    assert_eq!(summary.wallet.user, user);
    assert_eq!(summary.wallet.balance, 0);
}

#[actix_web::test]
async fn test_business_error_is_bad_request() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);
    let user = Id::random();

    let req = test::TestRequest::post()
        .uri("/wallet/withdraw")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .set_json(json!({ "amount": 20000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.message.starts_with("Insufficient funds"));
}

#[actix_web::test]
async fn test_unknown_record_is_not_found() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);

    let req = test::TestRequest::patch()
        .uri(&format!("/admin/wallet/transactions/{}", Id::random()))
        .set_json(json!({ "status": "completed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_topup_and_callback_routes() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);
    let user = Id::random();

    let req = test::TestRequest::post()
        .uri("/wallet/topup")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .set_json(json!({ "amount": 5000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let merchant_id = body["transaction"]["merchantTransactionId"]
        .as_str()
        .unwrap()
        .to_owned();
    assert!(body["transaction"]["gatewayPayload"].is_null());
    assert!(body["paymentSession"]["encodedPayload"].is_string());

    let body = serde_json::to_vec(&callback_body(&merchant_id, SUCCESS_CODE)).unwrap();
    let req = test::TestRequest::post()
        .uri("/payments/phonepe/callback")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut acks = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/payments/phonepe/callback")
            .insert_header((CONTENT_TYPE, "application/json"))
            .insert_header((PHONEPE_VERIFY_HEADER, sign_callback(&body)))
            .set_payload(body.clone())
            .to_request();
        let ack: CallbackAck = test::call_and_read_body_json(&app, req).await;
        acks.push(ack);
    }
    assert!(acks[0].handled);
    assert_eq!(acks[0].code, PaymentResult::Paid);
    assert_eq!(acks[0], acks[1]);

    let body = serde_json::to_vec(&callback_body(&Id::random().to_hex(), SUCCESS_CODE)).unwrap();
    let req = test::TestRequest::post()
        .uri("/payments/phonepe/callback")
        .insert_header((PHONEPE_VERIFY_HEADER, sign_callback(&body)))
        .set_payload(body)
        .to_request();
    let ack: CallbackAck = test::call_and_read_body_json(&app, req).await;
    assert!(!ack.handled);

    let req = test::TestRequest::get()
        .uri("/wallet/transactions?status=completed")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .to_request();
    let page: Page<WalletTransaction> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].amount, 5000);
}

#[actix_web::test]
async fn test_referral_register_without_body() {
    let temp_dir = TempDir::new("meridian_rpc").unwrap();
    let backend = Arc::new(create_test_backend(&temp_dir));
    let app = app!(backend);
    let user = Id::random();

    let req = test::TestRequest::post()
        .uri("/referral/register")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let summary: ReferralSummary = test::read_body_json(resp).await;
    assert_eq!(summary.referral_level, 0);

    let req = test::TestRequest::post()
        .uri("/referral/register")
        .insert_header((USER_ID_HEADER, user.to_hex()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
