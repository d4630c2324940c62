// HTTP routes of the daemon
//
// Handlers only extract the caller and the body, then call the backend.
// The caller id is set in the X-User-Id header by the authentication layer
// in front of the daemon.

use std::future::{ready, Ready};

use actix_web::{
    dev::Payload,
    http::StatusCode,
    web::{self, Bytes, Data, Json, Path, Query},
    FromRequest, HttpRequest, HttpResponse, ResponseError,
};
use log::error;
use meridian_common::{
    api::{
        daemon::{
            ErrorResponse, GetEarningsParams, GetIcoTransactionsParams, GetTransactionsParams,
            IcoBuyParams, IcoSellParams, PlaceOrderParams, RegisterReferralParams,
            UpdateEarningParams, UpdateTransactionParams, VerifyPaymentParams, TopupParams,
            WithdrawParams,
        },
        CallbackAck, PHONEPE_VERIFY_HEADER,
    },
    config::MAX_USER_PAGE_LIMIT,
    id::{Id, UserId},
    referral::ReferralSummary,
};
use crate::{
    config::USER_ID_HEADER,
    core::{backend::Backend, error::LedgerError, storage::Storage},
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{} header is missing", USER_ID_HEADER)]
    MissingUserId,
    #[error("{} header is not a valid user id", USER_ID_HEADER)]
    InvalidUserId,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUserId => StatusCode::UNAUTHORIZED,
            Self::InvalidUserId => StatusCode::BAD_REQUEST,
            Self::Ledger(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Ledger(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Error while handling request: {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            message: self.to_string(),
        })
    }
}

/// Caller identity taken from the authentication header
pub struct CallerId(pub UserId);

impl FromRequest for CallerId {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.headers().get(USER_ID_HEADER) {
            None => Err(ApiError::MissingUserId),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|value| value.trim().parse::<Id>().ok())
                .map(CallerId)
                .ok_or(ApiError::InvalidUserId),
        };
        ready(result)
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

pub fn configure<S: Storage>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/phonepe/callback", web::post().to(phonepe_callback::<S>))
            .route("/razorpay/verify", web::post().to(razorpay_verify::<S>)),
    )
    .service(
        web::scope("/wallet")
            .route("/summary", web::get().to(wallet_summary::<S>))
            .route("/transactions", web::get().to(wallet_transactions::<S>))
            .route("/topup", web::post().to(wallet_topup::<S>))
            .route("/withdraw", web::post().to(wallet_withdraw::<S>))
            .route("/referral/redeem", web::post().to(redeem_referral::<S>)),
    )
    .service(
        web::scope("/ico")
            .route("/price", web::get().to(ico_price::<S>))
            .route("/summary", web::get().to(ico_summary::<S>))
            .route("/transactions", web::get().to(ico_transactions::<S>))
            .route("/buy", web::post().to(ico_buy::<S>))
            .route("/sell", web::post().to(ico_sell::<S>)),
    )
    .route("/orders", web::post().to(place_order::<S>))
    .service(
        web::scope("/referral")
            .route("/register", web::post().to(register_referral::<S>))
            .route("/summary", web::get().to(referral_summary::<S>))
            .route("/earnings", web::get().to(referral_earnings::<S>)),
    )
    .service(
        web::scope("/admin")
            .route("/stats", web::get().to(admin_stats::<S>))
            .route("/users/{id}", web::get().to(admin_user::<S>))
            .route("/wallet/transactions", web::get().to(admin_wallet_transactions::<S>))
            .route(
                "/wallet/transactions/{id}",
                web::patch().to(admin_update_transaction::<S>),
            )
            .route("/ico/transactions", web::get().to(admin_ico_transactions::<S>))
            .route("/referrals/earnings", web::get().to(admin_earnings::<S>))
            .route(
                "/referrals/earnings/{id}",
                web::patch().to(admin_update_earning::<S>),
            ),
    );
}

// ===== Payments =====

// The checksum covers the raw bytes, the body is parsed after verification
async fn phonepe_callback<S: Storage>(
    backend: Data<Backend<S>>,
    req: HttpRequest,
    body: Bytes,
) -> ApiResult {
    let checksum = req
        .headers()
        .get(PHONEPE_VERIFY_HEADER)
        .and_then(|value| value.to_str().ok());
    let outcome = backend.bridge.handle_callback(&body, checksum).await?;
    Ok(HttpResponse::Ok().json(CallbackAck::from(outcome)))
}

async fn razorpay_verify<S: Storage>(
    backend: Data<Backend<S>>,
    params: Json<VerifyPaymentParams>,
) -> ApiResult {
    let outcome = backend.bridge.verify_payment(&params).await?;
    Ok(HttpResponse::Ok().json(CallbackAck::from(outcome)))
}

// ===== Wallet =====

async fn wallet_summary<S: Storage>(backend: Data<Backend<S>>, caller: CallerId) -> ApiResult {
    let summary = backend.wallet.summary(&caller.0).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn wallet_transactions<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Query<GetTransactionsParams>,
) -> ApiResult {
    let page = backend.wallet.list(&caller.0, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn wallet_topup<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Json<TopupParams>,
) -> ApiResult {
    let result = backend
        .wallet
        .initiate_topup(&caller.0, params.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

async fn wallet_withdraw<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Json<WithdrawParams>,
) -> ApiResult {
    let result = backend
        .wallet
        .request_withdrawal(&caller.0, params.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

async fn redeem_referral<S: Storage>(backend: Data<Backend<S>>, caller: CallerId) -> ApiResult {
    let result = backend.referral.redeem(&caller.0).await?;
    Ok(HttpResponse::Ok().json(result))
}

// ===== ICO =====

async fn ico_price<S: Storage>(backend: Data<Backend<S>>) -> ApiResult {
    Ok(HttpResponse::Ok().json(backend.ico.price()))
}

async fn ico_summary<S: Storage>(backend: Data<Backend<S>>, caller: CallerId) -> ApiResult {
    let summary = backend.ico.summary(&caller.0).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn ico_transactions<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Query<GetIcoTransactionsParams>,
) -> ApiResult {
    let page = backend.ico.list(&caller.0, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn ico_buy<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Json<IcoBuyParams>,
) -> ApiResult {
    let result = backend.ico.buy(&caller.0, params.into_inner()).await?;
    Ok(HttpResponse::Created().json(result))
}

async fn ico_sell<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Json<IcoSellParams>,
) -> ApiResult {
    let result = backend.ico.sell(&caller.0, params.into_inner()).await?;
    Ok(HttpResponse::Created().json(result))
}

// ===== Orders =====

async fn place_order<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Json<PlaceOrderParams>,
) -> ApiResult {
    let result = backend
        .orders
        .place_order(&caller.0, params.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

// ===== Referral =====

async fn register_referral<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Option<Json<RegisterReferralParams>>,
) -> ApiResult {
    let params = params.map(Json::into_inner).unwrap_or_default();
    let profile = backend
        .referral
        .register_profile(&caller.0, params.referral_code.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(ReferralSummary::from(&profile)))
}

async fn referral_summary<S: Storage>(backend: Data<Backend<S>>, caller: CallerId) -> ApiResult {
    let summary = backend.referral.summary(&caller.0).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn referral_earnings<S: Storage>(
    backend: Data<Backend<S>>,
    caller: CallerId,
    params: Query<GetEarningsParams>,
) -> ApiResult {
    let mut filter = params.filter();
    filter.earner = Some(caller.0);
    let page = backend
        .referral
        .list_earnings(&filter, params.pagination(MAX_USER_PAGE_LIMIT))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

// ===== Admin =====

async fn admin_stats<S: Storage>(backend: Data<Backend<S>>) -> ApiResult {
    let stats = backend.admin.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn admin_user<S: Storage>(backend: Data<Backend<S>>, user: Path<UserId>) -> ApiResult {
    let detail = backend.admin.user_detail(&user).await?;
    Ok(HttpResponse::Ok().json(detail))
}

async fn admin_wallet_transactions<S: Storage>(
    backend: Data<Backend<S>>,
    params: Query<GetTransactionsParams>,
) -> ApiResult {
    let page = backend.wallet.admin_list(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn admin_update_transaction<S: Storage>(
    backend: Data<Backend<S>>,
    id: Path<Id>,
    params: Json<UpdateTransactionParams>,
) -> ApiResult {
    let tx = backend
        .wallet
        .admin_update_transaction(&id, params.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(tx))
}

async fn admin_ico_transactions<S: Storage>(
    backend: Data<Backend<S>>,
    params: Query<GetIcoTransactionsParams>,
) -> ApiResult {
    let page = backend.ico.admin_list(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn admin_earnings<S: Storage>(
    backend: Data<Backend<S>>,
    params: Query<GetEarningsParams>,
) -> ApiResult {
    let page = backend.admin.earnings(&params).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn admin_update_earning<S: Storage>(
    backend: Data<Backend<S>>,
    id: Path<Id>,
    params: Json<UpdateEarningParams>,
) -> ApiResult {
    let earning = backend.admin.update_earning(&id, params.status).await?;
    Ok(HttpResponse::Ok().json(earning))
}
