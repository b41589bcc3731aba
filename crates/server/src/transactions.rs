//! Transactions API endpoints

use api_types::transaction::{
    BalanceResponse, ChallengeAccepted, ChallengeNew, DepositNew, HistoryFilter as ApiFilter,
    HistoryQuery, HistoryResponse, TransactionKind as ApiKind, TransactionStatus as ApiStatus,
    TransactionView, TransferNew, TransferResponse, WithdrawNew,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::{
    ServerError,
    server::{ClientOrigin, ServerState},
};
use engine::accounts;

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Deposit => ApiKind::Deposit,
        engine::TransactionKind::Withdraw => ApiKind::Withdraw,
        engine::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn map_status(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Success => ApiStatus::Success,
        engine::TransactionStatus::Failed => ApiStatus::Failed,
        engine::TransactionStatus::Pending => ApiStatus::Pending,
    }
}

fn map_filter(filter: ApiFilter) -> engine::HistoryFilter {
    match filter {
        ApiFilter::All => engine::HistoryFilter::All,
        ApiFilter::Deposit => engine::HistoryFilter::Deposit,
        ApiFilter::Withdraw => engine::HistoryFilter::Withdraw,
        ApiFilter::Transfer => engine::HistoryFilter::Transfer,
        ApiFilter::Sent => engine::HistoryFilter::Sent,
        ApiFilter::Received => engine::HistoryFilter::Received,
    }
}

pub async fn deposit(
    Extension(account): Extension<accounts::Model>,
    Extension(origin): Extension<ClientOrigin>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositNew>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let mut cmd =
        engine::DepositCmd::new(account.id, payload.amount_minor, Utc::now()).origin(origin.0);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let balance_minor = state.engine.deposit(cmd).await?;
    Ok(Json(BalanceResponse { balance_minor }))
}

pub async fn withdraw(
    Extension(account): Extension<accounts::Model>,
    Extension(origin): Extension<ClientOrigin>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let mut cmd =
        engine::WithdrawCmd::new(account.id, payload.amount_minor, Utc::now()).origin(origin.0);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let balance_minor = state.engine.withdraw(cmd).await?;
    Ok(Json(BalanceResponse { balance_minor }))
}

pub async fn request_challenge(
    Extension(account): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ChallengeNew>,
) -> Result<Json<ChallengeAccepted>, ServerError> {
    state
        .engine
        .request_transfer_challenge(&account.id, payload.amount_minor, Utc::now())
        .await?;
    Ok(Json(ChallengeAccepted { accepted: true }))
}

pub async fn transfer(
    Extension(account): Extension<accounts::Model>,
    Extension(origin): Extension<ClientOrigin>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<Json<TransferResponse>, ServerError> {
    let mut cmd = engine::TransferCmd::new(
        account.id,
        payload.recipient,
        payload.amount_minor,
        Utc::now(),
    )
    .origin(origin.0);
    if let Some(otp) = payload.otp {
        cmd = cmd.otp(otp);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let receipt = state.engine.transfer(cmd).await?;
    Ok(Json(TransferResponse {
        balance_minor: receipt.balance_minor,
        reference: receipt.reference,
    }))
}

pub async fn history(
    Extension(account): Extension<accounts::Model>,
    State(state): State<ServerState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let mut cmd = engine::HistoryCmd::new(account.id)
        .filter(map_filter(query.filter.unwrap_or_default()));
    if let Some(page) = query.page {
        cmd = cmd.page(page);
    }
    if let Some(page_size) = query.page_size {
        cmd = cmd.page_size(page_size);
    }

    let page = state.engine.history(cmd).await?;
    let transactions = page
        .items
        .into_iter()
        .map(|item| TransactionView {
            id: item.record.id,
            reference: item.record.reference,
            kind: map_kind(item.record.kind),
            status: map_status(item.record.status),
            amount_minor: item.record.amount_minor,
            balance_after_minor: item.record.balance_after_minor,
            sender_name: item.sender_name,
            receiver_name: item.receiver_name,
            description: item.record.description,
            created_at: item.record.created_at,
        })
        .collect();

    Ok(Json(HistoryResponse {
        transactions,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }))
}
