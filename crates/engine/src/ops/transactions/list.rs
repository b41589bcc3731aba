use std::collections::{HashMap, HashSet};

use sea_orm::{Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, HistoryCmd, ResultEngine, TransactionKind, TransactionRecord, accounts, records,
};

use super::super::{Engine, with_tx};

/// Filter for the account history query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryFilter {
    /// Everything the account sent or received.
    #[default]
    All,
    Deposit,
    Withdraw,
    Transfer,
    /// Transfers where the account is the sender.
    Sent,
    /// Transfers where the account is the receiver.
    Received,
}

/// One history row with resolved counterparty display names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryItem {
    pub record: TransactionRecord,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
}

/// One page of history, newest first.
#[derive(Clone, Debug)]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub total: u64,
    /// 1-based page number actually served.
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl Engine {
    /// Read-only history query: newest first, page/page_size pagination.
    pub async fn history(&self, cmd: HistoryCmd) -> ResultEngine<HistoryPage> {
        let HistoryCmd {
            account_id,
            filter,
            page,
            page_size,
        } = cmd;
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        with_tx!(self, |db_tx| {
            accounts::Entity::find_by_id(account_id.as_str())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;

            let involved = Condition::any()
                .add(records::Column::SenderId.eq(account_id.as_str()))
                .add(records::Column::ReceiverId.eq(account_id.as_str()));
            let condition = match filter {
                HistoryFilter::All => involved,
                HistoryFilter::Deposit => Condition::all()
                    .add(involved)
                    .add(records::Column::Kind.eq(TransactionKind::Deposit.as_str())),
                HistoryFilter::Withdraw => Condition::all()
                    .add(involved)
                    .add(records::Column::Kind.eq(TransactionKind::Withdraw.as_str())),
                HistoryFilter::Transfer => Condition::all()
                    .add(involved)
                    .add(records::Column::Kind.eq(TransactionKind::Transfer.as_str())),
                HistoryFilter::Sent => Condition::all()
                    .add(records::Column::SenderId.eq(account_id.as_str()))
                    .add(records::Column::Kind.eq(TransactionKind::Transfer.as_str())),
                HistoryFilter::Received => Condition::all()
                    .add(records::Column::ReceiverId.eq(account_id.as_str()))
                    .add(records::Column::Kind.eq(TransactionKind::Transfer.as_str())),
            };

            let paginator = records::Entity::find()
                .filter(condition)
                .order_by_desc(records::Column::CreatedAt)
                .order_by_desc(records::Column::Id)
                .paginate(&db_tx, page_size);

            let totals = paginator.num_items_and_pages().await?;
            let models = paginator.fetch_page(page - 1).await?;

            let counterparty_ids: HashSet<String> = models
                .iter()
                .flat_map(|m| [m.sender_id.clone(), m.receiver_id.clone()])
                .flatten()
                .collect();
            let mut usernames: HashMap<String, String> = HashMap::new();
            if !counterparty_ids.is_empty() {
                let rows = accounts::Entity::find()
                    .filter(accounts::Column::Id.is_in(counterparty_ids))
                    .all(&db_tx)
                    .await?;
                for account in rows {
                    usernames.insert(account.id, account.username);
                }
            }

            let mut items = Vec::with_capacity(models.len());
            for model in models {
                let record = TransactionRecord::try_from(model)?;
                let sender_name = record
                    .sender_id
                    .as_ref()
                    .and_then(|id| usernames.get(id).cloned());
                let receiver_name = record
                    .receiver_id
                    .as_ref()
                    .and_then(|id| usernames.get(id).cloned());
                items.push(HistoryItem {
                    record,
                    sender_name,
                    receiver_name,
                });
            }

            Ok(HistoryPage {
                items,
                total: totals.number_of_items,
                page,
                page_size,
                total_pages: totals.number_of_pages,
            })
        })
    }
}
