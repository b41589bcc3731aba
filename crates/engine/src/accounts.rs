//! Account entity: identity, balance and freeze state.

use sea_orm::entity::prelude::*;

/// An account row.
///
/// Balances are integer minor units and are mutated only through the
/// engine's locked read-modify-write path. Accounts referenced by ledger
/// records are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Opaque, human-assignable account identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Unique display name.
    pub username: String,
    pub balance_minor: i64,
    /// Blocks withdrawals and transfers; deposits still settle.
    pub is_frozen: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
