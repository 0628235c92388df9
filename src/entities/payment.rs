use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

use crate::entities::money::{Amount, Currency};

pub const TABLE_NAME: &str = "payment";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    EscrowDeposit,
    BountyPayout,
    AdminTransfer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Escrowed,
    Released,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Thing,
    pub user: Thing,
    pub task: Option<Thing>,
    pub contribution: Option<Thing>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub amount: Amount,
    pub currency: Currency,
    pub external_tx_id: String,
    pub gateway: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
