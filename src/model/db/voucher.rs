use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{Coll, Counter, Id, VOUCHER_COUNTER};

/// A voucher: a globally unique, monotonically increasing number issued
/// exactly once per cast ballot. It anonymises the ballot (it carries no
/// voter identity) and prevents double-linkage: the unique indexes on the
/// vote and rejection collections ensure a voucher backs at most one ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    #[serde(rename = "_id")]
    pub id: Id,
    pub number: u64,
    pub election_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
}

impl Voucher {
    /// Issue a fresh voucher for a ballot in the given election, drawing the
    /// next number atomically from the global counter.
    pub async fn issue(
        vouchers: &Coll<Voucher>,
        counters: &Coll<Counter>,
        election_id: Id,
    ) -> Result<Voucher> {
        let number = Counter::next(counters, VOUCHER_COUNTER).await?;
        let voucher = Voucher {
            id: Id::new(),
            number,
            election_id,
            issued_at: Utc::now(),
        };
        vouchers.insert_one(&voucher, None).await?;
        Ok(voucher)
    }
}
