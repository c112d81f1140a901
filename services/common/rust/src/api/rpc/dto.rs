use serde::{Deserialize, Serialize};

use crate::api::dto::{jsn_serialize_bookable_kind, jsn_validate_bookable_kind, CurrencyDto};
use crate::constant::BookableKind;

#[derive(Serialize, Deserialize)]
pub struct BookableItemReplicaReqDto {
    #[serde(
        deserialize_with = "jsn_validate_bookable_kind",
        serialize_with = "jsn_serialize_bookable_kind"
    )]
    pub kind: BookableKind,
    pub item_id: u64,
}

#[derive(Serialize, Deserialize)]
pub struct BookableItemReplicaDto {
    #[serde(
        deserialize_with = "jsn_validate_bookable_kind",
        serialize_with = "jsn_serialize_bookable_kind"
    )]
    pub kind: BookableKind,
    pub item_id: u64,
    pub owner_id: Option<u32>,
    pub active: bool,
    // nightly (or daily) price quoted by inventory service, represented
    // as string, can be converted to decimal type
    pub price_hint: Option<String>,
    pub currency: CurrencyDto,
}
