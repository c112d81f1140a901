use std::str::FromStr;

use rust_decimal::Decimal;

use tripmarket_common::api::rpc::dto::BookableItemReplicaDto;
use tripmarket_common::constant::BookableKind;

use super::BookableItemRef;

#[derive(Debug)]
pub enum BookableItemError {
    InActive,
    IdentityMismatch,
    CorruptedPrice(String),
}

// replica of one bookable item maintained in the vertical services,
// loaded through RPC at booking time
pub struct BookableItemSnapshot {
    pub kind: BookableKind,
    pub item_id: u64,
    pub owner_id: Option<u32>,
    pub active: bool,
    pub price_hint: Option<Decimal>,
}

impl TryFrom<(&BookableItemRef, BookableItemReplicaDto)> for BookableItemSnapshot {
    type Error = BookableItemError;

    fn try_from(value: (&BookableItemRef, BookableItemReplicaDto)) -> Result<Self, Self::Error> {
        let (req, d) = value;
        if req.kind != d.kind || req.item_id != d.item_id {
            return Err(BookableItemError::IdentityMismatch);
        }
        if !d.active {
            return Err(BookableItemError::InActive);
        }
        let price_hint = match d.price_hint.as_ref() {
            Some(raw) => {
                let p = Decimal::from_str(raw.as_str())
                    .map_err(|_e| BookableItemError::CorruptedPrice(raw.clone()))?;
                Some(p)
            }
            None => None,
        };
        Ok(Self {
            kind: d.kind,
            item_id: d.item_id,
            owner_id: d.owner_id,
            active: d.active,
            price_hint,
        })
    }
} // end of impl TryFrom for BookableItemSnapshot
