use serde::de::{Error as DeserializeError, Expected, Unexpected};
use serde::{Deserialize, Serialize};

use crate::constant::BookableKind;

#[rustfmt::skip]
#[derive(Deserialize, Serialize, Clone)]
pub enum CountryCode { TW, TH, IN, ID, US, Unknown }

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> String {
        let out = match value {
            CountryCode::TW => "TW",
            CountryCode::TH => "TH",
            CountryCode::IN => "IN",
            CountryCode::ID => "ID",
            CountryCode::US => "US",
            CountryCode::Unknown => "Unknown",
        };
        out.to_string()
    }
} // implement `Into` trait, not replying on serde
impl From<String> for CountryCode {
    // TODO, from literal string
    fn from(value: String) -> Self {
        match value.as_str() {
            "TW" => Self::TW,
            "TH" => Self::TH,
            "IN" => Self::IN,
            "ID" => Self::ID,
            "US" => Self::US,
            _others => Self::Unknown,
        }
    }
}

#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[derive(Deserialize, Serialize, Debug, Clone, Hash, Eq, PartialEq)]
pub enum CurrencyDto { INR, IDR, THB, TWD, USD, Unknown }
// #[serde(rename_all = "UPPERCASE")], FIXME, the macro does not work

impl ToString for CurrencyDto {
    fn to_string(&self) -> String {
        let o = match self {
            Self::INR => "INR",
            Self::IDR => "IDR",
            Self::THB => "THB",
            Self::TWD => "TWD",
            Self::USD => "USD",
            Self::Unknown => "Unknown",
        };
        o.to_string()
    }
}

impl From<&String> for CurrencyDto {
    // TODO, from literal string
    fn from(value: &String) -> Self {
        match value.as_str() {
            "INR" => Self::INR,
            "IDR" => Self::IDR,
            "THB" => Self::THB,
            "TWD" => Self::TWD,
            "USD" => Self::USD,
            _others => Self::Unknown,
        }
    }
}

impl CurrencyDto {
    /// Number of digits in fraction part of a decimal value allowed
    /// in a given amount value. Note the decimal places should depends
    /// on the currency applied, due to the limit specified in 3rd-party
    /// payment processors such as Stripe
    pub fn amount_fraction_scale(&self) -> u32 {
        match self {
            Self::INR | Self::IDR | Self::THB | Self::TWD | Self::USD => 2,
            Self::Unknown => 0,
        }
    }
}

struct ExpectBookableKind {
    numbers: Vec<u8>,
}

impl Expected for ExpectBookableKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s: Vec<String> = self.numbers.iter().map(|n| n.to_string()).collect();
        let s = s.join(",");
        let msg = format!("accepted kind number : {s}");
        formatter.write_str(msg.as_str())
    }
}

pub fn jsn_validate_bookable_kind<'de, D>(raw: D) -> Result<BookableKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match u8::deserialize(raw) {
        Ok(d) => {
            let kind = BookableKind::from(d);
            if let BookableKind::Unknown(uv) = kind {
                let unexp = Unexpected::Unsigned(uv as u64);
                let exp = ExpectBookableKind {
                    numbers: vec![
                        BookableKind::Destination.into(),
                        BookableKind::Hotel.into(),
                        BookableKind::HireCar.into(),
                    ],
                };
                let e = DeserializeError::invalid_value(unexp, &exp);
                Err(e)
            } else {
                Ok(kind)
            }
        }
        Err(e) => Err(e),
    }
}

pub fn jsn_serialize_bookable_kind<S>(orig: &BookableKind, ser: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let v = orig.clone().into();
    ser.serialize_u8(v)
}
