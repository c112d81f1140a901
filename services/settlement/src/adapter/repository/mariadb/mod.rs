pub(super) mod booking;
pub(super) mod payee;
pub(super) mod payout;
pub(super) mod reporting;

pub(super) use booking::MariadbBookingRepo;
pub(super) use payee::MariadbPayeeRepo;
pub(super) use payout::MariadbPayoutRepo;
pub(super) use reporting::MariadbReportingRepo;

use std::result::Result;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};

use tripmarket_common::error::AppErrorCode;

use super::AppRepoErrorDetail;

const DATETIME_FMT_P0F: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

#[allow(non_snake_case)]
fn raw_column_to_datetime(
    val: mysql_async::Value,
    subsec_precision: u16,
) -> Result<DateTime<Utc>, (AppErrorCode, AppRepoErrorDetail)> {
    let result = if let mysql_async::Value::Date(Y, M, D, h, m, s, us) = val {
        let res_d = NaiveDate::from_ymd_opt(Y as i32, M as u32, D as u32).ok_or("date-parse-fail");
        let res_t = NaiveTime::from_hms_micro_opt(h as u32, m as u32, s as u32, us)
            .ok_or("time-parse-fail");
        match (res_d, res_t) {
            (Ok(d), Ok(t)) => Ok(NaiveDateTime::new(d, t)
                .and_utc()
                .trunc_subsecs(subsec_precision)),
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
        }
    } else {
        Err("datetime-unknown-value-type")
    };
    result.map_err(|msg| {
        (
            AppErrorCode::DataCorruption,
            AppRepoErrorDetail::DataRowParse(msg.to_string()),
        )
    })
}

#[allow(non_snake_case)]
fn raw_column_to_date(
    val: mysql_async::Value,
) -> Result<NaiveDate, (AppErrorCode, AppRepoErrorDetail)> {
    let result = if let mysql_async::Value::Date(Y, M, D, _h, _m, _s, _us) = val {
        NaiveDate::from_ymd_opt(Y as i32, M as u32, D as u32).ok_or("date-parse-fail")
    } else {
        Err("date-unknown-value-type")
    };
    result.map_err(|msg| {
        (
            AppErrorCode::DataCorruption,
            AppRepoErrorDetail::DataRowParse(msg.to_string()),
        )
    })
}

macro_rules! inner_into_parts {
    ($sqlargs: ty) => {
        impl $sqlargs {
            pub(super) fn into_parts(self) -> (String, Params) {
                (self.0, self.1)
            }
        }
    };
}

pub(crate) use inner_into_parts;
