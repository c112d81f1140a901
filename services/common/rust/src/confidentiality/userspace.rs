use std::fs::File;
use std::io::BufReader;
use std::result::Result as DefaultResult;

use serde_json::Value as JsnVal;

use super::AbstractConfidentiality;
use crate::error::{AppConfidentialityError, AppErrorCode};

pub struct UserSpaceConfidentiality {
    source_fullpath: String,
}

impl UserSpaceConfidentiality {
    pub fn build(source_fullpath: String) -> Self {
        // the source file may not exist yet at build time, access error
        // is reported on each payload read
        Self { source_fullpath }
    }

    fn load_source(&self) -> DefaultResult<JsnVal, AppConfidentialityError> {
        let file = File::open(&self.source_fullpath).map_err(|e| AppConfidentialityError {
            code: AppErrorCode::IOerror(e.kind()),
            detail: e.to_string(),
        })?;
        let reader = BufReader::new(file);
        serde_json::from_reader::<BufReader<File>, JsnVal>(reader).map_err(|e| {
            AppConfidentialityError {
                code: AppErrorCode::InvalidJsonFormat,
                detail: e.to_string(),
            }
        })
    }

    fn traverse<'a>(
        top: &'a JsnVal,
        tokens: Vec<&str>,
    ) -> DefaultResult<&'a JsnVal, AppConfidentialityError> {
        let mut curr = top;
        for tok in tokens {
            curr = match curr {
                JsnVal::Object(map) => map.get(tok).ok_or(AppConfidentialityError {
                    code: AppErrorCode::NoConfidentialityCfg,
                    detail: format!("field not found in object: {tok}"),
                })?,
                JsnVal::Array(seq) => {
                    let idx = tok.parse::<usize>().map_err(|_e| AppConfidentialityError {
                        code: AppErrorCode::NoConfidentialityCfg,
                        detail: format!("path-error, non-numeric index: {tok}"),
                    })?;
                    seq.get(idx).ok_or(AppConfidentialityError {
                        code: AppErrorCode::NoConfidentialityCfg,
                        detail: format!("index out of bound in array: {idx}"),
                    })?
                }
                _leaf => {
                    return Err(AppConfidentialityError {
                        code: AppErrorCode::NoConfidentialityCfg,
                        detail: format!("scalar node reached, token left: {tok}"),
                    })
                }
            };
        } // end of loop
        Ok(curr)
    }
} // end of impl UserSpaceConfidentiality

impl AbstractConfidentiality for UserSpaceConfidentiality {
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppConfidentialityError> {
        let top = self.load_source()?;
        let tokens = id_.split('/').collect::<Vec<_>>();
        let node = Self::traverse(&top, tokens)?;
        // string nodes keep surrounding double quotes, callers de-serialize
        // the payload with concrete types they expect
        Ok(node.to_string())
    }
}
