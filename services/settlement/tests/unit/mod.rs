mod adapter;
mod dto;
mod model;

use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

use tripmarket_common::config::{AppCfgHardLimit, AppCfgInitArgs, AppConfig};
use tripmarket_common::confidentiality;
use tripmarket_common::constant::env_vars::{
    CFG_FILEPATH, EXPECTED_LABELS, SERVICE_BASEPATH, SYS_BASEPATH,
};
use settlement::AppSharedState;

pub(crate) const EXAMPLE_REL_PATH: &'static str = "/tests/unit/examples/";

fn ut_setup_config(cfg_filename: &str) -> AppConfig {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let mut env_var_map: HashMap<String, String> = HashMap::from_iter(iter);
    // infer both base paths from cargo metadata when the environment
    // variables are absent, convenient for running one test target alone
    env_var_map
        .entry(SYS_BASEPATH.to_string())
        .or_insert_with(|| env!("CARGO_MANIFEST_DIR").to_string() + "/../..");
    env_var_map
        .entry(SERVICE_BASEPATH.to_string())
        .or_insert_with(|| env!("CARGO_MANIFEST_DIR").to_string());
    let _old = env_var_map.insert(
        CFG_FILEPATH.to_string(),
        EXAMPLE_REL_PATH.to_string() + cfg_filename,
    );
    let limit = AppCfgHardLimit {
        nitems_per_inmem_table: 0,
        num_db_conns: 10,
        seconds_db_idle: 60,
    };
    let args = AppCfgInitArgs { env_var_map, limit };
    AppConfig::new(args).unwrap()
}

fn ut_setup_sharestate() -> &'static AppSharedState {
    static GUARD_SHR_STATE: OnceLock<AppSharedState> = OnceLock::new();
    GUARD_SHR_STATE.get_or_init(|| {
        let cfg = ut_setup_config("syscfg_test_ok.json");
        let cfdntl = confidentiality::build_context(&cfg).unwrap();
        AppSharedState::new(cfg, cfdntl).unwrap()
    })
}
