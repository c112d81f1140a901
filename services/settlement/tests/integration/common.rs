use std::collections::HashMap;
use std::env;

use actix_http::body::MessageBody;
use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::error::Error as WebError;
use actix_web::test::init_service;

use tripmarket_common::config::{AppCfgHardLimit, AppCfgInitArgs, AppConfig};
use tripmarket_common::confidentiality;
use tripmarket_common::constant::env_vars::{
    CFG_FILEPATH, EXPECTED_LABELS, SERVICE_BASEPATH, SYS_BASEPATH,
};

use settlement::api::web::AppRouteTable;
use settlement::network::app_web_service;
use settlement::AppSharedState;

#[macro_export] // available at crate level
macro_rules! ItestService {
    () => {
        impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = WebError>
    }
}

const CFG_REL_PATH: &str = "/tests/integration/examples/syscfg_itest.json";

fn setup_config() -> AppConfig {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let mut env_var_map: HashMap<String, String> = HashMap::from_iter(iter);
    env_var_map
        .entry(SYS_BASEPATH.to_string())
        .or_insert_with(|| env!("CARGO_MANIFEST_DIR").to_string() + "/../..");
    env_var_map
        .entry(SERVICE_BASEPATH.to_string())
        .or_insert_with(|| env!("CARGO_MANIFEST_DIR").to_string());
    let _old = env_var_map.insert(CFG_FILEPATH.to_string(), CFG_REL_PATH.to_string());
    let limit = AppCfgHardLimit {
        nitems_per_inmem_table: 0,
        num_db_conns: 4,
        seconds_db_idle: 30,
    };
    let args = AppCfgInitArgs { env_var_map, limit };
    AppConfig::new(args).unwrap()
}

pub(crate) async fn itest_setup_app_server() -> ItestService!() {
    let cfg = setup_config();
    let listener_ref = &cfg.api_server.listen;
    let api_ver = listener_ref.api_version.clone();
    let route_table = AppRouteTable::get(api_ver.as_str());
    assert_eq!(route_table.entries.len(), 8);
    let cfg_routes = listener_ref
        .routes
        .iter()
        .map(|r| (r.path.clone(), r.handler.clone()))
        .collect::<Vec<_>>();
    let cfdntl = confidentiality::build_context(&cfg).unwrap();
    let shr_state = AppSharedState::new(cfg, cfdntl).unwrap();
    let (app, num_applied) = app_web_service(route_table, cfg_routes, shr_state);
    assert_eq!(num_applied, 8);
    init_service(app).await
}
