use std::collections::HashMap;
use std::env;
use std::result::Result;

use actix_web::rt;

use tripmarket_common::config::{AppCfgHardLimit, AppCfgInitArgs, AppConfig};
use tripmarket_common::confidentiality;
use tripmarket_common::constant::env_vars::EXPECTED_LABELS;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use settlement::api::web::AppRouteTable;
use settlement::network::{app_web_service, net_server_listener};
use settlement::{hard_limit, AppSharedState};

fn init_config() -> Result<AppConfig, ()> {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let env_var_map = HashMap::from_iter(iter);
    let limit = AppCfgHardLimit {
        nitems_per_inmem_table: 0,
        num_db_conns: hard_limit::MAX_DB_CONNECTIONS,
        seconds_db_idle: hard_limit::MAX_SECONDS_DB_IDLE,
    };
    let args = AppCfgInitArgs { env_var_map, limit };
    AppConfig::new(args).map_err(|e| {
        println!(
            "[ERROR] config failure, code:{:?}, detail:{:?}",
            e.code, e.detail
        );
    })
}

fn main() -> Result<(), ()> {
    let cfg = init_config()?;
    let cfdntl = confidentiality::build_context(&cfg).map_err(|e| {
        println!("[ERROR] confidentiality init failure, {:?}", e);
    })?;
    let shr_state = AppSharedState::new(cfg, cfdntl).map_err(|e| {
        println!("[ERROR] shared state init failure, {:?}", e);
    })?;
    let logctx = shr_state.log_context();
    let cfg = shr_state.config();
    let listener = &cfg.api_server.listen;
    let cfg_routes = listener
        .routes
        .iter()
        .map(|r| (r.path.clone(), r.handler.clone()))
        .collect::<Vec<_>>();
    let api_ver = listener.api_version.clone();
    let (host, port) = (listener.host.clone(), listener.port);
    let num_workers = cfg.api_server.num_workers as usize;
    /*
     * `App` instance is created on each server worker thread. To share the
     * same data between all `App` instances, initialize the data outside
     * the factory closure in `HttpServer::new(F)`, clone the data you need
     * to move into the closure, by doing so, the function variable is
     * automatically treated as `Fn()` type instead of `FnOnce()` type.
     *
     * https://docs.rs/actix-web/latest/actix_web/struct.App.html#shared-mutable-state
     * */
    let shr_state_cpy = shr_state.clone();
    let app_init = move || {
        let route_table = AppRouteTable::get(api_ver.as_str());
        let (app, num_applied) =
            app_web_service(route_table, cfg_routes.clone(), shr_state_cpy.clone());
        if num_applied == 0 {
            // actix-web does not handle error returned from this callback,
            // a misconfigured route set only shows up in the log
            let logctx = shr_state_cpy.log_context();
            app_log_event!(logctx, AppLogLevel::ERROR, "no route applied");
        }
        app
    };
    let ht_srv = net_server_listener(app_init, host.as_str(), port).workers(num_workers);
    app_log_event!(logctx, AppLogLevel::INFO, "API server starting");
    let runner = rt::System::new();
    let result = runner.block_on(ht_srv.run());
    app_log_event!(logctx, AppLogLevel::WARNING, "API server terminating");
    result.map_err(|e| {
        app_log_event!(logctx, AppLogLevel::ERROR, "API server failure, {:?}", e);
    })
} // end of fn main
