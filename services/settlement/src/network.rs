use std::fs::File;
use std::result::Result as DefaultResult;

use actix_cors::Cors;
use actix_http::Request;
use actix_service::IntoServiceFactory;
use actix_web::body::MessageBody;
use actix_web::dev::{AppConfig, Response, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::web;
use actix_web::{App, HttpServer};
use serde::Deserialize;

use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use crate::api::web::AppRouteTable;
use crate::AppSharedState;

#[derive(Deserialize)]
struct CorsAllowedOrigin {
    settlement: String,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct CorsConfig {
    ALLOWED_ORIGIN: CorsAllowedOrigin,
    ALLOWED_METHODS: Vec<String>,
    ALLOWED_HEADERS: Vec<String>,
    ALLOW_CREDENTIALS: bool,
    PREFLIGHT_MAX_AGE: u64,
}

fn cors_middleware(cfg_fullpath: String) -> DefaultResult<Cors, (AppErrorCode, String)> {
    let f = File::open(cfg_fullpath)
        .map_err(|e| (AppErrorCode::IOerror(e.kind()), e.to_string()))?;
    let val = serde_json::from_reader::<File, CorsConfig>(f)
        .map_err(|e| (AppErrorCode::InvalidJsonFormat, e.to_string()))?;
    let methods = val
        .ALLOWED_METHODS
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>();
    let mut co = Cors::default()
        .allowed_origin(val.ALLOWED_ORIGIN.settlement.as_str())
        .allowed_methods(methods)
        .max_age(val.PREFLIGHT_MAX_AGE as usize);
    for hdr in val.ALLOWED_HEADERS.iter() {
        co = co.allowed_header(hdr.as_str());
    }
    if val.ALLOW_CREDENTIALS {
        co = co.supports_credentials();
    }
    Ok(co)
}

/*
 * the original implementation does not intend to let users transfer `App` object
 * around code functions, it is tricky to do so.
 *
 * The test example in the following FAQ demonstrates how to do this :
 * https://github.com/actix/actix-web/wiki/FAQ#how-can-i-return-app-from-a-function--why-is-appentry-private
 *
 * relavant issues (in actix-web github)
 * #780 #1005 #1156 #2039 #2073 #2082 #2301
 *
 * TODO
 * - support multiple versions of route-tables and configurations
 * */
pub fn app_web_service(
    mut route_table: AppRouteTable,
    cfg: Vec<(String, String)>,
    shr_state: AppSharedState,
) -> (
    App<
        impl ServiceFactory<
            ServiceRequest,
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::error::Error,
            Config = (),
            InitError = (),
        >,
    >,
    usize,
) {
    let mut num_applied = 0usize;
    let num_applied_p = &mut num_applied;
    let cfg_fn = move |c: &mut web::ServiceConfig| {
        *num_applied_p = cfg
            .into_iter()
            .filter_map(|(path, inner_label)| {
                route_table
                    .entries
                    .remove(inner_label.as_str())
                    .map(|found| (path, found))
            })
            .map(|(path, route_found)| {
                c.route(path.as_str(), route_found);
            })
            .count();
    };
    let co = {
        let app_cfg = shr_state.config();
        let logctx = shr_state.log_context();
        let fullpath =
            app_cfg.basepath.system.clone() + "/" + app_cfg.api_server.listen.cors.as_str();
        match cors_middleware(fullpath) {
            Ok(v) => v,
            Err((code, detail)) => {
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "cors-init-error, code:{:?}, {detail}",
                    code
                );
                Cors::default()
            }
        }
    };
    let path_prefix = format!("/{}", route_table.version.as_str());
    let v_scope = web::scope(path_prefix.as_str()).configure(cfg_fn);
    let app = App::new()
        .app_data(web::Data::new(shr_state))
        .wrap(co)
        .service(v_scope);
    (app, num_applied)
} // end of fn app_web_service

pub fn net_server_listener<F, I, S, B>(
    app_init_cb: F,
    domain_host: &str,
    port: u16,
) -> HttpServer<F, I, S, B>
where
    F: Fn() -> I + Clone + Send + 'static,
    I: IntoServiceFactory<S, Request>,
    S: ServiceFactory<Request, Config = AppConfig> + 'static,
    S::Error: Into<actix_web::error::Error>,
    S::InitError: std::fmt::Debug,
    S::Response: Into<Response<B>>,
    B: MessageBody + 'static,
{
    let domain = format!("{domain_host}:{port}");
    let result = HttpServer::new(app_init_cb).bind(domain);
    result.unwrap()
}
