use chrono::Local;

use tripmarket_common::api::rpc::dto::{BookableItemReplicaDto, BookableItemReplicaReqDto};
use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;

use settlement::adapter::rpc::{AppRpcClientRequest, AppRpcErrorFnLabel};

use crate::ut_setup_sharestate;

const UT_ROUTE: &str = "rpc.bookable.item_replica_settlement";

fn ut_replica_request(usr_id: u32, route: &str) -> AppRpcClientRequest {
    let payld = BookableItemReplicaReqDto {
        kind: BookableKind::Hotel,
        item_id: 881007u64,
    };
    AppRpcClientRequest {
        usr_id,
        time: Local::now().to_utc(),
        message: serde_json::to_vec(&payld).unwrap(),
        route: route.to_string(),
    }
}

#[actix_web::test]
async fn mock_item_replica_reply_ok() {
    let rpc_ctx = ut_setup_sharestate().rpc_context();
    let client = rpc_ctx.acquire().await.unwrap();
    let mut event = client.send_request(ut_replica_request(1860, UT_ROUTE)).await.unwrap();
    let reply = event.receive_response().await.unwrap();
    let result = serde_json::from_slice::<Option<BookableItemReplicaDto>>(&reply.message);
    assert!(result.is_ok());
    if let Ok(Some(replica)) = result {
        assert!(matches!(replica.kind, BookableKind::Hotel));
        assert_eq!(replica.item_id, 881007u64);
        assert_eq!(replica.owner_id, Some(920u32));
        assert!(replica.active);
        assert_eq!(replica.price_hint.as_deref(), Some("120.00"));
        assert_eq!(replica.currency, CurrencyDto::USD);
    } else {
        assert!(false);
    }
}

#[actix_web::test]
async fn mock_item_replica_reply_null() {
    // the vertical service answers `null` for an identifier it no
    // longer carries
    let rpc_ctx = ut_setup_sharestate().rpc_context();
    let client = rpc_ctx.acquire().await.unwrap();
    let mut event = client.send_request(ut_replica_request(1861, UT_ROUTE)).await.unwrap();
    let reply = event.receive_response().await.unwrap();
    let result = serde_json::from_slice::<Option<BookableItemReplicaDto>>(&reply.message);
    assert!(matches!(result, Ok(None)));
}

#[actix_web::test]
async fn mock_data_exhausted() {
    let rpc_ctx = ut_setup_sharestate().rpc_context();
    let client = rpc_ctx.acquire().await.unwrap();
    let result = client.send_request(ut_replica_request(1862, UT_ROUTE)).await;
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(matches!(e.fn_label, AppRpcErrorFnLabel::AcquireClientConn));
    }
}

#[actix_web::test]
async fn mock_unknown_route() {
    let rpc_ctx = ut_setup_sharestate().rpc_context();
    let client = rpc_ctx.acquire().await.unwrap();
    let result = client
        .send_request(ut_replica_request(1860, "rpc.bookable.no-such-route"))
        .await;
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(matches!(e.fn_label, AppRpcErrorFnLabel::AcquireClientConn));
    }
}
