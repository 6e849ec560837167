use anyhow::Result;
use httpmock::prelude::*;
use nacos_openapi::{
    ClientConfig, InstanceKey, InstanceListQuery, NacosClient, NewInstance, Service,
};

fn client(server: &MockServer) -> NacosClient {
    let config = ClientConfig::new(server.base_url()).with_context_path("");
    NacosClient::new(config).unwrap()
}

/// Service and instance lifecycle:
/// 1. create the service definition
/// 2. register an instance and confirm it is listed
/// 3. keep it alive with a client beat
/// 4. deregister and delete the service
#[tokio::test]
async fn test_service_instance_lifecycle() -> Result<()> {
    let server = MockServer::start();

    let create_service_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/ns/service")
            .body_includes("serviceName=orders");
        then.status(200).body("ok");
    });
    let register_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/ns/instance")
            .body_includes("ip=10.0.0.1")
            .body_includes("port=8080");
        then.status(200).body("ok");
    });
    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/ns/instance/list")
            .query_param("serviceName", "orders");
        then.status(200).json_body(serde_json::json!({
            "name": "DEFAULT_GROUP@@orders",
            "cacheMillis": 10000,
            "hosts": [{"ip": "10.0.0.1", "port": 8080, "healthy": true}],
            "valid": true
        }));
    });
    let beat_mock = server.mock(|when, then| {
        when.method(PUT).path("/v1/ns/instance/beat");
        then.status(200)
            .json_body(serde_json::json!({"clientBeatInterval": 5000, "code": 10200}));
    });
    let deregister_mock = server.mock(|when, then| {
        when.method(DELETE).path("/v1/ns/instance");
        then.status(200).body("ok");
    });
    let delete_service_mock = server.mock(|when, then| {
        when.method(DELETE).path("/v1/ns/service");
        then.status(200).body("ok");
    });

    let client = client(&server);

    assert!(client.services().create_service(&Service::new("orders")).await?);

    let instance = NewInstance::new("orders", "10.0.0.1", 8080).with_ephemeral(true);
    assert!(client.instances().register(&instance).await?);

    let list = client
        .instances()
        .list_instances(&InstanceListQuery::new("orders"))
        .await?;
    assert_eq!(list.service_name(), "orders");
    assert_eq!(list.hosts.len(), 1);

    let beat = client.instances().send_heartbeat(&instance).await?;
    assert_eq!(beat.client_beat_interval, 5000);

    assert!(client
        .instances()
        .deregister(&InstanceKey::new("orders", "10.0.0.1", 8080))
        .await?);
    assert!(client
        .services()
        .delete_service("public", "DEFAULT_GROUP", "orders")
        .await?);

    create_service_mock.assert();
    register_mock.assert();
    list_mock.assert();
    beat_mock.assert();
    deregister_mock.assert();
    delete_service_mock.assert();
    Ok(())
}

/// Namespace administration plus operator state queries.
#[tokio::test]
async fn test_namespace_and_operator_queries() -> Result<()> {
    let server = MockServer::start();

    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/console/namespaces")
            .body_includes("customNamespaceId=staging");
        then.status(200).body("true");
    });
    let list_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/console/namespaces");
        then.status(200).json_body(serde_json::json!({
            "code": 200,
            "message": null,
            "data": [
                {"namespace": "", "namespaceShowName": "public", "quota": 200,
                 "configCount": 0, "type": 0},
                {"namespace": "staging", "namespaceShowName": "Staging", "quota": 200,
                 "configCount": 0, "type": 2}
            ]
        }));
    });
    let metrics_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/ns/operator/metrics");
        then.status(200).json_body(serde_json::json!({
            "status": "UP",
            "serviceCount": 2,
            "instanceCount": 1
        }));
    });
    let clients_mock = server.mock(|when, then| {
        when.method(GET).path("/v2/ns/client/list");
        then.status(200).json_body(serde_json::json!({
            "code": 0,
            "message": "success",
            "data": ["1717000000000_127.0.0.1_4400"]
        }));
    });

    let client = client(&server);

    assert!(client
        .namespaces()
        .create_namespace("staging", "Staging", Some("pre-prod"))
        .await?);

    let namespaces = client.namespaces().list_namespaces().await?;
    assert_eq!(namespaces.len(), 2);
    assert_eq!(namespaces[1].namespace, "staging");

    let metrics = client.operator().get_metrics().await?;
    assert_eq!(metrics.service_count, 2);

    let ids = client.operator().list_client_ids().await?;
    assert_eq!(ids, vec!["1717000000000_127.0.0.1_4400"]);

    create_mock.assert();
    list_mock.assert();
    metrics_mock.assert();
    clients_mock.assert();
    Ok(())
}
