// Resource client behaviour against a mocked API.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tailkit_api::TailnetClient;
use tailkit_core::resources::KeySpec;
use tailkit_core::types::{Acl, AclFormat, AclPolicy, AclRule, DnsPreferences, KeyExpiry};
use tailkit_core::{CoreError, Singleton, SingletonResource, Tailnet};

// ── Helpers ─────────────────────────────────────────────────────────

const DNS_PATH: &str = "/api/v2/tailnet/example.com/dns/configuration";
const ACL_PATH: &str = "/api/v2/tailnet/example.com/acl";

async fn setup() -> (MockServer, Tailnet) {
    let server = MockServer::start().await;
    let client =
        TailnetClient::from_reqwest(&server.uri(), "example.com", reqwest::Client::new()).unwrap();
    (server, Tailnet::from_client(client))
}

fn dns_config() -> Value {
    json!({
        "nameservers": ["8.8.8.8", "1.1.1.1"],
        "searchPaths": ["corp.example.com"],
        "preferences": { "magicDNS": true },
        "splitDNS": { "internal.example.com": ["10.0.0.53"] }
    })
}

async fn mount_dns_get(server: &MockServer, body: &Value) {
    Mock::given(method("GET"))
        .and(path(DNS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Expect exactly one POST of `expected`, echoing it back.
async fn expect_dns_post(server: &MockServer, expected: &Value) {
    Mock::given(method("POST"))
        .and(path(DNS_PATH))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(expected))
        .expect(1)
        .mount(server)
        .await;
}

// ── ACL ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_acl_create_sends_rule_and_reads_it_back() {
    let (server, tailnet) = setup().await;
    let wire = json!({
        "acls": [{ "action": "accept", "src": ["group:eng"], "dst": ["tag:db:5432"] }]
    });

    Mock::given(method("POST"))
        .and(path(ACL_PATH))
        .and(body_json(&wire))
        .respond_with(ResponseTemplate::new(200).set_body_json(&wire))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&wire))
        .mount(&server)
        .await;

    let acl = tailnet.acl(AclFormat::Json);
    let policy = AclPolicy::Structured(Acl {
        acls: vec![AclRule::accept(["group:eng"], ["tag:db:5432"])],
        ..Acl::default()
    });

    let stored = acl.create(&policy).await.unwrap();
    assert_eq!(stored, policy);
    assert_eq!(acl.get().await.unwrap(), Singleton::Present(policy));
}

#[tokio::test]
async fn test_acl_allow_all_reads_as_default() {
    let (server, tailnet) = setup().await;
    let allow_all = json!({ "acls": [{ "action": "accept", "src": ["*"], "dst": ["*:*"] }] });

    Mock::given(method("GET"))
        .and(path(ACL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&allow_all))
        .mount(&server)
        .await;

    let acl = tailnet.acl(AclFormat::Json);
    assert_eq!(acl.get().await.unwrap(), Singleton::Default);
    assert_eq!(
        acl.current().await.unwrap(),
        AclPolicy::Structured(Acl::allow_all())
    );
}

#[tokio::test]
async fn test_acl_create_with_allow_all_rule_reads_back_as_default() {
    let (server, tailnet) = setup().await;
    let wire = json!({ "acls": [{ "action": "accept", "src": ["*"], "dst": ["*:*"] }] });

    Mock::given(method("POST"))
        .and(path(ACL_PATH))
        .and(body_json(&wire))
        .respond_with(ResponseTemplate::new(200).set_body_json(&wire))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&wire))
        .mount(&server)
        .await;

    let acl = tailnet.acl(AclFormat::Json);
    let policy = AclPolicy::Structured(Acl {
        acls: vec![AclRule::accept(["*"], ["*:*"])],
        ..Acl::default()
    });

    assert_eq!(acl.create(&policy).await.unwrap(), policy);
    assert_eq!(acl.current().await.unwrap(), policy);
    assert_eq!(acl.get().await.unwrap(), Singleton::Default);
}

#[tokio::test]
async fn test_acl_delete_writes_allow_all_and_is_repeatable() {
    let (server, tailnet) = setup().await;
    let allow_all = json!({ "acls": [{ "action": "accept", "src": ["*"], "dst": ["*:*"] }] });

    Mock::given(method("POST"))
        .and(path(ACL_PATH))
        .and(body_json(&allow_all))
        .respond_with(ResponseTemplate::new(200).set_body_json(&allow_all))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&allow_all))
        .mount(&server)
        .await;

    let acl = tailnet.acl(AclFormat::Json);
    acl.delete().await.unwrap();
    acl.delete().await.unwrap();
    assert!(acl.get().await.unwrap().is_default());
}

#[tokio::test]
async fn test_acl_conditional_write_reports_conflict() {
    let (server, tailnet) = setup().await;

    Mock::given(method("POST"))
        .and(path(ACL_PATH))
        .respond_with(
            ResponseTemplate::new(412).set_body_json(json!({ "message": "precondition failed" })),
        )
        .mount(&server)
        .await;

    let err = tailnet
        .acl(AclFormat::Json)
        .write_if_match(&AclPolicy::Structured(Acl::allow_all()), "\"stale\"")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(err.status(), Some(412));
}

// ── DNS ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_nameservers_404_reads_as_empty() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path(DNS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let nameservers = tailnet.nameservers();
    assert_eq!(nameservers.get().await.unwrap(), Singleton::Default);
    assert_eq!(nameservers.current().await.unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn test_nameservers_update_preserves_siblings() {
    let (server, tailnet) = setup().await;
    let before = dns_config();
    let mut after = before.clone();
    after["nameservers"] = json!(["9.9.9.9"]);

    mount_dns_get(&server, &before).await;
    expect_dns_post(&server, &after).await;

    let stored = tailnet
        .nameservers()
        .update(&vec!["9.9.9.9".to_owned()])
        .await
        .unwrap();
    assert_eq!(stored, vec!["9.9.9.9".to_owned()]);
}

#[tokio::test]
async fn test_search_paths_update_preserves_siblings() {
    let (server, tailnet) = setup().await;
    let before = dns_config();
    let mut after = before.clone();
    after["searchPaths"] = json!(["a.example.com", "b.example.com"]);

    mount_dns_get(&server, &before).await;
    expect_dns_post(&server, &after).await;

    tailnet
        .search_paths()
        .update(&vec!["a.example.com".to_owned(), "b.example.com".to_owned()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_preferences_update_preserves_siblings() {
    let (server, tailnet) = setup().await;
    let before = dns_config();
    let mut after = before.clone();
    after["preferences"] = json!({ "magicDNS": false });

    mount_dns_get(&server, &before).await;
    expect_dns_post(&server, &after).await;

    let stored = tailnet
        .preferences()
        .update(&DnsPreferences { magic_dns: false })
        .await
        .unwrap();
    assert!(!stored.magic_dns);
}

#[tokio::test]
async fn test_dns_delete_resets_only_its_field() {
    let (server, tailnet) = setup().await;
    let before = dns_config();
    let mut after = before.clone();
    after["nameservers"] = json!([]);

    mount_dns_get(&server, &before).await;
    expect_dns_post(&server, &after).await;

    tailnet.nameservers().delete().await.unwrap();
}

#[tokio::test]
async fn test_dns_write_starts_from_defaults_on_404() {
    let (server, tailnet) = setup().await;
    let expected = json!({
        "nameservers": [],
        "searchPaths": ["corp.example.com"],
        "preferences": { "magicDNS": false }
    });

    Mock::given(method("GET"))
        .and(path(DNS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    expect_dns_post(&server, &expected).await;

    tailnet
        .search_paths()
        .create(&vec!["corp.example.com".to_owned()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dns_server_error_is_not_downgraded() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path(DNS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = tailnet.preferences().get().await.unwrap_err();
    assert!(matches!(err, CoreError::Server { status: 503, .. }));
}

// ── Keys ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_key_material_only_on_create() {
    let (server, tailnet) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/tailnet/example.com/keys"))
        .and(body_json(json!({
            "capabilities": { "devices": { "create": {
                "reusable": true, "ephemeral": true, "preauthorized": false
            } } },
            "expirySeconds": 86400
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test",
            "key": "thisisatestkey",
            "capabilities": { "devices": { "create": { "reusable": true, "ephemeral": true } } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/tailnet/example.com/keys/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test",
            "capabilities": { "devices": { "create": { "reusable": true, "ephemeral": true } } }
        })))
        .mount(&server)
        .await;

    let keys = tailnet.keys();
    let created = keys
        .create(&KeySpec {
            reusable: true,
            ephemeral: true,
            expiry: Some(KeyExpiry::Seconds(86_400)),
            ..KeySpec::default()
        })
        .await
        .unwrap();
    assert_eq!(created.metadata.id, "test");
    assert_eq!(created.key.expose_secret(), "thisisatestkey");

    let meta = keys.get("test").await.unwrap();
    assert_eq!(meta.id, "test");
    assert!(meta.reusable() && meta.ephemeral());
}

#[tokio::test]
async fn test_key_with_bad_tag_is_rejected_locally() {
    let (server, tailnet) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/tailnet/example.com/keys"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = tailnet
        .keys()
        .create(&KeySpec {
            tags: vec!["ci".into()],
            ..KeySpec::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.fields()[0].field, "tags");
}

#[tokio::test]
async fn test_key_delete_is_idempotent() {
    let (server, tailnet) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/tailnet/example.com/keys/test"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/tailnet/example.com/keys/test"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let keys = tailnet.keys();
    keys.delete("test").await.unwrap();
    keys.delete("test").await.unwrap();
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tailnet/example.com/keys/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let keys = tailnet.keys();
    let err = keys.get("gone").await.unwrap_err();
    assert_eq!(err.to_string(), "key not found: gone");
    assert!(!keys.is_usable("gone").await.unwrap());
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_lookup_by_name_and_prefix() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tailnet/example.com/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                { "id": "1", "name": "web-1.example.ts.net" },
                { "id": "2", "name": "web-2.example.ts.net" },
                { "id": "3", "name": "db-1.example.ts.net" }
            ]
        })))
        .mount(&server)
        .await;

    let devices = tailnet.devices();
    let db = devices.find_by_name("db-1.example.ts.net").await.unwrap();
    assert_eq!(db.id, "3");

    let web = devices.list_by_prefix("web-").await.unwrap();
    assert_eq!(web.len(), 2);
    assert_eq!(devices.list_by_prefix("").await.unwrap().len(), 3);

    let err = devices.find_by_name("web").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_device_is_not_downgraded() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/device/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = tailnet.devices().get("404").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound { ref entity_type, ref identifier }
            if entity_type == "device" && identifier == "404"
    ));
}

// ── Routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unadvertised_route_is_rejected_without_write() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": ["10.0.0.0/24"],
            "enabledRoutes": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = tailnet
        .routes()
        .update("1001", &["10.9.0.0/24".to_owned()])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { status: None, .. }));
    assert_eq!(err.fields()[0].field, "routes");
}

#[tokio::test]
async fn test_routes_update_and_delete() {
    let (server, tailnet) = setup().await;
    let advertised = json!(["10.0.0.0/24", "0.0.0.0/0", "::/0"]);

    Mock::given(method("GET"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": advertised,
            "enabledRoutes": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .and(body_json(json!({ "routes": ["10.0.0.0/24"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": advertised,
            "enabledRoutes": ["10.0.0.0/24"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .and(body_json(json!({ "routes": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": advertised,
            "enabledRoutes": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let routes = tailnet.routes();
    let stored = routes
        .update("1001", &["10.0.0.0/24".to_owned(), "10.0.0.0/24".to_owned()])
        .await
        .unwrap();
    assert_eq!(stored.enabled_routes, vec!["10.0.0.0/24".to_owned()]);

    routes.delete("1001").await.unwrap();
}

#[tokio::test]
async fn test_routes_same_set_in_other_order_is_not_rewritten() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": ["10.0.0.0/24", "fd7a:115c:a1e0::/48"],
            "enabledRoutes": ["10.0.0.0/24", "fd7a:115c:a1e0::/48"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let stored = tailnet
        .routes()
        .update(
            "1001",
            &["FD7A:115C:A1E0:0::/48".to_owned(), "10.0.0.0/24".to_owned()],
        )
        .await
        .unwrap();
    assert_eq!(stored.enabled_routes.len(), 2);
}

#[tokio::test]
async fn test_routes_alternate_spelling_sends_advertised_form() {
    let (server, tailnet) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": ["fd7a:115c:a1e0::/48"],
            "enabledRoutes": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .and(body_json(json!({ "routes": ["fd7a:115c:a1e0::/48"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "advertisedRoutes": ["fd7a:115c:a1e0::/48"],
            "enabledRoutes": ["fd7a:115c:a1e0::/48"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stored = tailnet
        .routes()
        .update("1001", &["fd7a:115c:a1e0:0::/48".to_owned()])
        .await
        .unwrap();
    assert_eq!(stored.enabled_routes, vec!["fd7a:115c:a1e0::/48".to_owned()]);
}

// ── Authorization ───────────────────────────────────────────────────

#[tokio::test]
async fn test_authorization_toggle_touches_only_the_flag() {
    let (server, tailnet) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/authorized"))
        .and(body_json(json!({ "authorized": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/authorized"))
        .and(body_json(json!({ "authorized": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // Nothing else about the device may be written.
    Mock::given(method("POST"))
        .and(path("/api/v2/device/1001/routes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = tailnet.authorization();
    auth.set_authorized("1001", true).await.unwrap();
    auth.set_authorized("1001", false).await.unwrap();
}

#[tokio::test]
async fn test_authorization_on_missing_device() {
    let (server, tailnet) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/device/nope/authorized"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = tailnet
        .authorization()
        .set_authorized("nope", true)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
