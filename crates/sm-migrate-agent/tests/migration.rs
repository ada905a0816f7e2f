use serde_json::{json, Value};
use sm_migrate_adapter_aas::encode_id_base64url;
use sm_migrate_agent::{EnvFile, MigrateConfig, MigrateError, Migrator};
use sm_migrate_core::{MigrationSummary, OutcomeKind};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PCF_PATH: &str = "/source/urn%3Aag.em%3Asm%3Atrain.1%3Apcf%3A1.0.0";

fn config(server: &MockServer, extra: &str) -> MigrateConfig {
    let uri = server.uri();
    let contents = format!(
        "# test settings\n\
         MX_THINK_SOURCE_URL={uri}/source\n\
         MX_THINK_DEST_URL={uri}/dest\n\
         MX_THINK_TOKEN_URL={uri}/token\n\
         MX_THINK_DTR_SHELL_DESCR_URL={uri}/registry\n\
         DATA_PLANE_URL=https://dataplane.test/api/public\n\
         SUBPROTOCOL_BODY_ID=BPNL000000000001\n\
         SUBPROTOCOL_BODY_DSP_ENDPOINT=https://controlplane.test/api/v1/dsp\n\
         MX_THINK_ASSETS=train.1\n\
         MX_THINK_SUBMODEL_SUFFIXES=:pcf:1.0.0\n\
         MX_THINK_TIMEOUT_SECS=5\n\
         {extra}\n"
    );
    MigrateConfig::from_sources(&EnvFile::parse(&contents).unwrap(), |_| None).unwrap()
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-123"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn registry_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/registry")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn single_submodel_is_posted_and_registered() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let migrator = Migrator::new(config(&server, "")).unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(
        report.summary,
        MigrationSummary {
            total: 1,
            posted: 1,
            skipped: 0,
            failed: 0,
        }
    );
    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.descriptors[0].kind, OutcomeKind::Posted);
    assert_eq!(report.descriptors[0].label, "train.1");

    let bodies = registry_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let shell = &bodies[0];
    assert_eq!(shell["idShort"], "train.1");
    assert_eq!(shell["globalAssetId"], "train.1");
    assert!(shell["id"].as_str().unwrap().starts_with("urn:uuid:"));

    let submodels = shell["submodelDescriptors"].as_array().unwrap();
    assert_eq!(submodels.len(), 1);
    assert_eq!(submodels[0]["id"], "sm-1");
    assert_eq!(submodels[0]["semanticId"], Value::Null);
    assert_eq!(
        submodels[0]["endpoints"][0]["protocolInformation"]["href"],
        format!("https://dataplane.test/api/public/{}", encode_id_base64url("sm-1"))
    );
    assert_eq!(
        submodels[0]["endpoints"][0]["protocolInformation"]["subprotocolBody"],
        "id=BPNL000000000001;dspEndpoint=https://controlplane.test/api/v1/dsp"
    );
}

#[tokio::test]
async fn fetched_body_is_forwarded_verbatim() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let raw = r#"{"idShort":"Pcf","id":"sm-1","submodelElements":[{"value":1.5}]}"#;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(raw, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let migrator =
        Migrator::new(config(&server, "MX_THINK_REGISTER_DESCRIPTORS=false")).unwrap();
    let report = assert_ok!(migrator.run().await);
    assert_eq!(report.summary.posted, 1);
    assert!(report.descriptors.is_empty());

    let posted: Vec<Vec<u8>> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/dest")
        .map(|request| request.body)
        .collect();
    assert_eq!(posted, vec![raw.as_bytes().to_vec()]);
}

#[tokio::test]
async fn dry_run_reads_but_never_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/source/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let migrator = Migrator::new(config(
        &server,
        "DRY_RUN=True\nMX_THINK_ASSETS=train.1,measuring_wagon",
    ))
    .unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.posted, 0);
    assert_eq!(report.summary.skipped, 0);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.descriptors.len(), 2);
    assert!(report
        .descriptors
        .iter()
        .all(|outcome| outcome.kind == OutcomeKind::DryRun));
}

#[tokio::test]
async fn missing_submodel_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/urn%3Aag.em%3Asm%3Ameasuring_wagon%3Apcf%3A1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let migrator =
        Migrator::new(config(&server, "MX_THINK_ASSETS=train.1,measuring_wagon")).unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(
        report.summary,
        MigrationSummary {
            total: 2,
            posted: 1,
            skipped: 0,
            failed: 1,
        }
    );
    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.descriptors[0].label, "measuring_wagon");
}

#[tokio::test]
async fn blank_id_is_left_out_without_aborting_the_run() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": ""})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/urn%3Aag.em%3Asm%3Ameasuring_wagon%3Apcf%3A1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let migrator =
        Migrator::new(config(&server, "MX_THINK_ASSETS=train.1,measuring_wagon")).unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(report.summary.posted, 2);
    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.descriptors[0].label, "measuring_wagon");

    let bodies = registry_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["idShort"], "measuring_wagon");
    assert_eq!(bodies[0]["submodelDescriptors"][0]["id"], "sm-2");
}

#[tokio::test]
async fn encoded_suffix_is_not_encoded_twice() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let migrator = Migrator::new(config(
        &server,
        "MX_THINK_URN_PREFIX=urn%3Aag.em%3Asm%3A\nMX_THINK_SUBMODEL_SUFFIXES=%3Apcf%3A1.0.0",
    ))
    .unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(
        report.summary,
        MigrationSummary {
            total: 1,
            posted: 1,
            skipped: 0,
            failed: 0,
        }
    );
    let bodies = registry_bodies(&server).await;
    assert_eq!(
        bodies[0]["submodelDescriptors"][0]["endpoints"][0]["protocolInformation"]["href"],
        format!("https://dataplane.test/api/public/{}", encode_id_base64url("sm-1"))
    );
}

#[tokio::test]
async fn non_object_body_is_a_failure() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["sm-1"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = assert_ok!(Migrator::new(config(&server, "")).unwrap().run().await);
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.failed, 1);
    assert!(report.descriptors.is_empty());
}

#[tokio::test]
async fn conflict_is_skipped_but_still_registered() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/source/urn%3Aag.em%3Asm%3Atrain.1%3Ahandling%3A1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-2"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(409).set_body_string("exists"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let migrator = Migrator::new(config(
        &server,
        "MX_THINK_SUBMODEL_SUFFIXES=:pcf:1.0.0,:handling:1.0.0",
    ))
    .unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(report.summary.skipped, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.descriptors[0].kind, OutcomeKind::Skipped);

    let bodies = registry_bodies(&server).await;
    let ids: Vec<&str> = bodies[0]["submodelDescriptors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|descriptor| descriptor["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["sm-1", "sm-2"]);
}

#[tokio::test]
async fn rejected_post_is_left_out_of_the_descriptor() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = assert_ok!(Migrator::new(config(&server, "")).unwrap().run().await);
    assert_eq!(report.summary.failed, 1);
    assert!(report.descriptors.is_empty());
}

#[tokio::test]
async fn registry_rejection_is_a_failed_descriptor() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad descriptor"))
        .expect(1)
        .mount(&server)
        .await;

    let report = assert_ok!(Migrator::new(config(&server, "")).unwrap().run().await);
    assert_eq!(report.summary.posted, 1);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.descriptors[0].kind, OutcomeKind::Failed);
    assert_eq!(report.descriptors[0].label, "train.1");
}

#[tokio::test]
async fn data_source_items_are_posted_individually() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(PCF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sm-1",
            "dataSourceItems": [{"id": "item-1"}, {"id": "item-2"}, {"id": "item-3"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/registry"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let migrator =
        Migrator::new(config(&server, "MX_THINK_PUBLISH_MODE=data-source-items")).unwrap();
    let report = assert_ok!(migrator.run().await);

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.posted, 3);

    let bodies = registry_bodies(&server).await;
    assert_eq!(bodies[0]["submodelDescriptors"][0]["id"], "sm-1");
}

#[tokio::test]
async fn token_rejection_aborts_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sm-1"})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dest"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = assert_err!(Migrator::new(config(&server, "")).unwrap().run().await);
    assert!(matches!(err, MigrateError::Auth(_)), "{err}");
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn missing_env_file_is_a_config_error() {
    let err = MigrateConfig::from_env_file(std::path::Path::new("/nonexistent/env.txt"))
        .map_err(MigrateError::from)
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
