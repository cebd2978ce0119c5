//! Tests that drive `commands::run` through the parsed CLI

use clap::Parser;
use hoops_import::{
    cli::Cli,
    commands::run,
    core::config::{API_BASE_ENV, API_KEY_ENV},
    history::validate_store,
    storage::{tables, ImportDatabase, Store},
};
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn test_team_history_with_orphaned_conference_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Atlantic Coast Conference", "abbreviation": "ACC" },
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("season", "2010"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 100, "sourceId": "100", "school": "Tee State", "conferenceId": 1 },
            { "id": 200, "sourceId": "200", "school": "Lost College", "conferenceId": 99 },
        ])))
        .mount(&server)
        .await;

    // Only test in this binary that touches the process environment.
    std::env::set_var(API_BASE_ENV, server.uri());
    std::env::set_var(API_KEY_ENV, "test-key");

    let cli = Cli::try_parse_from([
        "hoops-import",
        "team-history",
        "--from",
        "2010",
        "--to",
        "2010",
        "--delay-ms",
        "0",
    ])
    .unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    let result = run(&mut db, cli.command, data_dir.path()).await;

    assert!(result.is_ok(), "validation issues must not fail the run: {result:?}");
    assert_eq!(db.count(tables::TEAM_CONFERENCE_HISTORY, &[]).await.unwrap(), 2);

    let report = validate_store(&mut db).await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.orphaned_conferences.len(), 1);
}
