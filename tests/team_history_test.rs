//! End-to-end tests for the teams and conference-history import

use std::time::Duration;

use hoops_import::{
    cbbd::CbbdClient,
    commands::team_history::{handle_team_history, TeamHistoryParams},
    history::FallbackPolicy,
    storage::{get_i64, tables, Filter, ImportDatabase, Store},
    ImportError, Season, SeasonRange,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const ACC: i64 = 1;
const BIG_EAST: i64 = 2;

fn params(first: u16, last: u16) -> TeamHistoryParams {
    TeamHistoryParams {
        seasons: SeasonRange::new(Season::new(first), Season::new(last)),
        delay: Duration::ZERO,
        fallback: FallbackPolicy::Smallest,
    }
}

fn team(source_id: &str, school: &str, conference_id: i64) -> Value {
    json!({
        "id": source_id.parse::<i64>().unwrap(),
        "sourceId": source_id,
        "school": school,
        "mascot": "Hoopers",
        "conferenceId": conference_id,
    })
}

async fn mount_conferences(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/conferences"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": ACC, "name": "Atlantic Coast Conference", "abbreviation": "ACC", "shortName": "ACC" },
            { "id": BIG_EAST, "name": "Big East Conference", "abbreviation": "BE", "shortName": "Big East" },
        ])))
        .mount(server)
        .await;
}

async fn mount_season(server: &MockServer, season: u16, teams: Value) {
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("season", season.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(teams))
        .mount(server)
        .await;
}

/// Team 100 is listed under both conferences in 2010 and settles in the ACC
/// from 2011; team 200 skips 2011.
async fn mount_three_seasons(server: &MockServer) {
    mount_conferences(server).await;
    mount_season(
        server,
        2010,
        json!([
            team("100", "Tee State", ACC),
            team("100", "Tee State", BIG_EAST),
            team("200", "Gap College", BIG_EAST),
        ]),
    )
    .await;
    mount_season(server, 2011, json!([team("100", "Tee State", ACC)])).await;
    mount_season(
        server,
        2012,
        json!([team("100", "Tee State", ACC), team("200", "Gap College", BIG_EAST)]),
    )
    .await;
}

async fn team_id(db: &mut ImportDatabase, source_id: &str) -> i64 {
    let rows = db
        .select(tables::TEAMS, &["id"], &[Filter::eq("source_id", source_id)])
        .await
        .unwrap();
    get_i64(&rows[0], "id").unwrap()
}

async fn history(db: &mut ImportDatabase, team_id: i64, season: u16) -> (Option<i64>, i64) {
    let rows = db
        .select(
            tables::TEAM_CONFERENCE_HISTORY,
            &["conference_id", "existed"],
            &[Filter::eq("team_id", team_id), Filter::eq("season", season)],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1, "expected one row for team {team_id} in {season}");
    (get_i64(&rows[0], "conference_id"), get_i64(&rows[0], "existed").unwrap())
}

#[tokio::test]
async fn test_history_resolves_duplicates_against_later_seasons() {
    let server = MockServer::start().await;
    mount_three_seasons(&server).await;
    let api = CbbdClient::with_base_url(&server.uri(), "test-key").unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    let outcome = handle_team_history(&mut db, &api, params(2010, 2012)).await.unwrap();

    assert_eq!(db.count(tables::CONFERENCES, &[]).await.unwrap(), 2);
    assert_eq!(db.count(tables::TEAMS, &[]).await.unwrap(), 2);

    let tee = team_id(&mut db, "100").await;
    let gap = team_id(&mut db, "200").await;

    // 2010 keeps only the listing that differs from the eventual ACC.
    assert_eq!(history(&mut db, tee, 2010).await, (Some(BIG_EAST), 1));
    assert_eq!(history(&mut db, tee, 2011).await, (Some(ACC), 1));
    assert_eq!(history(&mut db, tee, 2012).await, (Some(ACC), 1));

    assert_eq!(history(&mut db, gap, 2010).await, (Some(BIG_EAST), 1));
    assert_eq!(history(&mut db, gap, 2011).await, (None, 0));
    assert_eq!(history(&mut db, gap, 2012).await, (Some(BIG_EAST), 1));

    assert_eq!(outcome.log.get("duplicates_resolved"), 1);
    assert_eq!(outcome.log.get("gap_years_filled"), 1);
    assert_eq!(outcome.log.get("history_records_created"), 6);
    assert!(outcome.log.errors.is_empty());

    assert!(outcome.validation.is_clean());
    assert_eq!(outcome.validation.total_records, 6);
    assert_eq!(outcome.validation.placeholder_records, 1);
    assert_eq!(outcome.validation.first_season, Some(Season::new(2010)));
    assert_eq!(outcome.validation.last_season, Some(Season::new(2012)));
}

#[tokio::test]
async fn test_rerun_replaces_history_and_keeps_team_ids() {
    let server = MockServer::start().await;
    mount_three_seasons(&server).await;
    let api = CbbdClient::with_base_url(&server.uri(), "test-key").unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    handle_team_history(&mut db, &api, params(2010, 2012)).await.unwrap();
    let tee_before = team_id(&mut db, "100").await;

    let outcome = handle_team_history(&mut db, &api, params(2010, 2012)).await.unwrap();

    assert_eq!(team_id(&mut db, "100").await, tee_before);
    assert_eq!(outcome.log.get("stale_history_removed"), 6);
    assert_eq!(db.count(tables::TEAM_CONFERENCE_HISTORY, &[]).await.unwrap(), 6);
    assert!(outcome.validation.duplicate_keys.is_empty());
}

#[tokio::test]
async fn test_failed_season_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    mount_conferences(&server).await;
    mount_season(
        &server,
        2010,
        json!([team("100", "Tee State", ACC), team("100", "Tee State", BIG_EAST)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("season", "2011"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_season(&server, 2012, json!([team("100", "Tee State", ACC)])).await;

    let api = CbbdClient::with_base_url(&server.uri(), "test-key").unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    let outcome = handle_team_history(&mut db, &api, params(2010, 2012)).await.unwrap();

    assert_eq!(outcome.log.errors.len(), 1);
    assert_eq!(outcome.log.get("seasons_fetched"), 2);

    let tee = team_id(&mut db, "100").await;
    // The scan passes over the missing season to 2012.
    assert_eq!(history(&mut db, tee, 2010).await, (Some(BIG_EAST), 1));
    assert_eq!(history(&mut db, tee, 2011).await, (None, 0));
    assert_eq!(history(&mut db, tee, 2012).await, (Some(ACC), 1));
}

#[tokio::test]
async fn test_never_stabilized_duplicates_fall_back_with_warning() {
    let server = MockServer::start().await;
    mount_conferences(&server).await;
    mount_season(
        &server,
        2019,
        json!([team("300", "Split U", BIG_EAST), team("300", "Split U", ACC)]),
    )
    .await;

    let api = CbbdClient::with_base_url(&server.uri(), "test-key").unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    let outcome = handle_team_history(&mut db, &api, params(2019, 2019)).await.unwrap();

    assert_eq!(outcome.log.get("low_confidence_resolutions"), 1);
    assert_eq!(outcome.log.warnings.len(), 1);
    let split = team_id(&mut db, "300").await;
    assert_eq!(history(&mut db, split, 2019).await, (Some(ACC), 1));
}

#[tokio::test]
async fn test_conference_fetch_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conferences"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = CbbdClient::with_base_url(&server.uri(), "bad-key").unwrap();
    let mut db = ImportDatabase::new_in_memory().unwrap();

    let result = handle_team_history(&mut db, &api, params(2010, 2010)).await;

    assert!(matches!(result, Err(ImportError::Http(_))));
    assert_eq!(db.count(tables::TEAMS, &[]).await.unwrap(), 0);
}
