#[path = "../common/mod.rs"]
mod common;

use std::{cell::RefCell, time::Duration};

use approx::assert_abs_diff_eq;
use common::*;
use serde_json::json;
use valorank::{
    api::{
        api_structs::{CatalogAgent, CatalogChroma, CatalogSkin, CatalogWeapon},
        Method
    },
    catalog::Catalog,
    model::{
        structures::phase::Phase, Aggregator, AggregatorConfig, AggregatorError, FrontendData, MatchContext,
        RosterEntry
    }
};

const JETT: &str = "add6443a-41bd-e414-f6ad-e58d267f4e95";
const VANDAL: &str = "9c82e19d-4575-0200-1a81-3eacf00cf872";
const CHROMA_SOCKET: &str = "3ad1b2b2-acdb-4524-852f-954a76ddae0a";

/// (match id, won, score, rounds, kills, deaths)
type Line = (&'static str, bool, u32, u32, u32, u32);

fn config() -> AggregatorConfig {
    AggregatorConfig {
        update_interval: Duration::ZERO,
        ..Default::default()
    }
}

fn aggregator(transport: &FakeTransport, catalog: Catalog) -> Aggregator<FakeTransport> {
    Aggregator::new(transport.clone(), endpoints(), catalog, headers(), config())
}

fn in_game(match_id: &str, players: &[(&str, &str)]) -> MatchContext {
    let mut context = MatchContext::lobby(players[0].0);
    context.match_id = Some(match_id.to_string());
    context.phase = Phase::InGame;
    for (puuid, team) in players {
        context.roster.insert(
            puuid.to_string(),
            RosterEntry {
                team_id: Some(team.to_string()),
                ..Default::default()
            }
        );
    }
    context
}

fn script_player(transport: &FakeTransport, puuid: &str, total: usize, lines: &[Line]) {
    let endpoints = endpoints();
    let ids: Vec<&str> = lines.iter().map(|line| line.0).collect();

    transport.ok(endpoints.mmr(puuid), mmr(13, 42));
    transport.ok(endpoints.match_history(puuid, 0, 5, true), history(total, &ids));
    for (id, won, score, rounds, kills, deaths) in lines {
        transport.ok(
            endpoints.match_details(id),
            match_details(puuid, *won, *score, *rounds, *kills, *deaths)
        );
    }
}

/// Records every published snapshot.
struct Recorder(RefCell<Vec<FrontendData>>);

impl Recorder {
    fn new() -> Self {
        Recorder(RefCell::new(Vec::new()))
    }

    fn observer(&self) -> impl Fn(&FrontendData) + '_ {
        move |snapshot: &FrontendData| self.0.borrow_mut().push(snapshot.clone())
    }

    fn published(&self) -> Vec<FrontendData> {
        self.0.borrow().clone()
    }
}

#[tokio::test]
async fn test_refresh_aggregates_and_publishes_incrementally() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(
        &transport,
        "a",
        3,
        &[("a1", true, 4000, 20, 10, 5), ("a2", false, 3000, 20, 5, 5), ("a3", true, 5000, 20, 15, 0)]
    );
    script_player(&transport, "b", 1, &[("b1", true, 2000, 10, 5, 0)]);
    let aggregator = aggregator(&transport, Catalog::default());
    let recorder = Recorder::new();

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("a", "Blue"), ("b", "Red")]), &recorder.observer())
        .await
        .unwrap();

    let published = recorder.published();
    assert!(published.len() >= 2);
    assert_eq!(published[0].len(), 1);
    assert_eq!(published.last().unwrap().len(), 2);

    let a = &snapshot["a"];
    assert_eq!(a.name, "Player-a#EUW");
    assert_eq!(a.level, Some(77));
    assert_eq!(a.team.as_deref(), Some("Blue"));
    assert_eq!(a.rank.current_tier, "Gold 2");
    assert_eq!(a.rank.current_rr, 42);
    assert_eq!(a.stats.matches_counted, 3);
    assert_eq!(a.stats.win_rate, Some(66));
    assert_abs_diff_eq!(a.stats.avg_combat_score.unwrap(), 200.0);
    assert_abs_diff_eq!(a.stats.kill_death_ratio.unwrap(), 3.0);
    assert_abs_diff_eq!(a.stats.headshot_rate.unwrap(), 20.0);

    let b = &snapshot["b"];
    assert_eq!(b.team.as_deref(), Some("Red"));
    assert_abs_diff_eq!(b.stats.kill_death_ratio.unwrap(), 5.0);
}

#[tokio::test]
async fn test_failed_match_detail_is_skipped() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 2, &[("a1", true, 100, 10, 1, 1), ("a2", true, 100, 10, 1, 1)]);
    transport.reset(&endpoints().match_details("a2"));
    transport.route(endpoints().match_details("a2"), response(500, json!({})));
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("a", "Blue")]), &|_: &FrontendData| {})
        .await
        .unwrap();

    assert_eq!(snapshot["a"].stats.matches_counted, 1);
}

#[tokio::test]
async fn test_player_without_any_history_gets_placeholders() {
    init_test_env();
    let transport = FakeTransport::new();
    let endpoints = endpoints();
    transport.ok(endpoints.match_history("new", 0, 5, true), history(0, &[]));
    transport.ok(endpoints.match_history("new", 0, 1, false), history(0, &[]));
    transport.ok(endpoints.name_service(), names(&[("new", "Fresh", "0001")]));
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("new", "Red")]), &|_: &FrontendData| {})
        .await
        .unwrap();

    let player = &snapshot["new"];
    assert_eq!(player.name, "Fresh#0001");
    assert_eq!(player.rank.current_tier, "Unranked");
    assert_eq!(player.rank.peak_tier, "N/A");
    assert_eq!(player.stats.matches_counted, 0);
    assert_eq!(player.stats.win_rate_display(), "N/A");
    assert_eq!(player.stats.acs_display(), "N/A");
    assert_eq!(player.stats.kd_display(), "N/A");
    assert_eq!(player.stats.headshot_display(), "N/A");
    assert!(transport.sent(Method::Put, &endpoints.name_service()));
}

#[tokio::test]
async fn test_unranked_player_identity_from_latest_match() {
    init_test_env();
    let transport = FakeTransport::new();
    let endpoints = endpoints();
    transport.ok(endpoints.match_history("casual", 0, 5, true), history(0, &[]));
    transport.ok(endpoints.match_history("casual", 0, 1, false), history(12, &["dm-1"]));
    transport.ok(endpoints.match_details("dm-1"), match_details("casual", true, 0, 0, 0, 0));
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("casual", "Red")]), &|_: &FrontendData| {})
        .await
        .unwrap();

    let player = &snapshot["casual"];
    assert_eq!(player.name, "Player-casual#EUW");
    assert_eq!(player.level, Some(77));
    assert_eq!(player.stats.matches_counted, 0);
    assert!(!transport.sent(Method::Put, &endpoints.name_service()));
}

#[tokio::test]
async fn test_match_change_clears_previous_players() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    script_player(&transport, "b", 1, &[("b1", true, 100, 10, 1, 1)]);
    let aggregator = aggregator(&transport, Catalog::default());

    aggregator
        .refresh(&in_game("m1", &[("a", "Blue")]), &|_: &FrontendData| {})
        .await
        .unwrap();
    let recorder = Recorder::new();
    let snapshot = aggregator
        .refresh(&in_game("m2", &[("b", "Blue")]), &recorder.observer())
        .await
        .unwrap();

    assert!(recorder.published().iter().all(|published| !published.contains_key("a")));
    assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["b"]);
}

#[tokio::test]
async fn test_processed_players_are_not_refetched() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    let aggregator = aggregator(&transport, Catalog::default());
    let context = in_game("m1", &[("a", "Blue")]);

    aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();
    let snapshot = aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();

    assert_eq!(transport.count(&endpoints().mmr("a")), 1);
    assert_eq!(snapshot["a"].stats.matches_counted, 1);
}

#[tokio::test]
async fn test_load_more_extends_until_exhausted() {
    init_test_env();
    let transport = FakeTransport::new();
    let endpoints = endpoints();
    let first: Vec<Line> = (0..5).map(|i| (["h0", "h1", "h2", "h3", "h4"][i], true, 100, 10, 1, 1)).collect();
    script_player(&transport, "a", 7, &first);
    transport.ok(endpoints.match_history("a", 5, 15, true), history(7, &["h5", "h6"]));
    transport.ok(endpoints.match_details("h5"), match_details("a", false, 100, 10, 1, 1));
    transport.ok(endpoints.match_details("h6"), match_details("a", false, 100, 10, 1, 1));
    let aggregator = aggregator(&transport, Catalog::default());

    let initial = aggregator
        .refresh(&in_game("m1", &[("a", "Blue")]), &|_: &FrontendData| {})
        .await
        .unwrap();
    assert_eq!(initial["a"].stats.matches_counted, 5);
    assert_eq!(initial["a"].stats.win_rate, Some(100));

    let extended = aggregator.load_more(&|_: &FrontendData| {}).await.unwrap();
    assert_eq!(extended["a"].stats.matches_counted, 7);
    assert_eq!(extended["a"].stats.win_rate, Some(71));

    let again = aggregator.load_more(&|_: &FrontendData| {}).await.unwrap();
    assert_eq!(again["a"].stats, extended["a"].stats);
    assert_eq!(transport.count(&endpoints.match_history("a", 5, 15, true)), 1);
    assert_eq!(transport.count(&endpoints.match_history("a", 7, 17, true)), 0);
}

#[tokio::test]
async fn test_concurrent_refresh_is_rejected() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    let aggregator = Aggregator::new(
        transport.clone(),
        endpoints(),
        Catalog::default(),
        headers(),
        AggregatorConfig {
            update_interval: Duration::from_millis(200),
            ..Default::default()
        }
    );
    let context = in_game("m1", &[("a", "Blue")]);
    let noop = |_: &FrontendData| {};

    let refresh = aggregator.refresh(&context, &noop);
    tokio::pin!(refresh);
    assert!(futures::poll!(refresh.as_mut()).is_pending());

    assert!(matches!(aggregator.load_more(&noop).await, Err(AggregatorError::Busy)));
    assert!(matches!(aggregator.refresh(&context, &noop).await, Err(AggregatorError::Busy)));

    let snapshot = refresh.await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(transport.count(&endpoints().mmr("a")), 1);
}

#[tokio::test]
async fn test_rank_failure_is_unranked() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    transport.reset(&endpoints().mmr("a"));
    transport.route(endpoints().mmr("a"), response(404, json!({})));
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("a", "Blue")]), &|_: &FrontendData| {})
        .await
        .unwrap();

    assert_eq!(snapshot["a"].rank.current_tier, "Unranked");
    assert_eq!(snapshot["a"].rank.current_rr, 0);
    assert_eq!(snapshot["a"].stats.matches_counted, 1);
}

#[tokio::test]
async fn test_lobby_lists_local_player() {
    init_test_env();
    let transport = FakeTransport::new();
    transport.ok(endpoints().name_service(), names(&[("me", "Solo", "EUW")]));
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&MatchContext::lobby("me"), &|_: &FrontendData| {})
        .await
        .unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["me"].name, "Solo#EUW");
    assert_eq!(snapshot["me"].team.as_deref(), Some("Red"));
    assert_eq!(transport.count(&endpoints().mmr("me")), 0);
}

#[tokio::test]
async fn test_agents_and_loadouts_applied_after_roster_settles() {
    init_test_env();
    let transport = FakeTransport::new();
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    transport.ok(
        endpoints().core_game_loadouts("m1"),
        json!({
            "Loadouts": [{
                "CharacterID": JETT,
                "Loadout": {
                    "Subject": "a",
                    "Items": { VANDAL: { "Sockets": { CHROMA_SOCKET: { "Item": { "ID": "prime-chroma" } } } } }
                }
            }]
        })
    );
    let catalog = Catalog::from_parts(
        vec![CatalogAgent {
            uuid: JETT.to_string(),
            display_name: "Jett".to_string(),
            is_playable_character: true
        }],
        vec![CatalogWeapon {
            uuid: VANDAL.to_string(),
            display_name: "Vandal".to_string(),
            skins: vec![CatalogSkin {
                uuid: "prime-skin".to_string(),
                display_name: "Prime Vandal".to_string(),
                chromas: vec![CatalogChroma {
                    uuid: "prime-chroma".to_string(),
                    display_name: "Prime Vandal".to_string()
                }]
            }]
        }],
        vec![],
        None
    );
    let aggregator = aggregator(&transport, catalog);
    let mut context = in_game("m1", &[("a", "Blue")]);
    context.roster["a"].character_id = Some(JETT.to_string());

    let snapshot = aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();

    let player = &snapshot["a"];
    assert_eq!(player.agent.as_deref(), Some("Jett"));
    let loadout = player.loadout.as_ref().unwrap();
    assert_eq!(loadout.get("Vandal").map(String::as_str), Some("Prime Vandal"));

    aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();
    assert_eq!(transport.count(&endpoints().core_game_loadouts("m1")), 1);
}

#[tokio::test]
async fn test_rate_limited_rank_and_history_are_retried() {
    init_test_env();
    let transport = FakeTransport::new();
    let endpoints = endpoints();
    transport.route(endpoints.mmr("a"), rate_limited(Duration::ZERO));
    transport.route(endpoints.match_history("a", 0, 5, true), rate_limited(Duration::ZERO));
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator
        .refresh(&in_game("m1", &[("a", "Blue")]), &|_: &FrontendData| {})
        .await
        .unwrap();

    assert_eq!(snapshot["a"].rank.current_tier, "Gold 2");
    assert_eq!(snapshot["a"].stats.matches_counted, 1);
    assert_eq!(transport.count(&endpoints.mmr("a")), 2);
    assert_eq!(transport.count(&endpoints.match_history("a", 0, 5, true)), 2);
}

#[tokio::test]
async fn test_exhausted_rate_limit_leaves_player_for_next_refresh() {
    init_test_env();
    let transport = FakeTransport::new();
    let endpoints = endpoints();
    let window = endpoints.match_history("a", 0, 5, true);
    script_player(&transport, "a", 1, &[("a1", true, 100, 10, 1, 1)]);
    transport.reset(&window);
    transport.route(&window, rate_limited(Duration::ZERO));
    let aggregator = aggregator(&transport, Catalog::default());
    let context = in_game("m1", &[("a", "Blue")]);

    let first = aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();
    assert!(!first.contains_key("a"));
    assert_eq!(transport.count(&window), 3);
    assert_eq!(transport.count(&endpoints.match_history("a", 0, 1, false)), 0);

    transport.reset(&window);
    transport.ok(&window, history(1, &["a1"]));
    let second = aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();

    assert_eq!(second["a"].rank.current_tier, "Gold 2");
    assert_eq!(second["a"].stats.matches_counted, 1);
    assert_eq!(second["a"].name, "Player-a#EUW");
    assert_eq!(transport.count(&endpoints.mmr("a")), 2);
}

#[tokio::test]
async fn test_lobby_lists_party_members_with_ranks() {
    init_test_env();
    let transport = FakeTransport::new();
    transport.ok(
        endpoints().name_service(),
        names(&[("me", "Solo", "EUW"), ("friend", "Duo", "EUW")])
    );
    let mut context = MatchContext::lobby("me");
    context.roster.insert(
        "me".to_string(),
        RosterEntry {
            competitive_tier: Some(13),
            account_level: Some(50),
            ..Default::default()
        }
    );
    context.roster.insert(
        "friend".to_string(),
        RosterEntry {
            competitive_tier: Some(0),
            account_level: Some(10),
            ..Default::default()
        }
    );
    let aggregator = aggregator(&transport, Catalog::default());

    let snapshot = aggregator.refresh(&context, &|_: &FrontendData| {}).await.unwrap();

    assert_eq!(snapshot.len(), 2);
    let me = &snapshot["me"];
    assert_eq!(me.name, "Solo#EUW");
    assert_eq!(me.rank.current_tier, "Gold 2");
    assert_eq!(me.level, Some(50));
    assert_eq!(me.team.as_deref(), Some("Red"));
    let friend = &snapshot["friend"];
    assert_eq!(friend.name, "Duo#EUW");
    assert_eq!(friend.rank.current_tier, "Unranked");
    assert_eq!(friend.level, Some(10));
    assert_eq!(friend.team.as_deref(), Some("Red"));
    assert!(transport.sent(Method::Put, &endpoints().name_service()));
    assert_eq!(transport.count(&endpoints().mmr("friend")), 0);
}
