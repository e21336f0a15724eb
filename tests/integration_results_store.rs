use std::rc::Rc;

use quickdraw::results::{best_metric, leaderboard, ResultsStore, SqliteResultsStore};
use quickdraw::scoring::BestMetric;
use quickdraw::session::{COUNTDOWN_MS, TICK_INTERVAL_MS};
use quickdraw::settings::SettingsRecord;
use quickdraw::{GameKind, GameSession, Phase, PlayerProfile};

fn play_hunt(store: Rc<dyn ResultsStore>, email: &str, secs: &str, hits: u32) {
    let settings = SettingsRecord::ItemHunt {
        duration_secs: secs.into(),
        color: Default::default(),
    };
    let mut session = GameSession::with_seed(PlayerProfile::new("p", email), settings, store, 1);
    session.start().unwrap();
    for _ in 0..COUNTDOWN_MS / TICK_INTERVAL_MS {
        session.tick().unwrap();
    }
    for _ in 0..hits {
        let Some(quickdraw::round::Round::Target(t)) = session.round() else {
            panic!("expected a target round");
        };
        let active = t.active_index;
        session.tap(active).unwrap();
    }
    while session.phase() == Phase::Active {
        session.tick().unwrap();
    }
    assert_eq!(session.phase(), Phase::Finished);
}

#[test]
fn results_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("results.db");

    {
        let store: Rc<dyn ResultsStore> = Rc::new(SqliteResultsStore::open(&path).unwrap());
        play_hunt(store.clone(), "ann@example.com", "2", 4);
        play_hunt(store, "ann@example.com", "2", 8);
    }

    let store = SqliteResultsStore::open(&path).unwrap();
    let records = store
        .query_results(Some("ann@example.com"), Some(GameKind::ItemHunt.id()))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].settings.get("Setting1"), Some(&2.0));
    assert_eq!(records[0].settings.get("Setting2"), Some(&-1.0));
    assert_eq!(records[0].metric("Result1"), Some(4.0));
    assert_eq!(records[0].metric("Result2"), Some(500.0));

    assert_eq!(
        best_metric(&store, "ann@example.com", GameKind::ItemHunt),
        BestMetric::Best(250.0)
    );
    assert_eq!(
        best_metric(&store, "ann@example.com", GameKind::Stroop),
        BestMetric::NoHistory
    );
}

#[test]
fn new_session_sees_previous_best() {
    let store: Rc<dyn ResultsStore> = Rc::new(SqliteResultsStore::in_memory().unwrap());
    play_hunt(store.clone(), "bob@example.com", "1", 5);

    let session = GameSession::new(
        PlayerProfile::new("Bob", "bob@example.com"),
        SettingsRecord::defaults(GameKind::ItemHunt),
        store,
    );
    assert_eq!(session.best(), BestMetric::Best(200.0));
}

#[test]
fn leaderboard_ranks_players_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store: Rc<dyn ResultsStore> =
        Rc::new(SqliteResultsStore::open(dir.path().join("results.db")).unwrap());

    play_hunt(store.clone(), "ann@example.com", "1", 2);
    play_hunt(store.clone(), "bob@example.com", "1", 4);
    play_hunt(store.clone(), "bob@example.com", "1", 1);
    // no hits: no derived value, so no ranking
    play_hunt(store.clone(), "cat@example.com", "1", 0);

    let board = leaderboard(store.as_ref(), GameKind::ItemHunt, 10).unwrap();
    let players: Vec<_> = board.iter().map(|e| e.player_id.as_str()).collect();
    assert_eq!(players, ["bob@example.com", "ann@example.com"]);
    assert_eq!(board[0].best, 250.0);
    assert_eq!(board[0].sessions, 2);
    assert_eq!(board[0].mean, 625.0);

    let top = leaderboard(store.as_ref(), GameKind::ItemHunt, 1).unwrap();
    assert_eq!(top.len(), 1);
}
