// Integration tests for the gridiron service.
//
// These run whole leagues through the library's public API against real
// SQLite databases: catalog import, joins, a complete draft with retried
// confirmations, racing picks, and reopening a database mid-draft.

use std::collections::HashSet;
use std::path::Path;

use gridiron_app::app;
use gridiron_app::catalog;
use gridiron_app::config::DraftConfig;
use gridiron_app::db::Database;
use gridiron_app::service::{DraftService, ServiceError};
use gridiron_core::{DraftError, LeagueError, ScoringRound};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn seeded_service(db: Database, rounds: u32) -> DraftService {
    let svc = DraftService::new(
        db,
        &DraftConfig {
            rounds,
            order_seed: Some(2024),
        },
    );
    if svc.db().player_count().unwrap() == 0 {
        let players = catalog::load_players(&Path::new(FIXTURES).join("players.csv")).unwrap();
        svc.import_catalog(&players).unwrap();
    }
    svc
}

/// Create a league of `n` teams and fill it. Users are `user1..=userN`.
fn full_league(svc: &DraftService, n: u32) -> String {
    let league = svc.create_league("Integration League", n).unwrap();
    for i in 1..=n {
        svc.join_league(&league.id, &format!("user{i}"), &format!("Team {i}"))
            .unwrap();
    }
    league.id
}

/// The user on the clock, or `None` once the draft is over.
fn user_on_clock(svc: &DraftService, league_id: &str) -> Option<String> {
    let status = svc.league_status(league_id).unwrap();
    status.on_the_clock().map(|c| c.user_id.clone())
}

/// Scratch directory for file-backed databases.
fn scratch(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn fixture_catalog_skips_bad_rows() {
    let players = catalog::load_players(&Path::new(FIXTURES).join("players.csv")).unwrap();
    assert_eq!(players.len(), 32 * 9);
    assert!(players.iter().all(|p| p.parsed_position().is_some()));
    let ids: HashSet<_> = players.iter().map(|p| p.player_id.as_str()).collect();
    assert_eq!(ids.len(), players.len());
    let buf_qb = players.iter().find(|p| p.player_id == "buf-qb1").unwrap();
    assert_eq!(buf_qb.player_name, "BUF QB1");
}

#[test]
fn full_draft_with_retries_through_service() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 14);
    let league_id = full_league(&svc, 4);

    let mut picks = 0;
    while let Some(user) = user_on_clock(&svc, &league_id) {
        let choice = svc.available_players(&league_id, &user).unwrap()[0].clone();
        let receipt = svc
            .confirm_pick(&league_id, &user, &choice.player_id, Some(picks))
            .unwrap();
        assert!(!receipt.replayed);
        assert_eq!(receipt.result.pick_number, picks + 1);

        // A retried confirmation is answered, not re-applied.
        let retry = svc
            .confirm_pick(&league_id, &user, &choice.player_id, Some(picks))
            .unwrap();
        assert!(retry.replayed);
        assert_eq!(retry.result, receipt.result);
        picks += 1;
    }
    assert_eq!(picks, 56);

    let status = svc.league_status(&league_id).unwrap();
    assert!(status.league.full);
    assert!(status.league.drafted);
    let draft = status.draft.as_ref().unwrap();
    assert!(draft.completed);
    assert_eq!(draft.results.len(), 56);

    let mut drafted = HashSet::new();
    for c in &status.contestants {
        assert_eq!(c.roster.filled_count(), 14);
        let teams: HashSet<_> = c.roster.players().map(|p| p.team_id.clone()).collect();
        assert_eq!(teams.len(), 14, "{} repeats an NFL team", c.team_name);
        for p in c.roster.players() {
            assert!(drafted.insert(p.player_id.clone()), "{} drafted twice", p.player_id);
        }
    }

    let user = &status.contestants[0].user_id;
    assert!(matches!(
        svc.confirm_pick(&league_id, user, "was-dst1", None),
        Err(ServiceError::Draft(DraftError::DraftCompleted))
    ));
}

#[test]
fn racing_picks_commit_exactly_once() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 14);
    let league_id = full_league(&svc, 3);
    let user = user_on_clock(&svc, &league_id).unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = ["ari-qb1", "atl-qb1", "bal-qb1"]
            .into_iter()
            .map(|player| {
                let (svc, league_id, user) = (&svc, &league_id, &user);
                s.spawn(move || svc.confirm_pick(league_id, user, player, Some(0)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ServiceError::StalePick { .. })));

    let draft = svc.league_status(&league_id).unwrap().draft.unwrap();
    assert_eq!(draft.overall_pick, 1);
    assert_eq!(draft.results.len(), 1);
}

#[test]
fn draft_survives_reopening_the_database() {
    let dir = scratch("gridiron_it_reopen");
    let db_path = dir.join("gridiron.db");
    let db_path = db_path.to_str().unwrap();

    let (league_id, first_user) = {
        let svc = seeded_service(Database::open(db_path).unwrap(), 2);
        let league_id = full_league(&svc, 2);
        let user = user_on_clock(&svc, &league_id).unwrap();
        svc.confirm_pick(&league_id, &user, "kc-qb1", None).unwrap();
        (league_id, user)
    };

    let svc = seeded_service(Database::open(db_path).unwrap(), 2);
    assert_eq!(app::recover_from_db(&svc).unwrap(), 1);

    let status = svc.league_status(&league_id).unwrap();
    let draft = status.draft.as_ref().unwrap();
    assert_eq!(draft.overall_pick, 1);
    assert_eq!(draft.results[0].player_id, "kc-qb1");

    // The other team is on the clock and the retry window still works.
    let next = user_on_clock(&svc, &league_id).unwrap();
    assert_ne!(next, first_user);
    assert!(svc
        .confirm_pick(&league_id, &first_user, "kc-qb1", Some(0))
        .unwrap()
        .replayed);

    drop(svc);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn playoff_points_drive_standings() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 1);
    let league_id = full_league(&svc, 3);
    while let Some(user) = user_on_clock(&svc, &league_id) {
        let choice = svc.available_players(&league_id, &user).unwrap()[0].clone();
        svc.confirm_pick(&league_id, &user, &choice.player_id, None)
            .unwrap();
    }

    let status = svc.league_status(&league_id).unwrap();
    let scores = [("user1", 10.0), ("user2", 10.0), ("user3", 12.0)];
    for (user, pts) in scores {
        let c = status.contestants.iter().find(|c| c.user_id == user).unwrap();
        let player_id = c.roster.players().next().unwrap().player_id.clone();
        svc.record_points(&league_id, user, &player_id, ScoringRound::Divisional, pts)
            .unwrap();
    }

    let table: Vec<String> = svc
        .standings(&league_id)
        .unwrap()
        .into_iter()
        .map(|c| c.team_name)
        .collect();
    assert_eq!(table, vec!["Team 3", "Team 1", "Team 2"]);
}

#[test]
fn scoring_a_stale_contestant_keeps_later_picks() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 2);
    let league_id = full_league(&svc, 1);

    svc.confirm_pick(&league_id, "user1", "ari-qb1", Some(0)).unwrap();
    let stale = svc.contestant(&league_id, "user1").unwrap();
    svc.confirm_pick(&league_id, "user1", "atl-rb1", Some(1)).unwrap();

    svc.db()
        .record_player_points(&stale.id, "ari-qb1", ScoringRound::WildCard, 12.0)
        .unwrap();

    let status = svc.league_status(&league_id).unwrap();
    let results = &status.draft.as_ref().unwrap().results;
    let c = &status.contestants[0];
    assert_eq!(c.roster.filled_count(), results.len());
    assert!(c.roster.has_player("atl-rb1"));
    assert!((c.wc_pts - 12.0).abs() < f64::EPSILON);
}

#[test]
fn racing_joins_by_one_user_add_one_team() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 14);
    let league = svc.create_league("Race League", 4).unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = ["Ants", "Bees", "Cats"]
            .into_iter()
            .map(|team| {
                let (svc, league_id) = (&svc, &league.id);
                s.spawn(move || svc.join_league(league_id, "user1", team))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ServiceError::League(LeagueError::AlreadyJoined { .. }))));
    assert_eq!(svc.league_status(&league.id).unwrap().contestants.len(), 1);
}

#[test]
fn open_leagues_and_board_follow_the_draft() {
    let svc = seeded_service(Database::open(":memory:").unwrap(), 1);
    let league = svc.create_league("Board League", 2).unwrap();
    svc.join_league(&league.id, "user1", "Team 1").unwrap();
    assert!(svc
        .open_leagues()
        .unwrap()
        .iter()
        .any(|(l, n)| l.id == league.id && *n == 1));

    svc.join_league(&league.id, "user2", "Team 2").unwrap();
    assert!(svc.open_leagues().unwrap().iter().all(|(l, _)| l.id != league.id));

    while let Some(user) = user_on_clock(&svc, &league.id) {
        let choice = svc.available_players(&league.id, &user).unwrap()[0].clone();
        svc.confirm_pick(&league.id, &user, &choice.player_id, None)
            .unwrap();
    }
    let board = svc.draft_board(&league.id).unwrap();
    assert!(board.completed);
    let numbers: Vec<u32> = board.results.iter().map(|r| r.pick_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}
