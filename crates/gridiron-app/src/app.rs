// Console application: command parsing, the main event loop, and text
// rendering of service results.

use std::fmt::Write as _;

use gridiron_core::{Contestant, Draft, League, ScoringRound, SlotName};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::service::{DraftService, LeagueStatus, PickReceipt, ServiceError};

/// Available players listed per `available` command.
const AVAILABLE_LIMIT: usize = 40;

pub const HELP: &str = "\
commands:
  create <size> <name...>                       start a league
  leagues                                       leagues still taking teams
  join <league> <user> <team...>                join a league
  status <league>                               league, teams and draft state
  turn <league>                                 who is on the clock
  board <league>                                every pick made so far
  pick <league> <user> <player> [expected]      confirm a pick
  available <league> <user>                     players the user can take
  roster <league> <user>                        the user's roster
  standings <league>                            league standings
  points <league> <user> <player> <wc|dv|cc|sb> <pts>
                                                record a player's points
  help                                          this text
  quit                                          exit";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One console command.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Create { size: u32, name: String },
    Leagues,
    Join { league_id: String, user_id: String, team_name: String },
    Status { league_id: String },
    Turn { league_id: String },
    Board { league_id: String },
    Pick {
        league_id: String,
        user_id: String,
        player_id: String,
        expected_overall_pick: Option<u32>,
    },
    Available { league_id: String, user_id: String },
    Roster { league_id: String, user_id: String },
    Standings { league_id: String },
    Points {
        league_id: String,
        user_id: String,
        player_id: String,
        round: ScoringRound,
        points: f64,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help` for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("`{value}` is not a valid {what}")]
    InvalidArgument { what: &'static str, value: String },
}

impl AppCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<AppCommand>, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Ok(None);
        };

        let cmd = match verb.to_lowercase().as_str() {
            "create" => match args {
                [size, name @ ..] if !name.is_empty() => AppCommand::Create {
                    size: parse_num(size, "league size")?,
                    name: name.join(" "),
                },
                _ => return Err(CommandError::Usage("create <size> <name...>")),
            },
            "leagues" | "open" => match args {
                [] => AppCommand::Leagues,
                _ => return Err(CommandError::Usage("leagues")),
            },
            "join" => match args {
                [league, user, team @ ..] if !team.is_empty() => AppCommand::Join {
                    league_id: league.to_string(),
                    user_id: user.to_string(),
                    team_name: team.join(" "),
                },
                _ => return Err(CommandError::Usage("join <league> <user> <team...>")),
            },
            "status" => match args {
                [league] => AppCommand::Status {
                    league_id: league.to_string(),
                },
                _ => return Err(CommandError::Usage("status <league>")),
            },
            "turn" => match args {
                [league] => AppCommand::Turn {
                    league_id: league.to_string(),
                },
                _ => return Err(CommandError::Usage("turn <league>")),
            },
            "board" => match args {
                [league] => AppCommand::Board {
                    league_id: league.to_string(),
                },
                _ => return Err(CommandError::Usage("board <league>")),
            },
            "pick" => match args {
                [league, user, player, rest @ ..] if rest.len() <= 1 => AppCommand::Pick {
                    league_id: league.to_string(),
                    user_id: user.to_string(),
                    player_id: player.to_string(),
                    expected_overall_pick: rest
                        .first()
                        .map(|s| parse_num(s, "expected pick count"))
                        .transpose()?,
                },
                _ => return Err(CommandError::Usage("pick <league> <user> <player> [expected]")),
            },
            "available" => match args {
                [league, user] => AppCommand::Available {
                    league_id: league.to_string(),
                    user_id: user.to_string(),
                },
                _ => return Err(CommandError::Usage("available <league> <user>")),
            },
            "roster" => match args {
                [league, user] => AppCommand::Roster {
                    league_id: league.to_string(),
                    user_id: user.to_string(),
                },
                _ => return Err(CommandError::Usage("roster <league> <user>")),
            },
            "standings" => match args {
                [league] => AppCommand::Standings {
                    league_id: league.to_string(),
                },
                _ => return Err(CommandError::Usage("standings <league>")),
            },
            "points" => match args {
                [league, user, player, round, pts] => AppCommand::Points {
                    league_id: league.to_string(),
                    user_id: user.to_string(),
                    player_id: player.to_string(),
                    round: ScoringRound::from_code(round).ok_or_else(|| {
                        CommandError::InvalidArgument {
                            what: "round (wc, dv, cc, sb)",
                            value: round.to_string(),
                        }
                    })?,
                    points: pts
                        .parse::<f64>()
                        .ok()
                        .filter(|p| p.is_finite())
                        .ok_or_else(|| CommandError::InvalidArgument {
                            what: "points value",
                            value: pts.to_string(),
                        })?,
                },
                _ => {
                    return Err(CommandError::Usage(
                        "points <league> <user> <player> <wc|dv|cc|sb> <pts>",
                    ))
                }
            },
            "help" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(cmd))
    }
}

fn parse_num(s: &str, what: &'static str) -> Result<u32, CommandError> {
    s.parse().map_err(|_| CommandError::InvalidArgument {
        what,
        value: s.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Commands arrive on `cmd_rx` and are applied one at a time; each produces
/// one block of text on `out_tx`. Exits on `Quit` or when the command
/// channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<AppCommand>,
    out_tx: mpsc::Sender<String>,
    service: DraftService,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    loop {
        match cmd_rx.recv().await {
            Some(AppCommand::Quit) => {
                info!("Quit command received, shutting down");
                break;
            }
            Some(cmd) => {
                let text = handle_command(&service, cmd);
                if out_tx.send(text).await.is_err() {
                    info!("Output channel closed, shutting down");
                    break;
                }
            }
            None => {
                info!("Command channel closed, shutting down");
                break;
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Apply one command and render its result. Errors are rendered too; none
/// of them stop the loop.
pub fn handle_command(service: &DraftService, cmd: AppCommand) -> String {
    let result = match cmd {
        AppCommand::Create { size, name } => service.create_league(&name, size).map(|l| {
            format!(
                "created league '{}' ({} teams)\nleague id: {}",
                l.name, l.size, l.id
            )
        }),
        AppCommand::Leagues => service.open_leagues().map(|open| render_open_leagues(&open)),
        AppCommand::Join {
            league_id,
            user_id,
            team_name,
        } => service
            .join_league(&league_id, &user_id, &team_name)
            .and_then(|receipt| {
                let mut out = format!("{} joined as '{}'", user_id, receipt.contestant.team_name);
                if receipt.draft.is_some() {
                    out.push_str("\nleague is full; the draft order is set\n");
                    out.push_str(&render_turn(&service.league_status(&league_id)?));
                }
                Ok(out)
            }),
        AppCommand::Status { league_id } => service.league_status(&league_id).map(|s| render_status(&s)),
        AppCommand::Turn { league_id } => service.league_status(&league_id).map(|s| render_turn(&s)),
        AppCommand::Board { league_id } => service.draft_board(&league_id).map(|d| render_board(&d)),
        AppCommand::Pick {
            league_id,
            user_id,
            player_id,
            expected_overall_pick,
        } => service
            .confirm_pick(&league_id, &user_id, &player_id, expected_overall_pick)
            .and_then(|receipt| {
                let mut out = render_pick(&receipt);
                out.push('\n');
                out.push_str(&render_turn(&service.league_status(&league_id)?));
                Ok(out)
            }),
        AppCommand::Available { league_id, user_id } => service
            .available_players(&league_id, &user_id)
            .map(|players| {
                let mut out = format!("{} players available", players.len());
                for p in players.iter().take(AVAILABLE_LIMIT) {
                    let _ = write!(
                        out,
                        "\n  {:<12} {:<4} {:<24} {}",
                        p.player_id, p.position, p.player_name, p.team_id
                    );
                }
                if players.len() > AVAILABLE_LIMIT {
                    let _ = write!(out, "\n  ... and {} more", players.len() - AVAILABLE_LIMIT);
                }
                out
            }),
        AppCommand::Roster { league_id, user_id } => service
            .contestant(&league_id, &user_id)
            .map(|c| render_roster(&c)),
        AppCommand::Standings { league_id } => service
            .standings(&league_id)
            .map(|table| render_standings(&table)),
        AppCommand::Points {
            league_id,
            user_id,
            player_id,
            round,
            points,
        } => service
            .record_points(&league_id, &user_id, &player_id, round, points)
            .map(|c| {
                format!(
                    "'{}' {} total {:.1}, overall {:.1}",
                    c.team_name,
                    round,
                    round_total(&c, round),
                    c.total()
                )
            }),
        AppCommand::Help => Ok(HELP.to_string()),
        AppCommand::Quit => Ok(String::new()),
    };

    result.unwrap_or_else(|e| {
        if matches!(e, ServiceError::Storage(_)) {
            warn!("Command failed: {:#}", e);
        }
        format!("error: {e}")
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn round_total(c: &Contestant, round: ScoringRound) -> f64 {
    match round {
        ScoringRound::WildCard => c.wc_pts,
        ScoringRound::Divisional => c.dv_pts,
        ScoringRound::Conference => c.cc_pts,
        ScoringRound::SuperBowl => c.sb_pts,
    }
}

fn render_pick(receipt: &PickReceipt) -> String {
    let r = &receipt.result;
    let mut out = format!(
        "pick {}: {} take {} ({} {}) into {}",
        r.pick_number,
        r.picking_team,
        r.player_name,
        r.position,
        r.team_id,
        receipt.slot
    );
    if receipt.replayed {
        out.push_str(" [already recorded]");
    }
    if receipt.draft_completed {
        out.push_str("\ndraft complete");
    }
    out
}

pub fn render_turn(status: &LeagueStatus) -> String {
    let Some(draft) = &status.draft else {
        return format!(
            "draft not started ({}/{} teams joined)",
            status.contestants.len(),
            status.league.size
        );
    };
    if draft.completed {
        return format!("draft complete after {} picks", draft.overall_pick);
    }
    match status.on_the_clock() {
        Some(c) => format!(
            "round {}, pick {} ({} overall): {} ({}) is on the clock; expected={}",
            draft.current_round,
            draft.current_pick_in_round,
            draft.current_pick_number(),
            c.team_name,
            c.user_id,
            draft.overall_pick
        ),
        None => "no contestant is on the clock".to_string(),
    }
}

fn render_status(status: &LeagueStatus) -> String {
    let league = &status.league;
    let mut out = format!(
        "{} [{}] {}/{} teams{}{}",
        league.name,
        league.id,
        status.contestants.len(),
        league.size,
        if league.full { ", full" } else { "" },
        if league.drafted { ", drafted" } else { "" }
    );
    for c in &status.contestants {
        let _ = write!(
            out,
            "\n  {:<20} {:<12} {}/{} slots",
            c.team_name,
            c.user_id,
            c.roster.filled_count(),
            c.roster.total_count()
        );
    }
    let _ = write!(out, "\n{}", render_turn(status));
    if let Some(draft) = &status.draft {
        for r in draft.results.iter().rev().take(5) {
            let _ = write!(
                out,
                "\n  #{:<3} {:<20} {} ({} {})",
                r.pick_number, r.picking_team, r.player_name, r.position, r.team_id
            );
        }
    }
    out
}

fn render_open_leagues(open: &[(League, usize)]) -> String {
    if open.is_empty() {
        return "no leagues are taking teams".to_string();
    }
    let mut out = format!("{} open leagues", open.len());
    for (league, members) in open {
        let _ = write!(
            out,
            "\n  {:<32} {:<24} {}/{} teams",
            league.id, league.name, members, league.size
        );
    }
    out
}

/// Every result, numbered overall and as round.pick.
fn render_board(draft: &Draft) -> String {
    let mut out = format!(
        "draft board: {} of {} picks",
        draft.results.len(),
        draft.total_picks()
    );
    let size = draft.size.max(1);
    for r in &draft.results {
        let idx = r.pick_number.saturating_sub(1);
        let _ = write!(
            out,
            "\n  {:>3}  {:>2}.{:<2} {:<20} {:<24} {:<4} {}",
            r.pick_number,
            idx / size + 1,
            idx % size + 1,
            r.picking_team,
            r.player_name,
            r.position,
            r.team_name
        );
    }
    out
}

fn render_roster(c: &Contestant) -> String {
    let mut out = format!("{} ({}) total {:.1}", c.team_name, c.user_id, c.total());
    for slot in SlotName::ALL {
        match c.roster.slot(slot) {
            Some(p) => {
                let _ = write!(
                    out,
                    "\n  {:<6} {:<3} {:<24} {:<4} {:<4} {:>6.1}",
                    slot.as_str(),
                    slot.label(),
                    p.player_name,
                    p.position.display_str(),
                    p.team_id,
                    p.total()
                );
            }
            None => {
                let _ = write!(out, "\n  {:<6} -", slot.as_str());
            }
        }
    }
    out
}

fn render_standings(table: &[Contestant]) -> String {
    let mut out = String::from("standings");
    for (i, c) in table.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {:>2}. {:<20} {:>7.1}  (wc {:.1} dv {:.1} cc {:.1} sb {:.1})",
            i + 1,
            c.team_name,
            c.total(),
            c.wc_pts,
            c.dv_pts,
            c.cc_pts,
            c.sb_pts
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Startup recovery
// ---------------------------------------------------------------------------

/// Report drafts left in progress by a previous session. Draft state lives
/// entirely in the database, so resuming needs no replay; this only logs
/// where each draft stands. Returns how many drafts are in progress.
pub fn recover_from_db(service: &DraftService) -> anyhow::Result<usize> {
    let drafts = service.db().drafts_in_progress()?;
    if drafts.is_empty() {
        info!("No drafts in progress, starting fresh");
        return Ok(0);
    }
    for (league_id, picks) in &drafts {
        info!(
            "Resuming draft for league {} after {} picks",
            league_id, picks
        );
    }
    Ok(drafts.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DraftConfig;
    use crate::db::Database;
    use gridiron_core::Player;

    fn test_service(rounds: u32) -> DraftService {
        let db = Database::open(":memory:").expect("in-memory db");
        let svc = DraftService::new(
            db,
            &DraftConfig {
                rounds,
                order_seed: Some(1),
            },
        );
        let players: Vec<Player> = ["BUF", "KC", "SF", "DAL"]
            .iter()
            .flat_map(|team| {
                ["QB", "RB", "WR"].map(|pos| Player {
                    player_id: format!("{team}-{pos}"),
                    player_name: format!("{team} {pos}"),
                    position: pos.to_string(),
                    team_id: team.to_string(),
                    team_name: team.to_string(),
                })
            })
            .collect();
        svc.import_catalog(&players).unwrap();
        svc
    }

    // -----------------------------------------------------------------------
    // Tests: parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_create_and_join_keep_multiword_names() {
        assert_eq!(
            AppCommand::parse("create 4 Sunday Night  Scaries").unwrap(),
            Some(AppCommand::Create {
                size: 4,
                name: "Sunday Night Scaries".into()
            })
        );
        assert_eq!(
            AppCommand::parse("JOIN L1 alice The Ants").unwrap(),
            Some(AppCommand::Join {
                league_id: "L1".into(),
                user_id: "alice".into(),
                team_name: "The Ants".into()
            })
        );
    }

    #[test]
    fn parse_pick_with_and_without_expected() {
        assert_eq!(
            AppCommand::parse("pick L1 alice p9").unwrap(),
            Some(AppCommand::Pick {
                league_id: "L1".into(),
                user_id: "alice".into(),
                player_id: "p9".into(),
                expected_overall_pick: None
            })
        );
        assert!(matches!(
            AppCommand::parse("pick L1 alice p9 3").unwrap(),
            Some(AppCommand::Pick {
                expected_overall_pick: Some(3),
                ..
            })
        ));
        assert!(matches!(
            AppCommand::parse("pick L1 alice p9 x"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn parse_leagues_and_board() {
        assert_eq!(AppCommand::parse("leagues").unwrap(), Some(AppCommand::Leagues));
        assert_eq!(AppCommand::parse("open").unwrap(), Some(AppCommand::Leagues));
        assert_eq!(
            AppCommand::parse("board L1").unwrap(),
            Some(AppCommand::Board {
                league_id: "L1".into()
            })
        );
        assert!(matches!(
            AppCommand::parse("board"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            AppCommand::parse("leagues L1"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn parse_points() {
        assert_eq!(
            AppCommand::parse("points L1 alice p9 SB 12.5").unwrap(),
            Some(AppCommand::Points {
                league_id: "L1".into(),
                user_id: "alice".into(),
                player_id: "p9".into(),
                round: ScoringRound::SuperBowl,
                points: 12.5
            })
        );
        assert!(matches!(
            AppCommand::parse("points L1 alice p9 final 1"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            AppCommand::parse("points L1 alice p9 wc NaN"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn parse_blank_unknown_and_usage() {
        assert_eq!(AppCommand::parse("   ").unwrap(), None);
        assert_eq!(AppCommand::parse("quit").unwrap(), Some(AppCommand::Quit));
        assert_eq!(
            AppCommand::parse("draft now"),
            Err(CommandError::Unknown("draft".into()))
        );
        assert!(matches!(
            AppCommand::parse("create 4"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            AppCommand::parse("status"),
            Err(CommandError::Usage(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Tests: command handling
    // -----------------------------------------------------------------------

    #[test]
    fn handle_command_reports_errors_as_text() {
        let svc = test_service(2);
        let out = handle_command(
            &svc,
            AppCommand::Status {
                league_id: "missing".into(),
            },
        );
        assert!(out.starts_with("error: league `missing` not found"), "{out}");
    }

    #[test]
    fn turn_before_and_after_fill() {
        let svc = test_service(2);
        let league = svc.create_league("Console", 2).unwrap();
        svc.join_league(&league.id, "alice", "Ants").unwrap();

        let out = handle_command(&svc, AppCommand::Turn { league_id: league.id.clone() });
        assert_eq!(out, "draft not started (1/2 teams joined)");

        let out = handle_command(
            &svc,
            AppCommand::Join {
                league_id: league.id.clone(),
                user_id: "bob".into(),
                team_name: "Bees".into(),
            },
        );
        assert!(out.contains("league is full"), "{out}");
        assert!(out.contains("is on the clock; expected=0"), "{out}");
    }

    #[test]
    fn leagues_lists_joinable_leagues() {
        let svc = test_service(2);
        assert_eq!(
            handle_command(&svc, AppCommand::Leagues),
            "no leagues are taking teams"
        );
        let league = svc.create_league("Console", 2).unwrap();
        svc.join_league(&league.id, "alice", "Ants").unwrap();

        let out = handle_command(&svc, AppCommand::Leagues);
        assert!(out.starts_with("1 open leagues"), "{out}");
        assert!(out.contains(&league.id), "{out}");
        assert!(out.contains("1/2 teams"), "{out}");

        svc.join_league(&league.id, "bob", "Bees").unwrap();
        assert_eq!(
            handle_command(&svc, AppCommand::Leagues),
            "no leagues are taking teams"
        );
    }

    #[test]
    fn board_shows_every_pick_with_round() {
        let svc = test_service(2);
        let league = svc.create_league("Console", 2).unwrap();
        svc.join_league(&league.id, "alice", "Ants").unwrap();
        svc.join_league(&league.id, "bob", "Bees").unwrap();

        for player in ["BUF-QB", "KC-QB", "SF-QB"] {
            let status = svc.league_status(&league.id).unwrap();
            let user = status.on_the_clock().unwrap().user_id.clone();
            svc.confirm_pick(&league.id, &user, player, None).unwrap();
        }

        let out = handle_command(
            &svc,
            AppCommand::Board {
                league_id: league.id,
            },
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "draft board: 3 of 4 picks");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("BUF QB"), "{out}");
        assert!(lines[3].contains(" 2.1 "), "{out}");
        assert!(lines[3].contains("SF QB"), "{out}");
    }

    #[test]
    fn roster_lists_every_slot() {
        let svc = test_service(2);
        let league = svc.create_league("Console", 2).unwrap();
        svc.join_league(&league.id, "alice", "Ants").unwrap();
        let out = handle_command(
            &svc,
            AppCommand::Roster {
                league_id: league.id,
                user_id: "alice".into(),
            },
        );
        assert_eq!(out.lines().count(), 1 + SlotName::ALL.len());
        assert!(out.contains("qb1"), "{out}");
    }

    #[test]
    fn recover_reports_drafts_in_progress() {
        let svc = test_service(2);
        assert_eq!(recover_from_db(&svc).unwrap(), 0);
        let league = svc.create_league("Console", 1).unwrap();
        svc.join_league(&league.id, "alice", "Ants").unwrap();
        assert_eq!(recover_from_db(&svc).unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Tests: async event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let svc = test_service(2);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (out_tx, _out_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(cmd_rx, out_tx, svc));
        cmd_tx.send(AppCommand::Quit).await.unwrap();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn event_loop_exits_when_commands_close() {
        let svc = test_service(2);
        let (cmd_tx, cmd_rx) = mpsc::channel::<AppCommand>(16);
        let (out_tx, _out_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(cmd_rx, out_tx, svc));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn event_loop_runs_a_draft_round() {
        let svc = test_service(1);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(cmd_rx, out_tx, svc));

        cmd_tx
            .send(AppCommand::Create {
                size: 2,
                name: "Loop".into(),
            })
            .await
            .unwrap();
        let created = out_rx.recv().await.unwrap();
        let league_id = created
            .lines()
            .find_map(|l| l.strip_prefix("league id: "))
            .unwrap()
            .to_string();

        for (user, team) in [("alice", "Ants"), ("bob", "Bees")] {
            cmd_tx
                .send(AppCommand::Join {
                    league_id: league_id.clone(),
                    user_id: user.into(),
                    team_name: team.into(),
                })
                .await
                .unwrap();
            out_rx.recv().await.unwrap();
        }

        // Whoever is on the clock picks; the other follows.
        let mut picks = Vec::new();
        for player in ["BUF-QB", "KC-QB"] {
            cmd_tx
                .send(AppCommand::Turn {
                    league_id: league_id.clone(),
                })
                .await
                .unwrap();
            let turn = out_rx.recv().await.unwrap();
            let user = if turn.contains("(alice)") { "alice" } else { "bob" };
            cmd_tx
                .send(AppCommand::Pick {
                    league_id: league_id.clone(),
                    user_id: user.into(),
                    player_id: player.into(),
                    expected_overall_pick: None,
                })
                .await
                .unwrap();
            picks.push(out_rx.recv().await.unwrap());
        }
        assert!(picks[0].starts_with("pick 1:"), "{}", picks[0]);
        assert!(picks[1].contains("draft complete"), "{}", picks[1]);

        cmd_tx.send(AppCommand::Quit).await.unwrap();
        assert!(handle.await.unwrap().is_ok());
    }
}
