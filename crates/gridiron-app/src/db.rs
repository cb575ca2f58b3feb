// SQLite persistence layer for leagues, contestants, drafts and the player
// catalog.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Context, Result};
use gridiron_core::{
    Contestant, Direction, Draft, DraftResult, League, PickOutcome, Player, Roster, ScoringRound,
};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite-backed store. Every multi-row write happens inside one
/// transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                player_id   TEXT PRIMARY KEY,
                player_name TEXT NOT NULL,
                position    TEXT NOT NULL,
                team_id     TEXT NOT NULL,
                team_name   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS leagues (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                size       INTEGER NOT NULL,
                full       INTEGER NOT NULL DEFAULT 0,
                drafted    INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS contestants (
                id        TEXT PRIMARY KEY,
                league_id TEXT NOT NULL REFERENCES leagues(id),
                user_id   TEXT NOT NULL,
                team_name TEXT NOT NULL,
                roster    TEXT NOT NULL,
                wc_pts    REAL NOT NULL DEFAULT 0,
                dv_pts    REAL NOT NULL DEFAULT 0,
                cc_pts    REAL NOT NULL DEFAULT 0,
                sb_pts    REAL NOT NULL DEFAULT 0,
                UNIQUE(league_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id                    TEXT PRIMARY KEY,
                league_id             TEXT NOT NULL UNIQUE REFERENCES leagues(id),
                draft_order           TEXT NOT NULL,
                size                  INTEGER NOT NULL,
                rounds                INTEGER NOT NULL,
                direction             TEXT NOT NULL,
                current_round         INTEGER NOT NULL,
                current_pick_in_round INTEGER NOT NULL,
                overall_pick          INTEGER NOT NULL,
                completed             INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS draft_results (
                draft_id      TEXT NOT NULL REFERENCES drafts(id),
                pick_number   INTEGER NOT NULL,
                contestant_id TEXT NOT NULL REFERENCES contestants(id),
                picking_team  TEXT NOT NULL,
                player_id     TEXT NOT NULL,
                player_name   TEXT NOT NULL,
                position      TEXT NOT NULL,
                team_id       TEXT NOT NULL,
                team_name     TEXT NOT NULL,
                timestamp     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (draft_id, pick_number),
                UNIQUE (draft_id, player_id)
            );

            CREATE INDEX IF NOT EXISTS idx_contestants_league ON contestants(league_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection. A poisoned lock is recovered: every
    /// write is transactional, so a panic mid-write leaves nothing partial.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a new unique id based on the current UTC timestamp.
    ///
    /// Format: `<prefix>_YYYYMMDD_HHMMSS_SSS_xxxx`. The random hex suffix
    /// keeps ids distinct when several are made in the same millisecond.
    pub fn generate_id(prefix: &str) -> String {
        let now = chrono::Utc::now();
        format!(
            "{prefix}_{}_{:04x}",
            now.format("%Y%m%d_%H%M%S_%3f"),
            rand::random::<u16>()
        )
    }

    // ------------------------------------------------------------------
    // Player catalog
    // ------------------------------------------------------------------

    /// Import catalog players in a single transaction. Re-importing a
    /// `player_id` updates its row in place. Returns the number of rows
    /// written.
    pub fn import_players(&self, players: &[Player]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for p in players {
            tx.execute(
                "INSERT INTO players (player_id, player_name, position, team_id, team_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(player_id) DO UPDATE SET
                    player_name = excluded.player_name,
                    position    = excluded.position,
                    team_id     = excluded.team_id,
                    team_name   = excluded.team_name",
                params![p.player_id, p.player_name, p.position, p.team_id, p.team_name],
            )
            .with_context(|| format!("failed to import player {}", p.player_id))?;
        }
        tx.commit().context("failed to commit player import")?;
        Ok(players.len())
    }

    /// All catalog players in import order.
    pub fn load_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player_id, player_name, position, team_id, team_name
                 FROM players ORDER BY rowid",
            )
            .context("failed to prepare load_players query")?;
        let players = stmt
            .query_map([], row_to_player)
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        Ok(players)
    }

    pub fn load_player(&self, player_id: &str) -> Result<Option<Player>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT player_id, player_name, position, team_id, team_name
             FROM players WHERE player_id = ?1",
            params![player_id],
            row_to_player,
        )
        .optional()
        .context("failed to load player")
    }

    pub fn player_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
            .context("failed to count players")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Leagues and contestants
    // ------------------------------------------------------------------

    pub fn insert_league(&self, league: &League) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO leagues (id, name, size, full, drafted) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![league.id, league.name, league.size, league.full, league.drafted],
        )
        .context("failed to insert league")?;
        Ok(())
    }

    pub fn load_league(&self, league_id: &str) -> Result<Option<League>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, size, full, drafted FROM leagues WHERE id = ?1",
            params![league_id],
            |row| {
                Ok(League {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    size: row.get(2)?,
                    full: row.get(3)?,
                    drafted: row.get(4)?,
                })
            },
        )
        .optional()
        .context("failed to load league")
    }

    /// Leagues still taking teams, oldest first, with their member counts.
    pub fn open_leagues(&self) -> Result<Vec<(League, usize)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT l.id, l.name, l.size, l.full, l.drafted,
                        (SELECT COUNT(*) FROM contestants c WHERE c.league_id = l.id)
                 FROM leagues l WHERE l.full = 0
                 ORDER BY l.created_at, l.rowid",
            )
            .context("failed to prepare open_leagues query")?;
        let leagues = stmt
            .query_map([], |row| {
                let members: i64 = row.get(5)?;
                Ok((
                    League {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        size: row.get(2)?,
                        full: row.get(3)?,
                        drafted: row.get(4)?,
                    },
                    members as usize,
                ))
            })
            .context("failed to query open leagues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map league rows")?;
        Ok(leagues)
    }

    /// Members of a league in join order.
    pub fn load_contestants(&self, league_id: &str) -> Result<Vec<Contestant>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, league_id, user_id, team_name, roster, wc_pts, dv_pts, cc_pts, sb_pts
                 FROM contestants WHERE league_id = ?1 ORDER BY rowid",
            )
            .context("failed to prepare load_contestants query")?;
        let rows = stmt
            .query_map(params![league_id], ContestantRow::from_row)
            .context("failed to query contestants")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map contestant rows")?;
        rows.into_iter().map(ContestantRow::into_contestant).collect()
    }

    pub fn load_contestant_for_user(
        &self,
        league_id: &str,
        user_id: &str,
    ) -> Result<Option<Contestant>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, league_id, user_id, team_name, roster, wc_pts, dv_pts, cc_pts, sb_pts
                 FROM contestants WHERE league_id = ?1 AND user_id = ?2",
                params![league_id, user_id],
                ContestantRow::from_row,
            )
            .optional()
            .context("failed to load contestant")?;
        row.map(ContestantRow::into_contestant).transpose()
    }

    /// Add a contestant and, when it fills the league, flip `full` and store
    /// the new draft, all in one transaction.
    ///
    /// `members_before` is the member count the caller validated against.
    /// Returns `false` without writing if another join landed first or the
    /// user already has a team in the league.
    pub fn commit_join(
        &self,
        contestant: &Contestant,
        members_before: usize,
        draft: Option<&Draft>,
    ) -> Result<bool> {
        let roster_json =
            serde_json::to_string(&contestant.roster).context("failed to serialize roster")?;

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin join transaction")?;

        let already: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM contestants WHERE league_id = ?1 AND user_id = ?2)",
                params![contestant.league_id, contestant.user_id],
                |row| row.get(0),
            )
            .context("failed to check existing membership")?;
        if already {
            return Ok(false);
        }

        let members: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM contestants WHERE league_id = ?1",
                params![contestant.league_id],
                |row| row.get(0),
            )
            .context("failed to count league members")?;
        if members as usize != members_before {
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO contestants
                (id, league_id, user_id, team_name, roster, wc_pts, dv_pts, cc_pts, sb_pts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                contestant.id,
                contestant.league_id,
                contestant.user_id,
                contestant.team_name,
                roster_json,
                contestant.wc_pts,
                contestant.dv_pts,
                contestant.cc_pts,
                contestant.sb_pts,
            ],
        )
        .context("failed to insert contestant")?;

        if let Some(draft) = draft {
            let flipped = tx
                .execute(
                    "UPDATE leagues SET full = 1 WHERE id = ?1 AND full = 0",
                    params![draft.league_id],
                )
                .context("failed to mark league full")?;
            if flipped == 0 {
                return Ok(false);
            }
            let order_json =
                serde_json::to_string(&draft.order).context("failed to serialize draft order")?;
            tx.execute(
                "INSERT INTO drafts
                    (id, league_id, draft_order, size, rounds, direction,
                     current_round, current_pick_in_round, overall_pick, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    draft.id,
                    draft.league_id,
                    order_json,
                    draft.size,
                    draft.rounds,
                    direction_str(draft.direction),
                    draft.current_round,
                    draft.current_pick_in_round,
                    draft.overall_pick,
                    draft.completed,
                ],
            )
            .context("failed to insert draft")?;
        }

        tx.commit().context("failed to commit join")?;
        Ok(true)
    }

    /// Set one rostered player's points for a playoff round and re-tally the
    /// contestant's round score.
    ///
    /// The contestant is re-read inside the transaction and only the points
    /// change is applied, so a pick committed since the caller last loaded
    /// the contestant is kept. Returns the updated contestant.
    pub fn record_player_points(
        &self,
        contestant_id: &str,
        player_id: &str,
        round: ScoringRound,
        points: f64,
    ) -> Result<Contestant> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin scoring transaction")?;

        let Some(mut contestant) = contestant_by_id(&tx, contestant_id)? else {
            bail!("contestant {contestant_id} does not exist");
        };
        contestant.record_player_points(player_id, round, points)?;

        let roster_json =
            serde_json::to_string(&contestant.roster).context("failed to serialize roster")?;
        tx.execute(
            "UPDATE contestants
             SET roster = ?1, wc_pts = ?2, dv_pts = ?3, cc_pts = ?4, sb_pts = ?5
             WHERE id = ?6",
            params![
                roster_json,
                contestant.wc_pts,
                contestant.dv_pts,
                contestant.cc_pts,
                contestant.sb_pts,
                contestant.id,
            ],
        )
        .context("failed to update contestant scores")?;

        tx.commit().context("failed to commit scores")?;
        Ok(contestant)
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Load a league's draft with its results in pick order.
    pub fn load_draft(&self, league_id: &str) -> Result<Option<Draft>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, league_id, draft_order, size, rounds, direction,
                        current_round, current_pick_in_round, overall_pick, completed
                 FROM drafts WHERE league_id = ?1",
                params![league_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, u32>(6)?,
                        row.get::<_, u32>(7)?,
                        row.get::<_, u32>(8)?,
                        row.get::<_, bool>(9)?,
                    ))
                },
            )
            .optional()
            .context("failed to load draft")?;

        let Some((id, league_id, order_json, size, rounds, direction, round, pick, overall, completed)) =
            row
        else {
            return Ok(None);
        };

        let order: Vec<String> =
            serde_json::from_str(&order_json).context("failed to deserialize draft order")?;
        let direction = parse_direction(&direction)?;

        let mut stmt = conn
            .prepare(
                "SELECT pick_number, picking_team, player_id, player_name, position, team_id, team_name
                 FROM draft_results WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare draft results query")?;
        let results = stmt
            .query_map(params![id], |row| {
                Ok(DraftResult {
                    pick_number: row.get(0)?,
                    picking_team: row.get(1)?,
                    player_id: row.get(2)?,
                    player_name: row.get(3)?,
                    position: row.get(4)?,
                    team_id: row.get(5)?,
                    team_name: row.get(6)?,
                })
            })
            .context("failed to query draft results")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft result rows")?;

        Ok(Some(Draft {
            id,
            league_id,
            order,
            size,
            rounds,
            direction,
            current_round: round,
            current_pick_in_round: pick,
            overall_pick: overall,
            results,
            completed,
        }))
    }

    /// Commit one pick atomically: advance the draft, append the result,
    /// write the roster, and flip `drafted` if the draft just completed.
    ///
    /// The draft row is only advanced while it still stands at
    /// `expected_overall_pick`. Returns `false` without writing anything if
    /// another pick got there first.
    pub fn commit_pick(&self, outcome: &PickOutcome, expected_overall_pick: u32) -> Result<bool> {
        let draft = &outcome.draft;
        let contestant = &outcome.contestant;
        let result = &outcome.result;
        let picked = contestant
            .roster
            .slot(outcome.slot)
            .cloned()
            .with_context(|| format!("pick outcome left slot {} empty", outcome.slot))?;

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin pick transaction")?;

        let advanced = tx
            .execute(
                "UPDATE drafts
                 SET direction = ?1, current_round = ?2, current_pick_in_round = ?3,
                     overall_pick = ?4, completed = ?5
                 WHERE id = ?6 AND overall_pick = ?7 AND completed = 0",
                params![
                    direction_str(draft.direction),
                    draft.current_round,
                    draft.current_pick_in_round,
                    draft.overall_pick,
                    draft.completed,
                    draft.id,
                    expected_overall_pick,
                ],
            )
            .context("failed to advance draft")?;
        if advanced == 0 {
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO draft_results
                (draft_id, pick_number, contestant_id, picking_team, player_id,
                 player_name, position, team_id, team_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.id,
                result.pick_number,
                contestant.id,
                result.picking_team,
                result.player_id,
                result.player_name,
                result.position,
                result.team_id,
                result.team_name,
            ],
        )
        .context("failed to insert draft result")?;

        // Apply only the new slot to the roster as stored now.
        let Some(mut stored) = contestant_by_id(&tx, &contestant.id)? else {
            bail!("contestant {} does not exist", contestant.id);
        };
        stored.roster.place(outcome.slot, picked)?;
        let roster_json =
            serde_json::to_string(&stored.roster).context("failed to serialize roster")?;
        tx.execute(
            "UPDATE contestants SET roster = ?1 WHERE id = ?2",
            params![roster_json, contestant.id],
        )
        .context("failed to update roster")?;

        if outcome.league_drafted_now {
            tx.execute(
                "UPDATE leagues SET drafted = 1 WHERE id = ?1",
                params![draft.league_id],
            )
            .context("failed to mark league drafted")?;
        }

        tx.commit().context("failed to commit pick")?;
        Ok(true)
    }

    /// The contestant who made pick `pick_number` (1-based) of a draft.
    pub fn pick_contestant(&self, draft_id: &str, pick_number: u32) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT contestant_id FROM draft_results WHERE draft_id = ?1 AND pick_number = ?2",
            params![draft_id, pick_number],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up pick owner")
    }

    /// Leagues whose draft has started but not finished, with the number of
    /// picks made so far.
    pub fn drafts_in_progress(&self) -> Result<Vec<(String, u32)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT league_id, overall_pick FROM drafts
                 WHERE completed = 0 ORDER BY league_id",
            )
            .context("failed to prepare drafts_in_progress query")?;
        let drafts: Vec<(String, u32)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .context("failed to query drafts in progress")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft rows")?;
        Ok(drafts)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn contestant_by_id(conn: &Connection, contestant_id: &str) -> Result<Option<Contestant>> {
    let row = conn
        .query_row(
            "SELECT id, league_id, user_id, team_name, roster, wc_pts, dv_pts, cc_pts, sb_pts
             FROM contestants WHERE id = ?1",
            params![contestant_id],
            ContestantRow::from_row,
        )
        .optional()
        .context("failed to load contestant")?;
    row.map(ContestantRow::into_contestant).transpose()
}

fn row_to_player(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        player_id: row.get(0)?,
        player_name: row.get(1)?,
        position: row.get(2)?,
        team_id: row.get(3)?,
        team_name: row.get(4)?,
    })
}

/// Contestant columns before the roster JSON is decoded.
struct ContestantRow {
    id: String,
    league_id: String,
    user_id: String,
    team_name: String,
    roster_json: String,
    pts: [f64; 4],
}

impl ContestantRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(ContestantRow {
            id: row.get(0)?,
            league_id: row.get(1)?,
            user_id: row.get(2)?,
            team_name: row.get(3)?,
            roster_json: row.get(4)?,
            pts: [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
        })
    }

    fn into_contestant(self) -> Result<Contestant> {
        let roster: Roster = serde_json::from_str(&self.roster_json)
            .with_context(|| format!("failed to deserialize roster for contestant {}", self.id))?;
        let [wc_pts, dv_pts, cc_pts, sb_pts] = self.pts;
        Ok(Contestant {
            id: self.id,
            league_id: self.league_id,
            user_id: self.user_id,
            team_name: self.team_name,
            roster,
            wc_pts,
            dv_pts,
            cc_pts,
            sb_pts,
        })
    }
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    }
}

fn parse_direction(s: &str) -> Result<Direction> {
    match s {
        "forward" => Ok(Direction::Forward),
        "backward" => Ok(Direction::Backward),
        other => bail!("unknown draft direction `{other}` in database"),
    }
}
