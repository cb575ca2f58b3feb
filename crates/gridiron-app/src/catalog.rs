// Player catalog loading from CSV.
//
// Expected header: player_id,player_name,position,team_id,team_name.
// `id`, `name`, `pos` and `team` are accepted as short column names.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use gridiron_core::Player;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Raw CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawCatalogRow {
    #[serde(alias = "id")]
    player_id: String,
    #[serde(alias = "name")]
    player_name: String,
    #[serde(alias = "pos")]
    position: String,
    #[serde(alias = "team")]
    team_id: String,
    #[serde(default)]
    team_name: String,
}

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for result in reader.deserialize::<RawCatalogRow>() {
        match result {
            Ok(raw) => {
                if raw.player_id.is_empty() {
                    warn!("skipping player '{}': missing player_id", raw.player_name);
                    continue;
                }
                let player = Player {
                    player_id: raw.player_id,
                    player_name: raw.player_name,
                    position: raw.position,
                    team_name: if raw.team_name.is_empty() {
                        raw.team_id.clone()
                    } else {
                        raw.team_name
                    },
                    team_id: raw.team_id,
                };
                if player.parsed_position().is_none() {
                    warn!(
                        "skipping player '{}': undraftable position '{}'",
                        player.player_name, player.position
                    );
                    continue;
                }
                if !seen.insert(player.player_id.clone()) {
                    warn!("skipping duplicate player_id '{}'", player.player_id);
                    continue;
                }
                players.push(player);
            }
            Err(e) => {
                warn!("skipping malformed catalog row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load the player catalog from a CSV file. Fails if no row is usable.
pub fn load_players(path: &Path) -> Result<Vec<Player>, CatalogError> {
    let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_players_from_reader(file).map_err(|e| CatalogError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if players.is_empty() {
        return Err(CatalogError::Validation(format!(
            "{} produced zero valid players",
            path.display()
        )));
    }
    Ok(players)
}
