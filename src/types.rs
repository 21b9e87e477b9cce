use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Splits a `Name:UserId` identifier as returned by the API.
fn split_identifier(value: &str) -> (&str, Option<u64>) {
    match value.rsplit_once(':') {
        Some((name, id)) => match id.parse() {
            Ok(id) => (name, Some(id)),
            Err(_) => (value, None),
        },
        None => (value, None),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerStatus {
    pub name: String,
    pub owner_id: u64,
    #[serde(default)]
    pub co_owner_ids: Vec<u64>,
    pub current_players: u32,
    pub max_players: u32,
    pub join_key: String,
    #[serde(default)]
    pub acc_verified_req: Option<String>,
    #[serde(default)]
    pub team_balance: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Player {
    /// `Name:UserId`.
    pub player: String,
    pub permission: String,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

impl Player {
    pub fn name(&self) -> &str {
        split_identifier(&self.player).0
    }

    pub fn user_id(&self) -> Option<u64> {
        split_identifier(&self.player).1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vehicle {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub texture: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Robbery {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub alarm: bool,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KillLog {
    pub killed: String,
    pub killer: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandLog {
    pub player: String,
    pub command: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModCall {
    pub caller: String,
    #[serde(default)]
    pub moderator: Option<String>,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RadioCall {
    pub author: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinLog {
    /// `true` for a join, `false` for a leave.
    pub join: bool,
    pub player: String,
    pub timestamp: i64,
}

impl JoinLog {
    pub fn player_name(&self) -> &str {
        split_identifier(&self.player).0
    }

    pub fn user_id(&self) -> Option<u64> {
        split_identifier(&self.player).1
    }
}

/// Banned user IDs mapped to their last known names.
pub type Bans = HashMap<String, String>;

/// Acknowledgment returned by the command endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub message: Option<String>,
}
