use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone};

use crate::error::BotError;
use crate::models::{RawMatch, RawParticipant};

pub const TEAM_ONE_ID: i64 = 100;
pub const ROSTER_SIZE: usize = 5;
const SUPPORTED_QUEUE_MARKER: &str = "5x5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    TeamOne,
    TeamTwo,
}

impl Side {
    fn from_team_id(team_id: i64) -> Self {
        if team_id == TEAM_ONE_ID {
            Side::TeamOne
        } else {
            Side::TeamTwo
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::TeamOne => "Team 1",
            Side::TeamTwo => "Team 2",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStat {
    pub champion: String,
    pub champion_slug: String,
    pub side: Side,
    pub level: i64,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub gold: i64,
    pub minions_killed: i64,
    pub kda: String,
    pub spells: (Option<i64>, Option<i64>),
}

impl PlayerStat {
    fn from_participant(
        participant: &RawParticipant,
        champions: &HashMap<i64, String>,
    ) -> Result<Self, BotError> {
        let champion = champions
            .get(&participant.champion_id)
            .ok_or(BotError::UnknownChampion(participant.champion_id))?
            .clone();
        let stats = &participant.stats;
        Ok(PlayerStat {
            champion_slug: champion_slug(&champion),
            champion,
            side: Side::from_team_id(participant.team_id),
            level: stats.champ_level,
            kills: stats.kills,
            deaths: stats.deaths,
            assists: stats.assists,
            gold: stats.gold_earned,
            minions_killed: stats.minions_killed,
            kda: format!("{}/{}/{}", stats.kills, stats.deaths, stats.assists),
            spells: (participant.spell1_id, participant.spell2_id),
        })
    }
}

pub type Roster = [PlayerStat; ROSTER_SIZE];

#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub team_one: Roster,
    pub team_two: Roster,
    pub winner: Side,
    pub winner_kills: i64,
    pub loser_kills: i64,
    pub duration: String,
    pub created_at: DateTime<Local>,
    pub queue_type: String,
    pub match_mode: String,
}

impl MatchSummary {
    pub fn build(raw: &RawMatch, champions: &HashMap<i64, String>) -> Result<Self, BotError> {
        if !raw.queue_type.contains(SUPPORTED_QUEUE_MARKER) {
            return Err(BotError::UnsupportedQueueType(raw.queue_type.clone()));
        }

        let mut team_one = Vec::with_capacity(ROSTER_SIZE);
        let mut team_two = Vec::with_capacity(ROSTER_SIZE);
        for participant in &raw.participants {
            let player = PlayerStat::from_participant(participant, champions)?;
            match player.side {
                Side::TeamOne => team_one.push(player),
                Side::TeamTwo => team_two.push(player),
            }
        }
        let (team_one_len, team_two_len) = (team_one.len(), team_two.len());
        let unsupported = || BotError::UnsupportedMatchFormat {
            team_one: team_one_len,
            team_two: team_two_len,
        };
        let team_one: Roster = team_one.try_into().map_err(|_| unsupported())?;
        let team_two: Roster = team_two.try_into().map_err(|_| unsupported())?;

        let winner = match raw.teams.iter().find(|t| t.team_id == TEAM_ONE_ID) {
            Some(team) if team.winner => Side::TeamOne,
            Some(_) => Side::TeamTwo,
            None => return Err(BotError::AmbiguousResult),
        };

        let team_one_kills = team_kills(&team_one);
        let team_two_kills = team_kills(&team_two);
        let (winner_kills, loser_kills) = match winner {
            Side::TeamOne => (team_one_kills, team_two_kills),
            Side::TeamTwo => (team_two_kills, team_one_kills),
        };

        let created_at = Local
            .timestamp_millis_opt(raw.match_creation)
            .single()
            .ok_or_else(|| {
                BotError::MalformedResponse(format!(
                    "matchCreation {} is not a valid timestamp",
                    raw.match_creation
                ))
            })?;

        Ok(MatchSummary {
            team_one,
            team_two,
            winner,
            winner_kills,
            loser_kills,
            duration: format_duration(raw.match_duration),
            created_at,
            queue_type: raw.queue_type.clone(),
            match_mode: raw.match_mode.clone(),
        })
    }
}

pub fn team_kills(roster: &[PlayerStat]) -> i64 {
    roster.iter().map(|p| p.kills).sum()
}

/// `H:MM:SS`, hours unbounded.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, remainder) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (remainder / 60, remainder % 60);
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn champion_slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
