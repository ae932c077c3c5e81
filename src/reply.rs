use crate::match_summary::{MatchSummary, PlayerStat, Roster};

const TABLE_HEADER: &str = "Champion | Level | Name | KDA | Gold | CS\n:---:|---|----|----|----|----\n";

fn table_row(player: &PlayerStat) -> String {
    format!(
        "[](/{}) | {} | {} | {} | {} | {}\n",
        player.champion_slug,
        player.level,
        player.champion,
        player.kda,
        player.gold,
        player.minions_killed
    )
}

fn team_section(title: &str, roster: &Roster) -> String {
    let rows: String = roster.iter().map(table_row).collect();
    format!("***{}***\n\n{}{}", title, TABLE_HEADER, rows)
}

/// Renders the reply posted under a triggering comment.
pub fn render(summary: &MatchSummary) -> String {
    format!(
        "***Winner: {}***\n\n{} - {}\n\n{}\n{}",
        summary.winner.label(),
        summary.winner_kills,
        summary.loser_kills,
        team_section("Team 1", &summary.team_one),
        team_section("Team 2", &summary.team_two),
    )
}
