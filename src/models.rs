use std::collections::HashMap;

use serde_derive::Deserialize;

/// The parts of a Riot match payload we actually read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub participants: Vec<RawParticipant>,
    pub teams: Vec<RawTeam>,
    pub match_duration: i64,
    pub match_creation: i64,
    pub queue_type: String,
    pub match_mode: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipant {
    pub champion_id: i64,
    pub team_id: i64,
    #[serde(default)]
    pub spell1_id: Option<i64>,
    #[serde(default)]
    pub spell2_id: Option<i64>,
    pub stats: RawParticipantStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipantStats {
    pub champ_level: i64,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub gold_earned: i64,
    pub minions_killed: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    pub team_id: i64,
    pub winner: bool,
}

/// Static data listing, shared by the champion and summoner-spell endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticDataList {
    pub data: HashMap<String, StaticDataEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticDataEntry {
    pub id: i64,
    pub name: String,
}

impl StaticDataList {
    pub fn into_id_map(self) -> HashMap<i64, String> {
        self.data
            .into_values()
            .map(|entry| (entry.id, entry.name))
            .collect()
    }
}

/// A comment as handed to the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
pub struct ListingChild {
    pub kind: String,
    pub data: ListingComment,
}

#[derive(Debug, Deserialize)]
pub struct ListingComment {
    pub id: String,
    #[serde(default)]
    pub body: String,
}

impl Listing {
    pub fn into_comments(self) -> Vec<Comment> {
        self.data
            .children
            .into_iter()
            .filter(|child| child.kind == "t1")
            .map(|child| Comment {
                id: child.data.id,
                body: child.data.body,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

/// Body of `POST /api/comment` with `api_type=json`.
#[derive(Debug, Deserialize)]
pub struct CommentReply {
    pub json: CommentReplyJson,
}

#[derive(Debug, Deserialize)]
pub struct CommentReplyJson {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub ratelimit: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_match_ignores_unknown_fields() {
        let raw: RawMatch = serde_json::from_str(
            r#"{
                "matchId": 1234567890,
                "region": "NA",
                "matchDuration": 1800,
                "matchCreation": 1431000000000,
                "queueType": "RANKED_SOLO_5x5",
                "matchMode": "CLASSIC",
                "teams": [{"teamId": 100, "winner": true, "baronKills": 1}],
                "participants": [{
                    "championId": 36,
                    "teamId": 100,
                    "spell1Id": 4,
                    "stats": {
                        "champLevel": 18,
                        "kills": 3,
                        "deaths": 1,
                        "assists": 7,
                        "goldEarned": 12000,
                        "minionsKilled": 210,
                        "wardsPlaced": 9
                    }
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.participants.len(), 1);
        assert_eq!(raw.participants[0].spell1_id, Some(4));
        assert_eq!(raw.participants[0].spell2_id, None);
        assert_eq!(raw.participants[0].stats.minions_killed, 210);
        assert_eq!(raw.teams[0], RawTeam { team_id: 100, winner: true });
        assert_eq!(raw.queue_type, "RANKED_SOLO_5x5");
    }

    #[test]
    fn test_raw_match_missing_field_is_an_error() {
        let result = serde_json::from_str::<RawMatch>(r#"{"participants": [], "teams": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_static_data_into_id_map() {
        let list: StaticDataList = serde_json::from_str(
            r#"{
                "type": "champion",
                "version": "5.9.1",
                "data": {
                    "DrMundo": {"id": 36, "key": "DrMundo", "name": "Dr. Mundo", "title": "the Madman of Zaun"},
                    "Aatrox": {"id": 266, "key": "Aatrox", "name": "Aatrox", "title": "the Darkin Blade"}
                }
            }"#,
        )
        .unwrap();
        let map = list.into_id_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&36), Some(&"Dr. Mundo".to_string()));
        assert_eq!(map.get(&266), Some(&"Aatrox".to_string()));
    }

    #[test]
    fn test_listing_keeps_only_comments() {
        let listing: Listing = serde_json::from_str(
            r#"{
                "kind": "Listing",
                "data": {
                    "after": null,
                    "children": [
                        {"kind": "t1", "data": {"id": "abc", "body": "match 1234567890"}},
                        {"kind": "t3", "data": {"id": "post"}},
                        {"kind": "t1", "data": {"id": "def", "body": "hello"}}
                    ]
                }
            }"#,
        )
        .unwrap();
        let comments = listing.into_comments();
        assert_eq!(
            comments,
            vec![
                Comment { id: "abc".to_string(), body: "match 1234567890".to_string() },
                Comment { id: "def".to_string(), body: "hello".to_string() },
            ]
        );
    }
}
