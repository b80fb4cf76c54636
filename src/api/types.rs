// ABOUTME: Response shapes of the backend REST endpoints the chat session consumes.
// ABOUTME: All fields are optional on the wire; callers apply defaults.

use serde::Deserialize;

/// `GET /api/players/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub player_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub character_name: Option<String>,
}

/// `GET /api/campaigns/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Campaign {
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub world_id: Option<i64>,
}

/// `POST /sessions/{id}/end`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EndSession {
    #[serde(default)]
    pub recap: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_ignores_extra_fields() {
        let player: Player = serde_json::from_str(
            r#"{"player_id":3,"name":"sam","character_name":"Aria","race":"elf","level":2}"#,
        )
        .unwrap();
        assert_eq!(player.character_name.as_deref(), Some("Aria"));
        assert_eq!(player.player_id, Some(3));
    }

    #[test]
    fn end_session_without_recap() {
        let end: EndSession = serde_json::from_str("{}").unwrap();
        assert_eq!(end.recap, None);
    }

    #[test]
    fn campaign_world_id() {
        let c: Campaign = serde_json::from_str(r#"{"campaign_id":1,"world_id":4}"#).unwrap();
        assert_eq!(c.world_id, Some(4));
    }
}
