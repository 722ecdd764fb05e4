//! Webhook payloads exchanged with the relay.
//!
//! The relay (the third-party service that actually hosts rooms) calls us
//! back when a room is created or closed. Its field names are PascalCase
//! (`GameId`, `UserId`, ...), so every field is renamed explicitly.
//!
//! Only `GameId` is required. It carries the room code we handed out
//! earlier. Everything else is informational and defaults when absent;
//! unknown fields are ignored so relay-side additions don't break us.

use serde::{Deserialize, Serialize};

use crate::{Code, ProtocolError};

// ---------------------------------------------------------------------------
// Create room
// ---------------------------------------------------------------------------

/// Options the creating client passed to the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    #[serde(rename = "MaxPlayers")]
    pub max_players: u32,
    #[serde(rename = "IsVisible")]
    pub is_visible: bool,
    #[serde(rename = "LobbyType")]
    pub lobby_type: u32,
    #[serde(rename = "EmptyRoomTTL")]
    pub empty_room_ttl: u32,
    #[serde(rename = "PlayerTTL")]
    pub player_ttl: u32,
    #[serde(rename = "CheckUserOnJoin")]
    pub check_user_on_join: bool,
    #[serde(rename = "DeleteCacheOnLeave")]
    pub delete_cache_on_leave: bool,
    #[serde(rename = "SuppressRoomEvents")]
    pub suppress_room_events: bool,
    #[serde(rename = "PublishUserId")]
    pub publish_user_id: bool,
}

/// Body of the "room created" webhook.
///
/// Sent by the relay after a client created a room named after a code it
/// got from `/room/gen_code`. Receiving it confirms the allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// The room name, which is the room code in its string form.
    #[serde(rename = "GameId")]
    pub game_id: String,

    #[serde(rename = "ActorNr", default)]
    pub actor_nr: i32,

    #[serde(rename = "AppVersion", default)]
    pub app_version: String,

    #[serde(rename = "AppId", default)]
    pub app_id: String,

    #[serde(rename = "CreateOptions", default)]
    pub create_options: CreateOptions,

    #[serde(rename = "Region", default)]
    pub region: String,

    /// Webhook type as reported by the relay (e.g. `"Create"`).
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "UserId", default)]
    pub user_id: String,

    #[serde(rename = "Nickname", default)]
    pub nickname: String,
}

impl CreateRoomRequest {
    /// Parses `GameId` into a [`Code`].
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCode`] if the game id is not a
    /// four-digit code.
    pub fn code(&self) -> Result<Code, ProtocolError> {
        self.game_id.parse()
    }
}

// ---------------------------------------------------------------------------
// Close room
// ---------------------------------------------------------------------------

/// Body of the "room closed" webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseRoomRequest {
    /// The room name, which is the room code in its string form.
    #[serde(rename = "GameId")]
    pub game_id: String,

    /// Players still in the room when it closed (normally 0).
    #[serde(rename = "ActorCount", default)]
    pub actor_count: u32,

    #[serde(rename = "AppVersion", default)]
    pub app_version: String,

    #[serde(rename = "AppId", default)]
    pub app_id: String,

    #[serde(rename = "Region", default)]
    pub region: String,

    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl CloseRoomRequest {
    /// Parses `GameId` into a [`Code`].
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCode`] if the game id is not a
    /// four-digit code.
    pub fn code(&self) -> Result<Code, ProtocolError> {
        self.game_id.parse()
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Acknowledgement the relay expects from a webhook.
///
/// `ResultCode: 0` tells the relay the webhook succeeded. The relay treats
/// anything else as a failure and may refuse to create the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
}

impl WebhookResponse {
    /// The success acknowledgement: `{"State":"","ResultCode":0}`.
    pub fn ok() -> Self {
        Self {
            state: String::new(),
            result_code: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_full_payload_deserializes() {
        let json = r#"{
            "ActorNr": 1,
            "AppVersion": "1.0",
            "AppId": "app",
            "CreateOptions": {
                "MaxPlayers": 4,
                "IsVisible": true,
                "LobbyId": null,
                "LobbyType": 0,
                "CustomProperties": {},
                "EmptyRoomTTL": 0,
                "PlayerTTL": 0,
                "CheckUserOnJoin": false,
                "DeleteCacheOnLeave": true,
                "SuppressRoomEvents": false,
                "PublishUserId": false,
                "ExpectedUsers": null
            },
            "GameId": "0815",
            "Region": "eu",
            "Type": "Create",
            "UserId": "user-1",
            "Nickname": "nick"
        }"#;

        let req: CreateRoomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.game_id, "0815");
        assert_eq!(req.user_id, "user-1");
        assert_eq!(req.create_options.max_players, 4);
        assert!(req.create_options.delete_cache_on_leave);
        assert_eq!(req.code().unwrap().value(), 815);
    }

    #[test]
    fn test_create_room_bad_game_id_is_invalid_code() {
        let req: CreateRoomRequest =
            serde_json::from_str(r#"{"GameId":"my room"}"#).unwrap();
        assert!(matches!(req.code(), Err(ProtocolError::InvalidCode(_))));
    }

    #[test]
    fn test_close_room_defaults_optional_fields() {
        let req: CloseRoomRequest =
            serde_json::from_str(r#"{"GameId":"0001"}"#).unwrap();
        assert_eq!(req.actor_count, 0);
        assert_eq!(req.region, "");
        assert_eq!(req.code().unwrap().to_string(), "0001");
    }

    #[test]
    fn test_webhook_response_ok_shape() {
        let json = serde_json::to_string(&WebhookResponse::ok()).unwrap();
        assert_eq!(json, r#"{"State":"","ResultCode":0}"#);
    }
}
