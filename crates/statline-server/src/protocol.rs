// JSON message types exchanged over the WebSocket.
//
// Every inbound text frame is one `Request`; every reply is one envelope:
// `{"ok":true,"data":...}` or `{"ok":false,"error":{"kind":...,"message":...}}`.

use serde::{Deserialize, Serialize};
use statline_engine::{ChartKind, StatsError};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Liveness probe.
    Health,

    /// Every record with derived metrics, or one player's seasons when
    /// `player_name` is set.
    Stats {
        #[serde(default)]
        player_name: Option<String>,
    },

    /// Distinct player names.
    Players,

    Chart {
        kind: ChartKind,
        #[serde(default)]
        season: Option<i32>,
        #[serde(default)]
        players: Vec<String>,
    },

    Compare {
        players: Vec<String>,
        #[serde(default)]
        season: Option<i32>,
    },
}

impl Request {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Health => "health",
            Request::Stats { .. } => "stats",
            Request::Players => "players",
            Request::Chart { .. } => "chart",
            Request::Compare { .. } => "compare",
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    /// The request itself could not be parsed.
    BadRequest,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Serialize `data` into a success envelope. A serialization failure
    /// becomes an `internal` error envelope.
    pub fn from_data<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::success(value),
            Err(e) => Self::failure(ErrorKind::Internal, format!("failed to encode response: {e}")),
        }
    }

    pub fn to_json(&self) -> String {
        // Response holds only strings, bools and JSON values; encoding
        // cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"ok":false,"error":{"kind":"internal","message":"failed to encode response"}}"#
                .to_string()
        })
    }
}

impl From<&StatsError> for ErrorKind {
    fn from(err: &StatsError) -> Self {
        match err {
            StatsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StatsError::NotFound(_) => ErrorKind::NotFound,
            StatsError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StatsError> for Response {
    fn from(err: StatsError) -> Self {
        Response::failure(ErrorKind::from(&err), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
