//! Records, the document they live in, and the mutation action table.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The unit of storage: every record, newest first.
pub type Document = Vec<Record>;

/// One question/feedback entry.
///
/// `id` and `created_at` never change after creation; `votes` and `hidden`
/// are the only fields a mutation touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Opaque unique id (UUIDv4 for records created here).
    pub id: String,
    /// Trimmed, non-empty text.
    pub text: String,
    /// Creation time, written as `2024-05-01T12:00:00.000Z`. Records stored
    /// without one read back as the Unix epoch.
    #[serde(default, with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    /// Upvote count. Missing or `null` reads as 0.
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u64,
    /// Hidden records are still listed; filtering is up to the client.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden: bool,
}

impl Record {
    /// Build a fresh record from raw client text.
    ///
    /// Fails with `text_required` if the text is empty after trimming.
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("text_required".into()));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_owned(),
            created_at: Utc::now(),
            votes: 0,
            hidden: false,
        })
    }

    /// Apply `action` in place.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Upvote => self.votes = self.votes.saturating_add(1),
            Action::SetHidden(hidden) => self.hidden = hidden,
        }
    }
}

fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// What a mutation does to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Add one vote.
    Upvote,
    /// Set the `hidden` flag to the given value.
    SetHidden(bool),
}

/// Every accepted action name. `mute`/`blind` and their inverses are an older
/// client vocabulary and stay in the table for good.
const ACTIONS: &[(&str, Action)] = &[
    ("upvote", Action::Upvote),
    ("hide", Action::SetHidden(true)),
    ("mute", Action::SetHidden(true)),
    ("blind", Action::SetHidden(true)),
    ("unhide", Action::SetHidden(false)),
    ("unmute", Action::SetHidden(false)),
    ("unblind", Action::SetHidden(false)),
];

impl Action {
    /// Look up an action by its wire name.
    pub fn parse(name: &str) -> Result<Self> {
        ACTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| *action)
            .ok_or_else(|| Error::UnknownAction(name.to_owned()))
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Serde adapter for `DateTime<Utc>` in the ISO-8601 millisecond form browsers
/// produce. Any RFC 3339 timestamp is accepted on the way in.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Unexpected, Deserialize, Deserializer, Serializer};

    /// Serialize as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Deserialize any RFC 3339 timestamp, normalized to UTC. `null` reads as
    /// the Unix epoch.
    pub fn deserialize<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(de)? else {
            return Ok(DateTime::UNIX_EPOCH);
        };
        DateTime::parse_from_rfc3339(&s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| {
                serde::de::Error::invalid_value(Unexpected::Str(&s), &"an RFC 3339 timestamp")
            })
    }
}
