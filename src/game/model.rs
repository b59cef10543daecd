use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Document, ID_FIELD, RecordId, Result, StoreError};

/// Owning-user reference. The index, the inserts and every query use this
/// one name.
pub const USER_ID_FIELD: &str = "user_id";
pub const CREATED_FIELD: &str = "created";
pub const GAME_TYPE_FIELD: &str = "game_type";
pub const POINTS_GAINED_FIELD: &str = "points_gained";
pub const WIN_STATUS_FIELD: &str = "win_status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub points_gained: i64,
    pub win_status: i8,
    pub game_type: i8,
    pub created: DateTime<Utc>,
    pub user_id: RecordId,
}

impl Game {
    pub fn into_document(self) -> Document {
        let mut doc = Document::new()
            .with(POINTS_GAINED_FIELD, self.points_gained)
            .with(WIN_STATUS_FIELD, self.win_status)
            .with(GAME_TYPE_FIELD, self.game_type)
            .with(CREATED_FIELD, self.created)
            .with(USER_ID_FIELD, self.user_id);
        if let Some(id) = self.id {
            doc.set(ID_FIELD, id);
        }
        doc
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(Self {
            id: doc.id(),
            points_gained: doc.get_i64(POINTS_GAINED_FIELD)?,
            win_status: doc.get_i8(WIN_STATUS_FIELD)?,
            game_type: doc.get_i8(GAME_TYPE_FIELD)?,
            created: doc.get_timestamp(CREATED_FIELD)?,
            user_id: doc.get_id(USER_ID_FIELD)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub games_played: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTypeCount {
    pub date: String,
    pub game_type: i8,
    pub games_played: i64,
}

/// Two groupings of one filtered game set: per day, and per (day, game type).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamesStatistics {
    pub group_by_day: Vec<DayCount>,
    pub with_game_type: Vec<DayTypeCount>,
}

impl GamesStatistics {
    pub const GROUP_BY_DAY: &'static str = "group_by_day";
    pub const WITH_GAME_TYPE: &'static str = "with_game_type";
    pub const DATE: &'static str = "date";
    pub const GAMES_PLAYED: &'static str = "games_played";

    pub fn is_empty(&self) -> bool {
        self.group_by_day.is_empty() && self.with_game_type.is_empty()
    }

    pub fn total_by_day(&self) -> i64 {
        self.group_by_day.iter().map(|row| row.games_played).sum()
    }

    pub fn total_with_game_type(&self) -> i64 {
        self.with_game_type.iter().map(|row| row.games_played).sum()
    }

    /// Decodes the single document a statistics facet produces.
    pub fn from_facet(doc: &Document) -> Result<Self> {
        let group_by_day = rows(doc, Self::GROUP_BY_DAY)?
            .into_iter()
            .map(|row| {
                Ok(DayCount {
                    date: row.get_str(Self::DATE)?.to_string(),
                    games_played: row.get_i64(Self::GAMES_PLAYED)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let with_game_type = rows(doc, Self::WITH_GAME_TYPE)?
            .into_iter()
            .map(|row| {
                Ok(DayTypeCount {
                    date: row.get_str(Self::DATE)?.to_string(),
                    game_type: row.get_i8(GAME_TYPE_FIELD)?,
                    games_played: row.get_i64(Self::GAMES_PLAYED)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            group_by_day,
            with_game_type,
        })
    }
}

fn rows<'a>(doc: &'a Document, field: &str) -> Result<Vec<&'a Document>> {
    doc.get_array(field)?
        .iter()
        .map(|value| {
            value.as_document().ok_or_else(|| {
                StoreError::TypeMismatch(format!(
                    "'{}' rows must be documents, found {}",
                    field,
                    value.type_name()
                ))
            })
        })
        .collect()
}
