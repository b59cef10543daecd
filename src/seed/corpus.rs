use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::SeedError;
use crate::user::User;

/// Date layouts found in the corpus files, tried in order.
pub const CORPUS_DATETIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";
pub const CORPUS_DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct CorpusFile<T> {
    objects: Vec<T>,
}

/// Every field is required; a missing one fails the load.
#[derive(Debug, Clone, Deserialize)]
pub struct UserTemplate {
    pub email: String,
    pub last_name: String,
    pub country: String,
    pub city: String,
    pub gender: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameTemplate {
    pub points_gained: i64,
    pub win_status: i8,
    pub game_type: i8,
    pub created: String,
}

pub fn parse_corpus_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, CORPUS_DATETIME_FORMAT) {
        return Some(at.and_utc());
    }
    CORPUS_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

/// Seed input: parsed users plus the game templates batches are sampled from.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub users: Vec<User>,
    pub games: Vec<GameTemplate>,
    games_path: PathBuf,
}

impl Corpus {
    pub fn new(users: Vec<User>, games: Vec<GameTemplate>) -> Self {
        Self {
            users,
            games,
            games_path: PathBuf::from("<memory>"),
        }
    }

    pub async fn load(
        users_path: impl AsRef<Path>,
        games_path: impl AsRef<Path>,
    ) -> Result<Self, SeedError> {
        let users_path = users_path.as_ref();
        let games_path = games_path.as_ref();

        let users = read_objects::<UserTemplate>(users_path)
            .await?
            .into_iter()
            .enumerate()
            .map(|(idx, template)| user_from_template(template).map_err(|reason| {
                SeedError::corpus(users_path, format!("object {}: {}", idx, reason))
            }))
            .collect::<Result<Vec<_>, _>>()?;

        let games = read_objects::<GameTemplate>(games_path).await?;
        if games.is_empty() {
            return Err(SeedError::corpus(games_path, "no game objects to sample from"));
        }

        Ok(Self {
            users,
            games,
            games_path: games_path.to_path_buf(),
        })
    }

    pub fn games_path(&self) -> &Path {
        &self.games_path
    }
}

async fn read_objects<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SeedError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| SeedError::corpus(path, err))?;
    let file: CorpusFile<T> =
        serde_json::from_slice(&bytes).map_err(|err| SeedError::corpus(path, err))?;
    Ok(file.objects)
}

fn user_from_template(template: UserTemplate) -> Result<User, String> {
    let birth_date = parse_corpus_date(&template.birth_date)
        .ok_or_else(|| format!("unrecognised birth_date '{}'", template.birth_date))?;
    Ok(User {
        id: None,
        email: template.email,
        last_name: template.last_name,
        country: template.country,
        city: template.city,
        gender: template.gender,
        birth_date,
        rating: 0,
    })
}
