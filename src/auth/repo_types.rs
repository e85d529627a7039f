use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// How many previous password hashes are remembered.
pub const PASSWORD_HISTORY_LEN: usize = 3;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Most recent first, at most `PASSWORD_HISTORY_LEN` entries.
    #[serde(skip_serializing)]
    pub password_history: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// History after retiring the current hash: current pushed to the front, oldest dropped.
    pub fn rotated_history(&self) -> Vec<String> {
        std::iter::once(self.password_hash.clone())
            .chain(self.password_history.iter().cloned())
            .take(PASSWORD_HISTORY_LEN)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(hash: &str, history: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: hash.into(),
            password_history: history.iter().map(|s| s.to_string()).collect(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn rotated_history_keeps_three_most_recent() {
        let u = user_with("h4", &["h3", "h2", "h1"]);
        assert_eq!(u.rotated_history(), vec!["h4", "h3", "h2"]);
    }

    #[test]
    fn rotated_history_from_empty() {
        let u = user_with("h1", &[]);
        assert_eq!(u.rotated_history(), vec!["h1"]);
    }

    #[test]
    fn hashes_are_not_serialized() {
        let json = serde_json::to_string(&user_with("secret-hash", &["old"])).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("old"));
    }
}
