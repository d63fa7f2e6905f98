//! Comments, votes, discussion proxies, and notifications.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub parent: Option<i64>,
    #[serde(default)]
    pub user: i64,
    pub user_role: Option<String>,
    /// Step id the comment belongs to.
    #[serde(default)]
    pub target: i64,
    #[serde(default)]
    pub text: String,
    pub time: Option<String>,
    #[serde(default)]
    pub replies: Vec<i64>,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_pinned: bool,
    pub vote: Option<String>,
    #[serde(default)]
    pub epic_count: i64,
    #[serde(default)]
    pub abuse_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    /// `None` removes the user's vote.
    pub value: Option<VoteValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscussionProxy {
    pub id: String,
    #[serde(default)]
    pub discussions: Vec<i64>,
    #[serde(default)]
    pub discussions_most_liked: Vec<i64>,
    #[serde(default)]
    pub discussions_most_active: Vec<i64>,
    #[serde(default)]
    pub discussions_recent_activity: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: Option<i64>,
    pub is_unread: Option<bool>,
    pub is_muted: Option<bool>,
    pub is_favorite: Option<bool>,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub level: Option<String>,
    pub priority: Option<String>,
    pub html_text: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
}

/// Notification filter. `All` sends no type filter at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    All,
    Learn,
    Comments,
    Review,
    Teach,
    Other,
}

impl NotificationCategory {
    pub fn type_filter(self) -> Option<&'static str> {
        match self {
            NotificationCategory::All => None,
            NotificationCategory::Learn => Some("learn"),
            NotificationCategory::Comments => Some("comments"),
            NotificationCategory::Review => Some("review"),
            NotificationCategory::Teach => Some("teach"),
            NotificationCategory::Other => Some("other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_category_has_no_filter() {
        assert_eq!(NotificationCategory::All.type_filter(), None);
        assert_eq!(NotificationCategory::Comments.type_filter(), Some("comments"));
    }

    #[test]
    fn test_vote_serializes_null_value() {
        let vote = Vote {
            id: "12-34".into(),
            value: None,
        };
        assert_eq!(
            serde_json::to_value(&vote).unwrap(),
            serde_json::json!({"id": "12-34", "value": null})
        );
        let like: Vote = serde_json::from_str(r#"{"id": "1", "value": "like"}"#).unwrap();
        assert_eq!(like.value, Some(VoteValue::Like));
    }
}
