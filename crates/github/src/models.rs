//! Wire shapes of the GitHub REST responses this adapter reads.
//!
//! Only the fields the census needs are declared; serde ignores the rest.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectPayload {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColumnPayload {
    pub id: u64,
    pub name: String,
}

/// A project card. Note-only cards have no `content_url`.
#[derive(Debug, Deserialize)]
pub(crate) struct CardPayload {
    pub id: u64,
    #[serde(default)]
    pub content_url: Option<String>,
}

/// The issue (or pull request) behind a card.
#[derive(Debug, Deserialize)]
pub(crate) struct IssuePayload {
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelPayload {
    pub id: u64,
    pub name: String,
}

/// Body GitHub sends with most error statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_card_has_no_content_url() {
        let card: CardPayload =
            serde_json::from_str(r#"{"id": 7, "note": "remember the milk", "archived": false}"#)
                .unwrap();
        assert_eq!(card.id, 7);
        assert!(card.content_url.is_none());
    }

    #[test]
    fn test_issue_labels_ignore_extra_fields() {
        let issue: IssuePayload = serde_json::from_str(
            r#"{
                "number": 12,
                "title": "Speed up sync",
                "labels": [
                    {"id": 1, "name": "backend", "color": "ededed", "default": false},
                    {"id": 2, "name": "size:M", "color": "c2e0c6", "default": false}
                ]
            }"#,
        )
        .unwrap();
        let names: Vec<_> = issue.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["backend", "size:M"]);
    }

    #[test]
    fn test_issue_without_labels_field() {
        let issue: IssuePayload = serde_json::from_str(r#"{"number": 3}"#).unwrap();
        assert!(issue.labels.is_empty());
    }
}
