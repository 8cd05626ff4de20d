use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tóm tắt người dùng như backend trả về (tác giả, người nhận, thành viên).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Reference to a file already stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub hash: String,
}

/// A single message posted into a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: UserSummary,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Denormalized "last comment" shown in the thread list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPreview {
    pub id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<UserSummary>,
}

/// Thread (backend name: comment group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentGroup {
    pub id: i64,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recipients: Vec<UserSummary>,
    #[serde(default)]
    pub last_comment: Option<CommentPreview>,
}

impl CommentGroup {
    pub fn title(&self) -> String {
        let preview = self
            .last_comment
            .as_ref()
            .and_then(|comment| comment.subject.clone().or_else(|| comment.message.clone()))
            .filter(|text| !text.trim().is_empty());
        match preview {
            Some(text) => text,
            None => self
                .recipients
                .iter()
                .map(|recipient| recipient.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Response of the "create thread" endpoint; only the hash is used.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedThread {
    pub hash: String,
}

/// One page of the thread list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    #[serde(default)]
    pub items: Vec<CommentGroup>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl ThreadPage {
    /// Whether a page after `page` exists, given the requested page size.
    /// A reported `perPage` of zero is ignored.
    pub fn has_next(&self, page: u32, per_page: u32) -> bool {
        let per_page = self.per_page.filter(|&size| size > 0).unwrap_or(per_page);
        if per_page == 0 {
            return false;
        }
        match self.total {
            Some(total) => u64::from(page) * u64::from(per_page) < total,
            None => self.items.len() as u64 >= u64::from(per_page),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextCursor {
    #[serde(default)]
    pub before_id: Option<i64>,
}

/// One page of a cursor-paginated listing, newest first.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<NextCursor>,
}

impl<T> Page<T> {
    pub fn next_before_id(&self) -> Option<i64> {
        self.next_cursor.as_ref().and_then(|cursor| cursor.before_id)
    }
}

pub type CommentPage = Page<Comment>;

/// Project detail; only the parts needed to build the recipient list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: i64,
    pub hash: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub owner: Option<UserSummary>,
    #[serde(default)]
    pub members: Vec<UserSummary>,
}

impl ProjectDetail {
    /// Owner first, then members, without repeats.
    pub fn recipient_candidates(&self) -> Vec<Recipient> {
        let mut recipients: Vec<Recipient> = Vec::new();
        for user in self.owner.iter().chain(self.members.iter()) {
            if recipients.iter().any(|recipient| recipient.id == user.id) {
                continue;
            }
            recipients.push(Recipient::from(user));
        }
        recipients
    }
}

/// Người nhận có thể chọn khi tạo thread mới.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub selected: bool,
}

impl From<&UserSummary> for Recipient {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            selected: false,
        }
    }
}

/// JSON body of a comment post (also the `data` part of multipart posts).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_page_parses_cursor() {
        let json = r#"{
            "items": [{
                "id": 7,
                "slug": "c-7",
                "message": "hi",
                "createdAt": "2024-03-01T10:00:00Z",
                "author": {"id": 1, "name": "Ana"},
                "attachments": [{"url": "https://cdn/x.png", "type": "image/png", "hash": "abc"}]
            }],
            "nextCursor": {"beforeId": 7}
        }"#;
        let page: CommentPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].attachments[0].kind, "image/png");
        assert_eq!(page.next_before_id(), Some(7));
    }

    #[test]
    fn missing_cursor_means_end_of_data() {
        let page: CommentPage = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(page.next_before_id(), None);

        let page: CommentPage =
            serde_json::from_str(r#"{"items": [], "nextCursor": {"beforeId": null}}"#).unwrap();
        assert_eq!(page.next_before_id(), None);
    }

    #[test]
    fn thread_page_has_next_uses_total_or_page_size() {
        let page = ThreadPage {
            items: Vec::new(),
            page: Some(1),
            per_page: Some(20),
            total: Some(41),
        };
        assert!(page.has_next(2, 20));
        assert!(!page.has_next(3, 20));

        let page = ThreadPage::default();
        assert!(!page.has_next(1, 20));
    }

    #[test]
    fn zero_page_size_falls_back_to_requested() {
        let page = ThreadPage {
            items: Vec::new(),
            page: Some(3),
            per_page: Some(0),
            total: Some(45),
        };
        assert!(!page.has_next(3, 20));
        assert!(page.has_next(2, 20));
        assert!(!page.has_next(1, 0));
    }

    #[test]
    fn recipients_are_owner_then_unique_members() {
        let project = ProjectDetail {
            id: 1,
            hash: "p1".into(),
            title: "Rocket".into(),
            owner: Some(UserSummary {
                id: 1,
                name: "Owner".into(),
                email: None,
            }),
            members: vec![
                UserSummary {
                    id: 2,
                    name: "Dev".into(),
                    email: Some("dev@example.com".into()),
                },
                UserSummary {
                    id: 1,
                    name: "Owner".into(),
                    email: None,
                },
            ],
        };
        let recipients = project.recipient_candidates();
        assert_eq!(
            recipients.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(recipients.iter().all(|r| !r.selected));
    }

    #[test]
    fn payload_omits_empty_fields() {
        let payload = CommentPayload {
            subject: None,
            message: Some("hello".into()),
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"message":"hello"}"#
        );
    }
}
