use serde::{Deserialize, Serialize};

/// A registered user as clients see it. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Server-side user row, including the bcrypt hash. Deliberately not `Serialize`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub username: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub username: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Optional narrowing for post listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub search: Option<String>,
    pub author_id: Option<String>,
}

/// Partial update for a post; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_with_mongo_style_id() {
        let user = User {
            id: "u1".into(),
            username: "a".into(),
            email: "a@x.com".into(),
            created_at: "2025-01-01T00:00:00.000Z".into(),
            updated_at: "2025-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["createdAt"], "2025-01-01T00:00:00.000Z");
        assert!(json.get("id").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn post_filter_reads_camel_case_query() {
        let filter: PostFilter =
            serde_json::from_str(r#"{"search":"rust","authorId":"u1"}"#).unwrap();
        assert_eq!(filter.search.as_deref(), Some("rust"));
        assert_eq!(filter.author_id.as_deref(), Some("u1"));
    }
}
