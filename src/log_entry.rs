use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub rating: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "visitDate")]
    pub visit_date: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Create payload for `POST /api/logs`. The API key travels in the
/// `X-API-KEY` header, never in this body.
#[derive(Debug, Clone, Serialize)]
pub struct NewLogEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub rating: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "visitDate")]
    pub visit_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_entry() {
        let json = r#"{
            "_id": "64f1c0ffee",
            "title": "Eiffel Tower",
            "rating": 9,
            "latitude": 48.8584,
            "longitude": 2.2945,
            "visitDate": "2024-05-01T00:00:00.000Z",
            "createdAt": "2024-05-02T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00.000Z"
        }"#;

        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "64f1c0ffee");
        assert_eq!(entry.title, "Eiffel Tower");
        assert_eq!(entry.rating, 9.0);
        assert_eq!(entry.description, None);
        assert_eq!(entry.visit_date, "2024-05-01T00:00:00.000Z");
    }

    #[test]
    fn new_entry_uses_wire_names_and_omits_empty_fields() {
        let entry = NewLogEntry {
            title: "Eiffel Tower".to_string(),
            description: None,
            comments: None,
            image: None,
            rating: 9.0,
            latitude: 48.8584,
            longitude: 2.2945,
            visit_date: "2024-05-01".to_string(),
        };

        let value = serde_json::to_value(&entry).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["title"], "Eiffel Tower");
        assert_eq!(object["visitDate"], "2024-05-01");
        assert!(!object.contains_key("description"));
        assert!(!object.contains_key("comments"));
        assert!(!object.contains_key("image"));
        assert!(!object.contains_key("apiKey"));
        assert!(!object.contains_key("_id"));
    }
}
