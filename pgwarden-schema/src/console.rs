use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NO_RESULTS_MESSAGE: &str = "No results found";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleRequest {
    pub command: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleResponse {
    /// One JSON object per row, keyed by column name.
    pub rows: Vec<Map<String, Value>>,
    pub row_count: usize,
    /// Set when the row cap cut the result short.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConsoleResponse {
    pub fn from_rows(rows: Vec<Map<String, Value>>, truncated: bool) -> Self {
        let message = rows.is_empty().then(|| NO_RESULTS_MESSAGE.to_string());
        Self {
            row_count: rows.len(),
            rows,
            truncated,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_result_carries_no_results_message() {
        let body = serde_json::to_value(ConsoleResponse::from_rows(Vec::new(), false)).unwrap();
        assert_eq!(
            body,
            json!({"rows": [], "rowCount": 0, "truncated": false, "message": "No results found"})
        );
    }

    #[test]
    fn non_empty_result_omits_message() {
        let mut row = Map::new();
        row.insert("title".to_string(), json!("Alien"));
        let body = serde_json::to_value(ConsoleResponse::from_rows(vec![row], true)).unwrap();
        assert_eq!(body["rowCount"], json!(1));
        assert_eq!(body["truncated"], json!(true));
        assert!(body.get("message").is_none());
    }
}
