//! AnkiConnect client
//!
//! Thin typed wrapper over the AnkiConnect JSON-RPC endpoint. Note and model
//! payloads are passed through as JSON; this layer only frames requests and
//! maps errors.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// AnkiConnect API version spoken by this client
const API_VERSION: u32 = 6;

/// Default AnkiConnect port
pub const DEFAULT_PORT: u16 = 8765;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// AnkiConnect URL on localhost for the given port
pub fn local_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

#[derive(Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Options attached to a note on creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

/// Note payload for addNote / addNotes / canAddNotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSpec {
    pub deck_name: String,
    pub model_name: String,
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub options: NoteOptions,
}

/// Card template for createModel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardTemplate {
    pub name: String,
    pub front: String,
    pub back: String,
}

/// Styling of a note type
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelStyling {
    #[serde(default)]
    pub css: String,
}

/// Client for the AnkiConnect API
#[derive(Debug, Clone)]
pub struct AnkiClient {
    url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl AnkiClient {
    /// Create a client for the given endpoint URL
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url).map_err(|e| Error::InvalidParams {
            reason: format!("invalid AnkiConnect URL {}: {}", url, e),
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpRequest)?;

        Ok(Self { url, timeout, http })
    }

    /// Create a client for AnkiConnect on localhost
    pub fn with_port(port: u16) -> Result<Self> {
        Self::new(local_url(port), DEFAULT_TIMEOUT)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke an AnkiConnect action and decode its result
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };

        tracing::debug!(action, "invoking AnkiConnect");

        let response: Response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(reason) = response.error {
            tracing::debug!(action, error = %reason, "AnkiConnect returned an error");
            return Err(Error::AnkiConnect { reason });
        }

        Ok(serde_json::from_value(response.result)?)
    }

    /// Verify Anki is running and AnkiConnect answers
    pub async fn check_connection(&self) -> Result<()> {
        self.invoke::<Value>("version", None)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::warn!(url = %self.url, error = %e, "AnkiConnect connection check failed");
                Error::AnkiUnavailable {
                    url: self.url.clone(),
                }
            })
    }

    pub async fn deck_names(&self) -> Result<Vec<String>> {
        self.invoke("deckNames", None).await
    }

    /// Create a deck (`::` nests decks) and return its id
    pub async fn create_deck(&self, name: &str) -> Result<i64> {
        self.invoke("createDeck", Some(json!({ "deck": name }))).await
    }

    pub async fn model_names(&self) -> Result<Vec<String>> {
        self.invoke("modelNames", None).await
    }

    pub async fn model_field_names(&self, model_name: &str) -> Result<Vec<String>> {
        self.invoke("modelFieldNames", Some(json!({ "modelName": model_name })))
            .await
    }

    /// Card templates of a note type, keyed by card name
    pub async fn model_templates(&self, model_name: &str) -> Result<Value> {
        self.invoke("modelTemplates", Some(json!({ "modelName": model_name })))
            .await
    }

    pub async fn model_styling(&self, model_name: &str) -> Result<ModelStyling> {
        self.invoke("modelStyling", Some(json!({ "modelName": model_name })))
            .await
    }

    pub async fn create_model(
        &self,
        model_name: &str,
        in_order_fields: &[String],
        css: &str,
        card_templates: &[CardTemplate],
    ) -> Result<Value> {
        self.invoke(
            "createModel",
            Some(json!({
                "modelName": model_name,
                "inOrderFields": in_order_fields,
                "css": css,
                "cardTemplates": card_templates,
            })),
        )
        .await
    }

    pub async fn add_note(&self, note: &NoteSpec) -> Result<i64> {
        self.invoke("addNote", Some(json!({ "note": note }))).await
    }

    /// Add several notes; failed notes come back as `None`
    pub async fn add_notes(&self, notes: &[NoteSpec]) -> Result<Vec<Option<i64>>> {
        self.invoke("addNotes", Some(json!({ "notes": notes }))).await
    }

    /// Search notes with Anki query syntax
    pub async fn find_notes(&self, query: &str) -> Result<Vec<i64>> {
        self.invoke("findNotes", Some(json!({ "query": query }))).await
    }

    pub async fn notes_info(&self, note_ids: &[i64]) -> Result<Vec<Value>> {
        self.invoke("notesInfo", Some(json!({ "notes": note_ids }))).await
    }

    pub async fn update_note_fields(
        &self,
        note_id: i64,
        fields: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.invoke::<Value>(
            "updateNoteFields",
            Some(json!({ "note": { "id": note_id, "fields": fields } })),
        )
        .await
        .map(|_| ())
    }

    /// Replace all tags of a note
    pub async fn update_note_tags(&self, note_id: i64, tags: &[String]) -> Result<()> {
        self.invoke::<Value>(
            "updateNoteTags",
            Some(json!({ "note": note_id, "tags": tags.join(" ") })),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_notes(&self, note_ids: &[i64]) -> Result<()> {
        self.invoke::<Value>("deleteNotes", Some(json!({ "notes": note_ids })))
            .await
            .map(|_| ())
    }

    /// Duplicate check for each note
    pub async fn can_add_notes(&self, notes: &[NoteSpec]) -> Result<Vec<bool>> {
        self.invoke("canAddNotes", Some(json!({ "notes": notes }))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn client_for(server: &mockito::ServerGuard) -> AnkiClient {
        AnkiClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_client_defaults() {
        let client = AnkiClient::with_port(DEFAULT_PORT).unwrap();
        assert_eq!(client.url(), "http://localhost:8765");
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let client = AnkiClient::new("http://localhost:8080", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.url(), "http://localhost:8080");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = AnkiClient::new("not a url", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(Error::InvalidParams { .. })));
    }

    #[test]
    fn test_note_spec_wire_format() {
        let note = NoteSpec {
            deck_name: "Default".to_string(),
            model_name: "Basic".to_string(),
            fields: BTreeMap::from([("Front".to_string(), "Q".to_string())]),
            tags: vec!["pgm".to_string()],
            options: NoteOptions {
                allow_duplicate: true,
            },
        };
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(
            value,
            json!({
                "deckName": "Default",
                "modelName": "Basic",
                "fields": {"Front": "Q"},
                "tags": ["pgm"],
                "options": {"allowDuplicate": true}
            })
        );

        let template = CardTemplate {
            name: "Card 1".to_string(),
            front: "{{Front}}".to_string(),
            back: "{{Back}}".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({"Name": "Card 1", "Front": "{{Front}}", "Back": "{{Back}}"})
        );
    }

    #[tokio::test]
    async fn test_invoke_sends_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({
                "action": "createDeck",
                "version": 6,
                "params": {"deck": "PGM::Chapter 9"}
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": 1700000000000, "error": null}"#)
            .create_async()
            .await;

        let deck_id = client_for(&server).create_deck("PGM::Chapter 9").await.unwrap();

        assert_eq!(deck_id, 1700000000000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_without_params_omits_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({"action": "deckNames", "version": 6})))
            .with_body(r#"{"result": ["Default", "PGM"], "error": null}"#)
            .create_async()
            .await;

        let decks = client_for(&server).deck_names().await.unwrap();

        assert_eq!(decks, vec!["Default".to_string(), "PGM".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"result": null, "error": "model was not found: Nope"}"#)
            .create_async()
            .await;

        let result = client_for(&server).model_field_names("Nope").await;

        match result {
            Err(Error::AnkiConnect { reason }) => assert_eq!(reason, "model was not found: Nope"),
            other => panic!("expected AnkiConnect error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .create_async()
            .await;

        let result = client_for(&server).deck_names().await;
        assert!(matches!(result, Err(Error::HttpRequest(_))));
    }

    #[tokio::test]
    async fn test_null_result_for_void_actions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "action": "updateNoteTags",
                "params": {"note": 42, "tags": "a b"}
            })))
            .with_body(r#"{"result": null, "error": null}"#)
            .create_async()
            .await;

        client_for(&server)
            .update_note_tags(42, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_notes_keeps_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"result": [11, null, 13], "error": null}"#)
            .create_async()
            .await;

        let ids = client_for(&server).add_notes(&[]).await.unwrap();
        assert_eq!(ids, vec![Some(11), None, Some(13)]);
    }

    #[tokio::test]
    async fn test_check_connection_unavailable() {
        // nothing listens on port 9 (discard) in test environments
        let client = AnkiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.check_connection().await;
        assert!(matches!(result, Err(Error::AnkiUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_model_styling_defaults_css() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"result": {}, "error": null}"#)
            .create_async()
            .await;

        let styling = client_for(&server).model_styling("Basic").await.unwrap();
        assert_eq!(styling.css, "");
    }

    #[tokio::test]
    async fn test_can_add_notes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "action": "canAddNotes",
                "params": {"notes": [{"deckName": "PGM", "modelName": "Basic"}]}
            })))
            .with_body(r#"{"result": [false], "error": null}"#)
            .create_async()
            .await;

        let note = NoteSpec {
            deck_name: "PGM".to_string(),
            model_name: "Basic".to_string(),
            fields: BTreeMap::from([("Front".to_string(), "Q".to_string())]),
            tags: vec![],
            options: NoteOptions::default(),
        };
        let can_add = client_for(&server).can_add_notes(&[note]).await.unwrap();

        assert_eq!(can_add, vec![false]);
        mock.assert_async().await;
    }
}
