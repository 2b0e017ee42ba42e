//! MCP Server implementation using rmcp

use crate::anki::{AnkiClient, CardTemplate, NoteOptions, NoteSpec, ResourceCache};
use crate::docling::DoclingConverter;
use crate::error::Error;
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Maximum notes accepted by one batch_create_notes call
const MAX_BATCH_NOTES: usize = 50;

/// Maximum note infos returned by search_notes
const MAX_SEARCH_RESULTS: usize = 50;

const DECKS_URI: &str = "anki://decks/all";
const NOTE_TYPES_URI: &str = "anki://note-types/all";
const ALL_SCHEMAS_URI: &str = "anki://note-types/all-with-schemas";
const NOTE_TYPE_URI_PREFIX: &str = "anki://note-types/";

/// Configuration for the Anki MCP Server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// AnkiConnect endpoint (default: http://localhost:8765)
    pub anki_connect_url: String,
    /// AnkiConnect request timeout (default: 30s)
    pub request_timeout: Duration,
    /// Lifetime of cached resource payloads (default: 300s)
    pub cache_ttl: Duration,
    /// Maximum number of cached resource payloads (default: 64)
    pub cache_max_entries: usize,
    /// Default output directory of convert_docling_raw_to_intermediate
    pub intermediate_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            anki_connect_url: crate::anki::local_url(crate::anki::DEFAULT_PORT),
            request_timeout: crate::anki::DEFAULT_TIMEOUT,
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 64,
            intermediate_dir: PathBuf::from("data/input/intermediate/"),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `ANKI_CONNECT_PORT` and `ANKI_MCP_INTERMEDIATE_DIR`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("ANKI_CONNECT_PORT") {
            match port.parse::<u16>() {
                Ok(port) if port > 0 => config.anki_connect_url = crate::anki::local_url(port),
                _ => tracing::warn!(value = %port, "ignoring invalid ANKI_CONNECT_PORT"),
            }
        }
        if let Ok(dir) = std::env::var("ANKI_MCP_INTERMEDIATE_DIR") {
            config.intermediate_dir = PathBuf::from(dir);
        }

        config
    }
}

/// Anki MCP Server
#[derive(Clone)]
pub struct AnkiServer {
    client: Arc<AnkiClient>,
    cache: Arc<ResourceCache>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request types for deck and note type tools
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDeckParams {
    /// Name of the deck to create (can include :: for nesting)
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetNoteTypeInfoParams {
    /// Name of the note type/model
    pub model_name: String,
    /// Whether to include CSS styling information
    #[serde(default)]
    pub include_css: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TemplateParams {
    /// Template name
    pub name: String,
    /// Front side template
    pub front: String,
    /// Back side template
    pub back: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNoteTypeParams {
    /// Name of the new note type
    pub name: String,
    /// Field names for the note type
    pub fields: Vec<String>,
    /// Card templates
    pub templates: Vec<TemplateParams>,
    /// Optional CSS styling
    #[serde(default)]
    pub css: String,
}

// ============================================================================
// Request/Response types for note tools
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    /// Note type name (e.g., 'Basic', 'Cloze')
    pub note_type: String,
    /// Target deck name
    pub deck: String,
    /// Field names mapped to values
    pub fields: BTreeMap<String, String>,
    /// Optional tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Whether to allow duplicate notes
    #[serde(default)]
    pub allow_duplicate: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchNote {
    /// Note type name
    #[serde(rename = "type")]
    pub note_type: String,
    /// Target deck name
    pub deck: String,
    /// Field names mapped to values
    pub fields: BTreeMap<String, String>,
    /// Optional tags
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchCreateNotesParams {
    /// Notes to create (recommended 10-20, max 50)
    pub notes: Vec<BatchNote>,
    /// Whether to allow duplicate notes
    #[serde(default)]
    pub allow_duplicate: bool,
    /// Whether to stop reporting after the first failed note
    #[serde(default)]
    pub stop_on_error: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchNoteResult {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchNotesParams {
    /// Anki search query string
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNotesResult {
    pub query: String,
    pub total: usize,
    pub notes: Vec<Value>,
    pub limit_applied: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetNoteInfoParams {
    /// Note ID
    #[serde(rename = "noteId")]
    pub note_id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateNoteParams {
    /// Note ID
    pub id: i64,
    /// Field names mapped to new values
    pub fields: BTreeMap<String, String>,
    /// New tags; replaces all existing tags when given
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteNoteParams {
    /// Note ID to delete
    pub id: i64,
}

// ============================================================================
// Request/Response types for convert_docling_raw_to_intermediate
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertDoclingParams {
    /// Path to a Docling raw JSON file (*_docling.json)
    pub source: String,
    /// Output directory for the structured JSON file
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ConvertDoclingResult {
    pub success: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl AnkiServer {
    /// Create a server over an existing client
    pub fn new(client: AnkiClient, config: ServerConfig) -> Self {
        let cache = ResourceCache::new(config.cache_max_entries, config.cache_ttl);
        Self {
            client: Arc::new(client),
            cache: Arc::new(cache),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Create a server and its AnkiConnect client from configuration
    pub fn with_config(config: ServerConfig) -> crate::error::Result<Self> {
        let client = AnkiClient::new(config.anki_connect_url.clone(), config.request_timeout)?;
        Ok(Self::new(client, config))
    }

    /// List all decks
    #[tool(description = "List all available Anki decks")]
    async fn list_decks(&self) -> String {
        Self::render("list_decks", self.process_list_decks().await)
    }

    /// Create a deck
    #[tool(description = "Create a new Anki deck. Use :: in the name for nested decks.")]
    async fn create_deck(&self, Parameters(params): Parameters<CreateDeckParams>) -> String {
        Self::render("create_deck", self.process_create_deck(&params).await)
    }

    /// List all note types
    #[tool(description = "List all available note types")]
    async fn list_note_types(&self) -> String {
        Self::render("list_note_types", self.process_list_note_types().await)
    }

    /// Describe one note type
    #[tool(
        description = "Get detailed structure of a note type: field names, card templates and optionally CSS"
    )]
    async fn get_note_type_info(
        &self,
        Parameters(params): Parameters<GetNoteTypeInfoParams>,
    ) -> String {
        Self::render(
            "get_note_type_info",
            self.process_get_note_type_info(&params).await,
        )
    }

    /// Create a note type
    #[tool(
        description = "Create a new note type from field names and card templates (each with name, front, back)"
    )]
    async fn create_note_type(
        &self,
        Parameters(params): Parameters<CreateNoteTypeParams>,
    ) -> String {
        Self::render(
            "create_note_type",
            self.process_create_note_type(&params).await,
        )
    }

    /// Create one note
    #[tool(description = "Create a single note in Anki")]
    async fn create_note(&self, Parameters(params): Parameters<CreateNoteParams>) -> String {
        Self::render("create_note", self.process_create_note(&params).await)
    }

    /// Create many notes
    #[tool(
        description = "Create multiple notes at once (recommended: 10-20 notes per batch, max: 50).

Each note is {\"type\": \"Basic\", \"deck\": \"...\", \"fields\": {...}, \"tags\": [...]}"
    )]
    async fn batch_create_notes(
        &self,
        Parameters(params): Parameters<BatchCreateNotesParams>,
    ) -> String {
        Self::render(
            "batch_create_notes",
            self.process_batch_create_notes(&params).await,
        )
    }

    /// Search notes
    #[tool(
        description = "Search for notes using Anki query syntax. Returns up to 50 notes with the total match count."
    )]
    async fn search_notes(&self, Parameters(params): Parameters<SearchNotesParams>) -> String {
        Self::render("search_notes", self.process_search_notes(&params).await)
    }

    /// Get one note
    #[tool(description = "Get detailed information about a specific note")]
    async fn get_note_info(&self, Parameters(params): Parameters<GetNoteInfoParams>) -> String {
        Self::render("get_note_info", self.process_get_note_info(&params).await)
    }

    /// Update one note
    #[tool(
        description = "Update the fields of an existing note. Tags, when given, replace all existing tags."
    )]
    async fn update_note(&self, Parameters(params): Parameters<UpdateNoteParams>) -> String {
        Self::render("update_note", self.process_update_note(&params).await)
    }

    /// Delete one note
    #[tool(description = "Delete a note permanently")]
    async fn delete_note(&self, Parameters(params): Parameters<DeleteNoteParams>) -> String {
        Self::render("delete_note", self.process_delete_note(&params).await)
    }

    /// Convert a Docling artifact into the structured section format
    #[tool(
        description = "Convert Docling raw JSON to structured intermediate JSON.

Extracts sections, hierarchy (chapters, section numbers, parents) and page references from a *_docling.json file and writes {output_dir}/{name}.json for flashcard generation."
    )]
    async fn convert_docling_raw_to_intermediate(
        &self,
        Parameters(params): Parameters<ConvertDoclingParams>,
    ) -> String {
        let result = self.process_convert_docling(&params).await;
        serde_json::to_string_pretty(&result).unwrap_or_default()
    }
}

impl AnkiServer {
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Drop all cached resource payloads
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Render a tool result, turning errors into a client-safe error object
    fn render(tool: &str, result: crate::error::Result<Value>) -> String {
        let value = result.unwrap_or_else(|e| {
            tracing::warn!(tool, error = %e, "tool failed");
            json!({ "success": false, "error": e.client_message() })
        });
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }

    async fn process_list_decks(&self) -> crate::error::Result<Value> {
        self.client.check_connection().await?;
        let decks = self.client.deck_names().await?;
        Ok(json!({ "decks": decks, "count": decks.len() }))
    }

    async fn process_create_deck(&self, params: &CreateDeckParams) -> crate::error::Result<Value> {
        if params.name.trim().is_empty() {
            return Err(Error::InvalidParams {
                reason: "deck name must not be empty".to_string(),
            });
        }
        self.client.check_connection().await?;
        let deck_id = self.client.create_deck(&params.name).await?;
        Ok(json!({ "success": true, "deckId": deck_id }))
    }

    async fn process_list_note_types(&self) -> crate::error::Result<Value> {
        self.client.check_connection().await?;
        let note_types = self.client.model_names().await?;
        Ok(json!({ "noteTypes": note_types, "count": note_types.len() }))
    }

    async fn process_get_note_type_info(
        &self,
        params: &GetNoteTypeInfoParams,
    ) -> crate::error::Result<Value> {
        self.client.check_connection().await?;
        let fields = self.client.model_field_names(&params.model_name).await?;
        let templates = self.client.model_templates(&params.model_name).await?;

        let mut result = json!({
            "modelName": params.model_name,
            "fields": fields,
            "templates": templates,
        });
        if params.include_css {
            let styling = self.client.model_styling(&params.model_name).await?;
            result["css"] = Value::String(styling.css);
        }

        Ok(result)
    }

    async fn process_create_note_type(
        &self,
        params: &CreateNoteTypeParams,
    ) -> crate::error::Result<Value> {
        if params.fields.is_empty() || params.templates.is_empty() {
            return Err(Error::InvalidParams {
                reason: "a note type needs at least one field and one template".to_string(),
            });
        }
        self.client.check_connection().await?;

        let card_templates: Vec<CardTemplate> = params
            .templates
            .iter()
            .map(|t| CardTemplate {
                name: t.name.clone(),
                front: t.front.clone(),
                back: t.back.clone(),
            })
            .collect();

        let model = self
            .client
            .create_model(&params.name, &params.fields, &params.css, &card_templates)
            .await?;

        // a new note type invalidates the cached listings
        self.cache.clear();

        Ok(json!({ "success": true, "model": model }))
    }

    async fn process_create_note(&self, params: &CreateNoteParams) -> crate::error::Result<Value> {
        self.client.check_connection().await?;

        let note = NoteSpec {
            deck_name: params.deck.clone(),
            model_name: params.note_type.clone(),
            fields: params.fields.clone(),
            tags: params.tags.clone().unwrap_or_default(),
            options: NoteOptions {
                allow_duplicate: params.allow_duplicate,
            },
        };
        let note_id = self.client.add_note(&note).await?;

        Ok(json!({ "success": true, "noteId": note_id }))
    }

    async fn process_batch_create_notes(
        &self,
        params: &BatchCreateNotesParams,
    ) -> crate::error::Result<Value> {
        if params.notes.len() > MAX_BATCH_NOTES {
            return Err(Error::InvalidParams {
                reason: format!("Maximum {} notes per batch", MAX_BATCH_NOTES),
            });
        }
        self.client.check_connection().await?;

        let notes: Vec<NoteSpec> = params
            .notes
            .iter()
            .map(|n| NoteSpec {
                deck_name: n.deck.clone(),
                model_name: n.note_type.clone(),
                fields: n.fields.clone(),
                tags: n.tags.clone(),
                options: NoteOptions {
                    allow_duplicate: params.allow_duplicate,
                },
            })
            .collect();

        let note_ids = self.client.add_notes(&notes).await?;
        let results = Self::batch_results(&note_ids, params.stop_on_error);

        Ok(json!({ "total": results.len(), "results": results }))
    }

    /// Per-note outcomes, truncated after the first failure when `stop_on_error`
    fn batch_results(note_ids: &[Option<i64>], stop_on_error: bool) -> Vec<BatchNoteResult> {
        let mut results = Vec::with_capacity(note_ids.len());

        for (index, note_id) in note_ids.iter().enumerate() {
            match note_id {
                Some(id) => results.push(BatchNoteResult {
                    index,
                    success: true,
                    note_id: Some(*id),
                    error: None,
                }),
                None => {
                    results.push(BatchNoteResult {
                        index,
                        success: false,
                        note_id: None,
                        error: Some("Failed to create note".to_string()),
                    });
                    if stop_on_error {
                        break;
                    }
                }
            }
        }

        results
    }

    async fn process_search_notes(
        &self,
        params: &SearchNotesParams,
    ) -> crate::error::Result<Value> {
        self.client.check_connection().await?;

        let note_ids = self.client.find_notes(&params.query).await?;
        let notes = if note_ids.is_empty() {
            Vec::new()
        } else {
            let limit = note_ids.len().min(MAX_SEARCH_RESULTS);
            self.client.notes_info(&note_ids[..limit]).await?
        };

        let result = SearchNotesResult {
            query: params.query.clone(),
            total: note_ids.len(),
            notes,
            limit_applied: note_ids.len() > MAX_SEARCH_RESULTS,
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn process_get_note_info(
        &self,
        params: &GetNoteInfoParams,
    ) -> crate::error::Result<Value> {
        self.client.check_connection().await?;

        self.client
            .notes_info(&[params.note_id])
            .await?
            .into_iter()
            // notesInfo answers unknown ids with an empty object
            .find(|info| info.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or(Error::NoteNotFound { id: params.note_id })
    }

    async fn process_update_note(&self, params: &UpdateNoteParams) -> crate::error::Result<Value> {
        self.client.check_connection().await?;

        self.client
            .update_note_fields(params.id, &params.fields)
            .await?;
        if let Some(tags) = &params.tags {
            self.client.update_note_tags(params.id, tags).await?;
        }

        Ok(json!({ "success": true, "noteId": params.id }))
    }

    async fn process_delete_note(&self, params: &DeleteNoteParams) -> crate::error::Result<Value> {
        self.client.check_connection().await?;
        self.client.delete_notes(&[params.id]).await?;
        Ok(json!({ "success": true, "noteId": params.id }))
    }

    async fn process_convert_docling(&self, params: &ConvertDoclingParams) -> ConvertDoclingResult {
        let output_dir = params
            .output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.intermediate_dir.clone());
        let source = Path::new(&params.source);

        // File reads, extraction and the atomic write run on the blocking pool
        let source_path = source.to_path_buf();
        let converted = tokio::task::spawn_blocking(move || {
            DoclingConverter::new(output_dir).convert_file(&source_path)
        })
        .await
        .map_err(|e| Error::Task {
            reason: e.to_string(),
        })
        .and_then(|result| result);

        match converted {
            Ok(converted) => ConvertDoclingResult {
                success: true,
                source: params.source.clone(),
                output_file: Some(converted.output_file.display().to_string()),
                sections: Some(converted.sections),
                message: Some(format!(
                    "Converted {} to structured format",
                    source
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                )),
                error: None,
            },
            Err(e) => {
                tracing::warn!(source = %params.source, error = %e, "docling conversion failed");
                ConvertDoclingResult {
                    success: false,
                    source: params.source.clone(),
                    output_file: None,
                    sections: None,
                    message: None,
                    error: Some(e.client_message()),
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    /// Static resources
    pub fn resources() -> Vec<Resource> {
        let mut resource = RawResource::new(DECKS_URI, "All Decks");
        resource.description = Some("Complete list of available decks".to_string());
        resource.mime_type = Some("application/json".to_string());

        vec![Annotated {
            raw: resource,
            annotations: None,
        }]
    }

    /// Resource URI templates
    pub fn resource_templates() -> Vec<ResourceTemplate> {
        [
            (
                "anki://note-types/{modelName}",
                "Note Type Schema",
                "Detailed structure information for a specific note type",
            ),
            (
                NOTE_TYPES_URI,
                "All Note Types",
                "List of all available note types",
            ),
            (
                ALL_SCHEMAS_URI,
                "All Note Types with Schemas",
                "Detailed structure information for all note types",
            ),
            (DECKS_URI, "All Decks", "Complete list of available decks"),
        ]
        .into_iter()
        .filter_map(|(uri_template, name, description)| {
            // Built from the wire form so optional fields keep their defaults
            serde_json::from_value::<RawResourceTemplate>(json!({
                "uriTemplate": uri_template,
                "name": name,
                "description": description,
                "mimeType": "application/json",
            }))
            .ok()
            .map(|raw| Annotated {
                raw,
                annotations: None,
            })
        })
        .collect()
    }

    /// Read a resource by URI, returning its JSON text
    pub async fn read_anki_resource(&self, uri: &str) -> crate::error::Result<String> {
        let model_name = uri.strip_prefix(NOTE_TYPE_URI_PREFIX);
        let known = uri == DECKS_URI || model_name.is_some_and(|name| !name.is_empty());
        if !known {
            return Err(Error::UnknownResource {
                uri: uri.to_string(),
            });
        }

        self.client.check_connection().await?;

        match uri {
            DECKS_URI => self.read_decks().await,
            NOTE_TYPES_URI => self.read_note_types().await,
            ALL_SCHEMAS_URI => self.read_all_schemas().await,
            _ => self.read_model_schema(model_name.unwrap_or_default()).await,
        }
    }

    async fn read_decks(&self) -> crate::error::Result<String> {
        let decks = self.client.deck_names().await?;
        Ok(serde_json::to_string_pretty(
            &json!({ "decks": decks, "count": decks.len() }),
        )?)
    }

    async fn read_note_types(&self) -> crate::error::Result<String> {
        const KEY: &str = "note_types";
        if let Some(cached) = self.cache.get(KEY) {
            return Ok(cached);
        }

        let note_types = self.client.model_names().await?;
        let result = serde_json::to_string_pretty(
            &json!({ "noteTypes": note_types, "count": note_types.len() }),
        )?;
        self.cache.put(KEY, result.clone());
        Ok(result)
    }

    async fn model_schema(&self, model_name: &str) -> crate::error::Result<Value> {
        let fields = self.client.model_field_names(model_name).await?;
        let templates = self.client.model_templates(model_name).await?;
        let styling = self.client.model_styling(model_name).await?;

        Ok(json!({
            "modelName": model_name,
            "fields": fields,
            "templates": templates,
            "css": styling.css,
        }))
    }

    async fn read_model_schema(&self, model_name: &str) -> crate::error::Result<String> {
        let key = format!("schema:{}", model_name);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let result = serde_json::to_string_pretty(&self.model_schema(model_name).await?)?;
        self.cache.put(key, result.clone());
        Ok(result)
    }

    async fn read_all_schemas(&self) -> crate::error::Result<String> {
        const KEY: &str = "all_schemas";
        if let Some(cached) = self.cache.get(KEY) {
            return Ok(cached);
        }

        let mut schemas = Vec::new();
        for model_name in self.client.model_names().await? {
            schemas.push(self.model_schema(&model_name).await?);
        }

        let result = serde_json::to_string_pretty(&schemas)?;
        self.cache.put(KEY, result.clone());
        Ok(result)
    }
}

#[tool_handler]
impl ServerHandler for AnkiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Anki MCP Server manages Anki decks, note types and notes through AnkiConnect, \
                 and converts Docling layout JSON into structured sections for card authoring. \
                 Anki must be running with the AnkiConnect add-on installed."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: Self::resources(),
            next_cursor: None,
            meta: Default::default(),
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult {
            resource_templates: Self::resource_templates(),
            next_cursor: None,
            meta: Default::default(),
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = &request.uri;

        match self.read_anki_resource(uri).await {
            Ok(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: uri.clone(),
                    mime_type: Some("application/json".to_string()),
                    text,
                    meta: Default::default(),
                }],
            }),
            Err(e @ Error::UnknownResource { .. }) => {
                Err(ErrorData::invalid_params(e.client_message(), None))
            }
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "read_resource failed");
                Err(ErrorData::internal_error(e.client_message(), None))
            }
        }
    }
}

/// Run the MCP server with configuration from the environment
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::from_env()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    tracing::info!(
        anki_connect = %config.anki_connect_url,
        intermediate_dir = %config.intermediate_dir.display(),
        "Anki MCP Server ready, waiting for connections..."
    );

    let server = AnkiServer::with_config(config)?;

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
