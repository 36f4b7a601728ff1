//! MCP tool definitions and dispatch.
//!
//! Every Pulse REST operation is exposed as one MCP tool. The registry is an
//! ordered map keyed by unique tool name; each entry carries a description and
//! a JSON input schema. [`handle_tool_call`] validates arguments, invokes the
//! matching [`PulseClient`] method, and folds the outcome into a uniform
//! [`ToolResult`] envelope — success bodies are pretty-printed JSON (or raw
//! text for non-JSON responses), and every error becomes an `isError` envelope
//! instead of escaping to the transport.
//!
//! ## Identifier conventions
//!
//! Endpoints, rooms, users, and notes use string ids; locations and regions
//! use numeric ids. This mirrors the remote API and is part of the tool
//! contract — do not widen either to "accept both".
//!
//! ## JSON-text payloads
//!
//! `apply_endpoint_config` and `create_room_note` take their payload as a
//! JSON-encoded string (the payload shape is caller-defined, not fixed by the
//! schema). The text is parsed here; a parse failure is reported to the caller
//! and no request is sent.

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::{ApiResponse, ClientError, PulseClient};

/// One registered tool: description plus input schema. The name is the
/// registry key.
pub struct ToolDef {
    description: &'static str,
    input_schema: Value,
}

/// The ordered tool registry, built once on first use.
fn registry() -> &'static IndexMap<&'static str, ToolDef> {
    static REGISTRY: OnceLock<IndexMap<&'static str, ToolDef>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Tool definitions in registration order, shaped for `tools/list`.
pub fn tool_definitions() -> Vec<Value> {
    registry()
        .iter()
        .map(|(name, def)| {
            json!({
                "name": name,
                "description": def.description,
                "inputSchema": def.input_schema,
            })
        })
        .collect()
}

/// Result of an MCP tool call, serialized into the JSON-RPC response.
#[derive(Serialize)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    #[serde(rename = "isError", skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolResult {
    fn success(resp: ApiResponse) -> Self {
        let text = match resp {
            ApiResponse::Json(v) => serde_json::to_string_pretty(&v).unwrap_or_default(),
            ApiResponse::Text(s) => s,
        };
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }
}

/// Handle a tool call. Every outcome, including argument rejections and
/// unknown tool names, lands in an envelope — nothing propagates past here.
pub async fn handle_tool_call(name: &str, args: &Value, client: &PulseClient) -> ToolResult {
    match dispatch(name, args, client).await {
        Ok(resp) => ToolResult::success(resp),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

/// Failures surfaced by tool invocation, distinct from each other in wording
/// so the agent can tell a bad call from a failing remote.
#[derive(Debug)]
pub enum ToolError {
    /// Argument rejected before any request was made: missing required
    /// parameter, wrong type, or value outside a closed enum.
    InvalidArgs(String),
    /// A JSON-encoded text parameter failed to parse.
    Payload(String),
    /// The client reported an HTTP or protocol failure.
    Client(ClientError),
    UnknownTool(String),
}

impl From<ClientError> for ToolError {
    fn from(e: ClientError) -> Self {
        ToolError::Client(e)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            ToolError::Payload(msg) => write!(f, "Payload error: {}", msg),
            ToolError::Client(e) => write!(f, "{}", e),
            ToolError::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
        }
    }
}

async fn dispatch(name: &str, args: &Value, client: &PulseClient) -> Result<ApiResponse, ToolError> {
    let resp = match name {
        // Endpoints
        "list_endpoints" => {
            client
                .list_endpoints(opt_i64(args, "regionId")?, opt_i64(args, "locationId")?)
                .await?
        }
        "get_endpoint" => client.get_endpoint(req_str(args, "id")?).await?,
        "get_endpoint_settings" => client.get_endpoint_settings(req_str(args, "id")?).await?,
        "apply_endpoint_config" => {
            let id = req_str(args, "id")?;
            let config = json_text_param(args, "config")?;
            client.apply_endpoint_config(id, &config).await?
        }
        "reboot_endpoint" => client.reboot_endpoint(req_str(args, "id")?).await?,
        "delete_endpoint" => client.delete_endpoint(req_str(args, "id")?).await?,
        "get_endpoint_sensor" => client.get_endpoint_sensor(req_str(args, "id")?).await?,
        "bulk_endpoint_sensor" => {
            client
                .bulk_endpoint_sensor(&req_str_array(args, "endpointIds")?)
                .await?
        }

        // Rooms
        "list_rooms" => {
            client
                .list_rooms(opt_i64(args, "regionId")?, opt_i64(args, "locationId")?)
                .await?
        }
        "get_room" => client.get_room(req_str(args, "id")?).await?,
        "create_room" => {
            client
                .create_room(
                    req_str(args, "name")?,
                    opt_i64(args, "locationId")?,
                    opt_str(args, "profileId")?,
                )
                .await?
        }
        "update_room" => {
            client
                .update_room(
                    req_str(args, "id")?,
                    opt_str(args, "name")?,
                    opt_i64(args, "locationId")?,
                    opt_str(args, "profileId")?,
                )
                .await?
        }
        "delete_room" => client.delete_room(req_str(args, "id")?).await?,
        "get_room_sensor" => client.get_room_sensor(req_str(args, "id")?).await?,
        "bulk_room_sensor" => {
            client
                .bulk_room_sensor(&req_str_array(args, "roomIds")?)
                .await?
        }
        "regenerate_enrollment_code" => {
            client
                .regenerate_enrollment_code(req_str(args, "roomId")?)
                .await?
        }

        // Locations
        "list_locations" => client.list_locations().await?,
        "create_location" => {
            client
                .create_location(req_str(args, "name")?, opt_i64(args, "regionId")?)
                .await?
        }
        "update_location" => {
            client
                .update_location(
                    req_i64(args, "id")?,
                    opt_str(args, "name")?,
                    opt_i64(args, "regionId")?,
                )
                .await?
        }
        "delete_location" => client.delete_location(req_i64(args, "id")?).await?,

        // Regions
        "list_regions" => client.list_regions().await?,
        "create_region" => client.create_region(req_str(args, "name")?).await?,
        "update_region" => {
            client
                .update_region(req_i64(args, "id")?, opt_str(args, "name")?)
                .await?
        }
        "delete_region" => client.delete_region(req_i64(args, "id")?).await?,

        // Profiles
        "list_profiles" => client.list_profiles().await?,

        // Users
        "list_users" => client.list_users().await?,
        "create_user" => {
            let email = req_str(args, "email")?;
            let role = req_str(args, "role")?;
            validate_role(role)?;
            let region_ids = opt_i64_array(args, "regionIds")?;
            client
                .create_user(email, role, opt_str(args, "name")?, region_ids.as_deref())
                .await?
        }
        "update_user" => {
            let id = req_str(args, "id")?;
            let role = opt_str(args, "role")?;
            if let Some(r) = role {
                validate_role(r)?;
            }
            let region_ids = opt_i64_array(args, "regionIds")?;
            client
                .update_user(
                    id,
                    opt_str(args, "email")?,
                    role,
                    opt_str(args, "name")?,
                    region_ids.as_deref(),
                )
                .await?
        }
        "delete_user" => client.delete_user(req_str(args, "id")?).await?,

        // Audit logs
        "list_audit_logs" => {
            client
                .list_audit_logs(
                    opt_str(args, "from")?,
                    opt_str(args, "to")?,
                    opt_i64(args, "pageSize")?,
                    opt_str(args, "pageToken")?,
                )
                .await?
        }

        // Bug reports
        "generate_bug_report" => {
            client
                .generate_bug_report(
                    &req_str_array(args, "endpointIds")?,
                    opt_bool(args, "upload")?,
                )
                .await?
        }

        // Room notes
        "list_room_notes" => client.list_room_notes(req_str(args, "roomId")?).await?,
        "get_room_note" => {
            client
                .get_room_note(req_str(args, "roomId")?, req_str(args, "noteId")?)
                .await?
        }
        "create_room_note" => {
            let room_id = req_str(args, "roomId")?;
            let note = json_text_param(args, "note")?;
            client.create_room_note(room_id, &note).await?
        }
        "delete_room_note" => {
            client
                .delete_room_note(req_str(args, "roomId")?, req_str(args, "noteId")?)
                .await?
        }
        "list_all_notes" => client.list_all_notes().await?,

        _ => return Err(ToolError::UnknownTool(name.to_string())),
    };
    Ok(resp)
}

// --- Argument extraction ---
//
// Extraction doubles as schema validation: a missing required key or a value
// of the wrong type is rejected here, before any client call.

fn req_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::InvalidArgs(format!(
            "missing required parameter: {}",
            key
        ))),
        Some(v) => v.as_str().ok_or_else(|| {
            ToolError::InvalidArgs(format!("parameter '{}' must be a string", key))
        }),
    }
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgs(format!("parameter '{}' must be a string", key))),
    }
}

fn req_i64(args: &Value, key: &str) -> Result<i64, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::InvalidArgs(format!(
            "missing required parameter: {}",
            key
        ))),
        Some(v) => v.as_i64().ok_or_else(|| {
            ToolError::InvalidArgs(format!("parameter '{}' must be a number", key))
        }),
    }
}

fn opt_i64(args: &Value, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgs(format!("parameter '{}' must be a number", key))),
    }
}

fn opt_bool(args: &Value, key: &str) -> Result<Option<bool>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidArgs(format!("parameter '{}' must be a boolean", key))),
    }
}

fn req_str_array(args: &Value, key: &str) -> Result<Vec<String>, ToolError> {
    let items = match args.get(key) {
        None | Some(Value::Null) => {
            return Err(ToolError::InvalidArgs(format!(
                "missing required parameter: {}",
                key
            )))
        }
        Some(v) => v.as_array().ok_or_else(|| {
            ToolError::InvalidArgs(format!("parameter '{}' must be an array of strings", key))
        })?,
    };
    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                ToolError::InvalidArgs(format!("parameter '{}' must be an array of strings", key))
            })
        })
        .collect()
}

fn opt_i64_array(args: &Value, key: &str) -> Result<Option<Vec<i64>>, ToolError> {
    let items = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v.as_array().ok_or_else(|| {
            ToolError::InvalidArgs(format!("parameter '{}' must be an array of numbers", key))
        })?,
    };
    items
        .iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                ToolError::InvalidArgs(format!("parameter '{}' must be an array of numbers", key))
            })
        })
        .collect::<Result<Vec<i64>, ToolError>>()
        .map(Some)
}

const ROLES: [&str; 2] = ["owner", "admin"];

fn validate_role(role: &str) -> Result<(), ToolError> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ToolError::InvalidArgs(format!(
            "parameter 'role' must be one of: {}",
            ROLES.join(", ")
        )))
    }
}

/// Parse a JSON-encoded text parameter into a structured value.
fn json_text_param(args: &Value, key: &str) -> Result<Value, ToolError> {
    let raw = req_str(args, key)?;
    serde_json::from_str(raw)
        .map_err(|e| ToolError::Payload(format!("parameter '{}' is not valid JSON: {}", key, e)))
}

// --- Schema declarations ---

fn build_registry() -> IndexMap<&'static str, ToolDef> {
    let mut t = IndexMap::new();

    // Endpoints
    t.insert(
        "list_endpoints",
        ToolDef {
            description: "List endpoints (devices) in the organization, optionally filtered by region or location.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "regionId": { "type": "number", "description": "Only endpoints in this region." },
                    "locationId": { "type": "number", "description": "Only endpoints at this location." }
                },
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_endpoint",
        ToolDef {
            description: "Get one endpoint by id.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_endpoint_settings",
        ToolDef {
            description: "Get the current settings of an endpoint.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "apply_endpoint_config",
        ToolDef {
            description: "Push a configuration fragment to an endpoint. The config is a JSON-encoded string; its shape is defined by the device, not by this tool.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." },
                    "config": { "type": "string", "description": "Configuration payload as a JSON-encoded string." }
                },
                "required": ["id", "config"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "reboot_endpoint",
        ToolDef {
            description: "Reboot an endpoint.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_endpoint",
        ToolDef {
            description: "Remove an endpoint from the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_endpoint_sensor",
        ToolDef {
            description: "Get the latest sensor readings for one endpoint.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Endpoint id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "bulk_endpoint_sensor",
        ToolDef {
            description: "Get sensor readings for a batch of endpoints.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "endpointIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Endpoint ids to read."
                    }
                },
                "required": ["endpointIds"],
                "additionalProperties": false
            }),
        },
    );

    // Rooms
    t.insert(
        "list_rooms",
        ToolDef {
            description: "List rooms in the organization, optionally filtered by region or location.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "regionId": { "type": "number", "description": "Only rooms in this region." },
                    "locationId": { "type": "number", "description": "Only rooms at this location." }
                },
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_room",
        ToolDef {
            description: "Get one room by id.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Room id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "create_room",
        ToolDef {
            description: "Create a room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Room name." },
                    "locationId": { "type": "number", "description": "Location the room belongs to." },
                    "profileId": { "type": "string", "description": "Configuration profile to assign." }
                },
                "required": ["name"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "update_room",
        ToolDef {
            description: "Update a room. Only supplied fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Room id." },
                    "name": { "type": "string", "description": "New room name." },
                    "locationId": { "type": "number", "description": "New location id." },
                    "profileId": { "type": "string", "description": "New configuration profile." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_room",
        ToolDef {
            description: "Delete a room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Room id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_room_sensor",
        ToolDef {
            description: "Get the latest sensor readings for one room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Room id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "bulk_room_sensor",
        ToolDef {
            description: "Get sensor readings for a batch of rooms.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Room ids to read."
                    }
                },
                "required": ["roomIds"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "regenerate_enrollment_code",
        ToolDef {
            description: "Invalidate a room's enrollment code and generate a new one. Devices enrolling with the old code are rejected afterwards.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomId": { "type": "string", "description": "Room id." }
                },
                "required": ["roomId"],
                "additionalProperties": false
            }),
        },
    );

    // Locations
    t.insert(
        "list_locations",
        ToolDef {
            description: "List locations in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "create_location",
        ToolDef {
            description: "Create a location.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Location name." },
                    "regionId": { "type": "number", "description": "Region the location belongs to." }
                },
                "required": ["name"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "update_location",
        ToolDef {
            description: "Update a location. Only supplied fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "number", "description": "Location id." },
                    "name": { "type": "string", "description": "New location name." },
                    "regionId": { "type": "number", "description": "New region id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_location",
        ToolDef {
            description: "Delete a location.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "number", "description": "Location id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );

    // Regions
    t.insert(
        "list_regions",
        ToolDef {
            description: "List regions in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "create_region",
        ToolDef {
            description: "Create a region.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Region name." }
                },
                "required": ["name"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "update_region",
        ToolDef {
            description: "Update a region. Only supplied fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "number", "description": "Region id." },
                    "name": { "type": "string", "description": "New region name." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_region",
        ToolDef {
            description: "Delete a region.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "number", "description": "Region id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );

    // Profiles
    t.insert(
        "list_profiles",
        ToolDef {
            description: "List configuration profiles in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    );

    // Users
    t.insert(
        "list_users",
        ToolDef {
            description: "List users in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "create_user",
        ToolDef {
            description: "Invite a user to the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "User email address." },
                    "role": { "type": "string", "enum": ["owner", "admin"], "description": "Organization role." },
                    "name": { "type": "string", "description": "Display name." },
                    "regionIds": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Regions the user may administer. Omit for all regions."
                    }
                },
                "required": ["email", "role"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "update_user",
        ToolDef {
            description: "Update a user. Only supplied fields are changed.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "User id." },
                    "email": { "type": "string", "description": "New email address." },
                    "role": { "type": "string", "enum": ["owner", "admin"], "description": "New organization role." },
                    "name": { "type": "string", "description": "New display name." },
                    "regionIds": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "New set of administered regions."
                    }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_user",
        ToolDef {
            description: "Remove a user from the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "User id." }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        },
    );

    // Audit logs
    t.insert(
        "list_audit_logs",
        ToolDef {
            description: "List audit log entries, filtered by date range and paginated by opaque token.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "from": { "type": "string", "description": "Range start, RFC 3339 timestamp." },
                    "to": { "type": "string", "description": "Range end, RFC 3339 timestamp." },
                    "pageSize": { "type": "number", "description": "Maximum entries per page." },
                    "pageToken": { "type": "string", "description": "Opaque token from a previous page." }
                },
                "additionalProperties": false
            }),
        },
    );

    // Bug reports
    t.insert(
        "generate_bug_report",
        ToolDef {
            description: "Trigger bug-report generation on a set of endpoints, optionally uploading the reports to Pulse.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "endpointIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Endpoints to generate reports on."
                    },
                    "upload": { "type": "boolean", "description": "Upload the generated reports. Default is the remote service's." }
                },
                "required": ["endpointIds"],
                "additionalProperties": false
            }),
        },
    );

    // Room notes
    t.insert(
        "list_room_notes",
        ToolDef {
            description: "List notes attached to a room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomId": { "type": "string", "description": "Room id." }
                },
                "required": ["roomId"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "get_room_note",
        ToolDef {
            description: "Get one note attached to a room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomId": { "type": "string", "description": "Room id." },
                    "noteId": { "type": "string", "description": "Note id." }
                },
                "required": ["roomId", "noteId"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "create_room_note",
        ToolDef {
            description: "Attach a note to a room. The note is a JSON-encoded string; its shape is caller-defined.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomId": { "type": "string", "description": "Room id." },
                    "note": { "type": "string", "description": "Note payload as a JSON-encoded string." }
                },
                "required": ["roomId", "note"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "delete_room_note",
        ToolDef {
            description: "Delete a note from a room.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "roomId": { "type": "string", "description": "Room id." },
                    "noteId": { "type": "string", "description": "Note id." }
                },
                "required": ["roomId", "noteId"],
                "additionalProperties": false
            }),
        },
    );
    t.insert(
        "list_all_notes",
        ToolDef {
            description: "List notes across all rooms in the organization.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    );

    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> PulseClient {
        PulseClient::new(ClientConfig {
            base_url,
            api_key: "test-key".into(),
            org_id: "org1".into(),
        })
        .unwrap()
    }

    /// Client for tests that must fail before any request is attempted.
    fn offline_client() -> PulseClient {
        test_client("http://127.0.0.1:9".into())
    }

    fn text_of(result: &ToolResult) -> &str {
        result.content[0]["text"].as_str().unwrap()
    }

    #[test]
    fn registry_has_all_operations() {
        assert_eq!(registry().len(), 36);
    }

    #[test]
    fn definitions_are_well_formed() {
        for def in tool_definitions() {
            let name = def["name"].as_str().unwrap();
            assert!(!def["description"].as_str().unwrap().is_empty(), "{name}");
            let schema = &def["inputSchema"];
            assert_eq!(schema["type"], "object", "{name}");
            assert_eq!(schema["additionalProperties"], json!(false), "{name}");
            // Every required key must exist in properties
            if let Some(required) = schema["required"].as_array() {
                for key in required {
                    assert!(
                        schema["properties"]
                            .get(key.as_str().unwrap())
                            .is_some(),
                        "{name}: required key {key} not in properties"
                    );
                }
            }
        }
    }

    #[test]
    fn location_and_region_ids_are_numbers_elsewhere_strings() {
        let defs = tool_definitions();
        let id_type = |tool: &str| {
            defs.iter()
                .find(|d| d["name"] == tool)
                .unwrap()["inputSchema"]["properties"]["id"]["type"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert_eq!(id_type("get_endpoint"), "string");
        assert_eq!(id_type("get_room"), "string");
        assert_eq!(id_type("delete_user"), "string");
        assert_eq!(id_type("delete_location"), "number");
        assert_eq!(id_type("delete_region"), "number");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_envelope() {
        let result = handle_tool_call("frobnicate", &json!({}), &offline_client()).await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("Unknown tool: frobnicate"));
    }

    #[tokio::test]
    async fn missing_required_parameter_rejected_before_dispatch() {
        let result = handle_tool_call("get_endpoint", &json!({}), &offline_client()).await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("missing required parameter: id"));
    }

    #[tokio::test]
    async fn wrong_parameter_type_rejected_before_dispatch() {
        let result =
            handle_tool_call("get_endpoint", &json!({ "id": 42 }), &offline_client()).await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("parameter 'id' must be a string"));
    }

    #[tokio::test]
    async fn numeric_id_tools_reject_string_ids() {
        let result =
            handle_tool_call("delete_location", &json!({ "id": "7" }), &offline_client()).await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("parameter 'id' must be a number"));
    }

    #[tokio::test]
    async fn role_outside_enum_is_rejected() {
        let args = json!({ "email": "a@b.example", "role": "viewer" });
        let result = handle_tool_call("create_user", &args, &offline_client()).await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("'role' must be one of: owner, admin"));
    }

    #[tokio::test]
    async fn invalid_config_json_sends_no_request() {
        let server = MockServer::start().await;

        let args = json!({ "id": "e1", "config": "{not valid json" });
        let client = test_client(server.uri());
        let result = handle_tool_call("apply_endpoint_config", &args, &client).await;

        assert!(result.is_error);
        assert!(text_of(&result).contains("'config' is not valid JSON"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_config_json_is_forwarded_structured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/org1/endpoints/e1/config"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let args = json!({ "id": "e1", "config": r#"{"display":{"brightness":70}}"# });
        let client = test_client(server.uri());
        let result = handle_tool_call("apply_endpoint_config", &args, &client).await;
        assert!(!result.is_error);

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({ "display": { "brightness": 70 } }));
    }

    #[tokio::test]
    async fn success_envelope_round_trips_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/endpoints/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"id":"abc"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = handle_tool_call("get_endpoint", &json!({ "id": "abc" }), &client).await;

        assert!(!result.is_error);
        let parsed: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(parsed, json!({ "id": "abc" }));
    }

    #[tokio::test]
    async fn http_error_becomes_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/rooms/r1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = handle_tool_call("get_room", &json!({ "id": "r1" }), &client).await;

        assert!(result.is_error);
        let msg = text_of(&result);
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
    }

    #[tokio::test]
    async fn optional_filters_not_supplied_are_not_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/rooms"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = handle_tool_call("list_rooms", &json!({ "regionId": 7 }), &client).await;
        assert!(!result.is_error);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("regionId=7"));
    }

    #[test]
    fn envelope_serialization_matches_mcp_shape() {
        let ok = ToolResult::success(ApiResponse::Text("done".into()));
        let ok_json = serde_json::to_value(&ok).unwrap();
        assert_eq!(ok_json["content"][0]["text"], "done");
        assert!(ok_json.get("isError").is_none());

        let err = ToolResult::error("boom".into());
        let err_json = serde_json::to_value(&err).unwrap();
        assert_eq!(err_json["isError"], json!(true));
        assert_eq!(err_json["content"][0]["text"], "boom");
    }
}
