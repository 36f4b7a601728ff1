//! HTTP client for the Pulse device-management REST API.
//!
//! [`PulseClient`] wraps `reqwest::Client` and provides one typed method per
//! Pulse REST operation. Every request is scoped to a single organization
//! (`/orgs/{orgId}/...`) and authenticated with a Bearer token.
//!
//! ## Response decoding
//!
//! Success bodies are decoded by `Content-Type`: JSON media types are parsed
//! into [`ApiResponse::Json`], anything else is returned verbatim as
//! [`ApiResponse::Text`]. Non-2xx statuses become a [`ClientError::Api`]
//! carrying the method, the request path, the status code, and the raw body —
//! the tools layer formats that for the agent.
//!
//! ## What this client does not do
//!
//! No retries, no caching, no pagination traversal (page tokens pass through
//! opaquely), and no request timeout — a hung remote call hangs the tool call.

use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::config::ClientConfig;

/// A decoded Pulse response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The response declared a JSON content type and parsed.
    Json(Value),
    /// Any non-JSON content type, returned as raw text.
    Text(String),
}

/// HTTP client for one Pulse organization.
#[derive(Debug)]
pub struct PulseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    org_id: String,
}

impl PulseClient {
    /// Create a new client from validated configuration. No network I/O
    /// happens here; the first request is sent by the first tool call.
    pub fn new(config: ClientConfig) -> Result<Self, String> {
        if config.api_key.is_empty() {
            return Err("API key must not be empty".into());
        }
        if config.org_id.is_empty() {
            return Err("organization id must not be empty".into());
        }

        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .expect("Failed to build HTTP client");

        // Strip trailing slash for consistent URL construction
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
            org_id: config.org_id,
        })
    }

    fn org_path(&self, suffix: &str) -> String {
        format!("/orgs/{}{}", self.org_id, suffix)
    }

    /// Build and send one request, decode one response.
    ///
    /// `query` pairs with a `None` value are dropped — an absent filter never
    /// appears in the query string.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, Option<String>)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::Protocol(format!("Invalid request URL: {e}")))?;
        for (key, value) in defined_params(query) {
            url.query_pairs_mut().append_pair(key, &value);
        }
        let display_path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.api_key);
        if let Some(b) = body {
            request = request.json(b);
        }

        let resp = request.send().await.map_err(ClientError::Request)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                method,
                path: display_path,
                status: status.as_u16(),
                body,
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await.map_err(ClientError::Request)?;
        decode_body(content_type.as_deref(), text)
    }

    // --- Endpoints (devices) ---

    /// `GET /endpoints` — list endpoints, optionally filtered by region/location.
    pub async fn list_endpoints(
        &self,
        region_id: Option<i64>,
        location_id: Option<i64>,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path("/endpoints"),
            &[
                ("regionId", region_id.map(|v| v.to_string())),
                ("locationId", location_id.map(|v| v.to_string())),
            ],
            None,
        )
        .await
    }

    /// `GET /endpoints/{id}`
    pub async fn get_endpoint(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/endpoints/{}", id)),
            &[],
            None,
        )
        .await
    }

    /// `GET /endpoints/{id}/settings`
    pub async fn get_endpoint_settings(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/endpoints/{}/settings", id)),
            &[],
            None,
        )
        .await
    }

    /// `POST /endpoints/{id}/config` — push a configuration fragment to a device.
    /// The payload shape is caller-defined, so it arrives here pre-parsed.
    pub async fn apply_endpoint_config(
        &self,
        id: &str,
        config: &Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::POST,
            &self.org_path(&format!("/endpoints/{}/config", id)),
            &[],
            Some(config),
        )
        .await
    }

    /// `POST /endpoints/{id}/reboot`
    pub async fn reboot_endpoint(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::POST,
            &self.org_path(&format!("/endpoints/{}/reboot", id)),
            &[],
            None,
        )
        .await
    }

    /// `DELETE /endpoints/{id}` — remove a device from the organization.
    pub async fn delete_endpoint(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/endpoints/{}", id)),
            &[],
            None,
        )
        .await
    }

    /// `GET /endpoints/{id}/sensor` — latest sensor readings for one device.
    pub async fn get_endpoint_sensor(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/endpoints/{}/sensor", id)),
            &[],
            None,
        )
        .await
    }

    /// `POST /endpoints/sensor` — sensor readings for a batch of devices.
    pub async fn bulk_endpoint_sensor(&self, ids: &[String]) -> Result<ApiResponse, ClientError> {
        let body = json!({ "endpointIds": ids });
        self.send(
            Method::POST,
            &self.org_path("/endpoints/sensor"),
            &[],
            Some(&body),
        )
        .await
    }

    // --- Rooms ---

    /// `GET /rooms` — list rooms, optionally filtered by region/location.
    pub async fn list_rooms(
        &self,
        region_id: Option<i64>,
        location_id: Option<i64>,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path("/rooms"),
            &[
                ("regionId", region_id.map(|v| v.to_string())),
                ("locationId", location_id.map(|v| v.to_string())),
            ],
            None,
        )
        .await
    }

    /// `GET /rooms/{id}`
    pub async fn get_room(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/rooms/{}", id)),
            &[],
            None,
        )
        .await
    }

    /// `POST /rooms`
    pub async fn create_room(
        &self,
        name: &str,
        location_id: Option<i64>,
        profile_id: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({ "name": name });
        if let Some(l) = location_id {
            body["locationId"] = json!(l);
        }
        if let Some(p) = profile_id {
            body["profileId"] = json!(p);
        }
        self.send(Method::POST, &self.org_path("/rooms"), &[], Some(&body))
            .await
    }

    /// `PATCH /rooms/{id}` — partial update; only supplied fields are sent.
    pub async fn update_room(
        &self,
        id: &str,
        name: Option<&str>,
        location_id: Option<i64>,
        profile_id: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({});
        if let Some(n) = name {
            body["name"] = json!(n);
        }
        if let Some(l) = location_id {
            body["locationId"] = json!(l);
        }
        if let Some(p) = profile_id {
            body["profileId"] = json!(p);
        }
        self.send(
            Method::PATCH,
            &self.org_path(&format!("/rooms/{}", id)),
            &[],
            Some(&body),
        )
        .await
    }

    /// `DELETE /rooms/{id}`
    pub async fn delete_room(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/rooms/{}", id)),
            &[],
            None,
        )
        .await
    }

    /// `GET /rooms/{id}/sensor`
    pub async fn get_room_sensor(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/rooms/{}/sensor", id)),
            &[],
            None,
        )
        .await
    }

    /// `POST /rooms/sensor` — sensor readings for a batch of rooms.
    pub async fn bulk_room_sensor(&self, ids: &[String]) -> Result<ApiResponse, ClientError> {
        let body = json!({ "roomIds": ids });
        self.send(Method::POST, &self.org_path("/rooms/sensor"), &[], Some(&body))
            .await
    }

    /// `POST /rooms/{id}/enrollment-code` — invalidate and regenerate the
    /// code devices use to enroll into this room.
    pub async fn regenerate_enrollment_code(
        &self,
        room_id: &str,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::POST,
            &self.org_path(&format!("/rooms/{}/enrollment-code", room_id)),
            &[],
            None,
        )
        .await
    }

    // --- Locations (numeric ids) ---

    /// `GET /locations`
    pub async fn list_locations(&self) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, &self.org_path("/locations"), &[], None)
            .await
    }

    /// `POST /locations`
    pub async fn create_location(
        &self,
        name: &str,
        region_id: Option<i64>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({ "name": name });
        if let Some(r) = region_id {
            body["regionId"] = json!(r);
        }
        self.send(Method::POST, &self.org_path("/locations"), &[], Some(&body))
            .await
    }

    /// `PATCH /locations/{id}`
    pub async fn update_location(
        &self,
        id: i64,
        name: Option<&str>,
        region_id: Option<i64>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({});
        if let Some(n) = name {
            body["name"] = json!(n);
        }
        if let Some(r) = region_id {
            body["regionId"] = json!(r);
        }
        self.send(
            Method::PATCH,
            &self.org_path(&format!("/locations/{}", id)),
            &[],
            Some(&body),
        )
        .await
    }

    /// `DELETE /locations/{id}`
    pub async fn delete_location(&self, id: i64) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/locations/{}", id)),
            &[],
            None,
        )
        .await
    }

    // --- Regions (numeric ids) ---

    /// `GET /regions`
    pub async fn list_regions(&self) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, &self.org_path("/regions"), &[], None)
            .await
    }

    /// `POST /regions`
    pub async fn create_region(&self, name: &str) -> Result<ApiResponse, ClientError> {
        let body = json!({ "name": name });
        self.send(Method::POST, &self.org_path("/regions"), &[], Some(&body))
            .await
    }

    /// `PATCH /regions/{id}`
    pub async fn update_region(
        &self,
        id: i64,
        name: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({});
        if let Some(n) = name {
            body["name"] = json!(n);
        }
        self.send(
            Method::PATCH,
            &self.org_path(&format!("/regions/{}", id)),
            &[],
            Some(&body),
        )
        .await
    }

    /// `DELETE /regions/{id}`
    pub async fn delete_region(&self, id: i64) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/regions/{}", id)),
            &[],
            None,
        )
        .await
    }

    // --- Profiles ---

    /// `GET /profiles` — list configuration profiles.
    pub async fn list_profiles(&self) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, &self.org_path("/profiles"), &[], None)
            .await
    }

    // --- Users ---

    /// `GET /users`
    pub async fn list_users(&self) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, &self.org_path("/users"), &[], None)
            .await
    }

    /// `POST /users`
    pub async fn create_user(
        &self,
        email: &str,
        role: &str,
        name: Option<&str>,
        region_ids: Option<&[i64]>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({ "email": email, "role": role });
        if let Some(n) = name {
            body["name"] = json!(n);
        }
        if let Some(r) = region_ids {
            body["regionIds"] = json!(r);
        }
        self.send(Method::POST, &self.org_path("/users"), &[], Some(&body))
            .await
    }

    /// `PATCH /users/{id}`
    pub async fn update_user(
        &self,
        id: &str,
        email: Option<&str>,
        role: Option<&str>,
        name: Option<&str>,
        region_ids: Option<&[i64]>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({});
        if let Some(e) = email {
            body["email"] = json!(e);
        }
        if let Some(r) = role {
            body["role"] = json!(r);
        }
        if let Some(n) = name {
            body["name"] = json!(n);
        }
        if let Some(r) = region_ids {
            body["regionIds"] = json!(r);
        }
        self.send(
            Method::PATCH,
            &self.org_path(&format!("/users/{}", id)),
            &[],
            Some(&body),
        )
        .await
    }

    /// `DELETE /users/{id}`
    pub async fn delete_user(&self, id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/users/{}", id)),
            &[],
            None,
        )
        .await
    }

    // --- Audit logs ---

    /// `GET /auditlogs` — date-range filtered, token-paginated audit trail.
    pub async fn list_audit_logs(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        page_size: Option<i64>,
        page_token: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path("/auditlogs"),
            &[
                ("from", from.map(str::to_string)),
                ("to", to.map(str::to_string)),
                ("pageSize", page_size.map(|v| v.to_string())),
                ("pageToken", page_token.map(str::to_string)),
            ],
            None,
        )
        .await
    }

    // --- Bug reports ---

    /// `POST /bugreports` — trigger bug-report generation on a set of devices.
    pub async fn generate_bug_report(
        &self,
        endpoint_ids: &[String],
        upload: Option<bool>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({ "endpointIds": endpoint_ids });
        if let Some(u) = upload {
            body["upload"] = json!(u);
        }
        self.send(Method::POST, &self.org_path("/bugreports"), &[], Some(&body))
            .await
    }

    // --- Room notes ---

    /// `GET /rooms/{roomId}/notes`
    pub async fn list_room_notes(&self, room_id: &str) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/rooms/{}/notes", room_id)),
            &[],
            None,
        )
        .await
    }

    /// `GET /rooms/{roomId}/notes/{noteId}`
    pub async fn get_room_note(
        &self,
        room_id: &str,
        note_id: &str,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::GET,
            &self.org_path(&format!("/rooms/{}/notes/{}", room_id, note_id)),
            &[],
            None,
        )
        .await
    }

    /// `POST /rooms/{roomId}/notes` — the note payload shape is caller-defined,
    /// so it arrives here pre-parsed.
    pub async fn create_room_note(
        &self,
        room_id: &str,
        note: &Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::POST,
            &self.org_path(&format!("/rooms/{}/notes", room_id)),
            &[],
            Some(note),
        )
        .await
    }

    /// `DELETE /rooms/{roomId}/notes/{noteId}`
    pub async fn delete_room_note(
        &self,
        room_id: &str,
        note_id: &str,
    ) -> Result<ApiResponse, ClientError> {
        self.send(
            Method::DELETE,
            &self.org_path(&format!("/rooms/{}/notes/{}", room_id, note_id)),
            &[],
            None,
        )
        .await
    }

    /// `GET /notes` — notes across all rooms in the organization.
    pub async fn list_all_notes(&self) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, &self.org_path("/notes"), &[], None)
            .await
    }
}

/// Keep only the query parameters the caller actually supplied.
/// Each parameter is kept or dropped independently.
fn defined_params<'a>(params: &'a [(&'a str, Option<String>)]) -> Vec<(&'a str, String)> {
    params
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (*key, v.clone())))
        .collect()
}

/// Decode a success body by its declared content type: JSON media types are
/// parsed (a parse failure is fatal for the call), everything else is text.
fn decode_body(content_type: Option<&str>, body: String) -> Result<ApiResponse, ClientError> {
    let is_json = content_type
        .map(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&body)
            .map(ApiResponse::Json)
            .map_err(|e| ClientError::Protocol(format!("Invalid JSON in response body: {}", e)))
    } else {
        Ok(ApiResponse::Text(body))
    }
}

/// Errors returned by [`PulseClient`] methods.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP transport error (connection refused, DNS failure, etc.).
    Request(reqwest::Error),
    /// The service returned a non-success HTTP status.
    Api {
        method: Method,
        path: String,
        status: u16,
        body: String,
    },
    /// The response declared JSON but did not parse, or the URL was invalid.
    Protocol(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Request(e) => write!(f, "HTTP request failed: {}", e),
            ClientError::Api {
                method,
                path,
                status,
                body,
            } => write!(f, "{} {} failed with HTTP {}: {}", method, path, status, body),
            ClientError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> PulseClient {
        PulseClient::new(ClientConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            org_id: "org1".into(),
        })
        .unwrap()
    }

    #[test]
    fn defined_params_drops_absent_values() {
        let params = [
            ("regionId", Some("7".to_string())),
            ("locationId", None),
            ("pageToken", Some("abc".to_string())),
        ];
        assert_eq!(
            defined_params(&params),
            vec![("regionId", "7".to_string()), ("pageToken", "abc".to_string())]
        );
    }

    #[test]
    fn defined_params_all_absent_is_empty() {
        let params = [("regionId", None), ("locationId", None)];
        assert_eq!(defined_params(&params), Vec::<(&str, String)>::new());
    }

    #[test]
    fn decode_json_content_type() {
        let out = decode_body(Some("application/json"), r#"{"id":"abc"}"#.into()).unwrap();
        assert_eq!(out, ApiResponse::Json(json!({ "id": "abc" })));
    }

    #[test]
    fn decode_json_with_charset_param() {
        let out = decode_body(Some("application/json; charset=utf-8"), "[1,2,3]".into()).unwrap();
        assert_eq!(out, ApiResponse::Json(json!([1, 2, 3])));
    }

    #[test]
    fn decode_json_suffix_media_type() {
        let out = decode_body(Some("application/problem+json"), "{}".into()).unwrap();
        assert_eq!(out, ApiResponse::Json(json!({})));
    }

    #[test]
    fn decode_text_content_type() {
        let out = decode_body(Some("text/plain"), "pong".into()).unwrap();
        assert_eq!(out, ApiResponse::Text("pong".into()));
    }

    #[test]
    fn decode_missing_content_type_is_text() {
        let out = decode_body(None, "raw".into()).unwrap();
        assert_eq!(out, ApiResponse::Text("raw".into()));
    }

    #[test]
    fn decode_invalid_json_is_protocol_error() {
        let err = decode_body(Some("application/json"), "{not json".into()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = PulseClient::new(ClientConfig {
            base_url: "https://example.invalid".into(),
            api_key: "".into(),
            org_id: "org1".into(),
        })
        .unwrap_err();
        assert!(err.contains("API key"));
    }

    #[test]
    fn empty_org_id_is_rejected() {
        let err = PulseClient::new(ClientConfig {
            base_url: "https://example.invalid".into(),
            api_key: "k".into(),
            org_id: "".into(),
        })
        .unwrap_err();
        assert!(err.contains("organization"));
    }

    #[tokio::test]
    async fn http_error_carries_method_path_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/endpoints/e1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = test_client(&server).get_endpoint("e1").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GET"), "missing method: {msg}");
        assert!(msg.contains("/orgs/org1/endpoints/e1"), "missing path: {msg}");
        assert!(msg.contains("404"), "missing status: {msg}");
        assert!(msg.contains("not found"), "missing body: {msg}");
    }

    #[tokio::test]
    async fn list_endpoints_serializes_only_supplied_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/endpoints"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.list_endpoints(Some(7), None).await.unwrap();
        client.list_endpoints(None, None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("regionId=7"));
        assert_eq!(requests[1].url.query(), None);
    }

    #[tokio::test]
    async fn every_request_carries_auth_and_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        test_client(&server).list_profiles().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        assert_eq!(
            headers.get("authorization").unwrap().to_str().unwrap(),
            "Bearer test-key"
        );
        assert_eq!(
            headers.get("content-type").unwrap().to_str().unwrap(),
            "application/json"
        );
        assert_eq!(
            headers.get("accept").unwrap().to_str().unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn create_user_body_omits_absent_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/org1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        test_client(&server)
            .create_user("ops@example.com", "owner", None, None)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["email"], "ops@example.com");
        assert_eq!(body["role"], "owner");
        assert!(body.get("regionIds").is_none());
        assert!(body.get("name").is_none());
    }

    #[tokio::test]
    async fn bulk_sensor_body_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/org1/endpoints/sensor"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let ids = vec!["e1".to_string(), "e2".to_string()];
        test_client(&server).bulk_endpoint_sensor(&ids).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({ "endpointIds": ["e1", "e2"] }));
    }

    #[tokio::test]
    async fn audit_log_pagination_params_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/auditlogs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        test_client(&server)
            .list_audit_logs(Some("2026-08-01T00:00:00Z"), None, Some(50), Some("tok"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap();
        assert!(query.contains("from=2026-08-01T00"));
        assert!(query.contains("pageSize=50"));
        assert!(query.contains("pageToken=tok"));
        assert!(!query.contains("to="));
    }

    #[tokio::test]
    async fn success_json_body_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org1/endpoints/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"id":"abc"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let out = test_client(&server).get_endpoint("abc").await.unwrap();
        assert_eq!(out, ApiResponse::Json(json!({ "id": "abc" })));
    }

    #[tokio::test]
    async fn success_text_body_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/org1/endpoints/e1/reboot"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("accepted", "text/plain"))
            .mount(&server)
            .await;

        let out = test_client(&server).reboot_endpoint("e1").await.unwrap();
        assert_eq!(out, ApiResponse::Text("accepted".into()));
    }
}
