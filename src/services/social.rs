// src/services/social.rs

//! Social API client.
//!
//! Posts plain-text notes through a Misskey-compatible `notes/create`
//! endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SocialConfig;

/// Request body for `POST /api/notes/create`.
#[derive(Debug, Serialize)]
struct CreateNote<'a> {
    i: &'a str,
    text: &'a str,
    visibility: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateNoteResponse {
    #[serde(rename = "createdNote")]
    created_note: Option<CreatedNote>,
}

#[derive(Debug, Deserialize)]
struct CreatedNote {
    id: String,
}

/// Client for the social posting API.
#[derive(Clone)]
pub struct SocialClient {
    client: Client,
    endpoint: String,
    token: String,
    visibility: String,
}

impl SocialClient {
    /// Create a client posting to `{api_url}/api/notes/create`.
    pub fn new(client: Client, api_url: &str, config: &SocialConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/notes/create", api_url.trim_end_matches('/')),
            token: config.token.clone(),
            visibility: config.visibility.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create one post. Returns the created note id when the API reports it.
    pub async fn create_post(&self, text: &str) -> Result<Option<String>> {
        let body = CreateNote {
            i: &self.token,
            text,
            visibility: &self.visibility,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let payload = response.text().await?;

        if !status.is_success() {
            return Err(AppError::delivery(format!(
                "{} answered {}: {}",
                self.endpoint,
                status,
                payload.trim()
            )));
        }

        // The id is informational only; tolerate bodies we do not understand.
        let note_id = serde_json::from_str::<CreateNoteResponse>(&payload)
            .ok()
            .and_then(|r| r.created_note)
            .map(|n| n.id);
        Ok(note_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        let config = SocialConfig::default();
        let client = SocialClient::new(Client::new(), "https://acme.example/", &config);
        assert_eq!(client.endpoint(), "https://acme.example/api/notes/create");
    }

    #[test]
    fn test_request_body_shape() {
        let body = CreateNote {
            i: "token",
            text: "hello",
            visibility: "home",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "i": "token", "text": "hello", "visibility": "home" })
        );
    }

    #[test]
    fn test_response_note_id() {
        let parsed: CreateNoteResponse =
            serde_json::from_str(r#"{"createdNote":{"id":"9abc","text":"hi"}}"#).unwrap();
        assert_eq!(parsed.created_note.unwrap().id, "9abc");
    }
}
