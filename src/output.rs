//! JSON response types and formatting for CLI output.

use serde::Serialize;

use agent_kdb::{Fragment, Metadata, RetrievalResult};

/// Response for a recorded exchange.
#[derive(Serialize)]
pub struct RecordResponse {
    pub status: String,
    pub id: String,
}

/// Response for nearest-neighbor retrieval.
#[derive(Serialize)]
pub struct RetrieveResponse {
    pub results: Vec<RetrieveItem>,
}

/// Individual retrieval hit.
#[derive(Serialize)]
pub struct RetrieveItem {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    pub query: Option<String>,
    pub distance: f64,
}

impl From<RetrievalResult> for RetrieveItem {
    fn from(result: RetrievalResult) -> Self {
        RetrieveItem {
            source: result.source().map(str::to_string),
            query: result.query().map(str::to_string),
            id: result.id,
            text: result.text,
            distance: result.distance,
        }
    }
}

/// Response for the augmented prompt.
#[derive(Serialize)]
pub struct ContextResponse {
    pub prompt: String,
    pub context_used: usize,
}

/// Response for retrieving a specific fragment.
#[derive(Serialize)]
pub struct GetResponse {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Fragment> for GetResponse {
    fn from(fragment: Fragment) -> Self {
        GetResponse {
            id: fragment.id,
            text: fragment.text,
            metadata: fragment.metadata,
            created_at: fragment.created_at,
            updated_at: fragment.updated_at,
        }
    }
}

/// Response for listing fragments.
#[derive(Serialize)]
pub struct ListResponse {
    pub fragments: Vec<ListItem>,
}

/// Individual list item.
#[derive(Serialize)]
pub struct ListItem {
    pub id: String,
    pub text: String,
    pub created_at: String,
}

/// Response for the fragment count.
#[derive(Serialize)]
pub struct CountResponse {
    pub collection: String,
    pub count: usize,
}

/// Response for successful fragment deletion.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub id: String,
}

/// One completed chat turn.
#[derive(Serialize)]
pub struct TurnResponse {
    pub reply: Option<String>,
    pub context_used: usize,
    pub recorded_id: Option<String>,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}
