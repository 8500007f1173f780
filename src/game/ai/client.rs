//! Advisor clients
//!
//! [`GeminiAdvisor`] asks the generative-language API for one suggested hop;
//! [`AdvisorChat`] holds an open-ended conversation about the position.
//! Every failure (no key, timeout, HTTP error, unparsable reply) degrades to
//! "no suggestion" or a fixed fallback answer and is logged as a warning.
//!
//! Suggestions are never trusted: [`vet_suggestion`] resolves them against the
//! legal set before anything can be played.

use crate::game::ai::resource::AdvisorConfig;
use async_trait::async_trait;
use draughts_engine::api::find_legal_move;
use draughts_engine::{Board, Game, Move, Position, Side};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer given when the chat assistant cannot be reached
pub const CHAT_FALLBACK: &str = "Deep in thought... Ask again in a moment!";

/// Square reference as returned by the model; may be out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareRef {
    pub row: i64,
    pub col: i64,
}

impl SquareRef {
    pub fn to_position(self) -> Option<Position> {
        let row = i8::try_from(self.row).ok()?;
        let col = i8::try_from(self.col).ok()?;
        Position::new(row, col)
    }
}

/// Unvetted `(from, to)` pair proposed by an advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub from: SquareRef,
    pub to: SquareRef,
}

/// Source of move suggestions
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Suggest one hop for `side`; `None` when nothing usable came back
    async fn suggest(&self, board: &Board, side: Side) -> Option<Suggestion>;
}

/// Advisor used when the assistant is disabled or has no key
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdvisor;

#[async_trait]
impl Advisor for NoAdvisor {
    async fn suggest(&self, _board: &Board, _side: Side) -> Option<Suggestion> {
        None
    }
}

/// Resolve a suggestion into a legal hop of the current game
pub fn vet_suggestion(game: &Game, suggestion: Suggestion) -> Option<Move> {
    let from = suggestion.from.to_position()?;
    let to = suggestion.to.to_position()?;
    let mv = find_legal_move(game, from, to);
    if mv.is_none() {
        debug!("[ADVISOR] Discarding illegal suggestion {} -> {}", from, to);
    }
    mv
}

/// Pick the advisor for `config`
pub fn build_advisor(config: &AdvisorConfig) -> Arc<dyn Advisor> {
    match GeminiAdvisor::new(config) {
        Some(advisor) => {
            info!("[ADVISOR] Using model {}", config.model);
            Arc::new(advisor)
        }
        None => {
            info!("[ADVISOR] Advisor unavailable; hints disabled");
            Arc::new(NoAdvisor)
        }
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::First => "White",
        Side::Second => "Black",
    }
}

fn board_json(board: &Board) -> String {
    serde_json::to_string(&board.token_grid()).unwrap_or_default()
}

/// Prompt for a single move suggestion
pub fn suggestion_prompt(board: &Board, side: Side) -> String {
    let player = side.letter();
    format!(
        "You are a professional Dama (Checkers) grandmaster AI.\n\
         Analyze this 8x8 checkers board and suggest the absolute best move for player '{player}'.\n\
         Board rules: diagonals only; men slide forward and capture in all four directions; \
         kings move and capture along whole diagonals.\n\
         Current Board: {board}\n\
         Current Player: {player}\n\n\
         Return the move in JSON format strictly matching this schema:\n\
         {{ \"from\": {{ \"row\": number, \"col\": number }}, \"to\": {{ \"row\": number, \"col\": number }} }}\n\
         Only return the JSON. No other text.",
        player = player,
        board = board_json(board),
    )
}

/// System instruction for the chat assistant
pub fn chat_instruction(board: &Board, side: Side) -> String {
    format!(
        "You are a \"Dama Master\", a friendly and professional checkers grandmaster.\n\
         The current player is {}.\n\
         The board state is: {}.\n\
         Help the user with strategy, explain moves, or just chat about Dama. \
         Keep responses concise and encouraging.\n\
         Rules: captures are possible in all 4 directions for everyone, but kings move long distances.",
        side_name(side),
        board_json(board),
    )
}

/// Parse the model's text into a suggestion
///
/// Tolerates surrounding whitespace and a fenced code block.
pub fn parse_suggestion(text: &str) -> Option<Suggestion> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body).ok()
}

// ============================================================================
// HTTP plumbing
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatTurn {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ChatTurn>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .find_map(|c| c.content)
            .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
    }
}

/// Shared request machinery for both clients
#[derive(Debug, Clone)]
struct GeminiHttp {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiHttp {
    fn new(config: &AdvisorConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = config.api_key.clone()?;
        let http = match reqwest::Client::builder().timeout(config.timeout()).build() {
            Ok(http) => http,
            Err(e) => {
                warn!("[ADVISOR] Failed to build HTTP client: {}", e);
                return None;
            }
        };
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Some(Self { http, url, api_key })
    }

    async fn generate(&self, body: serde_json::Value) -> Result<String, String> {
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let parsed: GenerateResponse = response.json().await.map_err(|e| e.to_string())?;
        parsed
            .first_text()
            .ok_or_else(|| "response carried no text".to_string())
    }
}

/// One-shot move suggestions from the generative-language API
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: GeminiHttp,
}

impl GeminiAdvisor {
    /// `None` if the advisor is disabled or has no API key
    pub fn new(config: &AdvisorConfig) -> Option<Self> {
        GeminiHttp::new(config).map(|client| Self { client })
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn suggest(&self, board: &Board, side: Side) -> Option<Suggestion> {
        let square = json!({
            "type": "OBJECT",
            "properties": {
                "row": { "type": "INTEGER" },
                "col": { "type": "INTEGER" }
            },
            "required": ["row", "col"]
        });
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": suggestion_prompt(board, side) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": { "from": square, "to": square },
                    "required": ["from", "to"]
                }
            }
        });

        let text = match self.client.generate(body).await {
            Ok(text) => text,
            Err(e) => {
                warn!("[ADVISOR] Suggestion request failed: {}", e);
                return None;
            }
        };

        let suggestion = parse_suggestion(&text);
        if suggestion.is_none() {
            warn!("[ADVISOR] Unparsable suggestion: {}", text.trim());
        }
        suggestion
    }
}

/// Conversational assistant seeded with the current position
///
/// Turn history is kept in memory for the lifetime of the chat.
#[derive(Debug, Clone)]
pub struct AdvisorChat {
    client: Option<GeminiHttp>,
    history: Vec<ChatTurn>,
}

impl AdvisorChat {
    pub fn new(config: &AdvisorConfig) -> Self {
        Self {
            client: GeminiHttp::new(config),
            history: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Number of exchanged messages (questions and answers)
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    /// Ask a question about the position; never fails
    pub async fn ask(&mut self, board: &Board, side: Side, question: &str) -> String {
        let Some(client) = &self.client else {
            return CHAT_FALLBACK.to_string();
        };

        self.history.push(ChatTurn {
            role: "user".to_string(),
            parts: vec![Part {
                text: Some(question.to_string()),
            }],
        });
        let body = json!({
            "systemInstruction": { "parts": [{ "text": chat_instruction(board, side) }] },
            "contents": self.history,
        });

        match client.generate(body).await {
            Ok(answer) => {
                self.history.push(ChatTurn {
                    role: "model".to_string(),
                    parts: vec![Part {
                        text: Some(answer.clone()),
                    }],
                });
                answer
            }
            Err(e) => {
                warn!("[ADVISOR] Chat request failed: {}", e);
                self.history.pop();
                CHAT_FALLBACK.to_string()
            }
        }
    }
}
