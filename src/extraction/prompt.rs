//! Prompt assembly for the two extraction tiers.
//!
//! The lite tier works text-only over OCR output; the deep tier sends the
//! screenshot itself as a data-URI image part. Both share one system prompt
//! so tier escalation never changes the output contract.

use crate::extraction::client::{ChatMessage, MessageContent, MessagePart};

/// Shared system prompt. `prompt_version` in config participates in the cache
/// fingerprint, so bump it there whenever this text changes.
pub const SYSTEM_PROMPT: &str = "\
You are a precise data extraction engine for cryptocurrency trading screenshots. \
Extract every closed trade visible and return ONLY a JSON array, no prose. \
Each element: {\"symbol\", \"side\" (long|short), \"entry_price\", \"exit_price\", \
\"position_size\", \"leverage\", \"realized_pnl\", \"funding_fee\", \"trading_fee\", \
\"roi\", \"opened_at\", \"closed_at\", \"notes\"}. \
Use numbers for numeric fields, omit nothing, use 0 or \"\" when a value is not visible.";

/// Messages for a lite (text-only) call over OCR text.
pub fn lite_messages(ocr_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".into(),
            content: MessageContent::Text(SYSTEM_PROMPT.into()),
        },
        ChatMessage {
            role: "user".into(),
            content: MessageContent::Text(format!(
                "OCR text from a trading screenshot follows. Extract the trades.\n\n{ocr_text}"
            )),
        },
    ]
}

/// Messages for a deep (vision) call carrying the screenshot inline.
pub fn deep_messages(image_base64: &str, ocr_text: Option<&str>) -> Vec<ChatMessage> {
    let mut parts = vec![MessagePart::image_data_uri("image/png", image_base64)];
    let instruction = match ocr_text {
        // OCR text rides along as a hint even when the image is authoritative.
        Some(text) if !text.trim().is_empty() => format!(
            "Extract the trades from this screenshot. OCR text (may contain errors):\n\n{text}"
        ),
        _ => "Extract the trades from this screenshot.".to_string(),
    };
    parts.push(MessagePart::text(instruction));

    vec![
        ChatMessage {
            role: "system".into(),
            content: MessageContent::Text(SYSTEM_PROMPT.into()),
        },
        ChatMessage {
            role: "user".into(),
            content: MessageContent::Parts(parts),
        },
    ]
}
