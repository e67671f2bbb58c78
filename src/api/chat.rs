use axum::extract::{Multipart, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::session::Principal;
use crate::api::state::AppState;
use crate::db::{MessageRepository, NewMessage};
use crate::error::AppError;

/// Fixed retrieval window: the most recent 100 records, best effort.
const LIST_LIMIT: usize = 100;

const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[derive(Debug, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub msg: String,
    #[serde(default = "default_sender")]
    pub sender: String,
}

fn default_sender() -> String {
    "unknown".to_string()
}

#[derive(Debug, Serialize)]
struct MessageView {
    sender: String,
    text: String,
    image_url: String,
    timestamp: String,
}

/// Device label from the User-Agent header. Case-sensitive substring match,
/// fixed priority: iPhone, then Android, then Windows (as "PC").
fn guess_sender_from_ua(headers: &HeaderMap) -> String {
    let ua = headers
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if ua.contains("iPhone") {
        "iPhone"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Windows") {
        "PC"
    } else {
        "unknown"
    }
    .to_string()
}

/// Lower-cased extension after the last dot, checked against the supported
/// image formats.
fn file_extension(filename: &str) -> Result<String, AppError> {
    let ext = match filename.rfind('.') {
        Some(idx) => filename[idx..].to_lowercase(),
        None => {
            return Err(AppError::Validation(
                "Unsupported file type: no extension.".to_string(),
            ))
        }
    };

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation("Unsupported file type.".to_string()));
    }

    Ok(ext)
}

/// Collision-resistant blob name: microsecond-precision timestamp plus the
/// validated extension.
fn blob_name(ext: &str) -> String {
    format!("img_{}{}", chrono::Utc::now().format("%Y%m%d%H%M%S%6f"), ext)
}

/// POST /send (requires session)
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Principal,
    Form(form): Form<SendForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let sender = if form.sender == "unknown" {
        guess_sender_from_ua(&headers)
    } else {
        form.sender
    };

    let record = NewMessage::new(sender, form.msg, String::new(), user.sub)?;
    MessageRepository::append(&state.db, record).await?;

    Ok(Json(serde_json::json!({"status": "Message received"})))
}

/// POST /send-image (requires session). Multipart fields: `file` (required),
/// `sender`, `text`. The blob upload must succeed before the record is
/// written; an aborted upload leaves no record behind.
pub async fn send_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Principal,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut sender = default_sender();
    let mut text = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("sender") => {
                sender = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed field: {}", e)))?;
            }
            Some("text") => {
                text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed field: {}", e)))?;
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded.".to_string()))?;
    if filename.is_empty() {
        return Err(AppError::Validation("No file uploaded.".to_string()));
    }

    let ext = file_extension(&filename)?;
    let image_url = state.blobs.put(&blob_name(&ext), &bytes).await?;

    let sender = if sender == "unknown" || sender.is_empty() {
        guess_sender_from_ua(&headers)
    } else {
        sender
    };

    let record = NewMessage::new(sender, text, image_url.clone(), user.sub)?;
    MessageRepository::append(&state.db, record).await?;

    Ok(Json(
        serde_json::json!({"status": "Image received", "image_url": image_url}),
    ))
}

/// GET /messages (requires session). The most recent 100 records for the
/// caller, oldest first, with owner and record ids projected away.
pub async fn get_messages(
    State(state): State<AppState>,
    user: Principal,
) -> Result<Json<serde_json::Value>, AppError> {
    let records = MessageRepository::list_by_owner(&state.db, &user.sub, LIST_LIMIT).await?;

    let messages: Vec<MessageView> = records
        .into_iter()
        .map(|m| MessageView {
            sender: m.sender,
            text: m.text,
            image_url: m.image_url,
            timestamp: m.timestamp,
        })
        .collect();

    Ok(Json(serde_json::json!({ "messages": messages })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_ua(ua: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(ua).unwrap());
        headers
    }

    #[test]
    fn classifier_matches_known_devices() {
        let cases = [
            ("Mozilla/5.0 (iPhone; CPU iPhone OS 13_5 like Mac OS X)", "iPhone"),
            ("Mozilla/5.0 (Linux; Android 10) AppleWebKit/537.36", "Android"),
            ("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36", "PC"),
            ("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)", "unknown"),
        ];
        for (ua, expected) in cases {
            assert_eq!(guess_sender_from_ua(&headers_with_ua(ua)), expected);
        }
    }

    #[test]
    fn classifier_priority_iphone_over_android_over_windows() {
        assert_eq!(
            guess_sender_from_ua(&headers_with_ua("iPhone Android Windows")),
            "iPhone"
        );
        assert_eq!(
            guess_sender_from_ua(&headers_with_ua("Android Windows")),
            "Android"
        );
    }

    #[test]
    fn classifier_handles_missing_or_empty_header() {
        assert_eq!(guess_sender_from_ua(&HeaderMap::new()), "unknown");
        assert_eq!(guess_sender_from_ua(&headers_with_ua("")), "unknown");
    }

    #[test]
    fn classifier_is_case_sensitive() {
        assert_eq!(guess_sender_from_ua(&headers_with_ua("iphone")), "unknown");
    }

    #[test]
    fn extension_check_accepts_supported_types_case_insensitively() {
        assert_eq!(file_extension("photo.JPG").unwrap(), ".jpg");
        assert_eq!(file_extension("photo.png").unwrap(), ".png");
        assert_eq!(file_extension("a.b.webp").unwrap(), ".webp");
    }

    #[test]
    fn extension_check_rejects_missing_extension() {
        let err = file_extension("photo").unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("extension"));
                assert!(msg.contains("Unsupported file type"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn extension_check_rejects_unsupported_types() {
        for name in ["photo.bmp", "pic.exe", "archive.tar.gz", "dotfile."] {
            let err = file_extension(name).unwrap_err();
            match err {
                AppError::Validation(msg) => assert!(msg.contains("Unsupported file type")),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn blob_names_carry_prefix_and_extension() {
        let name = blob_name(".png");
        assert!(name.starts_with("img_"));
        assert!(name.ends_with(".png"));
        // img_ + YYYYmmddHHMMSS + 6 fractional digits + .png
        assert_eq!(name.len(), "img_".len() + 20 + ".png".len());
    }
}
