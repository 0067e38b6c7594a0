use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_MAX_ATTEMPTS: usize = 3;
const DOWNLOAD_BASE_DELAY_MS: u64 = 400;
// Bot API getFile limit.
const MAX_IMAGE_BYTES: u32 = 20 * 1024 * 1024;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Debug, Clone)]
pub struct IncomingImage {
    pub file_id: FileId,
    pub from_document: bool,
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn is_image(data: &[u8]) -> bool {
    detect_mime_type(data).is_some_and(|mime| mime.starts_with("image/"))
}

fn document_is_image(mime_type: Option<&str>, size: u32) -> bool {
    size <= MAX_IMAGE_BYTES && mime_type.is_some_and(|mime| mime.starts_with("image/"))
}

pub fn incoming_image(message: &Message) -> Option<IncomingImage> {
    if let Some(photo) = message.photo().and_then(|sizes| sizes.last()) {
        return Some(IncomingImage {
            file_id: photo.file.id.clone(),
            from_document: false,
        });
    }
    let document = message.document()?;
    let mime_type = document.mime_type.as_ref().map(|mime| mime.essence_str());
    if !document_is_image(mime_type, document.file.size) {
        return None;
    }
    Some(IncomingImage {
        file_id: document.file.id.clone(),
        from_document: true,
    })
}

fn should_retry_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

async fn backoff(attempt: usize) {
    let delay = Duration::from_millis(DOWNLOAD_BASE_DELAY_MS << attempt);
    tokio::time::sleep(delay).await;
}

async fn download_file(url: &str, file_path: &str) -> Option<Vec<u8>> {
    for attempt in 0..DOWNLOAD_MAX_ATTEMPTS {
        let last_attempt = attempt + 1 == DOWNLOAD_MAX_ATTEMPTS;
        let response = match HTTP_CLIENT.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                let retryable = should_retry_error(&err);
                let (timeout, connect) = (err.is_timeout(), err.is_connect());
                warn!(
                    "Failed to fetch {file_path}: {} (timeout={timeout}, connect={connect}, attempt={}/{})",
                    err.without_url(),
                    attempt + 1,
                    DOWNLOAD_MAX_ATTEMPTS
                );
                if !retryable || last_attempt {
                    return None;
                }
                backoff(attempt).await;
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Download of {file_path} failed with status {status}");
            if !should_retry_status(status) || last_attempt {
                return None;
            }
            backoff(attempt).await;
            continue;
        }

        match response.bytes().await {
            Ok(bytes) => return Some(bytes.to_vec()),
            Err(err) => {
                warn!(
                    "Failed to read {file_path}: {} (attempt={}/{})",
                    err.without_url(),
                    attempt + 1,
                    DOWNLOAD_MAX_ATTEMPTS
                );
                if last_attempt {
                    return None;
                }
                backoff(attempt).await;
            }
        }
    }

    None
}

async fn resolve_file_path(bot: &Bot, file_id: &FileId) -> Result<String> {
    let file = bot.get_file(file_id.clone()).await?;
    Ok(file.path)
}

// Failures yield an empty buffer; the render then goes without a thumbnail.
pub async fn fetch_image(bot: &Bot, image: &IncomingImage) -> Vec<u8> {
    let file_path = match resolve_file_path(bot, &image.file_id).await {
        Ok(path) => path,
        Err(err) => {
            warn!("get_file failed: {err}");
            return Vec::new();
        }
    };
    let url = format!("https://api.telegram.org/file/bot{}/{}", bot.token(), file_path);
    let Some(bytes) = download_file(&url, &file_path).await else {
        return Vec::new();
    };

    if image.from_document && !is_image(&bytes) {
        debug!(
            "Document {file_path} is not an image ({:?})",
            detect_mime_type(&bytes)
        );
        return Vec::new();
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_signature() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(is_image(&png_header));
        assert_eq!(detect_mime_type(&png_header).as_deref(), Some("image/png"));
    }

    #[test]
    fn text_is_not_an_image() {
        assert!(!is_image(b"hello world, plain text"));
    }

    fn document_message(mime_type: &str, file_size: u32) -> Message {
        let raw = format!(
            r#"{{
                "message_id": 7,
                "date": 1700000000,
                "chat": {{"id": 42, "type": "private", "first_name": "Ann"}},
                "from": {{"id": 42, "is_bot": false, "first_name": "Ann"}},
                "document": {{
                    "file_id": "doc-file-id",
                    "file_unique_id": "doc-unique",
                    "file_size": {file_size},
                    "file_name": "upload.bin",
                    "mime_type": "{mime_type}"
                }}
            }}"#
        );
        serde_json::from_str(&raw).expect("document message")
    }

    #[test]
    fn pdf_document_is_not_an_incoming_image() {
        let message = document_message("application/pdf", 1024);
        assert!(incoming_image(&message).is_none());
    }

    #[test]
    fn image_document_is_accepted_as_photo() {
        let image = incoming_image(&document_message("image/jpeg", 1024)).expect("image document");
        assert!(image.from_document);
        assert_eq!(image.file_id.0, "doc-file-id");
    }

    #[test]
    fn documents_need_image_mime_and_size_limit() {
        assert!(document_is_image(Some("image/png"), 10));
        assert!(!document_is_image(Some("image/png"), MAX_IMAGE_BYTES + 1));
        assert!(!document_is_image(Some("video/mp4"), 10));
        assert!(!document_is_image(None, 10));
    }
}
