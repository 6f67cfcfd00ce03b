//! Failure taxonomy for the preview pipeline and its collaborators.
//!
//! Each failure domain gets its own error type so callers can apply the
//! recovery policy that domain requires: fetch failures are logged and the
//! prior state stays visible, decode failures surface as an inline viewer
//! message, channel failures close the channel and nothing else.

use thiserror::Error;

/// Network or protocol failure talking to the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. The body is kept verbatim so upload failures can
    /// surface the server's own message.
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("invalid backend URL: {0}")]
    Url(String),
}

/// Malformed or unsupported raster container.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a TIFF container: {0}")]
    InvalidSignature(String),

    #[error("truncated buffer: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// A required internal resource (directory, strip, tile) is absent.
    #[error("missing required {0}")]
    MissingResource(&'static str),

    #[error("unsupported {what}: {value}")]
    Unsupported { what: &'static str, value: u32 },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("image decode failed: {0}")]
    Image(String),
}

/// Notification channel failure. Recovery is "log and let the channel
/// close" -- there is no automatic reconnect.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("websocket connect failed: {0}")]
    Connect(String),

    #[error("websocket transport error: {0}")]
    Transport(String),
}

/// Pipeline-boundary error: everything the preview pipeline can fail with,
/// collapsed to one state with a human-readable message. No partial render
/// target escapes behind one of these.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("could not render raster: {0}")]
    Decode(#[from] DecodeError),

    /// The render task itself failed to run to completion.
    #[error("render task failed: {0}")]
    Render(String),

    /// The selection changed (or the viewer unmounted) before the result
    /// was ready. Not user-visible; the caller drops the result silently.
    #[error("preview cancelled")]
    Cancelled,
}

impl PreviewError {
    /// The fixed explanatory message shown next to the download-original
    /// fallback when rendering fails.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PreviewError::Fetch(e) => format!("Could not load image data: {e}"),
            PreviewError::Decode(_) | PreviewError::Render(_) => {
                "Could not render this raster in the viewer.".to_string()
            }
            PreviewError::Cancelled => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_body_verbatim() {
        let err = FetchError::Status {
            status: 400,
            body: "Formato de imagem n\u{e3}o suportado".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("Formato de imagem"));
    }

    #[test]
    fn decode_error_is_not_user_facing_verbatim() {
        let err = PreviewError::Decode(DecodeError::MissingResource("IFD"));
        assert_eq!(
            err.user_message(),
            "Could not render this raster in the viewer."
        );
    }
}
