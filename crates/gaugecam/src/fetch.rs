//! Frame acquisition from the camera snapshot endpoint.
//!
//! One blocking HTTP GET per call, payload decoded as an image. No retry,
//! no timeout: a failure here is fatal to the control loop and is surfaced
//! as a [`FetchError`] for the caller to propagate.

use image::RgbImage;
use log::debug;
use std::io::Read;
use thiserror::Error;

/// Acquisition failure: the endpoint was unreachable, the body could not
/// be read, or the payload was not a decodable image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("failed to read snapshot body: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to decode snapshot image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Blocking client for a single-snapshot camera endpoint.
pub struct SnapshotClient {
    url: String,
    agent: ureq::Agent,
}

impl SnapshotClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: ureq::agent(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode one frame. One network round-trip per call.
    pub fn fetch(&self) -> Result<RgbImage, FetchError> {
        let response = self.agent.get(&self.url).call().map_err(Box::new)?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        debug!("fetched {} bytes from {}", bytes.len(), self.url);
        let decoded = image::load_from_memory(&bytes)?;
        Ok(decoded.into_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failure_is_reported_as_decode() {
        // the decode path is shared with fetch(); drive it directly
        let err = image::load_from_memory(b"not an image").unwrap_err();
        let err = FetchError::from(err);
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.to_string().contains("decode"));
    }
}
