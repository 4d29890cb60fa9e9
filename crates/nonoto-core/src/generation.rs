//! HTTP client for the external generation server
//!
//! All calls are blocking (`ureq`) and must be run off the UI loop. Failures
//! are returned as [`GenerationError`]; callers log them and carry on with an
//! empty result. Nothing is retried.

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::spectrogram::Mask;

/// Token codes exchanged with the spectrogram inpainting endpoints
pub type Codes = Vec<Vec<i64>>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Server answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Serialize)]
struct InpaintRequest<'a> {
    mask: Vec<Vec<u8>>,
    codes: &'a Codes,
}

/// Raw answer of an inpainting command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpectrogramResponse {
    pub codes: Codes,
    pub audio_url: String,
    pub image_url: String,
}

/// Inpainting answer with both media payloads fetched
#[derive(Debug, Clone)]
pub struct InpaintResult {
    pub codes: Codes,
    /// WAV bytes
    pub audio: Vec<u8>,
    /// Spectrogram image bytes (PNG)
    pub image: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    server_url: String,
}

impl GenerationClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Absolute URL of an endpoint, or `path` itself if already absolute
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.server_url, path.trim_start_matches('/'))
    }

    /// Regenerate the quarters `[start_quarter, end_quarter)` of a score
    pub fn timerange_change(&self, musicxml: &str, start_quarter: u32, end_quarter: u32) -> Result<String> {
        let url = format!(
            "{}?start_quarter={}&end_quarter={}",
            self.endpoint("timerange-change"),
            start_quarter,
            end_quarter
        );
        log::info!("Generation: timerange-change [{}, {})", start_quarter, end_quarter);
        let response = Self::check(
            &url,
            ureq::post(&url)
                .set("Content-Type", "application/vnd.recordare.musicxml+xml")
                .send_string(musicxml),
        )?;
        Ok(response.into_string()?)
    }

    /// Convert a score to a standard MIDI file
    pub fn musicxml_to_midi(&self, musicxml: &str) -> Result<Vec<u8>> {
        let url = self.endpoint("musicxml-to-midi");
        log::debug!("Generation: musicxml-to-midi ({} bytes)", musicxml.len());
        let response = Self::check(
            &url,
            ureq::post(&url)
                .set("Content-Type", "application/vnd.recordare.musicxml+xml")
                .send_string(musicxml),
        )?;
        read_bytes(response)
    }

    /// Send an inpainting command for the masked region, without fetching media
    pub fn send_inpaint_command(&self, command: &str, mask: &Mask, codes: &Codes) -> Result<SpectrogramResponse> {
        let url = self.endpoint(command);
        let body = serde_json::to_string(&InpaintRequest {
            mask: mask.to_rows(),
            codes,
        })?;
        log::info!(
            "Generation: {} with {} active cells",
            command,
            mask.active_cells().len()
        );
        let response = Self::check(
            &url,
            ureq::post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body),
        )?;
        Ok(serde_json::from_str(&response.into_string()?)?)
    }

    /// Inpaint and fetch the resulting audio and image
    pub fn inpaint_spectrogram(&self, command: &str, mask: &Mask, codes: &Codes) -> Result<InpaintResult> {
        let response = self.send_inpaint_command(command, mask, codes)?;
        let audio = self.fetch_bytes(&response.audio_url)?;
        let image = self.fetch_bytes(&response.image_url)?;
        Ok(InpaintResult {
            codes: response.codes,
            audio,
            image,
        })
    }

    /// GET a payload, relative to the server or absolute
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(url);
        let response = Self::check(&url, ureq::get(&url).call())?;
        read_bytes(response)
    }

    fn check(url: &str, result: std::result::Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
        match result {
            Ok(response) if response.status() == 200 => Ok(response),
            Ok(response) => Err(GenerationError::Status {
                url: url.to_string(),
                status: response.status(),
            }),
            Err(ureq::Error::Status(status, _)) => Err(GenerationError::Status {
                url: url.to_string(),
                status,
            }),
            Err(e) => Err(GenerationError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

fn read_bytes(response: ureq::Response) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let client = GenerationClient::new("http://localhost:5000/");
        assert_eq!(client.endpoint("/timerange-change"), "http://localhost:5000/timerange-change");
        assert_eq!(client.endpoint("analyze-audio"), "http://localhost:5000/analyze-audio");
        assert_eq!(client.endpoint("https://cdn.example/a.wav"), "https://cdn.example/a.wav");
    }

    #[test]
    fn test_inpaint_request_payload() {
        let mut mask = Mask::new(2, 3);
        mask.set(1, 2, true);
        let codes: Codes = vec![vec![7, 8, 9]];
        let body = serde_json::to_string(&InpaintRequest {
            mask: mask.to_rows(),
            codes: &codes,
        })
        .unwrap();
        assert_eq!(body, r#"{"mask":[[0,0,0],[0,0,1]],"codes":[[7,8,9]]}"#);
    }

    #[test]
    fn test_response_parsing() {
        let response: SpectrogramResponse =
            serde_json::from_str(r#"{"codes":[[1,2]],"audio_url":"/a.wav","image_url":"/a.png"}"#).unwrap();
        assert_eq!(response.codes, vec![vec![1, 2]]);
        assert_eq!(response.audio_url, "/a.wav");
    }
}
