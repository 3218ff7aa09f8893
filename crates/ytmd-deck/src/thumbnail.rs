//! Artwork → key icon.
//!
//! The companion server hands out artwork URLs of arbitrary size. A key
//! icon is a fixed 100×100 square, embedded as a PNG data URL.

use anyhow::{Context, Result};
use base64::prelude::*;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;

pub const THUMBNAIL_SIZE: u32 = 100;

/// One-entry cache per context: the last artwork URL seen and the last icon
/// rendered. A failed fetch leaves the previous icon in place.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailCache {
    last_url: Option<String>,
    payload: Option<String>,
}

impl ThumbnailCache {
    /// Record `url` as current. True when it differs from the last one, in
    /// which case the caller should fetch it.
    pub fn observe(&mut self, url: &str) -> bool {
        if self.last_url.as_deref() == Some(url) {
            return false;
        }
        self.last_url = Some(url.to_string());
        true
    }

    /// Store a rendered icon if it still belongs to the current URL.
    pub fn accept(&mut self, url: &str, payload: String) -> bool {
        if self.last_url.as_deref() != Some(url) {
            return false;
        }
        self.payload = Some(payload);
        true
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Decode, squash to `THUMBNAIL_SIZE`² without keeping the aspect ratio and
/// re-encode as a PNG data URL.
pub fn render_data_url(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes).context("Failed to decode artwork")?;
    let resized = img.resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);

    let mut png = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode thumbnail")?;

    Ok(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&png)))
}

pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch artwork")?;

    if !response.status().is_success() {
        anyhow::bail!("Artwork fetch returned status: {}", response.status());
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read artwork body")?;

    render_data_url(&bytes)
}
