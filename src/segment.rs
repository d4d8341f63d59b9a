//! Photo background removal via an external segmentation service.
//!
//! Best-effort: any failure (network, non-success status, empty body)
//! keeps the original photo so the editing and export flow never blocks
//! on the service being up.

use reqwest::blocking::multipart::{Form, Part};
use tracing::{info, warn};

/// POST the photo to the segmentation endpoint and return the cut-out
/// image bytes, or the unchanged input when the service cannot help.
pub fn remove_background(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    photo: Vec<u8>,
) -> Vec<u8> {
    let part = Part::bytes(photo.clone()).file_name("photo.png");
    let form = Form::new().part("image", part);

    let response = match client.post(endpoint).multipart(form).send() {
        Ok(r) => r,
        Err(err) => {
            warn!(%err, "background removal request failed, keeping original photo");
            return photo;
        }
    };

    if !response.status().is_success() {
        warn!(status = %response.status(), "background removal rejected, keeping original photo");
        return photo;
    }

    match response.bytes() {
        Ok(body) if !body.is_empty() => {
            info!(bytes = body.len(), "background removed");
            body.to_vec()
        }
        Ok(_) => {
            warn!("background removal returned an empty body, keeping original photo");
            photo
        }
        Err(err) => {
            warn!(%err, "background removal body unreadable, keeping original photo");
            photo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unreachable_service_keeps_the_original_photo() {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let photo = vec![1u8, 2, 3, 4];
        let out = remove_background(&client, "http://127.0.0.1:1/segment", photo.clone());
        assert_eq!(out, photo);
    }
}
