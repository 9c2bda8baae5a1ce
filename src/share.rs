//! Shareable configuration links.
//!
//! A configuration travels as the `config` query parameter: standard, padded
//! base64 of a small JSON object, e.g.
//! `{"car":"ferrari","color":"ff0000","metalness":0.8,"roughness":0.2}`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::{garage::CarChoice, material::Color};

#[derive(Debug, thiserror::Error)]
pub enum ShareConfigError {
    #[error("config is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("config is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown car '{0}'")]
    UnknownCar(String),

    #[error("invalid colour '{0}'")]
    InvalidColor(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SharePayload {
    car: String,
    color: String,
    metalness: f32,
    roughness: f32,
}

/// The part of a configuration that survives a share link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShareConfig {
    pub car: CarChoice,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
}

impl ShareConfig {
    pub fn encode(&self) -> Result<String, ShareConfigError> {
        let payload = SharePayload {
            car: self.car.key().to_string(),
            color: self.color.to_hex_string(),
            metalness: self.metalness,
            roughness: self.roughness,
        };
        let json = serde_json::to_string(&payload)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, ShareConfigError> {
        // form decoding turns an unescaped '+' into a space
        let bytes = STANDARD.decode(encoded.trim().replace(' ', "+"))?;
        let json = String::from_utf8(bytes)?;
        let payload: SharePayload = serde_json::from_str(&json)?;
        let car = CarChoice::from_key(&payload.car)
            .ok_or_else(|| ShareConfigError::UnknownCar(payload.car.clone()))?;
        let color = Color::parse(&payload.color)
            .ok_or_else(|| ShareConfigError::InvalidColor(payload.color.clone()))?;
        Ok(Self {
            car,
            color,
            metalness: payload.metalness,
            roughness: payload.roughness,
        })
    }

    /// `{origin}{path}?config={base64}`.
    ///
    /// Standard base64 may contain `+`, `/` and `=`; they are percent-encoded
    /// so the link survives query parsing.
    pub fn to_url(&self, origin: &str, path: &str) -> Result<String, ShareConfigError> {
        Ok(share_url(origin, path, &self.encode()?))
    }
}

/// `{origin}{path}?config={encoded}` with the base64 escaped for a query.
pub fn share_url(origin: &str, path: &str, encoded: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("config", encoded)
        .finish();
    format!("{}{}?{}", origin, path, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShareConfig {
        ShareConfig {
            car: CarChoice::Lamborghini,
            color: Color::from_hex(0x12ab34),
            metalness: 0.75,
            roughness: 0.125,
        }
    }

    #[test]
    fn decodes_what_it_encodes() {
        let encoded = sample().encode().unwrap();
        assert_eq!(ShareConfig::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn decodes_hand_written_payload() {
        let json = r#"{"car":"ferrari","color":"ff0000","metalness":0.8,"roughness":0.2}"#;
        let config = ShareConfig::decode(&STANDARD.encode(json)).unwrap();
        assert_eq!(config.car, CarChoice::Ferrari);
        assert_eq!(config.color, Color::from_hex(0xff0000));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            ShareConfig::decode("not base64!"),
            Err(ShareConfigError::Base64(_))
        ));
        assert!(matches!(
            ShareConfig::decode(&STANDARD.encode("{")),
            Err(ShareConfigError::Json(_))
        ));
        let unknown = r#"{"car":"tesla","color":"ff0000","metalness":0.8,"roughness":0.2}"#;
        assert!(matches!(
            ShareConfig::decode(&STANDARD.encode(unknown)),
            Err(ShareConfigError::UnknownCar(car)) if car == "tesla"
        ));
        let bad_color = r#"{"car":"audi","color":"red","metalness":0.8,"roughness":0.2}"#;
        assert!(matches!(
            ShareConfig::decode(&STANDARD.encode(bad_color)),
            Err(ShareConfigError::InvalidColor(_))
        ));
    }

    #[test]
    fn url_has_no_raw_reserved_characters_in_query() {
        let url = sample().to_url("https://cars.example", "/index.html").unwrap();
        let query = url.split_once("?config=").unwrap().1;
        assert!(!query.contains(['+', '/', '=']));
        assert!(url.starts_with("https://cars.example/index.html?config="));
    }

    #[test]
    fn escaped_payload_decodes_back() {
        let encoded = "ab+/cd==";
        let url = share_url("", "/", encoded);
        assert_eq!(url, "/?config=ab%2B%2Fcd%3D%3D");
        let query = url.split_once('?').unwrap().1;
        let (key, value) = form_urlencoded::parse(query.as_bytes()).next().unwrap();
        assert_eq!((key.as_ref(), value.as_ref()), ("config", encoded));
    }
}
