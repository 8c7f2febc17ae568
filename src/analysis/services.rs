use std::io::Cursor;

use bytes::Bytes;
use image::ImageFormat;
use serde_json::{Map, Value};

use super::gemini::VisionModel;

pub const CLASSIFY_PROMPT: &str = r#"
Analyze the object in this image.
1. Identify the primary object (e.g., "black t-shirt", "running shoes", "wireless headphones").
2. Provide a reasonable, estimated carbon footprint for the production of this single item in kg CO2e.
Return the response ONLY as a valid JSON object with two keys: "object_name" and "carbon_footprint".
For example: {"object_name": "cotton t-shirt", "carbon_footprint": 5.5}
The value for carbon_footprint must be a number, not a string.
"#;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("read upload: {0}")]
    Read(#[source] anyhow::Error),

    #[error("upload exceeds the {limit} byte body limit")]
    TooLarge { limit: usize },

    #[error("decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("model call: {0:#}")]
    Model(#[source] anyhow::Error),

    #[error("model output is not JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI model returned an invalid data format")]
    InvalidFormat,
}

/// Image bytes that decoded cleanly, with the MIME type sniffed from them.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub mime_type: &'static str,
}

impl UploadedImage {
    /// Formats Gemini takes as inline data are sent as uploaded; anything
    /// else the decoder understands (GIF, BMP, TIFF) is re-encoded to PNG.
    pub fn decode(bytes: Bytes) -> Result<Self, AnalysisError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        match format {
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => Ok(Self {
                bytes,
                mime_type: format.to_mime_type(),
            }),
            other => {
                tracing::debug!(format = ?other, "re-encoding upload as png");
                let mut out = Cursor::new(Vec::new());
                decoded.write_to(&mut out, ImageFormat::Png)?;
                Ok(Self {
                    bytes: Bytes::from(out.into_inner()),
                    mime_type: ImageFormat::Png.to_mime_type(),
                })
            }
        }
    }
}

/// Model reply minus code fences and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "")
}

/// Turn the model's free-form reply into the JSON object handed back to the
/// client. `carbon_footprint` must be present and numeric; every other key
/// passes through untouched.
pub fn parse_classification(raw: &str) -> Result<Map<String, Value>, AnalysisError> {
    let parsed: Value = serde_json::from_str(&strip_code_fences(raw))?;
    match parsed {
        Value::Object(obj) if obj.get("carbon_footprint").is_some_and(Value::is_number) => Ok(obj),
        _ => Err(AnalysisError::InvalidFormat),
    }
}

pub async fn classify_image(
    model: &dyn VisionModel,
    bytes: Bytes,
) -> Result<Map<String, Value>, AnalysisError> {
    let image = UploadedImage::decode(bytes)?;
    let reply = model
        .generate(CLASSIFY_PROMPT, &image)
        .await
        .map_err(AnalysisError::Model)?;
    tracing::debug!(reply_len = reply.len(), "model replied");
    parse_classification(&reply)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::GenericImageView;
    use serde_json::json;

    fn encoded(format: ImageFormat) -> Bytes {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 200, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        Bytes::from(out.into_inner())
    }

    pub(crate) fn png_bytes() -> Bytes {
        encoded(ImageFormat::Png)
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let raw = "```json\n{\"object_name\": \"cotton t-shirt\", \"carbon_footprint\": 5.5}\n```";
        let got = parse_classification(raw).unwrap();
        assert_eq!(
            Value::Object(got),
            json!({ "object_name": "cotton t-shirt", "carbon_footprint": 5.5 })
        );
    }

    #[test]
    fn bare_reply_with_integer_footprint() {
        let got = parse_classification("  {\"object_name\": \"mug\", \"carbon_footprint\": 3}\n").unwrap();
        assert_eq!(got["carbon_footprint"], json!(3));
    }

    #[test]
    fn extra_keys_pass_through() {
        let got =
            parse_classification(r#"{"object_name":"bike","carbon_footprint":96.0,"confidence":"high"}"#)
                .unwrap();
        assert_eq!(got["confidence"], "high");
    }

    #[test]
    fn missing_footprint_is_invalid_format() {
        let err = parse_classification(r#"{"object_name": "mug"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidFormat));
    }

    #[test]
    fn non_numeric_footprint_is_invalid_format() {
        for raw in [
            r#"{"object_name": "mug", "carbon_footprint": "low"}"#,
            r#"{"object_name": "mug", "carbon_footprint": "5.5"}"#,
            r#"{"object_name": "mug", "carbon_footprint": null}"#,
            r#"{"object_name": "mug", "carbon_footprint": true}"#,
        ] {
            assert!(matches!(parse_classification(raw), Err(AnalysisError::InvalidFormat)), "{raw}");
        }
    }

    #[test]
    fn non_object_json_is_invalid_format() {
        assert!(matches!(parse_classification("[1, 2]"), Err(AnalysisError::InvalidFormat)));
        assert!(matches!(parse_classification("5.5"), Err(AnalysisError::InvalidFormat)));
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = parse_classification("I think this is a kettle.").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn decode_sniffs_png() {
        let img = UploadedImage::decode(png_bytes()).unwrap();
        assert_eq!(img.mime_type, "image/png");
    }

    #[test]
    fn decode_keeps_png_bytes_as_uploaded() {
        let png = png_bytes();
        let img = UploadedImage::decode(png.clone()).unwrap();
        assert_eq!(img.bytes, png);
    }

    #[test]
    fn decode_converts_gif_and_bmp_to_png() {
        for format in [ImageFormat::Gif, ImageFormat::Bmp] {
            let img = UploadedImage::decode(encoded(format)).unwrap();
            assert_eq!(img.mime_type, "image/png", "{format:?}");
            assert_eq!(image::guess_format(&img.bytes).unwrap(), ImageFormat::Png);
            let round = image::load_from_memory(&img.bytes).unwrap();
            assert_eq!((round.width(), round.height()), (2, 2));
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = UploadedImage::decode(Bytes::from_static(b"definitely not an image")).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn decode_rejects_truncated_png() {
        let mut bytes = png_bytes().to_vec();
        bytes.truncate(20);
        assert!(UploadedImage::decode(Bytes::from(bytes)).is_err());
    }

    #[test]
    fn prompt_asks_for_both_keys() {
        assert!(CLASSIFY_PROMPT.contains("\"object_name\""));
        assert!(CLASSIFY_PROMPT.contains("\"carbon_footprint\""));
        assert!(CLASSIFY_PROMPT.contains("kg CO2e"));
    }
}
