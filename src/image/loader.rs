use crate::utils::error::DetectError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat};

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节解码图像，格式由内容自动识别
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(DetectError::Decode("Empty image data".to_string()));
        }

        let image = image::load_from_memory(bytes)?;

        let (width, height) = image.dimensions();
        tracing::debug!(
            "Decoded image: {}x{}, color={:?}, format={:?}",
            width,
            height,
            image.color(),
            Self::detect_format(bytes)
        );

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }
}
