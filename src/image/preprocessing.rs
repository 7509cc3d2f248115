use crate::image::ImageLoader;
use crate::utils::error::DetectError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array3, ArrayView3};

/// 模型输入边长
pub const INPUT_SIZE: u32 = 224;

/// 模型输入通道数（RGB）
pub const INPUT_CHANNELS: usize = 3;

/// 224x224x3、取值[0, 1]的HWC张量
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array3<f32>);

impl NormalizedTensor {
    pub const SHAPE: (usize, usize, usize) =
        (INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS);

    /// 从已有数组构造，形状必须精确匹配，取值必须在[0, 1]
    pub fn from_array(array: Array3<f32>) -> Result<Self> {
        if array.dim() != Self::SHAPE {
            return Err(DetectError::InvalidInput(format!(
                "Expected tensor shape {:?}, got {:?}",
                Self::SHAPE,
                array.dim()
            )));
        }
        if let Some(bad) = array.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(DetectError::InvalidInput(format!(
                "Tensor values must be within [0, 1], found {}",
                bad
            )));
        }
        Ok(Self(array))
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.0.view()
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.0
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 解码、转RGB、缩放到224x224并归一化
    pub fn preprocess(bytes: &[u8]) -> Result<NormalizedTensor> {
        let image = ImageLoader::from_bytes(bytes)?;
        Self::to_tensor(&image)
    }

    /// 对已解码图像做缩放和归一化。不保持宽高比
    pub fn to_tensor(image: &DynamicImage) -> Result<NormalizedTensor> {
        // to_rgb8会丢弃alpha通道并展开灰度
        let rgb = image.to_rgb8();
        let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();

        let array = Array3::from_shape_vec(NormalizedTensor::SHAPE, data)
            .map_err(|e| DetectError::Internal(format!("Tensor shape mismatch: {}", e)))?;

        Ok(NormalizedTensor(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn assert_normalized(tensor: &NormalizedTensor) {
        assert_eq!(tensor.view().dim(), NormalizedTensor::SHAPE);
        assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn any_size_and_mode_yields_fixed_shape() {
        let inputs = vec![
            encode(DynamicImage::ImageRgb8(RgbImage::new(1, 1)), ImageFormat::Png),
            encode(DynamicImage::ImageRgb8(RgbImage::new(640, 17)), ImageFormat::Png),
            encode(DynamicImage::ImageLuma8(GrayImage::new(33, 500)), ImageFormat::Png),
            encode(
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(224, 224, Rgba([9, 8, 7, 0]))),
                ImageFormat::Png,
            ),
            encode(DynamicImage::ImageRgb8(RgbImage::new(300, 200)), ImageFormat::Jpeg),
            encode(DynamicImage::ImageRgb8(RgbImage::new(50, 60)), ImageFormat::Bmp),
            // 16位灰度与16位RGB
            encode(
                DynamicImage::ImageLuma16(ImageBuffer::from_pixel(90, 45, Luma([40_000u16]))),
                ImageFormat::Png,
            ),
            encode(
                DynamicImage::ImageRgb16(ImageBuffer::from_pixel(31, 77, Rgb([65_535u16, 0, 1_000]))),
                ImageFormat::Png,
            ),
            // GIF为调色板编码
            encode(
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([200, 10, 10, 255]))),
                ImageFormat::Gif,
            ),
        ];

        for bytes in inputs {
            let tensor = ImagePreprocessor::preprocess(&bytes).unwrap();
            assert_normalized(&tensor);
        }
    }

    #[test]
    fn values_are_scaled_by_255() {
        let white = RgbImage::from_pixel(224, 224, Rgb([255, 255, 255]));
        let tensor = ImagePreprocessor::to_tensor(&DynamicImage::ImageRgb8(white)).unwrap();
        assert!(tensor.view().iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let gray = RgbImage::from_pixel(8, 8, Rgb([51, 51, 51]));
        let tensor = ImagePreprocessor::to_tensor(&DynamicImage::ImageRgb8(gray)).unwrap();
        assert!(tensor.view().iter().all(|&v| (v - 0.2).abs() < 1e-3));
    }

    #[test]
    fn channel_order_is_rgb() {
        let red = RgbImage::from_pixel(224, 224, Rgb([255, 0, 0]));
        let tensor = ImagePreprocessor::to_tensor(&DynamicImage::ImageRgb8(red)).unwrap();
        let view = tensor.view();
        assert_eq!(view[[100, 100, 0]], 1.0);
        assert_eq!(view[[100, 100, 1]], 0.0);
        assert_eq!(view[[100, 100, 2]], 0.0);
    }

    #[test]
    fn grayscale_expands_to_three_equal_channels() {
        let gray = GrayImage::from_pixel(224, 224, Luma([102]));
        let tensor = ImagePreprocessor::to_tensor(&DynamicImage::ImageLuma8(gray)).unwrap();
        let view = tensor.view();
        assert_eq!(view[[5, 5, 0]], view[[5, 5, 1]]);
        assert_eq!(view[[5, 5, 1]], view[[5, 5, 2]]);
        assert!((view[[5, 5, 0]] - 0.4).abs() < 1e-3);
    }

    #[test]
    fn non_image_bytes_fail_to_decode() {
        let err = ImagePreprocessor::preprocess(b"%PDF-1.4 not an image").unwrap_err();
        assert!(matches!(err, DetectError::Decode(_)));
    }

    #[test]
    fn from_array_checks_shape() {
        assert!(NormalizedTensor::from_array(Array3::zeros((224, 224, 3))).is_ok());
        assert!(NormalizedTensor::from_array(Array3::zeros((224, 224, 1))).is_err());
    }

    #[test]
    fn from_array_checks_value_range() {
        assert!(NormalizedTensor::from_array(Array3::from_elem((224, 224, 3), 1.0)).is_ok());

        for bad in [f32::NAN, f32::INFINITY, 5.0, -0.01] {
            let mut array = Array3::<f32>::zeros((224, 224, 3));
            array[[10, 20, 1]] = bad;
            assert!(
                matches!(
                    NormalizedTensor::from_array(array),
                    Err(DetectError::InvalidInput(_))
                ),
                "value {} accepted",
                bad
            );
        }
    }
}
