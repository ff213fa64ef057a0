use image::GenericImageView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImgDimensions {
    pub width: f32,
    pub height: f32,
}

impl ImgDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &impl GenericImageView) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width as f32, height as f32)
    }
}
