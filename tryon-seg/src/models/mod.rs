//! Mask prediction models

#[cfg(feature = "onnx")]
pub mod u2net;

#[cfg(feature = "onnx")]
pub use u2net::U2NetOnnx;

use crate::error::SegmentationError;

/// Network input: one BGR image as a [1, 3, size, size] tensor
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub size: u32,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, 3, side, side]
    }

    /// Number of values expected back from the network
    pub fn plane_len(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }
}

/// A saliency network that maps an image to per-pixel foreground probabilities.
///
/// The output is the primary map only, `size * size` values in row-major order.
pub trait MaskPredictor: Send {
    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>, SegmentationError>;
}

impl<P: MaskPredictor + ?Sized> MaskPredictor for Box<P> {
    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>, SegmentationError> {
        (**self).predict(input)
    }
}
