//! U2-Net salient object detection via ONNX Runtime

use super::{InputTensor, MaskPredictor};
use crate::error::SegmentationError;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

/// U2-Net model loaded from exported ONNX weights
pub struct U2NetOnnx {
    session: Session,
    input_name: String,
    output_name: String,
}

impl U2NetOnnx {
    /// Load the network from `weights`
    pub fn load(weights: &Path) -> Result<Self, SegmentationError> {
        if !weights.is_file() {
            return Err(SegmentationError::MissingWeights(weights.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| SegmentationError::Model(format!("Failed to create session builder: {}", e)))?
            .commit_from_file(weights)
            .map_err(|e| SegmentationError::Model(format!("Failed to load U2-Net model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| SegmentationError::Model("U2-Net model declares no inputs".to_string()))?;
        // The first output is the fused saliency map d0
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| SegmentationError::Model("U2-Net model declares no outputs".to_string()))?;

        info!("U2-Net model loaded from {:?}", weights);
        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

impl MaskPredictor for U2NetOnnx {
    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>, SegmentationError> {
        let tensor = Tensor::from_array((input.shape(), input.data.clone()))
            .map_err(|e| SegmentationError::Inference(format!("Failed to build input tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| SegmentationError::Inference(format!("U2-Net inference failed: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| SegmentationError::Inference(format!("Output '{}' not found", self.output_name)))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| SegmentationError::Inference(format!("Failed to extract output: {}", e)))?;
        debug!("U2-Net output shape {:?}", shape);

        Ok(data.to_vec())
    }
}
