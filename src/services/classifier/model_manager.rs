use crate::config::{Device, InferenceConfig};
use crate::error::AppError;
use crate::models::classify_types::ImageClass;
use crate::services::classifier::Classifier;
use ndarray::{Array2, Array4};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// The pretrained two-class network, loaded once from its ONNX checkpoint and
/// held for the rest of the run.
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, config: &InferenceConfig) -> Result<Self, AppError> {
        let load_err = |message: String| AppError::ModelLoad {
            path: model_path.to_path_buf(),
            message,
        };

        if !model_path.is_file() {
            return Err(load_err("weights file not found".to_string()));
        }

        let _ = ort::init().with_name("cloud-filter").commit();

        let mut builder = Session::builder()
            .map_err(|e| load_err(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| load_err(format!("Failed to set intra threads: {}", e)))?;

        builder = match config.device {
            Device::Gpu => builder
                .with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default().build(),
                    ort::execution_providers::DirectMLExecutionProvider::default().build(),
                    ort::execution_providers::CoreMLExecutionProvider::default().build(),
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| load_err(format!("Failed to register GPU execution providers: {}", e)))?,
            Device::Cpu => builder
                .with_execution_providers([
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| load_err(format!("Failed to register CPU execution provider: {}", e)))?,
        };

        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| load_err(format!("Failed to load ONNX model: {}", e)))?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| load_err("model declares no inputs".to_string()))?;

        tracing::info!(
            "Loaded classifier {} (input '{}', device {:?})",
            model_path.display(),
            input_name,
            config.device
        );

        Ok(Self { session, input_name })
    }
}

impl Classifier for OnnxClassifier {
    fn scores(&mut self, batch: Array4<f32>) -> Result<Array2<f32>, AppError> {
        let rows = batch.shape()[0];
        let input_tensor = Tensor::from_array(batch)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output_value = outputs
            .values()
            .next()
            .ok_or_else(|| AppError::Inference("Model produced no outputs".to_string()))?;

        let (shape, data) = output_value.try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();
        if dims != [rows as i64, ImageClass::COUNT as i64] {
            return Err(AppError::Inference(format!(
                "expected output shape [{}, {}], got {:?}",
                rows,
                ImageClass::COUNT,
                dims
            )));
        }

        Ok(Array2::from_shape_vec((rows, ImageClass::COUNT), data.to_vec())?)
    }
}
