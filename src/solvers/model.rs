//! Automated solving strategy backed by the recognition model.

use crate::core::cancel::CancelToken;
use crate::core::config::ModelSolverConfig;
use crate::core::errors::{CaptchaError, CaptchaResult};
use crate::core::progress::{LogSink, ProgressSink};
use crate::core::traits::Solver;
use crate::models::assets;
use crate::processors::{AlphabetDecoder, ImagePreprocessor};
use crate::utils::http;
use ndarray::Array4;
use ort::session::SessionInputs;
use ort::value::TensorRef;
use std::borrow::Cow;
use std::sync::Arc;

/// Strategy that resolves challenges with the pretrained recognition model.
///
/// The model session is acquired through the process-wide asset cache on the
/// first solve and reused for every later call; construction itself performs
/// no I/O.
pub struct ModelSolver {
    config: ModelSolverConfig,
    preprocessor: ImagePreprocessor,
    decoder: AlphabetDecoder,
    sink: Arc<dyn ProgressSink>,
}

impl ModelSolver {
    /// Creates a solver for `config`, reporting through the default log
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the config is invalid.
    pub fn new(config: ModelSolverConfig) -> CaptchaResult<Self> {
        config.validate()?;
        let preprocessor = ImagePreprocessor::new(&config.challenge);
        let decoder = AlphabetDecoder::from_spec(&config.challenge)?;
        Ok(Self {
            config,
            preprocessor,
            decoder,
            sink: Arc::new(LogSink),
        })
    }

    /// Replaces the status sink.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs the model over one preprocessed batch and returns the predicted
    /// class sequence for its sole element.
    fn run_inference(&self, batch: &Array4<f32>) -> CaptchaResult<Vec<usize>> {
        let handle = assets::ensure(
            &self.config.model_path,
            &self.config.model_url,
            self.sink.as_ref(),
        )?;
        let mut session = handle
            .lock()
            .map_err(|_| CaptchaError::invalid_input("model session lock poisoned"))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| CaptchaError::invalid_input("model declares no inputs"))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| CaptchaError::invalid_input("model declares no outputs"))?;

        let dims: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
        let data = batch.as_slice().ok_or_else(|| {
            CaptchaError::invalid_input("input tensor is not contiguous in memory")
        })?;
        let tensor = TensorRef::from_array_view((dims, data)).map_err(CaptchaError::inference)?;

        let inputs: SessionInputs<'_, '_, 0> =
            SessionInputs::ValueMap(vec![(Cow::Owned(input_name), tensor.into())]);
        let outputs = session.run(inputs).map_err(CaptchaError::inference)?;

        let (shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(CaptchaError::inference)?;
        let shape: Vec<i64> = shape.iter().copied().collect();

        argmax_classes(
            &shape,
            data,
            self.config.challenge.sequence_length,
            self.decoder.class_count(),
        )
    }
}

impl Solver for ModelSolver {
    /// Fetches the challenge image and resolves it with the model.
    ///
    /// `cancel` is accepted for interface symmetry but not honored
    /// mid-flight: a model run is bounded and fast, and the inference engine
    /// offers no safe interruption point. Callers needing prompt
    /// cancellation should prefer the interactive strategy or abandon the
    /// result.
    fn solve(&self, challenge_url: &str, _cancel: Option<&CancelToken>) -> CaptchaResult<String> {
        self.sink.status("solving captcha automatically");

        let image = http::fetch_bytes(challenge_url)?;
        let batch = self.preprocessor.preprocess(&image)?;
        let sequence = self.run_inference(&batch)?;
        let text = self.decoder.decode(&sequence)?;

        self.sink.status(&format!("captcha solved as '{}'", text));
        tracing::debug!("resolved challenge from {} as '{}'", challenge_url, text);
        Ok(text)
    }
}

/// Picks the strongest class per answer position from a rank-3 logit
/// tensor of shape (1, sequence_length, class_count).
///
/// Any deviation from the expected shape means the model and the configured
/// challenge geometry disagree, which fails the call instead of producing a
/// garbage answer.
pub(crate) fn argmax_classes(
    shape: &[i64],
    data: &[f32],
    sequence_length: usize,
    class_count: usize,
) -> CaptchaResult<Vec<usize>> {
    if shape.len() != 3 {
        return Err(CaptchaError::invalid_input(format!(
            "expected rank-3 model output (batch, positions, classes), got shape {:?}",
            shape
        )));
    }

    let (batch, positions, width) = (shape[0], shape[1], shape[2]);
    if batch != 1 || positions != sequence_length as i64 || width != class_count as i64 {
        return Err(CaptchaError::invalid_input(format!(
            "model output shape {:?} does not match expected (1, {}, {})",
            shape, sequence_length, class_count
        )));
    }
    if data.len() != sequence_length * class_count {
        return Err(CaptchaError::invalid_input(format!(
            "model output carries {} values, expected {}",
            data.len(),
            sequence_length * class_count
        )));
    }

    let mut sequence = Vec::with_capacity(sequence_length);
    for position in 0..sequence_length {
        let row = &data[position * class_count..(position + 1) * class_count];
        let best = row
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx)
            .ok_or_else(|| CaptchaError::invalid_input("empty class row in model output"))?;
        sequence.push(best);
    }

    Ok(sequence)
}
