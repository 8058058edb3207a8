//! Transformer embedding path: wordpiece tokenize, drive an external
//! inference session, pool and normalize the output.
//!
//! The inference runtime itself is an external collaborator, modeled by
//! the [`InferenceSession`] trait: named input bindings in, output tensors
//! (shape + flat buffer) out, fully synchronous.

use std::collections::HashMap;
use std::path::Path;

use super::l2_normalize;
use super::vocab::Vocabulary;
use super::wordpiece::WordpieceTokenizer;
use crate::error::{Error, Result};

/// Default fixed sequence length for tokenization.
pub const DEFAULT_MAX_SEQ_LEN: usize = 128;

// The original deployment ships a model of roughly this size; the session
// itself is opaque, so this stands in for its real footprint.
const SESSION_MEMORY_ESTIMATE: usize = 30 * 1024 * 1024;

/// Role a declared model input plays in the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    InputIds,
    AttentionMask,
    SegmentIds,
}

/// Explicit input-name to role mapping supplied by model configuration.
///
/// Exact names listed here win over the substring heuristic, which keeps
/// models with unusual input names working without renaming tensors.
#[derive(Debug, Clone, Default)]
pub struct InputRoleMap {
    roles: HashMap<String, InputRole>,
}

impl InputRoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, role: InputRole) -> &mut Self {
        self.roles.insert(name.into(), role);
        self
    }

    pub fn get(&self, name: &str) -> Option<InputRole> {
        self.roles.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// One bound input tensor: `[1, seq_len]` of i64.
pub struct TensorBinding<'a> {
    pub name: &'a str,
    pub data: &'a [i64],
    pub shape: [i64; 2],
}

/// One output tensor: shape plus flat row-major buffer.
pub struct TensorOutput {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// Opaque synchronous inference engine.
pub trait InferenceSession {
    /// Declared input tensor names, in declaration order.
    fn input_names(&self) -> &[String];

    /// Declared output tensor names, in declaration order.
    fn output_names(&self) -> &[String];

    /// Declared shape of the first output (dynamic axes may be negative).
    fn first_output_shape(&self) -> &[i64];

    /// Execute a forward pass. Blocks until the engine returns or fails.
    fn run(&self, inputs: &[TensorBinding<'_>]) -> Result<Vec<TensorOutput>>;
}

/// Opens an [`InferenceSession`] from a model file.
pub trait SessionProvider {
    fn open(&self, model_path: &Path) -> Result<Box<dyn InferenceSession>>;
}

#[derive(Debug, Clone)]
pub struct TransformerConfig {
    pub max_seq_len: usize,
    pub input_roles: InputRoleMap,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            input_roles: InputRoleMap::new(),
        }
    }
}

pub struct TransformerEmbedder {
    tokenizer: WordpieceTokenizer,
    session: Box<dyn InferenceSession>,
    config: TransformerConfig,
    dim: usize,
}

impl TransformerEmbedder {
    /// Load the vocabulary, open the session, and read the embedding
    /// dimension from the last axis of the first declared output's shape.
    pub fn initialize(
        model_path: &Path,
        vocab_path: &Path,
        provider: &dyn SessionProvider,
        config: TransformerConfig,
    ) -> Result<Self> {
        let vocab = Vocabulary::load(vocab_path)?;
        let session = provider.open(model_path)?;

        if session.output_names().is_empty() {
            return Err(Error::Inference("model declares no outputs".to_string()));
        }
        let dim = match session.first_output_shape().last() {
            Some(&axis) if axis > 0 => axis as usize,
            _ => {
                return Err(Error::Inference(
                    "first output has no usable embedding axis".to_string(),
                ))
            }
        };

        Ok(Self {
            tokenizer: WordpieceTokenizer::new(vocab),
            session,
            config,
            dim,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn memory_estimate(&self) -> usize {
        SESSION_MEMORY_ESTIMATE
    }

    /// Embed one text. Inference failure is an error, never a
    /// zero-dimension embedding.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input_ids = self.tokenizer.tokenize(text, self.config.max_seq_len);
        if input_ids.is_empty() {
            return Err(Error::Inference("empty token sequence".to_string()));
        }

        let pad_id = self.tokenizer.pad_id();
        let attention_mask: Vec<i64> =
            input_ids.iter().map(|&id| i64::from(id != pad_id)).collect();
        let segment_ids = vec![0i64; input_ids.len()];
        let shape = [1, input_ids.len() as i64];

        let bindings: Vec<TensorBinding<'_>> = self
            .session
            .input_names()
            .iter()
            .map(|name| {
                let data: &[i64] = match self.role_of(name) {
                    InputRole::SegmentIds => &segment_ids,
                    InputRole::AttentionMask => &attention_mask,
                    InputRole::InputIds => &input_ids,
                };
                TensorBinding { name, data, shape }
            })
            .collect();

        let outputs = self.session.run(&bindings)?;
        let first = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("inference returned no outputs".to_string()))?;

        let mut result = pool_output(first)?;
        l2_normalize(&mut result);
        Ok(result)
    }

    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Resolve which input an isolated tensor name receives: the explicit
    /// role map wins, then the substring heuristic the deployed models
    /// rely on.
    fn role_of(&self, name: &str) -> InputRole {
        if let Some(role) = self.config.input_roles.get(name) {
            return role;
        }
        if name.contains("type") || name.contains("segment") {
            InputRole::SegmentIds
        } else if name.contains("mask") {
            InputRole::AttentionMask
        } else {
            InputRole::InputIds
        }
    }
}

/// Pool a raw output tensor down to one embedding vector.
///
/// Rank 3 `[1, seq_len, dim]` takes the start-token position; rank 2
/// `[1, dim]` is used directly.
fn pool_output(output: TensorOutput) -> Result<Vec<f32>> {
    let dim = match output.shape.len() {
        3 => output.shape[2],
        2 => output.shape[1],
        rank => {
            return Err(Error::Inference(format!(
                "unsupported output rank {rank}"
            )))
        }
    };
    if dim <= 0 {
        return Err(Error::Inference("output has non-positive dim axis".to_string()));
    }
    let dim = dim as usize;
    if output.data.len() < dim {
        return Err(Error::Inference(format!(
            "output buffer holds {} values, expected at least {dim}",
            output.data.len()
        )));
    }
    Ok(output.data[..dim].to_vec())
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Bindings recorded by a [`MockSession`], shared with the test that
    /// built it.
    pub type SeenBindings = Rc<RefCell<Vec<(String, Vec<i64>)>>>;

    /// Test double: records bindings, replays canned outputs.
    pub struct MockSession {
        pub inputs: Vec<String>,
        pub outputs: Vec<String>,
        pub output_shape: Vec<i64>,
        pub response: Box<dyn Fn(&[TensorBinding<'_>]) -> Result<Vec<TensorOutput>>>,
        pub seen: SeenBindings,
    }

    impl MockSession {
        pub fn with_constant_output(
            inputs: &[&str],
            output_shape: Vec<i64>,
            data: Vec<f32>,
        ) -> Self {
            let replay_shape = output_shape.clone();
            Self {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                outputs: vec!["sentence_embedding".to_string()],
                output_shape,
                response: Box::new(move |_| {
                    Ok(vec![TensorOutput {
                        shape: replay_shape.clone(),
                        data: data.clone(),
                    }])
                }),
                seen: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn seen_handle(&self) -> SeenBindings {
            Rc::clone(&self.seen)
        }
    }

    impl InferenceSession for MockSession {
        fn input_names(&self) -> &[String] {
            &self.inputs
        }

        fn output_names(&self) -> &[String] {
            &self.outputs
        }

        fn first_output_shape(&self) -> &[i64] {
            &self.output_shape
        }

        fn run(&self, inputs: &[TensorBinding<'_>]) -> Result<Vec<TensorOutput>> {
            for binding in inputs {
                self.seen
                    .borrow_mut()
                    .push((binding.name.to_string(), binding.data.to_vec()));
            }
            (self.response)(inputs)
        }
    }

    pub struct MockProvider(pub RefCell<Option<Box<dyn InferenceSession>>>);

    impl MockProvider {
        pub fn new(session: MockSession) -> Self {
            Self(RefCell::new(Some(Box::new(session))))
        }
    }

    impl SessionProvider for MockProvider {
        fn open(&self, _model_path: &Path) -> Result<Box<dyn InferenceSession>> {
            self.0
                .borrow_mut()
                .take()
                .ok_or_else(|| Error::Inference("mock session already taken".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockProvider, MockSession};
    use super::*;
    use std::fs;

    fn write_vocab() -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "qamatch-vocab-{}-{:?}.txt",
            std::process::id(),
            std::thread::current().id()
        ));
        fs::write(&path, "[PAD]\n[UNK]\n[CLS]\n[SEP]\nhello\nworld\n").unwrap();
        path
    }

    fn embedder_with(session: MockSession, config: TransformerConfig) -> TransformerEmbedder {
        let vocab_path = write_vocab();
        let provider = MockProvider::new(session);
        let embedder = TransformerEmbedder::initialize(
            Path::new("model.onnx"),
            &vocab_path,
            &provider,
            config,
        )
        .unwrap();
        let _ = fs::remove_file(&vocab_path);
        embedder
    }

    #[test]
    fn test_dimension_from_first_output_last_axis() {
        let session =
            MockSession::with_constant_output(&["input_ids"], vec![1, 128, 4], vec![0.0; 4]);
        let e = embedder_with(session, TransformerConfig::default());
        assert_eq!(e.dimension(), 4);
    }

    #[test]
    fn test_no_outputs_fails_initialize() {
        let mut session =
            MockSession::with_constant_output(&["input_ids"], vec![1, 4], vec![0.0; 4]);
        session.outputs.clear();
        let provider = MockProvider::new(session);
        let vocab_path = write_vocab();
        let result = TransformerEmbedder::initialize(
            Path::new("model.onnx"),
            &vocab_path,
            &provider,
            TransformerConfig::default(),
        );
        let _ = fs::remove_file(&vocab_path);
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn test_heuristic_binding_roles() {
        let session = MockSession::with_constant_output(
            &["input_ids", "attention_mask", "token_type_ids"],
            vec![1, 3],
            vec![3.0, 4.0, 0.0],
        );
        let seen = session.seen_handle();
        let config = TransformerConfig {
            max_seq_len: 8,
            ..Default::default()
        };
        let e = embedder_with(session, config);
        let v = e.embed("hello world").unwrap();
        assert_eq!(v.len(), 3);
        // 3-4-5 triangle normalized.
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let seen: std::collections::HashMap<_, _> = seen.borrow().iter().cloned().collect();
        // [CLS] hello world [SEP] then padding.
        assert_eq!(seen["input_ids"], vec![2, 4, 5, 3, 0, 0, 0, 0]);
        assert_eq!(seen["attention_mask"], vec![1, 1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(seen["token_type_ids"], vec![0; 8]);
    }

    #[test]
    fn test_explicit_role_map_overrides_heuristic() {
        // "input.2" would heuristically receive input ids; the explicit
        // map reroutes it to the attention mask.
        let session = MockSession::with_constant_output(
            &["input.1", "input.2"],
            vec![1, 2],
            vec![1.0, 0.0],
        );
        let seen = session.seen_handle();
        let mut roles = InputRoleMap::new();
        roles.set("input.1", InputRole::InputIds);
        roles.set("input.2", InputRole::AttentionMask);
        let config = TransformerConfig {
            max_seq_len: 4,
            input_roles: roles,
        };
        let e = embedder_with(session, config);
        e.embed("hello").unwrap();

        let seen: std::collections::HashMap<_, _> = seen.borrow().iter().cloned().collect();
        assert_eq!(seen["input.1"], vec![2, 4, 3, 0]);
        assert_eq!(seen["input.2"], vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_rank3_output_pools_start_position() {
        // [1, 2, 3]: position 0 is (0,3,4), position 1 is noise.
        let session = MockSession::with_constant_output(
            &["input_ids"],
            vec![1, 2, 3],
            vec![0.0, 3.0, 4.0, 9.0, 9.0, 9.0],
        );
        let e = embedder_with(session, TransformerConfig::default());
        let v = e.embed("hello").unwrap();
        assert_eq!(v.len(), 3);
        assert!(v[0].abs() < 1e-6);
        assert!((v[1] - 0.6).abs() < 1e-6);
        assert!((v[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_engine_failure_is_inference_error() {
        let mut session =
            MockSession::with_constant_output(&["input_ids"], vec![1, 4], vec![0.0; 4]);
        session.response =
            Box::new(|_| Err(Error::Inference("engine exploded".to_string())));
        let e = embedder_with(session, TransformerConfig::default());
        assert!(matches!(e.embed("hello"), Err(Error::Inference(_))));
    }
}
