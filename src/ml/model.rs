use anyhow::{ensure, Result};
use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SortTransformerConfig {
    /// Width of the one-hot input and of the output distribution
    pub alphabet: usize,
    /// Hidden width of every block (d_model)
    pub hidden:   usize,
    pub heads:    usize,
    pub blocks:   usize,
    /// Inner width of the feed-forward sublayer
    pub d_ff:     usize,
    pub dropout:  f64,
}

impl SortTransformerConfig {
    /// Reject shapes burn's attention would panic on.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.alphabet > 0, "alphabet must not be empty");
        ensure!(self.heads > 0, "need at least one attention head");
        ensure!(self.blocks > 0, "need at least one transformer block");
        ensure!(self.d_ff > 0, "feed-forward width must be positive");
        ensure!(
            self.hidden > 0 && self.hidden % self.heads == 0,
            "hidden width {} must be a positive multiple of the head count {}",
            self.hidden, self.heads,
        );
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout {} must be in [0, 1)", self.dropout,
        );
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> SortTransformer<B> {
        let embedding  = LinearConfig::new(self.alphabet, self.hidden).init(device);
        let blocks: Vec<EncoderBlock<B>> = (0..self.blocks)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let classifier = LinearConfig::new(self.hidden, self.alphabet).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        SortTransformer { embedding, blocks, classifier, dropout }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden, self.heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.hidden).init(device);
        let norm1   = LayerNormConfig::new(self.hidden).init(device);
        let norm2   = LayerNormConfig::new(self.hidden).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// Post-norm transformer block: attention and feed-forward sublayers,
/// each wrapped in a residual connection followed by layer norm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, len, hidden] → (x', attention weights [batch, heads, len, len])
    pub fn forward(&self, x: Tensor<B, 3>) -> (Tensor<B, 3>, Tensor<B, 4>) {
        let attn = self.self_attn.forward(MhaInput::self_attn(x.clone()));
        let x = self.norm1.forward(x + self.dropout.forward(attn.context));
        let ffn_out = self.ffn_linear2.forward(
            activation::relu(self.ffn_linear1.forward(x.clone()))
        );
        (self.norm2.forward(x + self.dropout.forward(ffn_out)), attn.weights)
    }
}

/// one-hot [batch, len, alphabet] → Linear → blocks → Linear → logits [batch, len, alphabet]
#[derive(Module, Debug)]
pub struct SortTransformer<B: Backend> {
    pub embedding:  Linear<B>,
    pub blocks:     Vec<EncoderBlock<B>>,
    pub classifier: Linear<B>,
    pub dropout:    Dropout,
}

pub struct SortOutput<B: Backend> {
    /// Unnormalised scores — shape: [batch, len, alphabet]
    pub logits:    Tensor<B, 3>,
    /// One weight tensor per block — shape: [batch, heads, len, len]
    pub attention: Vec<Tensor<B, 4>>,
}

impl<B: Backend> SortTransformer<B> {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn forward_with_attention(&self, inputs: Tensor<B, 3>) -> SortOutput<B> {
        let mut x = self.dropout.forward(self.embedding.forward(inputs));
        let mut attention = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let (next, weights) = block.forward(x);
            x = next;
            attention.push(weights);
        }
        let logits = self.classifier.forward(x);
        SortOutput { logits, attention }
    }

    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 3> {
        self.forward_with_attention(inputs).logits
    }

    /// Softmax over the alphabet at every position.
    pub fn probabilities(&self, inputs: Tensor<B, 3>) -> Tensor<B, 3> {
        activation::softmax(self.forward(inputs), 2)
    }

    /// Most likely digit per position — shape: [batch, len]
    pub fn predict(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2, Int> {
        let [batch_size, len, _] = inputs.dims();
        self.forward(inputs).argmax(2).reshape([batch_size, len])
    }

    /// Mean cross-entropy over every position of the padded batch.
    pub fn forward_loss(
        &self,
        inputs:  Tensor<B, 3>,
        targets: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(inputs);
        let [batch_size, len, alphabet] = logits.dims();
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(
            logits.clone().reshape([batch_size * len, alphabet]),
            targets.reshape([batch_size * len]),
        );
        (loss, logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray;

    fn small_config() -> SortTransformerConfig {
        SortTransformerConfig::new(10, 16, 2, 2, 32, 0.0)
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(small_config().validate().is_ok());
        assert!(SortTransformerConfig::new(10, 15, 2, 1, 32, 0.0).validate().is_err());
        assert!(SortTransformerConfig::new(10, 16, 0, 1, 32, 0.0).validate().is_err());
        assert!(SortTransformerConfig::new(10, 16, 2, 0, 32, 0.0).validate().is_err());
        assert!(SortTransformerConfig::new(10, 16, 2, 1, 32, 1.0).validate().is_err());
    }

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let model: SortTransformer<TestBackend> = small_config().init(&device);
        let inputs = Tensor::<TestBackend, 3>::random([3, 5, 10], Distribution::Default, &device);

        let out = model.forward_with_attention(inputs.clone());
        assert_eq!(out.logits.dims(), [3, 5, 10]);
        assert_eq!(out.attention.len(), 2);
        for weights in &out.attention {
            assert_eq!(weights.dims(), [3, 2, 5, 5]);
        }
        assert_eq!(model.predict(inputs).dims(), [3, 5]);
        assert_eq!(model.block_count(), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        let model: SortTransformer<TestBackend> = small_config().init(&device);
        let inputs = Tensor::<TestBackend, 3>::random([2, 4, 10], Distribution::Default, &device);

        let sums: Vec<f32> = model
            .probabilities(inputs)
            .sum_dim(2)
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(sums.len(), 8);
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4, "row sums to {s}");
        }
    }

    #[test]
    fn test_attention_rows_are_distributions() {
        let device = Default::default();
        let model: SortTransformer<TestBackend> = small_config().init(&device);
        let inputs = Tensor::<TestBackend, 3>::random([1, 6, 10], Distribution::Default, &device);

        let weights = model.forward_with_attention(inputs).attention.remove(0);
        let sums: Vec<f32> = weights.sum_dim(3).into_data().iter::<f32>().collect();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_loss_is_finite_and_near_uniform_at_init() {
        let device = Default::default();
        let model: SortTransformer<TestBackend> = small_config().init(&device);
        let inputs  = Tensor::<TestBackend, 3>::zeros([2, 3, 10], &device);
        let targets = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![0i64, 1, 2, 3, 4, 5], [2, 3]),
            &device,
        );
        let (loss, logits) = model.forward_loss(inputs, targets);
        assert_eq!(logits.dims(), [2, 3, 10]);
        let loss = loss.into_scalar().elem::<f64>();
        assert!(loss.is_finite());
        // ln(10) ≈ 2.30 for an untrained classifier; allow wide slack
        assert!(loss > 0.5 && loss < 10.0, "loss = {loss}");
    }
}
