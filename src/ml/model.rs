// ============================================================
// Layer 5 - Driver Model
// ============================================================
// End-to-end steering CNN (NVIDIA layout) with the vehicle
// speed fed in after the convolutional stack.
//
//   image [N, 3, 66, 200]  (raw 0..255)
//     pixel / 127.5 - 1
//     conv 3→24   5x5 s2, ELU(0.3)   → [N, 24, 31, 98]
//     conv 24→36  5x5 s2, ELU(0.3)   → [N, 36, 14, 47]
//     conv 36→48  5x5 s2, ELU(0.3)   → [N, 48,  5, 22]
//     conv 48→64  3x3 s1, ELU(0.3)   → [N, 64,  3, 20]
//     conv 64→64  3x3 s1, ELU(0.3)   → [N, 64,  1, 18]
//     channel dropout (0.5)
//     flatten                        → [N, 1152]
//     linear 1152→100, ELU(0.3)
//     linear 100→50,   ELU(0.3)
//     concat speed [N, 1]            → [N, 51]
//     linear 51→10,    ELU(0.3)
//     linear 10→1                    → [N]
//
// The flattened width is derived from the kernel sizes and
// strides, not discovered by running a dummy batch.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::{MseLoss, Reduction},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::Distribution,
};

use crate::domain::driving_sample::{FRAME_HEIGHT, FRAME_WIDTH};

/// Convolution stack as (in_channels, out_channels, kernel, stride).
const CONV_LAYERS: [(usize, usize, usize, usize); 5] = [
    (3, 24, 5, 2),
    (24, 36, 5, 2),
    (36, 48, 5, 2),
    (48, 64, 3, 1),
    (64, 64, 3, 1),
];

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct DriverConfig {
    #[config(default = "FRAME_HEIGHT")]
    pub image_height: usize,
    #[config(default = "FRAME_WIDTH")]
    pub image_width: usize,
    /// Negative-side scale of every ELU
    #[config(default = 0.3)]
    pub elu_alpha: f64,
    /// Probability of zeroing a whole feature channel while training
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl DriverConfig {
    /// Spatial size after the convolution stack, as (height, width).
    pub fn conv_output_hw(&self) -> (usize, usize) {
        CONV_LAYERS
            .iter()
            .fold((self.image_height, self.image_width), |(h, w), &(_, _, k, s)| {
                (conv_output_len(h, k, s), conv_output_len(w, k, s))
            })
    }

    /// Width of the flattened conv features entering the first linear layer.
    pub fn flattened_size(&self) -> usize {
        let (h, w) = self.conv_output_hw();
        let channels = CONV_LAYERS[CONV_LAYERS.len() - 1].1;
        channels * h * w
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Driver<B> {
        let [conv1, conv2, conv3, conv4, conv5] = CONV_LAYERS.map(|(c_in, c_out, k, s)| {
            Conv2dConfig::new([c_in, c_out], [k, k])
                .with_stride([s, s])
                .init::<B>(device)
        });

        Driver {
            conv1, conv2, conv3, conv4, conv5,
            dropout: ChannelDropout::new(self.dropout),
            lin1: LinearConfig::new(self.flattened_size(), 100).init(device),
            lin2: LinearConfig::new(100, 50).init(device),
            lin3: LinearConfig::new(51, 10).init(device),
            lin4: LinearConfig::new(10, 1).init(device),
            elu_alpha: self.elu_alpha,
        }
    }
}

/// Output length of an unpadded convolution along one axis.
pub fn conv_output_len(input: usize, kernel: usize, stride: usize) -> usize {
    if input < kernel {
        return 0;
    }
    (input - kernel) / stride + 1
}

/// Map raw pixel intensities 0..255 into [-1, 1].
pub fn normalize_pixels<B: Backend, const D: usize>(pixels: Tensor<B, D>) -> Tensor<B, D> {
    pixels.div_scalar(127.5).sub_scalar(1.0)
}

/// Exponential linear unit: x for x > 0, alpha * (e^x - 1) otherwise.
pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f64) -> Tensor<B, D> {
    let positive = x.clone().clamp_min(0.0);
    let negative = x.clamp_max(0.0).exp().sub_scalar(1.0).mul_scalar(alpha);
    positive + negative
}

// ─── ChannelDropout ───────────────────────────────────────────────────────────
/// Zeroes whole feature maps of a [N, C, H, W] tensor with probability `prob`
/// and rescales the survivors by 1 / (1 - prob).
///
/// Active only on autodiff backends; on an inference backend (for example
/// after `model.valid()`) it is the identity.
#[derive(Module, Clone, Debug)]
pub struct ChannelDropout {
    prob: f64,
}

impl ChannelDropout {
    pub fn new(prob: f64) -> Self {
        Self { prob }
    }

    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        if !B::ad_enabled() || self.prob == 0.0 {
            return input;
        }

        let [batch, channels, height, width] = input.dims();
        let keep = 1.0 - self.prob;
        let mask = Tensor::<B, 4>::random(
            [batch, channels, 1, 1],
            Distribution::Bernoulli(keep),
            &input.device(),
        )
        .expand([batch, channels, height, width]);

        input * mask.div_scalar(keep)
    }
}

// ─── Driver ───────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Driver<B: Backend> {
    pub conv1:     Conv2d<B>,
    pub conv2:     Conv2d<B>,
    pub conv3:     Conv2d<B>,
    pub conv4:     Conv2d<B>,
    pub conv5:     Conv2d<B>,
    pub dropout:   ChannelDropout,
    pub lin1:      Linear<B>,
    pub lin2:      Linear<B>,
    pub lin3:      Linear<B>,
    pub lin4:      Linear<B>,
    pub elu_alpha: f64,
}

impl<B: Backend> Driver<B> {
    /// Normalise, convolve, drop out and flatten.
    /// images: [N, 3, H, W] raw pixels → [N, flattened_size]
    pub fn conv_features(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let a = self.elu_alpha;
        let x = normalize_pixels(images);
        let x = elu(self.conv1.forward(x), a);
        let x = elu(self.conv2.forward(x), a);
        let x = elu(self.conv3.forward(x), a);
        let x = elu(self.conv4.forward(x), a);
        let x = elu(self.conv5.forward(x), a);
        let x = self.dropout.forward(x);
        x.flatten::<2>(1, 3)
    }

    /// images: [N, 3, H, W], speeds: [N, 1] → steering: [N]
    ///
    /// The result is always 1-D, so a batch of one yields shape [1].
    pub fn forward(&self, images: Tensor<B, 4>, speeds: Tensor<B, 2>) -> Tensor<B, 1> {
        let a = self.elu_alpha;
        let x = self.conv_features(images);
        let x = elu(self.lin1.forward(x), a);
        let x = elu(self.lin2.forward(x), a);
        let x = Tensor::cat(vec![x, speeds], 1);
        let x = elu(self.lin3.forward(x), a);
        self.lin4.forward(x).flatten::<1>(0, 1)
    }

    /// Forward pass plus sum-of-squared-errors against `targets` [N].
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        speeds:  Tensor<B, 2>,
        targets: Tensor<B, 1>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let output = self.forward(images, speeds);
        let loss = sum_squared_error(output.clone(), targets);
        (loss, output)
    }
}

/// Sum over the batch of (prediction - target)^2, as a 1-element tensor.
pub fn sum_squared_error<B: Backend>(predictions: Tensor<B, 1>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
    MseLoss::new().forward(predictions, targets, Reduction::Sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::module::AutodiffModule;

    type TestBackend = burn::backend::NdArray<f32>;
    type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

    fn inputs<B: Backend>(batch: usize, device: &B::Device) -> (Tensor<B, 4>, Tensor<B, 2>) {
        let images = Tensor::<B, 4>::random(
            [batch, 3, 66, 200],
            Distribution::Uniform(0.0, 255.0),
            device,
        );
        let speeds = Tensor::<B, 2>::ones([batch, 1], device).mul_scalar(10.0);
        (images, speeds)
    }

    #[test]
    fn test_conv_output_len() {
        assert_eq!(conv_output_len(66, 5, 2), 31);
        assert_eq!(conv_output_len(200, 5, 2), 98);
        assert_eq!(conv_output_len(5, 3, 1), 3);
        assert_eq!(conv_output_len(2, 3, 1), 0);
    }

    #[test]
    fn test_flattened_size_for_default_input() {
        let cfg = DriverConfig::new();
        assert_eq!((cfg.image_height, cfg.image_width), (FRAME_HEIGHT, FRAME_WIDTH));
        assert_eq!(cfg.conv_output_hw(), (1, 18));
        assert_eq!(cfg.flattened_size(), 1152);
    }

    #[test]
    fn test_flattened_size_matches_conv_stack() {
        let device = Default::default();
        TestBackend::seed(7);
        let cfg = DriverConfig::new();
        let model: Driver<TestBackend> = cfg.init(&device);
        let (images, _) = inputs::<TestBackend>(3, &device);
        assert_eq!(model.conv_features(images).dims(), [3, cfg.flattened_size()]);
    }

    #[test]
    fn test_one_output_per_sample() {
        let device = Default::default();
        let model: Driver<TestBackend> = DriverConfig::new().init(&device);

        let (images, speeds) = inputs::<TestBackend>(4, &device);
        assert_eq!(model.forward(images, speeds).dims(), [4]);

        // A batch of one must stay indexable.
        let (images, speeds) = inputs::<TestBackend>(1, &device);
        assert_eq!(model.forward(images, speeds).dims(), [1]);
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let device = Default::default();
        let model: Driver<TestAutodiffBackend> = DriverConfig::new().init(&device);
        let model = model.valid();

        let (images, speeds) = inputs::<TestBackend>(2, &device);
        let a: Vec<f32> = model.forward(images.clone(), speeds.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = model.forward(images, speeds).into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_training_mode_applies_dropout() {
        let device = Default::default();
        let model: Driver<TestAutodiffBackend> = DriverConfig::new().init(&device);

        let (images, _) = inputs::<TestAutodiffBackend>(2, &device);
        let a: Vec<f32> = model
            .conv_features(images.clone())
            .into_data()
            .to_vec()
            .unwrap();
        let b: Vec<f32> = model.conv_features(images).into_data().to_vec().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_channel_dropout_zeroes_whole_channels() {
        let device = Default::default();
        let dropout = ChannelDropout::new(0.5);
        let x = Tensor::<TestAutodiffBackend, 4>::ones([2, 8, 3, 4], &device);
        let y: Vec<f32> = dropout.forward(x).into_data().to_vec().unwrap();

        for channel in y.chunks(3 * 4) {
            let first = channel[0];
            assert!(first == 0.0 || (first - 2.0).abs() < 1e-6);
            assert!(channel.iter().all(|&v| v == first));
        }
    }

    #[test]
    fn test_channel_dropout_identity_without_autodiff() {
        let device = Default::default();
        let dropout = ChannelDropout::new(0.5);
        let x = Tensor::<TestBackend, 4>::ones([2, 8, 3, 4], &device);
        let y: Vec<f32> = dropout.forward(x).into_data().to_vec().unwrap();
        assert!(y.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_normalization_is_invertible() {
        let device = Default::default();
        let pixels: Vec<f32> = (0..=255).map(|p| p as f32).collect();
        let x = Tensor::<TestBackend, 1>::from_floats(pixels.as_slice(), &device);

        let normalized: Vec<f32> = normalize_pixels(x).into_data().to_vec().unwrap();
        for (n, p) in normalized.iter().zip(&pixels) {
            assert!((-1.0..=1.0).contains(n));
            assert!((n * 127.5 + 127.5 - p).abs() < 1e-3);
        }
    }

    #[test]
    fn test_elu_values() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-1.0, 0.0, 2.0], &device);
        let y: Vec<f32> = elu(x, 0.3).into_data().to_vec().unwrap();
        let expected = 0.3 * ((-1.0f32).exp() - 1.0);
        assert!((y[0] - expected).abs() < 1e-6);
        assert_eq!(y[1], 0.0);
        assert_eq!(y[2], 2.0);
    }

    #[test]
    fn test_sum_squared_error_is_non_negative() {
        let device = Default::default();
        let pred = Tensor::<TestBackend, 1>::from_floats([1.0, -2.0, 0.5], &device);
        let target = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 0.5], &device);
        let loss: f32 = sum_squared_error(pred, target).into_scalar();
        assert!((loss - 10.0).abs() < 1e-5);

        let (images, speeds) = inputs::<TestBackend>(2, &device);
        let model: Driver<TestBackend> = DriverConfig::new().init(&device);
        let targets = Tensor::<TestBackend, 1>::from_floats([-3.0, 4.0], &device);
        let (loss, output) = model.forward_loss(images, speeds, targets);
        assert_eq!(output.dims(), [2]);
        assert!(loss.into_scalar() >= 0.0);
    }
}
