// SPDX-License-Identifier: MIT OR Apache-2.0

//! The position-regression network.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, LeakyRelu, LeakyReluConfig, Linear,
    LinearConfig, PaddingConfig2d,
};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Tunable constants of the network topology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PosNetConfig {
    /// Base channel width C; the three stages widen to C, 2C and 4C.
    pub channels: usize,
    /// Dropout probability applied to the flattened features. The stage is
    /// part of the architecture but disabled (0.0) by default.
    pub dropout: f64,
}

impl Default for PosNetConfig {
    fn default() -> Self {
        Self {
            channels: 128,
            dropout: 0.0,
        }
    }
}

/// Convolutional network mapping one single-channel 8x8 image to an
/// (x, y, z) estimate in millimetres.
///
/// Each stage is conv -> leaky-ReLU -> batch-norm -> 2x2 max-pool (stride 2).
/// With an 8x8 input the three stages collapse the spatial extent to exactly
/// 1x1 (8 -> 4 -> 2 -> 1 after the padded 2x2 convolutions), so the flatten
/// into the final projection is a pure channel reshape; the forward pass
/// asserts this invariant.
#[derive(Module, Debug)]
pub struct PosNet<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    bn3: BatchNorm<B, 2>,
    pool: MaxPool2d,
    activation: LeakyRelu,
    dropout: Dropout,
    fc: Linear<B>,
}

impl<B: Backend> PosNet<B> {
    /// Initialise the network with freshly sampled parameters.
    pub fn new(config: &PosNetConfig, device: &B::Device) -> Self {
        let c = config.channels;

        let conv1 = Conv2dConfig::new([1, c], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([c, c * 2], [2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv3 = Conv2dConfig::new([c * 2, c * 4], [2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        Self {
            conv1,
            bn1: BatchNormConfig::new(c).init(device),
            conv2,
            bn2: BatchNormConfig::new(c * 2).init(device),
            conv3,
            bn3: BatchNormConfig::new(c * 4).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            activation: LeakyReluConfig::new().init(),
            dropout: DropoutConfig::new(config.dropout).init(),
            fc: LinearConfig::new(c * 4, 3).init(device),
        }
    }

    /// Forward pass: `[batch, 1, 8, 8]` images to `[batch, 3]` positions.
    ///
    /// Raw regression outputs, no final activation.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(input);
        let x = self.pool.forward(self.bn1.forward(self.activation.forward(x)));
        let x = self.conv2.forward(x);
        let x = self.pool.forward(self.bn2.forward(self.activation.forward(x)));
        let x = self.conv3.forward(x);
        let x = self.pool.forward(self.bn3.forward(self.activation.forward(x)));

        let [batch, channels, height, width] = x.dims();
        assert!(
            height == 1 && width == 1,
            "spatial extent must collapse to 1x1 before the projection, got {height}x{width}"
        );

        let x = x.reshape([batch, channels]);
        let x = self.dropout.forward(x);
        self.fc.forward(x)
    }
}
