use rand::Rng;
use tracing::debug;

use crate::error::AnimatorError;

/// Forward-inference contract used by the animator. Inputs are written one
/// value at a time, `predict` runs the pass, outputs are read by index.
pub trait Network {
    fn input_len(&self) -> usize;
    fn output_len(&self) -> usize;

    /// False while no parameters are loaded; the animator skips inference then.
    fn is_initialised(&self) -> bool {
        true
    }

    fn set_input(&mut self, index: usize, value: f32);
    fn predict(&mut self);
    fn output(&self, index: usize) -> f32;
}

impl<N: Network + ?Sized> Network for Box<N> {
    fn input_len(&self) -> usize {
        (**self).input_len()
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn is_initialised(&self) -> bool {
        (**self).is_initialised()
    }

    fn set_input(&mut self, index: usize, value: f32) {
        (**self).set_input(index, value)
    }

    fn predict(&mut self) {
        (**self).predict()
    }

    fn output(&self, index: usize) -> f32 {
        (**self).output(index)
    }
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    /// Row-major, `outputs` rows of `inputs` columns.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    pub fn inputs(&self) -> usize {
        if self.bias.is_empty() {
            0
        } else {
            self.weights.len() / self.bias.len()
        }
    }

    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f32], output: &mut Vec<f32>) {
        let cols = input.len();
        output.clear();
        output.extend(self.bias.iter().enumerate().map(|(row, b)| {
            let weights = &self.weights[row * cols..(row + 1) * cols];
            b + weights.iter().zip(input).map(|(w, x)| w * x).sum::<f32>()
        }));
    }
}

#[derive(Debug, Clone)]
pub struct MlpParameters {
    pub x_mean: Vec<f32>,
    pub x_std: Vec<f32>,
    pub y_mean: Vec<f32>,
    pub y_std: Vec<f32>,
    pub layers: Vec<DenseLayer>,
}

impl MlpParameters {
    fn validate(&self) -> Result<(), AnimatorError> {
        let Some(first) = self.layers.first() else {
            return Err(AnimatorError::Parameters("no layers".into()));
        };
        let inputs = first.inputs();
        if self.x_mean.len() != inputs || self.x_std.len() != inputs {
            return Err(AnimatorError::Parameters(format!(
                "input normalisation has {}/{} entries, first layer takes {inputs}",
                self.x_mean.len(),
                self.x_std.len()
            )));
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(AnimatorError::Parameters(format!(
                    "layer {i} emits {} values, layer {} takes {}",
                    pair[0].outputs(),
                    i + 1,
                    pair[1].inputs()
                )));
            }
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.inputs() * layer.outputs() {
                return Err(AnimatorError::Parameters(format!(
                    "layer {i} weight matrix is not {}x{}",
                    layer.outputs(),
                    layer.inputs()
                )));
            }
        }
        let outputs = self.layers[self.layers.len() - 1].outputs();
        if self.y_mean.len() != outputs || self.y_std.len() != outputs {
            return Err(AnimatorError::Parameters(format!(
                "output normalisation has {}/{} entries, last layer emits {outputs}",
                self.y_mean.len(),
                self.y_std.len()
            )));
        }
        Ok(())
    }
}

/// Plain multilayer perceptron: normalised input, ELU hidden layers, linear
/// output layer, de-normalised output.
#[derive(Debug, Clone)]
pub struct Mlp {
    parameters: Option<MlpParameters>,
    input: Vec<f32>,
    output: Vec<f32>,
    scratch: Vec<f32>,
}

impl Mlp {
    pub fn new(parameters: MlpParameters) -> Result<Self, AnimatorError> {
        parameters.validate()?;
        let inputs = parameters.x_mean.len();
        let outputs = parameters.y_mean.len();
        debug!(inputs, outputs, layers = parameters.layers.len(), "mlp ready");
        Ok(Self {
            parameters: Some(parameters),
            input: vec![0.0; inputs],
            output: vec![0.0; outputs],
            scratch: Vec::new(),
        })
    }

    /// A network with buffers but no parameters. It reports itself as
    /// uninitialised and `predict` leaves the outputs at zero.
    pub fn empty(inputs: usize, outputs: usize) -> Self {
        Self {
            parameters: None,
            input: vec![0.0; inputs],
            output: vec![0.0; outputs],
            scratch: Vec::new(),
        }
    }

    /// Uniform random weights in `[-scale, scale]` and identity normalisation.
    pub fn random(
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
        scale: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, AnimatorError> {
        let mut dims = Vec::with_capacity(hidden.len() + 2);
        dims.push(inputs);
        dims.extend_from_slice(hidden);
        dims.push(outputs);

        let scale = scale.abs().max(f32::EPSILON);
        let layers = dims
            .windows(2)
            .map(|pair| DenseLayer {
                weights: (0..pair[0] * pair[1])
                    .map(|_| rng.gen_range(-scale..=scale))
                    .collect(),
                bias: (0..pair[1]).map(|_| rng.gen_range(-scale..=scale)).collect(),
            })
            .collect();

        Self::new(MlpParameters {
            x_mean: vec![0.0; inputs],
            x_std: vec![1.0; inputs],
            y_mean: vec![0.0; outputs],
            y_std: vec![1.0; outputs],
            layers,
        })
    }
}

fn elu(x: f32) -> f32 {
    if x > 0.0 { x } else { x.exp() - 1.0 }
}

impl Network for Mlp {
    fn input_len(&self) -> usize {
        self.input.len()
    }

    fn output_len(&self) -> usize {
        self.output.len()
    }

    fn is_initialised(&self) -> bool {
        self.parameters.is_some()
    }

    fn set_input(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.input.get_mut(index) {
            *slot = value;
        }
    }

    fn predict(&mut self) {
        let Some(params) = &self.parameters else {
            return;
        };

        let mut current: Vec<f32> = self
            .input
            .iter()
            .zip(params.x_mean.iter().zip(&params.x_std))
            .map(|(x, (mean, std))| if *std == 0.0 { x - mean } else { (x - mean) / std })
            .collect();

        let last = params.layers.len() - 1;
        for (i, layer) in params.layers.iter().enumerate() {
            layer.forward(&current, &mut self.scratch);
            if i != last {
                self.scratch.iter_mut().for_each(|v| *v = elu(*v));
            }
            std::mem::swap(&mut current, &mut self.scratch);
        }

        for (out, (y, (mean, std))) in self
            .output
            .iter_mut()
            .zip(current.iter().zip(params.y_mean.iter().zip(&params.y_std)))
        {
            *out = y * std + mean;
        }
    }

    fn output(&self, index: usize) -> f32 {
        self.output.get(index).copied().unwrap_or(0.0)
    }
}
