//! Two-headed emulator network.
//!
//! A shared trunk feeds two heads:
//! - the *classical* head (radius, luminosity, surface metallicity, ...)
//! - the *astero* head (oscillation frequencies, usually through [`InversePca`])
//!
//! Layer chains are checked for width compatibility at construction so that
//! a mis-assembled network fails on load rather than on the first prediction.

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};
use crate::nn::{Dense, InversePca};

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Dense(Dense),
    InversePca(InversePca),
}

impl Layer {
    pub fn in_features(&self) -> usize {
        match self {
            Layer::Dense(d) => d.in_features(),
            Layer::InversePca(p) => p.n_components(),
        }
    }

    pub fn out_features(&self) -> usize {
        match self {
            Layer::Dense(d) => d.out_features(),
            Layer::InversePca(p) => p.n_outputs(),
        }
    }

    pub fn forward(&self, x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        match self {
            Layer::Dense(d) => d.forward(x),
            Layer::InversePca(p) => p.forward(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    inputs: usize,
    trunk: Vec<Layer>,
    classical: Vec<Layer>,
    astero: Vec<Layer>,
    classical_width: usize,
    astero_width: usize,
}

impl Network {
    pub fn new(
        inputs: usize,
        trunk: Vec<Layer>,
        classical: Vec<Layer>,
        astero: Vec<Layer>,
    ) -> AppResult<Self> {
        if inputs == 0 {
            return Err(AppError::input("Network must take at least one input."));
        }
        if classical.is_empty() || astero.is_empty() {
            return Err(AppError::input("Both network heads need at least one layer."));
        }
        let trunk_width = chain_width(inputs, &trunk, "trunk")?;
        let classical_width = chain_width(trunk_width, &classical, "classical head")?;
        let astero_width = chain_width(trunk_width, &astero, "astero head")?;

        Ok(Self {
            inputs,
            trunk,
            classical,
            astero,
            classical_width,
            astero_width,
        })
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn classical_width(&self) -> usize {
        self.classical_width
    }

    pub fn astero_width(&self) -> usize {
        self.astero_width
    }

    pub fn output_width(&self) -> usize {
        self.classical_width + self.astero_width
    }

    /// Evaluate both heads on a batch of standardised inputs.
    pub fn forward(&self, x: &DMatrix<f64>) -> AppResult<(DMatrix<f64>, DMatrix<f64>)> {
        if x.ncols() != self.inputs {
            return Err(AppError::data(format!(
                "Network expects {} inputs, got {}.",
                self.inputs,
                x.ncols()
            )));
        }
        let hidden = run_layers(&self.trunk, x.clone())?;
        let classical = run_layers(&self.classical, hidden.clone())?;
        let astero = run_layers(&self.astero, hidden)?;
        Ok((classical, astero))
    }

    /// Evaluate both heads and place them side by side (classical first).
    pub fn forward_concat(&self, x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        let (classical, astero) = self.forward(x)?;
        let mut out = DMatrix::zeros(x.nrows(), self.output_width());
        out.columns_mut(0, self.classical_width).copy_from(&classical);
        out.columns_mut(self.classical_width, self.astero_width)
            .copy_from(&astero);
        Ok(out)
    }
}

fn run_layers(layers: &[Layer], mut x: DMatrix<f64>) -> AppResult<DMatrix<f64>> {
    for layer in layers {
        x = layer.forward(&x)?;
    }
    Ok(x)
}

fn chain_width(input: usize, layers: &[Layer], what: &str) -> AppResult<usize> {
    let mut width = input;
    for (i, layer) in layers.iter().enumerate() {
        if layer.in_features() != width {
            return Err(AppError::input(format!(
                "Network {what} layer {i} expects {} inputs but receives {width}.",
                layer.in_features()
            )));
        }
        width = layer.out_features();
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Activation;

    fn identity(n: usize) -> Layer {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Layer::Dense(Dense::from_rows(&rows, vec![0.0; n], Activation::Linear).unwrap())
    }

    #[test]
    fn heads_share_the_trunk() {
        let trunk = vec![Layer::Dense(
            Dense::from_rows(&[vec![2.0, 0.0], vec![0.0, 3.0]], vec![0.0, 0.0], Activation::Linear)
                .unwrap(),
        )];
        let classical = vec![identity(2)];
        let astero = vec![Layer::InversePca(
            InversePca::new(&[vec![1.0, 1.0, 1.0], vec![0.0, 0.0, 1.0]], vec![0.0; 3]).unwrap(),
        )];
        let net = Network::new(2, trunk, classical, astero).unwrap();
        assert_eq!(net.output_width(), 5);

        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let out = net.forward_concat(&x).unwrap();
        assert_eq!(
            out.row(0).iter().copied().collect::<Vec<_>>(),
            vec![2.0, 3.0, 2.0, 2.0, 5.0]
        );
    }

    #[test]
    fn mismatched_chain_fails_on_construction() {
        let err = Network::new(3, vec![identity(2)], vec![identity(2)], vec![identity(2)]).unwrap_err();
        assert!(err.to_string().contains("trunk"));
    }

    #[test]
    fn empty_trunk_is_allowed() {
        let net = Network::new(2, vec![], vec![identity(2)], vec![identity(2)]).unwrap();
        assert_eq!(net.classical_width(), 2);
        assert_eq!(net.astero_width(), 2);
    }
}
