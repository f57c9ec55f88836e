//! Several automatones rendered as one piece.

use crate::activations::ActivationMatrix;
use crate::audio::{AudioBuffer, RenderOptions, Sequence};
use crate::automatone::Automatone;
use crate::error::Result;

/// Several automatones played together.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    automatones: Vec<Automatone>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, automatone: Automatone) {
        self.automatones.push(automatone);
    }

    pub fn len(&self) -> usize {
        self.automatones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.automatones.is_empty()
    }

    /// All parts merged into one sequence.
    pub fn sequence(&self) -> Sequence {
        let mut sequence = Sequence::new();
        for automatone in &self.automatones {
            sequence.extend(automatone.sequence().iter().cloned());
        }
        sequence
    }

    pub fn render_audio(&self, options: &RenderOptions) -> Result<AudioBuffer> {
        self.sequence().render_parallel(options)
    }

    /// Every part's activations stacked in time, padded to the widest.
    pub fn activations(&self) -> ActivationMatrix {
        let parts: Vec<ActivationMatrix> =
            self.automatones.iter().map(Automatone::activations).collect();
        ActivationMatrix::stack(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rule;

    #[test]
    fn parts_are_merged() {
        let a = Automatone::new(vec![Rule::new(30)]).unwrap().with_dimensions(8, 10, 0);
        let b = Automatone::new(vec![Rule::new(90)]).unwrap().with_dimensions(12, 6, 0);
        let mut c = Composition::new();
        c.add(a.clone());
        c.add(b.clone());
        assert_eq!(c.len(), 2);
        assert_eq!(c.sequence().len(), a.sequence().len() + b.sequence().len());

        let m = c.activations();
        assert_eq!((m.rows(), m.cols()), (16, 12));
    }

    #[test]
    fn empty_composition_renders_silence() {
        let c = Composition::new();
        let buf = c.render_audio(&RenderOptions::new(100)).unwrap();
        assert_eq!(buf.frames(), 100);
        assert_eq!(buf.peak(), 0.0);
    }
}
