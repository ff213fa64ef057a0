use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 42;
const FALLBACK: Rgb<u8> = Rgb([255, 255, 255]);

/// One overlay colour per class, stable across runs.
#[derive(Debug, Clone)]
pub struct Palette(Vec<Rgb<u8>>);

impl Palette {
    pub fn new(num_classes: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);
        Self((0..num_classes).map(|_| Rgb(rng.gen::<[u8; 3]>())).collect())
    }

    /// Colour for `class_idx`, white when the class is outside the table.
    pub fn color(&self, class_idx: usize) -> Rgb<u8> {
        self.0.get(class_idx).copied().unwrap_or(FALLBACK)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
