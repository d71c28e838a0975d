//! Food points and the generators that scatter them.

use ndarray::Array1;
use rand::Rng;

use super::geometric_utils::wrap_around_mut;
use super::locatable::Locatable;
use super::params::FoodGeneratorParams;

/// Attempts at drawing a position inside the world before wrapping it instead.
const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// A food point collectible by creatures.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodPoint {
    /// Unique identifier.
    pub id: u64,
    /// Position in 2D space.
    pub position: Array1<f64>,
    /// Food units given to the creature eating it.
    pub quantity: u32,
}

impl FoodPoint {
    /// Creates a food point.
    pub fn new(id: u64, position: Array1<f64>, quantity: u32) -> Self {
        Self {
            id,
            position,
            quantity,
        }
    }

    /// Side of the collision square: `ceil(quantity / 10)`.
    pub fn rect_side(&self) -> f64 {
        f64::from(self.quantity.div_ceil(10))
    }
}

impl Locatable for FoodPoint {
    fn pos(&self) -> &Array1<f64> {
        &self.position
    }

    fn id(&self) -> u64 {
        self.id
    }
}

/// A disc randomly spawning food points.
#[derive(Debug, Clone)]
pub struct FoodGenerator {
    /// Centre of the disc.
    pub center: Array1<f64>,
    /// Radius of the disc.
    pub radius: f64,
    /// Probability of spawning on each tick, in `[0, 1]`.
    pub spawn_probability: f64,
}

impl FoodGenerator {
    /// Builds a generator, drawing its centre when the parameters leave it open.
    pub fn from_params<R: Rng + ?Sized>(
        params: &FoodGeneratorParams,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Self {
        let center = match params.center {
            Some([x, y]) => Array1::from_vec(vec![x, y]),
            None => Array1::from_vec(vec![
                rng.random_range(0.0..width).floor(),
                rng.random_range(0.0..height).floor(),
            ]),
        };
        Self {
            center,
            radius: params.radius,
            spawn_probability: params.spawn_probability,
        }
    }

    /// Possibly spawns a food point with the given id somewhere in the disc.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        id: u64,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Option<FoodPoint> {
        if rng.random::<f64>() >= self.spawn_probability {
            return None;
        }
        let position = self.generate_position(width, height, rng);
        Some(FoodPoint::new(id, position, rng.random_range(2..=35)))
    }

    /// Uniform polar draw inside the disc, rounded to whole coordinates.
    fn generate_position<R: Rng + ?Sized>(
        &self,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Array1<f64> {
        let draw = |rng: &mut R| {
            let r = self.radius * rng.random::<f64>();
            let (sin, cos) = (rng.random::<f64>() * std::f64::consts::TAU).sin_cos();
            Array1::from_vec(vec![
                (self.center[0] + r * cos).round(),
                (self.center[1] + r * sin).round(),
            ])
        };

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let position = draw(rng);
            if position[0] > 0.0 && position[0] < width && position[1] > 0.0 && position[1] < height
            {
                return position;
            }
        }
        // generator sits on an edge, fall back to the opposite side
        let mut position = draw(rng);
        wrap_around_mut(&mut position, width, height);
        position
    }
}
