//! Neuron kinds and their sensing / acting tables.

use serde::{Deserialize, Serialize};

/// Squashing function mapping any activation to `[-1, 1]`.
///
/// `2 / (1 + e^-x) - 1`, saturating to ±1 when the exponential overflows.
pub fn squash(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    let e = (-x).exp();
    if e.is_infinite() {
        -1.0
    } else {
        2.0 / (1.0 + e) - 1.0
    }
}

/// What an input neuron measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputKind {
    /// Horizontal position.
    XPosition,
    /// Vertical position.
    YPosition,
    /// Stored energy.
    Energy,
    /// Food waiting to be digested.
    Digesting,
    /// Absolute velocity.
    Speed,
    /// Share of maximum life left.
    Life,
    /// Light received from other creatures.
    Light,
    /// Proximity of the nearest visible food.
    FoodDistance,
    /// Fixed value sampled once per brain.
    Constant(f64),
    /// Oscillation driven by the creature's age.
    Sinusoid,
    /// Creature's age.
    Age,
}

/// Which creature output an action neuron drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Commanded acceleration.
    Acceleration,
    /// Commanded rotation.
    Rotation,
    /// Emitted light radius.
    EmitLight,
    /// Readiness to reproduce.
    Reproduction,
    /// Readiness to attack.
    Attack,
}

/// Role of a neuron in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NeuronKind {
    /// Reads a value from the creature or its surroundings.
    Input(InputKind),
    /// Hidden neuron.
    Transition,
    /// Writes a creature output.
    Action(ActionKind),
}

/// A neuron and its current activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    /// Unique name inside a brain; used as identity across crossover.
    pub name: String,
    /// Role of the neuron.
    pub kind: NeuronKind,
    /// Current value in `[-1, 1]`.
    pub value: f64,
}

impl Neuron {
    /// Creates a neuron at rest.
    pub fn new(name: impl Into<String>, kind: NeuronKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: 0.0,
        }
    }

    /// Checks whether this is an input neuron.
    pub fn is_input(&self) -> bool {
        matches!(self.kind, NeuronKind::Input(_))
    }

    /// Checks whether this is a hidden neuron.
    pub fn is_transition(&self) -> bool {
        matches!(self.kind, NeuronKind::Transition)
    }

    /// Checks whether this is an action neuron.
    pub fn is_action(&self) -> bool {
        matches!(self.kind, NeuronKind::Action(_))
    }

    /// Checks whether this neuron drives the creature's movement.
    pub fn is_movement(&self) -> bool {
        matches!(self.kind, NeuronKind::Action(kind) if kind.is_movement())
    }
}

/// Everything an input neuron may read, gathered before the brain runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sensors {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Stored energy.
    pub energy: f64,
    /// Food waiting to be digested.
    pub digesting: f64,
    /// Signed velocity.
    pub velocity: f64,
    /// `life / max_life`.
    pub life_fraction: f64,
    /// Light level at the creature's position.
    pub light: f64,
    /// Distance to the nearest visible food, if any.
    pub food_distance: Option<f64>,
    /// Creature's vision distance.
    pub vision_distance: f64,
    /// Current simulation time in seconds.
    pub now: f64,
    /// Birth time in seconds.
    pub birth: f64,
}

impl InputKind {
    /// Reads the value of this input from the gathered sensors.
    pub fn sense(self, sensors: &Sensors) -> f64 {
        match self {
            Self::XPosition => squash(sensors.x * 0.003),
            Self::YPosition => squash(sensors.y * 0.003),
            Self::Energy => squash(sensors.energy * 0.1),
            Self::Digesting => squash(sensors.digesting * 0.02),
            Self::Speed => squash(sensors.velocity.abs() * 10.0),
            Self::Life => sensors.life_fraction,
            Self::Light => squash(sensors.light * 0.02),
            Self::FoodDistance => match sensors.food_distance {
                Some(d) if d < sensors.vision_distance => 1.0 - d / sensors.vision_distance,
                _ => -1.0,
            },
            Self::Constant(value) => value,
            Self::Sinusoid => ((sensors.birth - sensors.now) * 0.05).sin(),
            Self::Age => squash((sensors.now - sensors.birth) * 0.01),
        }
    }
}

/// Values written by action neurons into their creature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionOutputs {
    /// Commanded acceleration.
    pub acceleration: f64,
    /// Commanded rotation, in degrees per millisecond.
    pub rotation: f64,
    /// Emitted light radius, never negative.
    pub light_emission: f64,
    /// Whether the creature wants to reproduce.
    pub ready_for_reproduction: bool,
    /// Whether the creature wants to attack.
    pub ready_to_kill: bool,
}

/// Thresholds used to turn action neuron values into outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionThresholds {
    /// Light radius emitted at full activation.
    pub max_light_distance_emission: f64,
    /// Activation required to be ready to reproduce.
    pub min_reproduction_state: f64,
    /// Activation required to be ready to attack.
    pub min_attack_state: f64,
}

impl ActionKind {
    /// Every action, in catalogue order.
    pub const ALL: [Self; 5] = [
        Self::Acceleration,
        Self::Rotation,
        Self::EmitLight,
        Self::Reproduction,
        Self::Attack,
    ];

    /// Display name, unique among actions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Acceleration => "Acceleration",
            Self::Rotation => "Rotation",
            Self::EmitLight => "Light e.",
            Self::Reproduction => "Reproduction",
            Self::Attack => "Attack",
        }
    }

    /// Acceleration and rotation make up the movement category.
    pub fn is_movement(self) -> bool {
        matches!(self, Self::Acceleration | Self::Rotation)
    }

    /// Writes the output owned by this action.
    pub fn act(self, value: f64, outputs: &mut ActionOutputs, thresholds: &ActionThresholds) {
        match self {
            Self::Acceleration => outputs.acceleration = value,
            Self::Rotation => outputs.rotation = value / 20.0,
            Self::EmitLight => {
                outputs.light_emission =
                    ((value - 0.15) * thresholds.max_light_distance_emission).max(0.0).round();
            }
            Self::Reproduction => {
                outputs.ready_for_reproduction = value >= thresholds.min_reproduction_state;
            }
            Self::Attack => outputs.ready_to_kill = value >= thresholds.min_attack_state,
        }
    }
}

/// Input neurons available to a freshly generated brain. Constants get their value later.
pub(crate) fn input_catalogue() -> Vec<(String, Option<InputKind>)> {
    let mut catalogue: Vec<(String, Option<InputKind>)> = [
        ("X Position", InputKind::XPosition),
        ("Y Position", InputKind::YPosition),
        ("Energy", InputKind::Energy),
        ("Digesting", InputKind::Digesting),
        ("Speed", InputKind::Speed),
        ("Life", InputKind::Life),
        ("Light", InputKind::Light),
        ("Food dist.", InputKind::FoodDistance),
    ]
    .into_iter()
    .map(|(name, kind)| (name.to_string(), Some(kind)))
    .collect();
    catalogue.extend((0..5).map(|i| (format!("C{i}"), None)));
    catalogue.push(("Sinusoid".to_string(), Some(InputKind::Sinusoid)));
    catalogue.push(("Age".to_string(), Some(InputKind::Age)));
    catalogue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_is_bounded_and_odd() {
        assert_eq!(squash(0.0), 0.0);
        assert!((squash(1.0) + squash(-1.0)).abs() < 1e-12);
        assert_eq!(squash(1e6), 1.0);
        assert_eq!(squash(-1e6), -1.0);
        assert!((squash(1.0) - 0.5_f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn food_distance_outside_vision_reads_minus_one() {
        let sensors = Sensors {
            food_distance: Some(80.0),
            vision_distance: 50.0,
            ..Sensors::default()
        };
        assert_eq!(InputKind::FoodDistance.sense(&sensors), -1.0);

        let sensors = Sensors {
            food_distance: Some(25.0),
            vision_distance: 50.0,
            ..Sensors::default()
        };
        assert!((InputKind::FoodDistance.sense(&sensors) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn light_emission_is_never_negative() {
        let thresholds = ActionThresholds {
            max_light_distance_emission: 200.0,
            min_reproduction_state: 0.2,
            min_attack_state: 0.5,
        };
        let mut outputs = ActionOutputs::default();
        ActionKind::EmitLight.act(-0.9, &mut outputs, &thresholds);
        assert_eq!(outputs.light_emission, 0.0);
        ActionKind::EmitLight.act(0.65, &mut outputs, &thresholds);
        assert_eq!(outputs.light_emission, 100.0);
    }

    #[test]
    fn rotation_is_scaled_down() {
        let thresholds = ActionThresholds {
            max_light_distance_emission: 200.0,
            min_reproduction_state: 0.2,
            min_attack_state: 0.5,
        };
        let mut outputs = ActionOutputs::default();
        ActionKind::Rotation.act(1.0, &mut outputs, &thresholds);
        assert!((outputs.rotation - 0.05).abs() < 1e-12);
    }
}
