use crate::state::StateVector;

/// Named mood targets for fast appearance switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    Neutral,
    Happy,
    Sad,
    Angry,
    Anxious,
    Overloaded,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Neutral,
        Preset::Happy,
        Preset::Sad,
        Preset::Angry,
        Preset::Anxious,
        Preset::Overloaded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Neutral => "neutral",
            Preset::Happy => "happy",
            Preset::Sad => "sad",
            Preset::Angry => "angry",
            Preset::Anxious => "anxious",
            Preset::Overloaded => "overloaded",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Preset for the 1..=6 digit keys used by both frontends.
    pub fn for_digit(key: &str) -> Option<Self> {
        let idx: usize = key.parse().ok()?;
        idx.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn state(self) -> StateVector {
        match self {
            Preset::Neutral => NEUTRAL,
            Preset::Happy => HAPPY,
            Preset::Sad => SAD,
            Preset::Angry => ANGRY,
            Preset::Anxious => ANXIOUS,
            Preset::Overloaded => OVERLOADED,
        }
    }
}

pub const NEUTRAL: StateVector = StateVector {
    arousal: 0.45,
    valence: 0.5,
    stability: 0.62,
    load: 0.35,
    social_drain: 0.3,
    intensity: 0.5,
};

pub const HAPPY: StateVector = StateVector {
    arousal: 0.72,
    valence: 0.86,
    stability: 0.68,
    load: 0.25,
    social_drain: 0.18,
    intensity: 0.7,
};

pub const SAD: StateVector = StateVector {
    arousal: 0.28,
    valence: 0.18,
    stability: 0.58,
    load: 0.32,
    social_drain: 0.62,
    intensity: 0.46,
};

pub const ANGRY: StateVector = StateVector {
    arousal: 0.88,
    valence: 0.2,
    stability: 0.24,
    load: 0.78,
    social_drain: 0.5,
    intensity: 0.86,
};

pub const ANXIOUS: StateVector = StateVector {
    arousal: 0.82,
    valence: 0.3,
    stability: 0.18,
    load: 0.74,
    social_drain: 0.56,
    intensity: 0.8,
};

pub const OVERLOADED: StateVector = StateVector {
    arousal: 0.74,
    valence: 0.36,
    stability: 0.14,
    load: 0.96,
    social_drain: 0.78,
    intensity: 0.95,
};
