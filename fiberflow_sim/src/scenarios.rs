//! Named scenarios for the harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// FF-001: one trunk fiber through a six-point curve
    SingleFiber,

    /// FF-002: trunk feeding a splice with two staggered branches
    Splice,

    /// FF-003: splice scene with interference noise on
    NoisySplice,

    /// FF-004: splice scene in colorful mode
    Rainbow,

    /// FF-005: splice scene with exaggerated splice loss
    LossySplice,

    /// FF-006: splice loss rolled once per junction pass
    PassLoss,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SingleFiber,
            ScenarioId::Splice,
            ScenarioId::NoisySplice,
            ScenarioId::Rainbow,
            ScenarioId::LossySplice,
            ScenarioId::PassLoss,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SingleFiber => "single_fiber",
            ScenarioId::Splice => "splice",
            ScenarioId::NoisySplice => "noisy_splice",
            ScenarioId::Rainbow => "rainbow",
            ScenarioId::LossySplice => "lossy_splice",
            ScenarioId::PassLoss => "pass_loss",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SingleFiber => "80 photons on one curved fiber, junction mid-span",
            ScenarioId::Splice => "Trunk into a splice enclosure, two branches out",
            ScenarioId::NoisySplice => "Splice with high-frequency interference on ~30% of photons",
            ScenarioId::Rainbow => "Splice with rainbow photon colors",
            ScenarioId::LossySplice => {
                "Splice with 5% per-frame loss to exercise scatter and respawn"
            }
            ScenarioId::PassLoss => "Splice with one loss trial per junction pass",
        }
    }

    /// Returns true if the scenario exercises splice loss heavily.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ScenarioId::LossySplice | ScenarioId::PassLoss)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_fiber" | "singlefiber" | "ff-001" => Ok(ScenarioId::SingleFiber),
            "splice" | "ff-002" => Ok(ScenarioId::Splice),
            "noisy_splice" | "noisysplice" | "noisy" | "ff-003" => Ok(ScenarioId::NoisySplice),
            "rainbow" | "ff-004" => Ok(ScenarioId::Rainbow),
            "lossy_splice" | "lossysplice" | "lossy" | "ff-005" => Ok(ScenarioId::LossySplice),
            "pass_loss" | "passloss" | "ff-006" => Ok(ScenarioId::PassLoss),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("FF-005".parse::<ScenarioId>(), Ok(ScenarioId::LossySplice));
        assert_eq!("Noisy".parse::<ScenarioId>(), Ok(ScenarioId::NoisySplice));
        assert!("warp".parse::<ScenarioId>().is_err());
    }
}
