use std::fmt;

use serde::{Deserialize, Serialize};

/// Mutually exclusive bucket a classified audio window is assigned to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    Instrument,
    Voice,
    Silence,
    Metronome,
    Noise,
}

impl SoundCategory {
    pub const ALL: [SoundCategory; 5] = [
        SoundCategory::Instrument,
        SoundCategory::Voice,
        SoundCategory::Silence,
        SoundCategory::Noise,
        SoundCategory::Metronome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instrument => "instrument",
            Self::Voice => "voice",
            Self::Silence => "silence",
            Self::Metronome => "metronome",
            Self::Noise => "noise",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
