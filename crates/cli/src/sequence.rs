use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// ROMs with a built-in test sequence.
pub const BUILTIN_ROMS: [&str; 4] = ["afm", "tna", "ij_l7", "gw"];

/// One on/off pulse of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: char,
    pub number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_ms: Option<u64>,
}

impl Step {
    const fn pulse(kind: char, number: i32) -> Self {
        Self {
            kind,
            number,
            on_ms: None,
            off_ms: None,
        }
    }

    const fn held(kind: char, number: i32, on_ms: u64) -> Self {
        Self {
            kind,
            number,
            on_ms: Some(on_ms),
            off_ms: None,
        }
    }

    /// Type tag as sent over the bridge.
    pub fn tag(&self) -> u8 {
        self.kind as u8
    }

    pub fn on(&self, default: Duration) -> Duration {
        self.on_ms.map(Duration::from_millis).unwrap_or(default)
    }

    pub fn off(&self, default: Duration) -> Duration {
        self.off_ms.map(Duration::from_millis).unwrap_or(default)
    }
}

fn pulses(kind: char, numbers: &[i32]) -> impl Iterator<Item = Step> + '_ {
    numbers.iter().map(move |&n| Step::pulse(kind, n))
}

/// Canned sequence for a known ROM.
pub fn builtin(rom: &str) -> Option<Vec<Step>> {
    let steps = match rom {
        // Attack From Mars
        "afm" => pulses('S', &[27, 11, 28])
            .chain(pulses('W', &[74]))
            .chain(pulses('S', &[9, 25, 12, 21, 23, 26, 10, 17, 18, 22]))
            .chain(pulses('W', &[38]))
            .chain(pulses('S', &[19, 13, 20]))
            .chain(pulses('W', &[48, 72]))
            .chain(pulses('S', &[39]))
            .chain(pulses('W', &[65]))
            .collect(),
        // Total Nuclear Annihilation
        "tna" => pulses(
            'E',
            &[103, 108, 110, 112, 116, 144, 146, 147, 148, 149, 150, 151, 152, 153, 179],
        )
        .collect(),
        // Indiana Jones L7
        "ij_l7" => std::iter::once(Step::held('L', 88, 5000))
            .chain(pulses('S', &[9, 12, 51, 53]))
            .chain(pulses('W', &[15, 16, 65, 66, 67, 68]))
            .chain(pulses('L', &[88]))
            .chain(pulses('S', &[10]))
            .chain(pulses('W', &[88]))
            .collect(),
        // The Getaway High Speed II
        "gw" => pulses('L', &[52])
            .chain(pulses('S', &[8, 12, 16, 19, 46, 48]))
            .chain(pulses(
                'W',
                &[15, 25, 26, 37, 38, 42, 43, 52, 53, 67, 78, 81, 86, 87, 88],
            ))
            .collect(),
        _ => return None,
    };
    Some(steps)
}

/// Single `S1` pulse for ROMs without a built-in sequence.
pub fn fallback() -> Vec<Step> {
    vec![Step::pulse('S', 1)]
}

pub fn parse_script(raw: &str) -> anyhow::Result<Vec<Step>> {
    let steps: Vec<Step> = serde_json::from_str(raw)?;
    if steps.is_empty() {
        anyhow::bail!("script contains no steps");
    }
    if let Some(bad) = steps.iter().find(|s| !s.kind.is_ascii()) {
        anyhow::bail!("step type must be a single ASCII character, got {:?}", bad.kind);
    }
    Ok(steps)
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<Step>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()))?;
    parse_script(&raw)
}
