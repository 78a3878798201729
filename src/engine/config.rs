//! Engine configuration knobs.

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transposition table budget in MiB; capacity rounds down to a power of
    /// two entries.
    pub hash_mb: usize,
    /// Initial aspiration half-window around the previous iteration's score.
    pub aspiration_window_cp: i32,
    /// Depth reduction R for null-move pruning.
    pub null_move_reduction: u8,
    /// Moves searched at full depth before late-move reduction kicks in.
    pub lmr_min_move_index: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: 128,
            aspiration_window_cp: 50,
            null_move_reduction: 2,
            lmr_min_move_index: 4,
        }
    }
}

impl EngineConfig {
    /// Name/value option path for embedders that configure over text
    /// protocols. Unknown names are errors; values are validated.
    pub fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        match name {
            "hash_mb" => {
                self.hash_mb = parse_option(name, value)?;
                if self.hash_mb == 0 {
                    return Err(EngineError::LimitsError(
                        "hash_mb must be at least 1".to_owned(),
                    ));
                }
            }
            "aspiration_window_cp" => self.aspiration_window_cp = parse_option(name, value)?,
            "null_move_reduction" => self.null_move_reduction = parse_option(name, value)?,
            "lmr_min_move_index" => self.lmr_min_move_index = parse_option(name, value)?,
            _ => {
                return Err(EngineError::LimitsError(format!(
                    "unknown option: {name}"
                )))
            }
        }
        Ok(())
    }
}

fn parse_option<T: std::str::FromStr>(name: &str, value: &str) -> EngineResult<T> {
    value
        .parse::<T>()
        .map_err(|_| EngineError::LimitsError(format!("invalid value for {name}: {value}")))
}
