//! SETTINGS parameter table. https://httpwg.org/specs/rfc7540.html#SettingsFrame

use enum_map::{enum_map, Enum, EnumMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum SettingsParameter {
    HeaderTableSize,
    EnablePush,
    MaxConcurrentStreams,
    InitialWindowSize,
    MaxFrameSize,
    MaxHeaderListSize,
}

impl SettingsParameter {
    #[must_use]
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x1 => Some(Self::HeaderTableSize),
            0x2 => Some(Self::EnablePush),
            0x3 => Some(Self::MaxConcurrentStreams),
            0x4 => Some(Self::InitialWindowSize),
            0x5 => Some(Self::MaxFrameSize),
            0x6 => Some(Self::MaxHeaderListSize),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(self) -> u16 {
        match self {
            Self::HeaderTableSize => 0x1,
            Self::EnablePush => 0x2,
            Self::MaxConcurrentStreams => 0x3,
            Self::InitialWindowSize => 0x4,
            Self::MaxFrameSize => 0x5,
            Self::MaxHeaderListSize => 0x6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    values: EnumMap<SettingsParameter, u32>,
}

impl Default for Settings {
    fn default() -> Self {
        use SettingsParameter::*;
        Self {
            values: enum_map! {
                HeaderTableSize => 4096,
                EnablePush => 0,
                MaxConcurrentStreams => 100,
                InitialWindowSize => 65_535,
                MaxFrameSize => crate::frame::DEFAULT_MAX_FRAME_SIZE,
                MaxHeaderListSize => 16_384,
            },
        }
    }
}

impl Settings {
    #[must_use]
    pub fn get(&self, param: SettingsParameter) -> u32 {
        self.values[param]
    }

    pub fn set(&mut self, param: SettingsParameter, value: u32) {
        self.values[param] = value;
    }

    /// Parses a SETTINGS frame payload (6 bytes per parameter). Unknown
    /// parameter ids are ignored per RFC 7540 §6.5.2.
    #[must_use]
    pub fn apply_wire(&mut self, payload: &[u8]) -> Vec<(SettingsParameter, u32)> {
        let mut applied = Vec::new();
        for chunk in payload.chunks_exact(6) {
            let id = u16::from_be_bytes([chunk[0], chunk[1]]);
            let value = u32::from_be_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
            if let Some(param) = SettingsParameter::from_id(id) {
                self.values[param] = value;
                applied.push((param, value));
            }
        }
        applied
    }

    /// Serializes the full six-parameter table as a SETTINGS frame payload.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(36);
        for (param, value) in &self.values {
            out.extend_from_slice(&param.id().to_be_bytes());
            out.extend_from_slice(&value.to_be_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_initial_window_matches_rfc_default() {
        assert_eq!(Settings::default().get(SettingsParameter::InitialWindowSize), 65_535);
    }

    #[test]
    fn apply_wire_ignores_unknown_ids() {
        let mut settings = Settings::default();
        let payload = [0x00, 0x99, 0x00, 0x00, 0x00, 0x01]; // unknown id 0x99
        let applied = settings.apply_wire(&payload);
        assert!(applied.is_empty());
    }

    #[test]
    fn round_trips_known_parameter() {
        let mut settings = Settings::default();
        let payload = [0x00, 0x04, 0x00, 0x00, 0x10, 0x00]; // INITIAL_WINDOW_SIZE=4096
        let applied = settings.apply_wire(&payload);
        assert_eq!(applied, vec![(SettingsParameter::InitialWindowSize, 4096)]);
        assert_eq!(settings.get(SettingsParameter::InitialWindowSize), 4096);
    }
}
