//! Status mirror: what the voice bubble and action bar show for a status.
//! Pure functions, no state of their own.

use super::status::SessionStatus;

/// Voice bubble presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceBubble {
    pub label: &'static str,
    pub animated: bool,
}

impl VoiceBubble {
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Idle => Self {
                label: "Tap to talk",
                animated: false,
            },
            SessionStatus::Connecting => Self {
                label: "Connecting...",
                animated: true,
            },
            SessionStatus::Listening => Self {
                label: "Listening",
                animated: true,
            },
            SessionStatus::Speaking => Self {
                label: "Speaking",
                animated: true,
            },
            SessionStatus::MicOff => Self {
                label: "Microphone off",
                animated: false,
            },
        }
    }
}

/// Primary action offered by the action bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Start,
    /// Nothing to press while connecting
    Wait,
    End,
    UnmuteMic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionBar {
    pub primary: PrimaryAction,
    pub mic_toggle_enabled: bool,
}

impl ActionBar {
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Idle => Self {
                primary: PrimaryAction::Start,
                mic_toggle_enabled: true,
            },
            SessionStatus::Connecting => Self {
                primary: PrimaryAction::Wait,
                mic_toggle_enabled: false,
            },
            SessionStatus::Listening => Self {
                primary: PrimaryAction::End,
                mic_toggle_enabled: true,
            },
            SessionStatus::Speaking => Self {
                primary: PrimaryAction::End,
                mic_toggle_enabled: false,
            },
            SessionStatus::MicOff => Self {
                primary: PrimaryAction::UnmuteMic,
                mic_toggle_enabled: true,
            },
        }
    }
}
