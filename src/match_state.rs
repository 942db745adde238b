/// Match lifecycle classification
///
/// Feeds report status with their own vocabulary. Everything in the crate
/// asks this module what a raw status means instead of comparing strings.
use phf::phf_map;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchState {
    Scheduled,
    FirstHalf,
    Halftime,
    SecondHalf,
    ExtraTime,
    Finished,
    Postponed,
    Cancelled,
    Unknown,
}

/// Visual emphasis a presentation layer should give a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Live,
    Final,
    Muted,
    Warning,
    Neutral,
}

impl Emphasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emphasis::Live => "live",
            Emphasis::Final => "final",
            Emphasis::Muted => "muted",
            Emphasis::Warning => "warning",
            Emphasis::Neutral => "neutral",
        }
    }
}

// Keys are upper-case; lookups normalize before probing.
static RAW_STATUS: phf::Map<&'static str, MatchState> = phf_map! {
    "NS" => MatchState::Scheduled,
    "TBD" => MatchState::Scheduled,
    "SCHEDULED" => MatchState::Scheduled,
    "TIMED" => MatchState::Scheduled,
    "1H" => MatchState::FirstHalf,
    "FIRST_HALF" => MatchState::FirstHalf,
    "HT" => MatchState::Halftime,
    "HALFTIME" => MatchState::Halftime,
    "PAUSED" => MatchState::Halftime,
    "2H" => MatchState::SecondHalf,
    "SECOND_HALF" => MatchState::SecondHalf,
    "ET" => MatchState::ExtraTime,
    "BT" => MatchState::ExtraTime,
    "P" => MatchState::ExtraTime,
    "EXTRA_TIME" => MatchState::ExtraTime,
    "FT" => MatchState::Finished,
    "AET" => MatchState::Finished,
    "PEN" => MatchState::Finished,
    "FINISHED" => MatchState::Finished,
    "PST" => MatchState::Postponed,
    "POSTPONED" => MatchState::Postponed,
    "CANC" => MatchState::Cancelled,
    "ABD" => MatchState::Cancelled,
    "CANCELLED" => MatchState::Cancelled,
};

/// Map a raw feed status to a lifecycle state. Unrecognized input is `Unknown`.
pub fn classify(raw: &str) -> MatchState {
    let key = raw.trim().to_ascii_uppercase();
    RAW_STATUS.get(key.as_str()).copied().unwrap_or(MatchState::Unknown)
}

impl MatchState {
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            MatchState::FirstHalf
                | MatchState::Halftime
                | MatchState::SecondHalf
                | MatchState::ExtraTime
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MatchState::Finished)
    }

    pub fn has_started(&self) -> bool {
        self.is_live() || self.is_finished()
    }

    /// Human label; `Unknown` echoes the raw status back
    pub fn display_label(&self, raw: &str) -> String {
        let label = match self {
            MatchState::Scheduled => "Scheduled",
            MatchState::FirstHalf => "1st Half",
            MatchState::Halftime => "Halftime",
            MatchState::SecondHalf => "2nd Half",
            MatchState::ExtraTime => "Extra Time",
            MatchState::Finished => "Full Time",
            MatchState::Postponed => "Postponed",
            MatchState::Cancelled => "Cancelled",
            MatchState::Unknown => return raw.to_string(),
        };
        label.to_string()
    }

    pub fn emphasis_tag(&self) -> Emphasis {
        match self {
            MatchState::FirstHalf
            | MatchState::Halftime
            | MatchState::SecondHalf
            | MatchState::ExtraTime => Emphasis::Live,
            MatchState::Finished => Emphasis::Final,
            MatchState::Scheduled => Emphasis::Muted,
            MatchState::Postponed | MatchState::Cancelled => Emphasis::Warning,
            MatchState::Unknown => Emphasis::Neutral,
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchState::Scheduled => "SCHEDULED",
            MatchState::FirstHalf => "FIRST_HALF",
            MatchState::Halftime => "HALFTIME",
            MatchState::SecondHalf => "SECOND_HALF",
            MatchState::ExtraTime => "EXTRA_TIME",
            MatchState::Finished => "FINISHED",
            MatchState::Postponed => "POSTPONED",
            MatchState::Cancelled => "CANCELLED",
            MatchState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}
