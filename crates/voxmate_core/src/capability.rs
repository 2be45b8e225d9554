//! Optional-dependency capability flags.
//!
//! # Responsibility
//! - Name every optional dependency (API key or external tool) that gates a
//!   handler group.
//! - Probe availability once at startup into a [`CapabilitySet`].
//!
//! # Invariants
//! - A handler whose capability is off returns
//!   [`Capability::unavailable_message`] and never touches the dependency.
//! - Capabilities listed in config `disabled` are off regardless of probing.

use crate::config::AssistantConfig;
use crate::platform::{CommandRunner, OsKind};
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Optional dependency gating one handler group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Network,
    Weather,
    News,
    Movies,
    Translation,
    Browser,
    Audio,
    Screenshot,
    SystemControl,
    AppLauncher,
}

const ALL_CAPABILITIES: &[Capability] = &[
    Capability::Network,
    Capability::Weather,
    Capability::News,
    Capability::Movies,
    Capability::Translation,
    Capability::Browser,
    Capability::Audio,
    Capability::Screenshot,
    Capability::SystemControl,
    Capability::AppLauncher,
];

impl Capability {
    pub fn all() -> &'static [Capability] {
        ALL_CAPABILITIES
    }

    /// Stable id used in `VOXMATE_DISABLED_FEATURES`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Weather => "weather",
            Self::News => "news",
            Self::Movies => "movies",
            Self::Translation => "translation",
            Self::Browser => "browser",
            Self::Audio => "audio",
            Self::Screenshot => "screenshot",
            Self::SystemControl => "system_control",
            Self::AppLauncher => "app_launcher",
        }
    }

    /// What the capability needs, for the `check` report.
    pub fn description(self) -> &'static str {
        match self {
            Self::Network => "Outbound HTTP for online lookups.",
            Self::Weather => "OpenWeather API key (OPENWEATHER_APP_ID).",
            Self::News => "NewsAPI key (NEWS_API_KEY).",
            Self::Movies => "TMDB API key (TMDB_API_KEY).",
            Self::Translation => "Online translation service.",
            Self::Browser => "System URL opener (xdg-open, open or start).",
            Self::Audio => "Default audio output device.",
            Self::Screenshot => "Screenshot utility for the current OS.",
            Self::SystemControl => "Shutdown and screen-lock utilities.",
            Self::AppLauncher => "Launching desktop applications.",
        }
    }

    /// Fixed apology returned by handlers when the capability is off.
    pub fn unavailable_message(self) -> &'static str {
        match self {
            Self::Network => "Online features not available",
            Self::Weather => "Weather functionality not available",
            Self::News => "News functionality not available",
            Self::Movies => "Movie functionality not available",
            Self::Translation => "Translation functionality not available",
            Self::Browser => "Web browser functionality not available",
            Self::Audio => "Music player functionality not available",
            Self::Screenshot => "Screenshot functionality not available",
            Self::SystemControl => "System control functionality not available",
            Self::AppLauncher => "App launcher functionality not available",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one capability id. Matching is case-insensitive and accepts `-`.
pub fn parse_capability(value: &str) -> Result<Capability, CapabilityError> {
    let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }

    ALL_CAPABILITIES
        .iter()
        .copied()
        .find(|capability| capability.as_str() == normalized)
        .ok_or_else(|| CapabilityError::UnsupportedCapability(value.trim().to_string()))
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "capability value must not be empty"),
            Self::UnsupportedCapability(value) => write!(f, "capability is unsupported: {value}"),
        }
    }
}

impl Error for CapabilityError {}

/// Capabilities available for this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    enabled: BTreeSet<Capability>,
}

impl CapabilitySet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::from_iter(ALL_CAPABILITIES.iter().copied())
    }

    /// Probes API keys and `PATH` tools, then applies `config.disabled`.
    ///
    /// Audio starts enabled; the session drops it when no output device opens.
    pub fn probe(config: &AssistantConfig, runner: &dyn CommandRunner) -> Self {
        let mut set = Self::none();
        set.insert(Capability::Network);
        set.insert(Capability::Translation);
        set.insert(Capability::AppLauncher);
        set.insert(Capability::Audio);

        if config.openweather_app_id.is_some() {
            set.insert(Capability::Weather);
        }
        if config.news_api_key.is_some() {
            set.insert(Capability::News);
        }
        if config.tmdb_api_key.is_some() {
            set.insert(Capability::Movies);
        }

        let os = runner.os();
        if any_program(runner, browser_programs(os)) {
            set.insert(Capability::Browser);
        }
        if any_program(runner, screenshot_programs(os)) {
            set.insert(Capability::Screenshot);
        }
        if any_program(runner, system_control_programs(os)) {
            set.insert(Capability::SystemControl);
        }

        for capability in &config.disabled {
            set.remove(*capability);
        }
        if !set.contains(Capability::Network) {
            for dependent in [
                Capability::Weather,
                Capability::News,
                Capability::Movies,
                Capability::Translation,
            ] {
                set.remove(dependent);
            }
        }

        info!(
            "event=capability_probe module=core status=ok os={} enabled={}",
            os.as_str(),
            set.summary()
        );
        set
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.enabled.insert(capability);
    }

    pub fn remove(&mut self, capability: Capability) {
        self.enabled.remove(&capability);
    }

    /// `Err(message)` carries the fixed apology when `capability` is off.
    pub fn require(&self, capability: Capability) -> Result<(), &'static str> {
        if self.contains(capability) {
            Ok(())
        } else {
            Err(capability.unavailable_message())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.enabled.iter().copied()
    }

    /// Comma-joined ids for logs.
    pub fn summary(&self) -> String {
        self.iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

fn any_program(runner: &dyn CommandRunner, programs: &[&str]) -> bool {
    programs.iter().any(|program| runner.has_program(program))
}

fn browser_programs(os: OsKind) -> &'static [&'static str] {
    match os {
        OsKind::Windows => &["cmd"],
        OsKind::MacOs => &["open"],
        OsKind::Linux => &["xdg-open"],
    }
}

fn screenshot_programs(os: OsKind) -> &'static [&'static str] {
    match os {
        OsKind::Windows => &["powershell"],
        OsKind::MacOs => &["screencapture"],
        OsKind::Linux => &["gnome-screenshot", "scrot", "grim"],
    }
}

fn system_control_programs(os: OsKind) -> &'static [&'static str] {
    match os {
        OsKind::Windows => &["shutdown"],
        OsKind::MacOs => &["shutdown", "pmset"],
        OsKind::Linux => &["shutdown", "loginctl"],
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_capability, Capability, CapabilityError, CapabilitySet};

    #[test]
    fn parses_all_capability_ids() {
        for capability in Capability::all() {
            assert_eq!(
                parse_capability(capability.as_str()).expect("known id should parse"),
                *capability
            );
        }
        assert_eq!(
            parse_capability(" System-Control ").expect("dash form should parse"),
            Capability::SystemControl
        );
    }

    #[test]
    fn rejects_empty_and_unknown_ids() {
        assert_eq!(
            parse_capability("  ").expect_err("empty must fail"),
            CapabilityError::EmptyCapability
        );
        assert_eq!(
            parse_capability("bluetooth").expect_err("unknown must fail"),
            CapabilityError::UnsupportedCapability("bluetooth".to_string())
        );
    }

    #[test]
    fn require_returns_fixed_apology_when_missing() {
        let set = CapabilitySet::from_iter([Capability::Audio]);
        assert_eq!(set.require(Capability::Audio), Ok(()));
        assert_eq!(
            set.require(Capability::Weather),
            Err("Weather functionality not available")
        );
    }
}
