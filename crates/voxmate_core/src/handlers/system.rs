//! System utility handlers.
//!
//! # Responsibility
//! - Pick the OS utility for each system command from [`OsKind`].
//! - Run it through [`CommandRunner`] and phrase the outcome.
//!
//! # Invariants
//! - Command construction is pure (`*_spec` functions) so OS dispatch is
//!   testable on any host.
//! - Shutdown and restart only run after an affirmative confirmation.

use crate::capability::{Capability, CapabilitySet};
use crate::conversation::{ask_text, is_affirmative, Conversation};
use crate::platform::{CommandRunner, CommandSpec, OsKind};
use chrono::NaiveDateTime;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Delay before a confirmed shutdown or restart.
pub const SHUTDOWN_DELAY_SECS: u32 = 10;

/// Default Linux battery sysfs root.
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Desktop applications the launcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopApp {
    Notepad,
    Discord,
    CommandPrompt,
    Camera,
    Calculator,
}

impl DesktopApp {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Notepad => "Notepad",
            Self::Discord => "Discord",
            Self::CommandPrompt => "Command Prompt",
            Self::Camera => "Camera",
            Self::Calculator => "Calculator",
        }
    }
}

/// Builds the launch command for `app` on `os`.
pub fn app_spec(app: DesktopApp, os: OsKind) -> CommandSpec {
    match (os, app) {
        (OsKind::Windows, DesktopApp::Notepad) => CommandSpec::bare("notepad.exe"),
        (OsKind::Windows, DesktopApp::Discord) => windows_start("discord:"),
        (OsKind::Windows, DesktopApp::CommandPrompt) => {
            CommandSpec::new("cmd", ["/C", "start", "cmd"])
        }
        (OsKind::Windows, DesktopApp::Camera) => windows_start("microsoft.windows.camera:"),
        (OsKind::Windows, DesktopApp::Calculator) => CommandSpec::bare("calc.exe"),
        (OsKind::MacOs, DesktopApp::Notepad) => CommandSpec::new("open", ["-a", "TextEdit"]),
        (OsKind::MacOs, DesktopApp::Discord) => CommandSpec::new("open", ["-a", "Discord"]),
        (OsKind::MacOs, DesktopApp::CommandPrompt) => CommandSpec::new("open", ["-a", "Terminal"]),
        (OsKind::MacOs, DesktopApp::Camera) => CommandSpec::new("open", ["-a", "Photo Booth"]),
        (OsKind::MacOs, DesktopApp::Calculator) => CommandSpec::new("open", ["-a", "Calculator"]),
        (OsKind::Linux, DesktopApp::Notepad) => CommandSpec::bare("gedit"),
        (OsKind::Linux, DesktopApp::Discord) => CommandSpec::bare("discord"),
        (OsKind::Linux, DesktopApp::CommandPrompt) => {
            CommandSpec::bare("gnome-terminal")
        }
        (OsKind::Linux, DesktopApp::Camera) => CommandSpec::bare("cheese"),
        (OsKind::Linux, DesktopApp::Calculator) => {
            CommandSpec::bare("gnome-calculator")
        }
    }
}

fn windows_start(target: &str) -> CommandSpec {
    CommandSpec::new("cmd", ["/C", "start", "", target])
}

/// Builds the command that opens `url` in the default browser.
pub fn open_url_spec(url: &str, os: OsKind) -> CommandSpec {
    match os {
        OsKind::Windows => windows_start(url),
        OsKind::MacOs => CommandSpec::new("open", [url]),
        OsKind::Linux => CommandSpec::new("xdg-open", [url]),
    }
}

/// Opens `url`, returning the fixed apology when the browser capability is off.
pub fn open_url(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    url: &str,
) -> Result<(), String> {
    capabilities
        .require(Capability::Browser)
        .map_err(str::to_string)?;
    runner
        .launch(&open_url_spec(url, runner.os()))
        .map_err(|err| {
            warn!("event=open_url module=handlers status=error error={}", err);
            format!("Error opening browser: {err}")
        })
}

pub fn open_app(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    app: DesktopApp,
) -> String {
    if let Err(message) = capabilities.require(Capability::AppLauncher) {
        return message.to_string();
    }
    match runner.launch(&app_spec(app, runner.os())) {
        Ok(()) => format!("Opening {}", app.display_name()),
        Err(err) => {
            warn!(
                "event=open_app module=handlers status=error app={} error={}",
                app.display_name(),
                err
            );
            format!("Sorry, I couldn't open {}", app.display_name())
        }
    }
}

/// Builds the screenshot command writing to `path`, preferring installed tools.
pub fn screenshot_spec(runner: &dyn CommandRunner, path: &Path) -> CommandSpec {
    let target = path.display().to_string();
    match runner.os() {
        OsKind::Windows => CommandSpec::new(
            "powershell",
            [
                "-NoProfile".to_string(),
                "-Command".to_string(),
                windows_screenshot_script(&target),
            ],
        ),
        OsKind::MacOs => CommandSpec::new("screencapture", ["-x", target.as_str()]),
        OsKind::Linux => {
            if runner.has_program("gnome-screenshot") {
                CommandSpec::new("gnome-screenshot", ["-f", target.as_str()])
            } else if runner.has_program("scrot") {
                CommandSpec::new("scrot", [target.as_str()])
            } else {
                CommandSpec::new("grim", [target.as_str()])
            }
        }
    }
}

fn windows_screenshot_script(target: &str) -> String {
    format!(
        "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
         $b=[System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
         $bmp=New-Object System.Drawing.Bitmap $b.Width,$b.Height; \
         $g=[System.Drawing.Graphics]::FromImage($bmp); \
         $g.CopyFromScreen($b.Location,[System.Drawing.Point]::Empty,$b.Size); \
         $bmp.Save('{}')",
        target.replace('\'', "''")
    )
}

pub fn screenshot_path(dir: &Path, now: NaiveDateTime) -> PathBuf {
    dir.join(format!("screenshot_{}.png", now.format("%Y%m%d_%H%M%S")))
}

pub fn take_screenshot(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    dir: &Path,
    now: NaiveDateTime,
) -> String {
    if let Err(message) = capabilities.require(Capability::Screenshot) {
        return message.to_string();
    }
    if let Err(err) = fs::create_dir_all(dir) {
        return format!("Error taking screenshot: {err}");
    }

    let path = screenshot_path(dir, now);
    match runner.run(&screenshot_spec(runner, &path)) {
        Ok(_) => format!("Screenshot saved to {}", path.display()),
        Err(err) => format!("Error taking screenshot: {err}"),
    }
}

pub fn lock_spec(os: OsKind) -> CommandSpec {
    match os {
        OsKind::Windows => CommandSpec::new("rundll32.exe", ["user32.dll,LockWorkStation"]),
        OsKind::MacOs => CommandSpec::new("pmset", ["displaysleepnow"]),
        OsKind::Linux => CommandSpec::new("loginctl", ["lock-session"]),
    }
}

pub fn lock_screen(runner: &dyn CommandRunner, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::SystemControl) {
        return message.to_string();
    }
    match runner.run(&lock_spec(runner.os())) {
        Ok(_) => "Screen locked".to_string(),
        Err(err) => format!("Error locking screen: {err}"),
    }
}

/// Power action scheduled through the OS `shutdown` utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
}

impl PowerAction {
    fn noun(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
        }
    }
}

/// Builds the scheduling command. Unix `shutdown` takes whole minutes, so the
/// delay rounds up to at least one minute there.
pub fn power_spec(action: PowerAction, os: OsKind, delay_secs: u32) -> CommandSpec {
    match os {
        OsKind::Windows => {
            let flag = match action {
                PowerAction::Shutdown => "/s",
                PowerAction::Restart => "/r",
            };
            CommandSpec::new("shutdown", [flag.to_string(), "/t".to_string(), delay_secs.to_string()])
        }
        OsKind::MacOs | OsKind::Linux => {
            let flag = match action {
                PowerAction::Shutdown => "-h",
                PowerAction::Restart => "-r",
            };
            CommandSpec::new("shutdown", [flag.to_string(), format!("+{}", unix_delay_minutes(delay_secs))])
        }
    }
}

fn unix_delay_minutes(delay_secs: u32) -> u32 {
    delay_secs.div_ceil(60).max(1)
}

fn delay_phrase(os: OsKind, delay_secs: u32) -> String {
    match os {
        OsKind::Windows => format!("{delay_secs} seconds"),
        OsKind::MacOs | OsKind::Linux => match unix_delay_minutes(delay_secs) {
            1 => "1 minute".to_string(),
            minutes => format!("{minutes} minutes"),
        },
    }
}

/// Asks for confirmation and schedules the power action.
pub fn schedule_power_action(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    conversation: &mut dyn Conversation,
    action: PowerAction,
) -> String {
    if let Err(message) = capabilities.require(Capability::SystemControl) {
        return message.to_string();
    }

    let question = format!("Are you sure you want to {} your computer?", action.noun());
    let confirmed = ask_text(conversation, &question)
        .map(|answer| is_affirmative(&answer))
        .unwrap_or(false);
    if !confirmed {
        return match action {
            PowerAction::Shutdown => "Shutdown canceled".to_string(),
            PowerAction::Restart => "Restart canceled".to_string(),
        };
    }

    let os = runner.os();
    match runner.run(&power_spec(action, os, SHUTDOWN_DELAY_SECS)) {
        Ok(_) => {
            let verb = match action {
                PowerAction::Shutdown => "Shutting down",
                PowerAction::Restart => "Restarting",
            };
            format!(
                "{verb} your computer in {}",
                delay_phrase(os, SHUTDOWN_DELAY_SECS)
            )
        }
        Err(err) => format!("Error scheduling {}: {err}", action.noun()),
    }
}

pub fn cancel_spec(os: OsKind) -> CommandSpec {
    match os {
        OsKind::Windows => CommandSpec::new("shutdown", ["/a"]),
        OsKind::MacOs => CommandSpec::new("killall", ["shutdown"]),
        OsKind::Linux => CommandSpec::new("shutdown", ["-c"]),
    }
}

pub fn cancel_shutdown(runner: &dyn CommandRunner, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::SystemControl) {
        return message.to_string();
    }
    match runner.run(&cancel_spec(runner.os())) {
        Ok(_) => "Scheduled shutdown has been cancelled".to_string(),
        Err(err) => format!("Error cancelling shutdown: {err}"),
    }
}

/// Host facts gathered without external tools.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub os: String,
    pub arch: String,
    pub hostname: Option<String>,
    pub logical_cores: Option<usize>,
    /// `(total, available)` in kB.
    pub memory_kb: Option<(u64, u64)>,
}

impl SystemSnapshot {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: read_hostname(),
            logical_cores: std::thread::available_parallelism()
                .ok()
                .map(|count| count.get()),
            memory_kb: fs::read_to_string("/proc/meminfo")
                .ok()
                .and_then(|text| parse_meminfo(&text)),
        }
    }
}

fn read_hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Extracts `(MemTotal, MemAvailable)` in kB from `/proc/meminfo` text.
pub fn parse_meminfo(text: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        text.lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|value| value.parse::<u64>().ok())
    };
    Some((field("MemTotal")?, field("MemAvailable")?))
}

pub fn format_system_info(snapshot: &SystemSnapshot) -> String {
    let mut lines = vec![format!(
        "You are running {} on {}",
        snapshot.os, snapshot.arch
    )];
    if let Some(hostname) = &snapshot.hostname {
        lines.push(format!("Hostname: {hostname}"));
    }
    if let Some(cores) = snapshot.logical_cores {
        lines.push(format!("Logical cores: {cores}"));
    }
    if let Some((total, available)) = snapshot.memory_kb {
        let to_gb = |kb: u64| kb as f64 / (1024.0 * 1024.0);
        let used_percent = if total == 0 {
            0.0
        } else {
            (total.saturating_sub(available)) as f64 * 100.0 / total as f64
        };
        lines.push(format!(
            "Memory: {:.2} GB available of {:.2} GB ({:.0}% used)",
            to_gb(available),
            to_gb(total),
            used_percent
        ));
    }
    lines.join("\n")
}

pub fn system_info() -> String {
    format!(
        "Here's your system information\n{}",
        format_system_info(&SystemSnapshot::collect())
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub percent: u8,
    pub plugged_in: bool,
}

/// Reads the first battery under a sysfs `power_supply` root.
pub fn read_battery(root: &Path) -> Option<BatteryStatus> {
    let mut entries = fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();

    entries.into_iter().find_map(|supply| {
        let kind = fs::read_to_string(supply.join("type")).ok()?;
        if kind.trim() != "Battery" {
            return None;
        }
        let percent = fs::read_to_string(supply.join("capacity"))
            .ok()?
            .trim()
            .parse::<u8>()
            .ok()?;
        let status = fs::read_to_string(supply.join("status")).unwrap_or_default();
        let plugged_in = matches!(status.trim(), "Charging" | "Full" | "Not charging");
        Some(BatteryStatus {
            percent: percent.min(100),
            plugged_in,
        })
    })
}

pub fn battery_report(root: &Path) -> String {
    match read_battery(root) {
        Some(status) if status.plugged_in => format!(
            "Your battery is at {}%\nYour device is plugged in and charging",
            status.percent
        ),
        Some(status) => format!(
            "Your battery is at {}%\nYour device is running on battery power",
            status.percent
        ),
        None => "Sorry, I couldn't retrieve battery information".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        app_spec, battery_report, cancel_spec, format_system_info, lock_spec, open_url_spec,
        parse_meminfo, power_spec, DesktopApp, PowerAction, SystemSnapshot,
    };
    use crate::platform::{CommandSpec, OsKind};
    use std::fs;

    #[test]
    fn picks_os_specific_launchers() {
        assert_eq!(
            app_spec(DesktopApp::Notepad, OsKind::Windows),
            CommandSpec::bare("notepad.exe")
        );
        assert_eq!(
            app_spec(DesktopApp::Calculator, OsKind::MacOs),
            CommandSpec::new("open", ["-a", "Calculator"])
        );
        assert_eq!(
            app_spec(DesktopApp::CommandPrompt, OsKind::Linux).program,
            "gnome-terminal"
        );
        assert_eq!(
            open_url_spec("https://example.com", OsKind::Linux),
            CommandSpec::new("xdg-open", ["https://example.com"])
        );
    }

    #[test]
    fn power_commands_follow_os_conventions() {
        assert_eq!(
            power_spec(PowerAction::Shutdown, OsKind::Windows, 10),
            CommandSpec::new("shutdown", ["/s", "/t", "10"])
        );
        assert_eq!(
            power_spec(PowerAction::Restart, OsKind::Linux, 10),
            CommandSpec::new("shutdown", ["-r", "+1"])
        );
        assert_eq!(
            power_spec(PowerAction::Shutdown, OsKind::MacOs, 150),
            CommandSpec::new("shutdown", ["-h", "+3"])
        );
        assert_eq!(cancel_spec(OsKind::Linux), CommandSpec::new("shutdown", ["-c"]));
        assert_eq!(lock_spec(OsKind::MacOs).program, "pmset");
    }

    #[test]
    fn parses_meminfo_fields() {
        let text = "MemTotal:       16384000 kB\nMemFree:  100 kB\nMemAvailable:    8192000 kB\n";
        assert_eq!(parse_meminfo(text), Some((16_384_000, 8_192_000)));
        assert_eq!(parse_meminfo("MemTotal: 1 kB\n"), None);
    }

    #[test]
    fn formats_system_snapshot() {
        let snapshot = SystemSnapshot {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            hostname: Some("desk".to_string()),
            logical_cores: Some(8),
            memory_kb: Some((1024 * 1024 * 4, 1024 * 1024)),
        };
        let report = format_system_info(&snapshot);
        assert!(report.starts_with("You are running linux on x86_64"));
        assert!(report.contains("Logical cores: 8"));
        assert!(report.contains("1.00 GB available of 4.00 GB (75% used)"));
    }

    #[test]
    fn reads_battery_from_power_supply_tree() {
        let root = tempfile::tempdir().expect("temp root");
        let adapter = root.path().join("AC");
        fs::create_dir_all(&adapter).expect("adapter dir");
        fs::write(adapter.join("type"), "Mains\n").expect("adapter type");

        let battery = root.path().join("BAT0");
        fs::create_dir_all(&battery).expect("battery dir");
        fs::write(battery.join("type"), "Battery\n").expect("battery type");
        fs::write(battery.join("capacity"), "57\n").expect("capacity");
        fs::write(battery.join("status"), "Discharging\n").expect("status");

        assert_eq!(
            battery_report(root.path()),
            "Your battery is at 57%\nYour device is running on battery power"
        );

        fs::write(battery.join("status"), "Charging\n").expect("status");
        assert!(battery_report(root.path()).ends_with("plugged in and charging"));
    }

    #[test]
    fn missing_battery_gives_apology() {
        let root = tempfile::tempdir().expect("temp root");
        assert_eq!(
            battery_report(root.path()),
            "Sorry, I couldn't retrieve battery information"
        );
    }
}
