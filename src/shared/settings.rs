use serde::{Deserialize, Serialize};

/// Board configuration as stored by `esp_service`.
///
/// The service replaces the whole object on every save, so this type is
/// always sent in full. Field names follow the board firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// 0 = always on, 1 = auto, 2 = smart.
    pub display_mode: u8,

    pub day_on_hour: u8,
    pub day_on_minute: u8,
    pub day_off_hour: u8,
    pub day_off_minute: u8,

    pub night_on_hour: u8,
    pub night_on_minute: u8,
    pub night_off_hour: u8,
    pub night_off_minute: u8,

    pub toilet_on_hour: u8,
    pub toilet_on_minute: u8,
    pub toilet_off_hour: u8,
    pub toilet_off_minute: u8,

    /// `false` = relays follow the schedule, `true` = manual states below.
    pub relay_mode: bool,
    pub manual_day_state: bool,
    pub manual_night_state: bool,

    /// Seconds.
    pub display_timeout: u16,
    /// Seconds each display screen is shown before rotating.
    pub display_change_mode_timeout: u16,

    /// Seconds.
    pub fan_delay: u32,
    /// Minutes.
    pub fan_duration: u32,

    pub offline_mode_active: bool,
    pub show_forecast_screen: bool,
    pub show_temp_screen: bool,
}

pub const MAX_DISPLAY_MODE: u8 = 2;
pub const MAX_DISPLAY_TIMEOUT_SECS: u16 = 3600;

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_mode: 1,
            day_on_hour: 8,
            day_on_minute: 0,
            day_off_hour: 22,
            day_off_minute: 0,
            night_on_hour: 22,
            night_on_minute: 0,
            night_off_hour: 8,
            night_off_minute: 0,
            toilet_on_hour: 8,
            toilet_on_minute: 0,
            toilet_off_hour: 20,
            toilet_off_minute: 0,
            relay_mode: false,
            manual_day_state: false,
            manual_night_state: false,
            display_timeout: 30,
            display_change_mode_timeout: 30,
            fan_delay: 60,
            fan_duration: 5,
            offline_mode_active: false,
            show_forecast_screen: false,
            show_temp_screen: false,
        }
    }
}

/// The three relay schedules the board knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Day,
    Night,
    Toilet,
}

impl Relay {
    pub const ALL: [Relay; 3] = [Relay::Day, Relay::Night, Relay::Toilet];

    pub fn label(self) -> &'static str {
        match self {
            Relay::Day => "Day relay",
            Relay::Night => "Night relay",
            Relay::Toilet => "Toilet",
        }
    }
}

/// On/off times of one relay, as `(hour, minute)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub on: (u8, u8),
    pub off: (u8, u8),
}

impl Schedule {
    pub fn describe(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.on.0, self.on.1, self.off.0, self.off.1
        )
    }
}

impl Settings {
    /// Clamp every numeric field into the range the board accepts.
    ///
    /// This is the only validation done client side; the service is the
    /// authority on anything else.
    pub fn clamped(mut self) -> Self {
        self.display_mode = self.display_mode.min(MAX_DISPLAY_MODE);
        for relay in Relay::ALL {
            let s = self.schedule(relay);
            self.set_schedule(
                relay,
                Schedule {
                    on: (s.on.0.min(23), s.on.1.min(59)),
                    off: (s.off.0.min(23), s.off.1.min(59)),
                },
            );
        }
        self.display_timeout = self.display_timeout.min(MAX_DISPLAY_TIMEOUT_SECS);
        self.display_change_mode_timeout = self
            .display_change_mode_timeout
            .min(MAX_DISPLAY_TIMEOUT_SECS);
        self
    }

    pub fn schedule(&self, relay: Relay) -> Schedule {
        match relay {
            Relay::Day => Schedule {
                on: (self.day_on_hour, self.day_on_minute),
                off: (self.day_off_hour, self.day_off_minute),
            },
            Relay::Night => Schedule {
                on: (self.night_on_hour, self.night_on_minute),
                off: (self.night_off_hour, self.night_off_minute),
            },
            Relay::Toilet => Schedule {
                on: (self.toilet_on_hour, self.toilet_on_minute),
                off: (self.toilet_off_hour, self.toilet_off_minute),
            },
        }
    }

    pub fn set_schedule(&mut self, relay: Relay, schedule: Schedule) {
        let Schedule {
            on: (on_h, on_m),
            off: (off_h, off_m),
        } = schedule;
        match relay {
            Relay::Day => {
                self.day_on_hour = on_h;
                self.day_on_minute = on_m;
                self.day_off_hour = off_h;
                self.day_off_minute = off_m;
            }
            Relay::Night => {
                self.night_on_hour = on_h;
                self.night_on_minute = on_m;
                self.night_off_hour = off_h;
                self.night_off_minute = off_m;
            }
            Relay::Toilet => {
                self.toilet_on_hour = on_h;
                self.toilet_on_minute = on_m;
                self.toilet_off_hour = off_h;
                self.toilet_off_minute = off_m;
            }
        }
    }

    pub fn display_mode_label(&self) -> &'static str {
        match self.display_mode {
            0 => "Always on",
            1 => "Auto",
            _ => "Smart",
        }
    }
}
