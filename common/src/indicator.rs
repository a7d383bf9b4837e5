#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Blue,
    Green,
    Yellow,
    Red,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Blue, Self::Green, Self::Yellow, Self::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// Two-second indicator pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    Off,
    On,
    Blink,
    Blip,
}

impl Pattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::Blink => "BLINK",
            Self::Blip => "BLIP",
        }
    }
}

pub trait StatusIndicators {
    fn set_pattern(&mut self, channel: Channel, pattern: Pattern);

    /// Lamp test. Drivers without one can ignore it.
    fn self_test(&mut self) {}
}
