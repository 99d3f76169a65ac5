// board.rs — Target board pin tables
//
// Only used while loading a project: resolves analog pin labels (`A0`…) to
// the integer pin numbers the firmware uses, and flags pins the board does
// not have. Compilation itself never looks at the board.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    ArduinoNano,
    ArduinoUno,
    ArduinoMega,
}

impl Board {
    pub const ALL: [Board; 3] = [Board::ArduinoNano, Board::ArduinoUno, Board::ArduinoMega];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name.trim())
    }

    pub fn name(self) -> &'static str {
        match self {
            Board::ArduinoNano => "arduino_nano",
            Board::ArduinoUno => "arduino_uno",
            Board::ArduinoMega => "arduino_mega",
        }
    }

    /// Pin number of `A0`.
    fn analog_base(self) -> u32 {
        match self {
            Board::ArduinoNano | Board::ArduinoUno => 14,
            Board::ArduinoMega => 54,
        }
    }

    fn analog_count(self) -> u32 {
        match self {
            Board::ArduinoNano => 8,
            Board::ArduinoUno => 6,
            Board::ArduinoMega => 16,
        }
    }

    /// Total addressable pins (digital and analog).
    pub fn pin_count(self) -> u32 {
        self.analog_base() + self.analog_count()
    }

    /// Resolve `A<n>` to a pin number.
    pub fn analog_pin(self, label: &str) -> Option<u32> {
        let n: u32 = label
            .strip_prefix('A')
            .or_else(|| label.strip_prefix('a'))?
            .parse()
            .ok()?;
        (n < self.analog_count()).then(|| self.analog_base() + n)
    }
}
