/// Raw value the IR camera reports for an untracked point.
pub const IR_INVALID: i32 = 1023;
pub const IR_POINTS: usize = 4;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Abs {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Abs {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn ir_invalid() -> Self {
        Self::new(IR_INVALID, IR_INVALID, 0)
    }

    pub fn is_valid_ir(&self) -> bool {
        self.x != IR_INVALID || self.y != IR_INVALID
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WiiKey {
    Left,
    Right,
    Up,
    Down,
    A,
    B,
    Plus,
    Minus,
    Home,
    One,
    Two,
    X,
    Y,
    Tl,
    Tr,
    Zl,
    Zr,
    ThumbL,
    ThumbR,
    C,
    Z,
    StrumBarUp,
    StrumBarDown,
    FretFarUp,
    FretUp,
    FretMid,
    FretLow,
    FretFarLow,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: WiiKey,
    pub pressed: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrumPad {
    CymbalLeft,
    CymbalRight,
    TomLeft,
    TomRight,
    TomFarRight,
    Bass,
    HiHat,
}

impl DrumPad {
    pub const ALL: [DrumPad; 7] = [
        DrumPad::CymbalLeft,
        DrumPad::CymbalRight,
        DrumPad::TomLeft,
        DrumPad::TomRight,
        DrumPad::TomFarRight,
        DrumPad::Bass,
        DrumPad::HiHat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DrumPad::CymbalLeft => "cymbal left",
            DrumPad::CymbalRight => "cymbal right",
            DrumPad::TomLeft => "tom left",
            DrumPad::TomRight => "tom right",
            DrumPad::TomFarRight => "tom far right",
            DrumPad::Bass => "bass",
            DrumPad::HiHat => "hi-hat",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DrumsState {
    pub pad: Abs,
    /// Pressure per pad, indexed in `DrumPad::ALL` order.
    pub pressure: [i32; 7],
}

impl DrumsState {
    pub fn pressure(&self, pad: DrumPad) -> i32 {
        self.pressure[pad as usize]
    }
}

/// One decoded report from the device session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WiiEvent {
    Key(KeyEvent),
    Accel(Abs),
    Ir([Abs; IR_POINTS]),
    MotionPlus(Abs),
    NunchukKey(KeyEvent),
    NunchukMove { stick: Abs, accel: Abs },
    ClassicKey(KeyEvent),
    /// `triggers.x` is LT, `triggers.y` is RT.
    ClassicMove { left: Abs, right: Abs, triggers: Abs },
    /// Weight sensors: top right, bottom right, top left, bottom left.
    BalanceBoard([i32; 4]),
    ProKey(KeyEvent),
    ProMove { left: Abs, right: Abs },
    GuitarKey(KeyEvent),
    GuitarMove { stick: Abs, whammy: i32, fret_bar: i32 },
    DrumsKey(KeyEvent),
    DrumsMove(DrumsState),
    /// Interfaces were hot-plugged or the device became available again.
    Watch,
    Gone,
}
