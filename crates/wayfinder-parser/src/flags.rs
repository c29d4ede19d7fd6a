//! Fixed-width flag sets for prompts, exits, and doors.
//!
//! Each set is a small integer newtype with named constants, combined with
//! bitwise OR. The exit and door sets are also indexed by an enum
//! ([`ExitFlag`], [`DoorFlag`]) so commands can toggle a flag by name.

use serde::{Deserialize, Serialize};

macro_rules! bit_set {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub $repr);

        impl $name {
            /// No flags set.
            pub const NONE: Self = Self(0);

            /// Returns true if `self` contains all bits in `other`.
            #[must_use]
            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns true if no bits are set.
            #[must_use]
            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            pub fn toggle(&mut self, other: Self) {
                self.0 ^= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

// ── PromptFlags ─────────────────────────────────────────────────────

bit_set! {
    /// Status bits decoded from a prompt line.
    PromptFlags(u16)
}

impl PromptFlags {
    /// The line parsed as a prompt.
    pub const VALID: Self = Self(1 << 0);
    pub const RIDING: Self = Self(1 << 1);
    pub const FIGHTING: Self = Self(1 << 2);
    pub const CLOUDS: Self = Self(1 << 3);
    pub const RAIN: Self = Self(1 << 4);
    pub const HEAVY_RAIN: Self = Self(1 << 5);
    pub const SNOW: Self = Self(1 << 6);
    pub const HEAVY_SNOW: Self = Self(1 << 7);
    pub const LIGHT_FOG: Self = Self(1 << 8);
    pub const HEAVY_FOG: Self = Self(1 << 9);

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.contains(Self::VALID)
    }

    #[must_use]
    pub fn is_riding(self) -> bool {
        self.contains(Self::RIDING)
    }

    #[must_use]
    pub fn is_fighting(self) -> bool {
        self.contains(Self::FIGHTING)
    }
}

// ── ExitFlags ───────────────────────────────────────────────────────

bit_set! {
    /// Per-direction exit bits.
    ExitFlags(u8)
}

impl ExitFlags {
    pub const EXIT: Self = Self(1 << 0);
    pub const DOOR: Self = Self(1 << 1);
    pub const CLOSED: Self = Self(1 << 2);
    pub const ROAD: Self = Self(1 << 3);
    pub const CLIMB: Self = Self(1 << 4);
    pub const RANDOM: Self = Self(1 << 5);
    pub const SPECIAL: Self = Self(1 << 6);

    #[must_use]
    pub fn is_exit(self) -> bool {
        self.contains(Self::EXIT)
    }

    #[must_use]
    pub fn is_door(self) -> bool {
        self.contains(Self::DOOR)
    }

    /// A door that is currently closed.
    #[must_use]
    pub fn is_closed_door(self) -> bool {
        self.contains(Self::DOOR | Self::CLOSED)
    }

    #[must_use]
    pub fn is_road(self) -> bool {
        self.contains(Self::ROAD)
    }

    #[must_use]
    pub fn is_climb(self) -> bool {
        self.contains(Self::CLIMB)
    }

    #[must_use]
    pub fn is_random(self) -> bool {
        self.contains(Self::RANDOM)
    }

    #[must_use]
    pub fn is_special(self) -> bool {
        self.contains(Self::SPECIAL)
    }
}

/// Named exit flag, for toggling by command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitFlag {
    Exit,
    Door,
    Closed,
    Road,
    Climb,
    Random,
    Special,
}

impl ExitFlag {
    pub const ALL: [ExitFlag; 7] = [
        ExitFlag::Exit,
        ExitFlag::Door,
        ExitFlag::Closed,
        ExitFlag::Road,
        ExitFlag::Climb,
        ExitFlag::Random,
        ExitFlag::Special,
    ];

    #[must_use]
    pub fn bits(self) -> ExitFlags {
        match self {
            Self::Exit => ExitFlags::EXIT,
            Self::Door => ExitFlags::DOOR,
            Self::Closed => ExitFlags::CLOSED,
            Self::Road => ExitFlags::ROAD,
            Self::Climb => ExitFlags::CLIMB,
            Self::Random => ExitFlags::RANDOM,
            Self::Special => ExitFlags::SPECIAL,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Door => "door",
            Self::Closed => "closed",
            Self::Road => "road",
            Self::Climb => "climb",
            Self::Random => "random",
            Self::Special => "special",
        }
    }

    /// Case-insensitive lookup by full name.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(word))
    }
}

// ── DoorFlags ───────────────────────────────────────────────────────

bit_set! {
    /// Local door annotations. Never reported by the server.
    DoorFlags(u16)
}

impl DoorFlags {
    pub const HIDDEN: Self = Self(1 << 0);
    pub const NEED_KEY: Self = Self(1 << 1);
    pub const NO_BLOCK: Self = Self(1 << 2);
    pub const NO_BREAK: Self = Self(1 << 3);
    pub const NO_PICK: Self = Self(1 << 4);
    pub const DELAYED: Self = Self(1 << 5);
    pub const CALLABLE: Self = Self(1 << 6);
    pub const KNOCKABLE: Self = Self(1 << 7);
    pub const MAGIC: Self = Self(1 << 8);
    pub const ACTION: Self = Self(1 << 9);
    pub const NO_BASH: Self = Self(1 << 10);

    #[must_use]
    pub fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    #[must_use]
    pub fn needs_key(self) -> bool {
        self.contains(Self::NEED_KEY)
    }
}

/// Named door flag, for toggling by command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorFlag {
    Hidden,
    NeedKey,
    NoBlock,
    NoBreak,
    NoPick,
    Delayed,
    Callable,
    Knockable,
    Magic,
    Action,
    NoBash,
}

impl DoorFlag {
    pub const ALL: [DoorFlag; 11] = [
        DoorFlag::Hidden,
        DoorFlag::NeedKey,
        DoorFlag::NoBlock,
        DoorFlag::NoBreak,
        DoorFlag::NoPick,
        DoorFlag::Delayed,
        DoorFlag::Callable,
        DoorFlag::Knockable,
        DoorFlag::Magic,
        DoorFlag::Action,
        DoorFlag::NoBash,
    ];

    #[must_use]
    pub fn bits(self) -> DoorFlags {
        match self {
            Self::Hidden => DoorFlags::HIDDEN,
            Self::NeedKey => DoorFlags::NEED_KEY,
            Self::NoBlock => DoorFlags::NO_BLOCK,
            Self::NoBreak => DoorFlags::NO_BREAK,
            Self::NoPick => DoorFlags::NO_PICK,
            Self::Delayed => DoorFlags::DELAYED,
            Self::Callable => DoorFlags::CALLABLE,
            Self::Knockable => DoorFlags::KNOCKABLE,
            Self::Magic => DoorFlags::MAGIC,
            Self::Action => DoorFlags::ACTION,
            Self::NoBash => DoorFlags::NO_BASH,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::NeedKey => "needkey",
            Self::NoBlock => "noblock",
            Self::NoBreak => "nobreak",
            Self::NoPick => "nopick",
            Self::Delayed => "delayed",
            Self::Callable => "callable",
            Self::Knockable => "knockable",
            Self::Magic => "magic",
            Self::Action => "action",
            Self::NoBash => "nobash",
        }
    }

    /// Case-insensitive lookup by full name.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(word))
    }
}
