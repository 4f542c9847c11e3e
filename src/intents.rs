use std::fmt;
use std::ops::BitOr;

/// Named gateway capability flags packed into a wide integer.
///
/// The decimal rendering of the bitmask (`to_string()`) is what the identify
/// payload carries on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntentSet(u64);

impl IntentSet {
    pub const GUILDS: Self = Self(1 << 0);
    pub const GUILD_MEMBERS: Self = Self(1 << 1);
    pub const GUILD_BANS: Self = Self(1 << 2);
    pub const GUILD_EMOJIS_AND_STICKERS: Self = Self(1 << 3);
    pub const GUILD_INTEGRATIONS: Self = Self(1 << 4);
    pub const GUILD_WEBHOOKS: Self = Self(1 << 5);
    pub const GUILD_INVITES: Self = Self(1 << 6);
    pub const GUILD_VOICE_STATES: Self = Self(1 << 7);
    pub const GUILD_PRESENCES: Self = Self(1 << 8);
    pub const GUILD_MESSAGES: Self = Self(1 << 9);
    pub const GUILD_MESSAGE_REACTIONS: Self = Self(1 << 10);
    pub const GUILD_MESSAGE_TYPING: Self = Self(1 << 11);
    pub const DIRECT_MESSAGES: Self = Self(1 << 12);
    pub const DIRECT_MESSAGE_REACTIONS: Self = Self(1 << 13);
    pub const DIRECT_MESSAGE_TYPING: Self = Self(1 << 14);
    pub const MESSAGE_CONTENT: Self = Self(1 << 15);
    pub const GUILD_SCHEDULED_EVENTS: Self = Self(1 << 16);
    pub const AUTO_MODERATION_CONFIGURATION: Self = Self(1 << 20);
    pub const AUTO_MODERATION_EXECUTION: Self = Self(1 << 21);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(
            Self::GUILDS.0
                | Self::GUILD_MEMBERS.0
                | Self::GUILD_BANS.0
                | Self::GUILD_EMOJIS_AND_STICKERS.0
                | Self::GUILD_INTEGRATIONS.0
                | Self::GUILD_WEBHOOKS.0
                | Self::GUILD_INVITES.0
                | Self::GUILD_VOICE_STATES.0
                | Self::GUILD_PRESENCES.0
                | Self::GUILD_MESSAGES.0
                | Self::GUILD_MESSAGE_REACTIONS.0
                | Self::GUILD_MESSAGE_TYPING.0
                | Self::DIRECT_MESSAGES.0
                | Self::DIRECT_MESSAGE_REACTIONS.0
                | Self::DIRECT_MESSAGE_TYPING.0
                | Self::MESSAGE_CONTENT.0
                | Self::GUILD_SCHEDULED_EVENTS.0
                | Self::AUTO_MODERATION_CONFIGURATION.0
                | Self::AUTO_MODERATION_EXECUTION.0,
        )
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for IntentSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for IntentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_membership() {
        let set = IntentSet::GUILDS | IntentSet::GUILD_MESSAGES;
        assert!(set.contains(IntentSet::GUILDS));
        assert!(set.contains(IntentSet::GUILD_MESSAGES));
        assert!(!set.contains(IntentSet::GUILD_PRESENCES));
        assert!(set.contains(IntentSet::empty()));
    }

    #[test]
    fn all_contains_every_flag() {
        for flag in [
            IntentSet::GUILDS,
            IntentSet::MESSAGE_CONTENT,
            IntentSet::GUILD_SCHEDULED_EVENTS,
            IntentSet::AUTO_MODERATION_EXECUTION,
        ] {
            assert!(IntentSet::all().contains(flag));
        }
    }

    #[test]
    fn renders_decimal_bitmask() {
        let set = IntentSet::GUILDS | IntentSet::GUILD_MESSAGES;
        assert_eq!(set.to_string(), "513");
        assert_eq!(IntentSet::empty().to_string(), "0");
    }

    #[test]
    fn equality_is_bitwise() {
        assert_eq!(
            IntentSet::GUILDS | IntentSet::GUILD_BANS,
            IntentSet::from_bits(0b101)
        );
    }
}
