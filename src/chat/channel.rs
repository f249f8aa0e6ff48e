//! Outbound chat channels and their host mapping.
//!
//! Every channel has exactly one numeric host id. Linkshell and cross-world
//! linkshell channels additionally carry a 0-based slot index (0..=7); all other
//! channels report index 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Channel a message can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum InputChannel {
    Tell = 0,
    Say = 1,
    Party = 2,
    Alliance = 3,
    Yell = 4,
    Shout = 5,
    FreeCompany = 6,
    PvpTeam = 7,
    NoviceNetwork = 8,
    CrossLinkshell1 = 9,
    CrossLinkshell2 = 10,
    CrossLinkshell3 = 11,
    CrossLinkshell4 = 12,
    CrossLinkshell5 = 13,
    CrossLinkshell6 = 14,
    CrossLinkshell7 = 15,
    CrossLinkshell8 = 16,
    Linkshell1 = 19,
    Linkshell2 = 20,
    Linkshell3 = 21,
    Linkshell4 = 22,
    Linkshell5 = 23,
    Linkshell6 = 24,
    Linkshell7 = 25,
    Linkshell8 = 26,
}

/// Row of the static channel table.
struct ChannelEntry {
    channel: InputChannel,
    name: &'static str,
    prefix: &'static str,
    aliases: &'static [&'static str],
}

const CHANNEL_TABLE: [ChannelEntry; 25] = [
    ChannelEntry {
        channel: InputChannel::Tell,
        name: "tell",
        prefix: "/tell",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::Say,
        name: "say",
        prefix: "/say",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::Party,
        name: "party",
        prefix: "/party",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::Alliance,
        name: "alliance",
        prefix: "/alliance",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::Yell,
        name: "yell",
        prefix: "/yell",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::Shout,
        name: "shout",
        prefix: "/shout",
        aliases: &[],
    },
    ChannelEntry {
        channel: InputChannel::FreeCompany,
        name: "freeCompany",
        prefix: "/fc",
        aliases: &["fc"],
    },
    ChannelEntry {
        channel: InputChannel::PvpTeam,
        name: "pvpTeam",
        prefix: "/pvp",
        aliases: &["pvp"],
    },
    ChannelEntry {
        channel: InputChannel::NoviceNetwork,
        name: "noviceNetwork",
        prefix: "/nn",
        aliases: &["nn"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell1,
        name: "crossLinkshell1",
        prefix: "/cwls1",
        aliases: &["cwls1"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell2,
        name: "crossLinkshell2",
        prefix: "/cwls2",
        aliases: &["cwls2"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell3,
        name: "crossLinkshell3",
        prefix: "/cwls3",
        aliases: &["cwls3"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell4,
        name: "crossLinkshell4",
        prefix: "/cwls4",
        aliases: &["cwls4"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell5,
        name: "crossLinkshell5",
        prefix: "/cwls5",
        aliases: &["cwls5"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell6,
        name: "crossLinkshell6",
        prefix: "/cwls6",
        aliases: &["cwls6"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell7,
        name: "crossLinkshell7",
        prefix: "/cwls7",
        aliases: &["cwls7"],
    },
    ChannelEntry {
        channel: InputChannel::CrossLinkshell8,
        name: "crossLinkshell8",
        prefix: "/cwls8",
        aliases: &["cwls8"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell1,
        name: "linkshell1",
        prefix: "/ls1",
        aliases: &["ls1"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell2,
        name: "linkshell2",
        prefix: "/ls2",
        aliases: &["ls2"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell3,
        name: "linkshell3",
        prefix: "/ls3",
        aliases: &["ls3"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell4,
        name: "linkshell4",
        prefix: "/ls4",
        aliases: &["ls4"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell5,
        name: "linkshell5",
        prefix: "/ls5",
        aliases: &["ls5"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell6,
        name: "linkshell6",
        prefix: "/ls6",
        aliases: &["ls6"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell7,
        name: "linkshell7",
        prefix: "/ls7",
        aliases: &["ls7"],
    },
    ChannelEntry {
        channel: InputChannel::Linkshell8,
        name: "linkshell8",
        prefix: "/ls8",
        aliases: &["ls8"],
    },
];

impl InputChannel {
    /// Every channel, in host id order.
    pub fn all() -> impl Iterator<Item = InputChannel> {
        CHANNEL_TABLE.iter().map(|entry| entry.channel)
    }

    fn entry(self) -> &'static ChannelEntry {
        // The table holds one row per variant.
        CHANNEL_TABLE
            .iter()
            .find(|entry| entry.channel == self)
            .unwrap_or(&CHANNEL_TABLE[1])
    }

    /// Look up a channel by its numeric host id.
    pub fn from_id(id: u32) -> Option<Self> {
        CHANNEL_TABLE
            .iter()
            .map(|entry| entry.channel)
            .find(|channel| channel.id() == id)
    }

    /// Numeric host channel id.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Wire name (camelCase).
    pub fn as_str(self) -> &'static str {
        self.entry().name
    }

    /// Slash command selecting this channel, e.g. `/party`.
    pub fn command_prefix(self) -> &'static str {
        self.entry().prefix
    }

    /// 0-based linkshell slot, 0 for channels that are not linkshells.
    pub fn linkshell_index(self) -> u32 {
        match self {
            InputChannel::Linkshell1
            | InputChannel::Linkshell2
            | InputChannel::Linkshell3
            | InputChannel::Linkshell4
            | InputChannel::Linkshell5
            | InputChannel::Linkshell6
            | InputChannel::Linkshell7
            | InputChannel::Linkshell8 => self.id() - InputChannel::Linkshell1.id(),
            InputChannel::CrossLinkshell1
            | InputChannel::CrossLinkshell2
            | InputChannel::CrossLinkshell3
            | InputChannel::CrossLinkshell4
            | InputChannel::CrossLinkshell5
            | InputChannel::CrossLinkshell6
            | InputChannel::CrossLinkshell7
            | InputChannel::CrossLinkshell8 => self.id() - InputChannel::CrossLinkshell1.id(),
            _ => 0,
        }
    }

    /// Whether this is a (cross-world) linkshell channel.
    pub fn is_linkshell(self) -> bool {
        matches!(
            self,
            InputChannel::Linkshell1
                | InputChannel::Linkshell2
                | InputChannel::Linkshell3
                | InputChannel::Linkshell4
                | InputChannel::Linkshell5
                | InputChannel::Linkshell6
                | InputChannel::Linkshell7
                | InputChannel::Linkshell8
                | InputChannel::CrossLinkshell1
                | InputChannel::CrossLinkshell2
                | InputChannel::CrossLinkshell3
                | InputChannel::CrossLinkshell4
                | InputChannel::CrossLinkshell5
                | InputChannel::CrossLinkshell6
                | InputChannel::CrossLinkshell7
                | InputChannel::CrossLinkshell8
        )
    }

    /// Whether the host can make this the active channel.
    ///
    /// Tells need a target, so they are only ever sent through the prefix.
    pub fn is_switchable(self) -> bool {
        self != InputChannel::Tell
    }
}

impl fmt::Display for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned for an unrecognised channel name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chat channel: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for InputChannel {
    type Err = UnknownChannel;

    /// Case-insensitive; accepts the wire name and short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CHANNEL_TABLE
            .iter()
            .find(|entry| {
                entry.name.eq_ignore_ascii_case(wanted)
                    || entry.aliases.iter().any(|a| a.eq_ignore_ascii_case(wanted))
            })
            .map(|entry| entry.channel)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

impl Serialize for InputChannel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InputChannel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
