//! Chat classification as reported by the host.

use serde::{Deserialize, Serialize};

/// Classification tag of a received chat line.
///
/// Discriminants are the host's numeric chat-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u16)]
pub enum ChatKind {
    None = 0,
    Debug = 1,
    Urgent = 2,
    Notice = 3,
    Say = 10,
    Shout = 11,
    TellOutgoing = 12,
    TellIncoming = 13,
    Party = 14,
    Alliance = 15,
    Ls1 = 16,
    Ls2 = 17,
    Ls3 = 18,
    Ls4 = 19,
    Ls5 = 20,
    Ls6 = 21,
    Ls7 = 22,
    Ls8 = 23,
    FreeCompany = 24,
    NoviceNetwork = 27,
    CustomEmote = 28,
    StandardEmote = 29,
    Yell = 30,
    CrossParty = 32,
    PvPTeam = 36,
    CrossLinkShell1 = 37,
    Echo = 56,
    SystemMessage = 57,
    SystemError = 58,
    GatheringSystemMessage = 59,
    ErrorMessage = 60,
    NpcDialogue = 61,
    NpcDialogueAnnouncements = 68,
    RetainerSale = 71,
    CrossLinkShell2 = 101,
    CrossLinkShell3 = 102,
    CrossLinkShell4 = 103,
    CrossLinkShell5 = 104,
    CrossLinkShell6 = 105,
    CrossLinkShell7 = 106,
    CrossLinkShell8 = 107,
}

impl ChatKind {
    /// Every known classification.
    pub const ALL: [ChatKind; 41] = [
        ChatKind::None,
        ChatKind::Debug,
        ChatKind::Urgent,
        ChatKind::Notice,
        ChatKind::Say,
        ChatKind::Shout,
        ChatKind::TellOutgoing,
        ChatKind::TellIncoming,
        ChatKind::Party,
        ChatKind::Alliance,
        ChatKind::Ls1,
        ChatKind::Ls2,
        ChatKind::Ls3,
        ChatKind::Ls4,
        ChatKind::Ls5,
        ChatKind::Ls6,
        ChatKind::Ls7,
        ChatKind::Ls8,
        ChatKind::FreeCompany,
        ChatKind::NoviceNetwork,
        ChatKind::CustomEmote,
        ChatKind::StandardEmote,
        ChatKind::Yell,
        ChatKind::CrossParty,
        ChatKind::PvPTeam,
        ChatKind::CrossLinkShell1,
        ChatKind::Echo,
        ChatKind::SystemMessage,
        ChatKind::SystemError,
        ChatKind::GatheringSystemMessage,
        ChatKind::ErrorMessage,
        ChatKind::NpcDialogue,
        ChatKind::NpcDialogueAnnouncements,
        ChatKind::RetainerSale,
        ChatKind::CrossLinkShell2,
        ChatKind::CrossLinkShell3,
        ChatKind::CrossLinkShell4,
        ChatKind::CrossLinkShell5,
        ChatKind::CrossLinkShell6,
        ChatKind::CrossLinkShell7,
        ChatKind::CrossLinkShell8,
    ];

    /// Look up a host chat-type code. Unknown codes yield `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// Host chat-type code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Wire name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::None => "none",
            ChatKind::Debug => "debug",
            ChatKind::Urgent => "urgent",
            ChatKind::Notice => "notice",
            ChatKind::Say => "say",
            ChatKind::Shout => "shout",
            ChatKind::TellOutgoing => "tellOutgoing",
            ChatKind::TellIncoming => "tellIncoming",
            ChatKind::Party => "party",
            ChatKind::Alliance => "alliance",
            ChatKind::Ls1 => "ls1",
            ChatKind::Ls2 => "ls2",
            ChatKind::Ls3 => "ls3",
            ChatKind::Ls4 => "ls4",
            ChatKind::Ls5 => "ls5",
            ChatKind::Ls6 => "ls6",
            ChatKind::Ls7 => "ls7",
            ChatKind::Ls8 => "ls8",
            ChatKind::FreeCompany => "freeCompany",
            ChatKind::NoviceNetwork => "noviceNetwork",
            ChatKind::CustomEmote => "customEmote",
            ChatKind::StandardEmote => "standardEmote",
            ChatKind::Yell => "yell",
            ChatKind::CrossParty => "crossParty",
            ChatKind::PvPTeam => "pvPTeam",
            ChatKind::CrossLinkShell1 => "crossLinkShell1",
            ChatKind::Echo => "echo",
            ChatKind::SystemMessage => "systemMessage",
            ChatKind::SystemError => "systemError",
            ChatKind::GatheringSystemMessage => "gatheringSystemMessage",
            ChatKind::ErrorMessage => "errorMessage",
            ChatKind::NpcDialogue => "npcDialogue",
            ChatKind::NpcDialogueAnnouncements => "npcDialogueAnnouncements",
            ChatKind::RetainerSale => "retainerSale",
            ChatKind::CrossLinkShell2 => "crossLinkShell2",
            ChatKind::CrossLinkShell3 => "crossLinkShell3",
            ChatKind::CrossLinkShell4 => "crossLinkShell4",
            ChatKind::CrossLinkShell5 => "crossLinkShell5",
            ChatKind::CrossLinkShell6 => "crossLinkShell6",
            ChatKind::CrossLinkShell7 => "crossLinkShell7",
            ChatKind::CrossLinkShell8 => "crossLinkShell8",
        }
    }
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for kind in ChatKind::ALL {
            assert_eq!(ChatKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(ChatKind::from_code(4), None);
        assert_eq!(ChatKind::from_code(9999), None);
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(ChatKind::from_code(10), Some(ChatKind::Say));
        assert_eq!(ChatKind::from_code(24), Some(ChatKind::FreeCompany));
        assert_eq!(ChatKind::from_code(37), Some(ChatKind::CrossLinkShell1));
        assert_eq!(ChatKind::from_code(101), Some(ChatKind::CrossLinkShell2));
    }

    #[test]
    fn test_as_str_matches_serde() {
        for kind in ChatKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_deserialize() {
        let kind: ChatKind = serde_json::from_str("\"npcDialogue\"").unwrap();
        assert_eq!(kind, ChatKind::NpcDialogue);
        assert!(serde_json::from_str::<ChatKind>("\"bogus\"").is_err());
    }

    #[test]
    fn test_all_is_unique() {
        let mut codes: Vec<u16> = ChatKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ChatKind::ALL.len());
    }
}
