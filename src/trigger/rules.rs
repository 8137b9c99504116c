//! Mode-specific trigger rule tables.
//!
//! Each mode is a fixed, ordered list of `(kind, scope, pattern)` rows. The
//! classifier walks the list top to bottom and the first rule that claims a
//! line wins. Patterns may contain `{nick}`, replaced by the escaped
//! configured nick when the table is built.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::TriggerError;

/// Which tracker community's bot phrasing to recognise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Red,
    Orp,
}

impl Mode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orp => "orp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "orp" => Ok(Self::Orp),
            other => Err(format!("unknown mode '{other}' (expected red or orp)")),
        }
    }
}

/// What a rule detects, in classifier terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// A kick of the configured nick. Groups: `actor`, `target`, `reason`.
    KickSelf,
    /// The client reports losing its connection.
    DisconnectNotice,
    /// The configured nick quit or left IRC.
    SelfQuit,
    /// Someone left IRC because of a netsplit. Group: `nick`.
    NetsplitQuit,
    /// "Currently interviewing" announcement. Groups: `nick`, `queue`.
    InterviewAnnounce,
    /// Queue position for the configured nick. Group: `position`.
    QueuePosition,
    /// The configured nick appears as a token.
    Mention,
    /// A kick whose reason is an interview outcome. Same groups as `KickSelf`.
    KickOutcome,
}

impl RuleKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KickSelf => "kick_self",
            Self::DisconnectNotice => "disconnect_notice",
            Self::SelfQuit => "self_quit",
            Self::NetsplitQuit => "netsplit_quit",
            Self::InterviewAnnounce => "interview_announce",
            Self::QueuePosition => "queue_position",
            Self::Mention => "mention",
            Self::KickOutcome => "kick_outcome",
        }
    }
}

/// Which lines a rule may fire on while bot-nick checking is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Said or performed by one of the configured bot nicks.
    Bot,
    /// Status lines written by the client (no chat speaker).
    Status,
    /// Any line.
    Anyone,
}

/// Template row: kind, scope, pattern source.
type RuleRow = (RuleKind, RuleScope, &'static str);

const KICK_BY: &str = r"(?i)^(?:[*\-!=>\s]+)?(?P<actor>[^\s*]+) kicked (?P<target>[^\s]+) from (?:the channel|#\S+)\s*(?:\((?P<reason>.*)\))?\s*$";
const KICKED_FROM: &str = r"(?i)^(?:[*\-!=>\s]+)?(?P<target>[^\s*]+) (?:was|has been) kicked from \S+ by (?P<actor>[^\s(\[]+)\s*(?:[(\[](?P<reason>.*)[)\]])?\s*$";
const DISCONNECT: &str = r"(?i)^(?:[*\-!=>\s]+)?(?:[\w.]+:\s*)?(?:disconnected\b|connection lost\b)";
const SELF_QUIT: &str = r"(?i)^(?:[*\-!=>\s]+)?{nick}(?:\s+\([^)]*\))?\s+(?:has quit|has left IRC|quit\b)";
const NETSPLIT: &str = r"(?i)^(?:[*\-!=>\s]+)?(?P<nick>[^\s*]+)(?:\s+\([^)]*\))?\s+(?:has left IRC|has quit)\b.*(?:\*\.net \*\.split|Ping timeout: 121 seconds)";
const MENTION: &str = r"(?i)(?:^|[^A-Za-z0-9_\-\[\]\\^{}|`])(?:{nick})(?:$|[^A-Za-z0-9_\-\[\]\\^{}|`])";

const RED_RULES: &[RuleRow] = &[
    (RuleKind::KickSelf, RuleScope::Bot, KICK_BY),
    (RuleKind::KickSelf, RuleScope::Bot, KICKED_FROM),
    (RuleKind::DisconnectNotice, RuleScope::Status, DISCONNECT),
    (RuleKind::SelfQuit, RuleScope::Status, SELF_QUIT),
    (RuleKind::NetsplitQuit, RuleScope::Status, NETSPLIT),
    (
        RuleKind::InterviewAnnounce,
        RuleScope::Bot,
        r"(?i)Currently interviewing:\s*(?P<nick>[^\s:]+)(?:\s*:::.*?:::\s*(?P<queue>\d+)\s+remaining in queue)?",
    ),
    (
        RuleKind::QueuePosition,
        RuleScope::Bot,
        r"(?i)^{nick}[:,]?\s+you are (?:now |currently )?(?:number |#|position )?(?P<position>\d+)(?:st|nd|rd|th)? in (?:the )?queue",
    ),
    (RuleKind::Mention, RuleScope::Anyone, MENTION),
    (RuleKind::KickOutcome, RuleScope::Bot, KICK_BY),
    (RuleKind::KickOutcome, RuleScope::Bot, KICKED_FROM),
];

const ORP_RULES: &[RuleRow] = &[
    (RuleKind::KickSelf, RuleScope::Bot, KICK_BY),
    (RuleKind::KickSelf, RuleScope::Bot, KICKED_FROM),
    (RuleKind::DisconnectNotice, RuleScope::Status, DISCONNECT),
    (RuleKind::SelfQuit, RuleScope::Status, SELF_QUIT),
    (RuleKind::NetsplitQuit, RuleScope::Status, NETSPLIT),
    (
        RuleKind::InterviewAnnounce,
        RuleScope::Bot,
        r"(?i)(?:Currently|Now) interviewing:?\s*(?P<nick>[^\s:,]+)(?:.*?(?P<queue>\d+)\s+(?:users?\s+|people\s+)?(?:remaining|left|waiting)\s+in (?:the )?queue)?",
    ),
    (
        RuleKind::QueuePosition,
        RuleScope::Bot,
        r"(?i)queue position for {nick}\s*(?:is|:)\s*#?(?P<position>\d+)",
    ),
    (
        RuleKind::QueuePosition,
        RuleScope::Bot,
        r"(?i)^{nick}[:,]?\s+your (?:queue )?position is\s*#?(?P<position>\d+)",
    ),
    (RuleKind::Mention, RuleScope::Anyone, MENTION),
    (RuleKind::KickOutcome, RuleScope::Bot, KICK_BY),
    (RuleKind::KickOutcome, RuleScope::Bot, KICKED_FROM),
];

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    kind: RuleKind,
    scope: RuleScope,
    pattern: Regex,
}

impl TriggerRule {
    /// Compile a rule, substituting `{nick}`.
    ///
    /// # Errors
    ///
    /// Returns `TriggerError::InvalidPattern` if the pattern does not compile.
    pub fn new(
        kind: RuleKind,
        scope: RuleScope,
        template: &str,
        nick: &str,
    ) -> Result<Self, TriggerError> {
        let source = template.replace("{nick}", &regex::escape(nick));
        let pattern = Regex::new(&source).map_err(|source| TriggerError::InvalidPattern {
            rule: kind.as_str(),
            source,
        })?;
        Ok(Self {
            kind,
            scope,
            pattern,
        })
    }

    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    #[must_use]
    pub fn scope(&self) -> RuleScope {
        self.scope
    }

    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// The ordered rules for one mode and nick.
#[derive(Debug, Clone)]
pub struct RuleTable {
    mode: Mode,
    rules: Vec<TriggerRule>,
}

impl RuleTable {
    /// Build the table for `mode`, specialised to `nick`.
    ///
    /// # Errors
    ///
    /// Returns an error if the nick is empty or a pattern fails to compile.
    pub fn for_mode(mode: Mode, nick: &str) -> Result<Self, TriggerError> {
        if nick.trim().is_empty() {
            return Err(TriggerError::EmptyNick);
        }
        let rows = match mode {
            Mode::Red => RED_RULES,
            Mode::Orp => ORP_RULES,
        };
        let rules = rows
            .iter()
            .map(|(kind, scope, template)| TriggerRule::new(*kind, *scope, template, nick))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mode, rules })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
