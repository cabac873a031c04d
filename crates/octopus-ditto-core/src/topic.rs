//! Ditto protocol topic paths.
//!
//! Topic structure:
//! - `{namespace}/{name}/things/{channel}/{criterion}/{action}` for commands and events
//! - `{namespace}/{name}/things/{channel}/messages/{subject}` for messages
//! - `{namespace}/{name}/policies/{criterion}/{action}` for policies (no channel)
//!
//! The default (empty) namespace is written as `_`.

use crate::thing_id::ThingId;
use std::fmt;
use std::str::FromStr;

const DEFAULT_NAMESPACE_PLACEHOLDER: &str = "_";

/// Entity group addressed by a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Things
    Things,
    /// Policies
    Policies,
}

impl Group {
    fn as_str(self) -> &'static str {
        match self {
            Self::Things => "things",
            Self::Policies => "policies",
        }
    }
}

/// Channel a thing topic is sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Persisted twin state
    Twin,
    /// Live device interaction, bypassing the twin
    Live,
}

impl Channel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Twin => "twin",
            Self::Live => "live",
        }
    }
}

/// Classification of a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// Commands modifying or retrieving an entity
    Commands,
    /// Events emitted after a change
    Events,
    /// Messages to or from a device
    Messages,
    /// Error responses
    Errors,
    /// Search protocol
    Search,
    /// Announcements
    Announcements,
}

impl Criterion {
    fn as_str(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Events => "events",
            Self::Messages => "messages",
            Self::Errors => "errors",
            Self::Search => "search",
            Self::Announcements => "announcements",
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "commands" => Some(Self::Commands),
            "events" => Some(Self::Events),
            "messages" => Some(Self::Messages),
            "errors" => Some(Self::Errors),
            "search" => Some(Self::Search),
            "announcements" => Some(Self::Announcements),
            _ => None,
        }
    }

    /// Whether the trailing segments form a free-form subject rather than an action.
    fn has_subject(self) -> bool {
        matches!(self, Self::Messages | Self::Announcements)
    }
}

/// A parsed Ditto protocol topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPath {
    /// Entity namespace
    pub namespace: String,
    /// Entity name within the namespace
    pub entity_name: String,
    /// Entity group
    pub group: Group,
    /// Channel (only for things)
    pub channel: Option<Channel>,
    /// Criterion
    pub criterion: Criterion,
    /// Action for commands, events and search (e.g. `merge`, `modified`)
    pub action: Option<String>,
    /// Subject for messages and announcements
    pub subject: Option<String>,
}

impl TopicPath {
    /// Topic of a twin merge command for the given thing.
    #[must_use]
    pub fn twin_merge_command(thing_id: &ThingId) -> Self {
        Self::twin_command(thing_id, "merge")
    }

    /// Topic of a twin command with an arbitrary action.
    #[must_use]
    pub fn twin_command(thing_id: &ThingId, action: impl Into<String>) -> Self {
        Self {
            namespace: thing_id.namespace().to_string(),
            entity_name: thing_id.name().to_string(),
            group: Group::Things,
            channel: Some(Channel::Twin),
            criterion: Criterion::Commands,
            action: Some(action.into()),
            subject: None,
        }
    }

    /// Topic of a live message with the given subject.
    #[must_use]
    pub fn live_message(thing_id: &ThingId, subject: impl Into<String>) -> Self {
        Self {
            namespace: thing_id.namespace().to_string(),
            entity_name: thing_id.name().to_string(),
            group: Group::Things,
            channel: Some(Channel::Live),
            criterion: Criterion::Messages,
            action: None,
            subject: Some(subject.into()),
        }
    }

    /// Whether this topic has the given criterion.
    #[must_use]
    pub fn is_criterion(&self, criterion: Criterion) -> bool {
        self.criterion == criterion
    }

    /// The addressed entity as a thing id.
    #[must_use]
    pub fn thing_id(&self) -> ThingId {
        ThingId::new(&self.namespace, &self.entity_name)
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = if self.namespace.is_empty() {
            DEFAULT_NAMESPACE_PLACEHOLDER
        } else {
            &self.namespace
        };
        write!(
            f,
            "{namespace}/{}/{}",
            self.entity_name,
            self.group.as_str()
        )?;
        if let Some(channel) = self.channel {
            write!(f, "/{}", channel.as_str())?;
        }
        write!(f, "/{}", self.criterion.as_str())?;
        if let Some(action) = &self.action {
            write!(f, "/{action}")?;
        }
        if let Some(subject) = &self.subject {
            write!(f, "/{subject}")?;
        }
        Ok(())
    }
}

impl FromStr for TopicPath {
    type Err = TopicError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TopicError::Invalid {
            topic: topic.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = topic.split('/').collect();
        if parts.len() < 4 {
            return Err(invalid("too few segments"));
        }

        let namespace = parts[0];
        let entity_name = parts[1];
        if namespace.is_empty() || entity_name.is_empty() {
            return Err(invalid("empty namespace or entity name"));
        }
        let namespace = if namespace == DEFAULT_NAMESPACE_PLACEHOLDER {
            ""
        } else {
            namespace
        };

        let (group, channel, rest) = match parts[2] {
            "things" => {
                let channel = match parts[3] {
                    "twin" => Channel::Twin,
                    "live" => Channel::Live,
                    other => return Err(invalid(&format!("unknown channel '{other}'"))),
                };
                (Group::Things, Some(channel), &parts[4..])
            }
            "policies" => (Group::Policies, None, &parts[3..]),
            other => return Err(invalid(&format!("unknown group '{other}'"))),
        };

        let (criterion_segment, tail) = rest
            .split_first()
            .ok_or_else(|| invalid("missing criterion"))?;
        let criterion = Criterion::parse(criterion_segment)
            .ok_or_else(|| invalid(&format!("unknown criterion '{criterion_segment}'")))?;

        let (action, subject) = if criterion.has_subject() {
            let subject = tail.join("/");
            if subject.is_empty() {
                return Err(invalid("missing subject"));
            }
            (None, Some(subject))
        } else {
            match tail {
                [] if criterion == Criterion::Errors => (None, None),
                [] => return Err(invalid("missing action")),
                [action] if !action.is_empty() => (Some((*action).to_string()), None),
                _ => return Err(invalid("unexpected trailing segments")),
            }
        };

        Ok(Self {
            namespace: namespace.to_string(),
            entity_name: entity_name.to_string(),
            group,
            channel,
            criterion,
            action,
            subject,
        })
    }
}

/// Errors for topic parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    /// Topic does not follow the Ditto topic structure
    #[error("invalid topic '{topic}': {reason}")]
    Invalid {
        /// The offending topic
        topic: String,
        /// What is wrong with it
        reason: String,
    },
}
