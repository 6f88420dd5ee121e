//! Text command surface and note-tag triggers.
//!
//! Script and map-event authors drive the engine with plain text:
//!
//! ```text
//! COR APPLY 1 slime 2
//! ADVANCE 1 slime
//! REMOVE 1
//! TIMEPROGRESSION off
//! ```
//!
//! and annotate content with note tags such as `<CorruptAttack: slime, 1, 0.4>`.
//! Keywords are case-insensitive; omitted stages and amounts default to 1.

use std::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::error::{EngineError, ErrorSeverity};
use crate::ids::{EffectTypeId, EntityId};

/// Command parsing failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` needs argument `{argument}`")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{argument}` is not a number: `{value}`")]
    InvalidNumber { argument: &'static str, value: String },

    #[error("expected ON or OFF, got `{0}`")]
    InvalidToggle(String),

    #[error("malformed note tag `{0}`")]
    MalformedNoteTag(String),
}

impl EngineError for CommandError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY_COMMAND",
            Self::UnknownCommand(_) => "UNKNOWN_COMMAND",
            Self::MissingArgument { .. } => "MISSING_ARGUMENT",
            Self::InvalidNumber { .. } => "INVALID_NUMBER",
            Self::InvalidToggle(_) => "INVALID_TOGGLE",
            Self::MalformedNoteTag(_) => "MALFORMED_NOTE_TAG",
        }
    }
}

/// One parsed text command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Apply {
        entity: EntityId,
        type_id: EffectTypeId,
        stage: i32,
    },
    Advance {
        entity: EntityId,
        type_id: EffectTypeId,
        amount: i32,
    },
    /// Without a type, removes every affliction of the entity.
    Remove {
        entity: EntityId,
        type_id: Option<EffectTypeId>,
    },
    TimeProgression(bool),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut tokens = input.split_whitespace().peekable();
        if tokens
            .peek()
            .is_some_and(|t| t.eq_ignore_ascii_case("COR") || t.eq_ignore_ascii_case("CORRUPTION"))
        {
            tokens.next();
        }

        let keyword = tokens.next().ok_or(CommandError::Empty)?;
        match keyword.to_ascii_uppercase().as_str() {
            "APPLY" => {
                let entity = entity_arg("APPLY", tokens.next())?;
                let type_id = required("APPLY", "type", tokens.next())?;
                let stage = number_arg("stage", tokens.next())?.unwrap_or(1);
                Ok(Self::Apply {
                    entity,
                    type_id: EffectTypeId::new(type_id),
                    stage,
                })
            }
            "ADVANCE" => {
                let entity = entity_arg("ADVANCE", tokens.next())?;
                let type_id = required("ADVANCE", "type", tokens.next())?;
                let amount = number_arg("amount", tokens.next())?.unwrap_or(1);
                Ok(Self::Advance {
                    entity,
                    type_id: EffectTypeId::new(type_id),
                    amount,
                })
            }
            "REMOVE" => {
                let entity = entity_arg("REMOVE", tokens.next())?;
                Ok(Self::Remove {
                    entity,
                    type_id: tokens.next().map(EffectTypeId::new),
                })
            }
            "TIMEPROGRESSION" => {
                let toggle = required("TIMEPROGRESSION", "ON|OFF", tokens.next())?;
                match toggle.to_ascii_uppercase().as_str() {
                    "ON" => Ok(Self::TimeProgression(true)),
                    "OFF" => Ok(Self::TimeProgression(false)),
                    _ => Err(CommandError::InvalidToggle(toggle.to_string())),
                }
            }
            _ => Err(CommandError::UnknownCommand(keyword.to_string())),
        }
    }
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    token: Option<&'a str>,
) -> Result<&'a str, CommandError> {
    token.ok_or(CommandError::MissingArgument { command, argument })
}

fn entity_arg(command: &'static str, token: Option<&str>) -> Result<EntityId, CommandError> {
    let raw = required(command, "entity", token)?;
    raw.parse::<u32>()
        .map(EntityId)
        .map_err(|_| CommandError::InvalidNumber {
            argument: "entity",
            value: raw.to_string(),
        })
}

fn number_arg(argument: &'static str, token: Option<&str>) -> Result<Option<i32>, CommandError> {
    token
        .map(|raw| {
            raw.parse::<i32>().map_err(|_| CommandError::InvalidNumber {
                argument,
                value: raw.to_string(),
            })
        })
        .transpose()
}

/// Where a note tag fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum NoteTrigger {
    /// Map event touched by the party leader: advance.
    #[strum(serialize = "CorruptOnTouch")]
    Touch,
    /// Hostile attack or skill landing on an entity: advance on a chance roll.
    #[strum(serialize = "CorruptAttack")]
    Attack,
    /// Host state tag added to an entity: apply.
    #[strum(serialize = "CorruptionLink")]
    Link,
}

/// A parsed `<Trigger: type, stage[, chance]>` annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteTag {
    pub trigger: NoteTrigger,
    pub type_id: EffectTypeId,
    pub stage: i32,
    /// Success probability in `[0, 1]`. Only attacks roll; others use 1.
    pub chance: f64,
}

impl NoteTag {
    /// Extracts every recognized tag from free-form note text. Tags with other
    /// names belong to other systems and are ignored.
    pub fn parse_all(note: &str) -> Result<Vec<NoteTag>, CommandError> {
        let mut tags = Vec::new();
        let mut rest = note;
        while let Some(open) = rest.find('<') {
            let after = &rest[open..];
            let Some(close) = after.find('>') else {
                break;
            };
            let raw = &after[..=close];
            rest = &after[close + 1..];

            let name = raw[1..raw.len() - 1]
                .split(':')
                .next()
                .unwrap_or_default()
                .trim();
            if name.parse::<NoteTrigger>().is_ok() {
                tags.push(raw.parse()?);
            }
        }
        Ok(tags)
    }
}

impl FromStr for NoteTag {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || CommandError::MalformedNoteTag(input.to_string());

        let body = input
            .trim()
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(malformed)?;
        let (name, args) = body.split_once(':').ok_or_else(malformed)?;
        let trigger = name.trim().parse::<NoteTrigger>().map_err(|_| malformed())?;

        let mut args = args
            .split([',', ' ', '\t'])
            .filter(|part| !part.is_empty());
        let type_id = args
            .next()
            .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .ok_or_else(malformed)?;
        let stage = match args.next() {
            Some(raw) => raw.parse::<i32>().map_err(|_| malformed())?,
            None => 1,
        };
        let chance = match (trigger, args.next()) {
            (NoteTrigger::Attack, Some(raw)) => raw.parse::<f64>().map_err(|_| malformed())?,
            (_, Some(_)) => return Err(malformed()),
            (_, None) => 1.0,
        };
        if args.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            trigger,
            type_id: EffectTypeId::new(type_id),
            stage,
            chance,
        })
    }
}
