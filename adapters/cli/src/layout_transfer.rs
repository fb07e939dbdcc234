use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use formation_core::{StageType, TileIndex, UnitId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "formation";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "formation:v1";
/// Delimiter used to separate the prefix, stage type and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the units placed on the grid for a stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FormationSnapshot {
    /// Stage layout the formation was built for.
    pub(crate) stage_type: StageType,
    /// Units composing the formation, in tile order.
    pub(crate) placements: Vec<FormationPlacement>,
}

impl FormationSnapshot {
    /// Encodes the snapshot into a single-line string suitable for sharing.
    pub(crate) fn encode(&self) -> Result<String, FormationTransferError> {
        let payload = SerializableSnapshot {
            placements: self.placements.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(FormationTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}:{encoded}",
            self.stage_type.get()
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, FormationTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FormationTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(FormationTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(FormationTransferError::MissingVersion)?;
        let stage = parts.next().ok_or(FormationTransferError::MissingStage)?;
        let payload = parts.next().ok_or(FormationTransferError::MissingPayload)?;
        if let Some(extra) = parts.next() {
            return Err(FormationTransferError::UnexpectedSegment(extra.to_owned()));
        }

        if domain != SNAPSHOT_DOMAIN {
            return Err(FormationTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(FormationTransferError::UnsupportedVersion(
                version.to_owned(),
            ));
        }

        let stage_type = stage
            .trim()
            .parse::<u32>()
            .map(StageType::new)
            .map_err(|_| FormationTransferError::InvalidStage(stage.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(FormationTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(FormationTransferError::InvalidPayload)?;

        Ok(Self {
            stage_type,
            placements: decoded.placements,
        })
    }
}

/// Unit placement captured within a formation snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FormationPlacement {
    /// Unit placed on the tile.
    pub(crate) unit: UnitId,
    /// Tile holding the unit.
    pub(crate) tile: TileIndex,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    placements: Vec<FormationPlacement>,
}

/// Errors that can occur while decoding formation share strings.
#[derive(Debug, Error)]
pub(crate) enum FormationTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("formation string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("formation string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("formation string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the stage type.
    #[error("formation string is missing the stage type")]
    MissingStage,
    /// The encoded snapshot did not include the payload segment.
    #[error("formation string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot carried segments after the payload.
    #[error("formation string has an unexpected trailing segment '{0}'")]
    UnexpectedSegment(String),
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("formation prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("formation version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The stage type could not be parsed from the encoded snapshot.
    #[error("could not parse stage type '{0}'")]
    InvalidStage(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode formation payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse formation payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
