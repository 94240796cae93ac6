//! Status words returned on the command channel.
//!
//! Every outcome of the signing command, including user rejection, ends up as
//! one of these two-byte codes. Nothing else about a failure is reported.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Phase in which an unexpected internal fault happened.
///
/// The low byte of the technical-details status word tells the phases apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FaultPhase {
    /// Fault while splitting or hashing the request.
    Parse = 0x0F,
    /// Fault while finalizing the digest, deriving the key or signing.
    Sign = 0x1F,
}

/// Two-byte status word placed at the start of every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusWord {
    /// Success.
    Ok,
    /// PIN not validated / device locked.
    SecurityNotSatisfied,
    /// P1/P2 do not select a supported mode.
    IncorrectParameters,
    /// Structural validation of the request failed.
    IncorrectData,
    /// The user declined on the device.
    ConditionsOfUseNotSatisfied,
    /// Instruction not supported.
    InsNotSupported,
    /// Class not supported.
    ClaNotSupported,
    /// Unexpected internal fault (`0x6F00 | phase`).
    InternalFault(FaultPhase),
}

impl StatusWord {
    const TECHNICAL_DETAILS: u16 = 0x6F00;

    /// Returns the status word as sent on the wire.
    pub fn code(self) -> u16 {
        match self {
            StatusWord::Ok => 0x9000,
            StatusWord::SecurityNotSatisfied => 0x6982,
            StatusWord::IncorrectParameters => 0x6B00,
            StatusWord::IncorrectData => 0x6A80,
            StatusWord::ConditionsOfUseNotSatisfied => 0x6985,
            StatusWord::InsNotSupported => 0x6D00,
            StatusWord::ClaNotSupported => 0x6E00,
            StatusWord::InternalFault(phase) => Self::TECHNICAL_DETAILS | phase as u16,
        }
    }

    /// Big-endian encoding of the status word.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.code().to_be_bytes()
    }

    /// Returns true for `Ok`.
    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, StatusWord::Ok)
    }
}

impl TryFrom<u16> for StatusWord {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x9000 => Ok(StatusWord::Ok),
            0x6982 => Ok(StatusWord::SecurityNotSatisfied),
            0x6B00 => Ok(StatusWord::IncorrectParameters),
            0x6A80 => Ok(StatusWord::IncorrectData),
            0x6985 => Ok(StatusWord::ConditionsOfUseNotSatisfied),
            0x6D00 => Ok(StatusWord::InsNotSupported),
            0x6E00 => Ok(StatusWord::ClaNotSupported),
            0x6F0F => Ok(StatusWord::InternalFault(FaultPhase::Parse)),
            0x6F1F => Ok(StatusWord::InternalFault(FaultPhase::Sign)),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusWord::Ok => write!(f, "OK"),
            StatusWord::SecurityNotSatisfied => write!(f, "Security status not satisfied"),
            StatusWord::IncorrectParameters => write!(f, "Incorrect P1/P2"),
            StatusWord::IncorrectData => write!(f, "Incorrect data"),
            StatusWord::ConditionsOfUseNotSatisfied => write!(f, "Conditions of use not satisfied"),
            StatusWord::InsNotSupported => write!(f, "Instruction not supported"),
            StatusWord::ClaNotSupported => write!(f, "Class not supported"),
            StatusWord::InternalFault(phase) => write!(f, "Internal fault ({:?})", phase),
        }?;
        write!(f, " ({:04X})", self.code())
    }
}
