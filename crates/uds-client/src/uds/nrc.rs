//! UDS Negative Response Codes (NRC)

use std::fmt;

macro_rules! negative_response_codes {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)+) => {
        /// UDS Negative Response Codes (ISO 14229-1 Annex A)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NegativeResponseCode {
            $($(#[$meta])* $name,)+
            /// Reserved or manufacturer-specific NRC
            Unknown(u8),
        }

        impl From<u8> for NegativeResponseCode {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$name,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<NegativeResponseCode> for u8 {
            fn from(nrc: NegativeResponseCode) -> Self {
                match nrc {
                    $(NegativeResponseCode::$name => $value,)+
                    NegativeResponseCode::Unknown(v) => v,
                }
            }
        }

        impl fmt::Display for NegativeResponseCode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$name => f.write_str(stringify!($name)),)+
                    Self::Unknown(v) => write!(f, "Unknown(0x{:02X})", v),
                }
            }
        }
    };
}

negative_response_codes! {
    // General
    GeneralReject = 0x10,
    ServiceNotSupported = 0x11,
    SubFunctionNotSupported = 0x12,
    IncorrectMessageLengthOrFormat = 0x13,
    ResponseTooLong = 0x14,

    // Conditions
    BusyRepeatRequest = 0x21,
    ConditionsNotCorrect = 0x22,
    RequestSequenceError = 0x24,
    NoResponseFromSubnet = 0x25,
    FailurePreventsExecution = 0x26,

    // Request
    RequestOutOfRange = 0x31,
    SecurityAccessDenied = 0x33,
    AuthenticationRequired = 0x34,
    InvalidKey = 0x35,
    ExceededNumberOfAttempts = 0x36,
    RequiredTimeDelayNotExpired = 0x37,

    // Upload/Download
    UploadDownloadNotAccepted = 0x70,
    TransferDataSuspended = 0x71,
    GeneralProgrammingFailure = 0x72,
    WrongBlockSequenceCounter = 0x73,

    /// Server accepted the request but needs more time (P2* applies)
    ResponsePending = 0x78,

    SubFunctionNotSupportedInActiveSession = 0x7E,
    ServiceNotSupportedInActiveSession = 0x7F,

    // Vehicle conditions
    RpmTooHigh = 0x81,
    RpmTooLow = 0x82,
    EngineRunning = 0x83,
    EngineNotRunning = 0x84,
    EngineRunTimeTooLow = 0x85,
    TemperatureTooHigh = 0x86,
    TemperatureTooLow = 0x87,
    VehicleSpeedTooHigh = 0x88,
    VehicleSpeedTooLow = 0x89,
    ThrottleTooHigh = 0x8A,
    ThrottleTooLow = 0x8B,
    TransmissionNotInNeutral = 0x8C,
    TransmissionNotInGear = 0x8D,
    BrakeSwitchNotClosed = 0x8F,
    ShifterNotInPark = 0x90,
    TorqueConverterClutchLocked = 0x91,
    VoltageTooHigh = 0x92,
    VoltageTooLow = 0x93,
}

impl NegativeResponseCode {
    pub fn as_byte(self) -> u8 {
        self.into()
    }
}

impl fmt::UpperHex for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.as_byte(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_round_trips() {
        let nrc = NegativeResponseCode::from(0x31);
        assert_eq!(nrc, NegativeResponseCode::RequestOutOfRange);
        assert_eq!(nrc.as_byte(), 0x31);
        assert_eq!(nrc.to_string(), "RequestOutOfRange");
    }

    #[test]
    fn test_reserved_code_kept_verbatim() {
        let nrc = NegativeResponseCode::from(0x45);
        assert_eq!(nrc, NegativeResponseCode::Unknown(0x45));
        assert_eq!(u8::from(nrc), 0x45);
        assert_eq!(nrc.to_string(), "Unknown(0x45)");
        assert_eq!(format!("{:02X}", nrc), "45");
    }
}
