//! Response classification
//!
//! Decides, from the first bytes of a raw response, which of four outcomes
//! it represents for the request that was sent:
//!
//! ```text
//! 7F sid nrc ..     -> Negative     (fewer than 3 bytes -> Invalid)
//! sid+0x40 ..       -> Positive     (payload goes to the echo validator)
//! other+0x40 ..     -> Unexpected   (valid PDU of another known service)
//! anything else     -> Invalid
//! ```

use super::error::{InvalidReason, UdsError, UnexpectedResponse};
use super::{service_id, KnownServices, NegativeResponseCode};

/// Classified response for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Positive response; bytes following the response id
    Positive(Vec<u8>),
    /// Device refused the request
    Negative { nrc: NegativeResponseCode },
    /// Not a recognisable PDU
    Invalid(InvalidReason),
    /// Well-formed response for another service
    Unexpected { service_id: u8 },
}

impl Outcome {
    /// Classify `response` as an answer to a request for `request_sid`
    pub fn classify(response: &[u8], request_sid: u8, known: &KnownServices) -> Self {
        let Some((&first, rest)) = response.split_first() else {
            return Outcome::Invalid(InvalidReason::Empty);
        };

        if first == service_id::NEGATIVE_RESPONSE {
            if response.len() < 3 {
                return Outcome::Invalid(InvalidReason::NegativeTooShort {
                    len: response.len(),
                });
            }
            // A refusal of some other request is still not our answer
            if rest[0] != request_sid {
                return Outcome::Unexpected {
                    service_id: rest[0],
                };
            }
            return Outcome::Negative {
                nrc: NegativeResponseCode::from(rest[1]),
            };
        }

        if first == KnownServices::response_id(request_sid) {
            return Outcome::Positive(rest.to_vec());
        }

        match known.service_for_response(first) {
            Some(service_id) => Outcome::Unexpected { service_id },
            None => Outcome::Invalid(InvalidReason::UnknownResponseId(first)),
        }
    }

    /// Convert into the positive payload or the matching error
    pub fn into_result(self, request_sid: u8) -> Result<Vec<u8>, UdsError> {
        match self {
            Outcome::Positive(payload) => Ok(payload),
            Outcome::Negative { nrc } => Err(UdsError::NegativeResponse {
                service_id: request_sid,
                nrc,
            }),
            Outcome::Invalid(reason) => Err(UdsError::InvalidResponse(reason)),
            Outcome::Unexpected { service_id } => Err(UdsError::UnexpectedResponse(
                UnexpectedResponse::WrongService {
                    expected: request_sid,
                    actual: service_id,
                },
            )),
        }
    }
}
