//! WriteMemoryByAddress (0x3D) against a scripted transport
//!
//! Every test drives a real `UdsClient` over `MockTransportAdapter` and checks
//! both the returned outcome and the bytes that reached the wire.
//!
//! Run with: cargo test -p uds-client --test write_memory_by_address

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;

use uds_client::config::MockConfig;
use uds_client::{
    EchoField, InvalidReason, MemoryLocation, MockTransportAdapter, NegativeResponseCode,
    UdsClient, UdsError, UnexpectedResponse, ValidationError,
};

const REQUEST: [u8; 9] = [0x3D, 0x12, 0x12, 0x34, 0x04, 0x66, 0x77, 0x88, 0x99];
const DATA: [u8; 4] = [0x66, 0x77, 0x88, 0x99];

fn setup() -> (Arc<MockTransportAdapter>, UdsClient) {
    let mock = Arc::new(MockTransportAdapter::new(&MockConfig::default()));
    let client = UdsClient::new(mock.clone()).with_timeout(Duration::from_millis(100));
    (mock, client)
}

fn location() -> MemoryLocation {
    MemoryLocation::new(0x1234, 4, 16, 8).unwrap()
}

async fn write_with_response(response: &[u8]) -> (Arc<MockTransportAdapter>, Result<(), UdsError>) {
    let (mock, client) = setup();
    mock.push_response(response.to_vec());
    let result = client
        .write_memory_by_address(location(), &DATA)
        .await
        .map(|_| ());
    (mock, result)
}

#[tokio::test]
async fn test_write_success() {
    let (mock, client) = setup();
    mock.push_response(vec![0x7D, 0x12, 0x12, 0x34, 0x04]);

    let response = client
        .write_memory_by_address(location(), &DATA)
        .await
        .unwrap();

    assert_eq!(mock.sent(), vec![REQUEST.to_vec()]);
    assert_eq!(response.location, location());
    assert!(response.trailing.is_empty());
}

#[tokio::test]
async fn test_trailing_bytes_ignored() {
    let (mock, client) = setup();
    mock.push_response(vec![0x7D, 0x12, 0x12, 0x34, 0x04, 0x01, 0x02, 0x03, 0x04, 0x05]);

    let response = client
        .write_memory_by_address(location(), &DATA)
        .await
        .unwrap();
    assert_eq!(response.trailing, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
}

#[rstest]
#[case::format_identifier(&[0x7D, 0x21, 0x12, 0x34, 0x04], EchoField::FormatIdentifier, 0x12, 0x21)]
#[case::address(&[0x7D, 0x12, 0x12, 0x35, 0x04], EchoField::Address, 0x1234, 0x1235)]
#[case::size(&[0x7D, 0x12, 0x12, 0x34, 0x05], EchoField::Size, 0x04, 0x05)]
#[tokio::test]
async fn test_echo_mismatch(
    #[case] response: &[u8],
    #[case] field: EchoField,
    #[case] expected: u64,
    #[case] actual: u64,
) {
    let (_mock, result) = write_with_response(response).await;
    assert_eq!(
        result,
        Err(UdsError::UnexpectedResponse(UnexpectedResponse::EchoMismatch {
            field,
            expected,
            actual
        }))
    );
}

#[tokio::test]
async fn test_negative_response_carries_code() {
    let (_mock, result) = write_with_response(&[0x7F, 0x3D, 0x45]).await;

    let err = result.unwrap_err();
    assert_eq!(err.nrc(), Some(NegativeResponseCode::Unknown(0x45)));
    assert_eq!(err.nrc().map(u8::from), Some(0x45));
    assert!(matches!(err, UdsError::NegativeResponse { service_id: 0x3D, .. }));
}

#[tokio::test]
async fn test_negative_response_known_code() {
    let (_mock, result) = write_with_response(&[0x7F, 0x3D, 0x31]).await;
    assert_eq!(
        result,
        Err(UdsError::NegativeResponse {
            service_id: 0x3D,
            nrc: NegativeResponseCode::RequestOutOfRange
        })
    );
}

#[tokio::test]
async fn test_unrecognised_marker_is_invalid() {
    let (_mock, result) = write_with_response(&[0x00, 0x12, 0x12, 0x34, 0x04]).await;
    assert_eq!(
        result,
        Err(UdsError::InvalidResponse(InvalidReason::UnknownResponseId(0x00)))
    );
}

#[tokio::test]
async fn test_other_service_is_unexpected() {
    let (_mock, result) = write_with_response(&[0x7E, 0x12, 0x12, 0x34, 0x04]).await;
    assert_eq!(
        result,
        Err(UdsError::UnexpectedResponse(UnexpectedResponse::WrongService {
            expected: 0x3D,
            actual: 0x3E
        }))
    );
}

#[rstest]
#[case::empty(&[])]
#[case::short_negative(&[0x7F, 0x3D])]
#[case::short_echo(&[0x7D, 0x12, 0x12])]
#[tokio::test]
async fn test_malformed_responses_are_invalid(#[case] response: &[u8]) {
    let (_mock, result) = write_with_response(response).await;
    assert!(matches!(result, Err(UdsError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_silence_times_out() {
    let (mock, client) = setup();
    mock.push_silence();

    let err = client
        .write_memory_by_address_with_timeout(location(), &DATA, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert_eq!(err, UdsError::Timeout);
    assert_eq!(mock.send_count(), 1);
}

#[tokio::test]
async fn test_response_pending_then_positive() {
    let (mock, client) = setup();
    mock.push_response(vec![0x7F, 0x3D, 0x78]);
    mock.push_response(vec![0x7D, 0x12, 0x12, 0x34, 0x04]);

    client
        .write_memory_by_address(location(), &DATA)
        .await
        .unwrap();
    assert_eq!(mock.send_count(), 1);
    assert_eq!(mock.pending_replies(), 0);
}

#[tokio::test]
async fn test_tuple_locations() {
    let (mock, client) = setup();
    mock.push_response(vec![0x7D, 0x12, 0x12, 0x34, 0x04]);
    mock.push_response(vec![0x7D, 0x12, 0x12, 0x34, 0x04]);

    client
        .write_memory_by_address((0x1234_u64, 4_u64, 16_u32, 8_u32), &DATA)
        .await
        .unwrap();
    // Narrowest formats for 0x1234/4 are 16/8 bits as well
    client
        .write_memory_by_address((0x1234_u64, 4_u64), &DATA.to_vec())
        .await
        .unwrap();
    assert_eq!(mock.sent(), vec![REQUEST.to_vec(), REQUEST.to_vec()]);
}

#[tokio::test]
async fn test_wide_formats_on_wire() {
    let (mock, client) = setup();
    let location = MemoryLocation::new(0x0012_3456_78, 0x0100, 40, 24).unwrap();
    mock.push_response(vec![0x7D, 0x35, 0x00, 0x12, 0x34, 0x56, 0x78, 0x00, 0x01, 0x00]);

    client
        .write_memory_by_address(location, &[0xAA])
        .await
        .unwrap();
    assert_eq!(
        mock.sent(),
        vec![vec![0x3D, 0x35, 0x00, 0x12, 0x34, 0x56, 0x78, 0x00, 0x01, 0x00, 0xAA]]
    );
}

#[rstest]
#[case::address_format((0x1234, 4, 12, 8), ValidationError::UnsupportedFormat { field: uds_client::uds::Field::Address, bits: 12 })]
#[case::size_format((0x1234, 4, 16, 0), ValidationError::UnsupportedFormat { field: uds_client::uds::Field::Size, bits: 0 })]
#[case::size_format_too_wide((0x1234, 4, 16, 48), ValidationError::UnsupportedFormat { field: uds_client::uds::Field::Size, bits: 48 })]
#[tokio::test]
async fn test_unsupported_formats_never_sent(
    #[case] location: (u64, u64, u32, u32),
    #[case] expected: ValidationError,
) {
    let (mock, client) = setup();

    let err = client
        .write_memory_by_address(location, &DATA)
        .await
        .unwrap_err();
    assert_eq!(err, UdsError::Validation(expected));
    assert_eq!(mock.send_count(), 0);
    assert_eq!(mock.receive_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_values_never_sent() {
    let (mock, client) = setup();

    let err = client
        .write_memory_by_address((0x1_0000_u64, 4_u64, 16_u32, 8_u32), &DATA)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UdsError::Validation(ValidationError::ValueOutOfRange { .. })
    ));

    let err = client
        .write_memory_by_address((0x1234_u64, 0x100_u64, 16_u32, 8_u32), &DATA)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // Larger than any 40-bit field
    let err = client
        .write_memory_by_address((1_u64 << 40, 4_u64), &DATA)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert_eq!(mock.send_count(), 0);
    assert_eq!(mock.receive_count(), 0);
}

#[tokio::test]
async fn test_empty_data_never_sent() {
    let (mock, client) = setup();

    let err = client
        .write_memory_by_address(location(), &[])
        .await
        .unwrap_err();
    assert_eq!(err, UdsError::Validation(ValidationError::EmptyData));
    assert_eq!(mock.send_count(), 0);
    assert_eq!(mock.receive_count(), 0);
}

#[tokio::test]
async fn test_calls_are_serialised_per_transport() {
    let (mock, client) = setup();
    mock.add_response(vec![0x3D, 0x12, 0x12, 0x34], vec![0x7D, 0x12, 0x12, 0x34, 0x04]);
    mock.add_response(vec![0x3D, 0x12, 0x00, 0x10], vec![0x7D, 0x12, 0x00, 0x10, 0x04]);

    let other = client.clone();
    let first = tokio::spawn(async move { client.write_memory_by_address(location(), &DATA).await });
    let second = tokio::spawn(async move {
        let location = MemoryLocation::new(0x0010, 4, 16, 8).unwrap();
        other.write_memory_by_address(location, &DATA).await
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(mock.send_count(), 2);
}
