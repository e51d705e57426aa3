//! Tests for paged discovery against a scripted transport

use super::client::AttClient;
use super::constants::*;
use super::error::{AttError, AttErrorCode};
use super::transport::mock::MockTransport;
use super::types::*;
use crate::error::TransportError;
use crate::uuid::Uuid;

/// Read By Type Response with 2-byte values
fn read_by_type_page(elements: &[(u16, u16)]) -> Vec<u8> {
    let mut pdu = vec![ATT_READ_BY_TYPE_RSP, 4];
    for (handle, value) in elements {
        pdu.extend_from_slice(&handle.to_le_bytes());
        pdu.extend_from_slice(&value.to_le_bytes());
    }
    pdu
}

fn error_response(request_opcode: u8, handle: u16, code: u8) -> Vec<u8> {
    let mut pdu = vec![ATT_ERROR_RSP, request_opcode];
    pdu.extend_from_slice(&handle.to_le_bytes());
    pdu.push(code);
    pdu
}

fn sent_ranges(mock: &MockTransport) -> Vec<(u16, u16)> {
    mock.sent
        .iter()
        .map(|pdu| {
            let range = match pdu[0] {
                ATT_READ_BY_TYPE_REQ => ReadByTypeRequest::parse(pdu).unwrap().range,
                ATT_READ_BY_GROUP_TYPE_REQ => ReadByGroupTypeRequest::parse(pdu).unwrap().range,
                ATT_FIND_INFO_REQ => FindInformationRequest::parse(pdu).unwrap().range,
                other => panic!("unexpected request opcode {:#x}", other),
            };
            (range.start, range.end)
        })
        .collect()
}

#[test]
fn test_read_by_type_pages_until_not_found() {
    let mut mock = MockTransport::new();
    mock.queue(&read_by_type_page(&[(0x0002, 0x1800), (0x0010, 0x1801)]))
        .queue(&read_by_type_page(&[(0x0015, 0x180A), (0x0023, 0x180F)]))
        .queue_not_found(ATT_READ_BY_TYPE_REQ, 0x0024);

    let mut client = AttClient::new(&mut mock);
    let result = client.read_by_type(&Uuid::from_u16(PRIMARY_SERVICE_UUID)).unwrap();

    let handles: Vec<u16> = result.iter().map(|(h, _)| *h).collect();
    assert_eq!(handles, vec![0x0002, 0x0010, 0x0015, 0x0023]);
    assert_eq!(result[0].1, vec![0x00, 0x18]);
    assert_eq!(result[3].1, vec![0x0F, 0x18]);

    assert_eq!(
        sent_ranges(&mock),
        vec![(0x0001, 0xFFFF), (0x0011, 0xFFFF), (0x0024, 0xFFFF)]
    );
    // Every request carries the requested type
    for pdu in &mock.sent {
        assert_eq!(
            ReadByTypeRequest::parse(pdu).unwrap().attribute_type,
            Uuid::Short(PRIMARY_SERVICE_UUID)
        );
    }
}

#[test]
fn test_page_ending_at_last_handle_stops() {
    let mut mock = MockTransport::new();
    mock.queue(&read_by_type_page(&[(0x0100, 0x0001), (0xFFFF, 0x0002)]))
        // Must never be requested
        .queue_not_found(ATT_READ_BY_TYPE_REQ, 0x0001);

    let result = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(mock.sent.len(), 1);
    assert_eq!(mock.pending(), 1);
}

#[test]
fn test_not_found_on_first_request_is_empty() {
    let mut mock = MockTransport::new();
    mock.queue_not_found(ATT_READ_BY_TYPE_REQ, 0x0001);

    let result = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(sent_ranges(&mock), vec![(0x0001, 0xFFFF)]);
}

#[test]
fn test_other_error_code_fails_whole_call() {
    let mut mock = MockTransport::new();
    mock.queue(&read_by_type_page(&[(0x0002, 0x1800)]))
        .queue(&error_response(
            ATT_READ_BY_TYPE_REQ,
            0x0003,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
        ));

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    match err {
        AttError::Protocol {
            request_opcode,
            handle,
            code,
        } => {
            assert_eq!(request_opcode, ATT_READ_BY_TYPE_REQ);
            assert_eq!(handle, 0x0003);
            assert_eq!(code, AttErrorCode::InsufficientAuthentication);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_error_for_other_request_is_desync() {
    let mut mock = MockTransport::new();
    mock.queue_not_found(ATT_FIND_INFO_REQ, 0x0001);

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    assert!(err.is_desynchronized());
    assert!(matches!(
        err,
        AttError::UnexpectedErrorOpcode {
            expected: ATT_READ_BY_TYPE_REQ,
            actual: ATT_FIND_INFO_REQ
        }
    ));
}

#[test]
fn test_unexpected_response_opcode_terminates() {
    let mut mock = MockTransport::new();
    mock.queue(&[ATT_READ_RSP, 0x01, 0x02])
        .queue(&read_by_type_page(&[(0x0002, 0x1800)]));

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    assert!(matches!(
        err,
        AttError::UnexpectedResponse {
            expected: ATT_READ_BY_TYPE_RSP,
            actual: ATT_READ_RSP
        }
    ));
    // No retry after the bad response
    assert_eq!(mock.sent.len(), 1);
    assert_eq!(mock.pending(), 1);
}

#[test]
fn test_primary_services_by_group_type() {
    let mut mock = MockTransport::new();
    mock.queue(&[
        ATT_READ_BY_GROUP_TYPE_RSP,
        0x06,
        0x01, 0x00, 0x05, 0x00, 0x00, 0x18,
        0x06, 0x00, 0x09, 0x00, 0x01, 0x18,
    ])
    .queue_not_found(ATT_READ_BY_GROUP_TYPE_REQ, 0x000A);

    let result = AttClient::new(&mut mock)
        .read_by_group_type(&Uuid::from_u16(PRIMARY_SERVICE_UUID))
        .unwrap();

    assert_eq!(
        result,
        vec![
            (0x0001, 0x0005, Uuid::Short(0x1800)),
            (0x0006, 0x0009, Uuid::Short(0x1801)),
        ]
    );
    assert_eq!(sent_ranges(&mock), vec![(0x0001, 0xFFFF), (0x000A, 0xFFFF)]);
}

#[test]
fn test_find_information_mixed_pages() {
    let full = Uuid::Full([0x42; 16]);
    let mut long_page = vec![ATT_FIND_INFO_RSP, ATT_FIND_INFO_RSP_FORMAT_128BIT, 0x04, 0x00];
    long_page.extend_from_slice(&[0x42; 16]);

    let mut mock = MockTransport::new();
    mock.queue(&[
        ATT_FIND_INFO_RSP,
        ATT_FIND_INFO_RSP_FORMAT_16BIT,
        0x01, 0x00, 0x00, 0x28,
        0x02, 0x00, 0x03, 0x28,
        0x03, 0x00, 0x00, 0x2A,
    ])
    .queue(&long_page)
    .queue_not_found(ATT_FIND_INFO_REQ, 0x0005);

    let result = AttClient::new(&mut mock).find_information().unwrap();

    assert_eq!(
        result,
        vec![
            (0x0001, Uuid::Short(0x2800)),
            (0x0002, Uuid::Short(0x2803)),
            (0x0003, Uuid::Short(0x2A00)),
            (0x0004, full),
        ]
    );
    assert_eq!(
        sent_ranges(&mock),
        vec![(0x0001, 0xFFFF), (0x0004, 0xFFFF), (0x0005, 0xFFFF)]
    );
    assert!(mock.sent.iter().all(|pdu| pdu.len() == 5));
}

#[test]
fn test_transport_failure_mid_discovery() {
    let mut mock = MockTransport::new();
    // Script runs dry after the first page, which the mock reports as a disconnect
    mock.queue(&read_by_type_page(&[(0x0002, 0x1800)]));

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    assert!(matches!(err, AttError::Transport(TransportError::Disconnected)));
    assert_eq!(mock.sent.len(), 2);
}

#[test]
fn test_malformed_page_fails() {
    let mut mock = MockTransport::new();
    mock.queue(&[ATT_READ_BY_TYPE_RSP, 0x04, 0x02, 0x00, 0x00]);

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    assert!(matches!(err, AttError::MalformedPdu(_)));
}

#[test]
fn test_page_before_window_is_rejected() {
    let mut mock = MockTransport::new();
    mock.queue(&read_by_type_page(&[(0x0010, 0x0001)]))
        .queue(&read_by_type_page(&[(0x0008, 0x0002)]));

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::from_u16(0x2A00))
        .unwrap_err();

    assert!(matches!(
        err,
        AttError::WindowRegression {
            start: 0x0011,
            last: 0x0008
        }
    ));
}

#[test]
fn test_mtu_too_small_for_request() {
    let mut mock = MockTransport::new();
    mock.mtu = 20;
    mock.queue_not_found(ATT_READ_BY_TYPE_REQ, 0x0001);

    let err = AttClient::new(&mut mock)
        .read_by_type(&Uuid::Full([0x11; 16]))
        .unwrap_err();

    assert!(matches!(
        err,
        AttError::BufferTooSmall {
            needed: 21,
            available: 20
        }
    ));
    assert!(mock.sent.is_empty());
}

#[test]
fn test_stream_requests_on_demand() {
    let mut mock = MockTransport::new();
    mock.queue(&read_by_type_page(&[(0x0002, 0x1800), (0x0010, 0x1801)]))
        .queue(&read_by_type_page(&[(0x0020, 0x180A)]))
        .queue_not_found(ATT_READ_BY_TYPE_REQ, 0x0021);

    let mut client = AttClient::new(&mut mock);
    {
        let mut stream = client.stream(super::discovery::ReadByType {
            attribute_type: Uuid::from_u16(0x2A00),
        });

        assert_eq!(stream.next().unwrap().unwrap().0, 0x0002);
        assert_eq!(stream.requests(), 1);
        assert_eq!(stream.next().unwrap().unwrap().0, 0x0010);
        assert_eq!(stream.requests(), 1);

        assert_eq!(stream.next().unwrap().unwrap().0, 0x0020);
        assert_eq!(stream.requests(), 2);
        assert_eq!(stream.window().start, 0x0021);

        assert!(stream.next().is_none());
        assert_eq!(stream.requests(), 3);
        assert!(stream.next().is_none());
    }
    assert_eq!(client.transport().pending(), 0);
}

#[test]
fn test_stream_stops_after_error() {
    let mut mock = MockTransport::new();
    mock.queue(&[ATT_READ_RSP]);

    let mut client = AttClient::new(&mut mock);
    let mut stream = client.stream(super::discovery::FindInformation);

    assert!(matches!(
        stream.next(),
        Some(Err(AttError::UnexpectedResponse { .. }))
    ));
    assert!(stream.next().is_none());
    assert_eq!(stream.requests(), 1);
}
