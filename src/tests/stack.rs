use crate::adapter::{Adapter, Error, Reason};
use crate::stack::LinkId;
use crate::tests::mock::{MockSerial, MockTimer};
use alloc::string::ToString;
use alloc::vec;
use std::sync::{Arc, Mutex};

type AdapterType = Adapter<MockSerial, MockTimer, 1_000_000>;

#[test]
fn test_set_multiple_connections() {
    let mut serial = MockSerial::new();
    serial.add_ok_response(b"AT+CIPMUX=1\r\n");
    serial.add_ok_response(b"AT+CIPMUX=0\r\n");

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.set_multiple_connections(true).unwrap();
    adapter.set_multiple_connections(false).unwrap();

    adapter.transport.assert_all_responses_requested();
}

#[test]
fn test_set_multiple_connections_error() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPMUX=1\r\n", &[b"link is builded\r\n\r\nERROR\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    let error = adapter.set_multiple_connections(true).unwrap_err();

    assert_eq!(Error::CommandFailed(Reason::Rejected), error);
}

#[test]
fn test_connect_correct_command() {
    let durations = Arc::new(Mutex::new(vec![]));
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSTART=\"TCP\",\"10.0.0.1\",80\r\n", &[b"CONNECT\r\n\r\nOK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::recording(durations.clone())).unwrap();
    adapter.connect("10.0.0.1", 80).unwrap();

    assert_eq!(
        "AT+CIPSTART=\"TCP\",\"10.0.0.1\",80\r\n".to_string(),
        adapter.transport.get_written_as_string()
    );
    assert_eq!(vec![10_000u32], *durations.lock().unwrap());
}

#[test]
fn test_connect_link_correct_command() {
    let mut serial = MockSerial::new();
    serial.add_response(
        b"AT+CIPSTART=3,\"TCP\",\"example.com\",443\r\n",
        &[b"3,CONNECT\r\n", b"\r\nOK\r\n"],
    );

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.connect_link(LinkId::new(3).unwrap(), "example.com", 443).unwrap();
}

#[test]
fn test_connect_error() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSTART=\"TCP\",\"10.0.0.1\",80\r\n", &[b"ERROR\r\nCLOSED\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    let error = adapter.connect("10.0.0.1", 80).unwrap_err();

    assert_eq!(Error::CommandFailed(Reason::Rejected), error);
}

#[test]
fn test_connect_already_connected() {
    let mut serial = MockSerial::new();
    serial.add_response(
        b"AT+CIPSTART=0,\"TCP\",\"10.0.0.1\",80\r\n",
        &[b"ALREADY CONNECTED\r\n\r\nERROR\r\n"],
    );

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.connect_link(LinkId::new(0).unwrap(), "10.0.0.1", 80).unwrap();
}

#[test]
fn test_connect_timeout() {
    let mut adapter: AdapterType = Adapter::new(MockSerial::new(), MockTimer::expiring(8)).unwrap();
    let error = adapter.connect("10.0.0.1", 80).unwrap_err();

    assert_eq!(Error::CommandFailed(Reason::Timeout), error);
}

#[test]
fn test_close_correct_command() {
    let durations = Arc::new(Mutex::new(vec![]));
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPCLOSE\r\n", &[b"CLOSED\r\n\r\nOK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::recording(durations.clone())).unwrap();
    adapter.close().unwrap();

    assert_eq!("AT+CIPCLOSE\r\n".to_string(), adapter.transport.get_written_as_string());
    assert_eq!(vec![5_000u32], *durations.lock().unwrap());
}

#[test]
fn test_close_not_connected() {
    let mut serial = MockSerial::new();
    serial.add_error_response(b"AT+CIPCLOSE\r\n");

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::expiring(5)).unwrap();
    let error = adapter.close().unwrap_err();

    assert_eq!(Error::CommandFailed(Reason::Timeout), error);
}

#[test]
fn test_close_link_correct_command() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPCLOSE=1\r\n", &[b"1,CLOSED\r\n\r\nOK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.close_link(LinkId::new(1).unwrap()).unwrap();

    assert_eq!("AT+CIPCLOSE=1\r\n".to_string(), adapter.transport.get_written_as_string());
}

#[test]
fn test_close_link_already_closed() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPCLOSE=4\r\n", &[b"link is not valid\r\n\r\nERROR\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.close_link(LinkId::new(4).unwrap()).unwrap();
}

#[test]
fn test_close_link_timeout() {
    let mut adapter: AdapterType = Adapter::new(MockSerial::new(), MockTimer::expiring(2)).unwrap();
    let error = adapter.close_link(LinkId::new(2).unwrap()).unwrap_err();

    assert_eq!(Error::CommandFailed(Reason::Timeout), error);
}

#[test]
fn test_send_link_exact_bytes() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2,2\r\n", &[b">"]);
    serial.add_response(&[0x41, 0x42], &[b"SEND OK"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.send_link(LinkId::new(2).unwrap(), &[0x41, 0x42]).unwrap();

    assert_eq!(b"AT+CIPSEND=2,2\r\nAB", adapter.transport.get_written());
    adapter.transport.assert_all_responses_requested();
}

#[test]
fn test_send_correct_sequence() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=6\r\n", &[b"AT+CIPSEND=6\r\n\r\nOK\r\n", b"> "]);
    serial.add_response(b"hallo!", &[b"\r\nRecv 6 bytes\r\n", b"", b"\r\nSEND OK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.send(b"hallo!").unwrap();

    assert_eq!(
        "AT+CIPSEND=6\r\nhallo!".to_string(),
        adapter.transport.get_written_as_string()
    );
}

#[test]
fn test_send_binary_data_unaltered() {
    let data = [0x00, 0x0D, 0x0A, 0x3E, 0xFF, 0x00];
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=0,6\r\n", &[b"\r\nOK\r\n> "]);
    serial.add_response(&data, &[b"\r\nSEND OK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    adapter.send_link(LinkId::new(0).unwrap(), &data).unwrap();

    let written = adapter.transport.get_written();
    assert_eq!(b"AT+CIPSEND=0,6\r\n", &written[..16]);
    assert_eq!(&data, &written[16..]);
}

#[test]
fn test_send_prompt_reply_not_attributed_to_confirmation() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2\r\n", &[b"\r\nOK\r\n> SEND OK"]);
    serial.add_response(b"AB", &[b"\r\nSEND FAIL\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    let error = adapter.send(b"AB").unwrap_err();

    assert_eq!(Error::SendFailed(Reason::Rejected), error);
}

#[test]
fn test_send_timeouts() {
    let durations = Arc::new(Mutex::new(vec![]));
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2\r\n", &[b">"]);
    serial.add_response(b"AB", &[b"SEND OK"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::recording(durations.clone())).unwrap();
    adapter.send(b"AB").unwrap();
    assert_eq!(vec![5_000u32, 10_000], *durations.lock().unwrap());
}

#[test]
fn test_send_custom_timeouts() {
    let durations = Arc::new(Mutex::new(vec![]));
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2\r\n", &[b">"]);
    serial.add_response(b"AB", &[b"SEND OK"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::recording(durations.clone())).unwrap();
    adapter.set_send_timeout_ms(500, 2_000);
    adapter.send(b"AB").unwrap();
    assert_eq!(vec![500u32, 2_000], *durations.lock().unwrap());
}

#[test]
fn test_send_prompt_timeout() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2\r\n", &[b"\r\nOK\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::expiring(5)).unwrap();
    let error = adapter.send(b"AB").unwrap_err();

    assert_eq!(Error::TransmissionStartFailed(Reason::Timeout), error);
    assert!(error.is_timeout());

    // No data was transmitted
    assert_eq!("AT+CIPSEND=2\r\n".to_string(), adapter.transport.get_written_as_string());
}

#[test]
fn test_send_prompt_error() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=1,2\r\n", &[b"link is not valid\r\n\r\nERROR\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::endless()).unwrap();
    let error = adapter.send_link(LinkId::new(1).unwrap(), b"AB").unwrap_err();

    assert_eq!(Error::TransmissionStartFailed(Reason::Rejected), error);
    assert_eq!("AT+CIPSEND=1,2\r\n".to_string(), adapter.transport.get_written_as_string());
}

#[test]
fn test_send_confirmation_timeout() {
    let mut serial = MockSerial::new();
    serial.add_response(b"AT+CIPSEND=2\r\n", &[b">"]);
    serial.add_response(b"AB", &[b"\r\nRecv 2 bytes\r\n"]);

    let mut adapter: AdapterType = Adapter::new(serial, MockTimer::expiring(5)).unwrap();
    let error = adapter.send(b"AB").unwrap_err();

    assert_eq!(Error::SendFailed(Reason::Timeout), error);

    // Data is not retracted
    assert_eq!("AT+CIPSEND=2\r\nAB".to_string(), adapter.transport.get_written_as_string());
}

#[test]
fn test_send_write_error() {
    let mut adapter: AdapterType = Adapter::new(MockSerial::new(), MockTimer::endless()).unwrap();
    adapter.transport.fail_writes();

    let error = adapter.send(b"AB").unwrap_err();
    assert_eq!(Error::WriteError(embedded_io::ErrorKind::Other), error);
}
