//! RCON客户端对本地TCP模拟服务器的端到端测试

use mcwire::rcon::{
    read_packet, write_packet, RconPacket, MAX_RESPONSE_FRAGMENT, TYPE_AUTH_RESPONSE,
    TYPE_COMMAND, TYPE_LOGIN, TYPE_RESPONSE,
};
use mcwire::{McWireError, RconClient, RconOptions};
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const PASSWORD: &str = "hunter2";

fn options() -> RconOptions {
    RconOptions::default().with_timeout(Duration::from_secs(2))
}

/// 处理认证；密码错误时回应 -1
fn handle_login(stream: &mut TcpStream) -> bool {
    let login = read_packet(stream).unwrap();
    assert_eq!(login.kind, TYPE_LOGIN);
    let ok = login.payload == PASSWORD.as_bytes();
    let id = if ok { login.request_id } else { -1 };
    write_packet(stream, &RconPacket::new(id, TYPE_AUTH_RESPONSE, "")).unwrap();
    ok
}

/// 认证后把 `respond` 返回的各分片作为命令输出发回
fn spawn_server<F>(respond: F) -> (SocketAddr, JoinHandle<()>)
where
    F: Fn(&str) -> Vec<Vec<u8>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        if !handle_login(&mut stream) {
            return;
        }
        while let Ok(request) = read_packet(&mut stream) {
            assert_eq!(request.kind, TYPE_COMMAND);
            let command = String::from_utf8(request.payload).unwrap();
            // 所有分片一次写出
            let mut wire = Vec::new();
            for chunk in respond(&command) {
                write_packet(&mut wire, &RconPacket::new(request.request_id, TYPE_RESPONSE, chunk))
                    .unwrap();
            }
            stream.write_all(&wire).unwrap();
        }
    });
    (addr, handle)
}

#[test]
fn test_authenticate_and_command() {
    let (addr, server) = spawn_server(|command| {
        assert_eq!(command, "list");
        vec![b"There are 0 of a max of 20 players online: ".to_vec()]
    });

    let mut client = RconClient::connect(addr, options()).unwrap();
    client.authenticate(PASSWORD).unwrap();
    assert!(client.is_authenticated());
    let output = client.command("list").unwrap();
    assert_eq!(output, "There are 0 of a max of 20 players online: ");

    client.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_wrong_password() {
    let (addr, server) = spawn_server(|_| Vec::new());

    let mut client = RconClient::connect(addr, options()).unwrap();
    let err = client.authenticate("wrong").unwrap_err();
    assert!(matches!(err, McWireError::RconAuth(_)), "{err:?}");
    assert!(!client.is_authenticated());
    server.join().unwrap();
}

#[test]
fn test_command_before_authentication() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut client = RconClient::connect(listener.local_addr().unwrap(), options()).unwrap();
    let err = client.command("list").unwrap_err();
    assert!(matches!(err, McWireError::RconProtocol(_)), "{err:?}");
}

#[test]
fn test_full_fragment_is_followed() {
    let (addr, server) = spawn_server(|_| {
        vec![vec![b'a'; MAX_RESPONSE_FRAGMENT], b"tail".to_vec()]
    });

    let mut client = RconClient::connect(addr, options()).unwrap();
    client.authenticate(PASSWORD).unwrap();
    let output = client.command("help").unwrap();
    assert_eq!(output.len(), MAX_RESPONSE_FRAGMENT + 4);
    assert!(output.ends_with("aaatail"));

    client.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_exactly_full_reply_ends_on_timeout() {
    let (addr, server) = spawn_server(|_| vec![vec![b'b'; MAX_RESPONSE_FRAGMENT]]);

    let mut client = RconClient::connect(
        addr,
        RconOptions::default().with_timeout(Duration::from_millis(300)),
    )
    .unwrap();
    client.authenticate(PASSWORD).unwrap();
    let output = client.command("help").unwrap();
    assert_eq!(output.len(), MAX_RESPONSE_FRAGMENT);
    assert!(output.bytes().all(|b| b == b'b'));

    client.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_pending_fragments_concatenated() {
    let (addr, server) = spawn_server(|_| {
        vec![b"first ".to_vec(), b"second ".to_vec(), b"third".to_vec()]
    });

    let mut client = RconClient::connect(addr, options()).unwrap();
    client.authenticate(PASSWORD).unwrap();
    assert_eq!(client.command("seed").unwrap(), "first second third");

    client.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_sequential_commands_use_fresh_ids() {
    let (addr, server) = spawn_server(|command| vec![format!("ran {}", command).into_bytes()]);

    let mut client = RconClient::connect(addr, options()).unwrap();
    client.authenticate(PASSWORD).unwrap();
    assert_eq!(client.command("time set day").unwrap(), "ran time set day");
    assert_eq!(client.command("weather clear").unwrap(), "ran weather clear");

    client.close().unwrap();
    server.join().unwrap();
}
