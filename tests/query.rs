//! Query客户端对本地UDP模拟服务器的端到端测试

use mcwire::utils::write_cstring;
use mcwire::{McWireError, QueryClient, QueryOptions};
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SESSION: i32 = 0x0102_0304;
const TOKEN: &str = "123456";

fn options() -> QueryOptions {
    QueryOptions::default()
        .with_timeout(Duration::from_secs(2))
        .with_session_id(SESSION)
}

fn full_stat_kv(online: &str, max: &str) -> Vec<u8> {
    let mut data = Vec::new();
    for (k, v) in [
        ("hostname", "A Minecraft Server"),
        ("gametype", "SMP"),
        ("game_id", "MINECRAFT"),
        ("version", "1.20.4"),
        ("plugins", ""),
        ("map", "world"),
        ("numplayers", online),
        ("maxplayers", max),
        ("hostport", "25565"),
        ("hostip", "127.0.0.1"),
    ] {
        write_cstring(&mut data, k);
        write_cstring(&mut data, v);
    }
    data
}

fn players_section(names: &[&str]) -> Vec<u8> {
    let mut data = b"\0\x01player_\0\0".to_vec();
    for name in names {
        write_cstring(&mut data, name);
    }
    data.push(0);
    data
}

fn response(kind: u8, session: i32, body: &[u8]) -> Vec<u8> {
    let mut packet = vec![kind];
    packet.extend_from_slice(&session.to_be_bytes());
    packet.extend_from_slice(body);
    packet
}

/// 接收一个请求并检查其头部，返回载荷与来源地址
fn expect_request(socket: &UdpSocket, kind: u8) -> (Vec<u8>, SocketAddr) {
    let mut buf = [0u8; 1500];
    let (n, peer) = socket.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..2], &[0xFE, 0xFD]);
    assert_eq!(buf[2], kind);
    assert_eq!(i32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]), SESSION);
    (buf[7..n].to_vec(), peer)
}

/// 完成握手后把 `fragments` 依次发回
fn spawn_server(fragments: Vec<Vec<u8>>, reply_session: i32) -> (SocketAddr, JoinHandle<()>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (payload, peer) = expect_request(&socket, 9);
        assert!(payload.is_empty());
        let mut token = TOKEN.as_bytes().to_vec();
        token.push(0);
        socket.send_to(&response(9, SESSION, &token), peer).unwrap();

        let (payload, peer) = expect_request(&socket, 0);
        assert_eq!(&payload[..4], &123456i32.to_be_bytes());
        assert_eq!(&payload[4..], &[0xFF, 0xFF, 0xFF, 0x01]);
        for fragment in fragments {
            socket
                .send_to(&response(0, reply_session, &fragment), peer)
                .unwrap();
        }
    });
    (addr, handle)
}

#[test]
fn test_session_id_high_nibbles_masked() {
    let masked = QueryOptions::default().with_session_id(0x7FFF_FFFF);
    let client = QueryClient::connect("127.0.0.1:25565", masked).unwrap();
    assert_eq!(client.session_id(), 0x0F0F_0F0F);

    let client = QueryClient::connect("127.0.0.1:25565", options()).unwrap();
    assert_eq!(client.session_id(), SESSION);
}

#[test]
fn test_full_stat_single_fragment() {
    let mut body = b"splitnum\0\x80\0".to_vec();
    body.extend_from_slice(&full_stat_kv("0", "20"));
    body.extend_from_slice(&players_section(&[]));

    let (addr, server) = spawn_server(vec![body], SESSION);
    let mut client = QueryClient::connect(addr, options()).unwrap();
    let stat = client.full_stat().unwrap();
    server.join().unwrap();

    assert_eq!(client.token(), Some(123456));
    assert_eq!(stat.players, (0, 20));
    assert_eq!(stat.motd, "A Minecraft Server");
    assert_eq!(stat.version, "1.20.4");
    assert!(stat.player_names.is_empty());
}

#[test]
fn test_full_stat_fragmented() {
    let mut whole = full_stat_kv("2", "10");
    whole.extend_from_slice(&players_section(&["alice", "bob"]));
    let (first, second) = whole.split_at(whole.len() / 2);

    let mut fragment0 = b"splitnum\0\x00\x00".to_vec();
    fragment0.extend_from_slice(first);
    let mut fragment1 = b"splitnum\0\x81\x01".to_vec();
    fragment1.extend_from_slice(second);

    let (addr, server) = spawn_server(vec![fragment0, fragment1], SESSION);
    let mut client = QueryClient::connect(addr, options()).unwrap();
    let stat = client.full_stat().unwrap();
    server.join().unwrap();

    assert_eq!(stat.players, (2, 10));
    assert_eq!(stat.player_names, vec!["alice", "bob"]);
}

#[test]
fn test_session_mismatch_rejected() {
    let mut body = b"splitnum\0\x80\0".to_vec();
    body.extend_from_slice(&full_stat_kv("0", "20"));
    body.extend_from_slice(&players_section(&[]));

    let (addr, server) = spawn_server(vec![body], 0x0505_0505);
    let mut client = QueryClient::connect(addr, options()).unwrap();
    let err = client.full_stat().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, McWireError::QueryProtocol(_)), "{err:?}");
}

#[test]
fn test_basic_stat() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (_, peer) = expect_request(&socket, 9);
        socket.send_to(&response(9, SESSION, b"-42\0"), peer).unwrap();

        let (payload, peer) = expect_request(&socket, 0);
        assert_eq!(payload, (-42i32).to_be_bytes());
        let mut body = Vec::new();
        for v in ["A Minecraft Server", "SMP", "world", "3", "20"] {
            write_cstring(&mut body, v);
        }
        body.extend_from_slice(&25565u16.to_le_bytes());
        write_cstring(&mut body, "127.0.0.1");
        socket.send_to(&response(0, SESSION, &body), peer).unwrap();
    });

    let mut client = QueryClient::connect(addr, options()).unwrap();
    let stat = client.basic_stat().unwrap();
    server.join().unwrap();

    assert_eq!(client.token(), Some(-42));
    assert_eq!(stat.players, (3, 20));
    assert_eq!(stat.map, "world");
}

#[test]
fn test_silent_server_times_out() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();

    let mut client = QueryClient::connect(
        addr,
        QueryOptions::default().with_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let err = client.handshake().unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
    drop(socket);
}
