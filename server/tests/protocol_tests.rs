//! End-to-end protocol conversations over in-memory duplex streams, plus
//! one real TCP round through the accept loop.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Notify;

use common::config::ServerConfig;

use server::context::native_password_token;
use server::conn::Connection;
use server::declar::capability_flags::{
    CLIENT_CONNECT_WITH_DB, CLIENT_DEPRECATE_EOF, CLIENT_MULTI_RESULTS, CLIENT_MULTI_STATEMENTS,
    CLIENT_PLUGIN_AUTH, CLIENT_PROTOCOL_41, CLIENT_SECURE_CONNECTION, CLIENT_TRANSACTIONS,
};
use server::packet::err_packet::ErrPacket;
use server::packet::handshake_packet::HandshakePacket;
use server::packet::handshake_response::HandshakeResponse;
use server::packet::ok_packet::{EofPacket, OkPacket};
use server::packet::{PacketReader, PacketWriter};
use server::ServerContext;

const MODERN_CAPS: u32 = CLIENT_PROTOCOL_41
    | CLIENT_CONNECT_WITH_DB
    | CLIENT_SECURE_CONNECTION
    | CLIENT_PLUGIN_AUTH
    | CLIENT_TRANSACTIONS
    | CLIENT_MULTI_STATEMENTS
    | CLIENT_MULTI_RESULTS
    | CLIENT_DEPRECATE_EOF;

const LEGACY_CAPS: u32 = CLIENT_PROTOCOL_41
    | CLIENT_CONNECT_WITH_DB
    | CLIENT_SECURE_CONNECTION
    | CLIENT_PLUGIN_AUTH
    | CLIENT_TRANSACTIONS;

struct TestClient<S> {
    reader: PacketReader<ReadHalf<S>>,
    writer: PacketWriter<WriteHalf<S>>,
}

impl<S: AsyncRead + AsyncWrite> TestClient<S> {
    fn new(stream: S) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        TestClient {
            reader: PacketReader::new(read_half),
            writer: PacketWriter::new(write_half),
        }
    }

    /// Full connection phase; panics on an unexpected reply.
    async fn connect(&mut self, caps: u32, user: &str, password: &str, db: Option<&str>) {
        let packet = self.authenticate(caps, user, password, db).await;
        assert_eq!(0x00, packet[0], "expected OK after auth: {:?}", packet);
    }

    /// Connection phase up to the server's verdict packet.
    async fn authenticate(
        &mut self,
        caps: u32,
        user: &str,
        password: &str,
        db: Option<&str>,
    ) -> Vec<u8> {
        let handshake = HandshakePacket::parse(&self.reader.read_packet().await.unwrap()).unwrap();
        assert_eq!(20, handshake.salt.len());

        let auth_response = if password.is_empty() {
            vec![]
        } else {
            native_password_token(password, &handshake.salt)
        };
        let response = HandshakeResponse {
            capabilities: caps,
            max_packet_size: 1 << 24,
            charset: 255,
            username: user.to_string(),
            auth_response,
            database: db.map(|s| s.to_string()),
        };
        self.writer.set_seq(1);
        self.writer
            .write_packet(&response.serialize().unwrap())
            .await
            .unwrap();

        // the server's verdict continues the conversation at seq 2
        self.reader.set_seq(self.writer.sequence());
        self.reader.read_packet().await.unwrap()
    }

    async fn command(&mut self, code: u8, body: &[u8]) {
        self.reader.reset_seq();
        self.writer.reset_seq();
        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(code);
        payload.extend_from_slice(body);
        self.writer.write_packet(&payload).await.unwrap();
        self.reader.set_seq(self.writer.sequence());
    }

    async fn query(&mut self, sql: &str) {
        self.command(0x03, sql.as_bytes()).await;
    }

    async fn read(&mut self) -> Vec<u8> {
        self.reader.read_packet().await.unwrap()
    }
}

fn context() -> ServerContext {
    ServerContext::in_memory(ServerConfig::default(), "root", "secret")
}

fn spawn_connection(ctx: ServerContext) -> TestClient<tokio::io::DuplexStream> {
    let (client_stream, server_stream) = tokio::io::duplex(1 << 20);
    let close = Arc::new(Notify::new());
    tokio::spawn(async move {
        let mut connection = Connection::new(server_stream, ctx, 1, "127.0.0.1:4321", close);
        let _ = connection.run().await;
    });
    TestClient::new(client_stream)
}

async fn modern_client() -> TestClient<tokio::io::DuplexStream> {
    let mut client = spawn_connection(context());
    client
        .connect(MODERN_CAPS, "root", "secret", Some("mysql"))
        .await;
    client
}

// ------------------------------------------------------------ scenarios

#[tokio::test]
async fn test_s1_select_one() {
    let mut client = modern_client().await;

    client.query("SELECT 1").await;

    // column count = 1
    assert_eq!(vec![0x01], client.read().await);

    // column definition: catalog "def", name "1", type code 3
    let column_def = client.read().await;
    assert_eq!(&[3, b'd', b'e', b'f'], &column_def[..4]);
    let marker = column_def.iter().position(|&b| b == 0x0C).unwrap();
    assert_eq!(3, column_def[marker + 7]);
    assert!(column_def.windows(2).any(|w| w == [1, b'1']));

    // no EOF between columns and rows in DeprecateEof mode; row follows
    let row = client.read().await;
    assert_eq!(vec![0x01, b'1'], row);

    // terminator is an OK dressed as 0xFE
    let terminator = client.read().await;
    assert_eq!(0xFE, terminator[0]);
    assert!(terminator.len() >= 7);
}

#[tokio::test]
async fn test_s1_legacy_eof_mode() {
    let mut client = spawn_connection(context());
    client.connect(LEGACY_CAPS, "root", "secret", None).await;

    client.query("SELECT 1").await;
    assert_eq!(vec![0x01], client.read().await);
    let _column_def = client.read().await;

    // legacy mode: classical 5-byte EOF after column definitions
    let eof = client.read().await;
    assert_eq!(5, eof.len());
    assert_eq!(0xFE, eof[0]);
    assert!(EofPacket::is_eof(&eof));

    let _row = client.read().await;
    let terminator = client.read().await;
    assert_eq!(5, terminator.len());
    assert_eq!(0xFE, terminator[0]);
}

#[tokio::test]
async fn test_s2_create_table() {
    let mut client = modern_client().await;

    client
        .query("CREATE TABLE t(id INT PRIMARY KEY, name VARCHAR(32))")
        .await;
    let packet = client.read().await;
    assert_eq!(0x00, packet[0]);
    let ok = OkPacket::parse(&packet).unwrap();
    assert_eq!(0, ok.affected_rows);
}

#[tokio::test]
async fn test_s3_insert_two_rows() {
    let mut client = modern_client().await;

    client
        .query("CREATE TABLE t(id INT PRIMARY KEY, name VARCHAR(32))")
        .await;
    client.read().await;

    client.query("INSERT INTO t VALUES (1,'a'),(2,'b')").await;
    let ok = OkPacket::parse(&client.read().await).unwrap();
    assert_eq!(2, ok.affected_rows);
}

#[tokio::test]
async fn test_s4_syntax_error_then_recovery() {
    let mut client = modern_client().await;

    client.query("SELEC 1").await;
    let packet = client.read().await;
    let err = ErrPacket::parse(&packet).unwrap();
    assert_eq!(1064, err.error_code);
    assert_eq!("42000", err.sql_state);
    assert!(err.message.contains("Unexpected token: SELEC"), "{}", err.message);

    // the connection survives the statement failure
    client.command(0x0E, &[]).await; // COM_PING
    assert_eq!(0x00, client.read().await[0]);
}

#[tokio::test]
async fn test_s5_multi_packet_query() {
    let mut client = modern_client().await;

    client.query("CREATE TABLE big(v TEXT)").await;
    client.read().await;

    // payload spans two wire packets (> 16 MiB)
    let blob = "a".repeat((1 << 24) + 100);
    let sql = format!("INSERT INTO big VALUES ('{}')", blob);
    assert!(sql.len() > 0xFF_FFFF);

    client.query(&sql).await;
    let ok = OkPacket::parse(&client.read().await).unwrap();
    assert_eq!(1, ok.affected_rows);
}

#[tokio::test]
async fn test_s6_quit_closes_connection() {
    let mut client = modern_client().await;

    client.command(0x01, &[]).await; // COM_QUIT
    // no response; the stream just ends
    assert!(client.reader.read_packet().await.is_err());
}

// ------------------------------------------------------- other behavior

#[tokio::test]
async fn test_access_denied() {
    let mut client = spawn_connection(context());
    let packet = client
        .authenticate(MODERN_CAPS, "root", "wrong", None)
        .await;
    let err = ErrPacket::parse(&packet).unwrap();
    assert_eq!(1045, err.error_code);
    assert_eq!("28000", err.sql_state);
    assert!(err.message.contains("using password: YES"));
}

#[tokio::test]
async fn test_unknown_initial_database() {
    let mut client = spawn_connection(context());
    let packet = client
        .authenticate(MODERN_CAPS, "root", "secret", Some("nope"))
        .await;
    let err = ErrPacket::parse(&packet).unwrap();
    assert_eq!(1049, err.error_code);
    assert_eq!("42000", err.sql_state);
}

#[tokio::test]
async fn test_init_db_command() {
    let mut client = modern_client().await;

    // unknown database: error 1049, connection survives
    client.command(0x02, b"missing").await;
    let err = ErrPacket::parse(&client.read().await).unwrap();
    assert_eq!(1049, err.error_code);

    client.command(0x02, b"mysql").await;
    assert_eq!(0x00, client.read().await[0]);
}

#[tokio::test]
async fn test_field_list() {
    let mut client = modern_client().await;

    client.query("CREATE TABLE t(id INT, name VARCHAR(10))").await;
    client.read().await;

    let mut body = b"t".to_vec();
    body.push(0);
    body.extend_from_slice(b"%");
    client.command(0x04, &body).await;

    // one column definition per column, then the 0xFE terminator
    let first = client.read().await;
    assert_eq!(&[3, b'd', b'e', b'f'], &first[..4]);
    let second = client.read().await;
    assert_eq!(&[3, b'd', b'e', b'f'], &second[..4]);
    let terminator = client.read().await;
    assert_eq!(0xFE, terminator[0]);

    // unknown table: 1146 / 42S02
    let mut body = b"ghost".to_vec();
    body.push(0);
    client.command(0x04, &body).await;
    let err = ErrPacket::parse(&client.read().await).unwrap();
    assert_eq!(1146, err.error_code);
    assert_eq!("42S02", err.sql_state);
}

#[tokio::test]
async fn test_statistics_ping_reset() {
    let mut client = modern_client().await;

    client.command(0x09, &[]).await; // COM_STATISTICS
    let stats = String::from_utf8(client.read().await).unwrap();
    assert!(stats.contains("Uptime:"), "{}", stats);

    client.command(0x0E, &[]).await; // COM_PING
    assert_eq!(0x00, client.read().await[0]);

    client.command(0x19, &[]).await; // COM_RESET_CONNECTION
    assert_eq!(0x00, client.read().await[0]);

    client.command(0x11, &[]).await; // COM_CHANGE_USER no-op
    assert_eq!(0x00, client.read().await[0]);
}

#[tokio::test]
async fn test_unknown_command() {
    let mut client = modern_client().await;

    client.command(0x77, &[]).await;
    let err = ErrPacket::parse(&client.read().await).unwrap();
    assert_eq!(1047, err.error_code);
    assert_eq!("08S01", err.sql_state);

    // still alive
    client.command(0x0E, &[]).await;
    assert_eq!(0x00, client.read().await[0]);
}

#[tokio::test]
async fn test_empty_query_sends_ok() {
    let mut client = modern_client().await;

    client.query("   \n\t").await;
    assert_eq!(0x00, client.read().await[0]);
}

#[tokio::test]
async fn test_multi_statements_and_set_option() {
    let mut client = modern_client().await;

    client.query("SELECT 1; SELECT 2").await;
    // first result set, MORE_RESULTS set on its terminator
    assert_eq!(vec![0x01], client.read().await);
    client.read().await; // column def
    client.read().await; // row
    let terminator = OkPacket::parse(&client.read().await).unwrap();
    assert_ne!(0, terminator.status_flags & 0x0008);

    // second result set
    assert_eq!(vec![0x01], client.read().await);
    client.read().await;
    client.read().await;
    let terminator = OkPacket::parse(&client.read().await).unwrap();
    assert_eq!(0, terminator.status_flags & 0x0008);

    // COM_SET_OPTION 1 disables multi-statements
    client.command(0x1B, &[1, 0]).await;
    assert_eq!(0xFE, client.read().await[0]);

    client.query("SELECT 1; SELECT 2").await;
    let err = ErrPacket::parse(&client.read().await).unwrap();
    assert_eq!(1064, err.error_code);

    // and 0 turns them back on
    client.command(0x1B, &[0, 0]).await;
    assert_eq!(0xFE, client.read().await[0]);
    client.query("SELECT 1; SELECT 2").await;
    assert_eq!(vec![0x01], client.read().await);
}

#[tokio::test]
async fn test_transaction_status_flag() {
    let mut client = modern_client().await;

    client.query("BEGIN").await;
    let ok = OkPacket::parse(&client.read().await).unwrap();
    assert_ne!(0, ok.status_flags & 0x0001, "IN_TRANS after BEGIN");

    client.query("COMMIT").await;
    let ok = OkPacket::parse(&client.read().await).unwrap();
    assert_eq!(0, ok.status_flags & 0x0001);
}

#[tokio::test]
async fn test_kill_is_acknowledged() {
    let mut client = modern_client().await;

    client.query("KILL 99").await;
    assert_eq!(0x00, client.read().await[0]);
}

// --------------------------------------------------------- over real TCP

#[tokio::test]
async fn test_tcp_accept_loop_and_max_clients() {
    use common::server::Server;
    use server::CyscaleServer;

    let mut config = ServerConfig::default();
    config.bind_address = "127.0.0.1".to_string();
    config.port = 0;
    config.max_clients = 1;
    let ctx = ServerContext::in_memory(config, "root", "secret");

    let mut cyscale = CyscaleServer::new(ctx);
    cyscale.bind().unwrap();
    let addr = cyscale.local_addr().unwrap();
    let shutdown = cyscale.shutdown_sender();

    let server_task = tokio::spawn(async move {
        let _ = cyscale.start().await;
        cyscale
    });

    // first client connects and speaks the protocol
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut client = TestClient::new(stream);
    client.connect(MODERN_CAPS, "root", "secret", None).await;
    client.command(0x0E, &[]).await;
    assert_eq!(0x00, client.read().await[0]);

    // second client is over the cap and gets 1040 before the close
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut refused = TestClient::new(stream);
    let packet = refused.reader.read_packet().await.unwrap();
    let err = ErrPacket::parse(&packet).unwrap();
    assert_eq!(1040, err.error_code);
    assert_eq!("08004", err.sql_state);

    client.command(0x01, &[]).await;
    shutdown.send(true).unwrap();
    let mut cyscale = server_task.await.unwrap();
    cyscale.shutdown(true).await.unwrap();
}
