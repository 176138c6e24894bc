//! Server side of the connection phase: initial handshake, client
//! response, authentication, initial database selection.

use rand::Rng;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::context::ServerContext;
use crate::declar::capability_flags::{CapabilityFlags, SERVER_CAPABILITIES};
use crate::declar::status_flags::SERVER_STATUS_AUTOCOMMIT;
use crate::error::{SResult, ServerError};
use crate::packet::err_packet::ErrPacket;
use crate::packet::handshake_packet::{HandshakePacket, SALT_LENGTH};
use crate::packet::handshake_response::HandshakeResponse;
use crate::packet::ok_packet::OkPacket;
use crate::packet::{PacketReader, PacketWriter};

/// Result of a successful connection phase.
#[derive(Debug)]
pub struct HandshakeOutcome {
    pub capabilities: CapabilityFlags,
    pub username: String,
    pub database: Option<String>,
}

/// Fresh 20 random salt bytes per connection; NUL is avoided so the salt
/// survives C-string handling in older clients.
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LENGTH];
    for byte in salt.iter_mut() {
        *byte = rng.gen_range(1..=255u8);
    }
    salt
}

/// Sequence choreography: handshake goes out as packet 0, the client
/// replies with packet 1, our verdict is packet 2.
pub async fn perform_handshake<R, W>(
    reader: &mut PacketReader<R>,
    writer: &mut PacketWriter<W>,
    ctx: &ServerContext,
    connection_id: u32,
    remote_host: &str,
) -> SResult<HandshakeOutcome>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let salt = generate_salt();

    writer.reset_seq();
    let handshake = HandshakePacket::new(
        &ctx.config.server_version,
        connection_id,
        salt,
        SERVER_CAPABILITIES,
        SERVER_STATUS_AUTOCOMMIT,
    );
    writer.write_packet(&handshake.serialize()?).await?;

    reader.set_seq(1);
    let packet = reader.read_packet().await?;
    let response = HandshakeResponse::parse(&packet)?;
    writer.set_seq(reader.expected_seq());

    let capabilities =
        CapabilityFlags::new(SERVER_CAPABILITIES).intersect(response.capabilities);

    let authenticated = ctx.user_manager.validate(
        &response.username,
        &response.auth_response,
        &salt,
        remote_host,
    );
    if !authenticated {
        let err = ServerError::AccessDenied {
            user: response.username.clone(),
            host: remote_host.to_string(),
            using_password: !response.auth_response.is_empty(),
        };
        writer
            .write_packet(&ErrPacket::from_error(&err).serialize()?)
            .await?;
        return Err(err);
    }

    if let Some(database) = &response.database {
        if !ctx.catalog.has_database(database) {
            let err = ServerError::UnknownDatabase(database.clone());
            writer
                .write_packet(&ErrPacket::from_error(&err).serialize()?)
                .await?;
            // unknown initial database terminates the connection phase
            return Err(ServerError::Protocol(format!(
                "unknown initial database '{}'",
                database
            )));
        }
        ctx.executor.set_current_database(database);
    }

    writer
        .write_packet(&OkPacket::new(0, 0, SERVER_STATUS_AUTOCOMMIT).serialize()?)
        .await?;

    debug!(
        "connection {} authenticated as '{}' from {}",
        connection_id, response.username, remote_host
    );

    Ok(HandshakeOutcome {
        capabilities,
        username: response.username,
        database: response.database,
    })
}

#[cfg(test)]
mod test {
    use super::generate_salt;

    #[test]
    fn test_salt_is_fresh_per_connection() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(20, a.len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_avoids_nul() {
        for _ in 0..32 {
            assert!(generate_salt().iter().all(|&b| b != 0));
        }
    }
}
