use num_enum::{IntoPrimitive, TryFromPrimitive};

/// COM_* codes this server dispatches on; the first payload byte of every
/// client packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandType {
    Quit = 0x01,
    InitDb = 0x02,
    Query = 0x03,
    FieldList = 0x04,
    Statistics = 0x09,
    Ping = 0x0E,
    ChangeUser = 0x11,
    ResetConnection = 0x19,
    SetOption = 0x1B,
}
