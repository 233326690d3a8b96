use serde::{Deserialize, Serialize};

use crate::bus::WordSize;
use crate::error::{Result, WireError};

/// Width of the leading packet type tag.
pub const TYPE_BITS: usize = 8;

/// Upper bound on a single packet's size, type tag included.
pub const MAX_PACKET_BITS: usize = 1024;

/// Packet scratch-buffer size. The word count rounds up, so a
/// maximum-size packet can pad out to one extra word of the widest
/// width on the bus.
pub(crate) const PADDED_PACKET_BYTES: usize = (MAX_PACKET_BITS + 64) / 8;

/// Width of the inline short-data field of a write packet.
pub const SHORT_DATA_BITS: usize = 256;

/// Full write payload width; bits beyond [`SHORT_DATA_BITS`] travel as
/// trailing extra-data words.
pub const MAX_PAYLOAD_BITS: usize = 512;

/// Built-in packet names.
pub mod packets {
    // master -> satellite
    pub const ECHO_REQUEST: &str = "echo_request";
    pub const SET_TIME: &str = "set_time";
    pub const RESET: &str = "reset";
    pub const WRITE: &str = "write";
    pub const FIFO_SPACE_REQUEST: &str = "fifo_space_request";

    // satellite -> master
    pub const ECHO_REPLY: &str = "echo_reply";
    pub const FIFO_SPACE_REPLY: &str = "fifo_space_reply";
    pub const ERROR: &str = "error";
}

/// Error codes carried in `error` packets and local notifications.
///
/// The `*_LOCAL` pair is raised by the master core itself; codes reported
/// by the satellite inside `error` packets are relayed verbatim.
pub mod error_code {
    pub const UNKNOWN_TYPE_LOCAL: u8 = 0;
    pub const UNKNOWN_TYPE_REMOTE: u8 = 1;
    pub const TRUNCATED_LOCAL: u8 = 2;
    pub const TRUNCATED_REMOTE: u8 = 3;
}

/// One named bit field of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub width: usize,
}

impl FieldDef {
    fn new(name: &str, width: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
        }
    }
}

/// Field table for one packet type.
///
/// Fields are packed LSB-first in declaration order, after the 8-bit type
/// tag; offsets are derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketLayout {
    pub name: String,
    pub type_id: u8,
    pub fields: Vec<FieldDef>,
}

impl PacketLayout {
    /// Bit offset of a field from the start of the packet (tag included).
    pub fn field_offset(&self, field: &str) -> Option<usize> {
        let mut offset = TYPE_BITS;
        for def in &self.fields {
            if def.name == field {
                return Some(offset);
            }
            offset += def.width;
        }
        None
    }

    /// Declared width of a field in bits.
    pub fn field_width(&self, field: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|def| def.name == field)
            .map(|def| def.width)
    }

    /// Total packet size in bits, type tag included.
    pub fn total_bits(&self) -> usize {
        TYPE_BITS + self.fields.iter().map(|def| def.width).sum::<usize>()
    }

    /// Number of bus words this packet occupies.
    pub fn word_count(&self, word: WordSize) -> usize {
        word.words_for(self.total_bits())
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(WireError::InvalidLayout("empty packet name".to_string()));
        }
        for def in &self.fields {
            if def.name.is_empty() || def.width == 0 {
                return Err(WireError::InvalidLayout(format!(
                    "packet '{}' has a nameless or zero-width field",
                    self.name
                )));
            }
        }
        if self.total_bits() > MAX_PACKET_BITS {
            return Err(WireError::InvalidLayout(format!(
                "packet '{}' is {} bits, max {}",
                self.name,
                self.total_bits(),
                MAX_PACKET_BITS
            )));
        }
        Ok(())
    }
}

/// Versioned table of packet layouts for one link direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    version: u32,
    layouts: Vec<PacketLayout>,
}

impl LayoutRegistry {
    /// Build a registry from explicit layouts, validating structure and
    /// name/type-id uniqueness.
    pub fn new(version: u32, layouts: Vec<PacketLayout>) -> Result<Self> {
        for (i, layout) in layouts.iter().enumerate() {
            layout.validate()?;
            for other in &layouts[..i] {
                if other.name == layout.name {
                    return Err(WireError::InvalidLayout(format!(
                        "duplicate packet name '{}'",
                        layout.name
                    )));
                }
                if other.type_id == layout.type_id {
                    return Err(WireError::InvalidLayout(format!(
                        "duplicate packet type id {:#04x}",
                        layout.type_id
                    )));
                }
            }
        }
        Ok(Self { version, layouts })
    }

    /// Built-in master-to-satellite layouts.
    pub fn master_to_satellite() -> Self {
        Self {
            version: 1,
            layouts: vec![
                PacketLayout {
                    name: packets::ECHO_REQUEST.to_string(),
                    type_id: 0x00,
                    fields: vec![],
                },
                PacketLayout {
                    name: packets::SET_TIME.to_string(),
                    type_id: 0x01,
                    fields: vec![FieldDef::new("timestamp", 64)],
                },
                PacketLayout {
                    name: packets::RESET.to_string(),
                    type_id: 0x02,
                    fields: vec![FieldDef::new("phy", 1)],
                },
                PacketLayout {
                    name: packets::WRITE.to_string(),
                    type_id: 0x03,
                    fields: vec![
                        FieldDef::new("timestamp", 64),
                        FieldDef::new("channel", 16),
                        FieldDef::new("address", 16),
                        FieldDef::new("extra_data_cnt", 8),
                        FieldDef::new("short_data", SHORT_DATA_BITS),
                    ],
                },
                PacketLayout {
                    name: packets::FIFO_SPACE_REQUEST.to_string(),
                    type_id: 0x04,
                    fields: vec![FieldDef::new("channel", 16)],
                },
            ],
        }
    }

    /// Built-in satellite-to-master layouts.
    pub fn satellite_to_master() -> Self {
        Self {
            version: 1,
            layouts: vec![
                PacketLayout {
                    name: packets::ECHO_REPLY.to_string(),
                    type_id: 0x00,
                    fields: vec![],
                },
                PacketLayout {
                    name: packets::FIFO_SPACE_REPLY.to_string(),
                    type_id: 0x01,
                    fields: vec![FieldDef::new("space", 16)],
                },
                PacketLayout {
                    name: packets::ERROR.to_string(),
                    type_id: 0x02,
                    fields: vec![FieldDef::new("code", 8)],
                },
            ],
        }
    }

    /// Load a registry from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        Self::new(parsed.version, parsed.layouts)
    }

    /// Serialize the registry to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Schema version of this table.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up a layout by packet name.
    pub fn get(&self, packet: &str) -> Result<&PacketLayout> {
        self.layouts
            .iter()
            .find(|layout| layout.name == packet)
            .ok_or_else(|| WireError::UnknownPacket(packet.to_string()))
    }

    /// Look up a layout by type tag.
    pub fn by_type(&self, type_id: u8) -> Option<&PacketLayout> {
        self.layouts.iter().find(|layout| layout.type_id == type_id)
    }

    /// Registered packet names.
    pub fn packet_names(&self) -> Vec<&str> {
        self.layouts.iter().map(|layout| layout.name.as_str()).collect()
    }
}
