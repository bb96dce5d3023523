//! Attribute table and fixed-width payload codec.
//!
//! Every payload is a little-endian integer of the declared width. A write
//! whose length differs from that width is a decode failure; nothing is
//! truncated or zero-padded.

use crate::error::DroError;

/// Read/write/notify rights of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Access {
    const READ_NOTIFY: Access = Access {
        read: true,
        write: false,
        notify: true,
    };
    const READ_WRITE: Access = Access {
        read: true,
        write: true,
        notify: false,
    };
    const WRITE_ONLY: Access = Access {
        read: false,
        write: true,
        notify: false,
    };
}

/// Characteristic presentation format (Bluetooth SIG assigned numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Boolean,
    Uint16,
    Sint32,
}

impl ValueFormat {
    pub fn code(self) -> u8 {
        match self {
            ValueFormat::Boolean => 0x01,
            ValueFormat::Uint16 => 0x06,
            ValueFormat::Sint32 => 0x10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Unitless,
    Metre,
}

impl Unit {
    pub fn code(self) -> u16 {
        match self {
            Unit::Unitless => 0x2700,
            Unit::Metre => 0x2701,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationFormat {
    pub format: ValueFormat,
    /// Decimal exponent; positions are micrometres, so -6 with `Unit::Metre`.
    pub exponent: i8,
    pub unit: Unit,
}

const MICROMETRE: PresentationFormat = PresentationFormat {
    format: ValueFormat::Sint32,
    exponent: -6,
    unit: Unit::Metre,
};
const SCALING_FACTOR: PresentationFormat = PresentationFormat {
    format: ValueFormat::Uint16,
    exponent: 0,
    unit: Unit::Unitless,
};
const BOOLEAN: PresentationFormat = PresentationFormat {
    format: ValueFormat::Boolean,
    exponent: 0,
    unit: Unit::Unitless,
};

/// 128-bit service UUID; characteristics differ only in bytes 2..4.
pub const SERVICE_UUID: [u8; 16] = uuid(0x8c, 0xaf);

const fn uuid(hi: u8, lo: u8) -> [u8; 16] {
    [
        0xd7, 0x57, hi, lo, 0x68, 0x6d, 0x42, 0x16, 0xba, 0x8e, 0xa3, 0x70, 0x3f, 0x15, 0x90, 0xfc,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeId {
    Position = 1,
    Numerator = 2,
    Denominator = 3,
    ReverseDirection = 4,
    SetPosition = 5,
}

impl AttributeId {
    pub const ALL: [AttributeId; 5] = [
        AttributeId::Position,
        AttributeId::Numerator,
        AttributeId::Denominator,
        AttributeId::ReverseDirection,
        AttributeId::SetPosition,
    ];

    #[inline]
    pub fn handle(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeId::Position => "position",
            AttributeId::Numerator => "numerator",
            AttributeId::Denominator => "denominator",
            AttributeId::ReverseDirection => "reverse",
            AttributeId::SetPosition => "set_position",
        }
    }

    pub fn descriptor(self) -> &'static AttributeDescriptor {
        &ATTRIBUTES[usize::from(self.handle() - 1)]
    }
}

impl TryFrom<u8> for AttributeId {
    type Error = DroError;

    fn try_from(handle: u8) -> Result<Self, Self::Error> {
        AttributeId::ALL
            .into_iter()
            .find(|a| a.handle() == handle)
            .ok_or(DroError::UnknownAttribute(handle))
    }
}

impl std::str::FromStr for AttributeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        match norm.as_str() {
            "position" => Ok(AttributeId::Position),
            "numerator" => Ok(AttributeId::Numerator),
            "denominator" => Ok(AttributeId::Denominator),
            "reverse" | "reverse_direction" => Ok(AttributeId::ReverseDirection),
            "set_position" => Ok(AttributeId::SetPosition),
            _ => Err(format!("unknown attribute '{s}'")),
        }
    }
}

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static registration data for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub id: AttributeId,
    pub uuid: [u8; 16],
    pub description: &'static str,
    pub access: Access,
    /// Fixed payload width; min and max length are both this value.
    pub width: usize,
    pub presentation: PresentationFormat,
}

impl AttributeDescriptor {
    pub fn uuid_string(&self) -> String {
        format_uuid(&self.uuid)
    }
}

/// Canonical `8-4-4-4-12` text form, bytes in table order.
pub fn format_uuid(uuid: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, b) in uuid.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

pub static ATTRIBUTES: [AttributeDescriptor; 5] = [
    AttributeDescriptor {
        id: AttributeId::Position,
        uuid: uuid(0xfc, 0xb0),
        description: "Current position",
        access: Access::READ_NOTIFY,
        width: 4,
        presentation: MICROMETRE,
    },
    AttributeDescriptor {
        id: AttributeId::Numerator,
        uuid: uuid(0xfc, 0xb1),
        description: "Scaling numerator",
        access: Access::READ_WRITE,
        width: 2,
        presentation: SCALING_FACTOR,
    },
    AttributeDescriptor {
        id: AttributeId::Denominator,
        uuid: uuid(0xfc, 0xb2),
        description: "Scaling denominator",
        access: Access::READ_WRITE,
        width: 2,
        presentation: SCALING_FACTOR,
    },
    AttributeDescriptor {
        id: AttributeId::ReverseDirection,
        uuid: uuid(0xfc, 0xb3),
        description: "Reverse direction",
        access: Access::READ_WRITE,
        width: 1,
        presentation: BOOLEAN,
    },
    AttributeDescriptor {
        id: AttributeId::SetPosition,
        uuid: uuid(0xfc, 0xb4),
        description: "Arbitrarily set position",
        access: Access::WRITE_ONLY,
        width: 4,
        presentation: MICROMETRE,
    },
];

/// Encoded payload, at most four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    buf: [u8; 4],
    len: u8,
}

impl Payload {
    fn from_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            buf,
            len: bytes.len() as u8,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }
}

/// Outbound value of a readable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    Position(i32),
    Numerator(u16),
    Denominator(u16),
    ReverseDirection(bool),
}

impl AttributeValue {
    pub fn id(self) -> AttributeId {
        match self {
            AttributeValue::Position(_) => AttributeId::Position,
            AttributeValue::Numerator(_) => AttributeId::Numerator,
            AttributeValue::Denominator(_) => AttributeId::Denominator,
            AttributeValue::ReverseDirection(_) => AttributeId::ReverseDirection,
        }
    }

    pub fn encode(self) -> Payload {
        match self {
            AttributeValue::Position(p) => Payload::from_slice(&p.to_le_bytes()),
            AttributeValue::Numerator(n) | AttributeValue::Denominator(n) => {
                Payload::from_slice(&n.to_le_bytes())
            }
            AttributeValue::ReverseDirection(r) => Payload::from_slice(&[u8::from(r)]),
        }
    }
}

/// Decoded inbound write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeWrite {
    Numerator(u16),
    Denominator(u16),
    /// Treated as a toggle trigger; the value is carried for logging only.
    ReverseDirection(bool),
    SetPosition(i32),
}

impl AttributeWrite {
    pub fn id(self) -> AttributeId {
        match self {
            AttributeWrite::Numerator(_) => AttributeId::Numerator,
            AttributeWrite::Denominator(_) => AttributeId::Denominator,
            AttributeWrite::ReverseDirection(_) => AttributeId::ReverseDirection,
            AttributeWrite::SetPosition(_) => AttributeId::SetPosition,
        }
    }

    /// Encode as the remote peer would.
    pub fn encode(self) -> Payload {
        match self {
            AttributeWrite::Numerator(n) | AttributeWrite::Denominator(n) => {
                Payload::from_slice(&n.to_le_bytes())
            }
            AttributeWrite::ReverseDirection(r) => Payload::from_slice(&[u8::from(r)]),
            AttributeWrite::SetPosition(p) => Payload::from_slice(&p.to_le_bytes()),
        }
    }

    /// Build a write from a textual value, range-checked for the attribute's width.
    pub fn parse(id: AttributeId, value: &str) -> Result<Self, DroError> {
        let v = value.trim();
        let bad = |why: &str| DroError::InvalidValue {
            attribute: id.name(),
            reason: format!("{why}, got '{v}'"),
        };
        match id {
            AttributeId::Position => Err(DroError::ReadOnly(id.name())),
            AttributeId::Numerator => v
                .parse::<u16>()
                .map(AttributeWrite::Numerator)
                .map_err(|_| bad("expected 0..=65535")),
            AttributeId::Denominator => v
                .parse::<u16>()
                .map(AttributeWrite::Denominator)
                .map_err(|_| bad("expected 0..=65535")),
            AttributeId::ReverseDirection => match v.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(AttributeWrite::ReverseDirection(true)),
                "0" | "false" => Ok(AttributeWrite::ReverseDirection(false)),
                _ => Err(bad("expected 0/1 or true/false")),
            },
            AttributeId::SetPosition => v
                .parse::<i32>()
                .map(AttributeWrite::SetPosition)
                .map_err(|_| bad("expected a signed 32-bit integer")),
        }
    }
}

/// Decode an inbound write for `id`.
pub fn decode_write(id: AttributeId, payload: &[u8]) -> Result<AttributeWrite, DroError> {
    let desc = id.descriptor();
    if !desc.access.write {
        return Err(DroError::ReadOnly(id.name()));
    }
    if payload.len() != desc.width {
        return Err(DroError::Decode {
            attribute: id.name(),
            expected: desc.width,
            got: payload.len(),
        });
    }
    Ok(match id {
        AttributeId::Numerator => AttributeWrite::Numerator(le_u16(payload)),
        AttributeId::Denominator => AttributeWrite::Denominator(le_u16(payload)),
        AttributeId::ReverseDirection => AttributeWrite::ReverseDirection(payload[0] != 0),
        AttributeId::SetPosition => AttributeWrite::SetPosition(le_i32(payload)),
        AttributeId::Position => return Err(DroError::ReadOnly(id.name())),
    })
}

#[inline]
fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline]
fn le_i32(b: &[u8]) -> i32 {
    i32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_handle() {
        for id in AttributeId::ALL {
            assert_eq!(id.descriptor().id, id);
            assert_eq!(AttributeId::try_from(id.handle()), Ok(id));
        }
        assert_eq!(AttributeId::try_from(0u8), Err(DroError::UnknownAttribute(0)));
        assert_eq!(AttributeId::try_from(9u8), Err(DroError::UnknownAttribute(9)));
    }

    #[test]
    fn uuids_are_distinct_and_share_the_service_base() {
        for (i, a) in ATTRIBUTES.iter().enumerate() {
            assert_eq!(a.uuid[4..], SERVICE_UUID[4..]);
            assert_eq!(a.uuid[..2], SERVICE_UUID[..2]);
            for b in &ATTRIBUTES[i + 1..] {
                assert_ne!(a.uuid, b.uuid);
            }
        }
        assert_eq!(AttributeId::SetPosition.descriptor().uuid[2..4], [0xfc, 0xb4]);
    }

    #[test]
    fn position_encodes_little_endian() {
        let p = AttributeValue::Position(-2).encode();
        assert_eq!(p.as_bytes(), &[0xfe, 0xff, 0xff, 0xff]);
        let p = AttributeValue::Position(0x0102_0304).encode();
        assert_eq!(p.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn scale_and_reverse_widths() {
        assert_eq!(AttributeValue::Numerator(0x1234).encode().as_bytes(), &[0x34, 0x12]);
        assert_eq!(AttributeValue::ReverseDirection(true).encode().as_bytes(), &[1]);
        assert_eq!(AttributeValue::ReverseDirection(false).encode().as_bytes(), &[0]);
    }

    #[test]
    fn decode_rejects_short_and_long_payloads() {
        let err = decode_write(AttributeId::SetPosition, &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            DroError::Decode {
                attribute: "set_position",
                expected: 4,
                got: 3
            }
        );
        assert!(decode_write(AttributeId::Numerator, &[1, 0, 0]).is_err());
        assert!(decode_write(AttributeId::ReverseDirection, &[]).is_err());
    }

    #[test]
    fn decode_refuses_read_only_position() {
        assert_eq!(
            decode_write(AttributeId::Position, &[0, 0, 0, 0]),
            Err(DroError::ReadOnly("position"))
        );
    }

    #[test]
    fn decode_reads_little_endian() {
        assert_eq!(
            decode_write(AttributeId::Denominator, &[0x10, 0x27]),
            Ok(AttributeWrite::Denominator(10_000))
        );
        assert_eq!(
            decode_write(AttributeId::SetPosition, &(-125_000i32).to_le_bytes()),
            Ok(AttributeWrite::SetPosition(-125_000))
        );
        assert_eq!(
            decode_write(AttributeId::ReverseDirection, &[7]),
            Ok(AttributeWrite::ReverseDirection(true))
        );
    }

    #[test]
    fn parse_names_and_values() {
        let id: AttributeId = "Set-Position".parse().unwrap();
        assert_eq!(id, AttributeId::SetPosition);
        assert_eq!(
            AttributeWrite::parse(AttributeId::Numerator, "7"),
            Ok(AttributeWrite::Numerator(7))
        );
        assert!(AttributeWrite::parse(AttributeId::Numerator, "-1").is_err());
        assert!(AttributeWrite::parse(AttributeId::Denominator, "70000").is_err());
        assert!("diameter".parse::<AttributeId>().is_err());
    }

    #[test]
    fn malformed_text_names_its_attribute() {
        assert_eq!(
            AttributeWrite::parse(AttributeId::SetPosition, "12.5"),
            Err(DroError::InvalidValue {
                attribute: "set_position",
                reason: "expected a signed 32-bit integer, got '12.5'".into(),
            })
        );
        assert!(matches!(
            AttributeWrite::parse(AttributeId::ReverseDirection, "maybe"),
            Err(DroError::InvalidValue { attribute: "reverse", .. })
        ));
    }

    #[test]
    fn encoded_write_decodes_back() {
        let w = AttributeWrite::SetPosition(i32::MIN);
        assert_eq!(decode_write(w.id(), w.encode().as_bytes()), Ok(w));
    }

    #[test]
    fn uuids_render_with_the_short_alias_in_place() {
        assert_eq!(format_uuid(&SERVICE_UUID), "d7578caf-686d-4216-ba8e-a3703f1590fc");
        assert_eq!(
            AttributeId::SetPosition.descriptor().uuid_string(),
            "d757fcb4-686d-4216-ba8e-a3703f1590fc"
        );
    }
}
