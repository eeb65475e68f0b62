//! GeneralName variants (RFC 5280 4.2.1.6)

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use der::asn1::{Ia5String, ObjectIdentifier, OctetString};
use der::{Any, Decode, Encode, Tag, Tagged};
use x509_cert::name::Name;

use crate::asn1::{context_tag, decode_implicit, decode_tagged, encode_implicit, encode_tagged, oid_label};
use crate::error::{DecodeError, DecodeResult};

/// The context tag values of the GeneralName CHOICE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneralNameType {
    Other,
    Rfc822,
    Dns,
    X400Address,
    Directory,
    EdiParty,
    Uri,
    IpAddress,
    RegisteredId,
}

impl GeneralNameType {
    pub const ALL: [GeneralNameType; 9] = [
        GeneralNameType::Other,
        GeneralNameType::Rfc822,
        GeneralNameType::Dns,
        GeneralNameType::X400Address,
        GeneralNameType::Directory,
        GeneralNameType::EdiParty,
        GeneralNameType::Uri,
        GeneralNameType::IpAddress,
        GeneralNameType::RegisteredId,
    ];

    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            GeneralNameType::Other => 0,
            GeneralNameType::Rfc822 => 1,
            GeneralNameType::Dns => 2,
            GeneralNameType::X400Address => 3,
            GeneralNameType::Directory => 4,
            GeneralNameType::EdiParty => 5,
            GeneralNameType::Uri => 6,
            GeneralNameType::IpAddress => 7,
            GeneralNameType::RegisteredId => 8,
        }
    }

    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Prefix used by the display form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            GeneralNameType::Other => "othername",
            GeneralNameType::Rfc822 => "email",
            GeneralNameType::Dns => "DNS",
            GeneralNameType::X400Address => "X400Name",
            GeneralNameType::Directory => "DirName",
            GeneralNameType::EdiParty => "EdiPartyName",
            GeneralNameType::Uri => "URI",
            GeneralNameType::IpAddress => "IP",
            GeneralNameType::RegisteredId => "RID",
        }
    }
}

/// A name variant kept as raw tagged content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueName {
    constructed: bool,
    content: Vec<u8>,
}

impl OpaqueName {
    pub fn new(constructed: bool, content: Vec<u8>) -> Self {
        Self { constructed, content }
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }
}

/// A single general name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralName {
    Other(OpaqueName),
    Rfc822(String),
    Dns(String),
    X400Address(OpaqueName),
    Directory(Name),
    EdiParty(OpaqueName),
    Uri(String),
    IpAddress(Vec<u8>),
    RegisteredId(ObjectIdentifier),
}

impl GeneralName {
    #[must_use]
    pub fn name_type(&self) -> GeneralNameType {
        match self {
            GeneralName::Other(_) => GeneralNameType::Other,
            GeneralName::Rfc822(_) => GeneralNameType::Rfc822,
            GeneralName::Dns(_) => GeneralNameType::Dns,
            GeneralName::X400Address(_) => GeneralNameType::X400Address,
            GeneralName::Directory(_) => GeneralNameType::Directory,
            GeneralName::EdiParty(_) => GeneralNameType::EdiParty,
            GeneralName::Uri(_) => GeneralNameType::Uri,
            GeneralName::IpAddress(_) => GeneralNameType::IpAddress,
            GeneralName::RegisteredId(_) => GeneralNameType::RegisteredId,
        }
    }

    /// Decode a general name, dispatching on the element's context tag.
    pub fn decode(any: &Any) -> DecodeResult<Self> {
        let kind = context_tag(any)
            .and_then(GeneralNameType::from_tag)
            .ok_or_else(|| DecodeError::unexpected_tag("", "GeneralName [0..8]", any.tag()))?;

        Self::decode_as(kind, any)
    }

    /// Decode a general name of a fixed type; a different tag is an error.
    pub fn decode_as(kind: GeneralNameType, any: &Any) -> DecodeResult<Self> {
        let number = kind.tag();
        let name = match kind {
            GeneralNameType::Other => GeneralName::Other(decode_opaque(any, number)?),
            GeneralNameType::Rfc822 => GeneralName::Rfc822(decode_ia5(any, number)?),
            GeneralNameType::Dns => GeneralName::Dns(decode_ia5(any, number)?),
            GeneralNameType::X400Address => GeneralName::X400Address(decode_opaque(any, number)?),
            GeneralNameType::Directory => {
                // CHOICE content is always explicitly tagged
                let tagged = decode_tagged(any, number)?;
                if !tagged.tag().is_constructed() {
                    return Err(DecodeError::new("", "directoryName must be constructed"));
                }
                GeneralName::Directory(Name::from_der(tagged.value())?)
            }
            GeneralNameType::EdiParty => GeneralName::EdiParty(decode_opaque(any, number)?),
            GeneralNameType::Uri => GeneralName::Uri(decode_ia5(any, number)?),
            GeneralNameType::IpAddress => {
                let octets: OctetString = decode_implicit(any, number, Tag::OctetString)?;
                GeneralName::IpAddress(octets.into_bytes())
            }
            GeneralNameType::RegisteredId => {
                GeneralName::RegisteredId(decode_implicit(any, number, Tag::ObjectIdentifier)?)
            }
        };
        Ok(name)
    }

    /// Encode using the same implicit tag the name was decoded from.
    pub fn encode(&self) -> DecodeResult<Any> {
        let number = self.name_type().tag();

        match self {
            GeneralName::Other(opaque)
            | GeneralName::X400Address(opaque)
            | GeneralName::EdiParty(opaque) => encode_tagged(number, opaque.constructed, &opaque.content),
            GeneralName::Rfc822(value) | GeneralName::Dns(value) | GeneralName::Uri(value) => {
                encode_implicit(number, &Ia5String::new(value)?)
            }
            GeneralName::Directory(name) => encode_tagged(number, true, &name.to_der()?),
            GeneralName::IpAddress(octets) => encode_implicit(number, &OctetString::new(octets.clone())?),
            GeneralName::RegisteredId(oid) => encode_implicit(number, oid),
        }
    }

    /// The value part of the display form.
    #[must_use]
    pub fn value_string(&self) -> String {
        match self {
            GeneralName::Other(opaque)
            | GeneralName::X400Address(opaque)
            | GeneralName::EdiParty(opaque) => hex::encode(&opaque.content),
            GeneralName::Rfc822(value) | GeneralName::Dns(value) | GeneralName::Uri(value) => value.clone(),
            GeneralName::Directory(name) => name.to_string(),
            GeneralName::IpAddress(octets) => ip_address_string(octets),
            GeneralName::RegisteredId(oid) => oid_label(oid),
        }
    }
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name_type().label(), self.value_string())
    }
}

fn decode_opaque(any: &Any, number: u8) -> DecodeResult<OpaqueName> {
    let tagged = decode_tagged(any, number)?;

    Ok(OpaqueName::new(tagged.tag().is_constructed(), tagged.value().to_vec()))
}

fn decode_ia5(any: &Any, number: u8) -> DecodeResult<String> {
    let value: Ia5String = decode_implicit(any, number, Tag::Ia5String)?;

    Ok(value.to_string())
}

// Addresses with a trailing mask (name constraints) render as addr/mask.
fn ip_address_string(octets: &[u8]) -> String {
    match octets.len() {
        4 => to_ipv4(octets).to_string(),
        16 => to_ipv6(octets).to_string(),
        8 => format!("{}/{}", to_ipv4(&octets[..4]), to_ipv4(&octets[4..])),
        32 => format!("{}/{}", to_ipv6(&octets[..16]), to_ipv6(&octets[16..])),
        _ => hex::encode(octets),
    }
}

fn to_ipv4(octets: &[u8]) -> Ipv4Addr {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(octets);
    Ipv4Addr::from(bytes)
}

fn to_ipv6(octets: &[u8]) -> Ipv6Addr {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(octets);
    Ipv6Addr::from(bytes)
}
